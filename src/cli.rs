use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use str4500::{ClientConfig, SIMPLEX_PORT};

#[derive(Parser, Debug, Clone)]
#[command(name = "str4500", about = "Remote control for the STR4500 simulator via SimPLEX")]
pub struct Cli {
    #[command(flatten)]
    pub conn: ConnOpts,
    /// More logging (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Args, Debug, Clone)]
pub struct ConnOpts {
    /// SimPLEX host (often the Windows VM running the simulator)
    #[arg(long, default_value = "127.0.0.1", global = true)]
    pub host: String,
    /// SimPLEX port
    #[arg(long, default_value_t = SIMPLEX_PORT, global = true)]
    pub port: u16,
    /// Give up waiting for a reply after this many ms (default: wait forever)
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,
}

impl ConnOpts {
    pub fn to_config(&self) -> ClientConfig {
        ClientConfig::new(&self.host)
            .with_port(self.port)
            .with_read_timeout(self.timeout_ms.map(Duration::from_millis))
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Cmd {
    /// Query simulator status (NULL)
    Status,
    /// Select a scenario by path or by index-file entry
    Select(SelectOpts),
    /// Set trigger mode (0 software, 1 ext immediate, 2 ext next 1PPS)
    Trigger { mode: u8 },
    /// Run the selected scenario
    Run,
    /// End the running scenario
    End(EndOpts),
    /// Rewind an ended scenario
    Rewind,
    /// Power signals on/off
    Power {
        state: Switch,
        #[command(flatten)]
        target: TargetOpts,
    },
    /// Set power mode (0 absolute, 1 relative)
    PowerMode {
        mode: u8,
        #[command(flatten)]
        target: TargetOpts,
    },
    /// Set power level in dB
    PowerLevel {
        #[arg(allow_negative_numbers = true)]
        level: f64,
        /// Relative to current simulated power instead of absolute
        #[arg(long, default_value_t = false)]
        relative: bool,
        #[command(flatten)]
        target: TargetOpts,
    },
    /// PRN code on/off (all channels or one)
    Prn {
        state: Switch,
        /// Channel index (0-11)
        #[arg(long)]
        chan: Option<u8>,
        /// Time into run to apply ("-" = on receipt)
        #[arg(long, default_value = "-")]
        at: String,
    },
    /// Enable hardware, or "off" for no-hardware mode
    Hardware { state: Switch },
    /// Enable/suppress popups on fatal error
    Popups { state: Switch },
    /// Time into run (seconds)
    Time,
    /// Scenario duration
    Duration,
    /// List the scenario index file
    Sims {
        #[arg(default_value = str4500::sims::DEFAULT_SIMS_PATH)]
        path: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
pub struct SelectOpts {
    /// Scenario path on the SimPLEX host
    #[arg(required_unless_present = "index", conflicts_with = "index")]
    pub file: Option<String>,
    /// Entry number in the scenario index file
    #[arg(long)]
    pub index: Option<u32>,
    /// Scenario index file
    #[arg(long, default_value = str4500::sims::DEFAULT_SIMS_PATH)]
    pub sims: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct EndOpts {
    /// 0 stop, 1 stop and rewind, 2 stop, rewind and repeat
    #[arg(long, default_value_t = 0)]
    pub mode: u8,
    /// Save logged data
    #[arg(long, default_value_t = false)]
    pub save: bool,
    /// Time into run to apply ("-" = on receipt)
    #[arg(long, default_value = "-")]
    pub at: String,
}

#[derive(Args, Debug, Clone)]
pub struct TargetOpts {
    /// Channel index (0-11)
    #[arg(long)]
    pub chan: Option<u8>,
    /// Satellite id (1-32)
    #[arg(long)]
    pub sat: Option<u8>,
    /// Time into run to apply ("-" = on receipt)
    #[arg(long, default_value = "-")]
    pub at: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn is_on(self) -> bool {
        self == Switch::On
    }
}
