use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use str4500::{PowerMode, ScenarioIndex, Str4500, Timestamp};

mod cli;

use cli::{Cli, Cmd};

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);

    if let Cmd::Sims { path } = &args.cmd {
        let index = ScenarioIndex::load(path)?;
        for (k, v) in index.iter() {
            println!("{k:>4}  {v}");
        }
        return Ok(());
    }

    let config = args.conn.to_config();
    let mut dev = Str4500::connect(config.clone())
        .with_context(|| format!("connecting to SimPLEX at {}:{}", config.host, config.port))?;
    let result = run(&mut dev, args.cmd);
    finish(result, dev.close())
}

/// The command's own error is reported ahead of a failed close.
fn finish(result: Result<()>, closed: str4500::Result<()>) -> Result<()> {
    match (result, closed) {
        (Err(e), Err(close_err)) => {
            warn!(error = %close_err, "closing connection failed");
            Err(e)
        }
        (result, closed) => {
            closed.context("closing connection")?;
            result
        }
    }
}

fn run(dev: &mut Str4500, cmd: Cmd) -> Result<()> {
    let resp = match cmd {
        Cmd::Status => dev.status()?,
        Cmd::Select(opts) => {
            let file = match (opts.file, opts.index) {
                (Some(file), _) => file,
                (None, Some(idx)) => {
                    let index = ScenarioIndex::load(&opts.sims)?;
                    index
                        .get(idx)
                        .ok_or_else(|| anyhow!("no scenario {idx} in {}", opts.sims.display()))?
                        .to_string()
                }
                (None, None) => return Err(anyhow!("give a scenario file or --index")),
            };
            dev.select_scenario(&file)
                .with_context(|| format!("selecting {file}"))?
        }
        Cmd::Trigger { mode } => dev.set_trigger(mode)?,
        Cmd::Run => dev.run_scenario()?,
        Cmd::End(opts) => dev.end_scenario(opts.mode, opts.save, opts.at.as_str().into())?,
        Cmd::Rewind => dev.rewind_scenario()?,
        Cmd::Power { state, target } => dev.set_power_for(
            target.chan,
            target.sat,
            state.is_on(),
            Timestamp::from(target.at.as_str()),
        )?,
        Cmd::PowerMode { mode, target } => dev.set_power_mode_for(
            target.chan,
            target.sat,
            PowerMode::try_from(mode)?,
            Timestamp::from(target.at.as_str()),
        )?,
        Cmd::PowerLevel {
            level,
            relative,
            target,
        } => dev.set_power_level_for(
            target.chan,
            target.sat,
            level,
            !relative,
            Timestamp::from(target.at.as_str()),
        )?,
        Cmd::Prn { state, chan, at } => {
            dev.set_prn_for(chan, state.is_on(), Timestamp::from(at.as_str()))?
        }
        Cmd::Hardware { state } => dev.enable_hardware(state.is_on())?,
        Cmd::Popups { state } => dev.enable_popups(state.is_on())?,
        Cmd::Time => {
            println!("{}", dev.time()?);
            return Ok(());
        }
        Cmd::Duration => {
            println!("{}", dev.scenario_duration()?.unwrap_or_default());
            return Ok(());
        }
        Cmd::Sims { .. } => return Ok(()),
    };
    println!("{resp}");
    Ok(())
}
