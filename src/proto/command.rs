use std::fmt;

use super::codec::{Field, encode};
use crate::error::{Error, Result};

/// Vehicle 1, antenna 1. The only pairing the client drives.
pub const VEHICLE_ANTENNA: &str = "v1_a1";

pub const MAX_CHANNEL: u8 = 11;
pub const MIN_SATELLITE: u8 = 1;
pub const MAX_SATELLITE: u8 = 32;

/// Entries of the SimPLEX remote command dictionary this client speaks.
#[derive(Debug, Clone, PartialEq)]
pub enum SimCommand {
    // ---- Scenario control ----
    SelectScenario {
        filename: String,
    },
    SetTrigger {
        mode: TriggerMode,
    },
    RunScenario,
    Null,
    EndScenario {
        at: Timestamp,
        stop_mode: StopMode,
        save: bool,
    },
    RewindScenario,

    // ---- Power / signal ----
    PowerOn {
        at: Timestamp,
        target: Addressing,
        on: bool,
    },
    PowerMode {
        at: Timestamp,
        target: Addressing,
        mode: PowerMode,
    },
    PowerLevel {
        at: Timestamp,
        target: Addressing,
        level: f64,
        absolute: bool,
    },
    PrnCode {
        at: Timestamp,
        target: Addressing,
        on: bool,
    },

    // ---- Simulator settings ----
    HardwareOn {
        enabled: bool,
    },
    PopupsOn {
        enabled: bool,
    },

    // ---- Queries ----
    Time,
    ScenarioDuration,
}

impl SimCommand {
    /// Check addressing ranges. Runs before anything touches the socket.
    pub fn validate(&self) -> Result<()> {
        match self {
            SimCommand::PowerOn { target, .. }
            | SimCommand::PowerMode { target, .. }
            | SimCommand::PowerLevel { target, .. } => target.validate(),
            SimCommand::PrnCode { target, .. } => {
                if matches!(target, Addressing::Satellite(_)) {
                    return Err(Error::validation(
                        "PRN code can only be set per channel or globally",
                    ));
                }
                target.validate()
            }
            _ => Ok(()),
        }
    }
}

/// Which slice of the signal set a power/PRN command applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing {
    Global,
    Channel(u8),
    Satellite(u8),
}

impl Addressing {
    pub fn channel(chan: u8) -> Result<Self> {
        let a = Addressing::Channel(chan);
        a.validate()?;
        Ok(a)
    }

    pub fn satellite(sat: u8) -> Result<Self> {
        let a = Addressing::Satellite(sat);
        a.validate()?;
        Ok(a)
    }

    /// Resolve the optional channel/satellite pair taken by the combined
    /// entry points. At most one may be given; neither means global.
    pub fn from_options(chan: Option<u8>, sat: Option<u8>) -> Result<Self> {
        match (chan, sat) {
            (None, None) => Ok(Addressing::Global),
            (Some(c), None) => Addressing::channel(c),
            (None, Some(s)) => Addressing::satellite(s),
            (Some(_), Some(_)) => Err(Error::validation(
                "specify either a channel or a satellite, not both",
            )),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            Addressing::Global => Ok(()),
            Addressing::Channel(c) if c <= MAX_CHANNEL => Ok(()),
            Addressing::Channel(c) => Err(Error::validation(format!(
                "invalid channel {c} (expected 0..={MAX_CHANNEL})"
            ))),
            Addressing::Satellite(s) if (MIN_SATELLITE..=MAX_SATELLITE).contains(&s) => Ok(()),
            Addressing::Satellite(s) => Err(Error::validation(format!(
                "invalid satellite {s} (expected {MIN_SATELLITE}..={MAX_SATELLITE})"
            ))),
        }
    }

    /// Channel or satellite number; 0 for the global case.
    pub fn index(&self) -> u8 {
        match *self {
            Addressing::Global => 0,
            Addressing::Channel(n) | Addressing::Satellite(n) => n,
        }
    }

    /// Tells SimPLEX whether the index is a channel or a satellite id.
    /// Raised for the global case, which addresses channel 0 with the
    /// all-channels flag.
    pub fn is_channel_flag(&self) -> bool {
        !matches!(self, Addressing::Satellite(_))
    }

    pub fn all_flag(&self) -> bool {
        matches!(self, Addressing::Global)
    }
}

/// When the simulator should apply a timed command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Timestamp {
    /// Apply on receipt (`-`).
    #[default]
    Now,
    /// Time into run, e.g. `0 00:05:00`.
    At(String),
}

impl Timestamp {
    pub fn at(t: impl Into<String>) -> Self {
        Timestamp::At(t.into())
    }
}

impl From<&str> for Timestamp {
    fn from(s: &str) -> Self {
        if s == "-" { Timestamp::Now } else { Timestamp::At(s.to_string()) }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Now => f.write_str("-"),
            Timestamp::At(t) => f.write_str(t),
        }
    }
}

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident, $what:literal { $($variant:ident = $code:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant = $code),+
        }

        impl $name {
            pub fn code(self) -> u8 {
                self as u8
            }
        }

        impl TryFrom<u8> for $name {
            type Error = Error;
            fn try_from(v: u8) -> Result<Self> {
                match v {
                    $($code => Ok($name::$variant),)+
                    _ => Err(Error::validation(format!(concat!("invalid ", $what, " {}"), v))),
                }
            }
        }
    };
}

wire_enum!(
    /// Trigger source for starting a run.
    TriggerMode, "trigger mode" {
        Software = 0,
        ExternalImmediate = 1,
        ExternalNextPps = 2,
    }
);

wire_enum!(
    /// What `EN` leaves behind.
    StopMode, "stop mode" {
        Stop = 0,
        StopAndRewind = 1,
        StopRewindAndRepeat = 2,
    }
);

wire_enum!(
    PowerMode, "power mode" {
        Absolute = 0,
        Relative = 1,
    }
);

/* ---------- formatting ---------- */

macro_rules! fields {
    ($($v:expr),* $(,)?) => {
        vec![$(Field::from($v)),*]
    };
}

/// Lower a command to its ordered wire fields.
pub fn command_fields(cmd: &SimCommand) -> Vec<Field> {
    use SimCommand as C;
    match cmd {
        C::SelectScenario { filename } => fields!["SC", filename],
        C::SetTrigger { mode } => fields!["TR", mode.code()],
        C::RunScenario => fields!["RU"],
        C::Null => fields!["NULL"],
        C::EndScenario {
            at,
            stop_mode,
            save,
        } => fields![at.to_string(), "EN", stop_mode.code(), *save],
        C::RewindScenario => fields!["RW"],

        C::PowerOn { at, target, on } => fields![
            at.to_string(),
            "POW_ON",
            VEHICLE_ANTENNA,
            *on,
            target.index(),
            target.is_channel_flag(),
            target.all_flag(),
        ],
        C::PowerMode { at, target, mode } => fields![
            at.to_string(),
            "POW_MODE",
            VEHICLE_ANTENNA,
            mode.code(),
            target.index(),
            target.is_channel_flag(),
            target.all_flag(),
        ],
        C::PowerLevel {
            at,
            target,
            level,
            absolute,
        } => fields![
            at.to_string(),
            "POW_LEV",
            VEHICLE_ANTENNA,
            *level,
            target.index(),
            target.is_channel_flag(),
            target.all_flag(),
            *absolute,
        ],
        C::PrnCode { at, target, on } => fields![
            at.to_string(),
            "PRN_CODE",
            target.index(),
            target.all_flag(),
            *on,
        ],

        C::HardwareOn { enabled } => fields!["HARDWARE_ON", *enabled],
        C::PopupsOn { enabled } => fields!["POPUPS_ON", *enabled],

        C::Time => fields!["TIME"],
        C::ScenarioDuration => fields!["SC_DURATION"],
    }
}

/// Serialize a command to the line sent over the wire (no terminator).
pub fn format_command(cmd: &SimCommand) -> String {
    encode(&command_fields(cmd))
}
