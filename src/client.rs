//! Typed façade over the SimPLEX command dictionary.
//!
//! [`Str4500`] owns the connection. Channel- and satellite-addressed
//! commands go through short-lived [`Channel`] / [`Satellite`] views that
//! borrow the client mutably, so only one command is ever in flight.

use std::fmt;

use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::proto::command::{
    Addressing, PowerMode, SimCommand, StopMode, Timestamp, TriggerMode, format_command,
};
use crate::proto::response::CommandResponse;
use crate::transport::{TcpTransport, Transport};

pub struct Str4500<T: Transport = TcpTransport> {
    config: ClientConfig,
    transport: T,
}

impl Str4500<TcpTransport> {
    /// Open the connection and confirm the device answers a status probe.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let transport = TcpTransport::open(&config.host, config.port, config.read_timeout)?;
        let mut client = Self::with_transport(config, transport);
        let probe = client.status()?;
        debug!(status = %probe.status, "SimPLEX answered status probe");
        Ok(client)
    }

    pub fn close(self) -> Result<()> {
        self.transport.close()
    }
}

impl<T: Transport> Str4500<T> {
    /// Wrap an already-open transport. No probe is sent.
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Validate, send one command and decode its reply.
    pub fn execute(&mut self, cmd: &SimCommand) -> Result<CommandResponse> {
        cmd.validate()?;
        let line = format_command(cmd);
        debug!(%line, "sending command");
        self.transport.send(&line)?;
        let raw = self.transport.receive()?;
        debug!(reply = %String::from_utf8_lossy(&raw), "raw reply");
        CommandResponse::from_bytes(&raw).inspect_err(|e| {
            if let Error::Device(msg) = e {
                warn!(%line, error = %msg, "SimPLEX rejected command");
            }
        })
    }

    /* ---------- scenario control ---------- */

    /// Select a scenario file (a path on the SimPLEX host). Allowed before a
    /// run or after a rewind.
    pub fn select_scenario(&mut self, filename: impl Into<String>) -> Result<CommandResponse> {
        self.execute(&SimCommand::SelectScenario {
            filename: filename.into(),
        })
    }

    /// 0 = software, 1 = external immediate, 2 = external on next 1PPS edge.
    pub fn set_trigger(&mut self, mode: u8) -> Result<CommandResponse> {
        let mode = TriggerMode::try_from(mode)?;
        self.execute(&SimCommand::SetTrigger { mode })
    }

    /// Trigger modes 1 and 2 still need the external pulse.
    pub fn run_scenario(&mut self) -> Result<CommandResponse> {
        self.execute(&SimCommand::RunScenario)
    }

    pub fn status(&mut self) -> Result<CommandResponse> {
        self.execute(&SimCommand::Null)
    }

    pub fn null(&mut self) -> Result<CommandResponse> {
        self.status()
    }

    /// 0 = stop (left ENDED), 1 = stop and rewind, 2 = stop, rewind and
    /// repeat the remote command file.
    pub fn end_scenario(
        &mut self,
        stop_mode: u8,
        save: bool,
        at: Timestamp,
    ) -> Result<CommandResponse> {
        let stop_mode = StopMode::try_from(stop_mode)?;
        self.execute(&SimCommand::EndScenario {
            at,
            stop_mode,
            save,
        })
    }

    pub fn rewind_scenario(&mut self) -> Result<CommandResponse> {
        self.execute(&SimCommand::RewindScenario)
    }

    /* ---------- all channels ---------- */

    pub fn set_power(&mut self, on: bool, at: Timestamp) -> Result<CommandResponse> {
        self.power_on(Addressing::Global, on, at)
    }

    pub fn set_power_mode(&mut self, mode: PowerMode, at: Timestamp) -> Result<CommandResponse> {
        self.power_mode(Addressing::Global, mode, at)
    }

    /// `level` in dB relative to the Stanag minimum.
    pub fn set_power_level(
        &mut self,
        level: f64,
        absolute: bool,
        at: Timestamp,
    ) -> Result<CommandResponse> {
        self.power_level(Addressing::Global, level, absolute, at)
    }

    pub fn set_prn(&mut self, on: bool, at: Timestamp) -> Result<CommandResponse> {
        self.prn(Addressing::Global, on, at)
    }

    /* ---------- combined entry points ---------- */

    pub fn set_power_for(
        &mut self,
        chan: Option<u8>,
        sat: Option<u8>,
        on: bool,
        at: Timestamp,
    ) -> Result<CommandResponse> {
        self.power_on(Addressing::from_options(chan, sat)?, on, at)
    }

    pub fn set_power_mode_for(
        &mut self,
        chan: Option<u8>,
        sat: Option<u8>,
        mode: PowerMode,
        at: Timestamp,
    ) -> Result<CommandResponse> {
        self.power_mode(Addressing::from_options(chan, sat)?, mode, at)
    }

    pub fn set_power_level_for(
        &mut self,
        chan: Option<u8>,
        sat: Option<u8>,
        level: f64,
        absolute: bool,
        at: Timestamp,
    ) -> Result<CommandResponse> {
        self.power_level(Addressing::from_options(chan, sat)?, level, absolute, at)
    }

    /// PRN codes are per channel; `None` means all channels.
    pub fn set_prn_for(
        &mut self,
        chan: Option<u8>,
        on: bool,
        at: Timestamp,
    ) -> Result<CommandResponse> {
        self.prn(Addressing::from_options(chan, None)?, on, at)
    }

    /* ---------- simulator settings ---------- */

    /// `false` puts SimPLEX in no-hardware mode.
    pub fn enable_hardware(&mut self, mode: bool) -> Result<CommandResponse> {
        self.execute(&SimCommand::HardwareOn { enabled: mode })
    }

    /// Fatal-error popups. Errors still land in message_log.txt either way.
    pub fn enable_popups(&mut self, mode: bool) -> Result<CommandResponse> {
        self.execute(&SimCommand::PopupsOn { enabled: mode })
    }

    /* ---------- queries ---------- */

    /// Time into run, whole seconds.
    pub fn time(&mut self) -> Result<i64> {
        let resp = self.execute(&SimCommand::Time)?;
        resp.data
            .as_deref()
            .map(str::trim)
            .and_then(|d| d.parse().ok())
            .ok_or_else(|| Error::Protocol(format!("invalid time data: {:?}", resp.data)))
    }

    /// Scenario duration as reported, e.g. `d hh:mm`.
    pub fn scenario_duration(&mut self) -> Result<Option<String>> {
        Ok(self.execute(&SimCommand::ScenarioDuration)?.data)
    }

    /* ---------- addressing views ---------- */

    pub fn channel(&mut self, chan: u8) -> Result<Channel<'_, T>> {
        let target = Addressing::channel(chan)?;
        Ok(Channel {
            client: self,
            target,
        })
    }

    pub fn satellite(&mut self, sat: u8) -> Result<Satellite<'_, T>> {
        let target = Addressing::satellite(sat)?;
        Ok(Satellite {
            client: self,
            target,
        })
    }

    /* ---------- helpers ---------- */

    fn power_on(&mut self, target: Addressing, on: bool, at: Timestamp) -> Result<CommandResponse> {
        self.execute(&SimCommand::PowerOn { at, target, on })
    }

    fn power_mode(
        &mut self,
        target: Addressing,
        mode: PowerMode,
        at: Timestamp,
    ) -> Result<CommandResponse> {
        self.execute(&SimCommand::PowerMode { at, target, mode })
    }

    fn power_level(
        &mut self,
        target: Addressing,
        level: f64,
        absolute: bool,
        at: Timestamp,
    ) -> Result<CommandResponse> {
        self.execute(&SimCommand::PowerLevel {
            at,
            target,
            level,
            absolute,
        })
    }

    fn prn(&mut self, target: Addressing, on: bool, at: Timestamp) -> Result<CommandResponse> {
        self.execute(&SimCommand::PrnCode { at, target, on })
    }
}

impl<T: Transport> fmt::Debug for Str4500<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Str4500")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> fmt::Display for Str4500<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "STR4500 at {}:{}", self.config.host, self.config.port)
    }
}

/// Commands addressed to one PRN channel (0..=11).
pub struct Channel<'a, T: Transport> {
    client: &'a mut Str4500<T>,
    target: Addressing,
}

impl<T: Transport> Channel<'_, T> {
    pub fn index(&self) -> u8 {
        self.target.index()
    }

    pub fn set_power(&mut self, on: bool, at: Timestamp) -> Result<CommandResponse> {
        self.client.power_on(self.target, on, at)
    }

    pub fn set_power_mode(&mut self, mode: PowerMode, at: Timestamp) -> Result<CommandResponse> {
        self.client.power_mode(self.target, mode, at)
    }

    pub fn set_power_level(
        &mut self,
        level: f64,
        absolute: bool,
        at: Timestamp,
    ) -> Result<CommandResponse> {
        self.client.power_level(self.target, level, absolute, at)
    }

    pub fn set_prn(&mut self, on: bool, at: Timestamp) -> Result<CommandResponse> {
        self.client.prn(self.target, on, at)
    }
}

/// Commands addressed to one satellite id (1..=32).
pub struct Satellite<'a, T: Transport> {
    client: &'a mut Str4500<T>,
    target: Addressing,
}

impl<T: Transport> Satellite<'_, T> {
    pub fn id(&self) -> u8 {
        self.target.index()
    }

    pub fn set_power(&mut self, on: bool, at: Timestamp) -> Result<CommandResponse> {
        self.client.power_on(self.target, on, at)
    }

    pub fn set_power_mode(&mut self, mode: PowerMode, at: Timestamp) -> Result<CommandResponse> {
        self.client.power_mode(self.target, mode, at)
    }

    pub fn set_power_level(
        &mut self,
        level: f64,
        absolute: bool,
        at: Timestamp,
    ) -> Result<CommandResponse> {
        self.client.power_level(self.target, level, absolute, at)
    }
}
