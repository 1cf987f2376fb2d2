//! Remote-control client for the STR4500 GPS/SBAS simulator.
//!
//! SimPLEX accepts comma-delimited command lines on TCP port 15650 and
//! answers each one with a small XML document:
//!
//! ```text
//! -> -,POW_LEV,v1_a1,10.5,23,1,0,1
//! <- <msg><status>2</status></msg>
//! ```
//!
//! [`Str4500`] wraps the connection and exposes the command dictionary as
//! typed methods. Every call is one blocking request/reply.

pub mod client;
pub mod config;
pub mod error;
pub mod proto;
pub mod sims;
pub mod transport;

pub use client::{Channel, Satellite, Str4500};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use proto::command::{Addressing, PowerMode, SimCommand, StopMode, Timestamp, TriggerMode};
pub use proto::response::{CommandResponse, Status};
pub use sims::ScenarioIndex;
pub use transport::{SIMPLEX_PORT, TcpTransport, Transport};
