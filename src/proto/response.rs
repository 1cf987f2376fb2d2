use std::fmt;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{Error, Result};

/// Simulator state reported in every reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    NoScenario = 0,
    InvalidScenario = 1,
    Initialised = 2,
    Arming = 3,
    Running = 4,
    Paused = 5,
    Ended = 6,
}

impl Status {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<i64> for Status {
    type Error = Error;
    fn try_from(code: i64) -> Result<Self> {
        Ok(match code {
            0 => Status::NoScenario,
            1 => Status::InvalidScenario,
            2 => Status::Initialised,
            3 => Status::Arming,
            4 => Status::Running,
            5 => Status::Paused,
            6 => Status::Ended,
            _ => return Err(Error::protocol(format!("invalid status {code}"))),
        })
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::NoScenario => "No scenario specified",
            Status::InvalidScenario => "Invalid scenario",
            Status::Initialised => "Initialised",
            Status::Arming => "Arming",
            Status::Running => "Running",
            Status::Paused => "Paused",
            Status::Ended => "Ended",
        })
    }
}

/// Decoded reply: a status and, for queries, a text payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResponse {
    pub status: Status,
    pub data: Option<String>,
}

impl CommandResponse {
    pub fn new(status: Status, data: Option<String>) -> Self {
        Self { status, data }
    }

    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        parse_response(&String::from_utf8_lossy(raw))
    }
}

impl fmt::Display for CommandResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            Some(d) => write!(f, "{} (data: {})", self.status, d),
            None => write!(f, "{}", self.status),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Status,
    Error,
    Data,
}

#[derive(Debug, Default)]
struct RawReply {
    status: Option<String>,
    error: Option<String>,
    data: Option<String>,
}

impl RawReply {
    fn slot_mut(&mut self, slot: Slot) -> &mut Option<String> {
        match slot {
            Slot::Status => &mut self.status,
            Slot::Error => &mut self.error,
            Slot::Data => &mut self.data,
        }
    }
}

fn slot_for(name: &[u8]) -> Option<Slot> {
    match name {
        b"status" => Some(Slot::Status),
        b"error" => Some(Slot::Error),
        b"data" => Some(Slot::Data),
        _ => None,
    }
}

fn malformed(e: impl fmt::Display) -> Error {
    Error::protocol(format!("malformed xml: {e}"))
}

/// Collect the text of the root's `status`, `error` and `data` children.
fn read_reply(xml: &str) -> Result<RawReply> {
    let mut reader = Reader::from_str(xml);
    let mut reply = RawReply::default();
    let mut depth = 0usize;
    let mut seen_root = false;
    let mut current: Option<Slot> = None;

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(e) => {
                if depth == 0 {
                    if seen_root {
                        return Err(malformed("multiple root elements"));
                    }
                    seen_root = true;
                } else if depth == 1 {
                    // first occurrence of each child wins
                    current = slot_for(e.name().as_ref())
                        .filter(|s| reply.slot_mut(*s).is_none());
                    if let Some(slot) = current {
                        *reply.slot_mut(slot) = Some(String::new());
                    }
                }
                depth += 1;
            }
            Event::Empty(e) => {
                if depth == 0 {
                    if seen_root {
                        return Err(malformed("multiple root elements"));
                    }
                    seen_root = true;
                } else if depth == 1
                    && let Some(slot) = slot_for(e.name().as_ref())
                {
                    reply.slot_mut(slot).get_or_insert_with(String::new);
                }
            }
            Event::End(_) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| malformed("unexpected closing tag"))?;
                if depth == 1 {
                    current = None;
                }
            }
            Event::Text(t) => {
                if depth == 2
                    && let Some(slot) = current
                {
                    let text = t.unescape().map_err(malformed)?;
                    if let Some(buf) = reply.slot_mut(slot) {
                        buf.push_str(&text);
                    }
                } else if depth == 0 && !t.iter().all(u8::is_ascii_whitespace) {
                    return Err(malformed("text outside root element"));
                }
            }
            Event::CData(c) => {
                if depth == 2
                    && let Some(slot) = current
                    && let Some(buf) = reply.slot_mut(slot)
                {
                    buf.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(malformed("no root element"));
    }
    if depth != 0 {
        return Err(malformed("unclosed element"));
    }
    Ok(reply)
}

/// Decode a SimPLEX XML reply.
///
/// `<msg><status>N</status>[<error>TEXT</error>][<data>TEXT</data>]</msg>`
///
/// An `<error>` element wins over any status and becomes [`Error::Device`].
pub fn parse_response(xml: &str) -> Result<CommandResponse> {
    if xml.trim().is_empty() {
        return Err(Error::protocol("empty response"));
    }

    let reply = read_reply(xml)?;

    let status_text = reply
        .status
        .ok_or_else(|| Error::protocol("status required"))?;
    let code: i64 = status_text
        .trim()
        .parse()
        .map_err(|_| Error::protocol(format!("invalid status {:?}", status_text.trim())))?;
    let status = Status::try_from(code)?;

    if let Some(msg) = reply.error {
        return Err(Error::Device(msg));
    }

    Ok(CommandResponse::new(status, reply.data))
}
