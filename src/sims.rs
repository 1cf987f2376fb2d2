//! Index of SimPLEX scenario files on the simulator host.
//!
//! The index is a flat text file with one `index,filepath` entry per line,
//! e.g. `3,C:\scenarios\static_open_sky.sim`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

pub const DEFAULT_SIMS_PATH: &str = "./sim_scenarios.txt";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioIndex {
    entries: BTreeMap<u32, String>,
}

impl ScenarioIndex {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut entries = BTreeMap::new();
        for (i, line) in text.lines().enumerate() {
            let line = line.trim_end();
            if line.trim().is_empty() {
                continue;
            }
            let bad = |reason: &str| Error::ScenarioIndex {
                line: i + 1,
                reason: reason.to_string(),
            };
            let (key, path) = line
                .split_once(',')
                .ok_or_else(|| bad("expected `index,filepath`"))?;
            let key: u32 = key
                .trim()
                .parse()
                .map_err(|_| bad(&format!("invalid index {:?}", key.trim())))?;
            entries.insert(key, path.to_string());
        }
        Ok(Self { entries })
    }

    pub fn get(&self, index: u32) -> Option<&str> {
        self.entries.get(&index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }
}
