use alloc::{
    collections::BTreeSet,
    string::{String, ToString},
    vec::Vec,
};

use crate::error::{CmuError, Collision};

/// The PLL of one CMU block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PllDescriptor {
    pub name: String,
    /// Frequency of the fixed reference feeding the PLL, in Hz.
    pub reference_rate: u64,
    /// Firmware id of the PLL (`cmu-id`).
    pub id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelDescriptor {
    pub name: String,
    pub index: u32,
}

/// Everything bring-up needs to know about one CMU block.
///
/// Channels keep the order the configuration source lists them in; indices
/// may be sparse and unordered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmuConfig {
    pub pll: PllDescriptor,
    pub channels: Vec<ChannelDescriptor>,
}

impl CmuConfig {
    pub fn new(name: &str, reference_rate: u64, id: u32) -> Self {
        Self {
            pll: PllDescriptor {
                name: name.to_string(),
                reference_rate,
                id,
            },
            channels: Vec::new(),
        }
    }

    pub fn with_channel(mut self, name: &str, index: u32) -> Self {
        self.channels.push(ChannelDescriptor {
            name: name.to_string(),
            index,
        });
        self
    }

    /// Largest declared channel index, if any channel is declared.
    pub fn max_index(&self) -> Option<u32> {
        self.channels.iter().map(|c| c.index).max()
    }

    /// Rejects name and index collisions before anything is constructed.
    pub fn validate(&self) -> Result<(), CmuError> {
        if self.pll.name.is_empty() {
            return Err(CmuError::InvalidConfig("PLL has no name".to_string()));
        }

        let mut names = BTreeSet::new();
        let mut indices = BTreeSet::new();
        names.insert(self.pll.name.as_str());

        for ch in &self.channels {
            if ch.name.is_empty() {
                return Err(CmuError::InvalidConfig(alloc::format!(
                    "channel at index {} has no name",
                    ch.index
                )));
            }
            if !names.insert(ch.name.as_str()) {
                return Err(Collision::Name(ch.name.clone()).into());
            }
            if !indices.insert(ch.index) {
                return Err(Collision::Index(ch.index).into());
            }
        }
        Ok(())
    }
}
