use core::fmt;

use alloc::{
    collections::btree_map::BTreeMap,
    string::{String, ToString},
    sync::Arc,
    vec::Vec,
};

use log::{debug, info};
use rdif_clk::ClockId;

use crate::{
    clock::{ClockKind, ClockUnit},
    config::ChannelDescriptor,
    error::{CmuError, Collision},
    gate::CallGate,
};

/// Largest channel index a registry will address.
pub const MAX_CHANNEL_INDEX: u32 = 1023;

/// Clock units of one CMU block, reachable by channel index and by name.
///
/// Channel slots cover `0..=max_index`; slots nothing was registered at stay
/// `None`.
pub struct Registry {
    gate: Arc<dyn CallGate>,
    pll: Option<Arc<ClockUnit>>,
    channels: Vec<Option<Arc<ClockUnit>>>,
    names: BTreeMap<String, Arc<ClockUnit>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("pll", &self.pll)
            .field("channels", &self.channels)
            .field("names", &self.names)
            .finish_non_exhaustive()
    }
}

impl Registry {
    pub fn new(gate: Arc<dyn CallGate>) -> Self {
        Self {
            gate,
            pll: None,
            channels: Vec::new(),
            names: BTreeMap::new(),
        }
    }

    pub fn register_pll(
        &mut self,
        name: &str,
        reference_rate: u64,
        id: u32,
    ) -> Result<Arc<ClockUnit>, CmuError> {
        if self.pll.is_some() {
            return Err(Collision::Pll(name.to_string()).into());
        }
        if self.names.contains_key(name) {
            return Err(Collision::Name(name.to_string()).into());
        }

        let pll = Arc::new(ClockUnit::new_pll(
            name.to_string(),
            ClockId::new(id),
            reference_rate,
            self.gate.clone(),
        ));
        debug!("add {name}, pll@{id:#x}, reference {reference_rate} Hz");

        self.names.insert(name.to_string(), pll.clone());
        self.pll = Some(pll.clone());
        Ok(pll)
    }

    /// Makes slots `0..=max_index` addressable. Never shrinks.
    pub fn reserve_channels(&mut self, max_index: u32) -> Result<(), CmuError> {
        if max_index > MAX_CHANNEL_INDEX {
            return Err(CmuError::AllocationFailure {
                what: "channel index space",
            });
        }
        let want = max_index as usize + 1;
        if want <= self.channels.len() {
            return Ok(());
        }
        self.channels.try_reserve_exact(want - self.channels.len())?;
        self.channels.resize_with(want, || None);
        Ok(())
    }

    pub fn register_channel(
        &mut self,
        name: &str,
        index: u32,
        pll: &ClockUnit,
    ) -> Result<Arc<ClockUnit>, CmuError> {
        let owned = self
            .pll
            .as_deref()
            .is_some_and(|own| core::ptr::eq(own, pll));
        if !owned || !matches!(pll.kind(), ClockKind::Pll { .. }) {
            return Err(CmuError::UnknownParent {
                name: name.to_string(),
            });
        }
        if self.names.contains_key(name) {
            return Err(Collision::Name(name.to_string()).into());
        }
        if self.lookup_by_index(index).is_some() {
            return Err(Collision::Index(index).into());
        }

        self.reserve_channels(index)?;

        let ch = Arc::new(ClockUnit::new_channel(
            name.to_string(),
            ClockId::new(index),
            pll.id(),
            self.gate.clone(),
        ));
        info!("clkch <{name}>, index {index}, pll {}", pll.name());

        self.channels[index as usize] = Some(ch.clone());
        self.names.insert(name.to_string(), ch.clone());
        Ok(ch)
    }

    /// Registers all `channels` under `pll`: first sizes the slots by the
    /// largest declared index, then places each channel at its index in the
    /// order given.
    pub fn register_channels(
        &mut self,
        channels: &[ChannelDescriptor],
        pll: &ClockUnit,
    ) -> Result<Vec<Arc<ClockUnit>>, CmuError> {
        let Some(max_index) = channels.iter().map(|c| c.index).max() else {
            return Ok(Vec::new());
        };
        self.reserve_channels(max_index)?;

        let mut out = Vec::new();
        out.try_reserve_exact(channels.len())?;
        for ch in channels {
            out.push(self.register_channel(&ch.name, ch.index, pll)?);
        }
        Ok(out)
    }

    pub fn lookup_by_index(&self, index: u32) -> Option<Arc<ClockUnit>> {
        self.channels.get(index as usize)?.clone()
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<Arc<ClockUnit>> {
        self.names.get(name).cloned()
    }

    pub fn pll(&self) -> Option<Arc<ClockUnit>> {
        self.pll.clone()
    }

    /// Populated channel slots in index order.
    pub fn channels(&self) -> impl Iterator<Item = (u32, &Arc<ClockUnit>)> {
        self.channels
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|ch| (i as u32, ch)))
    }

    /// Number of addressable channel slots, populated or not.
    pub fn slots(&self) -> usize {
        self.channels.len()
    }

    /// Number of registered units, PLL included.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// What this block publishes to consumers, once a PLL exists.
    pub fn provider(&self) -> Option<Provider<'_>> {
        let pll = self.pll.as_ref()?;
        if self.channels().next().is_none() {
            Some(Provider::Single(pll))
        } else {
            Some(Provider::Indexed(&self.channels))
        }
    }
}

/// Index-based view handed to consumers.
pub enum Provider<'a> {
    /// No channels: every index resolves to the PLL.
    Single(&'a Arc<ClockUnit>),
    /// Index resolves to the channel slot; holes and out-of-range are absent.
    Indexed(&'a [Option<Arc<ClockUnit>>]),
}

impl Provider<'_> {
    pub fn get(&self, index: u32) -> Option<Arc<ClockUnit>> {
        match self {
            Self::Single(pll) => Some(Arc::clone(pll)),
            Self::Indexed(slots) => slots.get(index as usize)?.clone(),
        }
    }

    pub fn outputs(&self) -> Vec<Arc<ClockUnit>> {
        match self {
            Self::Single(pll) => alloc::vec![Arc::clone(pll)],
            Self::Indexed(slots) => slots.iter().flatten().cloned().collect(),
        }
    }
}
