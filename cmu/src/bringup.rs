//! One-shot construction of a CMU block from its configuration.
//!
//! The sequence is linear and fail-fast. A registry is only handed out once
//! the sequence reaches [`Stage::Ready`]; on failure it is dropped, so no
//! consumer ever sees a partially built block.

use alloc::{string::String, sync::Arc, vec::Vec};

use log::{debug, error, info, warn};
use rdif_clk::Interface;

use crate::{
    clock::ClockUnit, config::CmuConfig, error::CmuError, gate::CallGate, registry::Registry,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    AllocPll,
    RegisterPll,
    EnablePll,
    AllocChannels,
    RegisterChannels,
    EnableChannels,
    Ready,
    Failed,
}

pub struct BringUp {
    stage: Stage,
    rejected: Vec<String>,
}

impl BringUp {
    pub fn new() -> Self {
        Self {
            stage: Stage::Start,
            rejected: Vec::new(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Clocks whose eager enable firmware refused.
    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }

    pub fn run(
        &mut self,
        config: &CmuConfig,
        gate: Arc<dyn CallGate>,
    ) -> Result<Registry, CmuError> {
        let name = config.pll.name.as_str();
        match self.sequence(config, gate) {
            Ok(registry) => {
                self.advance(Stage::Ready);
                info!("{name}: brought up, {} clocks", registry.len());
                Ok(registry)
            }
            Err(e) => {
                error!("{name}: bring-up failed at {:?}: {e}", self.stage);
                self.stage = Stage::Failed;
                Err(e)
            }
        }
    }

    fn sequence(
        &mut self,
        config: &CmuConfig,
        gate: Arc<dyn CallGate>,
    ) -> Result<Registry, CmuError> {
        self.advance(Stage::AllocPll);
        config.validate()?;
        let mut registry = Registry::new(gate);

        self.advance(Stage::RegisterPll);
        let pll = &config.pll;
        let pll = registry.register_pll(&pll.name, pll.reference_rate, pll.id)?;

        self.advance(Stage::EnablePll);
        self.enable(&pll);

        let Some(max_index) = config.max_index() else {
            return Ok(registry);
        };

        self.advance(Stage::AllocChannels);
        registry.reserve_channels(max_index)?;

        for ch in &config.channels {
            self.advance(Stage::RegisterChannels);
            let unit = registry.register_channel(&ch.name, ch.index, &pll)?;

            self.advance(Stage::EnableChannels);
            self.enable(&unit);
        }

        Ok(registry)
    }

    fn advance(&mut self, next: Stage) {
        if self.stage != next {
            debug!("bring-up: {:?} -> {:?}", self.stage, next);
            self.stage = next;
        }
    }

    fn enable(&mut self, unit: &ClockUnit) {
        if let Err(e) = unit.enable() {
            warn!("{}: eager enable failed: {e}", unit.name());
            self.rejected.push(unit.name().into());
        }
    }
}

impl Default for BringUp {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds, registers and starts every clock `config` declares.
pub fn bring_up(config: &CmuConfig, gate: Arc<dyn CallGate>) -> Result<Registry, CmuError> {
    BringUp::new().run(config, gate)
}
