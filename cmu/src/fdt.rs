//! Device tree binding for `compatible = "baikal,cmu"` nodes.
//!
//! ```text
//! cmu@... {
//!     compatible = "baikal,cmu";
//!     clock-output-names = "sys0";
//!     clock-frequency = <25000000>;
//!     cmu-id = <3>;
//!     clock-indices = <2 7>;
//!     clock-names = "uart", "spi";
//! };
//! ```

use alloc::{format, sync::Arc, vec::Vec};
use core::ptr::NonNull;

use fdt_parser::{Fdt, Node, Status};
use log::{debug, warn};

use crate::{
    bringup::bring_up, config::CmuConfig, error::CmuError, gate::CallGate, registry::Registry,
};

pub const COMPATIBLE: &str = "baikal,cmu";

impl CmuConfig {
    /// Reads one CMU node. Only a short `clock-names` list is an error; the
    /// PLL name falls back to the node name and a missing `clock-frequency`
    /// or `cmu-id` reads as 0.
    pub fn from_fdt_node(node: &Node<'_>) -> Result<Self, CmuError> {
        let name = node
            .find_property("clock-output-names")
            .map(|p| p.str())
            .unwrap_or_else(|| node.name());
        let reference_rate = node
            .find_property("clock-frequency")
            .map(|p| p.u32() as u64)
            .unwrap_or_else(|| {
                warn!("{name}: no `clock-frequency`, assuming 0");
                0
            });
        let id = node
            .find_property("cmu-id")
            .map(|p| p.u32())
            .unwrap_or_else(|| {
                warn!("{name}: no `cmu-id`, assuming 0");
                0
            });

        let mut config = CmuConfig::new(name, reference_rate, id);

        let Some(indices) = node.find_property("clock-indices") else {
            return Ok(config);
        };
        let names = node
            .find_property("clock-names")
            .map(|p| p.str_list().collect::<Vec<_>>())
            .unwrap_or_default();

        for (i, index) in indices.u32_list().enumerate() {
            let ch_name = names.get(i).ok_or_else(|| {
                CmuError::InvalidConfig(format!("{name}: no clock-names entry for index {index}"))
            })?;
            config = config.with_channel(ch_name, index);
        }

        Ok(config)
    }
}

/// Configurations of every enabled CMU node in the tree.
pub fn find_all(fdt: &Fdt<'_>) -> Result<Vec<CmuConfig>, CmuError> {
    let mut out = Vec::new();
    for node in fdt.all_nodes() {
        if matches!(node.status(), Some(Status::Disabled)) {
            continue;
        }
        if !node.compatibles().any(|c| c == COMPATIBLE) {
            continue;
        }
        let config = CmuConfig::from_fdt_node(&node)?;
        debug!(
            "found {COMPATIBLE} `{}` with {} channels",
            config.pll.name,
            config.channels.len()
        );
        out.push(config);
    }
    Ok(out)
}

/// Brings up every CMU described by the device tree at `fdt_addr`.
///
/// Stops at the first block that fails.
pub fn bring_up_tree(
    fdt_addr: NonNull<u8>,
    gate: Arc<dyn CallGate>,
) -> Result<Vec<Registry>, CmuError> {
    let fdt = Fdt::from_ptr(fdt_addr).map_err(|e| CmuError::InvalidConfig(format!("{e:?}")))?;
    find_all(&fdt)?
        .iter()
        .map(|config| bring_up(config, gate.clone()))
        .collect()
}
