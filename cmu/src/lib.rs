//! Clock Management Unit driver.
//!
//! A CMU block is one PLL plus any number of channels divided from it. None of
//! them are touched directly: every operation becomes one request through a
//! [`CallGate`] to the firmware that owns the hardware.
//!
//! ```
//! use std::sync::Arc;
//!
//! use baikal_cmu::{CmuConfig, bring_up, sim::SimulatedCmu};
//! use rdif_clk::Interface;
//!
//! let firmware = SimulatedCmu::new()
//!     .with_pll(3, 25_000_000, 40)
//!     .with_channel(3, 2, 8);
//! let config = CmuConfig::new("sys0", 25_000_000, 3).with_channel("uart", 2);
//!
//! let cmu = bring_up(&config, Arc::new(firmware)).unwrap();
//! let uart = cmu.lookup_by_name("uart").unwrap();
//! assert!(uart.is_enabled());
//! assert_eq!(uart.get_rate(0), 125_000_000);
//! ```
#![no_std]

extern crate alloc;

mod bringup;
mod clock;
mod config;
mod error;
#[cfg(feature = "fdt")]
pub mod fdt;
pub mod gate;
mod registry;
pub mod sim;

pub use bringup::{BringUp, Stage, bring_up};
pub use clock::{ClockKind, ClockUnit};
pub use config::{ChannelDescriptor, CmuConfig, PllDescriptor};
pub use error::{CmuError, Collision};
pub use gate::{CallGate, Command, Operation, Request};
pub use rdif_clk::{ClkError, ClockId, Hardware, Interface};
pub use registry::{MAX_CHANNEL_INDEX, Provider, Registry};
