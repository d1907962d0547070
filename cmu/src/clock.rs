use alloc::{string::String, sync::Arc};
use core::fmt;

use log::{debug, warn};
use rdif_clk::{ClkError, ClockId, Interface};

use crate::gate::{CallGate, Command, Operation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockKind {
    /// Synthesized from a fixed reference frequency, in Hz.
    Pll { reference_rate: u64 },
    /// Divided down from the PLL with id `pll`.
    Channel { pll: ClockId },
}

/// One PLL or channel of the CMU.
///
/// Holds identity only; enabled state and rate live in firmware and are
/// queried on every call.
pub struct ClockUnit {
    id: ClockId,
    name: String,
    kind: ClockKind,
    gate: Arc<dyn CallGate>,
}

impl ClockUnit {
    pub(crate) fn new_pll(
        name: String,
        id: ClockId,
        reference_rate: u64,
        gate: Arc<dyn CallGate>,
    ) -> Self {
        Self {
            id,
            name,
            kind: ClockKind::Pll { reference_rate },
            gate,
        }
    }

    pub(crate) fn new_channel(
        name: String,
        id: ClockId,
        pll: ClockId,
        gate: Arc<dyn CallGate>,
    ) -> Self {
        Self {
            id,
            name,
            kind: ClockKind::Channel { pll },
            gate,
        }
    }

    pub fn id(&self) -> ClockId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ClockKind {
        self.kind
    }

    pub fn is_channel(&self) -> bool {
        matches!(self.kind, ClockKind::Channel { .. })
    }

    /// Value carried in the reference slot when no rate hint applies:
    /// the reference frequency of a PLL, the owning PLL id of a channel.
    pub fn parent(&self) -> u64 {
        match self.kind {
            ClockKind::Pll { reference_rate } => reference_rate,
            ClockKind::Channel { pll } => u32::from(pll) as u64,
        }
    }

    /// Current rate, using the stored reference frequency as the PLL's
    /// parent rate.
    pub fn rate(&self) -> u64 {
        self.get_rate(self.parent())
    }

    fn command(&self, op: Operation) -> Command {
        Command {
            op,
            channel: self.is_channel(),
        }
    }

    /// Channels address their divider through the PLL id and ignore the hint.
    fn reference(&self, parent_rate: u64) -> u64 {
        match self.kind {
            ClockKind::Pll { .. } => parent_rate,
            ClockKind::Channel { pll } => u32::from(pll) as u64,
        }
    }

    fn call(&self, op: Operation, rate: u64, reference: u64) -> i64 {
        self.gate.invoke(self.id.raw(), self.command(op), rate, reference)
    }

    fn kind_str(&self) -> &'static str {
        if self.is_channel() { "clkch" } else { "pll" }
    }

    fn check(&self, op: Operation, res: i64) -> Result<(), ClkError> {
        if res == 0 {
            Ok(())
        } else {
            Err(ClkError::RemoteCallFailure {
                id: self.id,
                op: op.name(),
                code: res,
            })
        }
    }

    fn to_rate(&self, op: Operation, res: i64) -> u64 {
        if res < 0 {
            warn!(
                "{}({}, {}@{:#x}): firmware error {}",
                op.name(),
                self.name,
                self.kind_str(),
                self.id.raw(),
                res
            );
            return 0;
        }
        res as u64
    }
}

impl Interface for ClockUnit {
    fn enable(&self) -> Result<(), ClkError> {
        let res = self.call(Operation::Enable, 0, self.parent());
        debug!(
            "enable({}, {}@{:#x}): {}",
            self.name,
            self.kind_str(),
            self.id.raw(),
            if res != 0 { "error" } else { "ok" }
        );
        self.check(Operation::Enable, res)
    }

    fn disable(&self) {
        let res = self.call(Operation::Disable, 0, self.parent());
        debug!(
            "disable({}, {}@{:#x}): {}",
            self.name,
            self.kind_str(),
            self.id.raw(),
            if res != 0 { "error" } else { "ok" }
        );
    }

    fn is_enabled(&self) -> bool {
        let res = self.call(Operation::IsEnabled, 0, self.parent());
        debug!(
            "is_enabled({}, {}@{:#x}): {}",
            self.name,
            self.kind_str(),
            self.id.raw(),
            res != 0
        );
        res != 0
    }

    fn get_rate(&self, parent_rate: u64) -> u64 {
        let res = self.call(Operation::GetRate, 0, self.reference(parent_rate));
        debug!(
            "get_rate({}, {}@{:#x}): {} Hz",
            self.name,
            self.kind_str(),
            self.id.raw(),
            res
        );
        self.to_rate(Operation::GetRate, res)
    }

    fn set_rate(&self, rate: u64, parent_rate: u64) -> Result<(), ClkError> {
        let res = self.call(Operation::SetRate, rate, self.reference(parent_rate));
        debug!(
            "set_rate({}, {}@{:#x}, {} Hz): {}",
            self.name,
            self.kind_str(),
            self.id.raw(),
            rate,
            if res != 0 { "error" } else { "ok" }
        );
        self.check(Operation::SetRate, res)
    }

    fn round_rate(&self, rate: u64, parent_rate: &mut u64) -> u64 {
        let res = self.call(Operation::RoundRate, rate, self.reference(*parent_rate));
        debug!(
            "round_rate({}, {}@{:#x}): {} Hz",
            self.name,
            self.kind_str(),
            self.id.raw(),
            res
        );
        self.to_rate(Operation::RoundRate, res)
    }
}

impl fmt::Debug for ClockUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClockUnit")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}
