//! Call gate client: the single privileged boundary every clock operation
//! crosses. One request in, one signed result word out, no retries.

use core::fmt;

/// Function id of the firmware service that owns the CMU hardware.
pub const BAIKAL_SMC_LCRU_ID: u32 = 0x8200_0000;

/// Offset between a PLL command code and the matching channel command code.
const CHANNEL_CMD_BASE: u32 = 6;

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    SetRate = 0,
    GetRate = 1,
    Enable = 2,
    Disable = 3,
    RoundRate = 4,
    IsEnabled = 5,
}

impl Operation {
    pub const fn name(self) -> &'static str {
        match self {
            Self::SetRate => "set_rate",
            Self::GetRate => "get_rate",
            Self::Enable => "enable",
            Self::Disable => "disable",
            Self::RoundRate => "round_rate",
            Self::IsEnabled => "is_enabled",
        }
    }
}

/// An operation addressed at one kind of clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Command {
    pub op: Operation,
    pub channel: bool,
}

impl Command {
    pub const fn pll(op: Operation) -> Self {
        Self { op, channel: false }
    }

    pub const fn channel(op: Operation) -> Self {
        Self { op, channel: true }
    }

    /// Wire code: `0..=5` for PLLs, `6..=11` for channels.
    pub const fn code(self) -> u32 {
        if self.channel {
            CHANNEL_CMD_BASE + self.op as u32
        } else {
            self.op as u32
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.channel { "CLK_CH" } else { "PLL" };
        let op = match self.op {
            Operation::SetRate => "SET_RATE",
            Operation::GetRate => "GET_RATE",
            Operation::Enable => "ENABLE",
            Operation::Disable => "DISABLE",
            Operation::RoundRate => "ROUND_RATE",
            Operation::IsEnabled => "IS_ENABLED",
        };
        write!(f, "CMU_{kind}_{op}")
    }
}

/// One exchange across the gate, as seen by the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    pub target: u32,
    pub command: Command,
    pub rate: u64,
    pub reference: u64,
}

/// Synchronous request/response channel to the firmware owning the clocks.
///
/// Implementations perform exactly one exchange per call and report the
/// result word verbatim. Concurrent callers are serialized by the transport,
/// not by this trait.
pub trait CallGate: Send + Sync {
    fn invoke(&self, target: u32, command: Command, rate: u64, reference: u64) -> i64;
}

cfg_if::cfg_if! {
    if #[cfg(target_arch = "aarch64")] {
        /// Secure monitor call transport (SMCCC, 64-bit calling convention).
        pub struct Smccc {
            function_id: u32,
        }

        impl Smccc {
            pub const fn new(function_id: u32) -> Self {
                Self { function_id }
            }
        }

        impl Default for Smccc {
            fn default() -> Self {
                Self::new(BAIKAL_SMC_LCRU_ID)
            }
        }

        impl CallGate for Smccc {
            fn invoke(&self, target: u32, command: Command, rate: u64, reference: u64) -> i64 {
                let mut a0 = self.function_id as u64;
                // SAFETY: `smc #0` traps into the secure monitor, which only
                // touches the argument/result registers declared here.
                unsafe {
                    core::arch::asm!(
                        "smc #0",
                        inout("x0") a0,
                        inout("x1") target as u64 => _,
                        inout("x2") command.code() as u64 => _,
                        inout("x3") rate => _,
                        inout("x4") reference => _,
                        inout("x5") 0u64 => _,
                        inout("x6") 0u64 => _,
                        inout("x7") 0u64 => _,
                        out("x8") _,
                        out("x9") _,
                        out("x10") _,
                        out("x11") _,
                        out("x12") _,
                        out("x13") _,
                        out("x14") _,
                        out("x15") _,
                        out("x16") _,
                        out("x17") _,
                        options(nostack),
                    );
                }
                a0 as i64
            }
        }
    }
}
