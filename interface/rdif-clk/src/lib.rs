#![no_std]

extern crate alloc;

use alloc::sync::Arc;

#[macro_use]
mod _macro;

pub type Hardware = Arc<dyn Interface>;

custom_type!(
    #[doc = "Numeric identity of a clock unit, unique within its kind."]
    ClockId,
    u32,
    "{:#x}"
);

/// A clock that can be gated and retuned.
///
/// Every method is a pass-through to whatever owns the hardware; implementors
/// keep no enabled/rate cache, so handles can be shared freely.
pub trait Interface: Send + Sync {
    fn enable(&self) -> Result<(), ClkError>;

    /// Gate the clock. The hardware is assumed to always accept this.
    fn disable(&self);

    fn is_enabled(&self) -> bool;

    /// Current output rate in Hz. `parent_rate` is the rate of whatever feeds
    /// this clock; implementors whose input is not frequency-described ignore it.
    fn get_rate(&self, parent_rate: u64) -> u64;

    fn set_rate(&self, rate: u64, parent_rate: u64) -> Result<(), ClkError>;

    /// Closest rate the hardware can produce for `rate`.
    ///
    /// `parent_rate` is read but never written back.
    fn round_rate(&self, rate: u64, parent_rate: &mut u64) -> u64;
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ClkError {
    #[error("clock {id}: `{op}` rejected by firmware with code {code}")]
    RemoteCallFailure {
        id: ClockId,
        op: &'static str,
        code: i64,
    },
}

impl ClkError {
    pub fn code(&self) -> i64 {
        match self {
            Self::RemoteCallFailure { code, .. } => *code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_id_format() {
        let id = ClockId::from(0x1f);
        assert_eq!(alloc::format!("{id:?}"), "0x1f");
        assert_eq!(u32::from(id), 0x1f);
    }

    #[test]
    fn test_error_code() {
        let err = ClkError::RemoteCallFailure {
            id: ClockId::new(3),
            op: "set_rate",
            code: -22,
        };
        assert_eq!(err.code(), -22);
        assert_eq!(
            alloc::format!("{err}"),
            "clock 0x3: `set_rate` rejected by firmware with code -22"
        );
    }
}
