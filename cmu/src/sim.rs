//! In-memory model of the CMU firmware, for hosted runs and tests.
//!
//! PLL output is `reference * multiplier`, channel output is
//! `pll_output / divider`. Every answer follows the same result-word
//! conventions the real firmware uses.

use alloc::collections::btree_map::BTreeMap;

use spin::Mutex;

use crate::gate::{CallGate, Command, Operation};

pub const MAX_PLL_MULT: u64 = 120;
pub const MAX_CH_DIV: u64 = 4096;

const EINVAL: i64 = 22;
const ENODEV: i64 = 19;

#[derive(Debug, Clone, Copy)]
struct PllState {
    reference: u64,
    mult: u64,
    enabled: bool,
}

#[derive(Debug, Clone, Copy)]
struct ChannelState {
    divider: u64,
    enabled: bool,
}

#[derive(Default)]
struct State {
    plls: BTreeMap<u32, PllState>,
    channels: BTreeMap<(u32, u32), ChannelState>,
    faults: BTreeMap<Command, i64>,
    calls: BTreeMap<Command, usize>,
}

#[derive(Default)]
pub struct SimulatedCmu {
    state: Mutex<State>,
}

impl SimulatedCmu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares PLL `id` fed by `reference` Hz, running at `reference * mult`.
    pub fn with_pll(self, id: u32, reference: u64, mult: u64) -> Self {
        self.state.lock().plls.insert(
            id,
            PllState {
                reference,
                mult: mult.clamp(1, MAX_PLL_MULT),
                enabled: false,
            },
        );
        self
    }

    /// Declares channel `index` of PLL `pll`.
    pub fn with_channel(self, pll: u32, index: u32, divider: u64) -> Self {
        self.state.lock().channels.insert(
            (pll, index),
            ChannelState {
                divider: divider.clamp(1, MAX_CH_DIV),
                enabled: false,
            },
        );
        self
    }

    /// Makes every `command` answer `code` until cleared with
    /// [`SimulatedCmu::clear_faults`].
    pub fn fail_command(&self, command: Command, code: i64) {
        self.state.lock().faults.insert(command, code);
    }

    pub fn clear_faults(&self) {
        self.state.lock().faults.clear();
    }

    /// How many times `command` reached the firmware.
    pub fn calls(&self, command: Command) -> usize {
        self.state.lock().calls.get(&command).copied().unwrap_or(0)
    }

    pub fn pll_enabled(&self, id: u32) -> Option<bool> {
        self.state.lock().plls.get(&id).map(|p| p.enabled)
    }

    pub fn channel_enabled(&self, pll: u32, index: u32) -> Option<bool> {
        self.state.lock().channels.get(&(pll, index)).map(|c| c.enabled)
    }

    pub fn channel_divider(&self, pll: u32, index: u32) -> Option<u64> {
        self.state.lock().channels.get(&(pll, index)).map(|c| c.divider)
    }
}

impl State {
    fn pll_call(&mut self, id: u32, op: Operation, rate: u64, reference: u64) -> i64 {
        let Some(pll) = self.plls.get_mut(&id) else {
            return -ENODEV;
        };

        match op {
            Operation::Enable => {
                pll.enabled = true;
                0
            }
            Operation::Disable => {
                pll.enabled = false;
                0
            }
            Operation::IsEnabled => pll.enabled as i64,
            Operation::GetRate => rate_word(reference.checked_mul(pll.mult)),
            Operation::RoundRate => {
                rate_word(pll_mult(rate, reference).and_then(|m| reference.checked_mul(m)))
            }
            Operation::SetRate => match pll_mult(rate, reference) {
                Some(mult) => {
                    pll.mult = mult;
                    0
                }
                None => -EINVAL,
            },
        }
    }

    fn channel_call(&mut self, index: u32, op: Operation, rate: u64, pll_id: u64) -> i64 {
        let Ok(pll_id) = u32::try_from(pll_id) else {
            return -ENODEV;
        };
        let Some(pll) = self.plls.get(&pll_id).copied() else {
            return -ENODEV;
        };
        let Some(ch) = self.channels.get_mut(&(pll_id, index)) else {
            return -ENODEV;
        };
        let Some(source) = pll.reference.checked_mul(pll.mult) else {
            return -EINVAL;
        };

        match op {
            Operation::Enable => {
                ch.enabled = true;
                0
            }
            Operation::Disable => {
                ch.enabled = false;
                0
            }
            Operation::IsEnabled => ch.enabled as i64,
            Operation::GetRate => rate_word(Some(source / ch.divider)),
            Operation::RoundRate => rate_word(ch_divider(rate, source).map(|div| source / div)),
            Operation::SetRate => match ch_divider(rate, source) {
                Some(div) => {
                    ch.divider = div;
                    0
                }
                None => -EINVAL,
            },
        }
    }
}

/// Nearest multiplier producing `rate` from `reference`.
fn pll_mult(rate: u64, reference: u64) -> Option<u64> {
    if rate == 0 || reference == 0 {
        return None;
    }
    let half = reference / 2;
    let mult = rate / reference + u64::from(rate % reference >= reference - half);
    (1..=MAX_PLL_MULT).contains(&mult).then_some(mult)
}

/// Result word for a rate; rates the word cannot carry answer `-EINVAL`.
fn rate_word(hz: Option<u64>) -> i64 {
    hz.and_then(|hz| i64::try_from(hz).ok()).unwrap_or(-EINVAL)
}

/// Smallest divider whose output does not exceed `rate`.
fn ch_divider(rate: u64, source: u64) -> Option<u64> {
    if rate == 0 || source == 0 {
        return None;
    }
    Some(source.div_ceil(rate).clamp(1, MAX_CH_DIV))
}

impl CallGate for SimulatedCmu {
    fn invoke(&self, target: u32, command: Command, rate: u64, reference: u64) -> i64 {
        let mut state = self.state.lock();
        *state.calls.entry(command).or_default() += 1;

        if let Some(code) = state.faults.get(&command) {
            return *code;
        }

        if command.channel {
            state.channel_call(target, command.op, rate, reference)
        } else {
            state.pll_call(target, command.op, rate, reference)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REF: u64 = 25_000_000;

    fn firmware() -> SimulatedCmu {
        SimulatedCmu::new().with_pll(3, REF, 40).with_channel(3, 2, 8)
    }

    #[test]
    fn test_pll_rate() {
        let fw = firmware();
        let get = Command::pll(Operation::GetRate);
        assert_eq!(fw.invoke(3, get, 0, REF), 1_000_000_000);

        let set = Command::pll(Operation::SetRate);
        assert_eq!(fw.invoke(3, set, 1_200_000_000, REF), 0);
        assert_eq!(fw.invoke(3, get, 0, REF), 1_200_000_000);

        assert_eq!(fw.invoke(3, set, 0, REF), -EINVAL);
        assert_eq!(fw.invoke(3, set, REF * (MAX_PLL_MULT + 1), REF), -EINVAL);
    }

    #[test]
    fn test_extreme_arguments() {
        let fw = firmware();
        let set = Command::pll(Operation::SetRate);
        let get = Command::pll(Operation::GetRate);
        let round = Command::pll(Operation::RoundRate);

        assert_eq!(fw.invoke(3, set, u64::MAX, REF), -EINVAL);
        assert_eq!(fw.invoke(3, round, u64::MAX, REF), -EINVAL);
        assert_eq!(fw.invoke(3, get, 0, REF), 1_000_000_000);

        assert_eq!(fw.invoke(3, get, 0, u64::MAX), -EINVAL);
        assert_eq!(fw.invoke(3, set, 1_000_000_000, u64::MAX), -EINVAL);
        assert_eq!(fw.invoke(3, round, u64::MAX, u64::MAX), -EINVAL);
        assert_eq!(fw.invoke(3, get, 0, u64::MAX / 40), -EINVAL);

        let ch_round = Command::channel(Operation::RoundRate);
        assert_eq!(fw.invoke(2, ch_round, u64::MAX, 3), 1_000_000_000);
        assert_eq!(fw.invoke(2, Command::channel(Operation::SetRate), u64::MAX, 3), 0);
        assert_eq!(fw.channel_divider(3, 2), Some(1));
    }

    #[test]
    fn test_pll_round_rate() {
        let fw = firmware();
        let round = Command::pll(Operation::RoundRate);
        assert_eq!(fw.invoke(3, round, 1_010_000_000, REF), 1_000_000_000);
        assert_eq!(fw.invoke(3, round, 1_020_000_000, REF), 1_025_000_000);
    }

    #[test]
    fn test_channel_follows_pll() {
        let fw = firmware();
        let get = Command::channel(Operation::GetRate);
        assert_eq!(fw.invoke(2, get, 0, 3), 125_000_000);

        fw.invoke(3, Command::pll(Operation::SetRate), 500_000_000, REF);
        assert_eq!(fw.invoke(2, get, 0, 3), 62_500_000);
    }

    #[test]
    fn test_channel_round_rate_not_above_request() {
        let fw = firmware();
        let round = Command::channel(Operation::RoundRate);
        assert_eq!(fw.invoke(2, round, 300_000_000, 3), 250_000_000);
        assert_eq!(fw.invoke(2, round, 1, 3), 1_000_000_000 / MAX_CH_DIV as i64);
        assert_eq!(fw.invoke(2, round, 0, 3), -EINVAL);
    }

    #[test]
    fn test_unknown_targets() {
        let fw = firmware();
        assert_eq!(fw.invoke(9, Command::pll(Operation::Enable), 0, REF), -ENODEV);
        assert_eq!(fw.invoke(5, Command::channel(Operation::Enable), 0, 3), -ENODEV);
        assert_eq!(fw.invoke(2, Command::channel(Operation::Enable), 0, REF), -ENODEV);
    }

    #[test]
    fn test_gating() {
        let fw = firmware();
        let is_enabled = Command::channel(Operation::IsEnabled);
        assert_eq!(fw.invoke(2, is_enabled, 0, 3), 0);

        fw.invoke(2, Command::channel(Operation::Enable), 0, 3);
        assert_eq!(fw.invoke(2, is_enabled, 0, 3), 1);
        assert_eq!(fw.channel_enabled(3, 2), Some(true));
        assert_eq!(fw.pll_enabled(3), Some(false));

        fw.invoke(2, Command::channel(Operation::Disable), 0, 3);
        assert_eq!(fw.channel_enabled(3, 2), Some(false));
    }

    #[test]
    fn test_faults_and_counters() {
        let fw = firmware();
        let set = Command::channel(Operation::SetRate);
        fw.fail_command(set, -EINVAL);

        assert_eq!(fw.invoke(2, set, 100_000_000, 3), -EINVAL);
        assert_eq!(fw.channel_divider(3, 2), Some(8));
        assert_eq!(fw.calls(set), 1);

        fw.clear_faults();
        assert_eq!(fw.invoke(2, set, 100_000_000, 3), 0);
        assert_eq!(fw.channel_divider(3, 2), Some(10));
        assert_eq!(fw.calls(set), 2);
    }
}
