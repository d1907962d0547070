use std::sync::{Arc, Mutex};

use baikal_cmu::{
    CallGate, ClkError, ClockId, CmuConfig, CmuError, Collision, Command, Interface, Operation,
    Provider, Request, bring_up, sim::SimulatedCmu,
};

#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<Request>>,
    set_rate_result: i64,
}

impl Recorder {
    fn failing_set_rate(code: i64) -> Self {
        Self {
            set_rate_result: code,
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<Request> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self, op: Operation) -> usize {
        self.calls().iter().filter(|r| r.command.op == op).count()
    }
}

impl CallGate for Recorder {
    fn invoke(&self, target: u32, command: Command, rate: u64, reference: u64) -> i64 {
        self.calls.lock().unwrap().push(Request {
            target,
            command,
            rate,
            reference,
        });
        match command.op {
            Operation::SetRate => self.set_rate_result,
            _ => 0,
        }
    }
}

fn sys0() -> CmuConfig {
    CmuConfig::new("sys0", 25_000_000, 3)
        .with_channel("uart", 2)
        .with_channel("spi", 7)
}

#[test]
fn test_sys0_bring_up() {
    let gate = Arc::new(Recorder::default());
    let cmu = bring_up(&sys0(), gate.clone()).unwrap();

    for index in [2, 7] {
        assert!(cmu.lookup_by_index(index).is_some());
    }
    for index in [0, 1, 3, 4, 5, 6] {
        assert!(cmu.lookup_by_index(index).is_none());
    }

    let enables = gate
        .calls()
        .into_iter()
        .filter(|r| r.command.op == Operation::Enable)
        .map(|r| (r.command.channel, r.target))
        .collect::<Vec<_>>();
    assert_eq!(enables, vec![(false, 3), (true, 2), (true, 7)]);

    let uart = cmu.lookup_by_name("uart").unwrap();
    uart.get_rate(25_000_000);
    let last = *gate.calls().last().unwrap();
    assert_eq!(last.command, Command::channel(Operation::GetRate));
    assert_eq!(last.target, 2);
    assert_eq!(last.reference, 3);
}

#[test]
fn test_set_rate_failure_surfaces_once() {
    let gate = Arc::new(Recorder::failing_set_rate(-22));
    let cmu = bring_up(&sys0(), gate.clone()).unwrap();

    let pll = cmu.lookup_by_name("sys0").unwrap();
    let err = pll.set_rate(1_000_000_000, 25_000_000).unwrap_err();
    assert!(matches!(err, ClkError::RemoteCallFailure { code: -22, .. }));

    let spi = cmu.lookup_by_name("spi").unwrap();
    let err = spi.set_rate(50_000_000, 0).unwrap_err();
    assert_eq!(
        err,
        ClkError::RemoteCallFailure {
            id: ClockId::new(7),
            op: "set_rate",
            code: -22,
        }
    );

    assert_eq!(gate.count(Operation::SetRate), 2);
}

#[test]
fn test_disable_swallows_firmware_error() {
    let firmware = Arc::new(SimulatedCmu::new().with_pll(3, 25_000_000, 40));
    let cmu = bring_up(&CmuConfig::new("sys0", 25_000_000, 3), firmware.clone()).unwrap();
    firmware.fail_command(Command::pll(Operation::Disable), -1);

    let pll = cmu.pll().unwrap();
    pll.disable();
    assert_eq!(firmware.calls(Command::pll(Operation::Disable)), 1);
    assert!(pll.is_enabled());
}

#[test]
fn test_pll_only_provider() {
    let firmware = Arc::new(SimulatedCmu::new().with_pll(1, 24_000_000, 50));
    let cmu = bring_up(&CmuConfig::new("ddr", 24_000_000, 1), firmware.clone()).unwrap();

    let provider = cmu.provider().unwrap();
    assert!(matches!(provider, Provider::Single(_)));
    let outputs = provider.outputs();
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].rate(), 1_200_000_000);
    assert_eq!(firmware.pll_enabled(1), Some(true));
}

#[test]
fn test_channels_controlled_independently() {
    let firmware = Arc::new(
        SimulatedCmu::new()
            .with_pll(3, 25_000_000, 40)
            .with_channel(3, 2, 8)
            .with_channel(3, 7, 20),
    );
    let cmu = bring_up(&sys0(), firmware.clone()).unwrap();
    assert_eq!(cmu.provider().unwrap().outputs().len(), 2);

    let uart = cmu.lookup_by_index(2).unwrap();
    let spi = cmu.lookup_by_index(7).unwrap();
    assert_eq!(uart.get_rate(0), 125_000_000);
    assert_eq!(spi.get_rate(0), 50_000_000);

    let mut prate = 0;
    assert_eq!(uart.round_rate(48_000_000, &mut prate), 47_619_047);
    assert_eq!(prate, 0);

    uart.set_rate(100_000_000, u64::MAX).unwrap();
    assert_eq!(uart.get_rate(0), 100_000_000);
    assert_eq!(spi.get_rate(0), 50_000_000);

    spi.disable();
    assert!(!spi.is_enabled());
    assert!(uart.is_enabled());
    assert_eq!(firmware.channel_enabled(3, 7), Some(false));
}

#[test]
fn test_failed_bring_up_publishes_nothing() {
    let gate = Arc::new(Recorder::default());
    let config = sys0().with_channel("uart", 9);

    let err = bring_up(&config, gate.clone()).unwrap_err();
    assert_eq!(
        err,
        CmuError::DuplicateRegistration(Collision::Name("uart".to_string()))
    );
    assert!(gate.calls().is_empty());
}
