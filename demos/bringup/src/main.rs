use std::{error::Error, sync::Arc};

use baikal_cmu::{CmuConfig, Hardware, Interface, bring_up, sim::SimulatedCmu};
use log::info;

mod consumer;

use consumer::{MacTxClock, PixelClock};

const OSC_HZ: u64 = 25_000_000;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .init();

    let firmware = Arc::new(
        SimulatedCmu::new()
            .with_pll(4, OSC_HZ, 40)
            .with_channel(4, 0, 4)
            .with_channel(4, 3, 8)
            .with_channel(4, 5, 20),
    );

    let config = CmuConfig::new("avlsp_cmu0", OSC_HZ, 4)
        .with_channel("tx2_clk", 3)
        .with_channel("vdu_pclk", 5)
        .with_channel("axi_clk", 0);

    let cmu = bring_up(&config, firmware.clone())?;

    let pll = cmu.pll().ok_or("PLL missing after bring-up")?;
    info!("{}: {} Hz", pll.name(), pll.rate());
    for (index, ch) in cmu.channels() {
        info!(
            "  [{index}] {}: {} Hz, enabled: {}",
            ch.name(),
            ch.get_rate(0),
            ch.is_enabled()
        );
    }

    let tx: Hardware = cmu.lookup_by_name("tx2_clk").ok_or("no tx2_clk")?;
    let mac = MacTxClock::new(tx.clone());
    for speed in [1000, 100, 10] {
        mac.fix_speed(speed)?;
        info!("tx2_clk now {} Hz", tx.get_rate(0));
    }

    let pclk: Hardware = cmu.lookup_by_index(5).ok_or("no channel at index 5")?;
    PixelClock::new(pclk).retune(148_500_000)?;

    Ok(())
}
