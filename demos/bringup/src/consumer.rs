use baikal_cmu::{ClkError, Hardware};
use log::{debug, info};

/// Transmit clock of a gigabit MAC, retuned on every link change.
pub struct MacTxClock {
    clk: Hardware,
}

impl MacTxClock {
    pub fn new(clk: Hardware) -> Self {
        Self { clk }
    }

    pub fn fix_speed(&self, mbps: u32) -> Result<(), ClkError> {
        let rate = match mbps {
            1000 => 250_000_000,
            100 => 50_000_000,
            10 => 5_000_000,
            _ => {
                debug!("tx clock: unsupported speed {mbps}, left as is");
                return Ok(());
            }
        };
        info!("tx clock: speed {mbps} Mb/s -> {rate} Hz");
        self.clk.set_rate(rate, 0)
    }
}

/// Pixel clock of a display controller.
pub struct PixelClock {
    clk: Hardware,
}

impl PixelClock {
    pub fn new(clk: Hardware) -> Self {
        Self { clk }
    }

    /// Stops the clock, tunes it as close to `mode_rate` as the divider
    /// allows, restarts it and returns the rate actually achieved.
    pub fn retune(&self, mode_rate: u64) -> Result<u64, ClkError> {
        self.clk.disable();

        let mut parent = 0;
        let rate = self.clk.round_rate(mode_rate, &mut parent);
        self.clk.set_rate(rate, parent)?;
        self.clk.enable()?;

        let actual = self.clk.get_rate(parent);
        info!("pixel clock: requested {mode_rate} Hz, running at {actual} Hz");
        Ok(actual)
    }
}
