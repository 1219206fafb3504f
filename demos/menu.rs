//! Interactive read menu against an emulated tag.
use std::fmt;
use std::io::{self, Write};

use embedded_hal_mock::eh1::delay::StdSleep;
use ntag_i2c::{menu, Config, NtagI2c, TagEmulator};

/// Forward formatted text to stdout, flushing so prompts show up.
struct Stdout(io::Stdout);

impl fmt::Write for Stdout {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.write_all(s.as_bytes()).map_err(|_| fmt::Error)?;
        self.0.flush().map_err(|_| fmt::Error)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::builder().format_timestamp_millis().init();

    let mut tag = NtagI2c::new(TagEmulator::default(), StdSleep::new(), Config::default());
    tag.init();
    menu::run(&mut tag, io::stdin().lock(), &mut Stdout(io::stdout()))?;
    Ok(())
}
