//! Write text into user memory and the SRAM mirror, then dump the tag.
use embedded_hal_mock::eh1::delay::NoopDelay;
use ntag_i2c::{Config, NtagI2c, TagEmulator};

fn main() -> anyhow::Result<()> {
    env_logger::builder().format_timestamp_millis().init();

    let Some(text) = std::env::args().nth(1) else {
        eprintln!("Provide the text to write as the first argument.");
        std::process::exit(1)
    };

    let mut tag = NtagI2c::new(TagEmulator::default(), NoopDelay::new(), Config::default());
    tag.clean_user_memory()?;
    tag.write_user_memory(text.as_bytes())?;
    tag.enable_sram_mirroring()?;
    tag.write_sram(text.as_bytes())?;

    let mut report = String::new();
    tag.full_report(&mut report)?;
    tag.dump_user_memory(&mut report)?;
    print!("{report}");
    Ok(())
}
