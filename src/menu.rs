//! Interactive read menu over a line-oriented input and a text sink.

use std::fmt::Write;
use std::io::BufRead;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::debug;

use crate::{Error, NtagI2c};

pub const PROMPT: &str = "\n*************************Read Memory Menu*************************\n\
\n1-Memory Dump\n\
2-Serial Number\n\
3-Capability Container\n\
4-Static Lock Status\n\
5-Configuration Status\n\
6-Session Status\n\
7-Full NTAG Report \n\n\
Enter a command: ";

/// Longest input line considered; the rest of the line is ignored.
const MAX_LINE: usize = 63;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    MemoryDump,
    SerialNumber,
    CapabilityContainer,
    StaticLockStatus,
    ConfigurationStatus,
    SessionStatus,
    FullReport,
}

impl MenuCommand {
    pub fn from_number(number: u8) -> Option<Self> {
        Some(match number {
            1 => Self::MemoryDump,
            2 => Self::SerialNumber,
            3 => Self::CapabilityContainer,
            4 => Self::StaticLockStatus,
            5 => Self::ConfigurationStatus,
            6 => Self::SessionStatus,
            7 => Self::FullReport,
            _ => return None,
        })
    }

    pub fn execute<I2C, D>(
        self,
        tag: &mut NtagI2c<I2C, D>,
        out: &mut impl Write,
    ) -> Result<(), Error<I2C::Error>>
    where
        I2C: I2c,
        D: DelayNs,
    {
        match self {
            Self::MemoryDump => tag.dump_user_memory(out),
            Self::SerialNumber => tag.serial_number(out),
            Self::CapabilityContainer => tag.capability_container(out),
            Self::StaticLockStatus => tag.static_lock_status(out),
            Self::ConfigurationStatus => tag.configuration_status(out),
            Self::SessionStatus => tag.session_status(out),
            Self::FullReport => tag.full_report(out),
        }
    }
}

/// Parse a menu entry into the 8-bit command number.
///
/// `m` stands for itself, a `b`/`B` prefix means binary, `0x` hex and a
/// leading `0` octal. Anything else is read as decimal, with an optional
/// sign. Values keep only their low 8 bits, so `263` is `7` and `-1` is
/// `255`.
pub fn parse_command(line: &str) -> Option<u8> {
    let line = line.trim();
    let line = line
        .char_indices()
        .nth(MAX_LINE)
        .map_or(line, |(end, _)| &line[..end]);
    if line.starts_with('m') {
        return Some(b'm');
    }
    let (negative, line) = match line.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, line.strip_prefix('+').unwrap_or(line)),
    };
    let (digits, radix) = if let Some(rest) = line.strip_prefix(['b', 'B']) {
        (rest, 2)
    } else if let Some(rest) = line.strip_prefix("0x").or_else(|| line.strip_prefix("0X")) {
        (rest, 16)
    } else if line.len() > 1 && line.starts_with('0') {
        (&line[1..], 8)
    } else {
        (line, 10)
    };
    let mut value = None::<u32>;
    for digit in digits.chars().map_while(|c| c.to_digit(radix)) {
        value = Some(value.unwrap_or(0).wrapping_mul(radix).wrapping_add(digit));
    }
    let value = if negative { value?.wrapping_neg() } else { value? };
    Some(value as u8)
}

/// Run the menu until `input` runs out of lines.
pub fn run<I2C, D>(
    tag: &mut NtagI2c<I2C, D>,
    input: impl BufRead,
    out: &mut impl Write,
) -> Result<(), Error<I2C::Error>>
where
    I2C: I2c,
    D: DelayNs,
{
    out.write_str(PROMPT)?;
    for line in input.lines() {
        let Ok(line) = line else {
            debug!("Input closed with an error");
            break;
        };
        let number = parse_command(&line);
        writeln!(out, "{}", number.unwrap_or_default())?;
        writeln!(out)?;
        match number.and_then(MenuCommand::from_number) {
            Some(command) => {
                debug!("Menu command {command:?}");
                command.execute(tag, out)?;
            }
            None => writeln!(out, "Incorrect Option")?,
        }
        out.write_str(PROMPT)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, TagEmulator};
    use embedded_hal_mock::eh1::delay::NoopDelay;

    #[test]
    fn parses_number_bases() {
        assert_eq!(parse_command("7"), Some(7));
        assert_eq!(parse_command(" 3\r"), Some(3));
        assert_eq!(parse_command("b101"), Some(5));
        assert_eq!(parse_command("B11"), Some(3));
        assert_eq!(parse_command("0x07"), Some(7));
        assert_eq!(parse_command("010"), Some(8));
        assert_eq!(parse_command("0"), Some(0));
        assert_eq!(parse_command("6abc"), Some(6));
        assert_eq!(parse_command("menu"), Some(109));
        assert_eq!(parse_command("263"), Some(7));
        assert_eq!(parse_command("-1"), Some(255));
        assert_eq!(parse_command("-"), None);
        assert_eq!(parse_command("hello"), None);
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn maps_menu_numbers() {
        assert_eq!(MenuCommand::from_number(1), Some(MenuCommand::MemoryDump));
        assert_eq!(MenuCommand::from_number(7), Some(MenuCommand::FullReport));
        assert_eq!(MenuCommand::from_number(0), None);
        assert_eq!(MenuCommand::from_number(8), None);
    }

    #[test]
    fn run_dispatches_and_rejects() {
        let mut tag = NtagI2c::new(TagEmulator::default(), NoopDelay::new(), Config::default());
        let mut out = String::new();
        run(&mut tag, "2\n9\n-1\n262\n".as_bytes(), &mut out).unwrap();

        assert_eq!(out.matches("Enter a command: ").count(), 5);
        assert!(out.contains("NTAG I2C Serial Number : 0x04 "));
        assert!(out.contains("9\n\nIncorrect Option\n"));
        assert!(out.contains("255\n\nIncorrect Option\n"));
        assert!(out.contains("6\n\n------"));
        assert!(out.contains("Session Register : "));
    }
}
