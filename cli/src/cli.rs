use buudai_types::Model;
use clap::{Parser, Subcommand, ValueEnum};
use directories::ProjectDirs;
use std::num::ParseIntError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(about, version, author)]
pub struct Cli {
    /// Minimum log level to print out
    #[clap(long, value_enum, default_value = "info")]
    pub log_level: LevelFilter,

    /// Location of the settings file on disk
    #[clap(long, default_value_os_t = default_config_location())]
    pub config: PathBuf,

    /// Write the settings in use back to the settings file
    #[clap(long)]
    pub save_config: bool,

    /// How many times a timed out transfer is attempted, overrides the settings file
    #[clap(long)]
    pub attempts: Option<u32>,

    /// Keep retrying timed out transfers forever
    #[clap(long, conflicts_with = "attempts")]
    pub retry_forever: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the oscilloscopes that can be detected
    Models,

    /// Locate an oscilloscope and print what was found
    Search {
        /// Fail unless the oscilloscope found is this model
        #[clap(long, value_enum)]
        expect: Option<Model>,
    },

    /// Perform a vendor control read
    ControlRead {
        /// The request code (decimal, or hex prefixed with 0x)
        #[clap(value_parser = parse_u8)]
        request: u8,

        /// How many bytes to read
        length: usize,

        #[clap(long, value_parser = parse_u16, default_value = "0")]
        value: u16,

        #[clap(long, value_parser = parse_u16, default_value = "0")]
        index: u16,
    },

    /// Perform a vendor control write
    ControlWrite {
        /// The request code (decimal, or hex prefixed with 0x)
        #[clap(value_parser = parse_u8)]
        request: u8,

        /// The payload, as hex (eg. 0f030303)
        #[clap(value_parser = parse_hex)]
        data: Payload,

        #[clap(long, value_parser = parse_u16, default_value = "0")]
        value: u16,

        #[clap(long, value_parser = parse_u16, default_value = "0")]
        index: u16,
    },

    /// Read from the bulk IN endpoint
    BulkRead {
        /// How many bytes to read
        length: usize,

        /// Read packet by packet until a short or empty packet arrives
        #[clap(long)]
        multi: bool,
    },

    /// Write to the bulk OUT endpoint
    BulkWrite {
        /// The payload, as hex (eg. 0f030303)
        #[clap(value_parser = parse_hex)]
        data: Payload,
    },
}

fn default_config_location() -> PathBuf {
    match ProjectDirs::from("org", "OpenBuudai", "Buudai") {
        Some(proj_dirs) => proj_dirs.config_dir().join("settings.json"),
        None => PathBuf::from("buudai-settings.json"),
    }
}

fn parse_u8(value: &str) -> Result<u8, ParseIntError> {
    match value.strip_prefix("0x") {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => value.parse(),
    }
}

fn parse_u16(value: &str) -> Result<u16, ParseIntError> {
    match value.strip_prefix("0x") {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => value.parse(),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payload(pub Vec<u8>);

pub fn parse_hex(value: &str) -> Result<Payload, String> {
    let value = value.strip_prefix("0x").unwrap_or(value);
    if value.len() % 2 != 0 {
        return Err(format!("'{}' has an odd number of digits", value));
    }

    (0..value.len())
        .step_by(2)
        .map(|i| {
            value
                .get(i..i + 2)
                .and_then(|byte| u8::from_str_radix(byte, 16).ok())
                .ok_or_else(|| format!("'{}' is not valid hex", value))
        })
        .collect::<Result<Vec<u8>, String>>()
        .map(Payload)
}

#[repr(usize)]
#[derive(ValueEnum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum LevelFilter {
    /// A level lower than all log levels.
    Off,
    /// Corresponds to the `Error` log level.
    Error,
    /// Corresponds to the `Warn` log level.
    Warn,
    /// Corresponds to the `Info` log level.
    Info,
    /// Corresponds to the `Debug` log level.
    Debug,
    /// Corresponds to the `Trace` log level.
    Trace,
}

impl From<LevelFilter> for log::LevelFilter {
    fn from(level: LevelFilter) -> Self {
        match level {
            LevelFilter::Off => log::LevelFilter::Off,
            LevelFilter::Error => log::LevelFilter::Error,
            LevelFilter::Warn => log::LevelFilter::Warn,
            LevelFilter::Info => log::LevelFilter::Info,
            LevelFilter::Debug => log::LevelFilter::Debug,
            LevelFilter::Trace => log::LevelFilter::Trace,
        }
    }
}
