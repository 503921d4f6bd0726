use anyhow::{anyhow, bail, Context, Result};
use buudai_usb::device::base::Transport;
use buudai_usb::device::LibUsbTransport;
use buudai_usb::{Attempts, Device, TransferError, KNOWN_MODELS};
use clap::Parser;
use log::{debug, info};
use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};
use tokio::sync::mpsc;

use crate::cli::{Cli, Command};
use crate::settings::Settings;

mod cli;
mod settings;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    CombinedLogger::init(vec![TermLogger::new(
        args.log_level.into(),
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )])
    .context("Could not configure the logger")?;

    debug!("Buudai CLI v{}", VERSION);
    let mut settings = Settings::read(&args.config)?;

    if let Some(attempts) = args.attempts {
        settings.device.attempts = Attempts::Limited(attempts);
    }
    if args.retry_forever {
        settings.device.attempts = Attempts::Unlimited;
    }

    if args.save_config {
        settings.write(&args.config)?;
        info!("Settings saved to {}", args.config.to_string_lossy());
    }

    if let Command::Models = args.command {
        for known in KNOWN_MODELS {
            println!(
                "{:04x}:{:04x}  {:<14} {}",
                known.vendor_id, known.product_id, known.name, known.model
            );
        }
        return Ok(());
    }

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let mut device = Device::new(LibUsbTransport::global())
        .with_settings(settings.device)
        .with_event_sender(event_tx);

    let name = device
        .search()
        .context("Unable to find a supported oscilloscope")?;

    let result = run_command(&mut device, args.command, name);
    device.disconnect();

    while let Ok(event) = event_rx.try_recv() {
        debug!("Device Event: {:?}", event);
    }
    result
}

fn run_command<T: Transport>(device: &mut Device<T>, command: Command, name: &str) -> Result<()> {
    let attempts = device.settings().attempts;

    match command {
        Command::Models => {}
        Command::Search { expect } => {
            if let Some(expected) = expect {
                if device.model() != expected {
                    bail!("Expected a {}, but found a {}", expected, device.model());
                }
            }

            println!("Found: {} ({:?})", name, device.model());
            if let Some(descriptor) = device.descriptor() {
                println!("Device: {:?}", descriptor);
            }
            println!(
                "Packet Lengths: IN {} OUT {}",
                device.in_packet_length().unwrap_or_default(),
                device.out_packet_length().unwrap_or_default()
            );
        }
        Command::ControlRead {
            request,
            length,
            value,
            index,
        } => {
            let mut buffer = vec![0; length];
            let read = device
                .control_read(request, &mut buffer, value, index, attempts)
                .map_err(|e| transfer_failed("Control read", e))?;
            println!("{:02x?}", &buffer[..read]);
        }
        Command::ControlWrite {
            request,
            data,
            value,
            index,
        } => {
            let written = device
                .control_write(request, &data.0, value, index, attempts)
                .map_err(|e| transfer_failed("Control write", e))?;
            println!("Wrote {} of {} bytes", written, data.0.len());
        }
        Command::BulkRead { length, multi } => {
            let mut buffer = vec![0; length];
            let read = if multi {
                device.bulk_read_multi(&mut buffer, attempts)
            } else {
                device.bulk_read(&mut buffer, attempts)
            }
            .map_err(|e| transfer_failed("Bulk read", e))?;
            println!("{:02x?}", &buffer[..read]);
        }
        Command::BulkWrite { data } => {
            let written = device
                .bulk_write(&data.0, attempts)
                .map_err(|e| transfer_failed("Bulk write", e))?;
            println!("Wrote {} of {} bytes", written, data.0.len());
        }
    }

    Ok(())
}

fn transfer_failed(operation: &str, error: TransferError) -> anyhow::Error {
    anyhow!("{} failed: {} (code {})", operation, error, error.code())
}
