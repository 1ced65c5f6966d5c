//! Audio device listing command.

use chameleon_io::{AudioDevice, default_device, list_devices};
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    command: Option<DevicesCommand>,
}

#[derive(Subcommand)]
enum DevicesCommand {
    /// List all available audio devices
    List,

    /// Show default device information
    Info,
}

pub fn run(args: DevicesArgs) -> anyhow::Result<()> {
    match args.command.unwrap_or(DevicesCommand::List) {
        DevicesCommand::List => {
            let devices = list_devices()?;

            if devices.is_empty() {
                println!("No audio devices found.");
                return Ok(());
            }

            println!("Available Audio Devices");
            println!("=======================\n");

            let inputs: Vec<_> = devices.iter().filter(|d| d.is_input).collect();
            if !inputs.is_empty() {
                println!("Input Devices:");
                print_indexed(&inputs, |d| d.is_output, " (also output)");
                println!();
            }

            let outputs: Vec<_> = devices.iter().filter(|d| d.is_output).collect();
            if !outputs.is_empty() {
                println!("Output Devices:");
                print_indexed(&outputs, |d| d.is_input, " (also input)");
                println!();
            }

            println!(
                "Total: {} input(s), {} output(s)",
                inputs.len(),
                outputs.len()
            );
            println!();
            println!("Tip: Use device index or partial name with --input/--output:");
            println!("  chameleon realtime --input 0 --output 0 --pitch 5");
            println!("  chameleon realtime --input \"USB\" --output \"USB\" --preset cave");
        }

        DevicesCommand::Info => {
            let (input, output) = default_device()?;

            println!("Default Audio Devices");
            println!("=====================\n");
            print_default("Input", input.as_ref());
            println!();
            print_default("Output", output.as_ref());
        }
    }

    Ok(())
}

fn print_indexed(devices: &[&AudioDevice], also: impl Fn(&AudioDevice) -> bool, note: &str) {
    for (idx, device) in devices.iter().enumerate() {
        let suffix = if also(device) { note } else { "" };
        println!(
            "  [{}] {} ({} Hz){}",
            idx, device.name, device.default_sample_rate, suffix
        );
    }
}

fn print_default(kind: &str, device: Option<&AudioDevice>) {
    match device {
        Some(device) => {
            println!("Default {kind}:");
            println!("  Name: {}", device.name);
            println!("  Sample Rate: {} Hz", device.default_sample_rate);
        }
        None => println!("Default {kind}: None"),
    }
}
