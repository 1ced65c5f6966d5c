//! Real-time microphone processing command.

use std::sync::atomic::Ordering;
use std::time::Duration;

use chameleon_config::AppConfig;
use chameleon_core::SharedSettings;
use chameleon_io::{AudioStream, RealTimeStreamAdapter, StreamConfig};
use clap::Args;

use super::common::{EffectArgs, EngineArgs, build_chain, describe};

#[derive(Args)]
pub struct RealtimeArgs {
    #[command(flatten)]
    effects: EffectArgs,

    #[command(flatten)]
    engine: EngineArgs,

    /// Input device index or name
    #[arg(long)]
    input: Option<String>,

    /// Output device index or name
    #[arg(long)]
    output: Option<String>,

    /// Stop after this many seconds
    #[arg(long)]
    duration: Option<f64>,
}

pub fn run(args: RealtimeArgs, config: &AppConfig) -> anyhow::Result<()> {
    let settings = args.effects.resolve(config)?;
    let engine = args.engine.resolve(config)?;

    let mut stream = AudioStream::new(StreamConfig {
        engine,
        input_device: args.input.or_else(|| config.input_device.clone()),
        output_device: args.output.or_else(|| config.output_device.clone()),
    })?;

    let (adapter, mut monitor) = RealTimeStreamAdapter::new(
        build_chain(engine)?,
        SharedSettings::new(settings),
        stream.input_channels(),
        stream.output_channels(),
    );

    println!("Real-time processing");
    println!("  Effects: {}", describe(&settings));
    println!("  Sample rate: {} Hz", engine.sample_rate);
    println!(
        "  Block size: {} frames ({:.1} ms)",
        engine.block_size,
        engine.block_duration_ms()
    );
    println!(
        "  Channels: {} in, {} out",
        stream.input_channels(),
        stream.output_channels()
    );
    println!("\nPress Ctrl+C to stop...\n");

    let running = stream.running_flag();
    ctrlc::set_handler(move || {
        println!("\nStopping...");
        running.store(false, Ordering::SeqCst);
    })?;

    if let Some(secs) = args.duration {
        let running = stream.running_flag();
        let limit = Duration::try_from_secs_f64(secs)
            .map_err(|_| anyhow::anyhow!("invalid duration: {secs}"))?;
        std::thread::Builder::new()
            .name("chameleon-timer".into())
            .spawn(move || {
                std::thread::sleep(limit);
                running.store(false, Ordering::SeqCst);
            })?;
    }

    stream.run_duplex(adapter, &mut monitor)?;

    println!(
        "Done! {} transport fault(s), {} silenced block(s)",
        monitor.transport_faults(),
        monitor.stage_failures()
    );
    Ok(())
}
