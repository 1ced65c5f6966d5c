//! File-based effect processing command.

use std::path::PathBuf;
use std::sync::Arc;

use chameleon_config::AppConfig;
use chameleon_core::SignalStats;
use chameleon_io::{OfflineProcessor, ProcessingTask, TaskState, read_wav_info, save_audio};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use super::common::{
    EffectArgs, EngineArgs, build_chain, describe, linear_to_db, resolve_bit_depth,
};

#[derive(Args)]
pub struct ProcessArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    #[command(flatten)]
    effects: EffectArgs,

    #[command(flatten)]
    engine: EngineArgs,

    /// Output bit depth (16, 24, or 32)
    #[arg(long)]
    bit_depth: Option<u16>,
}

pub fn run(args: ProcessArgs, config: &AppConfig) -> anyhow::Result<()> {
    let settings = args.effects.resolve(config)?;
    let engine = args.engine.resolve(config)?;
    let bit_depth = resolve_bit_depth(args.bit_depth, config)?;

    let info = read_wav_info(&args.input)?;
    println!("Reading {}...", args.input.display());
    println!(
        "  {} frames, {} Hz, {} ch, {:.2}s",
        info.num_frames, info.sample_rate, info.channels, info.duration_secs
    );
    if info.sample_rate != engine.sample_rate {
        println!("  resampling to {} Hz", engine.sample_rate);
    }
    println!("Effects: {}", describe(&settings));

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}")?
            .progress_chars("##-"),
    );
    let bar = pb.clone();
    let task = Arc::new(ProcessingTask::with_listener(move |p| {
        bar.set_position((p * 100.0).round() as u64);
    }));

    let cancel = Arc::clone(&task);
    ctrlc::set_handler(move || cancel.cancel())?;

    let handle = OfflineProcessor::new(build_chain(engine)?).spawn(
        args.input.clone(),
        settings,
        Arc::clone(&task),
    )?;

    match handle.wait() {
        TaskState::Completed => pb.finish_with_message("done"),
        TaskState::Canceled => {
            pb.abandon_with_message("canceled");
            anyhow::bail!("processing canceled");
        }
        TaskState::Failed | TaskState::Running => {
            pb.abandon_with_message("failed");
            let reason = task.error().unwrap_or_else(|| "unknown error".into());
            anyhow::bail!("processing {} failed: {reason}", args.input.display());
        }
    }

    let output = task
        .take_result()
        .ok_or_else(|| anyhow::anyhow!("task completed without a result"))?;
    let stats = SignalStats::measure(&output.samples);
    println!("\nOutput:");
    println!(
        "  RMS {:.1} dB, Peak {:.1} dB",
        linear_to_db(stats.rms),
        linear_to_db(stats.max_amplitude)
    );

    println!("\nWriting {}...", args.output.display());
    save_audio(&args.output, &output, bit_depth)?;
    println!("Done!");

    Ok(())
}
