//! Multi-file processing command.

use std::path::PathBuf;

use chameleon_config::AppConfig;
use chameleon_io::{BatchJob, BatchProcessor, BatchProgress, OfflineProcessor};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use super::common::{EffectArgs, EngineArgs, build_chain, describe, resolve_bit_depth};

#[derive(Args)]
pub struct BatchArgs {
    /// Input WAV files
    #[arg(value_name = "INPUTS", required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// Directory that receives processed_<name> for each input
    #[arg(short, long, value_name = "DIR")]
    output_dir: PathBuf,

    #[command(flatten)]
    effects: EffectArgs,

    #[command(flatten)]
    engine: EngineArgs,

    /// Output bit depth (16, 24, or 32)
    #[arg(long)]
    bit_depth: Option<u16>,
}

pub fn run(args: BatchArgs, config: &AppConfig) -> anyhow::Result<()> {
    let settings = args.effects.resolve(config)?;
    let engine = args.engine.resolve(config)?;

    let mut job = BatchJob::new(args.inputs, &args.output_dir, settings);
    job.bit_depth = resolve_bit_depth(args.bit_depth, config)?;

    println!(
        "Processing {} file(s) into {}",
        job.inputs.len(),
        job.output_dir.display()
    );
    println!("Effects: {}", describe(&settings));

    let pb = ProgressBar::new(job.inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );

    let processor = BatchProcessor::new(OfflineProcessor::new(build_chain(engine)?));
    let report = processor.run_with_report(&job, |event| match event {
        BatchProgress::Started { input, .. } => {
            let name = input.file_name().map_or_else(
                || input.display().to_string(),
                |n| n.to_string_lossy().into_owned(),
            );
            pb.set_message(name);
        }
        BatchProgress::Written { .. } => pb.inc(1),
        BatchProgress::Failed { input, reason, .. } => {
            pb.println(format!("  skipped {}: {reason}", input.display()));
            pb.inc(1);
        }
    });
    pb.finish_with_message("done");

    println!();
    for path in &report.written {
        println!("  wrote {}", path.display());
    }
    println!(
        "{} written, {} failed",
        report.written.len(),
        report.failures.len()
    );

    if report.written.is_empty() && !report.failures.is_empty() {
        anyhow::bail!("no files were processed");
    }
    Ok(())
}
