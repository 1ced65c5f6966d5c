//! Display audio file metadata and statistics.

use std::path::PathBuf;

use chameleon_io::{AudioFileInfo, inspect};
use clap::Args;

use super::common::linear_to_db;

/// Display audio file information.
#[derive(Args)]
pub struct InfoArgs {
    /// WAV files to inspect
    #[arg(required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Also estimate the dominant pitch
    #[arg(long)]
    pub pitch: bool,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Run the info command.
pub fn run(args: InfoArgs) -> anyhow::Result<()> {
    let infos = args
        .files
        .iter()
        .map(|path| inspect(path, args.pitch))
        .collect::<Result<Vec<_>, _>>()?;

    if args.json {
        let json = match infos.as_slice() {
            [single] => serde_json::to_string_pretty(single)?,
            many => serde_json::to_string_pretty(many)?,
        };
        println!("{json}");
        return Ok(());
    }

    for (i, info) in infos.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_info(info);
    }
    Ok(())
}

fn print_info(info: &AudioFileInfo) {
    println!("File:        {}", info.path.display());
    println!("Format:      {}", info.format);
    println!("Channels:    {}", info.channels);
    println!("Sample Rate: {} Hz", info.sample_rate);
    println!(
        "Duration:    {:.3}s ({} frames)",
        info.duration_secs, info.num_frames
    );
    println!("File Size:   {}", format_bytes(info.file_size_bytes));
    println!(
        "Peak:        {:.4} ({:.1} dBFS)",
        info.stats.max_amplitude,
        linear_to_db(info.stats.max_amplitude)
    );
    println!("Min |x|:     {:.4}", info.stats.min_amplitude);
    println!("Mean |x|:    {:.4}", info.stats.mean_amplitude);
    println!(
        "RMS:         {:.4} ({:.1} dBFS)",
        info.stats.rms,
        linear_to_db(info.stats.rms)
    );
    if let Some(hz) = info.pitch_hz {
        println!("Pitch:       {hz:.1} Hz");
    }
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
