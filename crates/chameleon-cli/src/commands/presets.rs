//! Preset management commands.

use chameleon_config::{
    AppConfig, Preset, ensure_user_presets_dir, factory_presets, get_factory_preset,
    list_user_presets, preset_name_from_path, resolve_preset, user_config_dir, user_presets_dir,
};
use clap::{Args, Subcommand};

use super::common::EffectArgs;

#[derive(Args)]
pub struct PresetsArgs {
    #[command(subcommand)]
    command: PresetsCommand,
}

#[derive(Subcommand)]
enum PresetsCommand {
    /// List available presets (factory and user)
    List {
        /// Show only factory presets
        #[arg(long)]
        factory: bool,

        /// Show only user presets
        #[arg(long)]
        user: bool,
    },

    /// Show the settings of a preset
    Show {
        /// Preset name or path
        name: String,
    },

    /// Save effect flags as a user preset
    Save {
        /// Name for the new preset
        name: String,

        /// Description of the preset
        #[arg(short, long)]
        description: Option<String>,

        /// Overwrite if preset already exists
        #[arg(long)]
        force: bool,

        #[command(flatten)]
        effects: EffectArgs,
    },

    /// Delete a user preset
    Delete {
        /// Preset name to delete
        name: String,

        /// Confirm deletion
        #[arg(long)]
        force: bool,
    },

    /// Show preset and config directories
    Paths,
}

pub fn run(args: PresetsArgs) -> anyhow::Result<()> {
    match args.command {
        PresetsCommand::List { factory, user } => list_presets(factory, user),
        PresetsCommand::Show { name } => show_preset(&name),
        PresetsCommand::Save {
            name,
            description,
            force,
            effects,
        } => save_preset(&name, description, force, &effects),
        PresetsCommand::Delete { name, force } => delete_preset(&name, force),
        PresetsCommand::Paths => {
            println!("User presets: {}", user_presets_dir().display());
            println!("Config file:  {}", AppConfig::default_path().display());
            println!("Config dir:   {}", user_config_dir().display());
            Ok(())
        }
    }
}

fn list_presets(factory_only: bool, user_only: bool) -> anyhow::Result<()> {
    if !user_only {
        println!("Factory Presets:");
        println!("================");
        for preset in factory_presets() {
            let desc = preset.description.as_deref().unwrap_or("");
            println!("  {:12} - {}", preset.name.to_lowercase(), desc);
        }
        println!();
    }

    if !factory_only {
        println!("User Presets:");
        println!("=============");
        let user_presets = list_user_presets();
        if user_presets.is_empty() {
            println!("  (none)");
            println!();
            println!("  Create a preset with: chameleon presets save <name> --pitch 3 ...");
        } else {
            for path in user_presets {
                let name = preset_name_from_path(&path).unwrap_or_else(|| "unknown".into());
                match Preset::load(&path) {
                    Ok(preset) => {
                        let desc = preset.description.as_deref().unwrap_or("");
                        println!("  {name:12} - {desc}");
                    }
                    Err(err) => {
                        tracing::warn!(path = %path.display(), error = %err, "unreadable preset");
                        println!("  {name:12} - (error loading)");
                    }
                }
            }
        }
        println!();
    }

    Ok(())
}

fn show_preset(name: &str) -> anyhow::Result<()> {
    let preset = resolve_preset(name)?;
    let s = &preset.settings;

    println!("Preset: {}", preset.name);
    println!("{}", "=".repeat(8 + preset.name.len()));
    if let Some(desc) = &preset.description {
        println!("{desc}");
    }
    println!();
    println!("  pitch_semitones  {:+.1}", s.pitch_semitones);
    println!("  volume           {:.2}", s.volume);
    println!("  echo_amount      {:.2}", s.echo_amount);
    println!("  reverb_amount    {:.2}", s.reverb_amount);
    println!("  gate_threshold   {:.2}", s.gate_threshold);
    println!("  low_cut_enabled  {}", s.low_cut_enabled);
    println!("  high_cut_enabled {}", s.high_cut_enabled);
    Ok(())
}

fn save_preset(
    name: &str,
    description: Option<String>,
    force: bool,
    effects: &EffectArgs,
) -> anyhow::Result<()> {
    if get_factory_preset(name).is_some() {
        anyhow::bail!("'{name}' is a factory preset name. Choose a different name.");
    }

    let dir = ensure_user_presets_dir()?;
    let path = dir.join(format!("{name}.toml"));
    if path.exists() && !force {
        anyhow::bail!("Preset '{name}' already exists. Use --force to overwrite.");
    }

    let settings = effects.resolve(&AppConfig::default())?;
    let mut preset = Preset::new(name).with_settings(settings);
    if let Some(desc) = description {
        preset = preset.with_description(desc);
    }
    preset.save(&path)?;

    println!("Saved preset '{name}' to {}", path.display());
    Ok(())
}

fn delete_preset(name: &str, force: bool) -> anyhow::Result<()> {
    if get_factory_preset(name).is_some() {
        anyhow::bail!("Cannot delete factory preset '{name}'.");
    }

    let path = user_presets_dir().join(format!("{name}.toml"));
    if !path.exists() {
        anyhow::bail!("User preset '{name}' not found.");
    }
    if !force {
        anyhow::bail!("Use --force to confirm deletion of preset '{name}'.");
    }

    std::fs::remove_file(&path)?;
    println!("Deleted preset '{name}'.");
    Ok(())
}
