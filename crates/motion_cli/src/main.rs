//! Kiosk Motion CLI
//!
//! Replays recorded skeleton frames through the motion core, generates
//! synthetic recordings, and prints configuration presets or their schema.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use motion_core::replay::{self, FrameRecord, SessionSummary};
use motion_core::{synthetic, DominantLimb, MotionConfig};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "kiosk-motion")]
#[command(about = "Kick and header detection over recorded skeleton frames", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON Lines recording and report detected actions
    Replay {
        /// Input recording (.jsonl)
        #[arg(long)]
        r#in: PathBuf,

        /// Motion config JSON file (overrides --preset)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Preset name: default, junior, pro
        #[arg(long)]
        preset: Option<String>,

        /// Print every action as a JSON line
        #[arg(long, default_value = "false")]
        events: bool,
    },

    /// Write a synthetic recording
    Synth {
        /// Output recording (.jsonl)
        #[arg(long)]
        out: PathBuf,

        #[arg(long, value_enum, default_value = "session")]
        motion: SynthMotion,

        /// Body id written into every frame
        #[arg(long, default_value = "0")]
        body_id: u32,
    },

    /// Print a preset as JSON
    Config {
        #[arg(long, default_value = "default")]
        preset: String,
    },

    /// Print the JSON schema of the motion config
    Schema,
}

#[derive(Clone, Copy, ValueEnum)]
enum SynthMotion {
    KickRight,
    KickLeft,
    Header,
    AbandonedWindup,
    Session,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay { r#in, config, preset, events } => {
            let config = load_config(config.as_deref(), preset.as_deref())?;
            run_replay(&r#in, &config, events)?;
        }
        Commands::Synth { out, motion, body_id } => {
            let frames = synth_frames(motion);
            let records: Vec<FrameRecord> =
                frames.iter().map(|s| FrameRecord::from_skeleton(body_id, s)).collect();
            replay::write_frames_to_path(&out, &records)
                .with_context(|| format!("writing {}", out.display()))?;
            println!("Wrote {} frames to {}", records.len(), out.display());
        }
        Commands::Config { preset } => {
            let config = MotionConfig::from_preset(&preset)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Schema => {
            let schema = schemars::schema_for!(MotionConfig);
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }

    Ok(())
}

/// File beats preset, preset beats `KIOSK_MOTION_PRESET`.
fn load_config(path: Option<&Path>, preset: Option<&str>) -> Result<MotionConfig> {
    let config = match (path, preset) {
        (Some(path), _) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?
        }
        (None, Some(name)) => MotionConfig::from_preset(name)?,
        (None, None) => MotionConfig::from_env_or_default(),
    };
    config.validate().context("invalid motion config")?;
    Ok(config)
}

fn run_replay(path: &Path, config: &MotionConfig, print_events: bool) -> Result<()> {
    let frames = replay::read_frames_from_path(path)
        .with_context(|| format!("reading recording {}", path.display()))?;
    tracing::info!("loaded {} frames from {}", frames.len(), path.display());

    let events = replay::replay_frames(&frames, config);
    if print_events {
        for event in &events {
            println!("{}", serde_json::to_string(event)?);
        }
    }

    print_summary(&SessionSummary::from_events(&events));
    Ok(())
}

fn print_summary(summary: &SessionSummary) {
    println!("\nSession summary");
    println!("   Kicks:   {}", summary.kicks);
    println!("   Headers: {}", summary.headers);
    for (name, count) in &summary.by_type {
        println!("     {:<16} {}", name, count);
    }
    if summary.kicks > 0 {
        println!(
            "   Ball speed:   avg {:.1} km/h, best {:.1} km/h",
            summary.average_ball_speed_kmh, summary.best_ball_speed_kmh
        );
        println!("   Kick score:   avg {:.1}", summary.average_kick_score);
    }
    if summary.headers > 0 {
        println!("   Header score: avg {:.1}", summary.average_header_score);
    }
    if summary.total() > 0 {
        println!("   Best score:   {:.1}", summary.best_score);
    }
}

fn synth_frames(motion: SynthMotion) -> Vec<motion_core::Skeleton> {
    match motion {
        SynthMotion::KickRight => synthetic::kick(DominantLimb::Right),
        SynthMotion::KickLeft => synthetic::kick(DominantLimb::Left),
        SynthMotion::Header => synthetic::header(),
        SynthMotion::AbandonedWindup => synthetic::abandoned_windup(DominantLimb::Right),
        SynthMotion::Session => synthetic::session(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_replay_args() {
        let cli = Cli::parse_from(["kiosk-motion", "replay", "--in", "frames.jsonl", "--preset", "junior"]);
        match cli.command {
            Commands::Replay { r#in, preset, events, .. } => {
                assert_eq!(r#in, PathBuf::from("frames.jsonl"));
                assert_eq!(preset.as_deref(), Some("junior"));
                assert!(!events);
            }
            _ => panic!("expected replay"),
        }
    }

    #[test]
    fn test_load_config_prefers_preset() {
        let config = load_config(None, Some("pro")).unwrap();
        assert_eq!(config, MotionConfig::pro());
        assert!(load_config(None, Some("arcade")).is_err());
    }
}
