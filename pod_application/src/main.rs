mod manifest;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::bail;
use clap::{Parser, Subcommand};

use pod_engine::{CpalOut, PlaybackState, Session};

use crate::manifest::Manifest;

#[derive(Parser)]
#[command(about = "Multi-track mixer: plays and exports WAV mixes with volume automation")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the mix described by a manifest to a WAV file.
    Export {
        manifest: PathBuf,

        /// Output file.
        #[arg(short, long, default_value = "mix.wav")]
        out: PathBuf,
    },

    /// Play the mix described by a manifest through the default output.
    Play {
        manifest: PathBuf,

        /// Start position in seconds.
        #[arg(long, default_value_t = 0.0)]
        from: f64,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Command::Export { manifest, out } => export(&manifest, &out),
        Command::Play { manifest, from } => play(&manifest, from),
    }
}

fn load_session(manifest_path: &Path) -> anyhow::Result<Session<CpalOut>> {
    let base = manifest_path.parent().unwrap_or(Path::new(".")).to_owned();
    let session = Manifest::load(manifest_path)?.into_session(&base, CpalOut::new())?;
    log::info!(
        "session ready: {} track(s), {:.2}s timeline",
        session.project.tracks().len(),
        session.project.duration()
    );
    Ok(session)
}

fn export(manifest_path: &Path, out: &Path) -> anyhow::Result<()> {
    let session = load_session(manifest_path)?;
    let bytes = session.export_mix()?;
    std::fs::write(out, &bytes)?;
    println!("wrote {} ({} bytes)", out.display(), bytes.len());
    Ok(())
}

fn play(manifest_path: &Path, from: f64) -> anyhow::Result<()> {
    let mut session = load_session(manifest_path)?;
    if !session.is_ready() {
        bail!("no audio output device available");
    }

    // Stop when the longest clip runs out rather than at the 5-minute
    // timeline floor.
    let end = session
        .project
        .tracks()
        .iter()
        .filter_map(|t| t.clip())
        .map(|c| c.duration())
        .fold(0.0f64, f64::max);

    session.play(from);

    while session.state() == PlaybackState::Playing && session.position() < end {
        print!("\r{:7.2}s / {:.2}s", session.position(), end);
        std::io::stdout().flush()?;
        thread::sleep(Duration::from_millis(100));
    }

    session.stop();
    println!();
    Ok(())
}
