use clap::Parser;
use log::{error, warn};
use std::path::PathBuf;

use jobsnap::template::FALLBACK_SNAPSHOT_NAME;
use jobsnap::{Settings, SnapshotConfig, Snapshotter};

/// Save a self-contained HTML snapshot of a job-ad page, or extract its
/// combined text for application drafting.
#[derive(Debug, Parser)]
#[command(name = "jobsnap", version, about)]
struct Args {
    /// URL of the job-ad page
    url: String,

    /// Output file for the snapshot (defaults to the configured working
    /// folder, or the current directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the extracted page text instead of writing a snapshot
    #[arg(long)]
    extract_text: bool,

    /// Settings file location
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Run the browser with a visible window
    #[arg(long)]
    no_headless: bool,
}

fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("jobsnap")
        .join("settings.json")
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();

    let settings_path = args.settings.clone().unwrap_or_else(default_settings_path);
    let mut settings = match Settings::load(&settings_path) {
        Ok(settings) => settings,
        Err(e) => {
            error!("{e:#}");
            std::process::exit(1);
        }
    };
    settings.remember_url(&args.url);
    if let Err(e) = settings.save(&settings_path) {
        warn!("failed to save settings: {e:#}");
    }

    let config = SnapshotConfig::default().with_headless(!args.no_headless);
    let snapshotter = Snapshotter::with_chromium(config);

    if args.extract_text {
        match snapshotter.extract_text(&args.url).await {
            Ok(text) => println!("{text}"),
            Err(e) => {
                error!("{e}");
                std::process::exit(1);
            }
        }
        return;
    }

    let dest = args.output.unwrap_or_else(|| {
        settings
            .working_folder
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(FALLBACK_SNAPSHOT_NAME)
    });

    if let Err(e) = snapshotter.snapshot(&args.url, &dest).await {
        error!("{e}");
        std::process::exit(1);
    }
    println!("Snapshot saved to {}", dest.display());
}
