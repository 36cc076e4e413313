use std::{
    io,
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use clap::Parser;
use color_eyre as ey;
use ey::eyre::{bail, Context};
use satchel_content::{AssetManager, AssetManagerConfig, FileDecoder, LoadEvent, LoadState};
use satchel_shared::{
    log::{self, info, warn},
    ResourceKind,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
enum CommandLineArguments {
    /// Loads the startup and background manifests and reports the progress like a frame loop would
    Load(Load),
}

#[derive(Parser, Debug)]
struct Load {
    /// Directory that contains `Startup.asset.txt` and `Background.asset.txt`
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// YAML configuration that replaces the defaults derived from `root`
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Duration of one simulated frame in milliseconds
    #[arg(short, long, default_value = "16")]
    frame_ms: u64,

    /// Gives up when the background loading takes longer than this many seconds
    #[arg(short, long, default_value = "60")]
    timeout_s: u64,
}

fn main() -> ey::Result<()> {
    color_eyre::install()?;

    // Setup logging
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                satchel_shared::chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(io::stdout())
        .apply()
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;

    let command_line_arguments = CommandLineArguments::parse();
    match command_line_arguments {
        CommandLineArguments::Load(load) => run_load(&load),
    }
}

fn run_load(load: &Load) -> ey::Result<()> {
    let config = match &load.config {
        Some(path) => AssetManagerConfig::from_yaml_file(path).wrap_err("Failed to read the configuration")?,
        None => AssetManagerConfig::with_root(&load.root),
    };

    let start = Instant::now();
    let asset_manager = AssetManager::new(config, Arc::new(FileDecoder));
    let events = asset_manager.observe();

    let report = asset_manager.load_startup_manifest();
    info!("Startup assets loaded after {:?}: {report:?}", start.elapsed());
    asset_manager
        .load_background_manifest()
        .wrap_err("Failed to start loading the background assets")?;

    let frame_duration = Duration::from_millis(load.frame_ms);
    let timeout = Duration::from_secs(load.timeout_s);
    let mut frame_index = 0u64;
    loop {
        for event in events.try_iter() {
            match event {
                LoadEvent::Loaded { kind, name } => info!("Frame {frame_index}: {kind} '{name}' is available"),
                LoadEvent::Skipped { path, reason, .. } => warn!("Frame {frame_index}: skipped '{}': {reason}", path.display()),
                LoadEvent::BatchFinished { batch, report } => info!("Frame {frame_index}: batch {batch} finished with {report:?}"),
            }
        }

        if asset_manager.background_load_progress() == LoadState::Finished {
            break;
        }
        if start.elapsed() > timeout {
            bail!("Background loading didn't finish within {timeout:?}");
        }

        frame_index += 1;
        spin_sleep::sleep(frame_duration);
    }

    let reports = asset_manager.wait_for_background();
    info!("Background assets loaded after {:?} and {frame_index} frames: {reports:?}", start.elapsed());

    for kind in ResourceKind::ALL {
        let names = asset_manager.store().names(kind);
        println!("{kind} ({}):", names.len());
        for name in names {
            println!("  {name}");
        }
    }
    Ok(())
}
