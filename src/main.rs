use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use jiff::Zoned;
use spectrum_bars::config::{self, Config};
use spectrum_bars::synth::SyntheticSpectrum;
use spectrum_bars::{RenderError, SpectrumRenderer, telemetry};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

#[derive(Parser)]
#[command(name = "spectrum-bars")]
#[command(about = "Render auto-scaling audio spectrum bars")]
#[command(version = "0.1.0")]
struct Cli {
    /// Config file (default: ~/.config/spectrum-bars/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render synthetic spectrum frames and save the last one as PNG
    Render {
        #[command(flatten)]
        overrides: Overrides,

        /// Number of frames to present before stopping
        #[arg(long, default_value = "120")]
        frames: u32,

        /// Output PNG path (default: timestamped file in the data directory)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print the effective configuration
    Config {
        #[command(flatten)]
        overrides: Overrides,

        /// Write the effective configuration back to the config file
        #[arg(long)]
        save: bool,
    },
}

/// Command-line overrides for config file values
#[derive(Args, Debug, Default)]
struct Overrides {
    /// Audio sample rate in Hz
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Samples per analysis frame
    #[arg(long)]
    sample_size: Option<usize>,

    /// Channels per analysis frame
    #[arg(long)]
    channels: Option<usize>,

    /// Bar width in pixels
    #[arg(long)]
    bar_width: Option<f32>,

    /// Gap between bars in pixels
    #[arg(long)]
    space_width: Option<f32>,

    /// Surface width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Surface height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Presentation refresh rate
    #[arg(long)]
    fps: Option<u32>,
}

impl Overrides {
    fn apply(&self, config: &mut Config) {
        if let Some(v) = self.sample_rate {
            config.sample_rate = v;
        }
        if let Some(v) = self.sample_size {
            config.sample_size = v;
        }
        if let Some(v) = self.channels {
            config.channels = v;
        }
        if let Some(v) = self.bar_width {
            config.bar_width = v;
        }
        if let Some(v) = self.space_width {
            config.space_width = v;
        }
        if let Some(v) = self.width {
            config.width = v;
        }
        if let Some(v) = self.height {
            config.height = v;
        }
        if let Some(v) = self.fps {
            config.fps = v;
        }
    }
}

fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<Config> {
    let mut config = Config::load(path)?;
    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}

fn default_output_path() -> Result<PathBuf> {
    let dir = config::frames_dir().ok_or_else(|| anyhow!("Could not find data directory"))?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let timestamp = Zoned::now().strftime("%Y-%m-%d_%H-%M-%S");
    Ok(dir.join(format!("{}.png", timestamp)))
}

/// Stand-in for the analysis pipeline: writes synthetic frames at the audio frame rate
fn spawn_producer(
    renderer: Arc<SpectrumRenderer>,
    mut synth: SyntheticSpectrum,
    frame_rate: f32,
    stop: Arc<AtomicBool>,
) -> thread::JoinHandle<Result<u64, RenderError>> {
    thread::spawn(move || {
        let interval = Duration::from_secs_f32(1.0 / frame_rate);
        let mut written = 0;

        while !stop.load(Ordering::Relaxed) {
            let channels = synth.channels();
            let nbins = renderer.visible_bin_count(channels);
            renderer.write(synth.next_frame(nbins), channels)?;
            written += 1;
            thread::sleep(interval);
        }

        Ok(written)
    })
}

fn run_render(config: &Config, frames: u32, output: Option<PathBuf>) -> Result<()> {
    let output = match output {
        Some(path) => path,
        None => default_output_path()?,
    };

    let renderer = Arc::new(SpectrumRenderer::new(config.sample_rate, config.sample_size));
    renderer.configure_bar_geometry(config.bar_width, config.space_width);

    // The first render fixes the surface width, which tells the producer how many bins to send
    renderer.render_frame(config.width, config.height)?;
    info!(
        "rendering {}x{} at {} fps, {} visible bins per channel",
        config.width,
        config.height,
        config.fps,
        renderer.visible_bin_count(config.channels)
    );

    let stop = Arc::new(AtomicBool::new(false));
    let producer = spawn_producer(
        Arc::clone(&renderer),
        SyntheticSpectrum::new(config.channels, config.frame_rate()),
        config.frame_rate(),
        Arc::clone(&stop),
    );

    let repaint = renderer.repaint_signal();
    let frame_interval = Duration::from_secs_f32(1.0 / config.fps as f32);
    let started = Instant::now();
    let mut presented = 0;
    let mut last = None;

    while presented < frames && !producer.is_finished() {
        if repaint.take() {
            last = Some(renderer.render_frame(config.width, config.height)?);
            presented += 1;
            debug!("presented frame #{} (scale {:.3})", presented, renderer.scale());
        }

        thread::sleep(frame_interval);
    }

    stop.store(true, Ordering::Relaxed);
    let written = producer
        .join()
        .map_err(|_| anyhow!("Producer thread panicked"))??;

    let frame = last.unwrap_or_else(|| renderer.frames().latest());
    frame
        .save_png(&output)
        .with_context(|| format!("Failed to save frame to {}", output.display()))?;

    println!(
        "Presented {} frames ({} written) in {:.1}s",
        presented,
        written,
        started.elapsed().as_secs_f32()
    );
    println!("Frame buffer allocations: {}", renderer.frames().allocations());
    println!("Saved last frame to {}", output.display());

    Ok(())
}

fn run_config(config: &Config, explicit: Option<&Path>, save: bool) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);

    if save {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => config::config_path().ok_or(config::ConfigError::NoConfigDir)?,
        };
        config.save(&path)?;
        println!("Saved config to {}", path.display());
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    telemetry::init(cli.verbose);

    let config_path = cli.config.as_deref();
    let result = match cli.command {
        Commands::Render {
            overrides,
            frames,
            output,
        } => load_config(config_path, &overrides)
            .and_then(|config| run_render(&config, frames, output)),

        Commands::Config { overrides, save } => load_config(config_path, &overrides)
            .and_then(|config| run_config(&config, config_path, save)),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
