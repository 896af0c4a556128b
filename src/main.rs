// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand, ValueEnum};
use polaroid::backends::camera::types::{CameraBackendType, Facing};
use polaroid::config::{Config, PhotoOutputFormat, VirtualSourceConfig};
use polaroid::flash::FlashMode;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "polaroid")]
#[command(about = "Instant-film style camera for the terminal")]
#[command(version = polaroid::constants::app_version())]
#[command(subcommand_required = false)]
struct Cli {
    /// Use a still image instead of a camera
    #[arg(long = "virtual", value_name = "IMAGE", global = true, conflicts_with = "test_pattern")]
    virtual_image: Option<PathBuf>,

    /// Use a generated test pattern instead of a camera
    #[arg(long, global = true)]
    test_pattern: bool,

    /// Read settings from this file instead of the default location
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,

    /// Take a photo and save it without the interactive screen
    Photo {
        /// Directory to save into (default: ~/Pictures/Polaroid)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Camera to use
        #[arg(long, value_enum)]
        facing: Option<FacingArg>,

        /// Flash mode
        #[arg(long, value_enum)]
        flash: Option<FlashArg>,

        /// File format
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FacingArg {
    Back,
    Front,
}

impl From<FacingArg> for Facing {
    fn from(arg: FacingArg) -> Self {
        match arg {
            FacingArg::Back => Facing::Back,
            FacingArg::Front => Facing::Front,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FlashArg {
    Off,
    On,
    Auto,
}

impl From<FlashArg> for FlashMode {
    fn from(arg: FlashArg) -> Self {
        match arg {
            FlashArg::Off => FlashMode::Off,
            FlashArg::On => FlashMode::On,
            FlashArg::Auto => FlashMode::Auto,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Jpeg,
    Png,
}

impl From<FormatArg> for PhotoOutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Jpeg => PhotoOutputFormat::Jpeg,
            FormatArg::Png => PhotoOutputFormat::Png,
        }
    }
}

/// Set up tracing. The terminal UI owns the screen, so its logs go to a file.
///
/// Set RUST_LOG to control the level, e.g. RUST_LOG=polaroid=debug
fn init_logging(interactive: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true);

    if !interactive {
        builder.with_writer(std::io::stderr).init();
        return;
    }

    match cli::open_log_file() {
        Some(file) => builder
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .init(),
        None => builder.with_writer(std::io::sink).init(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.command.is_none());

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };

    if let Some(image) = cli.virtual_image {
        config.backend = CameraBackendType::Virtual;
        config.virtual_source = VirtualSourceConfig::Image(image);
    } else if cli.test_pattern {
        config.backend = CameraBackendType::Virtual;
        config.virtual_source = VirtualSourceConfig::TestPattern;
    }

    match cli.command {
        None => polaroid::terminal::run(config),
        Some(Commands::List) => cli::list_cameras(&config),
        Some(Commands::Photo {
            output,
            facing,
            flash,
            format,
        }) => {
            if let Some(dir) = output {
                config.photo_directory = Some(dir);
            }
            if let Some(facing) = facing {
                config.default_facing = facing.into();
            }
            if let Some(flash) = flash {
                config.default_flash = flash.into();
            }
            if let Some(format) = format {
                config.output_format = format.into();
            }
            cli::take_photo(&config)
        }
    }
}
