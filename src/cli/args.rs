//! CLI argument parsing with clap.

use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use camerpi::capture::{Flip, Resolution};
use camerpi::exposure::{Exposure, ExposureError};

/// Parse a `W:H` resolution
fn parse_resolution(s: &str) -> Result<Resolution, String> {
    s.parse()
}

/// Parse an exposure such as `1/500`, `2s`, `0.5"` or `30`
fn parse_exposure(s: &str) -> Result<Exposure, ExposureError> {
    s.parse()
}

/// Wrapper for libcamera-still photography
#[derive(Parser, Debug)]
#[command(name = "camerpi")]
#[command(version, about = "Wrapper for libcamera-* commands", long_about = None)]
#[command(after_help = "EXAMPLES:
    # Open a 30 second focus preview at ISO 1600
    camerpi focus -f 30 -i 1600

    # Take a 1/250s still with a raw file
    camerpi still 1/250 --raw

    # 50 frames of 20 seconds each, 2 seconds apart
    camerpi timelapse -e 20s -p 2 -f 50 -i 800

    # Show cameras, sensor modes and resolutions
    camerpi list")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file path (default: ~/.config/camerpi/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open a preview window to allow for camera focusing
    Focus(FocusArgs),
    /// Take a single still photo
    Still(StillArgs),
    /// Take a numbered sequence of still photos
    Timelapse(TimelapseArgs),
    /// List cameras, sensor modes and resolutions
    List {
        #[command(subcommand)]
        action: Option<ListAction>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Horizontal and vertical flip switches shared by every capture command.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct FlipArgs {
    /// Flip image horizontally
    #[arg(long, overrides_with = "no_hflip")]
    pub hflip: bool,

    /// Do not flip horizontally
    #[arg(long, overrides_with = "hflip")]
    pub no_hflip: bool,

    /// Flip image vertically
    #[arg(long, overrides_with = "no_vflip")]
    pub vflip: bool,

    /// Do not flip vertically
    #[arg(long, overrides_with = "vflip")]
    pub no_vflip: bool,
}

impl FlipArgs {
    pub fn horizontal(&self) -> bool {
        self.hflip && !self.no_hflip
    }

    pub fn vertical(&self) -> bool {
        self.vflip && !self.no_vflip
    }
}

impl From<&FlipArgs> for Flip {
    fn from(args: &FlipArgs) -> Self {
        Flip::new(args.horizontal(), args.vertical())
    }
}

#[derive(ClapArgs, Debug)]
pub struct FocusArgs {
    /// Sensor resolution as W:H
    #[arg(short, long, default_value = "1333:990", value_parser = parse_resolution)]
    pub resolution: Resolution,

    /// Sensor channel bit depth
    #[arg(short, long, default_value_t = 10)]
    pub bits: u32,

    /// Use packed pixel format (default)
    #[arg(short, long, overrides_with = "no_packed")]
    pub packed: bool,

    /// Use unpacked pixel format
    #[arg(long, overrides_with = "packed")]
    pub no_packed: bool,

    /// Focus time in seconds
    #[arg(short, long, default_value_t = 60)]
    pub focus_time: u64,

    /// ISO, converted to sensor gain
    #[arg(short, long, default_value_t = 4800)]
    pub iso: u32,

    /// Metering mode passed through to the camera
    #[arg(short, long, default_value = "average")]
    pub metering: String,

    /// Preview framerate
    #[arg(long, default_value_t = 24)]
    pub framerate: u32,

    #[command(flatten)]
    pub flip: FlipArgs,
}

impl FocusArgs {
    pub fn is_packed(&self) -> bool {
        self.packed || !self.no_packed
    }
}

#[derive(ClapArgs, Debug)]
pub struct StillArgs {
    /// Exposure time: 1/N, N (same as 1/N), or seconds as Ns or N"
    #[arg(value_parser = parse_exposure)]
    pub exposure: Exposure,

    /// Preview time in seconds before the shot
    #[arg(short, long, default_value_t = 0)]
    pub timeout: u64,

    /// ISO, converted to sensor gain
    #[arg(short, long, default_value_t = 100)]
    pub iso: u32,

    /// Also save a raw (DNG) file
    #[arg(long, overrides_with = "no_raw")]
    pub raw: bool,

    /// Do not save a raw file (default)
    #[arg(long, overrides_with = "raw")]
    pub no_raw: bool,

    #[command(flatten)]
    pub flip: FlipArgs,
}

impl StillArgs {
    pub fn is_raw(&self) -> bool {
        self.raw && !self.no_raw
    }
}

#[derive(ClapArgs, Debug)]
pub struct TimelapseArgs {
    /// Exposure time per frame: 1/N, N (same as 1/N), or seconds as Ns or N"
    #[arg(short, long, value_parser = parse_exposure)]
    pub exposure_time: Exposure,

    /// Pause between photos, in seconds (negative means none)
    #[arg(short, long, default_value_t = 0.5, allow_negative_numbers = true)]
    pub pause_time: f64,

    /// Number of photos to take (at least 1)
    #[arg(short, long, default_value_t = 10, allow_negative_numbers = true)]
    pub frames: i64,

    /// ISO, converted to sensor gain
    #[arg(short, long, default_value_t = 100)]
    pub iso: u32,

    /// Also save raw (DNG) files (default)
    #[arg(long, overrides_with = "no_raw")]
    pub raw: bool,

    /// Do not save raw files
    #[arg(long, overrides_with = "raw")]
    pub no_raw: bool,

    #[command(flatten)]
    pub flip: FlipArgs,

    /// Number of the first frame in file names (at least 1)
    #[arg(short = 'F', long, default_value_t = 1, allow_negative_numbers = true)]
    pub frame_start: i64,
}

impl TimelapseArgs {
    pub fn is_raw(&self) -> bool {
        self.raw || !self.no_raw
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ListAction {
    /// Show cameras, optionally with their modes and resolutions
    Cameras {
        /// Camera index to show (repeatable, default: all)
        #[arg(short = 'C')]
        cameras: Vec<u32>,

        /// Do not show sensor modes
        #[arg(long)]
        no_modes: bool,

        /// Do not show resolutions
        #[arg(long)]
        no_resolutions: bool,
    },
    /// Show sensor modes across all cameras
    Modes {
        /// Mode index to show (repeatable, default: all)
        #[arg(short = 'M')]
        modes: Vec<u32>,

        /// Do not show resolutions
        #[arg(long)]
        no_resolutions: bool,
    },
    /// Show resolutions across all sensor modes
    Resolutions {
        /// Resolution index to show (repeatable, default: all)
        #[arg(short = 'R')]
        resolutions: Vec<u32>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
}
