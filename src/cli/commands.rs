//! Subcommand handlers for capture, list, and config actions.

use std::path::Path;

use camerpi::cameras::{self, Camera, ListError, Listing};
use camerpi::capture::{FocusCapture, Packing, SensorMode, StillCapture, TimelapseCapture};
use camerpi::config::{default_path, Config};
use camerpi::runner;

use super::args::{ConfigAction, FocusArgs, ListAction, StillArgs, TimelapseArgs};

/// Build the focus preview command line.
pub fn focus_command(args: &FocusArgs, config: &Config) -> Vec<String> {
    let mode = SensorMode::new(args.resolution, args.bits, Packing::from_flag(args.is_packed()));
    FocusCapture::new()
        .with_mode(mode)
        .with_focus_secs(args.focus_time)
        .with_iso(args.iso)
        .with_metering(args.metering.as_str())
        .with_framerate(args.framerate)
        .with_flip((&args.flip).into())
        .to_command(&config.camera.binary)
}

/// Build the single still command line.
pub fn still_command(args: &StillArgs, config: &Config) -> Vec<String> {
    StillCapture::new(args.exposure)
        .with_mode(config.still.mode)
        .with_timeout_secs(args.timeout)
        .with_iso(args.iso)
        .with_raw(args.is_raw())
        .with_flip((&args.flip).into())
        .with_latest(config.still.latest.as_str())
        .to_command(&config.camera.binary)
}

/// Build the timelapse command line.
pub fn timelapse_command(args: &TimelapseArgs, config: &Config) -> Vec<String> {
    TimelapseCapture::new(args.exposure_time)
        .with_mode(config.timelapse.mode)
        .with_pause_secs(args.pause_time)
        .with_frames(args.frames)
        .with_iso(args.iso)
        .with_raw(args.is_raw())
        .with_flip((&args.flip).into())
        .with_frame_start(args.frame_start)
        .with_output(config.timelapse.output.as_str())
        .to_command(&config.camera.binary)
}

pub fn run_focus(args: &FocusArgs, config: &Config) {
    runner::run_command(&focus_command(args, config));
}

pub fn run_still(args: &StillArgs, config: &Config) {
    runner::run_command(&still_command(args, config));
}

pub fn run_timelapse(args: &TimelapseArgs, config: &Config) {
    runner::run_command(&timelapse_command(args, config));
}

/// Render the requested listing. `None` shows everything.
fn render_listing(found: &[Camera], action: Option<&ListAction>) -> Listing {
    match action {
        None => cameras::render_cameras(found, &[], true, true),
        Some(ListAction::Cameras {
            cameras: requested,
            no_modes,
            no_resolutions,
        }) => cameras::render_cameras(found, requested, !no_modes, !no_resolutions),
        Some(ListAction::Modes {
            modes,
            no_resolutions,
        }) => cameras::render_modes(found, modes, !no_resolutions),
        Some(ListAction::Resolutions { resolutions }) => {
            cameras::render_resolutions(found, resolutions)
        }
    }
}

/// List cameras, modes, or resolutions and print them to stdout.
pub fn list(action: Option<&ListAction>, config: &Config) -> Result<(), ListError> {
    let found = cameras::list_cameras(&config.camera.binary)?;
    if found.is_empty() {
        println!("no cameras found");
        return Ok(());
    }

    let listing = render_listing(&found, action);
    for line in &listing.lines {
        println!("{}", line);
    }
    for missing in &listing.missing {
        eprintln!("{}", missing);
    }
    Ok(())
}

/// Handle config subcommand actions.
pub fn handle_config_action(action: &ConfigAction, config: &Config, explicit: Option<&Path>) {
    match action {
        ConfigAction::Show => {
            println!("Current configuration:");
            println!("  Camera binary:     {}", config.camera.binary);
            println!("  Still mode:        {}", config.still.mode);
            println!("  Still latest:      {}", config.still.latest);
            println!("  Timelapse mode:    {}", config.timelapse.mode);
            println!("  Timelapse output:  {}", config.timelapse.output);
            println!();

            let config_path = explicit.map(Path::to_path_buf).unwrap_or_else(default_path);
            if config_path.exists() {
                println!("Config file: {} (exists)", config_path.display());
            } else {
                println!("Config file: {} (not found)", config_path.display());
            }
        }
    }
}
