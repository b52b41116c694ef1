//! Camera discovery via `libcamera-still --list-cameras`.
//!
//! The listing is parsed into cameras, their raw sensor formats ("modes"),
//! and the resolutions each format supports. Mode and resolution keys are
//! numbered across the whole listing so they can be picked by a single
//! index on the command line.

use std::fmt;
use std::process::{Command, Stdio};
use std::sync::OnceLock;

use regex::Regex;

/// Errors that can occur while listing cameras.
#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error("{0} not found. Please install libcamera-apps")]
    BinaryNotFound(String),

    #[error("failed to run {binary}: {source}")]
    SpawnFailed {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{binary} failed while listing cameras (exit code {code:?}): {stderr}")]
    CommandFailed {
        binary: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("camera listing is not valid UTF-8")]
    InvalidOutput(#[from] std::string::FromUtf8Error),
}

/// A sensor resolution offered by a mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeResolution {
    pub key: String,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub crop_position: (u32, u32),
    pub crop_size: (u32, u32),
}

/// A raw sensor format such as `SRGGB10_CSI2P`.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorFormat {
    pub key: String,
    pub format: String,
    pub bayer_order: String,
    pub bit_depth: u32,
    pub packing: String,
    pub resolutions: Vec<ModeResolution>,
}

/// A camera as reported by the capture tool.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub key: String,
    pub dtoverlay: String,
    pub sensor_resolution: (u32, u32),
    pub device: String,
    pub modes: Vec<SensorFormat>,
}

impl fmt::Display for Camera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {{dtoverlay: {}, sensor-resolution: {}x{}, device: {}}}",
            self.key, self.dtoverlay, self.sensor_resolution.0, self.sensor_resolution.1, self.device
        )
    }
}

impl SensorFormat {
    /// Packing as a single letter (`P` or `U`), the form used in `--mode`.
    pub fn packing_letter(&self) -> char {
        self.packing.chars().last().unwrap_or('?')
    }
}

impl fmt::Display for SensorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {{bayer-order: {}, bit-depth: {}, packing: {}}}",
            self.key,
            self.format,
            self.bayer_order,
            self.bit_depth,
            self.packing_letter()
        )
    }
}

impl fmt::Display for ModeResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}x{} {{fps: {:.2}, crop-position: ({}, {}), crop-resolution: {}x{}}}",
            self.key,
            self.width,
            self.height,
            self.fps,
            self.crop_position.0,
            self.crop_position.1,
            self.crop_size.0,
            self.crop_size.1
        )
    }
}

/// Run `<binary> --list-cameras` and parse its output.
pub fn list_cameras(binary: &str) -> Result<Vec<Camera>, ListError> {
    log::debug!("listing cameras with {} --list-cameras", binary);

    let output = Command::new(binary)
        .arg("--list-cameras")
        .stdin(Stdio::null())
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ListError::BinaryNotFound(binary.to_string())
            } else {
                ListError::SpawnFailed {
                    binary: binary.to_string(),
                    source: e,
                }
            }
        })?;

    if !output.status.success() {
        return Err(ListError::CommandFailed {
            binary: binary.to_string(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let stdout = String::from_utf8(output.stdout)?;
    Ok(parse_camera_list(&stdout))
}

fn camera_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2}) : (\w+) \[(\d+)x(\d+)[^\]]*\] \(([^)]+)\)$")
            .expect("camera pattern is valid")
    })
}

fn mode_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:Modes: )?'(S([RGB]{4})(\d+)_(\w+))' : ").expect("mode pattern is valid")
    })
}

fn resolution_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d+)x(\d+) \[(\d+(?:\.\d+)?) fps - \((\d+), (\d+)\)/(\d+)x(\d+) crop\]")
            .expect("resolution pattern is valid")
    })
}

/// Parse the output of `--list-cameras`.
///
/// Lines that do not describe a camera, a sensor format, or a resolution are
/// skipped. Formats and resolutions seen before their parent are dropped.
pub fn parse_camera_list(output: &str) -> Vec<Camera> {
    let mut cameras: Vec<Camera> = Vec::new();
    let mut mode_index = 0usize;
    let mut resolution_index = 0usize;

    for line in output.lines() {
        let mut row = line.trim();
        if row.is_empty() {
            continue;
        }

        if let Some(caps) = camera_re().captures(row) {
            cameras.push(Camera {
                key: format!("C{}", &caps[1]),
                dtoverlay: caps[2].to_string(),
                sensor_resolution: (caps[3].parse().unwrap_or(0), caps[4].parse().unwrap_or(0)),
                device: caps[5].to_string(),
                modes: Vec::new(),
            });
            continue;
        }

        if let Some(caps) = mode_re().captures(row) {
            if let Some(camera) = cameras.last_mut() {
                camera.modes.push(SensorFormat {
                    key: format!("M{}", mode_index),
                    format: caps[1].to_string(),
                    bayer_order: caps[2].to_string(),
                    bit_depth: caps[3].parse().unwrap_or(0),
                    packing: caps[4].to_string(),
                    resolutions: Vec::new(),
                });
                mode_index += 1;
            }
            row = &row[caps[0].len()..];
        }

        if let Some(caps) = resolution_re().captures(row) {
            let mode = cameras
                .last_mut()
                .and_then(|camera| camera.modes.last_mut());
            if let Some(mode) = mode {
                mode.resolutions.push(ModeResolution {
                    key: format!("R{}", resolution_index),
                    width: caps[1].parse().unwrap_or(0),
                    height: caps[2].parse().unwrap_or(0),
                    fps: caps[3].parse().unwrap_or(0.0),
                    crop_position: (caps[4].parse().unwrap_or(0), caps[5].parse().unwrap_or(0)),
                    crop_size: (caps[6].parse().unwrap_or(0), caps[7].parse().unwrap_or(0)),
                });
                resolution_index += 1;
            }
        }
    }

    cameras
}

/// All sensor formats across every camera, in listing order.
pub fn all_modes(cameras: &[Camera]) -> impl Iterator<Item = &SensorFormat> {
    cameras.iter().flat_map(|c| c.modes.iter())
}

/// All resolutions across every camera and format, in listing order.
pub fn all_resolutions(cameras: &[Camera]) -> impl Iterator<Item = &ModeResolution> {
    all_modes(cameras).flat_map(|m| m.resolutions.iter())
}

/// Output of a listing render: lines for stdout and complaints for stderr.
#[derive(Debug, Default, PartialEq)]
pub struct Listing {
    pub lines: Vec<String>,
    pub missing: Vec<String>,
}

/// Keys to show: the requested indices (deduplicated, sorted), or every key.
fn selected_keys(prefix: char, requested: &[u32], all: impl Iterator<Item = String>) -> Vec<String> {
    if requested.is_empty() {
        return all.collect();
    }
    let mut indices = requested.to_vec();
    indices.sort_unstable();
    indices.dedup();
    indices.into_iter().map(|i| format!("{}{}", prefix, i)).collect()
}

/// Render cameras, optionally with their modes and resolutions.
pub fn render_cameras(
    cameras: &[Camera],
    requested: &[u32],
    show_modes: bool,
    show_resolutions: bool,
) -> Listing {
    let mut listing = Listing::default();
    let keys = selected_keys('C', requested, cameras.iter().map(|c| c.key.clone()));

    for key in keys {
        let Some(camera) = cameras.iter().find(|c| c.key == key) else {
            listing.missing.push(format!("no camera '{}' found", key));
            continue;
        };
        listing.lines.push(camera.to_string());
        if !show_modes {
            continue;
        }
        for mode in &camera.modes {
            listing.lines.push(format!("    {}", mode));
            if show_resolutions {
                for resolution in &mode.resolutions {
                    listing.lines.push(format!("        {}", resolution));
                }
            }
        }
    }

    listing
}

/// Render sensor formats across all cameras.
pub fn render_modes(cameras: &[Camera], requested: &[u32], show_resolutions: bool) -> Listing {
    let mut listing = Listing::default();
    let keys = selected_keys('M', requested, all_modes(cameras).map(|m| m.key.clone()));

    for key in keys {
        let Some(mode) = all_modes(cameras).find(|m| m.key == key) else {
            listing.missing.push(format!("no mode '{}' found", key));
            continue;
        };
        listing.lines.push(mode.to_string());
        if show_resolutions {
            for resolution in &mode.resolutions {
                listing.lines.push(format!("    {}", resolution));
            }
        }
    }

    listing
}

/// Render resolutions across all cameras and formats.
pub fn render_resolutions(cameras: &[Camera], requested: &[u32]) -> Listing {
    let mut listing = Listing::default();
    let keys = selected_keys(
        'R',
        requested,
        all_resolutions(cameras).map(|r| r.key.clone()),
    );

    for key in keys {
        match all_resolutions(cameras).find(|r| r.key == key) {
            Some(resolution) => listing.lines.push(resolution.to_string()),
            None => listing
                .missing
                .push(format!("no resolution '{}' found", key)),
        }
    }

    listing
}
