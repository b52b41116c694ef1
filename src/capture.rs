//! Capture command assembly for focus, still, and timelapse runs.
//!
//! Each capture type knows how to turn its settings into the ordered
//! argument list expected by `libcamera-still`. Flags that are switched off
//! are left out of the list entirely.

use std::fmt;
use std::str::FromStr;

use crate::exposure::{iso_to_gain, timelapse_timeout_ms, Exposure};

/// Sensor resolution in `W:H` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (width, height) = s
            .split_once(':')
            .ok_or_else(|| format!("Invalid resolution format '{}'. Use W:H (e.g., 1333:990)", s))?;
        let width: u32 = width
            .trim()
            .parse()
            .map_err(|_| format!("Invalid width '{}' in resolution", width))?;
        let height: u32 = height
            .trim()
            .parse()
            .map_err(|_| format!("Invalid height '{}' in resolution", height))?;
        Ok(Self { width, height })
    }
}

/// Pixel packing of raw sensor data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Packing {
    #[default]
    Packed,
    Unpacked,
}

impl Packing {
    pub fn from_flag(packed: bool) -> Self {
        if packed {
            Packing::Packed
        } else {
            Packing::Unpacked
        }
    }

    fn as_char(self) -> char {
        match self {
            Packing::Packed => 'P',
            Packing::Unpacked => 'U',
        }
    }
}

/// A sensor mode as understood by `--mode`, e.g. `4056:3040:12:P`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorMode {
    pub resolution: Resolution,
    pub bit_depth: u32,
    pub packing: Packing,
}

impl SensorMode {
    pub fn new(resolution: Resolution, bit_depth: u32, packing: Packing) -> Self {
        Self {
            resolution,
            bit_depth,
            packing,
        }
    }
}

impl Default for SensorMode {
    /// Full-resolution 12-bit packed mode of the HQ camera.
    fn default() -> Self {
        Self::new(Resolution::new(4056, 3040), 12, Packing::Packed)
    }
}

impl fmt::Display for SensorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.resolution,
            self.bit_depth,
            self.packing.as_char()
        )
    }
}

impl FromStr for SensorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 4 {
            return Err(format!(
                "Invalid sensor mode '{}'. Use W:H:BITS:P or W:H:BITS:U",
                s
            ));
        }
        let resolution: Resolution = format!("{}:{}", parts[0], parts[1]).parse()?;
        let bit_depth: u32 = parts[2]
            .parse()
            .map_err(|_| format!("Invalid bit depth '{}' in sensor mode", parts[2]))?;
        let packing = match parts[3] {
            "P" | "p" => Packing::Packed,
            "U" | "u" => Packing::Unpacked,
            other => return Err(format!("Invalid packing '{}' in sensor mode", other)),
        };
        Ok(Self::new(resolution, bit_depth, packing))
    }
}

/// Horizontal and vertical flip switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flip {
    pub horizontal: bool,
    pub vertical: bool,
}

impl Flip {
    pub fn new(horizontal: bool, vertical: bool) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }
}

/// Push `flag` only when `enabled` is set.
fn push_flag(args: &mut Vec<String>, flag: &str, enabled: bool) {
    if enabled {
        args.push(flag.to_string());
    }
}

/// Clamp a user-supplied count into `1..=u32::MAX`.
fn clamp_count(value: i64) -> u32 {
    u32::try_from(value.max(1)).unwrap_or(u32::MAX)
}

/// Preview run used to focus the lens.
#[derive(Debug, Clone)]
pub struct FocusCapture {
    pub mode: SensorMode,
    /// How long the preview stays open, in seconds
    pub focus_secs: u64,
    pub iso: u32,
    pub metering: String,
    pub framerate: u32,
    pub flip: Flip,
}

impl Default for FocusCapture {
    fn default() -> Self {
        Self {
            mode: SensorMode::new(Resolution::new(1333, 990), 10, Packing::Packed),
            focus_secs: 60,
            iso: 4800,
            metering: "average".to_string(),
            framerate: 24,
            flip: Flip::default(),
        }
    }
}

impl FocusCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: SensorMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_focus_secs(mut self, secs: u64) -> Self {
        self.focus_secs = secs;
        self
    }

    pub fn with_iso(mut self, iso: u32) -> Self {
        self.iso = iso;
        self
    }

    pub fn with_metering(mut self, metering: impl Into<String>) -> Self {
        self.metering = metering.into();
        self
    }

    pub fn with_framerate(mut self, framerate: u32) -> Self {
        self.framerate = framerate;
        self
    }

    pub fn with_flip(mut self, flip: Flip) -> Self {
        self.flip = flip;
        self
    }

    /// Build the full command line, starting with `binary`.
    pub fn to_command(&self, binary: &str) -> Vec<String> {
        let mut args = vec![
            binary.to_string(),
            "--mode".to_string(),
            self.mode.to_string(),
            "-t".to_string(),
            self.focus_secs.saturating_mul(1000).to_string(),
            "--gain".to_string(),
            iso_to_gain(self.iso).to_string(),
            "--framerate".to_string(),
            self.framerate.to_string(),
            "--metering".to_string(),
            self.metering.clone(),
        ];
        push_flag(&mut args, "--hflip", self.flip.horizontal);
        push_flag(&mut args, "--vflip", self.flip.vertical);
        args
    }
}

/// Single still capture written to a `--latest` symlinked file.
#[derive(Debug, Clone)]
pub struct StillCapture {
    pub mode: SensorMode,
    pub exposure: Exposure,
    /// Preview time before the shot, in seconds (0 = none)
    pub timeout_secs: u64,
    pub iso: u32,
    pub raw: bool,
    pub flip: Flip,
    pub latest: String,
}

impl StillCapture {
    pub fn new(exposure: Exposure) -> Self {
        Self {
            mode: SensorMode::default(),
            exposure,
            timeout_secs: 0,
            iso: 100,
            raw: false,
            flip: Flip::default(),
            latest: "latest.jpg".to_string(),
        }
    }

    pub fn with_mode(mut self, mode: SensorMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_iso(mut self, iso: u32) -> Self {
        self.iso = iso;
        self
    }

    pub fn with_raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }

    pub fn with_flip(mut self, flip: Flip) -> Self {
        self.flip = flip;
        self
    }

    pub fn with_latest(mut self, latest: impl Into<String>) -> Self {
        self.latest = latest.into();
        self
    }

    /// Build the full command line, starting with `binary`.
    pub fn to_command(&self, binary: &str) -> Vec<String> {
        let mut args = vec![
            binary.to_string(),
            "--mode".to_string(),
            self.mode.to_string(),
            "-n".to_string(),
        ];
        if self.timeout_secs > 0 {
            let timeout_ms = self.timeout_secs.saturating_mul(1000);
            args.extend(["-t".to_string(), timeout_ms.to_string()]);
        }
        args.extend([
            "--shutter".to_string(),
            self.exposure.as_micros().to_string(),
            "--gain".to_string(),
            iso_to_gain(self.iso).to_string(),
            "--datetime".to_string(),
            "--latest".to_string(),
            self.latest.clone(),
        ]);
        push_flag(&mut args, "--raw", self.raw);
        push_flag(&mut args, "--hflip", self.flip.horizontal);
        push_flag(&mut args, "--vflip", self.flip.vertical);
        args
    }
}

/// Numbered sequence of stills separated by a fixed pause.
#[derive(Debug, Clone)]
pub struct TimelapseCapture {
    pub mode: SensorMode,
    pub exposure: Exposure,
    /// Pause between frames, in seconds
    pub pause_secs: f64,
    pub frames: u32,
    pub iso: u32,
    pub raw: bool,
    pub flip: Flip,
    pub frame_start: u32,
    /// printf-style file name pattern passed to `-o`
    pub output: String,
}

impl TimelapseCapture {
    pub fn new(exposure: Exposure) -> Self {
        Self {
            mode: SensorMode::default(),
            exposure,
            pause_secs: 0.5,
            frames: 10,
            iso: 100,
            raw: true,
            flip: Flip::default(),
            frame_start: 1,
            output: "timelapse_%04d.jpg".to_string(),
        }
    }

    pub fn with_mode(mut self, mode: SensorMode) -> Self {
        self.mode = mode;
        self
    }

    /// Negative pauses are treated as no pause.
    pub fn with_pause_secs(mut self, secs: f64) -> Self {
        self.pause_secs = secs.max(0.0);
        self
    }

    /// At least one frame is always taken.
    pub fn with_frames(mut self, frames: i64) -> Self {
        self.frames = clamp_count(frames);
        self
    }

    pub fn with_iso(mut self, iso: u32) -> Self {
        self.iso = iso;
        self
    }

    pub fn with_raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }

    pub fn with_flip(mut self, flip: Flip) -> Self {
        self.flip = flip;
        self
    }

    /// Frame numbering starts at 1 or later.
    pub fn with_frame_start(mut self, start: i64) -> Self {
        self.frame_start = clamp_count(start);
        self
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    /// Pause between frames as passed to `--timelapse`.
    pub fn pause_ms(&self) -> u64 {
        (self.pause_secs * 1000.0) as u64
    }

    /// Overall timeout given to the capture tool via `-t`.
    pub fn timeout_ms(&self) -> u64 {
        timelapse_timeout_ms(self.frames, self.exposure.as_secs_f64(), self.pause_secs)
    }

    /// Build the full command line, starting with `binary`.
    pub fn to_command(&self, binary: &str) -> Vec<String> {
        let mut args = vec![
            binary.to_string(),
            "--mode".to_string(),
            self.mode.to_string(),
            "-n".to_string(),
            "-t".to_string(),
            self.timeout_ms().to_string(),
            "--shutter".to_string(),
            self.exposure.as_micros().to_string(),
            "--gain".to_string(),
            iso_to_gain(self.iso).to_string(),
            "-o".to_string(),
            self.output.clone(),
            "--timelapse".to_string(),
            self.pause_ms().to_string(),
        ];
        push_flag(&mut args, "--vflip", self.flip.vertical);
        push_flag(&mut args, "--hflip", self.flip.horizontal);
        args.extend(["--framestart".to_string(), self.frame_start.to_string()]);
        push_flag(&mut args, "-r", self.raw);
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exposure(s: &str) -> Exposure {
        s.parse().unwrap()
    }

    fn position(args: &[String], token: &str) -> usize {
        args.iter()
            .position(|a| a == token)
            .unwrap_or_else(|| panic!("missing token {}", token))
    }

    #[test]
    fn test_resolution_parse() {
        let res: Resolution = "1333:990".parse().unwrap();
        assert_eq!(res, Resolution::new(1333, 990));
        assert_eq!(res.to_string(), "1333:990");
    }

    #[test]
    fn test_resolution_parse_invalid() {
        assert!("1333x990".parse::<Resolution>().is_err());
        assert!("abc:990".parse::<Resolution>().is_err());
        assert!("1333:".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_sensor_mode_display() {
        assert_eq!(SensorMode::default().to_string(), "4056:3040:12:P");
        let mode = SensorMode::new(Resolution::new(2028, 1520), 12, Packing::Unpacked);
        assert_eq!(mode.to_string(), "2028:1520:12:U");
    }

    #[test]
    fn test_sensor_mode_parse() {
        let mode: SensorMode = "8000:6000:10:P".parse().unwrap();
        assert_eq!(mode.resolution, Resolution::new(8000, 6000));
        assert_eq!(mode.bit_depth, 10);
        assert_eq!(mode.packing, Packing::Packed);

        assert!("8000:6000:10".parse::<SensorMode>().is_err());
        assert!("8000:6000:10:X".parse::<SensorMode>().is_err());
        assert!("8000:6000:ten:P".parse::<SensorMode>().is_err());
    }

    #[test]
    fn test_packing_from_flag() {
        assert_eq!(Packing::from_flag(true), Packing::Packed);
        assert_eq!(Packing::from_flag(false), Packing::Unpacked);
    }

    #[test]
    fn test_focus_defaults() {
        let args = FocusCapture::new().to_command("libcamera-still");
        assert_eq!(
            args,
            vec![
                "libcamera-still",
                "--mode",
                "1333:990:10:P",
                "-t",
                "60000",
                "--gain",
                "48",
                "--framerate",
                "24",
                "--metering",
                "average",
            ]
        );
    }

    #[test]
    fn test_focus_with_flips_and_options() {
        let args = FocusCapture::new()
            .with_mode(SensorMode::new(Resolution::new(2028, 1080), 12, Packing::Unpacked))
            .with_focus_secs(5)
            .with_iso(800)
            .with_metering("spot")
            .with_framerate(30)
            .with_flip(Flip::new(true, true))
            .to_command("libcamera-still");

        assert_eq!(args[2], "2028:1080:12:U");
        assert_eq!(args[position(&args, "-t") + 1], "5000");
        assert_eq!(args[position(&args, "--gain") + 1], "8");
        assert_eq!(args[position(&args, "--metering") + 1], "spot");
        assert_eq!(args[position(&args, "--framerate") + 1], "30");
        assert_eq!(&args[args.len() - 2..], ["--hflip", "--vflip"]);
    }

    #[test]
    fn test_still_defaults() {
        let args = StillCapture::new(exposure("1/250")).to_command("libcamera-still");
        assert_eq!(
            args,
            vec![
                "libcamera-still",
                "--mode",
                "4056:3040:12:P",
                "-n",
                "--shutter",
                "4000",
                "--gain",
                "1",
                "--datetime",
                "--latest",
                "latest.jpg",
            ]
        );
        assert!(!args.iter().any(|a| a.is_empty()));
    }

    #[test]
    fn test_still_shutter_before_gain() {
        let args = StillCapture::new(exposure("1/250")).to_command("libcamera-still");
        let shutter = position(&args, "--shutter");
        let gain = position(&args, "--gain");
        assert_eq!(args[shutter + 1], "4000");
        assert_eq!(args[gain + 1], "1");
        assert!(shutter < gain);
    }

    #[test]
    fn test_still_timeout_is_two_tokens() {
        let args = StillCapture::new(exposure("2s"))
            .with_timeout_secs(5)
            .to_command("libcamera-still");
        let t = position(&args, "-t");
        assert_eq!(args[t + 1], "5000");
        assert!(t > position(&args, "-n"));
        assert!(t < position(&args, "--shutter"));
    }

    #[test]
    fn test_still_flags_order() {
        let args = StillCapture::new(exposure("30"))
            .with_raw(true)
            .with_flip(Flip::new(true, true))
            .with_iso(1600)
            .with_latest("moon.jpg")
            .to_command("libcamera-still");
        assert_eq!(&args[args.len() - 3..], ["--raw", "--hflip", "--vflip"]);
        assert_eq!(args[position(&args, "--latest") + 1], "moon.jpg");
        assert_eq!(args[position(&args, "--gain") + 1], "16");
        assert_eq!(args[position(&args, "--shutter") + 1], "33333");
    }

    #[test]
    fn test_timelapse_defaults() {
        let capture = TimelapseCapture::new(exposure("2s"));
        assert_eq!(capture.timeout_ms(), 40_000);
        assert_eq!(capture.pause_ms(), 500);

        let args = capture.to_command("libcamera-still");
        assert_eq!(
            args,
            vec![
                "libcamera-still",
                "--mode",
                "4056:3040:12:P",
                "-n",
                "-t",
                "40000",
                "--shutter",
                "2000000",
                "--gain",
                "1",
                "-o",
                "timelapse_%04d.jpg",
                "--timelapse",
                "500",
                "--framestart",
                "1",
                "-r",
            ]
        );
    }

    #[test]
    fn test_timelapse_flip_order_and_no_raw() {
        let args = TimelapseCapture::new(exposure("1/100"))
            .with_flip(Flip::new(true, true))
            .with_raw(false)
            .to_command("libcamera-still");
        let vflip = position(&args, "--vflip");
        let hflip = position(&args, "--hflip");
        assert!(vflip < hflip);
        assert!(hflip < position(&args, "--framestart"));
        assert!(!args.contains(&"-r".to_string()));
    }

    #[test]
    fn test_timelapse_normalizes_inputs() {
        let capture = TimelapseCapture::new(exposure("1s"))
            .with_frames(0)
            .with_frame_start(0)
            .with_pause_secs(-3.0);
        assert_eq!(capture.frames, 1);
        assert_eq!(capture.frame_start, 1);
        assert_eq!(capture.pause_ms(), 0);
        assert_eq!(capture.timeout_ms(), 11_000);
    }

    #[test]
    fn test_timelapse_custom_values() {
        let args = TimelapseCapture::new(exposure("1/2"))
            .with_frames(100)
            .with_pause_secs(1.25)
            .with_frame_start(42)
            .with_iso(3200)
            .with_output("m42_%05d.jpg")
            .to_command("cam");
        assert_eq!(args[0], "cam");
        // ceil(0.5 + 1.25) = 2 seconds per frame
        assert_eq!(args[position(&args, "-t") + 1], "210000");
        assert_eq!(args[position(&args, "--timelapse") + 1], "1250");
        assert_eq!(args[position(&args, "--framestart") + 1], "42");
        assert_eq!(args[position(&args, "--gain") + 1], "32");
        assert_eq!(args[position(&args, "-o") + 1], "m42_%05d.jpg");
    }

    #[test]
    fn test_timelapse_clamps_negative_counts() {
        let capture = TimelapseCapture::new(exposure("1s"))
            .with_frames(-3)
            .with_frame_start(-1);
        assert_eq!(capture.frames, 1);
        assert_eq!(capture.frame_start, 1);

        let capture = capture.with_frames(i64::MAX).with_frame_start(i64::MAX);
        assert_eq!(capture.frames, u32::MAX);
        assert_eq!(capture.frame_start, u32::MAX);
    }

    #[test]
    fn test_long_timeouts_saturate() {
        let args = FocusCapture::new()
            .with_focus_secs(u64::MAX / 100)
            .to_command("libcamera-still");
        assert_eq!(args[position(&args, "-t") + 1], u64::MAX.to_string());

        let args = StillCapture::new(exposure("1/250"))
            .with_timeout_secs(u64::MAX / 100)
            .to_command("libcamera-still");
        assert_eq!(args[position(&args, "-t") + 1], u64::MAX.to_string());

        let args = TimelapseCapture::new(exposure("1e12s"))
            .with_frames(i64::from(u32::MAX))
            .to_command("libcamera-still");
        assert_eq!(args[position(&args, "-t") + 1], u64::MAX.to_string());
    }
}
