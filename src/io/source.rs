/// Source device resolution
///
/// Turns an optional user-supplied path (or `auto`) into a concrete device
/// path. Each platform gets its own resolver; the scanner only ever sees the
/// resolved path.

use crate::boot::has_fat12_marker;
use crate::error::{RescueError, Result};
use crate::format::constants::BOOT_SECTOR_SIZE;
use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Sentinel asking for the platform default device
pub const AUTO_SOURCE: &str = "auto";

/// Raw device of the first floppy drive on Windows
pub const WINDOWS_FLOPPY: &str = r"\\.\A:";

/// First floppy drive on Linux
pub const LINUX_FLOPPY: &str = "/dev/fd0";

/// Device sizes accepted as "about 1.4MB"
pub const FLOPPY_SIZE_RANGE: RangeInclusive<u64> = 1_400_000..=1_500_000;

/// A block device considered during enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCandidate {
    /// Device path
    pub path: PathBuf,
    /// Size in bytes, if the device could be measured
    pub size: Option<u64>,
    /// Whether the boot sector carries a FAT12 marker
    pub fat12: bool,
}

impl DeviceCandidate {
    /// Whether the device looks like a floppy
    pub fn is_floppy_like(&self) -> bool {
        looks_like_floppy(self.size, self.fat12)
    }
}

/// Size/marker heuristic for floppy detection
pub fn looks_like_floppy(size: Option<u64>, fat12: bool) -> bool {
    fat12 || size.map(|s| FLOPPY_SIZE_RANGE.contains(&s)).unwrap_or(false)
}

/// Resolves the device to rescue from
pub trait SourceResolver {
    /// Device used when the user asked for `auto`
    fn default_source(&self) -> Result<PathBuf>;

    /// Enumerate floppy-like devices
    fn list_devices(&self) -> Result<Vec<DeviceCandidate>>;

    /// Resolve an optional user path; `None`, empty or `auto` picks the default
    fn resolve(&self, requested: Option<&str>) -> Result<PathBuf> {
        match requested.map(str::trim) {
            Some(path) if !path.is_empty() && !path.eq_ignore_ascii_case(AUTO_SOURCE) => {
                Ok(PathBuf::from(path))
            }
            _ => self.default_source(),
        }
    }
}

/// Windows: fixed raw drive letter
#[derive(Debug, Clone, Default)]
pub struct WindowsResolver;

impl SourceResolver for WindowsResolver {
    fn default_source(&self) -> Result<PathBuf> {
        Ok(PathBuf::from(WINDOWS_FLOPPY))
    }

    fn list_devices(&self) -> Result<Vec<DeviceCandidate>> {
        Err(RescueError::unsupported(
            "device listing is not available on Windows; use --source",
        ))
    }
}

/// Linux: `/dev/fd0` by default, USB floppies show up as `sdX`
#[derive(Debug, Clone)]
pub struct LinuxResolver {
    dev_dir: PathBuf,
}

impl LinuxResolver {
    /// Resolver scanning `/dev`
    pub fn new() -> Self {
        Self::with_dev_dir("/dev")
    }

    /// Resolver scanning a different device directory
    pub fn with_dev_dir<P: Into<PathBuf>>(dev_dir: P) -> Self {
        Self {
            dev_dir: dev_dir.into(),
        }
    }
}

impl Default for LinuxResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceResolver for LinuxResolver {
    fn default_source(&self) -> Result<PathBuf> {
        Ok(PathBuf::from(LINUX_FLOPPY))
    }

    fn list_devices(&self) -> Result<Vec<DeviceCandidate>> {
        let mut devices = Vec::new();
        for path in device_entries(&self.dev_dir, &["fd", "sd"])? {
            let candidate = probe(&path);
            let is_fd = file_name(&path).starts_with("fd");
            if is_fd || candidate.is_floppy_like() {
                devices.push(candidate);
            }
        }
        Ok(devices)
    }
}

/// Other Unix-like systems: enumerate whole disks and pick the floppy-sized one
#[derive(Debug, Clone)]
pub struct UnixResolver {
    dev_dir: PathBuf,
}

impl UnixResolver {
    /// Device name prefixes considered (macOS disks, BSD da and fd)
    pub const PREFIXES: [&'static str; 3] = ["disk", "da", "fd"];

    /// Resolver scanning `/dev`
    pub fn new() -> Self {
        Self::with_dev_dir("/dev")
    }

    /// Resolver scanning a different device directory
    pub fn with_dev_dir<P: Into<PathBuf>>(dev_dir: P) -> Self {
        Self {
            dev_dir: dev_dir.into(),
        }
    }
}

impl Default for UnixResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceResolver for UnixResolver {
    fn default_source(&self) -> Result<PathBuf> {
        self.list_devices()?
            .into_iter()
            .next()
            .map(|candidate| candidate.path)
            .ok_or_else(|| {
                RescueError::source_open(
                    self.dev_dir.clone(),
                    io::Error::new(io::ErrorKind::NotFound, "no floppy-sized device found"),
                )
            })
    }

    fn list_devices(&self) -> Result<Vec<DeviceCandidate>> {
        let devices = device_entries(&self.dev_dir, &Self::PREFIXES)?
            .iter()
            .map(|path| probe(path))
            .filter(DeviceCandidate::is_floppy_like)
            .collect();
        Ok(devices)
    }
}

/// Resolver for the platform this binary was built for
pub fn platform_resolver() -> Box<dyn SourceResolver> {
    if cfg!(windows) {
        Box::new(WindowsResolver)
    } else if cfg!(target_os = "linux") {
        Box::new(LinuxResolver::new())
    } else {
        Box::new(UnixResolver::new())
    }
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("")
}

/// Whether `name` is a whole device (not a partition) with the given prefix
///
/// `sd` devices are lettered (`sdb`), the others numbered (`fd0`, `disk3`).
fn is_whole_device(name: &str, prefix: &str) -> bool {
    match name.strip_prefix(prefix) {
        Some(rest) if !rest.is_empty() => {
            if prefix == "sd" {
                rest.chars().all(|c| c.is_ascii_lowercase())
            } else {
                rest.chars().all(|c| c.is_ascii_digit())
            }
        }
        _ => false,
    }
}

/// Whole-device entries of `dir` matching one of the prefixes, sorted
fn device_entries(dir: &Path, prefixes: &[&str]) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            let name = file_name(path);
            prefixes.iter().any(|prefix| is_whole_device(name, prefix))
        })
        .collect();
    paths.sort();
    paths.dedup();
    Ok(paths)
}

/// Measure a device and look for a FAT12 boot sector
fn probe(path: &Path) -> DeviceCandidate {
    let mut candidate = DeviceCandidate {
        path: path.to_path_buf(),
        size: None,
        fat12: false,
    };

    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "cannot probe device");
            return candidate;
        }
    };

    // Block devices report a zero length in their metadata; seeking to the end works
    candidate.size = file.seek(SeekFrom::End(0)).ok().filter(|&size| size > 0);

    let mut boot = [0u8; BOOT_SECTOR_SIZE];
    if file.seek(SeekFrom::Start(0)).is_ok() && file.read_exact(&mut boot).is_ok() {
        candidate.fat12 = has_fat12_marker(&boot);
    }

    candidate
}
