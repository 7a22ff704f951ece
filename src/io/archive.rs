/// Archive bundle writer
///
/// Writes the master image and the report as two files sharing a
/// content-derived base name, packs both into one zip archive and removes
/// the uncompressed files once the archive is complete.

use crate::error::{RescueError, Result};
use crate::format::constants::*;
use crate::image::MasterImage;
use crate::report::RescueReport;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Final artifact of a rescue run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveBundle {
    /// Path of the zip archive
    pub path: PathBuf,
    /// Base name shared by the archive and its entries
    pub base_name: String,
    /// 8-character content fingerprint
    pub fingerprint: String,
    /// Health score embedded in the name
    pub health_score: u8,
}

impl ArchiveBundle {
    /// Archive file name without directory
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.base_name, ARCHIVE_EXTENSION)
    }

    /// Directory holding the archive
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Name of the raw image entry inside the archive
    pub fn image_entry(&self) -> String {
        format!("{}.{}", self.base_name, IMAGE_EXTENSION)
    }

    /// Name of the report entry inside the archive
    pub fn report_entry(&self) -> String {
        format!("{}.{}", self.base_name, REPORT_EXTENSION)
    }
}

/// Derive the 8-character fingerprint of an image
///
/// First and last four hex digits of the MD5 digest, uppercased.
pub fn fingerprint(image: &[u8]) -> String {
    let digest = format!("{:x}", md5::compute(image));
    format!("{}{}", &digest[..4], &digest[digest.len() - 4..]).to_uppercase()
}

/// Reduce a user comment to `[A-Za-z0-9_-]`, at most 32 characters
pub fn sanitize_comment(raw: &str) -> String {
    let comment: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .take(MAX_COMMENT_LEN)
        .collect();
    if comment.is_empty() {
        DEFAULT_COMMENT.to_string()
    } else {
        comment
    }
}

/// Build the base name `{timestamp}_{comment}_{fingerprint}_{health}`
pub fn base_name(timestamp: &str, comment: &str, fingerprint: &str, health_score: u8) -> String {
    format!(
        "{}_{}_{}_{}",
        timestamp,
        sanitize_comment(comment),
        fingerprint,
        health_score
    )
}

/// Writes archive bundles into an output directory
#[derive(Debug, Clone)]
pub struct ArchiveBuilder {
    output_dir: PathBuf,
}

impl ArchiveBuilder {
    /// Create a builder writing into `output_dir`
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Get the output directory
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write the bundle for a finished rescue
    ///
    /// Any failure after the scan is a fatal archival error; the
    /// intermediate files already written are left on disk and listed in it.
    pub fn build(
        &self,
        image: &MasterImage,
        report: &RescueReport,
        comment: &str,
        health_score: u8,
    ) -> Result<ArchiveBundle> {
        let fingerprint = fingerprint(image.as_bytes());
        let base_name = base_name(&report.filename_timestamp, comment, &fingerprint, health_score);

        fs::create_dir_all(&self.output_dir).map_err(|source| RescueError::IntermediateWrite {
            path: self.output_dir.clone(),
            intermediates: Vec::new(),
            source,
        })?;

        let image_path = self.entry_path(&base_name, IMAGE_EXTENSION);
        let report_path = self.entry_path(&base_name, REPORT_EXTENSION);
        let archive_path = self.entry_path(&base_name, ARCHIVE_EXTENSION);

        let mut intermediates = Vec::with_capacity(2);
        write_intermediate(&image_path, image.as_bytes(), &mut intermediates)?;

        let json = report.to_json().map_err(|source| RescueError::Serialization {
            intermediates: intermediates.clone(),
            source,
        })?;
        write_intermediate(&report_path, &json, &mut intermediates)?;

        if let Err(source) = write_zip(&archive_path, &intermediates) {
            warn!(archive = %archive_path.display(), error = %source, "compression failed, keeping intermediates");
            // A half-written archive must not look like a finished one
            let _ = fs::remove_file(&archive_path);
            return Err(RescueError::Compression {
                archive: archive_path,
                intermediates,
                source,
            });
        }

        for path in &intermediates {
            if let Err(err) = fs::remove_file(path) {
                warn!(path = %path.display(), error = %err, "could not remove intermediate file");
            }
        }

        info!(archive = %archive_path.display(), %fingerprint, health_score, "archive written");

        Ok(ArchiveBundle {
            path: archive_path,
            base_name,
            fingerprint,
            health_score,
        })
    }

    fn entry_path(&self, base_name: &str, extension: &str) -> PathBuf {
        self.output_dir.join(format!("{}.{}", base_name, extension))
    }
}

/// Write one uncompressed bundle file and remember it in `written`
///
/// On failure every file already on disk, including a partial one, is
/// listed in the error.
fn write_intermediate(path: &Path, data: &[u8], written: &mut Vec<PathBuf>) -> Result<()> {
    if let Err(source) = fs::write(path, data) {
        if path.is_file() {
            written.push(path.to_path_buf());
        }
        warn!(path = %path.display(), error = %source, "could not write intermediate file");
        return Err(RescueError::IntermediateWrite {
            path: path.to_path_buf(),
            intermediates: written.clone(),
            source,
        });
    }
    written.push(path.to_path_buf());
    Ok(())
}

/// Pack files into a deflated zip, each stored under its file name
fn write_zip(archive_path: &Path, files: &[PathBuf]) -> zip::result::ZipResult<()> {
    let mut zip = ZipWriter::new(File::create(archive_path)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in files {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "entry name is not UTF-8"))?;
        zip.start_file(name, options)?;
        io::copy(&mut File::open(path)?, &mut zip)?;
    }

    zip.finish()?.sync_all()?;
    Ok(())
}
