//! Job directory archivers
//!
//! An archiver bundles a finished job directory into a single file next to
//! it. The directory itself is left in place; the upload pipeline removes it.

use layerwatch_core::UploadError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Bundles a job directory into one archive file
pub trait Archiver: Send + Sync {
    /// Archive `job_directory`, returning the path of the bundle
    fn archive(&self, job_directory: &Path) -> Result<PathBuf, UploadError>;
}

fn split_job_path(job_directory: &Path) -> Result<(&Path, String), UploadError> {
    let basename = job_directory
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| UploadError::ArchiveFailed {
            job: job_directory.display().to_string(),
            reason: "job directory has no file name".to_string(),
        })?;
    let parent = job_directory.parent().unwrap_or_else(|| Path::new("."));
    Ok((parent, basename))
}

fn bundle_path(job_directory: &Path, extension: &str) -> PathBuf {
    let mut bundle = job_directory.as_os_str().to_owned();
    bundle.push(".");
    bundle.push(extension);
    PathBuf::from(bundle)
}

/// gzip tarball built by `tar` at lowered scheduling priority
#[derive(Debug, Clone)]
pub struct TarGzArchiver {
    niceness: i32,
}

impl TarGzArchiver {
    /// Create an archiver running `tar` under `nice -n 10`
    pub fn new() -> Self {
        Self { niceness: 10 }
    }

    /// Override the niceness increment
    pub fn with_niceness(niceness: i32) -> Self {
        Self { niceness }
    }
}

impl Default for TarGzArchiver {
    fn default() -> Self {
        Self::new()
    }
}

impl Archiver for TarGzArchiver {
    fn archive(&self, job_directory: &Path) -> Result<PathBuf, UploadError> {
        let (parent, basename) = split_job_path(job_directory)?;
        let bundle = bundle_path(job_directory, "tgz");
        tracing::info!("Compressing {}", basename);

        let output = Command::new("nice")
            .arg("-n")
            .arg(self.niceness.to_string())
            .arg("tar")
            .arg("-C")
            .arg(parent)
            .arg("-zcf")
            .arg(&bundle)
            .arg(&basename)
            .output()
            .map_err(|e| UploadError::ArchiveFailed {
                job: basename.clone(),
                reason: e.to_string(),
            })?;

        tracing::debug!(
            "RETURN: {} STDOUT: {} STDERR: {}",
            output.status,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );

        if !output.status.success() {
            return Err(UploadError::ArchiveFailed {
                job: basename,
                reason: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(bundle)
    }
}

/// Zip archive built in-process
#[derive(Debug, Clone, Default)]
pub struct ZipArchiver;

impl ZipArchiver {
    /// Create a zip archiver
    pub fn new() -> Self {
        Self
    }

    fn options() -> SimpleFileOptions {
        SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
    }

    fn add_directory<W: Write + std::io::Seek>(
        writer: &mut ZipWriter<W>,
        directory: &Path,
        prefix: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        writer.add_directory(prefix, Self::options())?;

        let mut entries = std::fs::read_dir(directory)?.collect::<Result<Vec<_>, _>>()?;
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let name = format!("{}/{}", prefix, entry.file_name().to_string_lossy());
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                Self::add_directory(writer, &path, &name)?;
            } else {
                writer.start_file(name, Self::options())?;
                let mut file = File::open(&path)?;
                std::io::copy(&mut file, writer)?;
            }
        }
        Ok(())
    }
}

impl Archiver for ZipArchiver {
    fn archive(&self, job_directory: &Path) -> Result<PathBuf, UploadError> {
        let (_, basename) = split_job_path(job_directory)?;
        let bundle = bundle_path(job_directory, "zip");
        tracing::info!("Compressing {}", basename);

        let failed = |reason: String| UploadError::ArchiveFailed {
            job: basename.clone(),
            reason,
        };

        let file = File::create(&bundle).map_err(|e| failed(e.to_string()))?;
        let mut writer = ZipWriter::new(BufWriter::new(file));

        Self::add_directory(&mut writer, job_directory, &basename)
            .map_err(|e| failed(e.to_string()))?;
        writer
            .finish()
            .and_then(|mut inner| inner.flush().map_err(Into::into))
            .map_err(|e| failed(e.to_string()))?;

        Ok(bundle)
    }
}
