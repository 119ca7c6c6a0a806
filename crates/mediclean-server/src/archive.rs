//! Zip packaging of run artifacts

use mediclean_core::Artifact;
use std::io::{Cursor, Write};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// File name of the downloadable bundle
pub const ARCHIVE_NAME: &str = "processed_files.zip";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("No files to zip")]
    Empty,

    #[error("failed to read artifact {name}: {source}")]
    Read {
        name: String,
        source: std::io::Error,
    },

    #[error("failed to write archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("failed to write archive: {0}")]
    Io(#[from] std::io::Error),
}

/// Bundle every artifact into an in-memory zip, one entry per artifact name
pub fn build_archive(artifacts: &[Artifact]) -> Result<Vec<u8>, ArchiveError> {
    if artifacts.is_empty() {
        return Err(ArchiveError::Empty);
    }

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for artifact in artifacts {
        let content = std::fs::read(&artifact.path).map_err(|source| ArchiveError::Read {
            name: artifact.name.clone(),
            source,
        })?;
        writer.start_file(artifact.name.as_str(), options)?;
        writer.write_all(&content)?;
    }

    Ok(writer.finish()?.into_inner())
}
