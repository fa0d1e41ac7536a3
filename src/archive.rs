use std::collections::HashSet;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::error::Error;
use crate::model::RenderedArtifact;

pub const DEFAULT_ARCHIVE_NAME: &str = "todos_los_pdfs.zip";

/// Receives a completed batch. Called once per batch, never per row.
pub trait ArtifactSink {
    fn deliver(&mut self, artifacts: &[RenderedArtifact]) -> Result<Vec<String>, Error>;
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    cleaned.trim_matches(|c: char| c == '.' || c.is_whitespace()).to_string()
}

/// Output file names for a batch: `pdf_<name>.pdf`, falling back to the
/// 1-based position when the name is unusable, with `_2`, `_3`, ... added
/// to repeats.
pub fn entry_names(artifacts: &[RenderedArtifact]) -> Vec<String> {
    let mut seen = HashSet::new();
    artifacts
        .iter()
        .enumerate()
        .map(|(i, artifact)| {
            let mut stem = sanitize(&artifact.name);
            if stem.is_empty() {
                stem = (i + 1).to_string();
            }
            let mut candidate = format!("pdf_{stem}.pdf");
            let mut n = 2;
            while !seen.insert(candidate.to_lowercase()) {
                candidate = format!("pdf_{stem}_{n}.pdf");
                n += 1;
            }
            candidate
        })
        .collect()
}

/// Writes one ZIP archive holding every artifact.
pub struct ZipSink<W: Write + Seek> {
    writer: W,
}

impl<W: Write + Seek> ZipSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Seek> ArtifactSink for ZipSink<W> {
    fn deliver(&mut self, artifacts: &[RenderedArtifact]) -> Result<Vec<String>, Error> {
        let names = entry_names(artifacts);
        // Fixed timestamp so the same batch always produces the same archive.
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());

        let mut zip = ZipWriter::new(&mut self.writer);
        for (artifact, name) in artifacts.iter().zip(&names) {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(&artifact.bytes)?;
        }
        zip.finish()?;
        self.writer.flush()?;
        log::info!("Archive: {} entries", names.len());
        Ok(names)
    }
}

/// Writes each artifact as a loose PDF file into a directory.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl ArtifactSink for DirectorySink {
    fn deliver(&mut self, artifacts: &[RenderedArtifact]) -> Result<Vec<String>, Error> {
        std::fs::create_dir_all(&self.dir)?;
        let names = entry_names(artifacts);
        for (artifact, name) in artifacts.iter().zip(&names) {
            std::fs::write(self.dir.join(name), &artifact.bytes)?;
        }
        log::info!("Wrote {} files to {}", names.len(), self.dir.display());
        Ok(names)
    }
}
