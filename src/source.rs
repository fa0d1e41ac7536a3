use std::ops::Deref;
use std::path::Path;

use memmap2::Mmap;

/// Read-only bytes of an input asset, memory-mapped when they come from disk.
/// Shared by every row render, never written after load.
pub(crate) enum SourceBytes {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl SourceBytes {
    pub(crate) fn map(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| {
            std::io::Error::new(e.kind(), format!("{}: {}", e, path.display()))
        })?;
        // Zero-length files cannot be mapped on every platform.
        if file.metadata()?.len() == 0 {
            return Ok(SourceBytes::Owned(Vec::new()));
        }
        let map = unsafe { Mmap::map(&file) }?;
        Ok(SourceBytes::Mapped(map))
    }
}

impl Deref for SourceBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            SourceBytes::Mapped(map) => map,
            SourceBytes::Owned(bytes) => bytes,
        }
    }
}

impl From<Vec<u8>> for SourceBytes {
    fn from(bytes: Vec<u8>) -> Self {
        SourceBytes::Owned(bytes)
    }
}
