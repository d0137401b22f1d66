//! Single-file decoder collaborator.

use std::io;
use std::path::Path;

use super::{Volume, VolumeInfo};

/// Result of a format capability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Readability {
    /// Not this format, or not openable at all.
    Unreadable = 0,
    /// Recognised, but uses features the decoder cannot handle.
    PartiallyReadable = 1,
    /// Decodable.
    FullyReadable = 2,
}

/// Decoder failure for one file.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Payload size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// Decodes one file into a [`Volume`].
///
/// `read_data` writes into a caller-owned slot so the allocation can be
/// reused across decodes. Whatever the slot held before is overwritten.
pub trait VolumeDecoder {
    /// Report how well this decoder can handle `path`.
    fn probe(&self, path: &Path) -> Readability;

    /// Read metadata only.
    fn read_info(&mut self, path: &Path) -> Result<VolumeInfo, DecodeError>;

    /// Materialize the full volume into `out`.
    fn read_data(&mut self, path: &Path, out: &mut Volume) -> Result<(), DecodeError>;
}

impl<D: VolumeDecoder + ?Sized> VolumeDecoder for Box<D> {
    fn probe(&self, path: &Path) -> Readability {
        (**self).probe(path)
    }

    fn read_info(&mut self, path: &Path) -> Result<VolumeInfo, DecodeError> {
        (**self).read_info(path)
    }

    fn read_data(&mut self, path: &Path, out: &mut Volume) -> Result<(), DecodeError> {
        (**self).read_data(path, out)
    }
}
