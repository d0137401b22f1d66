//! Volume module - Voxel data model and the decoder collaborator.
//!
//! The sequence machinery never looks inside voxel buffers. It only needs
//! something that can answer three questions about a single file:
//!
//! - can you read this? ([`VolumeDecoder::probe`])
//! - what does it look like? ([`VolumeDecoder::read_info`])
//! - give me the voxels ([`VolumeDecoder::read_data`])
//!
//! [`NrrdDecoder`] answers them for raw-encoded NRRD files.

mod data;
mod decoder;
mod nrrd;

pub use data::{ScalarType, Volume, VolumeInfo};
pub use decoder::{DecodeError, Readability, VolumeDecoder};
pub use nrrd::{NRRD_MAGIC, NrrdDecoder, NrrdHeader, write_nrrd};
