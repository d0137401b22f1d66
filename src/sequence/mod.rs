//! Sequence module - Ordered, cached access to a directory of volumes.
//!
//! - `scanner`: directory listing into a deterministic [`Sequence`]
//! - `cache`: decode-once storage of members ([`SequenceCache`])
//! - `navigator`: current position with clamped and wrapping steps
//! - `reader`: the pipeline stage combining the three ([`SequenceReader`])

mod cache;
mod navigator;
mod reader;
mod scanner;

pub use cache::{CacheStats, SequenceCache};
pub use navigator::IndexNavigator;
pub use reader::{SequenceError, SequenceReader};
pub use scanner::{DirectoryScanner, FileId, ScanError, Sequence};
