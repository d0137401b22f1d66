//! volseq - Time-varying volume sequences.
//!
//! Turns a directory of volume files into an ordered, randomly navigable
//! sequence that decodes each file at most once, and drives navigation
//! through it from timeline events or key presses.
//!
//! # Architecture
//!
//! - `volume`: voxel data model and the single-file decoder collaborator
//! - `sequence`: directory scan, decode-once cache, index navigation, reader
//! - `animation`: cue events, the playback state machine, interactive stepping
//! - `schema`: playback configuration and synthetic test series
//!
//! # Example
//!
//! ```rust,no_run
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use volseq::{
//!     animation::{AnimationCue, AnimationDriver},
//!     sequence::SequenceReader,
//!     volume::NrrdDecoder,
//! };
//!
//! let reader = Rc::new(RefCell::new(
//!     SequenceReader::open_directory("frames/", NrrdDecoder).unwrap(),
//! ));
//! let frames = reader.borrow().number_of_files();
//!
//! // Render trigger: pull the current volume through the reader
//! let view = Rc::clone(&reader);
//! let renderer = Rc::new(RefCell::new(move || {
//!     if let Ok(Some(volume)) = view.borrow_mut().update() {
//!         println!("range {:?}", volume.scalar_range());
//!     }
//! }));
//!
//! let mut driver = AnimationDriver::new();
//! driver.set_target(&reader);
//! driver.set_render_trigger(&renderer);
//! driver.run(AnimationCue::for_frames(frames, 10.0).events());
//! ```

pub mod animation;
pub mod schema;
pub mod sequence;
pub mod volume;

// Re-export commonly used types
pub use animation::{AnimationCue, AnimationDriver, CueEvent, Interactor, KeyCommand};
pub use schema::{PlaybackConfig, SyntheticSeries};
pub use sequence::{FileId, IndexNavigator, Sequence, SequenceCache, SequenceReader};
pub use volume::{NrrdDecoder, Volume, VolumeDecoder, VolumeInfo};
