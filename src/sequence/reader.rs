//! Sequence reader - the pipeline stage that serves "data for the current index".

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{DirectoryScanner, FileId, IndexNavigator, ScanError, Sequence, SequenceCache};
use crate::volume::{DecodeError, Volume, VolumeDecoder, VolumeInfo};

/// Reader-level failure.
#[derive(Debug, thiserror::Error)]
pub enum SequenceError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("Failed to decode {id}: {source}")]
    Decode {
        id: FileId,
        #[source]
        source: DecodeError,
    },
}

enum Source {
    /// Single file, decoded on every update and never cached.
    File { path: PathBuf, id: FileId },
    /// Scanned directory.
    Directory(Sequence),
}

/// Reads a time-varying volume series one member at a time.
///
/// Usage:
/// ```ignore
/// let mut reader = SequenceReader::open_directory("frames/", NrrdDecoder)?;
/// let first = reader.update()?;
/// reader.next_wrapping();
/// let second = reader.update()?;
/// ```
pub struct SequenceReader<D> {
    decoder: D,
    source: Source,
    navigator: IndexNavigator,
    cache: SequenceCache,
    /// Transient decoder output, overwritten by every decode.
    slot: Volume,
    output: Option<Arc<Volume>>,
}

impl<D: VolumeDecoder> SequenceReader<D> {
    /// Scan `directory` once and position at its first member.
    pub fn open_directory<P: AsRef<Path>>(directory: P, decoder: D) -> Result<Self, SequenceError> {
        let sequence = DirectoryScanner::scan(directory, &decoder)?;
        Ok(Self::from_sequence(sequence, decoder))
    }

    /// Serve an already scanned sequence.
    pub fn from_sequence(sequence: Sequence, decoder: D) -> Self {
        Self {
            decoder,
            navigator: IndexNavigator::new(sequence.len()),
            source: Source::Directory(sequence),
            cache: SequenceCache::new(),
            slot: Volume::default(),
            output: None,
        }
    }

    /// Pass-through mode for a single file.
    pub fn open_file<P: Into<PathBuf>>(path: P, decoder: D) -> Self {
        let path = path.into();
        let id = FileId::new(
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        );
        Self {
            decoder,
            source: Source::File { path, id },
            navigator: IndexNavigator::new(0),
            cache: SequenceCache::new(),
            slot: Volume::default(),
            output: None,
        }
    }

    /// Scanned sequence, `None` in single-file mode.
    pub fn sequence(&self) -> Option<&Sequence> {
        match &self.source {
            Source::Directory(sequence) => Some(sequence),
            Source::File { .. } => None,
        }
    }

    /// Number of sequence members (0 in single-file mode).
    pub fn number_of_files(&self) -> usize {
        self.navigator.len()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.navigator.current()
    }

    pub fn navigator(&self) -> &IndexNavigator {
        &self.navigator
    }

    pub fn set_index(&mut self, index: i64) {
        self.navigator.set_index(index);
    }

    pub fn next_clamped(&mut self) {
        self.navigator.next_clamped();
    }

    pub fn previous_clamped(&mut self) {
        self.navigator.previous_clamped();
    }

    pub fn next_wrapping(&mut self) {
        self.navigator.next_wrapping();
    }

    pub fn previous_wrapping(&mut self) {
        self.navigator.previous_wrapping();
    }

    /// Identifier served by the next update.
    pub fn current_file_name(&self) -> Option<&FileId> {
        match &self.source {
            Source::Directory(sequence) => self.navigator.current().and_then(|i| sequence.get(i)),
            Source::File { id, .. } => Some(id),
        }
    }

    /// Information phase for the current member. `Ok(None)` if there is nothing to read.
    pub fn update_information(&mut self) -> Result<Option<VolumeInfo>, SequenceError> {
        match &self.source {
            Source::File { path, id } => self
                .decoder
                .read_info(path)
                .map(Some)
                .map_err(|source| SequenceError::Decode {
                    id: id.clone(),
                    source,
                }),
            Source::Directory(sequence) => {
                let Some(id) = self.navigator.current().and_then(|i| sequence.get(i)) else {
                    return Ok(None);
                };
                let path = sequence.path_of(id);
                self.cache
                    .info(id, &path, &mut self.decoder)
                    .map(Some)
                    .map_err(|source| SequenceError::Decode {
                        id: id.clone(),
                        source,
                    })
            }
        }
    }

    /// Data phase for the current member. `Ok(None)` if there is nothing to read.
    ///
    /// Each member is decoded at most once; revisits share the cached volume.
    pub fn update(&mut self) -> Result<Option<Arc<Volume>>, SequenceError> {
        let volume = match &self.source {
            Source::File { path, id } => {
                let mut volume = Volume::default();
                self.decoder
                    .read_data(path, &mut volume)
                    .map_err(|source| SequenceError::Decode {
                        id: id.clone(),
                        source,
                    })?;
                Arc::new(volume)
            }
            Source::Directory(sequence) => {
                let Some(id) = self.navigator.current().and_then(|i| sequence.get(i)) else {
                    return Ok(None);
                };
                let path = sequence.path_of(id);
                self.cache
                    .data(id, &path, &mut self.decoder, &mut self.slot)
                    .map_err(|source| SequenceError::Decode {
                        id: id.clone(),
                        source,
                    })?
            }
        };
        self.output = Some(Arc::clone(&volume));
        Ok(Some(volume))
    }

    /// Decode every member once, walking from the first to the last.
    ///
    /// Leaves the reader on the last member. `on_member` runs before each
    /// member is read. Returns the number of members visited.
    pub fn preload_all<F>(&mut self, mut on_member: F) -> Result<usize, SequenceError>
    where
        F: FnMut(usize, &FileId),
    {
        let count = self.number_of_files();
        self.set_index(0);
        for i in 0..count {
            if i > 0 {
                self.next_clamped();
            }
            if let Some(id) = self.current_file_name() {
                on_member(i, id);
            }
            self.update()?;
        }
        Ok(count)
    }

    /// Volume produced by the last successful update.
    pub fn output(&self) -> Option<&Arc<Volume>> {
        self.output.as_ref()
    }

    /// Transient decoder output slot.
    pub fn transient_output(&self) -> &Volume {
        &self.slot
    }

    pub fn transient_output_mut(&mut self) -> &mut Volume {
        &mut self.slot
    }

    pub fn cache(&self) -> &SequenceCache {
        &self.cache
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    pub fn decoder_mut(&mut self) -> &mut D {
        &mut self.decoder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::cache::tests::CountingDecoder;
    use crate::volume::{NrrdDecoder, write_nrrd};
    use tempfile::tempdir;

    fn reader_over(names: &[&str]) -> SequenceReader<CountingDecoder> {
        let dir = PathBuf::from("/frames");
        let decoder = CountingDecoder::with_frames(&dir, names);
        let sequence = Sequence::from_ids(&dir, names.iter().map(|n| FileId::from(*n)));
        SequenceReader::from_sequence(sequence, decoder)
    }

    #[test]
    fn test_revisits_hit_cache() {
        let mut reader = reader_over(&["t0", "t1", "t2"]);
        for _ in 0..4 {
            for _ in 0..3 {
                reader.update().unwrap();
                reader.next_wrapping();
            }
        }
        assert_eq!(reader.decoder().data_calls, 3);
        assert_eq!(reader.cache().stats().hits, 9);
    }

    #[test]
    fn test_update_follows_index() {
        let mut reader = reader_over(&["t0", "t1", "t2"]);
        reader.set_index(2);
        assert_eq!(reader.current_file_name(), Some(&FileId::from("t2")));
        let volume = reader.update().unwrap().unwrap();
        assert_eq!(volume.data, vec![2u8; 8]);
        assert_eq!(reader.output().unwrap().data, vec![2u8; 8]);

        reader.set_index(99);
        assert_eq!(reader.current_index(), Some(2));
        reader.set_index(-1);
        assert_eq!(reader.current_index(), Some(0));
    }

    #[test]
    fn test_information_phase() {
        let mut reader = reader_over(&["t0", "t1"]);
        let info = reader.update_information().unwrap().unwrap();
        assert_eq!(info.dimensions, [2, 2, 2]);
        assert_eq!(reader.decoder().info_calls, 1);

        reader.update().unwrap();
        reader.update_information().unwrap();
        assert_eq!(reader.decoder().info_calls, 1);

        reader.next_clamped();
        reader.update_information().unwrap();
        assert_eq!(reader.decoder().info_calls, 2);
    }

    #[test]
    fn test_transient_slot_mutation_does_not_leak() {
        let mut reader = reader_over(&["t0", "t1"]);
        reader.update().unwrap();
        reader
            .transient_output_mut()
            .data
            .iter_mut()
            .for_each(|v| *v = 77);

        let again = reader.update().unwrap().unwrap();
        assert_eq!(again.data, vec![0u8; 8]);
    }

    #[test]
    fn test_failed_member_reports_id() {
        let mut reader = reader_over(&["t0", "t1"]);
        reader.decoder_mut().failing.insert(PathBuf::from("/frames/t1"));
        reader.update().unwrap();
        reader.next_clamped();
        let err = reader.update().unwrap_err();
        match err {
            SequenceError::Decode { id, .. } => assert_eq!(id, FileId::from("t1")),
            other => panic!("unexpected error {other}"),
        }

        // Previous output and cache entry survive
        assert_eq!(reader.output().unwrap().data, vec![0u8; 8]);
        reader.set_index(0);
        assert_eq!(reader.update().unwrap().unwrap().data, vec![0u8; 8]);
    }

    #[test]
    fn test_empty_sequence_has_nothing_to_do() {
        let mut reader = reader_over(&[]);
        assert_eq!(reader.number_of_files(), 0);
        assert!(reader.update().unwrap().is_none());
        assert!(reader.update_information().unwrap().is_none());
        assert_eq!(reader.preload_all(|_, _| {}).unwrap(), 0);
        assert_eq!(reader.current_file_name(), None);
    }

    #[test]
    fn test_preload_all_caches_everything() {
        let mut reader = reader_over(&["t0", "t1", "t2"]);
        let mut seen = Vec::new();
        let count = reader
            .preload_all(|i, id| seen.push((i, id.to_string())))
            .unwrap();
        assert_eq!(count, 3);
        assert_eq!(
            seen,
            vec![
                (0, "t0".to_string()),
                (1, "t1".to_string()),
                (2, "t2".to_string())
            ]
        );
        assert_eq!(reader.current_index(), Some(2));
        assert_eq!(reader.cache().len(), 3);

        reader.set_index(0);
        reader.update().unwrap();
        assert_eq!(reader.decoder().data_calls, 3);
    }

    #[test]
    fn test_directory_and_single_file_modes() {
        let dir = tempdir().unwrap();
        for i in 0..3u8 {
            let volume = Volume::from_u8([2, 1, 1], vec![i, i + 10]);
            write_nrrd(dir.path().join(format!("frame_{i:03}.nrrd")), &volume).unwrap();
        }

        let mut reader = SequenceReader::open_directory(dir.path(), NrrdDecoder).unwrap();
        assert_eq!(reader.number_of_files(), 3);
        reader.set_index(1);
        let volume = reader.update().unwrap().unwrap();
        assert_eq!(volume.scalar_range(), Some((1.0, 11.0)));

        let mut single = SequenceReader::open_file(dir.path().join("frame_002.nrrd"), NrrdDecoder);
        assert!(single.sequence().is_none());
        assert_eq!(
            single.current_file_name(),
            Some(&FileId::from("frame_002.nrrd"))
        );
        let volume = single.update().unwrap().unwrap();
        assert_eq!(volume.data, vec![2, 12]);
        assert!(single.cache().is_empty());
        assert_eq!(
            single.update_information().unwrap().unwrap().dimensions,
            [2, 1, 1]
        );
    }

    #[test]
    fn test_open_missing_directory() {
        let dir = tempdir().unwrap();
        let result = SequenceReader::open_directory(dir.path().join("absent"), NrrdDecoder);
        assert!(matches!(result, Err(SequenceError::Scan(_))));
    }

    #[test]
    fn test_oversized_member_fails_alone() {
        let dir = tempdir().unwrap();
        write_nrrd(
            dir.path().join("a.nrrd"),
            &Volume::from_u8([2, 1, 1], vec![4, 5]),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("b.nrrd"),
            "NRRD0004\ntype: float\ndimension: 3\nsizes: 1000000 1000000 100\nencoding: raw\nendian: little\n\n\0\0",
        )
        .unwrap();

        let mut reader = SequenceReader::open_directory(dir.path(), NrrdDecoder).unwrap();
        assert_eq!(reader.number_of_files(), 2);

        let err = reader.preload_all(|_, _| {}).unwrap_err();
        assert!(matches!(
            err,
            SequenceError::Decode { ref id, source: DecodeError::SizeMismatch { .. } }
                if id.as_str() == "b.nrrd"
        ));

        reader.set_index(0);
        assert_eq!(reader.update().unwrap().unwrap().data, vec![4, 5]);
        assert_eq!(reader.cache().len(), 1);
    }
}
