//! Decode-once cache of sequence members.
//!
//! Serves the two request phases of a pull pipeline:
//!
//! - **info**: answered from the cached entry if present, otherwise
//!   forwarded to the decoder's header read.
//! - **data**: a hit shares the cached volume; a miss decodes into the
//!   caller's transient slot, then stores an independent deep copy.
//!
//! Entries are never evicted or mutated. Memory grows with the number of
//! distinct members visited; [`CacheStats::bytes`] reports it.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::FileId;
use crate::volume::{DecodeError, Volume, VolumeDecoder, VolumeInfo};

/// Counters describing cache activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Data requests served from the cache.
    pub hits: u64,
    /// Data requests that reached the decoder.
    pub misses: u64,
    /// Info requests answered without the decoder.
    pub info_hits: u64,
    /// Number of cached volumes.
    pub entries: usize,
    /// Voxel bytes held by cached volumes.
    pub bytes: usize,
}

/// Map of file identifier to owned decoded volume.
#[derive(Debug, Default)]
pub struct SequenceCache {
    entries: HashMap<FileId, Arc<Volume>>,
    hits: u64,
    misses: u64,
    info_hits: u64,
    bytes: usize,
}

impl SequenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Information phase for `id`.
    pub fn info<D>(
        &mut self,
        id: &FileId,
        path: &Path,
        decoder: &mut D,
    ) -> Result<VolumeInfo, DecodeError>
    where
        D: VolumeDecoder + ?Sized,
    {
        if let Some(entry) = self.entries.get(id) {
            self.info_hits += 1;
            return Ok(entry.info.clone());
        }
        decoder.read_info(path)
    }

    /// Data phase for `id`.
    ///
    /// On a miss the decoder writes into `slot`, which the caller keeps
    /// reusing; the cache keeps its own copy so later decodes into `slot`
    /// cannot reach it. A failed decode caches nothing.
    ///
    /// Both paths return the cached entry. On a miss it equals `slot`, which
    /// still holds the fresh decode.
    pub fn data<D>(
        &mut self,
        id: &FileId,
        path: &Path,
        decoder: &mut D,
        slot: &mut Volume,
    ) -> Result<Arc<Volume>, DecodeError>
    where
        D: VolumeDecoder + ?Sized,
    {
        if let Some(entry) = self.entries.get(id) {
            log::debug!("Loading cached copy of {}", id);
            self.hits += 1;
            return Ok(Arc::clone(entry));
        }

        log::info!("Reading {}", id);
        self.misses += 1;
        decoder.read_data(path, slot)?;

        let entry = Arc::new(slot.clone());
        self.bytes += entry.footprint();
        self.entries.insert(id.clone(), Arc::clone(&entry));
        Ok(entry)
    }

    /// Cached volume for `id`, if decoded before.
    pub fn get(&self, id: &FileId) -> Option<&Arc<Volume>> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &FileId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Voxel bytes held by all entries.
    pub fn cached_bytes(&self) -> usize {
        self.bytes
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            info_hits: self.info_hits,
            entries: self.entries.len(),
            bytes: self.bytes,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::volume::Readability;
    use std::collections::HashSet;
    use std::path::PathBuf;

    /// In-memory decoder that counts calls and can be told to fail.
    #[derive(Default)]
    pub(crate) struct CountingDecoder {
        pub volumes: HashMap<PathBuf, Volume>,
        pub failing: HashSet<PathBuf>,
        pub info_calls: usize,
        pub data_calls: usize,
    }

    impl CountingDecoder {
        pub fn with_frames(dir: &Path, names: &[&str]) -> Self {
            let mut decoder = Self::default();
            for (i, name) in names.iter().enumerate() {
                let values = vec![i as u8; 8];
                decoder
                    .volumes
                    .insert(dir.join(name), Volume::from_u8([2, 2, 2], values));
            }
            decoder
        }

        fn lookup(&self, path: &Path) -> Result<&Volume, DecodeError> {
            if self.failing.contains(path) {
                return Err(DecodeError::InvalidHeader(format!(
                    "forced failure for {}",
                    path.display()
                )));
            }
            self.volumes.get(path).ok_or_else(|| {
                DecodeError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no such volume",
                ))
            })
        }
    }

    impl VolumeDecoder for CountingDecoder {
        fn probe(&self, path: &Path) -> Readability {
            if self.volumes.contains_key(path) {
                Readability::FullyReadable
            } else {
                Readability::Unreadable
            }
        }

        fn read_info(&mut self, path: &Path) -> Result<VolumeInfo, DecodeError> {
            self.info_calls += 1;
            Ok(self.lookup(path)?.info.clone())
        }

        fn read_data(&mut self, path: &Path, out: &mut Volume) -> Result<(), DecodeError> {
            self.data_calls += 1;
            let volume = self.lookup(path)?.clone();
            out.info = volume.info;
            out.data.clear();
            out.data.extend_from_slice(&volume.data);
            Ok(())
        }
    }

    fn setup() -> (PathBuf, CountingDecoder) {
        let dir = PathBuf::from("/frames");
        let decoder = CountingDecoder::with_frames(&dir, &["a", "b", "c"]);
        (dir, decoder)
    }

    #[test]
    fn test_data_decodes_once() {
        let (dir, mut decoder) = setup();
        let mut cache = SequenceCache::new();
        let mut slot = Volume::default();
        let id = FileId::from("b");

        let first = cache.data(&id, &dir.join("b"), &mut decoder, &mut slot).unwrap();
        assert_eq!(*first, slot);
        assert!(Arc::ptr_eq(&first, cache.get(&id).unwrap()));
        let second = cache.data(&id, &dir.join("b"), &mut decoder, &mut slot).unwrap();

        assert_eq!(decoder.data_calls, 1);
        assert_eq!(first, second);
        assert_eq!(second.data, vec![1u8; 8]);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.bytes, 8);
    }

    #[test]
    fn test_cached_copy_independent_of_slot() {
        let (dir, mut decoder) = setup();
        let mut cache = SequenceCache::new();
        let mut slot = Volume::default();
        let id = FileId::from("a");

        cache.data(&id, &dir.join("a"), &mut decoder, &mut slot).unwrap();

        // Scribble over the transient output, then decode something else into it
        slot.data.iter_mut().for_each(|v| *v = 99);
        slot.info.dimensions = [1, 1, 1];
        cache
            .data(&FileId::from("c"), &dir.join("c"), &mut decoder, &mut slot)
            .unwrap();

        let cached = cache.get(&id).unwrap();
        assert_eq!(cached.info.dimensions, [2, 2, 2]);
        assert_eq!(cached.data, vec![0u8; 8]);
        let again = cache.data(&id, &dir.join("a"), &mut decoder, &mut slot).unwrap();
        assert_eq!(again.data, vec![0u8; 8]);
        assert_eq!(decoder.data_calls, 2);
    }

    #[test]
    fn test_info_skips_decoder_when_cached() {
        let (dir, mut decoder) = setup();
        let mut cache = SequenceCache::new();
        let mut slot = Volume::default();
        let id = FileId::from("a");

        let info = cache.info(&id, &dir.join("a"), &mut decoder).unwrap();
        assert_eq!(info.dimensions, [2, 2, 2]);
        assert_eq!(decoder.info_calls, 1);

        cache.data(&id, &dir.join("a"), &mut decoder, &mut slot).unwrap();
        let cached_info = cache.info(&id, &dir.join("a"), &mut decoder).unwrap();
        assert_eq!(cached_info, info);
        assert_eq!(decoder.info_calls, 1);
        assert_eq!(cache.stats().info_hits, 1);
    }

    #[test]
    fn test_info_failure_propagates() {
        let (dir, mut decoder) = setup();
        let mut cache = SequenceCache::new();
        assert!(
            cache
                .info(&FileId::from("zzz"), &dir.join("zzz"), &mut decoder)
                .is_err()
        );
    }

    #[test]
    fn test_failure_does_not_poison_cache() {
        let (dir, mut decoder) = setup();
        decoder.failing.insert(dir.join("b"));
        let mut cache = SequenceCache::new();
        let mut slot = Volume::default();

        let a = cache
            .data(&FileId::from("a"), &dir.join("a"), &mut decoder, &mut slot)
            .unwrap();
        let err = cache.data(&FileId::from("b"), &dir.join("b"), &mut decoder, &mut slot);
        assert!(err.is_err());
        assert!(!cache.contains(&FileId::from("b")));
        assert_eq!(cache.len(), 1);

        let a_again = cache
            .data(&FileId::from("a"), &dir.join("a"), &mut decoder, &mut slot)
            .unwrap();
        assert_eq!(a, a_again);

        // Nothing was cached, so the failed member is retried next time
        decoder.failing.clear();
        cache
            .data(&FileId::from("b"), &dir.join("b"), &mut decoder, &mut slot)
            .unwrap();
        assert_eq!(decoder.data_calls, 3);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_cache_is_unbounded() {
        let dir = PathBuf::from("/many");
        let names: Vec<String> = (0..64).map(|i| format!("f{i:03}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut decoder = CountingDecoder::with_frames(&dir, &refs);
        let mut cache = SequenceCache::new();
        let mut slot = Volume::default();

        for _ in 0..3 {
            for name in &names {
                let id = FileId::new(name.as_str());
                cache.data(&id, &dir.join(name), &mut decoder, &mut slot).unwrap();
            }
        }
        assert_eq!(cache.len(), 64);
        assert_eq!(cache.cached_bytes(), 64 * 8);
        assert_eq!(decoder.data_calls, 64);
    }
}
