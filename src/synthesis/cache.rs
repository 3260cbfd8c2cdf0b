//! Content-addressed waveform cache.
//!
//! Each entry is a file named by the lowercase hex fingerprint of the request
//! and holds the raw PCM16 bytes with no header. The cache is advisory: the
//! lookup path (`get`/`put`) never returns an error, it logs and degrades to
//! a miss so synthesis always proceeds.

use crate::audio::pcm::pcm16_duration;
use crate::error::{Result, TtsError};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Digest size in bytes.
pub const FINGERPRINT_LEN: usize = 16;

/// Stable identifier of a synthesis request.
///
/// SHA-256 over the length-prefixed text, model id and voice id, truncated to
/// 16 bytes. Length prefixes keep `("ab", "c")` and `("a", "bc")` apart.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    pub fn compute(text: &str, model_id: &str, voice_id: &str) -> Self {
        let mut hasher = Sha256::new();
        for part in [text, model_id, voice_id] {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        let digest = hasher.finalize();

        let mut bytes = [0u8; FINGERPRINT_LEN];
        bytes.copy_from_slice(&digest[..FINGERPRINT_LEN]);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    /// Lowercase hex representation, also the cache file name.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl FromStr for Fingerprint {
    type Err = TtsError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || TtsError::InvalidFingerprint {
            value: s.to_string(),
        };
        if s.len() != FINGERPRINT_LEN * 2
            || !s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(invalid());
        }

        let mut bytes = [0u8; FINGERPRINT_LEN];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
        }
        Ok(Self(bytes))
    }
}

/// Summary of one stored entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntryInfo {
    pub fingerprint: Fingerprint,
    pub size_bytes: u64,
    pub duration: Duration,
}

/// On-disk cache of synthesized PCM16 waveforms.
#[derive(Debug, Clone)]
pub struct WaveformCache {
    dir: PathBuf,
    enabled: bool,
}

impl WaveformCache {
    /// Opens a cache rooted at `dir`, creating the directory if caching is
    /// enabled. A directory that cannot be created is logged; lookups then
    /// simply miss.
    pub fn new(dir: impl Into<PathBuf>, enabled: bool) -> Self {
        let dir = dir.into();
        if enabled && let Err(e) = fs::create_dir_all(&dir) {
            warn!(dir = %dir.display(), error = %e, "Failed to create cache directory");
        }
        Self { dir, enabled }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self {
            dir: PathBuf::new(),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file that holds (or would hold) `fingerprint`.
    ///
    /// Does not check that the file exists.
    pub fn path_for(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.dir.join(fingerprint.to_hex())
    }

    /// Returns the cached waveform, or `None` on a miss, when disabled, or
    /// when the entry cannot be read.
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<Vec<u8>> {
        if !self.enabled {
            return None;
        }

        match fs::read(self.path_for(fingerprint)) {
            Ok(bytes) => {
                debug!(%fingerprint, bytes = bytes.len(), "Cache hit");
                Some(bytes)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(%fingerprint, "Cache miss");
                None
            }
            Err(e) => {
                warn!(%fingerprint, error = %e, "Failed to read cache entry, treating as miss");
                None
            }
        }
    }

    /// Stores a waveform. Returns `true` if the entry was written.
    ///
    /// The bytes go to a uniquely named temporary sibling first and are
    /// renamed into place, so readers see either no entry or a complete one.
    /// Concurrent writers of the same fingerprint never share a temp file.
    pub fn put(&self, fingerprint: &Fingerprint, waveform: &[u8]) -> bool {
        if !self.enabled {
            return false;
        }

        match self.write_entry(fingerprint, waveform) {
            Ok(()) => {
                debug!(%fingerprint, bytes = waveform.len(), "Cached waveform");
                true
            }
            Err(e) => {
                warn!(%fingerprint, error = %e, "Failed to write cache entry");
                false
            }
        }
    }

    fn write_entry(&self, fingerprint: &Fingerprint, waveform: &[u8]) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        // Unique per writer; dropped (and removed) if anything below fails
        let mut partial = NamedTempFile::new_in(&self.dir)?;
        partial.write_all(waveform)?;
        partial.flush()?;
        partial
            .persist(self.path_for(fingerprint))
            .map_err(|e| e.error)?;
        Ok(())
    }

    /// Reads an entry for export, failing if it does not exist.
    ///
    /// Unlike [`get`](Self::get) this ignores the enabled flag and reports
    /// errors, since it backs explicit maintenance commands.
    pub fn load(&self, fingerprint: &Fingerprint) -> Result<Vec<u8>> {
        match fs::read(self.path_for(fingerprint)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(TtsError::CacheEntryNotFound {
                fingerprint: fingerprint.to_hex(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Lists every entry, sorted by fingerprint.
    ///
    /// A missing cache directory is an empty cache. Files whose names are not
    /// fingerprints (e.g. interrupted partial writes) are skipped.
    pub fn entries(&self) -> Result<Vec<CacheEntryInfo>> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry?;
            let Some(fingerprint) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<Fingerprint>().ok())
            else {
                continue;
            };
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            entries.push(CacheEntryInfo {
                fingerprint,
                size_bytes: metadata.len(),
                duration: pcm16_duration(metadata.len() as usize),
            });
        }
        entries.sort_by_key(|e| e.fingerprint.to_hex());
        Ok(entries)
    }

    /// Deletes every entry and returns how many were removed.
    pub fn clear(&self) -> Result<usize> {
        let entries = self.entries()?;
        for entry in &entries {
            fs::remove_file(self.path_for(&entry.fingerprint))?;
        }
        Ok(entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const MODEL: &str = "speechbrain/tts-tacotron2-ljspeech";
    const VOICE: &str = "speechbrain/tts-hifigan-ljspeech";

    #[test]
    fn fingerprint_is_deterministic() {
        let a = Fingerprint::compute("Hello world", MODEL, VOICE);
        let b = Fingerprint::compute("Hello world", MODEL, VOICE);
        assert_eq!(a, b);
        assert_eq!(a.to_hex(), b.to_hex());
    }

    #[test]
    fn fingerprint_changes_with_each_component() {
        let base = Fingerprint::compute("Hello world", MODEL, VOICE);
        assert_ne!(base, Fingerprint::compute("Hello world!", MODEL, VOICE));
        assert_ne!(base, Fingerprint::compute("Hello world", "other-model", VOICE));
        assert_ne!(base, Fingerprint::compute("Hello world", MODEL, "other-voice"));
    }

    #[test]
    fn fingerprint_separates_component_boundaries() {
        assert_ne!(
            Fingerprint::compute("ab", "c", "d"),
            Fingerprint::compute("a", "bc", "d")
        );
    }

    #[test]
    fn fingerprint_hex_is_32_lowercase_chars() {
        let hex = Fingerprint::compute("", MODEL, VOICE).to_hex();
        assert_eq!(hex.len(), 32);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn fingerprint_parses_from_hex() {
        let fp = Fingerprint::compute("text", MODEL, VOICE);
        let parsed: Fingerprint = fp.to_hex().parse().unwrap();
        assert_eq!(parsed, fp);
    }

    #[test]
    fn fingerprint_rejects_malformed_hex() {
        assert!("abc".parse::<Fingerprint>().is_err());
        assert!("ZZ".repeat(16).parse::<Fingerprint>().is_err());
        assert!("AB".repeat(16).parse::<Fingerprint>().is_err());
        assert!("ab".repeat(17).parse::<Fingerprint>().is_err());
    }

    #[test]
    fn put_then_get_returns_identical_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let cache = WaveformCache::new(dir.path(), true);
        let fp = Fingerprint::compute("Hello", MODEL, VOICE);
        let waveform: Vec<u8> = (0..=255).collect();

        assert!(cache.put(&fp, &waveform));
        assert_eq!(cache.get(&fp), Some(waveform));
    }

    #[test]
    fn entry_file_is_named_by_hex_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let cache = WaveformCache::new(dir.path(), true);
        let fp = Fingerprint::compute("Hello", MODEL, VOICE);

        cache.put(&fp, &[1, 2, 3, 4]);

        let path = dir.path().join(fp.to_hex());
        assert_eq!(fs::read(path).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn get_on_empty_cache_misses() {
        let dir = tempfile::tempdir().unwrap();
        let cache = WaveformCache::new(dir.path(), true);
        assert_eq!(cache.get(&Fingerprint::compute("x", MODEL, VOICE)), None);
    }

    #[test]
    fn new_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let _cache = WaveformCache::new(&nested, true);
        assert!(nested.is_dir());
    }

    #[test]
    fn disabled_cache_never_stores() {
        let dir = tempfile::tempdir().unwrap();
        let cache = WaveformCache::new(dir.path().join("off"), false);
        let fp = Fingerprint::compute("Hello", MODEL, VOICE);

        assert!(!cache.put(&fp, &[1, 2]));
        assert_eq!(cache.get(&fp), None);
        assert!(!dir.path().join("off").exists());
    }

    #[test]
    fn unwritable_location_degrades_to_miss() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the cache directory should be
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();

        let cache = WaveformCache::new(&blocker, true);
        let fp = Fingerprint::compute("Hello", MODEL, VOICE);

        assert!(!cache.put(&fp, &[1, 2]));
        assert_eq!(cache.get(&fp), None);
    }

    #[test]
    fn entries_lists_only_fingerprint_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = WaveformCache::new(dir.path(), true);
        let fp = Fingerprint::compute("Hello", MODEL, VOICE);
        cache.put(&fp, &vec![0u8; 44100]);
        fs::write(dir.path().join("README"), b"ignored").unwrap();
        fs::write(dir.path().join(format!(".tmp{}", fp)), b"x").unwrap();

        let entries = cache.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].fingerprint, fp);
        assert_eq!(entries[0].size_bytes, 44100);
        assert_eq!(entries[0].duration, Duration::from_secs(1));
    }

    #[test]
    fn entries_of_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = WaveformCache::new(dir.path().join("nope"), false);
        assert!(missing.entries().unwrap().is_empty());
    }

    #[test]
    fn clear_removes_all_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = WaveformCache::new(dir.path(), true);
        for text in ["one", "two", "three"] {
            cache.put(&Fingerprint::compute(text, MODEL, VOICE), &[0, 0]);
        }

        assert_eq!(cache.clear().unwrap(), 3);
        assert!(cache.entries().unwrap().is_empty());
    }

    #[test]
    fn load_reports_missing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = WaveformCache::new(dir.path(), true);
        let fp = Fingerprint::compute("absent", MODEL, VOICE);

        match cache.load(&fp) {
            Err(TtsError::CacheEntryNotFound { fingerprint }) => {
                assert_eq!(fingerprint, fp.to_hex())
            }
            other => panic!("Expected CacheEntryNotFound, got {:?}", other),
        }
    }

    #[test]
    fn concurrent_puts_of_one_fingerprint_leave_a_complete_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(WaveformCache::new(dir.path(), true));
        let fp = Fingerprint::compute("Hello", MODEL, VOICE);

        let writers: Vec<_> = [1u8, 2u8]
            .into_iter()
            .map(|fill| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    (0..50).all(|_| cache.put(&fp, &vec![fill; 4096]))
                })
            })
            .collect();
        for writer in writers {
            assert!(writer.join().unwrap());
        }

        let stored = cache.get(&fp).unwrap();
        assert_eq!(stored.len(), 4096);
        assert!(stored.iter().all(|&b| b == stored[0]));

        // No temporary files left behind
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from(fp.to_hex())]);
    }
}
