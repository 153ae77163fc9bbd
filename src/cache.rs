//! Source-line lookup behind a cache.
//!
//! Frames usually carry their own captured source line; the cache is the
//! fallback when they do not. Lookups are 1-based and tolerant: a missing
//! unit or out-of-range line is `None`, never an error.

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

use parking_lot::Mutex;

/// A line-by-line view of source units.
pub trait SourceCache: Send + Sync {
    /// The text of `lineno` (1-based) in `unit`, without the trailing
    /// newline. `None` when the unit or line cannot be resolved.
    fn line(&self, unit: &str, lineno: u32) -> Option<String>;
}

/// Filesystem-backed cache. Each unit is read once and kept split into
/// lines; unreadable units are cached as absent so they are not retried on
/// every frame.
#[derive(Debug, Default)]
pub struct FsSourceCache {
    units: Mutex<HashMap<String, Option<Arc<Vec<String>>>>>,
}

impl FsSourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn unit_lines(&self, unit: &str) -> Option<Arc<Vec<String>>> {
        let mut units = self.units.lock();
        if let Some(cached) = units.get(unit) {
            return cached.clone();
        }
        let loaded = match fs::read_to_string(unit) {
            Ok(text) => Some(Arc::new(text.lines().map(str::to_string).collect())),
            Err(err) => {
                log::debug!("source unit {unit:?} unreadable: {err}");
                None
            }
        };
        units.insert(unit.to_string(), loaded.clone());
        loaded
    }
}

impl SourceCache for FsSourceCache {
    fn line(&self, unit: &str, lineno: u32) -> Option<String> {
        let lines = self.unit_lines(unit)?;
        lines.get(lineno.checked_sub(1)? as usize).cloned()
    }
}

/// In-memory cache for hosts that captured source up front.
#[derive(Debug, Default)]
pub struct MemorySourceCache {
    units: HashMap<String, Vec<String>>,
}

impl MemorySourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a unit's full text, replacing any previous copy.
    pub fn insert(&mut self, unit: &str, text: &str) {
        self.units
            .insert(unit.to_string(), text.lines().map(str::to_string).collect());
    }
}

impl SourceCache for MemorySourceCache {
    fn line(&self, unit: &str, lineno: u32) -> Option<String> {
        let lines = self.units.get(unit)?;
        lines.get(lineno.checked_sub(1)? as usize).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_fs_cache_reads_lines_one_based() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "first").unwrap();
        writeln!(file, "second").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let cache = FsSourceCache::new();
        assert_eq!(cache.line(&path, 1).as_deref(), Some("first"));
        assert_eq!(cache.line(&path, 2).as_deref(), Some("second"));
        assert_eq!(cache.line(&path, 3), None);
        assert_eq!(cache.line(&path, 0), None);
    }

    #[test]
    fn test_fs_cache_missing_unit_is_none() {
        let cache = FsSourceCache::new();
        assert_eq!(cache.line("/no/such/unit.src", 1), None);
        // Negative result is cached; second lookup is also None.
        assert_eq!(cache.line("/no/such/unit.src", 1), None);
    }

    #[test]
    fn test_fs_cache_serves_from_cache_after_first_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "kept").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let cache = FsSourceCache::new();
        assert_eq!(cache.line(&path, 1).as_deref(), Some("kept"));
        drop(file);
        // The unit is gone from disk but stays resolvable.
        assert_eq!(cache.line(&path, 1).as_deref(), Some("kept"));
    }

    #[test]
    fn test_memory_cache_lookup() {
        let mut cache = MemorySourceCache::new();
        cache.insert("app.src", "one\ntwo\n");
        assert_eq!(cache.line("app.src", 2).as_deref(), Some("two"));
        assert_eq!(cache.line("other.src", 1), None);
    }
}
