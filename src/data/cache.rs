use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};
use rand::Rng;
use sha2::{Digest, Sha256};

use super::loader::{load_bytes, read_bytes, SourceFormat};
use super::model::SalesTable;
use crate::error::LoadError;

// ---------------------------------------------------------------------------
// DatasetCache – loaded tables keyed by source content
// ---------------------------------------------------------------------------

struct Entry {
    digest: String,
    table: Arc<SalesTable>,
}

/// Memoizes loaded tables per source path. An entry is reused only while the
/// file's SHA-256 digest is unchanged; a changed file is reloaded. Tables are
/// immutable, so one `Arc` can back any number of dashboard sessions.
#[derive(Default)]
pub struct DatasetCache {
    entries: HashMap<PathBuf, Entry>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for `path`, loading it when absent or stale.
    /// The file is read once; the digest and the parsed table both come from
    /// that one buffer. Failures are returned as-is and leave the cache
    /// untouched.
    pub fn get_or_load<R: Rng + ?Sized>(
        &mut self,
        path: &Path,
        rng: &mut R,
    ) -> Result<Arc<SalesTable>, LoadError> {
        let format = SourceFormat::of(path)?;
        let bytes = read_bytes(path)?;
        let digest = content_digest(&bytes);

        if let Some(entry) = self.entries.get(path) {
            if entry.digest == digest {
                debug!("cache hit for {} ({})", path.display(), &digest[..12]);
                return Ok(Arc::clone(&entry.table));
            }
            info!("{} changed on disk, reloading", path.display());
        }

        let table = Arc::new(load_bytes(format, path, bytes, rng)?);
        self.entries.insert(
            path.to_path_buf(),
            Entry {
                digest,
                table: Arc::clone(&table),
            },
        );
        Ok(table)
    }

    /// Drop the entry for `path`. Returns whether one existed.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        self.entries.remove(path).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Digest of the contents the cached table for `path` was parsed from.
    pub fn digest(&self, path: &Path) -> Option<&str> {
        self.entries.get(path).map(|e| e.digest.as_str())
    }
}

/// Hex SHA-256 of a source's bytes.
pub fn content_digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn csv_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn unchanged_source_is_served_from_cache() {
        let file = csv_file("Date,Units Sold,Sessions\n2022-01-01,5,50\n");
        let mut cache = DatasetCache::new();
        let mut rng = StdRng::seed_from_u64(1);

        let first = cache.get_or_load(file.path(), &mut rng).unwrap();
        let second = cache.get_or_load(file.path(), &mut rng).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn changed_source_is_reloaded() {
        let mut file = csv_file("Date,Units Sold,Sessions\n2022-01-01,5,50\n");
        let mut cache = DatasetCache::new();
        let mut rng = StdRng::seed_from_u64(1);

        let first = cache.get_or_load(file.path(), &mut rng).unwrap();
        file.write_all(b"2022-01-02,8,80\n").unwrap();
        file.flush().unwrap();
        let second = cache.get_or_load(file.path(), &mut rng).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn digest_describes_the_parsed_contents() {
        let contents = "Date,Units Sold,Sessions\n2022-01-01,5,50\n2022-01-02,6,60\n";
        let file = csv_file(contents);
        let mut cache = DatasetCache::new();

        let table = cache
            .get_or_load(file.path(), &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            cache.digest(file.path()),
            Some(content_digest(contents.as_bytes()).as_str())
        );
        assert_eq!(cache.digest(Path::new("/elsewhere.csv")), None);
    }

    #[test]
    fn unsupported_source_is_rejected_before_reading() {
        let mut cache = DatasetCache::new();
        let err = cache
            .get_or_load(Path::new("/no/such/sales.xlsx"), &mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(ext) if ext == "xlsx"));
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_forces_reload() {
        let file = csv_file("Units Sold,Sessions\n1,10\n");
        let mut cache = DatasetCache::new();
        let mut rng = StdRng::seed_from_u64(2);

        let first = cache.get_or_load(file.path(), &mut rng).unwrap();
        assert!(cache.invalidate(file.path()));
        assert!(!cache.invalidate(file.path()));
        let second = cache.get_or_load(file.path(), &mut rng).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn failed_load_is_not_cached() {
        let mut cache = DatasetCache::new();
        let err = cache
            .get_or_load(Path::new("/no/such/amazon.csv"), &mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
        assert!(cache.is_empty());
    }
}
