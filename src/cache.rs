// Persisted indices, reused while the source and the options are unchanged.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use super::config::Config;
use super::errors::{DictError, Result};
use super::processor::Indices;
use super::util::*;


#[derive(Serialize, Deserialize)]
struct CacheBlob {
    key: String,
    indices: Indices,
}

/// Key of a cache entry. Changes with the source mtime (in nanoseconds) and every option
/// that shapes the indices.
pub fn fingerprint(config: &Config, mtime: u128) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}_{}_{}_{}",
                          config.columns, config.paiboon, config.row_limit_debug, mtime));
    if config.row_limit_debug {
        hasher.update(format!("_{}", config.row_limit));
    }
    hasher.update(format!("_{}_{}_{}_{}",
                          config.th_pron_max_headword_length,
                          config.th_pron_incl_translation_in_headword,
                          config.th_pron_merge,
                          config.dictbox_spaces_workaround));
    hex::encode(hasher.finalize())
}

/// Returns the cached indices when the cache exists and matches `key`.
/// A cache that cannot be read is only a miss.
pub fn load(path: &Path, key: &str) -> Option<Indices> {
    if !path.is_file() {
        return None;
    }

    let blob: CacheBlob = match read_blob(path) {
        Ok(blob) => blob,
        Err(e) => {
            log::warn!("Ignoring unreadable cache {}: {}", path.display(), e);
            return None;
        },
    };

    if blob.key != key {
        log::info!("Cache is outdated");
        return None;
    }
    Some(blob.indices)
}

// Decoding from the whole file keeps length prefixes bounded by the file size.
fn read_blob(path: &Path) -> Result<CacheBlob> {
    let buf = read_file_vec(path)?;
    Ok(bincode::deserialize(&buf)?)
}

/// Writes the cache atomically.
pub fn save(path: &Path, key: &str, indices: &Indices) -> Result<()> {
    let parent_dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent_dir)?;

    let blob = CacheBlob {
        key: String::from(key),
        indices: indices.clone(),
    };

    let temp_file = NamedTempFile::new_in(parent_dir)?;
    {
        let mut writer = BufWriter::new(&temp_file);
        bincode::serialize_into(&mut writer, &blob)?;
        writer.flush()?;
    }
    temp_file.persist(path).map_err(|e| DictError::Io(e.error))?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::MergeMember;

    fn indices() -> Indices {
        let mut indices = Indices::new();
        indices.th_en.insert(String::from("แมว"), vec![String::from("A1cat")]);
        indices.th_pron_merge_en.insert(String::from("meew"), vec![MergeMember {
            thai: String::from("แมว"),
            english: String::from("cat"),
            level: String::from("A1"),
            definition: String::from("cat"),
        }]);
        indices
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("cache.bin");
        save(&path, "key", &indices()).unwrap();

        assert_eq!(load(&path, "key"), Some(indices()));
        assert_eq!(load(&path, "other"), None);
    }

    #[test]
    fn corrupted_cache_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.bin");
        // truncated key
        std::fs::write(&path, b"\x05\x00\x00\x00\x00\x00\x00\x00ab").unwrap();
        assert_eq!(load(&path, "key"), None);
        assert_eq!(load(&dir.path().join("missing.bin"), "key"), None);
    }

    #[test]
    fn oversized_length_prefix_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.bin");
        std::fs::write(&path, b"\x00\x00\x00\x00\x00\x00\x00\x01abc").unwrap();
        assert_eq!(load(&path, "key"), None);

        std::fs::write(&path, b"\xff\xff\xff\xff\xff\xff\xff\x7f").unwrap();
        assert_eq!(load(&path, "key"), None);
    }

    #[test]
    fn fingerprint_follows_options() {
        let config = Config::default();
        let key = fingerprint(&config, 100);
        assert_eq!(key.len(), 64);
        assert_eq!(key, fingerprint(&config, 100));
        assert_ne!(key, fingerprint(&config, 101));
        // edits within the same second
        assert_ne!(fingerprint(&config, 1_700_000_000_100_000_000),
                   fingerprint(&config, 1_700_000_000_600_000_000));

        let other = Config { paiboon: false, ..Config::default() };
        assert_ne!(key, fingerprint(&other, 100));
        let other = Config { columns: 40, ..Config::default() };
        assert_ne!(key, fingerprint(&other, 100));
    }
}
