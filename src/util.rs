use std::process::Command;
use std::io::{BufReader, Read};
use std::fs::File;
use std::path::{Path, PathBuf};

use regex::*;

use super::errors::{DictError, Result};


/// Returns files matched to regex pattern in the specified directory.
#[derive(Debug)]
pub struct MatchedFiles {
    read_dir: std::fs::ReadDir,
    pattern: Regex,
}

impl MatchedFiles {
    /// Creates instance from directory path and a pattern matched against file names.
    pub fn new(dirpath: &Path, pattern: &str) -> Result<MatchedFiles> {
        Ok(MatchedFiles {
            read_dir: std::fs::read_dir(dirpath)?,
            pattern: Regex::new(pattern)?,
        })
    }

    /// Matched files in name order.
    pub fn sorted(dirpath: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = MatchedFiles::new(dirpath, pattern)?.collect();
        files.sort();
        Ok(files)
    }
}

impl Iterator for MatchedFiles {
    type Item = PathBuf;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(entry) = self.read_dir.next() {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(_) => continue,
            };
            if !path.is_file() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if self.pattern.is_match(name) {
                    return Some(path);
                }
            }
        }
        None
    }
}

/// Removes a directory and everything in it, nothing to do when it is absent.
pub fn remove_dir_if_exists(dirpath: &Path) -> Result<bool> {
    if dirpath.is_dir() {
        std::fs::remove_dir_all(dirpath)?;
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Reads data from file as bytes.
pub fn read_file_vec(filename: &Path) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let f = File::open(filename)?;
    let mut reader = BufReader::new(f);
    reader.read_to_end(&mut buf)?;
    Ok(buf)
}

/// Whether the external tool can be found in PATH.
pub fn tool_available(tool: &str) -> bool {
    which::which(tool).is_ok()
}

/// Executes a tool with arguments and waits until finished, stdout is returned.
pub fn command_wait_output(tool: &str, args: &[&str]) -> Result<String> {
    let path = which::which(tool).map_err(|_| DictError::ToolMissing { tool: String::from(tool) })?;

    log::info!("Running {} {}", tool, args.join(" "));
    let output = Command::new(path).args(args).output()?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if !stdout.trim().is_empty() {
        log::debug!("{}: {}", tool, stdout.trim_end());
    }

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        log::error!("{}: {}", tool, stderr.trim_end());
        return Err(DictError::ToolFailed {
            tool: String::from(tool),
            status: output.status.to_string(),
            stderr,
        });
    }

    Ok(stdout)
}

/// Modification time of a file in nanoseconds since the epoch.
pub fn mtime_nanos(path: &Path) -> Result<u128> {
    let modified = std::fs::metadata(path)?.modified()?;
    let nanos = modified
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    Ok(nanos)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matched_files_by_name() {
        let dir = tempfile::tempdir().unwrap();
        for name in &["volubilis_en-th.txt", "volubilis_th-en.txt", "other.txt", "volubilis.ifo"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        std::fs::create_dir(dir.path().join("volubilis_dir.txt")).unwrap();

        let files = MatchedFiles::sorted(dir.path(), r"^volubilis_.*\.txt$").unwrap();
        let names: Vec<&str> = files.iter().map(|p| p.file_name().unwrap().to_str().unwrap()).collect();
        assert_eq!(names, vec!["volubilis_en-th.txt", "volubilis_th-en.txt"]);
    }

    #[test]
    fn missing_tool() {
        let err = command_wait_output("no-such-tool-for-volubilis", &["--version"]).unwrap_err();
        assert!(matches!(err, DictError::ToolMissing { .. }));
        assert!(!tool_available("no-such-tool-for-volubilis"));
    }

    #[test]
    fn remove_dir() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("stardict");
        std::fs::create_dir_all(sub.join("txt")).unwrap();
        assert!(remove_dir_if_exists(&sub).unwrap());
        assert!(!remove_dir_if_exists(&sub).unwrap());
    }
}
