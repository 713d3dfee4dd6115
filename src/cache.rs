// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! On-disk cache partitions with expiration.
//!
//! Each partition is a directory under the user cache dir. Pruning removes
//! entries older than the partition's age ceiling, then the oldest entries
//! until the count ceiling holds.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use log::{debug, info, warn};

/// Directory name shared by every partition.
const APP_CACHE_DIR: &str = "padron-desktop";

/// A named cache directory and its expiration policy.
#[derive(Debug, Clone)]
pub struct CachePartition {
    name: String,
    dir: PathBuf,
    max_entries: usize,
    max_age: Duration,
}

impl CachePartition {
    /// Partition at `<cache dir>/padron-desktop/<name>`. Creates the directory.
    pub fn open(name: &str, max_entries: usize, max_age: Duration) -> Self {
        let dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join(APP_CACHE_DIR)
            .join(name);
        Self::at(name, dir, max_entries, max_age)
    }

    pub fn at(name: &str, dir: PathBuf, max_entries: usize, max_age: Duration) -> Self {
        if let Err(e) = fs::create_dir_all(&dir) {
            warn!("Failed to create {name} cache directory {}: {e}", dir.display());
        }
        Self {
            name: name.to_string(),
            dir,
            max_entries,
            max_age,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Apply the age and count ceilings. Returns how many files were removed.
    pub fn prune(&self) -> usize {
        let now = SystemTime::now();
        let mut entries = Vec::new();
        collect_files(&self.dir, &mut entries);

        let mut removed = 0;
        let mut kept: Vec<(PathBuf, SystemTime)> = Vec::with_capacity(entries.len());
        for (path, modified) in entries {
            let expired = now
                .duration_since(modified)
                .is_ok_and(|age| age > self.max_age);
            if expired && remove(&path) {
                removed += 1;
            } else if !expired {
                kept.push((path, modified));
            }
        }

        if kept.len() > self.max_entries {
            kept.sort_by_key(|(_, modified)| *modified);
            let excess = kept.len() - self.max_entries;
            removed += kept.iter().take(excess).filter(|(path, _)| remove(path)).count();
        }

        if removed > 0 {
            info!("Pruned {removed} entries from {} cache", self.name);
        }
        removed
    }
}

fn remove(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed cache entry {}", path.display());
            true
        }
        Err(e) => {
            warn!("Failed to remove cache entry {}: {e}", path.display());
            false
        }
    }
}

fn collect_files(dir: &Path, out: &mut Vec<(PathBuf, SystemTime)>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if metadata.is_dir() {
            collect_files(&path, out);
        } else if let Ok(modified) = metadata.modified() {
            out.push((path, modified));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("padron-cache-test-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_prune_by_count() {
        let dir = scratch_dir("count");
        let partition = CachePartition::at("photos", dir.clone(), 2, Duration::from_secs(3600));
        for i in 0..4 {
            fs::write(dir.join(format!("{i}.jpg")), b"x").unwrap();
            std::thread::sleep(Duration::from_millis(20));
        }

        assert_eq!(partition.prune(), 2);
        let mut left: Vec<String> = fs::read_dir(&dir)
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        assert_eq!(left, vec!["2.jpg", "3.jpg"]);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_prune_by_age() {
        let dir = scratch_dir("age");
        let partition = CachePartition::at("tiles", dir.clone(), 100, Duration::ZERO);
        fs::create_dir_all(dir.join("12")).unwrap();
        fs::write(dir.join("12").join("a.png"), b"x").unwrap();
        std::thread::sleep(Duration::from_millis(20));

        assert_eq!(partition.prune(), 1);
        fs::remove_dir_all(&dir).unwrap();
    }
}
