//! File set of one owner's record.

use std::path::{Path, PathBuf};
use trinket_types::OwnerId;

/// `<owner>.dat` plus its temp, recovery and numbered backup siblings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPaths {
    pub main: PathBuf,
    pub tmp: PathBuf,
    pub recovered: PathBuf,
    /// `bak1` (newest) to `bakN` (oldest).
    pub backups: Vec<PathBuf>,
}

impl RecordPaths {
    pub fn new(dir: &Path, owner: OwnerId, retention: usize) -> Self {
        let base = format!("{owner}.dat");
        let sibling = |suffix: &str| dir.join(format!("{base}.{suffix}"));
        Self {
            main: dir.join(&base),
            tmp: sibling("tmp"),
            recovered: sibling("recovered.tmp"),
            backups: (1..=retention).map(|n| sibling(&format!("bak{n}"))).collect(),
        }
    }

    /// Every path in the set, main first.
    pub fn all(&self) -> impl Iterator<Item = &Path> {
        [&self.main, &self.tmp, &self.recovered]
            .into_iter()
            .chain(&self.backups)
            .map(PathBuf::as_path)
    }
}
