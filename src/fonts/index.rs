// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! The font index

use super::scan::{walk, WalkEvent};
use super::{Footprint, Location};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Cheap summary of a directory tree's state
///
/// Computed from file-system metadata only (no file is opened). Adding or
/// removing a file changes `file_count`; adding, removing or modifying an
/// entry updates the modification time of the entry or its parent.
/// `total_size` catches a file replaced in place with its old modification
/// time preserved (e.g. `cp -p`). A replacement of identical size and
/// preserved time is not detected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DirSignature {
    /// Number of regular files in the tree
    pub file_count: u32,
    /// Sum of the sizes of regular files in the tree, in bytes
    pub total_size: u64,
    /// Latest modification time of any file or directory in the tree,
    /// as nanoseconds since the Unix epoch
    pub latest_modified: u64,
}

impl DirSignature {
    /// Compute the signature of the tree under `root`
    ///
    /// Returns `None` if `root` is not a readable directory.
    pub fn compute(root: &Path) -> Option<Self> {
        let mut signature = DirSignature::default();
        walk(root, None, |event| signature.record(&event)).ok()?;
        Some(signature)
    }

    pub(crate) fn record(&mut self, event: &WalkEvent<'_>) {
        let meta = match event {
            WalkEvent::Dir(meta) => meta,
            WalkEvent::File(_, meta) => {
                self.file_count = self.file_count.saturating_add(1);
                self.total_size = self.total_size.wrapping_add(meta.len());
                meta
            }
            WalkEvent::Error(..) => return,
        };
        let modified = meta
            .modified()
            .ok()
            .and_then(|time| time.duration_since(SystemTime::UNIX_EPOCH).ok())
            .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        self.latest_modified = self.latest_modified.max(modified);
    }
}

/// A scanned root directory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootDir {
    pub path: PathBuf,
    /// State at scan time; `None` if the directory was missing or unreadable
    pub signature: Option<DirSignature>,
}

/// A collection of [`Footprint`]s with the directories they were found in
///
/// An index never holds two footprints with the same [`Location`].
/// Footprint order is that of scanning but should not otherwise be relied on.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Index {
    roots: Vec<RootDir>,
    footprints: Vec<Footprint>,
}

impl Index {
    /// Construct
    ///
    /// Footprints sharing a [`Location`] with an earlier entry are dropped.
    pub fn new(roots: Vec<RootDir>, mut footprints: Vec<Footprint>) -> Self {
        let mut seen = HashSet::with_capacity(footprints.len());
        footprints.retain(|fp| seen.insert(fp.location().clone()));
        Index { roots, footprints }
    }

    /// Scanned directories, in scan order
    #[inline]
    pub fn roots(&self) -> &[RootDir] {
        &self.roots
    }

    #[inline]
    pub fn footprints(&self) -> &[Footprint] {
        &self.footprints
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Footprint> {
        self.footprints.iter()
    }

    /// Number of footprints
    #[inline]
    pub fn len(&self) -> usize {
        self.footprints.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.footprints.is_empty()
    }

    /// Find the footprint at `location`
    pub fn get(&self, location: &Location) -> Option<&Footprint> {
        self.footprints.iter().find(|fp| fp.location() == location)
    }

    /// List (normalized) family names, sorted and without duplicates
    pub fn families(&self) -> Vec<&str> {
        let mut list: Vec<&str> = self.footprints.iter().map(|fp| fp.family()).collect();
        list.sort_unstable();
        list.dedup();
        list
    }

    /// Replace the content of some roots with a fresh scan
    ///
    /// The result lists roots in the order of `directories`: each is taken
    /// from `fresh` if present there, else from `self`. Footprints of `self`
    /// are kept only if located under a root kept from `self` and not under
    /// any root of `fresh`.
    pub fn update<P: AsRef<Path>>(self, fresh: Index, directories: &[P]) -> Index {
        let mut old_roots = self.roots;
        let mut new_roots = fresh.roots;
        let mut roots = Vec::with_capacity(directories.len());
        let mut kept = Vec::new();

        for dir in directories {
            let dir = dir.as_ref();
            if let Some(i) = new_roots.iter().position(|r| r.path == dir) {
                roots.push(new_roots.swap_remove(i));
            } else if let Some(i) = old_roots.iter().position(|r| r.path == dir) {
                let root = old_roots.swap_remove(i);
                kept.push(root.path.clone());
                roots.push(root);
            }
        }

        fn under(fp: &Footprint, roots: &[&Path]) -> bool {
            roots.iter().any(|root| fp.path().starts_with(root))
        }
        let kept: Vec<&Path> = kept.iter().map(PathBuf::as_path).collect();
        let rescanned: Vec<&Path> = roots
            .iter()
            .map(|r| r.path.as_path())
            .filter(|path| !kept.contains(path))
            .collect();

        let mut footprints: Vec<Footprint> = self
            .footprints
            .into_iter()
            .filter(|fp| under(fp, &kept) && !under(fp, &rescanned))
            .collect();
        footprints.extend(fresh.footprints);

        Index::new(roots, footprints)
    }
}

impl<'a> IntoIterator for &'a Index {
    type Item = &'a Footprint;
    type IntoIter = std::slice::Iter<'a, Footprint>;

    fn into_iter(self) -> Self::IntoIter {
        self.footprints.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fonts::{Aspect, Format};
    use crate::RuneSet;

    fn footprint(family: &str, path: &str, face: u32) -> Footprint {
        Footprint::new(
            family,
            RuneSet::default(),
            Aspect::default(),
            Format::OpenType,
            Location::new(path, face),
        )
    }

    fn root(path: &str, file_count: u32) -> RootDir {
        RootDir {
            path: path.into(),
            signature: Some(DirSignature {
                file_count,
                total_size: 0,
                latest_modified: 0,
            }),
        }
    }

    #[test]
    fn dedup_by_location() {
        let index = Index::new(
            vec![],
            vec![
                footprint("A", "/a.ttf", 0),
                footprint("B", "/a.ttf", 1),
                footprint("C", "/a.ttf", 0),
            ],
        );
        assert_eq!(index.len(), 2);
        assert_eq!(index.footprints()[1].family(), "b");
        assert_eq!(index.families(), vec!["a", "b"]);
        assert!(index.get(&Location::new("/a.ttf", 1)).is_some());
        assert!(index.get(&Location::new("/a.ttf", 2)).is_none());
    }

    #[test]
    fn update_replaces_stale_roots() {
        let old = Index::new(
            vec![root("/x", 1), root("/y", 1), root("/gone", 1)],
            vec![
                footprint("X", "/x/x.ttf", 0),
                footprint("Y", "/y/y.ttf", 0),
                footprint("Gone", "/gone/g.ttf", 0),
            ],
        );
        let fresh = Index::new(
            vec![root("/y", 2), root("/z", 1)],
            vec![
                footprint("Y", "/y/y.ttf", 0),
                footprint("Y2", "/y/y2.ttf", 0),
                footprint("Z", "/z/z.ttf", 0),
            ],
        );

        let index = old.update(fresh, &["/x", "/y", "/z"]);
        let roots: Vec<_> = index.roots().iter().map(|r| r.path.clone()).collect();
        assert_eq!(roots, vec![PathBuf::from("/x"), "/y".into(), "/z".into()]);
        assert_eq!(index.roots()[1].signature.unwrap().file_count, 2);
        assert_eq!(index.families(), vec!["x", "y", "y2", "z"]);
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn signature_of_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(DirSignature::compute(&dir.path().join("none")), None);
        let empty = DirSignature::compute(dir.path()).unwrap();
        assert_eq!(empty.file_count, 0);
        assert_eq!(empty.total_size, 0);

        std::fs::write(dir.path().join("a"), b"abc").unwrap();
        std::fs::write(dir.path().join("b"), b"de").unwrap();
        let sig = DirSignature::compute(dir.path()).unwrap();
        assert_eq!(sig.file_count, 2);
        assert_eq!(sig.total_size, 5);
    }
}
