// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Cache freshness checks

use super::{DirSignature, Index};
use std::path::{Path, PathBuf};

/// Why a cached [`Index`] is out of date
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StaleReason {
    /// The directory is requested but was not scanned
    Added(PathBuf),
    /// The directory was scanned but is no longer requested
    Removed(PathBuf),
    /// The directory's content changed, appeared or disappeared since it
    /// was scanned
    Changed(PathBuf),
}

/// Result of [`check_freshness`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Freshness {
    /// The cached index may be used as-is
    Fresh,
    /// The listed directories differ from the cached index
    Stale(Vec<StaleReason>),
}

impl Freshness {
    #[inline]
    pub fn is_fresh(&self) -> bool {
        *self == Freshness::Fresh
    }

    /// Directories which must be (re)scanned
    ///
    /// Directories which are no longer requested need no scan: dropping
    /// them from the index suffices.
    pub fn directories_to_scan(&self) -> Vec<&Path> {
        match self {
            Freshness::Fresh => vec![],
            Freshness::Stale(reasons) => reasons
                .iter()
                .filter_map(|reason| match reason {
                    StaleReason::Added(path) | StaleReason::Changed(path) => Some(path.as_path()),
                    StaleReason::Removed(_) => None,
                })
                .collect(),
        }
    }
}

/// Compare a cached index against the current state of `directories`
///
/// Only directory metadata is read (see [`DirSignature`]), so this is much
/// cheaper than a scan. The order of `directories` is not significant.
pub fn check_freshness<P: AsRef<Path>>(cached: &Index, directories: &[P]) -> Freshness {
    let mut reasons = Vec::new();

    for dir in directories {
        let dir = dir.as_ref();
        match cached.roots().iter().find(|root| root.path == dir) {
            None => reasons.push(StaleReason::Added(dir.to_path_buf())),
            Some(root) => {
                let current = DirSignature::compute(dir);
                if current != root.signature {
                    log::debug!(
                        "font directory {} changed: {:?} -> {:?}",
                        dir.display(),
                        root.signature,
                        current
                    );
                    reasons.push(StaleReason::Changed(dir.to_path_buf()));
                }
            }
        }
    }

    for root in cached.roots() {
        if !directories.iter().any(|dir| dir.as_ref() == root.path) {
            reasons.push(StaleReason::Removed(root.path.clone()));
        }
    }

    if reasons.is_empty() {
        Freshness::Fresh
    } else {
        Freshness::Stale(reasons)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fonts::scan::{scan, test::TextIntrospector};
    use std::fs;

    #[test]
    fn idempotent_then_stale() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.ttf"), "A;normal;400;100%;65").unwrap();
        let dirs = [dir.path()];

        let (index, _) = scan(&dirs, &TextIntrospector);
        assert_eq!(check_freshness(&index, &dirs), Freshness::Fresh);
        assert_eq!(check_freshness(&index, &dirs), Freshness::Fresh);

        let added = dir.path().join("b.ttf");
        fs::write(&added, "B;normal;400;100%;66").unwrap();
        let freshness = check_freshness(&index, &dirs);
        assert_eq!(
            freshness,
            Freshness::Stale(vec![StaleReason::Changed(dir.path().to_path_buf())])
        );
        assert_eq!(freshness.directories_to_scan(), vec![dir.path()]);

        let (index, _) = scan(&dirs, &TextIntrospector);
        assert!(check_freshness(&index, &dirs).is_fresh());
        fs::remove_file(&added).unwrap();
        assert!(!check_freshness(&index, &dirs).is_fresh());
    }

    #[test]
    fn replaced_with_preserved_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.ttf");
        fs::write(&path, "A;normal;400;100%;65").unwrap();
        let modified = fs::metadata(&path).unwrap().modified().unwrap();
        let dirs = [dir.path()];
        let (index, _) = scan(&dirs, &TextIntrospector);

        fs::write(&path, "A;normal;400;100%;65,66,67").unwrap();
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(modified)
            .unwrap();
        assert_eq!(
            check_freshness(&index, &dirs),
            Freshness::Stale(vec![StaleReason::Changed(dir.path().to_path_buf())])
        );
    }

    #[test]
    fn directory_list_changes() {
        let one = tempfile::tempdir().unwrap();
        let two = tempfile::tempdir().unwrap();
        let (index, _) = scan(&[one.path()], &TextIntrospector);

        let freshness = check_freshness(&index, &[two.path()]);
        assert_eq!(
            freshness,
            Freshness::Stale(vec![
                StaleReason::Added(two.path().to_path_buf()),
                StaleReason::Removed(one.path().to_path_buf()),
            ])
        );
        assert_eq!(freshness.directories_to_scan(), vec![two.path()]);
    }

    #[test]
    fn missing_directory_appears() {
        let dir = tempfile::tempdir().unwrap();
        let fonts = dir.path().join("fonts");
        let (index, _) = scan(&[fonts.as_path()], &TextIntrospector);
        assert!(check_freshness(&index, &[fonts.as_path()]).is_fresh());

        fs::create_dir(&fonts).unwrap();
        assert_eq!(
            check_freshness(&index, &[fonts.as_path()]),
            Freshness::Stale(vec![StaleReason::Changed(fonts.clone())])
        );
    }
}
