// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Font directory scanning

use super::{DirSignature, Footprint, Index, IntrospectError, Introspector, Location, RootDir};
use std::collections::HashSet;
use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// A file which could not be summarized
///
/// Warnings are not fatal: scanning continues with the next file.
#[derive(Error, Debug)]
#[error("{}: {kind}", .path.display())]
pub struct ScanWarning {
    pub path: PathBuf,
    pub kind: ScanWarningKind,
}

/// Cause of a [`ScanWarning`]
#[derive(Error, Debug)]
pub enum ScanWarningKind {
    #[error("read error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Introspect(#[from] IntrospectError),
}

impl ScanWarning {
    fn new(path: impl Into<PathBuf>, kind: impl Into<ScanWarningKind>) -> Self {
        ScanWarning {
            path: path.into(),
            kind: kind.into(),
        }
    }
}

/// The scan was cancelled via its [`CancelToken`]
///
/// Partial results are discarded.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("font scan cancelled")]
pub struct Cancelled;

/// Cooperative cancellation of a scan
///
/// Clones share state: calling [`CancelToken::cancel`] on any clone stops a
/// scan using another. The flag is checked between files.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Construct (not cancelled)
    pub fn new() -> Self {
        CancelToken::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// True if cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub(crate) enum WalkEvent<'a> {
    Dir(&'a Metadata),
    File(&'a Path, &'a Metadata),
    Error(&'a Path, io::Error),
}

/// Walk the tree under `root`, following symbolic links
///
/// Each directory is visited once (by canonical path), thus link cycles are
/// harmless. Entries are visited in sorted order. Non-regular files and
/// dangling links are skipped.
///
/// Fails only if `root` is not a readable directory.
pub(crate) fn walk(
    root: &Path,
    cancel: Option<&CancelToken>,
    mut visit: impl FnMut(WalkEvent<'_>),
) -> io::Result<()> {
    let meta = fs::metadata(root)?;
    if !meta.is_dir() {
        return Err(io::Error::other("not a directory"));
    }
    visit(WalkEvent::Dir(&meta));

    let mut visited = HashSet::new();
    visited.insert(fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf()));
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Ok(());
        }

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                visit(WalkEvent::Error(&dir, err));
                continue;
            }
        };
        let mut paths = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) => paths.push(entry.path()),
                Err(err) => visit(WalkEvent::Error(&dir, err)),
            }
        }
        paths.sort();

        let mut subdirs = Vec::new();
        for path in paths {
            let meta = match fs::metadata(&path) {
                Ok(meta) => meta,
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => {
                    visit(WalkEvent::Error(&path, err));
                    continue;
                }
            };

            if meta.is_dir() {
                let canonical = fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
                if visited.insert(canonical) {
                    visit(WalkEvent::Dir(&meta));
                    subdirs.push(path);
                }
            } else if meta.is_file() {
                visit(WalkEvent::File(&path, &meta));
            }
        }

        // Depth-first, in sorted order
        stack.extend(subdirs.into_iter().rev());
    }

    Ok(())
}

/// Builds an [`Index`] from font directories
///
/// Directories are scanned in the given order. Per-file work is spread over
/// the rayon thread pool when the `parallel` feature is enabled (default)
/// and not disabled via [`Scanner::parallel`].
pub struct Scanner<'a, I: Introspector + ?Sized> {
    introspector: &'a I,
    parallel: bool,
    cancel: Option<CancelToken>,
}

impl<'a, I: Introspector + ?Sized> Scanner<'a, I> {
    /// Construct
    pub fn new(introspector: &'a I) -> Self {
        Scanner {
            introspector,
            parallel: true,
            cancel: None,
        }
    }

    /// Enable or disable parallel reading of files
    #[inline]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set a cancellation token
    #[inline]
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Scan `directories` recursively
    ///
    /// Returns the index together with warnings for each file which could
    /// not be read or summarized. Missing directories are recorded in the
    /// index without a signature.
    pub fn scan<P: AsRef<Path>>(
        &self,
        directories: &[P],
    ) -> Result<(Index, Vec<ScanWarning>), Cancelled> {
        let mut roots = Vec::with_capacity(directories.len());
        let mut footprints = Vec::new();
        let mut warnings = Vec::new();

        for dir in directories {
            let dir = dir.as_ref();
            let (root, files) = self.list_files(dir, &mut warnings);
            roots.push(root);
            if self.is_cancelled() {
                return Err(Cancelled);
            }

            for result in self.read_files(&files) {
                match result {
                    Some(Ok(list)) => footprints.extend(list),
                    Some(Err(warning)) => {
                        log::warn!("{warning}");
                        warnings.push(warning);
                    }
                    None => return Err(Cancelled),
                }
            }
        }

        let index = Index::new(roots, footprints);
        log::info!(
            "Found {} font faces in {} directories ({} warnings)",
            index.len(),
            directories.len(),
            warnings.len()
        );
        Ok((index, warnings))
    }

    /// Walk `dir`, computing its signature and listing accepted files
    fn list_files(&self, dir: &Path, warnings: &mut Vec<ScanWarning>) -> (RootDir, Vec<PathBuf>) {
        let mut signature = DirSignature::default();
        let mut files = Vec::new();
        let result = walk(dir, self.cancel.as_ref(), |event| {
            signature.record(&event);
            match event {
                WalkEvent::File(path, _) if self.introspector.accepts(path) => {
                    files.push(path.to_path_buf());
                }
                WalkEvent::Error(path, err) => {
                    let warning = ScanWarning::new(path, err);
                    log::warn!("{warning}");
                    warnings.push(warning);
                }
                _ => (),
            }
        });

        let signature = match result {
            Ok(()) => Some(signature),
            Err(err) => {
                log::debug!("skipping font directory {}: {err}", dir.display());
                None
            }
        };
        let root = RootDir {
            path: dir.to_path_buf(),
            signature,
        };
        (root, files)
    }

    fn read_files(&self, files: &[PathBuf]) -> Vec<Option<Result<Vec<Footprint>, ScanWarning>>> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "parallel")] {
                if self.parallel {
                    use rayon::prelude::*;
                    return files.par_iter().map(|path| self.read_file(path)).collect();
                }
            }
        }
        files.iter().map(|path| self.read_file(path)).collect()
    }

    /// Summarize one file; `None` if cancelled
    fn read_file(&self, path: &Path) -> Option<Result<Vec<Footprint>, ScanWarning>> {
        if self.is_cancelled() {
            return None;
        }

        let data = match fs::read(path) {
            Ok(data) => data,
            Err(err) => return Some(Err(ScanWarning::new(path, err))),
        };
        let faces = match self.introspector.introspect(&data) {
            Ok(faces) => faces,
            Err(err) => return Some(Err(ScanWarning::new(path, err))),
        };

        Some(Ok(faces
            .into_iter()
            .map(|face| {
                Footprint::new(
                    face.family,
                    face.runes,
                    face.aspect,
                    face.format,
                    Location::new(path, face.face),
                )
            })
            .collect()))
    }
}

/// Scan `directories` with default settings
///
/// This is a shortcut for [`Scanner::scan`] without cancellation.
pub fn scan<P: AsRef<Path>>(
    directories: &[P],
    introspector: &(impl Introspector + ?Sized),
) -> (Index, Vec<ScanWarning>) {
    Scanner::new(introspector)
        .scan(directories)
        .unwrap_or_else(|Cancelled| (Index::default(), Vec::new()))
}
