// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Font map: the query interface over an [`Index`]

#![allow(clippy::len_without_is_empty)]

use super::cache::{CacheConfig, CacheError};
use super::reconcile::{check_freshness, Freshness};
use super::scan::{CancelToken, Cancelled, ScanWarning, Scanner};
use super::selector::{match_families, match_footprints, Candidate};
use super::{Aspect, Footprint, FormatSet, Index, Introspector, Substitutor};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Font map loading errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LoadError {
    /// No directories were configured and no cached index could be read
    #[error("no font directories and no usable font cache")]
    NoSource,
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

/// Configuration for [`FontMap::load`]
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FontMapConfig {
    /// Directories to scan, in priority order
    pub directories: Vec<PathBuf>,
    /// Index cache; if `None`, every load performs a full scan
    #[cfg_attr(feature = "serde", serde(default))]
    pub cache: Option<CacheConfig>,
    /// Read files on the rayon thread pool (requires feature `parallel`)
    #[cfg_attr(feature = "serde", serde(default = "default_parallel"))]
    pub parallel: bool,
}

#[cfg(feature = "serde")]
fn default_parallel() -> bool {
    true
}

impl Default for FontMapConfig {
    /// Use [`FontMapConfig::system_directories`] without a cache
    fn default() -> Self {
        FontMapConfig::new(FontMapConfig::system_directories())
    }
}

impl FontMapConfig {
    /// Construct for `directories`, without a cache
    pub fn new(directories: Vec<PathBuf>) -> Self {
        FontMapConfig {
            directories,
            cache: None,
            parallel: true,
        }
    }

    /// Set the cache
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Usual font directories of the current platform
    ///
    /// The per-user directory comes first where one exists. Directories are
    /// listed whether or not they exist.
    pub fn system_directories() -> Vec<PathBuf> {
        let mut list: Vec<PathBuf> = dirs::font_dir().into_iter().collect();
        cfg_if::cfg_if! {
            if #[cfg(target_os = "windows")] {
                let root = std::env::var_os("WINDIR").unwrap_or_else(|| "C:\\Windows".into());
                list.push(PathBuf::from(root).join("Fonts"));
            } else if #[cfg(target_os = "macos")] {
                list.push("/Library/Fonts".into());
                list.push("/System/Library/Fonts".into());
            } else {
                if let Some(home) = dirs::home_dir() {
                    let legacy = home.join(".fonts");
                    if !list.contains(&legacy) {
                        list.push(legacy);
                    }
                }
                list.push("/usr/local/share/fonts".into());
                list.push("/usr/share/fonts".into());
            }
        }
        list
    }
}

/// A font query
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Query {
    /// Requested families, in priority order
    ///
    /// Each is expanded into a fallback chain by the [`Substitutor`].
    pub families: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub aspect: Aspect,
    /// A character which matched faces must cover
    #[cfg_attr(feature = "serde", serde(default))]
    pub rune: Option<char>,
    /// Accepted font formats
    #[cfg_attr(feature = "serde", serde(default))]
    pub formats: FormatSet,
}

impl Query {
    /// Query a single family with default aspect
    pub fn new(family: impl Into<String>) -> Self {
        Query::with_families(vec![family.into()])
    }

    /// Query an ordered list of families with default aspect
    pub fn with_families(families: Vec<String>) -> Self {
        Query {
            families,
            aspect: Aspect::default(),
            rune: None,
            formats: FormatSet::default(),
        }
    }

    /// Set the desired aspect
    pub fn aspect(mut self, aspect: Aspect) -> Self {
        self.aspect = aspect;
        self
    }

    /// Require coverage of `rune`
    pub fn rune(mut self, rune: char) -> Self {
        self.rune = Some(rune);
        self
    }

    /// Restrict accepted formats
    pub fn formats(mut self, formats: FormatSet) -> Self {
        self.formats = formats;
        self
    }
}

/// An [`Index`] of available font faces with family substitution
///
/// Queries take `&self`; a `FontMap` may be shared between threads.
#[derive(Clone, Debug)]
pub struct FontMap {
    index: Index,
    substitutor: Substitutor,
}

impl FontMap {
    /// Construct from an index, with the given substitution rules
    pub fn from_index(index: Index, substitutor: Substitutor) -> Self {
        FontMap { index, substitutor }
    }

    /// Load the font map for `config`
    ///
    /// If a cache is configured and matches the state of
    /// `config.directories`, no font file is read. If some directories
    /// changed, only those are rescanned. Otherwise all directories are
    /// scanned. The cache is rewritten after any scan.
    ///
    /// Cache problems are logged and resolved by scanning. Scan warnings
    /// are returned; these are empty when the cache was used unchanged.
    ///
    /// The default [`Substitutor`] is used.
    pub fn load(
        config: &FontMapConfig,
        introspector: &(impl Introspector + ?Sized),
    ) -> Result<(Self, Vec<ScanWarning>), LoadError> {
        Self::load_impl(config, introspector, None)
    }

    /// As [`FontMap::load`], supporting cancellation
    ///
    /// Returns [`LoadError::Cancelled`] if `token` is cancelled before the
    /// scan completes. The cache is not written in this case.
    pub fn load_cancellable(
        config: &FontMapConfig,
        introspector: &(impl Introspector + ?Sized),
        token: CancelToken,
    ) -> Result<(Self, Vec<ScanWarning>), LoadError> {
        Self::load_impl(config, introspector, Some(token))
    }

    fn load_impl(
        config: &FontMapConfig,
        introspector: &(impl Introspector + ?Sized),
        cancel: Option<CancelToken>,
    ) -> Result<(Self, Vec<ScanWarning>), LoadError> {
        let cached = config.cache.as_ref().and_then(read_cache);

        if config.directories.is_empty() {
            return match cached {
                Some(index) => Ok((FontMap::from_index(index, Substitutor::default()), vec![])),
                None => Err(LoadError::NoSource),
            };
        }

        let mut scanner = Scanner::new(introspector).parallel(config.parallel);
        if let Some(token) = cancel {
            scanner = scanner.with_cancel(token);
        }

        let (index, warnings) = match cached {
            Some(cached) => match check_freshness(&cached, &config.directories) {
                Freshness::Fresh => {
                    log::info!("Using cached font index ({} font faces)", cached.len());
                    return Ok((FontMap::from_index(cached, Substitutor::default()), vec![]));
                }
                stale => {
                    let dirs = stale.directories_to_scan();
                    log::info!("Font index is stale; rescanning {} directories", dirs.len());
                    let (fresh, warnings) = scanner.scan(&dirs)?;
                    (cached.update(fresh, &config.directories), warnings)
                }
            },
            None => scanner.scan(&config.directories)?,
        };

        if let Some(cache) = config.cache.as_ref() {
            match cache.write(&index) {
                Ok(()) => log::debug!("wrote font cache {}", cache.path().display()),
                Err(err) => log::warn!("failed to write font cache {}: {err}", cache.path().display()),
            }
        }

        Ok((FontMap::from_index(index, Substitutor::default()), warnings))
    }

    /// Replace the substitution rules
    pub fn with_substitutor(mut self, substitutor: Substitutor) -> Self {
        self.substitutor = substitutor;
        self
    }

    #[inline]
    pub fn substitutor(&self) -> &Substitutor {
        &self.substitutor
    }

    #[inline]
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Number of font faces
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// List (normalized) family names, sorted and without duplicates
    pub fn families(&self) -> Vec<&str> {
        self.index.families()
    }

    /// The fallback chain of `query`
    ///
    /// This concatenates the expansion of each requested family.
    pub fn chain(&self, query: &Query) -> Vec<String> {
        self.substitutor.expand_all(&query.families)
    }

    fn footprints(&self, formats: FormatSet) -> impl Iterator<Item = &Footprint> {
        self.index
            .iter()
            .filter(move |fp| formats.accepts(fp.format()))
    }

    /// Find the best faces for `query`
    ///
    /// Returns the best matches within the first family of the fallback
    /// chain having any acceptable face; see [`match_footprints`].
    pub fn query(&self, query: &Query) -> Vec<Candidate<'_>> {
        let chain = self.chain(query);
        let result = match_footprints(self.footprints(query.formats), &chain, query.aspect, query.rune);
        log::debug!(
            "query {:?} ({}): {} candidates from family {:?}",
            query.families,
            query.aspect,
            result.len(),
            result.first().map(|c| &chain[c.family]),
        );
        result
    }

    /// Find the best faces of each family of the fallback chain
    ///
    /// See [`match_families`].
    pub fn query_families(&self, query: &Query) -> Vec<Candidate<'_>> {
        let chain = self.chain(query);
        match_families(self.footprints(query.formats), &chain, query.aspect, query.rune)
    }

    /// Find a face for `rune`
    ///
    /// This is [`FontMap::query`] with `rune` required (replacing any rune
    /// set on `query`), taking the first result.
    pub fn resolve_rune(&self, query: &Query, rune: char) -> Option<Candidate<'_>> {
        let chain = self.chain(query);
        match_footprints(self.footprints(query.formats), &chain, query.aspect, Some(rune))
            .into_iter()
            .next()
    }
}

fn read_cache(cache: &CacheConfig) -> Option<Index> {
    match cache.read() {
        Ok(index) => {
            log::debug!("read font cache {}", cache.path().display());
            Some(index)
        }
        Err(CacheError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
            log::info!("No font cache at {}", cache.path().display());
            None
        }
        Err(CacheError::Decode(err)) if err.is_version_mismatch() => {
            log::info!("Font cache format changed ({err}); rebuilding");
            None
        }
        Err(err) => {
            log::warn!("discarding font cache {}: {err}", cache.path().display());
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fonts::scan::test::TextIntrospector;
    use crate::fonts::{FaceSummary, IntrospectError, Style, Weight};
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting(AtomicUsize);

    impl Counting {
        fn take(&self) -> usize {
            self.0.swap(0, Ordering::Relaxed)
        }
    }

    impl Introspector for Counting {
        fn accepts(&self, path: &Path) -> bool {
            TextIntrospector.accepts(path)
        }

        fn introspect(&self, data: &[u8]) -> Result<Vec<FaceSummary>, IntrospectError> {
            self.0.fetch_add(1, Ordering::Relaxed);
            TextIntrospector.introspect(data)
        }
    }

    #[test]
    fn no_source() {
        let dir = tempfile::tempdir().unwrap();
        let config = FontMapConfig::new(vec![]);
        assert_eq!(
            FontMap::load(&config, &TextIntrospector).unwrap_err(),
            LoadError::NoSource
        );

        let config = config.with_cache(CacheConfig::new(dir.path().join("none.cache")));
        assert_eq!(
            FontMap::load(&config, &TextIntrospector).unwrap_err(),
            LoadError::NoSource
        );
    }

    #[test]
    fn cache_reuse_and_incremental_rescan() {
        let one = tempfile::tempdir().unwrap();
        let two = tempfile::tempdir().unwrap();
        let cache_dir = tempfile::tempdir().unwrap();
        fs::write(one.path().join("a.ttf"), "A;normal;400;100%;65").unwrap();
        fs::write(one.path().join("b.ttf"), "B;normal;400;100%;66").unwrap();
        fs::write(two.path().join("c.ttf"), "C;normal;400;100%;67").unwrap();

        let cache = CacheConfig::new(cache_dir.path().join("fonts.cache"));
        let config = FontMapConfig::new(vec![one.path().into(), two.path().into()])
            .with_cache(cache.clone());
        let introspector = Counting::default();

        let (map, warnings) = FontMap::load(&config, &introspector).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(introspector.take(), 3);
        assert_eq!(map.families(), vec!["a", "b", "c"]);
        assert!(cache.path().exists());

        let (again, _) = FontMap::load(&config, &introspector).unwrap();
        assert_eq!(introspector.take(), 0);
        assert_eq!(again.index(), map.index());

        fs::write(two.path().join("d.ttf"), "D;normal;400;100%;68").unwrap();
        let (map, _) = FontMap::load(&config, &introspector).unwrap();
        assert_eq!(introspector.take(), 2);
        assert_eq!(map.families(), vec!["a", "b", "c", "d"]);

        fs::write(cache.path(), b"garbage").unwrap();
        let (map, _) = FontMap::load(&config, &introspector).unwrap();
        assert_eq!(introspector.take(), 4);
        assert_eq!(map.len(), 4);

        let cache_only = FontMapConfig::new(vec![]).with_cache(cache);
        let (map, _) = FontMap::load(&cache_only, &introspector).unwrap();
        assert_eq!(introspector.take(), 0);
        assert_eq!(map.len(), 4);
    }

    #[test]
    fn cancelled_load() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.ttf"), "A;normal;400;100%;65").unwrap();
        let config = FontMapConfig::new(vec![dir.path().into()]);
        let token = CancelToken::new();
        token.cancel();
        let result = FontMap::load_cancellable(&config, &TextIntrospector, token);
        assert_eq!(result.unwrap_err(), LoadError::Cancelled(Cancelled));
    }

    #[test]
    fn query_with_substitution() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("sans.ttf"),
            "DejaVu Sans;normal;400;100%;65,66\nDejaVu Sans;normal;700;100%;65,66",
        )
        .unwrap();
        fs::write(dir.path().join("mono.ttf"), "DejaVu Sans Mono;normal;400;100%;65,9472")
            .unwrap();
        let config = FontMapConfig::new(vec![dir.path().into()]);
        let (map, _) = FontMap::load(&config, &TextIntrospector).unwrap();

        let bold = Aspect::new(Style::Normal, Weight::BOLD, Default::default());
        let result = map.query(&Query::new("Verdana").aspect(bold));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].footprint.family(), "dejavu sans");
        assert_eq!(result[0].footprint.aspect().weight, Weight::BOLD);

        let result = map.query(&Query::new("monospace"));
        assert_eq!(result[0].footprint.family(), "dejavu sans mono");

        let query = Query::with_families(vec!["sans-serif".into(), "monospace".into()]);
        let found = map.resolve_rune(&query, '\u{2500}').unwrap();
        assert_eq!(found.footprint.family(), "dejavu sans mono");
        assert_eq!(map.resolve_rune(&query, 'A').unwrap().footprint.family(), "dejavu sans");
        assert!(map.resolve_rune(&query, 'Z').is_none());

        let none = Query::new("sans-serif").formats(FormatSet::PCF);
        assert!(map.query(&none).is_empty());

        let all = map.query_families(&Query::new("DejaVu Sans Mono"));
        let families: Vec<_> = all.iter().map(|c| c.footprint.family()).collect();
        assert_eq!(families, ["dejavu sans mono", "dejavu sans"]);
    }
}
