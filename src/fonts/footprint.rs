// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Font face summaries

use super::{Aspect, Format};
use crate::RuneSet;
use std::path::{Path, PathBuf};

/// Normalize a family name for comparison
///
/// Family names are compared case-insensitively after trimming.
/// ```
/// # use kas_fontscan::fonts::normalize_family;
/// assert_eq!(normalize_family("  DejaVu Sans "), "dejavu sans");
/// ```
pub fn normalize_family(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Location of a face: file path and index within a collection
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location {
    pub path: PathBuf,
    /// Face index (zero unless the file is a collection)
    pub face: u32,
}

impl Location {
    /// Construct
    pub fn new(path: impl Into<PathBuf>, face: u32) -> Self {
        Location {
            path: path.into(),
            face,
        }
    }
}

/// Summary of a font face, sufficient for matching without reading the file
///
/// Footprints are immutable once constructed.
#[derive(Clone, Debug, PartialEq)]
pub struct Footprint {
    family: String,
    name: String,
    runes: RuneSet,
    aspect: Aspect,
    format: Format,
    location: Location,
}

impl Footprint {
    /// Construct
    ///
    /// The family name is normalized (see [`normalize_family`]); the trimmed
    /// original spelling is kept for display.
    pub fn new(
        name: impl Into<String>,
        runes: RuneSet,
        aspect: Aspect,
        format: Format,
        location: Location,
    ) -> Self {
        let mut name = name.into();
        if name.trim().len() != name.len() {
            name = name.trim().to_string();
        }
        Footprint {
            family: normalize_family(&name),
            name,
            runes,
            aspect,
            format,
            location,
        }
    }

    /// Normalized family name
    #[inline]
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Family name as spelled by the font
    #[inline]
    pub fn display_family(&self) -> &str {
        &self.name
    }

    /// Rune coverage
    #[inline]
    pub fn runes(&self) -> &RuneSet {
        &self.runes
    }

    #[inline]
    pub fn aspect(&self) -> Aspect {
        self.aspect
    }

    #[inline]
    pub fn format(&self) -> Format {
        self.format
    }

    #[inline]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Path to the font file
    #[inline]
    pub fn path(&self) -> &Path {
        &self.location.path
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn family_is_normalized() {
        let fp = Footprint::new(
            " Noto Sans ",
            RuneSet::default(),
            Aspect::default(),
            Format::OpenType,
            Location::new("/a.ttf", 0),
        );
        assert_eq!(fp.family(), "noto sans");
        assert_eq!(fp.display_family(), "Noto Sans");
        assert_eq!(fp.path(), Path::new("/a.ttf"));
    }
}
