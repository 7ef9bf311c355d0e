// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Extraction of face summaries from font files

use super::{Aspect, Format, Stretch, Style, Weight};
use crate::RuneSet;
use std::path::Path;
use thiserror::Error;
use ttf_parser::{name_id, Face};

/// Font introspection errors
#[derive(Error, Debug)]
pub enum IntrospectError {
    #[error("font parse error: {0}")]
    Parse(#[from] ttf_parser::FaceParsingError),
    #[error("face has no usable family name")]
    NoFamilyName,
    #[error("unsupported font format")]
    Unsupported,
}

/// Summary of one face as reported by an [`Introspector`]
#[derive(Clone, Debug, PartialEq)]
pub struct FaceSummary {
    pub family: String,
    pub aspect: Aspect,
    pub runes: RuneSet,
    pub format: Format,
    /// Index of the face within its file
    pub face: u32,
}

/// A font file reader
///
/// The scanner calls [`Introspector::accepts`] on each file path found and,
/// if accepted, [`Introspector::introspect`] on the file's contents.
/// Implementations are shared between scanning threads.
pub trait Introspector: Sync {
    /// True if the file at `path` should be read
    ///
    /// This is a cheap pre-filter (typically on the file extension).
    fn accepts(&self, path: &Path) -> bool;

    /// Summarize every face in `data`
    ///
    /// A collection yields multiple faces.
    fn introspect(&self, data: &[u8]) -> Result<Vec<FaceSummary>, IntrospectError>;
}

/// Introspector for OpenType and TrueType fonts (including collections)
#[derive(Clone, Copy, Debug, Default)]
pub struct TtfIntrospector;

const ENGLISH_US: u16 = 0x0409;

impl TtfIntrospector {
    fn summarize(face: &Face, index: u32) -> Result<FaceSummary, IntrospectError> {
        let family = family_name(face).ok_or(IntrospectError::NoFamilyName)?;

        let style = match face.style() {
            ttf_parser::Style::Normal => Style::Normal,
            ttf_parser::Style::Italic => Style::Italic,
            ttf_parser::Style::Oblique => Style::Oblique,
        };
        let aspect = Aspect {
            style,
            weight: Weight(f32::from(face.weight().to_number())),
            stretch: Stretch::from_width_class(face.width().to_number()),
        };

        let mut runes = Vec::new();
        if let Some(cmap) = face.tables().cmap {
            for subtable in cmap.subtables {
                if subtable.is_unicode() {
                    subtable.codepoints(|c| runes.push(c));
                }
            }
        }

        Ok(FaceSummary {
            family,
            aspect,
            runes: RuneSet::new(runes),
            format: Format::OpenType,
            face: index,
        })
    }
}

impl Introspector for TtfIntrospector {
    fn accepts(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
            return false;
        };
        ["ttf", "otf", "ttc", "otc"]
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known))
    }

    fn introspect(&self, data: &[u8]) -> Result<Vec<FaceSummary>, IntrospectError> {
        let count = ttf_parser::fonts_in_collection(data).unwrap_or(1);
        let mut faces = Vec::with_capacity(crate::conv::to_usize(count));
        let mut first_error = None;

        for index in 0..count {
            match Face::parse(data, index)
                .map_err(IntrospectError::from)
                .and_then(|face| Self::summarize(&face, index))
            {
                Ok(summary) => faces.push(summary),
                Err(err) => {
                    log::debug!("skipping face {index}: {err}");
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) if faces.is_empty() => Err(err),
            _ => Ok(faces),
        }
    }
}

/// Select the face's family name
///
/// The typographic family (name ID 16) is preferred over the legacy family
/// (name ID 1); within each, a US English record is preferred.
fn family_name(face: &Face) -> Option<String> {
    for id in [name_id::TYPOGRAPHIC_FAMILY, name_id::FAMILY] {
        let mut found = None;
        for name in face.names() {
            if name.name_id != id {
                continue;
            }
            if let Some(s) = name.to_string().filter(|s| !s.trim().is_empty()) {
                if name.language_id == ENGLISH_US {
                    return Some(s);
                }
                found.get_or_insert(s);
            }
        }
        if found.is_some() {
            return found;
        }
    }
    None
}
