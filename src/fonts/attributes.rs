// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Properties for specifying font weight, stretch, style and format.

use bitflags::bitflags;
use core::fmt;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Visual width of a font as a ratio of the normal width
///
/// The default value is [`Stretch::NORMAL`] (`1.0`). Values typically range
/// from `0.5` to `2.0`.
///
/// In CSS, this corresponds to the [`font-stretch`] property.
///
/// [`font-stretch`]: https://www.w3.org/TR/css-fonts-4/#font-stretch-prop
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Stretch(pub f32);

impl Stretch {
    /// Width that is 50% of normal.
    pub const ULTRA_CONDENSED: Self = Self(0.5);

    /// Width that is 62.5% of normal.
    pub const EXTRA_CONDENSED: Self = Self(0.625);

    /// Width that is 75% of normal.
    pub const CONDENSED: Self = Self(0.75);

    /// Width that is 87.5% of normal.
    pub const SEMI_CONDENSED: Self = Self(0.875);

    /// Width that is 100% of normal. This is the default value.
    pub const NORMAL: Self = Self(1.0);

    /// Width that is 112.5% of normal.
    pub const SEMI_EXPANDED: Self = Self(1.125);

    /// Width that is 125% of normal.
    pub const EXPANDED: Self = Self(1.25);

    /// Width that is 150% of normal.
    pub const EXTRA_EXPANDED: Self = Self(1.5);

    /// Width that is 200% of normal.
    pub const ULTRA_EXPANDED: Self = Self(2.0);

    const CLASSES: [Self; 9] = [
        Self::ULTRA_CONDENSED,
        Self::EXTRA_CONDENSED,
        Self::CONDENSED,
        Self::SEMI_CONDENSED,
        Self::NORMAL,
        Self::SEMI_EXPANDED,
        Self::EXPANDED,
        Self::EXTRA_EXPANDED,
        Self::ULTRA_EXPANDED,
    ];

    /// Convert from an OpenType `usWidthClass` (1-9)
    ///
    /// Out-of-range classes map to [`Stretch::NORMAL`].
    ///
    /// ```
    /// # use kas_fontscan::fonts::Stretch;
    /// assert_eq!(Stretch::from_width_class(3), Stretch::CONDENSED);
    /// assert_eq!(Stretch::from_width_class(0), Stretch::NORMAL);
    /// ```
    pub fn from_width_class(class: u16) -> Self {
        match class {
            1..=9 => Self::CLASSES[usize::from(class - 1)],
            _ => Self::NORMAL,
        }
    }

    /// Returns the stretch as a percentage value.
    pub fn percentage(self) -> f32 {
        self.0 * 100.0
    }

    /// Parses the stretch from a CSS style keyword or a percentage value.
    ///
    /// # Examples
    ///
    /// ```
    /// # use kas_fontscan::fonts::Stretch;
    /// assert_eq!(Stretch::parse("semi-condensed"), Some(Stretch::SEMI_CONDENSED));
    /// assert_eq!(Stretch::parse("80%"), Some(Stretch(0.8)));
    /// assert_eq!(Stretch::parse("wideload"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Some(match s {
            "ultra-condensed" => Self::ULTRA_CONDENSED,
            "extra-condensed" => Self::EXTRA_CONDENSED,
            "condensed" => Self::CONDENSED,
            "semi-condensed" => Self::SEMI_CONDENSED,
            "normal" => Self::NORMAL,
            "semi-expanded" => Self::SEMI_EXPANDED,
            "expanded" => Self::EXPANDED,
            "extra-expanded" => Self::EXTRA_EXPANDED,
            "ultra-expanded" => Self::ULTRA_EXPANDED,
            _ => {
                let p = s.strip_suffix('%')?.trim().parse::<f32>().ok()?;
                return Some(Self(p / 100.0));
            }
        })
    }
}

impl fmt::Display for Stretch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match *self {
            v if v == Self::ULTRA_CONDENSED => "ultra-condensed",
            v if v == Self::EXTRA_CONDENSED => "extra-condensed",
            v if v == Self::CONDENSED => "condensed",
            v if v == Self::SEMI_CONDENSED => "semi-condensed",
            v if v == Self::NORMAL => "normal",
            v if v == Self::SEMI_EXPANDED => "semi-expanded",
            v if v == Self::EXPANDED => "expanded",
            v if v == Self::EXTRA_EXPANDED => "extra-expanded",
            v if v == Self::ULTRA_EXPANDED => "ultra-expanded",
            _ => {
                return write!(f, "{}%", self.percentage());
            }
        };
        write!(f, "{keyword}")
    }
}

impl Default for Stretch {
    fn default() -> Self {
        Self::NORMAL
    }
}

/// Visual weight class of a font, on a scale from 1 to 1000.
///
/// The default value is [`Weight::NORMAL`] or `400`. Fractional values are
/// permitted (variable fonts may report these).
///
/// In CSS, this corresponds to the [`font-weight`] property.
///
/// [`font-weight`]: https://www.w3.org/TR/css-fonts-4/#font-weight-prop
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Weight(pub f32);

impl Weight {
    /// Weight value of 100.
    pub const THIN: Self = Self(100.0);

    /// Weight value of 200.
    pub const EXTRA_LIGHT: Self = Self(200.0);

    /// Weight value of 300.
    pub const LIGHT: Self = Self(300.0);

    /// Weight value of 400. This is the default value.
    pub const NORMAL: Self = Self(400.0);

    /// Weight value of 500.
    pub const MEDIUM: Self = Self(500.0);

    /// Weight value of 600.
    pub const SEMI_BOLD: Self = Self(600.0);

    /// Weight value of 700.
    pub const BOLD: Self = Self(700.0);

    /// Weight value of 800.
    pub const EXTRA_BOLD: Self = Self(800.0);

    /// Weight value of 900.
    pub const BLACK: Self = Self(900.0);

    /// Parses a CSS style font weight attribute.
    ///
    /// # Examples
    ///
    /// ```
    /// # use kas_fontscan::fonts::Weight;
    /// assert_eq!(Weight::parse("normal"), Some(Weight::NORMAL));
    /// assert_eq!(Weight::parse("bold"), Some(Weight::BOLD));
    /// assert_eq!(Weight::parse("850"), Some(Weight(850.0)));
    /// assert_eq!(Weight::parse("invalid"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Some(match s {
            "normal" => Self::NORMAL,
            "bold" => Self::BOLD,
            _ => Self(s.parse::<f32>().ok().filter(|w| (1.0..=1000.0).contains(w))?),
        })
    }
}

impl Default for Weight {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match *self {
            v if v == Self::THIN => "thin",
            v if v == Self::EXTRA_LIGHT => "extra-light",
            v if v == Self::LIGHT => "light",
            v if v == Self::NORMAL => "normal",
            v if v == Self::MEDIUM => "medium",
            v if v == Self::SEMI_BOLD => "semi-bold",
            v if v == Self::BOLD => "bold",
            v if v == Self::EXTRA_BOLD => "extra-bold",
            v if v == Self::BLACK => "black",
            _ => return write!(f, "{}", self.0),
        };
        write!(f, "{keyword}")
    }
}

/// Visual style or 'slope' of a font.
///
/// The default value is [`Style::Normal`].
///
/// In CSS, this corresponds to the [`font-style`] property.
///
/// [`font-style`]: https://www.w3.org/TR/css-fonts-4/#font-style-prop
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Style {
    /// An upright or "roman" style.
    #[default]
    Normal,
    /// Generally a slanted style, originally based on semi-cursive forms.
    /// This often has a different structure from the normal style.
    Italic,
    /// A typically-sloped version of the regular face.
    Oblique,
}

impl Style {
    /// Parses a font style from a CSS value.
    ///
    /// Oblique angles are accepted but discarded.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Some(match s {
            "normal" => Self::Normal,
            "italic" => Self::Italic,
            "oblique" => Self::Oblique,
            _ if s.starts_with("oblique ") => Self::Oblique,
            _ => return None,
        })
    }

    /// Fallback order when this style is requested but unavailable
    ///
    /// The first entry is always `self`.
    pub(crate) fn preference(self) -> [Style; 3] {
        match self {
            Style::Normal => [Style::Normal, Style::Oblique, Style::Italic],
            Style::Italic => [Style::Italic, Style::Oblique, Style::Normal],
            Style::Oblique => [Style::Oblique, Style::Italic, Style::Normal],
        }
    }

    pub(crate) fn to_tag(self) -> u8 {
        match self {
            Style::Normal => 1,
            Style::Italic => 2,
            Style::Oblique => 3,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            1 => Style::Normal,
            2 => Style::Italic,
            3 => Style::Oblique,
            _ => return None,
        })
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match *self {
            Self::Normal => "normal",
            Self::Italic => "italic",
            Self::Oblique => "oblique",
        };
        write!(f, "{value}")
    }
}

/// The visual variant of a face: style, weight and stretch
///
/// Faces which declare nothing are `Normal`, `400`, `1.0`.
#[derive(Copy, Clone, PartialEq, Default, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Aspect {
    #[cfg_attr(feature = "serde", serde(default))]
    pub style: Style,
    #[cfg_attr(feature = "serde", serde(default))]
    pub weight: Weight,
    #[cfg_attr(feature = "serde", serde(default))]
    pub stretch: Stretch,
}

impl Aspect {
    /// Construct
    #[inline]
    pub fn new(style: Style, weight: Weight, stretch: Stretch) -> Self {
        Aspect {
            style,
            weight,
            stretch,
        }
    }
}

impl fmt::Display for Aspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.style, self.weight, self.stretch)
    }
}

/// Font container format
///
/// This is informational: it is only used by the matcher to filter
/// (see [`FormatSet`]).
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Format {
    /// OpenType or TrueType, including collections and CFF outlines
    OpenType,
    /// PostScript Type 1
    Type1,
    /// Bitmap-only PCF
    Pcf,
}

impl Format {
    pub(crate) fn to_tag(self) -> u8 {
        match self {
            Format::OpenType => 1,
            Format::Type1 => 2,
            Format::Pcf => 3,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            1 => Format::OpenType,
            2 => Format::Type1,
            3 => Format::Pcf,
            _ => return None,
        })
    }
}

bitflags! {
    /// A set of [`Format`]s accepted by a query
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct FormatSet: u8 {
        const OPEN_TYPE = 1 << 0;
        const TYPE1 = 1 << 1;
        const PCF = 1 << 2;
    }
}

impl FormatSet {
    /// True if `format` is in the set
    #[inline]
    pub fn accepts(self, format: Format) -> bool {
        self.contains(format.into())
    }
}

impl Default for FormatSet {
    fn default() -> Self {
        FormatSet::all()
    }
}

impl From<Format> for FormatSet {
    fn from(format: Format) -> Self {
        match format {
            Format::OpenType => FormatSet::OPEN_TYPE,
            Format::Type1 => FormatSet::TYPE1,
            Format::Pcf => FormatSet::PCF,
        }
    }
}
