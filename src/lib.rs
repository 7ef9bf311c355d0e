// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! KAS font scanning library
//!
//! Builds an index of the font faces installed on a system and selects faces
//! for a requested family, aspect and character.
//!
//! ```no_run
//! use kas_fontscan::fonts::{CacheConfig, FontMap, FontMapConfig, Query, TtfIntrospector};
//!
//! let mut config = FontMapConfig::default();
//! config.cache = CacheConfig::default_location("my-app");
//! let (map, _warnings) = FontMap::load(&config, &TtfIntrospector).unwrap();
//! for candidate in map.query(&Query::new("serif").rune('é')) {
//!     println!("{}", candidate.footprint.path().display());
//! }
//! ```

mod conv;
pub mod fonts;

mod runes;
pub use runes::{RuneSet, MAX_RUNE};
