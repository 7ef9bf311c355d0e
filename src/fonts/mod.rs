// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Font discovery and selection
//!
//! Font files are summarized as [`Footprint`]s by an [`Introspector`] while
//! [scanning](Scanner) font directories; the result is an [`Index`]. Indexes
//! may be cached (see [`cache`]) and reused for as long as
//! [`check_freshness`] reports that the scanned directories are unchanged.
//!
//! Queries name one or more families. Each family is expanded into a
//! fallback chain by a [`Substitutor`], then the best faces are selected by
//! the [`selector`] according to the desired [`Aspect`]. The [`FontMap`]
//! ties these together.
//!
//! ### Family names
//!
//! Family names are compared after [normalization](normalize_family):
//! surrounding white-space is removed and letters are lower-cased.
//!
//! ### Aspect
//!
//! An [`Aspect`] describes a face's [`Style`], [`Weight`] and [`Stretch`].
//! These follow CSS conventions: weight is a value from 1 to 1000 with 400
//! being normal and 700 bold; stretch is a ratio where 1.0 is normal width.

mod attributes;
pub mod cache;
mod families;
mod footprint;
mod index;
mod introspect;
mod library;
mod reconcile;
mod scan;
pub mod selector;

pub use attributes::{Aspect, Format, FormatSet, Stretch, Style, Weight};
pub use cache::{CacheConfig, CacheError, DecodeError};
pub use families::{Expansion, FamilyTest, Rule, Substitutor};
pub use footprint::{normalize_family, Footprint, Location};
pub use index::{DirSignature, Index, RootDir};
pub use introspect::{FaceSummary, IntrospectError, Introspector, TtfIntrospector};
pub use library::{FontMap, FontMapConfig, LoadError, Query};
pub use reconcile::{check_freshness, Freshness, StaleReason};
pub use scan::{scan, CancelToken, Cancelled, ScanWarning, ScanWarningKind, Scanner};
pub use selector::{match_families, match_footprints, Candidate};
