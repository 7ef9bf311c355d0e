// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Type conversion utilities
//!
//! Counts and lengths are persisted as `u32` in the index cache in order to
//! keep the layout fixed-width across platforms (we do not expect `usize`
//! smaller than `u32`, and a font index never approaches `u32::MAX` entries
//! or bytes per string, so `u32` is always an appropriate length type).

use easy_cast::Cast;
use std::path::{Path, PathBuf};

/// Convert `usize` → `u32`
///
/// This is a "safer" wrapper around `as` ensuring (on debug builds) that the
/// input value may be represented correctly by `u32`.
#[inline]
pub fn to_u32(x: usize) -> u32 {
    x.cast()
}

/// Convert `u32` → `usize`
///
/// This is a "safer" wrapper around `as` ensuring that the operation is
/// zero-extension.
#[inline]
pub fn to_usize(x: u32) -> usize {
    x.cast()
}

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        /// Raw bytes of a path, losslessly
        pub(crate) fn path_to_bytes(path: &Path) -> std::borrow::Cow<'_, [u8]> {
            use std::os::unix::ffi::OsStrExt;
            path.as_os_str().as_bytes().into()
        }

        /// Inverse of [`path_to_bytes`]
        pub(crate) fn path_from_bytes(bytes: &[u8]) -> Option<PathBuf> {
            use std::os::unix::ffi::OsStrExt;
            Some(std::ffi::OsStr::from_bytes(bytes).into())
        }
    } else {
        /// Bytes of a path as UTF-8
        ///
        /// Paths which are not valid Unicode are stored lossily; such entries
        /// fail to match on reload and are rescanned.
        pub(crate) fn path_to_bytes(path: &Path) -> std::borrow::Cow<'_, [u8]> {
            match path.to_string_lossy() {
                std::borrow::Cow::Borrowed(s) => s.as_bytes().into(),
                std::borrow::Cow::Owned(s) => s.into_bytes().into(),
            }
        }

        /// Inverse of [`path_to_bytes`]
        pub(crate) fn path_from_bytes(bytes: &[u8]) -> Option<PathBuf> {
            std::str::from_utf8(bytes).ok().map(PathBuf::from)
        }
    }
}
