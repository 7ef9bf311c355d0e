// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Persistence of the font index
//!
//! ### Layout
//!
//! All integers are little-endian. Strings and paths are a `u32` byte length
//! followed by the bytes.
//!
//! ```none
//! header:    magic "KFSI" | version: u32 | root count: u32 | footprint count: u32
//! root:      path | has signature: u8
//!            | [file count: u32 | total size: u64 | latest modified: u64]
//! footprint: family | style: u8 | weight: f32 | stretch: f32 | format: u8
//!            | page count: u32 | pages | path | face index: u32
//! page:      key: u16 | bits: [u32; 8]
//! ```

use super::{Aspect, DirSignature, Footprint, Format, Index, Location, RootDir, Style};
use super::{Stretch, Weight};
use crate::conv::{path_from_bytes, path_to_bytes, to_u32, to_usize};
use crate::runes::{Page, RuneSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const MAGIC: [u8; 4] = *b"KFSI";

/// Version of the cache layout
///
/// Bump whenever the layout or the meaning of any field changes.
pub const CACHE_VERSION: u32 = 2;

/// Bytes of a [`Page`]
const PAGE_LEN: usize = 2 + 8 * 4;

/// Malformed index cache
///
/// The cache should be discarded and the index rebuilt.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("not an index cache")]
    BadMagic,
    #[error("unknown cache version {0}")]
    UnknownVersion(u32),
    #[error("truncated at byte {offset}: {needed} more bytes required")]
    Truncated { offset: usize, needed: usize },
    #[error("invalid UTF-8 in family name")]
    InvalidUtf8,
    #[error("invalid path")]
    InvalidPath,
    #[error("invalid flag {0}")]
    InvalidFlag(u8),
    #[error("invalid style tag {0}")]
    InvalidStyle(u8),
    #[error("invalid format tag {0}")]
    InvalidFormat(u8),
    #[error("invalid rune page at key {0:#x}")]
    InvalidBlock(u16),
    #[error("{0} unexpected trailing bytes")]
    TrailingBytes(usize),
}

impl DecodeError {
    /// True if the data was written by a different (known or unknown)
    /// version of the layout
    pub fn is_version_mismatch(&self) -> bool {
        matches!(self, DecodeError::UnknownVersion(_))
    }
}

/// Failure to read the index cache file
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache read error: {0}")]
    Io(#[from] io::Error),
    #[error("cache decode error: {0}")]
    Decode(#[from] DecodeError),
}

struct Writer(Vec<u8>);

impl Writer {
    fn u8(&mut self, x: u8) {
        self.0.push(x);
    }
    fn u16(&mut self, x: u16) {
        self.0.extend_from_slice(&x.to_le_bytes());
    }
    fn u32(&mut self, x: u32) {
        self.0.extend_from_slice(&x.to_le_bytes());
    }
    fn u64(&mut self, x: u64) {
        self.0.extend_from_slice(&x.to_le_bytes());
    }
    fn f32(&mut self, x: f32) {
        self.u32(x.to_bits());
    }
    fn bytes(&mut self, bytes: &[u8]) {
        self.u32(to_u32(bytes.len()));
        self.0.extend_from_slice(bytes);
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining() {
            return Err(DecodeError::Truncated {
                offset: self.pos,
                needed: n - self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut array = [0; N];
        array.copy_from_slice(self.take(N)?);
        Ok(array)
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.array::<1>()?[0])
    }
    fn u16(&mut self) -> Result<u16, DecodeError> {
        self.array().map(u16::from_le_bytes)
    }
    fn u32(&mut self) -> Result<u32, DecodeError> {
        self.array().map(u32::from_le_bytes)
    }
    fn u64(&mut self) -> Result<u64, DecodeError> {
        self.array().map(u64::from_le_bytes)
    }
    fn f32(&mut self) -> Result<f32, DecodeError> {
        self.u32().map(f32::from_bits)
    }
    fn bytes(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = to_usize(self.u32()?);
        self.take(len)
    }
    fn path(&mut self) -> Result<PathBuf, DecodeError> {
        path_from_bytes(self.bytes()?).ok_or(DecodeError::InvalidPath)
    }

    /// Capacity to reserve for `count` records of at least `min_len` bytes
    ///
    /// Limits allocation when a corrupt count is read.
    fn capacity(&self, count: u32, min_len: usize) -> usize {
        to_usize(count).min(self.remaining() / min_len)
    }
}

/// Serialize an index
pub fn encode(index: &Index) -> Vec<u8> {
    let mut w = Writer(Vec::with_capacity(64 + index.len() * 256));
    w.0.extend_from_slice(&MAGIC);
    w.u32(CACHE_VERSION);
    w.u32(to_u32(index.roots().len()));
    w.u32(to_u32(index.len()));

    for root in index.roots() {
        w.bytes(&path_to_bytes(&root.path));
        match root.signature {
            Some(sig) => {
                w.u8(1);
                w.u32(sig.file_count);
                w.u64(sig.total_size);
                w.u64(sig.latest_modified);
            }
            None => w.u8(0),
        }
    }

    for fp in index.footprints() {
        w.bytes(fp.display_family().as_bytes());
        let aspect = fp.aspect();
        w.u8(aspect.style.to_tag());
        w.f32(aspect.weight.0);
        w.f32(aspect.stretch.0);
        w.u8(fp.format().to_tag());

        let pages = fp.runes().pages();
        w.u32(to_u32(pages.len()));
        for page in pages {
            w.u16(page.key);
            for word in page.bits {
                w.u32(word);
            }
        }

        w.bytes(&path_to_bytes(fp.path()));
        w.u32(fp.location().face);
    }

    w.0
}

/// Deserialize an index
///
/// Never panics: malformed input of any kind yields an error.
pub fn decode(data: &[u8]) -> Result<Index, DecodeError> {
    let mut r = Reader { data, pos: 0 };
    if r.array::<4>().ok() != Some(MAGIC) {
        return Err(DecodeError::BadMagic);
    }
    let version = r.u32()?;
    if version != CACHE_VERSION {
        return Err(DecodeError::UnknownVersion(version));
    }
    let root_count = r.u32()?;
    let footprint_count = r.u32()?;

    let mut roots = Vec::with_capacity(r.capacity(root_count, 5));
    for _ in 0..root_count {
        let path = r.path()?;
        let signature = match r.u8()? {
            0 => None,
            1 => Some(DirSignature {
                file_count: r.u32()?,
                total_size: r.u64()?,
                latest_modified: r.u64()?,
            }),
            flag => return Err(DecodeError::InvalidFlag(flag)),
        };
        roots.push(RootDir { path, signature });
    }

    let mut footprints = Vec::with_capacity(r.capacity(footprint_count, 22));
    for _ in 0..footprint_count {
        footprints.push(decode_footprint(&mut r)?);
    }

    if r.remaining() > 0 {
        return Err(DecodeError::TrailingBytes(r.remaining()));
    }
    Ok(Index::new(roots, footprints))
}

fn decode_footprint(r: &mut Reader) -> Result<Footprint, DecodeError> {
    let family = std::str::from_utf8(r.bytes()?).map_err(|_| DecodeError::InvalidUtf8)?;
    let tag = r.u8()?;
    let style = Style::from_tag(tag).ok_or(DecodeError::InvalidStyle(tag))?;
    let aspect = Aspect {
        style,
        weight: Weight(r.f32()?),
        stretch: Stretch(r.f32()?),
    };
    let tag = r.u8()?;
    let format = Format::from_tag(tag).ok_or(DecodeError::InvalidFormat(tag))?;

    let page_count = r.u32()?;
    let mut pages = Vec::with_capacity(r.capacity(page_count, PAGE_LEN));
    for _ in 0..page_count {
        let key = r.u16()?;
        let mut bits = [0; 8];
        for word in &mut bits {
            *word = r.u32()?;
        }
        pages.push(Page { key, bits });
    }
    let bad_key = pages.last().map(|page| page.key).unwrap_or(0);
    let runes = RuneSet::from_pages(pages).ok_or(DecodeError::InvalidBlock(bad_key))?;

    let path = r.path()?;
    let face = r.u32()?;
    Ok(Footprint::new(
        family,
        runes,
        aspect,
        format,
        Location { path, face },
    ))
}

/// Location of the index cache file
///
/// There is no coordination between processes: the last writer wins. This is
/// harmless since a lost or corrupt cache only costs a rescan.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CacheConfig {
    pub path: PathBuf,
}

impl CacheConfig {
    /// Construct
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CacheConfig { path: path.into() }
    }

    /// Use the platform cache directory
    ///
    /// The file is `<cache dir>/<app>/font-index.cache`. Returns `None` when
    /// the platform has no cache directory.
    pub fn default_location(app: &str) -> Option<Self> {
        dirs::cache_dir().map(|dir| CacheConfig::new(dir.join(app).join("font-index.cache")))
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decode the cache file
    pub fn read(&self) -> Result<Index, CacheError> {
        let data = fs::read(&self.path)?;
        Ok(decode(&data)?)
    }

    /// Encode and write `index` to the cache file
    ///
    /// The file is written to a temporary sibling then renamed into place,
    /// so readers never observe a partial file.
    pub fn write(&self, index: &Index) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp = self.path.with_extension("tmp");
        fs::write(&temp, encode(index))?;
        fs::rename(&temp, &self.path)
    }
}
