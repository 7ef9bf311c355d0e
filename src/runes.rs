// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Sets of Unicode scalar values

use std::cmp::Ordering;
use std::fmt;

/// The largest Unicode scalar value
pub const MAX_RUNE: u32 = 0x10FFFF;

/// log2 of the number of runes covered by one [`Page`]
const PAGE_SHIFT: u32 = 8;
const PAGE_MASK: u32 = (1 << PAGE_SHIFT) - 1;

/// The largest page key: `MAX_RUNE >> PAGE_SHIFT`
pub(crate) const MAX_PAGE_KEY: u16 = (MAX_RUNE >> PAGE_SHIFT) as u16;

/// A block of 256 consecutive runes stored as a bit field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Page {
    /// Index of the block: the rune's value shifted right by 8
    pub(crate) key: u16,
    /// Bit `i % 32` of word `i / 32` marks rune `(key << 8) + i`
    pub(crate) bits: [u32; 8],
}

impl Page {
    fn new(key: u16) -> Self {
        Page { key, bits: [0; 8] }
    }

    #[inline]
    fn contains(&self, low: u32) -> bool {
        self.bits[(low >> 5) as usize] & (1 << (low & 31)) != 0
    }

    #[inline]
    fn insert(&mut self, low: u32) {
        self.bits[(low >> 5) as usize] |= 1 << (low & 31);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.bits.iter().all(|w| *w == 0)
    }

    fn len(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }
}

/// A set of Unicode scalar values (runes)
///
/// Runes are stored in sparse 256-rune pages keyed by `rune >> 8`, kept
/// sorted by key and never empty. Sets covering contiguous ranges are thus
/// dense while a single outlying rune near `0x10FFFF` costs one page.
///
/// Equality is by content: construction order is irrelevant.
/// ```
/// # use kas_fontscan::RuneSet;
/// assert_eq!(RuneSet::new([1, 0, 2]), RuneSet::new([2, 1, 0, 0]));
/// ```
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct RuneSet {
    pages: Vec<Page>,
}

impl RuneSet {
    /// Construct from a list of runes
    ///
    /// Duplicates are merged. Values above [`MAX_RUNE`] are ignored.
    pub fn new(runes: impl IntoIterator<Item = u32>) -> Self {
        let mut set = RuneSet::default();
        for rune in runes {
            set.insert(rune);
        }
        set
    }

    /// Construct from validated pages
    ///
    /// Returns `None` unless keys are strictly increasing and in range, and
    /// no page is empty.
    pub(crate) fn from_pages(pages: Vec<Page>) -> Option<Self> {
        let mut last = None;
        for page in &pages {
            if page.key > MAX_PAGE_KEY || page.is_empty() || last >= Some(page.key) {
                return None;
            }
            last = Some(page.key);
        }
        Some(RuneSet { pages })
    }

    pub(crate) fn pages(&self) -> &[Page] {
        &self.pages
    }

    fn insert(&mut self, rune: u32) {
        if rune > MAX_RUNE {
            return;
        }
        let key = (rune >> PAGE_SHIFT) as u16;
        let low = rune & PAGE_MASK;

        // Font coverage is typically supplied in ascending order
        if let Some(page) = self.pages.last_mut() {
            if page.key == key {
                page.insert(low);
                return;
            }
        }

        let index = match self.pages.binary_search_by_key(&key, |p| p.key) {
            Ok(index) => index,
            Err(index) => {
                self.pages.insert(index, Page::new(key));
                index
            }
        };
        self.pages[index].insert(low);
    }

    /// True if `rune` is in the set
    pub fn contains(&self, rune: u32) -> bool {
        if rune > MAX_RUNE {
            return false;
        }
        let key = (rune >> PAGE_SHIFT) as u16;
        match self.pages.binary_search_by_key(&key, |p| p.key) {
            Ok(index) => self.pages[index].contains(rune & PAGE_MASK),
            Err(_) => false,
        }
    }

    /// True if `c` is in the set
    #[inline]
    pub fn contains_char(&self, c: char) -> bool {
        self.contains(u32::from(c))
    }

    /// Construct the union of `self` and `other`
    pub fn union(&self, other: &RuneSet) -> RuneSet {
        let (a, b) = (&self.pages, &other.pages);
        let mut pages = Vec::with_capacity(a.len().max(b.len()));
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].key.cmp(&b[j].key) {
                Ordering::Less => {
                    pages.push(a[i]);
                    i += 1;
                }
                Ordering::Greater => {
                    pages.push(b[j]);
                    j += 1;
                }
                Ordering::Equal => {
                    let mut page = a[i];
                    for (w, v) in page.bits.iter_mut().zip(b[j].bits.iter()) {
                        *w |= *v;
                    }
                    pages.push(page);
                    i += 1;
                    j += 1;
                }
            }
        }
        pages.extend_from_slice(&a[i..]);
        pages.extend_from_slice(&b[j..]);
        RuneSet { pages }
    }

    /// Number of runes in the set
    pub fn len(&self) -> usize {
        self.pages.iter().map(Page::len).sum()
    }

    /// True if the set is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Iterate over runes in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.iter().flat_map(|page| {
            let base = u32::from(page.key) << PAGE_SHIFT;
            (0..=PAGE_MASK)
                .filter(move |low| page.contains(*low))
                .map(move |low| base + low)
        })
    }
}

impl FromIterator<u32> for RuneSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        RuneSet::new(iter)
    }
}

impl FromIterator<char> for RuneSet {
    fn from_iter<I: IntoIterator<Item = char>>(iter: I) -> Self {
        RuneSet::new(iter.into_iter().map(u32::from))
    }
}

impl fmt::Debug for RuneSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Print as ranges: full coverage tables are too long to be useful
        let mut list = f.debug_list();
        let mut iter = self.iter().peekable();
        while let Some(start) = iter.next() {
            let mut end = start;
            while iter.peek() == Some(&(end + 1)) {
                end += 1;
                iter.next();
            }
            if start == end {
                list.entry(&format_args!("{start:#x}"));
            } else {
                list.entry(&format_args!("{start:#x}..={end:#x}"));
            }
        }
        list.finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn order_independent() {
        assert_eq!(RuneSet::new([1, 0, 2]), RuneSet::new([2, 1, 0]));
        assert_eq!(RuneSet::new([1, 0, 2, 0]), RuneSet::new([1, 0, 2]));
        assert_eq!(
            RuneSet::new([0xfffee, 1, 0x789]),
            RuneSet::new([0x789, 0xfffee, 1])
        );
    }

    #[test]
    fn zero_is_a_member() {
        let set = RuneSet::new([0]);
        assert!(set.contains(0));
        assert!(!set.contains(1));
        assert_eq!(set.len(), 1);
        assert!(!RuneSet::default().contains(0));
    }

    #[test]
    fn extremes() {
        let set = RuneSet::new([0, MAX_RUNE, MAX_RUNE + 1, u32::MAX]);
        assert!(set.contains(0));
        assert!(set.contains(MAX_RUNE));
        assert!(!set.contains(MAX_RUNE + 1));
        assert_eq!(set.len(), 2);
        assert_eq!(set.pages().len(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, MAX_RUNE]);
    }

    #[test]
    fn sparse_pages() {
        let set = RuneSet::new([1, 0x789, 0xfffee]);
        assert_eq!(set.pages().len(), 3);
        assert!(set.contains(0x789));
        assert!(!set.contains(0x788));
        assert!(set.contains_char('\u{fffee}'));

        let dense: RuneSet = ('a'..='z').collect();
        assert_eq!(dense.pages().len(), 1);
        assert_eq!(dense.len(), 26);
    }

    #[test]
    fn union() {
        let a = RuneSet::new([65, 66, 0x10000]);
        let b = RuneSet::new([66, 67, 0x789]);
        let u = a.union(&b);
        assert_eq!(u, RuneSet::new([65, 66, 67, 0x789, 0x10000]));
        // inputs unchanged
        assert_eq!(a.len(), 3);
        assert_eq!(b.len(), 3);
        assert_eq!(a.union(&RuneSet::default()), a);
        assert_eq!(RuneSet::default().union(&b), b);
    }

    #[test]
    fn from_pages_validates() {
        let set = RuneSet::new([3, 0x300]);
        assert_eq!(RuneSet::from_pages(set.pages().to_vec()), Some(set.clone()));

        let mut reversed = set.pages().to_vec();
        reversed.reverse();
        assert_eq!(RuneSet::from_pages(reversed), None);
        assert_eq!(RuneSet::from_pages(vec![Page::new(0)]), None);
        let mut big = Page::new(MAX_PAGE_KEY + 1);
        big.insert(0);
        assert_eq!(RuneSet::from_pages(vec![big]), None);
    }

    #[test]
    fn debug_ranges() {
        let set = RuneSet::new([65, 66, 67, 0x789]);
        assert_eq!(format!("{set:?}"), "[0x41..=0x43, 0x789]");
    }
}
