// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Family substitution
//!
//! A requested family is expanded into a fallback chain by a fixed,
//! priority-ordered list of [`Rule`]s, each applied once. The built-in table
//! (see [`Substitutor::default`]) maps common proprietary families to
//! metric-compatible replacements and generic families (`serif`,
//! `sans-serif`, ...) to preferred concrete families.
//!
//! NOTE: the generic lists were put together quickly by a non-expert, and
//! with very limited testing, thus may have significant defects.
//!
//! Fonts are chosen based on the following criteria:
//!
//! 1.  Included by default with at least one recent operating system
//! 2.  Appearance, both quality and being fairly standard
//!
//! Font family ordering indicates usage preference.

use super::normalize_family;
use std::collections::HashSet;

const DEFAULT_SERIF: [&str; 11] = [
    "Palatino Linotype",
    "Palatino",
    "Georgia",
    "Droid Serif",
    "Hoefler Text",
    "Times New Roman",
    "Times",
    "Times CY",
    "DejaVu Serif",
    "Jomolhari",
    "Liberation Serif",
];

const DEFAULT_SANS_SERIF: [&str; 15] = [
    "Tahoma",
    "Noto Sans",
    "DejaVu Sans",
    "Open Sans",
    "Droid Sans",
    "Arial",
    "Arial Hebrew",
    "Verdana",
    "Cantarell",
    "Vera Sans",
    "Roboto",
    "Lato",
    "Liberation Sans",
    "Helvetica",
    "Lucida Sans Unicode",
];

const DEFAULT_MONOSPACE: [&str; 17] = [
    "Consolas",
    "Droid Sans Mono",
    "Menlo",
    "Noto Mono",
    "Noto Sans Mono",
    "DejaVu Sans Mono",
    "Roboto Mono",
    "Monaco",
    "Monaco CY",
    "Source Code Pro",
    "Source Sans Pro",
    "Andalé Mono",
    "Andale Mono",
    "Lucida Console",
    "Liberation Mono",
    "Courier New",
    "Courier",
];

const DEFAULT_CURSIVE: [&str; 4] = ["Gabriola", "Segoe Script", "Candara", "Comic Sans MS"];

const DEFAULT_FANTASY: [&str; 4] = ["Segoe Print", "Impact", "Apple Chancery", "Papyrus"];

/// Test applied by a [`Rule`] to a (normalized) family name
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FamilyTest {
    /// The family equals this name
    Equals(String),
    /// The family contains this fragment
    Contains(String),
    /// Any family
    Any,
}

impl FamilyTest {
    /// Match a family equal to `name` (normalized here)
    pub fn equals(name: &str) -> Self {
        FamilyTest::Equals(normalize_family(name))
    }

    /// Match a family containing `fragment` (normalized here)
    pub fn contains(fragment: &str) -> Self {
        FamilyTest::Contains(normalize_family(fragment))
    }

    /// Test a normalized family name
    pub fn matches(&self, family: &str) -> bool {
        match self {
            FamilyTest::Equals(name) => family == name,
            FamilyTest::Contains(fragment) => family.contains(fragment.as_str()),
            FamilyTest::Any => true,
        }
    }
}

/// A substitution rule: families passing `test` are followed by `additions`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    pub test: FamilyTest,
    pub additions: Vec<String>,
}

impl Rule {
    /// Construct
    pub fn new<S: Into<String>>(test: FamilyTest, additions: impl IntoIterator<Item = S>) -> Self {
        Rule {
            test,
            additions: additions.into_iter().map(|s| s.into()).collect(),
        }
    }
}

/// Expands family names into fallback chains
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Substitutor {
    rules: Vec<Rule>,
}

impl Default for Substitutor {
    /// Construct with the built-in rule table
    ///
    /// Aliases come first, then generic family expansions. Every chain ends
    /// with the `sans-serif` expansion.
    fn default() -> Self {
        let equals = FamilyTest::equals;
        Substitutor::new(vec![
            Rule::new(equals("Arial"), ["Arimo", "Liberation Sans", "Helvetica"]),
            Rule::new(equals("Helvetica"), ["Arial", "Arimo", "Liberation Sans"]),
            Rule::new(equals("Times New Roman"), ["Tinos", "Liberation Serif", "Times"]),
            Rule::new(equals("Times"), ["Times New Roman", "Tinos", "Liberation Serif"]),
            Rule::new(equals("Courier New"), ["Cousine", "Liberation Mono", "Courier"]),
            Rule::new(equals("Courier"), ["Courier New", "Cousine", "Liberation Mono"]),
            Rule::new(equals("Calibri"), ["Carlito"]),
            Rule::new(equals("Cambria"), ["Caladea"]),
            Rule::new(equals("system-ui"), ["sans-serif"]),
            Rule::new(FamilyTest::contains("mono"), ["monospace"]),
            Rule::new(equals("serif"), DEFAULT_SERIF),
            Rule::new(equals("monospace"), DEFAULT_MONOSPACE),
            Rule::new(equals("cursive"), DEFAULT_CURSIVE),
            Rule::new(equals("fantasy"), DEFAULT_FANTASY),
            // Must precede the sans-serif expansion
            Rule::new(FamilyTest::Any, ["sans-serif"]),
            Rule::new(equals("sans-serif"), DEFAULT_SANS_SERIF),
        ])
    }
}

impl Substitutor {
    /// Construct with the given rules, highest priority first
    pub fn new(rules: Vec<Rule>) -> Self {
        Substitutor { rules }
    }

    /// Construct with no rules: chains contain only the requested family
    pub fn empty() -> Self {
        Substitutor { rules: vec![] }
    }

    #[inline]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Lazily expand `family` into its fallback chain
    ///
    /// See [`Substitutor::expand`].
    pub fn expand_iter(&self, family: &str) -> Expansion<'_> {
        let mut seen = HashSet::new();
        seen.insert(normalize_family(family));
        Expansion {
            rules: self.rules.iter(),
            families: vec![family.trim().to_string()],
            seen,
            emitted: 0,
        }
    }

    /// Expand `family` into its fallback chain
    ///
    /// The chain starts with `family`. Rules are applied once each, in
    /// priority order: a rule whose test matches any family already in the
    /// chain appends its additions, skipping any family already present
    /// (compared after normalization). A family added by a rule is tested
    /// only against later rules, thus the result is finite even with cyclic
    /// rules.
    ///
    /// ```
    /// # use kas_fontscan::fonts::{FamilyTest, Rule, Substitutor};
    /// let subs = Substitutor::new(vec![
    ///     Rule::new(FamilyTest::equals("Arial"), ["Arimo"]),
    ///     Rule::new(FamilyTest::equals("Arimo"), ["sans-serif"]),
    ///     Rule::new(FamilyTest::equals("sans-serif"), ["DejaVu Sans", "Verdana"]),
    /// ]);
    /// assert_eq!(
    ///     subs.expand("Arial"),
    ///     ["Arial", "Arimo", "sans-serif", "DejaVu Sans", "Verdana"]
    /// );
    /// ```
    pub fn expand(&self, family: &str) -> Vec<String> {
        self.expand_iter(family).collect()
    }

    /// Expand each of `families` and concatenate the chains
    ///
    /// Families already present from an earlier chain are skipped.
    pub fn expand_all<S: AsRef<str>>(&self, families: &[S]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut chain = Vec::new();
        for family in families {
            for name in self.expand_iter(family.as_ref()) {
                if seen.insert(normalize_family(&name)) {
                    chain.push(name);
                }
            }
        }
        chain
    }
}

/// Iterator over a fallback chain
///
/// Constructed by [`Substitutor::expand_iter`]. Rules are applied only as far
/// as needed to yield the next item.
pub struct Expansion<'a> {
    /// Rules not yet applied
    rules: std::slice::Iter<'a, Rule>,
    /// The chain so far
    families: Vec<String>,
    /// Normalized names of all entries of `families`
    seen: HashSet<String>,
    emitted: usize,
}

impl<'a> Expansion<'a> {
    fn apply(&mut self, rule: &Rule) {
        if !self.seen.iter().any(|family| rule.test.matches(family)) {
            return;
        }
        for addition in &rule.additions {
            if self.seen.insert(normalize_family(addition)) {
                self.families.push(addition.clone());
            }
        }
    }
}

impl<'a> Iterator for Expansion<'a> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while self.emitted == self.families.len() {
            let rule = self.rules.next()?;
            self.apply(rule);
        }
        let item = self.families[self.emitted].clone();
        self.emitted += 1;
        Some(item)
    }
}

impl<'a> std::iter::FusedIterator for Expansion<'a> {}
