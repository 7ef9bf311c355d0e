// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Font face matching
//!
//! Faces are matched following the
//! [CSS font matching algorithm](https://www.w3.org/TR/css-fonts-4/#font-style-matching):
//! the family chain is tried in order, then within a family candidates are
//! narrowed by stretch, then style, then weight.

use super::{normalize_family, Aspect, Footprint};
use smallvec::SmallVec;
use std::collections::HashMap;

/// A matched face
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate<'a> {
    pub footprint: &'a Footprint,
    /// Index of the matched family within the family chain
    pub family: usize,
}

type Group<'a> = SmallVec<[&'a Footprint; 4]>;

/// Group footprints by family chain entry, in chain order
///
/// Footprints not covering `rune` (if given) are excluded.
fn group<'a, S: AsRef<str>>(
    footprints: impl IntoIterator<Item = &'a Footprint>,
    chain: &[S],
    rune: Option<char>,
) -> Vec<Group<'a>> {
    let mut positions = HashMap::with_capacity(chain.len());
    for (i, family) in chain.iter().enumerate() {
        positions.entry(normalize_family(family.as_ref())).or_insert(i);
    }

    let mut groups = vec![Group::new(); chain.len()];
    for fp in footprints {
        if let Some(c) = rune {
            if !fp.runes().contains_char(c) {
                continue;
            }
        }
        if let Some(i) = positions.get(fp.family()) {
            groups[*i].push(fp);
        }
    }
    groups
}

/// Select the best footprints for `chain`, `aspect` and `rune`
///
/// Only footprints whose family is listed in `chain` and which cover `rune`
/// (if given) are considered. The first family in `chain` with any such
/// footprint wins regardless of aspect; within that family, all footprints
/// achieving the best score are returned in input order.
///
/// The result is empty if nothing matches.
pub fn match_footprints<'a, S: AsRef<str>>(
    footprints: impl IntoIterator<Item = &'a Footprint>,
    chain: &[S],
    aspect: Aspect,
    rune: Option<char>,
) -> Vec<Candidate<'a>> {
    group(footprints, chain, rune)
        .into_iter()
        .enumerate()
        .find(|(_, group)| !group.is_empty())
        .map(|(family, group)| candidates(family, group, aspect))
        .unwrap_or_default()
}

/// As [`match_footprints`], but yield the best footprints of every family
///
/// Results are ordered by family chain position.
pub fn match_families<'a, S: AsRef<str>>(
    footprints: impl IntoIterator<Item = &'a Footprint>,
    chain: &[S],
    aspect: Aspect,
    rune: Option<char>,
) -> Vec<Candidate<'a>> {
    group(footprints, chain, rune)
        .into_iter()
        .enumerate()
        .flat_map(|(family, group)| candidates(family, group, aspect))
        .collect()
}

fn candidates(family: usize, mut group: Group<'_>, aspect: Aspect) -> Vec<Candidate<'_>> {
    narrow(&mut group, aspect);
    group
        .into_iter()
        .map(|footprint| Candidate { footprint, family })
        .collect()
}

/// Retain only the best matches for `aspect`
///
/// Axes are applied in order: stretch, style, weight.
fn narrow(group: &mut Group<'_>, aspect: Aspect) {
    let stretches = group.iter().map(|fp| fp.aspect().stretch.0);
    if let Some(stretch) = best_stretch(aspect.stretch.0, stretches) {
        group.retain(|fp| fp.aspect().stretch.0 == stretch);
    }

    if let Some(style) = aspect
        .style
        .preference()
        .into_iter()
        .find(|style| group.iter().any(|fp| fp.aspect().style == *style))
    {
        group.retain(|fp| fp.aspect().style == style);
    }

    let weights = group.iter().map(|fp| fp.aspect().weight.0);
    if let Some(weight) = best_weight(aspect.weight.0, weights) {
        group.retain(|fp| fp.aspect().weight.0 == weight);
    }
}

/// Largest value `<= x`
fn at_most(values: impl Iterator<Item = f32>, x: f32) -> Option<f32> {
    values.filter(|v| *v <= x).fold(None, |m, v| Some(m.map_or(v, |m: f32| m.max(v))))
}

/// Smallest value `>= x`
fn at_least(values: impl Iterator<Item = f32>, x: f32) -> Option<f32> {
    values.filter(|v| *v >= x).fold(None, |m, v| Some(m.map_or(v, |m: f32| m.min(v))))
}

/// Best stretch ratio among `values` for `desired`
///
/// Narrower or normal requests search narrower first; wider requests search
/// wider first.
fn best_stretch(desired: f32, values: impl Iterator<Item = f32> + Clone) -> Option<f32> {
    if desired <= 1.0 {
        at_most(values.clone(), desired).or_else(|| at_least(values, desired))
    } else {
        at_least(values.clone(), desired).or_else(|| at_most(values, desired))
    }
}

/// Best weight among `values` for `desired`
///
/// Below 400, lighter weights are searched first; above 500, heavier weights
/// first. From 400 to 500, heavier weights up to 500 are searched, then
/// lighter weights, then weights above 500.
fn best_weight(desired: f32, values: impl Iterator<Item = f32> + Clone) -> Option<f32> {
    if desired < 400.0 {
        at_most(values.clone(), desired).or_else(|| at_least(values, desired))
    } else if desired <= 500.0 {
        at_least(values.clone().filter(|v| *v <= 500.0), desired)
            .or_else(|| at_most(values.clone(), desired))
            .or_else(|| at_least(values, desired))
    } else {
        at_least(values.clone(), desired).or_else(|| at_most(values, desired))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fonts::{Format, Location, Stretch, Style, Weight};
    use crate::RuneSet;

    fn fp(family: &str, style: Style, weight: f32, stretch: f32, path: &str) -> Footprint {
        Footprint::new(
            family,
            RuneSet::new([65]),
            Aspect::new(style, Weight(weight), Stretch(stretch)),
            Format::OpenType,
            Location::new(path, 0),
        )
    }

    fn paths(candidates: &[Candidate]) -> Vec<String> {
        candidates
            .iter()
            .map(|c| c.footprint.path().display().to_string())
            .collect()
    }

    fn aspect(style: Style, weight: f32, stretch: f32) -> Aspect {
        Aspect::new(style, Weight(weight), Stretch(stretch))
    }

    #[test]
    fn italic_prefers_oblique() {
        let list = [
            fp("F", Style::Normal, 700.0, 1.0, "normal-bold"),
            fp("F", Style::Oblique, 700.0, 1.0, "oblique-bold"),
        ];
        let result = match_footprints(&list, &["F"], aspect(Style::Italic, 800.0, 1.0), None);
        assert_eq!(paths(&result), ["oblique-bold"]);
    }

    #[test]
    fn style_fallback_order() {
        let normal = fp("F", Style::Normal, 400.0, 1.0, "normal");
        let italic = fp("F", Style::Italic, 400.0, 1.0, "italic");
        let oblique = fp("F", Style::Oblique, 400.0, 1.0, "oblique");
        let m = |list: &[Footprint], style| {
            paths(&match_footprints(list, &["F"], aspect(style, 400.0, 1.0), None))
        };

        assert_eq!(m(&[italic.clone(), oblique.clone()], Style::Normal), ["oblique"]);
        assert_eq!(m(&[normal.clone(), italic.clone()], Style::Oblique), ["italic"]);
        assert_eq!(m(&[normal.clone()], Style::Italic), ["normal"]);
    }

    #[test]
    fn weight_rules() {
        let pick = |desired: f32, weights: &[f32]| {
            best_weight(desired, weights.iter().copied())
        };
        assert_eq!(pick(400.0, &[300.0, 400.0, 500.0]), Some(400.0));
        assert_eq!(pick(450.0, &[300.0, 500.0, 600.0]), Some(500.0));
        assert_eq!(pick(450.0, &[300.0, 600.0]), Some(300.0));
        assert_eq!(pick(450.0, &[600.0, 700.0]), Some(600.0));
        assert_eq!(pick(400.0, &[350.0, 500.0]), Some(500.0));
        assert_eq!(pick(300.0, &[200.0, 400.0]), Some(200.0));
        assert_eq!(pick(300.0, &[400.0, 500.0]), Some(400.0));
        assert_eq!(pick(600.0, &[500.0, 800.0]), Some(800.0));
        assert_eq!(pick(600.0, &[400.0, 500.0]), Some(500.0));
        assert_eq!(pick(500.0, &[]), None);
    }

    #[test]
    fn stretch_rules() {
        let pick = |desired: f32, values: &[f32]| {
            best_stretch(desired, values.iter().copied())
        };
        assert_eq!(pick(1.0, &[0.875, 1.125]), Some(0.875));
        assert_eq!(pick(0.75, &[0.5, 1.0]), Some(0.5));
        assert_eq!(pick(0.75, &[1.0, 1.5]), Some(1.0));
        assert_eq!(pick(1.25, &[1.0, 1.5]), Some(1.5));
        assert_eq!(pick(1.25, &[0.5, 1.0]), Some(1.0));
    }

    #[test]
    fn stretch_dominates_style_and_weight() {
        let list = [
            fp("F", Style::Normal, 400.0, 0.5, "condensed-normal"),
            fp("F", Style::Italic, 900.0, 1.0, "normal-italic-black"),
        ];
        let result = match_footprints(&list, &["F"], aspect(Style::Normal, 400.0, 1.0), None);
        assert_eq!(paths(&result), ["normal-italic-black"]);
    }

    #[test]
    fn family_order_dominates() {
        let list = [
            fp("Second", Style::Normal, 400.0, 1.0, "exact"),
            fp("First", Style::Italic, 100.0, 2.0, "poor"),
        ];
        let want = aspect(Style::Normal, 400.0, 1.0);
        let result = match_footprints(&list, &["first", "Second"], want, None);
        assert_eq!(paths(&result), ["poor"]);
        assert_eq!(result[0].family, 0);

        let all = match_families(&list, &["first", "Second"], want, None);
        assert_eq!(paths(&all), ["poor", "exact"]);
        assert_eq!(all[1].family, 1);
    }

    #[test]
    fn ties_in_input_order() {
        let list = [
            fp("F", Style::Normal, 400.0, 1.0, "one"),
            fp("F", Style::Normal, 700.0, 1.0, "bold"),
            fp("F", Style::Normal, 400.0, 1.0, "two"),
        ];
        let result = match_footprints(&list, &["F"], Aspect::default(), None);
        assert_eq!(paths(&result), ["one", "two"]);
    }

    #[test]
    fn required_rune() {
        let list = [fp("F", Style::Normal, 400.0, 1.0, "a")];
        assert_eq!(
            match_footprints(&list, &["F"], Aspect::default(), Some('A')).len(),
            1
        );
        assert!(match_footprints(&list, &["F"], Aspect::default(), Some('B')).is_empty());
    }

    #[test]
    fn empty() {
        let list = [fp("F", Style::Normal, 400.0, 1.0, "a")];
        let none: [&str; 0] = [];
        assert!(match_footprints(&list, &none, Aspect::default(), None).is_empty());
        assert!(match_footprints(&list, &["G"], Aspect::default(), None).is_empty());
        let nothing: [Footprint; 0] = [];
        assert!(match_footprints(&nothing, &["F"], Aspect::default(), None).is_empty());
    }
}
