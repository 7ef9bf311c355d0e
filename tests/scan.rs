// End-to-end: scan a directory, cache the index and query it

use kas_fontscan::fonts::{
    check_freshness, scan, Aspect, CacheConfig, FaceSummary, FontMap, FontMapConfig, Format,
    Freshness, IntrospectError, Introspector, Query, Stretch, Style, Weight,
};
use kas_fontscan::RuneSet;
use std::fs;
use std::path::Path;

/// Each line of a `.ttf` file describes a face: `family;style;weight;runes`
struct Fake;

impl Introspector for Fake {
    fn accepts(&self, path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == "ttf")
    }

    fn introspect(&self, data: &[u8]) -> Result<Vec<FaceSummary>, IntrospectError> {
        let text = std::str::from_utf8(data).map_err(|_| IntrospectError::Unsupported)?;
        let mut faces = Vec::new();
        for (face, line) in (0..).zip(text.lines()) {
            let mut fields = line.split(';');
            let (Some(family), Some(style), Some(weight), Some(runes)) =
                (fields.next(), fields.next(), fields.next(), fields.next())
            else {
                return Err(IntrospectError::Unsupported);
            };
            let style = Style::parse(style).ok_or(IntrospectError::Unsupported)?;
            let weight = Weight::parse(weight).ok_or(IntrospectError::Unsupported)?;
            let runes: RuneSet = runes.split(',').filter_map(|r| r.parse::<u32>().ok()).collect();
            faces.push(FaceSummary {
                family: family.to_string(),
                aspect: Aspect::new(style, weight, Stretch::NORMAL),
                runes,
                format: Format::OpenType,
                face,
            });
        }
        Ok(faces)
    }
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|name| name.to_str()).unwrap()
}

#[test]
fn scan_and_query() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.ttf"), "Test;normal;400;65,66").unwrap();
    fs::write(dir.path().join("b.ttf"), "Test;italic;700;67").unwrap();

    let (index, warnings) = scan(&[dir.path()], &Fake);
    assert!(warnings.is_empty());
    assert_eq!(index.len(), 2);

    let map = FontMap::from_index(index, Default::default());
    let query = Query::new("Test").aspect(Aspect::new(Style::Normal, Weight::NORMAL, Stretch::NORMAL));

    let result = map.query(&query);
    assert_eq!(result.len(), 1);
    assert_eq!(file_name(result[0].footprint.path()), "a.ttf");

    let result = map.query(&query.clone().rune('C'));
    assert_eq!(result.len(), 1);
    assert_eq!(file_name(result[0].footprint.path()), "b.ttf");

    assert!(map.query(&query.rune('D')).is_empty());
}

#[test]
fn cached_reload() {
    let fonts = tempfile::tempdir().unwrap();
    let cache_dir = tempfile::tempdir().unwrap();
    fs::write(fonts.path().join("a.ttf"), "Test;normal;400;65,66").unwrap();

    let cache = CacheConfig::new(cache_dir.path().join("nested").join("index.cache"));
    let config = FontMapConfig::new(vec![fonts.path().to_path_buf()]).with_cache(cache.clone());

    let (first, _) = FontMap::load(&config, &Fake).unwrap();
    let cached = cache.read().unwrap();
    assert_eq!(&cached, first.index());
    assert_eq!(check_freshness(&cached, &config.directories), Freshness::Fresh);

    let (second, warnings) = FontMap::load(&config, &Fake).unwrap();
    assert!(warnings.is_empty());
    assert_eq!(second.index(), first.index());
    assert_eq!(second.families(), vec!["test"]);
}
