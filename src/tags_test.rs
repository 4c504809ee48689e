use std::path::Path;

use crate::tags::*;
use crate::testing;

#[test]
fn test_value_display() {
    assert_eq!(Value::from("abc").to_string(), "abc");
    assert_eq!(Value::Int(-7).to_string(), "-7");
    assert_eq!(Value::Float(3.0).to_string(), "3.0");
    assert_eq!(Value::Float(-2.5).to_string(), "-2.5");
    assert_eq!(Value::Float(0.1).to_string(), "0.1");
}

#[test]
fn test_float_repr_switches_to_exponent() {
    assert_eq!(float_repr(0.0001), "0.0001");
    assert_eq!(float_repr(0.00001), "1e-05");
    assert_eq!(float_repr(1.5e-7), "1.5e-07");
    assert_eq!(float_repr(123456789.0), "123456789.0");
    assert_eq!(float_repr(1e16), "1e+16");
    assert_eq!(float_repr(0.0), "0.0");
    assert_eq!(float_repr(f64::INFINITY), "inf");
}

#[test]
fn test_value_is_empty() {
    assert!(Value::from("").is_empty());
    assert!(!Value::from(" ").is_empty());
    assert!(!Value::Int(0).is_empty());
    assert!(!Value::Float(0.0).is_empty());
}

#[test]
fn test_value_repr() {
    assert_eq!(Value::from("ab").repr(false), "'ab'");
    assert_eq!(Value::from("it's").repr(false), "\"it's\"");
    assert_eq!(Value::from("a\nb").repr(false), "'a\\nb'");
    assert_eq!(Value::from("ü€").repr(true), "'\\xfc\\u20ac'");
    assert_eq!(Value::Int(3).repr(false), "3");
}

#[test]
fn test_tagmap_is_case_insensitive() {
    let mut tags = TagMap::new();
    tags.insert("Title", "Song");
    assert_eq!(tags.get("title"), Some(&Value::from("Song")));
    assert_eq!(tags.get("TITLE"), Some(&Value::from("Song")));
    assert!(tags.contains_key("tItLe"));
    assert!(tags.contains("title"));

    tags.insert("TITLE", "Other");
    assert_eq!(tags.len(), 1);
    assert_eq!(tags.remove("title"), Some(Value::from("Other")));
    assert!(tags.is_empty());
}

#[test]
fn test_tagmap_missing_is_distinct_from_empty() {
    let tags = testing::tags([("album", "")]);
    assert_eq!(tags.lookup("album"), Some(&Value::from("")));
    assert_eq!(tags.lookup("artist"), None);
}

#[test]
fn test_tagmap_preserves_insertion_order() {
    let mut tags = testing::tags([("b", 1), ("a", 2), ("c", 3)]);
    tags.remove("a");
    tags.insert("d", 4);
    assert_eq!(tags.keys().collect::<Vec<_>>(), vec!["B", "C", "D"]);
}

#[test]
fn test_tagmap_display() {
    let mut tags = TagMap::new();
    tags.insert("title", "x");
    tags.insert("track", 3);
    assert_eq!(tags.to_string(), "{'TITLE': 'x', 'TRACK': 3}");
}

#[test]
fn test_tagmap_from_json() {
    let tags = TagMap::from_json(r#"{"title": "x", "track": 3, "gain": -1.5}"#).unwrap();
    assert_eq!(tags.get("title"), Some(&Value::from("x")));
    assert_eq!(tags.get("track"), Some(&Value::Int(3)));
    assert_eq!(tags.get("gain"), Some(&Value::Float(-1.5)));
    assert!(TagMap::from_json("[1, 2]").is_err());
}

#[test]
fn test_tagmap_serializes_as_plain_map() {
    let tags = testing::tags([("album", "A")]);
    assert_eq!(serde_json::to_string(&tags).unwrap(), r#"{"ALBUM":"A"}"#);
}

#[test]
fn test_tagmap_update_overwrites() {
    let mut tags = testing::tags([("album", "A"), ("title", "T")]);
    tags.update(&testing::tags([("TITLE", "U"), ("disc", "1")]));
    assert_eq!(tags.to_string(), "{'ALBUM': 'A', 'TITLE': 'U', 'DISC': '1'}");
}

#[test]
fn test_insert_probed_composer() {
    testing::init();
    let mut tags = TagMap::new();
    tags.insert_probed("composer", "Johann Sebastian Bach");
    assert_eq!(tags.get("composer"), Some(&Value::from("Johann Sebastian Bach")));
    assert_eq!(tags.get("composerfirstnames"), Some(&Value::from("Johann Sebastian")));
    assert_eq!(tags.get("composerlastname"), Some(&Value::from("Bach")));
    assert_eq!(tags.get("composerinitials"), Some(&Value::from("JS")));

    let mut tags = TagMap::new();
    tags.insert_probed("composer", "Prince");
    assert_eq!(tags.len(), 1);
}

#[test]
fn test_insert_probed_artist_the() {
    let mut tags = TagMap::new();
    tags.insert_probed("artist", "The Beatles");
    tags.insert_probed("album_artist", "Radiohead");
    assert_eq!(tags.get("artist_the"), Some(&Value::from("Beatles, The")));
    assert_eq!(tags.get("album_artist_the"), Some(&Value::from("Radiohead")));

    let mut tags = TagMap::new();
    tags.insert_probed("artist", "THE Who");
    assert_eq!(tags.get("artist_the"), Some(&Value::from("Who, THE")));
}

#[test]
fn test_insert_probed_splits_totals() {
    let mut tags = TagMap::new();
    tags.insert_probed("track", "3/12");
    tags.insert_probed("disc", "1");
    assert_eq!(tags.get("track"), Some(&Value::from("3")));
    assert_eq!(tags.get("tracktotal"), Some(&Value::from("12")));
    assert_eq!(tags.get("disc"), Some(&Value::from("1")));
    assert!(!tags.contains_key("disctotal"));
}

#[test]
fn test_fill_title_from_path() {
    let mut tags = TagMap::new();
    tags.fill_title_from_path(Path::new("/music/01 - Song.flac"));
    assert_eq!(tags.get("title"), Some(&Value::from("01 - Song")));

    let mut tags = testing::tags([("title", "")]);
    tags.fill_title_from_path(Path::new("x.mp3"));
    assert_eq!(tags.get("title"), Some(&Value::from("x")));

    let mut tags = testing::tags([("title", "Kept")]);
    tags.fill_title_from_path(Path::new("x.mp3"));
    assert_eq!(tags.get("title"), Some(&Value::from("Kept")));
}

#[test]
fn test_shared_tags() {
    let tracks = [
        testing::tags([("album", "A"), ("title", "One"), ("year", "2001")]),
        testing::tags([("album", "A"), ("title", "Two")]),
        testing::tags([("album", "A"), ("title", "Three"), ("year", "2001")]),
    ];
    let shared = shared_tags(&tracks);
    assert_eq!(shared.to_string(), "{'ALBUM': 'A', 'YEAR': '2001'}");
    assert!(shared_tags(std::iter::empty::<&TagMap>()).is_empty());
}

#[test]
fn test_mark_multi_disc() {
    let mut tracks = vec![
        testing::tags([("disc", "1")]),
        testing::tags([("disc", "2")]),
        testing::tags([("title", "no disc")]),
    ];
    mark_multi_disc(&mut tracks);
    assert_eq!(tracks[0].get("adisc"), Some(&Value::from("1")));
    assert_eq!(tracks[1].get("adisc"), Some(&Value::from("2")));
    assert!(!tracks[2].contains_key("adisc"));

    let mut tracks = vec![testing::tags([("disc", "1")]), testing::tags([("disc", "1")])];
    mark_multi_disc(&mut tracks);
    assert!(tracks.iter().all(|t| !t.contains_key("adisc")));
}
