use proptest::prelude::*;
use strink::{parse_template, TagMap, Value};

fn identifier() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_]{0,12}"
}

fn clause_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ,_-]{0,12}"
}

// A template built from literal runs and escapes, paired with the text it must render to.
fn escaped_template() -> impl Strategy<Value = (String, String)> {
    let piece = prop_oneof![
        "[a-zA-Z0-9 _-]{1,8}".prop_map(|s| (s.clone(), s)),
        Just(("{{".to_string(), "{".to_string())),
        Just(("}}".to_string(), "}".to_string())),
        Just(("##".to_string(), "#".to_string())),
    ];
    prop::collection::vec(piece, 0..12).prop_map(|pieces| {
        pieces
            .into_iter()
            .fold((String::new(), String::new()), |(mut src, mut out), (s, o)| {
                src.push_str(&s);
                out.push_str(&o);
                (src, out)
            })
    })
}

fn value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::Int),
        any::<String>().prop_map(Value::Str),
    ]
}

proptest! {
    #[test]
    fn literal_templates_render_unchanged(text in "[^{}#]*") {
        let template = parse_template(&text).unwrap();
        prop_assert_eq!(template.render(&TagMap::new()), text);
    }

    #[test]
    fn escapes_render_as_single_characters((source, expected) in escaped_template()) {
        let template = parse_template(&source).unwrap();
        prop_assert_eq!(template.render(&TagMap::new()), expected);
    }

    #[test]
    fn absent_fields_render_empty(name in identifier()) {
        let template = parse_template(&format!("{{{name}}}")).unwrap();
        prop_assert_eq!(template.render(&TagMap::new()), "");
    }

    #[test]
    fn present_fields_render_as_value(name in identifier(), value in value()) {
        let template = parse_template(&format!("{{{name}}}")).unwrap();
        let mut tags = TagMap::new();
        tags.insert(&name, value.clone());
        prop_assert_eq!(template.render(&tags), value.to_string());
    }

    #[test]
    fn conditionals_select_by_presence(name in identifier(), then in clause_text(), otherwise in clause_text()) {
        let template = parse_template(&format!("{{{name}?{then}#{otherwise}}}")).unwrap();
        let mut tags = TagMap::new();
        prop_assert_eq!(template.render(&tags), otherwise);
        tags.insert(&name, "x");
        prop_assert_eq!(template.render(&tags), then);
    }

    #[test]
    fn parse_and_render_are_deterministic(
        a in identifier(),
        b in identifier(),
        text in clause_text(),
        value in value(),
    ) {
        let source = format!("{text}{{{a}?{{{b}:>4}}#{text}}}{{{b}!w}}");
        let first = parse_template(&source).unwrap();
        prop_assert_eq!(&first, &parse_template(&source).unwrap());

        let mut tags = TagMap::new();
        tags.insert(&a, value.clone());
        tags.insert(&b, value);
        prop_assert_eq!(first.render(&tags), first.render(&tags));
    }
}
