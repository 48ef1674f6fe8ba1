use alloc::{string::ToString, vec, vec::Vec};

use super::utils::{data, parse, parse_bytes, parse_source, render, start};
use crate::{
    Attribute, Chunks, Encoding, Name, ParserOptions, Position, Signal, Tag, XML_NS, XMLNS_NS,
    XmlParser,
};

fn stripping() -> ParserOptions {
    ParserOptions {
        strip_whitespace: true,
        ..Default::default()
    }
}

fn utf16(text: &str, little_endian: bool, bom: bool) -> Vec<u8> {
    let mut out = Vec::new();
    let mut push = |unit: u16| {
        let bytes = if little_endian {
            unit.to_le_bytes()
        } else {
            unit.to_be_bytes()
        };
        out.extend_from_slice(&bytes);
    };
    if bom {
        push(0xFEFF);
    }
    for unit in text.encode_utf16() {
        push(unit);
    }
    out
}

#[test]
fn minimal_document() {
    assert_eq!(
        parse("<a/>").unwrap(),
        vec![Signal::Dtd(None), start("a"), Signal::ElementEnd]
    );
}

#[test]
fn predefined_entities_expand() {
    assert_eq!(
        parse("<a>&lt;&amp;&gt;</a>").unwrap(),
        vec![Signal::Dtd(None), start("a"), data("<&>"), Signal::ElementEnd]
    );
    assert_eq!(
        parse("<a>&apos;&quot;</a>").unwrap()[2],
        data("'\"")
    );
}

#[test]
fn character_references_expand() {
    assert_eq!(parse("<a>&#65;&#x42;&#x1F600;</a>").unwrap()[2], data("AB😀"));
}

#[test]
fn utf16le_bom_is_detected() {
    let bytes = utf16("<a>é€😀</a>", true, true);
    let mut parser = XmlParser::new(&bytes[..], ParserOptions::default());
    let signals: Vec<Signal> = parser.by_ref().collect::<Result<_, _>>().unwrap();
    assert_eq!(parser.encoding(), Encoding::Utf16Le);
    assert_eq!(signals[2], data("é€😀"));
}

#[test]
fn utf16be_bom_is_detected() {
    let bytes = utf16("<?xml version='1.0' encoding='UTF-16'?><a>x</a>", false, true);
    let mut parser = XmlParser::new(&bytes[..], ParserOptions::default());
    let signals: Vec<Signal> = parser.by_ref().collect::<Result<_, _>>().unwrap();
    assert_eq!(parser.encoding(), Encoding::Utf16Be);
    assert_eq!(signals[2], data("x"));
}

#[test]
fn no_bom_no_declaration_is_utf8() {
    let mut parser = XmlParser::new("<a>é</a>".as_bytes(), ParserOptions::default());
    let signals: Vec<Signal> = parser.by_ref().collect::<Result<_, _>>().unwrap();
    assert_eq!(parser.encoding(), Encoding::Utf8);
    assert_eq!(signals[2], data("é"));
}

#[test]
fn utf8_bom_is_skipped() {
    let signals = parse_bytes(b"\xEF\xBB\xBF<a>x</a>", ParserOptions::default()).unwrap();
    assert_eq!(signals[2], data("x"));
}

#[test]
fn declared_encoding_switches_decoder() {
    let latin1 = b"<?xml version=\"1.0\" encoding=\"iso-8859-1\"?><a>caf\xE9</a>";
    let mut parser = XmlParser::new(&latin1[..], ParserOptions::default());
    let signals: Vec<Signal> = parser.by_ref().collect::<Result<_, _>>().unwrap();
    assert_eq!(parser.encoding(), Encoding::Iso8859_1);
    assert_eq!(signals[2], data("café"));

    let latin9 = b"<?xml version='1.0' encoding='LATIN9'?><a>\xA4\xBD</a>";
    assert_eq!(
        parse_bytes(latin9, ParserOptions::default()).unwrap()[2],
        data("€œ")
    );
}

#[test]
fn caller_encoding_overrides_declaration() {
    let doc = b"<?xml version='1.0' encoding='UTF-8'?><a>\xE9</a>";
    let options = ParserOptions {
        encoding: Some(Encoding::Iso8859_1),
        ..Default::default()
    };
    assert_eq!(parse_bytes(doc, options).unwrap()[2], data("é"));
}

#[test]
fn bom_takes_precedence_over_declaration() {
    let doc = "\u{FEFF}<?xml version='1.0' encoding='ISO-8859-1'?><a>é</a>";
    let mut parser = XmlParser::new(doc.as_bytes(), ParserOptions::default());
    let signals: Vec<Signal> = parser.by_ref().collect::<Result<_, _>>().unwrap();
    assert_eq!(parser.encoding(), Encoding::Utf8);
    assert_eq!(signals[2], data("é"));
}

#[test]
fn utf16_declaration_without_bom_can_be_tolerated() {
    let doc = b"<?xml version='1.0' encoding='UTF-16'?><a>x</a>";
    let options = ParserOptions {
        tolerate_utf16_without_bom: true,
        ..Default::default()
    };
    assert_eq!(parse_bytes(doc, options).unwrap()[2], data("x"));
}

#[test]
fn namespace_prefixes_expand() {
    let signals = parse(r#"<a xmlns:p="urn:x"><p:b/></a>"#).unwrap();
    let Signal::ElementStart(outer) = &signals[1] else {
        panic!("expected a start tag, got {:?}", signals[1]);
    };
    assert_eq!(outer.name, Name::new("", "a"));
    assert_eq!(
        outer.attributes,
        vec![Attribute {
            name: Name::new(XMLNS_NS, "p"),
            value: "urn:x".into(),
        }]
    );
    let Signal::ElementStart(inner) = &signals[2] else {
        panic!("expected a start tag, got {:?}", signals[2]);
    };
    assert_eq!(inner.name, Name::new("urn:x", "b"));
}

#[test]
fn default_namespace_applies_to_elements_only() {
    let signals = parse(r#"<a xmlns="urn:d" x="1"><b/></a>"#).unwrap();
    let Signal::ElementStart(a) = &signals[1] else {
        panic!("expected a start tag");
    };
    assert_eq!(a.name, Name::new("urn:d", "a"));
    assert_eq!(a.attribute(XMLNS_NS, "xmlns"), Some("urn:d"));
    assert_eq!(a.attribute("", "x"), Some("1"));
    let Signal::ElementStart(b) = &signals[2] else {
        panic!("expected a start tag");
    };
    assert_eq!(b.name, Name::new("urn:d", "b"));
}

#[test]
fn default_namespace_can_be_undeclared() {
    let signals = parse(r#"<a xmlns="urn:d"><b xmlns=""/></a>"#).unwrap();
    let Signal::ElementStart(b) = &signals[2] else {
        panic!("expected a start tag");
    };
    assert_eq!(b.name, Name::new("", "b"));
}

#[test]
fn rebinding_is_scoped() {
    let doc = r#"<p:a xmlns:p="urn:1"><p:b xmlns:p="urn:2"/><p:c/></p:a>"#;
    let names: Vec<Name> = parse(doc)
        .unwrap()
        .into_iter()
        .filter_map(|s| match s {
            Signal::ElementStart(tag) => Some(tag.name),
            _ => None,
        })
        .collect();
    assert_eq!(
        names,
        vec![
            Name::new("urn:1", "a"),
            Name::new("urn:2", "b"),
            Name::new("urn:1", "c"),
        ]
    );
}

#[test]
fn xml_prefix_is_predeclared() {
    let signals = parse(r#"<a xml:lang="en"/>"#).unwrap();
    let Signal::ElementStart(a) = &signals[1] else {
        panic!("expected a start tag");
    };
    assert_eq!(a.attribute(XML_NS, "lang"), Some("en"));
}

#[test]
fn namespace_fallback_resolves_unbound_prefix() {
    let options = ParserOptions::default()
        .with_namespace_fallback(|p| (p == "ship").then(|| "urn:ships".to_string()));
    let signals = parse_bytes(b"<ship:hull/>", options).unwrap();
    let Signal::ElementStart(hull) = &signals[1] else {
        panic!("expected a start tag");
    };
    assert_eq!(hull.name, Name::new("urn:ships", "hull"));
}

#[test]
fn whitespace_stripping_collapses_data() {
    assert_eq!(
        parse_bytes(b"<a>  x   y  </a>", stripping()).unwrap(),
        vec![Signal::Dtd(None), start("a"), data("x y"), Signal::ElementEnd]
    );
    assert_eq!(
        parse_bytes(b"<a>  x   y  </a>", ParserOptions::default()).unwrap()[2],
        data("  x   y  ")
    );
}

#[test]
fn xml_space_preserve_disables_stripping() {
    let signals = parse_bytes(br#"<a xml:space="preserve">  x   y  </a>"#, stripping()).unwrap();
    assert_eq!(signals[2], data("  x   y  "));
}

#[test]
fn xml_space_default_inherits_from_parent() {
    fn texts(doc: &[u8]) -> Vec<Signal> {
        parse_bytes(doc, stripping())
            .unwrap()
            .into_iter()
            .filter(|s| matches!(s, Signal::Data(_)))
            .collect()
    }
    assert_eq!(
        texts(br#"<r><a xml:space="default"> q  r </a></r>"#),
        vec![data("q r")]
    );
    assert_eq!(
        texts(br#"<r><a xml:space="preserve"> p <b xml:space="default"> q  r </b></a> s </r>"#),
        vec![data(" p "), data(" q  r "), data("s")]
    );
}

#[test]
fn whitespace_only_data_is_elided_when_stripping() {
    assert_eq!(
        parse_bytes(b"<a>\n  <b/>\n</a>", stripping()).unwrap(),
        vec![
            Signal::Dtd(None),
            start("a"),
            start("b"),
            Signal::ElementEnd,
            Signal::ElementEnd
        ]
    );
}

#[test]
fn whitespace_only_data_is_kept_otherwise() {
    assert_eq!(parse("<a> </a>").unwrap()[2], data(" "));
}

#[test]
fn empty_element_has_no_data() {
    assert_eq!(
        parse("<a></a>").unwrap(),
        vec![Signal::Dtd(None), start("a"), Signal::ElementEnd]
    );
}

#[test]
fn attribute_values_expand_and_strip() {
    let signals = parse_bytes(br#"<a v="  1 &amp;   2 " w='&#x20;x'/>"#, stripping()).unwrap();
    let Signal::ElementStart(a) = &signals[1] else {
        panic!("expected a start tag");
    };
    assert_eq!(a.attribute("", "v"), Some("1 & 2"));
    assert_eq!(a.attribute("", "w"), Some("x"));
}

#[test]
fn cdata_is_literal() {
    assert_eq!(parse("<a><![CDATA[a]]b]]></a>").unwrap()[2], data("a]]b"));
    assert_eq!(parse("<a><![CDATA[x]]]></a>").unwrap()[2], data("x]"));
    assert_eq!(parse("<a><![CDATA[<&>]]></a>").unwrap()[2], data("<&>"));
}

#[test]
fn data_merges_across_skipped_markup() {
    assert_eq!(
        parse("<a>x<!-- c -->y<?pi z?>w<![CDATA[v]]></a>").unwrap(),
        vec![Signal::Dtd(None), start("a"), data("xywv"), Signal::ElementEnd]
    );
}

#[test]
fn line_endings_are_normalized_in_data() {
    assert_eq!(parse("<a>x\r\ny\rz</a>").unwrap()[2], data("x\ny\nz"));
}

#[test]
fn doctype_text_is_reported() {
    let doc = r#"<!DOCTYPE fleet [
  <!ELEMENT fleet (ship*)>
  <!-- a > inside a comment -->
  <!ATTLIST ship class CDATA "a>b">
]>
<fleet/>"#;
    let signals = parse(doc).unwrap();
    let Signal::Dtd(Some(text)) = &signals[0] else {
        panic!("expected DOCTYPE text, got {:?}", signals[0]);
    };
    assert!(text.starts_with("DOCTYPE fleet ["));
    assert!(text.ends_with("\n]"));
    assert!(text.contains("\"a>b\""));
    assert_eq!(signals[1], start("fleet"));
}

#[test]
fn doctype_skips_processing_instructions() {
    let signals = parse("<!DOCTYPE a [<?pi x>y?><!-- <?q -->]><a/>").unwrap();
    assert_eq!(
        signals,
        vec![
            Signal::Dtd(Some("DOCTYPE a [<?pi x>y?><!-- <?q -->]".into())),
            start("a"),
            Signal::ElementEnd,
        ]
    );
}

#[test]
fn prolog_and_epilog_may_hold_misc() {
    let doc = "<?xml version='1.0' standalone='yes'?>\n<!-- head -->\n<?style x?>\n<!DOCTYPE a>\n<!-- mid --><a/>\n<!-- tail -->\n<?end?>\n";
    let mut parser = XmlParser::new(doc.as_bytes(), ParserOptions::default());
    let signals: Vec<Signal> = parser.by_ref().collect::<Result<_, _>>().unwrap();
    assert_eq!(
        signals,
        vec![
            Signal::Dtd(Some("DOCTYPE a".into())),
            start("a"),
            Signal::ElementEnd
        ]
    );
    assert!(parser.is_finished());
}

#[test]
fn entity_resolver_supplies_text() {
    let options = ParserOptions {
        strip_whitespace: true,
        ..Default::default()
    }
    .with_entity_resolver(|name| match name {
        "ship" => Some("HMS  Beagle".to_string()),
        _ => None,
    });
    let signals = parse_bytes(b"<a> the &ship; </a>", options).unwrap();
    assert_eq!(signals[2], data("the HMS Beagle"));
}

#[test]
fn self_closing_end_is_deferred() {
    let mut parser = XmlParser::new(&b"<a><b/></a>"[..], ParserOptions::default());
    assert_eq!(parser.next(), Some(Ok(Signal::Dtd(None))));
    assert_eq!(parser.depth(), 0);
    assert_eq!(parser.next(), Some(Ok(start("a"))));
    assert_eq!(parser.depth(), 1);
    assert_eq!(parser.next(), Some(Ok(start("b"))));
    assert_eq!(parser.depth(), 2);
    assert_eq!(parser.next(), Some(Ok(Signal::ElementEnd)));
    assert_eq!(parser.depth(), 1);
    assert_eq!(parser.next(), Some(Ok(Signal::ElementEnd)));
    assert_eq!(parser.depth(), 0);
    assert!(!parser.is_finished());
    assert_eq!(parser.next(), None);
    assert!(parser.is_finished());
    assert_eq!(parser.next(), None);
}

#[test]
fn peek_does_not_consume() {
    let mut parser = XmlParser::new(&b"<a>x</a>"[..], ParserOptions::default());
    assert_eq!(parser.next(), Some(Ok(Signal::Dtd(None))));
    assert_eq!(parser.peek(), Some(Ok(&start("a"))));
    assert_eq!(parser.peek(), Some(Ok(&start("a"))));
    assert_eq!(parser.next(), Some(Ok(start("a"))));
    assert_eq!(parser.peek(), Some(Ok(&data("x"))));
    assert_eq!(parser.next(), Some(Ok(data("x"))));
    assert_eq!(parser.next(), Some(Ok(Signal::ElementEnd)));
    assert_eq!(parser.peek(), None);
    assert!(parser.is_finished());
}

#[test]
fn chunks_split_inside_characters() {
    let doc = "<é a='€'>😀</é>".as_bytes();
    let whole = parse_bytes(doc, ParserOptions::default()).unwrap();
    let split = parse_source(Chunks::new(doc.chunks(1)), ParserOptions::default()).unwrap();
    assert_eq!(whole, split);
}

#[test]
fn attributes_keep_document_order() {
    let signals = parse(r#"<ship b="2" a="1" c='3'/>"#).unwrap();
    assert_eq!(
        signals[1],
        Signal::ElementStart(Tag {
            name: Name::new("", "ship"),
            attributes: vec![
                Attribute {
                    name: Name::new("", "b"),
                    value: "2".into()
                },
                Attribute {
                    name: Name::new("", "a"),
                    value: "1".into()
                },
                Attribute {
                    name: Name::new("", "c"),
                    value: "3".into()
                },
            ],
        })
    );
}

#[test]
fn position_tracks_lines() {
    let mut parser = XmlParser::new(&b"<a>\n  <b/>\n</a>"[..], ParserOptions::default());
    for signal in parser.by_ref() {
        signal.unwrap();
    }
    assert_eq!(parser.position(), Position { line: 3, column: 5 });
}

#[test]
fn rendered_report() {
    let doc = r#"<?xml version="1.0"?>
<report xmlns="urn:fleet" xmlns:w="urn:weapons">
  <team name="Red">
    <player rank="1">Ann &amp; Bo</player>
    <ship class="frigate"><w:gun calibre="20"/></ship>
  </team>
</report>"#;
    let signals = parse_bytes(doc.as_bytes(), stripping()).unwrap();
    assert_eq!(
        render(&signals),
        r#"dtd None
<{urn:fleet}report {http://www.w3.org/2000/xmlns/}xmlns="urn:fleet" {http://www.w3.org/2000/xmlns/}w="urn:weapons">
  <{urn:fleet}team name="Red">
    <{urn:fleet}player rank="1">
      "Ann & Bo"
    </>
    <{urn:fleet}ship class="frigate">
      <{urn:weapons}gun calibre="20">
      </>
    </>
  </>
</>
"#
    );
}
