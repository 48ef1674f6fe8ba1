use alloc::{string::String, vec::Vec};
use core::fmt::Write;

use crate::{ByteSource, Name, ParserError, ParserOptions, Signal, Tag, XmlParser};

pub(super) fn parse(input: &str) -> Result<Vec<Signal>, ParserError> {
    parse_bytes(input.as_bytes(), ParserOptions::default())
}

pub(super) fn parse_bytes(input: &[u8], options: ParserOptions) -> Result<Vec<Signal>, ParserError> {
    parse_source(input, options)
}

pub(super) fn parse_source<S: ByteSource>(
    source: S,
    options: ParserOptions,
) -> Result<Vec<Signal>, ParserError> {
    XmlParser::new(source, options).collect()
}

/// Parses and returns the error the document is rejected with.
pub(super) fn parse_err(input: &str) -> ParserError {
    match parse(input) {
        Ok(signals) => panic!("expected an error, got {signals:?}"),
        Err(e) => e,
    }
}

pub(super) fn start(local: &str) -> Signal {
    Signal::ElementStart(Tag {
        name: Name::new("", local),
        attributes: Vec::new(),
    })
}

pub(super) fn data(text: &str) -> Signal {
    Signal::Data(text.into())
}

/// One line per signal, indented by depth.
pub(super) fn render(signals: &[Signal]) -> String {
    let mut out = String::new();
    let mut depth = 0usize;
    for signal in signals {
        match signal {
            Signal::Dtd(dtd) => writeln!(out, "dtd {dtd:?}").unwrap(),
            Signal::ElementStart(tag) => {
                write!(out, "{:depth$}<{}", "", tag.name, depth = depth * 2).unwrap();
                for attr in &tag.attributes {
                    write!(out, " {}={:?}", attr.name, attr.value).unwrap();
                }
                writeln!(out, ">").unwrap();
                depth += 1;
            }
            Signal::ElementEnd => {
                depth -= 1;
                writeln!(out, "{:depth$}</>", "", depth = depth * 2).unwrap();
            }
            Signal::Data(text) => writeln!(out, "{:depth$}{text:?}", "", depth = depth * 2).unwrap(),
        }
    }
    out
}
