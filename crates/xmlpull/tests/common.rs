#![allow(missing_docs, dead_code)]

use core::fmt::Write;

use xmlpull::{ParserError, ParserOptions, Signal, XmlParser};

pub const REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE report>
<report xmlns="urn:example:report" xmlns:s="urn:example:ships">
  <team name="Red">
    <player number="7">Ann &amp; Bo</player>
    <!-- captain -->
    <player number="9"><![CDATA[C <3]]></player>
  </team>
  <s:ship s:class="frigate" crew="120">Endeavour</s:ship>
</report>
"#;

pub fn signals(input: &[u8], options: ParserOptions) -> Result<Vec<Signal>, ParserError> {
    XmlParser::new(input, options).collect()
}

/// One line per signal, indented by nesting depth.
pub fn render(signals: &[Signal]) -> String {
    let mut out = String::new();
    let mut depth = 0usize;
    for signal in signals {
        let indent = depth * 2;
        match signal {
            Signal::Dtd(dtd) => writeln!(out, "dtd {dtd:?}").unwrap(),
            Signal::ElementStart(tag) => {
                write!(out, "{:indent$}<{}", "", tag.name).unwrap();
                for attr in &tag.attributes {
                    write!(out, " {}={:?}", attr.name, attr.value).unwrap();
                }
                writeln!(out, ">").unwrap();
                depth += 1;
            }
            Signal::ElementEnd => {
                depth -= 1;
                writeln!(out, "{:width$}</>", "", width = depth * 2).unwrap();
            }
            Signal::Data(text) => writeln!(out, "{:indent$}{text:?}", "").unwrap(),
        }
    }
    out
}
