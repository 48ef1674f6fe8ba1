#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use xmlpull::{Chunks, Encoding, ParserOptions, Signal, XmlParser};

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    flags: u8,
    split_seed: u64,
    data: Vec<u8>,
}

const ENCODINGS: [Encoding; 6] = [
    Encoding::Utf8,
    Encoding::Utf16Be,
    Encoding::Utf16Le,
    Encoding::Iso8859_1,
    Encoding::Iso8859_15,
    Encoding::UsAscii,
];

fn options(flags: u8) -> ParserOptions {
    let mut options = ParserOptions::default().with_strip_whitespace(flags & 1 != 0);
    options.tolerate_utf16_without_bom = flags & 2 != 0;
    if flags & 4 != 0 {
        options.max_buffer_len = 64;
    }
    if flags & 8 != 0 {
        options.encoding = Some(ENCODINGS[usize::from(flags >> 4) % ENCODINGS.len()]);
    }
    if flags & 0x80 != 0 {
        options = options
            .with_entity_resolver(|name| (name.len() < 4).then(|| name.repeat(2)))
            .with_namespace_fallback(|prefix| Some(format!("urn:fuzz:{prefix}")));
    }
    options
}

/// Split `data` at byte offsets derived from `split_seed`. Offsets are not
/// aligned to characters: the decoder must cope with any boundary.
fn split(data: &[u8], split_seed: u64) -> Vec<&[u8]> {
    let mut chunks = Vec::new();
    let mut rest = data;
    let mut seed = split_seed;
    while !rest.is_empty() {
        let size = (seed as usize % rest.len()) + 1;
        let (head, tail) = rest.split_at(size);
        chunks.push(head);
        rest = tail;
        seed = seed.rotate_left(7) ^ 0x9E37_79B9_7F4A_7C15;
    }
    chunks
}

fn parser(input: &FuzzInput) {
    let chunks = split(&input.data, input.split_seed);
    let mut parser = XmlParser::new(Chunks::new(chunks), options(input.flags));

    let mut depth = 0usize;
    let mut first = true;
    while let Some(signal) = parser.next() {
        let Ok(signal) = signal else {
            assert!(parser.next().is_none(), "error must be terminal");
            return;
        };
        assert_eq!(first, matches!(signal, Signal::Dtd(_)), "Dtd comes first, once");
        first = false;
        match signal {
            Signal::ElementStart(_) => depth += 1,
            Signal::ElementEnd => depth = depth.checked_sub(1).expect("unbalanced end"),
            Signal::Data(text) => assert!(!text.is_empty() && depth > 0),
            Signal::Dtd(_) => {}
        }
        assert_eq!(parser.depth(), depth);
    }
    assert_eq!(depth, 0, "document ended with open elements");
    assert!(parser.is_finished());
}

fuzz_target!(|input: FuzzInput| parser(&input));
