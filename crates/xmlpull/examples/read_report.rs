//! Folds the signal stream of a small report document into plain records.
//!
//! The consumer is a hand-written recursive descent over the signals: each
//! `read_*` function expects to be positioned right after the start tag of
//! its element and returns once it has consumed the matching end signal.
//! [`XmlParser::peek`] is used to look at the next signal before deciding
//! which function to descend into.
//!
//! Run with
//!
//! ```bash
//! cargo run -p xmlpull --features std --example read_report [FILE]
//! ```
//!
//! Without a file argument the embedded sample document is read.

use std::{fs::File, io, process::ExitCode};

use xmlpull::{ByteSource, ParserError, ParserOptions, ReadSource, Signal, Tag, XmlParser};

const NS: &str = "urn:example:report";

const SAMPLE: &str = r#"<?xml version="1.0" encoding="ISO-8859-1"?>
<report xmlns="urn:example:report">
  <team name="Red">
    <player number="7">Ann &amp; Bo</player>
    <player number="9">Carl</player>
  </team>
  <team name="Blue">
    <player number="1">Dana</player>
  </team>
  <ship class="frigate" crew="120">Endeavour</ship>
</report>
"#;

#[derive(Debug, Default)]
struct Report {
    teams: Vec<Team>,
    ships: Vec<Ship>,
}

#[derive(Debug)]
struct Team {
    name: String,
    players: Vec<Player>,
}

#[derive(Debug)]
struct Player {
    number: u32,
    name: String,
}

#[derive(Debug)]
struct Ship {
    class: String,
    crew: u32,
    name: String,
}

#[derive(Debug, thiserror::Error)]
enum ReportError {
    #[error("read failed: {0}")]
    Io(#[from] io::Error),
    #[error("malformed document: {0}")]
    Xml(#[from] ParserError),
    #[error("{0}")]
    Shape(String),
}

fn shape<T>(msg: impl Into<String>) -> Result<T, ReportError> {
    Err(ReportError::Shape(msg.into()))
}

fn next<S: ByteSource>(parser: &mut XmlParser<S>) -> Result<Signal, ReportError> {
    match parser.next() {
        Some(signal) => Ok(signal?),
        None => shape("document ended early"),
    }
}

/// Skips an element whose start tag was just consumed.
fn skip_element<S: ByteSource>(parser: &mut XmlParser<S>) -> Result<(), ReportError> {
    let mut depth = 1usize;
    while depth > 0 {
        match next(parser)? {
            Signal::ElementStart(_) => depth += 1,
            Signal::ElementEnd => depth -= 1,
            _ => {}
        }
    }
    Ok(())
}

/// Character data up to the end of the current element.
fn read_text<S: ByteSource>(parser: &mut XmlParser<S>) -> Result<String, ReportError> {
    let mut text = String::new();
    loop {
        match next(parser)? {
            Signal::Data(d) => text.push_str(&d),
            Signal::ElementEnd => return Ok(text),
            Signal::ElementStart(tag) => return shape(format!("unexpected <{}> in text", tag.name)),
            Signal::Dtd(_) => return shape("unexpected DTD"),
        }
    }
}

fn number(tag: &Tag, local: &str) -> Result<u32, ReportError> {
    let raw = tag.attribute("", local).unwrap_or_default();
    raw.parse()
        .or_else(|_| shape(format!("{local}={raw:?} is not a number")))
}

fn read_team<S: ByteSource>(parser: &mut XmlParser<S>, tag: &Tag) -> Result<Team, ReportError> {
    let mut team = Team {
        name: tag.attribute("", "name").unwrap_or_default().to_string(),
        players: Vec::new(),
    };
    loop {
        match next(parser)? {
            Signal::ElementStart(player) if player.name.is(NS, "player") => {
                team.players.push(Player {
                    number: number(&player, "number")?,
                    name: read_text(parser)?,
                });
            }
            Signal::ElementStart(_) => skip_element(parser)?,
            Signal::ElementEnd => return Ok(team),
            Signal::Data(_) | Signal::Dtd(_) => {}
        }
    }
}

fn read_report<S: ByteSource>(parser: &mut XmlParser<S>) -> Result<Report, ReportError> {
    let Signal::Dtd(_) = next(parser)? else {
        return shape("missing DTD signal");
    };
    match next(parser)? {
        Signal::ElementStart(root) if root.name.is(NS, "report") => {}
        Signal::ElementStart(root) => return shape(format!("unexpected root {}", root.name)),
        _ => return shape("expected the root element"),
    }

    let mut report = Report::default();
    loop {
        // Data between records is whitespace only once stripped.
        if matches!(parser.peek(), Some(Ok(Signal::Data(_)))) {
            parser.next();
            continue;
        }
        match next(parser)? {
            Signal::ElementStart(tag) if tag.name.is(NS, "team") => {
                report.teams.push(read_team(parser, &tag)?);
            }
            Signal::ElementStart(tag) if tag.name.is(NS, "ship") => {
                report.ships.push(Ship {
                    class: tag.attribute("", "class").unwrap_or_default().to_string(),
                    crew: number(&tag, "crew")?,
                    name: read_text(parser)?,
                });
            }
            Signal::ElementStart(_) => skip_element(parser)?,
            Signal::ElementEnd => break,
            Signal::Data(_) | Signal::Dtd(_) => {}
        }
    }
    if parser.next().is_some() {
        return shape("content after the root element");
    }
    Ok(report)
}

fn run() -> Result<Report, ReportError> {
    let options = ParserOptions::default().with_strip_whitespace(true);
    match std::env::args_os().nth(1) {
        Some(path) => {
            let file = File::open(path)?;
            read_report(&mut XmlParser::new(ReadSource::new(file), options))
        }
        None => read_report(&mut XmlParser::new(SAMPLE.as_bytes(), options)),
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(report) => {
            for team in &report.teams {
                println!("team {} ({} players)", team.name, team.players.len());
                for player in &team.players {
                    println!("  #{:<3} {}", player.number, player.name);
                }
            }
            for ship in &report.ships {
                println!("ship {} [{}] crew {}", ship.name, ship.class, ship.crew);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
