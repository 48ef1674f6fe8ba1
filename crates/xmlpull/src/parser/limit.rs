use super::XmlParser;
use crate::{
    error::{ErrorKind, Found, ParserError},
    literal_buffer::{ExpectedLiteralBuffer, Keyword, Step},
    source::ByteSource,
};

/// What starts at the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Limit {
    /// Character data (no `<` consumed).
    Text,
    /// End of input.
    Eof,
    /// `<` followed by a name.
    StartTag,
    /// `</`
    EndTag,
    /// `<!--`
    Comment,
    /// `<![CDATA[`
    Cdata,
    /// `<!DOCTYPE`
    Doctype,
    /// `<?`
    ProcessingInstruction,
}

const AFTER_BANG: &[&str] = &["--", "[CDATA[", "DOCTYPE"];

impl<S: ByteSource> XmlParser<S> {
    /// Classifies the markup at the cursor, consuming its opening delimiter.
    pub(super) fn classify(&mut self) -> Result<Limit, ParserError> {
        match self.cursor.peek()? {
            None => return Ok(Limit::Eof),
            Some('<') => {}
            Some(_) => return Ok(Limit::Text),
        }
        self.markup_start = self.cursor.position();
        self.cursor.advance();

        match self.cursor.peek()? {
            Some('?') => {
                self.cursor.advance();
                Ok(Limit::ProcessingInstruction)
            }
            Some('/') => {
                self.cursor.advance();
                Ok(Limit::EndTag)
            }
            Some('!') => {
                self.cursor.advance();
                self.classify_bang()
            }
            // The name is validated by the start-tag parser.
            _ => Ok(Limit::StartTag),
        }
    }

    /// `<!` has been consumed: match one of the keywords that may follow.
    fn classify_bang(&mut self) -> Result<Limit, ParserError> {
        let first = self.cursor.peek()?;
        let mut literal = first.map_or(ExpectedLiteralBuffer::none(), ExpectedLiteralBuffer::new);
        let Some(keyword) = literal.keyword() else {
            return Err(self.cursor.error(ErrorKind::Expected {
                expected: AFTER_BANG,
                found: Found::from(first),
            }));
        };
        self.cursor.advance();
        loop {
            let c = self.cursor.peek()?;
            match c.map(|c| literal.step(c)) {
                Some(Step::NeedMore) => self.cursor.advance(),
                Some(Step::Done(done)) => {
                    self.cursor.advance();
                    return Ok(match done {
                        Keyword::Cdata => Limit::Cdata,
                        Keyword::Doctype => Limit::Doctype,
                        Keyword::CommentOpen => Limit::Comment,
                    });
                }
                Some(Step::Reject) | None => {
                    return Err(self.cursor.error(ErrorKind::Expected {
                        expected: keyword.expected(),
                        found: Found::from(c),
                    }));
                }
            }
        }
    }
}
