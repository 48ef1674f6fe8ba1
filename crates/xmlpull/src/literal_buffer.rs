//! Matching of the fixed keywords that follow `<!`.

/// Keywords recognised one character at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Keyword {
    /// `[CDATA[`
    Cdata,
    /// `DOCTYPE`
    Doctype,
    /// `--` (the `-` after `<!` has already been seen)
    CommentOpen,
}

impl Keyword {
    pub(crate) fn text(self) -> &'static str {
        match self {
            Keyword::Cdata => "[CDATA[",
            Keyword::Doctype => "DOCTYPE",
            Keyword::CommentOpen => "--",
        }
    }

    /// The keyword as an expectation for error messages.
    pub(crate) fn expected(self) -> &'static [&'static str] {
        match self {
            Keyword::Cdata => &["[CDATA["],
            Keyword::Doctype => &["DOCTYPE"],
            Keyword::CommentOpen => &["--"],
        }
    }
}

/// What happened after feeding one more character into the matcher?
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Character matched, but the keyword is not finished yet.
    NeedMore,
    /// Character matched *and* it was the last one of the keyword.
    Done(Keyword),
    /// Character did not match the expected one.
    Reject,
}

/// `None`  ➜  no keyword in flight
/// `Some`  ➜  `(remaining_bytes, keyword)` while matching
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct ExpectedLiteralBuffer(Option<(&'static [u8], Keyword)>);

impl ExpectedLiteralBuffer {
    /// No keyword is in flight.
    pub(crate) fn none() -> Self {
        ExpectedLiteralBuffer(None)
    }

    /// Starts matching after the first character of the keyword (`[`, `D` or
    /// `-`), which the caller has already consumed.
    pub(crate) fn new(first: char) -> Self {
        let keyword = match first {
            '[' => Keyword::Cdata,
            'D' => Keyword::Doctype,
            '-' => Keyword::CommentOpen,
            _ => return ExpectedLiteralBuffer::none(),
        };
        ExpectedLiteralBuffer(Some((&keyword.text().as_bytes()[1..], keyword)))
    }

    /// The keyword being matched, if any.
    pub(crate) fn keyword(&self) -> Option<Keyword> {
        self.0.map(|(_, k)| k)
    }

    /// Gives the matcher the next input character.
    pub(crate) fn step(&mut self, c: char) -> Step {
        let Some((bytes, keyword)) = self.0.take() else {
            return Step::Reject;
        };
        match bytes.split_first() {
            Some((b, rest)) if char::from(*b) == c => {
                if rest.is_empty() {
                    Step::Done(keyword)
                } else {
                    self.0 = Some((rest, keyword));
                    Step::NeedMore
                }
            }
            // Mismatch: keep the state we took so the caller can report it.
            _ => {
                self.0 = Some((bytes, keyword));
                Step::Reject
            }
        }
    }
}
