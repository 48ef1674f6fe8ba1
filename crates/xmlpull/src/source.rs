//! Byte sources and the unread-input window the decoder reads from.
//!
//! The parser never asks for more bytes than it needs to finish decoding the
//! current scalar, so a source may hand out arbitrarily small chunks, split
//! anywhere (including inside a multi-byte sequence).

use alloc::{string::String, vec::Vec};

use thiserror::Error;

/// A failure reported by a [`ByteSource`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct SourceError(pub String);

/// Supplies the raw bytes of one XML document.
pub trait ByteSource {
    /// Appends the next chunk of input to `buf` and returns how many bytes were
    /// added. Returning `Ok(0)` signals the end of the input; the source is
    /// not polled again afterwards.
    ///
    /// # Errors
    ///
    /// Any error is surfaced to the caller as
    /// [`ErrorKind::Source`](crate::ErrorKind::Source) and ends parsing.
    fn fill(&mut self, buf: &mut Vec<u8>) -> Result<usize, SourceError>;
}

impl ByteSource for &[u8] {
    fn fill(&mut self, buf: &mut Vec<u8>) -> Result<usize, SourceError> {
        let n = self.len();
        buf.extend_from_slice(self);
        *self = &[];
        Ok(n)
    }
}

impl ByteSource for Vec<u8> {
    fn fill(&mut self, buf: &mut Vec<u8>) -> Result<usize, SourceError> {
        let n = self.len();
        buf.append(self);
        Ok(n)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn fill(&mut self, buf: &mut Vec<u8>) -> Result<usize, SourceError> {
        (**self).fill(buf)
    }
}

/// A source that yields the chunks of an iterator one at a time.
///
/// ```
/// use xmlpull::{Chunks, ParserOptions, Signal, XmlParser};
///
/// let parts: [&[u8]; 3] = [b"<gr", "\u{e9}".as_bytes(), b"/>"];
/// let parser = XmlParser::new(Chunks::new(parts), ParserOptions::default());
/// let signals: Vec<Signal> = parser.collect::<Result<_, _>>().unwrap();
/// assert_eq!(signals.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct Chunks<I> {
    chunks: I,
}

impl<I> Chunks<I> {
    /// Wraps an iterator of byte chunks.
    pub fn new<T>(chunks: T) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self {
            chunks: chunks.into_iter(),
        }
    }
}

impl<I, T> ByteSource for Chunks<I>
where
    I: Iterator<Item = T>,
    T: AsRef<[u8]>,
{
    fn fill(&mut self, buf: &mut Vec<u8>) -> Result<usize, SourceError> {
        // Empty chunks are skipped so that `0` keeps meaning end of input.
        for chunk in self.chunks.by_ref() {
            let chunk = chunk.as_ref();
            if !chunk.is_empty() {
                buf.extend_from_slice(chunk);
                return Ok(chunk.len());
            }
        }
        Ok(0)
    }
}

/// Adapts any [`std::io::Read`] into a [`ByteSource`].
#[cfg(feature = "std")]
#[derive(Debug)]
pub struct ReadSource<R> {
    reader: R,
}

#[cfg(feature = "std")]
impl<R: std::io::Read> ReadSource<R> {
    const CHUNK: usize = 8 * 1024;

    /// Wraps a reader.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

#[cfg(feature = "std")]
impl<R: std::io::Read> ByteSource for ReadSource<R> {
    fn fill(&mut self, buf: &mut Vec<u8>) -> Result<usize, SourceError> {
        use alloc::string::ToString;

        let start = buf.len();
        buf.resize(start + Self::CHUNK, 0);
        loop {
            match self.reader.read(&mut buf[start..]) {
                Ok(n) => {
                    buf.truncate(start + n);
                    return Ok(n);
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => {
                    buf.truncate(start);
                    return Err(SourceError(e.to_string()));
                }
            }
        }
    }
}

/// Unread bytes pulled from a [`ByteSource`].
#[derive(Debug)]
pub(crate) struct Input<S> {
    source: S,
    bytes: Vec<u8>,
    offset: usize,
    exhausted: bool,
}

impl<S: ByteSource> Input<S> {
    pub(crate) fn new(source: S) -> Self {
        Self {
            source,
            bytes: Vec::new(),
            offset: 0,
            exhausted: false,
        }
    }

    /// The unread bytes currently buffered.
    #[inline]
    pub(crate) fn unread(&self) -> &[u8] {
        &self.bytes[self.offset..]
    }

    #[inline]
    pub(crate) fn consume(&mut self, n: usize) {
        debug_assert!(self.offset + n <= self.bytes.len());
        self.offset += n;
    }

    /// Pulls another chunk from the source. Returns `false` once the source is
    /// exhausted.
    pub(crate) fn refill(&mut self) -> Result<bool, SourceError> {
        if self.exhausted {
            return Ok(false);
        }
        // Drop consumed bytes before growing the window.
        if self.offset > 0 {
            self.bytes.drain(..self.offset);
            self.offset = 0;
        }
        let n = self.source.fill(&mut self.bytes)?;
        if n == 0 {
            self.exhausted = true;
        }
        Ok(n > 0)
    }

    /// Buffers at least `n` unread bytes, or everything left if the source
    /// ends first.
    pub(crate) fn ensure(&mut self, n: usize) -> Result<(), SourceError> {
        while self.unread().len() < n && self.refill()? {}
        Ok(())
    }
}
