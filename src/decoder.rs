//! Incremental DER decoder.
//!
//! The decoder alternates between a header phase and a primitive-contents
//! phase, keeping a stack of remaining byte capacities, one per open
//! constructed tag, innermost last. Every chunk a sub-parser sees is
//! clipped to the innermost capacity so a tag's parser can never stray
//! into a sibling's bytes, and every consumed byte shrinks all enclosing
//! capacities in lockstep. Containers whose capacity drains to zero close
//! in a cascade.
//!
//! Output is the S-expression form, produced strictly in document order:
//! one root tag per line group, nested tags indented four spaces per
//! level, primitive contents as quoted hex pairs or a bracketed formatter
//! rendering when the dictionary names one.

use std::io::Write;

use tracing::{trace, warn};

use crate::Error;
use crate::format::ValueFormat;
use crate::header::{HeaderDecoder, TagClass};
use crate::repr::Dictionary;
use crate::stream::{Step, Stream};

const INDENT: &[u8] = b"    ";

/// What the next atomic step should parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Header,
    Contents,
}

/// Continuation point inside a primitive's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PrimState {
    /// Print the opening quote.
    OpenQuote,
    /// First octet, printed without a leading space.
    FirstOctet,
    /// Remaining octets, space-separated.
    MoreOctets,
    /// Accumulate raw bytes for a value formatter instead of streaming
    /// hex.
    Collect(ValueFormat),
}

/// Streaming DER-to-S-expression decoder.
///
/// Feed it chunks with [`Decoder::decode`]; it returns
/// [`Step::Continue`] until [`Stream::Eof`] arrives at a document
/// boundary. Multiple top-level tags simply follow each other in the
/// input.
pub struct Decoder<'r, W> {
    out: W,
    dict: Option<&'r Dictionary>,
    fillers: bool,

    /// Remaining capacities of the open containers, innermost last.
    caps: Vec<u64>,
    phase: Phase,
    header: HeaderDecoder,
    prim: PrimState,
    /// Formatter input accumulator, reused between tags.
    raw: Vec<u8>,

    #[cfg(debug_assertions)]
    open_parens: usize,
}

impl<'r, W: Write> Decoder<'r, W> {
    pub fn new(out: W) -> Self {
        Decoder {
            out,
            dict: None,
            fillers: false,
            caps: Vec::new(),
            phase: Phase::Header,
            header: HeaderDecoder::new(),
            prim: PrimState::OpenQuote,
            raw: Vec::new(),
            #[cfg(debug_assertions)]
            open_parens: 0,
        }
    }

    /// Resolve tag names and value formatters through `dict`.
    pub fn dictionary(mut self, dict: &'r Dictionary) -> Self {
        self.dict = Some(dict);
        self
    }

    /// Skip 0xFF filler octets between top-level tags (tape-style padding
    /// in telecom CDR files).
    pub fn fillers(mut self, enabled: bool) -> Self {
        self.fillers = enabled;
        self
    }

    /// Consume as much of `stream` as possible.
    ///
    /// The cursor is advanced by the number of bytes actually consumed,
    /// including on error, so the driver can report an exact offset.
    pub fn decode<'a>(&mut self, stream: &mut Stream<'a>) -> Result<Step, Error> {
        let Stream::Chunk(mut master) = *stream else {
            return self.finish();
        };
        let result = self.step_chunk(&mut master);
        *stream = Stream::Chunk(master);
        result
    }

    /// EOF with an empty stack is success; anything else means the input
    /// was cut short.
    fn finish(&mut self) -> Result<Step, Error> {
        if self.caps.is_empty() && !self.header.in_progress() {
            self.out.flush()?;
            Ok(Step::Done)
        } else {
            Err(Error::UnexpectedEof)
        }
    }

    fn step_chunk<'a>(&mut self, master: &mut &'a [u8]) -> Result<Step, Error> {
        loop {
            let data = *master;
            // Clip the visible window to the innermost capacity.
            let clip = match self.caps.last() {
                Some(&rem) if rem < data.len() as u64 => rem as usize,
                _ => data.len(),
            };
            // Whether the window reaches the end of the current tag.
            let enough = match self.caps.last() {
                Some(&rem) => rem <= clip as u64,
                None => false,
            };

            let mut sub = Stream::Chunk(&data[..clip]);
            let step = match self.phase {
                Phase::Header => {
                    let at_root = self.caps.is_empty();
                    self.header.step(&mut sub, self.fillers && at_root)
                }
                Phase::Contents => self.step_contents(enough, &mut sub),
            };

            let consumed = clip - sub.len();
            for cap in &mut self.caps {
                *cap -= consumed as u64;
            }
            *master = &data[consumed..];
            trace!(
                phase = ?self.phase,
                depth = self.caps.len(),
                consumed,
                left = master.len(),
                "decoder step"
            );

            match step? {
                Step::Continue => {
                    if !master.is_empty() {
                        // The container boundary fell inside this tag's
                        // header: the tag cannot fit.
                        return Err(Error::TagOverflowsContainer);
                    }
                    return Ok(Step::Continue);
                }
                Step::Done => match self.phase {
                    Phase::Header => self.open_tag()?,
                    Phase::Contents => {
                        self.phase = Phase::Header;
                        self.close_drained()?;
                        self.line_feed()?;
                    }
                },
            }
        }
    }

    /// A complete header: print the tag name, account for its contents.
    fn open_tag(&mut self) -> Result<(), Error> {
        let tag = self.header.header();
        self.out.write_all(b"(")?;
        #[cfg(debug_assertions)]
        {
            self.open_parens += 1;
        }
        self.show_name(tag.class, tag.number)?;

        if tag.length == 0 {
            self.out.write_all(if tag.constructed { b" ()" } else { b" \"\"" })?;
            self.caps.push(0);
            self.close_drained()?;
            self.line_feed()?;
            return Ok(());
        }

        if let Some(&rem) = self.caps.last() {
            if tag.length > rem {
                return Err(Error::TagOverflowsContainer);
            }
        }
        self.caps.push(tag.length);
        self.check_invariant();

        if tag.constructed {
            // The first child starts on the next, deeper line.
            self.line_feed()?;
        } else {
            self.out.write_all(b" ")?;
            self.phase = Phase::Contents;
            self.prim = match self.dict.and_then(|d| d.format_of(tag.class, tag.number)) {
                Some(format) => {
                    self.raw.clear();
                    PrimState::Collect(format)
                }
                None => PrimState::OpenQuote,
            };
        }
        Ok(())
    }

    /// Print a primitive's contents.
    ///
    /// `enough` tells whether the clipped window reaches the end of the
    /// tag; without it the printer suspends once the window is drained.
    fn step_contents(&mut self, enough: bool, sub: &mut Stream<'_>) -> Result<Step, Error> {
        loop {
            match self.prim {
                PrimState::OpenQuote => {
                    self.out.write_all(b"\"")?;
                    self.prim = PrimState::FirstOctet;
                }
                PrimState::FirstOctet => {
                    let Some(c) = sub.head()? else {
                        if enough {
                            break;
                        }
                        return Ok(Step::Continue);
                    };
                    write!(self.out, "{c:02x}")?;
                    self.prim = PrimState::MoreOctets;
                }
                PrimState::MoreOctets => {
                    while let Some(c) = sub.head()? {
                        write!(self.out, " {c:02x}")?;
                    }
                    if !enough {
                        return Ok(Step::Continue);
                    }
                    break;
                }
                PrimState::Collect(format) => {
                    if let Stream::Chunk(data) = *sub {
                        self.raw.extend_from_slice(data);
                        sub.advance(data.len());
                    }
                    if !enough {
                        return Ok(Step::Continue);
                    }
                    self.render_formatted(format)?;
                    return Ok(Step::Done);
                }
            }
        }
        self.out.write_all(b"\"")?;
        Ok(Step::Done)
    }

    /// Run the formatter over the accumulated bytes; fall back to the hex
    /// dump if it rejects them.
    fn render_formatted(&mut self, format: ValueFormat) -> Result<(), Error> {
        match format.decode(&self.raw) {
            Ok(text) => write!(self.out, "[{text}]")?,
            Err(err) => {
                warn!(%err, "value formatter failed, dumping as hex");
                self.out.write_all(b"\"")?;
                for (i, c) in self.raw.iter().enumerate() {
                    if i > 0 {
                        self.out.write_all(b" ")?;
                    }
                    write!(self.out, "{c:02x}")?;
                }
                self.out.write_all(b"\"")?;
            }
        }
        Ok(())
    }

    fn show_name(&mut self, class: TagClass, number: u32) -> Result<(), Error> {
        match self.dict.and_then(|d| d.name_of(class, number)) {
            Some(name) => write!(self.out, ":{name}")?,
            None => write!(self.out, "{}{}", class.letter(), number)?,
        }
        Ok(())
    }

    /// Pop drained capacities, closing one parenthesis for each. The
    /// cascade can close several nested tags at once.
    fn close_drained(&mut self) -> Result<(), Error> {
        while let Some(&0) = self.caps.last() {
            self.caps.pop();
            self.out.write_all(b")")?;
            #[cfg(debug_assertions)]
            {
                self.open_parens -= 1;
            }
        }
        self.check_invariant();
        Ok(())
    }

    fn line_feed(&mut self) -> Result<(), Error> {
        self.out.write_all(b"\n")?;
        for _ in 0..self.caps.len() {
            self.out.write_all(INDENT)?;
        }
        Ok(())
    }

    fn check_invariant(&self) {
        // Capacities never increase from the innermost container outward.
        debug_assert!(self.caps.windows(2).all(|w| w[0] >= w[1]));
        #[cfg(debug_assertions)]
        debug_assert_eq!(self.open_parens, self.caps.len());
    }
}
