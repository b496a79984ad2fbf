//! Codec selection: one wrapper the driver can pump regardless of
//! direction.

use std::io::Write;

use crate::Error;
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::repr::Dictionary;
use crate::stream::{Step, Stream};

/// Which way the bytes flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// DER octets in, S-expressions out.
    Decode,
    /// S-expressions in, DER octets out.
    Encode,
}

/// A decoder or an encoder behind one `run` entry point.
///
/// Each instance owns its state exclusively; two documents may be
/// processed concurrently only by holding two instances. The dictionary
/// is shared read-only.
pub enum Codec<'r, W> {
    Decode(Decoder<'r, W>),
    Encode(Encoder<W>),
}

impl<'r, W: Write> Codec<'r, W> {
    pub fn new(
        direction: Direction,
        out: W,
        dict: Option<&'r Dictionary>,
        fillers: bool,
    ) -> Self {
        match direction {
            Direction::Decode => {
                let mut decoder = Decoder::new(out).fillers(fillers);
                if let Some(dict) = dict {
                    decoder = decoder.dictionary(dict);
                }
                Codec::Decode(decoder)
            }
            Direction::Encode => Codec::Encode(Encoder::new(out)),
        }
    }

    /// Feed one chunk (or EOF) to the selected codec.
    pub fn run<'a>(&mut self, stream: &mut Stream<'a>) -> Result<Step, Error> {
        match self {
            Codec::Decode(decoder) => decoder.decode(stream),
            Codec::Encode(encoder) => encoder.encode(stream),
        }
    }
}
