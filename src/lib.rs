//! Streaming codec between ASN.1 DER octets and a human-readable
//! S-expression form.
//!
//! Both directions are push-based: the driver feeds byte chunks of
//! arbitrary size and the codec suspends whenever it runs out of input,
//! resuming exactly where it left off on the next call. The decoder walks
//! the tag tree incrementally, enforcing per-container byte budgets across
//! chunk boundaries; the encoder builds a tag tree whose length fields are
//! computed bottom-up before serialization.
//!
//! Useful as a diagnostic and manipulation aid for TLS certificates,
//! telecom CDR records (3GPP TAP) and other DER-carrying protocols.
//!
//! Reference: ITU-T X.690 (ISO/IEC 8825-1:2015), definite-length form
//! only. Indefinite-length encodings are rejected.
//!
//! ```
//! use der_sexp::{Decoder, Step, Stream};
//!
//! let mut out = Vec::new();
//! let mut decoder = Decoder::new(&mut out);
//!
//! // Chunks may be split anywhere, even inside a header.
//! let mut chunk = Stream::Chunk(&[0x04, 0x03, 0x01]);
//! assert_eq!(decoder.decode(&mut chunk).unwrap(), Step::Continue);
//! let mut chunk = Stream::Chunk(&[0x02, 0x03]);
//! assert_eq!(decoder.decode(&mut chunk).unwrap(), Step::Continue);
//! assert_eq!(decoder.decode(&mut Stream::Eof).unwrap(), Step::Done);
//!
//! drop(decoder);
//! assert_eq!(out, b"(u4 \"01 02 03\")\n");
//! ```

pub mod codec;
pub mod decoder;
pub mod driver;
pub mod encoder;
pub mod format;
pub mod header;
pub mod repr;
pub mod stream;

pub use codec::{Codec, Direction};
pub use decoder::Decoder;
pub use driver::{DEFAULT_BLOCK_SIZE, PumpError, pump};
pub use encoder::Encoder;
pub use format::{CallTransactionType, FormatError, ValueFormat};
pub use header::{TagClass, TagHeader};
pub use repr::{ConfError, Dictionary};
pub use stream::{Step, Stream};

use std::io;

use thiserror::Error;

/// Protocol violations the codec state machines report.
///
/// Any of these aborts the current document; the codec instance may then
/// simply be dropped.
#[derive(Debug, Error)]
pub enum Error {
    /// The input ended inside a tag (decoder) or inside an open tag
    /// expression (encoder).
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// A tag number does not fit into 30 bits.
    #[error("tag number is too big")]
    TagNumberTooBig,

    /// More than ten decimal digits in a tag number.
    #[error("invalid tag number: too many digits")]
    TagNumberTooLong,

    /// The reserved initial length octet 0xFF [X.690, 8.1.3.5-c].
    #[error("length encoding is invalid")]
    InvalidLength,

    /// The indefinite-length marker 0x80; DER requires definite lengths.
    #[error("indefinite length is not allowed in DER")]
    IndefiniteLength,

    /// A long-form length with more than eight length octets.
    #[error("length of length exceeds 8 octets")]
    LengthOfLengthTooBig,

    /// A nested tag claims more bytes than its container has left.
    #[error("tag is too big for its container")]
    TagOverflowsContainer,

    /// A character other than `u', `a', `c' or `p' where a tag class was
    /// expected.
    #[error("invalid tag class specification")]
    InvalidTagClass,

    /// Some other character than the one the grammar requires here.
    #[error("{0} expected")]
    Expected(&'static str),

    /// Writing to the output sink failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}
