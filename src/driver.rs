//! The enumerator: reads blocks from a byte source and feeds them to a
//! codec until it completes.

use std::io::{self, Read, Write};

use thiserror::Error as ThisError;
use tracing::trace;

use crate::Error;
use crate::codec::Codec;
use crate::stream::{Step, Stream};

/// Chunk size used when the source has no better hint.
pub const DEFAULT_BLOCK_SIZE: usize = 8 * 1024;

/// A codec failure located within the input.
#[derive(Debug, ThisError)]
#[error("byte {offset}: {source}")]
pub struct PumpError {
    /// Offset of the first unconsumed input byte.
    pub offset: u64,
    #[source]
    pub source: Error,
}

/// Pump `input` through `codec` until the codec reports completion.
///
/// The read buffer is reused between blocks; the codec never holds on to
/// it across calls. Errors carry the byte offset they were detected at.
pub fn pump<R: Read, W: Write>(
    codec: &mut Codec<'_, W>,
    mut input: R,
    block_size: usize,
) -> Result<(), PumpError> {
    let mut buf = vec![0u8; block_size.max(1)];
    let mut offset = 0u64;

    loop {
        let n = match input.read(&mut buf) {
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(PumpError { offset, source: Error::Io(err) }),
        };
        trace!(n, offset, "block read");

        let mut stream = if n == 0 { Stream::Eof } else { Stream::Chunk(&buf[..n]) };
        let before = stream.len();
        let step = codec.run(&mut stream);
        offset += (before - stream.len()) as u64;

        match step {
            Ok(Step::Done) => return Ok(()),
            Ok(Step::Continue) => {
                debug_assert!(stream.is_empty(), "codec suspended with bytes left over");
                debug_assert!(n > 0, "EOF must resolve to Done or an error");
            }
            Err(source) => return Err(PumpError { offset, source }),
        }
    }
}
