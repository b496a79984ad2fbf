//! End-to-end properties of the decoder/encoder pair: the concrete
//! scenarios, the round-trip laws, and chunking invariance.

use der_sexp::{Decoder, Dictionary, Encoder, Error, Step, Stream};
use pretty_assertions::assert_eq;

/// Decode a complete byte sequence fed in chunks of `chunk` bytes.
fn decode_chunked(input: &[u8], chunk: usize) -> Result<String, Error> {
    let mut out = Vec::new();
    let mut decoder = Decoder::new(&mut out);
    for part in input.chunks(chunk.max(1)) {
        let mut stream = Stream::Chunk(part);
        let step = decoder.decode(&mut stream)?;
        assert_eq!(step, Step::Continue);
        assert!(stream.is_empty(), "decoder left bytes unconsumed");
    }
    assert_eq!(decoder.decode(&mut Stream::Eof)?, Step::Done);
    drop(decoder);
    Ok(String::from_utf8(out).expect("decoder output is ASCII"))
}

fn decode(input: &[u8]) -> Result<String, Error> {
    decode_chunked(input, input.len().max(1))
}

/// Encode a complete S-expression fed in chunks of `chunk` bytes.
fn encode_chunked(input: &str, chunk: usize) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    let mut encoder = Encoder::new(&mut out);
    for part in input.as_bytes().chunks(chunk.max(1)) {
        let mut stream = Stream::Chunk(part);
        let step = encoder.encode(&mut stream)?;
        assert_eq!(step, Step::Continue);
        assert!(stream.is_empty(), "encoder left bytes unconsumed");
    }
    assert_eq!(encoder.encode(&mut Stream::Eof)?, Step::Done);
    drop(encoder);
    Ok(out)
}

fn encode(input: &str) -> Result<Vec<u8>, Error> {
    encode_chunked(input, input.len().max(1))
}

/// A sequence nested `depth` containers deep around an empty octet
/// string.
fn deeply_nested(depth: usize) -> Vec<u8> {
    let mut bytes = vec![0x04, 0x00];
    for _ in 0..depth {
        let mut wrapper = vec![0x30, bytes.len() as u8];
        wrapper.extend_from_slice(&bytes);
        bytes = wrapper;
    }
    bytes
}

/// Well-formed DER documents used by the law tests.
fn samples() -> Vec<Vec<u8>> {
    let mut long_value = vec![0x04, 0x81, 0x80];
    long_value.extend((0u8..128).map(|i| i.wrapping_mul(3)));

    vec![
        // Minimal primitive.
        vec![0x04, 0x03, 0x01, 0x02, 0x03],
        // Nested constructed.
        vec![0x30, 0x05, 0x04, 0x03, 0x01, 0x02, 0x03],
        // High tag number.
        vec![0x5F, 0x1F, 0x01, 0x42],
        // Long length.
        long_value,
        // Empty constructed, empty primitive.
        vec![0x30, 0x00],
        vec![0x04, 0x00],
        // Siblings and deeper nesting across all classes, followed by a
        // second document.
        vec![
            0x30, 0x0F, 0x04, 0x01, 0xAA, 0xA2, 0x06, 0x80, 0x01, 0xBB, 0x81, 0x01, 0xCC,
            0x64, 0x02, 0x44, 0x00, 0x30, 0x00,
        ],
        // Two documents back to back.
        vec![0x04, 0x01, 0xAA, 0x30, 0x03, 0x04, 0x01, 0xBB],
        // Twenty nested containers closing in one cascade.
        deeply_nested(20),
    ]
}

// -- Concrete scenarios ------------------------------------------------

#[test]
fn scenario_minimal_primitive() {
    assert_eq!(decode(&[0x04, 0x03, 0x01, 0x02, 0x03]).unwrap(), "(u4 \"01 02 03\")\n");
}

#[test]
fn scenario_nested_constructed() {
    assert_eq!(
        decode(&[0x30, 0x05, 0x04, 0x03, 0x01, 0x02, 0x03]).unwrap(),
        "(u16\n    (u4 \"01 02 03\"))\n"
    );
}

#[test]
fn scenario_high_tag_number() {
    assert_eq!(decode(&[0x5F, 0x1F, 0x01, 0x42]).unwrap(), "(a31 \"42\")\n");
}

#[test]
fn scenario_long_length() {
    let mut input = vec![0x04, 0x81, 0x80];
    input.extend(0u8..128);
    let text = decode(&input).unwrap();

    // Encoding the same S-expression must regenerate the long form.
    let encoded = encode(&text).unwrap();
    assert_eq!(encoded[..3], [0x04, 0x81, 0x80]);
    assert_eq!(encoded, input);
}

#[test]
fn scenario_containment_violation() {
    let err = decode(&[0x30, 0x03, 0x04, 0x05, 0x01, 0x02, 0x03, 0x04, 0x05]).unwrap_err();
    assert_eq!(err.to_string(), "tag is too big for its container");
}

#[test]
fn scenario_empty_constructed() {
    assert_eq!(decode(&[0x30, 0x00]).unwrap(), "(u16 ())\n");
    assert_eq!(encode("(u16 ())\n").unwrap(), [0x30, 0x00]);
}

// -- Round-trip laws ---------------------------------------------------

#[test]
fn law_decode_then_encode_is_identity() {
    for bytes in samples() {
        let text = decode(&bytes).unwrap();
        assert_eq!(encode(&text).unwrap(), bytes, "document {bytes:02x?}");
    }
}

#[test]
fn law_encode_then_decode_modulo_whitespace() {
    let sources = [
        "(u4 \"01 02 03\")",
        "( u16 ( u4 \"01\" )\t( c7 \"ff\" ) )",
        "(a31 \"42\")",
        "(u16 ())",
        "(p30 (u4 \"\"))",
    ];
    // The grammar pins every meaningful space (hex pairs are always
    // two-digit and space-separated), so stripping whitespace entirely is
    // a faithful equivalence.
    let normalize = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
    for source in sources {
        let bytes = encode(source).unwrap();
        let text = decode(&bytes).unwrap();
        assert_eq!(normalize(&text), normalize(source), "source {source:?}");
    }
}

// -- Chunking invariance -----------------------------------------------

#[test]
fn law_decoder_chunking_invariance() {
    for bytes in samples() {
        let whole = decode(&bytes).unwrap();
        for chunk in 1..=bytes.len() {
            assert_eq!(decode_chunked(&bytes, chunk).unwrap(), whole, "chunk size {chunk}");
        }
    }
}

#[test]
fn law_encoder_chunking_invariance() {
    let text = "(u16\n    (u4 \"01 02 03\")\n    (a31 \"aa bb\")\n    (c9 ()))\n";
    let whole = encode(text).unwrap();
    for chunk in 1..=text.len() {
        assert_eq!(encode_chunked(text, chunk).unwrap(), whole, "chunk size {chunk}");
    }
}

/// Splitting exactly once at every position exercises each suspension
/// point of a multi-byte header (high tag number, long length).
#[test]
fn law_every_split_of_a_hard_header() {
    let mut bytes = vec![0x5F, 0x81, 0x05, 0x81, 0x81];
    bytes.extend(std::iter::repeat_n(0x5A, 0x81));
    let whole = decode(&bytes).unwrap();

    for split in 0..=bytes.len() {
        let (a, b) = bytes.split_at(split);
        let mut out = Vec::new();
        let mut decoder = Decoder::new(&mut out);
        for part in [a, b] {
            let mut stream = Stream::Chunk(part);
            decoder.decode(&mut stream).unwrap();
            assert!(stream.is_empty());
        }
        assert_eq!(decoder.decode(&mut Stream::Eof).unwrap(), Step::Done);
        drop(decoder);
        assert_eq!(String::from_utf8(out).unwrap(), whole, "split at {split}");
    }
}

// -- Boundary and failure cases ---------------------------------------

#[test]
fn empty_input_decodes_to_empty_output() {
    assert_eq!(decode(&[]).unwrap(), "");
    let mut decoder = Decoder::new(Vec::new());
    assert_eq!(decoder.decode(&mut Stream::Eof).unwrap(), Step::Done);
}

#[test]
fn eof_inside_a_container() {
    assert!(matches!(decode(&[0x30, 0x05, 0x04, 0x03, 0x01]), Err(Error::UnexpectedEof)));
}

#[test]
fn eof_inside_a_header() {
    assert!(matches!(decode(&[0x04, 0x81]), Err(Error::UnexpectedEof)));
}

#[test]
fn indefinite_length_rejected() {
    assert!(matches!(decode(&[0x30, 0x80, 0x04, 0x00, 0x00, 0x00]), Err(Error::IndefiniteLength)));
}

#[test]
fn encoder_rejects_formatter_brackets() {
    // Formatter renderings are not part of the encoder grammar.
    assert!(matches!(encode("(u4 [123456])"), Err(Error::Expected(_))));
}

/// A tape-padded CDR record through the whole stack: driver, dictionary,
/// fillers, formatters.
#[test]
fn cdr_record_end_to_end() {
    use der_sexp::{Codec, Direction, pump};
    use std::io::Cursor;

    let dict = Dictionary::parse_str(
        "\
         a0   transferBatch\n\
         a16  imsi                  tbcd\n\
         c0   callTransactionType   transaction_type\n\
         c5   chargingTime          bcd\n",
        "tap.conf",
    )
    .unwrap();

    let mut record = vec![0xFF, 0xFF];
    record.extend([
        0x60, 0x0C, // transferBatch, 12 content bytes
        0x50, 0x03, 0x21, 0x43, 0xF5, // imsi 12345
        0x80, 0x01, 0x1B, // callTransactionType transit
        0x85, 0x02, 0x20, 0x26, // chargingTime 2026
    ]);
    record.extend([0xFF, 0xFF]);

    let mut out = Vec::new();
    let mut codec = Codec::new(Direction::Decode, &mut out, Some(&dict), true);
    pump(&mut codec, Cursor::new(&record), 4).unwrap();
    drop(codec);

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "(:transferBatch\n    (:imsi [12345])\n    (:callTransactionType [transit (27)])\n    \
         (:chargingTime [2026]))\n"
    );
}

#[test]
fn dictionary_output_is_not_reencodable() {
    let dict = Dictionary::parse_str("a16 imsi tbcd\n", "t.conf").unwrap();
    let mut out = Vec::new();
    let mut decoder = Decoder::new(&mut out).dictionary(&dict);
    let mut stream = Stream::Chunk(&[0x50, 0x02, 0x21, 0x43]);
    decoder.decode(&mut stream).unwrap();
    assert_eq!(decoder.decode(&mut Stream::Eof).unwrap(), Step::Done);
    drop(decoder);
    assert_eq!(out, b"(:imsi [1234])\n");

    // The symbolic form deliberately does not parse back.
    assert!(encode(std::str::from_utf8(&out).unwrap()).is_err());
}
