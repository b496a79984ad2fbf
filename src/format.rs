//! Primitive-value formatters.
//!
//! A formatter turns the raw contents octets of a primitive tag into a
//! printable string; the decoder shows the result in `[…]` brackets
//! instead of a hex dump. Formatter failures are non-fatal: the decoder
//! logs a warning and falls back to hex.

use derive_try_from_primitive::TryFromPrimitive;
use thiserror::Error;

/// A value the formatter could not make sense of. The raw bytes are still
/// shown to the user, as hex.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("invalid TBCD byte {0:#04x}")]
    InvalidTbcd(u8),

    #[error("TBCD terminator in the middle of a string ({0:#04x})")]
    TbcdFiller(u8),

    #[error("invalid BCD byte {0:#04x}")]
    InvalidBcd(u8),

    #[error("{expected} byte(s) expected, {received} received")]
    WrongLength { expected: usize, received: usize },

    #[error("unassigned call transaction type ({0})")]
    UnknownTransaction(u8),
}

/// The well-known contents encodings a dictionary entry can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    /// Telephony BCD: swapped nibbles, 0xF terminator, trailing 0xFF tape
    /// fillers.
    Tbcd,
    /// Plain packed BCD, high nibble first.
    Bcd,
    /// One-byte call transaction type from CDR records.
    CallTransaction,
}

impl ValueFormat {
    /// Resolve a codec name from a representation config. Old-style
    /// plugin codec names are accepted as aliases.
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "tbcd" | "TBCDstring" => Some(ValueFormat::Tbcd),
            "bcd" | "BCDstring" => Some(ValueFormat::Bcd),
            "transaction_type" | "callTransactionType" => Some(ValueFormat::CallTransaction),
            _ => None,
        }
    }

    /// Render raw contents octets as printable text.
    pub fn decode(self, raw: &[u8]) -> Result<String, FormatError> {
        match self {
            ValueFormat::Tbcd => decode_tbcd(raw),
            ValueFormat::Bcd => decode_bcd(raw),
            ValueFormat::CallTransaction => decode_call_transaction(raw),
        }
    }
}

/// Telephony Binary Coded Decimal [3GPP TS 29.002].
///
/// Each octet carries two digits, least significant nibble first; an
/// unused high nibble in the last octet is set to 0xF. Tape-padded
/// records append whole 0xFF filler octets, which are ignored.
fn decode_tbcd(raw: &[u8]) -> Result<String, FormatError> {
    let mut digits = raw;
    while let Some((&0xFF, head)) = digits.split_last() {
        digits = head;
    }

    let mut text = String::with_capacity(digits.len() * 2);
    for (i, &byte) in digits.iter().enumerate() {
        let low = byte & 0x0F;
        let high = byte >> 4;
        if low >= 10 || (high >= 10 && high != 0x0F) {
            return Err(FormatError::InvalidTbcd(byte));
        }
        text.push(char::from(b'0' + low));
        if high != 0x0F {
            text.push(char::from(b'0' + high));
        } else if i + 1 != digits.len() {
            return Err(FormatError::TbcdFiller(byte));
        }
    }
    Ok(text)
}

/// Plain packed BCD, high nibble first.
fn decode_bcd(raw: &[u8]) -> Result<String, FormatError> {
    let mut text = String::with_capacity(raw.len() * 2);
    for &byte in raw {
        let high = byte >> 4;
        let low = byte & 0x0F;
        if high >= 10 || low >= 10 {
            return Err(FormatError::InvalidBcd(byte));
        }
        text.push(char::from(b'0' + high));
        text.push(char::from(b'0' + low));
    }
    Ok(text)
}

/// Call transaction type codes carried in CDR records.
///
/// Gaps are reserved codes; decoding one is a format error and the value
/// falls back to hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
#[non_exhaustive]
#[rustfmt::skip]
pub enum CallTransactionType {
  Default                   =   0,
  MoCall                    =   1,
  MtCall                    =   2,
  EmergencyCall             =   3,
  MoShortMessage            =   4,
  MtShortMessage            =   5,
  MoCallAttempt             =   6,
  MtCallAttempt             =   7,
  RoamingCall               =  12,
  RoamingCallAttempt        =  13,
  Transit                   =  27,
  TransitAttempt            =  28,
  CallForwarding            =  29,
  CallForwardingAttempt     =  30,
  MoLocationRequest         =  37,
  MoLocationRequestAttempt  =  38,
  MtLocationRequest         =  39,
  VoiceGroupServiceRmsc     =  46,
  VoiceBroadcastServiceRmsc =  47,
  SupplementaryService      = 120,
  UssdCall                  = 125,
}

impl CallTransactionType {
    /// The symbol used in CDR processing tools.
    pub fn symbol(self) -> &'static str {
        match self {
            CallTransactionType::Default => "default",
            CallTransactionType::MoCall => "moCall",
            CallTransactionType::MtCall => "mtCall",
            CallTransactionType::EmergencyCall => "emergencyCall",
            CallTransactionType::MoShortMessage => "moShortMessage",
            CallTransactionType::MtShortMessage => "mtShortMessage",
            CallTransactionType::MoCallAttempt => "moCallAttempt",
            CallTransactionType::MtCallAttempt => "mtCallAttempt",
            CallTransactionType::RoamingCall => "roamingCall",
            CallTransactionType::RoamingCallAttempt => "roamingCallAttempt",
            CallTransactionType::Transit => "transit",
            CallTransactionType::TransitAttempt => "transitAttempt",
            CallTransactionType::CallForwarding => "callForwarding",
            CallTransactionType::CallForwardingAttempt => "callForwardingAttempt",
            CallTransactionType::MoLocationRequest => "moLocationRequest",
            CallTransactionType::MoLocationRequestAttempt => "moLocationRequestAttempt",
            CallTransactionType::MtLocationRequest => "mtLocationRequest",
            CallTransactionType::VoiceGroupServiceRmsc => "voiceGroupServiceRMSC",
            CallTransactionType::VoiceBroadcastServiceRmsc => "voiceBroadcastServiceRMSC",
            CallTransactionType::SupplementaryService => "supplementaryService",
            CallTransactionType::UssdCall => "ussdCall",
        }
    }
}

fn decode_call_transaction(raw: &[u8]) -> Result<String, FormatError> {
    let [byte] = raw else {
        return Err(FormatError::WrongLength { expected: 1, received: raw.len() });
    };
    let transaction =
        CallTransactionType::try_from(*byte).map_err(FormatError::UnknownTransaction)?;
    Ok(format!("{} ({})", transaction.symbol(), byte))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tbcd_even_digits() {
        assert_eq!(ValueFormat::Tbcd.decode(&[0x21, 0x43, 0x65]).unwrap(), "123456");
    }

    #[test]
    fn test_tbcd_odd_digits_terminated() {
        assert_eq!(ValueFormat::Tbcd.decode(&[0x21, 0xF3]).unwrap(), "123");
    }

    #[test]
    fn test_tbcd_trailing_fillers_stripped() {
        assert_eq!(ValueFormat::Tbcd.decode(&[0x21, 0xFF, 0xFF]).unwrap(), "12");
    }

    #[test]
    fn test_tbcd_invalid_nibble() {
        assert_eq!(ValueFormat::Tbcd.decode(&[0x2B]), Err(FormatError::InvalidTbcd(0x2B)));
    }

    #[test]
    fn test_tbcd_terminator_not_last() {
        assert_eq!(ValueFormat::Tbcd.decode(&[0xF1, 0x32]), Err(FormatError::TbcdFiller(0xF1)));
    }

    #[test]
    fn test_tbcd_empty() {
        assert_eq!(ValueFormat::Tbcd.decode(&[]).unwrap(), "");
    }

    #[test]
    fn test_bcd_digits() {
        assert_eq!(ValueFormat::Bcd.decode(&[0x20, 0x26, 0x07, 0x31]).unwrap(), "20260731");
    }

    #[test]
    fn test_bcd_invalid() {
        assert_eq!(ValueFormat::Bcd.decode(&[0x1A]), Err(FormatError::InvalidBcd(0x1A)));
    }

    #[test]
    fn test_call_transaction_symbols() {
        let cases: [(u8, &str); 5] = [
            (0, "default (0)"),
            (3, "emergencyCall (3)"),
            (27, "transit (27)"),
            (46, "voiceGroupServiceRMSC (46)"),
            (125, "ussdCall (125)"),
        ];
        for (code, rendered) in cases {
            assert_eq!(ValueFormat::CallTransaction.decode(&[code]).unwrap(), rendered);
        }
    }

    #[test]
    fn test_call_transaction_unassigned() {
        assert_eq!(
            ValueFormat::CallTransaction.decode(&[126]),
            Err(FormatError::UnknownTransaction(126))
        );
    }

    #[test]
    fn test_call_transaction_wrong_width() {
        assert_eq!(
            ValueFormat::CallTransaction.decode(&[27, 0]),
            Err(FormatError::WrongLength { expected: 1, received: 2 })
        );
    }

    #[test]
    fn test_by_name_aliases() {
        assert_eq!(ValueFormat::by_name("tbcd"), Some(ValueFormat::Tbcd));
        assert_eq!(ValueFormat::by_name("TBCDstring"), Some(ValueFormat::Tbcd));
        assert_eq!(ValueFormat::by_name("transaction_type"), Some(ValueFormat::CallTransaction));
        assert_eq!(ValueFormat::by_name("unknown"), None);
    }
}
