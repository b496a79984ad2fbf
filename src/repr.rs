//! Tag representation dictionary.
//!
//! Maps `(class, number)` pairs to human-friendly tag names and,
//! optionally, to a value formatter for primitive contents. Dictionaries
//! load from the `.conf` dialect:
//!
//! ```text
//! # chargeable subscriber record
//! a16  imsi                 tbcd
//! c0   callTransactionType  transaction_type
//! u4   payload
//! ```
//!
//! One entry per line: a tag spec (class letter plus decimal number), the
//! name, and an optional value codec. A `plugin.codec` form is accepted
//! for compatibility with older configs; the plugin part is ignored.
//! `#` starts a comment. The dictionary is read-only once loaded and may
//! be shared across codec instances.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use nom::{
    IResult, Parser,
    bytes::complete::take_while,
    character::complete::{char, digit1, one_of, satisfy, space1},
    combinator::{all_consuming, map_res, opt, recognize},
    sequence::preceded,
};
use thiserror::Error;
use tracing::warn;

use crate::format::ValueFormat;
use crate::header::TagClass;

/// Errors from loading a representation config.
#[derive(Debug, Error)]
pub enum ConfError {
    #[error("{path}:{line}: syntax error")]
    Syntax { path: String, line: usize },

    #[error("{path}:{line}: duplicate entry for tag `{tag}'")]
    Duplicate { path: String, line: usize, tag: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// How one tag should be presented.
#[derive(Debug, Clone)]
struct Repr {
    name: String,
    format: Option<ValueFormat>,
}

/// Read-only lookup table from `(class, number)` to tag representation.
#[derive(Debug, Default, Clone)]
pub struct Dictionary {
    entries: HashMap<(TagClass, u32), Repr>,
}

impl Dictionary {
    /// Load a dictionary from a `.conf` file.
    pub fn load(path: &Path) -> Result<Self, ConfError> {
        let text = fs::read_to_string(path)?;
        Self::parse_str(&text, &path.display().to_string())
    }

    /// Parse config text; `origin` is used in error messages only.
    pub fn parse_str(text: &str, origin: &str) -> Result<Self, ConfError> {
        let mut dict = Dictionary::default();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.split_once('#').map_or(raw, |(head, _)| head).trim();
            if line.is_empty() {
                continue;
            }
            let Ok((_, ((class, number), name, codec))) =
                all_consuming(entry).parse(line)
            else {
                return Err(ConfError::Syntax { path: origin.into(), line: index + 1 });
            };

            let format = codec.and_then(|codec| {
                let format = ValueFormat::by_name(codec);
                if format.is_none() {
                    warn!(codec, "unknown value codec, tag will dump as hex");
                }
                format
            });
            let repr = Repr { name: name.into(), format };
            if dict.entries.insert((class, number), repr).is_some() {
                return Err(ConfError::Duplicate {
                    path: origin.into(),
                    line: index + 1,
                    tag: format!("{}{}", class.letter(), number),
                });
            }
        }
        Ok(dict)
    }

    /// Symbolic name for a tag, if the config assigned one.
    pub fn name_of(&self, class: TagClass, number: u32) -> Option<&str> {
        self.entries.get(&(class, number)).map(|repr| repr.name.as_str())
    }

    /// Value formatter for a primitive tag, if the config assigned one.
    pub fn format_of(&self, class: TagClass, number: u32) -> Option<ValueFormat> {
        self.entries.get(&(class, number)).and_then(|repr| repr.format)
    }
}

fn tag_spec(input: &str) -> IResult<&str, (TagClass, u32)> {
    let (input, class) = one_of("uacp").parse(input)?;
    let (input, number) = map_res(digit1, str::parse).parse(input)?;
    let class = match class {
        'u' => TagClass::Universal,
        'a' => TagClass::Application,
        'c' => TagClass::Context,
        _ => TagClass::Private,
    };
    Ok((input, (class, number)))
}

/// `[a-zA-Z][a-zA-Z0-9_]*`
fn identifier(input: &str) -> IResult<&str, &str> {
    recognize((
        satisfy(|c: char| c.is_ascii_alphabetic()),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

/// A codec reference, optionally qualified by a plugin name.
fn codec_ref(input: &str) -> IResult<&str, &str> {
    let (input, first) = identifier(input)?;
    let (input, second) = opt(preceded(char('.'), identifier)).parse(input)?;
    Ok((input, second.unwrap_or(first)))
}

#[allow(clippy::type_complexity)]
fn entry(input: &str) -> IResult<&str, ((TagClass, u32), &str, Option<&str>)> {
    let (input, spec) = tag_spec(input)?;
    let (input, _) = space1.parse(input)?;
    let (input, name) = identifier(input)?;
    let (input, codec) = opt(preceded(space1, codec_ref)).parse(input)?;
    Ok((input, (spec, name, codec)))
}
