//! Ship names and identity classes.
//!
//! A ship name is a sequence of 3- or 6-character parts separated by `-`,
//! optionally written with a leading `~`. Every 6-character part is a
//! prefix syllable followed by a suffix syllable; a lone 3-character part
//! is a galaxy. Names with more than four parts are grouped in fours with
//! an empty part (`--`) between groups.
//!
//! # Example
//!
//! ```
//! use urbit_channel::ship::{ShipAddress, ShipClass};
//!
//! let ship: ShipAddress = "~tagfun-fossep".parse().unwrap();
//! assert_eq!(ship.class(), ShipClass::Planet);
//! assert_eq!(ship.short(), "tagfun-fossep");
//! assert_eq!(ship.to_string(), "~tagfun-fossep");
//! ```
//!
//! Comet validation does not check that the name descends from a galaxy;
//! any eight well-formed parts are accepted.

mod syllables;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Reasons a string is not a ship name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShipError {
    /// Empty part outside a group boundary, or a missing one at a boundary.
    #[error("invalid grouping of name parts")]
    InvalidGrouping,

    /// Part is neither 3 nor 6 characters, or is 3 characters in a
    /// multi-part name.
    #[error("invalid part length: {0:?}")]
    InvalidPartLength(String),

    /// Part contains a syllable missing from the syllable tables.
    #[error("invalid syllable in part {0:?}")]
    InvalidSyllable(String),

    /// Number of parts maps to no identity class.
    #[error("invalid number of parts: {0}")]
    InvalidPartCount(usize),
}

/// Identity class of a ship, derived from the shape of its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShipClass {
    Galaxy,
    Star,
    Planet,
    Moon,
    Comet,
    /// Auxiliary 3, 5 or 9 part names. Not addressable.
    Anon,
}

impl ShipClass {
    /// Whether ships of this class can be addressed on the network.
    pub fn is_addressable(self) -> bool {
        !matches!(self, ShipClass::Anon)
    }

    fn from_parts(parts: &[String]) -> Result<Self, ShipError> {
        if let [only] = parts {
            return Ok(if only.len() == 3 {
                ShipClass::Galaxy
            } else {
                ShipClass::Star
            });
        }

        if let Some(short) = parts.iter().find(|part| part.len() != 6) {
            return Err(ShipError::InvalidPartLength(short.clone()));
        }

        match parts.len() {
            2 => Ok(ShipClass::Planet),
            4 => Ok(ShipClass::Moon),
            8 => Ok(ShipClass::Comet),
            3 | 5 | 9 => Ok(ShipClass::Anon),
            n => Err(ShipError::InvalidPartCount(n)),
        }
    }
}

impl fmt::Display for ShipClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShipClass::Galaxy => "galaxy",
            ShipClass::Star => "star",
            ShipClass::Planet => "planet",
            ShipClass::Moon => "moon",
            ShipClass::Comet => "comet",
            ShipClass::Anon => "anon",
        };
        f.write_str(name)
    }
}

/// A validated, classified ship name.
///
/// Only obtainable through [`parse`] (or `str::parse`), so every value
/// satisfies the grouping, length and syllable rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShipAddress {
    parts: Vec<String>,
    name: String,
    class: ShipClass,
    short: String,
}

impl ShipAddress {
    /// Name parts in order, without separators.
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Canonical name without the leading `~`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> ShipClass {
        self.class
    }

    /// Abbreviated form for display.
    pub fn short(&self) -> &str {
        &self.short
    }
}

impl fmt::Display for ShipAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "~{}", self.name)
    }
}

impl FromStr for ShipAddress {
    type Err = ShipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Parse and classify a ship name.
pub fn parse(address: &str) -> Result<ShipAddress, ShipError> {
    let body = address.strip_prefix('~').unwrap_or(address);
    let parts = split_parts(body)?;

    for part in &parts {
        check_part(part)?;
    }

    let class = ShipClass::from_parts(&parts)?;
    let short = short_form(class, &parts);

    Ok(ShipAddress {
        name: canonical_name(&parts),
        parts,
        class,
        short,
    })
}

/// Split on `-`, enforcing an empty separator after every fourth part
/// that is followed by more parts.
fn split_parts(body: &str) -> Result<Vec<String>, ShipError> {
    let mut parts: Vec<String> = Vec::new();
    let mut separator_due = false;
    let mut part_due = false;

    for token in body.split('-') {
        if token.is_empty() {
            if !separator_due {
                return Err(ShipError::InvalidGrouping);
            }
            separator_due = false;
            part_due = true;
            continue;
        }

        if separator_due {
            return Err(ShipError::InvalidGrouping);
        }
        parts.push(token.to_string());
        part_due = false;
        separator_due = parts.len() % 4 == 0;
    }

    if part_due {
        return Err(ShipError::InvalidGrouping);
    }
    Ok(parts)
}

fn check_part(part: &str) -> Result<(), ShipError> {
    let length = part.chars().count();
    if length != 3 && length != 6 {
        return Err(ShipError::InvalidPartLength(part.to_string()));
    }
    if !part.is_ascii() {
        return Err(ShipError::InvalidSyllable(part.to_string()));
    }

    // A lone galaxy part is only checked for shape; its syllable is not
    // looked up.
    if length == 6 {
        let (prefix, suffix) = part.split_at(3);
        if !syllables::is_prefix(prefix) || !syllables::is_suffix(suffix) {
            return Err(ShipError::InvalidSyllable(part.to_string()));
        }
    }
    Ok(())
}

fn canonical_name(parts: &[String]) -> String {
    parts
        .chunks(4)
        .map(|group| group.join("-"))
        .collect::<Vec<_>>()
        .join("--")
}

fn short_form(class: ShipClass, parts: &[String]) -> String {
    let first = parts.first().map(String::as_str).unwrap_or_default();
    let last = parts.last().map(String::as_str).unwrap_or_default();

    match class {
        ShipClass::Galaxy | ShipClass::Star => first.to_string(),
        ShipClass::Planet => format!("{first}-{last}"),
        ShipClass::Moon => format!("{}^{}", parts[parts.len() - 2], last),
        ShipClass::Comet => format!("{first}_{last}"),
        ShipClass::Anon => "anonymous".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOON: &str = "dozzod-marnec-binbud-wanwes";
    const COMET: &str = "dozzod-marnec-binbud-wanwes--samsev-litper-sigsut-hidlet";

    #[test]
    fn galaxy() {
        let ship = parse("zod").unwrap();
        assert_eq!(ship.class(), ShipClass::Galaxy);
        assert_eq!(ship.short(), "zod");
        assert_eq!(ship.to_string(), "~zod");
    }

    #[test]
    fn star() {
        let ship = parse("marzod").unwrap();
        assert_eq!(ship.class(), ShipClass::Star);
        assert_eq!(ship.short(), "marzod");
    }

    #[test]
    fn planet() {
        let ship = parse("tagfun-fossep").unwrap();
        assert_eq!(ship.class(), ShipClass::Planet);
        assert_eq!(ship.short(), "tagfun-fossep");
        assert_eq!(ship.parts(), ["tagfun", "fossep"]);
    }

    #[test]
    fn moon_short_form_uses_last_two_parts() {
        let ship = parse(MOON).unwrap();
        assert_eq!(ship.class(), ShipClass::Moon);
        assert_eq!(ship.short(), "binbud^wanwes");
    }

    #[test]
    fn comet_short_form_uses_first_and_last() {
        let ship = parse(COMET).unwrap();
        assert_eq!(ship.class(), ShipClass::Comet);
        assert_eq!(ship.short(), "dozzod_hidlet");
        assert_eq!(ship.name(), COMET);
    }

    #[test]
    fn anon_part_counts() {
        for name in [
            "dozzod-marnec-binbud",
            "dozzod-marnec-binbud-wanwes--samsev",
            "dozzod-marnec-binbud-wanwes--samsev-litper-sigsut-hidlet--fidful",
        ] {
            let ship = parse(name).unwrap();
            assert_eq!(ship.class(), ShipClass::Anon, "{name}");
            assert_eq!(ship.short(), "anonymous");
            assert!(!ship.class().is_addressable());
        }
    }

    #[test]
    fn leading_sig_is_optional() {
        assert_eq!(parse("~zod").unwrap(), parse("zod").unwrap());
    }

    #[test]
    fn parse_is_deterministic() {
        assert_eq!(parse(COMET), parse(COMET));
        let once = parse("~tagfun-fossep").unwrap();
        let twice = parse(&once.to_string()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn seven_characters_is_invalid_length() {
        assert_eq!(
            parse("abcdefg"),
            Err(ShipError::InvalidPartLength("abcdefg".into()))
        );
    }

    #[test]
    fn galaxy_inside_multi_part_name_is_invalid_length() {
        assert_eq!(
            parse("zod-marzod"),
            Err(ShipError::InvalidPartLength("zod".into()))
        );
    }

    #[test]
    fn unknown_syllables() {
        // "zod" is a suffix, not a prefix.
        assert_eq!(
            parse("zodzod"),
            Err(ShipError::InvalidSyllable("zodzod".into()))
        );
        assert!(matches!(
            parse("tagfun-fosxxx"),
            Err(ShipError::InvalidSyllable(_))
        ));
    }

    #[test]
    fn galaxy_syllable_is_not_looked_up() {
        let ship = parse("abc").unwrap();
        assert_eq!(ship.class(), ShipClass::Galaxy);
        assert_eq!(ship.short(), "abc");
    }

    #[test]
    fn length_is_checked_before_syllables() {
        assert_eq!(parse("ö"), Err(ShipError::InvalidPartLength("ö".into())));
        assert_eq!(
            parse("zodö"),
            Err(ShipError::InvalidPartLength("zodö".into()))
        );
        // Right length in characters, but not ASCII.
        assert_eq!(
            parse("zodöxx"),
            Err(ShipError::InvalidSyllable("zodöxx".into()))
        );
    }

    #[test]
    fn grouping() {
        assert_eq!(parse(""), Err(ShipError::InvalidGrouping));
        assert_eq!(parse("-zod"), Err(ShipError::InvalidGrouping));
        assert_eq!(parse("marzod-"), Err(ShipError::InvalidGrouping));
        assert_eq!(parse("tagfun--fossep"), Err(ShipError::InvalidGrouping));
        // Missing separator after the fourth part.
        assert_eq!(
            parse("dozzod-marnec-binbud-wanwes-samsev"),
            Err(ShipError::InvalidGrouping)
        );
        // Separator with nothing after it.
        assert_eq!(
            parse("dozzod-marnec-binbud-wanwes--"),
            Err(ShipError::InvalidGrouping)
        );
    }

    #[test]
    fn unsupported_part_counts() {
        assert_eq!(
            parse("dozzod-marnec-binbud-wanwes--samsev-litper"),
            Err(ShipError::InvalidPartCount(6))
        );
        assert_eq!(
            parse("dozzod-marnec-binbud-wanwes--samsev-litper-sigsut"),
            Err(ShipError::InvalidPartCount(7))
        );
    }
}
