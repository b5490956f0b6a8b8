//! Canonical term (semester) names.
//!
//! A term name is a season prefix followed by a year, optionally followed by
//! the two-digit suffix of the next year for winter terms that span a year
//! boundary: `WS2024`, `SS2025`, `WS2024/25`, `WS2099/00`.
//!
//! Free text is accepted case-insensitively with the long season names and
//! two-digit years (`winter 24/25` becomes `WS2024/25`). Two-digit years are
//! read as 2000-2099.
//!
//! Two parsers share one shape matcher:
//!
//! - [`TermName::parse`] is strict. A ranged name must name consecutive
//!   years. Fresh input goes through here.
//! - [`TermName::parse_stored`] falls back to a legacy rule that accepts the
//!   shape without checking chronology, so rows written before the rule
//!   tightened stay readable. It never fails; it reports what happened.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;

#[allow(clippy::expect_used)]
static SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(ws|winter|ss|summer)\s*(\d{4}|\d{2})(?:\s*/\s*(\d{4}|\d{2}))?\s*$")
        .expect("term name pattern is a valid literal")
});

/// The half of the academic year a term belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Season {
    /// Winter semester, rendered as `WS`.
    Winter,
    /// Summer semester, rendered as `SS`.
    Summer,
}

impl Season {
    /// Canonical two-letter prefix.
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Winter => "WS",
            Self::Summer => "SS",
        }
    }
}

/// A year as it appeared in the input, before chronology is checked.
#[derive(Debug, Clone, Copy)]
struct RawYear {
    value: u16,
    four_digits: bool,
}

impl RawYear {
    fn parse(digits: &str) -> Option<Self> {
        let value: u16 = digits.parse().ok()?;
        Some(Self {
            value,
            four_digits: digits.len() == 4,
        })
    }

    /// Full year, reading two digits as 2000-2099.
    const fn full(self) -> u16 {
        if self.four_digits {
            self.value
        } else {
            self.value.saturating_add(2000)
        }
    }
}

/// The matched pieces of a term name, shared by both parsers.
#[derive(Debug, Clone, Copy)]
struct Shape {
    season: Season,
    start: RawYear,
    end: Option<RawYear>,
}

fn match_shape(input: &str) -> Option<Shape> {
    let caps = SHAPE.captures(input)?;
    let season = match caps.get(1)?.as_str().to_ascii_lowercase().as_str() {
        "ws" | "winter" => Season::Winter,
        "ss" | "summer" => Season::Summer,
        _ => return None,
    };
    let start = RawYear::parse(caps.get(2)?.as_str())?;
    let end = match caps.get(3) {
        Some(m) => Some(RawYear::parse(m.as_str())?),
        None => None,
    };
    Some(Shape { season, start, end })
}

/// Two-digit suffix of the year following `start`, wrapping `2099` to `00`.
const fn following_suffix(start: u16) -> u16 {
    start.saturating_add(1) % 100
}

/// A validated term name.
///
/// Values built by [`TermName::parse`] are always canonical. Values that
/// came through the legacy branch of [`TermName::parse_stored`] keep the
/// stored text and render it verbatim; [`TermName::is_canonical`] tells them
/// apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TermName {
    season: Season,
    start_year: u16,
    end_suffix: Option<u16>,
    legacy_text: Option<String>,
}

/// Outcome of parsing a stored term name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermNameParse {
    /// The value satisfies the current rules.
    Strict(TermName),
    /// The value has the right shape but violates the chronology rule.
    Legacy(TermName),
    /// The value is not a term name at all.
    Failed,
}

impl TermNameParse {
    /// Whether a value was produced.
    pub const fn is_ok(&self) -> bool {
        !matches!(self, Self::Failed)
    }

    /// Whether the legacy rule had to be used.
    pub const fn was_legacy(&self) -> bool {
        matches!(self, Self::Legacy(_))
    }

    /// The parsed value, if any.
    pub fn into_value(self) -> Option<TermName> {
        match self {
            Self::Strict(name) | Self::Legacy(name) => Some(name),
            Self::Failed => None,
        }
    }
}

impl TermName {
    /// Parse fresh input under the current rules.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::IllegalArgument`] if the text is not a term
    /// name or names a range whose second year does not follow the first.
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let shape = match_shape(input)
            .ok_or_else(|| DomainError::illegal(format!("not a valid term name: {input:?}")))?;
        Self::strict(shape)
            .ok_or_else(|| DomainError::illegal(format!("term years are not consecutive: {input:?}")))
    }

    /// Parse a previously persisted value, tolerating legacy ranges.
    pub fn parse_stored(input: &str) -> TermNameParse {
        let Some(shape) = match_shape(input) else {
            return TermNameParse::Failed;
        };
        match Self::strict(shape) {
            Some(name) => TermNameParse::Strict(name),
            None => TermNameParse::Legacy(Self::legacy(shape, input.trim())),
        }
    }

    fn strict(shape: Shape) -> Option<Self> {
        let start_year = shape.start.full();
        let end_suffix = match shape.end {
            None => None,
            Some(end) if end.four_digits => {
                if end.value != start_year.saturating_add(1) {
                    return None;
                }
                Some(end.value % 100)
            }
            Some(end) => {
                if end.value != following_suffix(start_year) {
                    return None;
                }
                Some(end.value)
            }
        };
        Some(Self {
            season: shape.season,
            start_year,
            end_suffix,
            legacy_text: None,
        })
    }

    fn legacy(shape: Shape, stored: &str) -> Self {
        Self {
            season: shape.season,
            start_year: shape.start.full(),
            end_suffix: shape.end.map(|end| end.value % 100),
            legacy_text: Some(stored.to_owned()),
        }
    }

    /// Season of the term.
    pub const fn season(&self) -> Season {
        self.season
    }

    /// First (or only) calendar year of the term.
    pub const fn start_year(&self) -> u16 {
        self.start_year
    }

    /// Whether the name spans two calendar years.
    pub const fn is_ranged(&self) -> bool {
        self.end_suffix.is_some()
    }

    /// Whether the value satisfies the current chronology rule.
    pub const fn is_canonical(&self) -> bool {
        self.legacy_text.is_none()
    }
}

impl fmt::Display for TermName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(stored) = &self.legacy_text {
            return f.write_str(stored);
        }
        write!(f, "{}{:04}", self.season.prefix(), self.start_year)?;
        if let Some(suffix) = self.end_suffix {
            write!(f, "/{suffix:02}")?;
        }
        Ok(())
    }
}

impl FromStr for TermName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for TermName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TermName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
