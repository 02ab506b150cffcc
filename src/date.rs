use std::fmt;

use chrono::{Datelike, NaiveDate};

/// The format the account export uses for its "Created On" column, e.g. `1/12/11`
pub const INPUT_DATE_FORMAT: &str = "%m/%d/%y";

/// The value of a "Created On" cell after normalization
///
/// Cells that match [`INPUT_DATE_FORMAT`] become a calendar date. Everything else
/// is kept exactly as it was read, so no input is ever lost to a failed parse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CreatedOn {
    /// A successfully parsed date, written out as `YYYY-MM-DD`
    Date(NaiveDate),
    /// The untouched cell content
    Raw(String),
}

impl CreatedOn {
    /// The parsed date, if there is one
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(date) => Some(*date),
            Self::Raw(_) => None,
        }
    }
}

/// Normalizes a raw "Created On" cell
///
/// Two digit years pivot the POSIX way: `00..=68` land in the 2000s and
/// `69..=99` in the 1900s.
pub fn normalize(raw: &str) -> CreatedOn {
    match NaiveDate::parse_from_str(raw, INPUT_DATE_FORMAT) {
        Ok(date) => CreatedOn::Date(posix_century(date)),
        Err(_) => CreatedOn::Raw(raw.to_owned()),
    }
}

// chrono pivots `%y` at 70, POSIX at 69
fn posix_century(date: NaiveDate) -> NaiveDate {
    match date.year() {
        2069 => date.with_year(1969).unwrap_or(date),
        _ => date,
    }
}

impl fmt::Display for CreatedOn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::Raw(raw) => f.write_str(raw),
        }
    }
}

impl serde::Serialize for CreatedOn {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where S: serde::Serializer
    {
        serializer.collect_str(self)
    }
}
