//! Recognize the per-date rate columns of a sheet and select those within the exported range.
use std::fmt;

/// How many available dates are quoted if none of them fall into the requested range.
pub const MAX_REPORTED_DATES: usize = 5;

static HEADER_FORMAT: &[time::format_description::FormatItem<'static>] =
    time::macros::format_description!("[day].[month].[year]");
static ISO_FORMAT: &[time::format_description::FormatItem<'static>] =
    time::macros::format_description!("[year]-[month]-[day]");

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("'{value}' is not a valid date in the form DD.MM.YYYY")]
    InvalidDate { value: String },
    #[error("The date range {range} ends before it starts")]
    InvertedRange { range: DateRange },
    #[error("No column header of the form DD.MM.YYYY was found, headers need to be normalized first")]
    NoDateColumns,
    #[error("No date columns matched {range}. Found date columns like: {}", .available.join(", "))]
    EmptyRange {
        range: DateRange,
        /// Up to [`MAX_REPORTED_DATES`] of the dates that were available, as `DD.MM.YYYY`.
        available: Vec<String>,
    },
}

/// A column whose header is a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateColumn {
    /// The index of the column in its sheet.
    pub index: usize,
    pub date: time::Date,
}

impl DateColumn {
    /// The date as `YYYY-MM-DD`.
    pub fn iso(&self) -> String {
        iso_date(self.date)
    }
}

/// An inclusive range of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: time::Date,
    pub to: time::Date,
}

impl DateRange {
    /// Parse both ends from `DD.MM.YYYY`, failing if `to` lies before `from`.
    pub fn parse(from: &str, to: &str) -> Result<Self, Error> {
        let parse = |value: &str| {
            parse_header_date(value.trim()).ok_or_else(|| Error::InvalidDate {
                value: value.to_owned(),
            })
        };
        let range = DateRange {
            from: parse(from)?,
            to: parse(to)?,
        };
        if range.to < range.from {
            return Err(Error::InvertedRange { range });
        }
        Ok(range)
    }

    pub fn contains(&self, date: time::Date) -> bool {
        self.from <= date && date <= self.to
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", header_date(self.from), header_date(self.to))
    }
}

/// The date columns of a sheet that fall into the requested range, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub ascending: Vec<DateColumn>,
}

impl Selection {
    /// The order in which rates are emitted.
    pub fn newest_first(&self) -> impl Iterator<Item = &DateColumn> + '_ {
        self.ascending.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.ascending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ascending.is_empty()
    }
}

/// Parse `name` if it is exactly of the form `DD.MM.YYYY`, with zero-padded day and month.
pub fn parse_header_date(name: &str) -> Option<time::Date> {
    let bytes = name.as_bytes();
    let shape_matches = bytes.len() == 10
        && bytes.iter().enumerate().all(|(idx, b)| match idx {
            2 | 5 => *b == b'.',
            _ => b.is_ascii_digit(),
        });
    if !shape_matches {
        return None;
    }
    time::Date::parse(name, HEADER_FORMAT).ok()
}

/// Format `date` as `DD.MM.YYYY`.
pub fn header_date(date: time::Date) -> String {
    date.format(HEADER_FORMAT)
        .expect("formatting a date with a static description cannot fail")
}

/// Format `date` as `YYYY-MM-DD`.
pub fn iso_date(date: time::Date) -> String {
    date.format(ISO_FORMAT)
        .expect("formatting a date with a static description cannot fail")
}

/// Classify `headers`, returning all date columns in header order.
///
/// Headers are trimmed first, all others are metadata columns like the country.
/// A sheet without any date column is an error as its headers weren't normalized.
pub fn date_columns(headers: &csv::StringRecord) -> Result<Vec<DateColumn>, Error> {
    let columns: Vec<_> = headers
        .iter()
        .enumerate()
        .filter_map(|(index, name)| {
            parse_header_date(name.trim()).map(|date| DateColumn { index, date })
        })
        .collect();
    if columns.is_empty() {
        return Err(Error::NoDateColumns);
    }
    Ok(columns)
}

/// Return the `columns` within `range`. The selection may be empty, use [`ensure_selected()`]
/// once all sheets were seen.
pub fn select(columns: &[DateColumn], range: &DateRange) -> Selection {
    let mut ascending: Vec<_> = columns
        .iter()
        .copied()
        .filter(|col| range.contains(col.date))
        .collect();
    ascending.sort_by_key(|col| (col.date, col.index));
    Selection { ascending }
}

/// Fail if none of `selections` retained a date, quoting a few dates of `available`.
pub fn ensure_selected<'a>(
    selections: impl IntoIterator<Item = &'a Selection>,
    available: &[DateColumn],
    range: &DateRange,
) -> Result<(), Error> {
    if selections.into_iter().any(|selection| !selection.is_empty()) {
        return Ok(());
    }
    Err(Error::EmptyRange {
        range: *range,
        available: available
            .iter()
            .take(MAX_REPORTED_DATES)
            .map(|col| header_date(col.date))
            .collect(),
    })
}
