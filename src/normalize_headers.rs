//! Rewrite date-like headers into the `DD.MM.YYYY` form the rate pipeline recognizes.
//!
//! Spreadsheet exports tend to render date headers in whatever format the exporting machine prefers.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot use '{0}' as delimiter")]
    InvalidDelimiter(char),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// The amount of headers that were rewritten into dates.
    pub rewritten: usize,
    /// The amount of data rows passed through.
    pub rows: usize,
}

#[derive(Clone, Debug)]
pub struct Options {
    pub delimiter: char,
}

impl Default for Options {
    fn default() -> Self {
        Options { delimiter: ',' }
    }
}

/// Interpret `header` as a date, reading ambiguous numeric dates day first.
///
/// Accepts `D/M/YYYY`, `D.M.YYYY`, `D-M-YYYY`, `YYYY-MM-DD` and `YYYY-MM-DD HH:MM:SS`.
pub fn parse_date_header(header: &str) -> Option<time::Date> {
    use time::format_description::FormatItem;
    use time::macros::format_description;

    static DAY_FIRST: &[&[FormatItem<'static>]] = &[
        format_description!("[day padding:none]/[month padding:none]/[year]"),
        format_description!("[day padding:none].[month padding:none].[year]"),
        format_description!("[day padding:none]-[month padding:none]-[year]"),
    ];
    static ISO_DATE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");
    static ISO_DATE_TIME: &[FormatItem<'static>] =
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

    let header = header.trim();
    DAY_FIRST
        .iter()
        .find_map(|format| time::Date::parse(header, *format).ok())
        .or_else(|| time::Date::parse(header, ISO_DATE).ok())
        .or_else(|| {
            time::PrimitiveDateTime::parse(header, ISO_DATE_TIME)
                .ok()
                .map(|date_time| date_time.date())
        })
}

pub(crate) mod function {
    use super::{parse_date_header, Error, Options, Outcome};
    use crate::dates::header_date;
    use log::info;

    /// Copy `csv` to `out`, rewriting each header that reads as a date to `DD.MM.YYYY` and trimming all others.
    pub fn normalize_headers(
        csv: impl std::io::Read,
        out: impl std::io::Write,
        Options { delimiter }: Options,
    ) -> Result<Outcome, Error> {
        let delimiter = delimiter
            .try_into()
            .map_err(|_| Error::InvalidDelimiter(delimiter))?;
        let mut csv = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(csv);
        let mut out = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_writer(out);

        let mut rewritten = 0;
        let headers: csv::StringRecord = csv
            .headers()?
            .iter()
            .map(|header| match parse_date_header(header) {
                Some(date) => {
                    rewritten += 1;
                    header_date(date)
                }
                None => crate::clean_cell(header).into_owned(),
            })
            .collect();
        out.write_record(&headers)?;

        let mut rows = 0;
        let mut record = csv::ByteRecord::new();
        while csv.read_byte_record(&mut record)? {
            out.write_byte_record(&record)?;
            rows += 1;
        }
        out.flush()?;
        info!(
            "Rewrote {rewritten} of {} headers into dates, passed through {rows} rows",
            headers.len()
        );
        Ok(Outcome { rewritten, rows })
    }
}
