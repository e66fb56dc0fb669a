//! Turn rows of per-date rates into one [`RateEntry`] per date and receiving company.
//!
//! Rows that can't contribute are skipped and tallied, never treated as errors.
use crate::config::Config;
use crate::dates::Selection;
use crate::group::RateEntry;
use crate::schema::Roles;
use log::debug;
use std::collections::BTreeMap;

/// A sheet as read from CSV, with all cells cleaned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    pub headers: csv::StringRecord,
    pub rows: Vec<csv::StringRecord>,
}

impl Sheet {
    /// Read all of `csv` into memory. Rows may be shorter than the header, missing cells are blank.
    pub fn read(csv: impl std::io::Read, delimiter: u8) -> Result<Self, csv::Error> {
        let mut csv = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(csv);
        let headers = clean_record(csv.headers()?);
        let rows = csv
            .records()
            .map(|record| record.map(|record| clean_record(&record)))
            .collect::<Result<_, _>>()?;
        Ok(Sheet { headers, rows })
    }
}

fn clean_record(record: &csv::StringRecord) -> csv::StringRecord {
    record.iter().map(|field| crate::clean_cell(field)).collect()
}

/// How rate cells are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateCells {
    pub decimal_separator: char,
    /// If set, rates are rounded to this many fractional digits.
    pub round: Option<u32>,
}

impl Default for RateCells {
    fn default() -> Self {
        RateCells {
            decimal_separator: '.',
            round: None,
        }
    }
}

impl RateCells {
    pub fn parse(&self, cell: &str) -> Option<f64> {
        let rate = crate::parse_rate(cell, self.decimal_separator)?;
        Some(match self.round {
            Some(digits) => crate::round_rate(rate, digits),
            None => rate,
        })
    }
}

/// Counts of what was left out while expanding.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Skipped {
    /// Rows with a blank country or currency.
    pub blank: usize,
    /// Rows whose currency isn't configured.
    pub unknown_currency: usize,
    /// Rows whose country has no companies.
    pub unmapped_country: usize,
    /// Rows quoted against another currency than the consolidation target.
    pub other_target: usize,
    /// Empty or non-numeric rate cells within the selected dates.
    pub missing_rates: usize,
}

impl Skipped {
    /// Rows rejected for blank fields, unknown currencies or unmapped countries.
    ///
    /// Rows quoted against another consolidation target aren't rejected and don't count.
    pub fn rows(&self) -> usize {
        self.blank + self.unknown_currency + self.unmapped_country
    }
}

impl std::ops::AddAssign for Skipped {
    fn add_assign(&mut self, rhs: Self) {
        self.blank += rhs.blank;
        self.unknown_currency += rhs.unknown_currency;
        self.unmapped_country += rhs.unmapped_country;
        self.other_target += rhs.other_target;
        self.missing_rates += rhs.missing_rates;
    }
}

/// One sheet whose columns are known, ready to be expanded.
pub struct Input<'a> {
    pub sheet: &'a Sheet,
    pub roles: Roles,
    pub dates: &'a Selection,
}

impl Input<'_> {
    fn cell(&self, row: &csv::StringRecord, index: usize) -> String {
        row.get(index).unwrap_or_default().to_owned()
    }

    fn currency(&self, row: &csv::StringRecord, index: usize) -> String {
        self.cell(row, index).to_uppercase()
    }

    /// Call `emit` with the date and rate of each present rate in `row`, newest first.
    fn for_each_rate(
        &self,
        row: &csv::StringRecord,
        cells: &RateCells,
        skipped: &mut Skipped,
        mut emit: impl FnMut(time::Date, f64),
    ) {
        for column in self.dates.newest_first() {
            match row.get(column.index).and_then(|cell| cells.parse(cell)) {
                Some(rate) => emit(column.date, rate),
                None => skipped.missing_rates += 1,
            }
        }
    }
}

/// Emit one entry per present rate and company mapped to the row's country into `out`.
///
/// The currency is the row's target currency.
pub fn per_company(
    input: &Input<'_>,
    config: &Config,
    cells: &RateCells,
    out: &mut Vec<RateEntry>,
) -> Skipped {
    let mut skipped = Skipped::default();
    for (line, row) in (2..).zip(&input.sheet.rows) {
        let country = input.cell(row, input.roles.country);
        let currency = input.currency(row, input.roles.to_currency);
        if country.is_empty() || currency.is_empty() {
            debug!("Skipping line {line}: blank country or target currency");
            skipped.blank += 1;
            continue;
        }
        if config.currency(&currency).is_none() {
            debug!("Skipping line {line}: currency '{currency}' is not configured");
            skipped.unknown_currency += 1;
            continue;
        }
        let Some(companies) = config.companies_for(&country) else {
            debug!("Skipping line {line}: country '{country}' has no companies");
            skipped.unmapped_country += 1;
            continue;
        };
        input.for_each_rate(row, cells, &mut skipped, |date, rate| {
            out.extend(companies.iter().map(|company| RateEntry {
                date,
                rate,
                currency: currency.clone(),
                company: Some(company.clone()),
            }))
        });
    }
    skipped
}

/// Emit one entry per present rate of each row quoted against `target` into `out`.
///
/// The currency is the row's source currency, there is no company.
pub fn consolidation(
    input: &Input<'_>,
    config: &Config,
    target: &str,
    cells: &RateCells,
    out: &mut Vec<RateEntry>,
) -> Skipped {
    let mut skipped = Skipped::default();
    for (line, row) in (2..).zip(&input.sheet.rows) {
        if input.currency(row, input.roles.to_currency) != target {
            skipped.other_target += 1;
            continue;
        }
        let currency = input.currency(row, input.roles.from_currency);
        if currency.is_empty() {
            debug!("Skipping line {line}: blank source currency");
            skipped.blank += 1;
            continue;
        }
        if config.currency(&currency).is_none() {
            debug!("Skipping line {line}: currency '{currency}' is not configured");
            skipped.unknown_currency += 1;
            continue;
        }
        input.for_each_rate(row, cells, &mut skipped, |date, rate| {
            out.push(RateEntry {
                date,
                rate,
                currency: currency.clone(),
                company: None,
            })
        });
    }
    skipped
}

/// Emit one entry per present rate into the list of the row's country in `out`.
///
/// The currency is the row's target currency, there is no company and no company mapping is needed.
pub fn per_country(
    input: &Input<'_>,
    config: &Config,
    cells: &RateCells,
    out: &mut BTreeMap<String, Vec<RateEntry>>,
) -> Skipped {
    let mut skipped = Skipped::default();
    for (line, row) in (2..).zip(&input.sheet.rows) {
        let country = input.cell(row, input.roles.country);
        let currency = input.currency(row, input.roles.to_currency);
        if country.is_empty() || currency.is_empty() {
            debug!("Skipping line {line}: blank country or target currency");
            skipped.blank += 1;
            continue;
        }
        if config.currency(&currency).is_none() {
            debug!("Skipping line {line}: currency '{currency}' is not configured");
            skipped.unknown_currency += 1;
            continue;
        }
        let entries = out.entry(country).or_default();
        input.for_each_rate(row, cells, &mut skipped, |date, rate| {
            entries.push(RateEntry {
                date,
                rate,
                currency: currency.clone(),
                company: None,
            })
        });
    }
    skipped
}
