//! Deduplicate rate entries and lay them out in currency blocks, each headed by its currency's metadata.
use crate::config::{Config, CurrencyMeta};
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// A single rate of a currency on a date, possibly for one company.
#[derive(Debug, Clone, PartialEq)]
pub struct RateEntry {
    pub date: time::Date,
    pub rate: f64,
    pub currency: String,
    /// `None` for views without a company dimension.
    pub company: Option<String>,
}

/// An entry as it is written, with the metadata only present on the first row of a currency block.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedRow {
    pub header: Option<CurrencyMeta>,
    pub entry: RateEntry,
}

impl GroupedRow {
    pub fn is_header(&self) -> bool {
        self.header.is_some()
    }
}

/// `(currency, newest date first, company)`, which is also the output order.
type SortKey = (String, Reverse<time::Date>, Option<String>);

/// Keep only the last of all entries sharing date, currency and company, ordered by
/// currency ascending, date descending and company ascending.
pub fn dedup(entries: impl IntoIterator<Item = RateEntry>) -> Vec<RateEntry> {
    let mut data = BTreeMap::<SortKey, RateEntry>::new();
    for entry in entries {
        data.insert(
            (
                entry.currency.clone(),
                Reverse(entry.date),
                entry.company.clone(),
            ),
            entry,
        );
    }
    data.into_values().collect()
}

/// Deduplicate `entries` and attach the metadata of each currency in `config` to the first row of its block.
pub fn group(entries: impl IntoIterator<Item = RateEntry>, config: &Config) -> Vec<GroupedRow> {
    dedup(entries)
        .into_iter()
        .scan(None::<String>, |current, entry| {
            let starts_block = current.as_deref() != Some(entry.currency.as_str());
            if starts_block {
                *current = Some(entry.currency.clone());
            }
            Some(GroupedRow {
                header: starts_block
                    .then(|| config.currency(&entry.currency).cloned())
                    .flatten(),
                entry,
            })
        })
        .collect()
}

/// The amount of currency blocks in `rows`.
pub fn blocks(rows: &[GroupedRow]) -> usize {
    rows.iter().filter(|row| row.is_header()).count()
}

/// The column layout of a written table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// `External ID, Symbol, Active, Date, Rate, Currency, Company`.
    PerCompany,
    /// `id, Symbol, Active, Date, Rate, Currency`.
    Currency,
}

impl Layout {
    pub fn headers(&self) -> &'static [&'static str] {
        match self {
            Layout::PerCompany => &[
                "External ID",
                "Symbol",
                "Active",
                "Date",
                "Rate",
                "Currency",
                "Company",
            ],
            Layout::Currency => &["id", "Symbol", "Active", "Date", "Rate", "Currency"],
        }
    }
}

/// Write `rows` as CSV with the headers of `layout`.
pub fn write(rows: &[GroupedRow], layout: Layout, out: impl std::io::Write) -> Result<(), csv::Error> {
    let mut out = csv::WriterBuilder::new().delimiter(b',').from_writer(out);
    out.write_record(layout.headers())?;
    let mut record = csv::StringRecord::new();
    for GroupedRow { header, entry } in rows {
        record.clear();
        match header {
            Some(meta) => {
                record.push_field(&meta.external_id);
                record.push_field(&meta.symbol);
                record.push_field("TRUE");
            }
            None => {
                for _ in 0..3 {
                    record.push_field("");
                }
            }
        }
        record.push_field(&crate::dates::iso_date(entry.date));
        record.push_field(&entry.rate.to_string());
        record.push_field(&entry.currency);
        if layout == Layout::PerCompany {
            record.push_field(entry.company.as_deref().unwrap_or_default());
        }
        out.write_record(&record)?;
    }
    out.flush()?;
    Ok(())
}
