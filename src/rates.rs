use crate::expand::Skipped;
use crate::group::{GroupedRow, Layout};
use crate::Config;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No input was provided")]
    NoInput,
    #[error("Cannot use '{0}' as delimiter")]
    InvalidDelimiter(char),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Schema(#[from] crate::schema::Error),
    #[error(transparent)]
    Dates(#[from] crate::dates::Error),
    #[error("No valid currency rows were left for the {view}")]
    NoRows { view: String },
    #[error("The countries '{first}' and '{second}' would both be written to '{name}'")]
    ConflictingFileName {
        name: String,
        first: String,
        second: String,
    },
}

/// What happened while producing a table.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// The amount of data rows across all input sheets.
    pub input_rows: usize,
    /// The amount of entries generated before deduplication.
    pub expanded: usize,
    /// The amount of rows in the table.
    pub rows: usize,
    /// The amount of currency blocks in the table.
    pub blocks: usize,
    pub skipped: Skipped,
}

/// A computed table, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// The file name to use when writing the table into a directory.
    pub name: String,
    pub layout: Layout,
    pub rows: Vec<GroupedRow>,
    pub outcome: Outcome,
}

impl Table {
    pub fn write(&self, out: impl std::io::Write) -> Result<(), csv::Error> {
        crate::group::write(&self.rows, self.layout, out)
    }
}

#[derive(Clone, Debug)]
pub struct Options {
    pub config: Config,
    /// If set, overrides the configured first date, as `DD.MM.YYYY`.
    pub date_from: Option<String>,
    /// If set, overrides the configured last date, as `DD.MM.YYYY`.
    pub date_to: Option<String>,
    pub delimiter: char,
    pub decimal_separator: char,
    /// If set, round rates to this many fractional digits.
    pub round: Option<u32>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            config: Config::default(),
            date_from: None,
            date_to: None,
            delimiter: ',',
            decimal_separator: '.',
            round: None,
        }
    }
}

/// File names of the tables produced by [`export()`](crate::export()).
pub fn per_company_file_name() -> String {
    "rates_per_company.csv".into()
}

pub fn consolidation_file_name(target: &str) -> String {
    format!("rates_consolidation_{target}.csv")
}

pub fn country_file_name(country: &str) -> String {
    let country: String = country
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    format!("rates_{country}.csv")
}

pub(crate) mod function {
    use super::{Error, Options, Outcome, Table};
    use crate::dates::{self, DateColumn, DateRange, Selection};
    use crate::expand::{self, Input, RateCells, Sheet, Skipped};
    use crate::group::{self, Layout, RateEntry};
    use crate::schema::Roles;
    use crate::Config;
    use log::info;
    use std::collections::BTreeMap;

    /// Expand `csv_data` into a rate table per company and write it to `out`.
    ///
    /// Sheets are processed in order, and rows of later sheets win over earlier ones
    /// for the same date, currency and company.
    pub fn company_rates(
        csv_data: impl IntoIterator<Item = impl std::io::Read>,
        out: impl std::io::Write,
        options: Options,
    ) -> Result<Outcome, Error> {
        let prepared = Prepared::new(csv_data, &options)?;
        let table = prepared.per_company()?;
        table.write(out)?;
        Ok(table.outcome)
    }

    /// Write the rates of all currencies quoted against `target` to `out`, without a company dimension.
    pub fn consolidation_rates(
        csv_data: impl IntoIterator<Item = impl std::io::Read>,
        target: &str,
        out: impl std::io::Write,
        options: Options,
    ) -> Result<Outcome, Error> {
        let prepared = Prepared::new(csv_data, &options)?;
        let table = prepared.consolidation(target)?;
        table.write(out)?;
        Ok(table.outcome)
    }

    /// Compute the per-company table and one consolidation table per entry of `targets`.
    ///
    /// Nothing is returned unless all tables could be computed.
    pub fn export(
        csv_data: impl IntoIterator<Item = impl std::io::Read>,
        targets: &[&str],
        options: Options,
    ) -> Result<Vec<Table>, Error> {
        let prepared = Prepared::new(csv_data, &options)?;
        let mut tables = vec![prepared.per_company()?];
        for target in targets {
            tables.push(prepared.consolidation(target)?);
        }
        Ok(tables)
    }

    /// Compute one table per country, each grouped by its target currencies, without a company dimension.
    pub fn by_country(
        csv_data: impl IntoIterator<Item = impl std::io::Read>,
        options: Options,
    ) -> Result<Vec<Table>, Error> {
        let prepared = Prepared::new(csv_data, &options)?;
        let mut per_country = BTreeMap::<String, Vec<RateEntry>>::new();
        let mut skipped = Skipped::default();
        for input in prepared.inputs() {
            skipped += expand::per_country(&input, prepared.config, &prepared.cells, &mut per_country);
        }

        let mut countries_by_name = BTreeMap::<String, String>::new();
        let mut tables = Vec::new();
        for (country, entries) in per_country {
            if entries.is_empty() {
                continue;
            }
            let name = super::country_file_name(&country);
            if let Some(first) = countries_by_name.insert(name.clone(), country.clone()) {
                return Err(Error::ConflictingFileName {
                    name,
                    first,
                    second: country,
                });
            }
            tables.push(prepared.table(name, Layout::Currency, entries, skipped));
        }
        if tables.is_empty() {
            return Err(Error::NoRows {
                view: "per-country tables".into(),
            });
        }
        info!("Computed rate tables for {} countries", tables.len());
        Ok(tables)
    }

    struct PreparedSheet {
        sheet: Sheet,
        roles: Roles,
        dates: Selection,
    }

    /// All sheets with their columns resolved and dates selected.
    struct Prepared<'a> {
        sheets: Vec<PreparedSheet>,
        config: &'a Config,
        cells: RateCells,
    }

    impl<'a> Prepared<'a> {
        fn new(
            csv_data: impl IntoIterator<Item = impl std::io::Read>,
            options: &'a Options,
        ) -> Result<Self, Error> {
            let Options {
                config,
                date_from,
                date_to,
                delimiter,
                decimal_separator,
                round,
            } = options;
            let delimiter = (*delimiter)
                .try_into()
                .map_err(|_| Error::InvalidDelimiter(*delimiter))?;
            let range = DateRange::parse(
                date_from.as_deref().unwrap_or(&config.date_from),
                date_to.as_deref().unwrap_or(&config.date_to),
            )?;

            let mut sheets = Vec::new();
            let mut available = Vec::<DateColumn>::new();
            for (sheet_number, csv) in (1..).zip(csv_data) {
                let sheet = Sheet::read(csv, delimiter)?;
                let roles = Roles::resolve(&sheet.headers, &config.aliases)?;
                let columns = dates::date_columns(&sheet.headers)?;
                let dates = dates::select(&columns, &range);
                info!(
                    "Sheet {sheet_number}: {} rows, {} of {} date columns within {range}",
                    sheet.rows.len(),
                    dates.len(),
                    columns.len()
                );
                available.extend(columns);
                sheets.push(PreparedSheet {
                    sheet,
                    roles,
                    dates,
                });
            }
            if sheets.is_empty() {
                return Err(Error::NoInput);
            }
            available.sort_by_key(|col| col.date);
            dates::ensure_selected(sheets.iter().map(|s| &s.dates), &available, &range)?;

            Ok(Prepared {
                sheets,
                config,
                cells: RateCells {
                    decimal_separator: *decimal_separator,
                    round: *round,
                },
            })
        }

        fn inputs(&self) -> impl Iterator<Item = Input<'_>> + '_ {
            self.sheets.iter().map(|s| Input {
                sheet: &s.sheet,
                roles: s.roles,
                dates: &s.dates,
            })
        }

        fn input_rows(&self) -> usize {
            self.sheets.iter().map(|s| s.sheet.rows.len()).sum()
        }

        fn per_company(&self) -> Result<Table, Error> {
            let mut entries = Vec::new();
            let mut skipped = Skipped::default();
            for input in self.inputs() {
                skipped += expand::per_company(&input, self.config, &self.cells, &mut entries);
            }
            non_empty(
                self.table(
                    super::per_company_file_name(),
                    Layout::PerCompany,
                    entries,
                    skipped,
                ),
                "per-company table",
            )
        }

        fn consolidation(&self, target: &str) -> Result<Table, Error> {
            let target = target.trim().to_uppercase();
            let mut entries = Vec::new();
            let mut skipped = Skipped::default();
            for input in self.inputs() {
                skipped += expand::consolidation(&input, self.config, &target, &self.cells, &mut entries);
            }
            non_empty(
                self.table(
                    super::consolidation_file_name(&target),
                    Layout::Currency,
                    entries,
                    skipped,
                ),
                &format!("{target} consolidation table"),
            )
        }

        fn table(&self, name: String, layout: Layout, entries: Vec<RateEntry>, skipped: Skipped) -> Table {
            let expanded = entries.len();
            let rows = group::group(entries, self.config);
            let outcome = Outcome {
                input_rows: self.input_rows(),
                expanded,
                rows: rows.len(),
                blocks: group::blocks(&rows),
                skipped,
            };
            info!(
                "{name}: {} entries expanded into {} rows in {} currency blocks, {} input rows skipped",
                outcome.expanded,
                outcome.rows,
                outcome.blocks,
                outcome.skipped.rows()
            );
            Table {
                name,
                layout,
                rows,
                outcome,
            }
        }
    }

    fn non_empty(table: Table, view: &str) -> Result<Table, Error> {
        if table.rows.is_empty() {
            return Err(Error::NoRows { view: view.into() });
        }
        Ok(table)
    }
}
