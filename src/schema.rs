use crate::config::Aliases;

/// The amount of header names quoted in errors about missing columns.
pub const MAX_REPORTED_COLUMNS: usize = 30;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(
        "A {role} column could not be found, tried {}. Found: {}",
        quoted(.aliases),
        found_columns(.found, *.truncated)
    )]
    MissingColumn {
        role: &'static str,
        aliases: Vec<String>,
        /// The first header names of the sheet, at most [`MAX_REPORTED_COLUMNS`].
        found: Vec<String>,
        truncated: bool,
    },
}

/// The column indices of each semantic role within one sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roles {
    pub country: usize,
    pub from_currency: usize,
    pub to_currency: usize,
}

impl Roles {
    /// Find each role among `headers` by trimmed, case-insensitive comparison with its aliases.
    ///
    /// The first alias that matches wins, and for each alias the leftmost matching column.
    pub fn resolve(headers: &csv::StringRecord, aliases: &Aliases) -> Result<Self, Error> {
        Ok(Roles {
            country: find("country", &aliases.country, headers)?,
            from_currency: find("from currency", &aliases.from_currency, headers)?,
            to_currency: find("to currency", &aliases.to_currency, headers)?,
        })
    }
}

fn find(role: &'static str, aliases: &[String], headers: &csv::StringRecord) -> Result<usize, Error> {
    aliases
        .iter()
        .map(|alias| normalize(alias))
        .find_map(|alias| headers.iter().position(|name| normalize(name) == alias))
        .ok_or_else(|| Error::MissingColumn {
            role,
            aliases: aliases.to_vec(),
            found: headers
                .iter()
                .take(MAX_REPORTED_COLUMNS)
                .map(|name| name.trim().to_owned())
                .collect(),
            truncated: headers.len() > MAX_REPORTED_COLUMNS,
        })
}

fn normalize(name: &str) -> String {
    crate::clean_cell(name).to_lowercase()
}

fn quoted(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("'{name}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn found_columns(found: &[String], truncated: bool) -> String {
    if found.is_empty() {
        return "no columns".into();
    }
    let mut out = quoted(found);
    if truncated {
        out.push_str(", ...");
    }
    out
}
