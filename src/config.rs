//! The lookup tables and defaults the rate pipeline runs against.
//!
//! A [`Config`] is decoded from RON and handed to each pipeline function by value,
//! so differently configured runs never share state.
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to open configuration file for reading")]
    Open(#[from] std::io::Error),
    #[error("Could not decode the rate configuration")]
    Decode(#[from] ron::de::SpannedError),
}

/// Reference data the importer needs once per currency block.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CurrencyMeta {
    pub external_id: String,
    pub symbol: String,
}

/// Exact column names accepted for each semantic role, compared after trimming and case folding.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Aliases {
    pub country: Vec<String>,
    pub from_currency: Vec<String>,
    pub to_currency: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Config {
    /// First date to export, inclusive, as `DD.MM.YYYY`.
    pub date_from: String,
    /// Last date to export, inclusive, as `DD.MM.YYYY`.
    pub date_to: String,
    pub aliases: Aliases,
    /// Currency code to the metadata stamped on the first row of its block.
    /// Currencies missing here never make it into the output.
    pub currencies: BTreeMap<String, CurrencyMeta>,
    /// Country name to the company codes that receive its rates, in output order.
    pub companies: BTreeMap<String, Vec<String>>,
}

impl Config {
    /// Decode a configuration from the RON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let config: Config = ron::de::from_reader(std::fs::File::open(path)?)?;
        Ok(config.normalized())
    }

    pub fn from_ron(data: &str) -> Result<Self, Error> {
        let config: Config = ron::from_str(data)?;
        Ok(config.normalized())
    }

    /// Render the configuration as pretty RON, suitable for [`Config::load()`].
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::new().struct_names(true))
    }

    pub fn currency(&self, code: &str) -> Option<&CurrencyMeta> {
        self.currencies.get(code)
    }

    /// Return the company codes mapped to `country`, or `None` if there are none.
    pub fn companies_for(&self, country: &str) -> Option<&[String]> {
        self.companies
            .get(country)
            .map(Vec::as_slice)
            .filter(|codes| !codes.is_empty())
    }

    fn normalized(mut self) -> Self {
        self.currencies = std::mem::take(&mut self.currencies)
            .into_iter()
            .map(|(code, meta)| (code.trim().to_uppercase(), meta))
            .collect();
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        fn names(names: &[&str]) -> Vec<String> {
            names.iter().map(|name| name.to_string()).collect()
        }
        let currencies = [
            ("AED", "AED"),
            ("BIF", "FBu"),
            ("CAD", "$"),
            ("ETB", "Br"),
            ("EUR", "€"),
            ("GBP", "£"),
            ("GHS", "GH¢"),
            ("INR", "₹"),
            ("KES", "KSh"),
            ("MUR", "Rs"),
            ("MWK", "MK"),
            ("MZN", "MT"),
            ("NAD", "$"),
            ("NGN", "₦"),
            ("RWF", "RF"),
            ("SLL", "Le"),
            ("SZL", "E"),
            ("TZS", "TSh"),
            ("UGX", "USh"),
            ("USD", "$"),
            ("ZAR", "R"),
            ("ZMW", "ZK"),
        ]
        .into_iter()
        .map(|(code, symbol)| {
            (
                code.to_string(),
                CurrencyMeta {
                    external_id: format!("base.{code}"),
                    symbol: symbol.into(),
                },
            )
        })
        .collect();
        let companies = [
            ("Burundi", "BR10"),
            ("Canada", "CA10"),
            ("Dubai", "AE00 AE10 AE20 TBG"),
            ("Ethiopia", "ET10"),
            ("Ghana", "GH10"),
            ("India", "IN10 IN20 IN30"),
            ("Kenya", "KE10 KE20 KE30 KE40 KE50"),
            ("Malawi", "MW10"),
            ("Mauritius", "MU10 MU20 MU30 MU40 MU50"),
            ("Mozambique", "MZ10"),
            ("Namibia", "NA10"),
            ("Nigeria", "NG10"),
            ("Rwanda", "RW10"),
            ("Saudi Arabia", "SA10"),
            ("Sierra Leone", "SL10"),
            ("South Africa", "ZA10 ZA20"),
            ("Swaziland", "SZ10"),
            ("Tanzania", "TZ10"),
            ("UK", "GB10"),
            ("USA", "US10"),
            ("Uganda", "UG10 UG20"),
            ("Zambia", "ZM10"),
        ]
        .into_iter()
        .map(|(country, codes)| {
            (
                country.to_string(),
                codes.split_whitespace().map(String::from).collect(),
            )
        })
        .collect();

        Config {
            date_from: "04.01.2016".into(),
            date_to: "08.12.2025".into(),
            aliases: Aliases {
                country: names(&["Country", "SAP Country"]),
                from_currency: names(&["From Currency", "From"]),
                to_currency: names(&["To Currency", "To"]),
            },
            currencies,
            companies,
        }
    }
}
