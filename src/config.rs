use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_derive::Deserialize;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub wikidata: WikidataConfig,
    pub wikipedia: WikipediaConfig,
    pub weatherbox: WeatherboxConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct WikidataConfig {
    pub api: String,
    pub query: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct WikipediaConfig {
    pub api: String,
}

/// Which template to look for and how to interpret its parameters.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct WeatherboxConfig {
    pub template: String,
    pub redirect_marker: String,
    pub months: Vec<String>,
    pub series: Vec<String>,
    #[serde(default)]
    pub conversions: Vec<Conversion>,
    #[serde(default)]
    pub aggregates: Vec<AggregateRule>,
    #[serde(default)]
    pub stdev: Vec<String>,
}

impl WeatherboxConfig {
    /// Splits `"Jan high C"` into the month index and the series name.
    pub fn split_series_key<'a>(&self, key: &'a str) -> Option<(usize, &'a str)> {
        let (month, series) = key.split_once(' ')?;
        let index = self.months.iter().position(|m| m == month)?;
        self.series
            .iter()
            .any(|s| s == series)
            .then_some((index, series))
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Conversion {
    pub from: String,
    pub to: String,
    pub unit: UnitConversion,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnitConversion {
    FahrenheitToCelsius,
    InchToMillimetre,
}

impl UnitConversion {
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Self::FahrenheitToCelsius => (value - 32.0) / 1.8,
            Self::InchToMillimetre => value * 25.4,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct AggregateRule {
    pub series: String,
    pub function: Aggregate,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Aggregate {
    Mean,
    Sum,
    Max,
    Min,
}

impl Aggregate {
    pub fn apply(self, values: &[f64]) -> f64 {
        match self {
            Self::Mean => values.iter().sum::<f64>() / values.len() as f64,
            Self::Sum => values.iter().sum(),
            Self::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Self::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        }
    }
}

impl Config {
    /// Reads `path` when given, otherwise the configuration built into the binary.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => from_toml_file(path),
            None => Self::builtin(),
        }
    }

    pub fn builtin() -> Result<Self> {
        toml::from_str(DEFAULT_CONFIG).context("failed to parse built-in configuration")
    }
}

fn from_toml_file<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let str = fs::read_to_string(path)
        .with_context(|| format!("could not read toml file {:?}", path))?;
    let value =
        toml::from_str(&str).with_context(|| format!("failed to parse toml file {:?}", path))?;

    Ok(value)
}
