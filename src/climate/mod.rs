use std::collections::BTreeMap;

use tracing::debug;

use crate::city::FieldValue;
use crate::config::WeatherboxConfig;


/// Turns raw weatherbox parameters into record fields.
///
/// Monthly series named in the configuration become numbers, and only when all
/// months are present and numeric. Imperial series fill in missing metric ones,
/// then yearly aggregates and standard deviations are added. Any other
/// non-empty parameter is kept as text.
pub fn normalize(
    params: &BTreeMap<String, String>,
    config: &WeatherboxConfig,
) -> BTreeMap<String, FieldValue> {
    let mut fields = BTreeMap::new();
    let mut monthly: BTreeMap<&str, Vec<Option<f64>>> = BTreeMap::new();

    for (key, value) in params {
        if let Some((month, series)) = config.split_series_key(key) {
            monthly
                .entry(series)
                .or_insert_with(|| vec![None; config.months.len()])[month] = parse_number(value);
            continue;
        }

        let value = value.trim();
        if !value.is_empty() {
            fields.insert(key.clone(), FieldValue::Text(value.to_string()));
        }
    }

    let mut complete: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (series, values) in monthly {
        match values.iter().copied().collect::<Option<Vec<f64>>>() {
            Some(values) => {
                complete.insert(series.to_string(), values);
            }
            None if values.iter().any(Option::is_some) => {
                debug!("dropping incomplete series `{}`", series);
            }
            None => {}
        }
    }

    for conversion in &config.conversions {
        if complete.contains_key(&conversion.to) {
            continue;
        }
        if let Some(values) = complete.get(&conversion.from) {
            let converted = values
                .iter()
                .map(|v| round1(conversion.unit.apply(*v)))
                .collect();
            complete.insert(conversion.to.clone(), converted);
        }
    }

    for (series, values) in &complete {
        for (month, value) in config.months.iter().zip(values) {
            fields.insert(format!("{} {}", month, series), FieldValue::Number(*value));
        }
    }

    for rule in &config.aggregates {
        if let Some(values) = complete.get(&rule.series) {
            fields.insert(
                format!("year {}", rule.series),
                FieldValue::Number(round1(rule.function.apply(values))),
            );
        }
    }

    for series in &config.stdev {
        if let Some(values) = complete.get(series) {
            fields.insert(
                format!("year {} stdev", series),
                FieldValue::Number(round1(population_stdev(values))),
            );
        }
    }

    fields
}

/// Parses a weatherbox cell. Typographic minus signs, `&minus;`, dashes and
/// thousands separators are accepted and `trace` counts as zero.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned = raw
        .trim()
        .to_lowercase()
        .replace("&minus;", "-")
        .replace(['−', '—', '–'], "-")
        .replace("trace", "0")
        .replace(',', "");

    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn population_stdev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}
