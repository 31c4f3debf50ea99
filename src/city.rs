use std::{collections::BTreeMap, sync::LazyLock};

use regex::Regex;
use serde_derive::{Deserialize, Serialize};

static WKT_POINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*Point\(\s*(\S+)\s+(\S+)\s*\)\s*$").expect("valid point regex")
});

/// A city as listed by Wikidata.
#[derive(Debug, Clone, PartialEq)]
pub struct CityEntity {
    pub id: String,
    pub label: String,
    pub wikipedia_title: String,
    pub population: Option<u64>,
    pub country: Option<String>,
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Parses a WKT literal such as `Point(139.69 35.68)`, longitude first.
    pub fn from_wkt(literal: &str) -> Option<Self> {
        let caps = WKT_POINT.captures(literal)?;
        let longitude = caps[1].parse().ok()?;
        let latitude = caps[2].parse().ok()?;
        Some(Self {
            latitude,
            longitude,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

/// Document stored per city. `fields` holds whatever the weatherbox provided.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ClimateRecord {
    pub city_id: String,
    pub city_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl ClimateRecord {
    pub fn new(city: &CityEntity, fields: BTreeMap<String, FieldValue>) -> Self {
        Self {
            city_id: city.id.clone(),
            city_label: city.label.clone(),
            population: city.population,
            country: city.country.clone(),
            latitude: city.coordinates.map(|c| c.latitude),
            longitude: city.coordinates.map(|c| c.longitude),
            fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wkt_point_is_longitude_first() {
        let c = Coordinates::from_wkt("Point(139.692222222 35.689722222)").unwrap();
        assert_eq!(c.longitude, 139.692222222);
        assert_eq!(c.latitude, 35.689722222);
    }

    #[test]
    fn test_wkt_point_rejects_garbage() {
        assert_eq!(Coordinates::from_wkt("Point(abc)"), None);
        assert_eq!(Coordinates::from_wkt(""), None);
    }

    #[test]
    fn test_record_json_omits_missing_attributes() {
        let city = CityEntity {
            id: "Q1".to_string(),
            label: "Somewhere".to_string(),
            wikipedia_title: "Somewhere".to_string(),
            population: None,
            country: None,
            coordinates: None,
        };
        let mut fields = BTreeMap::new();
        fields.insert("Jan high C".to_string(), FieldValue::Number(4.5));
        fields.insert("location".to_string(), FieldValue::Text("Airport".to_string()));

        let json = serde_json::to_value(ClimateRecord::new(&city, fields)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "city_id": "Q1",
                "city_label": "Somewhere",
                "fields": { "Jan high C": 4.5, "location": "Airport" }
            })
        );
    }
}
