use std::{collections::HashSet, sync::LazyLock};

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};
use wikibase::mediawiki::api::Api;

use super::{CitySource, SourceError};
use crate::city::{CityEntity, Coordinates};

static ARTICLE_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/wiki/([^?#]+)").expect("valid article regex"));

pub struct WikidataSource {
    api: Api,
    query: String,
}

impl WikidataSource {
    pub async fn new(api_url: &str, query: &str) -> Result<Self> {
        let api = Api::new(api_url)
            .await
            .with_context(|| format!("could not connect to {}", api_url))?;
        Ok(Self {
            api,
            query: query.to_string(),
        })
    }
}

#[async_trait]
impl CitySource for WikidataSource {
    async fn list_cities(&self) -> Result<Vec<CityEntity>> {
        let res = self.api.sparql_query(&self.query).await?;
        cities_from_response(&res)
    }
}

/// Maps SPARQL JSON results to cities, keeping the first row per entity since
/// the query yields one row per population/country combination.
pub fn cities_from_response(res: &Value) -> Result<Vec<CityEntity>> {
    let bindings = res["results"]["bindings"]
        .as_array()
        .ok_or_else(|| SourceError::UnexpectedResponse("missing results.bindings".to_string()))?;

    let mut seen = HashSet::new();
    let mut cities = Vec::new();
    for binding in bindings {
        match city_from_binding(binding) {
            Ok(city) => {
                if seen.insert(city.id.clone()) {
                    cities.push(city);
                } else {
                    debug!("ignoring duplicate row for {}", city.id);
                }
            }
            Err(e) => warn!("skipping SPARQL row: {}", e),
        }
    }

    Ok(cities)
}

pub fn city_from_binding(binding: &Value) -> Result<CityEntity, SourceError> {
    let uri = binding_value(binding, "city").ok_or(SourceError::MissingBinding("city"))?;
    let id = uri
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| SourceError::InvalidEntity(uri.to_string()))?;

    let article = binding_value(binding, "article").ok_or(SourceError::MissingBinding("article"))?;
    let wikipedia_title = title_from_article(article)?;

    let label = binding_value(binding, "cityLabel").unwrap_or(id);
    let population = binding_value(binding, "population").and_then(parse_population);
    let country = binding_value(binding, "countryLabel").map(str::to_string);
    let coordinates = binding_value(binding, "gps").and_then(Coordinates::from_wkt);

    Ok(CityEntity {
        id: id.to_string(),
        label: label.to_string(),
        wikipedia_title,
        population,
        country,
        coordinates,
    })
}

/// `https://en.wikipedia.org/wiki/S%C3%A3o_Paulo` becomes `São Paulo`.
pub fn title_from_article(article: &str) -> Result<String, SourceError> {
    let encoded = ARTICLE_TITLE
        .captures(article)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| SourceError::InvalidArticle(article.to_string()))?;
    let title = urlencoding::decode(encoded)
        .map_err(|_| SourceError::InvalidArticle(article.to_string()))?;

    Ok(title.replace('_', " "))
}

fn binding_value<'a>(binding: &'a Value, name: &str) -> Option<&'a str> {
    binding[name]["value"].as_str()
}

fn parse_population(raw: &str) -> Option<u64> {
    raw.parse::<u64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|p| p.is_finite() && *p >= 0.0)
            .map(|p| p.round() as u64)
    })
}
