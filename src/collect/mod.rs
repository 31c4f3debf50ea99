use std::{collections::BTreeMap, path::Path};

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::{
    city::{CityEntity, ClimateRecord},
    climate,
    config::{Config, WeatherboxConfig},
    source::{
        CitySource, PageSource, wikidata::WikidataSource, wikipedia::WikipediaSource,
    },
    store::Store,
    weatherbox,
};


#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Leave cities that are already stored untouched.
    pub resume: bool,
    pub limit: Option<usize>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub stored: usize,
    pub skipped: usize,
    pub already_present: usize,
}

enum Lookup {
    Found(BTreeMap<String, String>),
    NoWeatherbox,
    MissingPage,
}

#[tokio::main]
pub async fn run(db_path: &Path, config_path: Option<&Path>, options: Options) -> Result<()> {
    let config = Config::load(config_path)?;

    let conn = Connection::open(db_path)
        .with_context(|| format!("could not open database at {:?}", db_path))?;
    let store = Store::new(&conn);
    store.init().context("could not create cities table")?;

    let cities = WikidataSource::new(&config.wikidata.api, &config.wikidata.query).await?;
    let pages = WikipediaSource::new(&config.wikipedia.api).await?;

    let summary = collect(&cities, &pages, &store, &config.weatherbox, options).await?;
    info!(
        "done: {} stored, {} skipped, {} already present",
        summary.stored, summary.skipped, summary.already_present
    );

    Ok(())
}

/// Lists cities, then fetches, parses and stores them one at a time. A city
/// whose page cannot be fetched is logged and skipped; listing and store
/// failures end the run.
pub async fn collect(
    cities: &dyn CitySource,
    pages: &dyn PageSource,
    store: &Store<'_>,
    config: &WeatherboxConfig,
    options: Options,
) -> Result<Summary> {
    let mut cities = cities
        .list_cities()
        .await
        .context("could not list cities")?;
    if let Some(limit) = options.limit {
        cities.truncate(limit);
    }

    let total = cities.len();
    let mut summary = Summary::default();

    for (index, city) in cities.iter().enumerate() {
        let progress = format!("({}/{})", index + 1, total);

        if options.resume && store.contains(&city.id)? {
            info!("{} skipping {}, already stored", progress, city.label);
            summary.already_present += 1;
            continue;
        }

        info!("{} processing {}", progress, city.label);
        let params = match lookup_weatherbox(pages, city, config).await {
            Ok(Lookup::Found(params)) => params,
            Ok(Lookup::NoWeatherbox) => {
                info!("{} no weather box for {}", progress, city.label);
                BTreeMap::new()
            }
            Ok(Lookup::MissingPage) => {
                warn!(
                    "{} skipping {}, page `{}` does not exist",
                    progress, city.label, city.wikipedia_title
                );
                summary.skipped += 1;
                continue;
            }
            Err(e) => {
                warn!("{} skipping {}: {:#}", progress, city.label, e);
                summary.skipped += 1;
                continue;
            }
        };

        let record = ClimateRecord::new(city, climate::normalize(&params, config));
        store
            .upsert(&record)
            .with_context(|| format!("could not store {} ({})", city.label, city.id))?;
        summary.stored += 1;
    }

    Ok(summary)
}

/// The weatherbox is either on the article itself or in a per-city template
/// such as `Template:Tokyo weatherbox` transcluded by it.
async fn lookup_weatherbox(
    pages: &dyn PageSource,
    city: &CityEntity,
    config: &WeatherboxConfig,
) -> Result<Lookup> {
    let Some(text) = pages.fetch_wikitext(&city.wikipedia_title).await? else {
        return Ok(Lookup::MissingPage);
    };

    if let Some(template) = weatherbox::find_template(&text, &config.template) {
        debug!("found {} with {} parameters", template.name, template.params.len());
        return Ok(Lookup::Found(template.params));
    }

    let Some(name) = weatherbox::find_transcluded(&text, &config.redirect_marker) else {
        return Ok(Lookup::NoWeatherbox);
    };

    debug!("following transcluded template {} for {}", name, city.label);
    let title = format!("Template:{}", name);
    let Some(text) = pages
        .fetch_wikitext(&title)
        .await
        .with_context(|| format!("could not fetch `{}`", title))?
    else {
        warn!("`{}` does not exist", title);
        return Ok(Lookup::NoWeatherbox);
    };

    Ok(weatherbox::find_template(&text, &config.template)
        .map_or(Lookup::NoWeatherbox, |template| Lookup::Found(template.params)))
}
