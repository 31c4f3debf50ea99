use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use crate::city::CityEntity;

pub mod wikidata;
pub mod wikipedia;


#[derive(Error, Debug, PartialEq)]
pub enum SourceError {
    #[error("binding has no `{0}` value")]
    MissingBinding(&'static str),

    #[error("could not read entity id from {0}")]
    InvalidEntity(String),

    #[error("could not read article title from {0}")]
    InvalidArticle(String),

    #[error("unexpected response shape: {0}")]
    UnexpectedResponse(String),
}

/// Lists the cities to process.
#[async_trait]
pub trait CitySource {
    async fn list_cities(&self) -> Result<Vec<CityEntity>>;
}

/// Fetches page wikitext by title; `None` when the page does not exist.
#[async_trait]
pub trait PageSource {
    async fn fetch_wikitext(&self, title: &str) -> Result<Option<String>>;
}
