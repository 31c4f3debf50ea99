use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use wikibase::mediawiki::api::Api;

use super::{PageSource, SourceError};

pub struct WikipediaSource {
    api: Api,
}

impl WikipediaSource {
    pub async fn new(api_url: &str) -> Result<Self> {
        let api = Api::new(api_url)
            .await
            .with_context(|| format!("could not connect to {}", api_url))?;
        Ok(Self { api })
    }
}

#[async_trait]
impl PageSource for WikipediaSource {
    async fn fetch_wikitext(&self, title: &str) -> Result<Option<String>> {
        let params = self.api.params_into(&[
            ("action", "query"),
            ("prop", "revisions"),
            ("rvprop", "content"),
            ("rvslots", "main"),
            ("redirects", "1"),
            ("formatversion", "2"),
            ("titles", title),
        ]);
        let res = self.api.get_query_api_json(&params).await?;

        Ok(wikitext_from_response(&res)?)
    }
}

/// Reads the main slot content of the single page in a `formatversion=2`
/// revisions response.
pub fn wikitext_from_response(res: &Value) -> Result<Option<String>, SourceError> {
    let page = res["query"]["pages"]
        .as_array()
        .and_then(|pages| pages.first())
        .ok_or_else(|| SourceError::UnexpectedResponse("missing query.pages".to_string()))?;

    if page["missing"].as_bool() == Some(true) || page["invalid"].as_bool() == Some(true) {
        return Ok(None);
    }

    page["revisions"]
        .as_array()
        .and_then(|revisions| revisions.first())
        .and_then(|revision| revision["slots"]["main"]["content"].as_str())
        .map(|content| Some(content.to_string()))
        .ok_or_else(|| SourceError::UnexpectedResponse("page has no revision content".to_string()))
}
