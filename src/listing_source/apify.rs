// apify.rs
use crate::config::SearchVariables;
use crate::listing_source::{ListingSource, SourceError};
use reqwest::blocking::Client;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

const APIFY_API_BASE: &str = "https://api.apify.com/v2";

/// Runs the Airbnb scraper actor synchronously and returns its dataset items.
pub struct ApifyClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApifyClient {
    pub fn new(token: Option<String>) -> Result<Self, SourceError> {
        Self::with_base_url(APIFY_API_BASE, token)
    }

    pub fn with_base_url(base_url: &str, token: Option<String>) -> Result<Self, SourceError> {
        // Actor runs with reviews regularly take minutes.
        let client = Client::builder()
            .timeout(Duration::from_secs(360))
            .build()
            .map_err(|e| SourceError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Reads `APIFY_TOKEN`. A missing token only fails once a fetch is attempted.
    pub fn from_env() -> Result<Self, SourceError> {
        let token = std::env::var("APIFY_TOKEN").ok().filter(|t| !t.trim().is_empty());
        Self::new(token)
    }

    fn run_url(&self, actor_id: &str, token: &str) -> Result<Url, SourceError> {
        let mut url = Url::parse(&format!(
            "{}/acts/{}/run-sync-get-dataset-items",
            self.base_url, actor_id
        ))
        .map_err(|e| SourceError::Config(format!("invalid Apify URL: {e}")))?;

        url.query_pairs_mut()
            .append_pair("token", token)
            .append_pair("format", "json");
        Ok(url)
    }
}

impl ListingSource for ApifyClient {
    fn fetch_listings(&self, search: &SearchVariables) -> Result<Value, SourceError> {
        let token = self.token.as_deref().ok_or_else(|| {
            SourceError::Config("APIFY_TOKEN environment variable not set".into())
        })?;

        let actor_id = search.actor_id.trim();
        if actor_id.is_empty() {
            return Err(SourceError::Config("actor_id is empty".into()));
        }

        let url = self.run_url(actor_id, token)?;
        let run_input = build_run_input(search);
        debug!("Apify run input: {run_input}");
        info!("Starting Apify actor {actor_id}");

        let resp = self
            .client
            .post(url)
            .json(&run_input)
            .send()
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .map_err(|e| SourceError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(SourceError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let data: Value =
            serde_json::from_str(&text).map_err(|e| SourceError::JsonParse(e.to_string()))?;
        info!(
            "Fetched {} listings from Apify",
            data.as_array().map_or(0, Vec::len)
        );
        Ok(data)
    }
}

/// Actor input for a search. `locationQuery` is only sent when no start URLs are given.
pub fn build_run_input(search: &SearchVariables) -> Value {
    let start_urls: Vec<Value> = search
        .start_urls
        .iter()
        .map(|url| json!({ "url": url }))
        .collect();

    let mut input = Map::new();
    input.insert("maxListings".into(), json!(search.max_listings));
    input.insert("includeReviews".into(), json!(search.include_reviews));
    input.insert("maxReviews".into(), json!(search.max_reviews));
    input.insert("calendarMonths".into(), json!(search.calendar_months));
    input.insert("addMoreHostInfo".into(), json!(search.add_more_host_info));
    input.insert("currency".into(), json!(search.currency));
    input.insert("limitPoints".into(), json!(search.limit_points));

    if !search.check_in.is_empty() {
        input.insert("checkIn".into(), json!(search.check_in));
    }
    if !search.check_out.is_empty() {
        input.insert("checkOut".into(), json!(search.check_out));
    }

    if start_urls.is_empty() {
        input.insert("locationQuery".into(), json!(search.location_query));
    }
    input.insert("startUrls".into(), Value::Array(start_urls));

    Value::Object(input)
}
