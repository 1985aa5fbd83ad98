//! Notion record store.
//!
//! Lists every page the integration can see through the `search` endpoint
//! and writes relation properties with `PATCH /v1/pages/{id}`. Page
//! properties are decoded once here into [`FieldValue`]s; nothing past this
//! module looks at Notion JSON.
//!
//! # Configuration
//!
//! ```toml
//! [store]
//! base_url = "https://api.notion.com"
//! api_version = "2022-06-28"
//! token_env = "NOTION_TOKEN"
//! page_size = 100
//! timeout_secs = 30
//! ```
//!
//! # Pagination
//!
//! `search` returns at most `page_size` (≤ 100) results per call together
//! with `has_more` and `next_cursor`. The cursor is only followed while
//! `has_more` is true; `has_more` without a cursor is an error, so the
//! retrieval is marked partial instead of ending early.
//!
//! # Property decoding
//!
//! | Notion type | [`FieldValue`] |
//! |-------------|----------------|
//! | `title` | `Title(runs)` |
//! | `rich_text` | `RichText(runs)` |
//! | `number` | `Number(Option<f64>)` |
//! | `relation` | `Relation(ids)` |
//! | other | `Other(type)` |

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::StoreConfig;
use crate::models::{FieldValue, Record, RecordPage, TextRun};
use crate::traits::RecordStore;

/// A [`RecordStore`] backed by the Notion REST API.
pub struct NotionStore {
    client: reqwest::Client,
    base_url: String,
    api_version: String,
    token: String,
    page_size: u32,
}

impl NotionStore {
    /// Create a client for the configured endpoint.
    pub fn new(config: &StoreConfig, token: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            token,
            page_size: config.page_size,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Notion-Version", &self.api_version)
            .header("Content-Type", "application/json")
    }
}

#[async_trait]
impl RecordStore for NotionStore {
    fn name(&self) -> &str {
        "notion"
    }

    async fn fetch_page(&self, cursor: Option<&str>) -> Result<RecordPage> {
        let body = search_body(cursor, self.page_size);
        let resp = self
            .request(reqwest::Method::POST, "/v1/search")
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to search Notion pages: {}", e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            bail!(
                "Notion search failed (HTTP {}): {}",
                status,
                text.chars().take(500).collect::<String>()
            );
        }

        let json: Value = resp
            .json()
            .await
            .context("Failed to decode Notion search response")?;
        let page = parse_search_response(&json)?;
        debug!(
            records = page.records.len(),
            more = page.next_cursor.is_some(),
            "notion search page"
        );
        Ok(page)
    }

    async fn update_relation(
        &self,
        record_id: &str,
        field_name: &str,
        target_id: &str,
    ) -> Result<()> {
        let body = relation_patch_body(field_name, target_id);
        let resp = self
            .request(reqwest::Method::PATCH, &format!("/v1/pages/{}", record_id))
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to update page {}: {}", record_id, e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            bail!(
                "Notion page update failed (HTTP {}): {}",
                status,
                text.chars().take(500).collect::<String>()
            );
        }
        Ok(())
    }
}

/// Body of a `POST /v1/search` call restricted to pages.
fn search_body(cursor: Option<&str>, page_size: u32) -> Value {
    let mut body = json!({
        "filter": { "property": "object", "value": "page" },
        "page_size": page_size,
    });
    if let Some(c) = cursor {
        body["start_cursor"] = Value::String(c.to_string());
    }
    body
}

/// Body of a `PATCH /v1/pages/{id}` call that replaces one relation.
fn relation_patch_body(field_name: &str, target_id: &str) -> Value {
    json!({
        "properties": {
            field_name: { "relation": [ { "id": target_id } ] }
        }
    })
}

/// Parse a search response into a [`RecordPage`].
fn parse_search_response(json: &Value) -> Result<RecordPage> {
    let results = json
        .get("results")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow::anyhow!("Invalid Notion response: missing results array"))?;

    let records = results.iter().filter_map(decode_page).collect();

    let has_more = json.get("has_more").and_then(Value::as_bool).unwrap_or(false);
    let next_cursor = if has_more {
        match json.get("next_cursor").and_then(Value::as_str) {
            Some(c) if !c.is_empty() => Some(c.to_string()),
            _ => bail!("Invalid Notion response: has_more without next_cursor"),
        }
    } else {
        None
    };

    Ok(RecordPage {
        records,
        next_cursor,
    })
}

/// Decode one page object. Objects without an id are dropped.
fn decode_page(page: &Value) -> Option<Record> {
    let id = page.get("id").and_then(Value::as_str)?;
    if id.is_empty() {
        return None;
    }

    let fields: HashMap<String, FieldValue> = page
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .map(|(name, prop)| (name.clone(), decode_property(prop)))
                .collect()
        })
        .unwrap_or_default();

    Some(Record {
        id: id.to_string(),
        fields,
    })
}

fn decode_property(prop: &Value) -> FieldValue {
    let kind = prop.get("type").and_then(Value::as_str).unwrap_or("");
    match kind {
        "title" => FieldValue::Title(decode_runs(prop.get("title"))),
        "rich_text" => FieldValue::RichText(decode_runs(prop.get("rich_text"))),
        "number" => FieldValue::Number(prop.get("number").and_then(Value::as_f64)),
        "relation" => FieldValue::Relation(
            prop.get("relation")
                .and_then(Value::as_array)
                .map(|refs| {
                    refs.iter()
                        .filter_map(|r| r.get("id").and_then(Value::as_str))
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        ),
        other => FieldValue::Other(other.to_string()),
    }
}

fn decode_runs(runs: Option<&Value>) -> Vec<TextRun> {
    runs.and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .map(|run| {
                    TextRun::new(
                        run.get("plain_text")
                            .and_then(Value::as_str)
                            .unwrap_or_default(),
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}
