//! Pagination over `Elvanto` list endpoints.
//!
//! List endpoints (`people/getAll`, `services/getAll`, ...) wrap their records
//! as `{ "<collection>": { "page", "per_page", "on_this_page", "total",
//! "<record>": [...] } }`. [`fetch_all`] walks pages from 1 until every
//! record has been seen.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::elvanto::api::{self, Connection};
use crate::error::{Error, Result};

/// Where a list endpoint puts its records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Listing {
    /// Key of the paging wrapper, e.g. `people`.
    pub collection: &'static str,
    /// Key of the record array inside the wrapper, e.g. `person`.
    pub record: &'static str,
}

impl Listing {
    /// `people/getAll`.
    pub const PEOPLE: Self = Self { collection: "people", record: "person" };
    /// `services/getAll`.
    pub const SERVICES: Self = Self { collection: "services", record: "service" };
}

/// One page of a list response.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 1-based page number.
    pub page: u64,
    /// Page size the server applied.
    pub per_page: u64,
    /// Records on this page.
    pub on_this_page: u64,
    /// Records across all pages.
    pub total: u64,
    /// The records themselves.
    pub records: Vec<Value>,
}

impl Page {
    /// Extract the paging wrapper from a response envelope.
    pub fn from_envelope(envelope: &Value, listing: Listing) -> Result<Self> {
        let wrapper = envelope.get(listing.collection).ok_or_else(|| {
            Error::parse(
                format!("Missing '{}' in list response", listing.collection),
                listing.collection.to_string(),
            )
        })?;

        let field = |name: &str| {
            wrapper.get(name).and_then(lenient_u64).ok_or_else(|| {
                Error::parse(
                    format!("Missing or non-numeric '{name}'"),
                    listing.collection.to_string(),
                )
            })
        };

        let records = wrapper
            .get(listing.record)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(Self {
            page: field("page")?,
            per_page: field("per_page")?,
            on_this_page: field("on_this_page")?,
            total: field("total")?,
            records,
        })
    }

    /// Records left after this page: `total - (page - 1) * per_page - on_this_page`.
    pub fn remaining(&self) -> u64 {
        let consumed = self
            .page
            .saturating_sub(1)
            .saturating_mul(self.per_page)
            .saturating_add(self.on_this_page);
        self.total.saturating_sub(consumed)
    }
}

/// Read a count that may arrive as a JSON number or a numeric string.
pub fn lenient_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Source of raw list-endpoint envelopes, one page at a time.
#[async_trait]
pub trait PageSource: Send {
    /// Fetch the envelope for `page` (1-based).
    async fn fetch_page(&mut self, page: u64, page_size: u32) -> Result<Value>;
}

/// Pages of an API endpoint fetched through a [`Connection`].
pub struct EndpointPages<'a> {
    conn: &'a mut Connection,
    endpoint: &'a str,
    params: serde_json::Map<String, Value>,
}

impl<'a> EndpointPages<'a> {
    /// Page through `endpoint`, sending `params` alongside `page`/`page_size`.
    pub fn new(conn: &'a mut Connection, endpoint: &'a str, params: serde_json::Map<String, Value>) -> Self {
        Self { conn, endpoint, params }
    }
}

#[async_trait]
impl<'a> PageSource for EndpointPages<'a> {
    async fn fetch_page(&mut self, page: u64, page_size: u32) -> Result<Value> {
        let mut params = self.params.clone();
        params.insert("page".into(), page.into());
        params.insert("page_size".into(), page_size.into());
        self.conn.post(self.endpoint, Value::Object(params)).await
    }
}

/// Fetch every page and collect records keyed by id.
///
/// Every page must come back with status `ok`; anything else aborts the walk
/// and discards what was collected. Later duplicates overwrite earlier ones.
pub async fn fetch_all<S>(source: &mut S, page_size: u32, listing: Listing) -> Result<HashMap<String, Value>>
where
    S: PageSource + ?Sized,
{
    let mut result = HashMap::new();
    let mut page_no = 1;

    loop {
        let envelope = source.fetch_page(page_no, page_size).await?;
        if !api::is_ok(&envelope) {
            return Err(Error::api(
                format!(
                    "{} page {page_no} returned status '{}'",
                    listing.collection,
                    api::status(&envelope)
                ),
                api::error_code(&envelope),
            ));
        }

        let page = Page::from_envelope(&envelope, listing)?;
        debug!(
            collection = listing.collection,
            page = page.page,
            on_this_page = page.on_this_page,
            total = page.total,
            "Fetched page"
        );

        for record in &page.records {
            match record_id(record) {
                Some(id) => {
                    result.insert(id, record.clone());
                }
                None => warn!(collection = listing.collection, "Skipping record without id"),
            }
        }

        if page.remaining() == 0 {
            break;
        }
        if page.on_this_page == 0 {
            warn!(
                collection = listing.collection,
                remaining = page.remaining(),
                "Empty page while records remain; stopping"
            );
            break;
        }
        page_no = page.page + 1;
    }

    Ok(result)
}

fn record_id(record: &Value) -> Option<String> {
    match record.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
