// API client module: a small blocking HTTP client for the photo-hosting
// listing endpoint and for the image URLs it hands back. Everything is
// synchronous; one request is in flight at a time.

use crate::config::CollectionRef;
use crate::error::{Error, Result};
use reqwest::blocking::{Client, Response};
use reqwest::header::{COOKIE, USER_AGENT};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Browser-like user agent; the listing endpoint rejects obvious bots.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Name of the session cookie the endpoint authenticates with.
pub const SESSION_COOKIE: &str = "PHPSESSID";

/// Blocking client shared by the listing and download phases.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
}

/// One page of the listing endpoint. Unknown fields are ignored and
/// missing or null ones default, so a bare `{}` reads as an empty page.
/// Decoding is lenient: a badly typed field never costs the whole page.
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct PageResponse {
    #[serde(default, deserialize_with = "lenient_entries")]
    pub photos: Vec<PhotoEntry>,
    #[serde(default, rename = "isLastPage", deserialize_with = "truthy")]
    pub is_last_page: bool,
}

/// A single photo as the endpoint describes it. Any field may be missing,
/// null or of the wrong type; only strings are kept.
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct PhotoEntry {
    #[serde(default, deserialize_with = "string_only")]
    pub fullsize_url: Option<String>,
    #[serde(default, deserialize_with = "string_only")]
    pub large_url: Option<String>,
    #[serde(default, deserialize_with = "string_only")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "string_only")]
    pub filename: Option<String>,
}

fn string_only<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Ok(Some(s)),
        _ => Ok(None),
    }
}

/// JSON truthiness: `false`, null, 0, "" and empty containers are false.
fn truthy<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().map_or(true, |f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    })
}

fn lenient_entries<'de, D>(deserializer: D) -> std::result::Result<Vec<PhotoEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items,
        _ => return Ok(Vec::new()),
    };
    // An entry that is not an object decodes as empty and is skipped later
    // for lack of a URL.
    Ok(entries
        .into_iter()
        .map(|item| serde_json::from_value(item).unwrap_or_default())
        .collect())
}

impl ApiClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder().build().map_err(Error::Client)?;
        Ok(ApiClient { client })
    }

    /// Request one listing page (1-based) for the collection. A non-success
    /// status or a body that is not a listing both come back as errors.
    pub fn fetch_page(&self, collection: &CollectionRef, page: u32) -> reqwest::Result<PageResponse> {
        let page = page.to_string();
        let collection_id = collection.collection_id.to_string();
        self.client
            .get(&collection.base_url)
            .query(&[
                ("cid", collection_id.as_str()),
                ("cuk", collection.collection_key.as_str()),
                ("gs", collection.gallery_name.as_str()),
                ("page", page.as_str()),
            ])
            .header("x-requested-with", "XMLHttpRequest")
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .header(COOKIE, format!("{}={}", SESSION_COOKIE, collection.session))
            .send()?
            .error_for_status()?
            .json::<PageResponse>()
    }

    /// Start a download of an image URL. The body is left unread so the
    /// caller can stream it to disk.
    pub fn get_image(&self, url: &str) -> reqwest::Result<Response> {
        self.client.get(url).send()?.error_for_status()
    }
}
