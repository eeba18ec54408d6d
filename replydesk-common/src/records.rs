//! Review reply record model and list filtering
//!
//! A record's identity is its position in the data file. Every index handed
//! out by [`crate::store::ReplyStore::list`] is a position in the whole file,
//! never in a filtered view.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One AI-generated reply to a customer review
///
/// Field names follow the JSON keys written by the fetch/generate scripts.
/// Two shapes exist in the wild: the early one keyed by `reviewId`/`locationId`
/// and the later one partitioned by `store_id`. Both deserialize into this type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplyRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: String,

    /// `ONE`..`FIVE` or a digit string
    #[serde(rename = "starRating", default, deserialize_with = "null_as_default")]
    pub star_rating: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub comment: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub reply: String,

    #[serde(rename = "reviewId", default, skip_serializing_if = "Option::is_none")]
    pub review_id: Option<String>,

    #[serde(rename = "locationId", default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub posted: bool,

    /// Soft delete flag
    #[serde(default, deserialize_with = "null_as_default")]
    pub deleted: bool,

    /// Keys written by other tools, carried through rewrites untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `null` reads as the type's default (empty text, `false`)
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ReplyRecord {
    /// Numeric star rating (1-5), if the raw value is recognised
    pub fn stars(&self) -> Option<u8> {
        let raw = self.star_rating.trim();
        let stars = match raw.to_ascii_uppercase().as_str() {
            "ONE" => 1,
            "TWO" => 2,
            "THREE" => 3,
            "FOUR" => 4,
            "FIVE" => 5,
            _ => raw.parse::<u8>().ok()?,
        };
        (1..=5).contains(&stars).then_some(stars)
    }
}

/// Which stores a caller may see
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreScope {
    /// Administrator: every record, including ones without a store
    All,
    /// A single store location
    Store(String),
}

impl StoreScope {
    /// Scope for an optional store id (`None` is the administrator scope)
    pub fn from_store_id(store_id: Option<&str>) -> Self {
        match store_id {
            Some(id) => StoreScope::Store(id.to_string()),
            None => StoreScope::All,
        }
    }

    /// Narrow an administrator scope to one store
    ///
    /// Store scopes are never widened or switched: a store user asking for
    /// another store keeps their own.
    pub fn narrow(&self, store: Option<&str>) -> Self {
        match (self, store.map(str::trim).filter(|s| !s.is_empty())) {
            (StoreScope::All, Some(id)) => StoreScope::Store(id.to_string()),
            _ => self.clone(),
        }
    }

    pub fn permits(&self, record: &ReplyRecord) -> bool {
        match self {
            StoreScope::All => true,
            StoreScope::Store(id) => record.store_id.as_deref() == Some(id.as_str()),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, StoreScope::All)
    }

    /// Label used in file names and page headers
    pub fn label(&self) -> &str {
        match self {
            StoreScope::All => "all",
            StoreScope::Store(id) => id,
        }
    }
}

/// Posted-state part of the list filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusView {
    #[default]
    All,
    /// Not yet posted
    Pending,
    Posted,
}

impl StatusView {
    /// Parse the `view` query parameter; anything unrecognised is `All`
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("pending") => StatusView::Pending,
            Some("posted") => StatusView::Posted,
            _ => StatusView::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusView::All => "all",
            StatusView::Pending => "pending",
            StatusView::Posted => "posted",
        }
    }

    pub fn matches(&self, posted: bool) -> bool {
        match self {
            StatusView::All => true,
            StatusView::Pending => !posted,
            StatusView::Posted => posted,
        }
    }
}

/// Store + deleted + posted predicate used by listing, bulk post and export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilter {
    pub scope: StoreScope,
    pub status: StatusView,
}

impl ListFilter {
    pub fn new(scope: StoreScope, status: StatusView) -> Self {
        Self { scope, status }
    }

    /// Deleted records never match
    pub fn matches(&self, record: &ReplyRecord) -> bool {
        !record.deleted && self.scope.permits(record) && self.status.matches(record.posted)
    }
}
