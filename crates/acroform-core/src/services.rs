//! Contracts for services the form pipeline talks to but does not implement.
//!
//! Applications plug in their own document store and page-description
//! service. The pipeline never retries a call or rewrites its error; what
//! the service returns is what the caller gets.

use std::time::Duration;

/// A generic document store with create/read/update/delete semantics.
///
/// Records are opaque to the pipeline; `Filter` and `Patch` are whatever
/// the store understands (typically JSON objects).
pub trait EntityStore {
    type Record;
    type Filter;
    type Patch;
    type Error: std::error::Error;

    /// Fetch one record, `Ok(None)` when the id is unknown.
    fn get(&self, id: &str) -> Result<Option<Self::Record>, Self::Error>;
    fn list(&self, filter: &Self::Filter) -> Result<Vec<Self::Record>, Self::Error>;
    fn create(&mut self, data: Self::Record) -> Result<Self::Record, Self::Error>;
    fn update(&mut self, id: &str, patch: Self::Patch) -> Result<Self::Record, Self::Error>;
    fn remove(&mut self, id: &str) -> Result<(), Self::Error>;
}

/// A pre-rendered page image, base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PageImage {
    /// 1-based page number.
    pub page: u32,
    /// MIME type of the encoded image, e.g. `image/png`.
    pub mime_type: String,
    pub base64_data: String,
}

/// What a description service reports for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PageDescription {
    /// Short free-text summary of the page.
    pub summary: String,
    /// Field labels in the order the service found them.
    pub field_labels: Vec<String>,
}

/// A black-box service that describes rendered form pages.
///
/// Implementations must give up after `timeout` and report that as an
/// error. The returned list holds one entry per input image, in order.
pub trait FieldDescriptionService {
    type Error: std::error::Error;

    fn describe_pages(
        &self,
        images: &[PageImage],
        timeout: Duration,
    ) -> Result<Vec<PageDescription>, Self::Error>;
}
