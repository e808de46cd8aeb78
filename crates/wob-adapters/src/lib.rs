//! Record contracts and the extraction pipeline that turns raw Wob records
//! into canonical items.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod assemble;
pub mod dates;
pub mod identity;
pub mod media;
pub mod page;
pub mod title;
pub mod urls;

pub use assemble::{adapter_for_source, Normalized, WobAdapter};
pub use page::{AnchorRef, PageFields};

pub const CRATE_NAME: &str = "wob-adapters";

/// Per-run context shared by every record of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterContext {
    pub run_id: Uuid,
    /// Stands in for "now" wherever a record carries no date of its own.
    pub fetched_at: DateTime<Utc>,
}

impl AdapterContext {
    pub fn new(fetched_at: DateTime<Utc>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            fetched_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("no title could be extracted")]
    MissingTitle,
    #[error("no canonical url: neither og:url nor a player link with a url parameter")]
    UnresolvableUrl,
    #[error("identifier {0:?} does not start with four digits")]
    MalformedIdentifier(String),
    #[error("malformed date {value:?}: {reason}")]
    MalformedDate { value: String, reason: String },
    #[error("page markup was not loaded")]
    MissingMarkup,
    #[error("invalid selector: {0}")]
    Selector(String),
}

impl NormalizeError {
    /// Fatal errors drop the record from the batch; the rest degrade to
    /// empty or absent fields and travel with the item as diagnostics.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::MissingTitle | Self::MalformedIdentifier(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawRecord {
    RenderedPage(RenderedPage),
    Category(CategoryRecord),
    Overview(OverviewRecord),
}

impl RawRecord {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RenderedPage(_) => "rendered_page",
            Self::Category(_) => "category",
            Self::Overview(_) => "overview",
        }
    }
}

/// A fetched disclosure page. The markup is parsed on the worker that
/// normalizes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RenderedPage {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub inline_html: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

/// Entry of the outstanding-requests listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverviewRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordBundle {
    pub bundle_id: String,
    pub source_id: String,
    pub records: Vec<RawRecord>,
}

pub fn load_record_bundle(path: impl AsRef<Path>) -> Result<RecordBundle> {
    let path = path.as_ref();
    let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut bundle: RecordBundle =
        serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    hydrate_page_markup(path, &mut bundle)?;
    Ok(bundle)
}

/// Loads `path`-referenced page markup into `inline_html`. Missing files are
/// left unloaded so the record fails on its own instead of sinking the bundle.
fn hydrate_page_markup(bundle_path: &Path, bundle: &mut RecordBundle) -> Result<()> {
    let base = bundle_path.parent().unwrap_or_else(|| Path::new("."));
    for record in &mut bundle.records {
        let RawRecord::RenderedPage(page) = record else {
            continue;
        };
        if page.inline_html.is_some() {
            continue;
        }
        let Some(rel_path) = &page.path else {
            continue;
        };
        let raw_path = base.join(rel_path);
        if !raw_path.exists() {
            continue;
        }
        let raw = fs::read_to_string(&raw_path)
            .with_context(|| format!("reading page markup {}", raw_path.display()))?;
        page.inline_html = Some(raw);
    }
    Ok(())
}
