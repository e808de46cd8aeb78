//! Per-variant assembly of canonical items.

use tracing::{debug, warn};
use wob_core::{CanonicalItem, IndexFields, SourceDefinition, SourceUrls, COLLECTION, RIGHTS};

use crate::dates::{as_item_date, parse_iso8601, parse_time_attribute};
use crate::identity::hash_identifier;
use crate::media::extract_media;
use crate::page::PageFields;
use crate::title::{has_numeric_prefix, parse_title};
use crate::urls::{resolve_canonical_url, resolve_listing_urls, resolve_page_urls, slug_from_url};
use crate::{AdapterContext, CategoryRecord, NormalizeError, OverviewRecord, RawRecord, RenderedPage};

const OUTSTANDING_STATUS: &str = "Openstaand";

/// A canonical item plus the non-fatal problems met while building it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub item: CanonicalItem,
    pub diagnostics: Vec<NormalizeError>,
}

#[derive(Debug, Default)]
struct Diagnostics(Vec<NormalizeError>);

impl Diagnostics {
    fn push(&mut self, err: NormalizeError) {
        warn!(error = %err, "degraded record");
        self.0.push(err);
    }
}

/// Normalizer for the Utrecht Wob pages and listings.
#[derive(Debug, Clone)]
pub struct WobAdapter {
    source: SourceDefinition,
}

impl WobAdapter {
    pub fn new(source: SourceDefinition) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &SourceDefinition {
        &self.source
    }

    pub fn normalize(
        &self,
        record: &RawRecord,
        ctx: &AdapterContext,
    ) -> Result<Normalized, NormalizeError> {
        match record {
            RawRecord::RenderedPage(page) => self.normalize_page(page, ctx),
            RawRecord::Category(category) => self.normalize_category(category, ctx),
            RawRecord::Overview(overview) => self.normalize_overview(overview),
        }
    }

    fn normalize_page(
        &self,
        page: &RenderedPage,
        ctx: &AdapterContext,
    ) -> Result<Normalized, NormalizeError> {
        let markup = page.inline_html.as_deref().ok_or(NormalizeError::MissingMarkup)?;
        let fields = PageFields::from_html(markup)?;
        self.assemble_page(&fields, ctx)
    }

    pub fn assemble_page(
        &self,
        fields: &PageFields,
        ctx: &AdapterContext,
    ) -> Result<Normalized, NormalizeError> {
        let mut diagnostics = Diagnostics::default();
        let url = resolve_canonical_url(fields.og_url.as_deref(), fields.player_href.as_deref())?;

        let raw_title = fields.title();
        if raw_title.is_none() {
            diagnostics.push(NormalizeError::MissingTitle);
        }
        let parsed = parse_title(raw_title);
        debug!(identifier = %parsed.identifier, status = %parsed.status, title = ?parsed.title, "parsed title");

        let original_id = self.resolve_identifier(&parsed.identifier, &url, &mut diagnostics);
        let object_id = hash_identifier(&self.source.index_name, &original_id);

        let end_date = fields
            .time_datetime
            .as_deref()
            .map(parse_time_attribute)
            .transpose()?;
        let stamp = end_date.unwrap_or_else(|| ctx.fetched_at.naive_utc());
        let source_urls = resolve_page_urls(&url, fields.last_stylesheet(), stamp);

        // Pages whose identifier does not start with four digits are emitted
        // without index id and status, even when a slug was substituted.
        let (id, status) = if has_numeric_prefix(&original_id) {
            (Some(object_id.clone()), Some(parsed.status.clone()))
        } else {
            warn!(identifier = %original_id, url = %url, "omitting index id and status");
            (None, None)
        };

        let index = IndexFields {
            hidden: Some(self.source.hidden),
            id,
            status,
            title: parsed.title,
            description: fields.description().map(ToString::to_string),
            end_date: end_date.map(as_item_date),
            media_urls: Some(extract_media(&fields.download_links)),
            ..Default::default()
        };

        Ok(Normalized {
            item: build_item(object_id, non_empty(original_id), source_urls, index),
            diagnostics: diagnostics.0,
        })
    }

    fn normalize_category(
        &self,
        record: &CategoryRecord,
        ctx: &AdapterContext,
    ) -> Result<Normalized, NormalizeError> {
        let mut diagnostics = Diagnostics::default();
        let url = record.url.trim();
        if url.is_empty() {
            return Err(NormalizeError::UnresolvableUrl);
        }

        let title = Some(record.title.as_str()).filter(|t| !t.trim().is_empty());
        if title.is_none() {
            diagnostics.push(NormalizeError::MissingTitle);
        }
        let parsed = parse_title(title);
        let original_id = self.resolve_identifier(&parsed.identifier, url, &mut diagnostics);
        let object_id = hash_identifier(&self.source.index_name, &original_id);

        let index = IndexFields {
            categories: Some(record.categories.clone()),
            ..Default::default()
        };
        let source_urls = resolve_listing_urls(url, ctx.fetched_at.naive_utc());

        Ok(Normalized {
            item: build_item(object_id, non_empty(original_id), source_urls, index),
            diagnostics: diagnostics.0,
        })
    }

    fn normalize_overview(&self, record: &OverviewRecord) -> Result<Normalized, NormalizeError> {
        let object_id = hash_identifier(&self.source.index_name, &record.id);
        debug!(identifier = %record.id, object_id = %object_id, "outstanding request");

        let start_date = record.date.as_deref().map(parse_iso8601).transpose()?;
        let index = IndexFields {
            hidden: Some(self.source.hidden),
            id: Some(object_id.clone()),
            status: Some(OUTSTANDING_STATUS.to_string()),
            title: Some(format!("{} {OUTSTANDING_STATUS} {}", record.id, record.title)),
            start_date,
            ..Default::default()
        };

        Ok(Normalized {
            item: build_item(
                object_id,
                non_empty(record.id.clone()),
                SourceUrls::empty(),
                index,
            ),
            diagnostics: Vec::new(),
        })
    }

    /// Parsed identifier when it starts with four digits, otherwise the URL slug.
    fn resolve_identifier(
        &self,
        identifier: &str,
        url: &str,
        diagnostics: &mut Diagnostics,
    ) -> String {
        if has_numeric_prefix(identifier) {
            return identifier.to_string();
        }
        diagnostics.push(NormalizeError::MalformedIdentifier(identifier.to_string()));
        let resolved = slug_from_url(url).unwrap_or_else(|| identifier.to_string());
        debug!(identifier, slug = %resolved, "identifier taken from url slug");
        resolved
    }
}

fn build_item(
    object_id: String,
    original_id: Option<String>,
    source_urls: SourceUrls,
    index: IndexFields,
) -> CanonicalItem {
    let all_text = [index.title.as_deref(), index.description.as_deref()]
        .into_iter()
        .flatten()
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    CanonicalItem {
        object_id,
        original_id,
        collection: COLLECTION.to_string(),
        rights: RIGHTS.to_string(),
        source_urls,
        all_text,
        index,
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

pub fn adapter_for_source(source: &SourceDefinition) -> Option<WobAdapter> {
    match source.source_id.as_str() {
        "utrecht" => Some(WobAdapter::new(source.clone())),
        _ => None,
    }
}
