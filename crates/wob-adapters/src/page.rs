//! Typed view over the parts of a disclosure page the pipeline reads.

use scraper::{ElementRef, Html, Selector};

use crate::NormalizeError;

/// A `class="download"` anchor as found in the markup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnchorRef {
    pub href: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageFields {
    pub og_title: Option<String>,
    pub title_text: Option<String>,
    pub og_url: Option<String>,
    pub player_href: Option<String>,
    /// Every `link[rel=stylesheet]` href, in document order.
    pub stylesheet_hrefs: Vec<String>,
    /// First `time[datetime]` attribute.
    pub time_datetime: Option<String>,
    /// First paragraph of the current site layout.
    pub limiter_paragraph: Option<String>,
    /// First paragraph of the pre-2016 news layout.
    pub news_item_paragraph: Option<String>,
    pub download_links: Vec<AnchorRef>,
}

impl PageFields {
    pub fn from_html(html: &str) -> Result<Self, NormalizeError> {
        Self::from_document(&Html::parse_document(html))
    }

    pub fn from_document(document: &Html) -> Result<Self, NormalizeError> {
        let download = selector("a.download")?;
        let download_links = document
            .select(&download)
            .map(|a| AnchorRef {
                href: a.value().attr("href").unwrap_or_default().to_string(),
                text: element_text(a),
            })
            .collect();

        Ok(Self {
            og_title: select_first_attr(document, r#"meta[property="og:title"]"#, "content")?,
            title_text: select_first_text(document, "title")?,
            og_url: select_first_attr(document, r#"meta[property="og:url"]"#, "content")?,
            player_href: select_first_attr(document, "a.rsbtn_play", "href")?,
            stylesheet_hrefs: select_all_attrs(document, r#"link[rel="stylesheet"]"#, "href")?,
            time_datetime: select_first_attr(document, "time[datetime]", "datetime")?,
            limiter_paragraph: select_first_text(document, "div.limiter > p")?,
            news_item_paragraph: select_first_text(document, "div.news-single-item > p")?,
            download_links,
        })
    }

    /// `og:title`, falling back to the document `<title>`.
    pub fn title(&self) -> Option<&str> {
        self.og_title.as_deref().or(self.title_text.as_deref())
    }

    pub fn description(&self) -> Option<&str> {
        self.limiter_paragraph
            .as_deref()
            .or(self.news_item_paragraph.as_deref())
    }

    pub fn last_stylesheet(&self) -> Option<&str> {
        self.stylesheet_hrefs.last().map(String::as_str)
    }
}

fn selector(css: &str) -> Result<Selector, NormalizeError> {
    Selector::parse(css).map_err(|e| NormalizeError::Selector(e.to_string()))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn text_or_none(value: String) -> Option<String> {
    let trimmed = value.trim().to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn select_first_text(document: &Html, css: &str) -> Result<Option<String>, NormalizeError> {
    let sel = selector(css)?;
    Ok(document
        .select(&sel)
        .next()
        .and_then(|n| text_or_none(n.text().collect::<String>())))
}

fn select_first_attr(document: &Html, css: &str, attr: &str) -> Result<Option<String>, NormalizeError> {
    let sel = selector(css)?;
    Ok(document
        .select(&sel)
        .filter_map(|n| n.value().attr(attr))
        .find_map(|s| text_or_none(s.to_string())))
}

fn select_all_attrs(document: &Html, css: &str, attr: &str) -> Result<Vec<String>, NormalizeError> {
    let sel = selector(css)?;
    Ok(document
        .select(&sel)
        .filter_map(|n| n.value().attr(attr))
        .filter_map(|s| text_or_none(s.to_string()))
        .collect())
}
