use wob_core::{MediaUrl, PDF_CONTENT_TYPE};

use crate::page::AnchorRef;
use crate::urls::absolutize;

/// PDF attachments among the download anchors, in document order.
pub fn extract_media(links: &[AnchorRef]) -> Vec<MediaUrl> {
    links
        .iter()
        .filter_map(|link| {
            let url = absolutize(&link.href);
            is_pdf(&url).then(|| MediaUrl {
                url,
                content_type: PDF_CONTENT_TYPE.to_string(),
                label: link.text.clone(),
            })
        })
        .collect()
}

pub fn is_pdf(url: &str) -> bool {
    url.to_ascii_lowercase().ends_with(".pdf")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(href: &str, text: &str) -> AnchorRef {
        AnchorRef {
            href: href.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn keeps_pdfs_case_insensitively() {
        let media = extract_media(&[anchor("/doc.PDF", "Besluit"), anchor("/doc.docx", "Brief")]);
        assert_eq!(
            media,
            vec![MediaUrl {
                url: "https://www.utrecht.nl/doc.PDF".to_string(),
                content_type: "application/pdf".to_string(),
                label: "Besluit".to_string(),
            }]
        );
    }

    #[test]
    fn preserves_order_and_duplicates() {
        let media = extract_media(&[
            anchor("https://cdn.example.nl/b.pdf", "B"),
            anchor("/a.pdf", "A"),
            anchor("/a.pdf", "A"),
        ]);
        let labels: Vec<_> = media.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["B", "A", "A"]);
        assert_eq!(media[0].url, "https://cdn.example.nl/b.pdf");
    }

    #[test]
    fn empty_href_is_skipped() {
        assert!(extract_media(&[anchor("", "Leeg")]).is_empty());
    }
}
