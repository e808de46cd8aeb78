//! Splits free-text disclosure titles such as `"2015-0142 Wob-besluit Parkeren Lombok"`.

const DECISION_ALIASES: [&str; 3] = ["wob-besluit", "wob-besluiten", "wob"];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedTitle {
    pub identifier: String,
    pub status: String,
    pub title: Option<String>,
}

/// Parses `identifier status rest...`. Fewer than three tokens yields an
/// empty identifier and status and no title.
pub fn parse_title(raw: Option<&str>) -> ParsedTitle {
    let Some(raw) = raw else {
        return ParsedTitle::default();
    };
    let Some((identifier, rest)) = split_token(raw) else {
        return ParsedTitle::default();
    };
    let Some((status, rest)) = split_token(rest) else {
        return ParsedTitle::default();
    };
    let title = rest.trim();
    if title.is_empty() {
        return ParsedTitle::default();
    }
    ParsedTitle {
        identifier: identifier.to_string(),
        status: normalize_status(status),
        title: Some(title.to_string()),
    }
}

fn split_token(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    let end = input.find(char::is_whitespace)?;
    Some((&input[..end], input[end..].trim_start()))
}

pub fn normalize_status(status: &str) -> String {
    let lower = status.to_lowercase();
    if DECISION_ALIASES.contains(&lower.as_str()) {
        "Besluit".to_string()
    } else {
        status.to_string()
    }
}

/// True when the identifier starts with four ASCII digits.
pub fn has_numeric_prefix(identifier: &str) -> bool {
    let bytes = identifier.as_bytes();
    bytes.len() >= 4 && bytes[..4].iter().all(u8::is_ascii_digit)
}
