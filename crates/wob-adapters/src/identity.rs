use std::borrow::Cow;

use sha1::{Digest, Sha1};

/// SHA-1 hex digest of `namespace:identifier`, with short integer
/// identifiers zero-padded to three digits first.
pub fn hash_identifier(namespace: &str, identifier: &str) -> String {
    let identifier = pad_identifier(identifier);
    let mut hasher = Sha1::new();
    hasher.update(format!("{namespace}:{identifier}").as_bytes());
    hex::encode(hasher.finalize())
}

fn pad_identifier(identifier: &str) -> Cow<'_, str> {
    if identifier.chars().count() >= 3 {
        return Cow::Borrowed(identifier);
    }
    match identifier.parse::<i64>() {
        Ok(n) => Cow::Owned(format!("{n:03}")),
        Err(_) => Cow::Borrowed(identifier),
    }
}
