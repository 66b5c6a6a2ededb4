//! URI collaborators used by `xml:base` resolution

use url::Url;

/// Absoluteness test and reference resolution
pub trait UriResolver {
    /// Whether `uri` carries a scheme
    fn is_absolute(&self, uri: &str) -> bool;

    /// Resolve `reference` against the absolute `base`. `None` when the
    /// base cannot be used.
    fn absolutize(&self, reference: &str, base: &str) -> Option<String>;
}

/// Default resolver backed by the `url` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlResolver;

impl UriResolver for UrlResolver {
    fn is_absolute(&self, uri: &str) -> bool {
        scheme(uri).is_some()
    }

    fn absolutize(&self, reference: &str, base: &str) -> Option<String> {
        match Url::parse(base).and_then(|base| base.join(reference)) {
            Ok(resolved) => Some(resolved.into()),
            Err(e) => {
                tracing::warn!("Cannot resolve '{}' against '{}': {}", reference, base, e);
                None
            }
        }
    }
}

/// RFC 3986 scheme: `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) ":"`
pub fn scheme(uri: &str) -> Option<&str> {
    let (candidate, _) = uri.split_once(':')?;
    let mut chars = candidate.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        Some(candidate)
    } else {
        None
    }
}
