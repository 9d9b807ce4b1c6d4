//! URI helpers: scheme extraction and archive-entry splitting.
//!
//! Cache keys are the exact URI strings; nothing here normalizes them.

use crate::error::ConfigurationError;

/// Schemes that address an entry inside an archive.
pub const ARCHIVE_SCHEMES: &[&str] = &["archive", "jar"];

/// Separator between the archive URI and the entry path.
const ENTRY_SEPARATOR: char = '!';

/// Return the scheme of `uri` (the part before the first `:`), if it has one.
///
/// A scheme starts with an ASCII letter followed by letters, digits, `+`,
/// `-` or `.`, as in RFC 3986.
pub fn scheme_of(uri: &str) -> Option<&str> {
    let (scheme, _) = uri.split_once(':')?;
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        Some(scheme)
    } else {
        None
    }
}

/// An archive-entry URI split into its outer archive URI and entry path.
///
/// `archive:file:/archive.jar!/entry.xml` → base `file:/archive.jar`,
/// entry `entry.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveUri {
    pub scheme: String,
    pub base: String,
    pub entry: String,
}

impl ArchiveUri {
    pub fn parse(uri: &str) -> Result<Self, ConfigurationError> {
        let malformed = |reason: &str| ConfigurationError::MalformedUri {
            uri: uri.to_string(),
            reason: reason.to_string(),
        };

        let scheme = scheme_of(uri).ok_or_else(|| malformed("missing scheme"))?;
        if !ARCHIVE_SCHEMES.iter().any(|s| s.eq_ignore_ascii_case(scheme)) {
            return Err(ConfigurationError::UnsupportedScheme {
                uri: uri.to_string(),
                scheme: scheme.to_string(),
            });
        }

        let rest = &uri[scheme.len() + 1..];
        let split = rest
            .find(ENTRY_SEPARATOR)
            .ok_or_else(|| malformed("missing '!' entry separator"))?;

        let base = &rest[..split];
        if base.is_empty() {
            return Err(malformed("empty archive URI before '!'"));
        }

        // Entry path starts two characters after the separator ("!/").
        let after = &rest[split + ENTRY_SEPARATOR.len_utf8()..];
        let entry = after
            .strip_prefix('/')
            .ok_or_else(|| malformed("entry path must follow '!/'"))?;
        if entry.is_empty() {
            return Err(malformed("empty entry path"));
        }

        Ok(Self {
            scheme: scheme.to_string(),
            base: base.to_string(),
            entry: entry.to_string(),
        })
    }
}
