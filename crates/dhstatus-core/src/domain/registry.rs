//! Registry probe outcome.

use crate::domain::error::SourceError;

/// What the registry says about the deployed tag.
///
/// When `tag_exists` is true and `error` is `None`, `digest` is always set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryVerdict {
    pub tag_exists: bool,
    pub digest: Option<String>,
    /// `digest` is byte-for-byte equal to the running digest.
    pub digest_match: bool,
    /// Image still resolvable by the running digest. Only meaningful when the tag is gone.
    pub image_exists: bool,
    pub error: Option<SourceError>,
}

impl RegistryVerdict {
    pub fn failed(error: SourceError) -> Self {
        Self {
            error: Some(error),
            ..Default::default()
        }
    }

    /// Tag resolved to `digest`; compare against what the pod runs.
    pub fn tag_found(digest: String, running_digest: Option<&str>) -> Self {
        let digest_match = running_digest == Some(digest.as_str());
        Self {
            tag_exists: true,
            digest: Some(digest),
            digest_match,
            ..Default::default()
        }
    }

    pub fn tag_removed(image_exists: bool) -> Self {
        Self {
            image_exists,
            ..Default::default()
        }
    }

    /// Registry data is conclusive: tag present with a known digest.
    pub fn known_digest(&self) -> Option<&str> {
        match (&self.digest, self.tag_exists, &self.error) {
            (Some(digest), true, None) if !digest.is_empty() => Some(digest),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_found_compares_bytewise() {
        let v = RegistryVerdict::tag_found("sha256:aa".to_string(), Some("sha256:aa"));
        assert!(v.digest_match);
        assert_eq!(v.known_digest(), Some("sha256:aa"));

        let v = RegistryVerdict::tag_found("sha256:aa".to_string(), Some("SHA256:AA"));
        assert!(!v.digest_match);

        let v = RegistryVerdict::tag_found("sha256:aa".to_string(), None);
        assert!(!v.digest_match);
    }

    #[test]
    fn test_empty_digest_is_not_conclusive() {
        let v = RegistryVerdict::tag_found(String::new(), Some(""));
        assert!(v.known_digest().is_none());
    }

    #[test]
    fn test_failed_verdict_has_no_tag() {
        let v = RegistryVerdict::failed(SourceError::Protocol("HTTP 500".to_string()));
        assert!(!v.tag_exists);
        assert!(v.known_digest().is_none());
    }
}
