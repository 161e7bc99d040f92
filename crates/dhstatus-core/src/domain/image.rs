//! Container image reference splitting.

use serde::{Deserialize, Serialize};

use crate::domain::error::SourceError;

/// `host/repository:tag` split into its parts. Missing parts are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub host: String,
    pub repository: String,
    pub tag: String,
}

impl ImageRef {
    /// The last `:` separates the tag, the first `/` separates the host from
    /// the repository path. Without a `/` both host and repository stay empty.
    pub fn parse(image: &str) -> Self {
        let (rest, tag) = match image.rfind(':') {
            Some(idx) => (&image[..idx], &image[idx + 1..]),
            None => (image, ""),
        };
        let (host, repository) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx + 1..]),
            None => ("", ""),
        };
        Self {
            host: host.to_string(),
            repository: repository.to_string(),
            tag: tag.to_string(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.host.is_empty() && !self.repository.is_empty() && !self.tag.is_empty()
    }

    /// Fail with a descriptive error when any part is missing.
    pub fn require_complete(&self) -> Result<(), SourceError> {
        let missing: Vec<&str> = [
            ("host", &self.host),
            ("repository", &self.repository),
            ("tag", &self.tag),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(SourceError::InvalidInput(format!(
                "incomplete image reference (missing {})",
                missing.join(", ")
            )))
        }
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}:{}", self.host, self.repository, self.tag)
    }
}
