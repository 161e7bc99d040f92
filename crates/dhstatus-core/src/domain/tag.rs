//! Pull-request tag convention: `pr<digits>[-<edition>]`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static PR_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^pr(\d+)(?:-(.+))?$").expect("valid PR tag pattern"));

/// Edition assumed when the tag carries no suffix.
pub const DEFAULT_EDITION: &str = "FE";

/// PR number and build edition derived from an image tag.
///
/// `number == 0` is the "not a PR deployment" sentinel; no CI correlation is
/// attempted for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PullRequestTag {
    pub number: u64,
    pub edition: String,
}

impl PullRequestTag {
    /// `pr15160` → (15160, "FE"), `pr15160-ce` → (15160, "CE"), anything else → (0, "").
    pub fn parse(tag: &str) -> Self {
        let Some(caps) = PR_TAG.captures(tag) else {
            return Self::default();
        };
        let number = match caps[1].parse::<u64>() {
            Ok(n) if n > 0 => n,
            _ => return Self::default(),
        };
        let edition = caps
            .get(2)
            .map(|m| m.as_str().to_uppercase())
            .unwrap_or_else(|| DEFAULT_EDITION.to_string());
        Self { number, edition }
    }

    pub fn is_preview(&self) -> bool {
        self.number > 0
    }

    /// Name of the CI check-run that builds this edition, e.g. `Build FE`.
    pub fn check_name(&self) -> String {
        format!("Build {}", self.edition)
    }

    /// Render back into tag form (`pr<n>-<edition>` lowercased).
    pub fn to_tag(&self) -> Option<String> {
        self.is_preview()
            .then(|| format!("pr{}-{}", self.number, self.edition.to_lowercase()))
    }
}
