//! Comments attached to an issue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single comment. Comments are append-only; the store never rewrites or
/// removes one once added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Generated `c-XXXX` identifier, unique within the owning issue.
    pub id: String,
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Builds the `n`th comment id for an issue (1-indexed), in the `c-XXXX`
    /// form used throughout the store.
    pub fn format_id(n: u64) -> String {
        format!("c-{n:04}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_id_pads_to_four_digits() {
        assert_eq!(Comment::format_id(1), "c-0001");
        assert_eq!(Comment::format_id(42), "c-0042");
        assert_eq!(Comment::format_id(12345), "c-12345");
    }

    #[test]
    fn roundtrip() {
        let c = Comment {
            id: "c-0001".into(),
            author: "alice".into(),
            text: "looks good".into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&c).unwrap();
        let back: Comment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
