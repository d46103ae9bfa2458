//! ID format rules (§3.2): root vs. hierarchical IDs, depth computation, and
//! random root-ID generation.
//!
//! A root ID is `<prefix><4-8 hex chars>`. A hierarchical child ID appends
//! `.N` (N >= 1) to a parent ID; up to 3 dotted numeric suffixes are allowed.
//! An ID is hierarchical iff the component after its last `.` parses as a
//! non-negative integer.

use rand::Rng;

pub const DEFAULT_PREFIX: &str = "bd-";
pub const MAX_DEPTH: usize = 3;

/// Number of dotted numeric suffix components on `id` (0 for a root ID).
pub fn depth(id: &str) -> usize {
    let mut count = 0;
    let mut rest = id;
    while let Some((head, tail)) = rsplit_once_dot(rest) {
        if tail.parse::<u64>().is_ok() {
            count += 1;
            rest = head;
        } else {
            break;
        }
    }
    count
}

fn rsplit_once_dot(s: &str) -> Option<(&str, &str)> {
    s.rsplit_once('.')
}

/// `true` if `id`'s final dotted component is a non-negative integer, i.e.
/// `id` was produced by `GetNextChildID` rather than being a root ID.
pub fn is_hierarchical(id: &str) -> bool {
    rsplit_once_dot(id).is_some_and(|(_, tail)| tail.parse::<u64>().is_ok())
}

/// The immediate parent ID of a hierarchical ID, or `None` if `id` is a
/// root ID.
pub fn parent_of(id: &str) -> Option<&str> {
    if is_hierarchical(id) {
        rsplit_once_dot(id).map(|(head, _)| head)
    } else {
        None
    }
}

/// Builds the child ID for `parent` given the next counter value.
pub fn child_id(parent: &str, n: u64) -> String {
    format!("{parent}.{n}")
}

/// Generates a random root ID: `<prefix>` followed by `hex_len` lowercase hex
/// characters (16-bit default of 4 chars, per §4.1.6; callers needing more
/// entropy can widen `hex_len` up to 8).
pub fn random_root_id(prefix: &str, hex_len: usize) -> String {
    let mut rng = rand::rng();
    let mut s = String::with_capacity(prefix.len() + hex_len);
    s.push_str(prefix);
    const HEX: &[u8] = b"0123456789abcdef";
    for _ in 0..hex_len {
        let idx = rng.random_range(0..HEX.len());
        s.push(HEX[idx] as char);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_id_has_zero_depth() {
        assert_eq!(depth("bd-a1b2"), 0);
        assert!(!is_hierarchical("bd-a1b2"));
        assert_eq!(parent_of("bd-a1b2"), None);
    }

    #[test]
    fn hierarchical_depth_counts_dotted_suffixes() {
        assert_eq!(depth("bd-a1b2.1"), 1);
        assert_eq!(depth("bd-a1b2.1.2"), 2);
        assert_eq!(depth("bd-a1b2.1.2.3"), 3);
    }

    #[test]
    fn parent_of_strips_last_suffix() {
        assert_eq!(parent_of("bd-a1b2.1.2"), Some("bd-a1b2.1"));
        assert_eq!(parent_of("bd-a1b2.1"), Some("bd-a1b2"));
    }

    #[test]
    fn child_id_appends_suffix() {
        assert_eq!(child_id("bd-a1b2", 3), "bd-a1b2.3");
    }

    #[test]
    fn random_root_id_has_expected_shape() {
        let id = random_root_id("bd-", 4);
        assert!(id.starts_with("bd-"));
        assert_eq!(id.len(), "bd-".len() + 4);
        assert!(id["bd-".len()..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn non_numeric_suffix_is_not_hierarchical() {
        // A flat user-chosen ID that happens to contain a dot is not
        // hierarchical unless the final component is numeric.
        assert!(!is_hierarchical("bd-release.v2"));
        assert_eq!(depth("bd-release.v2"), 0);
    }
}
