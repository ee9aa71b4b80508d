// src/matching/prefix.rs - Manufacturer prefix deduplication heuristic
//
// Detects near-duplicate manufacturer names by shared leading substring and
// derives a raw-value -> canonical-key mapping from the matches. The whole
// module is pure batch transformation: no state, no I/O.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::models::matching::{CanonicalMapEntry, ManufacturerComparison};

/// Two values are considered spelling variants of the same manufacturer when
/// they are not identical and share more than this many leading characters.
/// Fixed policy, chosen over edit-distance or phonetic matching for
/// simplicity.
pub const MIN_COMMON_PREFIX_LEN: usize = 5;

/// Longest leading substring shared by `a` and `b`.
///
/// Equal inputs short-circuit and return `a` unchanged. Otherwise the scan
/// walks both strings char by char from the start and stops at the first
/// mismatch, so the returned slice always ends on a char boundary.
pub fn longest_common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    if a == b {
        return a;
    }
    let mut end = 0;
    for (ca, cb) in a.chars().zip(b.chars()) {
        if ca != cb {
            break;
        }
        end += ca.len_utf8();
    }
    &a[..end]
}

/// Compare two manufacturer strings, recording their common prefix, its
/// character length, and whether the pair is an exact duplicate.
pub fn compare_manufacturers(a: &str, b: &str) -> ManufacturerComparison {
    let prefix = longest_common_prefix(a, b);
    ManufacturerComparison {
        manufacturer_1: a.to_string(),
        manufacturer_2: b.to_string(),
        common_prefix: prefix.to_string(),
        common_prefix_len: prefix.chars().count(),
        is_identical: a == b,
    }
}

/// The fixed match policy: not identical, and more than
/// [`MIN_COMMON_PREFIX_LEN`] leading characters in common.
pub fn is_match(record: &ManufacturerComparison) -> bool {
    !record.is_identical && record.common_prefix_len > MIN_COMMON_PREFIX_LEN
}

/// Compare every value against every other (self-pairs and both orderings
/// included) and keep the records that satisfy the match policy.
///
/// Inputs are expected to be distinct already; duplicates are removed
/// upstream when the registry is loaded. O(n²) comparisons, acceptable
/// because the distinct manufacturer vocabulary is small.
pub fn find_matches(values: &[String]) -> Vec<ManufacturerComparison> {
    let mut matches = Vec::new();
    for a in values {
        for b in values {
            let record = compare_manufacturers(a, b);
            if is_match(&record) {
                matches.push(record);
            }
        }
    }
    matches
}

/// Group match records by their shared prefix. The prefix of each group acts
/// as the candidate canonical key.
pub fn group_by_common_prefix(
    matches: &[ManufacturerComparison],
) -> HashMap<String, Vec<&ManufacturerComparison>> {
    let mut groups: HashMap<String, Vec<&ManufacturerComparison>> = HashMap::new();
    for record in matches {
        groups
            .entry(record.common_prefix.clone())
            .or_default()
            .push(record);
    }
    groups
}

/// Build the raw-value -> canonical-key mapping from a match sequence.
///
/// Both sides of every match are emitted against their group's prefix, the
/// two emissions are unioned, and exact-duplicate pairs collapse. The output
/// is sorted and deterministic. A raw value that matched under two different
/// prefixes keeps both entries; see [`resolve_preferred_mapping`].
pub fn build_canonical_mapping(matches: &[ManufacturerComparison]) -> Vec<CanonicalMapEntry> {
    let groups = group_by_common_prefix(matches);
    let mut entries: BTreeSet<(String, String)> = BTreeSet::new();
    for (key, records) in groups {
        for record in records {
            entries.insert((record.manufacturer_1.clone(), key.clone()));
            entries.insert((record.manufacturer_2.clone(), key.clone()));
        }
    }
    entries
        .into_iter()
        .map(|(raw_value, canonical_key)| CanonicalMapEntry {
            raw_value,
            canonical_key,
        })
        .collect()
}

/// Collapse the mapping to one canonical key per raw value.
///
/// When a raw value carries several keys the longest common prefix wins, as
/// the more specific match; equal lengths fall back to lexicographic order
/// so repeated runs agree.
pub fn resolve_preferred_mapping(entries: &[CanonicalMapEntry]) -> BTreeMap<String, String> {
    let mut resolved: BTreeMap<String, String> = BTreeMap::new();
    for entry in entries {
        match resolved.get(&entry.raw_value) {
            Some(current) => {
                let (candidate_len, current_len) = (
                    entry.canonical_key.chars().count(),
                    current.chars().count(),
                );
                if candidate_len > current_len
                    || (candidate_len == current_len && entry.canonical_key < *current)
                {
                    resolved.insert(entry.raw_value.clone(), entry.canonical_key.clone());
                }
            }
            None => {
                resolved.insert(entry.raw_value.clone(), entry.canonical_key.clone());
            }
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_longest_common_prefix_reflexive() {
        for s in ["", "A", "Boeing", "AIRBUS INDUSTRIE", "naïveté"] {
            assert_eq!(longest_common_prefix(s, s), s);
        }
    }

    #[test]
    fn test_longest_common_prefix_symmetric() {
        let pairs = [
            ("Boeing", "Boeing Co"),
            ("AIRBUS", "AIRBUS INDUSTRIE"),
            ("Cessna", "Piper"),
            ("", "Boeing"),
        ];
        for (a, b) in pairs {
            assert_eq!(longest_common_prefix(a, b), longest_common_prefix(b, a));
        }
    }

    #[test]
    fn test_longest_common_prefix_bounded_by_shorter_input() {
        let pairs = [("Boeing", "Boeing Co"), ("MCDONNELL", "MCDONNELL DOUGLAS")];
        for (a, b) in pairs {
            let prefix = longest_common_prefix(a, b);
            assert!(prefix.chars().count() <= a.chars().count().min(b.chars().count()));
        }
    }

    #[test]
    fn test_longest_common_prefix_is_maximal() {
        let pairs = [
            ("Boeing Co", "Boeing Company"),
            ("AIRBUS", "AIRBUS INDUSTRIE"),
            ("GULFSTREAM", "GRUMMAN"),
        ];
        for (a, b) in pairs {
            let prefix = longest_common_prefix(a, b);
            assert!(a.starts_with(prefix));
            assert!(b.starts_with(prefix));
            // One more character from either side must break the match.
            let next_a = a[prefix.len()..].chars().next();
            let next_b = b[prefix.len()..].chars().next();
            if let (Some(ca), Some(cb)) = (next_a, next_b) {
                assert_ne!(ca, cb);
            }
        }
    }

    #[test]
    fn test_longest_common_prefix_multibyte_boundary() {
        // Must not slice inside the two-byte 'ï'.
        assert_eq!(longest_common_prefix("naïve", "naïveté"), "naïve");
        assert_eq!(longest_common_prefix("naïve", "natural"), "na");
    }

    #[test]
    fn test_compare_counts_characters_not_bytes() {
        let record = compare_manufacturers("naïveté", "naïvety");
        assert_eq!(record.common_prefix, "naïvet");
        assert_eq!(record.common_prefix_len, 6);
        assert!(!record.is_identical);
    }

    #[test]
    fn test_find_matches_filters_equal_and_short_prefixes() {
        let input = values(&["Boeing", "Boeing Co", "Airbus", "AIRBUS", "Cessna"]);
        let matches = find_matches(&input);
        assert!(!matches.is_empty());
        for record in &matches {
            assert!(!record.is_identical);
            assert!(record.common_prefix_len > MIN_COMMON_PREFIX_LEN);
        }
    }

    #[test]
    fn test_scenario_boeing_pair_matches() {
        let input = values(&["Boeing", "Boeing Co", "Airbus"]);
        let matches = find_matches(&input);
        assert!(matches.iter().any(|r| {
            r.manufacturer_1 == "Boeing"
                && r.manufacturer_2 == "Boeing Co"
                && r.common_prefix == "Boeing"
                && r.common_prefix_len == 6
        }));
        assert!(matches
            .iter()
            .all(|r| r.manufacturer_1 != "Airbus" && r.manufacturer_2 != "Airbus"));
    }

    #[test]
    fn test_scenario_airbus_maps_to_shared_prefix() {
        let input = values(&["AIRBUS INDUSTRIE", "AIRBUS"]);
        let matches = find_matches(&input);
        assert!(matches.iter().all(|r| r.common_prefix == "AIRBUS"));

        let mapping = build_canonical_mapping(&matches);
        let raws: Vec<&str> = mapping.iter().map(|e| e.raw_value.as_str()).collect();
        assert!(raws.contains(&"AIRBUS"));
        assert!(raws.contains(&"AIRBUS INDUSTRIE"));
        assert!(mapping.iter().all(|e| e.canonical_key == "AIRBUS"));
    }

    #[test]
    fn test_scenario_no_shared_prefix() {
        assert!(find_matches(&values(&["A", "B"])).is_empty());
    }

    #[test]
    fn test_scenario_empty_input() {
        let matches = find_matches(&[]);
        assert!(matches.is_empty());
        assert!(build_canonical_mapping(&matches).is_empty());
    }

    #[test]
    fn test_scenario_single_value_self_pair_filtered() {
        let matches = find_matches(&values(&["X"]));
        assert!(matches.is_empty());
        assert!(build_canonical_mapping(&matches).is_empty());
    }

    #[test]
    fn test_build_canonical_mapping_deduplicates() {
        // Both orderings of the same pair collapse to the same entries.
        let matches = find_matches(&values(&["Boeing", "Boeing Co"]));
        assert_eq!(matches.len(), 2);
        let mapping = build_canonical_mapping(&matches);
        assert_eq!(mapping.len(), 2);
    }

    #[test]
    fn test_build_canonical_mapping_idempotent() {
        let matches = find_matches(&values(&[
            "Boeing",
            "Boeing Co",
            "AIRBUS",
            "AIRBUS INDUSTRIE",
            "Cessna",
        ]));
        let first = build_canonical_mapping(&matches);
        let second = build_canonical_mapping(&matches);
        assert_eq!(first, second);
    }

    #[test]
    fn test_ambiguous_value_keeps_both_entries() {
        // "AIRBUS INDUSTRIES" matches "AIRBUS" under prefix "AIRBUS" and
        // "AIRBUS INDUSTRIE" under the longer "AIRBUS INDUSTRIE".
        let input = values(&["AIRBUS", "AIRBUS INDUSTRIE", "AIRBUS INDUSTRIES"]);
        let mapping = build_canonical_mapping(&find_matches(&input));
        let keys: Vec<&str> = mapping
            .iter()
            .filter(|e| e.raw_value == "AIRBUS INDUSTRIES")
            .map(|e| e.canonical_key.as_str())
            .collect();
        assert_eq!(keys, vec!["AIRBUS", "AIRBUS INDUSTRIE"]);
    }

    #[test]
    fn test_resolve_prefers_longest_prefix() {
        let input = values(&["AIRBUS", "AIRBUS INDUSTRIE", "AIRBUS INDUSTRIES"]);
        let mapping = build_canonical_mapping(&find_matches(&input));
        let resolved = resolve_preferred_mapping(&mapping);
        assert_eq!(
            resolved.get("AIRBUS INDUSTRIES").map(String::as_str),
            Some("AIRBUS INDUSTRIE")
        );
        // Unambiguous values pass through untouched.
        assert_eq!(resolved.get("AIRBUS").map(String::as_str), Some("AIRBUS"));
    }

    #[test]
    fn test_resolve_equal_length_tie_is_lexicographic() {
        let entries = vec![
            CanonicalMapEntry {
                raw_value: "GULFSTREAM AEROSPACE".to_string(),
                canonical_key: "GULFSB".to_string(),
            },
            CanonicalMapEntry {
                raw_value: "GULFSTREAM AEROSPACE".to_string(),
                canonical_key: "GULFSA".to_string(),
            },
        ];
        let resolved = resolve_preferred_mapping(&entries);
        assert_eq!(
            resolved.get("GULFSTREAM AEROSPACE").map(String::as_str),
            Some("GULFSA")
        );
    }
}
