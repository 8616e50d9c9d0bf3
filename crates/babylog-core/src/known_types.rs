// Known event types
//
// The set of event-type labels already in use. It is advisory context for the
// interpreter and the basis for the one deterministic merge step the pipeline
// performs itself: snapping a produced label onto an existing spelling when
// the two differ only by case or surrounding whitespace.

use crate::activity::ActivityRecord;
use serde::{Deserialize, Serialize};

/// De-duplicated list of event types, first spelling wins
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct KnownTypes(Vec<String>);

impl KnownTypes {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Collect the event types present in existing records
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a ActivityRecord>) -> Self {
        records
            .into_iter()
            .map(|r| r.event_type.as_str())
            .collect()
    }

    /// Add a label; blank labels and exact duplicates are ignored
    pub fn insert(&mut self, label: &str) -> bool {
        let label = label.trim();
        if label.is_empty() || self.0.iter().any(|known| known == label) {
            return false;
        }
        self.0.push(label.to_string());
        true
    }

    /// Known spelling of `label`
    ///
    /// An exact match wins; otherwise the first label equal ignoring ASCII
    /// case.
    pub fn canonical(&self, label: &str) -> Option<&str> {
        let label = label.trim();
        self.0
            .iter()
            .find(|known| known.as_str() == label)
            .or_else(|| self.0.iter().find(|known| known.eq_ignore_ascii_case(label)))
            .map(String::as_str)
    }

    /// Replace `label` with its known spelling if one exists, otherwise keep it
    pub fn reconcile(&self, label: &str) -> String {
        match self.canonical(label) {
            Some(known) => known.to_string(),
            None => label.trim().to_string(),
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.iter().any(|known| known == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Comma-separated rendering used in prompts
    pub fn joined(&self) -> String {
        self.0.join(", ")
    }
}

impl<S: AsRef<str>> FromIterator<S> for KnownTypes {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut known = KnownTypes::new();
        for label in iter {
            known.insert(label.as_ref());
        }
        known
    }
}

impl From<Vec<String>> for KnownTypes {
    fn from(labels: Vec<String>) -> Self {
        labels.into_iter().collect()
    }
}

impl From<KnownTypes> for Vec<String> {
    fn from(known: KnownTypes) -> Self {
        known.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn test_dedup_keeps_first_spelling() {
        let known: KnownTypes = ["feed_ml", "sleep", "feed_ml", " sleep ", ""]
            .into_iter()
            .collect();
        assert_eq!(known.iter().collect::<Vec<_>>(), vec!["feed_ml", "sleep"]);
    }

    #[test]
    fn test_case_variants_are_distinct_labels() {
        let known: KnownTypes = ["Poo", "poo"].into_iter().collect();
        assert_eq!(known.len(), 2);
        assert_eq!(known.canonical("POO"), Some("Poo"));
    }

    #[test]
    fn test_exact_match_beats_case_variant() {
        let known: KnownTypes = ["Poo", "poo"].into_iter().collect();
        assert_eq!(known.canonical("poo"), Some("poo"));
        assert_eq!(known.reconcile("poo"), "poo");
        assert_eq!(known.reconcile("Poo"), "Poo");
        assert_eq!(known.reconcile("pOO"), "Poo");
    }

    #[test]
    fn test_reconcile_snaps_to_known_spelling() {
        let known: KnownTypes = ["Feed (ml)", "sleep"].into_iter().collect();
        assert_eq!(known.reconcile("feed (ML)"), "Feed (ml)");
        assert_eq!(known.reconcile(" Sleep"), "sleep");
        assert_eq!(known.reconcile("Bath"), "Bath");
    }

    #[test]
    fn test_from_records() {
        let ts = DateTime::parse_from_rfc3339("2026-10-17T20:00:00+01:00").unwrap();
        let records = vec![
            ActivityRecord::new(ts, "feed_ml", "190"),
            ActivityRecord::new(ts, "sleep", ""),
            ActivityRecord::new(ts, "feed_ml", "120"),
        ];
        let known = KnownTypes::from_records(&records);
        assert_eq!(known.joined(), "feed_ml, sleep");
    }

    #[test]
    fn test_deserialize_from_list() {
        let known: KnownTypes = serde_json::from_str(r#"["poo","sleep","poo"]"#).unwrap();
        assert!(known.contains("poo"));
        assert_eq!(known.len(), 2);
        assert_eq!(serde_json::to_string(&known).unwrap(), r#"["poo","sleep"]"#);
    }
}
