//! Rule-based intent detection.
//!
//! Rules come from a YAML file with two sections: `intent_priority`, an
//! ordered list of intent names, and `keyword_rules`, one keyword list per
//! intent. The detector walks the rules in priority order and returns the
//! first intent with a keyword contained in the lowercased question.
//! Priority lives in the file, not in the [`Intent`] enum; two rules that
//! could both match are resolved by file order, never by map iteration.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::Intent;
use crate::text::lowercase_turkish;
use crate::traits::IntentDetector;

/// Priority-ordered `(intent, keywords)` pairs loaded from the rules file.
#[derive(Debug, Clone)]
pub struct IntentRules {
    ordered: Vec<(Intent, Vec<String>)>,
}

#[derive(Debug, Deserialize)]
struct RawRules {
    #[serde(default)]
    intent_priority: Vec<String>,
    #[serde(default)]
    keyword_rules: serde_yaml::Mapping,
}

impl IntentRules {
    /// Load and order the rules file at `path`.
    ///
    /// Intents named in `intent_priority` come first, in that order; rule
    /// blocks not named there follow in file order. Unknown intent names
    /// fail the load.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read rules file {}: {e}", path.display()))
        })?;
        let raw: RawRules = serde_yaml::from_str(&content).map_err(|e| {
            Error::Config(format!("failed to parse rules file {}: {e}", path.display()))
        })?;

        // keyword_rules in file order
        let mut by_file_order: Vec<(Intent, Vec<String>)> = Vec::new();
        for (key, value) in raw.keyword_rules {
            let name = key.as_str().ok_or_else(|| {
                Error::Config(format!("non-string intent name in {}", path.display()))
            })?;
            let intent = Intent::parse_name(name)?;
            let keywords: Vec<String> = serde_yaml::from_value(value).map_err(|e| {
                Error::Config(format!("invalid keyword list for {name} in {}: {e}", path.display()))
            })?;
            by_file_order.push((intent, keywords));
        }

        let mut ordered: Vec<(Intent, Vec<String>)> = Vec::new();
        for name in &raw.intent_priority {
            let intent = Intent::parse_name(name)?;
            if let Some(pos) = by_file_order.iter().position(|(i, _)| *i == intent) {
                ordered.push(by_file_order.remove(pos));
            }
        }
        ordered.extend(by_file_order);

        Ok(Self { ordered })
    }

    pub fn from_pairs(ordered: Vec<(Intent, Vec<String>)>) -> Self {
        Self { ordered }
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Intent, Vec<String>)> {
        self.ordered.iter()
    }

    /// The same keyword lists keyed by intent, for use as query boosters.
    pub fn booster_map(&self) -> HashMap<Intent, Vec<String>> {
        self.ordered.iter().cloned().collect()
    }
}

/// Priority-ordered keyword matcher over the lowercased question.
pub struct RuleIntentDetector {
    rules: IntentRules,
}

impl RuleIntentDetector {
    pub fn new(rules: IntentRules) -> Self {
        Self { rules }
    }
}

impl IntentDetector for RuleIntentDetector {
    fn detect(&self, question: &str) -> Intent {
        if question.trim().is_empty() {
            return Intent::Unknown;
        }
        let lower = lowercase_turkish(question);
        for (intent, keywords) in self.rules.iter() {
            for keyword in keywords {
                if !keyword.is_empty() && lower.contains(&lowercase_turkish(keyword)) {
                    return *intent;
                }
            }
        }
        Intent::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn detector(pairs: Vec<(Intent, Vec<&str>)>) -> RuleIntentDetector {
        let ordered = pairs
            .into_iter()
            .map(|(i, kws)| (i, kws.into_iter().map(String::from).collect()))
            .collect();
        RuleIntentDetector::new(IntentRules::from_pairs(ordered))
    }

    #[test]
    fn test_first_matching_rule_wins() {
        // Both rules match; priority order decides.
        let det = detector(vec![
            (Intent::Registration, vec!["kayıt"]),
            (Intent::StaffLookup, vec!["danışman"]),
        ]);
        assert_eq!(det.detect("kayıt için danışman kim?"), Intent::Registration);

        let det = detector(vec![
            (Intent::StaffLookup, vec!["danışman"]),
            (Intent::Registration, vec!["kayıt"]),
        ]);
        assert_eq!(det.detect("kayıt için danışman kim?"), Intent::StaffLookup);
    }

    #[test]
    fn test_matching_is_case_insensitive_turkish() {
        let det = detector(vec![(Intent::Registration, vec!["kayıt"])]);
        // 'I' in "KAYIT" must lowercase to dotless 'ı'.
        assert_eq!(det.detect("KAYIT NASIL YAPILIR"), Intent::Registration);
    }

    #[test]
    fn test_blank_and_unmatched_questions_are_unknown() {
        let det = detector(vec![(Intent::Course, vec!["ders"])]);
        assert_eq!(det.detect(""), Intent::Unknown);
        assert_eq!(det.detect("   "), Intent::Unknown);
        assert_eq!(det.detect("yemekhane menüsü"), Intent::Unknown);
    }

    #[test]
    fn test_load_orders_by_priority_then_file_order() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("rules.yaml");
        fs::write(
            &path,
            r#"
intent_priority:
  - staff_lookup
  - registration
keyword_rules:
  registration:
    - "kayıt"
  course:
    - "ders"
  staff_lookup:
    - "danışman"
"#,
        )
        .unwrap();

        let rules = IntentRules::load(&path).unwrap();
        let order: Vec<Intent> = rules.iter().map(|(i, _)| *i).collect();
        assert_eq!(
            order,
            vec![Intent::StaffLookup, Intent::Registration, Intent::Course]
        );
    }

    #[test]
    fn test_load_rejects_unknown_intent_name() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("rules.yaml");
        fs::write(
            &path,
            "intent_priority:\n  - cafeteria\nkeyword_rules:\n  cafeteria:\n    - \"menü\"\n",
        )
        .unwrap();
        assert!(IntentRules::load(&path).is_err());
    }
}
