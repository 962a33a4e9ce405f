//! Two-segment wildcard event patterns.
//!
//! A pattern is `<ResourceType>.<Action>` where either segment may be `*`.
//! Each segment is compared exactly (case-sensitive) or skipped when it is
//! the wildcard. There is no substring, regex or multi-segment globbing.

use std::fmt;

/// The wildcard segment.
pub const WILDCARD: &str = "*";

/// A parsed subscription pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventPattern {
    resource: String,
    action: String,
}

impl EventPattern {
    /// Parse `Resource.action`. Returns `None` unless there are exactly two
    /// non-empty segments.
    pub fn parse(pattern: &str) -> Option<Self> {
        let (resource, action) = split_two(pattern)?;
        Some(Self {
            resource: resource.to_string(),
            action: action.to_string(),
        })
    }

    /// Whether this pattern matches a concrete event type.
    ///
    /// Event types that are not exactly two segments never match.
    pub fn matches(&self, event_type: &str) -> bool {
        match split_two(event_type) {
            Some((resource, action)) => {
                segment_matches(&self.resource, resource) && segment_matches(&self.action, action)
            }
            None => false,
        }
    }
}

impl fmt::Display for EventPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource, self.action)
    }
}

fn split_two(s: &str) -> Option<(&str, &str)> {
    let (first, second) = s.split_once('.')?;
    if first.is_empty() || second.is_empty() || second.contains('.') {
        return None;
    }
    Some((first, second))
}

fn segment_matches(pattern: &str, value: &str) -> bool {
    pattern == WILDCARD || pattern == value
}

/// Whether a single raw pattern string matches `event_type`.
///
/// Malformed patterns match nothing.
pub fn pattern_matches(pattern: &str, event_type: &str) -> bool {
    EventPattern::parse(pattern).is_some_and(|p| p.matches(event_type))
}

/// Whether any of an endpoint's patterns matches `event_type`.
pub fn any_matches<S: AsRef<str>>(patterns: &[S], event_type: &str) -> bool {
    patterns
        .iter()
        .any(|p| pattern_matches(p.as_ref(), event_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_pattern_matches_only_itself() {
        assert!(pattern_matches("Patient.create", "Patient.create"));
        assert!(!pattern_matches("Patient.create", "Patient.update"));
        assert!(!pattern_matches("Patient.create", "Encounter.create"));
    }

    #[test]
    fn wildcard_resource() {
        assert!(pattern_matches("*.delete", "Patient.delete"));
        assert!(pattern_matches("*.delete", "Encounter.delete"));
        assert!(!pattern_matches("*.delete", "Patient.create"));
    }

    #[test]
    fn wildcard_action() {
        assert!(pattern_matches("Patient.*", "Patient.create"));
        assert!(pattern_matches("Patient.*", "Patient.delete"));
        assert!(!pattern_matches("Patient.*", "Encounter.create"));
    }

    #[test]
    fn double_wildcard_matches_any_two_segment_type() {
        assert!(pattern_matches("*.*", "Task.update"));
        assert!(!pattern_matches("*.*", "nodot"));
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert!(!pattern_matches("patient.create", "Patient.create"));
        assert!(!pattern_matches("Patient.Create", "Patient.create"));
    }

    #[test]
    fn no_substring_matching() {
        assert!(!pattern_matches("Pat.create", "Patient.create"));
        assert!(!pattern_matches("Patient.cr", "Patient.create"));
        assert!(!pattern_matches("P*.create", "Patient.create"));
    }

    #[test]
    fn malformed_patterns_are_rejected() {
        assert!(EventPattern::parse("Patient").is_none());
        assert!(EventPattern::parse("Patient.").is_none());
        assert!(EventPattern::parse(".create").is_none());
        assert!(EventPattern::parse("a.b.c").is_none());
        assert!(EventPattern::parse("").is_none());
    }

    #[test]
    fn three_segment_event_type_never_matches() {
        assert!(!pattern_matches("*.*", "a.b.c"));
    }

    #[test]
    fn any_pattern_suffices() {
        let patterns = ["Patient.create", "*.delete"];
        assert!(any_matches(&patterns, "Encounter.delete"));
        assert!(any_matches(&patterns, "Patient.create"));
        assert!(!any_matches(&patterns, "Encounter.update"));
        assert!(!any_matches::<&str>(&[], "Patient.create"));
    }

    #[test]
    fn display_round_trips() {
        let p = EventPattern::parse("*.delete").unwrap();
        assert_eq!(p.to_string(), "*.delete");
    }
}
