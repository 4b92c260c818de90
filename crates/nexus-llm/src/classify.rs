//! Heuristic classification of generation errors
//!
//! Best effort only: providers report blocking, quota and timeout problems
//! in free text, and the vocabulary changes between API versions.

/// Coarse error categories the pipeline reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Service unreachable, overloaded or rate limited
    Unavailable,
    /// The call did not complete in time
    Timeout,
    /// Blocked by a safety policy
    SafetyBlocked,
    /// Not recognised
    Unknown,
}

/// Substring (lowercase) to kind. First match wins, so safety
/// vocabulary is checked before transport vocabulary.
pub const CLASSIFICATION_TABLE: &[(&str, ErrorKind)] = &[
    ("blocked", ErrorKind::SafetyBlocked),
    ("safety", ErrorKind::SafetyBlocked),
    ("prohibited_content", ErrorKind::SafetyBlocked),
    ("blocklist", ErrorKind::SafetyBlocked),
    ("harm_category", ErrorKind::SafetyBlocked),
    ("timed out", ErrorKind::Timeout),
    ("timeout", ErrorKind::Timeout),
    ("deadline", ErrorKind::Timeout),
    ("unavailable", ErrorKind::Unavailable),
    ("connection refused", ErrorKind::Unavailable),
    ("connection reset", ErrorKind::Unavailable),
    ("dns error", ErrorKind::Unavailable),
    ("resource_exhausted", ErrorKind::Unavailable),
    ("resource exhausted", ErrorKind::Unavailable),
    ("rate limit", ErrorKind::Unavailable),
    ("quota", ErrorKind::Unavailable),
    ("overloaded", ErrorKind::Unavailable),
    ("http 429", ErrorKind::Unavailable),
    ("http 503", ErrorKind::Unavailable),
];

/// Classify an error message
pub fn classify(message: &str) -> ErrorKind {
    let lowered = message.to_lowercase();
    CLASSIFICATION_TABLE
        .iter()
        .find(|(needle, _)| lowered.contains(needle))
        .map(|(_, kind)| *kind)
        .unwrap_or(ErrorKind::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safety_vocabulary() {
        assert_eq!(classify("Prompt was BLOCKED"), ErrorKind::SafetyBlocked);
        assert_eq!(classify("finish reason: SAFETY"), ErrorKind::SafetyBlocked);
        assert_eq!(classify("PROHIBITED_CONTENT"), ErrorKind::SafetyBlocked);
    }

    #[test]
    fn test_transport_vocabulary() {
        assert_eq!(classify("operation timed out"), ErrorKind::Timeout);
        assert_eq!(classify("Deadline Exceeded"), ErrorKind::Timeout);
        assert_eq!(classify("HTTP 503: Service Unavailable"), ErrorKind::Unavailable);
        assert_eq!(classify("RESOURCE_EXHAUSTED: quota"), ErrorKind::Unavailable);
        assert_eq!(classify("tcp connect error: Connection refused"), ErrorKind::Unavailable);
    }

    #[test]
    fn test_safety_wins_over_transport() {
        assert_eq!(
            classify("HTTP 503 while request blocked by policy"),
            ErrorKind::SafetyBlocked
        );
    }

    #[test]
    fn test_unknown() {
        assert_eq!(classify("invalid argument"), ErrorKind::Unknown);
        assert_eq!(classify(""), ErrorKind::Unknown);
    }
}
