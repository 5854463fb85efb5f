//! MQTT-style path pattern matching.
//!
//! Levels are separated by `/`. `+` matches exactly one level, `#` matches
//! the remaining levels (zero or more) and must be the last level.

/// Returns true when `path` matches `pattern`.
pub fn matches(pattern: &str, path: &str) -> bool {
    let mut pat = pattern.split('/');
    let mut topic = path.split('/');

    loop {
        match (pat.next(), topic.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => {}
            (Some(p), Some(t)) if p == t => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}

/// Returns true when `pattern` is well formed: no empty levels and `#`
/// only in last position.
pub fn is_valid(pattern: &str) -> bool {
    if pattern.is_empty() {
        return false;
    }
    let levels: Vec<&str> = pattern.split('/').collect();
    levels.iter().enumerate().all(|(i, level)| {
        !level.is_empty() && (*level != "#" || i == levels.len() - 1)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact() {
        assert!(matches("auth/state", "auth/state"));
        assert!(!matches("auth/state", "auth/terms"));
        assert!(!matches("auth/state", "auth"));
        assert!(!matches("auth", "auth/state"));
    }

    #[test]
    fn single_level() {
        assert!(matches("auth/+", "auth/state"));
        assert!(matches("+/state", "auth/state"));
        assert!(!matches("auth/+", "auth/a/b"));
        assert!(!matches("auth/+", "auth"));
    }

    #[test]
    fn multi_level() {
        assert!(matches("notify/#", "notify/list"));
        assert!(matches("notify/#", "notify/a/b/c"));
        assert!(matches("notify/#", "notify"));
        assert!(!matches("notify/#", "auth/state"));
        assert!(matches("#", "anything/at/all"));
    }

    #[test]
    fn similar_prefix_is_not_a_match() {
        assert!(!matches("auth/#", "authorization/state"));
    }

    #[test]
    fn validity() {
        assert!(is_valid("auth/state"));
        assert!(is_valid("auth/+"));
        assert!(is_valid("#"));
        assert!(!is_valid(""));
        assert!(!is_valid("auth//state"));
        assert!(!is_valid("#/state"));
    }
}
