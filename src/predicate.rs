//! Deciding which definitions are tests.

/// Name-based test recognition, swappable without touching the scanner.
pub trait TestPredicate: Send + Sync {
    fn is_test(&self, name: &str) -> bool;
}

/// Names starting with a fixed prefix (`test_` by default).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixRule {
    prefix: String,
}

impl PrefixRule {
    pub const DEFAULT_PREFIX: &'static str = "test_";

    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Default for PrefixRule {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PREFIX)
    }
}

impl TestPredicate for PrefixRule {
    fn is_test(&self, name: &str) -> bool {
        name.starts_with(&self.prefix)
    }
}

impl<F> TestPredicate for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_test(&self, name: &str) -> bool {
        self(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_rule() {
        let rule = PrefixRule::default();
        assert!(rule.is_test("test_login"));
        assert!(!rule.is_test("helper"));
        assert!(!rule.is_test("test"));
        assert!(!rule.is_test("Test_upper"));
    }

    #[test]
    fn test_closure_predicate() {
        let rule = |name: &str| name.ends_with("_spec");
        assert!(rule.is_test("login_spec"));
        assert!(!rule.is_test("test_login"));
    }
}
