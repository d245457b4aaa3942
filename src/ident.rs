//! Identifier generation for new markers.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

use crate::error::GenerateError;

/// Produces a fresh identifier on every call.
///
/// Shared across worker threads, so implementations must be callable
/// concurrently.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> Result<String, GenerateError>;
}

/// Random RFC 4122 version 4 identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> Result<String, GenerateError> {
        Ok(Uuid::new_v4().to_string())
    }
}

/// Deterministic identifiers `<prefix>0`, `<prefix>1`, ... for tests and
/// reproducible runs.
#[derive(Debug, Default)]
pub struct SequenceGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequenceGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(0),
        }
    }

    /// Number of identifiers handed out so far.
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl IdGenerator for SequenceGenerator {
    fn generate(&self) -> Result<String, GenerateError> {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        Ok(format!("{}{}", self.prefix, n))
    }
}

impl<F> IdGenerator for F
where
    F: Fn() -> Result<String, GenerateError> + Send + Sync,
{
    fn generate(&self) -> Result<String, GenerateError> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_uuid_generator_is_v4_and_distinct() {
        let generator = UuidGenerator;
        let ids: HashSet<String> = (0..256).map(|_| generator.generate().unwrap()).collect();
        assert_eq!(ids.len(), 256);
        for id in &ids {
            let parsed = Uuid::parse_str(id).unwrap();
            assert_eq!(parsed.get_version_num(), 4);
        }
    }

    #[test]
    fn test_sequence_generator() {
        let generator = SequenceGenerator::new("id-");
        assert_eq!(generator.generate().unwrap(), "id-0");
        assert_eq!(generator.generate().unwrap(), "id-1");
        assert_eq!(generator.issued(), 2);
    }

    #[test]
    fn test_closure_generator_error_propagates() {
        let failing = || -> Result<String, GenerateError> { Err(GenerateError::new("offline")) };
        assert_eq!(failing.generate().unwrap_err().message, "offline");
    }
}
