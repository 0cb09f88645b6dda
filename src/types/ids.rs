//! Strongly-typed identifiers and the request id counter.
//!
//! Request ids are decimal strings drawn from a per-connection atomic
//! counter, so every envelope written on a connection carries a distinct id.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Macro to define a strongly-typed string ID newtype wrapper.
///
/// Generates: struct, `from_string()`, `as_str()`, Display, Serialize, Deserialize.
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn from_string(s: String) -> Result<Self, &'static str> {
                if s.is_empty() {
                    return Err(concat!(stringify!($name), " cannot be empty"));
                }
                Ok(Self(s))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(RequestId);

impl RequestId {
    fn from_counter(value: u64) -> Self {
        Self(value.to_string())
    }
}

/// Monotonic source of [`RequestId`]s.
///
/// Clones share one counter. Owned by a [`Connection`](crate::dispatch::Connection)
/// rather than living in a static, so tests can build isolated instances.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    next: Arc<AtomicU64>,
}

impl IdGenerator {
    /// Generator whose first id is `1`.
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: Arc::new(AtomicU64::new(first)),
        }
    }

    /// Allocate the next id. Never returns the same value twice.
    pub fn next_id(&self) -> RequestId {
        RequestId::from_counter(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Value the next call to [`next_id`](Self::next_id) will render.
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_sequential_decimal_strings() {
        let ids = IdGenerator::new();
        assert_eq!(ids.next_id().as_str(), "1");
        assert_eq!(ids.next_id().as_str(), "2");
        assert_eq!(ids.peek(), 3);
    }

    #[test]
    fn test_clones_share_the_counter() {
        let a = IdGenerator::starting_at(10);
        let b = a.clone();
        assert_eq!(a.next_id().as_str(), "10");
        assert_eq!(b.next_id().as_str(), "11");
    }

    #[test]
    fn test_separate_generators_are_isolated() {
        let a = IdGenerator::new();
        let b = IdGenerator::new();
        assert_eq!(a.next_id(), b.next_id());
    }

    #[test]
    fn test_request_id_rejects_empty() {
        assert!(RequestId::from_string(String::new()).is_err());
        assert_eq!(
            RequestId::from_string("42".to_string()).unwrap().to_string(),
            "42"
        );
    }

    #[test]
    fn test_request_id_serializes_as_plain_string() {
        let id = IdGenerator::starting_at(7).next_id();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"7\"");
    }

    #[test]
    fn test_concurrent_generation_is_unique() {
        let ids = IdGenerator::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ids = ids.clone();
                std::thread::spawn(move || (0..1000).map(|_| ids.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate id generated");
            }
        }
        assert_eq!(seen.len(), 8000);
    }

    proptest! {
        #[test]
        fn prop_ids_strictly_increase(first in 0u64..1_000_000, n in 1usize..200) {
            let ids = IdGenerator::starting_at(first);
            let values: Vec<u64> = (0..n)
                .map(|_| ids.next_id().as_str().parse().unwrap())
                .collect();
            prop_assert!(values.windows(2).all(|w| w[0] < w[1]));
            prop_assert_eq!(values[0], first);
        }
    }
}
