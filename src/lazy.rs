//! Deferred schemas for recursive definitions.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::checks::Check;
use crate::issue::RawIssue;
use crate::pipe::guard;
use crate::primitives::unknown;
use crate::schema::{Definition, Schema, SchemaType};

struct LazyCell {
    thunk: Arc<dyn Fn() -> Schema + Send + Sync>,
    resolved: OnceCell<Schema>,
}

/// A schema produced on first use and cached from then on.
///
/// Clones share the cache, so every copy of a node resolves at most once.
#[derive(Clone)]
pub struct LazySchema {
    inner: Arc<LazyCell>,
}

impl LazySchema {
    pub fn resolve(&self) -> &Schema {
        self.inner.resolved.get_or_init(|| {
            debug!("resolving lazy schema");
            guard("lazy", || (self.inner.thunk)()).unwrap_or_else(failing)
        })
    }

    pub fn is_resolved(&self) -> bool {
        self.inner.resolved.get().is_some()
    }
}

impl fmt::Debug for LazySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazySchema")
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// A schema on which every parse fails with a `custom` issue.
pub(crate) fn failing(message: String) -> Schema {
    unknown().check(Check::custom(move |_, ctx| {
        ctx.add_issue(RawIssue::custom(message.clone()))
    }))
}

/// Defer building a schema until it is first parsed.
///
/// ```
/// use shapeguard::prelude::*;
/// use serde_json::json;
///
/// fn node() -> Schema {
///     object()
///         .field("value", number())
///         .field("next", lazy(node).optional())
///         .into()
/// }
///
/// assert!(node().parse(json!({ "value": 1, "next": { "value": 2 } })).is_ok());
/// ```
pub fn lazy<F>(f: F) -> Schema
where
    F: Fn() -> Schema + Send + Sync + 'static,
{
    Schema::new(Definition::Lazy(LazySchema {
        inner: Arc::new(LazyCell {
            thunk: Arc::new(f),
            resolved: OnceCell::new(),
        }),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::IssueCode;
    use crate::object::object;
    use crate::primitives::number;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn resolves_once() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let s = lazy(|| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            number().into()
        });
        assert!(s.parse(1).is_ok());
        assert!(s.parse(2).is_ok());
        assert!(s.clone().parse("x").is_err());
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn recursive_paths() {
        fn list() -> Schema {
            object()
                .field("v", number())
                .field("next", lazy(list).optional())
                .into()
        }
        let err = list()
            .parse(json!({ "v": 1, "next": { "v": 2, "next": { "v": "x" } } }))
            .unwrap_err();
        assert_eq!(err.first().pointer(), "/next/next/v");
    }

    #[test]
    fn panicking_thunk_fails_every_parse() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let s = object().field(
            "child",
            lazy(|| -> Schema {
                CALLS.fetch_add(1, Ordering::SeqCst);
                panic!("thunk failed")
            }),
        );
        for _ in 0..2 {
            let err = s.parse(json!({ "child": 1 })).unwrap_err();
            assert_eq!(err.first().code(), IssueCode::Custom);
            assert_eq!(err.first().message, "thunk failed");
            assert_eq!(err.first().pointer(), "/child");
        }
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unresolved_until_parsed() {
        let s = lazy(|| number().into());
        let Definition::Lazy(cell) = s.definition() else {
            panic!("expected a lazy node");
        };
        assert!(!cell.is_resolved());
        s.parse(1).unwrap();
        assert!(cell.is_resolved());
    }
}
