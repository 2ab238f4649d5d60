//! Per-call context handle.
//!
//! A [`CallContext`] is handed to any handler that asks for one (by taking
//! it as the first parameter). It is cheap to clone and carries the
//! connection's cancellation token plus caller-supplied key/value data.
//!
//! # Example
//!
//! ```ignore
//! server.register("watch", |cx: CallContext, label: String| async move {
//!     cx.cancelled().await;
//!     format!("{label}: connection closed")
//! });
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// Context handle passed to handlers that declare it.
///
/// Cancellation fires when the caller cancels the serving context or when
/// a write on the connection fails. The core never kills an in-flight
/// handler; observing the token is cooperative.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancel: CancellationToken,
    values: Arc<HashMap<String, Value>>,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a caller-supplied value visible to every handler dispatched
    /// under this context.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut values = HashMap::clone(&self.values);
        values.insert(key.into(), value.into());
        self.values = Arc::new(values);
        self
    }

    /// Look up a caller-supplied value.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Whether this call's connection has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves when the connection is cancelled.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    /// Derive a child context: same values, a child cancellation token.
    /// Cancelling the child does not affect the parent.
    pub(crate) fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            values: self.values.clone(),
        }
    }

    /// Trip the cancellation token for this context and its children.
    ///
    /// Serving loops call this when a write fails; callers may call it to
    /// shut a connection's handlers down cooperatively.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_visible_through_clones() {
        let cx = CallContext::new().with_value("user", "alice");
        let clone = cx.clone();
        assert_eq!(clone.value("user"), Some(&Value::from("alice")));
        assert_eq!(clone.value("missing"), None);
    }

    #[tokio::test]
    async fn test_child_cancellation_does_not_reach_parent() {
        let parent = CallContext::new();
        let child = parent.child();

        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[tokio::test]
    async fn test_parent_cancellation_reaches_child() {
        let parent = CallContext::new();
        let child = parent.child();

        parent.cancel();
        child.cancelled().await;
        assert!(child.is_cancelled());
    }
}
