use std::fmt;
use std::sync::Arc;

/// Platform context a tree and its host views are created against.
///
/// Contexts form a chain of wrappers around a single base context. Two
/// contexts are interchangeable for binding purposes when they unwrap to the
/// same base.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    name: String,
    wrapped: Option<Context>,
}

impl Context {
    /// Creates a new base context.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                name: name.into(),
                wrapped: None,
            }),
        }
    }

    /// Wraps `self` in a new context that shares its base.
    pub fn wrap(&self, name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                name: name.into(),
                wrapped: Some(self.clone()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn base_context(&self) -> &Context {
        let mut base = self;
        while let Some(wrapped) = base.inner.wrapped.as_ref() {
            base = wrapped;
        }
        base
    }

    pub fn has_same_base_context(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.base_context().inner, &other.base_context().inner)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("name", &self.inner.name)
            .field("base", &self.base_context().inner.name)
            .finish()
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrappers_share_their_base() {
        let activity = Context::new("activity");
        let themed = activity.wrap("themed").wrap("styled");

        assert!(themed.has_same_base_context(&activity));
        assert_eq!(themed.base_context().name(), "activity");
    }

    #[test]
    fn equal_names_are_not_the_same_context() {
        let first = Context::new("activity");
        let second = Context::new("activity");

        assert!(!first.has_same_base_context(&second));
    }
}
