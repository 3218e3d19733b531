use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub type ComponentId = u64;

static NEXT_COMPONENT_ID: AtomicU64 = AtomicU64::new(1);

fn next_component_id() -> ComponentId {
    NEXT_COMPONENT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Identity used to address component state across layout passes.
///
/// Unlike [`ComponentId`], a key survives shallow copies with a new id, so
/// state queued against a root keeps applying after the root is re-issued.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ComponentKey(Arc<str>);

impl ComponentKey {
    pub fn new(key: impl Into<Arc<str>>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentKey({:?})", &*self.0)
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Immutable description of a piece of UI.
///
/// Cloning a component is a shallow copy: the props are shared and the id is
/// kept, which is what layout threads need to snapshot the root while the
/// tree keeps mutating.
#[derive(Clone)]
pub struct Component {
    id: ComponentId,
    key: ComponentKey,
    name: Arc<str>,
    props: Arc<dyn Any + Send + Sync>,
}

impl Component {
    pub fn new<P>(name: &str, props: P) -> Self
    where
        P: Any + Send + Sync,
    {
        Self {
            id: next_component_id(),
            key: ComponentKey::new(name),
            name: Arc::from(name),
            props: Arc::new(props),
        }
    }

    /// Replaces the key used to address this component's state.
    pub fn with_key(mut self, key: impl Into<ComponentKey>) -> Self {
        self.key = key.into();
        self
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn key(&self) -> &ComponentKey {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn props<P: Any>(&self) -> Option<&P> {
        self.props.downcast_ref::<P>()
    }

    pub fn make_shallow_copy(&self) -> Component {
        self.clone()
    }

    /// Shallow copy that no longer matches layouts computed for `self`.
    pub fn make_shallow_copy_with_new_id(&self) -> Component {
        Component {
            id: next_component_id(),
            ..self.clone()
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("name", &self.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shallow_copy_keeps_id_and_props() {
        let component = Component::new("Text", String::from("hello"));
        let copy = component.make_shallow_copy();

        assert_eq!(copy.id(), component.id());
        assert_eq!(copy.props::<String>().map(String::as_str), Some("hello"));
    }

    #[test]
    fn shallow_copy_with_new_id_keeps_key() {
        let component = Component::new("Counter", 0u32).with_key("counter");
        let copy = component.make_shallow_copy_with_new_id();

        assert_ne!(copy.id(), component.id());
        assert_eq!(copy.key(), component.key());
        assert_eq!(copy.key().as_str(), "counter");
    }

    #[test]
    fn props_downcast_rejects_wrong_type() {
        let component = Component::new("Spacer", 8i32);

        assert!(component.props::<u8>().is_none());
        assert_eq!(component.props::<i32>(), Some(&8));
    }
}
