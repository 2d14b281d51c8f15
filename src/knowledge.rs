use crate::Symbol;
use std::{any::Any, collections::HashMap, str::FromStr};

/// Read/write contract of the key-value store ("blackboard") an instance
/// consults while ticking.
///
/// The store itself is owned by the instance; nodes only see it through
/// [`crate::UpdateContext`]. Typed access goes through the inherent methods on
/// `dyn KnowledgeStore`.
pub trait KnowledgeStore {
    fn get_any(&self, path: Symbol) -> Option<&dyn Any>;

    fn set_any(&mut self, path: Symbol, value: Box<dyn Any + Send + Sync>);

    /// Opaque identifier of the data layout this store provides. Sub-trees
    /// that declare a schema refuse to run against a store reporting a
    /// different one.
    fn schema(&self) -> Option<&str> {
        None
    }
}

impl<'s> dyn KnowledgeStore + 's {
    pub fn get<T: 'static>(&self, path: impl Into<Symbol>) -> Option<&T> {
        self.get_any(path.into())?.downcast_ref()
    }

    /// Get a value, or parse it if the stored value is a string.
    pub fn get_parse<T>(&self, path: impl Into<Symbol>) -> Option<T>
    where
        T: FromStr + Copy + 'static,
    {
        let value = self.get_any(path.into())?;
        if let Some(value) = value.downcast_ref::<T>() {
            return Some(*value);
        }
        value
            .downcast_ref::<String>()
            .and_then(|s| s.parse().ok())
            .or_else(|| value.downcast_ref::<&'static str>().and_then(|s| s.parse().ok()))
    }

    pub fn set<T: Send + Sync + 'static>(&mut self, path: impl Into<Symbol>, value: T) {
        self.set_any(path.into(), Box::new(value));
    }
}

/// The default in-memory knowledge store.
#[derive(Default)]
pub struct Knowledge {
    values: HashMap<Symbol, Box<dyn Any + Send + Sync>>,
    schema: Option<String>,
}

impl Knowledge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(schema: impl Into<String>) -> Self {
        Self {
            values: HashMap::new(),
            schema: Some(schema.into()),
        }
    }

    pub fn get<T: 'static>(&self, path: impl Into<Symbol>) -> Option<&T> {
        self.values.get(&path.into())?.downcast_ref()
    }

    pub fn set<T: Send + Sync + 'static>(&mut self, path: impl Into<Symbol>, value: T) {
        self.values.insert(path.into(), Box::new(value));
    }

    pub fn remove(&mut self, path: impl Into<Symbol>) -> bool {
        self.values.remove(&path.into()).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl std::fmt::Debug for Knowledge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Knowledge")
            .field("keys", &self.values.keys().collect::<Vec<_>>())
            .field("schema", &self.schema)
            .finish()
    }
}

impl KnowledgeStore for Knowledge {
    fn get_any(&self, path: Symbol) -> Option<&dyn Any> {
        self.values
            .get(&path)
            .map(|value| &**value as &dyn Any)
    }

    fn set_any(&mut self, path: Symbol, value: Box<dyn Any + Send + Sync>) {
        self.values.insert(path, value);
    }

    fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }
}

/// Reference to an actor living outside the behavior tree, as stored in
/// knowledge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActorId(pub u64);

impl FromStr for ActorId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Tag membership service consulted by the `HasTag` decorator.
pub trait TagLookup {
    fn has_tag(&self, actor: ActorId, tag: Symbol) -> bool;
}

impl TagLookup for HashMap<ActorId, Vec<Symbol>> {
    fn has_tag(&self, actor: ActorId, tag: Symbol) -> bool {
        self.get(&actor).map_or(false, |tags| tags.contains(&tag))
    }
}
