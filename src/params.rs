//! Load-time configuration of node fields.

use crate::{error::ParamError, KnowledgeSelector, KnowledgeSelectorAny, Symbol};
use std::{collections::HashMap, str::FromStr};

/// Where a node parameter takes its value from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Literal(String),
    /// Read from the knowledge store whenever the node needs the value.
    Path(Symbol),
}

impl ParamValue {
    pub fn path(path: impl Into<Symbol>) -> Self {
        Self::Path(path.into())
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::Literal(s.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        Self::Literal(s)
    }
}

/// Named parameters a node is constructed from. Missing names fall back to
/// the node's defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeParams(HashMap<Symbol, ParamValue>);

impl NodeParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<Symbol>, value: impl Into<ParamValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(&Symbol::from(key))
    }

    pub fn keys(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.0.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses a literal parameter. Knowledge paths are rejected, since the
    /// value is needed at construction time.
    pub fn literal<T: FromStr>(&self, key: &str) -> Result<Option<T>, ParamError> {
        match self.get(key) {
            None => Ok(None),
            Some(ParamValue::Literal(value)) => parse(key, value).map(Some),
            Some(ParamValue::Path(_)) => Err(ParamError::ExpectedLiteral {
                key: key.to_owned(),
            }),
        }
    }

    pub fn literal_or<T: FromStr>(&self, key: &str, default: T) -> Result<T, ParamError> {
        Ok(self.literal(key)?.unwrap_or(default))
    }

    pub fn selector<T: FromStr>(
        &self,
        key: &str,
        default: T,
    ) -> Result<KnowledgeSelector<T>, ParamError> {
        Ok(match self.get(key) {
            None => KnowledgeSelector::Literal(default),
            Some(ParamValue::Literal(value)) => KnowledgeSelector::Literal(parse(key, value)?),
            Some(ParamValue::Path(path)) => KnowledgeSelector::Path(*path),
        })
    }

    pub fn selector_any(&self, key: &str, default: &str) -> KnowledgeSelectorAny {
        match self.get(key) {
            None => KnowledgeSelectorAny::literal(default),
            Some(ParamValue::Literal(value)) => KnowledgeSelectorAny::Literal(value.clone()),
            Some(ParamValue::Path(path)) => KnowledgeSelectorAny::Path(*path),
        }
    }

    /// A literal interned as a symbol, e.g. a tag name.
    pub fn symbol(&self, key: &str) -> Result<Option<Symbol>, ParamError> {
        match self.get(key) {
            None => Ok(None),
            Some(ParamValue::Literal(value)) => Ok(Some(value.as_str().into())),
            Some(ParamValue::Path(_)) => Err(ParamError::ExpectedLiteral {
                key: key.to_owned(),
            }),
        }
    }
}

impl FromIterator<(Symbol, ParamValue)> for NodeParams {
    fn from_iter<I: IntoIterator<Item = (Symbol, ParamValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, ParamError> {
    value.trim().parse().map_err(|_| ParamError::Parse {
        key: key.to_owned(),
        value: value.to_owned(),
    })
}
