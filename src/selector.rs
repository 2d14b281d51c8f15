//! Literal-or-lookup references into the knowledge store.
//!
//! Selectors are resolved every time they are read; nothing is cached, since
//! the store may change between ticks.

use crate::{ActorId, KnowledgeStore, Symbol};
use std::any::Any;

/// Values closer than this compare equal.
const EQUAL_TOLERANCE: f32 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub enum KnowledgeSelector<T> {
    Literal(T),
    Path(Symbol),
}

impl<T: Default> Default for KnowledgeSelector<T> {
    fn default() -> Self {
        Self::Literal(T::default())
    }
}

impl<T> From<T> for KnowledgeSelector<T> {
    fn from(value: T) -> Self {
        Self::Literal(value)
    }
}

impl<T> KnowledgeSelector<T> {
    pub fn path(path: impl Into<Symbol>) -> Self {
        Self::Path(path.into())
    }
}

impl<T: KnowledgeValue> KnowledgeSelector<T> {
    /// `None` if the path is missing or holds a value that does not convert to `T`.
    pub fn resolve(&self, knowledge: &dyn KnowledgeStore) -> Option<T> {
        match self {
            Self::Literal(value) => Some(value.clone()),
            Self::Path(path) => T::from_knowledge(knowledge.get_any(*path)?),
        }
    }
}

/// A type a [`KnowledgeSelector`] can read out of the store.
///
/// Numbers accept any stored numeric type, so a duration written as `f64` or
/// a count written as `f32` still resolves. Integers only accept values that
/// are whole and in range.
pub trait KnowledgeValue: Clone + 'static {
    fn from_knowledge(value: &dyn Any) -> Option<Self> {
        value.downcast_ref::<Self>().cloned()
    }
}

impl KnowledgeValue for f32 {
    fn from_knowledge(value: &dyn Any) -> Option<Self> {
        match value.downcast_ref::<f32>() {
            Some(v) => Some(*v),
            None => any_to_f64(value).map(|v| v as f32),
        }
    }
}

impl KnowledgeValue for f64 {
    fn from_knowledge(value: &dyn Any) -> Option<Self> {
        any_to_f64(value)
    }
}

macro_rules! integer_value {
    ($($ty:ty),*) => {
        $(
            impl KnowledgeValue for $ty {
                fn from_knowledge(value: &dyn Any) -> Option<Self> {
                    if let Some(v) = value.downcast_ref::<$ty>() {
                        return Some(*v);
                    }
                    let v = any_to_f64(value)?;
                    (v.fract() == 0. && v >= <$ty>::MIN as f64 && v <= <$ty>::MAX as f64)
                        .then(|| v as $ty)
                }
            }
        )*
    };
}

integer_value!(i32, i64, u32, u64, usize);

impl KnowledgeValue for bool {}
impl KnowledgeValue for String {}
impl KnowledgeValue for Symbol {}

impl KnowledgeValue for ActorId {
    fn from_knowledge(value: &dyn Any) -> Option<Self> {
        match value.downcast_ref::<ActorId>() {
            Some(id) => Some(*id),
            None => u64::from_knowledge(value).map(ActorId),
        }
    }
}

/// Type-erased selector used by the comparison decorators. Whatever it
/// resolves to is compared as a number.
#[derive(Debug, Clone, PartialEq)]
pub enum KnowledgeSelectorAny {
    Literal(String),
    Path(Symbol),
}

impl KnowledgeSelectorAny {
    pub fn literal(value: impl ToString) -> Self {
        Self::Literal(value.to_string())
    }

    pub fn path(path: impl Into<Symbol>) -> Self {
        Self::Path(path.into())
    }

    pub fn resolve(&self, knowledge: &dyn KnowledgeStore) -> Option<f32> {
        match self {
            Self::Literal(value) => parse_number(value).map(|v| v as f32),
            Self::Path(path) => any_to_f32(knowledge.get_any(*path)?),
        }
    }
}

fn parse_number(s: &str) -> Option<f64> {
    match s.trim() {
        "true" => Some(1.),
        "false" => Some(0.),
        s => s.parse().ok(),
    }
}

/// Numeric view of a type-erased knowledge value.
pub fn any_to_f32(value: &dyn Any) -> Option<f32> {
    any_to_f64(value).map(|v| v as f32)
}

fn any_to_f64(value: &dyn Any) -> Option<f64> {
    macro_rules! try_as {
        ($($ty:ty),*) => {
            $(
                if let Some(v) = value.downcast_ref::<$ty>() {
                    return Some(*v as f64);
                }
            )*
        };
    }
    try_as!(f32, f64, i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);
    if let Some(v) = value.downcast_ref::<bool>() {
        return Some(if *v { 1. } else { 0. });
    }
    if let Some(s) = value.downcast_ref::<String>() {
        return parse_number(s);
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueComparison {
    #[default]
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl ValueComparison {
    pub fn compare(self, a: f32, b: f32) -> bool {
        match self {
            Self::Equal => (a - b).abs() <= EQUAL_TOLERANCE,
            Self::NotEqual => (a - b).abs() > EQUAL_TOLERANCE,
            Self::Less => a < b,
            Self::LessEqual => a <= b,
            Self::Greater => a > b,
            Self::GreaterEqual => a >= b,
        }
    }
}

impl std::str::FromStr for ValueComparison {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Equal" | "==" => Self::Equal,
            "NotEqual" | "!=" => Self::NotEqual,
            "Less" | "<" => Self::Less,
            "LessEqual" | "<=" => Self::LessEqual,
            "Greater" | ">" => Self::Greater,
            "GreaterEqual" | ">=" => Self::GreaterEqual,
            _ => return Err(()),
        })
    }
}
