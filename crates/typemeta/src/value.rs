// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime values exchanged with collaborator-supplied constructors,
//! factories and transforms.
//!
//! The registry never knows the concrete Rust type behind a described type.
//! Values cross the boundary as `dyn Any`, and every invocation goes through
//! an [`Invoker`] registered alongside the facts that describe the member.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A constructed value of some described type.
pub type Instance = Box<dyn Any + Send>;

/// Numeric parameter kinds a from-number constructor may accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberKind {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    /// Arbitrary-precision integer.
    BigInteger,
    /// Arbitrary-precision decimal.
    BigDecimal,
    /// Abstract number; accepts any representation.
    Any,
}

impl NumberKind {
    #[must_use]
    pub fn is_floating(self) -> bool {
        matches!(self, Self::Float | Self::Double | Self::BigDecimal)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::BigInteger => "big_integer",
            Self::BigDecimal => "big_decimal",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for NumberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric argument handed to a from-number strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// Convert to the representation a parameter of `kind` expects.
    ///
    /// Floating values passed to integral parameters are truncated toward zero.
    #[must_use]
    pub fn coerce(self, kind: NumberKind) -> Self {
        match (self, kind) {
            (n, NumberKind::Any) => n,
            (Self::Int(v), k) if k.is_floating() => Self::Float(v as f64),
            (Self::Float(v), k) if !k.is_floating() => Self::Int(v as i64),
            (n, _) => n,
        }
    }
}

impl From<i64> for Number {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Number {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Number {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

/// Default value of a primitive scalar type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Bool(bool),
    Char(char),
    Int(i64),
    Float(f64),
}

/// One positional argument passed to an [`Invoker`].
#[derive(Clone, Copy)]
pub enum Arg<'a> {
    /// Enclosing instance of a nested non-static type.
    Enclosing(&'a dyn Any),
    /// Receiver of an instance method.
    Receiver(&'a dyn Any),
    Text(&'a str),
    Number(Number),
    /// Arbitrary value, e.g. a surrogate handed to a reverse recipe.
    Value(&'a dyn Any),
}

impl<'a> Arg<'a> {
    #[must_use]
    pub fn as_text(&self) -> Option<&'a str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Downcast an enclosing, receiver or value argument.
    #[must_use]
    pub fn downcast<T: Any>(&self) -> Option<&'a T> {
        match self {
            Self::Enclosing(v) | Self::Receiver(v) | Self::Value(v) => v.downcast_ref::<T>(),
            Self::Text(_) | Self::Number(_) => None,
        }
    }
}

impl fmt::Debug for Arg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enclosing(_) => f.write_str("Enclosing(..)"),
            Self::Receiver(_) => f.write_str("Receiver(..)"),
            Self::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Self::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Self::Value(_) => f.write_str("Value(..)"),
        }
    }
}

type InvokeFn = dyn Fn(&[Arg<'_>]) -> Result<Instance, String> + Send + Sync;

/// Callable bound to a constructor or method described by the facts.
#[derive(Clone)]
pub struct Invoker(Arc<InvokeFn>);

impl Invoker {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Arg<'_>]) -> Result<Instance, String> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn invoke(&self, args: &[Arg<'_>]) -> Result<Instance, String> {
        (self.0)(args)
    }
}

impl fmt::Debug for Invoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Invoker(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_coerce() {
        assert_eq!(Number::Int(3).coerce(NumberKind::Double), Number::Float(3.0));
        assert_eq!(Number::Float(2.9).coerce(NumberKind::Int), Number::Int(2));
        assert_eq!(Number::Float(2.5).coerce(NumberKind::Any), Number::Float(2.5));
        assert_eq!(Number::Int(7).coerce(NumberKind::Long), Number::Int(7));
    }

    #[test]
    fn test_arg_downcast() {
        let outer = 42u32;
        let arg = Arg::Enclosing(&outer);
        assert_eq!(arg.downcast::<u32>(), Some(&42));
        assert!(arg.downcast::<String>().is_none());
        assert!(Arg::Text("x").downcast::<u32>().is_none());
        assert_eq!(Arg::Text("x").as_text(), Some("x"));
    }

    #[test]
    fn test_invoker_roundtrip() {
        let inv = Invoker::new(|args| {
            let text = args
                .first()
                .and_then(Arg::as_text)
                .ok_or_else(|| "expected text".to_string())?;
            Ok(Box::new(text.len()) as Instance)
        });
        let out = inv.invoke(&[Arg::Text("abcd")]).expect("invoke");
        assert_eq!(out.downcast_ref::<usize>(), Some(&4));
        assert!(inv.invoke(&[]).is_err());
    }
}
