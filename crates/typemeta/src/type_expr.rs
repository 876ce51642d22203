// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Parameterized type expressions such as `Map<String,List<Node>>`.
//!
//! An expression without arguments names a cacheable identity. An expression
//! with arguments names a specialization that the registry builds on demand
//! and never caches.

use crate::facts::TypeName;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Nesting limit for parsed expressions.
const MAX_DEPTH: usize = 32;

/// Parse error with the byte offset where parsing stopped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {position} in '{input}'")]
pub struct TypeExprError {
    pub input: String,
    pub position: usize,
    pub message: &'static str,
}

/// A type name with optional ordered type arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeExpr {
    pub name: TypeName,
    pub args: Vec<TypeExpr>,
}

impl TypeExpr {
    #[must_use]
    pub fn named(name: impl Into<TypeName>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_args(name: impl Into<TypeName>, args: Vec<TypeExpr>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    #[must_use]
    pub fn is_parameterized(&self) -> bool {
        !self.args.is_empty()
    }

    /// Visit every name in the expression, outermost first.
    pub fn for_each_name<F: FnMut(&TypeName)>(&self, f: &mut F) {
        f(&self.name);
        for arg in &self.args {
            arg.for_each_name(f);
        }
    }
}

impl From<TypeName> for TypeExpr {
    fn from(name: TypeName) -> Self {
        Self::named(name)
    }
}

impl From<&str> for TypeExpr {
    /// Treats the whole string as a plain name. Use `parse()` for
    /// parameterized text.
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.as_str())?;
        if let Some((first, rest)) = self.args.split_first() {
            write!(f, "<{first}")?;
            for arg in rest {
                write!(f, ",{arg}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

impl FromStr for TypeExpr {
    type Err = TypeExprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser { input: s, pos: 0 };
        let expr = parser.expr(0)?;
        parser.skip_ws();
        if parser.pos != s.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(expr)
    }
}

impl TryFrom<String> for TypeExpr {
    type Error = TypeExprError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeExpr> for String {
    fn from(expr: TypeExpr) -> Self {
        expr.to_string()
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn error(&self, message: &'static str) -> TypeExprError {
        TypeExprError {
            input: self.input.to_string(),
            position: self.pos,
            message,
        }
    }

    fn ident(&mut self) -> Result<&'a str, TypeExprError> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, '<' | '>' | ',') || c.is_whitespace() {
                break;
            }
            self.bump();
        }
        if start == self.pos {
            return Err(self.error("expected type name"));
        }
        Ok(&self.input[start..self.pos])
    }

    fn expr(&mut self, depth: usize) -> Result<TypeExpr, TypeExprError> {
        if depth > MAX_DEPTH {
            return Err(self.error("type expression nested too deeply"));
        }
        let name = self.ident()?;
        self.skip_ws();

        let mut args = Vec::new();
        if self.peek() == Some('<') {
            self.bump();
            loop {
                args.push(self.expr(depth + 1)?);
                self.skip_ws();
                match self.peek() {
                    Some(',') => self.bump(),
                    Some('>') => {
                        self.bump();
                        break;
                    }
                    _ => return Err(self.error("expected ',' or '>'")),
                }
            }
        }

        Ok(TypeExpr::with_args(name, args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> TypeExpr {
        s.parse().expect("valid type expression")
    }

    #[test]
    fn test_plain_name() {
        let expr = parse("com.acme.Point");
        assert_eq!(expr.name.as_str(), "com.acme.Point");
        assert!(!expr.is_parameterized());
    }

    #[test]
    fn test_nested_arguments() {
        let expr = parse(" Map < String , List<Node> > ");
        assert_eq!(expr.name.as_str(), "Map");
        assert_eq!(expr.args.len(), 2);
        assert_eq!(expr.args[1].args[0].name.as_str(), "Node");
        assert_eq!(expr.to_string(), "Map<String,List<Node>>");
    }

    #[test]
    fn test_array_suffix_is_part_of_name() {
        let expr = parse("List<int[]>");
        assert_eq!(expr.args[0].name.as_str(), "int[]");
    }

    #[test]
    fn test_rejects_malformed_input() {
        assert!("".parse::<TypeExpr>().is_err());
        assert!("Map<String".parse::<TypeExpr>().is_err());
        assert!("Map<,Int>".parse::<TypeExpr>().is_err());
        assert!("List<Int> extra".parse::<TypeExpr>().is_err());

        let err = "Map<String;Int".parse::<TypeExpr>().unwrap_err();
        assert_eq!(err.position, 14);
    }

    #[test]
    fn test_depth_limit() {
        let deep = format!("{}X{}", "L<".repeat(MAX_DEPTH + 2), ">".repeat(MAX_DEPTH + 2));
        assert!(deep.parse::<TypeExpr>().is_err());
    }

    #[test]
    fn test_for_each_name_order() {
        let mut names = Vec::new();
        parse("Map<String,List<Node>>").for_each_name(&mut |n| names.push(n.to_string()));
        assert_eq!(names, ["Map", "String", "List", "Node"]);
    }
}
