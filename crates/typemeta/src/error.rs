// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types shared across the registry.
//!
//! Capability gaps (a type that is not a bean, a missing construction
//! strategy) are recorded on descriptors as data. Only the conditions
//! below surface as `Err`.

use crate::config::ConfigError;
use crate::facts::{FactsError, TypeName};
use crate::type_expr::TypeExprError;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Registry and descriptor errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Assembling a descriptor failed. The failure is sticky: the descriptor
    /// stays cached in the `Failed` state and is never rebuilt.
    #[error("Initialization of '{type_name}' failed: {reason}")]
    Initialization { type_name: TypeName, reason: String },

    /// A construction strategy is missing or its invocation failed.
    #[error("Cannot instantiate '{type_name}': {reason}")]
    Instantiation { type_name: TypeName, reason: String },

    /// A top-level lookup was issued from inside the build of the same type.
    #[error("Recursive lookup of '{0}' while it is being built on this thread")]
    ReentrantLookup(TypeName),

    /// A collaborator panicked while a descriptor was being assembled.
    #[error("Panicked during assembly: {0}")]
    AssemblyPanicked(String),

    /// Out-of-range access on an argument-list descriptor.
    #[error("Invalid argument index {index}: {len} argument(s) defined")]
    ArgumentIndex { index: usize, len: usize },

    /// A parameterization does not fit the raw type it is applied to.
    #[error("Invalid specialization '{expr}': {reason}")]
    Specialization { expr: String, reason: String },

    #[error("Type facts error: {0}")]
    Facts(#[from] FactsError),

    #[error("Type expression error: {0}")]
    TypeExpr(#[from] TypeExprError),

    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The registry that owned a lazy reference has been dropped.
    #[error("Type registry is no longer available")]
    RegistryDropped,
}

impl Error {
    pub(crate) fn instantiation(type_name: &TypeName, reason: impl Into<String>) -> Self {
        Self::Instantiation {
            type_name: type_name.clone(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while applying a transform.
#[derive(Debug, Clone, Error)]
pub enum TransformError {
    #[error("Forward transform of '{normal}' failed: {reason}")]
    Forward { normal: TypeName, reason: String },

    #[error("Reverse transform to '{normal}' failed: {reason}")]
    Reverse { normal: TypeName, reason: String },

    #[error("Transform for '{0}' has no reverse recipe")]
    NoReverse(TypeName),

    /// A value of an unexpected runtime type was handed to a transform.
    #[error("Transform for '{normal}' received a value that is not a '{expected}'")]
    TypeMismatch { normal: TypeName, expected: TypeName },

    /// A type declares a transform name that is not in the registry catalog.
    #[error("Unknown transform '{name}' declared on '{type_name}'")]
    Unknown { name: String, type_name: TypeName },
}
