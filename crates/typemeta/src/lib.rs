// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type metadata registry
//!
//! Resolves and caches per-type metadata for serializers and parsers:
//! the category of a type, how to construct it, which transforms apply to
//! it, and its bean properties.
//!
//! # Features
//!
//! - **Classification**: Fixed precedence from scalar kinds to markers
//! - **Construction**: No-argument, from-text, from-number and from-surrogate recipes
//! - **Transforms**: Format-scored surrogate conversions, inherited by subtypes
//! - **Concurrency**: Each type is built once, even under contention
//! - **Cycles**: Self-referential and mutually recursive types resolve lazily
//!
//! # Quick Start
//!
//! ```
//! use typemeta::{Category, FactsTable, Marker, TypeFacts, TypeRegistry};
//!
//! let facts = FactsTable::with_core_types()
//!     .with(TypeFacts::new("List").marker(Marker::ElementContainer).interface());
//! let registry = TypeRegistry::new(facts);
//!
//! let list = registry.lookup("List<String>").unwrap();
//! assert_eq!(list.category(), Category::ElementContainer);
//! assert_eq!(list.element_type().unwrap().category(), Category::Text);
//! ```
//!
//! # Configuration File
//!
//! ```toml
//! root_type = "Object"
//! not_bean_types = ["Thread"]
//! bean_constructor_visibility = "public"
//! require_bean_properties = true
//! log_level = "info"
//!
//! [implementations]
//! List = "ArrayList"
//! ```

pub mod bean;
pub mod classify;
pub mod config;
pub mod construction;
pub mod descriptor;
pub mod error;
pub mod facts;
pub mod registry;
pub mod transform;
pub mod type_expr;
pub mod value;

pub use bean::{
    BeanContext, BeanIntrospector, BeanProperty, BeanShape, BeanVerdict, PropertyIntrospector,
};
pub use classify::{classify, Category};
pub use config::{ConfigError, RegistryConfig};
pub use construction::{ConstructionStrategies, StrategyKind};
pub use descriptor::{BuildState, MemberKind, MemberRef, TypeDescriptor, TypeRef};
pub use error::{Error, Result, TransformError};
pub use facts::{
    ConstructorFacts, FactsError, FactsTable, FieldFacts, Marker, MemberTag, MethodFacts,
    ParamShape, Scalar, TypeFacts, TypeFactsProvider, TypeName, TypeTag, Visibility,
};
pub use registry::{RegistryBuilder, RegistryStats, Specialization, TypeRegistry};
pub use transform::{
    AppliedTransform, MarshalContext, MediaTypeTransform, Transform, TransformBuilder,
    TransformRegistry,
};
pub use type_expr::{TypeExpr, TypeExprError};
pub use value::{Arg, DefaultValue, Instance, Invoker, Number, NumberKind};
