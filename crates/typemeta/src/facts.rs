// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structural facts about types.
//!
//! The registry never inspects types itself. Everything it knows about a type
//! comes from a [`TypeFactsProvider`]: its constructors, methods, fields,
//! declarative tags, supertypes and resolved type arguments. [`FactsTable`]
//! is the in-memory provider, built programmatically or loaded from a JSON
//! or YAML document.

use crate::type_expr::TypeExpr;
use crate::value::{Arg, Instance, Invoker, NumberKind};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Name of the root "any" type in the core facts.
pub const ROOT_TYPE: &str = "Object";

/// Errors raised by facts providers.
#[derive(Debug, Error)]
pub enum FactsError {
    #[error("No facts available for type '{0}'")]
    NotFound(TypeName),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unsupported facts file format: {0}")]
    UnsupportedFormat(String),
}

/// Identity of a non-parameterized type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeName(Arc<str>);

impl TypeName {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last segment of a dotted or path-qualified name.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        let s = self.as_str();
        let tail = s.rsplit("::").next().unwrap_or(s);
        tail.rsplit('.').next().unwrap_or(tail)
    }
}

impl From<&str> for TypeName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TypeName {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl From<&TypeName> for TypeName {
    fn from(name: &TypeName) -> Self {
        name.clone()
    }
}

impl Borrow<str> for TypeName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TypeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Built-in scalar kinds, primitive or boxed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scalar {
    Bool,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Void,
}

impl Scalar {
    #[must_use]
    pub fn is_floating(self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }

    #[must_use]
    pub fn is_integral(self) -> bool {
        matches!(self, Self::Byte | Self::Short | Self::Int | Self::Long)
    }
}

/// Structural traits a type carries, usually derived from its ancestry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    /// The root "any" type.
    Root,
    Enum,
    /// A type whose values are type identities.
    TypeToken,
    /// A method or function handle.
    Callable,
    /// The exact text type.
    Text,
    /// Any character sequence.
    TextSequence,
    Number,
    FloatingPoint,
    ElementContainer,
    PairContainer,
    /// A pair container backed by a bean.
    BeanMapView,
    Temporal,
    Uri,
    CharInput,
    BinaryInput,
    BinaryOutput,
    /// A wrapper that forwards to another value.
    Delegate,
}

/// Member visibility, ordered from least to most visible.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Private,
    Package,
    Protected,
    #[default]
    Public,
}

/// Shape of one declared parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamShape {
    Text,
    Number(NumberKind),
    /// Marshalling session handle passed to swap/unswap methods.
    Session,
    Type(TypeExpr),
}

impl ParamShape {
    #[must_use]
    pub fn type_name(&self) -> Option<&TypeName> {
        match self {
            Self::Type(expr) => Some(&expr.name),
            _ => None,
        }
    }
}

impl fmt::Display for ParamShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Number(kind) => write!(f, "number:{kind}"),
            Self::Session => f.write_str("session"),
            Self::Type(expr) => write!(f, "{expr}"),
        }
    }
}

/// Declarative tags on members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberTag {
    /// Setter receiving the key under which the value was found.
    NameProperty,
    /// Setter receiving the containing object.
    ParentProperty,
    /// Excluded from bean properties.
    Ignore,
    /// Exposed by a remoteable type declared with `annotated_only`.
    RemoteMethod,
}

/// Declarative tags on types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "snake_case")]
pub enum TypeTag {
    Bean {
        #[serde(default)]
        dictionary_name: Option<String>,
        #[serde(default)]
        type_property_name: Option<String>,
        #[serde(default)]
        dictionary: Vec<TypeName>,
    },
    /// Names a transform in the registry catalog.
    Transform { name: String },
    /// Exposes the type's public methods for remote invocation. Inherited by
    /// subtypes.
    Remoteable {
        /// Expose only methods tagged [`MemberTag::RemoteMethod`].
        #[serde(default)]
        annotated_only: bool,
        /// Key methods by name instead of by signature.
        #[serde(default)]
        key_by_name: bool,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConstructorFacts {
    #[serde(default)]
    pub params: Vec<ParamShape>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(skip)]
    pub invoker: Option<Invoker>,
}

impl ConstructorFacts {
    #[must_use]
    pub fn new(params: Vec<ParamShape>) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    #[must_use]
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    #[must_use]
    pub fn invoker(mut self, invoker: Invoker) -> Self {
        self.invoker = Some(invoker);
        self
    }

    /// Public and not deprecated.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.visibility == Visibility::Public && !self.deprecated
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodFacts {
    pub name: String,
    #[serde(default)]
    pub params: Vec<ParamShape>,
    #[serde(default)]
    pub returns: Option<TypeExpr>,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub tags: Vec<MemberTag>,
    #[serde(skip)]
    pub invoker: Option<Invoker>,
}

impl MethodFacts {
    #[must_use]
    pub fn new(name: impl Into<String>, params: Vec<ParamShape>) -> Self {
        Self {
            name: name.into(),
            params,
            returns: None,
            is_static: false,
            visibility: Visibility::Public,
            deprecated: false,
            tags: Vec::new(),
            invoker: None,
        }
    }

    #[must_use]
    pub fn returns(mut self, ty: impl Into<TypeExpr>) -> Self {
        self.returns = Some(ty.into());
        self
    }

    #[must_use]
    pub fn static_fn(mut self) -> Self {
        self.is_static = true;
        self
    }

    #[must_use]
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    #[must_use]
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    #[must_use]
    pub fn tag(mut self, tag: MemberTag) -> Self {
        self.tags.push(tag);
        self
    }

    #[must_use]
    pub fn invoker(mut self, invoker: Invoker) -> Self {
        self.invoker = Some(invoker);
        self
    }

    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.visibility == Visibility::Public && !self.deprecated
    }

    /// `name(param,...)`, the key used by the public-method map.
    #[must_use]
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.params.iter().map(ToString::to_string).collect();
        format!("{}({})", self.name, params.join(","))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldFacts {
    pub name: String,
    pub ty: TypeExpr,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub tags: Vec<MemberTag>,
    /// Assigns the field; receives the owner as `Arg::Receiver` and the value.
    #[serde(skip)]
    pub setter: Option<Invoker>,
}

impl FieldFacts {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: impl Into<TypeExpr>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            visibility: Visibility::Public,
            is_static: false,
            tags: Vec::new(),
            setter: None,
        }
    }

    #[must_use]
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    #[must_use]
    pub fn tag(mut self, tag: MemberTag) -> Self {
        self.tags.push(tag);
        self
    }

    #[must_use]
    pub fn setter(mut self, setter: Invoker) -> Self {
        self.setter = Some(setter);
        self
    }
}

/// Everything the registry needs to know about one type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeFacts {
    pub name: TypeName,
    #[serde(default)]
    pub scalar: Option<Scalar>,
    /// Primitive (unboxed) scalar.
    #[serde(default)]
    pub primitive: bool,
    #[serde(default)]
    pub markers: BTreeSet<Marker>,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_interface: bool,
    /// Nested non-static type whose constructors take an enclosing instance first.
    #[serde(default)]
    pub requires_enclosing: bool,
    /// Component type, for array types.
    #[serde(default)]
    pub array_of: Option<TypeExpr>,
    /// Direct supertypes in declaration order.
    #[serde(default)]
    pub supertypes: Vec<TypeName>,
    /// Resolved type arguments of the container ancestor, if any.
    #[serde(default)]
    pub type_args: Vec<TypeExpr>,
    #[serde(default)]
    pub constructors: Vec<ConstructorFacts>,
    #[serde(default)]
    pub methods: Vec<MethodFacts>,
    #[serde(default)]
    pub fields: Vec<FieldFacts>,
    #[serde(default)]
    pub tags: Vec<TypeTag>,
}

impl TypeFacts {
    #[must_use]
    pub fn new(name: impl Into<TypeName>) -> Self {
        Self {
            name: name.into(),
            scalar: None,
            primitive: false,
            markers: BTreeSet::new(),
            is_abstract: false,
            is_interface: false,
            requires_enclosing: false,
            array_of: None,
            supertypes: Vec::new(),
            type_args: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            tags: Vec::new(),
        }
    }

    #[must_use]
    pub fn scalar(mut self, scalar: Scalar) -> Self {
        self.scalar = Some(scalar);
        self
    }

    #[must_use]
    pub fn primitive(mut self) -> Self {
        self.primitive = true;
        self
    }

    #[must_use]
    pub fn marker(mut self, marker: Marker) -> Self {
        self.markers.insert(marker);
        self
    }

    #[must_use]
    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    #[must_use]
    pub fn interface(mut self) -> Self {
        self.is_interface = true;
        self.is_abstract = true;
        self
    }

    #[must_use]
    pub fn nested(mut self) -> Self {
        self.requires_enclosing = true;
        self
    }

    #[must_use]
    pub fn array_of(mut self, component: impl Into<TypeExpr>) -> Self {
        self.array_of = Some(component.into());
        self
    }

    #[must_use]
    pub fn supertype(mut self, name: impl Into<TypeName>) -> Self {
        self.supertypes.push(name.into());
        self
    }

    #[must_use]
    pub fn type_arg(mut self, arg: impl Into<TypeExpr>) -> Self {
        self.type_args.push(arg.into());
        self
    }

    #[must_use]
    pub fn constructor(mut self, ctor: ConstructorFacts) -> Self {
        self.constructors.push(ctor);
        self
    }

    #[must_use]
    pub fn method(mut self, method: MethodFacts) -> Self {
        self.methods.push(method);
        self
    }

    #[must_use]
    pub fn field(mut self, field: FieldFacts) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn tag(mut self, tag: TypeTag) -> Self {
        self.tags.push(tag);
        self
    }

    #[must_use]
    pub fn has(&self, marker: Marker) -> bool {
        self.markers.contains(&marker)
    }
}

/// Source of [`TypeFacts`].
pub trait TypeFactsProvider: Send + Sync {
    fn facts(&self, name: &TypeName) -> Result<Arc<TypeFacts>, FactsError>;
}

impl<P: TypeFactsProvider + ?Sized> TypeFactsProvider for Arc<P> {
    fn facts(&self, name: &TypeName) -> Result<Arc<TypeFacts>, FactsError> {
        (**self).facts(name)
    }
}

/// All ancestors of `facts`, nearest first, each listed once.
///
/// Supertypes the provider cannot describe are still listed but not expanded.
pub fn ancestors(provider: &dyn TypeFactsProvider, facts: &TypeFacts) -> Vec<TypeName> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    seen.insert(facts.name.clone());
    let mut queue: VecDeque<TypeName> = facts.supertypes.iter().cloned().collect();

    while let Some(name) = queue.pop_front() {
        if !seen.insert(name.clone()) {
            continue;
        }
        match provider.facts(&name) {
            Ok(parent) => queue.extend(parent.supertypes.iter().cloned()),
            Err(e) => log::debug!("[facts] ancestor '{}' not expanded: {}", name, e),
        }
        out.push(name);
    }
    out
}

/// True when `sub` is `sup` or one of its descendants.
pub fn is_subtype(provider: &dyn TypeFactsProvider, sub: &TypeName, sup: &TypeName) -> bool {
    if sub == sup {
        return true;
    }
    match provider.facts(sub) {
        Ok(facts) => ancestors(provider, &facts).contains(sup),
        Err(_) => false,
    }
}

#[derive(Debug, Deserialize)]
struct FactsDocument {
    #[serde(default)]
    types: Vec<TypeFacts>,
}

/// In-memory facts provider.
#[derive(Debug, Default, Clone)]
pub struct FactsTable {
    types: HashMap<TypeName, Arc<TypeFacts>>,
}

impl FactsTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A table preloaded with [`core_types`].
    #[must_use]
    pub fn with_core_types() -> Self {
        let mut table = Self::new();
        for facts in core_types() {
            table.insert(facts);
        }
        table
    }

    /// Insert or replace the facts for one type.
    pub fn insert(&mut self, facts: TypeFacts) -> Option<Arc<TypeFacts>> {
        self.types.insert(facts.name.clone(), Arc::new(facts))
    }

    #[must_use]
    pub fn with(mut self, facts: TypeFacts) -> Self {
        self.insert(facts);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<TypeName> {
        let mut names: Vec<TypeName> = self.types.keys().cloned().collect();
        names.sort();
        names
    }

    /// Merge a JSON document of the form `{ "types": [ ... ] }`.
    pub fn load_json_str(&mut self, content: &str) -> Result<usize, FactsError> {
        let doc: FactsDocument = serde_json::from_str(content)?;
        Ok(self.merge(doc))
    }

    /// Merge a YAML document with a top-level `types` list.
    pub fn load_yaml_str(&mut self, content: &str) -> Result<usize, FactsError> {
        let doc: FactsDocument = serde_yaml::from_str(content)?;
        Ok(self.merge(doc))
    }

    /// Merge a facts file, picking the format from its extension.
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize, FactsError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let content = std::fs::read_to_string(path)?;
        match ext.as_str() {
            "json" => self.load_json_str(&content),
            "yaml" | "yml" => self.load_yaml_str(&content),
            other => Err(FactsError::UnsupportedFormat(other.to_string())),
        }
    }

    fn merge(&mut self, doc: FactsDocument) -> usize {
        let count = doc.types.len();
        for facts in doc.types {
            if self.insert(facts).is_some() {
                log::debug!("[facts] replaced existing entry while loading");
            }
        }
        count
    }
}

impl TypeFactsProvider for FactsTable {
    fn facts(&self, name: &TypeName) -> Result<Arc<TypeFacts>, FactsError> {
        self.types
            .get(name)
            .cloned()
            .ok_or_else(|| FactsError::NotFound(name.clone()))
    }
}

fn text_factory<T, F>(parse: F) -> Invoker
where
    T: Send + 'static,
    F: Fn(&str) -> Result<T, String> + Send + Sync + 'static,
{
    Invoker::new(move |args| {
        let text = args
            .iter()
            .find_map(Arg::as_text)
            .ok_or_else(|| "expected a text argument".to_string())?;
        parse(text.trim()).map(|v| Box::new(v) as Instance)
    })
}

fn value_of(returns: &str, invoker: Invoker) -> MethodFacts {
    MethodFacts::new("valueOf", vec![ParamShape::Text])
        .returns(returns)
        .static_fn()
        .invoker(invoker)
}

fn numeric(name: &str, primitive: &str, scalar: Scalar, invoker: Invoker) -> [TypeFacts; 2] {
    let mut boxed = TypeFacts::new(name)
        .scalar(scalar)
        .marker(Marker::Number)
        .supertype("Number")
        .method(value_of(name, invoker));
    if scalar.is_floating() {
        boxed = boxed.marker(Marker::FloatingPoint);
    }
    [TypeFacts::new(primitive).scalar(scalar).primitive(), boxed]
}

/// Facts for the root object, text and scalar types.
///
/// Boxed scalars come with working `valueOf` factories producing the
/// matching Rust primitive (`i32` for `Integer`, `f64` for `Double`, ...).
#[must_use]
pub fn core_types() -> Vec<TypeFacts> {
    let mut out = vec![
        TypeFacts::new(ROOT_TYPE)
            .marker(Marker::Root)
            .constructor(ConstructorFacts::new(Vec::new())),
        TypeFacts::new("CharSequence")
            .marker(Marker::TextSequence)
            .interface(),
        TypeFacts::new("String")
            .marker(Marker::Text)
            .marker(Marker::TextSequence)
            .supertype("CharSequence")
            .constructor(ConstructorFacts::new(Vec::new()).invoker(Invoker::new(|_| {
                Ok(Box::new(String::new()) as Instance)
            })))
            .constructor(
                ConstructorFacts::new(vec![ParamShape::Text])
                    .invoker(text_factory(|s| Ok::<_, String>(s.to_string()))),
            ),
        TypeFacts::new("Number").marker(Marker::Number).abstract_type(),
        TypeFacts::new("boolean").scalar(Scalar::Bool).primitive(),
        TypeFacts::new("Boolean")
            .scalar(Scalar::Bool)
            .method(value_of(
                "Boolean",
                text_factory(|s| Ok::<_, String>(s.eq_ignore_ascii_case("true"))),
            )),
        TypeFacts::new("char").scalar(Scalar::Char).primitive(),
        TypeFacts::new("Character").scalar(Scalar::Char).method(
            MethodFacts::new("valueOf", vec![ParamShape::Text])
                .returns("Character")
                .static_fn()
                .invoker(text_factory(|s| {
                    let mut chars = s.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => Ok(c),
                        _ => Err(format!("'{s}' is not a single character")),
                    }
                })),
        ),
        TypeFacts::new("void").scalar(Scalar::Void).primitive(),
        TypeFacts::new("Void").scalar(Scalar::Void),
    ];

    out.extend(numeric(
        "Byte",
        "byte",
        Scalar::Byte,
        text_factory(|s| s.parse::<i8>().map_err(|e| e.to_string())),
    ));
    out.extend(numeric(
        "Short",
        "short",
        Scalar::Short,
        text_factory(|s| s.parse::<i16>().map_err(|e| e.to_string())),
    ));
    out.extend(numeric(
        "Integer",
        "int",
        Scalar::Int,
        text_factory(|s| s.parse::<i32>().map_err(|e| e.to_string())),
    ));
    out.extend(numeric(
        "Long",
        "long",
        Scalar::Long,
        text_factory(|s| s.parse::<i64>().map_err(|e| e.to_string())),
    ));
    out.extend(numeric(
        "Float",
        "float",
        Scalar::Float,
        text_factory(|s| s.parse::<f32>().map_err(|e| e.to_string())),
    ));
    out.extend(numeric(
        "Double",
        "double",
        Scalar::Double,
        text_factory(|s| s.parse::<f64>().map_err(|e| e.to_string())),
    ));
    out
}
