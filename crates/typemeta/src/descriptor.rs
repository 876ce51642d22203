// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptors.
//!
//! A [`TypeDescriptor`] is published into the registry before its fields are
//! assembled. Its body sits behind a single-assignment latch: accessors block
//! until the body is published, after which the descriptor never changes.
//! A failed build still publishes a body, carrying whatever was assembled
//! before the failure plus the failure reason.
//!
//! Element, key and value types are [`TypeRef`]s. A reference to a cached
//! identity holds only the name and a weak registry handle, so cyclic type
//! graphs never form reference-count cycles. Only references to uncached
//! specializations own their target.

mod latch;

use crate::bean::{BeanContext, BeanIntrospector, BeanShape, BeanVerdict, RefResolver};
use crate::classify::{classify, Category};
use crate::config::RegistryConfig;
use crate::construction::{ConstructionStrategies, DiscoveryContext, StrategyKind};
use crate::error::{Error, Result};
use crate::facts::{
    ancestors, Marker, MemberTag, MethodFacts, Scalar, TypeFacts, TypeFactsProvider, TypeName,
    TypeTag, Visibility,
};
use crate::registry::Shared;
use crate::transform::{
    AppliedTransform, BindingOrigin, MarshalContext, MethodTransform, Transform,
    TransformBinding, TransformRegistry, TransformSet,
};
use crate::type_expr::TypeExpr;
use crate::value::{Arg, DefaultValue, Instance, Invoker, Number};
use latch::BuildCell;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};
use std::thread::{self, ThreadId};

/// Name given to argument-list descriptors.
pub const ARGUMENT_LIST: &str = "(args)";

/// Build state of a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildState {
    InProgress,
    Ready,
    /// Assembly failed; the reason is kept for diagnostics.
    Failed(Arc<str>),
}

/// Lazily resolved reference to another descriptor.
#[derive(Clone)]
pub struct TypeRef {
    expr: TypeExpr,
    registry: Weak<Shared>,
    specialized: Arc<OnceLock<Arc<TypeDescriptor>>>,
}

impl TypeRef {
    pub(crate) fn new(expr: TypeExpr, registry: Weak<Shared>) -> Self {
        Self {
            expr,
            registry,
            specialized: Arc::new(OnceLock::new()),
        }
    }

    #[must_use]
    pub fn expr(&self) -> &TypeExpr {
        &self.expr
    }

    #[must_use]
    pub fn name(&self) -> &TypeName {
        &self.expr.name
    }

    /// Resolve through the registry. Cached identities are looked up on
    /// every call; specializations are built once and kept.
    pub fn try_resolve(&self) -> Result<Arc<TypeDescriptor>> {
        let shared = self.registry.upgrade().ok_or(Error::RegistryDropped)?;
        if !self.expr.is_parameterized() {
            return shared.nested(&self.expr.name);
        }
        if let Some(done) = self.specialized.get() {
            return Ok(Arc::clone(done));
        }
        let built = shared.resolve_expr(&self.expr)?;
        Ok(Arc::clone(self.specialized.get_or_init(|| built)))
    }

    /// Like [`try_resolve`](Self::try_resolve), logging and discarding errors.
    #[must_use]
    pub fn resolve(&self) -> Option<Arc<TypeDescriptor>> {
        match self.try_resolve() {
            Ok(desc) => Some(desc),
            Err(e) => {
                log::warn!("[registry] cannot resolve '{}': {}", self.expr, e);
                None
            }
        }
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.expr == other.expr
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({})", self.expr)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.expr, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Method,
}

/// Member tagged as the name or parent property setter.
#[derive(Debug, Clone)]
pub struct MemberRef {
    pub name: String,
    pub kind: MemberKind,
    setter: Option<Invoker>,
}

impl MemberRef {
    /// Assign `value` on `target` through the bound setter.
    pub fn set(&self, target: &dyn Any, value: &dyn Any) -> std::result::Result<(), String> {
        let setter = self
            .setter
            .as_ref()
            .ok_or_else(|| format!("no setter bound to '{}'", self.name))?;
        setter
            .invoke(&[Arg::Receiver(target), Arg::Value(value)])
            .map(|_| ())
    }
}

/// Parts shared unchanged between a cached descriptor and its specializations.
#[derive(Debug)]
pub(crate) struct SharedParts {
    category: Category,
    is_delegate: bool,
    is_abstract: bool,
    is_interface: bool,
    is_primitive: bool,
    requires_enclosing: bool,
    implementation: Option<TypeName>,
    ancestors: Vec<TypeName>,
    construction: ConstructionStrategies,
    transforms: TransformSet,
    bean: BeanVerdict,
    bean_dictionary: Vec<TypeName>,
    name_property: Option<MemberRef>,
    parent_property: Option<MemberRef>,
    public_methods: BTreeMap<String, MethodFacts>,
    remoteable_methods: Option<BTreeMap<String, MethodFacts>>,
    default_value: Option<DefaultValue>,
}

impl SharedParts {
    fn new(name: &TypeName) -> Self {
        Self {
            category: Category::Other,
            is_delegate: false,
            is_abstract: false,
            is_interface: false,
            is_primitive: false,
            requires_enclosing: false,
            implementation: None,
            ancestors: Vec::new(),
            construction: ConstructionStrategies::none(name.clone()),
            transforms: TransformSet::empty(),
            bean: BeanVerdict::NotABean("Type was not introspected".into()),
            bean_dictionary: Vec::new(),
            name_property: None,
            parent_property: None,
            public_methods: BTreeMap::new(),
            remoteable_methods: None,
            default_value: None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Body {
    parts: Arc<SharedParts>,
    element: Option<TypeRef>,
    key: Option<TypeRef>,
    value: Option<TypeRef>,
    args: Vec<TypeRef>,
    failure: Option<Arc<str>>,
}

impl Body {
    pub(crate) fn category(&self) -> Category {
        self.parts.category
    }

    /// Same shared parts with new element/key/value references.
    pub(crate) fn specialized(
        &self,
        element: Option<TypeRef>,
        key: Option<TypeRef>,
        value: Option<TypeRef>,
    ) -> Self {
        Self {
            parts: Arc::clone(&self.parts),
            element: element.or_else(|| self.element.clone()),
            key: key.or_else(|| self.key.clone()),
            value: value.or_else(|| self.value.clone()),
            args: Vec::new(),
            failure: self.failure.clone(),
        }
    }

    pub(crate) fn argument_list(args: Vec<TypeRef>) -> Self {
        let mut parts = SharedParts::new(&TypeName::from(ARGUMENT_LIST));
        parts.category = Category::ArgumentList;
        parts.bean = BeanVerdict::NotABean("Argument lists are not beans".into());
        Self {
            parts: Arc::new(parts),
            element: None,
            key: None,
            value: None,
            args,
            failure: None,
        }
    }
}

/// Immutable metadata for one type identity or specialization.
pub struct TypeDescriptor {
    expr: TypeExpr,
    builder: ThreadId,
    cell: BuildCell<Body>,
}

impl TypeDescriptor {
    pub(crate) fn placeholder(name: TypeName) -> Self {
        Self {
            expr: TypeExpr::named(name),
            builder: thread::current().id(),
            cell: BuildCell::new(),
        }
    }

    pub(crate) fn ready(expr: TypeExpr, body: Body) -> Self {
        Self {
            expr,
            builder: thread::current().id(),
            cell: BuildCell::ready(body),
        }
    }

    pub(crate) fn publish(&self, body: Body) {
        if !self.cell.publish(body) {
            log::warn!("[registry] '{}' was already published", self.expr);
        }
    }

    pub(crate) fn is_published(&self) -> bool {
        self.cell.get().is_some()
    }

    pub(crate) fn built_by_current_thread(&self) -> bool {
        self.builder == thread::current().id()
    }

    pub(crate) fn body(&self) -> &Body {
        self.cell.wait()
    }

    fn parts(&self) -> &SharedParts {
        &self.body().parts
    }

    #[must_use]
    pub fn name(&self) -> &TypeName {
        &self.expr.name
    }

    /// Full expression, including type arguments for specializations.
    #[must_use]
    pub fn expr(&self) -> &TypeExpr {
        &self.expr
    }

    #[must_use]
    pub fn state(&self) -> BuildState {
        match self.cell.get() {
            None => BuildState::InProgress,
            Some(body) => match &body.failure {
                None => BuildState::Ready,
                Some(reason) => BuildState::Failed(Arc::clone(reason)),
            },
        }
    }

    /// Failure recorded during assembly, if any.
    #[must_use]
    pub fn init_failure(&self) -> Option<&str> {
        self.body().failure.as_deref()
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.parts().category
    }

    #[must_use]
    pub fn is_delegate(&self) -> bool {
        self.parts().is_delegate
    }

    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.parts().is_abstract
    }

    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.parts().is_interface
    }

    #[must_use]
    pub fn is_primitive(&self) -> bool {
        self.parts().is_primitive
    }

    /// Nested non-static type; construction needs an enclosing instance.
    #[must_use]
    pub fn requires_enclosing(&self) -> bool {
        self.parts().requires_enclosing
    }

    #[must_use]
    pub fn is_map(&self) -> bool {
        self.category().is_pair_container()
    }

    #[must_use]
    pub fn is_collection(&self) -> bool {
        self.category() == Category::ElementContainer
    }

    #[must_use]
    pub fn is_array(&self) -> bool {
        self.category() == Category::Array
    }

    #[must_use]
    pub fn is_number(&self) -> bool {
        self.category().is_number()
    }

    #[must_use]
    pub fn is_enum(&self) -> bool {
        self.category() == Category::Enumerable
    }

    #[must_use]
    pub fn is_args(&self) -> bool {
        self.category() == Category::ArgumentList
    }

    /// Values of this type may be absent. Only primitives may not.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        !self.parts().is_primitive
    }

    /// Configured implementation type for an abstract or interface type.
    #[must_use]
    pub fn implementation(&self) -> Option<&TypeName> {
        self.parts().implementation.as_ref()
    }

    /// All ancestors, nearest first.
    #[must_use]
    pub fn ancestors(&self) -> &[TypeName] {
        &self.parts().ancestors
    }

    #[must_use]
    pub fn element_ref(&self) -> Option<&TypeRef> {
        self.body().element.as_ref()
    }

    #[must_use]
    pub fn key_ref(&self) -> Option<&TypeRef> {
        self.body().key.as_ref()
    }

    #[must_use]
    pub fn value_ref(&self) -> Option<&TypeRef> {
        self.body().value.as_ref()
    }

    /// Element type of an array or element container.
    #[must_use]
    pub fn element_type(&self) -> Option<Arc<TypeDescriptor>> {
        self.element_ref().and_then(TypeRef::resolve)
    }

    /// Key type of a pair container.
    #[must_use]
    pub fn key_type(&self) -> Option<Arc<TypeDescriptor>> {
        self.key_ref().and_then(TypeRef::resolve)
    }

    /// Value type of a pair container.
    #[must_use]
    pub fn value_type(&self) -> Option<Arc<TypeDescriptor>> {
        self.value_ref().and_then(TypeRef::resolve)
    }

    /// Argument references of an argument-list descriptor.
    #[must_use]
    pub fn args(&self) -> &[TypeRef] {
        &self.body().args
    }

    pub fn arg(&self, index: usize) -> Result<Arc<TypeDescriptor>> {
        let args = self.args();
        let arg = args.get(index).ok_or(Error::ArgumentIndex {
            index,
            len: args.len(),
        })?;
        arg.try_resolve()
    }

    #[must_use]
    pub fn construction(&self) -> &ConstructionStrategies {
        &self.parts().construction
    }

    /// Whether `kind` can be used without an enclosing instance.
    #[must_use]
    pub fn can_construct(&self, kind: StrategyKind) -> bool {
        self.construction().can_construct(kind)
    }

    pub fn new_instance(&self) -> Result<Instance> {
        self.construction().new_instance(None)
    }

    /// Construct a nested non-static type inside `outer`.
    pub fn new_instance_in(&self, outer: &dyn Any) -> Result<Instance> {
        self.construction().new_instance(Some(outer))
    }

    pub fn new_instance_from_text(&self, outer: Option<&dyn Any>, text: &str) -> Result<Instance> {
        self.construction().new_instance_from_text(outer, text)
    }

    pub fn new_instance_from_number(
        &self,
        outer: Option<&dyn Any>,
        number: Number,
    ) -> Result<Instance> {
        self.construction().new_instance_from_number(outer, number)
    }

    pub fn new_instance_from_surrogate(
        &self,
        surrogate: &TypeName,
        value: &dyn Any,
    ) -> Result<Instance> {
        self.construction()
            .new_instance_from_surrogate(surrogate, value)
    }

    /// Transform bindings in selection order.
    #[must_use]
    pub fn transforms(&self) -> &[TransformBinding] {
        self.parts().transforms.bindings()
    }

    /// Transforms registered on descendants of this type.
    #[must_use]
    pub fn child_transforms(&self) -> &[Arc<dyn Transform>] {
        self.parts().transforms.children()
    }

    /// Best transform for `ctx`, if any scores above zero.
    #[must_use]
    pub fn resolve_transform(&self, ctx: &MarshalContext) -> Option<AppliedTransform> {
        let parts = self.parts();
        parts
            .transforms
            .select(ctx)
            .map(|(binding, score)| {
                AppliedTransform::new(self.name(), binding, score, &parts.construction)
            })
    }

    /// Type actually marshalled under `ctx`: the selected surrogate, or this type.
    #[must_use]
    pub fn serialized_type(&self, ctx: &MarshalContext) -> TypeName {
        self.resolve_transform(ctx)
            .map_or_else(|| self.name().clone(), |t| t.surrogate_type().clone())
    }

    /// Child transform applying to `subtype`. Memoized per subtype.
    #[must_use]
    pub fn child_transform_for(&self, subtype: &TypeName) -> Option<Arc<dyn Transform>> {
        self.parts().transforms.child_for(subtype)
    }

    /// Child transform producing `surrogate`. Memoized per surrogate type.
    #[must_use]
    pub fn child_transform_for_surrogate(
        &self,
        surrogate: &TypeName,
    ) -> Option<Arc<dyn Transform>> {
        self.parts().transforms.child_for_surrogate(surrogate)
    }

    #[must_use]
    pub fn bean(&self) -> &BeanVerdict {
        &self.parts().bean
    }

    #[must_use]
    pub fn bean_shape(&self) -> Option<&BeanShape> {
        self.bean().shape()
    }

    #[must_use]
    pub fn not_a_bean_reason(&self) -> Option<&str> {
        self.bean().reason()
    }

    #[must_use]
    pub fn dictionary_name(&self) -> Option<&str> {
        self.bean_shape()?.dictionary_name.as_deref()
    }

    #[must_use]
    pub fn type_property_name(&self) -> Option<&str> {
        self.bean_shape()?.type_property_name.as_deref()
    }

    /// Types listed in the bean dictionary tag.
    #[must_use]
    pub fn bean_dictionary(&self) -> &[TypeName] {
        &self.parts().bean_dictionary
    }

    #[must_use]
    pub fn name_property(&self) -> Option<&MemberRef> {
        self.parts().name_property.as_ref()
    }

    #[must_use]
    pub fn parent_property(&self) -> Option<&MemberRef> {
        self.parts().parent_property.as_ref()
    }

    /// Public methods keyed by `name(param,...)`.
    #[must_use]
    pub fn public_methods(&self) -> &BTreeMap<String, MethodFacts> {
        &self.parts().public_methods
    }

    /// True when the type or an ancestor carries [`TypeTag::Remoteable`].
    #[must_use]
    pub fn is_remoteable(&self) -> bool {
        self.parts().remoteable_methods.is_some()
    }

    /// Methods exposed for remote invocation, keyed by signature or by name
    /// depending on the tag.
    #[must_use]
    pub fn remoteable_methods(&self) -> Option<&BTreeMap<String, MethodFacts>> {
        self.parts().remoteable_methods.as_ref()
    }

    /// Default value of a primitive type.
    #[must_use]
    pub fn default_value(&self) -> Option<DefaultValue> {
        self.parts().default_value
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.expr.name == other.expr.name
    }
}

impl Eq for TypeDescriptor {}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(body) = self.cell.get() else {
            return fmt::Display::fmt(&self.expr, f);
        };
        if body.parts.category != Category::ArgumentList {
            return fmt::Display::fmt(&self.expr, f);
        }
        f.write_str("(")?;
        for (i, arg) in body.args.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            fmt::Display::fmt(arg, f)?;
        }
        f.write_str(")")
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("TypeDescriptor");
        s.field("expr", &self.expr).field("state", &self.state());
        if let Some(body) = self.cell.get() {
            s.field("category", &body.parts.category);
        }
        s.finish_non_exhaustive()
    }
}

/// In-progress assembly of a cached descriptor.
pub(crate) struct Draft {
    parts: SharedParts,
    element: Option<TypeRef>,
    key: Option<TypeRef>,
    value: Option<TypeRef>,
}

impl Draft {
    pub(crate) fn new(name: &TypeName) -> Self {
        Self {
            parts: SharedParts::new(name),
            element: None,
            key: None,
            value: None,
        }
    }

    pub(crate) fn finish(self, failure: Option<Arc<str>>) -> Body {
        Body {
            parts: Arc::new(self.parts),
            element: self.element,
            key: self.key,
            value: self.value,
            args: Vec::new(),
            failure,
        }
    }
}

/// Everything a build needs from the registry.
pub(crate) struct Assembly<'a> {
    pub(crate) name: &'a TypeName,
    pub(crate) provider: &'a Arc<dyn TypeFactsProvider>,
    pub(crate) config: &'a RegistryConfig,
    pub(crate) transforms: &'a TransformRegistry,
    pub(crate) introspector: &'a dyn BeanIntrospector,
    pub(crate) resolver: &'a dyn RefResolver,
}

impl Assembly<'_> {
    /// Fill `draft` step by step. On error, the steps already done stay in
    /// the draft so the failed descriptor remains diagnosable.
    pub(crate) fn run(&self, draft: &mut Draft) -> Result<()> {
        let facts = self.provider.facts(self.name)?;
        let provider: &dyn TypeFactsProvider = self.provider.as_ref();
        let parts = &mut draft.parts;

        parts.category = classify(&facts);
        parts.is_delegate = facts.has(Marker::Delegate);
        parts.is_abstract = facts.is_abstract;
        parts.is_interface = facts.is_interface;
        parts.is_primitive = facts.primitive;
        parts.requires_enclosing = facts.requires_enclosing;
        parts.default_value = if facts.primitive {
            facts.scalar.and_then(default_value)
        } else {
            None
        };
        parts.ancestors = ancestors(provider, &facts);
        parts.public_methods = facts
            .methods
            .iter()
            .filter(|m| m.visibility == Visibility::Public)
            .map(|m| (m.signature(), m.clone()))
            .collect();
        parts.remoteable_methods = remoteable_methods(provider, &facts, &parts.ancestors);
        parts.name_property = member_ref(&facts, MemberTag::NameProperty);
        parts.parent_property = member_ref(&facts, MemberTag::ParentProperty);
        parts.bean_dictionary = facts
            .tags
            .iter()
            .flat_map(|t| match t {
                TypeTag::Bean { dictionary, .. } => dictionary.clone(),
                TypeTag::Transform { .. } | TypeTag::Remoteable { .. } => Vec::new(),
            })
            .collect();

        let mut bindings = Vec::new();
        if let Some(own) = MethodTransform::discover(&facts) {
            bindings.push(TransformBinding {
                transform: Arc::new(own),
                origin: BindingOrigin::SwapMethod,
            });
        }
        bindings.extend(self.transforms.bindings_for(&facts, &parts.ancestors)?);
        let children = self.transforms.children_of(self.name, provider);

        let implementation = match self.config.implementations.get(self.name) {
            Some(imp) => {
                parts.implementation = Some(imp.clone());
                Some(self.provider.facts(imp)?)
            }
            None => None,
        };
        let surrogates: Vec<TypeName> = bindings
            .iter()
            .map(|b| b.transform.surrogate_type().clone())
            .collect();
        parts.construction = ConstructionStrategies::discover(
            &facts,
            parts.category,
            &DiscoveryContext {
                implementation: implementation.as_deref(),
                root_type: &self.config.root_type,
                surrogates: &surrogates,
                provider: Some(provider),
            },
        );
        parts.transforms = TransformSet::new(bindings, children, Some(Arc::clone(self.provider)));

        match parts.category {
            Category::Array => {
                if let Some(component) = &facts.array_of {
                    draft.element = Some(self.resolver.type_ref(component)?);
                }
            }
            Category::ElementContainer => {
                draft.element = Some(self.type_arg(&facts, 0)?);
            }
            Category::PairContainer | Category::BeanMap => {
                draft.key = Some(self.type_arg(&facts, 0)?);
                draft.value = Some(self.type_arg(&facts, 1)?);
            }
            _ => {}
        }

        let parts = &mut draft.parts;
        parts.bean = if parts.category == Category::Other {
            let ctx = BeanContext::new(self.resolver, self.config, implementation.is_some());
            self.introspector.introspect(&facts, &ctx)?
        } else {
            BeanVerdict::NotABean(format!("Category '{}' is never a bean", parts.category))
        };
        Ok(())
    }

    /// Declared type argument, or the root type when absent.
    fn type_arg(&self, facts: &TypeFacts, index: usize) -> Result<TypeRef> {
        let expr = facts
            .type_args
            .get(index)
            .cloned()
            .unwrap_or_else(|| TypeExpr::named(self.config.root_type.clone()));
        self.resolver.type_ref(&expr)
    }
}

fn default_value(scalar: Scalar) -> Option<DefaultValue> {
    match scalar {
        Scalar::Bool => Some(DefaultValue::Bool(false)),
        Scalar::Char => Some(DefaultValue::Char('\0')),
        Scalar::Byte | Scalar::Short | Scalar::Int | Scalar::Long => Some(DefaultValue::Int(0)),
        Scalar::Float | Scalar::Double => Some(DefaultValue::Float(0.0)),
        Scalar::Void => None,
    }
}

/// Public methods of the nearest type carrying [`TypeTag::Remoteable`],
/// the type itself first.
fn remoteable_methods(
    provider: &dyn TypeFactsProvider,
    facts: &Arc<TypeFacts>,
    ancestors: &[TypeName],
) -> Option<BTreeMap<String, MethodFacts>> {
    let remoteable = |f: &TypeFacts| {
        f.tags.iter().find_map(|t| match t {
            TypeTag::Remoteable {
                annotated_only,
                key_by_name,
            } => Some((*annotated_only, *key_by_name)),
            _ => None,
        })
    };
    let (carrier, (annotated_only, key_by_name)) = remoteable(&**facts)
        .map(|tag| (Arc::clone(facts), tag))
        .or_else(|| {
            ancestors.iter().find_map(|name| {
                let ancestor = provider.facts(name).ok()?;
                let tag = remoteable(&*ancestor)?;
                Some((ancestor, tag))
            })
        })?;

    let methods = carrier
        .methods
        .iter()
        .filter(|m| m.visibility == Visibility::Public)
        .filter(|m| !annotated_only || m.tags.contains(&MemberTag::RemoteMethod))
        .map(|m| {
            let key = if key_by_name {
                m.name.clone()
            } else {
                m.signature()
            };
            (key, m.clone())
        })
        .collect();
    Some(methods)
}

fn member_ref(facts: &TypeFacts, tag: MemberTag) -> Option<MemberRef> {
    let field = facts
        .fields
        .iter()
        .find(|f| f.tags.contains(&tag))
        .map(|f| MemberRef {
            name: f.name.clone(),
            kind: MemberKind::Field,
            setter: f.setter.clone(),
        });
    field.or_else(|| {
        facts
            .methods
            .iter()
            .find(|m| !m.is_static && m.params.len() == 1 && m.tags.contains(&tag))
            .map(|m| MemberRef {
                name: m.name.clone(),
                kind: MemberKind::Method,
                setter: m.invoker.clone(),
            })
    })
}
