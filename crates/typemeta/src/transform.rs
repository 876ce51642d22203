// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Transforms between a normal type and its surrogate representation.
//!
//! The registry indexes transforms per type in a fixed order: the type's own
//! `swap` method, then registered transforms whose normal type is the type or
//! one of its ancestors (registration order), then transforms named by the
//! type's declarative tags. Selection picks the highest strictly positive
//! score for a [`MarshalContext`]; ties go to the earliest binding.

use crate::construction::{ConstructionStrategies, SurrogateRecipe, UNSWAP_METHOD};
use crate::error::{Error, Result, TransformError};
use crate::facts::{is_subtype, ParamShape, TypeFacts, TypeFactsProvider, TypeName, TypeTag};
use crate::value::{Arg, Instance, Invoker};
use dashmap::DashMap;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Name of the instance method that converts a value to its surrogate.
pub const SWAP_METHOD: &str = "swap";

/// Score for an exact format match.
pub const SCORE_EXACT: u32 = 100;
/// Score for a `type/*` range match.
pub const SCORE_RANGE: u32 = 50;
/// Score for a `*/*` wildcard match.
pub const SCORE_WILDCARD: u32 = 10;
/// Score of a transform that does not restrict formats.
pub const SCORE_ANY: u32 = 1;

/// Upper bound on memoized child lookups per direction.
const CHILD_MEMO_LIMIT: usize = 1024;

/// Marshalling context handed in by the caller when selecting a transform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarshalContext {
    format: Arc<str>,
}

impl MarshalContext {
    #[must_use]
    pub fn new(format: &str) -> Self {
        Self {
            format: Arc::from(format),
        }
    }

    #[must_use]
    pub fn format(&self) -> &str {
        &self.format
    }
}

impl Default for MarshalContext {
    fn default() -> Self {
        Self::new("*/*")
    }
}

/// Bidirectional conversion between a normal type and a surrogate type.
pub trait Transform: Send + Sync + fmt::Debug {
    fn normal_type(&self) -> &TypeName;

    fn surrogate_type(&self) -> &TypeName;

    /// Applicability for `ctx`. Zero means not applicable.
    fn score(&self, _ctx: &MarshalContext) -> u32 {
        SCORE_ANY
    }

    fn forward(&self, normal: &dyn Any) -> std::result::Result<Instance, TransformError>;

    fn has_reverse(&self) -> bool {
        false
    }

    fn reverse(&self, _surrogate: &dyn Any) -> std::result::Result<Instance, TransformError> {
        Err(TransformError::NoReverse(self.normal_type().clone()))
    }
}

/// Score a format list against `format`.
///
/// An empty list applies everywhere with the lowest positive score.
#[must_use]
pub fn score_formats(formats: &[String], format: &str) -> u32 {
    if formats.is_empty() {
        return SCORE_ANY;
    }
    formats
        .iter()
        .map(|f| score_format(f, format))
        .max()
        .unwrap_or(0)
}

fn score_format(pattern: &str, format: &str) -> u32 {
    if pattern.eq_ignore_ascii_case(format) {
        return SCORE_EXACT;
    }
    if pattern == "*/*" || pattern == "*" {
        return SCORE_WILDCARD;
    }
    if let Some(prefix) = pattern.strip_suffix("/*") {
        let matches = format
            .split_once('/')
            .is_some_and(|(head, _)| head.eq_ignore_ascii_case(prefix));
        if matches {
            return SCORE_RANGE;
        }
    }
    0
}

type ConvertFn = dyn Fn(&dyn Any) -> std::result::Result<Instance, TransformError> + Send + Sync;

/// Closure-backed transform scored by a list of media types.
#[derive(Clone)]
pub struct MediaTypeTransform {
    normal: TypeName,
    surrogate: TypeName,
    formats: Vec<String>,
    fixed_score: Option<u32>,
    forward: Arc<ConvertFn>,
    reverse: Option<Arc<ConvertFn>>,
}

impl fmt::Debug for MediaTypeTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaTypeTransform")
            .field("normal", &self.normal)
            .field("surrogate", &self.surrogate)
            .field("formats", &self.formats)
            .field("reverse", &self.reverse.is_some())
            .finish()
    }
}

impl Transform for MediaTypeTransform {
    fn normal_type(&self) -> &TypeName {
        &self.normal
    }

    fn surrogate_type(&self) -> &TypeName {
        &self.surrogate
    }

    fn score(&self, ctx: &MarshalContext) -> u32 {
        self.fixed_score
            .unwrap_or_else(|| score_formats(&self.formats, ctx.format()))
    }

    fn forward(&self, normal: &dyn Any) -> std::result::Result<Instance, TransformError> {
        (self.forward)(normal)
    }

    fn has_reverse(&self) -> bool {
        self.reverse.is_some()
    }

    fn reverse(&self, surrogate: &dyn Any) -> std::result::Result<Instance, TransformError> {
        match &self.reverse {
            Some(reverse) => reverse(surrogate),
            None => Err(TransformError::NoReverse(self.normal.clone())),
        }
    }
}

/// Builder for [`MediaTypeTransform`].
///
/// ```
/// use typemeta::transform::{MarshalContext, Transform, TransformBuilder};
///
/// let t = TransformBuilder::new("Money", "String", |m: &i64| Ok(format!("{m} EUR")))
///     .format("text/*")
///     .build();
/// assert_eq!(t.score(&MarshalContext::new("text/plain")), 50);
/// ```
pub struct TransformBuilder {
    inner: MediaTypeTransform,
}

impl TransformBuilder {
    pub fn new<N, S, F>(
        normal: impl Into<TypeName>,
        surrogate: impl Into<TypeName>,
        forward: F,
    ) -> Self
    where
        N: Any,
        S: Any + Send,
        F: Fn(&N) -> std::result::Result<S, String> + Send + Sync + 'static,
    {
        let normal = normal.into();
        let owner = normal.clone();
        let forward: Arc<ConvertFn> = Arc::new(move |value: &dyn Any| {
            let value = value
                .downcast_ref::<N>()
                .ok_or_else(|| TransformError::TypeMismatch {
                    normal: owner.clone(),
                    expected: owner.clone(),
                })?;
            forward(value)
                .map(|s| Box::new(s) as Instance)
                .map_err(|reason| TransformError::Forward {
                    normal: owner.clone(),
                    reason,
                })
        });
        Self {
            inner: MediaTypeTransform {
                normal,
                surrogate: surrogate.into(),
                formats: Vec::new(),
                fixed_score: None,
                forward,
                reverse: None,
            },
        }
    }

    #[must_use]
    pub fn reverse<S, N, F>(mut self, reverse: F) -> Self
    where
        S: Any,
        N: Any + Send,
        F: Fn(&S) -> std::result::Result<N, String> + Send + Sync + 'static,
    {
        let owner = self.inner.normal.clone();
        let expected = self.inner.surrogate.clone();
        self.inner.reverse = Some(Arc::new(move |value: &dyn Any| {
            let value = value
                .downcast_ref::<S>()
                .ok_or_else(|| TransformError::TypeMismatch {
                    normal: owner.clone(),
                    expected: expected.clone(),
                })?;
            reverse(value)
                .map(|n| Box::new(n) as Instance)
                .map_err(|reason| TransformError::Reverse {
                    normal: owner.clone(),
                    reason,
                })
        }));
        self
    }

    #[must_use]
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.inner.formats.push(format.into());
        self
    }

    /// Report `score` for every context instead of matching formats.
    #[must_use]
    pub fn fixed_score(mut self, score: u32) -> Self {
        self.inner.fixed_score = Some(score);
        self
    }

    #[must_use]
    pub fn build(self) -> MediaTypeTransform {
        self.inner
    }
}

/// Transform built from a type's own `swap` method and optional static `unswap`.
#[derive(Debug, Clone)]
pub struct MethodTransform {
    normal: TypeName,
    surrogate: TypeName,
    swap: Option<Invoker>,
    unswap: Option<Invoker>,
}

impl MethodTransform {
    /// Look for a public `swap()` / `swap(session)` instance method.
    #[must_use]
    pub fn discover(facts: &TypeFacts) -> Option<Self> {
        let swap = facts.methods.iter().find(|m| {
            !m.is_static
                && m.is_usable()
                && m.name == SWAP_METHOD
                && matches!(m.params.as_slice(), [] | [ParamShape::Session])
                && m.returns.is_some()
        })?;
        let surrogate = swap.returns.as_ref()?.name.clone();

        let unswap = facts.methods.iter().find(|m| {
            m.is_static
                && m.is_usable()
                && m.name == UNSWAP_METHOD
                && m.returns.as_ref().is_some_and(|r| r.name == facts.name)
                && match m.params.as_slice() {
                    [ParamShape::Session, ParamShape::Type(t)] | [ParamShape::Type(t)] => {
                        t.name == surrogate
                    }
                    _ => false,
                }
        });

        Some(Self {
            normal: facts.name.clone(),
            surrogate,
            swap: swap.invoker.clone(),
            unswap: unswap.and_then(|m| m.invoker.clone()),
        })
    }
}

impl Transform for MethodTransform {
    fn normal_type(&self) -> &TypeName {
        &self.normal
    }

    fn surrogate_type(&self) -> &TypeName {
        &self.surrogate
    }

    fn forward(&self, normal: &dyn Any) -> std::result::Result<Instance, TransformError> {
        let swap = self.swap.as_ref().ok_or_else(|| TransformError::Forward {
            normal: self.normal.clone(),
            reason: "no invoker bound to the swap method".into(),
        })?;
        swap.invoke(&[Arg::Receiver(normal)])
            .map_err(|reason| TransformError::Forward {
                normal: self.normal.clone(),
                reason,
            })
    }

    fn has_reverse(&self) -> bool {
        self.unswap.is_some()
    }

    fn reverse(&self, surrogate: &dyn Any) -> std::result::Result<Instance, TransformError> {
        let unswap = self
            .unswap
            .as_ref()
            .ok_or_else(|| TransformError::NoReverse(self.normal.clone()))?;
        unswap
            .invoke(&[Arg::Value(surrogate)])
            .map_err(|reason| TransformError::Reverse {
                normal: self.normal.clone(),
                reason,
            })
    }
}

/// Where a binding came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingOrigin {
    /// The type's own `swap` method.
    SwapMethod,
    /// Registered for exactly this type.
    Registered,
    /// Registered for the named ancestor.
    Inherited(TypeName),
    /// Named by a declarative tag on the type.
    Declared(String),
}

#[derive(Debug, Clone)]
pub struct TransformBinding {
    pub transform: Arc<dyn Transform>,
    pub origin: BindingOrigin,
}

/// Registered transforms plus the named catalog used by declarative tags.
#[derive(Debug, Default, Clone)]
pub struct TransformRegistry {
    registered: Vec<Arc<dyn Transform>>,
    catalog: HashMap<String, Arc<dyn Transform>>,
}

impl TransformRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, transform: Arc<dyn Transform>) {
        log::debug!(
            "[transform] registered {} -> {}",
            transform.normal_type(),
            transform.surrogate_type()
        );
        self.registered.push(transform);
    }

    /// Add a transform that applies only to types whose tags name it.
    pub fn register_named(&mut self, name: impl Into<String>, transform: Arc<dyn Transform>) {
        self.catalog.insert(name.into(), transform);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.registered.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    /// Registered and tag-declared bindings for a type, in selection order.
    pub fn bindings_for(
        &self,
        facts: &TypeFacts,
        ancestors: &[TypeName],
    ) -> std::result::Result<Vec<TransformBinding>, TransformError> {
        let mut out = Vec::new();
        for transform in &self.registered {
            let normal = transform.normal_type();
            let origin = if *normal == facts.name {
                BindingOrigin::Registered
            } else if ancestors.contains(normal) {
                BindingOrigin::Inherited(normal.clone())
            } else {
                continue;
            };
            out.push(TransformBinding {
                transform: Arc::clone(transform),
                origin,
            });
        }

        for tag in &facts.tags {
            let TypeTag::Transform { name } = tag else {
                continue;
            };
            let transform = self
                .catalog
                .get(name)
                .ok_or_else(|| TransformError::Unknown {
                    name: name.clone(),
                    type_name: facts.name.clone(),
                })?;
            out.push(TransformBinding {
                transform: Arc::clone(transform),
                origin: BindingOrigin::Declared(name.clone()),
            });
        }
        Ok(out)
    }

    /// Registered transforms whose normal type strictly descends from `name`.
    #[must_use]
    pub fn children_of(
        &self,
        name: &TypeName,
        provider: &dyn TypeFactsProvider,
    ) -> Vec<Arc<dyn Transform>> {
        self.registered
            .iter()
            .filter(|t| t.normal_type() != name && is_subtype(provider, t.normal_type(), name))
            .cloned()
            .collect()
    }
}

/// The transforms indexed on one descriptor.
pub struct TransformSet {
    bindings: Vec<TransformBinding>,
    children: Vec<Arc<dyn Transform>>,
    provider: Option<Arc<dyn TypeFactsProvider>>,
    child_by_normal: DashMap<TypeName, Option<usize>>,
    child_by_surrogate: DashMap<TypeName, Option<usize>>,
}

impl TransformSet {
    #[must_use]
    pub fn new(
        bindings: Vec<TransformBinding>,
        children: Vec<Arc<dyn Transform>>,
        provider: Option<Arc<dyn TypeFactsProvider>>,
    ) -> Self {
        Self {
            bindings,
            children,
            provider,
            child_by_normal: DashMap::new(),
            child_by_surrogate: DashMap::new(),
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), None)
    }

    #[must_use]
    pub fn bindings(&self) -> &[TransformBinding] {
        &self.bindings
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    #[must_use]
    pub fn children(&self) -> &[Arc<dyn Transform>] {
        &self.children
    }

    /// Highest strictly positive score; the earliest binding wins ties.
    #[must_use]
    pub fn select(&self, ctx: &MarshalContext) -> Option<(&TransformBinding, u32)> {
        let mut best: Option<(&TransformBinding, u32)> = None;
        for binding in &self.bindings {
            let score = binding.transform.score(ctx);
            if score > best.map_or(0, |(_, s)| s) {
                best = Some((binding, score));
            }
        }
        best
    }

    /// First child transform whose normal type is `subtype` or one of its
    /// ancestors. Memoized per subtype.
    #[must_use]
    pub fn child_for(&self, subtype: &TypeName) -> Option<Arc<dyn Transform>> {
        self.memoized(&self.child_by_normal, subtype, false)
    }

    /// First child transform whose surrogate type is `surrogate` or one of
    /// its ancestors. Memoized per surrogate type.
    #[must_use]
    pub fn child_for_surrogate(&self, surrogate: &TypeName) -> Option<Arc<dyn Transform>> {
        self.memoized(&self.child_by_surrogate, surrogate, true)
    }

    fn memoized(
        &self,
        memo: &DashMap<TypeName, Option<usize>>,
        key: &TypeName,
        by_surrogate: bool,
    ) -> Option<Arc<dyn Transform>> {
        if self.children.is_empty() {
            return None;
        }
        if let Some(index) = memo.get(key).map(|e| *e.value()) {
            return index.map(|i| Arc::clone(&self.children[i]));
        }

        // Provider callbacks run without holding a shard lock.
        let index = self.children.iter().position(|child| {
            let target = if by_surrogate {
                child.surrogate_type()
            } else {
                child.normal_type()
            };
            self.is_subtype(key, target)
        });
        if memo.len() < CHILD_MEMO_LIMIT && self.is_known(key) {
            memo.insert(key.clone(), index);
        }
        index.map(|i| Arc::clone(&self.children[i]))
    }

    /// Names the provider cannot describe are never memoized.
    fn is_known(&self, name: &TypeName) -> bool {
        match &self.provider {
            Some(provider) => provider.facts(name).is_ok(),
            None => false,
        }
    }

    fn is_subtype(&self, sub: &TypeName, sup: &TypeName) -> bool {
        match &self.provider {
            Some(provider) => is_subtype(provider.as_ref(), sub, sup),
            None => sub == sup,
        }
    }
}

impl fmt::Debug for TransformSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformSet")
            .field("bindings", &self.bindings)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

/// How an applied transform reconstructs the normal value.
#[derive(Debug, Clone)]
pub enum ReversePath {
    /// The transform's own reverse recipe.
    Explicit,
    /// A from-surrogate construction strategy of the normal type.
    FromSurrogate(SurrogateRecipe),
    Unavailable,
}

/// A selected transform together with its reverse path.
#[derive(Debug, Clone)]
pub struct AppliedTransform {
    owner: TypeName,
    binding: TransformBinding,
    score: u32,
    reverse: ReversePath,
}

impl AppliedTransform {
    pub(crate) fn new(
        owner: &TypeName,
        binding: &TransformBinding,
        score: u32,
        strategies: &ConstructionStrategies,
    ) -> Self {
        let transform = &binding.transform;
        let reverse = if transform.has_reverse() {
            ReversePath::Explicit
        } else if let Some(recipe) = strategies.surrogate_recipe(transform.surrogate_type()) {
            ReversePath::FromSurrogate(recipe.clone())
        } else {
            ReversePath::Unavailable
        };
        Self {
            owner: owner.clone(),
            binding: binding.clone(),
            score,
            reverse,
        }
    }

    #[must_use]
    pub fn transform(&self) -> &Arc<dyn Transform> {
        &self.binding.transform
    }

    #[must_use]
    pub fn origin(&self) -> &BindingOrigin {
        &self.binding.origin
    }

    #[must_use]
    pub fn surrogate_type(&self) -> &TypeName {
        self.binding.transform.surrogate_type()
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn reverse_path(&self) -> &ReversePath {
        &self.reverse
    }

    #[must_use]
    pub fn can_reverse(&self) -> bool {
        !matches!(self.reverse, ReversePath::Unavailable)
    }

    pub fn forward(&self, normal: &dyn Any) -> Result<Instance> {
        Ok(self.binding.transform.forward(normal)?)
    }

    pub fn reverse(&self, surrogate: &dyn Any) -> Result<Instance> {
        match &self.reverse {
            ReversePath::Explicit => Ok(self.binding.transform.reverse(surrogate)?),
            ReversePath::FromSurrogate(recipe) => recipe.build(&self.owner, surrogate),
            ReversePath::Unavailable => Err(Error::instantiation(
                &self.owner,
                format!(
                    "no reverse recipe or constructor accepting '{}'",
                    self.surrogate_type()
                ),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{FactsTable, MethodFacts};

    #[derive(Debug)]
    struct Scored {
        normal: TypeName,
        surrogate: TypeName,
        score: u32,
    }

    impl Scored {
        fn arc(normal: &str, surrogate: &str, score: u32) -> Arc<dyn Transform> {
            Arc::new(Self {
                normal: normal.into(),
                surrogate: surrogate.into(),
                score,
            })
        }
    }

    impl Transform for Scored {
        fn normal_type(&self) -> &TypeName {
            &self.normal
        }

        fn surrogate_type(&self) -> &TypeName {
            &self.surrogate
        }

        fn score(&self, _ctx: &MarshalContext) -> u32 {
            self.score
        }

        fn forward(&self, _normal: &dyn Any) -> std::result::Result<Instance, TransformError> {
            Ok(Box::new(self.score))
        }
    }

    fn set(transforms: &[Arc<dyn Transform>]) -> TransformSet {
        let bindings = transforms
            .iter()
            .map(|t| TransformBinding {
                transform: Arc::clone(t),
                origin: BindingOrigin::Registered,
            })
            .collect();
        TransformSet::new(bindings, Vec::new(), None)
    }

    #[test]
    fn test_format_scoring() {
        let formats = vec!["text/json".to_string(), "text/*".to_string()];
        assert_eq!(score_formats(&formats, "text/json"), SCORE_EXACT);
        assert_eq!(score_formats(&formats, "TEXT/JSON"), SCORE_EXACT);
        assert_eq!(score_formats(&formats, "text/xml"), SCORE_RANGE);
        assert_eq!(score_formats(&formats, "application/json"), 0);
        assert_eq!(score_formats(&["*/*".to_string()], "anything"), SCORE_WILDCARD);
        assert_eq!(score_formats(&[], "anything"), SCORE_ANY);
    }

    #[test]
    fn test_highest_score_wins_regardless_of_order() {
        let ctx = MarshalContext::new("text");
        let low = Scored::arc("Money", "String", 5);
        let high = Scored::arc("Money", "Long", 10);

        for order in [[low.clone(), high.clone()], [high.clone(), low.clone()]] {
            let candidates = set(&order);
            let (binding, score) = candidates.select(&ctx).expect("selected");
            assert_eq!(score, 10);
            assert_eq!(binding.transform.surrogate_type().as_str(), "Long");
        }
    }

    #[test]
    fn test_ties_go_to_earliest_and_zero_is_skipped() {
        let ctx = MarshalContext::default();
        let first = Scored::arc("Money", "String", 7);
        let second = Scored::arc("Money", "Long", 7);
        let candidates = set(&[first, second]);
        let (binding, _) = candidates.select(&ctx).expect("selected");
        assert_eq!(binding.transform.surrogate_type().as_str(), "String");

        let never = Scored::arc("Money", "String", 0);
        assert!(set(&[never]).select(&ctx).is_none());
        assert!(TransformSet::empty().select(&ctx).is_none());
    }

    #[test]
    fn test_builder_checks_value_types() {
        let t = TransformBuilder::new("Money", "String", |cents: &i64| {
            Ok(format!("{}.{:02}", cents / 100, cents % 100))
        })
        .reverse(|s: &String| {
            let (units, cents) = s.split_once('.').ok_or("missing '.'")?;
            let units: i64 = units.parse().map_err(|_| "bad units".to_string())?;
            let cents: i64 = cents.parse().map_err(|_| "bad cents".to_string())?;
            Ok(units * 100 + cents)
        })
        .format("text/plain")
        .build();

        let out = t.forward(&1250i64).expect("forward");
        assert_eq!(out.downcast_ref::<String>().map(String::as_str), Some("12.50"));
        let back = t.reverse(&"3.07".to_string()).expect("reverse");
        assert_eq!(back.downcast_ref::<i64>(), Some(&307));

        assert!(matches!(
            t.forward(&"not a number"),
            Err(TransformError::TypeMismatch { .. })
        ));
        assert!(matches!(
            t.reverse(&"nodot".to_string()),
            Err(TransformError::Reverse { .. })
        ));
        assert_eq!(t.score(&MarshalContext::new("text/plain")), SCORE_EXACT);
        assert_eq!(t.score(&MarshalContext::new("application/json")), 0);
    }

    #[test]
    fn test_registry_bindings_order() {
        let mut registry = TransformRegistry::new();
        registry.register(Scored::arc("Shape", "String", 1));
        registry.register(Scored::arc("Circle", "Long", 1));
        registry.register(Scored::arc("Unrelated", "Long", 1));
        registry.register_named("circle-as-map", Scored::arc("Circle", "Map", 1));

        let circle = TypeFacts::new("Circle")
            .supertype("Shape")
            .tag(TypeTag::Transform {
                name: "circle-as-map".into(),
            });
        let bindings = registry
            .bindings_for(&circle, &[TypeName::from("Shape")])
            .expect("bindings");
        let origins: Vec<&BindingOrigin> = bindings.iter().map(|b| &b.origin).collect();
        assert_eq!(
            origins,
            [
                &BindingOrigin::Inherited("Shape".into()),
                &BindingOrigin::Registered,
                &BindingOrigin::Declared("circle-as-map".into()),
            ]
        );

        let unknown = TypeFacts::new("Square").tag(TypeTag::Transform {
            name: "nope".into(),
        });
        assert!(matches!(
            registry.bindings_for(&unknown, &[]),
            Err(TransformError::Unknown { .. })
        ));
    }

    #[test]
    fn test_child_transforms_memoized() {
        let table = Arc::new(
            FactsTable::new()
                .with(TypeFacts::new("Shape"))
                .with(TypeFacts::new("Circle").supertype("Shape"))
                .with(TypeFacts::new("BigCircle").supertype("Circle")),
        );
        let mut registry = TransformRegistry::new();
        registry.register(Scored::arc("Circle", "String", 1));
        let children = registry.children_of(&"Shape".into(), table.as_ref());
        assert_eq!(children.len(), 1);
        assert!(registry.children_of(&"Circle".into(), table.as_ref()).is_empty());

        let set = TransformSet::new(Vec::new(), children, Some(table));
        let hit = set.child_for(&"BigCircle".into()).expect("child");
        assert_eq!(hit.normal_type().as_str(), "Circle");
        assert!(set.child_for(&"Shape".into()).is_none());
        assert!(set.child_for_surrogate(&"String".into()).is_some());

        assert_eq!(set.child_by_normal.len(), 2);
        let again = set.child_for(&"BigCircle".into()).expect("memoized");
        assert!(Arc::ptr_eq(&hit, &again));
        assert_eq!(set.child_by_normal.len(), 2);
    }

    #[test]
    fn test_unknown_names_not_memoized() {
        let table = Arc::new(
            FactsTable::new()
                .with(TypeFacts::new("Shape"))
                .with(TypeFacts::new("Circle").supertype("Shape")),
        );
        let set = TransformSet::new(
            Vec::new(),
            vec![Scored::arc("Circle", "String", 1)],
            Some(table),
        );
        for i in 0..64 {
            assert!(set.child_for(&format!("Ghost{i}").as_str().into()).is_none());
        }
        assert!(set.child_by_normal.is_empty());
        assert!(set.child_for_surrogate(&"String".into()).is_some());
        assert!(set.child_by_surrogate.is_empty());
    }

    /// Provider that looks the same child up again from inside `facts`.
    struct Reentrant {
        table: FactsTable,
        set: std::sync::OnceLock<std::sync::Weak<TransformSet>>,
        entered: std::sync::atomic::AtomicBool,
    }

    impl TypeFactsProvider for Reentrant {
        fn facts(
            &self,
            name: &TypeName,
        ) -> std::result::Result<Arc<TypeFacts>, crate::facts::FactsError> {
            use std::sync::atomic::Ordering;
            if !self.entered.swap(true, Ordering::SeqCst) {
                if let Some(set) = self.set.get().and_then(std::sync::Weak::upgrade) {
                    let _ = set.child_for(name);
                }
            }
            self.table.facts(name)
        }
    }

    #[test]
    fn test_child_lookup_reentered_from_provider() {
        let provider = Arc::new(Reentrant {
            table: FactsTable::new()
                .with(TypeFacts::new("Circle"))
                .with(TypeFacts::new("BigCircle").supertype("Circle")),
            set: std::sync::OnceLock::new(),
            entered: std::sync::atomic::AtomicBool::new(false),
        });
        let set = Arc::new(TransformSet::new(
            Vec::new(),
            vec![Scored::arc("Circle", "String", 1)],
            Some(Arc::clone(&provider) as Arc<dyn TypeFactsProvider>),
        ));
        let _ = provider.set.set(Arc::downgrade(&set));

        let hit = set.child_for(&"BigCircle".into()).expect("child");
        assert_eq!(hit.normal_type().as_str(), "Circle");
        assert_eq!(set.child_by_normal.len(), 1);
    }

    #[test]
    fn test_swap_method_discovery() {
        let facts = TypeFacts::new("Temperature")
            .method(
                MethodFacts::new(SWAP_METHOD, vec![ParamShape::Session])
                    .returns("Double")
                    .invoker(Invoker::new(|args| {
                        let celsius = args
                            .first()
                            .and_then(|a| a.downcast::<f64>())
                            .ok_or_else(|| "receiver".to_string())?;
                        Ok(Box::new(celsius * 1.8 + 32.0) as Instance)
                    })),
            )
            .method(
                MethodFacts::new(
                    UNSWAP_METHOD,
                    vec![
                        ParamShape::Session,
                        ParamShape::Type(crate::type_expr::TypeExpr::named("Double")),
                    ],
                )
                .returns("Temperature")
                .static_fn(),
            );

        let t = MethodTransform::discover(&facts).expect("swap method");
        assert_eq!(t.surrogate_type().as_str(), "Double");
        assert!(!t.has_reverse());
        let out = t.forward(&100.0f64).expect("forward");
        assert_eq!(out.downcast_ref::<f64>(), Some(&212.0));

        assert!(MethodTransform::discover(&TypeFacts::new("Plain")).is_none());
    }
}
