// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Concurrent get-or-build cache of type descriptors.
//!
//! The registry guarantees that descriptor assembly happens only once per
//! type identity. The first lookup inserts an in-progress placeholder, drops
//! the map shard lock, then builds. Concurrent lookups for the same identity
//! wait on the placeholder's latch; lookups for other identities proceed in
//! parallel.
//!
//! Lookups issued while a build is running (element types, property types,
//! type arguments) never wait. They take the placeholder, building it inline
//! if absent, and keep a lazy [`TypeRef`]. Self-referential and mutually
//! recursive types therefore resolve without deadlocking.

use crate::bean::{BeanIntrospector, PropertyIntrospector, RefResolver};
use crate::classify::Category;
use crate::config::RegistryConfig;
use crate::descriptor::{Assembly, Body, Draft, TypeDescriptor, TypeRef};
use crate::error::{Error, Result};
use crate::facts::{TypeFactsProvider, TypeName};
use crate::transform::{Transform, TransformRegistry};
use crate::type_expr::TypeExpr;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

/// Lookup and build statistics.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegistryStats {
    /// Top-level lookups served by an existing entry.
    pub hits: u64,
    /// Top-level lookups that created the entry.
    pub misses: u64,
    /// Descriptor builds, nested ones included.
    pub builds: u64,
    pub failures: u64,
    pub last_build_ns: u64,
}

/// Override applied by [`TypeRegistry::specialize`].
#[derive(Debug, Clone)]
pub enum Specialization {
    Element(TypeExpr),
    Pair(TypeExpr, TypeExpr),
}

pub(crate) struct Shared {
    me: Weak<Shared>,
    cache: DashMap<TypeName, Arc<TypeDescriptor>>,
    provider: Arc<dyn TypeFactsProvider>,
    introspector: Arc<dyn BeanIntrospector>,
    transforms: TransformRegistry,
    config: RegistryConfig,
    stats: RwLock<RegistryStats>,
}

impl Shared {
    /// Existing entry, or a fresh placeholder inserted for this thread to build.
    fn entry(&self, name: &TypeName) -> (Arc<TypeDescriptor>, bool) {
        match self.cache.entry(name.clone()) {
            Entry::Occupied(e) => (Arc::clone(e.get()), false),
            Entry::Vacant(e) => {
                let placeholder = Arc::new(TypeDescriptor::placeholder(name.clone()));
                e.insert(Arc::clone(&placeholder));
                (placeholder, true)
            }
        }
    }

    /// Top-level lookup: waits until the descriptor is published.
    pub(crate) fn get(&self, name: &TypeName) -> Result<Arc<TypeDescriptor>> {
        let (desc, inserted) = self.entry(name);
        if inserted {
            self.record_miss();
            self.build(&desc)?;
            return Ok(desc);
        }
        if !desc.is_published() && desc.built_by_current_thread() {
            return Err(Error::ReentrantLookup(name.clone()));
        }
        desc.body();
        self.record_hit();
        Ok(desc)
    }

    /// Lookup from inside a build: never waits.
    pub(crate) fn nested(&self, name: &TypeName) -> Result<Arc<TypeDescriptor>> {
        let (desc, inserted) = self.entry(name);
        if inserted {
            self.build(&desc)?;
        }
        Ok(desc)
    }

    fn build(&self, desc: &Arc<TypeDescriptor>) -> Result<()> {
        let start = Instant::now();
        let name = desc.name().clone();
        log::debug!("[registry] building '{}'", name);

        let mut draft = Draft::new(&name);
        let assembly = Assembly {
            name: &name,
            provider: &self.provider,
            config: &self.config,
            transforms: &self.transforms,
            introspector: self.introspector.as_ref(),
            resolver: self,
        };
        // A panicking collaborator still ends the build, so waiters wake up.
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| assembly.run(&mut draft)))
            .unwrap_or_else(|payload| {
                Err(Error::AssemblyPanicked(panic_message(payload.as_ref())))
            });
        let failure = outcome
            .as_ref()
            .err()
            .map(|e| Arc::<str>::from(e.to_string()));
        desc.publish(draft.finish(failure));
        self.record_build(start, outcome.is_err());

        outcome.map_err(|e| {
            log::warn!("[registry] build of '{}' failed: {}", name, e);
            Error::Initialization {
                type_name: name,
                reason: e.to_string(),
            }
        })
    }

    /// Build an uncached specialization from the cached raw descriptor.
    pub(crate) fn resolve_expr(&self, expr: &TypeExpr) -> Result<Arc<TypeDescriptor>> {
        let base = self.get(&expr.name)?;
        if !expr.is_parameterized() {
            return Ok(base);
        }

        let body = base.body();
        let category = body.category();
        let (element, key, value) = match (category, expr.args.as_slice()) {
            (Category::ElementContainer | Category::Array, [element]) => {
                (Some(self.type_ref(element)?), None, None)
            }
            (Category::PairContainer | Category::BeanMap, [key, value]) => {
                (None, Some(self.type_ref(key)?), Some(self.type_ref(value)?))
            }
            (Category::ElementContainer | Category::Array, args) => {
                return Err(arity_error(expr, category, 1, args.len()));
            }
            (Category::PairContainer | Category::BeanMap, args) => {
                return Err(arity_error(expr, category, 2, args.len()));
            }
            (category, _) => {
                log::debug!(
                    "[registry] type arguments of '{}' ignored for category {}",
                    expr,
                    category
                );
                return Ok(base);
            }
        };

        Ok(Arc::new(TypeDescriptor::ready(
            expr.clone(),
            body.specialized(element, key, value),
        )))
    }

    fn record_hit(&self) {
        let mut stats = self.stats.write();
        stats.hits = stats.hits.saturating_add(1);
    }

    fn record_miss(&self) {
        let mut stats = self.stats.write();
        stats.misses = stats.misses.saturating_add(1);
    }

    fn record_build(&self, start: Instant, failed: bool) {
        let mut stats = self.stats.write();
        stats.builds = stats.builds.saturating_add(1);
        if failed {
            stats.failures = stats.failures.saturating_add(1);
        }
        stats.last_build_ns = saturating_nanos(start.elapsed());
    }
}

fn saturating_nanos(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

fn arity_error(expr: &TypeExpr, category: Category, expected: usize, got: usize) -> Error {
    Error::Specialization {
        expr: expr.to_string(),
        reason: format!("{category} types take {expected} type argument(s), got {got}"),
    }
}

impl RefResolver for Shared {
    fn type_ref(&self, expr: &TypeExpr) -> Result<TypeRef> {
        let mut outcome = Ok(());
        expr.for_each_name(&mut |name| {
            if outcome.is_ok() {
                if let Err(e) = self.nested(name) {
                    outcome = Err(e);
                }
            }
        });
        outcome?;
        Ok(TypeRef::new(expr.clone(), self.me.clone()))
    }
}

/// Registry of type descriptors.
///
/// Cheap to clone; clones share the same cache.
#[derive(Clone)]
pub struct TypeRegistry {
    shared: Arc<Shared>,
}

impl TypeRegistry {
    /// Registry with default configuration, introspector and no transforms.
    pub fn new(provider: impl TypeFactsProvider + 'static) -> Self {
        RegistryBuilder::new(provider).assemble()
    }

    pub fn builder(provider: impl TypeFactsProvider + 'static) -> RegistryBuilder {
        RegistryBuilder::new(provider)
    }

    /// Descriptor for a non-parameterized type, built on first use.
    ///
    /// The first caller receives any build error. Later callers get the
    /// cached descriptor in the `Failed` state.
    pub fn get(&self, name: impl Into<TypeName>) -> Result<Arc<TypeDescriptor>> {
        self.shared.get(&name.into())
    }

    /// Descriptor for a possibly parameterized type expression.
    ///
    /// Parameterized expressions yield a fresh, uncached specialization.
    pub fn resolve(&self, expr: &TypeExpr) -> Result<Arc<TypeDescriptor>> {
        self.shared.resolve_expr(expr)
    }

    /// Parse `text` and [`resolve`](Self::resolve) it.
    pub fn lookup(&self, text: &str) -> Result<Arc<TypeDescriptor>> {
        let expr: TypeExpr = text.parse()?;
        self.resolve(&expr)
    }

    /// Uncached copy of `raw` with its element or key/value types replaced.
    pub fn specialize(
        &self,
        raw: impl Into<TypeName>,
        with: Specialization,
    ) -> Result<Arc<TypeDescriptor>> {
        let args = match with {
            Specialization::Element(element) => vec![element],
            Specialization::Pair(key, value) => vec![key, value],
        };
        self.resolve(&TypeExpr::with_args(raw, args))
    }

    /// Uncached argument-list descriptor.
    pub fn args(&self, types: &[TypeExpr]) -> Result<Arc<TypeDescriptor>> {
        let refs = types
            .iter()
            .map(|t| self.shared.type_ref(t))
            .collect::<Result<Vec<_>>>()?;
        Ok(Arc::new(TypeDescriptor::ready(
            TypeExpr::named(crate::descriptor::ARGUMENT_LIST),
            Body::argument_list(refs),
        )))
    }

    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        *self.shared.stats.read()
    }

    /// Number of cached identities, in-progress ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.cache.is_empty()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.shared.cache.contains_key(name)
    }

    /// Cached identities in sorted order.
    #[must_use]
    pub fn cached_names(&self) -> Vec<TypeName> {
        let mut names: Vec<TypeName> = self.shared.cache.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.shared.config
    }

    #[must_use]
    pub fn transforms(&self) -> &TransformRegistry {
        &self.shared.transforms
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("cached", &self.shared.cache.len())
            .field("transforms", &self.shared.transforms.len())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

/// Builder for [`TypeRegistry`].
pub struct RegistryBuilder {
    provider: Arc<dyn TypeFactsProvider>,
    config: RegistryConfig,
    introspector: Arc<dyn BeanIntrospector>,
    transforms: TransformRegistry,
}

impl RegistryBuilder {
    pub fn new(provider: impl TypeFactsProvider + 'static) -> Self {
        Self {
            provider: Arc::new(provider),
            config: RegistryConfig::default(),
            introspector: Arc::new(PropertyIntrospector),
            transforms: TransformRegistry::new(),
        }
    }

    #[must_use]
    pub fn config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn introspector(mut self, introspector: impl BeanIntrospector + 'static) -> Self {
        self.introspector = Arc::new(introspector);
        self
    }

    /// Register a transform for its normal type and all descendants.
    #[must_use]
    pub fn transform(mut self, transform: impl Transform + 'static) -> Self {
        self.transforms.register(Arc::new(transform));
        self
    }

    /// Add a transform that only applies to types whose tags name it.
    #[must_use]
    pub fn named_transform(
        mut self,
        name: impl Into<String>,
        transform: impl Transform + 'static,
    ) -> Self {
        self.transforms.register_named(name, Arc::new(transform));
        self
    }

    /// Validate the configuration and build the registry.
    pub fn build(self) -> Result<TypeRegistry> {
        self.config.validate()?;
        Ok(self.assemble())
    }

    fn assemble(self) -> TypeRegistry {
        let Self {
            provider,
            config,
            introspector,
            transforms,
        } = self;
        let shared = Arc::new_cyclic(|me| Shared {
            me: me.clone(),
            cache: DashMap::new(),
            provider,
            introspector,
            transforms,
            config,
            stats: RwLock::new(RegistryStats::default()),
        });
        TypeRegistry { shared }
    }
}
