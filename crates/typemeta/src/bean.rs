// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bean shape detection.
//!
//! Only types classified [`Category::Other`](crate::Category::Other) are
//! offered to the [`BeanIntrospector`]. Its verdict is stored on the
//! descriptor either way: a type that is not a bean carries the reason.

use crate::config::RegistryConfig;
use crate::descriptor::TypeRef;
use crate::error::Result;
use crate::facts::{MemberTag, ParamShape, TypeFacts, TypeTag};
use crate::type_expr::TypeExpr;
use crate::value::Invoker;
use std::sync::Arc;

/// One readable and possibly writable bean property.
#[derive(Debug, Clone)]
pub struct BeanProperty {
    pub name: String,
    pub ty: TypeRef,
    pub read_only: bool,
    setter: Option<Invoker>,
}

impl BeanProperty {
    #[must_use]
    pub fn setter(&self) -> Option<&Invoker> {
        self.setter.as_ref()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BeanShape {
    pub properties: Vec<BeanProperty>,
    /// Name identifying the type inside a bean dictionary.
    pub dictionary_name: Option<String>,
    /// Property carrying the dictionary name in marshalled output.
    pub type_property_name: Option<String>,
}

impl BeanShape {
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&BeanProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Result of bean introspection.
#[derive(Debug, Clone)]
pub enum BeanVerdict {
    Bean(Arc<BeanShape>),
    NotABean(String),
}

impl BeanVerdict {
    #[must_use]
    pub fn is_bean(&self) -> bool {
        matches!(self, Self::Bean(_))
    }

    #[must_use]
    pub fn shape(&self) -> Option<&BeanShape> {
        match self {
            Self::Bean(shape) => Some(shape),
            Self::NotABean(_) => None,
        }
    }

    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Bean(_) => None,
            Self::NotABean(reason) => Some(reason),
        }
    }
}

/// Decides whether a type has a bean shape.
///
/// An `Err` marks the descriptor as failed; use [`BeanVerdict::NotABean`]
/// for ordinary rejections.
pub trait BeanIntrospector: Send + Sync {
    fn introspect(&self, facts: &TypeFacts, ctx: &BeanContext<'_>) -> Result<BeanVerdict>;
}

pub(crate) trait RefResolver {
    fn type_ref(&self, expr: &TypeExpr) -> Result<TypeRef>;
}

/// Registry services available while a type is being introspected.
///
/// References handed out here point at descriptors that may still be under
/// construction on the current thread. Keep them; do not resolve them before
/// `introspect` returns.
pub struct BeanContext<'a> {
    resolver: &'a dyn RefResolver,
    config: &'a RegistryConfig,
    has_implementation: bool,
}

impl<'a> BeanContext<'a> {
    pub(crate) fn new(
        resolver: &'a dyn RefResolver,
        config: &'a RegistryConfig,
        has_implementation: bool,
    ) -> Self {
        Self {
            resolver,
            config,
            has_implementation,
        }
    }

    /// Lazy reference to a property type. Never waits.
    pub fn type_ref(&self, expr: &TypeExpr) -> Result<TypeRef> {
        self.resolver.type_ref(expr)
    }

    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        self.config
    }

    /// An implementation type is configured for the introspected type.
    #[must_use]
    pub fn has_implementation(&self) -> bool {
        self.has_implementation
    }
}

/// Default introspector: getters, setters and public fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct PropertyIntrospector;

struct Draft {
    name: String,
    ty: TypeExpr,
    readable: bool,
    setter: Option<Invoker>,
    writable: bool,
}

impl PropertyIntrospector {
    fn collect(facts: &TypeFacts) -> Vec<Draft> {
        let mut drafts: Vec<Draft> = Vec::new();
        let mut upsert = |incoming: Draft| {
            match drafts.iter_mut().find(|d| d.name == incoming.name) {
                Some(d) => {
                    if incoming.readable && !d.readable {
                        d.ty = incoming.ty;
                    }
                    d.readable |= incoming.readable;
                    if incoming.writable && !d.writable {
                        d.writable = true;
                        d.setter = incoming.setter;
                    }
                }
                None => drafts.push(incoming),
            }
        };

        let skip = |tags: &[MemberTag]| {
            tags.iter().any(|t| {
                matches!(
                    t,
                    MemberTag::Ignore | MemberTag::NameProperty | MemberTag::ParentProperty
                )
            })
        };

        for method in &facts.methods {
            if method.is_static || !method.is_usable() || skip(&method.tags) {
                continue;
            }
            match (method.params.as_slice(), &method.returns) {
                ([], Some(ret)) => {
                    let is_flag = matches!(ret.name.as_str(), "boolean" | "Boolean");
                    let name = accessor_property(&method.name, "get").or_else(|| {
                        is_flag
                            .then(|| accessor_property(&method.name, "is"))
                            .flatten()
                    });
                    if let Some(name) = name {
                        upsert(Draft {
                            name,
                            ty: ret.clone(),
                            readable: true,
                            setter: None,
                            writable: false,
                        });
                    }
                }
                ([param], _) => {
                    let ty = match param {
                        ParamShape::Type(expr) => expr.clone(),
                        ParamShape::Text => TypeExpr::named("String"),
                        ParamShape::Number(_) | ParamShape::Session => continue,
                    };
                    if let Some(name) = accessor_property(&method.name, "set") {
                        upsert(Draft {
                            name,
                            ty,
                            readable: false,
                            setter: method.invoker.clone(),
                            writable: true,
                        });
                    }
                }
                _ => {}
            }
        }

        for field in &facts.fields {
            if field.is_static
                || field.visibility != crate::facts::Visibility::Public
                || skip(&field.tags)
            {
                continue;
            }
            upsert(Draft {
                name: field.name.clone(),
                ty: field.ty.clone(),
                readable: true,
                setter: field.setter.clone(),
                writable: true,
            });
        }

        drafts
    }
}

impl BeanIntrospector for PropertyIntrospector {
    fn introspect(&self, facts: &TypeFacts, ctx: &BeanContext<'_>) -> Result<BeanVerdict> {
        let config = ctx.config();
        if config.not_bean_types.contains(&facts.name) {
            return Ok(BeanVerdict::NotABean("Class is listed as not a bean".into()));
        }

        if !facts.is_abstract && !ctx.has_implementation() {
            let arity = usize::from(facts.requires_enclosing);
            let has_ctor = facts.constructors.iter().any(|c| {
                !c.deprecated
                    && c.visibility >= config.bean_constructor_visibility
                    && c.params.len() == arity
            });
            if !has_ctor {
                return Ok(BeanVerdict::NotABean(
                    "Class does not have the required no-arg constructor".into(),
                ));
            }
        }

        let drafts = Self::collect(facts);
        if drafts.is_empty() && config.require_bean_properties {
            return Ok(BeanVerdict::NotABean(
                "No properties detected on bean class".into(),
            ));
        }

        let mut shape = BeanShape::default();
        for draft in drafts {
            shape.properties.push(BeanProperty {
                ty: ctx.type_ref(&draft.ty)?,
                name: draft.name,
                read_only: !draft.writable,
                setter: draft.setter,
            });
        }

        for tag in &facts.tags {
            if let TypeTag::Bean {
                dictionary_name,
                type_property_name,
                ..
            } = tag
            {
                shape.dictionary_name = dictionary_name.clone();
                shape.type_property_name = type_property_name.clone();
            }
        }

        Ok(BeanVerdict::Bean(Arc::new(shape)))
    }
}

/// `getFooBar` -> `fooBar`, `getURL` -> `URL`.
fn accessor_property(method: &str, prefix: &str) -> Option<String> {
    let rest = method.strip_prefix(prefix)?;
    let mut chars = rest.chars();
    let first = chars.next()?;
    if !first.is_uppercase() {
        return None;
    }
    if chars.next().is_some_and(char::is_uppercase) {
        return Some(rest.to_string());
    }
    let mut name: String = first.to_lowercase().collect();
    name.push_str(&rest[first.len_utf8()..]);
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{ConstructorFacts, FieldFacts, MethodFacts};

    #[test]
    fn test_accessor_property_names() {
        assert_eq!(accessor_property("getX", "get").as_deref(), Some("x"));
        assert_eq!(accessor_property("getFooBar", "get").as_deref(), Some("fooBar"));
        assert_eq!(accessor_property("getURL", "get").as_deref(), Some("URL"));
        assert_eq!(accessor_property("isActive", "is").as_deref(), Some("active"));
        assert_eq!(accessor_property("get", "get"), None);
        assert_eq!(accessor_property("getter", "get"), None);
        assert_eq!(accessor_property("size", "get"), None);
    }

    #[test]
    fn test_collect_merges_accessors_and_fields() {
        let facts = TypeFacts::new("Point")
            .constructor(ConstructorFacts::new(Vec::new()))
            .method(MethodFacts::new("getX", Vec::new()).returns("int"))
            .method(MethodFacts::new(
                "setX",
                vec![ParamShape::Type(TypeExpr::named("int"))],
            ))
            .method(MethodFacts::new("getLabel", Vec::new()).returns("String"))
            .method(MethodFacts::new("isVisible", Vec::new()).returns("boolean"))
            .method(MethodFacts::new("isNamed", Vec::new()).returns("String"))
            .method(
                MethodFacts::new("getSecret", Vec::new())
                    .returns("String")
                    .tag(MemberTag::Ignore),
            )
            .method(
                MethodFacts::new("getCount", Vec::new())
                    .returns("int")
                    .static_fn(),
            )
            .field(FieldFacts::new("y", "int"))
            .field(FieldFacts::new("hidden", "int").visibility(crate::facts::Visibility::Private));

        let drafts = PropertyIntrospector::collect(&facts);
        let summary: Vec<(&str, bool)> = drafts
            .iter()
            .map(|d| (d.name.as_str(), d.writable))
            .collect();
        assert_eq!(
            summary,
            [("x", true), ("label", false), ("visible", false), ("y", true)]
        );
    }
}
