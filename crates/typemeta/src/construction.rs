// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Construction strategies.
//!
//! Up to four independent ways of creating a value are discovered from the
//! facts of a type. Only public, non-deprecated members count. A missing
//! strategy is a capability gap reported by [`ConstructionStrategies::can_construct`];
//! it only becomes an error when the caller asks for it anyway.

use crate::classify::Category;
use crate::error::{Error, Result};
use crate::facts::{is_subtype, ParamShape, TypeFacts, TypeFactsProvider, TypeName};
use crate::value::{Arg, Instance, Invoker, Number, NumberKind};
use std::any::Any;
use std::fmt;

/// Static factory names tried for from-text construction, in priority order.
pub const TEXT_FACTORY_NAMES: [&str; 7] = [
    "fromString",
    "fromValue",
    "valueOf",
    "parse",
    "parseString",
    "forName",
    "forString",
];

/// Name of the static reverse function paired with a `swap` method.
pub const UNSWAP_METHOD: &str = "unswap";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    NoArg,
    FromText,
    FromNumber,
    FromSurrogate,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoArg => "no-arg",
            Self::FromText => "from-text",
            Self::FromNumber => "from-number",
            Self::FromSurrogate => "from-surrogate",
        })
    }
}

#[derive(Debug, Clone)]
pub struct NoArgRecipe {
    /// Type whose constructor is used; differs from the owner when an
    /// implementation type is configured.
    pub source: TypeName,
    pub requires_enclosing: bool,
    invoker: Option<Invoker>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextSource {
    /// Static factory method with the given name.
    Factory(String),
    Constructor,
}

#[derive(Debug, Clone)]
pub struct TextRecipe {
    pub source: TextSource,
    invoker: Option<Invoker>,
}

#[derive(Debug, Clone)]
pub struct NumberRecipe {
    pub kind: NumberKind,
    invoker: Option<Invoker>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurrogateSource {
    Constructor,
    /// Static `unswap` function.
    Unswap,
}

#[derive(Debug, Clone)]
pub struct SurrogateRecipe {
    pub surrogate: TypeName,
    pub source: SurrogateSource,
    invoker: Option<Invoker>,
}

impl SurrogateRecipe {
    pub(crate) fn build(&self, owner: &TypeName, value: &dyn Any) -> Result<Instance> {
        call(
            owner,
            self.invoker.as_ref(),
            &[Arg::Value(value)],
            "from-surrogate recipe",
        )
    }
}

/// Inputs to strategy discovery beyond the type's own facts.
pub struct DiscoveryContext<'a> {
    /// Configured implementation type, searched for the no-argument constructor.
    pub implementation: Option<&'a TypeFacts>,
    pub root_type: &'a TypeName,
    /// Surrogate types of the transforms applicable to the type.
    pub surrogates: &'a [TypeName],
    /// Used to decide whether a parameter accepts a surrogate subtype.
    /// Without a provider only exact matches count.
    pub provider: Option<&'a dyn TypeFactsProvider>,
}

impl DiscoveryContext<'_> {
    fn accepts(&self, param: &TypeName, surrogate: &TypeName) -> bool {
        match self.provider {
            Some(provider) => is_subtype(provider, surrogate, param),
            None => param == surrogate,
        }
    }
}

/// The construction recipes discovered for one type.
#[derive(Debug, Clone)]
pub struct ConstructionStrategies {
    owner: TypeName,
    requires_enclosing: bool,
    no_arg: Option<NoArgRecipe>,
    from_text: Option<TextRecipe>,
    from_number: Option<NumberRecipe>,
    from_surrogate: Vec<SurrogateRecipe>,
}

impl ConstructionStrategies {
    /// No strategies at all.
    #[must_use]
    pub fn none(owner: TypeName) -> Self {
        Self {
            owner,
            requires_enclosing: false,
            no_arg: None,
            from_text: None,
            from_number: None,
            from_surrogate: Vec::new(),
        }
    }

    #[must_use]
    pub fn discover(facts: &TypeFacts, category: Category, ctx: &DiscoveryContext<'_>) -> Self {
        let mut out = Self::none(facts.name.clone());
        out.requires_enclosing = facts.requires_enclosing;
        out.no_arg = find_no_arg(facts, ctx);

        let skip = usize::from(facts.requires_enclosing);
        let mut text_ctor = None;
        for ctor in facts.constructors.iter().filter(|c| c.is_usable()) {
            let Some([param]) = ctor.params.get(skip..) else {
                continue;
            };
            match param {
                ParamShape::Text => {
                    if text_ctor.is_none() {
                        text_ctor = Some(TextRecipe {
                            source: TextSource::Constructor,
                            invoker: ctor.invoker.clone(),
                        });
                    }
                }
                ParamShape::Number(kind) => {
                    if category != Category::Integral && out.from_number.is_none() {
                        out.from_number = Some(NumberRecipe {
                            kind: *kind,
                            invoker: ctor.invoker.clone(),
                        });
                    }
                }
                ParamShape::Type(expr) if !facts.requires_enclosing => {
                    for surrogate in ctx.surrogates {
                        if out.surrogate_recipe(surrogate).is_none()
                            && ctx.accepts(&expr.name, surrogate)
                        {
                            out.from_surrogate.push(SurrogateRecipe {
                                surrogate: surrogate.clone(),
                                source: SurrogateSource::Constructor,
                                invoker: ctor.invoker.clone(),
                            });
                        }
                    }
                }
                _ => {}
            }
        }

        out.from_text = find_text_factory(facts).or(text_ctor);

        for method in facts.methods.iter().filter(|m| {
            m.is_static && m.is_usable() && m.name == UNSWAP_METHOD && returns_self(facts, m)
        }) {
            let surrogate = match method.params.as_slice() {
                [ParamShape::Session, ParamShape::Type(expr)] | [ParamShape::Type(expr)] => {
                    &expr.name
                }
                _ => continue,
            };
            if out.surrogate_recipe(surrogate).is_none() {
                out.from_surrogate.push(SurrogateRecipe {
                    surrogate: surrogate.clone(),
                    source: SurrogateSource::Unswap,
                    invoker: method.invoker.clone(),
                });
            }
        }

        out
    }

    #[must_use]
    pub fn owner(&self) -> &TypeName {
        &self.owner
    }

    #[must_use]
    pub fn requires_enclosing(&self) -> bool {
        self.requires_enclosing
    }

    #[must_use]
    pub fn no_arg(&self) -> Option<&NoArgRecipe> {
        self.no_arg.as_ref()
    }

    #[must_use]
    pub fn from_text(&self) -> Option<&TextRecipe> {
        self.from_text.as_ref()
    }

    #[must_use]
    pub fn from_number(&self) -> Option<&NumberRecipe> {
        self.from_number.as_ref()
    }

    #[must_use]
    pub fn from_surrogate(&self) -> &[SurrogateRecipe] {
        &self.from_surrogate
    }

    #[must_use]
    pub fn surrogate_recipe(&self, surrogate: &TypeName) -> Option<&SurrogateRecipe> {
        self.from_surrogate
            .iter()
            .find(|r| &r.surrogate == surrogate)
    }

    /// Whether a strategy is present at all, ignoring enclosing-instance needs.
    #[must_use]
    pub fn has(&self, kind: StrategyKind) -> bool {
        match kind {
            StrategyKind::NoArg => self.no_arg.is_some(),
            StrategyKind::FromText => self.from_text.is_some(),
            StrategyKind::FromNumber => self.from_number.is_some(),
            StrategyKind::FromSurrogate => !self.from_surrogate.is_empty(),
        }
    }

    /// Whether a strategy can be used without an enclosing instance.
    #[must_use]
    pub fn can_construct(&self, kind: StrategyKind) -> bool {
        match kind {
            StrategyKind::NoArg => self.no_arg.as_ref().is_some_and(|r| !r.requires_enclosing),
            StrategyKind::FromText => self.from_text.as_ref().is_some_and(|r| {
                matches!(r.source, TextSource::Factory(_)) || !self.requires_enclosing
            }),
            StrategyKind::FromNumber => self.from_number.is_some() && !self.requires_enclosing,
            StrategyKind::FromSurrogate => !self.from_surrogate.is_empty(),
        }
    }

    pub fn new_instance(&self, outer: Option<&dyn Any>) -> Result<Instance> {
        let recipe = self.no_arg.as_ref().ok_or_else(|| {
            Error::instantiation(&self.owner, "no accessible no-argument constructor")
        })?;
        let args: Vec<Arg<'_>> = self
            .enclosing(recipe.requires_enclosing, outer)?
            .into_iter()
            .collect();
        call(&self.owner, recipe.invoker.as_ref(), &args, "no-arg constructor")
    }

    pub fn new_instance_from_text(&self, outer: Option<&dyn Any>, text: &str) -> Result<Instance> {
        let recipe = self.from_text.as_ref().ok_or_else(|| {
            Error::instantiation(&self.owner, "no from-text factory or constructor")
        })?;
        let what = match &recipe.source {
            TextSource::Factory(name) => {
                return call(
                    &self.owner,
                    recipe.invoker.as_ref(),
                    &[Arg::Text(text)],
                    &format!("{name} factory"),
                );
            }
            TextSource::Constructor => "text constructor",
        };
        let args: Vec<Arg<'_>> = self
            .enclosing(self.requires_enclosing, outer)?
            .into_iter()
            .chain([Arg::Text(text)])
            .collect();
        call(&self.owner, recipe.invoker.as_ref(), &args, what)
    }

    pub fn new_instance_from_number(
        &self,
        outer: Option<&dyn Any>,
        number: Number,
    ) -> Result<Instance> {
        let recipe = self
            .from_number
            .as_ref()
            .ok_or_else(|| Error::instantiation(&self.owner, "no numeric constructor"))?;
        let number = Arg::Number(number.coerce(recipe.kind));
        let args: Vec<Arg<'_>> = self
            .enclosing(self.requires_enclosing, outer)?
            .into_iter()
            .chain([number])
            .collect();
        call(&self.owner, recipe.invoker.as_ref(), &args, "numeric constructor")
    }

    pub fn new_instance_from_surrogate(
        &self,
        surrogate: &TypeName,
        value: &dyn Any,
    ) -> Result<Instance> {
        let recipe = self.surrogate_recipe(surrogate).ok_or_else(|| {
            Error::instantiation(
                &self.owner,
                format!("no constructor or unswap function accepting '{surrogate}'"),
            )
        })?;
        recipe.build(&self.owner, value)
    }

    fn enclosing<'a>(&self, required: bool, outer: Option<&'a dyn Any>) -> Result<Option<Arg<'a>>> {
        match (required, outer) {
            (true, Some(outer)) => Ok(Some(Arg::Enclosing(outer))),
            (true, None) => Err(Error::instantiation(
                &self.owner,
                "nested type requires an enclosing instance",
            )),
            (false, _) => Ok(None),
        }
    }
}

fn returns_self(facts: &TypeFacts, method: &crate::facts::MethodFacts) -> bool {
    method
        .returns
        .as_ref()
        .is_some_and(|r| r.name == facts.name)
}

fn find_no_arg(facts: &TypeFacts, ctx: &DiscoveryContext<'_>) -> Option<NoArgRecipe> {
    if facts.name == *ctx.root_type || facts.has(crate::facts::Marker::Root) {
        return None;
    }
    let target = ctx.implementation.unwrap_or(facts);
    if target.is_abstract {
        return None;
    }
    let arity = usize::from(target.requires_enclosing);
    target
        .constructors
        .iter()
        .find(|c| c.is_usable() && c.params.len() == arity)
        .map(|c| NoArgRecipe {
            source: target.name.clone(),
            requires_enclosing: target.requires_enclosing,
            invoker: c.invoker.clone(),
        })
}

fn find_text_factory(facts: &TypeFacts) -> Option<TextRecipe> {
    TEXT_FACTORY_NAMES.iter().find_map(|name| {
        facts
            .methods
            .iter()
            .find(|m| {
                m.is_static
                    && m.is_usable()
                    && m.name == *name
                    && m.params == [ParamShape::Text]
                    && returns_self(facts, m)
            })
            .map(|m| TextRecipe {
                source: TextSource::Factory(m.name.clone()),
                invoker: m.invoker.clone(),
            })
    })
}

fn call(
    owner: &TypeName,
    invoker: Option<&Invoker>,
    args: &[Arg<'_>],
    what: &str,
) -> Result<Instance> {
    let invoker = invoker
        .ok_or_else(|| Error::instantiation(owner, format!("no invoker bound to the {what}")))?;
    invoker
        .invoke(args)
        .map_err(|reason| Error::instantiation(owner, format!("{what} failed: {reason}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{ConstructorFacts, FactsTable, MethodFacts, Visibility};
    use crate::type_expr::TypeExpr;

    fn root() -> TypeName {
        TypeName::from("Object")
    }

    fn discover(facts: &TypeFacts, category: Category) -> ConstructionStrategies {
        let root = root();
        let ctx = DiscoveryContext {
            implementation: None,
            root_type: &root,
            surrogates: &[],
            provider: None,
        };
        ConstructionStrategies::discover(facts, category, &ctx)
    }

    fn tagged(label: &'static str) -> Invoker {
        Invoker::new(move |_| Ok(Box::new(label) as Instance))
    }

    fn label(out: Instance) -> &'static str {
        *out.downcast::<&'static str>().expect("label")
    }

    #[test]
    fn test_factory_beats_text_constructor() {
        let factory = MethodFacts::new("parse", vec![ParamShape::Text])
            .returns("Money")
            .static_fn()
            .invoker(tagged("parse"));
        let ctor = ConstructorFacts::new(vec![ParamShape::Text]).invoker(tagged("ctor"));

        let ctor_first = TypeFacts::new("Money")
            .constructor(ctor.clone())
            .method(factory.clone());
        let factory_first = TypeFacts::new("Money").method(factory).constructor(ctor);

        for facts in [ctor_first, factory_first] {
            let strategies = discover(&facts, Category::Other);
            assert_eq!(
                strategies.from_text().map(|r| r.source.clone()),
                Some(TextSource::Factory("parse".into()))
            );
            let out = strategies.new_instance_from_text(None, "12.50 EUR").expect("parse");
            assert_eq!(label(out), "parse");
        }
    }

    #[test]
    fn test_factory_name_priority() {
        let facts = TypeFacts::new("Code")
            .method(
                MethodFacts::new("parse", vec![ParamShape::Text])
                    .returns("Code")
                    .static_fn(),
            )
            .method(
                MethodFacts::new("valueOf", vec![ParamShape::Text])
                    .returns("Code")
                    .static_fn(),
            );
        let strategies = discover(&facts, Category::Other);
        assert_eq!(
            strategies.from_text().map(|r| r.source.clone()),
            Some(TextSource::Factory("valueOf".into()))
        );
    }

    #[test]
    fn test_factory_requirements() {
        let facts = TypeFacts::new("Code")
            .method(MethodFacts::new("fromString", vec![ParamShape::Text]).returns("Code"))
            .method(
                MethodFacts::new("fromValue", vec![ParamShape::Text])
                    .returns("Other")
                    .static_fn(),
            )
            .method(
                MethodFacts::new("valueOf", vec![ParamShape::Text])
                    .returns("Code")
                    .static_fn()
                    .deprecated(),
            )
            .method(
                MethodFacts::new("parse", vec![ParamShape::Text])
                    .returns("Code")
                    .static_fn()
                    .visibility(Visibility::Private),
            )
            .method(
                MethodFacts::new("forName", vec![ParamShape::Text, ParamShape::Text])
                    .returns("Code")
                    .static_fn(),
            );
        let strategies = discover(&facts, Category::Other);
        assert!(strategies.from_text().is_none());
        assert!(!strategies.can_construct(StrategyKind::FromText));

        let err = strategies.new_instance_from_text(None, "x").unwrap_err();
        assert!(matches!(err, Error::Instantiation { .. }));
    }

    #[test]
    fn test_no_arg_rules() {
        let ctor = ConstructorFacts::new(Vec::new()).invoker(tagged("new"));

        let plain = TypeFacts::new("Point").constructor(ctor.clone());
        let strategies = discover(&plain, Category::Other);
        assert!(strategies.can_construct(StrategyKind::NoArg));
        assert_eq!(label(strategies.new_instance(None).expect("new")), "new");

        let abstract_type = TypeFacts::new("Shape").abstract_type().constructor(ctor.clone());
        assert!(!discover(&abstract_type, Category::Other).has(StrategyKind::NoArg));

        let object = TypeFacts::new("Object").constructor(ctor.clone());
        assert!(!discover(&object, Category::Object).has(StrategyKind::NoArg));

        let hidden = TypeFacts::new("Hidden")
            .constructor(ConstructorFacts::new(Vec::new()).visibility(Visibility::Protected));
        assert!(!discover(&hidden, Category::Other).has(StrategyKind::NoArg));
    }

    #[test]
    fn test_implementation_supplies_no_arg() {
        let root = root();
        let iface = TypeFacts::new("Shape").interface();
        let imp = TypeFacts::new("Circle")
            .supertype("Shape")
            .constructor(ConstructorFacts::new(Vec::new()).invoker(tagged("circle")));
        let ctx = DiscoveryContext {
            implementation: Some(&imp),
            root_type: &root,
            surrogates: &[],
            provider: None,
        };
        let strategies = ConstructionStrategies::discover(&iface, Category::Other, &ctx);
        assert_eq!(
            strategies.no_arg().map(|r| r.source.as_str()),
            Some("Circle")
        );
        assert_eq!(label(strategies.new_instance(None).expect("new")), "circle");
    }

    #[test]
    fn test_nested_type_needs_enclosing_instance() {
        let facts = TypeFacts::new("Outer.Inner")
            .nested()
            .constructor(
                ConstructorFacts::new(vec![ParamShape::Type(TypeExpr::named("Outer"))]).invoker(
                    Invoker::new(|args| {
                        let outer = args
                            .first()
                            .and_then(|a| a.downcast::<u32>())
                            .ok_or_else(|| "missing outer".to_string())?;
                        Ok(Box::new(*outer + 1) as Instance)
                    }),
                ),
            )
            .constructor(ConstructorFacts::new(vec![
                ParamShape::Type(TypeExpr::named("Outer")),
                ParamShape::Text,
            ]));
        let strategies = discover(&facts, Category::Other);

        assert!(strategies.has(StrategyKind::NoArg));
        assert!(!strategies.can_construct(StrategyKind::NoArg));
        assert!(strategies.has(StrategyKind::FromText));
        assert!(!strategies.can_construct(StrategyKind::FromText));

        assert!(strategies.new_instance(None).is_err());
        let outer = 41u32;
        let out = strategies.new_instance(Some(&outer)).expect("inner");
        assert_eq!(out.downcast_ref::<u32>(), Some(&42));
    }

    #[test]
    fn test_first_numeric_constructor_wins() {
        let facts = TypeFacts::new("Amount")
            .constructor(
                ConstructorFacts::new(vec![ParamShape::Number(NumberKind::Long)]).invoker(
                    Invoker::new(|args| match args.first().and_then(Arg::as_number) {
                        Some(Number::Int(v)) => Ok(Box::new(v) as Instance),
                        other => Err(format!("unexpected {other:?}")),
                    }),
                ),
            )
            .constructor(ConstructorFacts::new(vec![ParamShape::Number(NumberKind::Double)]));
        let strategies = discover(&facts, Category::Other);
        assert_eq!(strategies.from_number().map(|r| r.kind), Some(NumberKind::Long));

        let out = strategies
            .new_instance_from_number(None, Number::Float(7.9))
            .expect("numeric");
        assert_eq!(out.downcast_ref::<i64>(), Some(&7));

        assert!(!discover(&facts, Category::Integral).has(StrategyKind::FromNumber));
    }

    #[test]
    fn test_surrogate_constructor_and_unswap() {
        let root = root();
        let table = FactsTable::new()
            .with(TypeFacts::new("CharSequence"))
            .with(TypeFacts::new("String").supertype("CharSequence"));
        let surrogates = [TypeName::from("String"), TypeName::from("Long")];
        let facts = TypeFacts::new("Id")
            .constructor(
                ConstructorFacts::new(vec![ParamShape::Type(TypeExpr::named("CharSequence"))])
                    .invoker(tagged("from-chars")),
            )
            .method(
                MethodFacts::new(
                    UNSWAP_METHOD,
                    vec![ParamShape::Session, ParamShape::Type(TypeExpr::named("Long"))],
                )
                .returns("Id")
                .static_fn()
                .invoker(tagged("unswap")),
            );
        let ctx = DiscoveryContext {
            implementation: None,
            root_type: &root,
            surrogates: &surrogates,
            provider: Some(&table),
        };
        let strategies = ConstructionStrategies::discover(&facts, Category::Other, &ctx);

        let kinds: Vec<(String, SurrogateSource)> = strategies
            .from_surrogate()
            .iter()
            .map(|r| (r.surrogate.to_string(), r.source))
            .collect();
        assert_eq!(
            kinds,
            [
                ("String".to_string(), SurrogateSource::Constructor),
                ("Long".to_string(), SurrogateSource::Unswap),
            ]
        );

        let text = String::from("abc");
        let out = strategies
            .new_instance_from_surrogate(&"String".into(), &text)
            .expect("from surrogate");
        assert_eq!(label(out), "from-chars");
        assert!(strategies
            .new_instance_from_surrogate(&"Other".into(), &text)
            .is_err());
    }

    #[test]
    fn test_loaded_facts_without_invoker() {
        let facts = TypeFacts::new("Point").constructor(ConstructorFacts::new(Vec::new()));
        let strategies = discover(&facts, Category::Other);
        assert!(strategies.can_construct(StrategyKind::NoArg));
        let err = strategies.new_instance(None).unwrap_err();
        assert!(err.to_string().contains("no invoker"));
    }
}
