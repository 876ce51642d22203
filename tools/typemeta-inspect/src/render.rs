// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Descriptor summaries for terminal and JSON output.

use serde::Serialize;
use std::fmt::Write as _;
use typemeta::construction::ConstructionStrategies;
use typemeta::transform::BindingOrigin;
use typemeta::{BuildState, MarshalContext, StrategyKind, TypeDescriptor};

const STRATEGIES: [StrategyKind; 4] = [
    StrategyKind::NoArg,
    StrategyKind::FromText,
    StrategyKind::FromNumber,
    StrategyKind::FromSurrogate,
];

#[derive(Debug, Serialize)]
pub struct Summary {
    pub expr: String,
    pub category: String,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    pub flags: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implementation: Option<String>,
    pub ancestors: Vec<String>,
    pub strategies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformSummary>,
    pub properties: Vec<PropertySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_a_bean: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TransformSummary {
    pub surrogate: String,
    pub score: u32,
    pub origin: String,
    pub reversible: bool,
}

#[derive(Debug, Serialize)]
pub struct PropertySummary {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub read_only: bool,
}

impl Summary {
    pub fn of(desc: &TypeDescriptor, ctx: &MarshalContext) -> Self {
        let (state, failure) = match desc.state() {
            BuildState::InProgress => ("in-progress", None),
            BuildState::Ready => ("ready", None),
            BuildState::Failed(reason) => ("failed", Some(reason.to_string())),
        };

        let mut flags = Vec::new();
        for (set, label) in [
            (desc.is_abstract(), "abstract"),
            (desc.is_interface(), "interface"),
            (desc.is_primitive(), "primitive"),
            (desc.is_delegate(), "delegate"),
            (desc.requires_enclosing(), "nested"),
            (desc.is_remoteable(), "remoteable"),
        ] {
            if set {
                flags.push(label);
            }
        }

        let transform = desc.resolve_transform(ctx).map(|t| TransformSummary {
            surrogate: t.surrogate_type().to_string(),
            score: t.score(),
            origin: origin_label(t.origin()),
            reversible: t.can_reverse(),
        });

        let properties = desc
            .bean_shape()
            .map(|shape| {
                shape
                    .properties
                    .iter()
                    .map(|p| PropertySummary {
                        name: p.name.clone(),
                        ty: p.ty.to_string(),
                        read_only: p.read_only,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            expr: desc.to_string(),
            category: desc.category().to_string(),
            state: state.to_string(),
            failure,
            flags,
            element: desc.element_ref().map(ToString::to_string),
            key: desc.key_ref().map(ToString::to_string),
            value: desc.value_ref().map(ToString::to_string),
            implementation: desc.implementation().map(ToString::to_string),
            ancestors: desc.ancestors().iter().map(ToString::to_string).collect(),
            strategies: strategies(desc.construction()),
            transform,
            properties,
            not_a_bean: desc.not_a_bean_reason().map(str::to_string),
        }
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.expr);
        let _ = writeln!(out, "  category:       {}", self.category);
        let _ = writeln!(out, "  state:          {}", self.state);
        if let Some(failure) = &self.failure {
            let _ = writeln!(out, "  failure:        {failure}");
        }
        if !self.flags.is_empty() {
            let _ = writeln!(out, "  flags:          {}", self.flags.join(", "));
        }
        for (label, value) in [
            ("element", &self.element),
            ("key", &self.key),
            ("value", &self.value),
            ("implementation", &self.implementation),
        ] {
            if let Some(value) = value {
                let _ = writeln!(out, "  {:<15} {value}", format!("{label}:"));
            }
        }
        if !self.ancestors.is_empty() {
            let _ = writeln!(out, "  ancestors:      {}", self.ancestors.join(", "));
        }
        if !self.strategies.is_empty() {
            let _ = writeln!(out, "  construction:   {}", self.strategies.join(", "));
        }
        if let Some(t) = &self.transform {
            let _ = writeln!(
                out,
                "  transform:      -> {} (score {}, {}{})",
                t.surrogate,
                t.score,
                t.origin,
                if t.reversible { ", reversible" } else { "" }
            );
        }
        match &self.not_a_bean {
            Some(reason) => {
                let _ = writeln!(out, "  bean:           no ({reason})");
            }
            None => {
                let _ = writeln!(out, "  bean:           {} properties", self.properties.len());
                for p in &self.properties {
                    let _ = writeln!(
                        out,
                        "    {}: {}{}",
                        p.name,
                        p.ty,
                        if p.read_only { " (read-only)" } else { "" }
                    );
                }
            }
        }
        out
    }
}

fn strategies(construction: &ConstructionStrategies) -> Vec<String> {
    STRATEGIES
        .iter()
        .filter(|kind| construction.has(**kind))
        .map(|kind| {
            if construction.can_construct(*kind) {
                kind.to_string()
            } else {
                format!("{kind} (needs enclosing instance)")
            }
        })
        .collect()
}

fn origin_label(origin: &BindingOrigin) -> String {
    match origin {
        BindingOrigin::SwapMethod => "swap method".to_string(),
        BindingOrigin::Registered => "registered".to_string(),
        BindingOrigin::Inherited(from) => format!("inherited from {from}"),
        BindingOrigin::Declared(name) => format!("declared '{name}'"),
    }
}
