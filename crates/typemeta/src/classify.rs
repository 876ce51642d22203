// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type classification.
//!
//! A closed, ordered rule table maps structural facts to exactly one
//! [`Category`]. Rules are tried top to bottom and the first match wins, so a
//! type that is both a text sequence and an element container is a text
//! sequence, and a floating number is never reported as integral.

use crate::facts::{Marker, Scalar, TypeFacts};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shape category of a described type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Boolean,
    Char,
    Integral,
    Floating,
    /// The exact text type.
    Text,
    /// Character sequences other than the exact text type.
    TextSequence,
    Temporal,
    Uri,
    CharInput,
    BinaryInput,
    BinaryOutput,
    Array,
    ElementContainer,
    PairContainer,
    /// Pair container exposing the properties of a bean.
    BeanMap,
    Enumerable,
    /// Types whose values are type identities.
    ClassLike,
    FunctionLike,
    /// The root "any" type.
    Object,
    Void,
    /// Ordered argument list; never produced by [`classify`].
    ArgumentList,
    Other,
}

impl Category {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Char => "char",
            Self::Integral => "integral",
            Self::Floating => "floating",
            Self::Text => "text",
            Self::TextSequence => "text-sequence",
            Self::Temporal => "temporal",
            Self::Uri => "uri",
            Self::CharInput => "char-input",
            Self::BinaryInput => "binary-input",
            Self::BinaryOutput => "binary-output",
            Self::Array => "array",
            Self::ElementContainer => "element-container",
            Self::PairContainer => "pair-container",
            Self::BeanMap => "bean-map",
            Self::Enumerable => "enumerable",
            Self::ClassLike => "class-like",
            Self::FunctionLike => "function-like",
            Self::Object => "object",
            Self::Void => "void",
            Self::ArgumentList => "argument-list",
            Self::Other => "other",
        }
    }

    #[must_use]
    pub fn is_number(self) -> bool {
        matches!(self, Self::Integral | Self::Floating)
    }

    #[must_use]
    pub fn is_text(self) -> bool {
        matches!(self, Self::Text | Self::TextSequence)
    }

    #[must_use]
    pub fn is_pair_container(self) -> bool {
        matches!(self, Self::PairContainer | Self::BeanMap)
    }

    #[must_use]
    pub fn is_collection_or_array(self) -> bool {
        matches!(self, Self::ElementContainer | Self::Array)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Rule {
    category: Category,
    matches: fn(&TypeFacts) -> bool,
}

fn scalar_is(facts: &TypeFacts, pred: fn(Scalar) -> bool) -> bool {
    facts.scalar.is_some_and(pred)
}

const RULES: &[Rule] = &[
    Rule {
        category: Category::Boolean,
        matches: |f| f.scalar == Some(Scalar::Bool),
    },
    Rule {
        category: Category::Char,
        matches: |f| f.scalar == Some(Scalar::Char),
    },
    Rule {
        category: Category::Void,
        matches: |f| f.scalar == Some(Scalar::Void),
    },
    Rule {
        category: Category::Integral,
        matches: |f| scalar_is(f, Scalar::is_integral),
    },
    Rule {
        category: Category::Floating,
        matches: |f| scalar_is(f, Scalar::is_floating),
    },
    Rule {
        category: Category::Object,
        matches: |f| f.has(Marker::Root),
    },
    Rule {
        category: Category::Enumerable,
        matches: |f| f.has(Marker::Enum),
    },
    Rule {
        category: Category::ClassLike,
        matches: |f| f.has(Marker::TypeToken),
    },
    Rule {
        category: Category::FunctionLike,
        matches: |f| f.has(Marker::Callable),
    },
    Rule {
        category: Category::Text,
        matches: |f| f.has(Marker::Text),
    },
    Rule {
        category: Category::TextSequence,
        matches: |f| f.has(Marker::TextSequence),
    },
    Rule {
        category: Category::Floating,
        matches: |f| f.has(Marker::Number) && f.has(Marker::FloatingPoint),
    },
    Rule {
        category: Category::Integral,
        matches: |f| f.has(Marker::Number),
    },
    Rule {
        category: Category::ElementContainer,
        matches: |f| f.has(Marker::ElementContainer),
    },
    Rule {
        category: Category::BeanMap,
        matches: |f| f.has(Marker::PairContainer) && f.has(Marker::BeanMapView),
    },
    Rule {
        category: Category::PairContainer,
        matches: |f| f.has(Marker::PairContainer),
    },
    Rule {
        category: Category::Temporal,
        matches: |f| f.has(Marker::Temporal),
    },
    Rule {
        category: Category::Array,
        matches: |f| f.array_of.is_some(),
    },
    Rule {
        category: Category::Uri,
        matches: |f| f.has(Marker::Uri),
    },
    Rule {
        category: Category::CharInput,
        matches: |f| f.has(Marker::CharInput),
    },
    Rule {
        category: Category::BinaryInput,
        matches: |f| f.has(Marker::BinaryInput),
    },
    Rule {
        category: Category::BinaryOutput,
        matches: |f| f.has(Marker::BinaryOutput),
    },
];

/// Classify a type from its facts. Pure and total.
#[must_use]
pub fn classify(facts: &TypeFacts) -> Category {
    RULES
        .iter()
        .find(|rule| (rule.matches)(facts))
        .map_or(Category::Other, |rule| rule.category)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::core_types;

    #[test]
    fn test_core_types() {
        let expected = [
            ("Object", Category::Object),
            ("String", Category::Text),
            ("CharSequence", Category::TextSequence),
            ("Number", Category::Integral),
            ("boolean", Category::Boolean),
            ("Character", Category::Char),
            ("int", Category::Integral),
            ("Long", Category::Integral),
            ("Float", Category::Floating),
            ("double", Category::Floating),
            ("Void", Category::Void),
        ];
        let core = core_types();
        for (name, category) in expected {
            let facts = core
                .iter()
                .find(|f| f.name.as_str() == name)
                .expect("core type present");
            assert_eq!(classify(facts), category, "{name}");
        }
    }

    #[test]
    fn test_first_match_wins() {
        let seq_and_list = TypeFacts::new("Rope")
            .marker(Marker::TextSequence)
            .marker(Marker::ElementContainer);
        assert_eq!(classify(&seq_and_list), Category::TextSequence);

        let decimal = TypeFacts::new("BigDecimal")
            .marker(Marker::Number)
            .marker(Marker::FloatingPoint);
        assert_eq!(classify(&decimal), Category::Floating);

        let props = TypeFacts::new("BeanProps")
            .marker(Marker::PairContainer)
            .marker(Marker::BeanMapView);
        assert_eq!(classify(&props), Category::BeanMap);

        let uri_list = TypeFacts::new("Links")
            .marker(Marker::Uri)
            .marker(Marker::ElementContainer);
        assert_eq!(classify(&uri_list), Category::ElementContainer);

        let enum_token = TypeFacts::new("Kind")
            .marker(Marker::Enum)
            .marker(Marker::TypeToken);
        assert_eq!(classify(&enum_token), Category::Enumerable);
    }

    #[test]
    fn test_delegate_is_not_a_category() {
        let facts = TypeFacts::new("Optional").marker(Marker::Delegate);
        assert_eq!(classify(&facts), Category::Other);
    }

    #[test]
    fn test_array_and_streams() {
        assert_eq!(
            classify(&TypeFacts::new("int[]").array_of("int")),
            Category::Array
        );
        assert_eq!(
            classify(&TypeFacts::new("Reader").marker(Marker::CharInput)),
            Category::CharInput
        );
        assert_eq!(
            classify(&TypeFacts::new("InputStream").marker(Marker::BinaryInput)),
            Category::BinaryInput
        );
        assert_eq!(
            classify(&TypeFacts::new("OutputStream").marker(Marker::BinaryOutput)),
            Category::BinaryOutput
        );
    }

    #[test]
    fn test_total_and_deterministic() {
        let markers = [
            Marker::Root,
            Marker::Enum,
            Marker::TypeToken,
            Marker::Callable,
            Marker::Text,
            Marker::TextSequence,
            Marker::Number,
            Marker::FloatingPoint,
            Marker::ElementContainer,
            Marker::PairContainer,
            Marker::BeanMapView,
            Marker::Temporal,
            Marker::Uri,
            Marker::CharInput,
            Marker::BinaryInput,
            Marker::BinaryOutput,
            Marker::Delegate,
        ];
        let mut rng = fastrand::Rng::with_seed(0x7e5e);
        for i in 0..500 {
            let mut facts = TypeFacts::new(format!("Random{i}"));
            for marker in markers {
                if rng.bool() {
                    facts = facts.marker(marker);
                }
            }
            if rng.u8(..) < 32 {
                facts = facts.array_of("Object");
            }
            let first = classify(&facts);
            assert_eq!(first, classify(&facts));
            assert_ne!(first, Category::ArgumentList);
        }
    }
}
