//! Core types shared by the classifier and the renderers

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical CSS property name(s) a short name resolves to.
///
/// Paired shorthands such as `px` map to several properties that all receive
/// the same value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CssProperty {
    Single(String),
    Multiple(Vec<String>),
}

impl CssProperty {
    pub fn names(&self) -> Vec<&str> {
        match self {
            CssProperty::Single(name) => vec![name.as_str()],
            CssProperty::Multiple(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for CssProperty {
    fn from(name: &str) -> Self {
        CssProperty::Single(name.to_string())
    }
}

impl From<&[&str]> for CssProperty {
    fn from(names: &[&str]) -> Self {
        CssProperty::Multiple(names.iter().map(|n| n.to_string()).collect())
    }
}

impl fmt::Display for CssProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names().join(", "))
    }
}

/// Short name -> canonical CSS property name(s).
pub type PropertyTable = IndexMap<String, CssProperty>;

/// Breakpoint name -> media query condition, e.g. `Phone` -> `(max-width: 767px)`.
pub type BreakpointTable = IndexMap<String, String>;

/// Named values that plain literals may refer to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub colors: IndexMap<String, String>,
    pub spacing: IndexMap<String, String>,
}

impl Theme {
    /// Resolve a theme name to its value; colors take precedence over spacing.
    pub fn resolve<'a>(&'a self, value: &'a str) -> &'a str {
        self.colors
            .get(value)
            .or_else(|| self.spacing.get(value))
            .map(String::as_str)
            .unwrap_or(value)
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty() && self.spacing.is_empty()
    }
}

/// One value bound to a media condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRule {
    pub value: String,
    pub breakpoint: String,
    pub media: String,
}

/// The value form a token was classified into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedToken {
    Literal {
        property: CssProperty,
        value: String,
    },
    Responsive {
        property: CssProperty,
        base_value: Option<String>,
        rules: Vec<MediaRule>,
    },
    MediaQuery {
        property: CssProperty,
        rules: Vec<MediaRule>,
    },
    Clamp {
        property: CssProperty,
        value: String,
    },
    Calc {
        property: CssProperty,
        value: String,
    },
    RgbColor {
        property: CssProperty,
        value: String,
    },
    Unrecognized,
}

impl ClassifiedToken {
    /// Property and value for the variants rendered as a single unconditional rule.
    pub fn unconditional(&self) -> Option<(&CssProperty, &str)> {
        match self {
            ClassifiedToken::Literal { property, value }
            | ClassifiedToken::Clamp { property, value }
            | ClassifiedToken::Calc { property, value }
            | ClassifiedToken::RgbColor { property, value } => Some((property, value.as_str())),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ClassifiedToken::Literal { .. } => "literal",
            ClassifiedToken::Responsive { .. } => "responsive",
            ClassifiedToken::MediaQuery { .. } => "media-query",
            ClassifiedToken::Clamp { .. } => "clamp",
            ClassifiedToken::Calc { .. } => "calc",
            ClassifiedToken::RgbColor { .. } => "rgb",
            ClassifiedToken::Unrecognized => "unrecognized",
        }
    }
}

/// A `#elementId:property` binding to another element's runtime geometry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementReference {
    pub element_id: String,
    pub property: String,
}

impl ElementReference {
    pub fn new(element_id: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            element_id: element_id.into(),
            property: property.into(),
        }
    }

    /// Name of the CSS custom property kept in sync with the element.
    pub fn variable_name(&self) -> String {
        format!("--{}-{}", self.element_id, self.property)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_property_deserializes_string_or_list() {
        let table: PropertyTable =
            serde_json::from_str(r#"{"p": "padding", "px": ["padding-left", "padding-right"]}"#)
                .unwrap();

        assert_eq!(table["p"], CssProperty::from("padding"));
        assert_eq!(table["px"].names(), vec!["padding-left", "padding-right"]);
    }

    #[test]
    fn test_theme_resolve() {
        let mut theme = Theme::default();
        theme.colors.insert("primary".to_string(), "#3b82f6".to_string());
        theme.spacing.insert("md".to_string(), "1rem".to_string());
        theme.spacing.insert("primary".to_string(), "2rem".to_string());

        assert_eq!(theme.resolve("primary"), "#3b82f6");
        assert_eq!(theme.resolve("md"), "1rem");
        assert_eq!(theme.resolve("10px"), "10px");
    }

    #[test]
    fn test_variable_name() {
        let reference = ElementReference::new("box", "width");
        assert_eq!(reference.variable_name(), "--box-width");
    }
}
