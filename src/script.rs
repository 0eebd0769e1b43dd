//! Companion runtime script generation
//!
//! Element references and class-copy references are first collected into a
//! [`ScriptPlan`], then rendered by [`ScriptGenerator`] in a single pass. The
//! script keeps `--{id}-{property}` custom properties in sync with element
//! geometry and copies class lists onto elements carrying `#{id}.classes`.

use crate::registry::ReferenceRegistry;
use indexmap::IndexMap;
use regex::Regex;

/// Global namespace the update functions are exposed on.
pub const GLOBAL_NAMESPACE: &str = "HUHM";

/// Delay before recomputing geometry after the last resize event.
pub const RESIZE_DEBOUNCE_MS: u32 = 100;

/// Geometry properties requested for one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometryBinding {
    pub element_id: String,
    pub properties: Vec<String>,
}

/// Everything the runtime script has to do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptPlan {
    pub geometry: Vec<GeometryBinding>,
    pub class_copies: Vec<String>,
}

impl ScriptPlan {
    /// Group element references by element id, keeping first-seen order.
    pub fn from_registry(registry: &ReferenceRegistry) -> Self {
        let mut grouped: IndexMap<&str, Vec<String>> = IndexMap::new();
        for reference in registry.element_references() {
            let properties = grouped.entry(reference.element_id.as_str()).or_default();
            if !properties.contains(&reference.property) {
                properties.push(reference.property.clone());
            }
        }

        Self {
            geometry: grouped
                .into_iter()
                .map(|(element_id, properties)| GeometryBinding {
                    element_id: element_id.to_string(),
                    properties,
                })
                .collect(),
            class_copies: registry.class_copies().map(str::to_string).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.geometry.is_empty() && self.class_copies.is_empty()
    }
}

/// How a referenced property is read from the element at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryAccessor {
    OffsetWidth,
    OffsetHeight,
    ClientWidth,
    ClientHeight,
    ContentWidth,
    ContentHeight,
    OffsetTop,
    OffsetLeft,
    OffsetRight,
    OffsetBottom,
    /// Any other property: read the computed style under its camelCased name.
    ComputedStyle(String),
}

impl GeometryAccessor {
    pub fn for_property(property: &str) -> Self {
        match property {
            "width" => Self::OffsetWidth,
            "height" => Self::OffsetHeight,
            "innerWidth" => Self::ClientWidth,
            "innerHeight" => Self::ClientHeight,
            "contentWidth" => Self::ContentWidth,
            "contentHeight" => Self::ContentHeight,
            "top" => Self::OffsetTop,
            "left" => Self::OffsetLeft,
            "right" => Self::OffsetRight,
            "bottom" => Self::OffsetBottom,
            other => Self::ComputedStyle(camel_case(other)),
        }
    }

    /// JavaScript expression reading the value from the element in `var`.
    pub fn expression(&self, var: &str) -> String {
        match self {
            Self::OffsetWidth => format!("{var}.offsetWidth + 'px'"),
            Self::OffsetHeight => format!("{var}.offsetHeight + 'px'"),
            Self::ClientWidth => format!("{var}.clientWidth + 'px'"),
            Self::ClientHeight => format!("{var}.clientHeight + 'px'"),
            Self::ContentWidth => format!("parseFloat(getComputedStyle({var}).width) + 'px'"),
            Self::ContentHeight => format!("parseFloat(getComputedStyle({var}).height) + 'px'"),
            Self::OffsetTop => format!("{var}.offsetTop + 'px'"),
            Self::OffsetLeft => format!("{var}.offsetLeft + 'px'"),
            Self::OffsetRight => format!(
                "({var}.offsetParent ? {var}.offsetParent.offsetWidth - {var}.offsetLeft - {var}.offsetWidth : 0) + 'px'"
            ),
            Self::OffsetBottom => format!(
                "({var}.offsetParent ? {var}.offsetParent.offsetHeight - {var}.offsetTop - {var}.offsetHeight : 0) + 'px'"
            ),
            Self::ComputedStyle(name) => format!("getComputedStyle({var}).{name}"),
        }
    }
}

pub struct ScriptGenerator {
    output: String,
}

impl ScriptGenerator {
    pub fn new() -> Self {
        Self {
            output: String::new(),
        }
    }

    /// Render the plan. An empty plan renders to an empty string.
    pub fn generate(mut self, plan: &ScriptPlan, timestamp: Option<&str>, minify: bool) -> String {
        if plan.is_empty() {
            return String::new();
        }

        if let Some(timestamp) = timestamp {
            self.line(0, "/**");
            self.line(0, &format!(" * {} runtime: CSS variables bound to element geometry", GLOBAL_NAMESPACE));
            self.line(0, &format!(" * Generated: {}", timestamp));
            self.line(0, " */");
            self.line(0, "");
        }

        self.line(0, "(function() {");
        self.line(1, "'use strict';");
        self.line(0, "");

        self.line(1, "function updateVariables() {");
        if !plan.geometry.is_empty() {
            self.line(2, "var root = document.documentElement;");
        }
        for binding in &plan.geometry {
            self.write_geometry_binding(binding);
        }
        self.line(1, "}");
        self.line(0, "");

        self.line(1, "function copyClasses() {");
        for element_id in &plan.class_copies {
            self.write_class_copy(element_id);
        }
        self.line(1, "}");
        self.line(0, "");

        self.write_bootstrap();
        self.line(0, "})();");

        if minify {
            minify_script(&self.output)
        } else {
            self.output
        }
    }

    fn write_geometry_binding(&mut self, binding: &GeometryBinding) {
        let id = &binding.element_id;
        let var = format!("el_{}", sanitize_identifier(id));

        self.line(2, "");
        self.line(2, &format!("// #{}", id));
        self.line(2, &format!("var {} = document.getElementById('{}');", var, id));
        self.line(2, &format!("if ({}) {{", var));
        for property in &binding.properties {
            let accessor = GeometryAccessor::for_property(property);
            self.line(
                3,
                &format!(
                    "root.style.setProperty('--{}-{}', {});",
                    id,
                    property,
                    accessor.expression(&var)
                ),
            );
        }
        self.line(2, "} else {");
        self.line(3, &format!("console.warn('[{}] Element not found: #{}');", GLOBAL_NAMESPACE, id));
        self.line(2, "}");
    }

    fn write_class_copy(&mut self, element_id: &str) {
        let suffix = sanitize_identifier(element_id);
        let source = format!("source_{}", suffix);
        let classes = format!("classes_{}", suffix);
        let marker = format!("#{}.classes", element_id);

        self.line(2, "");
        self.line(2, &format!("// {}", marker));
        self.line(2, &format!("var {} = document.getElementById('{}');", source, element_id));
        self.line(2, &format!("if ({}) {{", source));
        self.line(3, &format!("var {} = Array.from({}.classList);", classes, source));
        self.line(
            3,
            &format!(
                "document.querySelectorAll('[class*=\"{}\"]').forEach(function(target) {{",
                marker
            ),
        );
        self.line(
            4,
            &format!(
                "target.className = target.className.split('{}').join(' ').replace(/\\s+/g, ' ').trim();",
                marker
            ),
        );
        self.line(4, &format!("{}.forEach(function(cls) {{", classes));
        self.line(5, "if (!target.classList.contains(cls)) {");
        self.line(6, "target.classList.add(cls);");
        self.line(5, "}");
        self.line(4, "});");
        self.line(3, "});");
        self.line(2, "} else {");
        self.line(
            3,
            &format!(
                "console.warn('[{}] Source element not found for class copy: #{}');",
                GLOBAL_NAMESPACE, element_id
            ),
        );
        self.line(2, "}");
    }

    fn write_bootstrap(&mut self) {
        self.line(1, "function init() {");
        self.line(2, "updateVariables();");
        self.line(2, "copyClasses();");
        self.line(1, "}");
        self.line(0, "");
        self.line(1, "if (document.readyState === 'loading') {");
        self.line(2, "document.addEventListener('DOMContentLoaded', init);");
        self.line(1, "} else {");
        self.line(2, "init();");
        self.line(1, "}");
        self.line(0, "");
        self.line(1, "var resizeTimer;");
        self.line(1, "window.addEventListener('resize', function() {");
        self.line(2, "clearTimeout(resizeTimer);");
        self.line(2, &format!("resizeTimer = setTimeout(updateVariables, {});", RESIZE_DEBOUNCE_MS));
        self.line(1, "});");
        self.line(0, "");
        self.line(1, &format!("window.{0} = window.{0} || {{}};", GLOBAL_NAMESPACE));
        self.line(1, &format!("window.{}.updateVariables = updateVariables;", GLOBAL_NAMESPACE));
        self.line(1, &format!("window.{}.copyClasses = copyClasses;", GLOBAL_NAMESPACE));
    }

    fn line(&mut self, indent: usize, text: &str) {
        if !text.is_empty() {
            for _ in 0..indent {
                self.output.push_str("  ");
            }
            self.output.push_str(text);
        }
        self.output.push('\n');
    }
}

impl Default for ScriptGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn an element id into a valid JavaScript identifier fragment.
pub fn sanitize_identifier(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// `margin-top` -> `marginTop`
pub fn camel_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.chars() {
        if ch == '-' {
            upper_next = true;
        } else if upper_next {
            result.push(ch.to_ascii_uppercase());
            upper_next = false;
        } else {
            result.push(ch);
        }
    }
    result
}

/// Drop comments and indentation; every emitted statement is terminated so
/// lines can be joined directly.
pub fn minify_script(script: &str) -> String {
    let block_comment = Regex::new(r"/\*[\s\S]*?\*/").expect("block comment pattern");
    let without_blocks = block_comment.replace_all(script, "");

    without_blocks
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("//"))
        .collect::<Vec<_>>()
        .join("")
}
