//! Token classification
//!
//! Turns one utility token such as `w[#box:width + 10px]` into a
//! [`ClassifiedToken`]. The checks run in a fixed order and the first match
//! wins:
//!
//! 1. shape `name[...]` / `name|...|`
//! 2. short name lookup in the property table
//! 3. `@breakpoint[value]` lists
//! 4. `value:breakpoint` lists (unless the value is a hex color or holds an
//!    element reference)
//! 5. legacy double brackets `name[[...]]`
//! 6. arithmetic -> `calc()`, with element references substituted
//! 7. three integers -> `rgb()`
//! 8. three comma separated values -> `clamp()`
//! 9. anything else is a literal

use crate::error::Diagnostic;
use crate::registry::ReferenceRegistry;
use crate::types::{BreakpointTable, ClassifiedToken, CssProperty, MediaRule, PropertyTable, Theme};
use regex::{Captures, Regex};

pub struct Classifier<'a> {
    properties: &'a PropertyTable,
    breakpoints: &'a BreakpointTable,
    theme: Option<&'a Theme>,

    hex_color_regex: Regex,
    element_reference_regex: Regex,
    reference_capture_regex: Regex,
    rgb_regex: Regex,
    media_rule_regex: Regex,
}

impl<'a> Classifier<'a> {
    pub fn new(properties: &'a PropertyTable, breakpoints: &'a BreakpointTable) -> Self {
        Self {
            properties,
            breakpoints,
            theme: None,
            hex_color_regex: Regex::new(r"^#[0-9a-fA-F]{3,8}$").expect("hex color pattern"),
            element_reference_regex: Regex::new(r"#[a-zA-Z0-9_-]+:").expect("reference pattern"),
            reference_capture_regex: Regex::new(r"#([a-zA-Z0-9_-]+):([a-zA-Z-]+)")
                .expect("reference capture pattern"),
            rgb_regex: Regex::new(r"^\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*$")
                .expect("rgb pattern"),
            media_rule_regex: Regex::new(r"^@([a-zA-Z][a-zA-Z0-9_-]*)\[(.+)\]$")
                .expect("media rule pattern"),
        }
    }

    /// Resolve plain literal values through theme colors and spacing.
    pub fn with_theme(mut self, theme: &'a Theme) -> Self {
        if !theme.is_empty() {
            self.theme = Some(theme);
        }
        self
    }

    /// Classify a single token.
    ///
    /// Element references found in `calc()` values are added to `registry`;
    /// dropped rules and fallbacks are reported through `diagnostics`.
    pub fn classify(
        &self,
        token: &str,
        registry: &mut ReferenceRegistry,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> ClassifiedToken {
        let Some((short_name, content)) = parse_shape(token) else {
            log::debug!("Ignoring unrecognized token '{}'", token);
            return ClassifiedToken::Unrecognized;
        };

        let Some(property) = self.properties.get(short_name) else {
            Diagnostic::UnknownProperty {
                token: token.to_string(),
                property: short_name.to_string(),
            }
            .emit(diagnostics);
            return ClassifiedToken::Unrecognized;
        };
        let property = property.clone();

        if content.contains('@') {
            return self.classify_media_query(token, property, content, registry, diagnostics);
        }

        let has_reference = self.element_reference_regex.is_match(content);

        if content.contains(':') && !self.hex_color_regex.is_match(content) && !has_reference {
            return self.classify_responsive(token, property, content, diagnostics);
        }

        if content.len() >= 2 && content.starts_with('[') && content.ends_with(']') {
            let inner = content[1..content.len() - 1].trim();
            let parts = split_top_level(inner);
            if parts.len() == 3 {
                return ClassifiedToken::Clamp {
                    property,
                    value: format_clamp(&parts),
                };
            }
            if has_calculation(inner) {
                return ClassifiedToken::Calc {
                    property,
                    value: self.generate_calc(inner, registry),
                };
            }
            return ClassifiedToken::Literal {
                property,
                value: inner.to_string(),
            };
        }

        if has_calculation(content) {
            return ClassifiedToken::Calc {
                property,
                value: self.generate_calc(content, registry),
            };
        }

        if let Some(value) = self.rgb_value(content) {
            return ClassifiedToken::RgbColor { property, value };
        }

        if split_top_level(content).len() > 1 {
            return match self.generate_clamp(token, content, diagnostics) {
                Ok(value) => ClassifiedToken::Clamp { property, value },
                Err(raw) => ClassifiedToken::Literal { property, value: raw },
            };
        }

        ClassifiedToken::Literal {
            property,
            value: self.resolve_theme(content),
        }
    }

    /// `@mobile[13px], @tablets[1rem, 2vw, 3rem]`
    fn classify_media_query(
        &self,
        token: &str,
        property: CssProperty,
        content: &str,
        registry: &mut ReferenceRegistry,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> ClassifiedToken {
        let mut rules = Vec::new();

        for part in split_top_level(content) {
            let Some(captures) = self.media_rule_regex.captures(part) else {
                log::debug!("Skipping malformed media rule '{}' in '{}'", part, token);
                continue;
            };
            let breakpoint = &captures[1];
            let value = captures[2].trim();

            let Some(media) = self.breakpoints.get(breakpoint) else {
                Diagnostic::UnknownBreakpoint {
                    token: token.to_string(),
                    breakpoint: breakpoint.to_string(),
                }
                .emit(diagnostics);
                continue;
            };

            let value = if split_top_level(value).len() > 1 {
                self.generate_clamp(token, value, diagnostics)
                    .unwrap_or_else(|raw| raw)
            } else if has_calculation(value) {
                self.generate_calc(value, registry)
            } else {
                self.resolve_theme(value)
            };

            rules.push(MediaRule {
                value,
                breakpoint: breakpoint.to_string(),
                media: media.clone(),
            });
        }

        ClassifiedToken::MediaQuery { property, rules }
    }

    /// `50%:Phone, 80%:Computer, 100%`
    fn classify_responsive(
        &self,
        token: &str,
        property: CssProperty,
        content: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> ClassifiedToken {
        let mut base_value = None;
        let mut rules = Vec::new();

        for part in split_top_level(content) {
            let (value, breakpoint) = match part.split_once(':') {
                Some((value, breakpoint)) => (value.trim(), breakpoint.trim()),
                None => (part, ""),
            };

            if breakpoint.is_empty() {
                base_value = Some(self.resolve_theme(value));
                continue;
            }

            match self.breakpoints.get(breakpoint) {
                Some(media) => rules.push(MediaRule {
                    value: self.resolve_theme(value),
                    breakpoint: breakpoint.to_string(),
                    media: media.clone(),
                }),
                None => Diagnostic::UnknownBreakpoint {
                    token: token.to_string(),
                    breakpoint: breakpoint.to_string(),
                }
                .emit(diagnostics),
            }
        }

        ClassifiedToken::Responsive {
            property,
            base_value,
            rules,
        }
    }

    /// Build `clamp(a, b, c)`; on any other arity report and hand back the raw value.
    fn generate_clamp(
        &self,
        token: &str,
        values: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<String, String> {
        let parts = split_top_level(values);
        if parts.len() == 3 {
            return Ok(format_clamp(&parts));
        }

        Diagnostic::MalformedClamp {
            token: token.to_string(),
            parts: parts.len(),
        }
        .emit(diagnostics);
        Err(values.trim().to_string())
    }

    /// Build `calc(...)`, rewriting `#id:property` to `var(--id-property)`.
    pub fn generate_calc(&self, expression: &str, registry: &mut ReferenceRegistry) -> String {
        let mut expression = expression.trim();
        if expression.len() >= 2 && expression.starts_with('[') && expression.ends_with(']') {
            expression = expression[1..expression.len() - 1].trim();
        }

        // Spacing first so hyphens inside the generated variable names stay intact
        let spaced = normalize_operator_spacing(expression);

        let substituted = self
            .reference_capture_regex
            .replace_all(&spaced, |captures: &Captures| {
                let element_id = &captures[1];
                let property = &captures[2];
                registry.add_element_reference(element_id, property);
                format!("var(--{}-{})", element_id, property)
            });

        format!("calc({})", substituted)
    }

    fn rgb_value(&self, content: &str) -> Option<String> {
        let captures = self.rgb_regex.captures(content)?;
        Some(format!("rgb({}, {}, {})", &captures[1], &captures[2], &captures[3]))
    }

    fn resolve_theme(&self, value: &str) -> String {
        match self.theme {
            Some(theme) => theme.resolve(value).to_string(),
            None => value.to_string(),
        }
    }
}

/// Split `name[content]` or `name|content|` into its parts.
pub fn parse_shape(token: &str) -> Option<(&str, &str)> {
    let name_len = token
        .char_indices()
        .find(|(_, c)| !c.is_ascii_alphabetic())
        .map(|(i, _)| i)?;
    if name_len == 0 {
        return None;
    }

    let (name, rest) = token.split_at(name_len);
    let wrapped = (rest.starts_with('[') && rest.ends_with(']'))
        || (rest.starts_with('|') && rest.ends_with('|'));
    if rest.len() < 3 || !wrapped {
        return None;
    }

    let content = rest[1..rest.len() - 1].trim();
    if content.is_empty() {
        return None;
    }

    Some((name, content))
}

/// Split on commas that are not nested in brackets or parentheses.
pub fn split_top_level(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, ch) in value.char_indices() {
        match ch {
            '[' | '(' => depth += 1,
            ']' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(value[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(value[start..].trim());

    parts
}

fn format_clamp(parts: &[&str]) -> String {
    format!("clamp({}, {}, {})", parts[0], parts[1], parts[2])
}

/// Whether `value` holds an arithmetic operator outside function calls such
/// as `rgb(...)`, `clamp(...)` or `var(...)`.
pub fn has_calculation(value: &str) -> bool {
    let chars: Vec<char> = value.chars().collect();
    let references = reference_id_spans(&chars);
    let mut calls: Vec<bool> = Vec::new();

    for i in 0..chars.len() {
        match chars[i] {
            '(' => calls.push(i > 0 && is_name_char(chars[i - 1])),
            ')' => {
                calls.pop();
            }
            _ if calls.iter().any(|is_call| *is_call) => {}
            _ if !references[i] && is_operator_at(&chars, i) => return true,
            _ => {}
        }
    }

    false
}

/// Surround every binary `+`/`-` outside function calls with single spaces.
fn normalize_operator_spacing(expression: &str) -> String {
    let chars: Vec<char> = expression.chars().collect();
    let references = reference_id_spans(&chars);
    let mut calls: Vec<bool> = Vec::new();
    let mut spaced = String::with_capacity(expression.len() + 8);

    for i in 0..chars.len() {
        let ch = chars[i];
        match ch {
            '(' => calls.push(i > 0 && is_name_char(chars[i - 1])),
            ')' => {
                calls.pop();
            }
            _ => {}
        }

        let in_call = calls.iter().any(|is_call| *is_call);
        if (ch == '+' || ch == '-') && !in_call && !references[i] && is_operator_at(&chars, i) {
            spaced.push(' ');
            spaced.push(ch);
            spaced.push(' ');
        } else {
            spaced.push(ch);
        }
    }

    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Marks the `#id` part of every `#id:property` reference.
///
/// An id may hold digits and hyphens in any position (`#col-1`, `#card2-b`),
/// so none of its characters can be operators.
fn reference_id_spans(chars: &[char]) -> Vec<bool> {
    let mut covered = vec![false; chars.len()];
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '#' {
            let mut end = i + 1;
            while end < chars.len() && is_name_char(chars[end]) {
                end += 1;
            }
            if end > i + 1 && chars.get(end) == Some(&':') {
                covered[i..end].iter_mut().for_each(|c| *c = true);
                i = end;
                continue;
            }
        }
        i += 1;
    }

    covered
}

fn is_operator_at(chars: &[char], i: usize) -> bool {
    match chars[i] {
        '*' | '/' => true,
        '+' => !is_sign(chars, i),
        '-' => !is_sign(chars, i) && !is_identifier_hyphen(chars, i),
        _ => false,
    }
}

/// A `+`/`-` with nothing before it, or following another operator, an
/// opening parenthesis, a comma or the `#` sigil, is a sign.
fn is_sign(chars: &[char], i: usize) -> bool {
    match chars[..i].iter().rev().find(|c| !c.is_whitespace()) {
        None => true,
        Some(before) => matches!(before, '+' | '-' | '*' | '/' | '(' | ',' | '#'),
    }
}

/// `inline-block`, `sans-serif`
fn is_identifier_hyphen(chars: &[char], i: usize) -> bool {
    let prev = i.checked_sub(1).map(|p| chars[p]);
    let next = chars.get(i + 1);
    prev.map_or(false, |c| c.is_ascii_alphabetic()) && next.map_or(false, |c| c.is_ascii_alphabetic())
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}
