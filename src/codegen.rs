//! CSS code generation

use crate::types::{ClassifiedToken, CssProperty, MediaRule};
use indexmap::IndexMap;
use regex::Regex;

pub const GENERATOR_NAME: &str = "HUHM";

/// Collects rules for classified tokens and assembles the style sheet.
///
/// Unconditional rules go to the base buffer; media rules are grouped per
/// media condition in the order the conditions were first seen.
pub struct CodeGenerator {
    base: String,
    media_blocks: IndexMap<String, String>,
    rule_count: usize,
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self {
            base: String::new(),
            media_blocks: IndexMap::new(),
            rule_count: 0,
        }
    }

    /// Render the rules for one token.
    pub fn add_token(&mut self, token: &str, classified: &ClassifiedToken) {
        match classified {
            ClassifiedToken::Literal { property, value }
            | ClassifiedToken::Clamp { property, value }
            | ClassifiedToken::Calc { property, value }
            | ClassifiedToken::RgbColor { property, value } => {
                self.add_base_rule(token, property, value);
            }
            ClassifiedToken::Responsive {
                property,
                base_value,
                rules,
            } => {
                if let Some(base_value) = base_value {
                    self.add_base_rule(token, property, base_value);
                }
                self.add_media_rules(token, property, rules);
            }
            ClassifiedToken::MediaQuery { property, rules } => {
                self.add_media_rules(token, property, rules);
            }
            ClassifiedToken::Unrecognized => {}
        }
    }

    fn add_base_rule(&mut self, token: &str, property: &CssProperty, value: &str) {
        self.base.push_str(&format_rule(token, property, value));
        self.base.push('\n');
        self.rule_count += 1;
    }

    fn add_media_rules(&mut self, token: &str, property: &CssProperty, rules: &[MediaRule]) {
        for rule in rules {
            let block = self.media_blocks.entry(rule.media.clone()).or_default();
            block.push_str("  ");
            block.push_str(&format_rule(token, property, &rule.value));
            block.push('\n');
            self.rule_count += 1;
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rule_count
    }

    pub fn media_conditions(&self) -> impl Iterator<Item = &str> {
        self.media_blocks.keys().map(String::as_str)
    }

    /// Assemble header, base rules and media blocks.
    ///
    /// `timestamp` controls the header comment; `None` omits it.
    pub fn finish(self, timestamp: Option<&str>, minify: bool) -> String {
        let mut css = String::new();

        if let Some(timestamp) = timestamp {
            css.push_str(&format!(
                "/*\n * Generated by {}\n * Date: {}\n */\n\n",
                GENERATOR_NAME, timestamp
            ));
        }

        css.push_str(&self.base);

        for (media, rules) in &self.media_blocks {
            if !css.is_empty() {
                css.push('\n');
            }
            css.push_str(&format!("@media {} {{\n{}}}\n", media, rules));
        }

        if minify {
            minify_css(&css)
        } else {
            css
        }
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// `.selector { prop: value; }` with one declaration per canonical property.
pub fn format_rule(token: &str, property: &CssProperty, value: &str) -> String {
    let declarations: Vec<String> = property
        .names()
        .iter()
        .map(|name| format!("{}: {};", name, value))
        .collect();

    format!(".{} {{ {} }}", escape_selector(token), declarations.join(" "))
}

/// Escape a token so it can be used as a class selector.
///
/// Every ASCII character other than letters, digits, `-` and `_` gets a
/// backslash; whitespace other than a plain space uses a hex escape.
pub fn escape_selector(token: &str) -> String {
    let mut escaped = String::with_capacity(token.len() * 2);

    for ch in token.chars() {
        if !ch.is_ascii() || ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            escaped.push(ch);
        } else if ch.is_ascii_whitespace() && ch != ' ' {
            escaped.push_str(&format!("\\{:x} ", ch as u32));
        } else {
            escaped.push('\\');
            escaped.push(ch);
        }
    }

    escaped
}

/// Strip comments and redundant whitespace.
///
/// Escaped characters in selectors (`\ `, `\:`) are copied untouched.
pub fn minify_css(css: &str) -> String {
    let comment_regex = Regex::new(r"/\*[\s\S]*?\*/").expect("comment pattern");
    let without_comments = comment_regex.replace_all(css, "");

    let chars: Vec<char> = without_comments.chars().collect();
    let mut output = String::with_capacity(chars.len());
    let mut pending_space = false;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        match ch {
            '\\' => {
                flush_space(&mut output, &mut pending_space);
                output.push(ch);
                if let Some(&next) = chars.get(i + 1) {
                    output.push(next);
                    i += 1;
                }
            }
            c if c.is_whitespace() => pending_space = true,
            '{' | '}' | ':' | ';' => {
                pending_space = false;
                if ch == ';' && next_significant(&chars, i + 1) == Some('}') {
                    i += 1;
                    continue;
                }
                output.push(ch);
                i = skip_whitespace(&chars, i + 1);
                continue;
            }
            _ => {
                flush_space(&mut output, &mut pending_space);
                output.push(ch);
            }
        }
        i += 1;
    }

    output
}

fn flush_space(output: &mut String, pending_space: &mut bool) {
    if *pending_space && !output.is_empty() {
        output.push(' ');
    }
    *pending_space = false;
}

fn next_significant(chars: &[char], from: usize) -> Option<char> {
    chars[from.min(chars.len())..]
        .iter()
        .copied()
        .find(|c| !c.is_whitespace())
}

fn skip_whitespace(chars: &[char], mut i: usize) -> usize {
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(property: CssProperty, value: &str) -> ClassifiedToken {
        ClassifiedToken::Literal {
            property,
            value: value.to_string(),
        }
    }

    fn rule(value: &str, breakpoint: &str, media: &str) -> MediaRule {
        MediaRule {
            value: value.to_string(),
            breakpoint: breakpoint.to_string(),
            media: media.to_string(),
        }
    }

    #[test]
    fn test_escape_selector() {
        assert_eq!(escape_selector("p[10px]"), r"p\[10px\]");
        assert_eq!(escape_selector("w|50%|"), r"w\|50\%\|");
        assert_eq!(
            escape_selector("w[#box:width + 10px]"),
            r"w\[\#box\:width\ \+\ 10px\]"
        );
        assert_eq!(escape_selector("m[1.5rem,2px]"), r"m\[1\.5rem\,2px\]");
        assert_eq!(escape_selector("bg[rgb(1,2,3)]"), r"bg\[rgb\(1\,2\,3\)\]");
        assert_eq!(escape_selector("f[@mobile[1px]]"), r"f\[\@mobile\[1px\]\]");
        assert_eq!(escape_selector("w[a\tb]"), "w\\[a\\9 b\\]");
    }

    #[test]
    fn test_literal_rule() {
        let mut generator = CodeGenerator::new();
        generator.add_token("p[10px]", &literal(CssProperty::from("padding"), "10px"));

        let css = generator.finish(None, false);
        assert_eq!(css, ".p\\[10px\\] { padding: 10px; }\n");
        assert!(!css.contains("@media"));
    }

    #[test]
    fn test_paired_properties_share_one_rule() {
        let mut generator = CodeGenerator::new();
        let property = CssProperty::from(&["padding-left", "padding-right"][..]);
        generator.add_token("px[5px]", &literal(property, "5px"));

        assert_eq!(
            generator.finish(None, false),
            ".px\\[5px\\] { padding-left: 5px; padding-right: 5px; }\n"
        );
    }

    #[test]
    fn test_media_blocks_in_first_seen_order() {
        let mut generator = CodeGenerator::new();
        let classified = ClassifiedToken::Responsive {
            property: CssProperty::from("width"),
            base_value: None,
            rules: vec![
                rule("50%", "Phone", "(max-width: 767px)"),
                rule("80%", "Computer", "(min-width: 1024px)"),
            ],
        };
        generator.add_token("w[50%:Phone, 80%:Computer]", &classified);

        let conditions: Vec<&str> = generator.media_conditions().collect();
        assert_eq!(conditions, vec!["(max-width: 767px)", "(min-width: 1024px)"]);

        let css = generator.finish(None, false);
        let phone = css.find("@media (max-width: 767px)").unwrap();
        let computer = css.find("@media (min-width: 1024px)").unwrap();
        assert!(phone < computer);
        assert_eq!(css.matches("width: 50%;").count(), 1);
        assert_eq!(css.matches("width: 80%;").count(), 1);
        assert!(css.starts_with("@media"));
    }

    #[test]
    fn test_responsive_base_and_shared_media() {
        let mut generator = CodeGenerator::new();
        generator.add_token(
            "w[100%, 50%:Phone]",
            &ClassifiedToken::Responsive {
                property: CssProperty::from("width"),
                base_value: Some("100%".to_string()),
                rules: vec![rule("50%", "Phone", "(max-width: 767px)")],
            },
        );
        generator.add_token(
            "h[@mobile[2rem]]",
            &ClassifiedToken::MediaQuery {
                property: CssProperty::from("height"),
                rules: vec![rule("2rem", "mobile", "(max-width: 767px)")],
            },
        );
        assert_eq!(generator.rule_count(), 3);

        let css = generator.finish(None, false);
        assert_eq!(
            css,
            ".w\\[100\\%\\,\\ 50\\%\\:Phone\\] { width: 100%; }\n\
             \n\
             @media (max-width: 767px) {\n  \
             .w\\[100\\%\\,\\ 50\\%\\:Phone\\] { width: 50%; }\n  \
             .h\\[\\@mobile\\[2rem\\]\\] { height: 2rem; }\n\
             }\n"
        );
    }

    #[test]
    fn test_header_comment() {
        let mut generator = CodeGenerator::new();
        generator.add_token("p[1px]", &literal(CssProperty::from("padding"), "1px"));
        let css = generator.finish(Some("2024-01-01T00:00:00.000Z"), false);

        assert!(css.starts_with("/*\n * Generated by HUHM\n * Date: 2024-01-01T00:00:00.000Z\n */"));
        assert!(css.ends_with(".p\\[1px\\] { padding: 1px; }\n"));
    }

    #[test]
    fn test_minify() {
        let css = "/* header */\n.p\\[1px\\] { padding: 1px; }\n\n@media (min-width: 1024px) {\n  .a\\:\\ b { color : red ; }\n}\n";
        assert_eq!(
            minify_css(css),
            ".p\\[1px\\]{padding:1px}@media (min-width:1024px){.a\\:\\ b{color:red}}"
        );
    }
}
