//! Lexical analysis of class attributes
//!
//! Two layers live here: [`ClassExtractor`] pulls raw `class`/`className`
//! attribute values out of markup, and [`ClassLexer`] splits one attribute
//! value into utility tokens while keeping bracket and pipe spans intact.

use regex::Regex;

/// Marker suffix for class-copy references (`#card.classes`).
pub const CLASS_COPY_SUFFIX: &str = ".classes";

/// Splits a class attribute value into tokens.
///
/// Whitespace inside `[...]` or between a pair of `|` does not end a token, so
/// `w[calc 1 + 2] h|50 %|` yields two tokens.
pub struct ClassLexer {
    input: Vec<char>,
    position: usize,
    bracket_depth: usize,
    pipe_count: usize,
    current: String,
}

impl ClassLexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            bracket_depth: 0,
            pipe_count: 0,
            current: String::new(),
        }
    }

    /// Split into raw whitespace-separated chunks, honoring delimiters.
    pub fn tokenize(&mut self) -> Vec<String> {
        let mut chunks = Vec::new();

        while let Some(ch) = self.advance() {
            match ch {
                '[' => {
                    self.bracket_depth += 1;
                    self.current.push(ch);
                }
                ']' => {
                    // A stray closer must not lock the lexer into "inside brackets"
                    self.bracket_depth = self.bracket_depth.saturating_sub(1);
                    self.current.push(ch);
                }
                '|' => {
                    if self.bracket_depth == 0 {
                        self.pipe_count += 1;
                    }
                    self.current.push(ch);
                }
                ch if ch.is_whitespace() && self.bracket_depth == 0 && !self.in_pipes() => {
                    self.flush(&mut chunks);
                }
                _ => self.current.push(ch),
            }
        }

        // Unbalanced delimiters: whatever is left becomes the last chunk
        self.flush(&mut chunks);
        chunks
    }

    fn in_pipes(&self) -> bool {
        self.pipe_count % 2 == 1
    }

    fn flush(&mut self, chunks: &mut Vec<String>) {
        let trimmed = self.current.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }
        self.current.clear();
        self.pipe_count = 0;
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.input.get(self.position).copied();
        if ch.is_some() {
            self.position += 1;
        }
        ch
    }
}

/// Split a class attribute value and keep only utility tokens.
///
/// Class-copy markers and ordinary class names (`flex`, `items-center`) are
/// dropped silently.
pub fn split_class_string(class_string: &str) -> Vec<String> {
    ClassLexer::new(class_string)
        .tokenize()
        .into_iter()
        .filter(|chunk| is_utility_token(chunk))
        .collect()
}

/// Whether a chunk looks like a utility token: `name[...]` or `name|...|`.
pub fn is_utility_token(chunk: &str) -> bool {
    if chunk.contains(CLASS_COPY_SUFFIX) {
        return false;
    }

    let has_brackets = match (chunk.find('['), chunk.rfind(']')) {
        (Some(open), Some(close)) => open < close,
        _ => false,
    };
    let has_pipes = chunk.matches('|').count() >= 2;

    has_brackets || has_pipes
}

/// Finds class attributes and element classes in markup.
pub struct ClassExtractor {
    attribute_patterns: Vec<Regex>,
    class_copy_regex: Regex,
}

impl ClassExtractor {
    pub fn new() -> Self {
        let attribute_patterns = [
            r#"class(?:Name)?=["']([^"']+)["']"#,
            r#"class(?:Name)?=\{`([^`]+)`\}"#,
            r#"class(?:Name)?=\{["']([^"']+)["']\}"#,
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("class attribute pattern"))
        .collect();

        Self {
            attribute_patterns,
            class_copy_regex: Regex::new(r"#([a-zA-Z0-9_-]+)\.classes")
                .expect("class copy pattern"),
        }
    }

    /// All class attribute values in `content`, grouped by attribute syntax.
    pub fn attribute_values<'a>(&self, content: &'a str) -> Vec<&'a str> {
        let mut values = Vec::new();
        for pattern in &self.attribute_patterns {
            for capture in pattern.captures_iter(content) {
                if let Some(value) = capture.get(1) {
                    values.push(value.as_str());
                }
            }
        }
        values
    }

    /// Element ids referenced as `#id.classes` in one attribute value.
    pub fn class_copy_markers(&self, class_string: &str) -> Vec<String> {
        self.class_copy_regex
            .captures_iter(class_string)
            .filter_map(|capture| capture.get(1))
            .map(|id| id.as_str().to_string())
            .collect()
    }

    /// The class attribute of the element with `id="element_id"`, in either
    /// attribute order.
    pub fn element_classes<'a>(&self, content: &'a str, element_id: &str) -> Option<&'a str> {
        let id = regex::escape(element_id);
        let patterns = [
            format!(r#"id=["']{id}["'][^>]*class(?:Name)?=["']([^"']+)["']"#),
            format!(r#"class(?:Name)?=["']([^"']+)["'][^>]*id=["']{id}["']"#),
        ];

        for pattern in &patterns {
            let regex = match Regex::new(pattern) {
                Ok(regex) => regex,
                Err(e) => {
                    log::debug!("Skipping element lookup for #{}: {}", element_id, e);
                    continue;
                }
            };
            if let Some(classes) = regex.captures(content).and_then(|c| c.get(1)) {
                return Some(classes.as_str());
            }
        }

        None
    }
}

impl Default for ClassExtractor {
    fn default() -> Self {
        Self::new()
    }
}
