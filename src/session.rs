//! One compilation pass over a batch of source text

use crate::classifier::Classifier;
use crate::codegen::CodeGenerator;
use crate::config::Config;
use crate::error::Diagnostic;
use crate::lexer::{split_class_string, ClassExtractor};
use crate::registry::{ClassSet, ReferenceRegistry};
use crate::script::{ScriptGenerator, ScriptPlan};
use crate::{CompilationStats, CompilerOptions};

/// Artifacts of a finished session.
#[derive(Debug, Clone, Default)]
pub struct CompilationOutput {
    pub css: String,
    /// Empty when no token needs runtime support
    pub script: String,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: CompilationStats,
}

impl CompilationOutput {
    pub fn has_script(&self) -> bool {
        !self.script.is_empty()
    }
}

/// Accumulates tokens from source text, then renders them once.
///
/// Sessions must not overlap: callers feed all sources, call
/// [`compile`](Self::compile), and only then start the next pass.
pub struct CompilationSession<'a> {
    config: &'a Config,
    options: CompilerOptions,
    extractor: ClassExtractor,
    classes: ClassSet,
    registry: ReferenceRegistry,
    diagnostics: Vec<Diagnostic>,
    sources_scanned: usize,
}

impl<'a> CompilationSession<'a> {
    pub fn new(config: &'a Config, options: CompilerOptions) -> Self {
        Self {
            config,
            options,
            extractor: ClassExtractor::new(),
            classes: ClassSet::new(),
            registry: ReferenceRegistry::new(),
            diagnostics: Vec::new(),
            sources_scanned: 0,
        }
    }

    /// Forget everything gathered so far.
    pub fn reset(&mut self) {
        self.classes.clear();
        self.registry.clear();
        self.diagnostics.clear();
        self.sources_scanned = 0;
    }

    /// Collect tokens and class-copy references from one source text.
    pub fn scan_source(&mut self, content: &str) {
        self.sources_scanned += 1;

        for class_string in self.extractor.attribute_values(content) {
            for element_id in self.extractor.class_copy_markers(class_string) {
                self.registry.add_class_copy(&element_id);

                match self.extractor.element_classes(content, &element_id) {
                    Some(source_classes) => {
                        for token in split_class_string(source_classes) {
                            self.classes.insert(&token);
                        }
                    }
                    None => Diagnostic::UnresolvedElementReference { element_id }
                        .emit(&mut self.diagnostics),
                }
            }

            self.add_class_string(class_string);
        }
    }

    /// Collect tokens from a bare class attribute value.
    pub fn add_class_string(&mut self, class_string: &str) {
        for token in split_class_string(class_string) {
            self.classes.insert(&token);
        }
    }

    pub fn classes(&self) -> &ClassSet {
        &self.classes
    }

    /// Classify and render every collected token, then reset for the next pass.
    pub fn compile(&mut self) -> CompilationOutput {
        let classifier = Classifier::new(&self.config.properties, &self.config.breakpoints)
            .with_theme(&self.config.theme);
        let mut generator = CodeGenerator::new();

        for token in self.classes.iter() {
            let classified = classifier.classify(token, &mut self.registry, &mut self.diagnostics);
            log::trace!("{} -> {}", token, classified.kind());
            generator.add_token(token, &classified);
        }

        log::debug!(
            "Media blocks: [{}]",
            generator.media_conditions().collect::<Vec<_>>().join(", ")
        );

        let timestamp = self.options.header_timestamp();
        let rule_count = generator.rule_count();
        let css = generator.finish(timestamp.as_deref(), self.options.minify);

        let plan = ScriptPlan::from_registry(&self.registry);
        let script = ScriptGenerator::new().generate(&plan, timestamp.as_deref(), self.options.minify);

        let stats = CompilationStats {
            files_scanned: self.sources_scanned,
            token_count: self.classes.len(),
            rule_count,
            element_reference_count: self.registry.element_references().count(),
            class_copy_count: self.registry.class_copies().count(),
            diagnostic_count: self.diagnostics.len(),
            css_size: css.len() as u64,
            script_size: script.len() as u64,
            minified: self.options.minify,
            compile_time_ms: 0,
        };

        let output = CompilationOutput {
            css,
            script,
            diagnostics: std::mem::take(&mut self.diagnostics),
            stats,
        };

        self.reset();
        output
    }

    /// Reset, scan every source, compile.
    pub fn run<'s, I>(&mut self, sources: I) -> CompilationOutput
    where
        I: IntoIterator<Item = &'s str>,
    {
        self.reset();
        for source in sources {
            self.scan_source(source);
        }
        self.compile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> CompilerOptions {
        CompilerOptions {
            comments: false,
            ..Default::default()
        }
    }

    fn config() -> Config {
        let mut config = Config::default();
        config
            .properties
            .insert("fontSize".to_string(), "font-size".into());
        config
    }

    #[test]
    fn test_literal_token() {
        let config = config();
        let mut session = CompilationSession::new(&config, options());
        let output = session.run([r#"<div class="p[10px] flex"></div>"#]);

        assert!(output.css.contains(".p\\[10px\\] { padding: 10px; }"));
        assert!(!output.css.contains("@media"));
        assert!(!output.has_script());
        assert!(output.diagnostics.is_empty());
        assert_eq!(output.stats.rule_count, 1);
    }

    #[test]
    fn test_responsive_token_order() {
        let config = config();
        let mut session = CompilationSession::new(&config, options());
        let output = session.run([r#"<div class="w[50%:Phone, 80%:Computer]"></div>"#]);

        let css = &output.css;
        assert!(css.starts_with("@media"));
        let phone = css.find("@media (max-width: 767px)").unwrap();
        let computer = css.find("@media (min-width: 1024px)").unwrap();
        assert!(phone < computer);
        assert_eq!(css.matches("{ width: ").count(), 2);
    }

    #[test]
    fn test_element_reference_produces_script() {
        let config = config();
        let mut session = CompilationSession::new(&config, options());
        let output = session.run([r#"<div id="box"></div><div class="w[#box:width + 10px]"></div>"#]);

        assert!(output
            .css
            .contains("{ width: calc(var(--box-width) + 10px); }"));
        assert!(output.script.contains("'--box-width', el_box.offsetWidth + 'px'"));
        assert!(output.script.contains("Element not found: #box"));
        assert_eq!(output.stats.element_reference_count, 1);
    }

    #[test]
    fn test_hex_color_with_breakpoint_has_no_script() {
        let config = config();
        let mut session = CompilationSession::new(&config, options());
        let output = session.run([r#"<div class="bg[#fff:Phone] w[#box:width]"></div>"#]);

        assert!(!output.has_script());
        assert_eq!(output.stats.element_reference_count, 0);
        assert!(!output.css.contains("var(--"));
    }

    #[test]
    fn test_class_copy() {
        let config = config();
        let mut session = CompilationSession::new(&config, options());
        let output = session.run([
            r#"<div id="card" class="p[4px] rounded[8px]"></div>"#,
            r##"<div class="#card.classes m[1px]"></div><i class="#ghost.classes"></i>"##,
        ]);

        assert!(output.script.contains("[class*=\"#card.classes\"]"));
        assert!(output.script.contains("[class*=\"#ghost.classes\"]"));
        assert!(output.css.contains(".m\\[1px\\]"));
        assert_eq!(
            output.diagnostics,
            vec![
                Diagnostic::UnresolvedElementReference {
                    element_id: "card".to_string()
                },
                Diagnostic::UnresolvedElementReference {
                    element_id: "ghost".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_class_copy_source_in_same_file() {
        let config = config();
        let mut session = CompilationSession::new(&config, options());
        let output = session.run([r##"<div id="card" class="p[4px]"></div>
<div class="#card.classes"></div>"##]);

        assert!(output.diagnostics.is_empty());
        assert_eq!(output.stats.token_count, 1);
        assert_eq!(output.stats.class_copy_count, 1);
    }

    #[test]
    fn test_conventional_classes_produce_nothing() {
        let config = config();
        let mut session = CompilationSession::new(&config, options());
        let output = session.run([r#"<div class="flex items-center"></div>"#]);

        assert!(output.css.is_empty());
        assert!(output.script.is_empty());
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_diagnostics_do_not_abort() {
        let config = config();
        let mut session = CompilationSession::new(&config, options());
        let output = session.run([
            r#"<div class="zz[1px] fontSize[1rem, 2rem] w[1px:Nowhere, 2px:Phone] bg[255,0,0]"></div>"#,
        ]);

        assert_eq!(output.diagnostics.len(), 3);
        assert!(output.css.contains("font-size: 1rem, 2rem;"));
        assert!(output.css.contains("background: rgb(255, 0, 0);"));
        assert!(output.css.contains("width: 2px;"));
        assert!(!output.css.contains("zz"));
    }

    #[test]
    fn test_tokens_rendered_once() {
        let config = config();
        let mut session = CompilationSession::new(&config, options());
        let output = session.run([
            r#"<a class="p[1px]"></a><b class="p[1px] p[1px]"></b>"#,
            r#"<c className="p[1px]"></c>"#,
        ]);

        assert_eq!(output.css.matches("padding: 1px;").count(), 1);
        assert_eq!(output.stats.files_scanned, 2);
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let config = config();
        let options = CompilerOptions {
            comments: true,
            timestamp: Some("2024-01-01T00:00:00.000Z".to_string()),
            ..Default::default()
        };
        let source = r##"<div id="box" class="w[#box:height - 2px] h|50%| #box.classes"></div>"##;

        let mut session = CompilationSession::new(&config, options);
        let first = session.run([source]);
        let second = session.run([source]);

        assert_eq!(first.css, second.css);
        assert_eq!(first.script, second.script);
        assert!(first.css.contains("Date: 2024-01-01T00:00:00.000Z"));
    }

    #[test]
    fn test_compile_resets_state() {
        let config = config();
        let mut session = CompilationSession::new(&config, options());
        session.scan_source(r#"<div class="w[#nav:height + 1px]"></div>"#);
        let first = session.compile();
        assert!(first.has_script());

        session.scan_source(r#"<div class="p[1px]"></div>"#);
        let second = session.compile();
        assert!(!second.has_script());
        assert!(!second.css.contains("var(--nav-height)"));
    }

    #[test]
    fn test_minified_output() {
        let config = config();
        let options = CompilerOptions {
            minify: true,
            ..options()
        };
        let mut session = CompilationSession::new(&config, options);
        let output = session.run([r#"<div class="px[5px] w[50%:Phone]"></div>"#]);

        assert_eq!(
            output.css,
            ".px\\[5px\\]{padding-left:5px;padding-right:5px}@media (max-width:767px){.w\\[50\\%\\:Phone\\]{width:50%}}"
        );
        assert!(output.stats.minified);
    }
}
