//! HUHM Utility Class Compiler
//!
//! Scans markup and component sources for bracket and pipe utility classes
//! such as `p[10px]`, `w[50%:Phone, 80%:Computer]` or `w|#box:width + 1rem|`
//! and turns them into a static style sheet plus, when needed, a small
//! runtime script.
//!
//! # Basic Usage
//!
//! ```rust
//! use huhm::{compile_source, Config};
//!
//! let config = Config::default();
//! let output = compile_source(r#"<div class="p[10px]"></div>"#, &config);
//! assert!(output.css.contains("padding: 10px;"));
//! ```
//!
//! # Compilation Pipeline
//!
//! 1. **Scanning**: class attribute values are pulled out of each source
//!    and split into tokens; `#id.classes` markers pull in the classes of
//!    the referenced element
//! 2. **Classification**: every unique token is resolved against the
//!    property and breakpoint tables
//! 3. **CSS generation**: base rules first, then one `@media` block per
//!    condition in first-seen order
//! 4. **Script generation**: element measurements and class copies become
//!    a self-contained script, emitted only when something needs it

pub mod types;
pub mod error;
pub mod lexer;
pub mod registry;
pub mod classifier;
pub mod codegen;
pub mod script;
pub mod session;
pub mod config;
pub mod scanner;
pub mod cli;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

// Re-export commonly used types and functions
pub use error::{CompilerError, Diagnostic, Result};
pub use types::*;
pub use lexer::{split_class_string, ClassExtractor, ClassLexer};
pub use registry::{ClassSet, ReferenceRegistry};
pub use classifier::Classifier;
pub use codegen::CodeGenerator;
pub use script::{ScriptGenerator, ScriptPlan};
pub use session::{CompilationOutput, CompilationSession};
pub use config::{CompilerSettings, Config};
pub use scanner::SourceScanner;
pub use cli::EnhancedCli;

/// Compiler version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Compiler build information
pub const BUILD_INFO: CompilerInfo = CompilerInfo {
    version: VERSION,
    name: NAME,
    description: DESCRIPTION,
    supported_features: &[
        "literals",
        "responsive",
        "media-queries",
        "calc",
        "clamp",
        "rgb",
        "element-references",
        "class-copy",
        "theme",
    ],
};

/// Compiler information structure
#[derive(Debug, Clone)]
pub struct CompilerInfo {
    pub version: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub supported_features: &'static [&'static str],
}

/// Compilation options and settings
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    /// Strip comments and whitespace from both outputs
    pub minify: bool,

    /// Emit the header comment
    pub comments: bool,

    /// Fixed header timestamp; `None` uses the current time.
    /// Set it to get byte-identical output across runs.
    pub timestamp: Option<String>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self::from_settings(&CompilerSettings::default())
    }
}

impl CompilerOptions {
    pub fn from_settings(settings: &CompilerSettings) -> Self {
        Self {
            minify: settings.minify,
            comments: settings.comments,
            timestamp: None,
        }
    }

    /// Timestamp for the header comment, or `None` when comments are off.
    pub fn header_timestamp(&self) -> Option<String> {
        if !self.comments {
            return None;
        }
        Some(
            self.timestamp
                .clone()
                .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        )
    }
}

/// Compilation statistics and metrics
#[derive(Debug, Clone, Default, Serialize)]
pub struct CompilationStats {
    /// Number of source files (or texts) scanned
    pub files_scanned: usize,

    /// Number of unique utility tokens
    pub token_count: usize,

    /// Number of CSS rules emitted, media rules included
    pub rule_count: usize,

    pub element_reference_count: usize,
    pub class_copy_count: usize,
    pub diagnostic_count: usize,

    /// Style sheet size in bytes
    pub css_size: u64,

    /// Runtime script size in bytes (0 when none was needed)
    pub script_size: u64,

    pub minified: bool,

    /// Compilation time in milliseconds
    pub compile_time_ms: u64,
}

/// Result of building a whole project.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub css_path: PathBuf,
    /// Set when a runtime script was written
    pub script_path: Option<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: CompilationStats,
}

/// Compile a single source text with the options from `config`.
pub fn compile_source(content: &str, config: &Config) -> CompilationOutput {
    compile_source_with_options(content, config, CompilerOptions::from_settings(&config.compiler))
}

/// Compile a single source text with custom options
pub fn compile_source_with_options(
    content: &str,
    config: &Config,
    options: CompilerOptions,
) -> CompilationOutput {
    let mut session = CompilationSession::new(config, options);
    session.run([content])
}

/// Scan every content file under `root`, then write the style sheet and,
/// when needed, the runtime script.
pub fn build_project(config: &Config, root: &Path, options: CompilerOptions) -> Result<BuildReport> {
    let start_time = Instant::now();

    let scanner = SourceScanner::new(root, &config.content)?;
    let files = scanner.discover()?;
    log::info!("Scanning {} files...", files.len());

    let mut session = CompilationSession::new(config, options);
    session.reset();

    for path in &files {
        let source = fs::read_to_string(path).map_err(|e| CompilerError::FileNotFound {
            path: format!("{}: {}", path.display(), e),
        })?;
        log::debug!("Scanning {}", path.display());
        session.scan_source(&source);
    }

    if session.classes().is_empty() {
        log::warn!("No utility classes found in {} files", files.len());
    }

    let mut output = session.compile();
    output.stats.compile_time_ms = start_time.elapsed().as_millis() as u64;

    let css_path = config.output_path(root);
    write_output(&css_path, &output.css)?;
    log::info!("Wrote {} ({} bytes)", css_path.display(), output.stats.css_size);

    let script_file = config.script_output_path(root);
    let script_path = if output.has_script() {
        write_output(&script_file, &output.script)?;
        log::info!("Wrote {} ({} bytes)", script_file.display(), output.stats.script_size);
        Some(script_file)
    } else {
        if script_file.exists() {
            fs::remove_file(&script_file)?;
            log::debug!("Removed stale runtime script {}", script_file.display());
        }
        None
    };

    log::debug!("Full stats: {:?}", output.stats);

    Ok(BuildReport {
        css_path,
        script_path,
        diagnostics: output.diagnostics,
        stats: output.stats,
    })
}

fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

/// Get compiler build information
pub fn build_info() -> &'static CompilerInfo {
    &BUILD_INFO
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project(files: &[(&str, &str)]) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        for (name, content) in files {
            let path = temp_dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        temp_dir
    }

    #[test]
    fn test_compile_source() {
        let config = Config::default();
        let output = compile_source(r#"<div class="p[10px] px[5px]"></div>"#, &config);

        assert!(output.css.starts_with("/*\n * Generated by HUHM"));
        assert!(output.css.contains(".p\\[10px\\] { padding: 10px; }"));
        assert!(output
            .css
            .contains(".px\\[5px\\] { padding-left: 5px; padding-right: 5px; }"));
        assert_eq!(output.stats.token_count, 2);
    }

    #[test]
    fn test_header_timestamp() {
        let options = CompilerOptions {
            timestamp: Some("fixed".to_string()),
            ..Default::default()
        };
        assert_eq!(options.header_timestamp().as_deref(), Some("fixed"));

        let live = CompilerOptions::default().header_timestamp().unwrap();
        assert!(live.ends_with('Z'));
        assert!(live.contains('T'));

        let no_comments = CompilerOptions {
            comments: false,
            ..Default::default()
        };
        assert_eq!(no_comments.header_timestamp(), None);
    }

    #[test]
    fn test_build_project() {
        let temp_dir = project(&[
            ("index.html", r#"<div id="hero" class="h[100vh]"></div>"#),
            (
                "src/app.jsx",
                r#"<div className="w[#hero:height - 4rem] m[1px]"></div>"#,
            ),
            ("node_modules/lib/index.html", r#"<div class="p[99px]"></div>"#),
        ]);
        let config = Config::default();

        let report = build_project(&config, temp_dir.path(), CompilerOptions::default()).unwrap();

        let css = fs::read_to_string(&report.css_path).unwrap();
        assert_eq!(report.css_path, temp_dir.path().join("dist/HUHM.css"));
        assert!(css.contains("height: 100vh;"));
        assert!(css.contains("calc(var(--hero-height) - 4rem)"));
        assert!(!css.contains("99px"));

        let script_path = report.script_path.unwrap();
        assert_eq!(script_path, temp_dir.path().join("dist/HUHM.js"));
        let script = fs::read_to_string(script_path).unwrap();
        assert!(script.contains("--hero-height"));
        assert_eq!(report.stats.files_scanned, 2);
    }

    #[test]
    fn test_build_without_runtime_script() {
        let temp_dir = project(&[("index.html", r#"<p class="text[red] flex"></p>"#)]);
        let stale = temp_dir.path().join("dist/HUHM.js");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, "old").unwrap();

        let report =
            build_project(&Config::default(), temp_dir.path(), CompilerOptions::default()).unwrap();

        assert!(report.script_path.is_none());
        assert!(!stale.exists());
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn test_build_with_no_tokens_writes_empty_sheet() {
        let temp_dir = project(&[("index.html", r#"<p class="flex"></p>"#)]);
        let options = CompilerOptions {
            comments: false,
            ..Default::default()
        };

        let report = build_project(&Config::default(), temp_dir.path(), options).unwrap();

        assert_eq!(fs::read_to_string(report.css_path).unwrap(), "");
        assert_eq!(report.stats.token_count, 0);
    }

    #[test]
    fn test_build_is_idempotent() {
        let temp_dir = project(&[(
            "index.html",
            r##"<div id="a" class="w[50%:Phone, 80%:Computer] bg[1,2,3]"></div><b class="#a.classes"></b>"##,
        )]);
        let options = CompilerOptions {
            timestamp: Some("2024-01-01T00:00:00.000Z".to_string()),
            ..Default::default()
        };
        let config = Config::default();

        let first = build_project(&config, temp_dir.path(), options.clone()).unwrap();
        let first_css = fs::read(&first.css_path).unwrap();
        let second = build_project(&config, temp_dir.path(), options).unwrap();
        let second_css = fs::read(&second.css_path).unwrap();

        assert_eq!(first_css, second_css);
    }

    #[test]
    fn test_build_info() {
        let info = build_info();
        assert!(!info.version.is_empty());
        assert_eq!(info.name, "huhm");
        assert!(info.supported_features.contains(&"responsive"));
        assert!(info.supported_features.contains(&"class-copy"));
    }

    #[test]
    fn test_compiler_options_default() {
        let options = CompilerOptions::default();
        assert!(!options.minify);
        assert!(options.comments);
        assert!(options.timestamp.is_none());
    }
}
