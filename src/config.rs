//! Project configuration
//!
//! A [`Config`] starts from built-in defaults; a `huhm.toml` / `huhm.json`
//! file is read as a partial [`ConfigFile`] and merged on top.

use crate::error::{CompilerError, Result};
use crate::types::{BreakpointTable, CssProperty, PropertyTable, Theme};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Config file names looked up in the project root, in order.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["huhm.toml", "huhm.json"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerSettings {
    pub minify: bool,
    pub comments: bool,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            minify: false,
            comments: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Glob patterns of files to scan, relative to the project root
    pub content: Vec<String>,
    /// Generated style sheet path
    pub output: String,
    /// Generated runtime script path; defaults to `output` with a `.js` extension
    pub script_output: Option<String>,
    pub breakpoints: BreakpointTable,
    pub properties: PropertyTable,
    pub theme: Theme,
    pub compiler: CompilerSettings,
}

impl Default for Config {
    fn default() -> Self {
        let content = [
            "*.html",
            "src/**/*.{html,js,jsx,ts,tsx,vue}",
            "pages/**/*.{html,jsx,tsx}",
            "views/**/*.{html,ejs}",
            "app/**/*.{html,jsx,tsx}",
            "components/**/*.{jsx,tsx,vue}",
        ];

        let breakpoints = [
            ("Phone", "(max-width: 767px)"),
            ("Tablet", "(min-width: 768px) and (max-width: 1023px)"),
            ("Computer", "(min-width: 1024px)"),
            ("Desktop", "(min-width: 1440px)"),
            ("mobile", "(max-width: 767px)"),
            ("tablets", "(min-width: 768px) and (max-width: 1023px)"),
            ("midLaptop", "(min-width: 1024px) and (max-width: 1439px)"),
            ("largeScreen", "(min-width: 1440px)"),
        ];

        let single = [
            ("w", "width"),
            ("h", "height"),
            ("p", "padding"),
            ("m", "margin"),
            ("bg", "background"),
            ("bgColor", "background-color"),
            ("bColor", "border-color"),
            ("text", "color"),
            ("textColor", "color"),
            ("rounded", "border-radius"),
            ("border", "border-width"),
        ];
        let paired: [(&str, &[&str]); 4] = [
            ("px", &["padding-left", "padding-right"]),
            ("py", &["padding-top", "padding-bottom"]),
            ("mx", &["margin-left", "margin-right"]),
            ("my", &["margin-top", "margin-bottom"]),
        ];

        let mut properties = PropertyTable::new();
        for (short, name) in single {
            properties.insert(short.to_string(), CssProperty::from(name));
        }
        for (short, names) in paired {
            properties.insert(short.to_string(), CssProperty::from(names));
        }

        Self {
            content: content.iter().map(|p| p.to_string()).collect(),
            output: "dist/HUHM.css".to_string(),
            script_output: None,
            breakpoints: breakpoints
                .iter()
                .map(|(name, media)| (name.to_string(), media.to_string()))
                .collect(),
            properties,
            theme: Theme::default(),
            compiler: CompilerSettings::default(),
        }
    }
}

/// A config file as written by the user: every field is optional.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub content: Option<Vec<String>>,
    pub output: Option<String>,
    pub script_output: Option<String>,
    pub breakpoints: Option<IndexMap<String, String>>,
    pub properties: Option<IndexMap<String, CssProperty>>,
    pub theme: Option<Theme>,
    pub compiler: Option<CompilerSettingsFile>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CompilerSettingsFile {
    pub minify: Option<bool>,
    pub comments: Option<bool>,
}

impl Config {
    /// Overlay a config file: lists and scalars replace, tables merge by key.
    pub fn merge(&mut self, file: ConfigFile) {
        if let Some(content) = file.content {
            self.content = content;
        }
        if let Some(output) = file.output {
            self.output = output;
        }
        if let Some(script_output) = file.script_output {
            self.script_output = Some(script_output);
        }
        if let Some(breakpoints) = file.breakpoints {
            self.breakpoints.extend(breakpoints);
        }
        if let Some(properties) = file.properties {
            self.properties.extend(properties);
        }
        if let Some(theme) = file.theme {
            self.theme.colors.extend(theme.colors);
            self.theme.spacing.extend(theme.spacing);
        }
        if let Some(compiler) = file.compiler {
            if let Some(minify) = compiler.minify {
                self.compiler.minify = minify;
            }
            if let Some(comments) = compiler.comments {
                self.compiler.comments = comments;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.content.iter().all(|pattern| pattern.trim().is_empty()) {
            errors.push("content: at least one file pattern is required");
        }
        if self.output.trim().is_empty() {
            errors.push("output: a style sheet path is required");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CompilerError::invalid_config(errors.join("; ")))
        }
    }

    /// Resolved script path for a project rooted at `root`.
    pub fn script_output_path(&self, root: &Path) -> PathBuf {
        match &self.script_output {
            Some(path) => root.join(path),
            None => root.join(&self.output).with_extension("js"),
        }
    }

    pub fn output_path(&self, root: &Path) -> PathBuf {
        root.join(&self.output)
    }
}

/// Load the configuration for a project.
///
/// An explicit `config_path` must exist. Without one, the first default
/// config file found in `root` is used; with none present the defaults apply.
pub fn load(config_path: Option<&str>, root: &Path) -> Result<Config> {
    let mut config = Config::default();

    let path = match config_path {
        Some(path) => Some(PathBuf::from(path)),
        None => DEFAULT_CONFIG_FILES
            .iter()
            .map(|name| root.join(name))
            .find(|candidate| candidate.exists()),
    };

    match path {
        Some(path) => {
            let file = read_config_file(&path)?;
            log::info!("Loaded configuration from {}", path.display());
            config.merge(file);
        }
        None => log::warn!("No huhm.toml found, using default configuration"),
    }

    config.validate()?;
    Ok(config)
}

pub fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let display = path.display().to_string();
    let config_content = fs::read_to_string(path).map_err(|e| CompilerError::FileNotFound {
        path: format!("Config file {}: {}", display, e),
    })?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&config_content)
            .map_err(|e| CompilerError::invalid_format(format!("Invalid JSON config: {}", e))),
        Some("toml") => toml::from_str(&config_content)
            .map_err(|e| CompilerError::invalid_format(format!("Invalid TOML config: {}", e))),
        _ => Err(CompilerError::invalid_format(
            "Config file must be .json or .toml format",
        )),
    }
}

/// Write a starter `huhm.toml`; never overwrites an existing file.
pub fn write_template(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(CompilerError::invalid_config(format!(
            "{} already exists",
            path.display()
        )));
    }
    fs::write(path, TEMPLATE)?;
    log::info!("Created configuration at {}", path.display());
    Ok(())
}

pub const TEMPLATE: &str = r##"# Files scanned for utility classes
content = [
  "*.html",
  "src/**/*.{html,js,jsx,ts,tsx,vue}",
  "pages/**/*.{html,jsx,tsx}",
  "components/**/*.{jsx,tsx,vue}",
]

# Generated style sheet; the runtime script goes next to it as .js
output = "dist/HUHM.css"

[breakpoints]
mobile = "(max-width: 767px)"
tablet = "(min-width: 768px) and (max-width: 1023px)"
laptop = "(min-width: 1024px) and (max-width: 1439px)"
desktop = "(min-width: 1440px)"

# Short names; a list sets several properties to the same value
[properties]
w = "width"
h = "height"
minW = "min-width"
maxW = "max-width"
p = "padding"
px = ["padding-left", "padding-right"]
py = ["padding-top", "padding-bottom"]
m = "margin"
mx = ["margin-left", "margin-right"]
my = ["margin-top", "margin-bottom"]
bg = "background"
bgColor = "background-color"
text = "color"
rounded = "border-radius"
fontSize = "font-size"
gap = "gap"
z = "z-index"

[theme.colors]
primary = "#3b82f6"
secondary = "#8b5cf6"
success = "#10b981"
danger = "#ef4444"
warning = "#f59e0b"

[theme.spacing]
xs = "0.25rem"
sm = "0.5rem"
md = "1rem"
lg = "1.5rem"
xl = "2rem"

[compiler]
minify = false
comments = true
"##;
