// FILE: src/cli/handlers.rs
use crate::{
    build_project, cli::OutputFormat, config, BuildReport, CompilationStats, CompilerError,
    CompilerOptions, Config, Diagnostic, Result, SourceScanner,
};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::time::Duration;

/// Quiet period after the last event before a rebuild starts.
const WATCH_SETTLE: Duration = Duration::from_millis(50);

// --- INIT ---
pub fn handle_init_command(cli: &super::EnhancedCli) -> Result<()> {
    let path = cli.root().join(config::DEFAULT_CONFIG_FILES[0]);
    config::write_template(&path)?;

    println!("✅ Created {}", path.display());
    println!("\nNext steps:");
    println!("   add utility classes such as p[1rem] or w[50%:mobile] to your markup");
    println!("   huhm build");

    Ok(())
}

// --- BUILD ---
pub fn handle_build_command(cli: &super::EnhancedCli, matches: &clap::ArgMatches) -> Result<()> {
    let config = cli.load_config()?;
    let options = cli.build_compiler_options(&config, matches);
    let format = matches
        .get_one::<OutputFormat>("format")
        .copied()
        .unwrap_or(OutputFormat::Text);

    if format == OutputFormat::Text {
        println!("🔨 Building {}", cli.root().display());
    }

    let report = build_project(&config, cli.root(), options)?;

    if !matches.get_flag("stats") {
        print_build_summary(&report);
        return Ok(());
    }

    match format {
        OutputFormat::Text => {
            print_build_summary(&report);
            print_detailed_stats(&report.stats);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report.stats).map_err(|e| {
                CompilerError::invalid_format(format!("Failed to serialize stats: {}", e))
            })?;
            println!("{}", json);
        }
    }

    Ok(())
}

// --- WATCH ---
pub fn handle_watch_command(cli: &super::EnhancedCli, matches: &clap::ArgMatches) -> Result<()> {
    let config = cli.load_config()?;
    let options = cli.build_compiler_options(&config, matches);
    let root = cli.root().canonicalize()?;
    let scanner = SourceScanner::new(&root, &config.content)?;

    run_build(&config, &root, &options);

    let (tx, rx) = channel();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(e) = tx.send(event) {
                    eprintln!("Watch error: {}", e);
                }
            }
            Err(e) => log::warn!("Watch error: {}", e),
        },
        notify::Config::default(),
    )
    .map_err(|e| CompilerError::watch(format!("Failed to create file watcher: {}", e)))?;

    let watched = scanner.root();
    watcher
        .watch(watched, RecursiveMode::Recursive)
        .map_err(|e| CompilerError::watch(format!("Failed to watch {}: {}", watched.display(), e)))?;

    println!("👀 Watching {} for changes...", watched.display());

    loop {
        let event = rx
            .recv()
            .map_err(|e| CompilerError::watch(format!("Watcher disconnected: {}", e)))?;

        let mut changed = relevant_paths(&scanner, &event);
        if changed.is_empty() {
            continue;
        }

        // One rebuild per burst; the next session starts only after this one returns
        changed.extend(drain_burst(&rx, &scanner));
        changed.sort();
        changed.dedup();

        for path in &changed {
            log::info!("Changed: {}", path.display());
        }
        println!("🔄 {} file(s) changed, rebuilding...", changed.len());
        run_build(&config, &root, &options);
    }
}

fn run_build(config: &Config, root: &Path, options: &CompilerOptions) {
    match build_project(config, root, options.clone()) {
        Ok(report) => print_build_summary(&report),
        Err(e) => eprintln!("❌ Build failed: {}", e),
    }
}

/// Paths in `event` that are content files. Access events never count.
fn relevant_paths(scanner: &SourceScanner, event: &Event) -> Vec<PathBuf> {
    if event.kind.is_access() || event.kind.is_other() {
        return Vec::new();
    }

    event
        .paths
        .iter()
        .filter(|path| scanner.is_match(path))
        .cloned()
        .collect()
}

fn drain_burst(rx: &Receiver<Event>, scanner: &SourceScanner) -> Vec<PathBuf> {
    let mut changed = Vec::new();
    while let Ok(event) = rx.recv_timeout(WATCH_SETTLE) {
        changed.extend(relevant_paths(scanner, &event));
    }
    changed
}

// --- HELPERS ---
fn print_build_summary(report: &BuildReport) {
    let stats = &report.stats;
    println!("✅ Build successful!");
    println!("   CSS: {} ({} bytes)", report.css_path.display(), stats.css_size);
    if let Some(script_path) = &report.script_path {
        println!("   Script: {} ({} bytes)", script_path.display(), stats.script_size);
    }
    println!(
        "   {} tokens, {} rules, {}ms",
        stats.token_count, stats.rule_count, stats.compile_time_ms
    );
    if !report.diagnostics.is_empty() {
        println!("   ⚠️  {} warning(s)", report.diagnostics.len());
        let tokens = warned_tokens(&report.diagnostics);
        if !tokens.is_empty() {
            println!("      in {}", tokens.join(" "));
        }
    }
}

/// Distinct tokens named by `diagnostics`, in report order.
fn warned_tokens(diagnostics: &[Diagnostic]) -> Vec<&str> {
    let mut tokens: Vec<&str> = Vec::new();
    for token in diagnostics.iter().filter_map(Diagnostic::token) {
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens
}

fn print_detailed_stats(stats: &CompilationStats) {
    println!("\n📊 Detailed Compilation Statistics:");
    println!("   Files scanned: {}", stats.files_scanned);
    println!("   Unique tokens: {}", stats.token_count);
    println!("   Rules: {}", stats.rule_count);
    println!("   CSS size: {} bytes", stats.css_size);
    println!("   Script size: {} bytes", stats.script_size);
    println!("   Minified: {}", stats.minified);
    println!("   Compile time: {}ms", stats.compile_time_ms);
    println!("\n   Runtime support:");
    println!("     Element references: {}", stats.element_reference_count);
    println!("     Class copies: {}", stats.class_copy_count);
    println!("     Warnings: {}", stats.diagnostic_count);
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, EventKind, ModifyKind};

    fn scanner() -> SourceScanner {
        SourceScanner::new("/project", &["*.html".to_string(), "src/**/*.jsx".to_string()]).unwrap()
    }

    #[test]
    fn test_relevant_paths() {
        let event = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/project/index.html"))
            .add_path(PathBuf::from("/project/dist/HUHM.css"))
            .add_path(PathBuf::from("/project/src/app.jsx"));

        assert_eq!(
            relevant_paths(&scanner(), &event),
            vec![
                PathBuf::from("/project/index.html"),
                PathBuf::from("/project/src/app.jsx")
            ]
        );
    }

    #[test]
    fn test_access_events_ignored() {
        let event = Event::new(EventKind::Access(AccessKind::Any))
            .add_path(PathBuf::from("/project/index.html"));
        assert!(relevant_paths(&scanner(), &event).is_empty());
    }

    #[test]
    fn test_warned_tokens() {
        let diagnostics = vec![
            Diagnostic::UnknownProperty {
                token: "zz[1px]".to_string(),
                property: "zz".to_string(),
            },
            Diagnostic::UnresolvedElementReference {
                element_id: "card".to_string(),
            },
            Diagnostic::MalformedClamp {
                token: "fontSize[1rem, 2rem]".to_string(),
                parts: 2,
            },
            Diagnostic::UnknownProperty {
                token: "zz[1px]".to_string(),
                property: "zz".to_string(),
            },
        ];

        assert_eq!(warned_tokens(&diagnostics), vec!["zz[1px]", "fontSize[1rem, 2rem]"]);
        assert!(warned_tokens(&diagnostics[1..2]).is_empty());
    }

    #[test]
    fn test_drain_burst() {
        let (tx, rx) = channel();
        for name in ["a.html", "b.html", "notes.txt"] {
            tx.send(
                Event::new(EventKind::Create(CreateKind::File))
                    .add_path(PathBuf::from("/project").join(name)),
            )
            .unwrap();
        }

        let changed = drain_burst(&rx, &scanner());
        assert_eq!(changed.len(), 2);
    }
}
