// FILE: src/cli/mod.rs

mod handlers;

use crate::config::{self, Config};
use crate::error::Result;
use crate::CompilerOptions;
use clap::{Arg, ArgAction, Command, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub struct EnhancedCli {
    config_path: Option<String>,
    root: PathBuf,
    start_time: Instant,
}

impl EnhancedCli {
    pub fn new() -> Self {
        Self {
            config_path: None,
            root: PathBuf::from("."),
            start_time: Instant::now(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        self.start_time = Instant::now();
        let matches = self.build_cli().get_matches();

        self.config_path = matches.get_one::<String>("config").cloned();
        if let Some(root) = matches.get_one::<String>("root") {
            self.root = PathBuf::from(root);
        }

        self.setup_logging(matches.get_count("verbose"))?;

        let info = crate::build_info();
        log::debug!(
            "{} v{} ({})",
            info.name,
            info.version,
            info.supported_features.join(", ")
        );

        let result = match matches.subcommand() {
            Some(("init", _)) => handlers::handle_init_command(self),
            Some(("build", sub_matches)) => handlers::handle_build_command(self, sub_matches),
            Some(("watch", sub_matches)) => handlers::handle_watch_command(self, sub_matches),
            _ => {
                println!("No subcommand specified. Use --help for usage information.");
                Ok(())
            }
        };

        log::debug!("Finished in {}ms", self.start_time.elapsed().as_millis());
        result
    }

    fn build_cli(&self) -> Command {
        Command::new(crate::NAME)
            .version(crate::VERSION)
            .about(crate::DESCRIPTION)
            .author("HUHM Development Team")
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path (default: huhm.toml or huhm.json in the root)")
                    .global(true)
                    .action(ArgAction::Set),
            )
            .arg(
                Arg::new("root")
                    .short('r')
                    .long("root")
                    .value_name("DIR")
                    .help("Project root")
                    .default_value(".")
                    .global(true)
                    .action(ArgAction::Set),
            )
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .help("Increase verbosity (can be used multiple times)")
                    .global(true)
                    .action(ArgAction::Count),
            )
            .subcommand(Command::new("init").about("Write a starter huhm.toml"))
            .subcommand(
                Command::new("build")
                    .about("Scan content files and write the style sheet and runtime script")
                    .arg(Arg::new("minify").short('m').long("minify").help("Minify both outputs").action(ArgAction::SetTrue))
                    .arg(Arg::new("no-comments").long("no-comments").help("Omit the header comment").action(ArgAction::SetTrue))
                    .arg(Arg::new("stats").long("stats").help("Show detailed compilation statistics").action(ArgAction::SetTrue))
                    .arg(Arg::new("format").short('f').long("format").value_parser(clap::value_parser!(OutputFormat)).default_value("text").help("Statistics output format")),
            )
            .subcommand(
                Command::new("watch")
                    .visible_alias("dev")
                    .about("Build, then rebuild whenever a content file changes")
                    .arg(Arg::new("minify").short('m').long("minify").help("Minify both outputs").action(ArgAction::SetTrue))
                    .arg(Arg::new("no-comments").long("no-comments").help("Omit the header comment").action(ArgAction::SetTrue)),
            )
    }

    fn setup_logging(&self, verbose_count: u8) -> Result<()> {
        let log_level = match verbose_count {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        env_logger::Builder::from_default_env()
            .filter_level(log_level)
            .format_timestamp_secs()
            .init();
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn load_config(&self) -> Result<Config> {
        config::load(self.config_path.as_deref(), &self.root)
    }

    /// Options from the config's `[compiler]` table, overridden by flags.
    pub fn build_compiler_options(&self, config: &Config, matches: &clap::ArgMatches) -> CompilerOptions {
        let mut options = CompilerOptions::from_settings(&config.compiler);
        if matches.get_flag("minify") {
            options.minify = true;
        }
        if matches.get_flag("no-comments") {
            options.comments = false;
        }
        options
    }
}

impl Default for EnhancedCli {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        EnhancedCli::new().build_cli().debug_assert();
    }

    #[test]
    fn test_flags_override_config() {
        let cli = EnhancedCli::new();
        let matches = cli
            .build_cli()
            .try_get_matches_from(["huhm", "build", "--minify", "--no-comments"])
            .unwrap();
        let (_, build_matches) = matches.subcommand().unwrap();

        let options = cli.build_compiler_options(&Config::default(), build_matches);
        assert!(options.minify);
        assert!(!options.comments);
    }

    #[test]
    fn test_watch_alias_and_global_args() {
        let cli = EnhancedCli::new();
        let matches = cli
            .build_cli()
            .try_get_matches_from(["huhm", "dev", "-c", "site.toml", "-vv"])
            .unwrap();

        assert_eq!(matches.subcommand_name(), Some("watch"));
        assert_eq!(matches.get_one::<String>("config").map(String::as_str), Some("site.toml"));
        assert_eq!(matches.get_count("verbose"), 2);
    }

    #[test]
    fn test_stats_format() {
        let cli = EnhancedCli::new();
        let matches = cli
            .build_cli()
            .try_get_matches_from(["huhm", "build", "--stats", "--format", "json"])
            .unwrap();
        let (_, build_matches) = matches.subcommand().unwrap();

        assert!(build_matches.get_flag("stats"));
        assert_eq!(build_matches.get_one::<OutputFormat>("format"), Some(&OutputFormat::Json));
    }
}
