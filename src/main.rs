//! pchscope CLI - Directory-scoped precompiled header composition

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use pchscope::emit::Toolchain;
use pchscope::LanguageMode;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pchscope")]
#[command(version)]
#[command(about = "Directory-scoped precompiled header composition for C and C++ trees")]
#[command(long_about = r#"
pchscope reads per-directory PCH declarations (pch.h or pch.toml), composes
the effective include set of every directory and language mode, and emits
composed headers and compiler flags for gcc or clang:
  • Inheritance from the nearest declared ancestor, or a clean override
  • C++-only includes kept out of C translation units
  • Every misconfiguration reported in one pass

Example usage:
  pchscope init
  pchscope check
  pchscope resolve src/mongo/db --mode cpp
  pchscope flags src/mongo/db/query.cpp
  pchscope emit --toolchain clang
  pchscope survey src/mongo/s --min-count 5
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (defaults to ./pchscope.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Source root to scan (overrides the config)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    Text,
    Json,
}

impl OutputMode {
    pub fn is_human(&self) -> bool {
        *self == OutputMode::Text
    }
}

/// Print a JSON success envelope for machine consumers
pub fn emit_success(output_mode: OutputMode, command: &str, data: serde_json::Value) -> anyhow::Result<()> {
    if output_mode == OutputMode::Json {
        let envelope = serde_json::json!({
            "status": "ok",
            "command": command,
            "data": data,
        });
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    }
    Ok(())
}

/// Print a JSON failure envelope carrying diagnostics
pub fn emit_failure(output_mode: OutputMode, command: &str, data: serde_json::Value) -> anyhow::Result<()> {
    if output_mode == OutputMode::Json {
        let envelope = serde_json::json!({
            "status": "error",
            "command": command,
            "data": data,
        });
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    }
    Ok(())
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default pchscope.toml and ignore the tool's state directory
    Init {
        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Show every declared scope
    Tree,

    /// Show the composed include set of one directory
    Resolve {
        /// Directory relative to the source root
        dir: String,

        /// Language mode (c, cpp)
        #[arg(short, long, default_value = "cpp")]
        mode: LanguageMode,
    },

    /// Resolve every directory holding translation units and report problems
    Check {
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },

    /// Print the compiler flags a translation unit needs
    Flags {
        /// Source file relative to the source root
        file: PathBuf,

        /// Toolchain (overrides the config)
        #[arg(short, long)]
        toolchain: Option<Toolchain>,
    },

    /// Write composed headers and a manifest for the build step
    Emit {
        /// Toolchain (overrides the config)
        #[arg(short, long)]
        toolchain: Option<Toolchain>,

        /// Output directory (overrides the config)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Report what would be written without touching the disk
        #[arg(long)]
        dry_run: bool,
    },

    /// Count the includes used under a directory, per scope, to pick PCH contents
    Survey {
        /// Directory relative to the source root (defaults to the whole root)
        dir: Option<String>,

        /// Hide includes used by fewer files
        #[arg(long, default_value_t = 1)]
        min_count: usize,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let ctx = commands::Context {
        config_path: cli.config,
        root: cli.root,
        output_mode: cli.format,
    };

    match cli.command {
        Commands::Init { force } => commands::run_init(&ctx, force),
        Commands::Tree => commands::run_tree(&ctx),
        Commands::Resolve { dir, mode } => commands::run_resolve(&ctx, &dir, mode),
        Commands::Check { strict } => commands::run_check(&ctx, strict),
        Commands::Flags { file, toolchain } => commands::run_flags(&ctx, &file, toolchain),
        Commands::Emit {
            toolchain,
            out,
            dry_run,
        } => commands::run_emit(&ctx, toolchain, out, dry_run),
        Commands::Survey { dir, min_count } => commands::run_survey(&ctx, dir.as_deref(), min_count),
    }
}
