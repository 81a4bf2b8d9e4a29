use crate::{emit_failure, emit_success, OutputMode};
use owo_colors::OwoColorize;
use pchscope::config::{self, PchConfig};
use pchscope::decl::registry_for;
use pchscope::emit::{PchEmitter, Toolchain};
use pchscope::session::Session;
use pchscope::survey::IncludeSurvey;
use pchscope::ui::{self, theme, Icons, ProgressManager, ProgressMessage, ProgressPhase};
use pchscope::{CompositionResult, Diagnostic, Error, LanguageMode, ScopePath, Scanner, TranslationUnit};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Global options shared by every subcommand
pub struct Context {
    pub config_path: Option<PathBuf>,
    pub root: Option<PathBuf>,
    pub output_mode: OutputMode,
}

impl Context {
    fn config_path(&self) -> PathBuf {
        self.config_path.clone().unwrap_or_else(config::default_config_path)
    }

    fn load_config(&self) -> anyhow::Result<PchConfig> {
        Ok(config::load_config(Some(&self.config_path()))?.unwrap_or_default())
    }

    fn root(&self, config: &PchConfig) -> PathBuf {
        self.root
            .clone()
            .or_else(|| config.root.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// A scanned source root with its immutable scope tree
struct Workspace {
    root: PathBuf,
    config: PchConfig,
    scanner: Scanner,
    session: Session,
}

fn load_workspace(ctx: &Context, progress: Option<&ProgressManagerHandle>) -> anyhow::Result<Workspace> {
    let config = ctx.load_config()?;
    let root = ctx.root(&config);
    if !root.is_dir() {
        anyhow::bail!("source root {} is not a directory", root.display());
    }

    let scanner = Scanner::new(&root)
        .with_registry(registry_for(&config.declaration_files))
        .with_excludes(config.exclude.clone());
    let scan = scanner.scan_with_progress(progress.map(|p| &p.tx))?;

    match Session::from_scan(scan) {
        Ok(session) => Ok(Workspace {
            root,
            scanner,
            session: session.with_jobs(config.jobs),
            config,
        }),
        Err(Error::MalformedTree(diagnostics)) => {
            report_diagnostics(ctx.output_mode, "scan", &diagnostics)?;
            anyhow::bail!("scope tree is malformed: {} problem(s)", diagnostics.len());
        }
        Err(e) => Err(e.into()),
    }
}

/// Progress bars plus the sender workers report through
struct ProgressManagerHandle {
    manager: ProgressManager,
    tx: crossbeam::channel::Sender<ProgressMessage>,
}

impl ProgressManagerHandle {
    fn new() -> Self {
        let (manager, tx) = ProgressManager::new();
        Self { manager, tx }
    }

    fn finish(self) -> ProgressManager {
        drop(self.tx);
        self.manager
    }
}

fn report_diagnostics(output_mode: OutputMode, command: &str, diagnostics: &[Diagnostic]) -> anyhow::Result<()> {
    if output_mode.is_human() {
        for d in diagnostics {
            ui::diagnostic(d);
        }
        Ok(())
    } else {
        emit_failure(output_mode, command, serde_json::json!({ "diagnostics": diagnostics }))
    }
}

pub fn run_init(ctx: &Context, force: bool) -> anyhow::Result<()> {
    let path = ctx.config_path();
    let mut config = PchConfig::default();
    if let Some(root) = &ctx.root {
        config.root = Some(root.display().to_string());
    }
    config::write_config(&path, &config, force)?;

    let project_root = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    config::ensure_gitignore(project_root)?;

    if ctx.output_mode.is_human() {
        ui::success(&format!("Wrote {}", path.display()));
        ui::info("Declaration files", &config.declaration_files.join(", "));
        ui::info("Build directory", &config.build_dir);
    } else {
        emit_success(ctx.output_mode, "init", serde_json::json!({ "config": path, "settings": config }))?;
    }
    Ok(())
}

pub fn run_tree(ctx: &Context) -> anyhow::Result<()> {
    let ws = load_workspace(ctx, None)?;
    let tree = ws.session.tree();

    if !ctx.output_mode.is_human() {
        let nodes: Vec<_> = tree.nodes().collect();
        return emit_success(
            ctx.output_mode,
            "tree",
            serde_json::json!({
                "root": ws.root,
                "directories": tree.directories().count(),
                "scopes": nodes,
            }),
        );
    }

    ui::header(&format!("Scope tree of {}", ws.root.display()));
    if tree.is_empty() {
        println!("{} No scopes declared.", Icons::EMPTY);
        return Ok(());
    }
    println!("{}", ui::scope_table(tree.nodes()));

    let conflicted: Vec<_> = tree
        .directories()
        .filter_map(|dir| tree.conflict_at(dir).map(|files| (dir, files)))
        .collect();
    if !conflicted.is_empty() {
        ui::section("Conflicting declarations");
        for (dir, files) in conflicted {
            let files: Vec<String> = files.iter().map(|f| f.display().to_string()).collect();
            println!("  {} {}: {}", Icons::CROSS, dir.style(theme().scope.clone()), files.join(", "));
        }
    }
    Ok(())
}

pub fn run_resolve(ctx: &Context, dir: &str, mode: LanguageMode) -> anyhow::Result<()> {
    let ws = load_workspace(ctx, None)?;
    let directory = ScopePath::parse(dir)?;
    if !ws.session.tree().contains_directory(&directory) {
        anyhow::bail!("{} is not a scanned directory under {}", directory, ws.root.display());
    }

    let result = ws.session.resolve(&directory, mode);

    if !ctx.output_mode.is_human() {
        let data = serde_json::to_value(result.as_ref())?;
        return if result.is_resolved() {
            emit_success(ctx.output_mode, "resolve", data)
        } else {
            emit_failure(ctx.output_mode, "resolve", data)?;
            anyhow::bail!("{} ({}) did not resolve", directory, mode)
        };
    }

    match result.as_ref() {
        CompositionResult::Resolved { set, warnings } => {
            ui::header(&format!("{} ({})", directory, mode));
            match &set.scope {
                Some(scope) => {
                    let chain: Vec<String> = set.chain.iter().map(|s| s.to_string()).collect();
                    ui::status(Icons::PACKAGE, "Scope", &scope.to_string());
                    ui::status(Icons::LINK, "Chain", &chain.join(" → "));
                }
                None => ui::status(Icons::EMPTY, "Scope", "none"),
            }
            if set.is_empty() {
                println!("{} No includes apply.", Icons::EMPTY);
            }
            for (i, include) in set.includes.iter().enumerate() {
                println!("  {:>3}. {}", i + 1, include.spelled().style(theme().include.clone()));
            }
            for w in warnings {
                ui::diagnostic(w);
            }
            Ok(())
        }
        CompositionResult::Failed { diagnostics, .. } => {
            report_diagnostics(ctx.output_mode, "resolve", diagnostics)?;
            anyhow::bail!("{} ({}) did not resolve", directory, mode)
        }
    }
}

pub fn run_check(ctx: &Context, strict: bool) -> anyhow::Result<()> {
    let start = Instant::now();
    let progress = ProgressManagerHandle::new();
    let ws = load_workspace(ctx, Some(&progress))?;
    let report = ws.session.resolve_all(Some(&progress.tx))?;
    let manager = progress.finish();

    let stats = report.stats();
    let diagnostics = report.diagnostics();

    if ctx.output_mode.is_human() {
        manager.finish_with_summary(start.elapsed(), stats.total, ws.session.tree().len(), stats.failed);
        for d in &diagnostics {
            ui::diagnostic(d);
        }
        println!("{}", ui::stats_table(&stats));
    } else {
        manager.join();
        let data = serde_json::json!({
            "stats": {
                "total": stats.total,
                "resolved": stats.resolved,
                "without_scope": stats.without_scope,
                "failed": stats.failed,
                "errors": stats.errors,
                "warnings": stats.warnings,
            },
            "diagnostics": diagnostics,
        });
        if stats.errors == 0 && !(strict && stats.warnings > 0) {
            emit_success(ctx.output_mode, "check", data)?;
        } else {
            emit_failure(ctx.output_mode, "check", data)?;
        }
    }

    if stats.errors > 0 {
        anyhow::bail!("{} error(s) in {} directory/mode pair(s)", stats.errors, stats.failed);
    }
    if strict && stats.warnings > 0 {
        anyhow::bail!("{} warning(s) with --strict", stats.warnings);
    }
    if ctx.output_mode.is_human() {
        ui::success("All scopes resolve cleanly");
    }
    Ok(())
}

pub fn run_flags(ctx: &Context, file: &Path, toolchain: Option<Toolchain>) -> anyhow::Result<()> {
    let ws = load_workspace(ctx, None)?;
    let relative = file.strip_prefix(&ws.root).unwrap_or(file);
    let Some(unit) = TranslationUnit::from_path(relative)? else {
        anyhow::bail!("{} is not a C or C++ source file", file.display());
    };

    let emitter = PchEmitter::new(
        toolchain.unwrap_or(ws.config.toolchain),
        ws.config.build_dir_in(&ws.root),
    )?;
    let result = ws.session.resolve_unit(&unit);
    let set = match result.as_ref() {
        CompositionResult::Resolved { set, .. } => set,
        CompositionResult::Failed { diagnostics, .. } => {
            report_diagnostics(ctx.output_mode, "flags", diagnostics)?;
            anyhow::bail!("no PCH for {}: its scope did not resolve", unit.path.display());
        }
    };
    let flags = emitter.unit_flags(set)?;

    if ctx.output_mode.is_human() {
        println!("{}", flags.join(" "));
    } else {
        emit_success(
            ctx.output_mode,
            "flags",
            serde_json::json!({ "unit": unit, "scope": set.scope, "flags": flags }),
        )?;
    }
    Ok(())
}

pub fn run_emit(
    ctx: &Context,
    toolchain: Option<Toolchain>,
    out: Option<PathBuf>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let start = Instant::now();
    let progress = ProgressManagerHandle::new();
    let ws = load_workspace(ctx, Some(&progress))?;
    let report = ws.session.resolve_all(Some(&progress.tx))?;

    if report.has_errors() {
        progress.finish().join();
        let errors: Vec<Diagnostic> = report.diagnostics().into_iter().filter(|d| d.is_error()).collect();
        report_diagnostics(ctx.output_mode, "emit", &errors)?;
        anyhow::bail!("refusing to emit: {} error(s)", errors.len());
    }

    let build_dir = out.unwrap_or_else(|| ws.config.build_dir_in(&ws.root));
    let emitter = PchEmitter::new(toolchain.unwrap_or(ws.config.toolchain), &build_dir)?;
    let manifest = emitter.manifest(report.resolved_sets())?;

    let mut written = Vec::new();
    if !dry_run {
        config::ensure_build_dir(&build_dir)?;
        let tx = &progress.tx;
        tx.send(ProgressMessage::Started {
            phase: ProgressPhase::Emitting,
            total: manifest.entries.len(),
        })
        .ok();
        // One header per (scope, mode); the first set of each group is representative
        let mut seen = BTreeSet::new();
        for set in report.resolved_sets() {
            let Some(scope) = &set.scope else {
                continue;
            };
            if !seen.insert((scope.clone(), set.mode)) {
                continue;
            }
            if emitter.write_header(set)? {
                written.push(emitter.header_path(scope, set.mode));
            }
            tx.send(ProgressMessage::Progress {
                phase: ProgressPhase::Emitting,
                item: Some(scope.to_string()),
            })
            .ok();
        }
        tx.send(ProgressMessage::Finished {
            phase: ProgressPhase::Emitting,
        })
        .ok();
        std::fs::write(build_dir.join("manifest.json"), serde_json::to_string_pretty(&manifest)?)?;
    }
    let manager = progress.finish();

    if !ctx.output_mode.is_human() {
        manager.join();
        return emit_success(
            ctx.output_mode,
            "emit",
            serde_json::json!({ "dry_run": dry_run, "written": written, "manifest": manifest }),
        );
    }

    manager.finish_with_summary(start.elapsed(), report.len(), manifest.entries.len(), 0);
    for entry in &manifest.entries {
        let header = entry.header.display().to_string();
        if written.contains(&entry.header) {
            ui::file_new(&header);
        } else {
            ui::file_unchanged(&header);
        }
    }
    let shared = manifest.shared_artifacts();
    ui::summary_row("Headers:", &manifest.entries.len().to_string());
    ui::summary_row("Distinct compositions:", &shared.len().to_string());
    if dry_run {
        ui::info("Dry run", "nothing written");
    }
    Ok(())
}

pub fn run_survey(ctx: &Context, dir: Option<&str>, min_count: usize) -> anyhow::Result<()> {
    let ws = load_workspace(ctx, None)?;
    let within = match dir {
        Some(dir) => ScopePath::parse(dir)?,
        None => ScopePath::root(),
    };
    if !ws.session.tree().contains_directory(&within) {
        anyhow::bail!("{} is not a scanned directory under {}", within, ws.root.display());
    }

    let survey = IncludeSurvey::collect(&ws.scanner, &ws.session, &within)?;

    if !ctx.output_mode.is_human() {
        return emit_success(ctx.output_mode, "survey", serde_json::to_value(&survey)?);
    }

    ui::header(&format!("Include survey of {}", within));
    if survey.scopes.is_empty() {
        println!("{} No C or C++ sources found.", Icons::EMPTY);
        return Ok(());
    }
    for scope in &survey.scopes {
        let name = scope
            .scope
            .as_ref()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "no scope".to_string());
        ui::section(&format!(" {} ({}) ", name, scope.mode));
        ui::summary_row("Files:", &scope.files.to_string());
        let shown: Vec<_> = scope
            .includes
            .iter()
            .filter(|c| c.count >= min_count)
            .collect();
        if shown.is_empty() {
            println!("  {} No include used by {} or more files.", Icons::EMPTY, min_count);
            continue;
        }
        println!("{}", ui::survey_table(shown));
        let candidates = scope.candidates(min_count).count();
        if scope.scope.is_some() && candidates > 0 {
            ui::info("Not yet precompiled", &candidates.to_string());
        }
    }
    Ok(())
}
