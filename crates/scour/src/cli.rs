//! Command implementations behind the `scour` binary.
//!
//! Each `run_*` function loads what it needs, does the work and returns a
//! response value. Argument parsing, logging setup and JSON output live in
//! `main.rs`.
//!
//! ## Snapshot inputs
//!
//! A snapshot argument is either one JSON [`CompilationSnapshot`] document or
//! a directory. In a directory every `*.json` file is a [`UnitSnapshot`],
//! except a top-level `symbols.json`, which holds the [`SymbolSnapshot`].
//! Directory files are read in file-name order.
//!
//! ## Configuration
//!
//! Settings come from `.scour/config.toml` in the project root: the
//! `--project` directory when given, otherwise the nearest directory above
//! the current one that has a `.scour/`. Without either, defaults apply.

use std::fs;
use std::path::{Path, PathBuf};

use scour_core::config::{find_project_root, Config, ConfigError};
use scour_core::output::{
    CheckResponse, DumpResponse, DumpedUnit, FixResponse, FixedUnit, RuleInfo, RulesResponse,
};
use scour_core::rewrite::{fix_all, FixOptions};
use scour_core::snapshot::{Compilation, CompilationSnapshot, SymbolSnapshot, UnitSnapshot};
use scour_core::tree::notation::to_notation;
use scour_core::types::ContentHash;
use scour_core::{
    DispatchOptions, Dispatcher, Registry, ScourError, SemanticModel, SyntaxTree, Unbound,
};
use scour_rules::builtin_registry_with;
use serde::Serialize;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Symbol table file inside a snapshot directory.
pub const SYMBOLS_FILE: &str = "symbols.json";

// ============================================================================
// Configuration
// ============================================================================

/// Load the project configuration.
pub fn load_config(project: Option<&Path>) -> Result<Config, ScourError> {
    let root = match project {
        Some(root) => root.to_path_buf(),
        None => match find_project_root() {
            Ok(root) => root,
            Err(ConfigError::NotInitialized { start }) => {
                debug!(%start, "no .scour directory, using default settings");
                return Ok(Config::default());
            }
            Err(err) => return Err(err.into()),
        },
    };
    debug!(root = %root.display(), "loading configuration");
    Ok(Config::load_from_project(&root)?)
}

fn registry(config: &Config) -> Result<Registry, ScourError> {
    Ok(builtin_registry_with(&config.scour.rules)?)
}

// ============================================================================
// Snapshot loading
// ============================================================================

/// Where a snapshot was read from, so a fixed snapshot can be written back
/// in the same layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotSource {
    Document(PathBuf),
    Directory {
        root: PathBuf,
        /// File of each unit, in unit order.
        unit_files: Vec<PathBuf>,
    },
}

#[derive(Debug, Clone)]
pub struct LoadedSnapshot {
    pub source: SnapshotSource,
    pub snapshot: CompilationSnapshot,
}

impl LoadedSnapshot {
    pub fn load(path: &Path) -> Result<Self, ScourError> {
        if path.is_dir() {
            return Self::load_directory(path);
        }
        Ok(LoadedSnapshot {
            source: SnapshotSource::Document(path.to_path_buf()),
            snapshot: CompilationSnapshot::load(path)?,
        })
    }

    fn load_directory(root: &Path) -> Result<Self, ScourError> {
        let mut units = Vec::new();
        let mut unit_files = Vec::new();
        let mut symbols = None;

        for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                ScourError::internal(format!("failed to read {}: {}", root.display(), e))
            })?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }

            let json = read_file(path)?;
            if entry.depth() == 1 && entry.file_name() == SYMBOLS_FILE {
                symbols = Some(serde_json::from_str::<SymbolSnapshot>(&json)?);
            } else {
                units.push(serde_json::from_str::<UnitSnapshot>(&json)?);
                unit_files.push(path.to_path_buf());
            }
        }
        debug!(root = %root.display(), units = units.len(), "read snapshot directory");

        Ok(LoadedSnapshot {
            source: SnapshotSource::Directory {
                root: root.to_path_buf(),
                unit_files,
            },
            snapshot: CompilationSnapshot { units, symbols },
        })
    }

    /// Write `snapshot` back to where this one came from.
    pub fn save(&self, snapshot: &CompilationSnapshot) -> Result<(), ScourError> {
        match &self.source {
            SnapshotSource::Document(path) => write_json(path, snapshot),
            SnapshotSource::Directory { root, unit_files } => {
                if unit_files.len() != snapshot.units.len() {
                    return Err(ScourError::internal(format!(
                        "snapshot has {} units but {} was read with {}",
                        snapshot.units.len(),
                        root.display(),
                        unit_files.len()
                    )));
                }
                for (path, unit) in unit_files.iter().zip(&snapshot.units) {
                    write_json(path, unit)?;
                }
                if let Some(symbols) = &snapshot.symbols {
                    write_json(&root.join(SYMBOLS_FILE), symbols)?;
                }
                Ok(())
            }
        }
    }
}

fn read_file(path: &Path) -> Result<String, ScourError> {
    fs::read_to_string(path).map_err(|_| ScourError::file_not_found(path.display().to_string()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ScourError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| ScourError::internal(format!("JSON serialization error: {}", e)))?;
    fs::write(path, json + "\n")
        .map_err(|e| ScourError::internal(format!("failed to write {}: {}", path.display(), e)))
}

/// Units whose paths are not excluded by `exclude_paths`.
fn analyzed_units(config: &Config, compilation: &Compilation) -> Result<Vec<SyntaxTree>, ScourError> {
    let filter = config.scour.path_filter()?;
    Ok(compilation
        .units
        .iter()
        .filter(|unit| {
            let excluded = filter.is_match(unit.path());
            if excluded {
                debug!(file = unit.path(), "excluded by configuration");
            }
            !excluded
        })
        .cloned()
        .collect())
}

// ============================================================================
// Commands
// ============================================================================

/// `scour check`: every enabled rule over the whole compilation.
pub fn run_check(config: &Config, loaded: &LoadedSnapshot) -> Result<CheckResponse, ScourError> {
    let compilation = loaded.snapshot.build()?;
    let registry = registry(config)?;
    let dispatcher =
        Dispatcher::new(&registry).with_options(DispatchOptions::from_settings(&config.scour));

    // The assembly marker may sit in a unit that `exclude_paths` drops.
    if compilation.is_generated() {
        debug!("assembly is marked as generated code, nothing to check");
        let snapshot_id =
            ContentHash::compute_all(compilation.units.iter().map(|u| u.text().as_bytes()));
        return Ok(CheckResponse::new(snapshot_id.short(), Vec::new()));
    }
    let units = analyzed_units(config, &compilation)?;
    let diagnostics = dispatcher.run_compilation(&units, compilation.model())?;
    let snapshot_id = ContentHash::compute_all(units.iter().map(|u| u.text().as_bytes()));

    info!(units = units.len(), diagnostics = diagnostics.len(), "check finished");
    Ok(CheckResponse::new(snapshot_id.short(), diagnostics))
}

/// `scour fix`: fix-all for one rule over every unit. With `write`, the
/// fixed snapshot (including the rebased symbol table) replaces the input.
pub fn run_fix(
    config: &Config,
    loaded: &LoadedSnapshot,
    rule: &str,
    write: bool,
) -> Result<FixResponse, ScourError> {
    let compilation = loaded.snapshot.build()?;
    let registry = registry(config)?;
    let dispatcher =
        Dispatcher::new(&registry).with_options(DispatchOptions::from_settings(&config.scour));
    let options = FixOptions::from_settings(&config.scour);
    let filter = config.scour.path_filter()?;

    if compilation.is_generated() {
        dispatcher.only(rule)?;
        debug!(rule, "assembly is marked as generated code, nothing to fix");
        return Ok(FixResponse::new(rule, Vec::new(), false));
    }

    let mut symbols = compilation.symbols.clone();
    let mut trees = Vec::with_capacity(compilation.units.len());
    let mut fixed = Vec::new();

    for tree in &compilation.units {
        if filter.is_match(tree.path()) {
            trees.push(tree.clone());
            continue;
        }

        let model: &dyn SemanticModel = match &symbols {
            Some(table) => table,
            None => &Unbound,
        };
        let report = fix_all(tree, model, &dispatcher, rule, &options)?;
        if let Some(table) = symbols.as_mut() {
            for edits in &report.edits {
                *table = table.rebased(tree.path(), edits);
            }
        }

        fixed.push(FixedUnit {
            path: tree.path().to_string(),
            rounds: report.rounds,
            applied: report.applied,
            deferred: report.deferred,
            text: (report.applied > 0).then(|| report.tree.text().to_string()),
        });
        trees.push(report.tree);
    }

    let written = write && fixed.iter().any(|unit| unit.applied > 0);
    if written {
        let result = Compilation {
            units: trees,
            symbols,
        };
        loaded.save(&result.to_snapshot())?;
    }

    let response = FixResponse::new(rule, fixed, written);
    info!(
        rule,
        applied = response.applied,
        deferred = response.deferred,
        written,
        "fix finished"
    );
    Ok(response)
}

/// `scour rules`: the registry with configuration applied.
pub fn run_rules(config: &Config) -> Result<RulesResponse, ScourError> {
    let registry = registry(config)?;
    Ok(RulesResponse::new(
        registry.rules().iter().map(RuleInfo::from_entry).collect(),
    ))
}

/// `scour dump`: each unit in tree notation with its content hash.
pub fn run_dump(loaded: &LoadedSnapshot) -> Result<DumpResponse, ScourError> {
    let compilation = loaded.snapshot.build()?;
    let units = compilation
        .units
        .iter()
        .map(|tree| DumpedUnit {
            path: tree.path().to_string(),
            content_hash: tree.content_hash().0,
            tree: to_notation(tree.green()),
        })
        .collect();
    Ok(DumpResponse::new(units))
}
