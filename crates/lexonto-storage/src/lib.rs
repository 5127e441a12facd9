//! Lexonto file storage
//!
//! Moves ontologies between files and `OntologyView`s:
//!
//! ```text
//!   .yaml ──yaml::parse_nested──┐                 ┌──yaml::render_nested──► .yaml
//!                               ├─► NestedOntology ─► OntologyView ─►┤
//!   .xlsx ──xlsx::read_nested───┘                 └──xlsx::write_nested───► .xlsx
//! ```
//!
//! Also: reconciliation config files, legend-adjustment templates, and
//! discovery of the per-source ontologies that a master was merged from.

pub mod tagging;
pub mod xlsx;
pub mod yaml;

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use lexonto_core::{
    DecompositionPlan, LegendAdjustment, NestedOntology, OntoError, OntologyView, ReconcileConfig,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Suffix added to regenerated files that must not overwrite their source.
pub const UPDATED_SUFFIX: &str = "_updated";

// ============================================================================
// File forms
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Yaml,
    Xlsx,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> std::result::Result<Self, OntoError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some("xlsx") => Ok(Self::Xlsx),
            _ => Err(OntoError::UnsupportedExtension {
                path: path.to_path_buf(),
            }),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Xlsx => "xlsx",
        }
    }
}

pub fn load_nested(path: &Path) -> Result<NestedOntology> {
    match FileFormat::from_path(path)? {
        FileFormat::Yaml => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            yaml::parse_nested(text.trim_start_matches('\u{feff}'))
                .with_context(|| format!("malformed ontology {}", path.display()))
        }
        FileFormat::Xlsx => xlsx::read_nested(path),
    }
}

pub fn save_nested(nested: &NestedOntology, path: &Path) -> Result<()> {
    let format = FileFormat::from_path(path)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    match format {
        FileFormat::Yaml => std::fs::write(path, yaml::render_nested(nested))
            .with_context(|| format!("failed to write {}", path.display())),
        FileFormat::Xlsx => xlsx::write_nested(nested, path),
    }
}

/// Load and clean an ontology, remembering its path as the view's source.
pub fn load_view(path: &Path) -> Result<OntologyView> {
    let nested = load_nested(path)?;
    let view = OntologyView::from_nested(&nested)
        .with_context(|| format!("invalid ontology {}", path.display()))?
        .with_source(path);
    tracing::debug!(
        path = %path.display(),
        entries = view.trie().entry_count(),
        "loaded ontology"
    );
    Ok(view)
}

/// Write `view` to `path` in the form its extension names.
pub fn save_view(view: &OntologyView, path: &Path) -> Result<()> {
    let nested = view
        .to_nested()
        .with_context(|| format!("cannot serialize ontology for {}", path.display()))?;
    save_nested(&nested, path)?;
    tracing::debug!(path = %path.display(), "saved ontology");
    Ok(())
}

/// Where to write `view` as `format`. A file target is used as given; a
/// directory target (or none, meaning the source's directory) receives
/// `<source stem>.<ext>`.
pub fn output_path(view: &OntologyView, out: Option<&Path>, format: FileFormat) -> PathBuf {
    let stem = view
        .source()
        .and_then(|p| p.file_stem())
        .map(|s| s.to_string_lossy().into_owned())
        .or_else(|| view.source_id())
        .unwrap_or_else(|| "ontology".to_string());
    let file_name = format!("{stem}.{}", format.extension());
    match out {
        Some(p) if FileFormat::from_path(p).is_ok() => p.to_path_buf(),
        Some(dir) => dir.join(file_name),
        None => view
            .source()
            .and_then(Path::parent)
            .unwrap_or_else(|| Path::new("."))
            .join(file_name),
    }
}

/// `dir/name.ext` → `dir/name_updated.ext`
pub fn updated_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}{UPDATED_SUFFIX}.{}", ext.to_string_lossy()),
        None => format!("{stem}{UPDATED_SUFFIX}"),
    };
    path.with_file_name(name)
}

/// Ontology files directly inside `dir`, sorted by path.
pub fn list_ontologies(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("failed to scan {}", dir.display()))?;
        if entry.file_type().is_file() && FileFormat::from_path(entry.path()).is_ok() {
            out.push(entry.into_path());
        }
    }
    out.sort();
    Ok(out)
}

// ============================================================================
// Configuration & legend adjustment
// ============================================================================

/// Reconciliation settings from a `.yaml`/`.yml` or `.json` file. Missing
/// keys keep their defaults.
pub fn load_config(path: &Path) -> Result<ReconcileConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: ReconcileConfig = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&text)
            .with_context(|| format!("invalid JSON config {}", path.display()))?,
        _ => serde_yaml::from_str(&text)
            .with_context(|| format!("invalid YAML config {}", path.display()))?,
    };
    Ok(config)
}

/// Review template for a legend change, with instructions as comments.
pub fn render_legend_template(adjustment: &LegendAdjustment) -> String {
    format!(
        "# legend of the ontology as it is now.\n\
         legend_orig: {orig}\n\
         # new legend:\n\
         # omitting a field removes it with all its content.\n\
         # adding a field adds it empty to every entry.\n\
         # reordering fields reorders every entry.\n\
         legend_new: {new}\n\
         # pairs [old, new]: field <old> is renamed <new>, keeping its content.\n\
         # leave empty if nothing is renamed.\n\
         replacements: []\n",
        orig = yaml::flow_list(&adjustment.legend_orig),
        new = yaml::flow_list(&adjustment.legend_new),
    )
}

pub fn write_legend_template(view: &OntologyView, path: &Path) -> Result<()> {
    let template = LegendAdjustment::template(view.legend());
    std::fs::write(path, render_legend_template(&template))
        .with_context(|| format!("failed to write {}", path.display()))
}

pub fn read_legend_adjustment(path: &Path) -> Result<LegendAdjustment> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("invalid legend adjustment {}", path.display()))
}

// ============================================================================
// Source discovery
// ============================================================================

/// Per-source ontology files found next to a master ontology.
#[derive(Debug, Clone, Default)]
pub struct SourceLayout {
    pub root: PathBuf,
    pub plan: DecompositionPlan,
    /// Source id (or level name) → file it was found at.
    pub paths: BTreeMap<String, PathBuf>,
}

impl SourceLayout {
    pub fn source_path(&self, id: &str) -> PathBuf {
        self.paths
            .get(id)
            .cloned()
            .unwrap_or_else(|| self.root.join(format!("{id}.yaml")))
    }

    /// A level ontology lives in its level directory, named after it.
    pub fn level_path(&self, level: &str) -> PathBuf {
        self.paths
            .get(level)
            .cloned()
            .unwrap_or_else(|| self.root.join(level).join(format!("{level}.yaml")))
    }
}

/// Source id of an ontology file: its stem up to the first `_`.
pub fn source_id_of(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let id = stem.split('_').next()?;
    (!id.is_empty()).then(|| id.to_string())
}

/// Scan the directory holding `master` for the YAML ontologies it was merged
/// from. A file inside a sub-directory belongs to the level named after
/// that directory; a file whose id equals its level is the level ontology
/// itself and is not routed. `_updated` files from earlier runs are ignored.
pub fn discover_sources(master: &Path) -> Result<SourceLayout> {
    let root = master
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    let master_id = std::fs::canonicalize(master).unwrap_or_else(|_| master.to_path_buf());

    let mut layout = SourceLayout {
        root: root.clone(),
        ..SourceLayout::default()
    };
    let mut files = Vec::new();
    for entry in WalkDir::new(&root).min_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to scan {}", root.display()))?;
        let path = entry.path();
        if !entry.file_type().is_file() || !matches!(FileFormat::from_path(path), Ok(FileFormat::Yaml)) {
            continue;
        }
        if std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()) == master_id {
            continue;
        }
        let is_updated = path
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|s| s.ends_with(UPDATED_SUFFIX));
        if is_updated {
            continue;
        }
        files.push(path.to_path_buf());
    }

    for path in files {
        let Some(id) = source_id_of(&path) else {
            tracing::warn!(path = %path.display(), "skipping ontology without a source id");
            continue;
        };
        let level = path
            .strip_prefix(&root)
            .ok()
            .filter(|rel| rel.components().count() > 1)
            .and_then(|rel| rel.components().next())
            .map(|c| c.as_os_str().to_string_lossy().into_owned());

        if layout.paths.contains_key(&id) {
            tracing::warn!(
                path = %path.display(),
                id = %id,
                "duplicate source id, keeping the first file"
            );
            continue;
        }
        layout.paths.insert(id.clone(), path);
        if level.as_deref() != Some(id.as_str()) {
            layout.plan.add_source(&id, level.as_deref());
        }
    }
    tracing::debug!(
        root = %root.display(),
        sources = layout.paths.len(),
        "discovered source ontologies"
    );
    Ok(layout)
}
