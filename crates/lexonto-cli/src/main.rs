//! Lexonto CLI
//!
//! Command-line interface for maintaining Tibetan lexical ontologies:
//! - merging word lists into a master ontology with provenance
//! - regenerating the per-source lists from a master
//! - diffing, exporting (`.yaml` ↔ `.xlsx`) and reporting
//! - legend changes and the tagging round trip

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

use lexonto_core::tagging::{chunk_units, collect_tagged, rows_from_units, suggest_tags, tagged_to_trie};
use lexonto_core::{
    export_tree_report, DiffMode, FlatEntry, LineMode, MergeOptions, OntologyView, PathTrie,
    ReconcileConfig, Reconciler, TagSuggestion,
};
use lexonto_storage::xlsx::{write_sheets, SheetGrid};
use lexonto_storage::{
    discover_sources, list_ontologies, load_config, load_view, output_path, read_legend_adjustment,
    save_view, updated_path, write_legend_template, FileFormat,
};

#[derive(Parser)]
#[command(name = "lexonto")]
#[command(author, version, about = "Lexonto: path-indexed Tibetan lexical ontologies")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Reconciliation settings (.yaml or .json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge ontologies into a base ontology, crediting each source.
    ///
    /// Directories are expanded to the ontology files they contain; all
    /// inputs are merged in path order.
    Merge {
        /// Base ontology (created if missing)
        base: PathBuf,
        /// Ontologies or directories of ontologies to merge in
        #[arg(required = true)]
        others: Vec<PathBuf>,
        /// Output file (default: overwrite the base)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Keep incoming origins instead of crediting the source file
        #[arg(long)]
        no_origin: bool,
        /// File entries that match no existing category under the unfiled bucket
        #[arg(long)]
        to_organize: bool,
    },

    /// Convert an ontology to another file form.
    Export {
        input: PathBuf,
        /// Target form: yaml or xlsx
        #[arg(short, long, default_value = "xlsx")]
        format: String,
        /// Output file or directory (default: next to the input)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Compare two ontologies, ignoring frequency and origin.
    Diff {
        base: PathBuf,
        other: PathBuf,
        /// all | base_only | other_only | shared
        #[arg(short, long, default_value = "all")]
        mode: String,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Regenerate the per-source and per-level ontologies from a master.
    ///
    /// Sources are the YAML files next to the master; files in a
    /// sub-directory belong to the level named after it.
    Recompose {
        master: PathBuf,
        /// Overwrite the source files instead of writing `_updated` copies
        #[arg(long)]
        overwrite: bool,
    },

    /// Change the legend of an ontology through a reviewed template.
    ///
    /// The first run writes the template; edit it and run again to apply.
    AdjustLegend {
        input: PathBuf,
        #[arg(long, default_value = "adjust_legends.yaml")]
        template: PathBuf,
    },

    /// Print the category tree with entry counts.
    Report {
        input: PathBuf,
        /// Also write the report (.xlsx or text)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Suggest POS and level tags for a segmented text.
    Suggest {
        /// Ontology to look words up in
        onto: PathBuf,
        /// Segmented text (one unit per line, words separated by spaces)
        text: PathBuf,
        /// chunk (one word per line) | sentence (one sentence per line)
        #[arg(short, long, default_value = "chunk")]
        mode: String,
        /// Level given to words the ontology does not know
        #[arg(long, default_value = "")]
        default_level: String,
        /// Output .xlsx tagging sheet or .tsv (default: <text>_totag.xlsx)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Build an ontology from a filled-in tagging sheet.
    FromTagged {
        /// Ontology providing the legend and known category paths
        basis: PathBuf,
        /// Tagging workbook
        tagged: PathBuf,
        /// Output ontology (default: <tagged>_onto.yaml)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show where a word is filed.
    Find {
        onto: PathBuf,
        word: String,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ReconcileConfig::default(),
    };

    match cli.command {
        Commands::Merge {
            base,
            others,
            out,
            no_origin,
            to_organize,
        } => {
            let options = MergeOptions {
                add_origin: !no_origin,
                organize_unmatched: to_organize,
            };
            cmd_merge(&config, &base, &others, out.as_deref(), options)
        }
        Commands::Export { input, format, out } => cmd_export(&config, &input, &format, out.as_deref()),
        Commands::Diff {
            base,
            other,
            mode,
            json,
        } => cmd_diff(&config, &base, &other, &mode, json),
        Commands::Recompose { master, overwrite } => cmd_recompose(&config, &master, overwrite),
        Commands::AdjustLegend { input, template } => cmd_adjust_legend(&config, &input, &template),
        Commands::Report { input, out } => cmd_report(&config, &input, out.as_deref()),
        Commands::Suggest {
            onto,
            text,
            mode,
            default_level,
            out,
        } => cmd_suggest(&config, &onto, &text, &mode, &default_level, out.as_deref()),
        Commands::FromTagged { basis, tagged, out } => {
            cmd_from_tagged(&config, &basis, &tagged, out.as_deref())
        }
        Commands::Find { onto, word, json } => cmd_find(&config, &onto, &word, json),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

fn open(config: &ReconcileConfig, path: &Path) -> Result<OntologyView> {
    Ok(load_view(path)?.with_delimiter(config.delimiter.clone()))
}

fn show_path(path: &[String]) -> String {
    path.join(" / ")
}

fn print_entries(label: &str, entries: &[FlatEntry]) {
    println!("{} {} ({})", "→".cyan(), label.bold(), entries.len());
    for (path, entry) in entries {
        println!("    {}  {:?}", show_path(path).dimmed(), entry);
    }
}

// ============================================================================
// Merge / recompose
// ============================================================================

fn cmd_merge(
    config: &ReconcileConfig,
    base_path: &Path,
    others: &[PathBuf],
    out: Option<&Path>,
    options: MergeOptions,
) -> Result<()> {
    let mut base = if base_path.exists() {
        open(config, base_path)?
    } else {
        println!("{} {} (new)", "Creating".green().bold(), base_path.display());
        OntologyView::new(PathTrie::new())
            .with_source(base_path)
            .with_delimiter(config.delimiter.clone())
    };

    let mut files = Vec::new();
    for path in others {
        if path.is_dir() {
            files.extend(list_ontologies(path)?);
        } else {
            files.push(path.clone());
        }
    }
    files.sort();
    files.retain(|p| p.as_path() != base_path);

    let reconciler = Reconciler::new(config.clone());
    for file in &files {
        let other = open(config, file)?;
        let report = reconciler
            .merge(&mut base, &other, options)
            .with_context(|| format!("failed to merge {}", file.display()))?;
        println!(
            "{} {}: {} reconciled, {} added, {} unfiled",
            "merged".green(),
            file.display(),
            report.reconciled,
            report.added,
            report.unfiled
        );
    }

    let target = out.unwrap_or(base_path);
    save_view(&base, target)?;
    println!("{} {}", "✓ wrote".green().bold(), target.display());
    Ok(())
}

fn cmd_recompose(config: &ReconcileConfig, master_path: &Path, overwrite: bool) -> Result<()> {
    let master = open(config, master_path)?;
    let layout = discover_sources(master_path)?;
    if layout.plan.is_empty() {
        bail!(
            "no source ontologies found next to {}",
            master_path.display()
        );
    }

    let reconciler = Reconciler::new(config.clone());
    let decomposition = reconciler.decompose(&master, &layout.plan)?;

    let target = |path: PathBuf| if overwrite { path } else { updated_path(&path) };
    for (id, view) in &decomposition.sources {
        let path = target(layout.source_path(id));
        save_view(view, &path)?;
        println!("{} {} → {}", "source".cyan(), id, path.display());
    }
    for (level, view) in &decomposition.levels {
        let path = target(layout.level_path(level));
        save_view(view, &path)?;
        println!("{} {} → {}", "level".cyan(), level, path.display());
    }
    Ok(())
}

// ============================================================================
// Inspect / convert
// ============================================================================

fn cmd_export(config: &ReconcileConfig, input: &Path, format: &str, out: Option<&Path>) -> Result<()> {
    let format = match format.to_ascii_lowercase().as_str() {
        "yaml" | "yml" => FileFormat::Yaml,
        "xlsx" => FileFormat::Xlsx,
        other => bail!("unknown format `{other}` (expected yaml or xlsx)"),
    };
    let view = open(config, input)?;
    let target = output_path(&view, out, format);
    save_view(&view, &target)?;
    println!("{} {} → {}", "✓".green(), input.display(), target.display());
    Ok(())
}

fn cmd_diff(config: &ReconcileConfig, base: &Path, other: &Path, mode: &str, json: bool) -> Result<()> {
    let mode: DiffMode = mode.parse()?;
    let base = open(config, base)?;
    let other = open(config, other)?;
    let diff = Reconciler::new(config.clone()).diff(&base, &other, mode)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&diff)?);
        return Ok(());
    }
    if matches!(mode, DiffMode::All | DiffMode::BaseOnly) {
        print_entries("base only", &diff.base_only);
    }
    if matches!(mode, DiffMode::All | DiffMode::Shared) {
        println!("{} {} ({})", "→".cyan(), "shared".bold(), diff.shared.len());
        for ((path, b), (_, o)) in &diff.shared {
            println!("    {}  {:?} ≈ {:?}", show_path(path).dimmed(), b, o);
        }
    }
    if matches!(mode, DiffMode::All | DiffMode::OtherOnly) {
        print_entries("other only", &diff.other_only);
    }
    Ok(())
}

fn cmd_report(config: &ReconcileConfig, input: &Path, out: Option<&Path>) -> Result<()> {
    let view = open(config, input)?;
    let report = export_tree_report(&view)?;
    println!("{report}");

    if let Some(out) = out {
        if matches!(FileFormat::from_path(out), Ok(FileFormat::Xlsx)) {
            let mut grid = SheetGrid::new("report");
            grid.rows = report.to_grid();
            grid.rows.push(vec![format!("total: {}", report.total_words)]);
            write_sheets(&[grid], out)?;
        } else {
            fs::write(out, format!("{report}\n"))
                .with_context(|| format!("failed to write {}", out.display()))?;
        }
        println!("{} {}", "✓ wrote".green().bold(), out.display());
    }
    Ok(())
}

fn cmd_find(config: &ReconcileConfig, onto: &Path, word: &str, json: bool) -> Result<()> {
    let view = open(config, onto)?;
    let found = view.find_word(word);
    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
        return Ok(());
    }
    if found.is_empty() {
        println!("{} {} not found", "✗".red(), word);
        return Ok(());
    }
    for (path, entries) in &found {
        println!("{} {}", "→".cyan(), show_path(path).bold());
        for entry in entries {
            println!("    {:?}", entry);
        }
    }
    Ok(())
}

// ============================================================================
// Legend
// ============================================================================

fn cmd_adjust_legend(config: &ReconcileConfig, input: &Path, template: &Path) -> Result<()> {
    let mut view = open(config, input)?;
    if !template.is_file() {
        write_legend_template(&view, template)?;
        println!(
            "{} fill in {} and run again",
            "→".cyan(),
            template.display()
        );
        return Ok(());
    }

    let adjustment = read_legend_adjustment(template)?;
    if adjustment.is_unchanged() {
        println!(
            "{} {} is unchanged; edit it and run again",
            "→".cyan(),
            template.display()
        );
        return Ok(());
    }
    if adjustment.legend_orig != view.legend() {
        bail!(
            "{} was written for legend {:?}, but {} has {:?}",
            template.display(),
            adjustment.legend_orig,
            input.display(),
            view.legend()
        );
    }

    view.apply_legend_adjustment(&adjustment);
    save_view(&view, input)?;
    fs::remove_file(template).with_context(|| format!("failed to remove {}", template.display()))?;
    println!("{} legend is now {:?}", "✓".green(), view.legend());
    Ok(())
}

// ============================================================================
// Tagging
// ============================================================================

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{stem}{suffix}"))
}

fn cmd_suggest(
    config: &ReconcileConfig,
    onto: &Path,
    text_path: &Path,
    mode: &str,
    default_level: &str,
    out: Option<&Path>,
) -> Result<()> {
    let mode: LineMode = mode.parse()?;
    let view = open(config, onto)?;
    let text = fs::read_to_string(text_path)
        .with_context(|| format!("failed to read {}", text_path.display()))?;

    let rows: Vec<Vec<TagSuggestion>> = chunk_units(&text, mode)
        .iter()
        .flat_map(|chunk| rows_from_units(chunk, mode))
        .map(|row| suggest_tags(&view, &row, default_level, config))
        .collect();
    let new_words = rows.iter().flatten().filter(|s| s.is_new).count();

    let target = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| sibling_with_suffix(text_path, "_totag.xlsx"));
    if matches!(FileFormat::from_path(&target), Ok(FileFormat::Xlsx)) {
        let title = lexonto_storage::source_id_of(text_path).unwrap_or_else(|| "text".to_string());
        lexonto_storage::tagging::write_tagging_sheet(&target, &title, &rows)?;
    } else {
        let mut tsv = String::from("word\tPOS\tlevel\tnew\n");
        for s in rows.iter().flatten() {
            tsv.push_str(&format!(
                "{}\t{}\t{}\t{}\n",
                s.word,
                s.pos.as_deref().unwrap_or(""),
                s.level,
                s.is_new
            ));
        }
        fs::write(&target, tsv).with_context(|| format!("failed to write {}", target.display()))?;
    }
    println!(
        "{} {} rows, {} new words → {}",
        "✓".green(),
        rows.len(),
        new_words,
        target.display()
    );
    Ok(())
}

fn cmd_from_tagged(config: &ReconcileConfig, basis: &Path, tagged_path: &Path, out: Option<&Path>) -> Result<()> {
    let basis = open(config, basis)?;
    let tagged = collect_tagged(lexonto_storage::tagging::read_tagged_sheet(tagged_path)?);
    if tagged.is_empty() {
        println!(
            "{} {} has no tagged word; tag it and run again",
            "→".cyan(),
            tagged_path.display()
        );
        return Ok(());
    }

    let trie = tagged_to_trie(&tagged, &basis, config)?;
    let target = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| sibling_with_suffix(tagged_path, "_onto.yaml"));
    let view = OntologyView::new(trie).with_source(&target);
    save_view(&view, &target)?;
    println!(
        "{} {} tagged words → {}",
        "✓".green(),
        tagged.len(),
        target.display()
    );
    Ok(())
}
