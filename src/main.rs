//! Loom - a line-oriented markdown editing engine.
//!
//! # Usage
//!
//! ```bash
//! loom README.md
//! loom README.md --format json --editing-line 3
//! loom notes.md --script edits.txt --write
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use loom::config::{
    ConfigFlags, OutputFormat, clear_config_flags, global_config_path, load_config_flags,
    local_override_path, parse_flag_tokens, save_config_flags,
};
use loom::document::{Document, EditorContext, Persistence};
use loom::editor::{Editor, EventQueue};
use loom::math::EscapedTypesetter;
use loom::{export, perf, script};

/// Render and edit markdown documents line by line
#[derive(Parser, Debug)]
#[command(name = "loom", version, about, long_about = None)]
struct Cli {
    /// Markdown file to open
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Apply the edit commands in this file before printing
    #[arg(long, value_name = "PATH")]
    script: Option<PathBuf>,

    /// Write the edited document back to FILE
    #[arg(long)]
    write: bool,

    /// Render this line in editing mode (markers visible)
    #[arg(long, value_name = "N")]
    editing_line: Option<usize>,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Batches larger than this render in parallel
    #[arg(long, value_name = "N")]
    parallel_threshold: Option<usize>,

    /// List indentation in pixels per leading whitespace character
    #[arg(long, value_name = "PX")]
    list_indent: Option<usize>,

    /// Enable performance logging
    #[arg(long)]
    perf: bool,

    /// Write detailed render/edit debug events to a file
    #[arg(long, value_name = "PATH")]
    render_debug_log: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

/// Reads and writes one document file.
struct FilePersistence {
    path: PathBuf,
}

impl Persistence for FilePersistence {
    type Error = anyhow::Error;

    fn load(&mut self) -> Result<String> {
        fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))
    }

    fn save(&mut self, content: &str) -> Result<()> {
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

fn apply_script(editor: &mut Editor, path: &Path) -> Result<()> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;
    let events = script::parse_script(&text)
        .with_context(|| format!("Invalid script {}", path.display()))?;
    let total = events.len();
    let mut queue = EventQueue::new();
    queue.extend(events);
    let applied = queue.drain(editor).len();
    if applied < total {
        eprintln!("[warn] {} of {total} script commands were rejected", total - applied);
    }
    Ok(())
}

fn print_document(document: &Document, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Html => print!("{}", export::to_html(document, &EscapedTypesetter)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(document.lines())
                .context("Failed to serialize lines")?;
            println!("{json}");
        }
        OutputFormat::Text => println!("{}", document.content()),
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    perf::set_enabled(effective.perf);
    let render_debug_log_path = effective
        .render_debug_log
        .clone()
        .or_else(|| std::env::var_os("LOOM_RENDER_DEBUG_LOG").map(PathBuf::from));
    if let Err(err) = perf::set_debug_log_path(render_debug_log_path.as_deref()) {
        eprintln!(
            "[warn] Failed to initialize render debug log {}: {}",
            render_debug_log_path
                .as_ref()
                .map_or_else(|| "<unset>".to_string(), |p| p.display().to_string()),
            err
        );
    }

    if !cli.file.exists() {
        anyhow::bail!("File not found: {}", cli.file.display());
    }

    let mut store = FilePersistence {
        path: cli.file.clone(),
    };
    let mut document = Document::open(&mut store, effective.render_options())?;
    *document.context_mut() = EditorContext::new(Some(cli.file.clone()));

    let mut editor = Editor::new(document);
    if let Some(path) = &cli.script {
        apply_script(&mut editor, path)?;
    }
    let mut document = editor.into_document();

    if let Some(line) = cli.editing_line {
        document
            .begin_editing(line)
            .with_context(|| format!("Cannot edit line {line}"))?;
    }

    if cli.write && document.is_dirty() {
        document.save(&mut store)?;
    }

    print_document(&document, effective.format.unwrap_or(OutputFormat::Html))
}
