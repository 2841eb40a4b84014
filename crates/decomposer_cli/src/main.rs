//! Command-line entry point for the decomposer core.
//!
//! # Responsibility
//! - Drive a `Session` from the shell: start projects from plain text, tag
//!   spans, inspect and export saved projects.
//! - Keep output deterministic for scripting.

#![forbid(unsafe_code)]

use clap::{Parser, Subcommand, ValueEnum};
use decomposer_core::{
    init_logging_from_config, CardType, FileSurface, FsSurface, Segment, SelectionPoint, Session,
    SessionConfig,
};
use log::info;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "decomposer")]
#[command(about = "Requirements text annotation CLI", version)]
struct Cli {
    /// Overrides DECOMPOSER_LOG_LEVEL.
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Absolute directory for log files; overrides DECOMPOSER_LOG_DIR.
    #[arg(long, global = true)]
    log_dir: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Starts an empty project from a plain-text requirements file.
    New {
        #[arg(long)]
        text: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Tags the UTF-16 offset range [start, end) of a saved project.
    Tag {
        #[arg(long)]
        project: PathBuf,
        #[arg(long)]
        start: usize,
        #[arg(long)]
        end: usize,
        #[arg(long = "type", value_enum)]
        kind: KindCli,
    },
    /// Prints per-category counts and the marked-up text.
    Inspect {
        #[arg(long)]
        project: PathBuf,
    },
    /// Writes the project and its exports into a directory.
    Export {
        #[arg(long)]
        project: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, value_enum, default_value_t = FormatCli::All)]
        format: FormatCli,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindCli {
    Object,
    Role,
    Scenario,
    Property,
    Question,
}

impl From<KindCli> for CardType {
    fn from(value: KindCli) -> Self {
        match value {
            KindCli::Object => CardType::Object,
            KindCli::Role => CardType::Role,
            KindCli::Scenario => CardType::Scenario,
            KindCli::Property => CardType::Property,
            KindCli::Question => CardType::Question,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum FormatCli {
    Json,
    Txt,
    Csv,
    All,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let cli = Cli::parse();

    let mut config = SessionConfig::from_env();
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(dir) = cli.log_dir {
        config.log_dir = Some(dir);
    }
    init_logging_from_config(&config)?;

    match cli.command {
        Commands::New { text, out } => new_project(config, &text, &out),
        Commands::Tag {
            project,
            start,
            end,
            kind,
        } => tag_span(config, &project, start, end, kind.into()),
        Commands::Inspect { project } => inspect(config, &project),
        Commands::Export {
            project,
            out,
            format,
        } => export(config, &project, out, format),
    }
}

fn open_session(config: SessionConfig, project: &Path) -> Result<Session, String> {
    let root = project
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let surface = FsSurface::new(root);
    let mut session = Session::new(config, "");
    session
        .load_from(&surface, project)
        .map_err(|err| format!("{}: {err}", err.user_notice()))?;
    Ok(session)
}

fn write_project(session: &Session, project: &Path) -> Result<(), String> {
    let json = session.save_project().map_err(|err| err.to_string())?;
    std::fs::write(project, json)
        .map_err(|err| format!("failed to write `{}`: {err}", project.display()))
}

fn new_project(config: SessionConfig, text: &Path, out: &Path) -> Result<(), String> {
    let surface = FsSurface::new(".");
    let raw = surface.read_text(text).map_err(|err| err.to_string())?;
    let mut session = Session::new(config, "");
    session
        .replace_text(raw)
        .map_err(|err| err.user_notice().to_string())?;
    write_project(&session, out)?;
    println!(
        "project={} len_utf16={}",
        out.display(),
        session.source_text().len_utf16()
    );
    Ok(())
}

fn tag_span(
    config: SessionConfig,
    project: &Path,
    start: usize,
    end: usize,
    kind: CardType,
) -> Result<(), String> {
    let mut session = open_session(config, project)?;
    let selection = session
        .resolve_selection(SelectionPoint::Inside(start), SelectionPoint::Inside(end))
        .ok_or_else(|| format!("range [{start}, {end}) is not a taggable selection"))?;
    let id = session
        .create_card(&selection, kind)
        .map_err(|err| err.user_notice().to_string())?;
    write_project(&session, project)?;
    info!("event=cli_tag module=cli status=ok card_id={id}");
    println!(
        "card={id} type={kind} start={} end={} text={:?}",
        selection.start_index(),
        selection.end_index(),
        selection.text
    );
    Ok(())
}

fn inspect(config: SessionConfig, project: &Path) -> Result<(), String> {
    let session = open_session(config, project)?;

    println!("len_utf16={}", session.source_text().len_utf16());
    println!("cards={}", session.cards().len());
    for kind in CardType::ALL {
        let count = session.cards().iter().filter(|c| c.kind() == kind).count();
        let hidden = if session.visibility().is_visible(kind) {
            ""
        } else {
            " (hidden)"
        };
        println!("  {} [{kind}]={count}{hidden}", kind.display_name());
    }

    let projection = session.projection();
    let marked: String = projection
        .segments
        .iter()
        .map(|segment| match segment {
            Segment::Plain(text) => (*text).to_string(),
            Segment::Tagged { kind, text, .. } => format!("[{kind}: {text}]"),
        })
        .collect();
    println!("---");
    println!("{marked}");
    if !projection.shadowed.is_empty() {
        println!("--- overlapping cards not marked inline: {}", projection.shadowed.len());
    }
    Ok(())
}

fn export(
    config: SessionConfig,
    project: &Path,
    out: PathBuf,
    format: FormatCli,
) -> Result<(), String> {
    let session = open_session(config, project)?;
    let target = FsSurface::new(out);

    let wants = |candidate: FormatCli| format == FormatCli::All || format == candidate;
    if wants(FormatCli::Json) {
        session.save_to(&target).map_err(|err| err.to_string())?;
    }
    if wants(FormatCli::Txt) {
        session.export_text_to(&target).map_err(|err| err.to_string())?;
    }
    if wants(FormatCli::Csv) {
        session.export_table_to(&target).map_err(|err| err.to_string())?;
    }
    println!("exported={} dir={}", session.cards().len(), target.root().display());
    Ok(())
}
