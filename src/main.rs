//! richfind - search and replace over rich-text documents
//!
//! Loads a text file as a document (one paragraph per line, `# ` lines as headings),
//! searches it, and optionally replaces the first or every match.

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, Command};
use richfind::app::{Application, RunOptions};
use richfind::EngineConfig;
use std::path::PathBuf;

fn cli() -> Command {
    Command::new("richfind")
        .version(richfind::VERSION)
        .about("Incremental search and replace over rich-text documents")
        .long_about(
            "richfind loads a text file as a document tree, finds every occurrence of a \
             literal term, reports each match with its section and position, and can \
             replace the first or every match while leaving protected blocks untouched.",
        )
        .arg(
            Arg::new("file")
                .help("Path to the document to search")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .index(1),
        )
        .arg(
            Arg::new("term")
                .help("Literal text to search for")
                .required(true)
                .index(2),
        )
        .arg(
            Arg::new("case-sensitive")
                .long("case-sensitive")
                .short('s')
                .help("Match case exactly")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("whole-word")
                .long("whole-word")
                .short('w')
                .help("Only match whole words")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("replace")
                .long("replace")
                .short('r')
                .value_name("TEXT")
                .help("Replace matches with TEXT"),
        )
        .arg(
            Arg::new("first")
                .long("first")
                .help("Replace only the first match")
                .requires("replace")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .requires("replace")
                .help("Write the replaced document to PATH instead of stdout"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .help("Configuration file (defaults to the platform config directory)"),
        )
        .arg(
            Arg::new("rows")
                .long("rows")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .default_value("40")
                .help("Visible rows of the virtual view"),
        )
        .arg(
            Arg::new("cols")
                .long("cols")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .default_value("100")
                .help("Columns of the virtual view"),
        )
}

#[cfg(feature = "config")]
fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => EngineConfig::discover().context("Failed to load configuration")?,
    };
    Ok(config)
}

#[cfg(not(feature = "config"))]
fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
    if let Some(path) = path {
        anyhow::bail!(
            "Cannot read {}: built without the `config` feature",
            path.display()
        );
    }
    Ok(EngineConfig::default())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let matches = cli().get_matches();

    let file_path = matches
        .get_one::<PathBuf>("file")
        .cloned()
        .context("file argument is required")?;
    let term = matches
        .get_one::<String>("term")
        .cloned()
        .context("term argument is required")?;

    if !file_path.exists() {
        anyhow::bail!("File does not exist: {}", file_path.display());
    }
    if !file_path.is_file() {
        anyhow::bail!("Path is not a regular file: {}", file_path.display());
    }
    if term.is_empty() {
        anyhow::bail!("Search term must not be empty");
    }

    let rows = matches.get_one::<usize>("rows").copied().unwrap_or(40);
    let cols = matches.get_one::<usize>("cols").copied().unwrap_or(100);
    if rows == 0 || cols == 0 {
        anyhow::bail!("--rows and --cols must be at least 1");
    }

    let config = load_config(matches.get_one::<PathBuf>("config"))?;
    let options = RunOptions {
        term,
        case_sensitive: matches.get_flag("case-sensitive"),
        whole_words: matches.get_flag("whole-word"),
        replace: matches.get_one::<String>("replace").cloned(),
        first_only: matches.get_flag("first"),
        output: matches.get_one::<PathBuf>("output").cloned(),
    };

    let mut app = Application::open(&file_path, &config, rows, cols).await?;
    let report = app.run(&options).await?;
    print!("{}", report.render());
    app.shutdown().await?;

    Ok(())
}
