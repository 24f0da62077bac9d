use clap::{Parser, ValueEnum};
use dbdoc::{
    introspect, parse_layout_file, render_dbml, render_markdown, render_text, CommentPrecedence,
    DbDocError, Layout, MergeOptions,
};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::process;

/// dbdoc CLI — document a database schema and keep the docs in sync with it
#[derive(Parser)]
#[command(name = "dbdoc", version, about)]
struct Cli {
    /// SQLite database file to introspect
    #[arg(long)]
    sqlite: Option<PathBuf>,

    /// Database name shown in the documentation header (defaults to the
    /// database file stem)
    #[arg(short = 'd', long)]
    name: Option<String>,

    /// Existing documentation file to extend
    #[arg(short = 'i', long)]
    input: Option<PathBuf>,

    /// Output file (stdout when omitted)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// Maximum line length for wrapped comments
    #[arg(long, default_value_t = 80)]
    line_length: usize,

    /// Which side wins when both the file and the database document an item
    #[arg(long, default_value = "file")]
    comments: CommentSource,

    /// Drop documented items that no longer exist in the database
    #[arg(long)]
    prune: bool,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Markdown,
    Dbml,
}

#[derive(Clone, ValueEnum)]
enum CommentSource {
    File,
    Db,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("ERROR: {e}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> dbdoc::Result<()> {
    let live = match &cli.sqlite {
        Some(path) => {
            let conn = rusqlite::Connection::open(path)?;
            let name = match &cli.name {
                Some(name) => name.clone(),
                None => path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            };
            Some(introspect::sqlite::read_layout(&conn, &name)?)
        }
        None => None,
    };

    // with no explicit input, an existing output file becomes the input so
    // its ordering and comments survive the rewrite
    let mut input = cli.input.clone();
    if input.is_none() {
        if let Some(out) = &cli.output {
            if out.exists() {
                input = Some(out.clone());
            }
        }
    }

    let persisted = match &input {
        Some(path) => Some(parse_layout_file(path)?),
        None => None,
    };

    let layout = match (persisted, live) {
        (Some(mut base), Some(live)) => {
            let opts = MergeOptions {
                comments: match cli.comments {
                    CommentSource::File => CommentPrecedence::FileFirst,
                    CommentSource::Db => CommentPrecedence::DbFirst,
                },
                keep_missing: !cli.prune,
            };
            base.merge_from(live, &opts);
            base
        }
        (Some(base), None) => base,
        (None, Some(mut live)) => {
            // first run, nothing persisted: normalize to a stable order
            live.sort();
            live
        }
        (None, None) => {
            return Err(DbDocError::Other(
                "nothing to do: pass --sqlite and/or --input".to_string(),
            ))
        }
    };

    let mut out: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(std::io::stdout()),
    };

    render(&layout, &mut out, cli)
}

fn render(layout: &Layout, out: &mut Box<dyn Write>, cli: &Cli) -> dbdoc::Result<()> {
    match cli.format {
        OutputFormat::Text => render_text(layout, out, cli.line_length),
        OutputFormat::Markdown => render_markdown(layout, out, cli.line_length),
        OutputFormat::Dbml => render_dbml(layout, out, true),
    }
}
