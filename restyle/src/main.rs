use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use restyle_lib::{
    HtmlPage, PackageBuilder, ProjectMetadata, RecordingSession, StyleSnapshot, TemplateLayout,
};
use url::Url;

mod session;

use session::Session;

#[derive(Parser)]
#[command(name = "restyle")]
#[command(about = "Record CSS edits made to a page and export them as an add-on")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit a page interactively; commands are read from stdin
    Session {
        /// HTML page to record
        page: PathBuf,

        /// Template add-on archive the export is built from
        #[arg(long)]
        template: PathBuf,

        /// URL to report for the page instead of its file:// location
        #[arg(long)]
        url: Option<Url>,

        /// JSON file overriding the template's entry paths and placeholders
        #[arg(long)]
        layout: Option<PathBuf>,
    },

    /// Print the rules added between two versions of a page
    Diff { before: PathBuf, after: PathBuf },

    /// Print every rule captured from a page
    Rules { page: PathBuf },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Session {
            page,
            template,
            url,
            layout,
        } => run_session(&page, template, url, layout.as_deref()),
        Commands::Diff { before, after } => run_diff(&before, &after),
        Commands::Rules { page } => run_rules(&page),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn open_page(path: &Path) -> Result<HtmlPage> {
    HtmlPage::open(path).with_context(|| format!("cannot open page '{}'", path.display()))
}

fn load_layout(path: &Path) -> Result<TemplateLayout> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("cannot read layout '{}'", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("invalid layout '{}'", path.display()))
}

fn run_session(
    page: &Path,
    template: PathBuf,
    url: Option<Url>,
    layout: Option<&Path>,
) -> Result<()> {
    let mut page = open_page(page)?;
    if let Some(url) = url {
        page = page.with_url(url);
    }

    let mut builder = PackageBuilder::new(template);
    if let Some(layout) = layout {
        builder = builder.with_layout(load_layout(layout)?);
    }

    let site = page
        .site_info()
        .with_context(|| format!("cannot read page '{}'", page.path().display()))?;
    let metadata = ProjectMetadata::from_site(&site);

    let stdin = io::stdin();
    let stdout = io::stdout();
    Session::new(page, builder, metadata).run(&mut stdin.lock(), &mut stdout.lock())
}

fn run_diff(before: &Path, after: &Path) -> Result<()> {
    let before = open_page(before)?;
    let after = open_page(after)?;

    let modification = RecordingSession::start(&before).stop(&after);
    if !modification.changes().is_empty() {
        println!("{}", modification.changes());
    }
    Ok(())
}

fn run_rules(page: &Path) -> Result<()> {
    let page = open_page(page)?;
    for rule in StyleSnapshot::capture(&page).rules() {
        println!("{rule}");
    }
    Ok(())
}
