mod commands;
mod config;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    add, delete, export, move_slide, new, set, show, AddArgs, DeckContext, DeleteArgs, ExportArgs, MoveArgs,
    NewArgs, SetArgs, ShowArgs,
};
use tracing_subscriber::EnvFilter;

/// Slidedeck CLI - edit slide decks stored on this machine
#[derive(Parser, Debug)]
#[command(name = "slidedeck")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Deck name
    #[arg(short, long, global = true, default_value = "default")]
    deck: String,

    /// Field encryption passphrase (defaults to $SLIDEDECK_KEY)
    #[arg(long, global = true)]
    key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new deck with one blank slide
    New(NewArgs),

    /// List the slides of a deck
    Show(ShowArgs),

    /// Change a field or attribute of a slide
    Set(SetArgs),

    /// Append a slide
    Add(AddArgs),

    /// Delete a slide
    Delete(DeleteArgs),

    /// Move a slide one position
    Move(MoveArgs),

    /// Export the deck as JSON
    Export(ExportArgs),
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()
        .context("Cannot get current directory")?
        .display()
        .to_string();

    let config = config::load(&cwd)?;
    let ctx = DeckContext::new(&cwd, config, cli.deck, config::passphrase(cli.key));

    match cli.command {
        Command::New(args) => new(args, &ctx).await,
        Command::Show(args) => show(args, &ctx).await,
        Command::Set(args) => set(args, &ctx).await,
        Command::Add(args) => add(args, &ctx).await,
        Command::Delete(args) => delete(args, &ctx).await,
        Command::Move(args) => move_slide(args, &ctx).await,
        Command::Export(args) => export(args, &ctx).await,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("slidedeck=info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
