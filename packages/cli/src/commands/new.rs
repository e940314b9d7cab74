use super::{save, DeckContext};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use slidedeck_editor::FieldKey;

#[derive(Debug, Args)]
pub struct NewArgs {
    /// Title of the first slide
    #[arg(short, long)]
    pub title: Option<String>,

    /// Force overwrite an existing deck
    #[arg(short, long)]
    pub force: bool,
}

pub async fn new(args: NewArgs, ctx: &DeckContext) -> Result<()> {
    if ctx.exists()? && !args.force {
        println!("{} Deck {} already exists", "⚠️".yellow(), ctx.deck.bright_white());
        println!("Use --force to overwrite");
        return Ok(());
    }

    ctx.storage.remove(&ctx.key())?;
    let mut session = ctx.open_unchecked().await;

    if let Some(title) = &args.title {
        let first = session.document().selected_id().clone();
        session.update_field(&first, FieldKey::Title, title.as_str());
    }
    save(&mut session).await?;

    println!("{} Created deck {}", "✓".green(), ctx.deck.bright_white());
    println!();
    println!("Next steps:");
    println!("  1. Run: slidedeck --deck {} set 1 subtitle \"...\"", ctx.deck);
    println!("  2. Run: slidedeck --deck {} show", ctx.deck);

    Ok(())
}
