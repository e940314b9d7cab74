use super::DeckContext;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use slidedeck_codec::plain_text;

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Print the assistant projection as JSON instead
    #[arg(long)]
    pub json: bool,

    /// Include speaker notes
    #[arg(short, long)]
    pub notes: bool,
}

pub async fn show(args: ShowArgs, ctx: &DeckContext) -> Result<()> {
    let session = ctx.open().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&session.projection())?);
        return Ok(());
    }

    let slides = session.document().slides();
    println!("{} ({} slides)", ctx.deck.bright_white().bold(), slides.len());
    println!();

    for slide in slides {
        let title = plain_text(&slide.title);
        let title = if title.is_empty() { "(untitled)".dimmed().to_string() } else { title };

        println!("  {:>2}. {} {}", slide.order, title, format!("[{}]", slide.slide_type.as_str()).dimmed());

        let body = plain_text(&slide.subtitle);
        if !body.is_empty() {
            println!("      {}", body);
        }
        if !slide.text_boxes.is_empty() {
            println!("      {} {} text boxes", "+".dimmed(), slide.text_boxes.len());
        }
        if args.notes {
            let notes = plain_text(&slide.notes);
            if !notes.is_empty() {
                println!("      {} {}", "notes:".blue(), notes.dimmed());
            }
        }
    }

    Ok(())
}
