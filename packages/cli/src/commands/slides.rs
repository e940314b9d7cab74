use super::{save, slide_at, DeckContext};
use anyhow::{bail, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use slidedeck_editor::{FieldKey, MoveDirection, SlideType};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SlideAttribute {
    Title,
    Subtitle,
    Notes,
    Theme,
    Layout,
    Transition,
    Background,
    Type,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Slide position, starting at 1
    pub slide: usize,

    pub attribute: SlideAttribute,

    /// New value; empty clears theme and background
    pub value: String,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Title of the new slide
    #[arg(short, long)]
    pub title: Option<String>,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Slide position, starting at 1
    pub slide: usize,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Args)]
pub struct MoveArgs {
    /// Slide position, starting at 1
    pub slide: usize,

    pub direction: Direction,
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

pub async fn set(args: SetArgs, ctx: &DeckContext) -> Result<()> {
    let mut session = ctx.open().await?;
    let id = slide_at(&session, args.slide)?;
    let value = args.value;

    let changed = match args.attribute {
        SlideAttribute::Title => session.update_field(&id, FieldKey::Title, value.as_str()),
        SlideAttribute::Subtitle => session.update_field(&id, FieldKey::Subtitle, value.as_str()),
        SlideAttribute::Notes => session.update_field(&id, FieldKey::Notes, value.as_str()),
        SlideAttribute::Theme => session.set_theme(&id, optional(&value)),
        SlideAttribute::Layout => session.set_layout(&id, value.as_str()),
        SlideAttribute::Transition => session.set_transition(&id, value.as_str()),
        SlideAttribute::Background => session.set_background(&id, optional(&value)),
        SlideAttribute::Type => match SlideType::parse(&value) {
            Some(slide_type) => session.set_slide_type(&id, slide_type),
            None => bail!("Unknown slide type '{}'. Use: cover, content, or ending", value),
        },
    };

    if !changed {
        println!("{} Slide {} unchanged", "-".dimmed(), args.slide);
        return Ok(());
    }
    save(&mut session).await?;
    println!("{} Updated slide {}", "✓".green(), args.slide);
    Ok(())
}

pub async fn add(args: AddArgs, ctx: &DeckContext) -> Result<()> {
    let mut session = ctx.open().await?;
    let id = session.add_slide();
    if let Some(title) = &args.title {
        session.update_field(&id, FieldKey::Title, title.as_str());
    }
    save(&mut session).await?;

    println!("{} Added slide {}", "✓".green(), session.document().len());
    Ok(())
}

pub async fn delete(args: DeleteArgs, ctx: &DeckContext) -> Result<()> {
    let mut session = ctx.open().await?;
    let id = slide_at(&session, args.slide)?;

    if !session.delete_slide(&id) {
        bail!("Cannot delete the only slide in a deck");
    }
    save(&mut session).await?;

    println!("{} Deleted slide {}", "✓".green(), args.slide);
    Ok(())
}

pub async fn move_slide(args: MoveArgs, ctx: &DeckContext) -> Result<()> {
    let mut session = ctx.open().await?;
    let id = slide_at(&session, args.slide)?;
    session.select_slide(&id);

    let direction = match args.direction {
        Direction::Up => MoveDirection::Up,
        Direction::Down => MoveDirection::Down,
    };
    if !session.move_slide(direction) {
        println!("{} Slide {} is already at the edge", "-".dimmed(), args.slide);
        return Ok(());
    }
    save(&mut session).await?;

    let position = session.document().selected_index() + 1;
    println!("{} Moved slide {} to position {}", "✓".green(), args.slide, position);
    Ok(())
}
