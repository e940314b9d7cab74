use super::DeckContext;
use anyhow::{bail, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use serde_json::{Map, Value};
use slidedeck_codec::FieldCipher;
use slidedeck_editor::slides_to_json;
use slidedeck_workspace::SlideRecord;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    /// The local deck JSON
    Slides,
    /// Remote slide records keyed by slide id, text fields encrypted
    Records,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[arg(short, long, value_enum, default_value = "slides")]
    pub format: ExportFormat,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub async fn export(args: ExportArgs, ctx: &DeckContext) -> Result<()> {
    let session = ctx.open().await?;
    let slides = session.document().slides();

    let json = match args.format {
        ExportFormat::Slides => slides_to_json(slides)?,
        ExportFormat::Records => {
            let Some(passphrase) = ctx.passphrase.as_deref() else {
                bail!("Exporting records needs a key: pass --key or set SLIDEDECK_KEY");
            };
            let cipher = FieldCipher::from_passphrase(passphrase);
            let records: Map<String, Value> = slides
                .iter()
                .map(|slide| {
                    let fields = SlideRecord::from_slide(slide, &cipher).to_fields();
                    (slide.id.to_string(), Value::Object(fields))
                })
                .collect();
            serde_json::to_string_pretty(&records)?
        }
    };

    match &args.output {
        Some(path) => {
            fs::write(path, json)?;
            eprintln!("{} Exported {} slides to {}", "✓".green(), slides.len(), path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}
