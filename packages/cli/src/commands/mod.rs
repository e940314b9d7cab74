pub mod export;
pub mod new;
pub mod show;
pub mod slides;

pub use export::{export, ExportArgs};
pub use new::{new, NewArgs};
pub use show::{show, ShowArgs};
pub use slides::{add, delete, move_slide, set, AddArgs, DeleteArgs, MoveArgs, SetArgs};

use anyhow::{bail, Result};
use slidedeck_common::{FileStorage, KeyValueStorage, SlideId};
use slidedeck_workspace::{PersistenceAdapter, PresentationSession, SessionConfig};
use std::sync::Arc;

/// Everything a command needs to find and open a local deck
pub struct DeckContext {
    pub config: SessionConfig,
    pub deck: String,
    pub storage: Arc<dyn KeyValueStorage>,
    pub passphrase: Option<String>,
}

impl DeckContext {
    pub fn new(cwd: &str, config: SessionConfig, deck: String, passphrase: Option<String>) -> Self {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(FileStorage::new(config.storage_path(cwd)));
        Self {
            config,
            deck,
            storage,
            passphrase,
        }
    }

    pub fn key(&self) -> String {
        self.config.local_key(&self.deck)
    }

    pub fn exists(&self) -> Result<bool> {
        Ok(self.storage.get(&self.key())?.is_some())
    }

    /// Open the deck; it must have been created with `slidedeck new`
    pub async fn open(&self) -> Result<PresentationSession> {
        if !self.exists()? {
            bail!("Deck '{}' does not exist. Run: slidedeck new {}", self.deck, self.deck);
        }
        Ok(self.open_unchecked().await)
    }

    pub async fn open_unchecked(&self) -> PresentationSession {
        let adapter = PersistenceAdapter::fallback(Arc::clone(&self.storage), self.key());
        PresentationSession::open(adapter, None, &self.config).await
    }
}

/// Slide id at a 1-based position
pub fn slide_at(session: &PresentationSession, position: usize) -> Result<SlideId> {
    let slides = session.document().slides();
    match position.checked_sub(1).and_then(|index| slides.get(index)) {
        Some(slide) => Ok(slide.id.clone()),
        None => bail!("No slide at position {} (deck has {})", position, slides.len()),
    }
}

/// Save, turning a failure status into an error
pub async fn save(session: &mut PresentationSession) -> Result<()> {
    if session.save().await {
        return Ok(());
    }
    let reason = session
        .status()
        .current()
        .map(|status| status.text)
        .unwrap_or_else(|| "Failed to save".to_string());
    bail!(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidedeck_editor::FieldKey;

    fn context(dir: &tempfile::TempDir) -> DeckContext {
        DeckContext::new(
            &dir.path().display().to_string(),
            SessionConfig::default(),
            "talk".to_string(),
            Some("secret".to_string()),
        )
    }

    #[tokio::test]
    async fn test_missing_deck_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        assert!(!ctx.exists().unwrap());
        assert!(ctx.open().await.is_err());
    }

    #[tokio::test]
    async fn test_saved_deck_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);

        let mut session = ctx.open_unchecked().await;
        let first = slide_at(&session, 1).unwrap();
        session.update_field(&first, FieldKey::Title, "Intro");
        session.add_slide();
        save(&mut session).await.unwrap();

        let reopened = ctx.open().await.unwrap();
        assert_eq!(reopened.document().len(), 2);
        assert_eq!(slide_at(&reopened, 1).unwrap(), first);
        assert!(slide_at(&reopened, 0).is_err());
        assert!(slide_at(&reopened, 3).is_err());
    }
}
