//! Batch title translation.
//!
//! All titles of a feed go to the backend in one request, in item order. The
//! response is applied only when it is complete: a failed call or a response
//! whose length differs from the request leaves every title untouched and
//! fails the whole operation. There is no per-item fallback.

use std::sync::Arc;

use crate::error::{Result, TransfeedError};
use crate::feed::Item;
use crate::translate::{LanguageTag, Translator};

/// Format a translated title, keeping the original as a trailing parenthetical.
pub fn annotate(translated: &str, original: &str) -> String {
    format!("{} ({})", translated, original)
}

/// Rewrites item titles into a target language.
#[derive(Clone)]
pub struct TitleTranslator {
    backend: Arc<dyn Translator>,
    target: LanguageTag,
}

impl TitleTranslator {
    /// Create a title translator over a shared backend.
    pub fn new(backend: Arc<dyn Translator>, target: LanguageTag) -> Self {
        Self { backend, target }
    }

    /// The language titles are translated into.
    pub fn target(&self) -> &LanguageTag {
        &self.target
    }

    /// Translate every item title in one backend call.
    ///
    /// On success each title becomes `"<translated> (<original>)"`. On error
    /// no item is modified.
    pub async fn translate(&self, items: &mut [Item]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }

        let batch: Vec<String> = items.iter().map(|item| item.title.clone()).collect();
        let translated = self.backend.translate_batch(&batch, &self.target).await?;

        if translated.len() != items.len() {
            return Err(TransfeedError::Translation(format!(
                "expected {} translations, got {}",
                items.len(),
                translated.len()
            )));
        }

        for (item, text) in items.iter_mut().zip(translated) {
            item.title = annotate(&text, &item.title);
        }

        tracing::debug!(
            count = items.len(),
            target = %self.target,
            "Translated item titles"
        );
        Ok(())
    }
}
