//! Title translation.
//!
//! [`Translator`] is the seam to the external translation backend;
//! [`GoogleTranslator`] is the production implementation and
//! [`TitleTranslator`] applies a batch result to feed items.

pub mod credentials;
pub mod google;
pub mod language;
pub mod titles;

use async_trait::async_trait;

use crate::error::Result;

pub use credentials::{Credentials, ServiceAccount};
pub use google::GoogleTranslator;
pub use language::LanguageTag;
pub use titles::{annotate, TitleTranslator};

/// A batch translation capability.
///
/// Implementations must return exactly one translation per input, in input
/// order.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `texts` into `target`.
    async fn translate_batch(&self, texts: &[String], target: &LanguageTag) -> Result<Vec<String>>;
}
