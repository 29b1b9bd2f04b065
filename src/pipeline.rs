//! Request pipeline: fetch, select, translate, render.

use std::sync::Arc;

use crate::error::Result;
use crate::feed::{self, FeedSource};
use crate::translate::TitleTranslator;

/// Runs one feed through every stage.
///
/// Stages run sequentially and the first failure short-circuits the rest.
/// Holds no per-request state, so one instance serves all requests.
#[derive(Clone)]
pub struct RequestPipeline {
    source: Arc<dyn FeedSource>,
    titles: TitleTranslator,
}

impl RequestPipeline {
    pub fn new(source: Arc<dyn FeedSource>, titles: TitleTranslator) -> Self {
        Self { source, titles }
    }

    /// Produce the translated feed document for `url`.
    pub async fn run(&self, url: &str) -> Result<Vec<u8>> {
        let mut feed = self.source.fetch(url).await.inspect_err(|e| {
            tracing::warn!(url, error = %e, "Feed fetch failed");
        })?;

        let fetched = feed.items.len();
        feed.items = feed::select(std::mem::take(&mut feed.items));

        self.titles
            .translate(&mut feed.items)
            .await
            .inspect_err(|e| {
                tracing::warn!(url, error = %e, "Title translation failed");
            })?;

        let body = feed::render_atom(&feed::build(&feed))?;

        tracing::info!(
            url,
            fetched,
            served = feed.items.len(),
            target = %self.titles.target(),
            "Feed translated"
        );
        Ok(body)
    }
}
