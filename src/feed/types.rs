//! Feed data model.

use chrono::{DateTime, Utc};

/// Author of a feed or an item.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Author {
    /// Display name.
    pub name: String,
    /// Email address, if published.
    pub email: Option<String>,
}

impl Author {
    /// Create an author with a name only.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
        }
    }

    /// Set the email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// A parsed syndication feed.
///
/// Owned by a single pipeline invocation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Feed {
    /// Feed title.
    pub title: String,
    /// Site link.
    pub link: String,
    /// Feed description.
    pub description: String,
    /// Entries in source order.
    pub items: Vec<Item>,
    /// Feed author.
    pub author: Option<Author>,
    /// When the feed was first published.
    pub created: Option<DateTime<Utc>>,
    /// When the feed was last updated.
    pub updated: Option<DateTime<Utc>>,
}

/// A single feed entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Item {
    /// Entry title.
    pub title: String,
    /// Entry summary or content.
    pub description: String,
    /// Link to the original article.
    pub link: String,
    /// Entry author.
    pub author: Option<Author>,
    /// When the entry was published.
    pub published: Option<DateTime<Utc>>,
    /// When the entry was last updated.
    pub updated: Option<DateTime<Utc>>,
}

impl Item {
    /// Create an item with a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Set the link.
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the author.
    pub fn with_author(mut self, author: Author) -> Self {
        self.author = Some(author);
        self
    }

    /// Set the published date.
    pub fn with_published(mut self, published: DateTime<Utc>) -> Self {
        self.published = Some(published);
        self
    }

    /// Set the updated date.
    pub fn with_updated(mut self, updated: DateTime<Utc>) -> Self {
        self.updated = Some(updated);
        self
    }

    /// Timestamp used for recency ordering.
    ///
    /// The update time, else the publish time, else the earliest
    /// representable instant.
    pub fn effective_timestamp(&self) -> DateTime<Utc> {
        self.updated
            .or(self.published)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}
