//! Output feed construction and Atom rendering.
//!
//! [`build`] maps the internal model onto [`OutputFeed`], where every field
//! carries a value: missing authors become empty authors and missing
//! timestamps become the Unix epoch. [`render_atom`] serializes the result as
//! an Atom 1.0 document.

use atom_syndication::{Entry, FixedDateTime, Link, Person, Text};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{Result, TransfeedError};
use crate::feed::types::{Author, Feed, Item};

/// Content type of rendered feeds.
pub const ATOM_CONTENT_TYPE: &str = "application/atom+xml";

/// Author in the output format.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutputAuthor {
    pub name: String,
    pub email: String,
}

impl OutputAuthor {
    fn is_empty(&self) -> bool {
        self.name.is_empty() && self.email.is_empty()
    }

    fn to_person(&self) -> Option<Person> {
        if self.is_empty() {
            return None;
        }
        let mut person = Person::default();
        person.set_name(self.name.clone());
        person.set_email((!self.email.is_empty()).then(|| self.email.clone()));
        Some(person)
    }
}

/// Entry in the output format.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputItem {
    pub title: String,
    pub description: String,
    pub link: String,
    pub author: OutputAuthor,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Feed in the output format.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputFeed {
    pub title: String,
    pub link: String,
    pub description: String,
    pub author: OutputAuthor,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub items: Vec<OutputItem>,
}

fn author(author: Option<&Author>) -> OutputAuthor {
    author
        .map(|a| OutputAuthor {
            name: a.name.clone(),
            email: a.email.clone().unwrap_or_default(),
        })
        .unwrap_or_default()
}

fn instant(ts: Option<DateTime<Utc>>) -> DateTime<Utc> {
    ts.unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

fn build_item(item: &Item) -> OutputItem {
    OutputItem {
        title: item.title.clone(),
        description: item.description.clone(),
        link: item.link.clone(),
        author: author(item.author.as_ref()),
        created: instant(item.published),
        updated: instant(item.updated),
    }
}

/// Map a feed onto the output model. Never fails.
pub fn build(feed: &Feed) -> OutputFeed {
    OutputFeed {
        title: feed.title.clone(),
        link: feed.link.clone(),
        description: feed.description.clone(),
        author: author(feed.author.as_ref()),
        created: instant(feed.created),
        updated: instant(feed.updated),
        items: feed.items.iter().map(build_item).collect(),
    }
}

fn is_zero(ts: DateTime<Utc>) -> bool {
    ts == DateTime::<Utc>::UNIX_EPOCH
}

/// `updated` falling back to `created`; the epoch when both are zero.
fn last_modified(created: DateTime<Utc>, updated: DateTime<Utc>) -> FixedDateTime {
    if is_zero(updated) {
        created.fixed_offset()
    } else {
        updated.fixed_offset()
    }
}

fn published(created: DateTime<Utc>) -> Option<FixedDateTime> {
    (!is_zero(created)).then(|| created.fixed_offset())
}

/// Name-based UUID URN, stable for the same inputs.
fn urn_uuid(parts: &[&str]) -> String {
    let name = parts.join("\n");
    format!(
        "urn:uuid:{}",
        Uuid::new_v5(&Uuid::NAMESPACE_URL, name.as_bytes())
    )
}

/// Entry id: a `tag:` URI from link host, date and path when the entry has
/// both, otherwise a name-based UUID.
fn entry_id(item: &OutputItem) -> String {
    let stamp = [item.updated, item.created]
        .into_iter()
        .find(|ts| !is_zero(*ts));

    if let (Ok(url), Some(stamp)) = (url::Url::parse(&item.link), stamp) {
        if let Some(host) = url.host_str() {
            return format!("tag:{},{}:{}", host, stamp.format("%Y-%m-%d"), url.path());
        }
    }
    urn_uuid(&[&item.link, &item.title])
}

fn alternate(href: &str) -> Vec<Link> {
    if href.is_empty() {
        return Vec::new();
    }
    let mut link = Link::default();
    link.set_href(href);
    link.set_rel("alternate");
    vec![link]
}

fn render_entry(item: &OutputItem) -> Entry {
    let mut entry = Entry::default();
    entry.set_title(Text::plain(item.title.clone()));
    entry.set_id(entry_id(item));
    entry.set_updated(last_modified(item.created, item.updated));
    entry.set_published(published(item.created));
    entry.set_links(alternate(&item.link));
    entry.set_authors(item.author.to_person().into_iter().collect::<Vec<_>>());
    if !item.description.is_empty() {
        entry.set_summary(Some(Text::html(item.description.clone())));
    }
    entry
}

/// Serialize an output feed as an Atom document.
pub fn render_atom(feed: &OutputFeed) -> Result<Vec<u8>> {
    let id = if feed.link.is_empty() {
        urn_uuid(&[&feed.title])
    } else {
        feed.link.clone()
    };

    let mut out = atom_syndication::Feed::default();
    out.set_title(Text::plain(feed.title.clone()));
    out.set_id(id);
    out.set_updated(last_modified(feed.created, feed.updated));
    out.set_links(alternate(&feed.link));
    out.set_authors(feed.author.to_person().into_iter().collect::<Vec<_>>());
    if !feed.description.is_empty() {
        out.set_subtitle(Some(Text::plain(feed.description.clone())));
    }
    out.set_entries(feed.items.iter().map(render_entry).collect::<Vec<_>>());

    out.write_to(Vec::new())
        .map_err(|e| TransfeedError::Render(format!("failed to write Atom: {}", e)))
}
