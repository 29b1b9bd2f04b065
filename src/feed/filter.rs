//! Recency filter.

use std::cmp::Reverse;

use crate::feed::types::Item;

/// Maximum number of items kept in the proxied feed.
pub const MAX_ITEMS: usize = 10;

/// Order items newest first and keep at most [`MAX_ITEMS`].
///
/// Sorting is stable on [`Item::effective_timestamp`], so items sharing a
/// timestamp (including items with none) keep their source order.
pub fn select(mut items: Vec<Item>) -> Vec<Item> {
    items.sort_by_key(|item| Reverse(item.effective_timestamp()));
    items.truncate(MAX_ITEMS);
    items
}
