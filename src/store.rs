//! Client-side cache of listed collections
//!
//! One [`CollectionCache`] per resource type, keyed by the list filter. The
//! server stays the source of truth: a successful mutation invalidates every
//! entry of its type and bumps the type's generation, so a list response that
//! was issued before the mutation can no longer be stored.

use crate::api::VariableHints;
use crate::resource::{ContentBlock, EmailTemplate, NotificationTemplate, Resource, ResourceKind};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default freshness window of a cached collection
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct CacheEntry<R> {
    items: Vec<R>,
    fetched_at: Instant,
}

/// Cached collections of one resource type
#[derive(Debug)]
pub struct CollectionCache<R: Resource> {
    entries: HashMap<R::Filter, CacheEntry<R>>,
    generation: u64,
}

impl<R: Resource> Default for CollectionCache<R> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            generation: 0,
        }
    }
}

impl<R: Resource> CollectionCache<R> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get(&self, filter: &R::Filter, ttl: Duration) -> Option<&[R]> {
        self.entries
            .get(filter)
            .filter(|entry| entry.fetched_at.elapsed() < ttl)
            .map(|entry| entry.items.as_slice())
    }

    fn put(&mut self, filter: R::Filter, items: Vec<R>, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.entries.insert(
            filter,
            CacheEntry {
                items,
                fetched_at: Instant::now(),
            },
        );
        true
    }

    fn invalidate(&mut self) {
        self.entries.clear();
        self.generation += 1;
    }
}

/// The keyed cache shared by every panel of the page
#[derive(Debug)]
pub struct ResourceStore {
    ttl: Duration,
    pub content_blocks: CollectionCache<ContentBlock>,
    pub email_templates: CollectionCache<EmailTemplate>,
    pub notification_templates: CollectionCache<NotificationTemplate>,
    pub variable_hints: Option<VariableHints>,
}

impl Default for ResourceStore {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ResourceStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            content_blocks: CollectionCache::default(),
            email_templates: CollectionCache::default(),
            notification_templates: CollectionCache::default(),
            variable_hints: None,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh cached collection for `filter`, if any
    pub fn get<R: Resource>(&self, filter: &R::Filter) -> Option<&[R]> {
        R::cache(self).get(filter, self.ttl)
    }

    /// Store a fetched collection. Refused (returns false) when the type was
    /// invalidated after the fetch was issued at `generation`.
    pub fn put<R: Resource>(&mut self, filter: R::Filter, items: Vec<R>, generation: u64) -> bool {
        let stored = R::cache_mut(self).put(filter, items, generation);
        if !stored {
            debug!("Dropped stale {} list (generation {})", R::KIND.key(), generation);
        }
        stored
    }

    /// Generation a list request issued now should carry
    pub fn generation<R: Resource>(&self) -> u64 {
        R::cache(self).generation()
    }

    /// Drop every cached entry of `kind`, whatever its filter
    pub fn invalidate(&mut self, kind: ResourceKind) {
        debug!("Invalidating {} cache", kind.key());
        match kind {
            ResourceKind::ContentBlocks => self.content_blocks.invalidate(),
            ResourceKind::EmailTemplates => self.email_templates.invalidate(),
            ResourceKind::NotificationTemplates => self.notification_templates.invalidate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{BlockFilter, EmailTemplateFilter};

    fn block(id: i64, key: &str, category: &str) -> ContentBlock {
        ContentBlock {
            id,
            key: key.to_string(),
            category: category.to_string(),
            title: key.to_string(),
            html_content: String::new(),
            description: None,
            variables: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    fn filter(category: Option<&str>) -> BlockFilter {
        BlockFilter {
            category: category.map(String::from),
        }
    }

    #[test]
    fn test_filters_are_separate_keys() {
        let mut store = ResourceStore::default();
        let generation = store.generation::<ContentBlock>();

        assert!(store.put(filter(None), vec![block(1, "a", "x"), block(2, "b", "y")], generation));
        assert!(store.put(filter(Some("x")), vec![block(1, "a", "x")], generation));

        assert_eq!(store.get::<ContentBlock>(&filter(None)).map(<[_]>::len), Some(2));
        assert_eq!(store.get::<ContentBlock>(&filter(Some("x"))).map(<[_]>::len), Some(1));
        assert!(store.get::<ContentBlock>(&filter(Some("y"))).is_none());
    }

    #[test]
    fn test_invalidate_clears_every_filter_of_the_type() {
        let mut store = ResourceStore::default();
        let generation = store.generation::<ContentBlock>();
        store.put(filter(None), vec![block(1, "a", "x")], generation);
        store.put(filter(Some("x")), vec![block(1, "a", "x")], generation);
        store.put(EmailTemplateFilter::default(), Vec::<EmailTemplate>::new(), 0);

        store.invalidate(ResourceKind::ContentBlocks);

        assert!(store.content_blocks.is_empty());
        assert_eq!(store.generation::<ContentBlock>(), generation + 1);
        assert!(store
            .get::<EmailTemplate>(&EmailTemplateFilter::default())
            .is_some());
    }

    #[test]
    fn test_stale_generation_is_refused() {
        let mut store = ResourceStore::default();
        let issued_at = store.generation::<ContentBlock>();

        store.invalidate(ResourceKind::ContentBlocks);

        assert!(!store.put(filter(None), vec![block(1, "a", "x")], issued_at));
        assert!(store.get::<ContentBlock>(&filter(None)).is_none());
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let mut store = ResourceStore::new(Duration::ZERO);
        store.put(filter(None), vec![block(1, "a", "x")], 0);
        assert!(store.get::<ContentBlock>(&filter(None)).is_none());
    }
}
