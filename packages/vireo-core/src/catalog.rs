//! Storage collaborator contract and an in-memory implementation.
//!
//! The session never owns channel metadata; it only queries it through
//! [`Catalog`]. [`InMemoryCatalog`] backs the headless driver and the tests.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::stream::BoxStream;
use thiserror::Error;
use tokio::sync::watch;

use crate::model::{Container, Item};

/// Errors reported by the storage collaborator.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// A write targeted an id that does not exist.
    #[error("item not found: {0}")]
    NotFound(String),
    /// The store could not serve the request.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Query/write surface of the channel store.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Observes an item by id.
    ///
    /// Emits the current value first, then again whenever the store changes.
    /// `None` means the item is not (yet) available.
    fn observe_by_id(&self, id: &str) -> BoxStream<'static, Option<Item>>;

    /// Gets an item by id.
    async fn get(&self, id: &str) -> CatalogResult<Option<Item>>;

    /// Gets an item by its stream URL.
    async fn get_by_url(&self, url: &str) -> CatalogResult<Option<Item>>;

    /// Sets the favourite flag of an item.
    async fn set_favourite(&self, id: &str, favourite: bool) -> CatalogResult<()>;

    /// Gets a container by reference.
    async fn get_container(&self, container_ref: &str) -> CatalogResult<Option<Container>>;
}

/// Concurrent in-memory catalog.
///
/// Every write bumps a revision counter; observers re-read their item on each
/// bump, so `observe_by_id` streams behave like live queries.
pub struct InMemoryCatalog {
    items: Arc<DashMap<String, Item>>,
    containers: DashMap<String, Container>,
    revision: watch::Sender<u64>,
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            items: Arc::new(DashMap::new()),
            containers: DashMap::new(),
            revision,
        }
    }

    /// Inserts or replaces an item.
    pub fn insert_item(&self, item: Item) {
        self.items.insert(item.id.clone(), item);
        self.bump();
    }

    /// Inserts or replaces a container.
    pub fn insert_container(&self, container: Container) {
        self.containers.insert(container.id.clone(), container);
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the catalog holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    fn observe_by_id(&self, id: &str) -> BoxStream<'static, Option<Item>> {
        let items = Arc::clone(&self.items);
        let mut revision = self.revision.subscribe();
        let id = id.to_string();

        Box::pin(async_stream::stream! {
            loop {
                revision.borrow_and_update();
                let current = items.get(&id).map(|r| r.value().clone());
                yield current;
                if revision.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    async fn get(&self, id: &str) -> CatalogResult<Option<Item>> {
        Ok(self.items.get(id).map(|r| r.value().clone()))
    }

    async fn get_by_url(&self, url: &str) -> CatalogResult<Option<Item>> {
        Ok(self
            .items
            .iter()
            .find(|r| r.value().url == url)
            .map(|r| r.value().clone()))
    }

    async fn set_favourite(&self, id: &str, favourite: bool) -> CatalogResult<()> {
        {
            let mut entry = self
                .items
                .get_mut(id)
                .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
            entry.favourite = favourite;
        }
        self.bump();
        Ok(())
    }

    async fn get_container(&self, container_ref: &str) -> CatalogResult<Option<Container>> {
        Ok(self.containers.get(container_ref).map(|r| r.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn item(id: &str) -> Item {
        Item {
            id: id.to_string(),
            url: format!("http://streams.local/{id}.m3u8"),
            title: format!("Channel {id}"),
            container_ref: "news".to_string(),
            favourite: false,
        }
    }

    #[tokio::test]
    async fn get_by_url_finds_item() {
        let catalog = InMemoryCatalog::new();
        catalog.insert_item(item("a"));
        catalog.insert_item(item("b"));

        let found = catalog
            .get_by_url("http://streams.local/b.m3u8")
            .await
            .unwrap();
        assert_eq!(found.map(|i| i.id), Some("b".to_string()));
        assert!(catalog.get_by_url("http://nowhere").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_favourite_on_missing_item_is_not_found() {
        let catalog = InMemoryCatalog::new();
        let result = catalog.set_favourite("ghost", true).await;
        assert!(matches!(result, Err(CatalogError::NotFound(id)) if id == "ghost"));
    }

    #[tokio::test]
    async fn observe_emits_current_then_changes() {
        let catalog = InMemoryCatalog::new();
        let mut stream = catalog.observe_by_id("a");

        assert_eq!(stream.next().await, Some(None));

        catalog.insert_item(item("a"));
        let emitted = stream.next().await.unwrap().unwrap();
        assert!(!emitted.favourite);

        catalog.set_favourite("a", true).await.unwrap();
        let emitted = stream.next().await.unwrap().unwrap();
        assert!(emitted.favourite);
    }

    #[tokio::test]
    async fn containers_are_looked_up_by_reference() {
        let catalog = InMemoryCatalog::new();
        catalog.insert_container(Container {
            id: "news".into(),
            title: "News".into(),
        });
        let container = catalog.get_container("news").await.unwrap().unwrap();
        assert_eq!(container.title, "News");
        assert!(catalog.get_container("sports").await.unwrap().is_none());
    }
}
