use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use uuid::Uuid;

use super::{Collection, CollectionStore, Document, Fields};
use crate::errors::StoreError;

/// A store that keeps its documents in memory. Used by the tests.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
    calls: AtomicUsize,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Default::default()
    }

    /// Inserts a document with a caller-chosen ID, bypassing the call
    /// counter. Used to seed fixtures.
    pub fn seed(&self, collection: Collection, document: Document) {
        self.write(|collections| {
            collections.entry(collection).or_default().push(document);
        })
    }

    /// The number of store calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Makes every following call fail with `StoreError::Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Returns a copy of a document's fields, if present.
    pub fn get(&self, collection: Collection, id: &str) -> Option<Fields> {
        self.read(|collections| {
            collections
                .get(&collection)
                .and_then(|documents| documents.iter().find(|d| d.id == id))
                .map(|d| d.fields.clone())
        })
    }

    fn begin(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable {
                reason: "memory store is offline".to_owned(),
            })
        } else {
            Ok(())
        }
    }

    // a panic while holding the lock cannot leave a document half
    // written, so poisoning is ignored
    fn read<T>(&self, f: impl FnOnce(&HashMap<Collection, Vec<Document>>) -> T) -> T {
        let guard = self.collections.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn write<T>(&self, f: impl FnOnce(&mut HashMap<Collection, Vec<Document>>) -> T) -> T {
        let mut guard = self.collections.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl CollectionStore for MemoryStore {
    fn fetch_all(&self, collection: Collection) -> BoxFuture<Result<Vec<Document>, StoreError>> {
        let result = self.begin().map(|_| {
            self.read(|collections| collections.get(&collection).cloned().unwrap_or_default())
        });

        async move { result }.boxed()
    }

    fn fetch_where(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> BoxFuture<Result<Vec<Document>, StoreError>> {
        let result = self.begin().map(|_| {
            self.read(|collections| {
                collections
                    .get(&collection)
                    .map(|documents| {
                        documents
                            .iter()
                            .filter(|d| d.fields.get(field) == Some(value))
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default()
            })
        });

        async move { result }.boxed()
    }

    fn insert(&self, collection: Collection, fields: Fields) -> BoxFuture<Result<String, StoreError>> {
        let result = self.begin().map(|_| {
            let id = Uuid::new_v4().to_string();

            self.write(|collections| {
                collections
                    .entry(collection)
                    .or_default()
                    .push(Document::new(id.clone(), fields));
            });

            id
        });

        async move { result }.boxed()
    }

    fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> BoxFuture<Result<(), StoreError>> {
        let result = self.begin().and_then(|_| {
            self.write(|collections| {
                let document = collections
                    .get_mut(&collection)
                    .and_then(|documents| documents.iter_mut().find(|d| d.id == id));

                match document {
                    Some(document) => {
                        document.fields.extend(fields);
                        Ok(())
                    }
                    None => Err(StoreError::NotFound {
                        collection,
                        id: id.to_owned(),
                    }),
                }
            })
        });

        async move { result }.boxed()
    }

    fn delete(&self, collection: Collection, id: &str) -> BoxFuture<Result<(), StoreError>> {
        let result = self.begin().map(|_| {
            self.write(|collections| {
                if let Some(documents) = collections.get_mut(&collection) {
                    documents.retain(|d| d.id != id);
                }
            })
        });

        async move { result }.boxed()
    }
}
