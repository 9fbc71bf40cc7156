use std::fmt;

use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;

use crate::errors::StoreError;

pub mod memory;

pub use self::postgres::*;

/// The fields of a stored document.
pub type Fields = serde_json::Map<String, Value>;

/// A named bucket of documents in the external store.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Courses,
    Videos,
    Quizzes,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Courses => "courses",
            Collection::Videos => "videos",
            Collection::Quizzes => "quizzes",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document as returned by the store: its assigned ID and its fields.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Document {
            id: id.into(),
            fields,
        }
    }
}

/// The seam to the external document store. Every call is independent;
/// nothing is transactional across calls.
pub trait CollectionStore: Send + Sync {
    /// Returns every document in the collection, in insertion order.
    fn fetch_all(&self, collection: Collection) -> BoxFuture<Result<Vec<Document>, StoreError>>;

    /// Returns the documents whose `field` equals `value`.
    fn fetch_where(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> BoxFuture<Result<Vec<Document>, StoreError>>;

    /// Inserts a new document and returns the ID the store assigned.
    fn insert(&self, collection: Collection, fields: Fields) -> BoxFuture<Result<String, StoreError>>;

    /// Merges `fields` into an existing document. Fails with
    /// `StoreError::NotFound` if there is no such document.
    fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> BoxFuture<Result<(), StoreError>>;

    /// Deletes a document. Deleting a missing document succeeds.
    fn delete(&self, collection: Collection, id: &str) -> BoxFuture<Result<(), StoreError>>;
}

mod postgres {
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use serde_json::Value;
    use sqlx::postgres::PgPool;
    use uuid::Uuid;

    use super::{Collection, Document, Fields};
    use crate::errors::StoreError;

    /// A store that keeps every collection as JSONB rows of a single
    /// `documents` table.
    pub struct PgStore {
        pool: PgPool,
    }

    impl PgStore {
        pub fn new(pool: PgPool) -> Self {
            PgStore { pool }
        }
    }

    // these can be simplified once async functions in traits are stabilized
    impl super::CollectionStore for PgStore {
        fn fetch_all(&self, collection: Collection) -> BoxFuture<Result<Vec<Document>, StoreError>> {
            async move {
                let query = sqlx::query_as::<_, (Uuid, Value)>(include_str!("queries/fetch_all.sql"));

                let rows = query
                    .bind(collection.as_str())
                    .fetch_all(&self.pool)
                    .await?;

                let documents = rows
                    .into_iter()
                    .map(|row| to_document(collection, row))
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(documents)
            }
            .boxed()
        }

        fn fetch_where(
            &self,
            collection: Collection,
            field: &str,
            value: &Value,
        ) -> BoxFuture<Result<Vec<Document>, StoreError>> {
            // containment on a one-field object is equality for scalars and
            // can use the GIN index on `data`
            let mut pattern = Fields::new();
            pattern.insert(field.to_owned(), value.clone());

            async move {
                let query =
                    sqlx::query_as::<_, (Uuid, Value)>(include_str!("queries/fetch_where.sql"));

                let rows = query
                    .bind(collection.as_str())
                    .bind(Value::Object(pattern))
                    .fetch_all(&self.pool)
                    .await?;

                let documents = rows
                    .into_iter()
                    .map(|row| to_document(collection, row))
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(documents)
            }
            .boxed()
        }

        fn insert(&self, collection: Collection, fields: Fields) -> BoxFuture<Result<String, StoreError>> {
            async move {
                let query = sqlx::query_as(include_str!("queries/insert.sql"));

                let (id,): (Uuid,) = query
                    .bind(collection.as_str())
                    .bind(Value::Object(fields))
                    .fetch_one(&self.pool)
                    .await?;

                Ok(id.to_string())
            }
            .boxed()
        }

        fn update(
            &self,
            collection: Collection,
            id: &str,
            fields: Fields,
        ) -> BoxFuture<Result<(), StoreError>> {
            let id = id.to_owned();

            async move {
                let not_found = || StoreError::NotFound {
                    collection,
                    id: id.clone(),
                };

                // IDs we never assigned cannot exist
                let uuid = Uuid::parse_str(&id).map_err(|_| not_found())?;

                let count = sqlx::query(include_str!("queries/update.sql"))
                    .bind(collection.as_str())
                    .bind(uuid)
                    .bind(Value::Object(fields))
                    .execute(&self.pool)
                    .await?
                    .rows_affected();

                if count == 0 {
                    Err(not_found())
                } else {
                    Ok(())
                }
            }
            .boxed()
        }

        fn delete(&self, collection: Collection, id: &str) -> BoxFuture<Result<(), StoreError>> {
            let id = id.to_owned();

            async move {
                let uuid = match Uuid::parse_str(&id) {
                    Ok(uuid) => uuid,
                    Err(_) => return Ok(()),
                };

                sqlx::query(include_str!("queries/delete.sql"))
                    .bind(collection.as_str())
                    .bind(uuid)
                    .execute(&self.pool)
                    .await?;

                Ok(())
            }
            .boxed()
        }
    }

    fn to_document(collection: Collection, (id, data): (Uuid, Value)) -> Result<Document, StoreError> {
        let id = id.to_string();

        match data {
            Value::Object(fields) => Ok(Document::new(id, fields)),
            _ => Err(StoreError::MalformedDocument {
                collection,
                id,
                field: "data",
            }),
        }
    }
}
