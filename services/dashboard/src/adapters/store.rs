//! services/dashboard/src/adapters/store.rs
//!
//! The narrow slice of a document store the database adapter relies on:
//! exact-match filters, projections, ascending sorts, and find-one versus
//! find-many. `MongoStore` provides it over the MongoDB driver.

use async_trait::async_trait;
use bson::{doc, Document};
use futures::TryStreamExt;
use mongodb::{Client, Database};
use practice_diff_core::ports::{PortError, PortResult};
use tracing::info;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        projection: Document,
    ) -> PortResult<Option<Document>>;

    async fn find_many(
        &self,
        collection: &str,
        filter: Document,
        projection: Document,
        sort: Document,
    ) -> PortResult<Vec<Document>>;
}

fn store_error(e: mongodb::error::Error) -> PortError {
    PortError::Transport(e.to_string())
}

//=========================================================================================
// MongoDB
//=========================================================================================

/// A handle on one MongoDB database. Cloning shares the underlying pool.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    /// Creates the process-wide client. Call once at startup.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, mongodb::error::Error> {
        let client = Client::with_uri_str(uri).await?;
        let db = client.database(database);
        Ok(Self { client, db })
    }

    pub async fn ping(&self) -> Result<(), mongodb::error::Error> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    /// Closes the client's connections. Call once, after the server has stopped.
    pub async fn shutdown(self) {
        info!(database = self.db.name(), "Closing document store client");
        self.client.shutdown().await;
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        projection: Document,
    ) -> PortResult<Option<Document>> {
        self.db
            .collection::<Document>(collection)
            .find_one(filter)
            .projection(projection)
            .await
            .map_err(store_error)
    }

    async fn find_many(
        &self,
        collection: &str,
        filter: Document,
        projection: Document,
        sort: Document,
    ) -> PortResult<Vec<Document>> {
        let cursor = self
            .db
            .collection::<Document>(collection)
            .find(filter)
            .projection(projection)
            .sort(sort)
            .await
            .map_err(store_error)?;
        cursor.try_collect().await.map_err(store_error)
    }
}

//=========================================================================================
// In-memory store for tests
//=========================================================================================
