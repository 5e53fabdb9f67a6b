pub mod handler;
pub mod ingest;

use crate::analytics::cache::AnalyticsCache;
use crate::storage::blob::BlobStore;
use crate::storage::executor::QueryExecutor;
use std::sync::Arc;

/// Shared state for the gallery routes.
pub struct ImageState {
    pub executor: QueryExecutor,
    pub blobs: BlobStore,
    pub cache: Arc<AnalyticsCache>,
}
