//! Record Visit Use Case
//!
//! Best-effort page-view and unique-visitor accounting.

use crate::domain::value_objects::{AnalyticsDay, ClientIdentity, page_view_field};
use chrono::{DateTime, Utc};
use platform::store::CounterStore;
use std::sync::Arc;

/// Analytics recorder
pub struct AnalyticsRecorder<S>
where
    S: CounterStore,
{
    store: Arc<S>,
}

impl<S> Clone for AnalyticsRecorder<S>
where
    S: CounterStore,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S> AnalyticsRecorder<S>
where
    S: CounterStore + Sync,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Count a view of `path` and remember `client` as today's visitor
    ///
    /// Store errors are logged and dropped; the two writes are independent.
    pub async fn record(&self, path: &str, client: &ClientIdentity, timestamp: DateTime<Utc>) {
        let day = AnalyticsDay::of(timestamp);

        if let Err(e) = self
            .store
            .hincrby(&day.page_views_key(), &page_view_field(path), 1)
            .await
        {
            tracing::warn!(error = %e, path = %path, "Failed to record page view");
        }

        if let Err(e) = self
            .store
            .sadd(&day.visitors_key(), client.as_str())
            .await
        {
            tracing::warn!(error = %e, client_id = %client, "Failed to record visitor");
        }
    }

    /// Run [`Self::record`] on a detached task
    pub fn spawn_record(&self, path: String, client: ClientIdentity, timestamp: DateTime<Utc>)
    where
        S: Send + 'static,
    {
        let recorder = self.clone();
        tokio::spawn(async move {
            recorder.record(&path, &client, timestamp).await;
        });
    }
}
