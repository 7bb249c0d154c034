//! Query Analytics Use Case

use crate::domain::value_objects::AnalyticsDay;
use crate::error::{GatekeeperError, GatekeeperResult};
use platform::store::CounterStore;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Output DTO for the analytics query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsSnapshot {
    pub date: String,
    pub page_views: BTreeMap<String, i64>,
    pub unique_visitors: u64,
}

/// Query Analytics Use Case
pub struct QueryAnalyticsUseCase<S>
where
    S: CounterStore,
{
    store: Arc<S>,
}

impl<S> QueryAnalyticsUseCase<S>
where
    S: CounterStore + Sync,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn execute(&self) -> GatekeeperResult<AnalyticsSnapshot> {
        self.execute_for(AnalyticsDay::today()).await
    }

    pub async fn execute_for(&self, day: AnalyticsDay) -> GatekeeperResult<AnalyticsSnapshot> {
        let page_views_key = day.page_views_key();
        let visitors_key = day.visitors_key();

        let (page_views, unique_visitors) = tokio::join!(
            self.store.hgetall(&page_views_key),
            self.store.scard(&visitors_key),
        );

        Ok(AnalyticsSnapshot {
            date: day.date_string(),
            page_views: page_views.map_err(GatekeeperError::AnalyticsUnavailable)?,
            unique_visitors: unique_visitors.map_err(GatekeeperError::AnalyticsUnavailable)?,
        })
    }
}
