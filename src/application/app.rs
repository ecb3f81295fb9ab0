use std::collections::HashMap;
use std::sync::Arc;

use super::dataset::Dataset;
use super::{ledger, timeline, view_state};
use crate::domain::errors::ViewStateError;
use crate::domain::models::{
    AddressLedger, CirculatingStats, GraphTransform, NetworkData, NodePosition, Snapshot,
    TimeSeries, Transaction, ViewStateStore,
};
use crate::infrastructure::memory::InMemoryViewStore;

#[async_trait::async_trait]
pub trait Application {
    async fn network(&self) -> NetworkData;
    async fn transactions(&self) -> Vec<Transaction>;
    async fn time_series(&self) -> TimeSeries;
    async fn day_boundaries(&self) -> Vec<i64>;
    async fn day_index_at_time(&self, t: i64) -> usize;
    async fn transactions_for_day(&self, index: usize) -> Vec<Transaction>;
    async fn balances_for_day(&self, index: usize) -> Option<Snapshot>;
    async fn nearest_day(&self, date: Option<String>) -> i64;
    async fn address_ledger(&self) -> AddressLedger;
    async fn circulating_at(&self, t: i64) -> CirculatingStats;
    async fn graph_transform(&self) -> Result<GraphTransform, ViewStateError>;
    async fn save_graph_transform(&self, transform: GraphTransform)
        -> Result<(), ViewStateError>;
    async fn node_positions(&self) -> Result<HashMap<String, NodePosition>, ViewStateError>;
    async fn save_node_positions(
        &self,
        positions: HashMap<String, NodePosition>,
    ) -> Result<(), ViewStateError>;
}

#[derive(Clone)]
pub struct App<S> {
    dataset: Arc<Dataset>,
    view_state: Arc<S>,
}

impl App<InMemoryViewStore> {
    pub fn new(dataset: Dataset) -> Self {
        Self::with_store(dataset, InMemoryViewStore::default())
    }
}

impl<S> App<S> {
    pub fn with_store(dataset: Dataset, view_state: S) -> Self {
        Self {
            dataset: Arc::new(dataset),
            view_state: Arc::new(view_state),
        }
    }
}

#[async_trait::async_trait]
impl<S> Application for App<S>
where
    S: ViewStateStore + Send + Sync + 'static,
{
    async fn network(&self) -> NetworkData {
        tracing::info!("Getting network ...");
        self.dataset.network.clone()
    }

    async fn transactions(&self) -> Vec<Transaction> {
        tracing::info!("Getting all transactions ...");
        self.dataset.transactions.clone()
    }

    async fn time_series(&self) -> TimeSeries {
        tracing::info!("Getting time series ...");
        self.dataset.time_series.clone()
    }

    async fn day_boundaries(&self) -> Vec<i64> {
        self.dataset.boundaries.clone()
    }

    async fn day_index_at_time(&self, t: i64) -> usize {
        timeline::day_index_at_time(&self.dataset.boundaries, t)
    }

    async fn transactions_for_day(&self, index: usize) -> Vec<Transaction> {
        tracing::info!("Getting transactions for day {}", index);
        timeline::transactions_for_day(
            &self.dataset.boundaries,
            index,
            &self.dataset.transactions,
            self.dataset.config.day_millis,
        )
        .to_vec()
    }

    async fn balances_for_day(&self, index: usize) -> Option<Snapshot> {
        timeline::balances_for_day(&self.dataset.time_series, index).cloned()
    }

    async fn nearest_day(&self, date: Option<String>) -> i64 {
        tracing::info!("Resolving day for {:?}", date);
        timeline::nearest_day_from_date(date.as_deref(), &self.dataset.boundaries)
    }

    async fn address_ledger(&self) -> AddressLedger {
        tracing::info!("Getting address ledger ...");
        ledger::address_ledger(
            &self.dataset.network.nodes,
            &self.dataset.transactions,
            &self.dataset.config,
        )
    }

    async fn circulating_at(&self, t: i64) -> CirculatingStats {
        let dataset = &self.dataset;
        CirculatingStats {
            timestamp: t,
            day_index: timeline::day_index_at_time(&dataset.boundaries, t),
            distributed: ledger::distributed_at(&dataset.time_series, t, &dataset.config),
            active_addresses: dataset.network.nodes.len(),
            total_transactions: dataset.transactions.len(),
        }
    }

    async fn graph_transform(&self) -> Result<GraphTransform, ViewStateError> {
        view_state::load_graph_transform(self.view_state.as_ref())
            .await?
            .ok_or_else(|| {
                ViewStateError::KeyNotFound(view_state::GRAPH_TRANSFORM_KEY.to_string())
            })
    }

    async fn save_graph_transform(
        &self,
        transform: GraphTransform,
    ) -> Result<(), ViewStateError> {
        tracing::info!("Saving graph transform {:?}", transform);
        view_state::save_graph_transform(self.view_state.as_ref(), &transform).await
    }

    async fn node_positions(&self) -> Result<HashMap<String, NodePosition>, ViewStateError> {
        view_state::load_node_positions(self.view_state.as_ref()).await
    }

    async fn save_node_positions(
        &self,
        positions: HashMap<String, NodePosition>,
    ) -> Result<(), ViewStateError> {
        tracing::info!("Saving {} node positions", positions.len());
        view_state::save_node_positions(self.view_state.as_ref(), &positions).await
    }
}
