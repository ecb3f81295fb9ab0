use crate::domain::{
    errors::ViewStateError,
    models::{GraphTransform, NodePosition, ViewStateStore},
};
use std::collections::HashMap;

pub const GRAPH_TRANSFORM_KEY: &str = "networkGraphTransform";
pub const NODE_POSITIONS_KEY: &str = "networkGraphPositions";

pub async fn load_graph_transform<S>(store: &S) -> Result<Option<GraphTransform>, ViewStateError>
where
    S: ViewStateStore + Sync,
{
    match store.load(GRAPH_TRANSFORM_KEY).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub async fn save_graph_transform<S>(
    store: &S,
    transform: &GraphTransform,
) -> Result<(), ViewStateError>
where
    S: ViewStateStore + Sync,
{
    store
        .save(GRAPH_TRANSFORM_KEY, serde_json::to_string(transform)?)
        .await
}

/// Saved node positions by address. Nothing saved yet means no positions.
pub async fn load_node_positions<S>(
    store: &S,
) -> Result<HashMap<String, NodePosition>, ViewStateError>
where
    S: ViewStateStore + Sync,
{
    match store.load(NODE_POSITIONS_KEY).await? {
        Some(raw) => Ok(serde_json::from_str(&raw)?),
        None => Ok(HashMap::new()),
    }
}

pub async fn save_node_positions<S>(
    store: &S,
    positions: &HashMap<String, NodePosition>,
) -> Result<(), ViewStateError>
where
    S: ViewStateStore + Sync,
{
    store
        .save(NODE_POSITIONS_KEY, serde_json::to_string(positions)?)
        .await
}
