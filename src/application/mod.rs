pub mod app;
pub mod balances;
pub mod dataset;
pub mod ingestion;
pub mod ledger;
pub mod network;
pub mod timeline;
pub mod view_state;
