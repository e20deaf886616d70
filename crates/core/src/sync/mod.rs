//! Transaction synchronization engine: window planning, paginated fetch with
//! retry, dedup ingestion, connection health and the periodic sweep.

mod in_flight;
mod page_fetcher;
mod retry_policy;
mod sync_model;
mod sync_scheduler;
mod sync_service;
mod transaction_converter;

pub use in_flight::*;
pub use page_fetcher::*;
pub use retry_policy::*;
pub use sync_model::*;
pub use sync_scheduler::*;
pub use sync_service::*;
pub use transaction_converter::*;
