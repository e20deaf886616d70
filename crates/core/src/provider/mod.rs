//! Contract for the remote account-aggregation provider.

mod provider_errors;
mod provider_model;
mod provider_traits;

pub use provider_errors::*;
pub use provider_model::*;
pub use provider_traits::*;
