use async_trait::async_trait;

use super::{Connection, ConnectionStatus};
use crate::errors::Result;

/// Persistence contract for connections.
///
/// Status writes are last-writer-wins; callers serialize syncs per connection id.
#[async_trait]
pub trait ConnectionRepositoryTrait: Send + Sync {
    fn find_by_id(&self, connection_id: &str) -> Result<Option<Connection>>;

    /// Connections owned by a user, newest first.
    fn find_by_user_id(&self, user_id: &str) -> Result<Vec<Connection>>;

    fn find_by_status(&self, status: ConnectionStatus) -> Result<Vec<Connection>>;

    fn find_active_connections(&self) -> Result<Vec<Connection>> {
        self.find_by_status(ConnectionStatus::Active)
    }

    async fn create(&self, connection: Connection) -> Result<Connection>;

    /// Persists status and sync fields, stamping `updated_at`.
    async fn update(&self, connection: Connection) -> Result<Connection>;

    async fn delete(&self, connection_id: &str) -> Result<usize>;
}
