//! Client-side handles shared by every controller.

use photoshare_shared::Backend;

use crate::data_client::DataClient;
use crate::session::SessionProvider;
use crate::storage::StorageClient;

/// The three backend clients plus the session provider.
///
/// Controllers clone the clients they need; the provider stays here because
/// only the route guard and the auth forms drive it.
pub struct AppContext {
    pub backend: Backend,
    pub data: DataClient,
    pub storage: StorageClient,
    pub session: SessionProvider,
}

impl AppContext {
    pub fn new(backend: Backend) -> Self {
        Self {
            data: DataClient::new(&backend),
            storage: StorageClient::new(&backend),
            session: SessionProvider::new(&backend),
            backend,
        }
    }
}
