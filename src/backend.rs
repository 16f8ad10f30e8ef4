//! Store handle with an explicit lifecycle: built once at startup from
//! [`Settings`](crate::config::Settings), handed to whoever needs it, and
//! shut down after the server stops.

use std::sync::Arc;

use tracing::info;

use crate::config::StoreSettings;
use crate::repo::{Repo, RepoResult};

#[cfg(feature = "inmem-store")]
use crate::repo::inmem::InMemRepo;
#[cfg(feature = "postgres-store")]
use crate::repo::pg::PgRepo;

#[derive(Clone)]
pub enum Backend {
    #[cfg(feature = "inmem-store")]
    Memory(InMemRepo),
    #[cfg(feature = "postgres-store")]
    Postgres(PgRepo),
}

impl Backend {
    pub async fn init(settings: &StoreSettings) -> anyhow::Result<Self> {
        match settings {
            #[cfg(feature = "inmem-store")]
            StoreSettings::Memory { data_dir } => {
                let repo = match data_dir {
                    Some(dir) => {
                        info!(dir = %dir.display(), "using in-memory store with snapshot");
                        InMemRepo::with_snapshot_dir(dir)
                    }
                    None => {
                        info!("using in-memory store");
                        InMemRepo::new()
                    }
                };
                Ok(Backend::Memory(repo))
            }
            #[cfg(feature = "postgres-store")]
            StoreSettings::Postgres { url, max_connections } => {
                let repo = PgRepo::connect_lazy(url, *max_connections)?;
                repo.migrate().await?;
                info!(max_connections, "using Postgres store");
                Ok(Backend::Postgres(repo))
            }
            #[allow(unreachable_patterns)]
            other => anyhow::bail!("store {other:?} is not compiled into this build"),
        }
    }

    pub fn repo(&self) -> Arc<dyn Repo> {
        match self {
            #[cfg(feature = "inmem-store")]
            Backend::Memory(r) => Arc::new(r.clone()),
            #[cfg(feature = "postgres-store")]
            Backend::Postgres(r) => Arc::new(r.clone()),
        }
    }

    /// Releases backend resources. Pending pool connections are closed.
    pub async fn shutdown(self) -> RepoResult<()> {
        match self {
            #[cfg(feature = "inmem-store")]
            Backend::Memory(_) => {}
            #[cfg(feature = "postgres-store")]
            Backend::Postgres(r) => r.close().await,
        }
        info!("store shut down");
        Ok(())
    }
}
