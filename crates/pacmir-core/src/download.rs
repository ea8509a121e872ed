use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;

use pacmir_catalog::CatalogPackage;
use pacmir_constants::{MAX_PARALLEL_DOWNLOADS, USER_AGENT};
use pacmir_error::{MirrorError, Result};

/// Seam between the transaction and the network: fetch the artifact bytes
/// for every package in the batch, or fail the whole batch.
pub trait PackageFetcher {
    fn fetch_all(
        &self,
        packages: &[CatalogPackage],
        debug: bool,
    ) -> Result<Vec<(CatalogPackage, Vec<u8>)>>;
}

pub struct DownloadClient {
    client: reqwest::Client,
    semaphore: Arc<Semaphore>,
}

impl DownloadClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .pool_max_idle_per_host(MAX_PARALLEL_DOWNLOADS)
                .timeout(std::time::Duration::from_secs(300))
                .connect_timeout(std::time::Duration::from_secs(20))
                .tcp_keepalive(Some(std::time::Duration::from_secs(60)))
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            semaphore: Arc::new(Semaphore::new(MAX_PARALLEL_DOWNLOADS)),
        }
    }

    async fn fetch_one(&self, pkg: &CatalogPackage, debug: bool) -> Result<Vec<u8>> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| MirrorError::NetworkError(e.to_string()))?;

        if !debug {
            pacmir_logger::status(&format!("◦ Downloading {}-{}...", pkg.name, pkg.version));
        }

        let resp = self
            .client
            .get(&pkg.url)
            .send()
            .await
            .map_err(|e| MirrorError::NetworkError(format!("{}: {e}", pkg.url)))?;

        if !resp.status().is_success() {
            return Err(MirrorError::NetworkError(format!(
                "HTTP {} for {}",
                resp.status(),
                pkg.url
            )));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| MirrorError::NetworkError(format!("{}: {e}", pkg.url)))?;

        pacmir_logger::debug(
            &format!(
                "Downloaded {}-{} ({} bytes)",
                pkg.name,
                pkg.version,
                bytes.len()
            ),
            debug,
        );
        Ok(bytes.to_vec())
    }

    async fn fetch_batch(
        &self,
        packages: &[CatalogPackage],
        debug: bool,
    ) -> Result<Vec<(CatalogPackage, Vec<u8>)>> {
        let tasks: Vec<_> = packages
            .iter()
            .map(|pkg| async move {
                let bytes = self.fetch_one(pkg, debug).await?;
                Ok::<_, MirrorError>((pkg.clone(), bytes))
            })
            .collect();

        let mut fetched = Vec::with_capacity(packages.len());
        for result in join_all(tasks).await {
            fetched.push(result?);
        }
        Ok(fetched)
    }
}

impl PackageFetcher for DownloadClient {
    fn fetch_all(
        &self,
        packages: &[CatalogPackage],
        debug: bool,
    ) -> Result<Vec<(CatalogPackage, Vec<u8>)>> {
        if packages.is_empty() {
            return Ok(Vec::new());
        }

        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(MirrorError::NetworkError(
                "fetch_all called from async context".to_string(),
            ));
        }

        let rt = tokio::runtime::Runtime::new().map_err(|e| {
            MirrorError::NetworkError(format!("Failed to create async runtime: {e}"))
        })?;

        rt.block_on(self.fetch_batch(packages, debug))
    }
}

impl Default for DownloadClient {
    fn default() -> Self {
        Self::new()
    }
}
