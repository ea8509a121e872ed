use serde::Deserialize;
use std::collections::HashMap;

use pacmir_constants::{MAX_ATTEMPTS, USER_AGENT};
use pacmir_error::{MirrorError, Result};

/// Package metadata as of a catalog's last refresh. Not persisted; the
/// catalog is re-fetched on every sync pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPackage {
    pub name: String,
    pub version: String,
    pub filename: String,
    pub repo: String,
    pub url: String,
    pub sha256sum: Option<String>,
}

/// Read-only view of one upstream repository's package metadata.
///
/// `refresh` is the only side-effecting operation; `lookup` is a pure read
/// against the last refresh, and an absent package is a valid outcome, not
/// an error.
pub trait Catalog: Send {
    fn name(&self) -> &str;
    fn refresh(&mut self, force: bool) -> Result<()>;
    fn lookup(&self, name: &str) -> Option<CatalogPackage>;
}

#[derive(Deserialize, Debug)]
struct PackageRecord {
    name: String,
    version: String,
    filename: String,
    #[serde(default)]
    sha256sum: Option<String>,
}

/// Catalog backed by an HTTP endpoint serving `<base>/<repo>.json`, a JSON
/// array of package records. Package files live next to the metadata, so
/// the download URL is the base joined with the record's filename.
pub struct RemoteCatalog {
    name: String,
    base_url: String,
    client: reqwest::blocking::Client,
    packages: Option<HashMap<String, CatalogPackage>>,
}

impl RemoteCatalog {
    #[must_use]
    pub fn new(name: &str, base_url: &str) -> Self {
        Self {
            name: name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::blocking::Client::builder()
                .timeout(std::time::Duration::from_secs(45))
                .connect_timeout(std::time::Duration::from_secs(20))
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_else(|_| reqwest::blocking::Client::new()),
            packages: None,
        }
    }

    fn metadata_url(&self) -> String {
        format!("{}/{}.json", self.base_url, self.name)
    }

    fn package_url(&self, filename: &str) -> String {
        format!("{}/{}", self.base_url, filename)
    }

    fn unavailable(&self, msg: String) -> MirrorError {
        MirrorError::CatalogUnavailable(self.name.clone(), msg)
    }

    fn fetch_records(&self) -> Result<Vec<PackageRecord>> {
        let url = self.metadata_url();
        let mut attempts = 0;

        loop {
            attempts += 1;

            let resp = match self.client.get(&url).send() {
                Ok(resp) => resp,
                Err(e) => {
                    if attempts < MAX_ATTEMPTS {
                        let delay = std::cmp::min(1000 * u64::from(attempts), 5000);
                        std::thread::sleep(std::time::Duration::from_millis(delay));
                        continue;
                    }
                    return Err(self.unavailable(format!(
                        "request failed after {attempts} attempts: {e}"
                    )));
                }
            };

            let resp = match resp.error_for_status() {
                Ok(resp) => resp,
                Err(e) => {
                    let retryable = matches!(
                        e.status(),
                        Some(reqwest::StatusCode::TOO_MANY_REQUESTS)
                            | Some(reqwest::StatusCode::INTERNAL_SERVER_ERROR)
                            | Some(reqwest::StatusCode::SERVICE_UNAVAILABLE)
                    );
                    if attempts < MAX_ATTEMPTS && retryable {
                        std::thread::sleep(std::time::Duration::from_millis(
                            1000 * u64::from(attempts),
                        ));
                        continue;
                    }
                    return Err(self.unavailable(format!("HTTP error: {e}")));
                }
            };

            let text = match resp.text() {
                Ok(text) => text,
                Err(e) => return Err(self.unavailable(format!("failed to read response: {e}"))),
            };

            return parse_records(&text)
                .map_err(|e| self.unavailable(format!("failed to parse metadata: {e}")));
        }
    }
}

fn parse_records(text: &str) -> serde_json::Result<Vec<PackageRecord>> {
    serde_json::from_str(text)
}

impl Catalog for RemoteCatalog {
    fn name(&self) -> &str {
        &self.name
    }

    fn refresh(&mut self, force: bool) -> Result<()> {
        if self.packages.is_some() && !force {
            return Ok(());
        }

        let records = self.fetch_records()?;
        let mut packages = HashMap::with_capacity(records.len());
        for record in records {
            let url = self.package_url(&record.filename);
            packages.insert(
                record.name.clone(),
                CatalogPackage {
                    name: record.name,
                    version: record.version,
                    filename: record.filename,
                    repo: self.name.clone(),
                    url,
                    sha256sum: record.sha256sum,
                },
            );
        }
        self.packages = Some(packages);
        Ok(())
    }

    fn lookup(&self, name: &str) -> Option<CatalogPackage> {
        self.packages.as_ref()?.get(name).cloned()
    }
}
