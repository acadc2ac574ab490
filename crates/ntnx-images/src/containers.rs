//! Storage container resolution.
//!
//! Importing an image from a vdisk export needs the name of the container
//! holding the source disk and the UUID of the destination container.

use async_trait::async_trait;
use ntnx_core::client::ServiceClient;
use ntnx_core::types::ApiEndpoint;
use ntnx_core::uuid::ContainerUuid;
use ntnx_core::{Error, Result};
use serde::Deserialize;
use tracing::warn;

use crate::client::map_status_to_error;

/// Resolves storage containers by id or name.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContainerDirectory: Send + Sync {
    /// Name of the container with the given numeric id.
    async fn container_name_by_id(&self, container_id: i64) -> Result<String>;

    /// UUID of the container with the given name.
    async fn container_uuid_by_name(&self, name: &str) -> Result<ContainerUuid>;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Container {
    #[serde(default)]
    id: String,
    #[serde(default)]
    container_uuid: ContainerUuid,
    #[serde(default)]
    name: String,
}

impl Container {
    /// REST v1 ids look like `<cluster-uuid>::<n>`; older releases return `<n>`.
    fn has_numeric_id(&self, container_id: i64) -> bool {
        self.id
            .rsplit("::")
            .next()
            .and_then(|tail| tail.parse::<i64>().ok())
            == Some(container_id)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ContainerList {
    #[serde(default)]
    entities: Vec<Container>,
}

/// [`ContainerDirectory`] backed by the Prism Gateway REST API.
#[derive(Clone)]
pub struct RestContainerDirectory {
    inner: ServiceClient,
}

impl RestContainerDirectory {
    /// Create a directory sharing an existing transport.
    #[must_use]
    pub fn new(inner: ServiceClient) -> Self {
        Self { inner }
    }

    async fn list(&self) -> Result<Vec<Container>> {
        let response = self.inner.get(ApiEndpoint::Rest, "containers/").await?;
        if !response.is_ok() {
            return Err(map_status_to_error(response.status(), response.text()));
        }
        Ok(response.json::<ContainerList>()?.entities)
    }
}

#[async_trait]
impl ContainerDirectory for RestContainerDirectory {
    async fn container_name_by_id(&self, container_id: i64) -> Result<String> {
        self.list()
            .await?
            .into_iter()
            .find(|container| container.has_numeric_id(container_id))
            .map(|container| container.name)
            .ok_or_else(|| {
                warn!(container_id, "Container not found");
                Error::NotFound(format!("Container ID {container_id}"))
            })
    }

    async fn container_uuid_by_name(&self, name: &str) -> Result<ContainerUuid> {
        self.list()
            .await?
            .into_iter()
            .find(|container| container.name == name)
            .map(|container| container.container_uuid)
            .ok_or_else(|| {
                warn!(name, "Container not found");
                Error::NotFound(format!("Container {name}"))
            })
    }
}
