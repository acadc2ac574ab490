//! Asynchronous image client implementation.

use crate::containers::{ContainerDirectory, RestContainerDirectory};
use crate::models::{
    CreateImageRequest, DiskAddress, Image, ImageImportSpec, ImageList, ImageSpec, ImageType,
    Task, TaskRef, VirtualDisk, VmDiskAttachRequest, VmDiskClone, VmDiskSpec, VmRef,
};
use crate::nfs::nfs_uri_from_vdisk;
use crate::wait::{Clock, ReadinessWait, SystemClock};
use crate::Result;
use ntnx_core::client::{ClientConfig, ServiceClient, ServiceClientBuilder};
use ntnx_core::config::{NtnxClientConfig, ReadinessConfig};
use ntnx_core::types::ApiEndpoint;
use ntnx_core::uuid::{ImageUuid, VmDiskUuid};
use ntnx_core::Error;
use reqwest::StatusCode;
use serde::Serialize;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

const USER_AGENT: &str = concat!("ntnx-images/", env!("CARGO_PKG_VERSION"));

/// Builder for [`ImagesClient`].
pub struct ImagesClientBuilder {
    inner: ServiceClientBuilder,
    request_timeout: Duration,
    host: String,
    readiness: ReadinessConfig,
    containers: Option<Arc<dyn ContainerDirectory>>,
    clock: Arc<dyn Clock>,
}

impl ImagesClientBuilder {
    /// Create a builder from a connection configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] when any setting, the readiness
    /// interval and deadline included, is out of bounds.
    pub fn new(config: &NtnxClientConfig) -> Result<Self> {
        let inner = ServiceClientBuilder::from_config(config)?.with_user_agent(USER_AGENT);

        Ok(Self {
            inner,
            request_timeout: config.timeout(),
            host: config.host()?,
            readiness: config.readiness,
            containers: None,
            clock: Arc::new(SystemClock),
        })
    }

    /// Override the HTTP client configuration.
    ///
    /// The request timeout stays the one of the [`NtnxClientConfig`].
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        let config = config.with_timeout(self.request_timeout);
        self.inner = self.inner.with_http_config(config);
        self
    }

    /// Override the container resolver (defaults to the Prism REST API).
    #[must_use]
    pub fn with_container_directory(mut self, containers: Arc<dyn ContainerDirectory>) -> Self {
        self.containers = Some(containers);
        self
    }

    /// Override the clock used by the readiness wait.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<ImagesClient> {
        let inner = self.inner.build()?;
        let containers = self
            .containers
            .unwrap_or_else(|| Arc::new(RestContainerDirectory::new(inner.clone())));

        Ok(ImagesClient {
            inner,
            host: self.host,
            wait: ReadinessWait::new(self.readiness),
            containers,
            clock: self.clock,
        })
    }
}

/// Asynchronous client for Acropolis images and VM disks.
///
/// Every read goes to the server; nothing is cached between calls.
#[derive(Clone)]
pub struct ImagesClient {
    inner: ServiceClient,
    host: String,
    wait: ReadinessWait,
    containers: Arc<dyn ContainerDirectory>,
    clock: Arc<dyn Clock>,
}

impl ImagesClient {
    /// Construct a client with default collaborators.
    pub fn new(config: &NtnxClientConfig) -> Result<Self> {
        ImagesClientBuilder::new(config)?.build()
    }

    /// Return the Prism root URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        self.inner.base_url()
    }

    /// Fetch the full image collection.
    pub async fn list_images(&self) -> Result<ImageList> {
        let response = self.inner.get(ApiEndpoint::Ahv, "images").await?;
        if !response.is_ok() {
            return Err(map_status_to_error(response.status(), response.text()));
        }
        response.json()
    }

    /// All images with exactly this name.
    pub async fn list_images_by_name(&self, name: &str) -> Result<Vec<Image>> {
        let list = self.list_images().await?;
        Ok(list.matching(name).into_iter().cloned().collect())
    }

    /// Look an image up by name without failing on absence.
    ///
    /// Returns the collection entry, which carries the image id and its
    /// backing disk id, or `None` when no image has this name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] when several images share the name.
    pub async fn find_image(&self, name: &str) -> Result<Option<Image>> {
        let list = self.list_images().await?;
        Ok(list.find_unique(name)?.cloned())
    }

    /// Backing virtual disk of the image with this name.
    pub async fn get_image_vm_disk_id_by_name(&self, name: &str) -> Result<VmDiskUuid> {
        let image = self.require_image(name).await?;
        image.require_vm_disk_id().cloned()
    }

    /// Full record of the image with this name.
    pub async fn get_image_by_name(&self, name: &str) -> Result<Image> {
        let summary = self.require_image(name).await?;
        self.get_image(&summary.uuid).await
    }

    /// Fetch a single image by id.
    pub async fn get_image(&self, uuid: &ImageUuid) -> Result<Image> {
        let path = format!("images/{uuid}");
        let response = self.inner.get(ApiEndpoint::Ahv, &path).await?;
        if response.status() == StatusCode::NOT_FOUND {
            warn!(%uuid, "Image ID not found");
            return Err(Error::NotFound(format!("Image ID {uuid}")));
        }
        if !response.is_ok() {
            return Err(map_status_to_error(response.status(), response.text()));
        }

        let image: Image = response.json()?;
        if image.uuid != *uuid {
            warn!(%uuid, returned = %image.uuid, "Image ID not found");
            return Err(Error::NotFound(format!("Image ID {uuid}")));
        }
        Ok(image)
    }

    /// Lifecycle state of an image (e.g. `ACTIVE`).
    pub async fn get_image_state(&self, uuid: &ImageUuid) -> Result<String> {
        let image = self.get_image(uuid).await?;
        Ok(image.image_state.unwrap_or_default())
    }

    /// Delete the image with this name.
    pub async fn delete_image_by_name(&self, name: &str) -> Result<TaskRef> {
        let image = self.get_image_by_name(name).await?;
        let path = format!("images/{}", image.uuid);

        let response = self.inner.delete(ApiEndpoint::Ahv, &path).await?;
        if response.is_ok() {
            return response.json();
        }

        let message = format!("Image {name} could not be deleted");
        warn!(status = response.status().as_u16(), "{message}");
        Err(Error::request_failed(
            response.status().as_u16(),
            format!("{message}: {}", response.text()),
        ))
    }

    /// Attach a CD-ROM cloned from the image's disk.
    pub async fn clone_cdrom_for_vm(&self, vm: &VmRef, image: &Image) -> Result<TaskRef> {
        let disk = VmDiskSpec {
            vm_disk_clone: Some(VmDiskClone::of(image.require_vm_disk_id()?.clone())),
            is_cdrom: Some(true),
            ..VmDiskSpec::default()
        };
        self.attach_disk(vm, disk, || {
            format!("CD ISO Image {} could not be cloned for VM {}", image.name, vm.name)
        })
        .await
    }

    /// Attach a disk cloned from the image's disk.
    pub async fn clone_disk_for_vm(&self, vm: &VmRef, image: &Image) -> Result<TaskRef> {
        let disk = VmDiskSpec {
            vm_disk_clone: Some(VmDiskClone::of(image.require_vm_disk_id()?.clone())),
            ..VmDiskSpec::default()
        };
        self.attach_disk(vm, disk, || clone_failure(image, vm)).await
    }

    /// Attach a CD-ROM cloned from the image's disk at the given address.
    pub async fn clone_cdrom_for_vm_at(
        &self,
        vm: &VmRef,
        image: &Image,
        address: DiskAddress,
    ) -> Result<TaskRef> {
        let disk = VmDiskSpec {
            vm_disk_clone: Some(VmDiskClone::of(image.require_vm_disk_id()?.clone())),
            disk_address: Some(address),
            is_cdrom: Some(true),
            ..VmDiskSpec::default()
        };
        self.attach_disk(vm, disk, || clone_failure(image, vm)).await
    }

    /// Attach a disk cloned from the image's disk at the given address.
    pub async fn clone_disk_for_vm_at(
        &self,
        vm: &VmRef,
        image: &Image,
        address: DiskAddress,
    ) -> Result<TaskRef> {
        let disk = VmDiskSpec {
            vm_disk_clone: Some(VmDiskClone::of(image.require_vm_disk_id()?.clone())),
            disk_address: Some(address),
            ..VmDiskSpec::default()
        };
        self.attach_disk(vm, disk, || clone_failure(image, vm)).await
    }

    /// Attach a disk cloned from the image's disk, grown to at least `minimum_size_mb`.
    pub async fn clone_disk_for_vm_with_minimum_size(
        &self,
        vm: &VmRef,
        image: &Image,
        minimum_size_mb: u64,
    ) -> Result<TaskRef> {
        let clone = VmDiskClone {
            minimum_size_mb: Some(minimum_size_mb),
            ..VmDiskClone::of(image.require_vm_disk_id()?.clone())
        };
        let disk = VmDiskSpec {
            vm_disk_clone: Some(clone),
            ..VmDiskSpec::default()
        };
        self.attach_disk(vm, disk, || clone_failure(image, vm)).await
    }

    /// Attach an empty CD-ROM drive at the given address.
    pub async fn create_cdrom_for_vm(&self, vm: &VmRef, address: DiskAddress) -> Result<TaskRef> {
        let disk = VmDiskSpec {
            disk_address: Some(address),
            is_cdrom: Some(true),
            is_empty: Some(true),
            ..VmDiskSpec::default()
        };
        self.attach_disk(vm, disk, || format!("CD could not be created for VM {}", vm.name))
            .await
    }

    /// Import a disk image from the NFS export of an existing vdisk.
    ///
    /// The export lives in the source disk's container; the new image is
    /// stored in `container_name`.
    pub async fn create_image_from_url(
        &self,
        vdisk: &VirtualDisk,
        spec: &ImageSpec,
        container_name: &str,
    ) -> Result<TaskRef> {
        let source_container = self
            .containers
            .container_name_by_id(vdisk.container_id)
            .await?;
        let container_uuid = self
            .containers
            .container_uuid_by_name(container_name)
            .await?;
        let url = nfs_uri_from_vdisk(&self.host, &source_container, vdisk.vdisk_uuid.as_str())?;

        let request = CreateImageRequest {
            image_type: ImageType::DiskImage,
            image_import_spec: Some(ImageImportSpec {
                container_uuid: container_uuid.clone(),
                url: url.clone(),
            }),
            ..CreateImageRequest::from_spec(spec)
        };

        self.create_image(&request, || {
            format!(
                "Image {} could not be created on container ID {container_uuid} from {url}",
                spec.name
            )
        })
        .await
    }

    /// Create a disk image by cloning an existing vdisk.
    pub async fn create_image_from_vdisk(
        &self,
        vdisk: &VirtualDisk,
        spec: &ImageSpec,
    ) -> Result<TaskRef> {
        let request = CreateImageRequest {
            image_type: ImageType::DiskImage,
            vm_disk_clone: Some(VmDiskClone::of(vdisk.vdisk_uuid.clone())),
            ..CreateImageRequest::from_spec(spec)
        };

        self.create_image(&request, || {
            format!(
                "Image {} could not be created from vdisk ID {}",
                spec.name, vdisk.vdisk_uuid
            )
        })
        .await
    }

    /// Create an image object with only a name, annotation and type.
    pub async fn create_image_object(&self, spec: &ImageSpec) -> Result<TaskRef> {
        let request = CreateImageRequest::from_spec(spec);
        self.create_image(&request, || format!("Image {} could not be created", spec.name))
            .await
    }

    /// Wait until the image reports `ACTIVE`.
    ///
    /// Polls at the configured interval until the configured deadline
    /// (30 seconds by default).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] at the deadline and [`Error::Cancelled`]
    /// when `cancel` fires.
    pub async fn wait_until_active(
        &self,
        uuid: &ImageUuid,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.wait
            .run(self.clock.as_ref(), cancel, uuid.as_str(), || {
                self.get_image_state(uuid)
            })
            .await
    }

    async fn require_image(&self, name: &str) -> Result<Image> {
        self.find_image(name).await?.ok_or_else(|| {
            warn!(name, "Image not found");
            Error::NotFound(format!("Image {name}"))
        })
    }

    async fn attach_disk<F>(&self, vm: &VmRef, disk: VmDiskSpec, failure: F) -> Result<TaskRef>
    where
        F: FnOnce() -> String,
    {
        let path = format!("vms/{}/disks/", vm.uuid);
        self.submit(&path, &VmDiskAttachRequest::single(disk), failure)
            .await
    }

    async fn create_image<F>(&self, request: &CreateImageRequest, failure: F) -> Result<TaskRef>
    where
        F: FnOnce() -> String,
    {
        self.submit("images", request, failure).await
    }

    async fn submit<B, F>(&self, path: &str, body: &B, failure: F) -> Result<TaskRef>
    where
        B: Serialize + Debug + ?Sized,
        F: FnOnce() -> String,
    {
        debug!(path, ?body, "Post body");

        let response = self.inner.post(ApiEndpoint::Ahv, path, body).await?;
        if response.is_ok() {
            return response.json();
        }

        let message = failure();
        warn!(status = response.status().as_u16(), "{message}");
        Err(Error::request_failed(
            response.status().as_u16(),
            format!("{message}: {}", response.text()),
        ))
    }
}

/// Image id created by a finished image task.
///
/// # Errors
///
/// Returns [`Error::InvalidResponse`] when the task lists no entities.
pub fn image_uuid_from_task(task: &Task) -> Result<ImageUuid> {
    task.image_uuid()
}

fn clone_failure(image: &Image, vm: &VmRef) -> String {
    format!("Image {} could not be cloned for VM {}", image.name, vm.name)
}

/// Map an unexpected status of a read request to an error.
pub(crate) fn map_status_to_error(status: StatusCode, text: String) -> Error {
    match status {
        StatusCode::NOT_FOUND => Error::NotFound(text),
        StatusCode::BAD_REQUEST => Error::InvalidRequest(text),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::InvalidRequest(format!("Prism authentication failed: {text}"))
        }
        StatusCode::CONFLICT => Error::Conflict(text),
        StatusCode::TOO_MANY_REQUESTS
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => {
            Error::ServiceUnavailable(format!("Prism temporarily unavailable: {text}"))
        }
        status if status.is_server_error() => {
            Error::ServiceUnavailable(format!("Prism server error {status}: {text}"))
        }
        _ => Error::request_failed(status.as_u16(), text),
    }
}
