//! Image and VM disk client for the Nutanix Acropolis hypervisor API.
//!
//! Provides typed models and an asynchronous client for the `v0.8` image
//! and VM disk resources: name lookups, deletion, disk and CD-ROM cloning
//! onto VMs, image creation from vdisks or NFS exports, and a cancellable
//! readiness wait.

#![deny(missing_docs)]

pub mod client;
pub mod containers;
pub mod models;
pub mod nfs;
pub mod wait;

pub use client::{image_uuid_from_task, ImagesClient, ImagesClientBuilder};
pub use containers::{ContainerDirectory, RestContainerDirectory};
pub use models::{
    CreateImageRequest, DeviceBus, DiskAddress, Image, ImageImportSpec, ImageList, ImageSpec,
    ImageType, ListMetadata, Task, TaskEntity, TaskRef, VirtualDisk, VmDiskAttachRequest,
    VmDiskClone, VmDiskSpec, VmRef, IMAGE_STATE_ACTIVE,
};
pub use nfs::{nfs_uri_from_vdisk, NFS_VMDISK_PATH};
pub use wait::{Clock, ReadinessWait, SystemClock};

/// Convenient result alias using the shared Acropolis error type.
pub type Result<T> = ntnx_core::Result<T>;
