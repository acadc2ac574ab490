//! Wire models for the Acropolis image and VM disk resources.
//!
//! Field names follow the camelCase JSON of the `v0.8` API exactly. Request
//! bodies are serialized from these types; nothing is assembled by string
//! concatenation, so names and annotations may contain any character.

use chrono::{DateTime, Utc};
use ntnx_core::uuid::{ContainerUuid, ImageUuid, TaskUuid, VmDiskUuid, VmUuid};
use ntnx_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state reported by an image that is ready for use.
pub const IMAGE_STATE_ACTIVE: &str = "ACTIVE";

/// Kind of image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImageType {
    /// Bootable or data disk image.
    DiskImage,
    /// CD-ROM (ISO) image.
    IsoImage,
    /// Any type this client does not know about.
    #[serde(other)]
    Unknown,
}

impl ImageType {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DiskImage => "DISK_IMAGE",
            Self::IsoImage => "ISO_IMAGE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl Default for ImageType {
    fn default() -> Self {
        Self::DiskImage
    }
}

/// An image as returned by the `images` collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    /// Image identifier.
    #[serde(default)]
    pub uuid: ImageUuid,
    /// Display name (not unique).
    #[serde(default)]
    pub name: String,
    /// Free-text annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    /// Deletion marker.
    #[serde(default)]
    pub deleted: bool,
    /// Numeric id of the owning container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<i64>,
    /// UUID of the owning container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_uuid: Option<ContainerUuid>,
    /// Logical timestamp used by the server for optimistic concurrency.
    #[serde(default)]
    pub logical_timestamp: i64,
    /// Image type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_type: Option<ImageType>,
    /// Backing virtual disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_disk_id: Option<VmDiskUuid>,
    /// Lifecycle state (e.g. `ACTIVE`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_state: Option<String>,
    /// Creation time in microseconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time_in_usecs: Option<i64>,
    /// Last update time in microseconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_time_in_usecs: Option<i64>,
}

impl Image {
    /// True when the image reports the `ACTIVE` lifecycle state.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.image_state.as_deref() == Some(IMAGE_STATE_ACTIVE)
    }

    /// Creation time.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_time_in_usecs
            .and_then(DateTime::<Utc>::from_timestamp_micros)
    }

    /// Last update time.
    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_time_in_usecs
            .and_then(DateTime::<Utc>::from_timestamp_micros)
    }

    /// Backing virtual disk, or an error naming the image when it has none.
    pub fn require_vm_disk_id(&self) -> Result<&VmDiskUuid> {
        self.vm_disk_id
            .as_ref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                Error::InvalidRequest(format!("Image {} has no backing vm disk", self.name))
            })
    }
}

/// Pagination metadata of a collection page.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ListMetadata {
    /// Number of entities across all pages.
    #[serde(default)]
    pub grand_total_entities: u64,
    /// Number of entities matching the request.
    #[serde(default)]
    pub total_entities: u64,
}

/// One page of the `images` collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImageList {
    /// Image summaries.
    #[serde(default)]
    pub entities: Vec<Image>,
    /// Pagination metadata.
    #[serde(default)]
    pub metadata: ListMetadata,
}

impl ImageList {
    /// All images whose name matches exactly (case-sensitive).
    #[must_use]
    pub fn matching(&self, name: &str) -> Vec<&Image> {
        self.entities.iter().filter(|im| im.name == name).collect()
    }

    /// The single image with the given name.
    ///
    /// Returns `Ok(None)` when no image matches and [`Error::Conflict`] when
    /// more than one does, since names are not unique.
    pub fn find_unique(&self, name: &str) -> Result<Option<&Image>> {
        match self.matching(name).as_slice() {
            [] => Ok(None),
            [image] => Ok(Some(*image)),
            many => Err(Error::Conflict(format!(
                "Image name {name} matches {} images",
                many.len()
            ))),
        }
    }
}

/// Handle returned by asynchronous server-side operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskRef {
    /// Task identifier.
    pub task_uuid: TaskUuid,
}

/// Entity touched by a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskEntity {
    /// Entity identifier.
    pub uuid: String,
    /// Entity type (e.g. `Image`, `VM`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    /// Entity name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,
}

/// Task completion payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Task identifier.
    pub uuid: TaskUuid,
    /// Entities the task operated on.
    #[serde(default)]
    pub entity_list: Vec<TaskEntity>,
    /// Operation name (e.g. `kImageCreate`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_type: Option<String>,
    /// Progress status (`Queued`, `Running`, `Succeeded`, `Failed`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_status: Option<String>,
    /// Completion percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage_complete: Option<u8>,
}

impl Task {
    /// Identifier of the first entity of the task, read as an image id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidResponse`] when the task lists no entities.
    pub fn image_uuid(&self) -> Result<ImageUuid> {
        self.entity_list
            .first()
            .map(|entity| ImageUuid::new(entity.uuid.clone()))
            .ok_or_else(|| {
                Error::InvalidResponse(format!("Task {} has no associated entities", self.uuid))
            })
    }
}

/// VM a disk is attached to. Resolved by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmRef {
    /// VM identifier.
    pub uuid: VmUuid,
    /// VM name, used in diagnostics.
    pub name: String,
}

impl VmRef {
    /// Create a VM reference.
    #[must_use]
    pub fn new(uuid: VmUuid, name: impl Into<String>) -> Self {
        Self {
            uuid,
            name: name.into(),
        }
    }
}

/// Source virtual disk of an image. Resolved by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualDisk {
    /// Virtual disk identifier.
    pub vdisk_uuid: VmDiskUuid,
    /// Numeric id of the container holding the disk.
    pub container_id: i64,
}

/// Name, annotation and type of an image to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSpec {
    /// Image name.
    pub name: String,
    /// Annotation.
    pub annotation: String,
    /// Image type.
    pub image_type: ImageType,
}

impl ImageSpec {
    /// Create a disk image spec with an empty annotation.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: String::new(),
            image_type: ImageType::DiskImage,
        }
    }

    /// Set the annotation.
    #[must_use]
    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = annotation.into();
        self
    }

    /// Set the image type.
    #[must_use]
    pub const fn with_image_type(mut self, image_type: ImageType) -> Self {
        self.image_type = image_type;
        self
    }
}

/// Bus a VM disk is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceBus {
    /// IDE bus.
    Ide,
    /// SCSI bus.
    Scsi,
    /// SATA bus.
    Sata,
    /// PCI bus.
    Pci,
}

impl DeviceBus {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ide => "ide",
            Self::Scsi => "scsi",
            Self::Sata => "sata",
            Self::Pci => "pci",
        }
    }
}

impl fmt::Display for DeviceBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceBus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ide" => Ok(Self::Ide),
            "scsi" => Ok(Self::Scsi),
            "sata" => Ok(Self::Sata),
            "pci" => Ok(Self::Pci),
            other => Err(Error::InvalidRequest(format!("Unknown device bus `{other}`"))),
        }
    }
}

/// Location of a disk on a VM.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DiskAddress {
    /// Bus.
    pub device_bus: DeviceBus,
    /// Slot index on the bus; the server picks one when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_index: Option<u32>,
}

impl DiskAddress {
    /// Address on a bus without an explicit index.
    #[must_use]
    pub const fn bus(device_bus: DeviceBus) -> Self {
        Self {
            device_bus,
            device_index: None,
        }
    }

    /// Set the device index.
    #[must_use]
    pub const fn with_index(mut self, index: u32) -> Self {
        self.device_index = Some(index);
        self
    }
}

/// Clone source of a new disk or image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VmDiskClone {
    /// Source virtual disk.
    pub vm_disk_uuid: VmDiskUuid,
    /// Minimum size of the clone in MiB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_size_mb: Option<u64>,
}

impl VmDiskClone {
    /// Clone of the given disk at its own size.
    #[must_use]
    pub fn of(vm_disk_uuid: VmDiskUuid) -> Self {
        Self {
            vm_disk_uuid,
            minimum_size_mb: None,
        }
    }
}

/// One disk in a VM disk attach request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VmDiskSpec {
    /// Clone source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_disk_clone: Option<VmDiskClone>,
    /// Placement on the VM.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_address: Option<DiskAddress>,
    /// Attach as CD-ROM.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_cdrom: Option<bool>,
    /// Attach without media.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_empty: Option<bool>,
}

/// Body of `POST vms/{uuid}/disks/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VmDiskAttachRequest {
    /// Disks to attach.
    pub disks: Vec<VmDiskSpec>,
}

impl VmDiskAttachRequest {
    /// Request attaching a single disk.
    #[must_use]
    pub fn single(disk: VmDiskSpec) -> Self {
        Self { disks: vec![disk] }
    }
}

/// Import source of a new image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImageImportSpec {
    /// Destination container.
    pub container_uuid: ContainerUuid,
    /// Source URL (e.g. an NFS export of a vdisk).
    pub url: String,
}

/// Body of `POST images`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateImageRequest {
    /// Image name.
    pub name: String,
    /// Annotation.
    pub annotation: String,
    /// Image type.
    pub image_type: ImageType,
    /// Import from a URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_import_spec: Option<ImageImportSpec>,
    /// Clone from a virtual disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_disk_clone: Option<VmDiskClone>,
}

impl CreateImageRequest {
    /// Empty image with the given name, annotation and type.
    #[must_use]
    pub fn from_spec(spec: &ImageSpec) -> Self {
        Self {
            name: spec.name.clone(),
            annotation: spec.annotation.clone(),
            image_type: spec.image_type,
            image_import_spec: None,
            vm_disk_clone: None,
        }
    }
}
