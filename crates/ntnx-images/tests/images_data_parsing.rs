//! Integration tests for parsing Acropolis image data.
//!
//! These tests validate that the ntnx-images models can correctly deserialize
//! `v0.8` API response data.

use ntnx_core::Error;
use ntnx_images::models::{Image, ImageList, ImageType, Task};
use ntnx_images::image_uuid_from_task;
use std::fs;
use std::path::PathBuf;

/// Get the path to the test fixtures directory.
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Load a fixture from disk.
fn load_fixture(name: &str) -> String {
    let fixture_path = fixtures_dir().join(name);
    fs::read_to_string(&fixture_path).unwrap_or_else(|e| {
        panic!(
            "Failed to read fixture at {}: {}",
            fixture_path.display(),
            e
        )
    })
}

#[test]
fn test_deserialize_image_list() {
    let json_data = load_fixture("image_list.json");

    let list: ImageList = serde_json::from_str(&json_data).unwrap_or_else(|e| {
        panic!(
            "Failed to deserialize image list data: {}\nJSON: {}",
            e, json_data
        )
    });

    assert_eq!(list.entities.len(), 3, "Expected 3 images in test data");
    assert_eq!(list.metadata.grand_total_entities, 3);

    let iso = list.find_unique("virtio-win").unwrap().unwrap();
    assert_eq!(iso.image_type, Some(ImageType::IsoImage));
    assert!(iso.annotation.is_none());

    let golden = list.find_unique("golden-base").unwrap().unwrap();
    assert!(!golden.is_active());
    assert!(golden.vm_disk_id.is_none());
    assert!(golden.updated_at().is_none());

    assert!(list.find_unique("Ubuntu-22.04").unwrap().is_none());
}

#[test]
fn test_deserialize_image_detail() {
    let json_data = load_fixture("image_detail.json");

    let image: Image = serde_json::from_str(&json_data).unwrap_or_else(|e| {
        panic!(
            "Failed to deserialize image detail data: {}\nJSON: {}",
            e, json_data
        )
    });

    assert_eq!(image.uuid.as_str(), "4b2c3f0e-9a1d-4c7e-8f55-1d2e3a4b5c6d");
    assert_eq!(image.name, "ubuntu-22.04");
    assert_eq!(image.container_id, Some(8));
    assert_eq!(
        image.require_vm_disk_id().unwrap().as_str(),
        "0c9e7d2a-5f1b-4e8c-a3d4-6b7f8e9a0b1c"
    );
    assert!(image.is_active());

    let created = image.created_at().unwrap();
    assert_eq!(created.timestamp(), 1_700_000_000);
    assert_eq!(created.timestamp_subsec_micros(), 123_456);
}

#[test]
fn test_task_yields_created_image() {
    let json_data = load_fixture("task_detail.json");

    let task: Task = serde_json::from_str(&json_data).unwrap_or_else(|e| {
        panic!(
            "Failed to deserialize task data: {}\nJSON: {}",
            e, json_data
        )
    });

    assert_eq!(task.progress_status.as_deref(), Some("Succeeded"));
    assert_eq!(task.percentage_complete, Some(100));
    assert_eq!(
        image_uuid_from_task(&task).unwrap().as_str(),
        "d3c2b1a0-9f8e-47d6-b5a4-93827160f5e4"
    );
}

#[test]
fn test_task_without_entities_is_rejected() {
    let task: Task = serde_json::from_str(r#"{"uuid": "t1", "progressStatus": "Failed"}"#).unwrap();

    assert!(matches!(
        image_uuid_from_task(&task),
        Err(Error::InvalidResponse(_))
    ));
}
