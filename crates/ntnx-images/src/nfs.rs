//! NFS export URIs of Acropolis virtual disks.

use ntnx_core::{Error, Result};
use url::Host;

/// Directory, relative to a container root, holding the vdisks of VM disks.
pub const NFS_VMDISK_PATH: &str = ".acropolis/vmdisk";

/// Build `nfs://<host>/<container>/.acropolis/vmdisk/<disk-id>`.
///
/// Segments are validated rather than percent-encoded: the host must parse as
/// a host name or IP literal, and the container and disk id must be non-empty
/// and free of `/`, `?`, `#`, whitespace and control characters.
///
/// # Errors
///
/// Returns [`Error::InvalidRequest`] naming the offending segment.
pub fn nfs_uri_from_vdisk(host: &str, container_name: &str, vm_disk_id: &str) -> Result<String> {
    if host.is_empty() || Host::parse(host).is_err() {
        return Err(Error::InvalidRequest(format!("Invalid NFS host `{host}`")));
    }
    check_segment("container", container_name)?;
    check_segment("vm disk id", vm_disk_id)?;

    Ok(format!(
        "nfs://{host}/{container_name}/{NFS_VMDISK_PATH}/{vm_disk_id}"
    ))
}

fn check_segment(what: &str, segment: &str) -> Result<()> {
    let invalid = segment.is_empty()
        || segment
            .chars()
            .any(|c| matches!(c, '/' | '?' | '#') || c.is_whitespace() || c.is_control());

    if invalid {
        return Err(Error::InvalidRequest(format!(
            "Invalid {what} `{segment}` for NFS URI"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composes_exact_uri() {
        assert_eq!(
            nfs_uri_from_vdisk("h", "c", "d").unwrap(),
            "nfs://h/c/.acropolis/vmdisk/d"
        );
        assert_eq!(
            nfs_uri_from_vdisk("10.0.0.5", "default-container", "7c1a-4e").unwrap(),
            "nfs://10.0.0.5/default-container/.acropolis/vmdisk/7c1a-4e"
        );
    }

    #[test]
    fn rejects_bad_segments() {
        assert!(nfs_uri_from_vdisk("", "c", "d").is_err());
        assert!(nfs_uri_from_vdisk("bad host", "c", "d").is_err());
        assert!(nfs_uri_from_vdisk("h", "", "d").is_err());
        assert!(nfs_uri_from_vdisk("h", "a/b", "d").is_err());
        assert!(nfs_uri_from_vdisk("h", "c", "d 1").is_err());
        assert!(nfs_uri_from_vdisk("h", "c", "d?x").is_err());
    }
}
