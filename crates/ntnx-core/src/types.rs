//! API endpoint resolution.
//!
//! Prism exposes several API families under one host. The image and VM disk
//! resources live under the Acropolis (AHV) API, while storage containers are
//! served by the older Prism Gateway REST API.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Default Prism port.
pub const DEFAULT_PRISM_PORT: u16 = 9440;

/// API families exposed by a Prism endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiEndpoint {
    /// Acropolis hypervisor API (images, VMs, VM disks)
    Ahv,
    /// Prism Gateway REST API (containers, virtual disks)
    Rest,
}

impl ApiEndpoint {
    /// Returns the endpoint name as a string.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Ahv => "ahv",
            Self::Rest => "rest",
        }
    }

    /// Path prefix of this API family relative to the Prism root.
    #[must_use]
    pub const fn path_prefix(&self) -> &'static str {
        match self {
            Self::Ahv => "api/nutanix/v0.8/",
            Self::Rest => "PrismGateway/services/rest/v1/",
        }
    }

    /// Resolve the base URL of this API family against a Prism root URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] if the root cannot be joined.
    pub fn resolve(&self, root: &Url) -> Result<Url> {
        let mut root = root.clone();
        if !root.path().ends_with('/') {
            let path = format!("{}/", root.path());
            root.set_path(&path);
        }

        root.join(self.path_prefix()).map_err(|err| {
            Error::InvalidEndpoint(format!(
                "Cannot resolve {} endpoint from `{root}`: {err}",
                self.name()
            ))
        })
    }
}

impl std::fmt::Display for ApiEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_ahv() {
        let root = Url::parse("https://prism.example.com:9440").unwrap();
        let url = ApiEndpoint::Ahv.resolve(&root).unwrap();
        assert_eq!(
            url.as_str(),
            "https://prism.example.com:9440/api/nutanix/v0.8/"
        );
    }

    #[test]
    fn test_resolve_rest_keeps_root_path() {
        let root = Url::parse("http://127.0.0.1:8080/proxy").unwrap();
        let url = ApiEndpoint::Rest.resolve(&root).unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8080/proxy/PrismGateway/services/rest/v1/"
        );
    }

    #[test]
    fn test_endpoint_names() {
        assert_eq!(ApiEndpoint::Ahv.to_string(), "ahv");
        assert_eq!(ApiEndpoint::Rest.name(), "rest");
    }
}
