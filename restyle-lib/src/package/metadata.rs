use serde::{Deserialize, Serialize};
use url::Url;

use crate::document::SiteInfo;
use crate::error::PackageError;

/// User-editable description of the package being exported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectMetadata {
    pub name: String,
    pub author: String,
    pub description: String,
    /// Data URL of the page thumbnail. Shown by the host, never written into the package.
    pub image: Option<String>,
    /// Activate on the whole origin instead of the exact page.
    pub applied_to_domain: bool,
    /// Page the project was started on.
    pub url: String,
}

impl ProjectMetadata {
    /// Initial metadata for a freshly opened page.
    pub fn from_site(site: &SiteInfo) -> Self {
        ProjectMetadata {
            name: site.domain.clone(),
            author: String::new(),
            description: format!("Mod for {}", site.title),
            image: site.favicon_image.clone(),
            applied_to_domain: false,
            url: site.url.clone(),
        }
    }

    /// URL or URL pattern the generated package activates on.
    pub fn target_scope(&self) -> Result<String, PackageError> {
        let url = Url::parse(&self.url).map_err(|source| PackageError::InvalidPageUrl {
            url: self.url.clone(),
            source,
        })?;
        if self.applied_to_domain {
            let origin = url.origin();
            if !origin.is_tuple() {
                return Err(PackageError::OpaqueOrigin {
                    url: self.url.clone(),
                });
            }
            Ok(format!("{}/*", origin.ascii_serialization()))
        } else {
            Ok(url.to_string())
        }
    }
}
