//! Offline depots and depot content.
//!
//! Type mappings follow the `esx/settings/depots` and
//! `esx/settings/depot-content` data structures of the vSphere Automation API.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::rest::Client;

/// Endpoint for the offline depots API.
pub const DEPOTS_OFFLINE_PATH: &str = "/api/esx/settings/depots/offline";

/// Endpoint for querying components across all depots.
pub const DEPOT_CONTENT_COMPONENTS_PATH: &str = "/api/esx/settings/depot-content/components";

/// How an offline depot gets its content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceType {
    /// Content is uploaded to vCenter (`file_id`).
    Push,
    /// Content is downloaded from a URL (`location`).
    #[default]
    Pull,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceType::Push => f.write_str("PUSH"),
            SourceType::Pull => f.write_str("PULL"),
        }
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PUSH" => Ok(SourceType::Push),
            "PULL" => Ok(SourceType::Pull),
            other => Err(format!("unknown source type '{other}', expected PUSH or PULL")),
        }
    }
}

/// `Settings.Depots.Offline.Summary`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OfflineDepotSummary {
    #[serde(default)]
    pub description: String,
    pub source_type: SourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_data: Option<String>,
}

/// `Settings.Depots.Offline.Info`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OfflineDepotInfo {
    #[serde(default)]
    pub create_time: String,
    #[serde(default)]
    pub description: String,
    pub source_type: SourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_data: Option<String>,
}

/// `Settings.Depots.Offline.CreateSpec`
///
/// Unset optional fields are left out of the JSON body entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OfflineDepotCreateSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub source_type: SourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_data: Option<String>,
}

/// `Settings.Depots.ComponentVersion`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentVersion {
    #[serde(default)]
    pub display_version: String,
    #[serde(default)]
    pub version: String,
}

/// `Settings.Depots.ComponentSummary`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentSummary {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub versions: Vec<ComponentVersion>,
}

/// `Settings.Depots.MetadataInfo`
///
/// Only independent components are mapped field by field; the remaining
/// sections are kept as raw JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataInfo {
    #[serde(default)]
    pub file_name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub independent_components: BTreeMap<String, ComponentSummary>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub addons: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub base_images: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hardware_support: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub solutions: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub updates: BTreeMap<String, serde_json::Value>,
}

/// `Settings.Depots.Offline.Content.Info`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OfflineDepotContentInfo {
    #[serde(default)]
    pub metadata_bundles: BTreeMap<String, Vec<MetadataInfo>>,
}

/// Filters for [`Manager::list_depot_components`].
///
/// Empty lists and `None` leave the matching query parameter out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepotComponentFilter {
    pub names: Vec<String>,
    pub vendors: Vec<String>,
    pub versions: Vec<String>,
    pub bundle_types: Vec<String>,
    pub min_version: Option<String>,
}

/// One version of a component available in the depots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepotComponentVersion {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub display_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
}

/// A component found in the depots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepotContentComponent {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub versions: Vec<DepotComponentVersion>,
}

/// Depot manager over the REST client.
#[derive(Debug, Clone)]
pub struct Manager {
    client: Client,
}

impl Manager {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Retrieve all offline depots, keyed by depot id.
    pub async fn list_offline_depots(&self) -> Result<BTreeMap<String, OfflineDepotInfo>, Error> {
        let request = self
            .client
            .resource(DEPOTS_OFFLINE_PATH)?
            .request(Method::GET);
        self.client.execute(request).await
    }

    /// Retrieve one offline depot.
    pub async fn get_offline_depot(&self, depot_id: &str) -> Result<OfflineDepotSummary, Error> {
        let request = self
            .client
            .resource(DEPOTS_OFFLINE_PATH)?
            .with_subpath(depot_id)
            .request(Method::GET);
        self.client.execute(request).await
    }

    /// Start a task creating an offline depot. Returns the task id.
    pub async fn create_offline_depot(&self, spec: &OfflineDepotCreateSpec) -> Result<String, Error> {
        let request = self
            .client
            .resource(DEPOTS_OFFLINE_PATH)?
            .as_task()
            .request_with_body(Method::POST, spec)?;
        self.client.execute(request).await
    }

    /// Start a task deleting an offline depot. Returns the task id.
    pub async fn delete_offline_depot(&self, depot_id: &str) -> Result<String, Error> {
        let request = self
            .client
            .resource(DEPOTS_OFFLINE_PATH)?
            .with_subpath(depot_id)
            .as_task()
            .request(Method::DELETE);
        self.client.execute(request).await
    }

    /// Retrieve the metadata bundles of an offline depot.
    pub async fn get_offline_depot_content(
        &self,
        depot_id: &str,
    ) -> Result<OfflineDepotContentInfo, Error> {
        let request = self
            .client
            .resource(DEPOTS_OFFLINE_PATH)?
            .with_subpath(depot_id)
            .with_subpath("content")
            .request(Method::GET);
        self.client.execute(request).await
    }

    /// List components available across depots.
    pub async fn list_depot_components(
        &self,
        filter: &DepotComponentFilter,
    ) -> Result<Vec<DepotContentComponent>, Error> {
        let request = self
            .client
            .resource(DEPOT_CONTENT_COMPONENTS_PATH)?
            .with_list_param("names", &filter.names)
            .with_list_param("vendors", &filter.vendors)
            .with_list_param("versions", &filter.versions)
            .with_list_param("bundle_types", &filter.bundle_types)
            .with_optional_param("min_version", filter.min_version.as_deref())
            .request(Method::GET);
        self.client.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_spec_omits_unset_fields() {
        let spec = OfflineDepotCreateSpec {
            source_type: SourceType::Pull,
            location: Some("https://depot.example.com/index.xml".to_string()),
            ..Default::default()
        };

        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "source_type": "PULL",
                "location": "https://depot.example.com/index.xml"
            })
        );

        let back: OfflineDepotCreateSpec = serde_json::from_value(json).unwrap();
        assert_eq!(back, spec);
    }

    #[test]
    fn echoed_depot_matches_populated_create_fields() {
        let spec = OfflineDepotCreateSpec {
            description: Some("vendor bundle".to_string()),
            source_type: SourceType::Push,
            file_id: Some("file-17".to_string()),
            location: None,
            owner_data: Some("{\"team\":\"infra\"}".to_string()),
        };

        let mut echoed = serde_json::to_value(&spec).unwrap();
        echoed["create_time"] = serde_json::json!("2024-05-01T10:00:00Z");
        let info: OfflineDepotInfo = serde_json::from_value(echoed).unwrap();

        assert_eq!(Some(info.description.clone()), spec.description);
        assert_eq!(info.source_type, spec.source_type);
        assert_eq!(info.file_id, spec.file_id);
        assert_eq!(info.owner_data, spec.owner_data);
        assert_eq!(info.location, None);

        let reencoded = serde_json::to_value(&info).unwrap();
        assert!(reencoded.get("location").is_none());
        assert!(reencoded.get("owner").is_none());
    }

    #[test]
    fn source_type_parses_case_insensitively() {
        assert_eq!("push".parse::<SourceType>().unwrap(), SourceType::Push);
        assert_eq!("PULL".parse::<SourceType>().unwrap(), SourceType::Pull);
        assert!("FTP".parse::<SourceType>().is_err());
        assert_eq!(SourceType::Push.to_string(), "PUSH");
    }

    #[test]
    fn content_info_decodes_independent_components() {
        let content: OfflineDepotContentInfo = serde_json::from_value(serde_json::json!({
            "metadata_bundles": {
                "vendor-depot": [{
                    "file_name": "metadata.zip",
                    "independent_components": {
                        "NVD-AIE-800": {
                            "display_name": "NVIDIA AI Enterprise",
                            "versions": [{ "display_version": "5.0", "version": "5.0-1" }]
                        }
                    },
                    "base_images": [{ "version": "8.0.2" }]
                }]
            }
        }))
        .unwrap();

        let bundle = &content.metadata_bundles["vendor-depot"][0];
        assert_eq!(bundle.file_name, "metadata.zip");
        assert_eq!(
            bundle.independent_components["NVD-AIE-800"].versions[0].version,
            "5.0-1"
        );
        assert_eq!(bundle.base_images.len(), 1);
    }
}
