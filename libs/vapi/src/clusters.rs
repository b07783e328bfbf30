//! Cluster software drafts.
//!
//! A draft is a mutable staging copy of a cluster's desired software. It is
//! edited through its component list and applied with an asynchronous
//! commit task.

use std::collections::BTreeMap;

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::rest::{Client, Resource};

/// Endpoint for cluster settings; cluster and draft ids follow as segments.
pub const CLUSTERS_PATH: &str = "/api/esx/settings/clusters";

/// `Settings.Clusters.Software.Drafts.Metadata`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftMetadata {
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub creation_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<String>,
}

/// Version and display details of a component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentDetails {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub display_version: String,
    #[serde(default)]
    pub vendor: String,
}

/// `Settings.ComponentInfo`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentInfo {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub details: ComponentDetails,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseImageDetails {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub display_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
}

/// `Settings.BaseImageInfo`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseImageInfo {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub details: BaseImageDetails,
}

/// `Settings.AddOnInfo`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddOnInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub details: ComponentDetails,
}

/// `Settings.SoftwareInfo`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoftwareInfo {
    #[serde(default)]
    pub base_image: BaseImageInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_on: Option<AddOnInfo>,
    #[serde(default)]
    pub components: BTreeMap<String, ComponentInfo>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub solutions: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_support: Option<serde_json::Value>,
}

/// `Settings.Clusters.Software.Drafts.Info`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftInfo {
    #[serde(default)]
    pub metadata: DraftMetadata,
    #[serde(default)]
    pub software: SoftwareInfo,
}

/// `Settings.Clusters.Software.Drafts.CommitSpec`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `Settings.Clusters.Software.Drafts.Software.Components.UpdateSpec`
///
/// `components_to_set` maps a component name to a version; `None` lets the
/// server pick the version from the depot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentsUpdateSpec {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub components_to_set: BTreeMap<String, Option<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components_to_delete: Vec<String>,
}

impl ComponentsUpdateSpec {
    pub fn is_empty(&self) -> bool {
        self.components_to_set.is_empty() && self.components_to_delete.is_empty()
    }
}

/// Software drafts manager over the REST client.
#[derive(Debug, Clone)]
pub struct Manager {
    client: Client,
}

impl Manager {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn drafts(&self, cluster_id: &str) -> Result<Resource, Error> {
        Ok(self
            .client
            .resource(CLUSTERS_PATH)?
            .with_subpath(cluster_id)
            .with_subpath("software")
            .with_subpath("drafts"))
    }

    fn components(&self, cluster_id: &str, draft_id: &str) -> Result<Resource, Error> {
        Ok(self
            .drafts(cluster_id)?
            .with_subpath(draft_id)
            .with_subpath("software")
            .with_subpath("components"))
    }

    /// Retrieve the drafts of a cluster, optionally limited to `owners`.
    pub async fn list_software_drafts(
        &self,
        cluster_id: &str,
        owners: &[String],
    ) -> Result<BTreeMap<String, DraftMetadata>, Error> {
        let request = self
            .drafts(cluster_id)?
            .with_list_param("owners", owners)
            .request(Method::GET);
        self.client.execute(request).await
    }

    /// Create a draft on the cluster. Returns the draft id.
    pub async fn create_software_draft(&self, cluster_id: &str) -> Result<String, Error> {
        let request = self.drafts(cluster_id)?.request(Method::POST);
        self.client.execute(request).await
    }

    /// Discard a draft.
    pub async fn delete_software_draft(&self, cluster_id: &str, draft_id: &str) -> Result<(), Error> {
        let request = self
            .drafts(cluster_id)?
            .with_subpath(draft_id)
            .request(Method::DELETE);
        self.client.execute_unit(request).await
    }

    /// Retrieve a draft with its full software specification.
    pub async fn get_software_draft(
        &self,
        cluster_id: &str,
        draft_id: &str,
    ) -> Result<DraftInfo, Error> {
        let request = self
            .drafts(cluster_id)?
            .with_subpath(draft_id)
            .request(Method::GET);
        self.client.execute(request).await
    }

    /// Start a task committing the draft. Returns the task id.
    pub async fn commit_software_draft(
        &self,
        cluster_id: &str,
        draft_id: &str,
        spec: &CommitSpec,
    ) -> Result<String, Error> {
        let request = self
            .drafts(cluster_id)?
            .with_subpath(draft_id)
            .with_param("action", "commit")
            .as_task()
            .request_with_body(Method::POST, spec)?;
        self.client.execute(request).await
    }

    /// Retrieve the components of a draft, keyed by component name.
    pub async fn list_software_draft_components(
        &self,
        cluster_id: &str,
        draft_id: &str,
    ) -> Result<BTreeMap<String, ComponentInfo>, Error> {
        let request = self.components(cluster_id, draft_id)?.request(Method::GET);
        self.client.execute(request).await
    }

    /// Retrieve one component of a draft.
    pub async fn get_software_draft_component(
        &self,
        cluster_id: &str,
        draft_id: &str,
        component: &str,
    ) -> Result<ComponentInfo, Error> {
        let request = self
            .components(cluster_id, draft_id)?
            .with_subpath(component)
            .request(Method::GET);
        self.client.execute(request).await
    }

    /// Set and delete components of a draft in one call.
    pub async fn update_software_draft_components(
        &self,
        cluster_id: &str,
        draft_id: &str,
        spec: &ComponentsUpdateSpec,
    ) -> Result<(), Error> {
        let request = self
            .components(cluster_id, draft_id)?
            .request_with_body(Method::PATCH, spec)?;
        self.client.execute_unit(request).await
    }

    /// Remove one component from a draft.
    pub async fn remove_software_draft_component(
        &self,
        cluster_id: &str,
        draft_id: &str,
        component: &str,
    ) -> Result<(), Error> {
        let request = self
            .components(cluster_id, draft_id)?
            .with_subpath(component)
            .request(Method::DELETE);
        self.client.execute_unit(request).await
    }
}
