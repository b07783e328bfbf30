
use harness::{client, received_queries, vapi_error};
use vlcm_vapi::clusters::{CommitSpec, ComponentsUpdateSpec, Manager};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DRAFTS: &str = "/api/esx/settings/clusters/domain-c21/software/drafts";

#[tokio::test]
async fn list_drafts_joins_owners() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DRAFTS))
        .and(query_param("owners", "stoyan1,stoyan2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "13": { "owner": "stoyan1", "status": "VALID", "creation_time": "2024-05-01T10:00:00Z" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let owners = vec!["stoyan1".to_string(), "stoyan2".to_string()];
    let drafts = Manager::new(client(&server))
        .list_software_drafts("domain-c21", &owners)
        .await
        .unwrap();

    assert_eq!(drafts["13"].owner, "stoyan1");
    assert_eq!(drafts["13"].status, "VALID");
}

#[tokio::test]
async fn list_drafts_without_owners_omits_parameter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DRAFTS))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let drafts = Manager::new(client(&server))
        .list_software_drafts("domain-c21", &[])
        .await
        .unwrap();

    assert!(drafts.is_empty());
    assert_eq!(received_queries(&server).await, vec![Vec::new()]);
}

#[tokio::test]
async fn create_draft_returns_draft_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DRAFTS))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!("13")))
        .expect(1)
        .mount(&server)
        .await;

    let draft_id = Manager::new(client(&server))
        .create_software_draft("domain-c21")
        .await
        .unwrap();

    assert_eq!(draft_id, "13");
}

#[tokio::test]
async fn delete_draft_accepts_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{DRAFTS}/13")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Manager::new(client(&server))
        .delete_software_draft("domain-c21", "13")
        .await
        .unwrap();
}

#[tokio::test]
async fn get_draft_decodes_metadata_and_software() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{DRAFTS}/13")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "metadata": { "owner": "stoyan1", "status": "VALID", "creation_time": "2024-05-01T10:00:00Z" },
            "software": {
                "base_image": { "version": "8.0.2-0.0.22380479", "details": { "display_name": "ESXi", "display_version": "8.0 U2" } },
                "add_on": { "name": "DEL-ESXi", "version": "802.22380479-A01", "details": { "display_name": "Dell Addon", "display_version": "A01", "vendor": "Dell" } },
                "components": {}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let draft = Manager::new(client(&server))
        .get_software_draft("domain-c21", "13")
        .await
        .unwrap();

    assert_eq!(draft.metadata.owner, "stoyan1");
    assert_eq!(draft.software.base_image.version, "8.0.2-0.0.22380479");
    assert_eq!(draft.software.add_on.unwrap().details.vendor, "Dell");
}

#[tokio::test]
async fn get_missing_draft_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{DRAFTS}/99")))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(vapi_error("NOT_FOUND", "Draft 99 not found.")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = Manager::new(client(&server))
        .get_software_draft("domain-c21", "99")
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn commit_draft_posts_commit_action_as_task() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{DRAFTS}/13")))
        .and(query_param("action", "commit"))
        .and(query_param("vmw-task", "true"))
        .and(body_json(serde_json::json!({ "message": "add NVIDIA AIE" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!("task-7")))
        .expect(1)
        .mount(&server)
        .await;

    let spec = CommitSpec {
        message: Some("add NVIDIA AIE".to_string()),
    };
    let task_id = Manager::new(client(&server))
        .commit_software_draft("domain-c21", "13", &spec)
        .await
        .unwrap();

    assert_eq!(task_id, "task-7");
}

#[tokio::test]
async fn list_and_get_draft_components() {
    let server = MockServer::start().await;
    let component = serde_json::json!({
        "version": "5.0-1",
        "details": { "display_name": "NVIDIA AI Enterprise", "display_version": "5.0", "vendor": "NVIDIA" }
    });
    Mock::given(method("GET"))
        .and(path(format!("{DRAFTS}/13/software/components")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "NVD-AIE-800": component.clone() })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{DRAFTS}/13/software/components/NVD-AIE-800")))
        .respond_with(ResponseTemplate::new(200).set_body_json(component))
        .expect(1)
        .mount(&server)
        .await;

    let manager = Manager::new(client(&server));
    let components = manager
        .list_software_draft_components("domain-c21", "13")
        .await
        .unwrap();
    let single = manager
        .get_software_draft_component("domain-c21", "13", "NVD-AIE-800")
        .await
        .unwrap();

    assert_eq!(components["NVD-AIE-800"], single);
    assert_eq!(single.details.display_name, "NVIDIA AI Enterprise");
}

#[tokio::test]
async fn update_components_patches_spec() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(format!("{DRAFTS}/13/software/components")))
        .and(body_json(serde_json::json!({
            "components_to_set": { "NVD-AIE-800": "5.0-1" },
            "components_to_delete": ["Intel-i40en"]
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut spec = ComponentsUpdateSpec::default();
    spec.components_to_set
        .insert("NVD-AIE-800".to_string(), Some("5.0-1".to_string()));
    spec.components_to_delete.push("Intel-i40en".to_string());

    Manager::new(client(&server))
        .update_software_draft_components("domain-c21", "13", &spec)
        .await
        .unwrap();
}

#[tokio::test]
async fn remove_component_deletes_subpath() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{DRAFTS}/13/software/components/NVD-AIE-800")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Manager::new(client(&server))
        .remove_software_draft_component("domain-c21", "13", "NVD-AIE-800")
        .await
        .unwrap();
}
