use crate::{
    ApiClient, AutoscalerError, CloudstackConfig, DiscoveryClient, ProjectClient,
    nodegroup::application::request::list_requests::{
        ListAutoScaleVmProfilesRequest, ListResourceDetailsRequest, ListVirtualMachinesRequest,
    },
};
use std::collections::BTreeMap;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param, query_param_is_missing},
};

fn create_test_client(server_url: &str) -> ApiClient {
    let config = CloudstackConfig {
        api_key: "testkey".to_string(),
        api_secret: "testsecret".to_string(),
        url: format!("{}/client/api", server_url),
        ..Default::default()
    };
    ApiClient::new(&config).unwrap()
}

#[tokio::test]
async fn test_list_projects_success() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/client/api"))
        .and(query_param("command", "listProjects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "listprojectsresponse": {
                "count": 2,
                "project": [
                    {"id": "proj1", "name": "first", "state": "Active"},
                    {"id": "proj2", "name": "second", "state": "Active"}
                ]
            }
        })))
        .mount(&mock_server)
        .await;

    let projects = client.list_projects().await.unwrap();
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[0].id, "proj1");
    assert_eq!(projects[1].name, "second");
}

#[tokio::test]
async fn test_list_projects_empty() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server.uri());

    Mock::given(method("GET"))
        .and(query_param("command", "listProjects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "listprojectsresponse": {}
        })))
        .mount(&mock_server)
        .await;

    assert!(client.list_projects().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_autoscale_vm_profiles_in_root_scope() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server.uri());

    Mock::given(method("GET"))
        .and(query_param("command", "listAutoScaleVmProfiles"))
        .and(query_param_is_missing("projectid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "listautoscalevmprofilesresponse": {
                "count": 1,
                "autoscalevmprofile": [{
                    "id": "asp1",
                    "templateid": "tpl1",
                    "serviceofferingid": "so1",
                    "zoneid": "zone1",
                    "otherdeployparams": "networkids=net1&rootdisksize=20"
                }]
            }
        })))
        .mount(&mock_server)
        .await;

    let profiles = client
        .list_autoscale_vm_profiles(&ListAutoScaleVmProfilesRequest::in_project(""))
        .await
        .unwrap();
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].id, "asp1");
    assert_eq!(profiles[0].otherdeployparams, "networkids=net1&rootdisksize=20");
}

#[tokio::test]
async fn test_list_autoscale_vm_profiles_in_project() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server.uri());

    Mock::given(method("GET"))
        .and(query_param("command", "listAutoScaleVmProfiles"))
        .and(query_param("projectid", "proj1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "listautoscalevmprofilesresponse": {
                "count": 1,
                "autoscalevmprofile": [{"id": "asp2", "projectid": "proj1"}]
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let profiles = client
        .list_autoscale_vm_profiles(&ListAutoScaleVmProfilesRequest::in_project("proj1"))
        .await
        .unwrap();
    assert_eq!(profiles[0].projectid.as_deref(), Some("proj1"));
}

#[tokio::test]
async fn test_list_resource_details() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server.uri());

    Mock::given(method("GET"))
        .and(query_param("command", "listResourceDetails"))
        .and(query_param("resourcetype", "AutoScaleVmProfile"))
        .and(query_param("resourceid", "asp1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "listresourcedetailsresponse": {
                "count": 2,
                "resourcedetail": [
                    {"key": "nodeGroupName", "value": "ng1", "resourceid": "asp1"},
                    {"key": "minNodes", "value": "1", "resourceid": "asp1"}
                ]
            }
        })))
        .mount(&mock_server)
        .await;

    let details = client
        .list_resource_details(&ListResourceDetailsRequest::for_profile("asp1"))
        .await
        .unwrap();
    assert_eq!(details.len(), 2);
    assert_eq!(details[0].key, "nodeGroupName");
    assert_eq!(details[1].value, "1");
}

#[tokio::test]
async fn test_list_virtual_machines_by_tag() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server.uri());

    Mock::given(method("GET"))
        .and(query_param("command", "listVirtualMachines"))
        .and(query_param("tags[0].key", "nodeGroupName"))
        .and(query_param("tags[0].value", "ng1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "listvirtualmachinesresponse": {
                "count": 2,
                "virtualmachine": [
                    {"id": "vm1", "name": "ng1-1", "state": "Running"},
                    {"id": "vm2", "name": "ng1-2", "state": "Starting"}
                ]
            }
        })))
        .mount(&mock_server)
        .await;

    let request = ListVirtualMachinesRequest {
        projectid: None,
        tags: BTreeMap::from([("nodeGroupName".to_string(), "ng1".to_string())]),
    };
    let vms = client.list_virtual_machines(&request).await.unwrap();
    assert_eq!(vms.len(), 2);
    assert_eq!(vms[1].state, "Starting");
}

#[tokio::test]
async fn test_get_service_offering_by_id() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server.uri());

    Mock::given(method("GET"))
        .and(query_param("command", "listServiceOfferings"))
        .and(query_param("id", "so1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "listserviceofferingsresponse": {
                "count": 1,
                "serviceoffering": [
                    {"id": "so1", "name": "medium", "cpunumber": 4, "cpuspeed": 2000, "memory": 8192}
                ]
            }
        })))
        .mount(&mock_server)
        .await;

    let offering = client.get_service_offering_by_id("so1").await.unwrap();
    assert_eq!(offering.name, "medium");
    assert_eq!(offering.cpunumber, 4);
    assert_eq!(offering.memory, 8192);
}

#[tokio::test]
async fn test_get_zone_by_id_not_found() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server.uri());

    Mock::given(method("GET"))
        .and(query_param("command", "listZones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "listzonesresponse": {}
        })))
        .mount(&mock_server)
        .await;

    let err = client.get_zone_by_id("zone9").await.unwrap_err();
    assert!(matches!(err, AutoscalerError::NoMatch { kind: "zone", .. }));
    assert_eq!(err.to_string(), "No match found for zone: zone9");
}

#[tokio::test]
async fn test_request_is_signed() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server.uri());

    Mock::given(method("GET"))
        .and(query_param("command", "listZones"))
        .and(query_param("apikey", "testkey"))
        .and(query_param("response", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "listzonesresponse": {"count": 1, "zone": [{"id": "zone1", "name": "z1"}]}
        })))
        .mount(&mock_server)
        .await;

    client.get_zone_by_id("zone1").await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    let signature = requests[0]
        .url
        .query_pairs()
        .find(|(k, _)| k == "signature")
        .map(|(_, v)| v.into_owned());
    assert!(signature.is_some_and(|s| !s.is_empty()));
}
