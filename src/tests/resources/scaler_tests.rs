use crate::{
    ApiClient, AutoscalerError, CloudstackConfig, ScalerClient,
    nodegroup::application::request::{
        create_tags_request::CreateTagsRequest, deploy_vm_request::DeployVmRequest,
        destroy_vm_request::DestroyVmRequest,
    },
};
use std::collections::BTreeMap;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, query_param},
};

fn create_test_client(server_url: &str) -> ApiClient {
    let config = CloudstackConfig {
        api_key: "testkey".to_string(),
        api_secret: "testsecret".to_string(),
        url: format!("{}/client/api", server_url),
        async_timeout_secs: 1,
        poll_interval_ms: 10,
        ..Default::default()
    };
    ApiClient::new(&config).unwrap()
}

fn deploy_request() -> DeployVmRequest {
    DeployVmRequest {
        serviceofferingid: "so1".to_string(),
        zoneid: "zone1".to_string(),
        templateid: "tpl1".to_string(),
        networkids: vec!["net1".to_string(), "net2".to_string()],
        ..Default::default()
    }
    .with_name("ng1-42".to_string())
}

async fn mount_job(mock_server: &MockServer, job_id: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(query_param("command", "queryAsyncJobResult"))
        .and(query_param("jobid", job_id))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "queryasyncjobresultresponse": body
        })))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_deploy_virtual_machine_success() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server.uri());

    Mock::given(method("GET"))
        .and(query_param("command", "deployVirtualMachine"))
        .and(query_param("serviceofferingid", "so1"))
        .and(query_param("templateid", "tpl1"))
        .and(query_param("networkids", "net1,net2"))
        .and(query_param("name", "ng1-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "deployvirtualmachineresponse": {"id": "vm1", "jobid": "job1"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_job(
        &mock_server,
        "job1",
        serde_json::json!({
            "jobid": "job1",
            "jobstatus": 1,
            "jobresult": {
                "virtualmachine": {"id": "vm1", "name": "ng1-42", "state": "Running"}
            }
        }),
    )
    .await;

    let vm = client.deploy_virtual_machine(&deploy_request()).await.unwrap();
    assert_eq!(vm.id, "vm1");
    assert_eq!(vm.name, "ng1-42");
}

#[tokio::test]
async fn test_deploy_virtual_machine_rejected() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server.uri());

    Mock::given(method("GET"))
        .and(query_param("command", "deployVirtualMachine"))
        .respond_with(ResponseTemplate::new(431).set_body_json(serde_json::json!({
            "deployvirtualmachineresponse": {"errorcode": 431, "errortext": "bad template"}
        })))
        .mount(&mock_server)
        .await;

    let failure = client
        .deploy_virtual_machine(&deploy_request())
        .await
        .unwrap_err();
    assert_eq!(failure.vm_id, None);
    assert_eq!(failure.to_string(), "CloudStack API error 431: bad template");
}

#[tokio::test]
async fn test_deploy_virtual_machine_timeout_keeps_vm_id() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server.uri());

    Mock::given(method("GET"))
        .and(query_param("command", "deployVirtualMachine"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "deployvirtualmachineresponse": {"id": "vm1", "jobid": "job1"}
        })))
        .mount(&mock_server)
        .await;
    mount_job(
        &mock_server,
        "job1",
        serde_json::json!({"jobid": "job1", "jobstatus": 0}),
    )
    .await;

    let failure = client
        .deploy_virtual_machine(&deploy_request())
        .await
        .unwrap_err();
    assert_eq!(failure.vm_id.as_deref(), Some("vm1"));
    assert!(matches!(failure.error, AutoscalerError::AsyncJob(_)));
}

#[tokio::test]
async fn test_deploy_virtual_machine_job_failure_keeps_vm_id() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server.uri());

    Mock::given(method("GET"))
        .and(query_param("command", "deployVirtualMachine"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "deployvirtualmachineresponse": {"id": "vm1", "jobid": "job1"}
        })))
        .mount(&mock_server)
        .await;
    mount_job(
        &mock_server,
        "job1",
        serde_json::json!({
            "jobid": "job1",
            "jobstatus": 2,
            "jobresult": {"errorcode": 533, "errortext": "Insufficient capacity"}
        }),
    )
    .await;

    let failure = client
        .deploy_virtual_machine(&deploy_request())
        .await
        .unwrap_err();
    assert_eq!(failure.vm_id.as_deref(), Some("vm1"));
    assert_eq!(
        failure.to_string(),
        "CloudStack API error 533: Insufficient capacity"
    );
}

#[tokio::test]
async fn test_destroy_virtual_machine() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server.uri());

    Mock::given(method("GET"))
        .and(query_param("command", "destroyVirtualMachine"))
        .and(query_param("id", "vm1"))
        .and(query_param("expunge", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "destroyvirtualmachineresponse": {"jobid": "job2"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_job(
        &mock_server,
        "job2",
        serde_json::json!({"jobid": "job2", "jobstatus": 1, "jobresult": {}}),
    )
    .await;

    let request = DestroyVmRequest {
        id: "vm1".to_string(),
        expunge: true,
    };
    client.destroy_virtual_machine(&request).await.unwrap();
}

#[tokio::test]
async fn test_destroy_missing_virtual_machine_is_not_found() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server.uri());

    Mock::given(method("GET"))
        .and(query_param("command", "destroyVirtualMachine"))
        .respond_with(ResponseTemplate::new(431).set_body_json(serde_json::json!({
            "destroyvirtualmachineresponse": {
                "errorcode": 431,
                "errortext": "Unable to execute API command destroyvirtualmachine due to invalid value. Invalid parameter id value=vm1 due to incorrect long value format, or entity does not exist or due to incorrect parameter annotation for the field in api cmd class."
            }
        })))
        .mount(&mock_server)
        .await;

    let request = DestroyVmRequest {
        id: "vm1".to_string(),
        expunge: false,
    };
    let err = client.destroy_virtual_machine(&request).await.unwrap_err();
    assert!(err.is_not_found("vm1"));
}

#[tokio::test]
async fn test_create_tags() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server.uri());

    Mock::given(method("GET"))
        .and(query_param("command", "createTags"))
        .and(query_param("resourceids", "vm1"))
        .and(query_param("resourcetype", "UserVm"))
        .and(query_param("tags[0].key", "env"))
        .and(query_param("tags[0].value", "prod"))
        .and(query_param("tags[1].key", "nodeGroupName"))
        .and(query_param("tags[1].value", "ng1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "createtagsresponse": {"jobid": "job3"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_job(
        &mock_server,
        "job3",
        serde_json::json!({"jobid": "job3", "jobstatus": 1, "jobresult": {"success": true}}),
    )
    .await;

    let request = CreateTagsRequest {
        tags: BTreeMap::from([
            ("env".to_string(), "prod".to_string()),
            ("nodeGroupName".to_string(), "ng1".to_string()),
        ]),
        ..Default::default()
    }
    .for_vm("vm1");
    client.create_tags(&request).await.unwrap();
}
