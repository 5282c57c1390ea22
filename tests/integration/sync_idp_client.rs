use armgen_cli::client::{
    ArmClient, ChildResourceApi, ClientOptions, ParentIdentity, RetryPolicy, SyncIdentityProvider,
    SyncIdentityProviderProperties, SyncIdentityProviderUpdate, SyncIdentityProvidersClient,
    SystemData,
};
use armgen_cli::core::{ArmError, ServerErrorKind};
use armgen_cli::test_utils::{
    TEST_SUBSCRIPTION, init_test_logging, mock_arm_client, mock_client_options,
    sync_idp_collection_path, sync_idp_item_path, sync_idp_json, test_parent,
};
use futures::TryStreamExt;
use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_VERSION: &str = "2023-11-22";

fn client_for(server: &MockServer) -> SyncIdentityProvidersClient {
    init_test_logging(None);
    SyncIdentityProvidersClient::for_sync_identity_providers(mock_arm_client(&server.uri()))
}

fn cloud_error(code: &str, message: &str) -> serde_json::Value {
    json!({ "error": { "code": code, "message": message } })
}

#[tokio::test]
async fn test_get_sends_headers_and_decodes_system_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(sync_idp_item_path("idp1")))
        .and(query_param("api-version", API_VERSION))
        .and(header("authorization", "Bearer test-token"))
        .and(header_exists("x-ms-client-request-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sync_idp_json("idp1", "YWJj")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = client_for(&server).get(&test_parent(), "idp1").await.unwrap();
    assert_eq!(provider.name.as_deref(), Some("idp1"));
    assert_eq!(provider.properties.unwrap().resources.as_deref(), Some("YWJj"));
    let system_data = provider.system_data.unwrap();
    assert_eq!(system_data.created_by.as_deref(), Some("someone@example.com"));
    assert!(system_data.created_at.is_some());
}

#[tokio::test]
async fn test_create_or_update_strips_server_managed_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(sync_idp_item_path("idp1")))
        .and(header("content-type", "application/json; charset=utf-8"))
        .and(body_json(json!({ "properties": { "resources": "YWJj" } })))
        .respond_with(ResponseTemplate::new(201).set_body_json(sync_idp_json("idp1", "YWJj")))
        .expect(1)
        .mount(&server)
        .await;

    let body = SyncIdentityProvider {
        id: Some("stale-id".to_string()),
        name: Some("idp1".to_string()),
        resource_type: Some("ignored".to_string()),
        system_data: Some(SystemData::default()),
        ..SyncIdentityProvider::with_resources("YWJj")
    };
    let created = client_for(&server).create_or_update(&test_parent(), "idp1", &body).await.unwrap();
    assert_eq!(created.name.as_deref(), Some("idp1"));
}

#[tokio::test]
async fn test_update_sends_patch_without_system_data() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(sync_idp_item_path("idp1")))
        .and(body_json(json!({ "properties": { "resources": "bmV3" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(sync_idp_json("idp1", "bmV3")))
        .expect(1)
        .mount(&server)
        .await;

    let patch = SyncIdentityProviderUpdate {
        properties: Some(SyncIdentityProviderProperties {
            resources: Some("bmV3".to_string()),
        }),
        system_data: Some(SystemData {
            created_by: Some("client-side".to_string()),
            ..SystemData::default()
        }),
    };
    let updated = client_for(&server).update(&test_parent(), "idp1", &patch).await.unwrap();
    assert_eq!(updated.properties.unwrap().resources.as_deref(), Some("bmV3"));
}

#[tokio::test]
async fn test_delete_accepts_no_content() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(sync_idp_item_path("idp1")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server).delete(&test_parent(), "idp1").await.unwrap();
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(sync_idp_item_path("missing")))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(cloud_error("ResourceNotFound", "gone")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server).get(&test_parent(), "missing").await.unwrap_err();
    assert!(err.is_not_found());
    match err {
        ArmError::Server {
            code,
            message,
            ..
        } => {
            assert_eq!(code.as_deref(), Some("ResourceNotFound"));
            assert_eq!(message, "gone");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(sync_idp_item_path("idp1")))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(sync_idp_item_path("idp1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(sync_idp_json("idp1", "YWJj")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = client_for(&server).get(&test_parent(), "idp1").await.unwrap();
    assert_eq!(provider.name.as_deref(), Some("idp1"));
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(sync_idp_item_path("idp1")))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let err = client_for(&server).get(&test_parent(), "idp1").await.unwrap_err();
    assert!(matches!(
        err,
        ArmError::Server {
            kind: ServerErrorKind::Throttled,
            status: 429,
            ..
        }
    ));
}

#[tokio::test]
async fn test_no_retry_policy_fails_fast() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let options = ClientOptions {
        retry: RetryPolicy::none(),
        ..mock_client_options(&server.uri())
    };
    let client = SyncIdentityProvidersClient::for_sync_identity_providers(
        ArmClient::new(TEST_SUBSCRIPTION, options).unwrap(),
    );
    let err = client.get(&test_parent(), "idp1").await.unwrap_err();
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_invalid_identifiers_fail_before_any_request() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    let err = client.get(&test_parent(), "bad name").await.unwrap_err();
    assert!(matches!(err, ArmError::Validation { ref parameter, .. } if parameter == "childResourceName"));

    let parent = ParentIdentity::new(TEST_SUBSCRIPTION, "rg", "-cluster");
    let err = client.delete(&parent, "idp1").await.unwrap_err();
    assert!(matches!(err, ArmError::Validation { ref parameter, .. } if parameter == "resourceName"));

    let parent = ParentIdentity::new("", "rg", "cluster");
    let err = client.list(&parent).try_collect::<Vec<_>>().await.unwrap_err();
    assert!(matches!(err, ArmError::Validation { .. }));

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_follows_next_links() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(sync_idp_collection_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [sync_idp_json("a", "YQ==")],
            "nextLink": format!("{}/page-2?api-version={API_VERSION}", server.uri())
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [sync_idp_json("b", "Yg=="), sync_idp_json("c", "Yw==")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let providers: Vec<SyncIdentityProvider> =
        client_for(&server).list(&test_parent()).try_collect().await.unwrap();
    let names: Vec<_> = providers.iter().filter_map(|p| p.name.as_deref()).collect();
    assert_eq!(names, ["a", "b", "c"]);
}

#[tokio::test]
async fn test_empty_first_page_with_next_link_is_not_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(sync_idp_collection_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [],
            "nextLink": "/page-2"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page-2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "value": [sync_idp_json("a", "YQ==")] })),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let page = client.list_first_page(&test_parent()).await.unwrap();
    assert_eq!(page.items().len(), 1);
    assert!(!page.has_next_link());
    assert!(client.next_page(&page).await.unwrap().is_none());

    let all: Vec<_> = client.list(&test_parent()).try_collect().await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn test_list_error_on_later_page_surfaces() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(sync_idp_collection_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [sync_idp_json("a", "YQ==")],
            "nextLink": "/page-2"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page-2"))
        .respond_with(ResponseTemplate::new(403).set_body_json(cloud_error("AuthorizationFailed", "no")))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let parent = test_parent();
    let mut stream = client.list(&parent);
    let first = stream.try_next().await.unwrap().unwrap();
    assert_eq!(first.name.as_deref(), Some("a"));
    let err = stream.try_next().await.unwrap_err();
    assert!(matches!(
        err,
        ArmError::Server {
            kind: ServerErrorKind::Unauthorized,
            ..
        }
    ));
}

#[tokio::test]
async fn test_missing_registration_registers_provider_once() {
    let server = MockServer::start().await;
    let provider_path = format!("/subscriptions/{TEST_SUBSCRIPTION}/providers/Microsoft.RedHatOpenShift");

    Mock::given(method("GET"))
        .and(path(sync_idp_item_path("idp1")))
        .respond_with(ResponseTemplate::new(409).set_body_json(cloud_error(
            "MissingSubscriptionRegistration",
            "The subscription is not registered to use namespace 'Microsoft.RedHatOpenShift'",
        )))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{provider_path}/register")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "registrationState": "Registering" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(provider_path.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "registrationState": "Registering" })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(provider_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "registrationState": "Registered" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(sync_idp_item_path("idp1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(sync_idp_json("idp1", "YWJj")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = client_for(&server).get(&test_parent(), "idp1").await.unwrap();
    assert_eq!(provider.name.as_deref(), Some("idp1"));
}

#[tokio::test]
async fn test_missing_registration_without_auto_register() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(409).set_body_json(cloud_error(
            "MissingSubscriptionRegistration",
            "not registered",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let options = ClientOptions {
        register_providers: false,
        ..mock_client_options(&server.uri())
    };
    let client = SyncIdentityProvidersClient::for_sync_identity_providers(
        ArmClient::new(TEST_SUBSCRIPTION, options).unwrap(),
    );
    let err = client.get(&test_parent(), "idp1").await.unwrap_err();
    assert!(matches!(
        err,
        ArmError::Server {
            kind: ServerErrorKind::Conflict,
            ..
        }
    ));
}
