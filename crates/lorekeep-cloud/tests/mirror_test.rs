//! Cloud mirror tests
//!
//! Runs the mirror against a mock Supabase storage server.

use lorekeep_cloud::store::LIST_LIMIT;
use lorekeep_cloud::{CloudConfig, CloudMirror, Session};
use lorekeep_core::storage::legacy::LEGACY_DATA_VERSION;
use lorekeep_core::sync::{Hydration, LiveState, StateSync};
use lorekeep_core::{CampaignRecord, LocalStore, CURRENT_CAMPAIGN_ID};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, body_partial_json, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER: &str = "user-42";
const TOKEN: &str = "access-token";
const KEY: &str = "anon-key";

fn session() -> Session {
    Session::new(USER, TOKEN)
}

fn seeded_store() -> LocalStore {
    let store = LocalStore::in_memory();
    store
        .save_campaign(&CampaignRecord::current(
            "Dragon Heist",
            json!({"campaignName": "Dragon Heist", "npcs": [{"name": "Volo"}]}),
        ))
        .unwrap();
    store
}

fn mirror(server: &MockServer, store: LocalStore) -> CloudMirror {
    let config = CloudConfig::new(server.uri(), KEY);
    CloudMirror::from_config(store, &config, Some(session())).unwrap()
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.map_or(0, |r| r.len())
}

#[tokio::test]
async fn test_unconfigured_upload_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    // URL present but no key
    let config = CloudConfig {
        url: Some(server.uri()),
        api_key: None,
        ..CloudConfig::default()
    };
    let mirror = CloudMirror::from_config(seeded_store(), &config, Some(session())).unwrap();
    assert!(!mirror.is_configured());
    assert!(mirror.is_signed_in());

    let response = mirror.upload(Some("nightly")).await;

    assert!(!response.success);
    assert_eq!(response.error.as_deref(), Some("Cloud storage is not configured"));
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_signed_out_list_makes_no_requests() {
    let server = MockServer::start().await;
    let config = CloudConfig::new(server.uri(), KEY);
    let mirror = CloudMirror::from_config(LocalStore::in_memory(), &config, None).unwrap();
    assert!(mirror.is_configured());
    assert!(!mirror.is_signed_in());

    let response = mirror.list().await;

    assert!(!response.success);
    assert_eq!(
        response.error.as_deref(),
        Some("You must be signed in to use cloud backups")
    );
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_upload_without_campaign_is_rejected() {
    let server = MockServer::start().await;
    let response = mirror(&server, LocalStore::in_memory()).upload(None).await;

    assert!(!response.success);
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_upload_posts_pretty_campaign_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(
            r"^/storage/v1/object/campaign-backups/user-42/campaign-backup-\d{4}-\d{2}-\d{2}T\d{2}-\d{2}-\d{2}-\d{3}Z-my-backup-2024\.json$",
        ))
        .and(header("apikey", KEY))
        .and(header("Authorization", "Bearer access-token"))
        .and(header("x-upsert", "false"))
        .and(body_json(json!({"campaignName": "Dragon Heist", "npcs": [{"name": "Volo"}]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Key": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let uploaded = mirror(&server, seeded_store())
        .upload(Some("My Backup!! 2024"))
        .await
        .into_result()
        .unwrap();

    assert_eq!(uploaded.name, "my-backup-2024");
    assert!(uploaded.file_name.starts_with("user-42/campaign-backup-"));
    assert!(uploaded.size > 0);
}

#[tokio::test]
async fn test_upload_conflict_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "statusCode": "409",
            "error": "Duplicate",
            "message": "The resource already exists"
        })))
        .mount(&server)
        .await;

    let response = mirror(&server, seeded_store()).upload(None).await;

    assert!(!response.success);
    let error = response.error.unwrap();
    assert!(error.contains("409"), "{error}");
    assert!(error.contains("The resource already exists"), "{error}");
}

#[tokio::test]
async fn test_list_labels_and_orders_backups() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/object/list/campaign-backups"))
        .and(body_partial_json(json!({
            "prefix": USER,
            "sortBy": {"column": "created_at", "order": "desc"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "name": "campaign-backup-2024-03-01T10-15-30-123Z.json",
                "created_at": "2024-03-01T10:15:30.123Z",
                "updated_at": "2024-03-01T10:15:30.123Z",
                "metadata": {"size": 120}
            },
            {
                "name": "campaign-backup-2024-03-02T08-00-00-000Z-before-the-vault.json",
                "created_at": "2024-03-02T08:00:00.000Z",
                "updated_at": "2024-03-02T08:00:00.000Z",
                "metadata": {"size": 300}
            },
            {"name": "notes.txt", "created_at": "2024-03-03T00:00:00Z", "metadata": {"size": 1}}
        ])))
        .mount(&server)
        .await;

    let backups = mirror(&server, LocalStore::in_memory())
        .list()
        .await
        .into_result()
        .unwrap();

    assert_eq!(backups.len(), 2);
    assert_eq!(backups[0].name, "before-the-vault");
    assert_eq!(backups[0].size, 300);
    assert_eq!(backups[1].name, "2024-03-01 10:15:30");
    assert_eq!(
        backups[1].file_name,
        "user-42/campaign-backup-2024-03-01T10-15-30-123Z.json"
    );
}

#[tokio::test]
async fn test_list_follows_pages_until_short_page() {
    let server = MockServer::start().await;
    let full_page: Vec<_> = (0..LIST_LIMIT)
        .map(|i| {
            json!({
                "name": format!("campaign-backup-2024-01-01T00-00-00-000Z-session-{i}.json"),
                "created_at": "2024-01-01T00:00:00Z",
                "metadata": {"size": 10}
            })
        })
        .collect();
    Mock::given(method("POST"))
        .and(path("/storage/v1/object/list/campaign-backups"))
        .and(body_partial_json(json!({"offset": 0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(full_page))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/object/list/campaign-backups"))
        .and(body_partial_json(json!({"offset": LIST_LIMIT})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "name": "campaign-backup-2023-12-31T00-00-00-000Z-oldest.json",
            "created_at": "2023-12-31T00:00:00Z",
            "metadata": {"size": 10}
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let backups = mirror(&server, LocalStore::in_memory())
        .list()
        .await
        .into_result()
        .unwrap();

    assert_eq!(backups.len(), LIST_LIMIT as usize + 1);
    assert_eq!(backups.last().unwrap().name, "oldest");
}

#[tokio::test]
async fn test_restore_overwrites_current_campaign() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(
            "/storage/v1/object/authenticated/campaign-backups/user-42/remote.json",
        ))
        .and(header("Authorization", "Bearer access-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "campaignName": "Rime of the Frostmaiden",
            "quests": [{"title": "Cold-Hearted Killer"}]
        })))
        .mount(&server)
        .await;

    let store = seeded_store();
    let restored = mirror(&server, store.clone())
        .restore("remote.json")
        .await
        .into_result()
        .unwrap();

    let current = store.get_campaign(CURRENT_CAMPAIGN_ID).unwrap().unwrap();
    assert_eq!(restored.name, "Rime of the Frostmaiden");
    assert_eq!(current.data["quests"][0]["title"], "Cold-Hearted Killer");
    assert!(current.data.get("npcs").is_none());
    assert_eq!(current.version, LEGACY_DATA_VERSION);

    // The unversioned remote data is brought up to date on the next load
    let state = LiveState::new();
    let outcome = StateSync::new(store, state.clone()).hydrate().unwrap();
    assert_eq!(
        outcome,
        Hydration::Migrated {
            from: LEGACY_DATA_VERSION.to_string()
        }
    );
    assert_eq!(state.get("npcs"), Some(json!([])));
    assert_eq!(state.get("quests"), Some(json!([{"title": "Cold-Hearted Killer"}])));
}

#[tokio::test]
async fn test_restore_rejects_non_object_backup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"name": "Rictavio"}])))
        .mount(&server)
        .await;

    let store = seeded_store();
    let response = mirror(&server, store.clone()).restore("npcs.json").await;

    assert!(!response.success);
    assert!(response.error.unwrap().contains("does not hold campaign data"));
    let current = store.get_campaign(CURRENT_CAMPAIGN_ID).unwrap().unwrap();
    assert_eq!(current.name, "Dragon Heist");
}

#[tokio::test]
async fn test_download_rejects_invalid_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let store = seeded_store();
    let response = mirror(&server, store.clone()).restore("broken.json").await;

    assert!(!response.success);
    let current = store.get_campaign(CURRENT_CAMPAIGN_ID).unwrap().unwrap();
    assert_eq!(current.name, "Dragon Heist");
}

#[tokio::test]
async fn test_delete_sends_prefixes() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/storage/v1/object/campaign-backups"))
        .and(body_json(json!({"prefixes": ["user-42/old.json"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let store = seeded_store();
    let response = mirror(&server, store.clone()).delete("user-42/old.json").await;

    assert!(response.success);
    assert!(store.get_campaign(CURRENT_CAMPAIGN_ID).unwrap().is_some());
}

#[tokio::test]
async fn test_other_users_folder_is_refused() {
    let server = MockServer::start().await;
    let response = mirror(&server, seeded_store()).delete("user-7/old.json").await;

    assert!(!response.success);
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_export_writes_remote_backup_to_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(
            "/storage/v1/object/authenticated/campaign-backups/user-42/remote.json",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\n  \"npcs\": []\n}"))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let dest = temp_dir.path().join("remote-copy.json");

    let written = mirror(&server, LocalStore::in_memory())
        .export_to_file("remote.json", &dest)
        .await
        .into_result()
        .unwrap();

    assert_eq!(written, dest);
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "{\n  \"npcs\": []\n}");
}
