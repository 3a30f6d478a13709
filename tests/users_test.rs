//! Contract tests for the users and notifications services.

use cas_client::models::users::{ProfileUpdate, Role, UserStatus};
use cas_client::services::Platform;
use cas_client::services::users::UsersService;
use cas_client::{CasClient, ClientConfig};
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(server: &MockServer) -> CasClient {
    let config = ClientConfig::new(server.uri().parse().unwrap()).with_token("test-token");
    CasClient::new(&config).unwrap()
}

fn user_json(id: u64, name: &str, roles: &[&str]) -> Value {
    json!({
        "id": id,
        "email": format!("user{id}@example.org"),
        "nombreMostrar": name,
        "roles": roles,
        "estado": "ACTIVO",
        "perfilCompleto": true,
        "_links": {"self": {"href": format!("/api/usuarios/{id}")}}
    })
}

// ── Users ────────────────────────────────────────────────────────────

#[tokio::test]
async fn me_returns_the_signed_in_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/usuarios/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(1, "Ana García", &["DIRIGENTE"])))
        .expect(1)
        .mount(&server)
        .await;

    let user = test_client(&server).users().me().await.unwrap().into_data();
    assert_eq!(user.first_name(), "Ana");
    assert!(user.has_role(Role::Leader));
    assert_eq!(user.status, UserStatus::Active);
}

#[tokio::test]
async fn update_my_profile_posts_only_present_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/usuarios/onboarding"))
        .and(body_json(json!({"telefono": "+54 11 5555-0000", "dni": "30111222"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let update = ProfileUpdate {
        phone: Some("+54 11 5555-0000".into()),
        dni: Some("30111222".into()),
        ..ProfileUpdate::default()
    };
    test_client(&server)
        .users()
        .update_my_profile(&update)
        .await
        .unwrap();
}

#[tokio::test]
async fn list_all_prefers_the_discovered_link() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "mensaje": "ok",
            "_links": {"usuarios": {"href": "/api/admin/usuarios"}}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/usuarios"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": {"usuarioModelList": [user_json(1, "Ana", &["ADMIN"])]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    client.api().discover_api().await.unwrap();
    let collection = client.users().list_all().await.unwrap().into_data();
    assert_eq!(UsersService::extract_users(&collection).len(), 1);
}

#[tokio::test]
async fn list_all_falls_back_to_the_well_known_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/usuarios"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": {"usuarioModelList": [
                user_json(1, "Ana", &["ADMIN"]),
                user_json(2, "Bruno", &["ACAMPANTE"])
            ]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let collection = client.users().list_all().await.unwrap().into_data();
    let users = UsersService::extract_users(&collection);
    assert_eq!(users.len(), 2);
    assert!(users[1].has_role(Role::Camper));
}

#[tokio::test]
async fn search_encodes_the_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/usuarios/busqueda"))
        .and(query_param("q", "ana garcía"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    test_client(&server).users().search("ana garcía").await.unwrap();
}

#[tokio::test]
async fn role_listings_use_their_paths() {
    let server = MockServer::start().await;
    for p in [
        "/api/usuarios/dirigentes",
        "/api/usuarios/acampantes",
        "/api/usuarios/por-rol/PADRE",
    ] {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
    }

    let users = test_client(&server);
    users.users().list_leaders().await.unwrap();
    users.users().list_campers().await.unwrap();
    users.users().list_by_role(Role::Parent).await.unwrap();
}

#[tokio::test]
async fn statistics_decodes_totals() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/usuarios/estadisticas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalUsuarios": 40,
            "totalActivos": 35,
            "totalInactivos": 2,
            "totalPendientes": 3,
            "totalAdmins": 1,
            "totalDirigentes": 6,
            "totalAcampantes": 25,
            "totalPadres": 8
        })))
        .expect(1)
        .mount(&server)
        .await;

    let stats = test_client(&server)
        .users()
        .statistics()
        .await
        .unwrap()
        .into_data();
    assert_eq!(stats.total, 40);
    assert_eq!(stats.campers, 25);
}

#[tokio::test]
async fn assign_and_remove_roles() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/usuarios/2/roles/DIRIGENTE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(2, "Bruno", &["ACAMPANTE", "DIRIGENTE"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/usuarios/2/roles/ACAMPANTE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let user = client
        .users()
        .assign_role(2, Role::Leader)
        .await
        .unwrap()
        .into_data();
    assert!(user.has_role(Role::Leader));
    client.users().remove_role(2, Role::Camper).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].body.is_empty());
}

#[tokio::test]
async fn update_status_patches_estado() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/usuarios/2/estado"))
        .and(body_json(json!({"estado": "SUSPENDIDO"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 2,
            "email": "user2@example.org",
            "nombreMostrar": "Bruno",
            "roles": ["ACAMPANTE"],
            "estado": "SUSPENDIDO"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let user = test_client(&server)
        .users()
        .update_status(2, UserStatus::Suspended)
        .await
        .unwrap()
        .into_data();
    assert_eq!(user.status, UserStatus::Suspended);
}

#[tokio::test]
async fn roles_catalogue() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/roles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": {"rolModelList": [
                {"nombre": "ADMIN", "descripcion": "Administrador"},
                {"nombre": "DIRIGENTE", "descripcion": "Dirigente scout"}
            ]}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/roles/PADRE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nombre": "PADRE",
            "descripcion": "Padre o tutor"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let collection = client.users().list_roles().await.unwrap().into_data();
    let roles = UsersService::extract_roles(&collection);
    assert_eq!(roles.len(), 2);
    assert_eq!(roles[1].description, "Dirigente scout");

    let role = client.users().get_role(Role::Parent).await.unwrap().into_data();
    assert_eq!(role.name, "PADRE");
}

// ── Notifications ────────────────────────────────────────────────────

#[tokio::test]
async fn register_current_device_detects_platform() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/notificaciones/registrar-dispositivo"))
        .and(body_json(json!({"token": "fcm-token-1", "platform": "android"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    test_client(&server)
        .notifications()
        .register_current_device("fcm-token-1", "Mozilla/5.0 (Linux; Android 14; Pixel 8)")
        .await
        .unwrap();
}

#[tokio::test]
async fn register_without_platform_sends_only_the_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/notificaciones/registrar-dispositivo"))
        .and(body_json(json!({"token": "fcm-token-2"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    test_client(&server)
        .notifications()
        .register_device_token("fcm-token-2", None)
        .await
        .unwrap();
    assert_eq!(Platform::detect("Mozilla/5.0 (X11; Linux x86_64)").as_str(), "linux");
}

#[tokio::test]
async fn unregister_device_token_deletes_by_query() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/device-tokens"))
        .and(query_param("token", "fcm token/3"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    test_client(&server)
        .notifications()
        .unregister_device_token("fcm token/3")
        .await
        .unwrap();
}
