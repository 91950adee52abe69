#![allow(dead_code)]

use courtside::config::{admin::AdminConfig, site::SiteConfig, storage::StorageConfig};
use courtside::services::{
    login_limiter::LoginLimiter,
    places::PlacesService,
    storage::{LocalStorage, SharedStorage},
};
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::Client;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Once,
};
use std::time::Duration;
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration_test_jwt_secret_that_is_at_least_32_chars";
pub const ADMIN_PASSWORD: &str = "integration-admin-password";
pub const ADMIN_SESSION_SECRET: &str = "integration_test_admin_session_secret_32_chars";
pub const LOGIN_MAX_ATTEMPTS: usize = 3;

/// Smallest valid PNG header; enough for the magic-byte check.
pub const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

static INIT: Once = Once::new();
static MIGRATIONS_RAN: AtomicBool = AtomicBool::new(false);
static VENUE_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        std::env::set_var("AUTH_JWT_SECRET", JWT_SECRET);
        std::env::set_var("AUTH_JWT_AUDIENCE", "authenticated");
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
        std::env::remove_var("PLACES_API_KEY");
        let config = courtside::config::auth::AuthConfig::from_env().unwrap();
        let _ = courtside::utils::jwt::init_auth_config(config);
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.addr, path)
    }

    pub fn root_url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }
}

fn test_storage() -> SharedStorage {
    let dir = std::env::temp_dir().join("courtside-test-storage");
    Arc::new(LocalStorage::new(&StorageConfig {
        root_dir: dir.to_string_lossy().into_owned(),
        public_path: "/media".to_string(),
    }))
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_storage(test_storage()).await
}

/// Start the router on a random port with the given object storage.
pub async fn spawn_app_with_storage(storage: SharedStorage) -> TestApp {
    init_env();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"));

    let db = sea_orm::Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    if !MIGRATIONS_RAN.swap(true, Ordering::SeqCst) {
        courtside::migration::Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");
    }

    cleanup_tables(&db).await;

    let admin = AdminConfig {
        password: ADMIN_PASSWORD.to_string(),
        session_secret: ADMIN_SESSION_SECRET.to_string(),
        session_ttl_seconds: 3600,
        login_max_attempts: LOGIN_MAX_ATTEMPTS,
        login_window: Duration::from_secs(900),
    };
    let limiter = LoginLimiter::new(admin.login_max_attempts, admin.login_window);

    let app = courtside::routes::create_routes()
        .layer(axum::middleware::from_fn(
            courtside::middleware::security::security_headers_middleware,
        ))
        .layer(axum::extract::Extension(db.clone()))
        .layer(axum::extract::Extension(storage))
        .layer(axum::extract::Extension(PlacesService::new(None)))
        .layer(axum::extract::Extension(limiter))
        .layer(axum::extract::Extension(Arc::new(admin)))
        .layer(axum::extract::Extension(SiteConfig {
            site_url: "https://courts.test".to_string(),
        }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr: format!("http://{}", addr),
        db,
        client,
    }
}

async fn cleanup_tables(db: &DatabaseConnection) {
    let tables = [
        "favorites",
        "photos",
        "feedback",
        "submissions",
        "profiles",
        "venues",
    ];

    for table in tables {
        let sql = format!("TRUNCATE TABLE {} RESTART IDENTITY CASCADE", table);
        let _ = db
            .execute(Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                sql,
            ))
            .await;
    }
}

#[derive(serde::Serialize)]
struct TestClaims {
    sub: String,
    exp: usize,
    aud: String,
    email: String,
}

/// A fresh user id and an access token signed the way the auth provider does.
pub fn create_test_user() -> (Uuid, String) {
    let user_id = Uuid::new_v4();
    (user_id, token_for(user_id))
}

pub fn token_for(user_id: Uuid) -> String {
    let claims = TestClaims {
        sub: user_id.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        aud: "authenticated".to_string(),
        email: format!("{}@test.com", user_id.simple()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign test token")
}

/// Insert a venue directly and return (id, slug).
pub async fn create_test_venue(
    db: &DatabaseConnection,
    name: &str,
    suburb: &str,
    coords: Option<(f64, f64)>,
) -> (i32, String) {
    use courtside::models::venue;

    let n = VENUE_COUNTER.fetch_add(1, Ordering::SeqCst);
    let slug = format!("{}-{}", courtside::utils::slug::venue_slug(name, suburb), n);
    let now = chrono::Utc::now().naive_utc();

    let model = venue::ActiveModel {
        slug: Set(slug.clone()),
        name: Set(name.to_string()),
        suburb: Set(suburb.to_string()),
        region: Set("NSW".to_string()),
        latitude: Set(coords.map(|c| c.0)),
        longitude: Set(coords.map(|c| c.1)),
        court_type: Set("outdoor".to_string()),
        features: Set(serde_json::json!(["Lights"])),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert venue");

    (model.id, slug)
}

/// Sign in to the moderation console and return the `Cookie` header value.
pub async fn admin_login(app: &TestApp) -> String {
    let resp = app
        .client
        .post(app.url("/admin/login"))
        .json(&serde_json::json!({ "password": ADMIN_PASSWORD }))
        .send()
        .await
        .expect("Failed to log in as admin");
    assert_eq!(resp.status(), 200, "admin login failed");

    let set_cookie = resp
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("admin_session="))
        .expect("Login response missing admin_session cookie")
        .to_string();

    set_cookie
        .split(';')
        .next()
        .expect("Malformed Set-Cookie header")
        .to_string()
}

/// Create a pending submission as the given user and return its id.
pub async fn create_test_submission(app: &TestApp, token: &str, name: &str) -> i32 {
    let resp = app
        .client
        .post(app.url("/submissions"))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "name": name,
            "suburb": "Manly",
            "region": "NSW",
            "latitude": -33.797,
            "longitude": 151.288,
            "court_type": "outdoor",
            "court_count": 4,
            "features": ["Lights"]
        }))
        .send()
        .await
        .expect("Failed to create submission");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.expect("Failed to parse response");
    assert!(
        body["success"].as_bool().unwrap_or(false),
        "submission failed: status={}, body={}",
        status,
        body
    );
    body["data"]["id"].as_i64().expect("Response missing id") as i32
}
