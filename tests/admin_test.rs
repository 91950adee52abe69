mod common;

use serde_json::Value;

async fn try_login(app: &common::TestApp, password: &str) -> reqwest::Response {
    app.client
        .post(app.url("/admin/login"))
        .json(&serde_json::json!({ "password": password }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn login_sets_http_only_session_cookie() {
    let app = common::spawn_app().await;

    let resp = try_login(&app, common::ADMIN_PASSWORD).await;
    assert_eq!(resp.status(), 200);
    let cookie = resp
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("admin_session="))
        .expect("missing admin_session cookie")
        .to_string();
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age=3600"));

    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["expires_at"].as_i64().unwrap() > chrono::Utc::now().timestamp());
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = common::spawn_app().await;

    let resp = try_login(&app, "letmein").await;
    assert_eq!(resp.status(), 401);
    assert!(resp.headers().get(reqwest::header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn repeated_failures_lock_out_the_client() {
    let app = common::spawn_app().await;

    for _ in 0..common::LOGIN_MAX_ATTEMPTS {
        assert_eq!(try_login(&app, "wrong").await.status(), 401);
    }

    // Even the right password is refused while locked out
    let resp = try_login(&app, common::ADMIN_PASSWORD).await;
    assert_eq!(resp.status(), 429);
    assert!(resp.headers().get(reqwest::header::RETRY_AFTER).is_some());
}

#[tokio::test]
async fn successful_login_clears_failure_count() {
    let app = common::spawn_app().await;

    for _ in 0..common::LOGIN_MAX_ATTEMPTS - 1 {
        assert_eq!(try_login(&app, "wrong").await.status(), 401);
    }
    assert_eq!(try_login(&app, common::ADMIN_PASSWORD).await.status(), 200);

    for _ in 0..common::LOGIN_MAX_ATTEMPTS - 1 {
        assert_eq!(try_login(&app, "wrong").await.status(), 401);
    }
    assert_eq!(try_login(&app, common::ADMIN_PASSWORD).await.status(), 200);
}

#[tokio::test]
async fn console_requires_valid_session() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .get(app.url("/admin/stats"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = app
        .client
        .get(app.url("/admin/stats"))
        .header("Cookie", "admin_session=9999999999.forged")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // A user access token does not open the console
    let (_, token) = common::create_test_user();
    let resp = app
        .client
        .get(app.url("/admin/submissions"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn stats_reflect_directory_state() {
    let app = common::spawn_app().await;
    let (venue_id, _) =
        common::create_test_venue(&app.db, "Manly Courts", "Manly", Some((-33.797, 151.288))).await;
    common::create_test_venue(&app.db, "Dee Why Rec", "Dee Why", None).await;
    let (_, token) = common::create_test_user();
    common::create_test_submission(&app, &token, "Harbour Pickleball").await;

    let resp = app
        .client
        .post(app.url(&format!("/venues/{}/feedback", venue_id)))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "type": "correction",
            "correction_type": "wrong_location",
            "details": "Courts are behind the surf club"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let cookie = common::admin_login(&app).await;
    let resp = app
        .client
        .get(app.url("/admin/stats"))
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let stats = &body["data"];
    assert_eq!(stats["total_venues"], 2);
    assert_eq!(stats["geocoded_venues"], 1);
    assert_eq!(stats["pending_submissions"], 1);
    assert_eq!(stats["active_feedback"], 1);
    assert_eq!(stats["open_corrections"], 1);
    assert_eq!(stats["feedback_today"], 1);
    assert_eq!(stats["hidden_photos"], 0);
}

#[tokio::test]
async fn unknown_filter_values_are_rejected() {
    let app = common::spawn_app().await;
    let cookie = common::admin_login(&app).await;

    for path in [
        "/admin/submissions?status=maybe",
        "/admin/feedback?kind=rant",
        "/admin/photos?status=deleted",
    ] {
        let resp = app
            .client
            .get(app.url(path))
            .header("Cookie", &cookie)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "{} should be rejected", path);
    }
}

#[tokio::test]
async fn logout_clears_cookie() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/admin/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let cleared = resp
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with("admin_session=;") && v.contains("Max-Age=0"));
    assert!(cleared);
}

#[tokio::test]
async fn enrich_without_places_provider_is_bad_gateway() {
    let app = common::spawn_app().await;
    let (venue_id, _) = common::create_test_venue(&app.db, "Manly Courts", "Manly", None).await;
    let cookie = common::admin_login(&app).await;

    let resp = app
        .client
        .post(app.url(&format!("/admin/venues/{}/enrich", venue_id)))
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);

    let resp = app
        .client
        .post(app.url("/admin/venues/999999/enrich"))
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
