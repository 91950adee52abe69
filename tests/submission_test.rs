mod common;

use serde_json::Value;

#[tokio::test]
async fn submission_requires_auth() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/submissions"))
        .json(&serde_json::json!({
            "name": "Anon Courts",
            "suburb": "Manly",
            "region": "NSW",
            "court_type": "outdoor"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn submission_validation() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user();

    // Half a coordinate
    let resp = app
        .client
        .post(app.url("/submissions"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "name": "Half Located",
            "suburb": "Manly",
            "region": "NSW",
            "latitude": -33.8,
            "court_type": "outdoor"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Empty name
    let resp = app
        .client
        .post(app.url("/submissions"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "name": "",
            "suburb": "Manly",
            "region": "NSW",
            "court_type": "outdoor"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn approve_creates_venue_once() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user();
    let submission_id = common::create_test_submission(&app, &token, "Harbour Pickleball").await;
    let cookie = common::admin_login(&app).await;

    // Pending submissions are listed for review
    let body: Value = app
        .client
        .get(app.url("/admin/submissions?status=pending"))
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["status"], "pending");

    let resp = app
        .client
        .post(app.url(&format!("/admin/submissions/{}/approve", submission_id)))
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["submission"]["status"], "approved");
    let slug = body["data"]["venue"]["slug"].as_str().unwrap().to_string();
    assert_eq!(slug, "harbour-pickleball-manly");
    assert_eq!(
        body["data"]["submission"]["venue_id"],
        body["data"]["venue"]["id"]
    );

    // The venue is now public
    let resp = app
        .client
        .get(app.url(&format!("/venues/{}", slug)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // A second approval is a conflict and creates nothing
    let resp = app
        .client
        .post(app.url(&format!("/admin/submissions/{}/approve", submission_id)))
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    let body: Value = app
        .client
        .get(app.url("/venues"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn concurrent_approvals_create_one_venue() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user();
    let submission_id = common::create_test_submission(&app, &token, "Race Courts").await;
    let cookie = common::admin_login(&app).await;

    let url = app.url(&format!("/admin/submissions/{}/approve", submission_id));
    let (a, b) = tokio::join!(
        app.client.post(&url).header("Cookie", &cookie).send(),
        app.client.post(&url).header("Cookie", &cookie).send(),
    );
    let mut statuses = vec![a.unwrap().status().as_u16(), b.unwrap().status().as_u16()];
    statuses.sort();
    assert_eq!(statuses, vec![200, 409]);

    let body: Value = app
        .client
        .get(app.url("/venues"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn duplicate_names_get_unique_slugs() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user();
    let first = common::create_test_submission(&app, &token, "Twin Courts").await;
    let second = common::create_test_submission(&app, &token, "Twin Courts").await;
    let cookie = common::admin_login(&app).await;

    let mut slugs = Vec::new();
    for id in [first, second] {
        let body: Value = app
            .client
            .post(app.url(&format!("/admin/submissions/{}/approve", id)))
            .header("Cookie", &cookie)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        slugs.push(body["data"]["venue"]["slug"].as_str().unwrap().to_string());
    }
    assert_eq!(slugs, vec!["twin-courts-manly", "twin-courts-manly-2"]);
}

#[tokio::test]
async fn reject_stores_reason_and_is_terminal() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user();
    let submission_id = common::create_test_submission(&app, &token, "Dubious Courts").await;
    let cookie = common::admin_login(&app).await;

    let resp = app
        .client
        .post(app.url(&format!("/admin/submissions/{}/reject", submission_id)))
        .header("Cookie", &cookie)
        .json(&serde_json::json!({ "reason": "Private club <i>only</i>" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["status"], "rejected");
    assert_eq!(body["data"]["rejection_reason"], "Private club only");

    let resp = app
        .client
        .post(app.url(&format!("/admin/submissions/{}/approve", submission_id)))
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    let resp = app
        .client
        .post(app.url("/admin/submissions/999999/reject"))
        .header("Cookie", &cookie)
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
