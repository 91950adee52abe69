mod common;

use serde_json::Value;

const MANLY: (f64, f64) = (-33.797, 151.288);
const DEE_WHY: (f64, f64) = (-33.751, 151.287);
const FITZROY: (f64, f64) = (-37.798, 144.978);

async fn seed(app: &common::TestApp) -> (String, String, String) {
    let (_, manly) = common::create_test_venue(&app.db, "Manly Courts", "Manly", Some(MANLY)).await;
    let (_, dee_why) =
        common::create_test_venue(&app.db, "Dee Why Rec", "Dee Why", Some(DEE_WHY)).await;
    let (_, fitzroy) =
        common::create_test_venue(&app.db, "Fitzroy Pickleball", "Fitzroy", Some(FITZROY)).await;
    (manly, dee_why, fitzroy)
}

#[tokio::test]
async fn list_venues_with_filters() {
    let app = common::spawn_app().await;
    seed(&app).await;

    let resp = app.client.get(app.url("/venues")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 3);

    let resp = app
        .client
        .get(app.url("/venues?suburb=dee-why"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Dee Why Rec");
    assert_eq!(items[0]["features"][0], "Lights");

    let resp = app
        .client
        .get(app.url("/venues?q=pickle"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 1);

    let resp = app
        .client
        .get(app.url("/venues?court_type=underwater"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn nearby_sorts_by_distance_within_radius() {
    let app = common::spawn_app().await;
    seed(&app).await;

    let resp = app
        .client
        .get(app.url(&format!(
            "/venues/nearby?lat={}&lng={}&radius_km=20",
            MANLY.0, MANLY.1
        )))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2, "Fitzroy is outside the radius");
    assert_eq!(items[0]["name"], "Manly Courts");
    assert_eq!(items[1]["name"], "Dee Why Rec");
    let d0 = items[0]["distance_km"].as_f64().unwrap();
    let d1 = items[1]["distance_km"].as_f64().unwrap();
    assert!(d0 <= d1);
    assert!(d1 > 4.0 && d1 < 6.5);
}

#[tokio::test]
async fn nearby_rejects_bad_input() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .get(app.url("/venues/nearby?lat=95&lng=151"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = app
        .client
        .get(app.url("/venues/nearby?lat=-33.8&lng=151.2&radius_km=5000"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn venue_detail_includes_rating_and_neighbours() {
    let app = common::spawn_app().await;
    let (manly, _, _) = seed(&app).await;
    let (_, token) = common::create_test_user();

    let body: Value = app
        .client
        .get(app.url(&format!("/venues/{}", manly)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let venue_id = body["data"]["venue"]["id"].as_i64().unwrap();
    assert!(body["data"]["venue"]["community_rating"].is_null());

    for rating in [4, 5] {
        let resp = app
            .client
            .post(app.url(&format!("/venues/{}/feedback", venue_id)))
            .bearer_auth(&token)
            .json(&serde_json::json!({ "type": "review", "rating": rating }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    let resp = app
        .client
        .get(app.url(&format!("/venues/{}", manly)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let data = &body["data"];
    assert_eq!(data["venue"]["community_rating"]["average"], 4.5);
    assert_eq!(data["venue"]["community_rating"]["count"], 2);
    assert_eq!(data["photos"].as_array().unwrap().len(), 0);
    let nearby = data["nearby"].as_array().unwrap();
    assert_eq!(nearby.len(), 1);
    assert_eq!(nearby[0]["name"], "Dee Why Rec");
}

#[tokio::test]
async fn unknown_venue_is_404() {
    let app = common::spawn_app().await;
    let resp = app
        .client
        .get(app.url("/venues/no-such-venue"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn regions_index_and_detail() {
    let app = common::spawn_app().await;
    seed(&app).await;

    let body: Value = app
        .client
        .get(app.url("/regions"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let slugs: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs.len(), 3);
    assert!(slugs.contains(&"dee-why"));

    let resp = app
        .client
        .get(app.url("/regions/manly"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["suburb"]["name"], "Manly");
    assert_eq!(body["data"]["venues"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["neighbours"][0]["suburb"]["slug"], "dee-why");

    let resp = app
        .client
        .get(app.url("/regions/atlantis"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn heatmap_counts_every_located_venue() {
    let app = common::spawn_app().await;
    seed(&app).await;
    common::create_test_venue(&app.db, "Somewhere Courts", "Nowhere", None).await;

    let resp = app
        .client
        .get(app.url("/heatmap?grid=10"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["resolution"], 10);
    assert_eq!(body["data"]["total"], 3);
    let cells = body["data"]["cells"].as_array().unwrap();
    let counted: i64 = cells.iter().map(|c| c["count"].as_i64().unwrap()).sum();
    assert_eq!(counted, 3);

    let resp = app
        .client
        .get(app.url("/heatmap?grid=0"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = app
        .client
        .get(app.url("/heatmap?min_lat=-34"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn suggest_ranks_prefix_before_substring() {
    let app = common::spawn_app().await;
    seed(&app).await;
    common::create_test_venue(&app.db, "North Manly Rec", "Queenscliff", Some((-33.78, 151.28)))
        .await;

    let resp = app
        .client
        .get(app.url("/suggest?q=manly"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let labels: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["label"].as_str().unwrap())
        .collect();
    assert_eq!(labels, vec!["Manly", "Manly Courts", "North Manly Rec"]);

    // Empty query: popular suburbs first, then unrated venues fill the rest
    let body: Value = app
        .client
        .get(app.url("/suggest?limit=4"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let picks = body["data"].as_array().unwrap();
    assert_eq!(picks.len(), 4);
    let kinds: Vec<&str> = picks.iter().map(|p| p["kind"].as_str().unwrap()).collect();
    assert_eq!(kinds, vec!["region", "region", "region", "region"]);
}

#[tokio::test]
async fn sitemap_and_robots() {
    let app = common::spawn_app().await;
    let (manly, _, _) = seed(&app).await;

    let resp = app
        .client
        .get(app.root_url("/sitemap.xml"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let content_type = resp.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("application/xml"));
    let xml = resp.text().await.unwrap();
    assert!(xml.contains(&format!("https://courts.test/courts/{}", manly)));
    assert!(xml.contains("https://courts.test/regions/fitzroy"));

    let robots = app
        .client
        .get(app.root_url("/robots.txt"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(robots.contains("Sitemap: https://courts.test/sitemap.xml"));
}

#[tokio::test]
async fn places_endpoints_report_unconfigured_provider() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .get(app.url("/places/autocomplete?input=manly"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);

    let resp = app
        .client
        .get(app.url("/places/autocomplete?input=%20"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}
