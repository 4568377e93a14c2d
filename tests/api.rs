use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use seatmap_service::{app, config::Config, AppState};
use tower::ServiceExt;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn router_for(server: &MockServer) -> Router {
    let base = format!("{}/api", server.uri());
    let config = Config::from_lookup(|key| match key {
        "UPSTREAM_API_URL" => Some(base.clone()),
        "ENABLE_POSITION_CACHE" => Some("false".to_string()),
        _ => None,
    })
    .unwrap();
    app(AppState::with_cache(config, None).unwrap())
}

async fn call(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => request.body(Body::from(body.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn mount_positions(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/pcrooms/seatInfo/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "pcroomId": "3", "seatsNum": 1, "x": 1, "y": 1 },
            { "pcroomId": "3", "seatsNum": 2, "x": 2, "y": 1 }
        ])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn seat_map_merges_status_in_position_order() {
    let server = MockServer::start().await;
    mount_positions(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/pcrooms/3/seat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "seatsNum": 1, "result": true }])))
        .mount(&server)
        .await;

    let (status, body) = call(&router_for(&server), "GET", "/api/pcrooms/3/seat-map", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["seats"][0]["seatNumber"], 1);
    assert_eq!(body["seats"][0]["status"], "occupied");
    assert_eq!(body["seats"][1]["status"], "available");
    assert_eq!(body["seats"][1]["pixelX"], 40);
    assert_eq!(body["width"], 80);
    assert_eq!(body["height"], 40);
    assert_eq!(body["statusAvailable"], true);
}

#[tokio::test]
async fn failed_status_feed_degrades_to_available() {
    let server = MockServer::start().await;
    mount_positions(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/pcrooms/3/seat"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (status, body) = call(&router_for(&server), "GET", "/api/pcrooms/3/seat-map", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["seats"].as_array().unwrap().len(), 2);
    assert_eq!(body["seats"][0]["status"], "available");
    assert_eq!(body["positionsAvailable"], true);
    assert_eq!(body["statusAvailable"], false);
}

#[tokio::test]
async fn failed_position_feed_renders_empty_map() {
    let server = MockServer::start().await;

    let (status, body) = call(&router_for(&server), "GET", "/api/pcrooms/3/seat-map", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["seats"], json!([]));
    assert_eq!(body["width"], 0);
    assert_eq!(body["positionsAvailable"], false);
}

#[tokio::test]
async fn usage_map_carries_opacity_and_legend() {
    let server = MockServer::start().await;
    mount_positions(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/pcroom/seat-usage-daily/3/range-with-info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "seatId": 1, "seatNum": 2, "seatsIp": "", "x": 2, "y": 1, "usedPercent": 50.0, "date": "2026-10-01" }
        ])))
        .mount(&server)
        .await;

    let (status, body) = call(
        &router_for(&server),
        "GET",
        "/api/pcrooms/3/usage-map?startDate=2026-10-01&endDate=2026-10-01",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["seats"][0]["usedPercent"], 0.0);
    assert_eq!(body["seats"][0]["opacity"], 0.1);
    assert_eq!(body["seats"][1]["usedPercent"], 50.0);
    assert_eq!(body["seats"][1]["opacity"], 0.5);
    assert_eq!(body["legend"], json!([0, 25, 50, 75, 100]));
}

#[tokio::test]
async fn usage_map_rejects_inverted_range() {
    let server = MockServer::start().await;
    let (status, body) = call(
        &router_for(&server),
        "GET",
        "/api/pcrooms/3/usage-map?startDate=2026-10-05&endDate=2026-10-01",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn editor_session_flow() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pcrooms"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/pcrooms/seats"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    let router = router_for(&server);

    let draft = json!({ "name": "Arena", "seatCount": 3, "port": 7000, "width": 2, "height": 2 });
    let (status, session) = call(&router, "POST", "/api/layouts", Some(json!({ "draft": draft }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(session["seats"].as_array().unwrap().len(), 3);
    let sid = session["id"].as_str().unwrap().to_string();

    // ячейка (2, 1) занята местом 2
    let (status, drag) = call(&router, "POST", &format!("/api/layouts/{sid}/seats/1/drag"), Some(json!({ "x": 62.0, "y": 4.0 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(drag["accepted"], false);
    assert_eq!(drag["reason"], "occupied");

    let (_, drag) = call(&router, "POST", &format!("/api/layouts/{sid}/seats/1/drag"), Some(json!({ "x": 58.0, "y": 61.0 }))).await;
    assert_eq!(drag["accepted"], true);
    assert_eq!(drag["seat"]["column"], 2);
    assert_eq!(drag["seat"]["row"], 2);

    let (status, prompt) = call(&router, "POST", &format!("/api/layouts/{sid}/seats/2/prompt"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(prompt["current"], "");

    let (status, body) = call(&router, "PUT", &format!("/api/layouts/{sid}/prompt"), Some(json!({ "value": "nope" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INVALID_IDENTIFIER");

    let (status, seat) = call(&router, "PUT", &format!("/api/layouts/{sid}/prompt"), Some(json!({ "value": "10.1.1.2" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(seat["identifier"], "10.1.1.2");

    let (status, submitted) = call(&router, "POST", &format!("/api/layouts/{sid}/submit"), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(submitted["submittedSeats"], 3);

    let (status, _) = call(&router, "GET", &format!("/api/layouts/{sid}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn incomplete_draft_cannot_be_submitted() {
    let server = MockServer::start().await;
    let router = router_for(&server);

    let draft = json!({ "name": "", "seatCount": 2, "width": 2, "height": 1 });
    let (_, session) = call(&router, "POST", "/api/layouts", Some(json!({ "draft": draft }))).await;
    let sid = session["id"].as_str().unwrap().to_string();

    let (status, body) = call(&router, "POST", &format!("/api/layouts/{sid}/submit"), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_FAILED");

    // сеанс остаётся открытым
    let (status, _) = call(&router, "GET", &format!("/api/layouts/{sid}"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn second_submit_while_first_is_in_flight_conflicts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pcrooms"))
        .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/pcrooms/seats"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    let router = router_for(&server);

    let draft = json!({ "name": "Arena", "seatCount": 2, "port": 7000, "width": 2, "height": 1 });
    let (_, session) = call(&router, "POST", "/api/layouts", Some(json!({ "draft": draft }))).await;
    let sid = session["id"].as_str().unwrap().to_string();
    let submit = format!("/api/layouts/{sid}/submit");
    let drag = format!("/api/layouts/{sid}/seats/1/drag");

    let (first, second, edit) = tokio::join!(
        call(&router, "POST", &submit, None),
        call(&router, "POST", &submit, None),
        call(&router, "POST", &drag, Some(json!({ "x": 0.0, "y": 60.0 }))),
    );
    let mut statuses = [first.0, second.0];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);
    let rejected = if first.0 == StatusCode::CONFLICT { &first.1 } else { &second.1 };
    assert_eq!(rejected["code"], "SESSION_SUBMITTING");
    assert_eq!(edit.0, StatusCode::CONFLICT);

    let (status, _) = call(&router, "GET", &format!("/api/layouts/{sid}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn oversized_draft_opens_empty_and_is_not_submitted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    let router = router_for(&server);

    let draft = json!({ "name": "Huge", "seatCount": 2_000_000_000i64, "port": 7000, "width": 100_000, "height": 100_000 });
    let (status, session) = call(&router, "POST", "/api/layouts", Some(json!({ "draft": draft }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(session["seats"], json!([]));
    assert_eq!(session["generation"]["placed"], 0);
    let sid = session["id"].as_str().unwrap().to_string();

    let (status, body) = call(&router, "POST", &format!("/api/layouts/{sid}/submit"), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn open_session_no_longer_accepts_venue_id() {
    let server = MockServer::start().await;
    let router = router_for(&server);

    let (status, _) = call(&router, "POST", "/api/layouts", Some(json!({ "draft": {}, "venueId": 3 }))).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn pinch_zoom_is_kept_per_venue_map() {
    let server = MockServer::start().await;
    mount_positions(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/pcrooms/3/seat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    let router = router_for(&server);
    let touches = |distance: f64| json!([{ "clientX": 0.0, "clientY": 0.0 }, { "clientX": distance, "clientY": 0.0 }]);

    let (status, started) = call(
        &router,
        "POST",
        "/api/pcrooms/3/seat-map/gesture",
        Some(json!({ "phase": "start", "touches": touches(100.0) })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["consumed"], true);
    assert_eq!(started["zoom"]["phase"], "pinching");

    let (_, moved) = call(
        &router,
        "POST",
        "/api/pcrooms/3/seat-map/gesture",
        Some(json!({ "phase": "move", "touches": touches(200.0) })),
    )
    .await;
    assert_eq!(moved["zoom"]["scale"], 2.0);

    let (_, ended) = call(&router, "POST", "/api/pcrooms/3/seat-map/gesture", Some(json!({ "phase": "end" }))).await;
    assert_eq!(ended["zoom"]["phase"], "idle");

    let (_, map) = call(&router, "GET", "/api/pcrooms/3/seat-map", None).await;
    assert_eq!(map["zoom"]["scale"], 2.0);
    assert_eq!(map["zoom"]["scaledWidth"], 160.0);
    assert_eq!(map["zoom"]["scaledHeight"], 80.0);

    // у тепловой карты той же площадки масштаб свой
    let (_, other) = call(&router, "POST", "/api/pcrooms/3/usage-map/gesture", Some(json!({ "phase": "end" }))).await;
    assert_eq!(other["consumed"], false);
    assert_eq!(other["zoom"]["scale"], 1.0);
}
