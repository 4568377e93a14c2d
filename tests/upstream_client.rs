use chrono::NaiveDate;
use serde_json::json;
use seatmap_service::config::Config;
use seatmap_service::models::{SeatPosition, SeatSubmission, VenueDraft};
use seatmap_service::services::circuit_breaker::CircuitState;
use seatmap_service::services::upstream::{UpstreamClient, UpstreamError};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, extra: &[(&str, &str)]) -> UpstreamClient {
    let base = format!("{}/api", server.uri());
    let config = Config::from_lookup(|key| {
        if key == "UPSTREAM_API_URL" {
            return Some(base.clone());
        }
        extra.iter().find(|(k, _)| *k == key).map(|(_, v)| v.to_string())
    })
    .unwrap();
    UpstreamClient::new(&config.upstream, &config.circuit_breaker).unwrap()
}

#[tokio::test]
async fn positions_map_backend_coordinates_to_cells() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pcrooms/seatInfo/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "pcroomId": "7", "seatsNum": 1, "x": 1, "y": 1 },
            { "pcroomId": "7", "seatsNum": 2, "x": 3, "y": 2 }
        ])))
        .mount(&server)
        .await;

    let positions = client_for(&server, &[]).seat_positions(7).await.unwrap();
    assert_eq!(positions, vec![
        SeatPosition { seat_number: 1, column: 1, row: 1 },
        SeatPosition { seat_number: 2, column: 3, row: 2 },
    ]);
}

#[tokio::test]
async fn statuses_are_keyed_by_seat_number() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pcrooms/7/seat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "seatsNum": 1, "result": true },
            { "seatsNum": 2, "result": false }
        ])))
        .mount(&server)
        .await;

    let statuses = client_for(&server, &[]).seat_statuses(7).await.unwrap();
    assert_eq!(statuses.get(&1), Some(&true));
    assert_eq!(statuses.get(&2), Some(&false));
}

#[tokio::test]
async fn usage_passes_date_range_and_averages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pcroom/seat-usage-daily/7/range-with-info"))
        .and(query_param("startDate", "2026-10-01"))
        .and(query_param("endDate", "2026-10-02"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "seatId": 11, "seatNum": 1, "seatsIp": "10.0.0.1", "x": 1, "y": 1, "usedPercent": 30.0, "date": "2026-10-01" },
            { "seatId": 11, "seatNum": 1, "seatsIp": "10.0.0.1", "x": 1, "y": 1, "usedPercent": 50.0, "date": "2026-10-02" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let usage = client_for(&server, &[])
        .seat_usage(
            7,
            NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 2).unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(usage.get(&1), Some(&40.0));
}

#[tokio::test]
async fn submit_posts_venue_then_seats() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pcrooms"))
        .and(body_json(json!({
            "nameOfPcroom": "Arena", "seatCount": 2, "port": 7000, "width": 2, "height": 1
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/pcrooms/seats"))
        .and(body_json(json!([
            { "nameOfPcroom": "Arena", "seatNum": 1, "seatIp": "10.0.0.1", "x": 1, "y": 1, "posX": 0, "posY": 0 },
            { "nameOfPcroom": "Arena", "seatNum": 2, "seatIp": "", "x": 2, "y": 1, "posX": 60, "posY": 0 }
        ])))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let venue = VenueDraft { name: " Arena ".into(), seat_count: 2, port: 7000, width: 2, height: 1 };
    let seats = vec![
        SeatSubmission { seat_number: 1, column: 1, row: 1, identifier: "10.0.0.1".into() },
        SeatSubmission { seat_number: 2, column: 2, row: 1, identifier: String::new() },
    ];
    client_for(&server, &[]).submit_layout(&venue, &seats, 60).await.unwrap();
}

#[tokio::test]
async fn seats_are_not_sent_when_venue_creation_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pcrooms"))
        .respond_with(ResponseTemplate::new(400).set_body_string("duplicate name"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/pcrooms/seats"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let venue = VenueDraft { name: "Arena".into(), seat_count: 1, port: 7000, width: 1, height: 1 };
    let err = client_for(&server, &[]).submit_layout(&venue, &[], 60).await.unwrap_err();
    assert!(matches!(err, UpstreamError::Status { status, .. } if status.as_u16() == 400));
}

#[tokio::test]
async fn repeated_server_errors_open_the_circuit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pcrooms/7/seat"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server, &[("CIRCUIT_BREAKER_FAILURE_THRESHOLD", "2")]);
    assert!(client.seat_statuses(7).await.is_err());
    assert!(client.seat_statuses(7).await.is_err());
    assert_eq!(client.circuit_breaker().state(), CircuitState::Open);

    // третий запрос до бэкенда не доходит
    assert!(matches!(client.seat_statuses(7).await, Err(UpstreamError::CircuitOpen)));
}
