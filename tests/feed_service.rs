use chrono::NaiveDate;
use serde_json::json;
use seatmap_service::config::Config;
use seatmap_service::gesture::ZoomBounds;
use seatmap_service::services::feed::SeatFeedService;
use seatmap_service::services::upstream::UpstreamClient;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn feeds_for(server: &MockServer) -> SeatFeedService {
    let base = format!("{}/api", server.uri());
    let config = Config::from_lookup(|key| (key == "UPSTREAM_API_URL").then(|| base.clone())).unwrap();
    let upstream = UpstreamClient::new(&config.upstream, &config.circuit_breaker).unwrap();
    SeatFeedService::new(upstream, None, 40, ZoomBounds::default())
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
}

async fn mount_usage(server: &MockServer, date: &str, percent: f64, delay: Duration) {
    Mock::given(method("GET"))
        .and(path("/api/pcroom/seat-usage-daily/3/range-with-info"))
        .and(query_param("startDate", date))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([
                    { "seatId": 1, "seatNum": 1, "seatsIp": "", "x": 1, "y": 1, "usedPercent": percent, "date": date }
                ]))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn slow_answer_for_previous_range_does_not_overwrite_newer_one() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pcrooms/seatInfo/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "pcroomId": "3", "seatsNum": 1, "x": 1, "y": 1 }
        ])))
        .mount(&server)
        .await;
    // первый диапазон бэкенд отдаёт последним
    mount_usage(&server, "2026-10-01", 10.0, Duration::from_millis(300)).await;
    mount_usage(&server, "2026-10-02", 90.0, Duration::ZERO).await;

    let feeds = feeds_for(&server);
    let (earlier, later) = tokio::join!(
        feeds.usage_frame(3, day(1), day(1)),
        feeds.usage_frame(3, day(2), day(2)),
    );

    assert_eq!(later.frame.seats[0].value.used_percent, 90.0);
    assert_eq!(earlier.frame.seats[0].value.used_percent, 90.0);
    assert!((earlier.frame.seats[0].value.intensity - 0.9).abs() < 1e-9);

    // следующий запрос идёт от той же карты
    let again = feeds.usage_frame(3, day(1), day(1)).await;
    assert_eq!(again.frame.seats[0].value.used_percent, 10.0);
    assert_eq!(feeds.tracked_views(), (0, 1));
}

#[tokio::test]
async fn usage_above_full_is_normalized_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pcrooms/seatInfo/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "pcroomId": "3", "seatsNum": 1, "x": 1, "y": 1 }
        ])))
        .mount(&server)
        .await;
    mount_usage(&server, "2026-10-01", 150.0, Duration::ZERO).await;

    let snapshot = feeds_for(&server).usage_frame(3, day(1), day(1)).await;
    let usage = snapshot.frame.seats[0].value;
    assert_eq!(usage.used_percent, 150.0);
    assert_eq!(usage.intensity, 1.0);
    assert_eq!(usage.opacity(), 1.0);
}
