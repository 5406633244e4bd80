use std::time::Duration;

use serde_json::json;
use tokio::time::sleep;
use webos_media::transport::Method;
use webos_media::{ActivePlayer, InMemoryMediaService, PlaybackState, PlayerBuilder, PlayerEvent};

const TICK: Duration = Duration::from_millis(750);

/// Starts a player with a loaded source and no pending events
async fn loaded(service: &InMemoryMediaService) -> ActivePlayer {
    let mut player = PlayerBuilder::new(service.clone()).start().unwrap();
    player.handle().load_url("http://x/a.m3u8", "application/x-mpegurl", false).unwrap();
    player.handle().settled().await.unwrap();
    assert_eq!(player.drain_events(), vec![PlayerEvent::StateChanged(PlaybackState::Loaded)]);
    player
}

async fn ticks(count: u32) {
    sleep(TICK * count + Duration::from_millis(10)).await;
}

#[tokio::test(start_paused = true)]
async fn test_status_poll_emits_state_progress_and_duration() {
    let service = InMemoryMediaService::new();
    let mut player = loaded(&service).await;

    service.push_status(json!({"state": "playing", "currentTime": 5000, "duration": 120000}));
    ticks(1).await;

    assert_eq!(
        player.drain_events(),
        vec![
            PlayerEvent::StateChanged(PlaybackState::Playing),
            PlayerEvent::ProgressChanged(5),
            PlayerEvent::DurationChanged(120),
        ]
    );
    let snapshot = player.handle().snapshot().await.unwrap();
    assert_eq!(snapshot.position_secs, 5);
    assert_eq!(snapshot.duration_secs, 120);
}

#[tokio::test(start_paused = true)]
async fn test_state_is_only_emitted_on_change() {
    let service = InMemoryMediaService::new();
    let mut player = loaded(&service).await;

    service.push_status(json!({"state": "playing", "currentTime": 1000, "duration": 60000}));
    service.push_status(json!({"state": "playing", "currentTime": 2000, "duration": 60000}));
    ticks(2).await;

    assert_eq!(
        player.drain_events(),
        vec![
            PlayerEvent::StateChanged(PlaybackState::Playing),
            PlayerEvent::ProgressChanged(1),
            PlayerEvent::DurationChanged(60),
            PlayerEvent::ProgressChanged(2),
            PlayerEvent::DurationChanged(60),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_milliseconds_truncate_to_seconds() {
    let service = InMemoryMediaService::new();
    let mut player = loaded(&service).await;

    service.push_status(json!({"currentTime": 1999, "duration": 59999.9}));
    ticks(1).await;

    assert_eq!(
        player.drain_events(),
        vec![PlayerEvent::ProgressChanged(1), PlayerEvent::DurationChanged(59)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_malformed_status_falls_back_to_zero() {
    let service = InMemoryMediaService::new();
    let mut player = loaded(&service).await;

    service.push_status(json!({"state": 7, "currentTime": "soon"}));
    ticks(1).await;

    assert_eq!(
        player.drain_events(),
        vec![PlayerEvent::ProgressChanged(0), PlayerEvent::DurationChanged(0)]
    );
    assert_eq!(player.handle().snapshot().await.unwrap().state, PlaybackState::Loaded);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_remote_state_is_passed_through() {
    let service = InMemoryMediaService::new();
    let mut player = loaded(&service).await;

    service.push_status(json!({"state": "buffering", "currentTime": 0, "duration": 0}));
    ticks(1).await;

    assert_eq!(
        player.drain_events()[0],
        PlayerEvent::StateChanged(PlaybackState::Other("buffering".to_string()))
    );
}

#[tokio::test(start_paused = true)]
async fn test_poll_failures_are_silent_and_polling_continues() {
    let service = InMemoryMediaService::new();
    let mut player = loaded(&service).await;

    service.fail_next(Method::Status, "status timeout");
    service.fail_next(Method::Status, "status timeout");
    service.push_status(json!({"state": "playing", "currentTime": 3000, "duration": 9000}));
    ticks(3).await;

    assert_eq!(service.call_count(Method::Status), 3);
    assert_eq!(
        player.drain_events(),
        vec![
            PlayerEvent::StateChanged(PlaybackState::Playing),
            PlayerEvent::ProgressChanged(3),
            PlayerEvent::DurationChanged(9),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_simulated_clock_reports_playback_position() {
    let service = InMemoryMediaService::new();
    let mut player = loaded(&service).await;

    player.handle().play().unwrap();
    player.handle().settled().await.unwrap();
    ticks(2).await;

    assert_eq!(
        player.drain_events(),
        vec![
            PlayerEvent::StateChanged(PlaybackState::Playing),
            PlayerEvent::ProgressChanged(0),
            PlayerEvent::DurationChanged(600),
            PlayerEvent::ProgressChanged(1),
            PlayerEvent::DurationChanged(600),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_stop_halts_polling() {
    let service = InMemoryMediaService::new();
    let player = loaded(&service).await;

    ticks(1).await;
    assert_eq!(service.call_count(Method::Status), 1);

    player.handle().stop().unwrap();
    player.handle().settled().await.unwrap();
    ticks(4).await;

    assert_eq!(service.call_count(Method::Status), 1);
    assert!(!player.handle().snapshot().await.unwrap().polling);
}

#[tokio::test(start_paused = true)]
async fn test_in_flight_poll_cannot_resurrect_stopped_state() {
    let service = InMemoryMediaService::new();
    let mut player = loaded(&service).await;

    service.hold_status();
    service.push_status(json!({"state": "playing", "currentTime": 4000, "duration": 8000}));
    ticks(1).await;
    assert_eq!(service.call_count(Method::Status), 1);

    player.handle().stop().unwrap();
    player.handle().settled().await.unwrap();
    service.release_status(1);
    sleep(Duration::from_millis(10)).await;
    player.handle().settled().await.unwrap();

    assert_eq!(player.drain_events(), vec![PlayerEvent::StateChanged(PlaybackState::Stopped)]);
    let snapshot = player.handle().snapshot().await.unwrap();
    assert_eq!(snapshot.state, PlaybackState::Stopped);
    assert_eq!(snapshot.position_secs, 0);
}

#[tokio::test(start_paused = true)]
async fn test_in_flight_poll_after_teardown_is_discarded() {
    let service = InMemoryMediaService::new();
    let mut player = loaded(&service).await;

    service.hold_status();
    service.push_status(json!({"state": "playing", "currentTime": 4000, "duration": 8000}));
    ticks(1).await;

    player.handle().teardown().await.unwrap();
    service.release_status(1);
    sleep(Duration::from_millis(10)).await;
    player.handle().settled().await.unwrap();

    assert_eq!(player.drain_events(), vec![PlayerEvent::StateChanged(PlaybackState::Stopped)]);
    assert_eq!(service.release_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_reload_restarts_polling() {
    let service = InMemoryMediaService::new();
    let player = loaded(&service).await;

    player.handle().stop().unwrap();
    player.handle().load_url("http://x/b.m3u8", "application/x-mpegurl", false).unwrap();
    player.handle().settled().await.unwrap();
    ticks(2).await;

    assert!(player.handle().snapshot().await.unwrap().polling);
    assert_eq!(service.call_count(Method::Status), 2);
}
