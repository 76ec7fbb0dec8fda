use std::time::Duration;

use lectern_api::{Error as ApiError, LectureId};
use lectern_client::{
    pages::LecturePlayer, ClientConfig, Loadable, DEFAULT_AUTOSAVE_QUIET_PERIOD,
};
use lectern_mock_server::MockServer;
use tests::{Fixture, VIDEO_DURATION};
use tokio::time::sleep;

const DURATION: f64 = VIDEO_DURATION as f64;

fn progress_writes(server: &MockServer) -> usize {
    server.calls("create_progress") + server.calls("update_progress")
}

async fn player(f: &Fixture, lecture: LectureId) -> LecturePlayer<MockServer> {
    let mut player = LecturePlayer::new(
        f.as_student().await,
        f.course.id,
        lecture,
        DEFAULT_AUTOSAVE_QUIET_PERIOD,
    );
    player.load().await;
    player
}

#[tokio::test(start_paused = true)]
async fn samples_are_coalesced_into_one_save() {
    let f = Fixture::new();
    let mut p = player(&f, f.lectures[0].id).await;

    p.on_time_update(60.0, DURATION);
    sleep(Duration::from_secs(1)).await;
    p.on_time_update(120.0, DURATION);
    sleep(Duration::from_secs(1)).await;
    p.on_time_update(180.0, DURATION);
    assert!(p.has_pending_save());
    assert_eq!(progress_writes(&f.server), 0);

    sleep(Duration::from_secs(6)).await;
    assert_eq!(progress_writes(&f.server), 1);
    let records = f.server.test_progress(f.student);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].progress_percentage, 30);
    assert!(!records[0].completed);
    assert!(!p.is_completed());
}

#[tokio::test(start_paused = true)]
async fn later_bursts_update_the_same_record() {
    let f = Fixture::new();
    let mut p = player(&f, f.lectures[0].id).await;

    p.on_time_update(60.0, DURATION);
    sleep(Duration::from_secs(6)).await;
    p.on_time_update(540.0, DURATION);
    sleep(Duration::from_secs(6)).await;

    assert_eq!(f.server.calls("create_progress"), 1);
    assert_eq!(f.server.calls("update_progress"), 1);
    let records = f.server.test_progress(f.student);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].progress_percentage, 90);
    assert!(records[0].completed);
    assert!(p.is_completed());

    // the background save shows up in the page without a reload
    let shown = p.state().ready().unwrap().progress.clone().unwrap();
    assert_eq!(shown, records[0]);
    let outline = p.outline().unwrap();
    assert_eq!(outline.percentage(), 33);
    assert_eq!(outline.progress_map().get(&f.lectures[0].id), Some(&true));
}

#[tokio::test(start_paused = true)]
async fn end_of_playback_saves_immediately() {
    let f = Fixture::new();
    let mut p = player(&f, f.lectures[0].id).await;

    p.on_time_update(590.0, DURATION);
    let record = p.on_ended().await.unwrap();
    assert!(record.completed);
    assert_eq!(record.progress_percentage, 100);
    assert!(p.is_completed());
    assert!(!p.has_pending_save());

    // the sample scheduled before the end never lands
    sleep(Duration::from_secs(10)).await;
    assert_eq!(progress_writes(&f.server), 1);
    assert_eq!(f.server.test_progress(f.student)[0].progress_percentage, 100);
}

#[tokio::test(start_paused = true)]
async fn leaving_the_page_drops_pending_save() {
    let f = Fixture::new();
    let mut p = player(&f, f.lectures[0].id).await;
    p.on_time_update(300.0, DURATION);
    drop(p);
    sleep(Duration::from_secs(10)).await;
    assert_eq!(progress_writes(&f.server), 0);
}

#[tokio::test(start_paused = true)]
async fn samples_without_duration_are_ignored() {
    let f = Fixture::new();
    let mut p = player(&f, f.lectures[0].id).await;
    p.on_time_update(10.0, 0.0);
    p.on_time_update(10.0, f64::NAN);
    assert!(!p.has_pending_save());
    sleep(Duration::from_secs(10)).await;
    assert_eq!(progress_writes(&f.server), 0);
}

#[tokio::test]
async fn neighbors_follow_display_order() {
    let f = Fixture::new();
    let [first, second, third] = [0, 1, 2].map(|i| f.lectures[i].id);

    let p = player(&f, second).await;
    assert_eq!(p.previous().map(|l| l.id), Some(first));
    assert_eq!(p.next().map(|l| l.id), Some(third));

    let p = player(&f, first).await;
    assert_eq!(p.previous(), None);
    assert_eq!(p.next().map(|l| l.id), Some(second));

    let p = player(&f, third).await;
    assert_eq!(p.next(), None);
}

#[tokio::test]
async fn completion_updates_outline() {
    let f = Fixture::new();
    let mut p = player(&f, f.lectures[1].id).await;
    assert!(!p.is_completed());
    assert_eq!(p.outline().unwrap().percentage(), 0);

    p.mark_completed().await.unwrap();
    let outline = p.outline().unwrap();
    assert_eq!(outline.percentage(), 33);
    assert_eq!(outline.progress_map().get(&f.lectures[1].id), Some(&true));
    assert!(p.state().ready().unwrap().progress.as_ref().unwrap().completed);

    // completing again updates the existing record
    p.mark_completed().await.unwrap();
    assert_eq!(f.server.calls("create_progress"), 1);
    assert_eq!(f.server.calls("update_progress"), 1);

    let mut reloaded = player(&f, f.lectures[1].id).await;
    assert!(reloaded.is_completed());
}

#[tokio::test]
async fn missing_lecture() {
    let f = Fixture::new();
    let mut p = player(&f, LectureId(9999)).await;
    assert_eq!(*p.state(), Loadable::NotFound);
    assert_eq!(p.next(), None);
}

#[tokio::test(start_paused = true)]
async fn quiet_period_comes_from_config() {
    let f = Fixture::new();
    let config = ClientConfig {
        autosave_quiet_period: Duration::from_secs(1),
        ..ClientConfig::new("http://localhost:8000")
    };
    let mut p = LecturePlayer::from_config(
        f.as_student().await,
        &config,
        f.course.id,
        f.lectures[0].id,
    );
    p.on_time_update(60.0, DURATION);
    sleep(Duration::from_secs(2)).await;
    assert_eq!(progress_writes(&f.server), 1);
}

#[tokio::test(start_paused = true)]
async fn saving_position_skips_the_quiet_period() {
    let f = Fixture::new();
    let mut p = player(&f, f.lectures[0].id).await;
    p.on_time_update(60.0, DURATION);

    let record = p.save_position(300.0, DURATION).await.unwrap().unwrap();
    assert_eq!(record.progress_percentage, 50);
    assert!(!record.completed);
    assert!(!p.has_pending_save());
    assert_eq!(
        p.state().ready().unwrap().progress.as_ref().map(|r| r.progress_percentage),
        Some(50)
    );

    sleep(Duration::from_secs(10)).await;
    assert_eq!(progress_writes(&f.server), 1);
    assert_eq!(p.save_position(10.0, 0.0).await.unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn completion_after_background_save_stays_completed() {
    let f = Fixture::new();
    let mut p = player(&f, f.lectures[0].id).await;
    p.on_time_update(60.0, DURATION);
    // the autosave lands, then the lecture is completed
    sleep(Duration::from_secs(6)).await;
    p.mark_completed().await.unwrap();
    sleep(Duration::from_secs(10)).await;

    let records = f.server.test_progress(f.student);
    assert_eq!(records.len(), 1);
    assert!(records[0].completed);
    assert!(p.is_completed());
    assert_eq!(p.outline().unwrap().records, records);
}

#[tokio::test]
async fn failed_save_is_reported() {
    let f = Fixture::new();
    let mut p = player(&f, f.lectures[0].id).await;
    f.server
        .fail_next("list_progress", ApiError::Unknown(String::from("boom")));
    assert!(p.save_position(300.0, DURATION).await.is_err());
    assert_eq!(p.state().ready().unwrap().progress, None);
}
