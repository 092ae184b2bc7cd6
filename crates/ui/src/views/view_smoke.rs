use cicada_core::model::{LevelId, PartId};

use super::test_harness::{ViewKind, setup_view_harness, team};

#[tokio::test(flavor = "current_thread")]
async fn home_view_shows_login_form_when_signed_out() {
    let mut harness = setup_view_harness(ViewKind::Home, None).await;
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("Leader email"), "missing login form in {html}");
    assert!(html.contains("ENTER"), "missing submit button in {html}");
    assert!(html.contains("Enlightenment awaits."), "missing tagline in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn home_view_offers_continue_when_signed_in() {
    let mut harness = setup_view_harness(ViewKind::Home, Some(team(3))).await;
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("Cicadas"), "missing team name in {html}");
    assert!(html.contains("Current level: 3"), "missing level in {html}");
    assert!(html.contains("CONTINUE"), "missing continue link in {html}");
    assert!(!html.contains("Leader email"), "login form should be hidden in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn play_view_unlocks_levels_up_to_current() {
    let mut harness = setup_view_harness(ViewKind::Play, Some(team(2))).await;
    harness.settle().await;
    let html = harness.render();
    assert_eq!(html.matches("tile tile-unlocked").count(), 1, "{html}");
    assert_eq!(html.matches("tile tile-current").count(), 1, "{html}");
    assert_eq!(html.matches("tile tile-locked").count(), 5, "{html}");
    assert_eq!(html.matches(">PLAY<").count(), 2, "{html}");
    assert!(html.contains("LOGOUT"), "missing logout in {html}");
    assert!(!html.contains("CONGRATULATIONS"), "{html}");
}

#[tokio::test(flavor = "current_thread")]
async fn play_view_congratulates_finished_team() {
    let mut harness = setup_view_harness(ViewKind::Play, Some(team(8))).await;
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("CONGRATULATIONS!"), "missing celebration in {html}");
    assert_eq!(html.matches("tile tile-locked").count(), 0, "{html}");
}

#[tokio::test(flavor = "current_thread")]
async fn level_view_opens_first_part_only() {
    let mut harness = setup_view_harness(ViewKind::Level(2), Some(team(2))).await;
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("Level 2: Broken Network"), "missing heading in {html}");
    assert!(html.contains("0/2 solved"), "missing progress in {html}");
    assert!(html.contains("SUBMIT"), "missing submit in {html}");
    assert!(
        html.contains("Solve the previous part to unlock this one."),
        "second part should be locked in {html}"
    );
}

#[tokio::test(flavor = "current_thread")]
async fn level_view_restores_solved_parts() {
    let mut harness = setup_view_harness(ViewKind::Level(2), Some(team(2))).await;
    harness
        .storage
        .part_flags
        .mark_part_completed(LevelId::new(2), PartId::new(1))
        .await
        .expect("seed flag");
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("1/2 solved"), "missing progress in {html}");
    assert!(html.contains("SOLVED"), "missing solved badge in {html}");
    assert!(!html.contains("Solve the previous part"), "{html}");
}

#[tokio::test(flavor = "current_thread")]
async fn level_view_renders_cipher_legend() {
    let mut harness = setup_view_harness(ViewKind::Level(1), Some(team(1))).await;
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("cipher-legend"), "missing legend in {html}");
    assert!(html.contains("Δ1"), "missing glyph in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn level_view_refuses_locked_level() {
    let mut harness = setup_view_harness(ViewKind::Level(3), Some(team(1))).await;
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("This level is locked!"), "missing lock notice in {html}");
    assert!(!html.contains("SUBMIT"), "{html}");
}

#[tokio::test(flavor = "current_thread")]
async fn level_view_reports_unknown_level() {
    let mut harness = setup_view_harness(ViewKind::Level(9), Some(team(7))).await;
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("There is no such level."), "{html}");
}
