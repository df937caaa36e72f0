use std::time::{Duration, Instant};

use roundview::api::{ApiError, MemoryObjectApi, ObjectStatus};
use roundview::comments::{Author, Comment};
use roundview::controller::{
    CommentController, ComposeKey, ComposeOutcome, HIGHLIGHT_DURATION,
    LOAD_ERROR_MESSAGE, Session, SidebarContent,
};
use roundview::document::Zoom;
use roundview::view::{Command, DisplayMode, Effect, ViewState};
use serde_json::json;

const OBJECT: &str = "obj";

fn comment(id: &str, page: u32) -> Comment {
    Comment {
        id: id.to_string(),
        text: format!("remark {id}"),
        x: 50.0,
        y: 80.0,
        page,
        author_name: "Ada".to_string(),
        author_id: "1".to_string(),
        resolved: false,
    }
}

fn controller(
    api: &MemoryObjectApi,
    can_comment: bool,
    can_edit: bool,
) -> CommentController<&MemoryObjectApi> {
    let session = Session {
        author: Author::new("Grace", "9"),
        can_comment,
        can_edit,
    };
    CommentController::new(api, OBJECT, session, ViewState::new(3, false))
        .with_settle_delay(Duration::ZERO)
}

fn seeded(pages: &[u32]) -> MemoryObjectApi {
    let api = MemoryObjectApi::new();
    let comments = pages
        .iter()
        .enumerate()
        .map(|(i, page)| comment(&format!("c{i}"), *page))
        .collect();
    api.insert_object(OBJECT, "Design", comments);
    api
}

#[tokio::test]
async fn test_per_page_and_all_pages_filtering() {
    let api = seeded(&[1, 1, 2]);
    let mut ctrl = controller(&api, true, false);

    ctrl.load_comments().await;
    assert_eq!(ctrl.comments().markers.len(), 2);
    assert_eq!(ctrl.comments().count(), 2);

    assert_eq!(ctrl.apply(Command::SetMode(DisplayMode::All)), vec![Effect::ReloadComments]);
    ctrl.load_comments().await;
    assert_eq!(ctrl.comments().markers.len(), 2);
    assert_eq!(ctrl.comments().count(), 3);
    let pages: Vec<u32> = ctrl.comments().sidebar.rows().iter().map(|r| r.page).collect();
    assert_eq!(pages, vec![1, 1, 2]);
}

#[tokio::test]
async fn test_delete_removes_exactly_one() {
    let api = seeded(&[1, 1, 2]);
    let mut ctrl = controller(&api, true, false);
    ctrl.load_comments().await;

    ctrl.delete_comment("c1").await.unwrap();

    let stored = api.comments(OBJECT);
    let ids: Vec<&str> = stored.as_slice().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c0", "c2"]);
    assert_eq!(stored.get("c0"), Some(&comment("c0", 1)));
    assert!(ctrl.comments().row("c1").is_none());
}

#[tokio::test]
async fn test_resolve_then_undo_restores() {
    let api = seeded(&[1]);
    let mut ctrl = controller(&api, true, false);
    ctrl.load_comments().await;

    let resolve = ctrl.resolve_action("c0").unwrap();
    assert_eq!(ctrl.confirmation_for(&resolve), None);
    ctrl.perform(&resolve).await.unwrap();
    assert!(api.comments(OBJECT).get("c0").unwrap().resolved);

    let undo = ctrl.resolve_action("c0").unwrap();
    assert_eq!(
        ctrl.confirmation_for(&undo),
        Some("Are you sure to UNDO resolving this comment?")
    );
    ctrl.perform(&undo).await.unwrap();
    assert!(!api.comments(OBJECT).get("c0").unwrap().resolved);
}

#[tokio::test]
async fn test_resolve_keeps_comment_resolved_elsewhere() {
    let api = seeded(&[1]);
    let mut ctrl = controller(&api, true, false);
    ctrl.load_comments().await;
    let resolve = ctrl.resolve_action("c0").unwrap();

    // Another session resolves the comment before this one writes.
    let mut stored = api.comments(OBJECT);
    assert!(stored.set_resolved("c0", true));
    api.set_raw_comments(OBJECT, json!(stored.to_payload().to_string()));

    assert_eq!(ctrl.confirmation_for(&resolve), None);
    ctrl.perform(&resolve).await.unwrap();
    assert!(api.comments(OBJECT).get("c0").unwrap().resolved);

    ctrl.perform(&resolve).await.unwrap();
    assert!(api.comments(OBJECT).get("c0").unwrap().resolved);
}

#[tokio::test]
async fn test_stored_position_is_scale_invariant() {
    let mut scale = Zoom::MIN_SCALE;
    while scale <= Zoom::MAX_SCALE + 1e-9 {
        let api = seeded(&[]);
        let mut ctrl = controller(&api, true, false);
        ctrl.view.zoom = Zoom::with_factor(scale);

        let surface = (120.0 * scale, 300.0 * scale);
        assert!(ctrl.begin_compose(surface));
        ctrl.compose_key(ComposeKey::Char('x')).await.unwrap();
        let outcome = ctrl.compose_key(ComposeKey::Enter).await.unwrap();
        assert!(matches!(outcome, ComposeOutcome::Submit(_)));

        let stored = api.comments(OBJECT);
        let created = &stored.as_slice()[0];
        assert!((created.x - 120.0).abs() < 1e-9, "x at scale {scale}");
        assert!((created.y - 300.0).abs() < 1e-9, "y at scale {scale}");

        let marker = &ctrl.comments().markers[0];
        assert!((marker.x - surface.0).abs() < 1e-9);
        assert!((marker.y - surface.1).abs() < 1e-9);

        scale += Zoom::STEP;
    }
}

#[tokio::test]
async fn test_failed_write_reloads_and_reports() {
    let api = seeded(&[1, 1]);
    let mut ctrl = controller(&api, true, false);
    ctrl.load_comments().await;
    api.fail_next_write(ApiError::status(500));

    let resolve = ctrl.resolve_action("c0").unwrap();
    let err = ctrl.perform(&resolve).await.unwrap_err();
    assert_eq!(
        resolve.failure_message(&err),
        "Error resolving comment: HTTP 500"
    );
    assert_eq!(ctrl.comments().count(), 2);
    assert!(!api.comments(OBJECT).get("c0").unwrap().resolved);
}

#[tokio::test]
async fn test_malformed_payload_shows_inline_error() {
    let api = seeded(&[]);
    api.set_raw_comments(OBJECT, json!("{not json"));
    let mut ctrl = controller(&api, true, false);

    ctrl.load_comments().await;
    assert_eq!(
        ctrl.comments().sidebar,
        SidebarContent::Error(LOAD_ERROR_MESSAGE.to_string())
    );
    assert!(ctrl.comments().markers.is_empty());
}

#[tokio::test]
async fn test_legacy_payload_shape_is_read() {
    let api = seeded(&[]);
    let legacy = serde_json::to_value(vec![comment("old", 1)]).unwrap();
    api.set_raw_comments(OBJECT, json!(legacy.to_string()));
    let mut ctrl = controller(&api, true, false);

    ctrl.load_comments().await;
    assert_eq!(ctrl.comments().count(), 1);
}

#[tokio::test]
async fn test_locate_switches_page_and_highlights() {
    let api = seeded(&[1, 3]);
    let mut ctrl = controller(&api, true, false);
    let _ = ctrl.apply(Command::ToggleMode);
    ctrl.load_comments().await;

    let now = Instant::now();
    let effects = ctrl.locate("c1", now);
    assert_eq!(effects, vec![Effect::RenderPage(3), Effect::ReloadComments]);
    assert_eq!(ctrl.view.page, 3);
    assert_eq!(ctrl.highlighted(now), Some("c1"));

    let later = now + HIGHLIGHT_DURATION;
    assert!(ctrl.highlighted(later).is_none());
    assert!(ctrl.expire_highlight(later));
}

#[tokio::test]
async fn test_status_cycle_requires_edit_capability() {
    let api = seeded(&[]);
    api.update_object(OBJECT, |o| o.status = Some(ObjectStatus::UnderReview));

    let mut reader = controller(&api, true, false);
    reader.load_object().await.unwrap();
    assert_eq!(reader.cycle_status().await.unwrap(), None);
    assert_eq!(api.status(OBJECT), Some(ObjectStatus::UnderReview));

    let mut editor = controller(&api, true, true);
    editor.load_object().await.unwrap();
    assert_eq!(
        editor.cycle_status().await.unwrap(),
        Some(ObjectStatus::RequireChanges)
    );

    api.fail_next_write(ApiError::status(403));
    assert!(editor.cycle_status().await.is_err());
    assert_eq!(
        editor.object().and_then(|o| o.status),
        Some(ObjectStatus::RequireChanges)
    );
}

#[test]
fn test_zoom_in_clamps_at_maximum() {
    let mut view = ViewState::new(2, false);
    for _ in 0..10 {
        let _ = view.apply(Command::ZoomIn);
    }
    assert!((view.scale() - 3.0).abs() < 1e-9);
    assert!(view.apply(Command::ZoomIn).is_empty());

    let _ = view.apply(Command::ResetZoom);
    assert!(view.zoom.is_default());
}
