use std::time::Duration;

use roundview::api::{ApiError, MemoryObjectApi};
use roundview::comments::{Author, Comment};
use roundview::controller::{CommentController, Session};
use roundview::document::{Destination, OutlineItem};
use roundview::event_source::{EventSource, KeyCode, SimulatedEventSource};
use roundview::test_utils::test_helpers::{
    BlankEngine, TestScenarioBuilder, capture_terminal_state, create_test_terminal,
};
use roundview::view::ViewState;
use roundview::widget::Popup;
use roundview::{App, run_app_with_event_source};

const OBJECT: &str = "obj-1";

fn comment(id: &str, page: u32) -> Comment {
    Comment {
        id: id.to_string(),
        text: format!("remark {id}"),
        x: 20.0,
        y: 30.0,
        page,
        author_name: "Ada".to_string(),
        author_id: "1".to_string(),
        resolved: false,
    }
}

fn session(can_comment: bool) -> Session {
    Session {
        author: Author::new("Grace", "9"),
        can_comment,
        can_edit: false,
    }
}

fn app_with(
    api: &MemoryObjectApi,
    engine: BlankEngine,
    can_comment: bool,
) -> App<&MemoryObjectApi> {
    let pages = engine_pages(&engine);
    let controller =
        CommentController::new(api, OBJECT, session(can_comment), ViewState::new(pages, false))
            .with_settle_delay(Duration::ZERO);
    App::new(Box::new(engine), controller)
}

fn engine_pages(engine: &BlankEngine) -> u32 {
    use roundview::document::DocumentEngine;
    engine.page_count() as u32
}

/// Starts the app and handles every queued event without requiring a quit.
async fn feed(app: &mut App<&MemoryObjectApi>, events: &mut SimulatedEventSource) {
    let mut terminal = create_test_terminal(120, 40);
    app.start().await;
    terminal.draw(|f| app.draw(f)).unwrap();
    while events.remaining() > 0 {
        let event = events.read().unwrap();
        app.handle_event(event).await;
        terminal.draw(|f| app.draw(f)).unwrap();
    }
}

// 120x40 terminal: the surface panel starts at column 0, row 1; its inner
// area at column 1, row 2.
#[tokio::test]
async fn test_click_type_and_enter_creates_comment() {
    let api = MemoryObjectApi::new();
    api.insert_object(OBJECT, "Design", vec![]);
    let mut app = app_with(&api, BlankEngine::new(3), true);

    let mut events = TestScenarioBuilder::new()
        .click(11, 7)
        .type_text("Looks good")
        .press_enter()
        .quit()
        .build();
    let mut terminal = create_test_terminal(120, 40);
    run_app_with_event_source(&mut terminal, &mut app, &mut events)
        .await
        .unwrap();

    let stored = api.comments(OBJECT);
    assert_eq!(stored.len(), 1);
    let created = &stored.as_slice()[0];
    assert_eq!(created.text, "Looks good");
    assert_eq!(created.page, 1);
    assert_eq!(created.author_name, "Grace");
    // Cell (10, 5) centre is (84, 88) at the default scale of 1.2.
    assert!((created.x - 70.0).abs() < 1e-9);
    assert!((created.y - 88.0 / 1.2).abs() < 1e-9);

    assert!(!app.controller.compose.is_composing());
    assert_eq!(app.controller.comments().count(), 1);
}

#[tokio::test]
async fn test_arrows_are_ignored_while_composing() {
    let api = MemoryObjectApi::new();
    api.insert_object(OBJECT, "Design", vec![]);
    let mut app = app_with(&api, BlankEngine::new(3), true);

    let mut events = TestScenarioBuilder::new()
        .click(11, 7)
        .press_key(KeyCode::Right)
        .press_esc()
        .quit()
        .build();
    let mut terminal = create_test_terminal(120, 40);
    run_app_with_event_source(&mut terminal, &mut app, &mut events)
        .await
        .unwrap();
    assert_eq!(app.controller.view.page, 1);
    assert_eq!(api.write_count(), 0);

    let mut events = TestScenarioBuilder::new()
        .press_key(KeyCode::Right)
        .quit()
        .build();
    run_app_with_event_source(&mut terminal, &mut app, &mut events)
        .await
        .unwrap();
    assert_eq!(app.controller.view.page, 2);
    assert!(capture_terminal_state(&terminal).contains("Page 2 / 3"));
}

#[tokio::test]
async fn test_page_beyond_document_is_clamped_on_start() {
    let api = MemoryObjectApi::new();
    api.insert_object(OBJECT, "Design", vec![comment("a", 2)]);
    let mut view = ViewState::new(5, false);
    view.page = 5;
    let controller = CommentController::new(&api, OBJECT, session(true), view)
        .with_settle_delay(Duration::ZERO);
    let mut app = App::new(Box::new(BlankEngine::new(2)), controller);

    let mut events = TestScenarioBuilder::new().build();
    feed(&mut app, &mut events).await;

    assert_eq!(app.controller.view.page, 2);
    assert_eq!(app.controller.comments().markers.len(), 1);
}

#[tokio::test]
async fn test_shift_enter_inserts_line_break() {
    let api = MemoryObjectApi::new();
    api.insert_object(OBJECT, "Design", vec![]);
    let mut app = app_with(&api, BlankEngine::new(1), true);

    let mut events = TestScenarioBuilder::new()
        .click(11, 7)
        .type_text("one")
        .shift_enter()
        .type_text("two")
        .press_enter()
        .quit()
        .build();
    let mut terminal = create_test_terminal(120, 40);
    run_app_with_event_source(&mut terminal, &mut app, &mut events)
        .await
        .unwrap();

    assert_eq!(api.comments(OBJECT).as_slice()[0].text, "one\ntwo");
}

#[tokio::test]
async fn test_delete_asks_for_confirmation() {
    let api = MemoryObjectApi::new();
    api.insert_object(OBJECT, "Design", vec![comment("a", 1), comment("b", 1)]);
    let mut app = app_with(&api, BlankEngine::new(2), true);

    let mut events = TestScenarioBuilder::new()
        .press_tab()
        .press_char('d')
        .build();
    feed(&mut app, &mut events).await;
    assert!(matches!(app.popup(), Some(Popup::Confirm { .. })));
    assert_eq!(api.comments(OBJECT).len(), 2);

    let mut events = TestScenarioBuilder::new().press_char('y').build();
    feed(&mut app, &mut events).await;

    let stored = api.comments(OBJECT);
    assert_eq!(stored.len(), 1);
    assert!(!stored.contains("a"));
    assert!(stored.contains("b"));
    assert!(app.popup().is_none());
}

#[tokio::test]
async fn test_declined_confirmation_keeps_comment() {
    let api = MemoryObjectApi::new();
    api.insert_object(OBJECT, "Design", vec![comment("a", 1)]);
    let mut app = app_with(&api, BlankEngine::new(1), true);

    let mut events = TestScenarioBuilder::new()
        .press_tab()
        .press_char('d')
        .press_char('n')
        .quit()
        .build();
    let mut terminal = create_test_terminal(120, 40);
    run_app_with_event_source(&mut terminal, &mut app, &mut events)
        .await
        .unwrap();

    assert_eq!(api.comments(OBJECT).len(), 1);
    assert_eq!(api.write_count(), 0);
}

#[tokio::test]
async fn test_failed_delete_shows_alert() {
    let api = MemoryObjectApi::new();
    api.insert_object(OBJECT, "Design", vec![comment("a", 1)]);
    api.fail_next_write(ApiError::status(500));
    let mut app = app_with(&api, BlankEngine::new(1), true);

    let mut events = TestScenarioBuilder::new()
        .press_tab()
        .press_char('d')
        .press_char('y')
        .build();
    feed(&mut app, &mut events).await;

    assert_eq!(
        app.popup(),
        Some(&Popup::Alert("Error removing comment: HTTP 500".to_string()))
    );
    assert_eq!(api.comments(OBJECT).len(), 1);
}

#[tokio::test]
async fn test_read_only_user_cannot_compose() {
    let api = MemoryObjectApi::new();
    api.insert_object(OBJECT, "Design", vec![comment("a", 1)]);
    let mut app = app_with(&api, BlankEngine::new(1), false);

    let mut events = TestScenarioBuilder::new()
        .click(11, 7)
        .type_text("x")
        .press_enter()
        .press_tab()
        .press_char('d')
        .quit()
        .build();
    let mut terminal = create_test_terminal(120, 40);
    run_app_with_event_source(&mut terminal, &mut app, &mut events)
        .await
        .unwrap();

    assert!(!app.controller.compose.is_composing());
    assert!(app.popup().is_none());
    assert_eq!(api.write_count(), 0);
    let screen = capture_terminal_state(&terminal);
    assert!(screen.contains("[g] locate"));
    assert!(!screen.contains("[d] delete"));
}

#[tokio::test]
async fn test_locate_moves_to_comment_page() {
    let api = MemoryObjectApi::new();
    api.insert_object(OBJECT, "Design", vec![comment("a", 1), comment("b", 3)]);
    let mut app = app_with(&api, BlankEngine::new(3), true);

    let mut events = TestScenarioBuilder::new()
        .press_char('m')
        .press_tab()
        .press_char('j')
        .press_char('g')
        .quit()
        .build();
    let mut terminal = create_test_terminal(120, 40);
    run_app_with_event_source(&mut terminal, &mut app, &mut events)
        .await
        .unwrap();

    assert_eq!(app.controller.view.page, 3);
    assert_eq!(app.controller.comments().markers.len(), 1);
    assert_eq!(app.controller.comments().markers[0].id, "b");
}

#[tokio::test]
async fn test_load_failure_is_shown_inline() {
    let api = MemoryObjectApi::new();
    api.insert_object(OBJECT, "Design", vec![comment("a", 1)]);
    api.fail_next_read(ApiError::status(503));
    api.fail_next_read(ApiError::status(503));
    let mut app = app_with(&api, BlankEngine::new(1), true);

    let mut events = TestScenarioBuilder::new().quit().build();
    let mut terminal = create_test_terminal(120, 40);
    run_app_with_event_source(&mut terminal, &mut app, &mut events)
        .await
        .unwrap();

    assert!(capture_terminal_state(&terminal).contains("Error loading comments"));
    assert!(app.controller.comments().markers.is_empty());
}

#[tokio::test]
async fn test_outline_panel_without_outline() {
    let api = MemoryObjectApi::new();
    api.insert_object(OBJECT, "Design", vec![]);
    let mut app = app_with(&api, BlankEngine::new(1), true);

    let mut events = TestScenarioBuilder::new().press_char('o').quit().build();
    let mut terminal = create_test_terminal(120, 40);
    run_app_with_event_source(&mut terminal, &mut app, &mut events)
        .await
        .unwrap();

    assert!(capture_terminal_state(&terminal).contains("No outline available"));
}

#[tokio::test]
async fn test_outline_entry_opens_page() {
    let api = MemoryObjectApi::new();
    api.insert_object(OBJECT, "Design", vec![]);
    let outline = vec![
        OutlineItem::new("Intro", Some(Destination::Page(0))),
        OutlineItem::new("Results", Some(Destination::Page(2))),
    ];
    let mut app = app_with(&api, BlankEngine::new(3).with_outline(outline), true);

    let mut events = TestScenarioBuilder::new()
        .press_char('o')
        .press_char('j')
        .press_enter()
        .quit()
        .build();
    let mut terminal = create_test_terminal(120, 40);
    run_app_with_event_source(&mut terminal, &mut app, &mut events)
        .await
        .unwrap();

    assert_eq!(app.controller.view.page, 3);
}
