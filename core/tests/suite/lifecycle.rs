//! Request lifecycle on the wire: supersede, staleness, timeout, refresh,
//! debounce, and channel degradation.

use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use assert_matches::assert_matches;
use core_test_support::ClosedSender;
use core_test_support::TestPanel;
use core_test_support::backend_error;
use core_test_support::query_result;
use periscope_core::DEFAULT_DEBOUNCE_WINDOW;
use periscope_core::PanelSession;
use periscope_core::SessionConfig;
use periscope_core::SessionEvent;
use periscope_protocol::FilterCondition;
use periscope_protocol::FilterOperator;
use periscope_protocol::OutboundMessage;
use pretty_assertions::assert_eq;
use serde_json::json;

fn filter(path: &str) -> FilterCondition {
    FilterCondition::new(path, FilterOperator::Equal, json!("x"))
}

#[tokio::test(start_paused = true)]
async fn ready_handshake_is_uncorrelated() {
    let mut panel = TestPanel::new();
    panel.session.announce_ready();
    assert_eq!(panel.sent(), vec![OutboundMessage::Ready]);
}

#[tokio::test(start_paused = true)]
async fn page_race_applies_only_the_newest_response() -> Result<()> {
    let mut panel = TestPanel::new();
    panel.init_collection("JeopardyQuestion");
    let first = panel
        .last_correlation_id()
        .context("init should have issued a fetch")?;

    panel.session.handle_event(SessionEvent::SetPage(2));
    let second = panel
        .last_correlation_id()
        .context("page change should have issued a fetch")?;
    assert_ne!(first, second);

    // The superseded response arrives late: nothing may change.
    panel.deliver(query_result(&first, json!([{"title": "old"}]), 100));
    assert!(panel.session.records().rows.is_empty());
    assert!(panel.session.records().loading);

    panel.deliver(query_result(&second, json!([{"title": "new"}]), 100));
    assert_eq!(panel.session.records().rows, vec![json!({"title": "new"})]);
    assert_eq!(panel.session.records().total_count, Some(100));
    assert!(!panel.session.records().loading);
    assert_eq!(panel.session.records().page, 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn page_change_carries_limit_and_offset() -> Result<()> {
    let mut panel = TestPanel::new();
    panel.init_collection("JeopardyQuestion");
    panel.session.handle_event(SessionEvent::SetPage(3));

    let message = panel.last_sent().context("expected an outbound query")?;
    assert_matches!(
        message,
        OutboundMessage::Query { limit: 25, offset: 50, .. }
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn timeout_fails_the_stream_and_drops_the_late_response() -> Result<()> {
    let config = SessionConfig {
        request_timeout: Some(Duration::from_secs(5)),
        ..SessionConfig::default()
    };
    let mut panel = TestPanel::with_config(config);
    panel.init_collection("JeopardyQuestion");
    let id = panel
        .last_correlation_id()
        .context("init should have issued a fetch")?;

    panel.settle().await;
    tokio::time::advance(Duration::from_secs(5)).await;
    panel.settle().await;

    assert_eq!(panel.session.records().error.as_deref(), Some("request timed out"));
    assert!(!panel.session.records().loading);

    // The timed-out id is no longer current, so its response is stale.
    panel.deliver(query_result(&id, json!([{"title": "late"}]), 1));
    assert!(panel.session.records().rows.is_empty());
    assert_eq!(panel.session.records().error.as_deref(), Some("request timed out"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn refresh_push_reissues_under_a_fresh_id() -> Result<()> {
    let mut panel = TestPanel::new();
    panel.init_collection("JeopardyQuestion");
    let first = panel
        .last_correlation_id()
        .context("init should have issued a fetch")?;
    panel.deliver(query_result(&first, json!([{"title": "a"}]), 1));

    panel.deliver(json!({"kind": "refresh"}));
    let second = panel
        .last_correlation_id()
        .context("refresh should have re-issued")?;
    assert_ne!(first, second);
    assert!(panel.session.records().loading);

    // Only the fresh id reconciles.
    panel.deliver(query_result(&first, json!([{"title": "stale"}]), 1));
    assert_eq!(panel.session.records().rows, vec![json!({"title": "a"})]);
    panel.deliver(query_result(&second, json!([{"title": "b"}]), 1));
    assert_eq!(panel.session.records().rows, vec![json!({"title": "b"})]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn refresh_before_any_fetch_is_a_no_op() {
    let mut panel = TestPanel::new();
    panel.deliver(json!({"kind": "refresh"}));
    assert!(panel.sent().is_empty());
    assert!(!panel.session.records().loading);
}

#[tokio::test(start_paused = true)]
async fn backend_error_is_surfaced_only_for_the_current_request() -> Result<()> {
    let mut panel = TestPanel::new();
    panel.init_collection("JeopardyQuestion");
    let first = panel
        .last_correlation_id()
        .context("init should have issued a fetch")?;
    panel.session.handle_event(SessionEvent::SetPage(2));
    let second = panel
        .last_correlation_id()
        .context("page change should have issued a fetch")?;

    // Failure of the superseded request must not clobber the newer one.
    panel.deliver(backend_error(&first, "query exploded"));
    assert_eq!(panel.session.records().error, None);
    assert!(panel.session.records().loading);

    panel.deliver(backend_error(&second, "query exploded"));
    assert_eq!(panel.session.records().error.as_deref(), Some("query exploded"));
    assert!(!panel.session.records().loading);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn debounced_burst_issues_leading_and_trailing_only() -> Result<()> {
    let mut panel = TestPanel::new();
    panel.init_collection("JeopardyQuestion");
    let after_init = panel.sent().len();

    // Three rapid edits: the first issues immediately, the rest coalesce.
    panel
        .session
        .handle_event(SessionEvent::AddActiveFilter(filter("title")));
    panel
        .session
        .handle_event(SessionEvent::AddActiveFilter(filter("round")));
    panel
        .session
        .handle_event(SessionEvent::AddActiveFilter(filter("points")));
    assert_eq!(panel.sent().len(), after_init + 1);

    panel.settle().await;
    tokio::time::advance(DEFAULT_DEBOUNCE_WINDOW).await;
    panel.settle().await;

    let messages = panel.sent();
    assert_eq!(messages.len(), after_init + 2);
    // The trailing issue reflects the last payload: all three conditions.
    let Some(OutboundMessage::Query { filters, .. }) = messages.last() else {
        anyhow::bail!("expected a trailing query");
    };
    assert_eq!(filters.len(), 3);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn trailing_issue_puts_the_stream_back_in_flight() -> Result<()> {
    let mut panel = TestPanel::new();
    panel.init_collection("JeopardyQuestion");

    panel
        .session
        .handle_event(SessionEvent::AddActiveFilter(filter("title")));
    panel
        .session
        .handle_event(SessionEvent::AddActiveFilter(filter("round")));

    // The leading response lands inside the window.
    let leading = panel
        .last_correlation_id()
        .context("burst should have a leading issue")?;
    panel.deliver(query_result(&leading, json!([{"title": "leading"}]), 1));
    assert!(!panel.session.records().loading);

    panel.settle().await;
    tokio::time::advance(DEFAULT_DEBOUNCE_WINDOW).await;
    panel.settle().await;

    assert!(panel.session.records().loading);
    let trailing = panel
        .last_correlation_id()
        .context("window close should issue the trailing request")?;
    assert_ne!(leading, trailing);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn lone_debounced_edit_issues_immediately() {
    let mut panel = TestPanel::new();
    panel.init_collection("JeopardyQuestion");
    let after_init = panel.sent().len();

    panel
        .session
        .handle_event(SessionEvent::AddActiveFilter(filter("title")));
    assert_eq!(panel.sent().len(), after_init + 1);
}

#[tokio::test(start_paused = true)]
async fn malformed_messages_become_a_recoverable_error() {
    let mut panel = TestPanel::new();
    panel.init_collection("JeopardyQuestion");
    panel.deliver(json!({"records": []}));
    assert_eq!(
        panel.session.records().error.as_deref(),
        Some("failed to process message")
    );

    // The session keeps working afterwards.
    panel.session.handle_event(SessionEvent::SetPage(2));
    assert!(panel.session.records().loading);
    assert_eq!(panel.session.records().error, None);
}

#[tokio::test(start_paused = true)]
async fn closed_channel_degrades_to_a_flag() {
    let (events_tx, _events_rx) = tokio::sync::mpsc::unbounded_channel();
    let mut session =
        PanelSession::new(Box::new(ClosedSender), events_tx, SessionConfig::default());
    assert!(!session.channel_closed());
    session.announce_ready();
    assert!(session.channel_closed());

    // Still no panic on further traffic.
    session.handle_event(SessionEvent::MessageReceived(json!({
        "kind": "init",
        "collection": "JeopardyQuestion",
        "properties": [],
    })));
    assert!(session.collection().is_some());
}
