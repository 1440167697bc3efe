//! Collection-change cascade: a changed `init` resets filters, search, and
//! pagination as one unit; a duplicate `init` does nothing at all.

use anyhow::Context;
use anyhow::Result;
use core_test_support::TestPanel;
use core_test_support::query_result;
use core_test_support::vector_search_result;
use periscope_core::SearchParamsPatch;
use periscope_core::SessionEvent;
use periscope_protocol::FilterCondition;
use periscope_protocol::FilterOperator;
use periscope_protocol::MatchMode;
use periscope_protocol::OutboundMessage;
use pretty_assertions::assert_eq;
use serde_json::json;

fn round_filter() -> FilterCondition {
    FilterCondition::new("round", FilterOperator::Equal, json!("Final Jeopardy"))
}

fn init_movies(panel: &mut TestPanel) {
    panel.deliver(json!({
        "kind": "init",
        "collection": "Movie",
        "properties": [{"name": "synopsis", "dataType": "text"}],
    }));
}

#[tokio::test(start_paused = true)]
async fn collection_change_resets_state_as_one_unit() -> Result<()> {
    let mut panel = TestPanel::new();
    panel.init_collection("JeopardyQuestion");
    let id = panel
        .last_correlation_id()
        .context("init should trigger a fetch")?;
    panel.deliver(query_result(&id, json!([{"title": "old row"}]), 1));

    panel
        .session
        .handle_event(SessionEvent::AddActiveFilter(round_filter()));
    panel.session.handle_event(SessionEvent::SavePreset {
        name: "finals only".to_string(),
    });
    panel
        .session
        .handle_event(SessionEvent::SetSearchPanelOpen(true));
    panel
        .session
        .handle_event(SessionEvent::SetSearchParams(SearchParamsPatch::query(
            "space",
        )));
    panel.session.handle_event(SessionEvent::ExecuteSearch);
    let search_id = panel
        .last_correlation_id()
        .context("execute should send")?;
    panel.deliver(vector_search_result(&search_id, json!([{"record": {}}])));
    panel.session.handle_event(SessionEvent::SetPage(3));

    init_movies(&mut panel);

    let filters = panel.session.filters();
    assert!(filters.active().is_empty());
    assert!(!filters.staging());
    assert_eq!(filters.match_mode(), MatchMode::And);
    assert_eq!(filters.presets().len(), 1, "presets survive the cascade");

    let search = panel.session.search();
    assert_eq!(search.params().query, "");
    assert!(search.results().is_empty());
    assert!(!search.has_searched());
    assert!(search.panel_open(), "panel visibility survives the cascade");

    let records = panel.session.records();
    assert!(records.rows.is_empty());
    assert_eq!(records.total_count, None);
    assert_eq!(records.page, 1);
    assert!(records.loading, "the new collection's page 1 is in flight");

    let collection = panel.session.collection().context("collection set")?;
    assert_eq!(collection.name, "Movie");
    assert_eq!(collection.properties[0].name, "synopsis");

    let message = panel.last_sent().context("cascade should refetch")?;
    let OutboundMessage::Query {
        collection,
        filters,
        offset,
        ..
    } = message
    else {
        anyhow::bail!("expected a query, got {message:?}");
    };
    assert_eq!(collection, "Movie");
    assert!(filters.is_empty());
    assert_eq!(offset, 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn duplicate_init_is_a_total_no_op() -> Result<()> {
    let mut panel = TestPanel::new();
    panel.init_collection("JeopardyQuestion");
    let id = panel
        .last_correlation_id()
        .context("init should trigger a fetch")?;
    panel.deliver(query_result(&id, json!([{"a": 1}, {"a": 2}]), 2));
    panel
        .session
        .handle_event(SessionEvent::AddActiveFilter(round_filter()));
    panel
        .session
        .handle_event(SessionEvent::SetSearchParams(SearchParamsPatch::query(
            "kept",
        )));
    let baseline = panel.sent().len();

    panel.init_collection("JeopardyQuestion");

    assert_eq!(panel.sent().len(), baseline, "no refetch on duplicate init");
    assert_eq!(panel.session.records().rows.len(), 2);
    assert_eq!(panel.session.filters().active().len(), 1);
    assert_eq!(panel.session.search().params().query, "kept");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn late_response_for_the_old_collection_never_lands() -> Result<()> {
    let mut panel = TestPanel::new();
    panel.init_collection("JeopardyQuestion");
    let old_id = panel
        .last_correlation_id()
        .context("init should trigger a fetch")?;

    init_movies(&mut panel);
    let new_id = panel
        .last_correlation_id()
        .context("cascade should refetch")?;
    assert_ne!(old_id, new_id);

    panel.deliver(query_result(&old_id, json!([{"title": "old"}]), 7));
    assert!(panel.session.records().rows.is_empty());
    assert_eq!(panel.session.records().total_count, None);
    assert!(panel.session.records().loading);

    panel.deliver(query_result(&new_id, json!([{"synopsis": "new"}]), 1));
    assert_eq!(panel.session.records().rows.len(), 1);
    assert!(!panel.session.records().loading);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn cascade_cancels_an_in_flight_search() -> Result<()> {
    let mut panel = TestPanel::new();
    panel.init_collection("JeopardyQuestion");
    panel
        .session
        .handle_event(SessionEvent::SetSearchParams(SearchParamsPatch::query(
            "orphaned",
        )));
    panel.session.handle_event(SessionEvent::ExecuteSearch);
    let search_id = panel
        .last_correlation_id()
        .context("execute should send")?;

    init_movies(&mut panel);

    panel.deliver(vector_search_result(&search_id, json!([{"record": {}}])));
    assert!(panel.session.search().results().is_empty());
    assert!(!panel.session.search().searching());
    assert!(!panel.session.search().has_searched());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn pagination_after_the_cascade_targets_the_new_collection() -> Result<()> {
    let mut panel = TestPanel::new();
    panel.init_collection("JeopardyQuestion");
    init_movies(&mut panel);

    panel.session.handle_event(SessionEvent::SetPage(2));
    let message = panel.last_sent().context("page change should fetch")?;
    let OutboundMessage::Query {
        collection, offset, ..
    } = message
    else {
        anyhow::bail!("expected a query, got {message:?}");
    };
    assert_eq!(collection, "Movie");
    assert_eq!(offset, 25);
    Ok(())
}
