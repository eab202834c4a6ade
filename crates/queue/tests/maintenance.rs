//! Maintenance item workflow tests: creation, approval, completion and cost.

mod common;

use assert_matches::assert_matches;
use bayline_core::error::CoreError;
use bayline_core::maintenance::{ItemPriority, ItemStatus, ItemType};
use bayline_core::ticket::TicketStatus;
use bayline_core::types::DbId;
use bayline_db::models::maintenance_item::{
    DiscoveredItemInput, InitialItemInput, ItemListParams,
};
use bayline_queue::ServiceError;
use common::{day, Fixture};

fn discovered(ticket_id: DbId, name: &str, cost: f64) -> DiscoveredItemInput {
    DiscoveredItemInput {
        ticket_id,
        category: "brakes".to_string(),
        name: name.to_string(),
        description: Some("Worn below limit".to_string()),
        priority: ItemPriority::High,
        estimated_cost: cost,
        labor_hours: Some(1.0),
        requires_approval: true,
        image_url: None,
        notes: None,
    }
}

fn initial(name: &str, cost: f64) -> InitialItemInput {
    InitialItemInput {
        category: "engine".to_string(),
        name: name.to_string(),
        description: None,
        priority: ItemPriority::Normal,
        estimated_cost: cost,
        labor_hours: None,
        notes: None,
    }
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn initial_items_are_pending_and_preapproved() {
    let fx = Fixture::new();
    let ticket = fx.put(day("2026-03-14"), 1, TicketStatus::Waiting);

    let items = fx
        .items
        .create_initial_items(ticket.id, vec![initial("Oil change", 40.0), initial("Filter", 15.0)])
        .await
        .unwrap();

    assert_eq!(items.len(), 2);
    for item in &items {
        assert_eq!(item.item_type, ItemType::Initial);
        assert_eq!(item.status, ItemStatus::Pending);
        assert!(!item.requires_approval);
        assert!(item.mechanic_id.is_none());
    }
}

#[tokio::test]
async fn initial_items_need_an_existing_ticket() {
    let fx = Fixture::new();
    let err = fx
        .items
        .create_initial_items(777, vec![initial("Oil change", 40.0)])
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::NotFound { entity: "ticket", .. }));
}

#[tokio::test]
async fn one_invalid_initial_item_creates_nothing() {
    let fx = Fixture::new();
    let ticket = fx.put(day("2026-03-14"), 1, TicketStatus::Waiting);

    let err = fx
        .items
        .create_initial_items(ticket.id, vec![initial("Oil change", 40.0), initial("", 5.0)])
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::Validation(_)));

    let items = fx
        .items
        .list_items(ticket.id, &ItemListParams::default())
        .await
        .unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn discovered_item_is_inspected_and_attributed() {
    let fx = Fixture::new();
    let ticket = fx.ticket_in_service(day("2026-03-14")).await;

    let item = fx
        .items
        .add_discovered_item(fx.mechanic.id, discovered(ticket.id, "Brake pads", 120.0))
        .await
        .unwrap();

    assert_eq!(item.item_type, ItemType::Discovered);
    assert_eq!(item.status, ItemStatus::Inspected);
    assert_eq!(item.mechanic_id, Some(fx.mechanic.id));
    assert_eq!(item.priority, ItemPriority::High);
    assert!(item.requires_approval);
    assert!(item.inspected_at.is_some());
}

#[tokio::test]
async fn discovery_outside_service_is_rejected() {
    let fx = Fixture::new();
    let date = day("2026-03-14");

    for status in [TicketStatus::Waiting, TicketStatus::Called, TicketStatus::Completed] {
        let ticket = fx.put(date, 1, status);
        let err = fx
            .items
            .add_discovered_item(fx.mechanic.id, discovered(ticket.id, "Pads", 10.0))
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::Core(CoreError::InvalidTransition(ref msg))
            if msg == "service must be in progress to add discovered items");
    }
}

#[tokio::test]
async fn discovery_needs_a_known_mechanic() {
    let fx = Fixture::new();
    let ticket = fx.ticket_in_service(day("2026-03-14")).await;

    let err = fx
        .items
        .add_discovered_item(31_337, discovered(ticket.id, "Pads", 10.0))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::NotFound { entity: "mechanic", .. }));
}

// ---------------------------------------------------------------------------
// Approval
// ---------------------------------------------------------------------------

#[tokio::test]
async fn owner_approves_inspected_items() {
    let fx = Fixture::new();
    let ticket = fx.ticket_in_service(day("2026-03-14")).await;
    let a = fx
        .items
        .add_discovered_item(fx.mechanic.id, discovered(ticket.id, "Pads", 100.0))
        .await
        .unwrap();
    let b = fx
        .items
        .add_discovered_item(fx.mechanic.id, discovered(ticket.id, "Discs", 200.0))
        .await
        .unwrap();

    let updated = fx
        .items
        .approve_items(fx.customer.id, &[a.id, b.id, a.id], true)
        .await
        .unwrap();

    assert_eq!(updated.len(), 2);
    for item in &updated {
        assert_eq!(item.status, ItemStatus::Approved);
        assert!(item.approved_at.is_some());
    }
}

#[tokio::test]
async fn rejection_leaves_approved_at_unset() {
    let fx = Fixture::new();
    let ticket = fx.ticket_in_service(day("2026-03-14")).await;
    let item = fx
        .items
        .add_discovered_item(fx.mechanic.id, discovered(ticket.id, "Wipers", 30.0))
        .await
        .unwrap();

    let updated = fx
        .items
        .approve_items(fx.customer.id, &[item.id], false)
        .await
        .unwrap();
    assert_eq!(updated[0].status, ItemStatus::Rejected);
    assert!(updated[0].approved_at.is_none());
}

#[tokio::test]
async fn foreign_item_rejects_whole_batch() {
    let fx = Fixture::new();
    let date = day("2026-03-14");
    let mine = fx.ticket_in_service(date).await;

    let theirs = fx.queue.take_queue_number(fx.other_draft(date)).await.unwrap();
    fx.queue.call_customer(theirs.id).await.unwrap();
    fx.queue.start_service(theirs.id).await.unwrap();

    let own_item = fx
        .items
        .add_discovered_item(fx.mechanic.id, discovered(mine.id, "Pads", 100.0))
        .await
        .unwrap();
    let foreign_item = fx
        .items
        .add_discovered_item(fx.mechanic.id, discovered(theirs.id, "Belt", 80.0))
        .await
        .unwrap();

    let err = fx
        .items
        .approve_items(fx.customer.id, &[own_item.id, foreign_item.id], true)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::Unauthorized(_)));

    let inspected = fx
        .items
        .list_items(
            mine.id,
            &ItemListParams {
                status: Some(ItemStatus::Inspected),
                item_type: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(inspected.len(), 1);
    let foreign = fx
        .items
        .list_items(theirs.id, &ItemListParams::default())
        .await
        .unwrap();
    assert_eq!(foreign[0].status, ItemStatus::Inspected);
}

#[tokio::test]
async fn non_inspected_item_rejects_whole_batch() {
    let fx = Fixture::new();
    let ticket = fx.ticket_in_service(day("2026-03-14")).await;
    let inspected = fx
        .items
        .add_discovered_item(fx.mechanic.id, discovered(ticket.id, "Pads", 100.0))
        .await
        .unwrap();
    let pending = fx
        .items
        .create_initial_items(ticket.id, vec![initial("Oil", 40.0)])
        .await
        .unwrap()
        .remove(0);

    let err = fx
        .items
        .approve_items(fx.customer.id, &[inspected.id, pending.id], true)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::InvalidTransition(ref msg))
        if msg == "item is not in inspected status");

    let summary = fx.items.inspection_summary(ticket.id).await.unwrap();
    assert_eq!(summary.counts.inspected, 1);
    assert_eq!(summary.counts.approved, 0);
}

#[tokio::test]
async fn empty_or_unknown_batches_fail() {
    let fx = Fixture::new();
    let err = fx
        .items
        .approve_items(fx.customer.id, &[], true)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::Validation(_)));

    let err = fx
        .items
        .approve_items(fx.customer.id, &[8_080], true)
        .await
        .unwrap_err();
    assert_matches!(
        err,
        ServiceError::Core(CoreError::NotFound { entity: "maintenance_item", id: 8_080 })
    );
}

#[tokio::test]
async fn concurrent_decisions_on_one_item_let_only_one_win() {
    let fx = Fixture::with_yielding_item_reads();
    let ticket = fx.ticket_in_service(day("2026-03-14")).await;
    let item = fx
        .items
        .add_discovered_item(fx.mechanic.id, discovered(ticket.id, "Pads", 100.0))
        .await
        .unwrap();

    let ids = [item.id];
    let (approve, reject) = tokio::join!(
        fx.items.approve_items(fx.customer.id, &ids, true),
        fx.items.approve_items(fx.customer.id, &ids, false),
    );

    let (winner, loser) = match (approve, reject) {
        (Ok(won), Err(lost)) | (Err(lost), Ok(won)) => (won, lost),
        (a, r) => panic!("expected exactly one decision to stick: {a:?} / {r:?}"),
    };
    assert_matches!(loser, ServiceError::Core(CoreError::InvalidTransition(ref msg))
        if msg == "item is not in inspected status");

    let stored = fx
        .items
        .list_items(ticket.id, &ItemListParams::default())
        .await
        .unwrap();
    assert_eq!(stored[0].status, winner[0].status);
}

// ---------------------------------------------------------------------------
// Completion, skipping and cost
// ---------------------------------------------------------------------------

#[tokio::test]
async fn complete_requires_approved_or_pending() {
    let fx = Fixture::new();
    let ticket = fx.ticket_in_service(day("2026-03-14")).await;
    let inspected = fx
        .items
        .add_discovered_item(fx.mechanic.id, discovered(ticket.id, "Pads", 100.0))
        .await
        .unwrap();

    let err = fx.items.complete_item(inspected.id, 95.0).await.unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::InvalidTransition(ref msg))
        if msg == "item must be approved or pending to complete");

    fx.items
        .approve_items(fx.customer.id, &[inspected.id], true)
        .await
        .unwrap();
    let done = fx.items.complete_item(inspected.id, 95.0).await.unwrap();
    assert_eq!(done.status, ItemStatus::Completed);
    assert_eq!(done.actual_cost, Some(95.0));
    assert!(done.completed_at.is_some());
}

#[tokio::test]
async fn item_can_be_completed_after_ticket_completes() {
    let fx = Fixture::new();
    let ticket = fx.ticket_in_service(day("2026-03-14")).await;
    let pending = fx
        .items
        .create_initial_items(ticket.id, vec![initial("Oil", 40.0)])
        .await
        .unwrap()
        .remove(0);
    fx.queue.complete_service(ticket.id).await.unwrap();

    let done = fx.items.complete_item(pending.id, 42.5).await.unwrap();
    assert_eq!(done.status, ItemStatus::Completed);
}

#[tokio::test]
async fn only_pending_items_can_be_skipped() {
    let fx = Fixture::new();
    let ticket = fx.ticket_in_service(day("2026-03-14")).await;
    let pending = fx
        .items
        .create_initial_items(ticket.id, vec![initial("Oil", 40.0)])
        .await
        .unwrap()
        .remove(0);

    let skipped = fx.items.skip_item(pending.id).await.unwrap();
    assert_eq!(skipped.status, ItemStatus::Skipped);

    let err = fx.items.skip_item(pending.id).await.unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::InvalidTransition(_)));
}

#[tokio::test]
async fn concurrent_complete_and_skip_let_only_one_win() {
    let fx = Fixture::with_yielding_item_reads();
    let ticket = fx.ticket_in_service(day("2026-03-14")).await;
    let pending = fx
        .items
        .create_initial_items(ticket.id, vec![initial("Oil", 40.0)])
        .await
        .unwrap()
        .remove(0);

    let (completed, skipped) = tokio::join!(
        fx.items.complete_item(pending.id, 40.0),
        fx.items.skip_item(pending.id),
    );

    let winner = match (completed, skipped) {
        (Ok(item), Err(err)) | (Err(err), Ok(item)) => {
            assert_matches!(err, ServiceError::Core(CoreError::InvalidTransition(_)));
            item
        }
        (c, s) => panic!("expected exactly one update to stick: {c:?} / {s:?}"),
    };

    let stored = fx
        .items
        .list_items(ticket.id, &ItemListParams::default())
        .await
        .unwrap();
    assert_eq!(stored[0].status, winner.status);
}

#[tokio::test]
async fn cost_excludes_rejected_and_skipped() {
    let fx = Fixture::new();
    let ticket = fx.ticket_in_service(day("2026-03-14")).await;

    let initial_items = fx
        .items
        .create_initial_items(
            ticket.id,
            vec![initial("Oil", 40.0), initial("Filter", 15.0)],
        )
        .await
        .unwrap();
    fx.items.complete_item(initial_items[0].id, 45.0).await.unwrap();
    fx.items.skip_item(initial_items[1].id).await.unwrap();

    let approved = fx
        .items
        .add_discovered_item(fx.mechanic.id, discovered(ticket.id, "Pads", 100.0))
        .await
        .unwrap();
    let rejected = fx
        .items
        .add_discovered_item(fx.mechanic.id, discovered(ticket.id, "Discs", 300.0))
        .await
        .unwrap();
    fx.items
        .approve_items(fx.customer.id, &[approved.id], true)
        .await
        .unwrap();
    fx.items
        .approve_items(fx.customer.id, &[rejected.id], false)
        .await
        .unwrap();

    let cost = fx.items.total_cost(ticket.id).await.unwrap();
    assert_eq!(cost.total_estimated, 140.0);
    assert_eq!(cost.total_actual, 45.0);

    let summary = fx.items.inspection_summary(ticket.id).await.unwrap();
    assert_eq!(summary.total_items, 4);
    assert_eq!(summary.counts.completed, 1);
    assert_eq!(summary.counts.skipped, 1);
    assert_eq!(summary.counts.approved, 1);
    assert_eq!(summary.counts.rejected, 1);
    assert_eq!(summary.awaiting_decision, 0);
    assert_eq!(summary.cost, cost);
}

#[tokio::test]
async fn list_filters_by_type() {
    let fx = Fixture::new();
    let ticket = fx.ticket_in_service(day("2026-03-14")).await;
    fx.items
        .create_initial_items(ticket.id, vec![initial("Oil", 40.0)])
        .await
        .unwrap();
    fx.items
        .add_discovered_item(fx.mechanic.id, discovered(ticket.id, "Pads", 100.0))
        .await
        .unwrap();

    let found = fx
        .items
        .list_items(
            ticket.id,
            &ItemListParams {
                status: None,
                item_type: Some(ItemType::Discovered),
            },
        )
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Pads");
}

// ---------------------------------------------------------------------------
// End to end
// ---------------------------------------------------------------------------

#[tokio::test]
async fn service_walk_then_foreign_approval_is_unauthorized() {
    let fx = Fixture::new();
    let date = day("2026-03-14");
    for n in 1..=4 {
        fx.store
            .put_ticket(&fx.other_draft(date), n, TicketStatus::Completed);
    }

    let ticket = fx.queue.take_queue_number(fx.draft(date)).await.unwrap();
    assert_eq!(ticket.queue_number, 5);
    assert_eq!(ticket.status, TicketStatus::Waiting);

    let called = fx.queue.call_customer(ticket.id).await.unwrap();
    assert_eq!(called.status, TicketStatus::Called);
    assert!(called.called_at.is_some());

    let started = fx.queue.start_service(ticket.id).await.unwrap();
    assert_eq!(started.status, TicketStatus::InService);

    let item = fx
        .items
        .add_discovered_item(fx.mechanic.id, discovered(ticket.id, "Timing belt", 250.0))
        .await
        .unwrap();
    assert_eq!(item.status, ItemStatus::Inspected);

    let err = fx
        .items
        .approve_items(fx.other_customer.id, &[item.id], true)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::Unauthorized(_)));
}
