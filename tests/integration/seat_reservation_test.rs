//! Integration tests for seat selection, auto-assignment and reconciliation.

mod helpers;

use std::collections::HashSet;
use std::time::Duration;

use futures::future::join_all;

use boxoffice_cache::{LockManager, SeatKey};
use boxoffice_core::traits::cache::CacheProvider;
use boxoffice_core::types::{ReservationId, SeatId};
use boxoffice_entity::reservation::SeatReservation;
use boxoffice_entity::seat::SeatStatus;
use boxoffice_reservation::{ConflictReason, ReservationOutcome, ReservationStore};

use helpers::{SCHEDULE, SeatTestApp, row};

async fn cached(app: &SeatTestApp, seat: i64) -> Option<String> {
    app.cache
        .get(&SeatKey::new(SCHEDULE, SeatId(seat)).lease())
        .await
        .unwrap()
}

async fn stored(app: &SeatTestApp, seat: i64) -> Option<SeatStatus> {
    app.store
        .find_reservation(SCHEDULE, SeatId(seat))
        .await
        .unwrap()
        .map(|r| r.status)
}

#[tokio::test]
async fn test_auto_assign_takes_first_seats_of_row() {
    let app = SeatTestApp::new(row("A", 8));

    let outcome = app.engine.auto_assign_seats(SCHEDULE, 3).await.unwrap();
    let seats: Vec<i64> = outcome
        .success()
        .expect("block should be assigned")
        .iter()
        .map(|s| s.seat_id.get())
        .collect();
    assert_eq!(seats, vec![1, 2, 3]);

    for seat in 1..=3 {
        assert_eq!(cached(&app, seat).await.as_deref(), Some("RESERVED"));
        assert_eq!(stored(&app, seat).await, Some(SeatStatus::Reserved));
    }
    for seat in 4..=8 {
        assert_ne!(stored(&app, seat).await, Some(SeatStatus::Reserved));
    }
}

#[tokio::test]
async fn test_concurrent_selects_have_one_winner() {
    let app = SeatTestApp::new(row("A", 5));

    let requests = (0..25).map(|_| app.engine.select_seat(SCHEDULE, SeatId(4)));
    let outcomes = join_all(requests).await;

    let winners = outcomes
        .iter()
        .filter(|o| o.as_ref().unwrap().is_success())
        .count();
    let conflicts = outcomes
        .iter()
        .filter(|o| o.as_ref().unwrap().is_conflict())
        .count();
    assert_eq!(winners, 1);
    assert_eq!(conflicts, 24);
    assert_eq!(stored(&app, 4).await, Some(SeatStatus::Reserved));
}

#[tokio::test]
async fn test_concurrent_auto_assign_never_double_books() {
    let mut seats = row("A", 6);
    seats.extend(row("B", 6));
    let app = SeatTestApp::new(seats);

    let requests = (0..10).map(|_| app.engine.auto_assign_seats(SCHEDULE, 2));
    let outcomes = join_all(requests).await;

    let mut taken = HashSet::new();
    let mut winners = 0;
    for outcome in outcomes {
        if let ReservationOutcome::Success(states) = outcome.unwrap() {
            winners += 1;
            for state in states {
                assert!(taken.insert(state.seat_id), "seat {} assigned twice", state.seat_id);
            }
        }
    }

    assert!(winners >= 1);
    assert!(taken.len() <= 12);
    let reserved = app
        .store
        .list_by_status(SCHEDULE, SeatStatus::Reserved)
        .await
        .unwrap();
    assert_eq!(reserved.len(), taken.len());
}

#[tokio::test]
async fn test_contiguous_block_skips_held_seat() {
    let app = SeatTestApp::new(row("A", 8));
    assert!(
        app.engine
            .select_seat(SCHEDULE, SeatId(2))
            .await
            .unwrap()
            .is_success()
    );

    let outcome = app.engine.auto_assign_seats(SCHEDULE, 3).await.unwrap();
    let seats: Vec<i64> = outcome
        .success()
        .unwrap()
        .iter()
        .map(|s| s.seat_id.get())
        .collect();
    assert_eq!(seats, vec![3, 4, 5]);
}

#[tokio::test]
async fn test_capacity_failure_commits_nothing() {
    let app = SeatTestApp::new(row("A", 5));
    app.engine.select_seat(SCHEDULE, SeatId(2)).await.unwrap();

    let outcome = app.engine.auto_assign_seats(SCHEDULE, 5).await.unwrap();
    match outcome {
        ReservationOutcome::Capacity(shortfall) => {
            assert_eq!(shortfall.requested, 5);
            assert_eq!(shortfall.available, 4);
        }
        other => panic!("expected capacity shortfall, got {other:?}"),
    }

    let reserved = app
        .store
        .list_by_status(SCHEDULE, SeatStatus::Reserved)
        .await
        .unwrap();
    assert_eq!(reserved.len(), 1);
    assert_eq!(reserved[0].seat_id, SeatId(2));
}

#[tokio::test]
async fn test_selected_seat_is_visible_immediately() {
    let app = SeatTestApp::new(row("A", 4));
    app.engine.select_seat(SCHEDULE, SeatId(3)).await.unwrap();

    let states = app.engine.get_seats_status(SCHEDULE).await.unwrap();
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].seat_id, SeatId(3));
    assert_eq!(states[0].status, SeatStatus::Reserved);
    assert_eq!(stored(&app, 3).await, Some(SeatStatus::Reserved));
}

#[tokio::test]
async fn test_store_record_wins_when_cache_is_cold() {
    let app = SeatTestApp::new(row("A", 4));
    let now = chrono::Utc::now();
    app.store
        .insert_reservation(SeatReservation {
            id: ReservationId(7),
            schedule_id: SCHEDULE,
            seat_id: SeatId(1),
            status: SeatStatus::Completed,
            created_at: now,
            updated_at: now,
        })
        .await;

    let outcome = app.engine.select_seat(SCHEDULE, SeatId(1)).await.unwrap();
    assert!(outcome.is_conflict());
    assert_eq!(cached(&app, 1).await.as_deref(), Some("COMPLETED"));
    assert_eq!(stored(&app, 1).await, Some(SeatStatus::Completed));
}

#[tokio::test]
async fn test_held_lock_answers_busy_promptly() {
    let app = SeatTestApp::new(row("A", 5));
    let key = SeatKey::new(SCHEDULE, SeatId(5));
    let locks = LockManager::new(app.cache.clone());
    assert!(
        locks
            .acquire(&key.lock(), "request-1", Duration::from_secs(300))
            .await
            .unwrap()
    );

    let outcome = tokio::time::timeout(
        Duration::from_secs(1),
        app.engine.select_seat(SCHEDULE, SeatId(5)),
    )
    .await
    .expect("select must not wait for the lock")
    .unwrap();

    match outcome {
        ReservationOutcome::Conflict(conflict) => {
            assert_eq!(conflict.reason, ConflictReason::LockBusy);
            assert_eq!(conflict.seat_id, SeatId(5));
        }
        other => panic!("expected busy conflict, got {other:?}"),
    }
    assert_ne!(stored(&app, 5).await, Some(SeatStatus::Reserved));
}

#[tokio::test]
async fn test_payment_failure_returns_seat_to_pool() {
    let app = SeatTestApp::new(row("A", 3));
    app.engine.select_seat(SCHEDULE, SeatId(1)).await.unwrap();
    let record = app
        .store
        .find_reservation(SCHEDULE, SeatId(1))
        .await
        .unwrap()
        .unwrap();

    let outcome = app
        .engine
        .set_reservation_status(record.id, SeatStatus::Available)
        .await
        .unwrap();
    assert!(outcome.is_success());

    let again = app.engine.select_seat(SCHEDULE, SeatId(1)).await.unwrap();
    assert!(again.is_success());
}
