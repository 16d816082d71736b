mod common;

use api_lib::adapters::InMemoryDatabase;
use common::{live_state, seed, user_at};
use matching_core::ports::PortError;
use std::sync::Arc;
use uuid::Uuid;

#[tokio::test]
async fn finds_only_users_inside_the_default_radius() {
    let db = Arc::new(InMemoryDatabase::new());
    let reference = user_at("ref", 0.0, 0.0);
    let close = user_at("close", 0.0, 0.05);
    let far = user_at("far", 0.0, 1.0);
    for user in [&reference, &close, &far] {
        seed(&db, user).await;
    }
    let state = live_state(db);

    let nearby = state.proximity.find_nearby(reference.id, None).await.unwrap();

    assert_eq!(nearby.len(), 1);
    assert_eq!(nearby[0].user, close);
    assert!(nearby[0].distance_km < 10.0);
}

#[tokio::test]
async fn never_includes_the_reference_user_even_with_a_twin_at_the_same_spot() {
    let db = Arc::new(InMemoryDatabase::new());
    let reference = user_at("ref", 45.0, 7.0);
    let twin = user_at("twin", 45.0, 7.0);
    seed(&db, &reference).await;
    seed(&db, &twin).await;
    let state = live_state(db);

    let ids: Vec<_> = state
        .proximity
        .find_nearby(reference.id, None)
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.user.id)
        .collect();

    assert_eq!(ids, [twin.id]);
}

#[tokio::test]
async fn explicit_radius_widens_the_search() {
    let db = Arc::new(InMemoryDatabase::new());
    let reference = user_at("ref", 0.0, 0.0);
    let close = user_at("close", 0.0, 0.05);
    let far = user_at("far", 0.0, 1.0);
    for user in [&reference, &close, &far] {
        seed(&db, user).await;
    }
    let state = live_state(db);

    let names: Vec<_> = state
        .proximity
        .find_nearby(reference.id, Some(200.0))
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.user.name)
        .collect();

    assert_eq!(names, ["close", "far"]);
}

#[tokio::test]
async fn unknown_reference_user_is_not_found() {
    let state = live_state(Arc::new(InMemoryDatabase::new()));

    let result = state.proximity.find_nearby(Uuid::new_v4(), None).await;

    assert!(matches!(result, Err(PortError::NotFound(_))), "{result:?}");
}

#[tokio::test]
async fn non_positive_or_non_finite_radius_is_invalid_input() {
    let db = Arc::new(InMemoryDatabase::new());
    let reference = user_at("ref", 0.0, 0.0);
    seed(&db, &reference).await;
    let state = live_state(db);

    for radius in [0.0, -5.0, f64::NAN, f64::INFINITY] {
        let result = state.proximity.find_nearby(reference.id, Some(radius)).await;
        assert!(
            matches!(result, Err(PortError::InvalidInput(_))),
            "radius {radius} gave {result:?}"
        );
    }
}
