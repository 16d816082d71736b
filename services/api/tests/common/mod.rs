#![allow(dead_code)]

use api_lib::adapters::InMemoryDatabase;
use api_lib::config::Config;
use api_lib::push::ConnectionRegistry;
use api_lib::web::state::AppState;
use async_trait::async_trait;
use matching_core::domain::{GeoPoint, LikeDuplicatePolicy, User};
use matching_core::ports::NotificationService;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Records every notification instead of delivering it.
#[derive(Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<(Uuid, Uuid)>>,
}

impl RecordingNotifier {
    /// `(target, actor)` pairs in call order.
    pub async fn calls(&self) -> Vec<(Uuid, Uuid)> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl NotificationService for RecordingNotifier {
    async fn notify_liked(&self, target_id: Uuid, actor_id: Uuid) {
        self.calls.lock().await.push((target_id, actor_id));
    }
}

pub fn user_at(name: &str, latitude: f64, longitude: f64) -> User {
    User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: format!("{name}@example.com"),
        position: GeoPoint::new(latitude, longitude),
        images: vec![format!("/images/{name}.jpg")],
    }
}

pub async fn seed(db: &InMemoryDatabase, user: &User) {
    db.insert_user(user.clone()).await;
    db.issue_token(format!("token-{}", user.name), user.email.clone())
        .await;
}

pub fn config(policy: LikeDuplicatePolicy) -> Arc<Config> {
    Arc::new(Config {
        like_duplicates: policy,
        ..Config::default()
    })
}

/// State wired with the real registry-backed dispatcher.
pub fn live_state(db: Arc<InMemoryDatabase>) -> AppState {
    AppState::new(config(LikeDuplicatePolicy::Allow), db.clone(), db)
}

/// State whose notifications land in the returned recorder.
pub fn recording_state(
    db: Arc<InMemoryDatabase>,
    policy: LikeDuplicatePolicy,
) -> (AppState, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let state = AppState::with_notifier(
        config(policy),
        db.clone(),
        db,
        Arc::new(ConnectionRegistry::new()),
        notifier.clone(),
    );
    (state, notifier)
}
