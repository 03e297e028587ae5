mod common;

use std::sync::Arc;

use common::FakeProvider;
use fitness_tracker::error::Error;
use fitness_tracker::prelude::*;
use fitness_tracker::storage::{FileStore, KeyValueStore, MemoryStore};
use fitness_tracker::validation::{self, Field};

fn options() -> AppOptions {
    AppOptions::new("http://localhost", "anon")
}

fn app(store: &Arc<MemoryStore>, provider: &Arc<FakeProvider>) -> FitnessApp {
    FitnessApp::from_parts(store.clone(), provider.clone(), options())
}

#[tokio::test]
async fn first_run_walks_welcome_auth_main() {
    let store = Arc::new(MemoryStore::new());
    let provider = FakeProvider::new();
    let app = app(&store, &provider);

    assert_eq!(app.screen(), Screen::Loading);
    assert_eq!(app.start().await, Screen::Welcome);
    assert_eq!(app.theme().get(), Theme::Light);

    assert_eq!(app.complete_welcome().await, Screen::Auth(AuthRoute::Login));

    validation::validate_sign_up("runner@example.com", "secret1", "secret1").unwrap();
    app.auth().sign_up("runner@example.com", "secret1").await.unwrap();
    assert_eq!(app.screen(), Screen::Main(MainTab::Workouts));

    let workouts = app.catalog().list().await;
    assert_eq!(workouts.len(), 5);
    assert_eq!(workouts[0].name, "Full Body Workout");
    assert_eq!(workouts[0].category, Category::Strength);
    assert_eq!(workouts[0].difficulty, Difficulty::Intermediate);
    assert_eq!((workouts[0].duration, workouts[0].calories), (45, 350));

    let found = app.catalog().search("CARDIO").await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, "2");
    assert_eq!(app.catalog().find("2").await, Some(found[0].clone()));

    app.auth().sign_out().await;
    assert_eq!(app.screen(), Screen::Auth(AuthRoute::Login));
    app.shutdown();
}

#[tokio::test]
async fn restart_restores_everything_persisted() {
    let store = Arc::new(MemoryStore::new());
    let provider = FakeProvider::new();
    provider.register("runner@example.com", "secret1");

    let first = app(&store, &provider);
    first.start().await;
    first.complete_welcome().await;
    let user = first
        .auth()
        .sign_in("runner@example.com", "secret1")
        .await
        .unwrap();
    validation::validate_profile("Ana", "Jovanović", "+381 60 123 4567").unwrap();
    first
        .auth()
        .update_user(User {
            first_name: "Ana".to_string(),
            last_name: "Jovanović".to_string(),
            phone_number: "+381 60 123 4567".to_string(),
            ..user
        })
        .await;
    assert_eq!(first.theme().toggle().await, Theme::Dark);
    let seeded = first.catalog().list().await;
    first.shutdown();
    drop(first);

    let second = app(&store, &provider);
    assert_eq!(second.start().await, Screen::Main(MainTab::Workouts));
    assert!(second.theme().is_dark());
    assert_eq!(
        second.auth().current_user().map(|u| u.full_name()),
        Some("Ana Jovanović".to_string())
    );
    assert_eq!(second.catalog().list().await, seeded);
}

#[tokio::test]
async fn seen_welcome_and_no_session_lands_on_login() {
    let store = Arc::new(MemoryStore::new());
    store.set_item("@hasSeenWelcome", "true").await.unwrap();
    let provider = FakeProvider::new();

    let app = app(&store, &provider);
    assert_eq!(app.start().await, Screen::Auth(AuthRoute::Login));
}

#[test]
fn invalid_forms_never_reach_the_provider() {
    let errors = validation::validate_sign_in("runner", "123").unwrap_err();
    assert!(errors.message(Field::Email).is_some());

    let err: Error = errors.into();
    assert!(matches!(err, Error::Validation(_)));
    assert!(err.to_string().contains("email"));
}

#[tokio::test]
async fn file_backed_app_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fitness.json");
    let provider = FakeProvider::new();

    let first =
        FitnessApp::from_parts(Arc::new(FileStore::new(&path)), provider.clone(), options());
    assert_eq!(first.start().await, Screen::Welcome);
    first.complete_welcome().await;
    first.theme().toggle().await;
    first.shutdown();
    drop(first);

    let second =
        FitnessApp::from_parts(Arc::new(FileStore::new(&path)), provider.clone(), options());
    assert_eq!(second.start().await, Screen::Auth(AuthRoute::Login));
    assert_eq!(second.theme().get(), Theme::Dark);

    let raw = std::fs::read_to_string(&path).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(doc["@hasSeenWelcome"], "true");
    assert_eq!(doc["@theme"], "dark");
}
