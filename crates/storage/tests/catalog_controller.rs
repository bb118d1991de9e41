use std::sync::Arc;

use heating::{HeatingController, HeatingError};
use shared::{domain::HeatingStatus, protocol::NewProgram};
use storage::Storage;

async fn controller() -> (HeatingController, Storage) {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    (HeatingController::new(Arc::new(storage.clone())), storage)
}

#[tokio::test]
async fn predefined_program_runs_from_sqlite_catalog() {
    let (controller, _storage) = controller().await;
    let applied = controller.start_predefined("popcorn").await.expect("start");

    assert_eq!(applied.outcome.program.name, "Popcorn");
    assert_eq!(applied.status.display_time, "3:00");
    assert!(applied.status.is_predefined_program);

    let after = controller.advance_one_second().await;
    assert_eq!(after.processing_trace, "PPPPPPP");
    assert_eq!(after.display_time, "2:59");
}

#[tokio::test]
async fn registered_program_is_persisted_and_startable() {
    let (controller, storage) = controller().await;
    controller
        .add_program(NewProgram {
            name: "Porridge".into(),
            food: "Oat porridge".into(),
            time_in_seconds: 150,
            power: 6,
            heating_char: 'O',
            instructions: Some("Stir halfway.".into()),
        })
        .await
        .expect("add program");

    assert!(storage.heating_char_exists('O').await.expect("marker"));

    let applied = controller.start_predefined("PORRIDGE").await.expect("start");
    assert_eq!(applied.outcome.instructions(), Some("Stir halfway."));
    assert_eq!(applied.status.status, HeatingStatus::InProgress);
}

#[tokio::test]
async fn duplicate_registration_is_rejected_without_writes() {
    let (controller, storage) = controller().await;
    let err = controller
        .add_program(NewProgram {
            name: "Milk".into(),
            food: "More milk".into(),
            time_in_seconds: 60,
            power: 3,
            heating_char: 'k',
            instructions: None,
        })
        .await
        .expect_err("duplicate");
    assert!(matches!(err, HeatingError::Validation(_)));
    assert!(!storage.heating_char_exists('k').await.expect("marker"));
    assert_eq!(storage.list_programs().await.expect("list").len(), 5);
}

#[tokio::test]
async fn closed_pool_surfaces_store_error() {
    let (controller, storage) = controller().await;
    storage.pool().close().await;

    let err = controller
        .start_predefined("Milk")
        .await
        .expect_err("closed pool");
    assert!(matches!(err, HeatingError::Store(_)));
    assert_eq!(
        controller.current_status().await.status,
        HeatingStatus::Stopped
    );
}
