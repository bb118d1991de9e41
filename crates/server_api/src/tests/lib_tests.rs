use super::*;
use heating::ControllerPolicy;
use shared::error::ErrorCode;
use shared::domain::HeatingStatus;

async fn setup() -> ApiContext {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    ApiContext::new(storage, ControllerPolicy::default())
}

#[tokio::test]
async fn manual_start_reports_conversion_note() {
    let ctx = setup().await;
    let response = start_manual(
        &ctx,
        ManualHeatingRequest {
            time_in_seconds: Some(95),
            power: Some(4),
        },
    )
    .await
    .expect("start");

    assert_eq!(response.status.status, HeatingStatus::InProgress);
    assert_eq!(response.status.display_time, "1:35");
    assert!(response
        .conversion_note
        .expect("note")
        .contains("1 minute(s) 35 second(s)"));
}

#[tokio::test]
async fn missing_time_is_a_validation_error() {
    let ctx = setup().await;
    let err = start_manual(&ctx, ManualHeatingRequest::default())
        .await
        .expect_err("time is mandatory");
    assert_eq!(err.code, ErrorCode::Validation);
}

#[tokio::test]
async fn predefined_start_carries_instructions() {
    let ctx = setup().await;
    let response = start_predefined(
        &ctx,
        PredefinedHeatingRequest {
            name: "Beef".into(),
        },
    )
    .await
    .expect("start");
    assert!(response.instructions.is_some());
    assert!(response.status.is_predefined_program);

    let err = start_manual(&ctx, ManualHeatingRequest::default())
        .await
        .expect_err("no added time for predefined");
    assert_eq!(err.code, ErrorCode::Conflict);
}

#[tokio::test]
async fn unknown_program_is_not_found() {
    let ctx = setup().await;
    let err = start_predefined(
        &ctx,
        PredefinedHeatingRequest {
            name: "Lasagna".into(),
        },
    )
    .await
    .expect_err("unknown");
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn pause_resume_cancel_round() {
    let ctx = setup().await;
    assert_eq!(pause(&ctx).await.status.status, HeatingStatus::Stopped);

    quick_start(&ctx).await.expect("quick start");
    assert_eq!(pause(&ctx).await.status.status, HeatingStatus::Paused);
    assert_eq!(
        resume(&ctx).await.expect("resume").status.status,
        HeatingStatus::InProgress
    );

    let cancelled = cancel(&ctx).await;
    assert_eq!(cancelled.status.status, HeatingStatus::Stopped);
    assert_eq!(cancelled.status.time_remaining, 0);
    assert_eq!(current_status(&ctx).await, cancelled.status);
}

#[tokio::test]
async fn store_failure_maps_to_internal() {
    let ctx = setup().await;
    ctx.storage.pool().close().await;

    let err = list_programs(&ctx).await.expect_err("closed pool");
    assert_eq!(err.code, ErrorCode::Internal);
    assert!(health(&ctx).await.is_err());
}

#[tokio::test]
async fn add_program_then_list() {
    let ctx = setup().await;
    let created = add_program(
        &ctx,
        NewProgram {
            name: "Soup".into(),
            food: "Tomato soup".into(),
            time_in_seconds: 150,
            power: 6,
            heating_char: 'S',
            instructions: None,
        },
    )
    .await
    .expect("add");
    assert!(!created.is_predefined);

    let programs = list_programs(&ctx).await.expect("list");
    assert_eq!(programs.len(), 6);
    assert!(programs.contains(&created));
}
