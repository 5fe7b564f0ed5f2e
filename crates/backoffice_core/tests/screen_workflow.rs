//! Integration tests for full screen workflows
//!
//! These drive a [`Screen`] over the in-memory repository with the built-in
//! catalog schemas, the way a front end would.

use std::sync::Arc;

use backoffice_core::catalog;
use backoffice_core::options::applicable_options;
use backoffice_core::prelude::*;
use backoffice_core::repository::MemoryRepository;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;

fn outlet(schema: &EntitySchema, code: &str, name: &str) -> FormRecord {
    FormRecord::from_pairs(
        schema,
        [
            ("outlet_code", FieldValue::from(code)),
            ("outlet_name", FieldValue::from(name)),
            ("property_code", FieldValue::from("GRD")),
            ("is_active", FieldValue::from(true)),
        ],
    )
}

async fn outlet_screen() -> (Screen, Arc<MemoryRepository>) {
    let schema = Arc::new(catalog::outlets().unwrap());
    let repo = Arc::new(MemoryRepository::new(schema.clone()));
    for (code, name) in [("RST", "Restaurant"), ("BAR", "Pool Bar")] {
        repo.create(&outlet(&schema, code, name)).await.unwrap();
    }
    let screen = Screen::mount(schema, repo.clone()).await.unwrap();
    (screen, repo)
}

#[tokio::test]
async fn add_edit_delete_cycle() {
    let (mut screen, repo) = outlet_screen().await;
    assert_eq!(screen.records().len(), 2);

    // Add
    let controller = screen.controller_mut();
    controller.update_field("outlet_code", "CAF");
    controller.update_field("outlet_name", "Lobby Cafe");
    controller.update_field("property_code", "GRD");
    let outcome = screen.submit().await.unwrap();
    let SubmitOutcome::Created(Some(stored)) = outcome else {
        panic!("expected the stored record back");
    };
    assert_eq!(stored.text("id"), "3");
    assert_eq!(screen.records().len(), 3);

    // Edit
    let controller = screen.controller_mut();
    controller.select_action(Mode::Edit).unwrap();
    controller.select_record(2).unwrap();
    assert!(!controller.update_field("outlet_code", "CFE"));
    controller.update_field("outlet_name", "Lobby Coffee Shop");
    assert_eq!(screen.submit().await.unwrap(), SubmitOutcome::Updated);
    assert_eq!(repo.records()[2].text("outlet_name"), "Lobby Coffee Shop");
    assert_eq!(repo.records()[2].text("outlet_code"), "CAF");

    // Delete
    let controller = screen.controller_mut();
    controller.select_action(Mode::Delete).unwrap();
    assert_eq!(
        controller.select_record(0).unwrap(),
        SelectOutcome::ConfirmDeletion
    );
    assert_eq!(screen.confirm_delete().await.unwrap(), DeleteOutcome::Deleted);

    let codes: Vec<String> = screen
        .records()
        .iter()
        .map(|r| r.text("outlet_code").into_owned())
        .collect();
    assert_eq!(codes, vec!["BAR", "CAF"]);
    assert_eq!(screen.controller().state().mode, Mode::Add);
}

#[tokio::test]
async fn local_validation_blocks_known_duplicates() {
    let (mut screen, repo) = outlet_screen().await;

    let controller = screen.controller_mut();
    controller.update_field("outlet_code", "BAR");
    controller.update_field("outlet_name", "Another Bar");
    controller.update_field("property_code", "GRD");

    let err = screen.submit().await.unwrap_err();
    let FormError::ValidationFailed { errors } = err else {
        panic!("expected validation failure");
    };
    assert_eq!(errors["outlet_code"], "Outlet Code already exists");
    assert_eq!(repo.records().len(), 2);
}

#[tokio::test]
async fn stale_cache_duplicate_is_rejected_by_backend() {
    let (mut first, repo) = outlet_screen().await;
    let schema = first.controller().schema().clone();

    // Another client adds SPA after this screen loaded
    repo.create(&outlet(&schema, "SPA", "Spa Lounge")).await.unwrap();

    let controller = first.controller_mut();
    controller.update_field("outlet_code", "SPA");
    controller.update_field("outlet_name", "Spa");
    controller.update_field("property_code", "GRD");

    let err = first.submit().await.unwrap_err();
    let FormError::Repository(repo_err) = &err else {
        panic!("expected a repository failure, got {err:?}");
    };
    assert!(repo_err.is_duplicate_key());

    let notice = Notice::for_error(&err).unwrap();
    assert!(notice.is_error());
    assert_eq!(notice.message, "Duplicate entry 'SPA' for key 'outlet_code'");

    // The form is left as typed for a retry
    assert_eq!(
        first.controller().state().current_form.text("outlet_code"),
        "SPA"
    );
    assert!(!first.controller().state().is_submitting);
}

#[tokio::test]
async fn server_rejection_surfaces_message() {
    let (mut screen, repo) = outlet_screen().await;
    repo.fail_next("Outlet is referenced by open checks");

    let controller = screen.controller_mut();
    controller.select_action(Mode::Delete).unwrap();
    controller.select_record(1).unwrap();

    let err = screen.confirm_delete().await.unwrap_err();
    assert_eq!(err.to_string(), "Outlet is referenced by open checks");
    assert_eq!(repo.records().len(), 2);
    assert_eq!(screen.controller().state().selected_index, Some(1));
}

#[tokio::test]
async fn no_records_for_edit_on_empty_entity() {
    let schema = Arc::new(catalog::table_settings().unwrap());
    let repo = Arc::new(MemoryRepository::new(schema.clone()));
    let mut screen = Screen::mount(schema, repo).await.unwrap();

    let outcome = screen.controller_mut().select_action(Mode::Edit).unwrap();
    assert_eq!(outcome, ActionOutcome::NoRecordsAvailable);
    assert_eq!(screen.controller().state().mode, Mode::Add);
}

#[tokio::test]
async fn property_versions_resolve_for_dropdowns() {
    let schema = Arc::new(catalog::property_codes().unwrap());
    let seed = [
        ("GRD", "Grand Hotel", "2024-01-01"),
        ("GRD", "Grand Hotel & Spa", "2025-06-01"),
        ("NEW", "Harbour View", "2099-01-01"),
    ]
    .into_iter()
    .map(|(code, name, from)| {
        FormRecord::from_pairs(
            &schema,
            [
                ("property_code", code),
                ("property_name", name),
                ("applicable_from", from),
            ],
        )
    })
    .collect();
    let repo = Arc::new(MemoryRepository::with_records(schema.clone(), seed));
    let screen = Screen::mount(schema.clone(), repo).await.unwrap();

    let as_of = NaiveDate::from_ymd_opt(2025, 10, 21).unwrap();
    let applicable = screen.applicable(as_of).unwrap();
    assert_eq!(applicable.len(), 1);
    assert_eq!(applicable[0].text("applicable_from"), "2025-06-01");

    let options = applicable_options(&schema, screen.records(), as_of, "property_name").unwrap();
    assert_eq!(options.len(), 1);
    assert_eq!(options[0].label, "Grand Hotel & Spa");
}
