//! End-to-end dashboard flows against the in-memory backend

use chrono::NaiveDate;
use std::sync::Arc;

use coffee_monitor::address::AddressCascade;
use coffee_monitor::api::{DashboardApi, MockApi, MockOp};
use coffee_monitor::form::{
    BeneficiaryField, BeneficiarySchema, CropStatusField, CropStatusSchema, FormContext,
    FormController, SeedlingField, SeedlingSchema, SubmitError,
};
use coffee_monitor::list::{ListController, ListView, NoticeKind};
use coffee_monitor::models::{Beneficiary, CropStatusRecord, SeedlingRecord};
use coffee_monitor::session::{self, GateDecision, MemorySessionStore, SessionGate, SessionStore};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

fn backend() -> Arc<MockApi> {
    Arc::new(
        MockApi::new()
            .with_credentials("admin", "secret")
            .with_address("Bukidnon", "Malaybalay", &["Casisang", "Sumpong"])
            .with_address("Bukidnon", "Valencia", &["Poblacion"]),
    )
}

async fn register_juan(api: Arc<MockApi>) -> Beneficiary {
    let cascade = AddressCascade::new(api.clone());
    cascade.load_provinces().await;

    let mut form: FormController<BeneficiarySchema> =
        FormController::new(api.clone(), FormContext::default().with_today(today()));
    form.open(None).unwrap();
    for (field, value) in [
        (BeneficiaryField::FirstName, "Juan"),
        (BeneficiaryField::LastName, "Dela Cruz"),
        (BeneficiaryField::Purok, "Purok 3"),
        (BeneficiaryField::BirthDate, "2000-01-01"),
        (BeneficiaryField::Cellphone, "09171234567"),
    ] {
        form.set_field(field, value).unwrap();
    }
    form.select_address(&cascade, BeneficiaryField::Province, "Bukidnon")
        .await
        .unwrap();
    form.select_address(&cascade, BeneficiaryField::Municipality, "Malaybalay")
        .await
        .unwrap();
    assert_eq!(cascade.snapshot().barangay.options, vec!["Casisang", "Sumpong"]);
    form.select_address(&cascade, BeneficiaryField::Barangay, "Casisang")
        .await
        .unwrap();

    assert!(form.validate().is_empty());
    assert_eq!(form.derived_age(), Some(24));
    form.submit().await.unwrap()
}

#[tokio::test]
async fn test_login_gate_and_logout() {
    let api = backend();
    let store = Arc::new(MemorySessionStore::new());
    let gate = SessionGate::new(store.clone());

    assert_eq!(
        gate.check("/seedlings"),
        GateDecision::RedirectToLogin {
            login_path: "/login".into(),
            return_to: "/seedlings".into()
        }
    );

    let err = session::login(api.as_ref(), store.as_ref(), "admin", "wrong")
        .await
        .unwrap_err();
    assert_eq!(err.status, 401);
    assert!(!store.is_authenticated());

    let user = session::login(api.as_ref(), store.as_ref(), "admin", "secret")
        .await
        .unwrap();
    assert_eq!(user.username, "admin");
    assert!(gate.check("/seedlings").is_allowed());
    assert_eq!(SessionGate::post_login_destination(Some("/seedlings")), "/seedlings");

    session::logout(store.as_ref());
    assert!(!gate.check("/dashboard").is_allowed());
}

#[tokio::test]
async fn test_register_beneficiary_then_list() {
    let api = backend();
    let saved = register_juan(api.clone()).await;
    assert_eq!(saved.beneficiary_id, "BEN-0001");
    assert_eq!(saved.barangay, "Casisang");

    let mut list: ListController<Beneficiary> = ListController::new(api.clone());
    list.after_mutation("Beneficiary added successfully").await.unwrap();
    match list.view() {
        ListView::Rows { rows, total, .. } => {
            assert_eq!(total, 1);
            assert_eq!(rows[0].full_name(), "Juan Dela Cruz");
        }
        other => panic!("unexpected view: {:?}", other),
    }
    assert_eq!(list.notice().map(|n| n.kind), Some(NoticeKind::Success));
}

#[tokio::test]
async fn test_invalid_cellphone_never_reaches_network() {
    let api = backend();
    let mut form: FormController<BeneficiarySchema> =
        FormController::new(api.clone(), FormContext::default().with_today(today()));
    form.open(None).unwrap();
    for (field, value) in [
        (BeneficiaryField::FirstName, "Juan"),
        (BeneficiaryField::LastName, "Dela Cruz"),
        (BeneficiaryField::Province, "Bukidnon"),
        (BeneficiaryField::Municipality, "Malaybalay"),
        (BeneficiaryField::Barangay, "Casisang"),
        (BeneficiaryField::BirthDate, "2000-01-01"),
        (BeneficiaryField::Cellphone, "12345"),
    ] {
        form.set_field(field, value).unwrap();
    }

    let SubmitError::Invalid(errors) = form.submit().await.unwrap_err() else {
        panic!("expected validation failure");
    };
    assert_eq!(errors.keys().copied().collect::<Vec<_>>(), vec!["cellphone"]);
    assert_eq!(api.calls(MockOp::GenerateBeneficiaryId), 0);
    assert_eq!(api.calls(MockOp::CreateBeneficiary), 0);
    assert!(form.mode().is_open());
}

#[tokio::test]
async fn test_seedling_linked_by_name_and_joined_in_list() {
    let api = backend();
    register_juan(api.clone()).await;

    let mut list: ListController<SeedlingRecord> = ListController::new(api.clone());
    list.refresh().await.unwrap();
    assert_eq!(list.view(), ListView::Empty { banner: None });

    let mut form: FormController<SeedlingSchema> = FormController::new(
        api.clone(),
        FormContext::new(list.beneficiaries().clone()).with_today(today()),
    );
    form.open(None).unwrap();
    for (field, value) in [
        (SeedlingField::BeneficiaryName, "Juan Dela Cruz"),
        (SeedlingField::Received, "200"),
        (SeedlingField::Planted, "250"),
        (SeedlingField::Hectares, "1.25"),
        (SeedlingField::Plot, "North"),
        (SeedlingField::DateOfPlantingStart, "2024-03-01"),
    ] {
        form.set_field(field, value).unwrap();
    }
    assert_eq!(form.draft().beneficiary_id, "BEN-0001");
    assert!(matches!(form.submit().await, Err(SubmitError::Invalid(_))));

    form.set_field(SeedlingField::Planted, "180").unwrap();
    form.submit().await.unwrap();
    list.after_mutation("Seedling record added successfully").await.unwrap();

    let rows = list.visible();
    assert_eq!(rows.len(), 1);
    assert_eq!(list.beneficiaries().display(&rows[0].beneficiary_id).name, "Juan Dela Cruz");
}

#[tokio::test]
async fn test_crop_status_defaults_dead_crops() {
    let api = backend();
    register_juan(api.clone()).await;
    let beneficiaries = coffee_monitor::BeneficiaryIndex::new(api.list_beneficiaries().await.unwrap());

    let mut form: FormController<CropStatusSchema> =
        FormController::new(api.clone(), FormContext::new(beneficiaries).with_today(today()));
    form.open(None).unwrap();
    for (field, value) in [
        (CropStatusField::BeneficiaryName, "Juan Dela Cruz"),
        (CropStatusField::SurveyDate, "2024-05-20"),
        (CropStatusField::Surveyer, "Rosa"),
        (CropStatusField::AliveCrops, "0"),
    ] {
        form.set_field(field, value).unwrap();
    }
    let SubmitError::Invalid(errors) = form.submit().await.unwrap_err() else {
        panic!("expected validation failure");
    };
    assert!(errors.contains_key("aliveCrops"));

    form.set_field(CropStatusField::AliveCrops, "150").unwrap();
    let saved = form.submit().await.unwrap();
    assert_eq!(saved.dead_crops, 0);
    assert_eq!(saved.alive_crops, 150);

    let mut list: ListController<CropStatusRecord> = ListController::new(api.clone());
    list.refresh().await.unwrap();
    assert_eq!(list.total(), 1);
}

#[tokio::test]
async fn test_delete_beneficiary_cascades() {
    let api = backend();
    let juan = register_juan(api.clone()).await;

    let index = coffee_monitor::BeneficiaryIndex::new(vec![juan.clone()]);
    let mut seedling: FormController<SeedlingSchema> =
        FormController::new(api.clone(), FormContext::new(index).with_today(today()));
    seedling.open(None).unwrap();
    for (field, value) in [
        (SeedlingField::BeneficiaryName, "Juan Dela Cruz"),
        (SeedlingField::Received, "10"),
        (SeedlingField::Planted, "10"),
        (SeedlingField::Hectares, "0.5"),
        (SeedlingField::Plot, "East"),
        (SeedlingField::DateOfPlantingStart, "2024-04-01"),
    ] {
        seedling.set_field(field, value).unwrap();
    }
    seedling.submit().await.unwrap();

    let mut list: ListController<Beneficiary> = ListController::new(api.clone());
    list.refresh().await.unwrap();
    assert!(list.request_delete(&juan.id));
    let summary = list.confirm_delete().await.unwrap().unwrap();

    assert_eq!(summary.deleted_records.map(|r| r.seedlings), Some(1));
    let notice = list.notice().unwrap();
    assert!(notice.message.starts_with("Beneficiary deleted successfully"));
    assert!(notice.message.contains("1 seedling record(s)"));
    assert!(api.seedlings().is_empty());
    assert_eq!(list.view(), ListView::Empty { banner: None });
}
