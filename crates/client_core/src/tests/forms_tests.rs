use chrono::NaiveDate;
use shared::domain::{CompanyId, EntityKind, ProfileId, Uid};

use super::*;
use crate::test_support::{record, sample_session};

fn filled_form() -> UserForm {
    UserForm {
        nik: "3201012345".to_string(),
        email: "siti@koperasi.co.id".to_string(),
        full_name: "Siti Rahma".to_string(),
        password: "rahasia".to_string(),
        dob: "1990-04-02".to_string(),
        address: "Jl. Merdeka 10".to_string(),
        phone_number: "081234567890".to_string(),
        role: Some("Admin".to_string()),
        company_id: Some(CompanyId::new("12")),
    }
}

#[test]
fn complete_create_form_produces_payload() {
    let payload = filled_form().validate(&FormMode::Create).expect("valid");
    assert_eq!(payload.nik, "3201012345");
    assert_eq!(payload.password.as_deref(), Some("rahasia"));
    assert_eq!(payload.dob, NaiveDate::from_ymd_opt(1990, 4, 2));
    assert!(payload.uid.is_none());
}

#[test]
fn empty_nik_is_required() {
    let mut form = filled_form();
    form.nik = "   ".to_string();
    let errors = form.validate(&FormMode::Create).expect_err("nik missing");
    assert_eq!(errors.get(FormField::Nik), Some("nik field is required"));
    assert_eq!(errors.len(), 1);
}

#[test]
fn short_values_report_minimum_length() {
    let mut form = filled_form();
    form.nik = "32".to_string();
    form.full_name = "Al".to_string();
    form.password = "abc".to_string();
    let errors = form.validate(&FormMode::Create).expect_err("too short");
    assert_eq!(
        errors.get(FormField::Nik),
        Some("nik must be at least 3 characters")
    );
    assert_eq!(
        errors.get(FormField::FullName),
        Some("fullName must be at least 3 characters")
    );
    assert_eq!(
        errors.get(FormField::Password),
        Some("password must be at least 4 characters")
    );
}

#[test]
fn email_and_phone_formats_are_checked() {
    let mut form = filled_form();
    form.email = "siti-at-koperasi".to_string();
    form.phone_number = "0812-3456".to_string();
    let errors = form.validate(&FormMode::Create).expect_err("bad formats");
    assert_eq!(
        errors.get(FormField::Email),
        Some("email must be a valid email")
    );
    assert_eq!(
        errors.get(FormField::PhoneNumber),
        Some("phone number must be a number")
    );
}

#[test]
fn create_requires_dob_and_password_but_edit_does_not() {
    let mut form = filled_form();
    form.password.clear();
    form.dob.clear();

    let errors = form.validate(&FormMode::Create).expect_err("create");
    assert!(errors.contains(FormField::Password));
    assert_eq!(errors.get(FormField::Dob), Some("dob field is required"));

    let payload = form
        .validate(&FormMode::Edit(Uid::new("u7")))
        .expect("edit allows blanks");
    assert_eq!(payload.uid, Some(Uid::new("u7")));
    assert!(payload.password.is_none());
    assert!(payload.dob.is_none());
}

#[test]
fn malformed_dob_is_rejected() {
    let mut form = filled_form();
    form.dob = "02/04/1990".to_string();
    let errors = form.validate(&FormMode::Create).expect_err("dob");
    assert_eq!(errors.get(FormField::Dob), Some("dob must be a valid date"));
}

#[test]
fn admin_create_request_carries_role_and_company_beside_data() {
    let request = filled_form()
        .create_request(EntityKind::Admin, &sample_session())
        .expect("valid");
    assert_eq!(request.role.as_deref(), Some("Admin"));
    assert_eq!(request.company_id, Some(CompanyId::new("12")));
    assert_eq!(request.data.created_by, Some(ProfileId::new("op-1")));
    assert!(request.data.company_id.is_none());

    let body = serde_json::to_value(&request).expect("encode");
    assert_eq!(body["data"]["created_by"], "op-1");
}

#[test]
fn anggota_create_request_stamps_operator_company_and_id() {
    let request = filled_form()
        .create_request(EntityKind::Anggota, &sample_session())
        .expect("valid");
    assert!(request.role.is_none());
    assert!(request.company_id.is_none());
    assert_eq!(request.data.company_id, Some(CompanyId::new("7")));
    assert_eq!(request.data.created_by, Some(ProfileId::new("op-1")));
}

#[test]
fn edit_form_prefills_from_record_without_password() {
    let form = UserForm::from_record(&record("u1", "3201", "Budi Santoso"));
    assert_eq!(form.full_name, "Budi Santoso");
    assert_eq!(form.role.as_deref(), Some("Admin"));
    assert!(form.password.is_empty());
}

#[test]
fn timestamp_dob_from_backend_survives_an_edit() {
    let mut stored = record("u1", "3201", "Budi Santoso");
    stored.date_of_birth = Some("1990-04-02T00:00:00.000Z".to_string());
    stored.address = Some("Jl. Merdeka 10".to_string());
    stored.phone_number = Some("081234567890".to_string());

    let form = UserForm::from_record(&stored);
    assert_eq!(form.dob, "1990-04-02");

    let request = form.update_request(&Uid::new("u1")).expect("valid edit");
    assert_eq!(request.data.dob, NaiveDate::from_ymd_opt(1990, 4, 2));
}

#[test]
fn typed_timestamp_dob_validates_to_its_date() {
    let mut form = filled_form();
    form.dob = "1990-04-02T08:30:00+07:00".to_string();
    let payload = form.validate(&FormMode::Create).expect("valid");
    assert_eq!(payload.dob, NaiveDate::from_ymd_opt(1990, 4, 2));
}
