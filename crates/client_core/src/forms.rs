//! Create/edit form model: field rules, field-level errors and payload assembly.

use std::{collections::BTreeMap, fmt, sync::OnceLock};

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use shared::{
    domain::{CompanyId, EntityKind, Uid, UserRecord},
    protocol::{SaveUserRequest, UserPayload},
};

use crate::Session;

const NIK_MIN: usize = 3;
const FULL_NAME_MIN: usize = 3;
const PASSWORD_MIN: usize = 4;
const PHONE_MIN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    Nik,
    FullName,
    Email,
    Password,
    Dob,
    Address,
    PhoneNumber,
}

impl FormField {
    /// Name used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            FormField::Nik => "nik",
            FormField::FullName => "fullName",
            FormField::Email => "email",
            FormField::Password => "password",
            FormField::Dob => "dob",
            FormField::Address => "address",
            FormField::PhoneNumber => "phone number",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<FormField, String>);

impl FormErrors {
    pub fn get(&self, field: FormField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: FormField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormField, &str)> {
        self.0.iter().map(|(field, msg)| (*field, msg.as_str()))
    }

    fn insert(&mut self, field: FormField, message: String) {
        self.0.entry(field).or_insert(message);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(Uid),
}

fn length_error(field: FormField, value: &str, min: usize) -> Option<String> {
    let len = value.chars().count();
    if len == 0 {
        Some(format!("{field} field is required"))
    } else if len < min {
        Some(format!("{field} must be at least {min} characters"))
    } else {
        None
    }
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp, keeping its date.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|ts| ts.date_naive())
        })
}

/// Stored dates as the form shows them. Unparseable values pass through.
fn form_date(raw: &str) -> String {
    let raw = raw.trim();
    match parse_date(raw) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => raw.to_string(),
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    })
}

/// Raw field values as typed by the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserForm {
    pub nik: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    /// `YYYY-MM-DD`.
    pub dob: String,
    pub address: String,
    pub phone_number: String,
    pub role: Option<String>,
    pub company_id: Option<CompanyId>,
}

impl UserForm {
    /// Pre-populates an edit form. The password is never echoed back.
    pub fn from_record(record: &UserRecord) -> Self {
        Self {
            nik: record.nik.clone(),
            email: record.email.clone(),
            full_name: record.full_name.clone(),
            password: String::new(),
            dob: record
                .date_of_birth
                .as_deref()
                .map(form_date)
                .unwrap_or_default(),
            address: record.address.clone().unwrap_or_default(),
            phone_number: record.phone_number.clone().unwrap_or_default(),
            role: record.role.clone(),
            company_id: record.company_id.clone(),
        }
    }

    pub fn validate(&self, mode: &FormMode) -> Result<UserPayload, FormErrors> {
        let mut errors = FormErrors::default();
        let creating = matches!(mode, FormMode::Create);

        let nik = self.nik.trim();
        if let Some(msg) = length_error(FormField::Nik, nik, NIK_MIN) {
            errors.insert(FormField::Nik, msg);
        }

        let full_name = self.full_name.trim();
        if let Some(msg) = length_error(FormField::FullName, full_name, FULL_NAME_MIN) {
            errors.insert(FormField::FullName, msg);
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.insert(FormField::Email, "email field is required".to_string());
        } else if !email_regex().is_match(email) {
            errors.insert(FormField::Email, "email must be a valid email".to_string());
        }

        if creating || !self.password.is_empty() {
            if let Some(msg) = length_error(FormField::Password, &self.password, PASSWORD_MIN) {
                errors.insert(FormField::Password, msg);
            }
        }

        let dob_raw = self.dob.trim();
        let dob = if dob_raw.is_empty() {
            if creating {
                errors.insert(FormField::Dob, "dob field is required".to_string());
            }
            None
        } else {
            match parse_date(dob_raw) {
                Some(date) => Some(date),
                None => {
                    errors.insert(FormField::Dob, "dob must be a valid date".to_string());
                    None
                }
            }
        };

        let address = self.address.trim();
        if address.is_empty() {
            errors.insert(FormField::Address, "address field is required".to_string());
        }

        let phone = self.phone_number.trim();
        if phone.is_empty() {
            errors.insert(
                FormField::PhoneNumber,
                "phone number field is required".to_string(),
            );
        } else if !phone.chars().all(|c| c.is_ascii_digit()) {
            errors.insert(
                FormField::PhoneNumber,
                "phone number must be a number".to_string(),
            );
        } else if let Some(msg) = length_error(FormField::PhoneNumber, phone, PHONE_MIN) {
            errors.insert(FormField::PhoneNumber, msg);
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(UserPayload {
            uid: match mode {
                FormMode::Create => None,
                FormMode::Edit(uid) => Some(uid.clone()),
            },
            nik: nik.to_string(),
            email: email.to_string(),
            full_name: full_name.to_string(),
            password: (!self.password.is_empty()).then(|| self.password.clone()),
            address: address.to_string(),
            phone_number: phone.to_string(),
            dob,
            role: None,
            company_id: None,
            created_by: None,
        })
    }

    /// Validates and shapes the body for `POST /create-*`.
    ///
    /// Both kinds record the operator as `created_by` inside `data`. Admins
    /// carry role and company beside `data`; anggota records take the
    /// operator's company inside `data`.
    pub fn create_request(
        &self,
        kind: EntityKind,
        session: &Session,
    ) -> Result<SaveUserRequest, FormErrors> {
        let mut data = self.validate(&FormMode::Create)?;
        data.created_by = Some(session.profile.id.clone());
        Ok(match kind {
            EntityKind::Admin => SaveUserRequest {
                data,
                role: self.role.clone(),
                company_id: self.company_id.clone(),
            },
            EntityKind::Anggota => {
                data.company_id = Some(session.profile.company_id.clone());
                SaveUserRequest {
                    data,
                    role: None,
                    company_id: None,
                }
            }
        })
    }

    /// Validates and shapes the body for `POST /update-admin`.
    pub fn update_request(&self, uid: &Uid) -> Result<SaveUserRequest, FormErrors> {
        let data = self.validate(&FormMode::Edit(uid.clone()))?;
        Ok(SaveUserRequest {
            data,
            role: self.role.clone(),
            company_id: None,
        })
    }
}

#[cfg(test)]
#[path = "tests/forms_tests.rs"]
mod tests;
