use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::domain::{CompanyId, ProfileId, Uid, UserRecord};

/// Query parameters accepted by the list endpoints. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

impl ListFilters {
    pub fn with_query(mut self, q: impl Into<String>) -> Self {
        self.q = Some(q.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }
}

pub fn empty_params() -> Value {
    Value::Object(Map::new())
}

/// Body of `GET /list-*`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListResponse {
    pub data: Vec<UserRecord>,
    pub total: u64,
    pub params: Value,
    #[serde(rename = "allData")]
    pub all_data: Vec<UserRecord>,
}

#[derive(Deserialize)]
struct ListEnvelope {
    #[serde(default)]
    data: Vec<UserRecord>,
    #[serde(default)]
    total: Option<u64>,
    #[serde(default = "empty_params")]
    params: Value,
    #[serde(rename = "allData", default)]
    all_data: Vec<UserRecord>,
}

impl<'de> Deserialize<'de> for ListResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Branch on the JSON shape first so a bad record reports its own
        // field error instead of a generic variant mismatch.
        let value = Value::deserialize(deserializer)?;
        if value.is_array() {
            let data: Vec<UserRecord> = serde_json::from_value(value).map_err(de::Error::custom)?;
            return Ok(ListResponse {
                total: data.len() as u64,
                all_data: data.clone(),
                data,
                params: empty_params(),
            });
        }

        let envelope: ListEnvelope = serde_json::from_value(value).map_err(de::Error::custom)?;
        Ok(ListResponse {
            total: envelope.total.unwrap_or(envelope.data.len() as u64),
            data: envelope.data,
            params: envelope.params,
            all_data: envelope.all_data,
        })
    }
}

/// Record fields as submitted by the create and update forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<Uid>,
    pub nik: String,
    pub email: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub address: String,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dob: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<CompanyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<ProfileId>,
}

/// Body of `POST /create-*` and `POST /update-admin`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveUserRequest {
    pub data: UserPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<CompanyId>,
}

/// Body of `POST /delete-admin`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteUserRequest {
    pub data: Uid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindUserRequest {
    pub uid: Uid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyLookupRequest {
    pub company_id: CompanyId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleExclusionRequest {
    pub role_name: String,
}

const ID_KEYS: &[&str] = &["id", "uid", "role_id", "company_id", "state_id", "status_id"];
const NAME_KEYS: &[&str] = &[
    "name",
    "role_name",
    "company_name",
    "state_name",
    "status_name",
    "label",
];

/// A dropdown option from one of the `/general/*` lookup endpoints.
///
/// Each endpoint names its id and label differently, so both are picked from
/// the first known key present and the full object is kept in `fields`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupItem {
    pub id: Option<String>,
    pub name: String,
    #[serde(skip)]
    pub fields: Map<String, Value>,
}

impl LookupItem {
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        let pick = |keys: &[&str]| {
            keys.iter().find_map(|key| match fields.get(*key) {
                Some(Value::String(text)) => Some(text.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            })
        };
        let id = pick(ID_KEYS);
        let name = pick(NAME_KEYS).or_else(|| id.clone()).unwrap_or_default();
        Self { id, name, fields }
    }
}

impl<'de> Deserialize<'de> for LookupItem {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawLookup {
            Object(Map<String, Value>),
            Text(String),
        }

        Ok(match RawLookup::deserialize(deserializer)? {
            RawLookup::Object(fields) => LookupItem::from_fields(fields),
            RawLookup::Text(text) => LookupItem {
                id: Some(text.clone()),
                name: text,
                fields: Map::new(),
            },
        })
    }
}
