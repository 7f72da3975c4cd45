use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Backends hand identifiers and most text columns back as either JSON
/// strings or numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawScalar {
    Text(String),
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

impl From<RawScalar> for String {
    fn from(value: RawScalar) -> Self {
        match value {
            RawScalar::Text(text) => text,
            RawScalar::Signed(n) => n.to_string(),
            RawScalar::Unsigned(n) => n.to_string(),
            RawScalar::Float(n) => n.to_string(),
        }
    }
}

/// `null` reads as an empty string.
fn text_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawScalar>::deserialize(deserializer)?
        .map(String::from)
        .unwrap_or_default())
}

fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawScalar>::deserialize(deserializer)?.map(String::from))
}

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                RawScalar::deserialize(deserializer).map(|raw| Self(raw.into()))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_newtype!(Uid);
id_newtype!(CompanyId);
id_newtype!(ProfileId);

/// The two managed-user collections exposed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Admin,
    Anggota,
}

impl EntityKind {
    pub fn list_path(self) -> &'static str {
        match self {
            EntityKind::Admin => "/list-admin",
            EntityKind::Anggota => "/list-anggota",
        }
    }

    pub fn create_path(self) -> &'static str {
        match self {
            EntityKind::Admin => "/create-admin",
            EntityKind::Anggota => "/create-anggota",
        }
    }

    /// Only admins have an update endpoint.
    pub fn update_path(self) -> Option<&'static str> {
        match self {
            EntityKind::Admin => Some("/update-admin"),
            EntityKind::Anggota => None,
        }
    }

    /// The backend deletes both collections through the admin endpoint.
    pub fn delete_path(self) -> &'static str {
        "/delete-admin"
    }

    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Admin => "admin",
            EntityKind::Anggota => "anggota",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(EntityKind::Admin),
            "anggota" | "member" => Ok(EntityKind::Anggota),
            other => Err(format!("unknown entity kind '{other}'")),
        }
    }
}

/// A managed user as returned by the list and lookup endpoints.
///
/// Passwords never appear here; they only travel in outgoing payloads.
/// Text columns tolerate `null` and numeric values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub uid: Uid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no: Option<u64>,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub nik: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub email: String,
    #[serde(rename = "fullName", default, deserialize_with = "text_or_empty")]
    pub full_name: String,
    #[serde(
        default,
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub address: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub phone_number: Option<String>,
    #[serde(
        alias = "dob",
        default,
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_of_birth: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<CompanyId>,
    #[serde(
        default,
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub state: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<String>,
}

/// The signed-in operator, as persisted next to the bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: ProfileId,
    pub company_id: CompanyId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusColor {
    Success,
    Warning,
    Secondary,
    Error,
    Primary,
}

impl StatusColor {
    /// Chip colour for a status (anggota) or state (admin) value.
    pub fn for_status(status: &str) -> Self {
        match status {
            "Active" | "Online" => StatusColor::Success,
            "pending" | "Verification" | "Offline" => StatusColor::Warning,
            "inactive" => StatusColor::Secondary,
            "Blocked" => StatusColor::Error,
            _ => StatusColor::Primary,
        }
    }
}
