use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::contacts::repo_types::Contact;

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 {
    10
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize)]
pub struct BirthdayWindow {
    #[serde(default = "default_days")]
    pub days: i64,
}
fn default_days() -> i64 {
    7
}

/// Request body for creating or replacing a contact.
#[derive(Debug, Deserialize)]
pub struct ContactPayload {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birthday: Option<Date>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birthday: Option<Date>,
    pub notes: Option<String>,
    pub created_at: OffsetDateTime,
}

impl From<Contact> for ContactResponse {
    fn from(contact: Contact) -> Self {
        Self {
            id: contact.id,
            first_name: contact.first_name,
            last_name: contact.last_name,
            email: contact.email,
            phone: contact.phone,
            birthday: contact.birthday,
            notes: contact.notes,
            created_at: contact.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_apply() {
        let p: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(p.limit, 10);
        assert_eq!(p.offset, 0);

        let w: BirthdayWindow = serde_json::from_str("{}").unwrap();
        assert_eq!(w.days, 7);
    }
}
