use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default, alias = "postalCode")]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub tax_id: Option<String>,
    pub address: Option<Address>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    pub fn city(&self) -> Option<&str> {
        self.address.as_ref().and_then(|a| a.city.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct ContactPerson {
    pub id: Uuid,
    pub client_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Detail view of a client with all of its contacts, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientWithContacts {
    #[serde(flatten)]
    pub client: Client,
    pub contact_persons: Vec<ContactPerson>,
}

#[derive(Debug, Clone)]
pub struct NewClient {
    pub name: String,
    pub tax_id: Option<String>,
    pub address: Option<Address>,
    pub contacts: Vec<NewContact>,
}

#[derive(Debug, Clone)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub position: Option<String>,
}

/// Partial update. When `contacts` is set the client's contact list is replaced.
#[derive(Debug, Clone, Default)]
pub struct ClientChanges {
    pub name: Option<String>,
    pub tax_id: Option<String>,
    pub address: Option<Address>,
    pub contacts: Option<Vec<NewContact>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientPage {
    pub clients: Vec<Client>,
    pub pagination: super::Pagination,
}
