use serde::{Deserialize, Serialize};

/// A persisted user. `id` is assigned by the store on insert and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub address: String,
}

/// Body of create and update requests. Missing fields deserialize as empty so
/// they surface as validation violations instead of extractor rejections; a
/// client supplied `id` is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub address: String,
}

impl UserInput {
    pub fn into_user(self, id: i64) -> User {
        User { id, name: self.name, email: self.email, mobile: self.mobile, address: self.address }
    }
}

impl From<&User> for UserInput {
    fn from(u: &User) -> Self {
        Self { name: u.name.clone(), email: u.email.clone(), mobile: u.mobile.clone(), address: u.address.clone() }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}
