use serde::{Deserialize, Serialize};

use super::repo_types::UserRow;

/// Input for a single user operation. A field is `Some` only when the caller
/// supplied it; `Some(String::new())` is a legitimate empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRequest {
    pub id: Option<i32>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Public view of a user. Keys keep the legacy PascalCase wire format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
}

impl From<UserRow> for UserResponse {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            email: r.email,
        }
    }
}
