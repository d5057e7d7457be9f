use sqlx::FromRow;

/// Row shape every users query returns. The password column is never selected.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UserRow {
    pub id: i32,
    pub name: String,
    pub email: String,
}
