use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Customer record in the database. The argon2 hash never appears in JSON,
/// so serializing the record directly is the "password stripped" response.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub phone_number: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_never_leaks_the_password_hash() {
        let customer = Customer {
            id: Uuid::new_v4(),
            name: "Jane".into(),
            email: "jane@example.com".into(),
            username: "jane".into(),
            password_hash: "$argon2id$v=19$secret".into(),
            phone_number: "+15550001111".into(),
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&customer).expect("serialize");
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
        assert!(json.contains("phoneNumber"));
        assert!(json.contains("jane@example.com"));
    }
}
