use serde::{Deserialize, Serialize};

use crate::customers::repo_types::Customer;

/// Body for customer signup. Field names follow the wire convention
/// (`phoneNumber`), the exemption set keeps email/username/password intact.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub phone_number: String,
}

/// Login body. Both fields are optional at the decoder level so a missing
/// field is reported as a 400 with a message, not a decoder rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub phone_number: Option<String>,
}

/// Signup/update envelope: the stored record, password hash stripped by its
/// serde attributes.
#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    pub success: bool,
    pub data: Customer,
}

/// Login envelope; the same token also travels in the `token` cookie.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub success: bool,
    pub token: String,
}

/// Delete acknowledgment.
#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub success: bool,
    pub message: String,
}
