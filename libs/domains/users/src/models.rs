use chrono::{DateTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use strum::Display;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// E.164-style phone numbers: optional `+`, no leading zero, 2-15 digits.
static PHONE_REGEX: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^\+?[1-9]\d{1,14}$").expect("valid phone regex"));

/// User roles (closed set)
///
/// Serialized as `ADMIN`/`USER`/`GUEST` on the wire, stored lowercase
/// in the database.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    Default,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Role {
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Default role for new users
    #[default]
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "guest")]
    Guest,
}

/// User domain model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Store-assigned identifier, immutable after creation
    pub id: i64,
    pub name: String,
    /// Unique, case-insensitive
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a user about to be persisted (no id or timestamps yet).
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub active: bool,
}

/// DTO for creating a new user
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Email should be valid"), length(max = 255))]
    pub email: String,
    #[validate(regex(path = *PHONE_REGEX, message = "Phone number should be valid"))]
    pub phone: String,
    /// Defaults to USER when omitted
    pub role: Option<Role>,
}

/// DTO for updating an existing user; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email(message = "Email should be valid"), length(max = 255))]
    pub email: Option<String>,
    #[validate(regex(path = *PHONE_REGEX, message = "Phone number should be valid"))]
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
}

/// User response DTO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            role: user.role,
            active: user.active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Query parameters for listing users
///
/// At most one of `role`/`active`/`name_filter` is applied, in that order
/// of precedence.
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase", default)]
pub struct UserQuery {
    /// Page number (0-indexed)
    pub page: i64,
    /// Page size
    pub size: i64,
    /// Sort field (unknown names fall back to `id`)
    pub sort_by: String,
    /// Sort direction: `asc` or `desc`
    pub sort_dir: String,
    pub role: Option<Role>,
    pub active: Option<bool>,
    /// Case-insensitive substring match on name
    pub name_filter: Option<String>,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: 10,
            sort_by: "id".to_string(),
            sort_dir: "asc".to_string(),
            role: None,
            active: None,
            name_filter: None,
        }
    }
}

impl UserQuery {
    pub fn descending(&self) -> bool {
        self.sort_dir.eq_ignore_ascii_case("desc")
    }

    /// Row offset for the page; saturates instead of overflowing on
    /// absurd but validation-passing page numbers.
    pub fn offset(&self) -> u64 {
        (self.page.max(0) as u64).saturating_mul(self.size.max(0) as u64)
    }
}

/// Paginated list response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub total_elements: u64,
    pub total_pages: u64,
    pub current_page: i64,
    pub page_size: i64,
}

impl User {
    /// Apply a partial update, leaving absent fields untouched.
    pub fn apply_update(&mut self, update: UpdateUserRequest) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(phone) = update.phone {
            self.phone = phone;
        }
        if let Some(role) = update.role {
            self.role = role;
        }
        if let Some(active) = update.active {
            self.active = active;
        }
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_format() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        assert_eq!(serde_json::to_string(&Role::Guest).unwrap(), "\"GUEST\"");

        let role: Role = serde_json::from_str("\"USER\"").unwrap();
        assert_eq!(role, Role::User);
    }

    #[test]
    fn test_role_default() {
        assert_eq!(Role::default(), Role::User);
    }

    #[test]
    fn test_create_request_validation() {
        let valid = CreateUserRequest {
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            phone: "+14155552671".to_string(),
            role: None,
        };
        assert!(valid.validate().is_ok());

        let bad_email = CreateUserRequest {
            email: "not-an-email".to_string(),
            ..valid.clone()
        };
        assert!(bad_email.validate().is_err());

        let bad_phone = CreateUserRequest {
            phone: "0123".to_string(),
            ..valid.clone()
        };
        assert!(bad_phone.validate().is_err());
    }

    #[test]
    fn test_phone_pattern() {
        for valid in ["+14155552671", "14155552671", "49301234567", "+12"] {
            assert!(PHONE_REGEX.is_match(valid), "{valid} should be valid");
        }
        for invalid in ["0123456", "+0123", "abc", "+1415555267890123456", ""] {
            assert!(!PHONE_REGEX.is_match(invalid), "{invalid} should be invalid");
        }
    }

    #[test]
    fn test_apply_update_partial() {
        let mut user = User {
            id: 1,
            name: "Old Name".to_string(),
            email: "old@example.com".to_string(),
            phone: "+14155552671".to_string(),
            role: Role::User,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        user.apply_update(UpdateUserRequest {
            name: Some("New Name".to_string()),
            active: Some(false),
            ..Default::default()
        });

        assert_eq!(user.name, "New Name");
        assert!(!user.active);
        // untouched fields
        assert_eq!(user.email, "old@example.com");
        assert_eq!(user.phone, "+14155552671");
        assert_eq!(user.role, Role::User);
    }

    #[test]
    fn test_user_response_camel_case() {
        let response = UserResponse {
            id: 7,
            name: "A".to_string(),
            email: "a@example.com".to_string(),
            phone: "+12".to_string(),
            role: Role::Admin,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert_eq!(json["role"], "ADMIN");
    }

    #[test]
    fn test_query_defaults() {
        let query = UserQuery::default();
        assert_eq!(query.page, 0);
        assert_eq!(query.size, 10);
        assert_eq!(query.sort_by, "id");
        assert!(!query.descending());
    }

    #[test]
    fn test_offset_saturates_on_huge_pages() {
        let query = UserQuery {
            page: i64::MAX,
            size: 2,
            ..Default::default()
        };
        assert_eq!(query.offset(), i64::MAX as u64 * 2);

        let query = UserQuery {
            page: i64::MAX,
            size: 3,
            ..Default::default()
        };
        assert_eq!(query.offset(), u64::MAX);

        let query = UserQuery {
            page: 3,
            size: 10,
            ..Default::default()
        };
        assert_eq!(query.offset(), 30);
    }
}
