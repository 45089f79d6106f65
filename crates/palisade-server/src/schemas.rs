//! Request schemas for the starter's routes.
//!
//! One function per schemed section. The validation stage coerces declared
//! numerics from strings, so query pagination values reach handlers typed.

use palisade_middleware::stages::{FieldSpec, Schema};

/// `POST /api/auth/signup` body.
#[must_use]
pub fn signup_body() -> Schema {
    Schema::new()
        .field("email", FieldSpec::email())
        .field("password", FieldSpec::string().min_len(8))
        .field("fullName", FieldSpec::string().min_len(1))
}

/// `POST /api/auth/login` body.
#[must_use]
pub fn login_body() -> Schema {
    Schema::new()
        .field("email", FieldSpec::email())
        .field("password", FieldSpec::string().min_len(1))
}

/// `{id}` path parameter for the user routes.
#[must_use]
pub fn user_params() -> Schema {
    Schema::new().field("id", FieldSpec::uuid())
}

/// `PATCH /api/users/{id}` body: all fields optional.
#[must_use]
pub fn update_user_body() -> Schema {
    Schema::new()
        .field("email", FieldSpec::email().optional())
        .field("fullName", FieldSpec::string().min_len(1).optional())
}

/// `GET /api/users` pagination query.
#[must_use]
pub fn list_users_query() -> Schema {
    Schema::new()
        .field("page", FieldSpec::integer().optional())
        .field("limit", FieldSpec::integer().optional())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_signup_requires_all_fields() {
        assert!(signup_body().validate(&json!({})).is_err());
        assert!(signup_body()
            .validate(&json!({
                "email": "a@example.com",
                "password": "longenough",
                "fullName": "Ada"
            }))
            .is_ok());
    }

    #[test]
    fn test_signup_rejects_short_password() {
        let issues = signup_body()
            .validate(&json!({
                "email": "a@example.com",
                "password": "short",
                "fullName": "Ada"
            }))
            .unwrap_err();
        assert!(issues[0].message.contains("password"));
    }

    #[test]
    fn test_login_accepts_any_nonempty_password() {
        assert!(login_body()
            .validate(&json!({"email": "a@example.com", "password": "x"}))
            .is_ok());
    }

    #[test]
    fn test_update_body_all_optional() {
        assert!(update_user_body().validate(&json!({})).is_ok());
        assert!(update_user_body()
            .validate(&json!({"email": "not-an-email"}))
            .is_err());
    }

    #[test]
    fn test_pagination_coerces_strings() {
        let normalized = list_users_query()
            .validate(&json!({"page": "2", "limit": "10"}))
            .unwrap();
        assert_eq!(normalized["page"], json!(2));
        assert_eq!(normalized["limit"], json!(10));
    }
}
