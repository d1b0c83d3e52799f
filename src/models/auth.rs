//! Authentication-related models

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct AuthenticationRequest {
    #[validate(custom(function = "not_blank", message = "'username' is required"))]
    pub username: String,
    #[validate(custom(function = "not_blank", message = "'password' is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthenticationResponse {
    pub token: String,
}

pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields_rejected() {
        let req = AuthenticationRequest {
            username: "   ".to_string(),
            password: "secret".to_string(),
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("username"));
        assert!(!errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_filled_request_is_valid() {
        let req = AuthenticationRequest {
            username: "alice".to_string(),
            password: "secret".to_string(),
        };
        assert!(req.validate().is_ok());
    }
}
