use super::ApiError;

pub fn validate_id(resource: &str, id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid {} ID: {}. ID must be a positive integer",
            resource, id
        )));
    }
    Ok(id)
}

pub fn validate_email(email: &str) -> Result<&str, ApiError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }

    // Same minimal shape check the account service applies.
    let Some((local, domain)) = trimmed.split_once('@') else {
        return Err(ApiError::validation("Please provide a valid email"));
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(ApiError::validation("Please provide a valid email"));
    }

    Ok(trimmed)
}

pub fn validate_required(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!("{} is required", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("dish", 1).is_ok());
        assert!(validate_id("dish", 12345).is_ok());
        assert!(validate_id("dish", 0).is_err());
        assert!(validate_id("order", -1).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("  alice@example.com  ").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("alice@nodot").is_err());
    }

    #[test]
    fn test_validate_required() {
        assert!(validate_required("Name", "Alice").is_ok());
        assert!(validate_required("Name", "").is_err());
        assert!(validate_required("Name", "   ").is_err());
    }
}
