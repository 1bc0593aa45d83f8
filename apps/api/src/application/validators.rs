use validator::ValidateEmail;

/// Validates that the input looks like a valid email address
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty() && email.validate_email()
}

/// Validates an id that becomes a document path segment (user, team, member ids).
/// Rules:
/// - 1-128 characters
/// - No whitespace, no `/`
pub fn is_valid_document_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && !id.chars().any(|c| c.is_whitespace() || c == '/')
}

/// Validates a gateway object id such as `price_123` or `cus_ABC`.
/// Rules:
/// - 1-255 characters
/// - Only ASCII letters, numbers, hyphens, underscores
pub fn is_valid_gateway_id(id: &str) -> bool {
    if id.is_empty() || id.len() > 255 {
        return false;
    }

    id.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
