use validator::ValidateEmail;

/// Validates that the input looks like a valid email address
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty() && email.validate_email()
}

/// Billing-cycle anchor: a day of the month.
pub fn is_valid_due_day(day: i16) -> bool {
    (1..=31).contains(&day)
}

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

/// Trim an optional form field; blank becomes `None`.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
