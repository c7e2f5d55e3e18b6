use super::ValidationError;

const MIN_DIGITS: usize = 10;
const MAX_DIGITS: usize = 15;

/// Strips everything but ASCII digits, so `+91 98765-43210` and
/// `919876543210` name the same number.
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone.trim().is_empty() {
        return Err(ValidationError::PhoneEmpty);
    }

    let digits = normalize_phone(phone).len();
    if !(MIN_DIGITS..=MAX_DIGITS).contains(&digits) {
        return Err(ValidationError::PhoneInvalidLength);
    }

    Ok(())
}
