use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Collects every failing field of a form before rejecting it.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &str, message: impl Into<String>) -> &mut Self {
        if !ok {
            self.errors.push(FieldError {
                field: field.to_string(),
                message: message.into(),
            });
        }
        self
    }

    pub fn required(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        let present = value.is_some_and(|v| !v.trim().is_empty());
        self.check(present, field, format!("{field} is required"))
    }

    pub fn amount(&mut self, field: &str, value: f64) -> &mut Self {
        self.check(
            value.is_finite() && value >= 0.0,
            field,
            format!("{field} must be a non-negative amount"),
        )
    }

    pub fn finish(&mut self) -> Result<(), Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(std::mem::take(&mut self.errors))
        }
    }
}

/// Rwandan mobile number: `+250` or `0`, then `72`, `73`, `78` or `79` and seven digits.
pub fn is_mobile_number(phone: &str) -> bool {
    let phone = phone.trim();
    let local = if let Some(rest) = phone.strip_prefix("+250") {
        rest
    } else if let Some(rest) = phone.strip_prefix('0') {
        rest
    } else {
        return false;
    };
    let bytes = local.as_bytes();
    bytes.len() == 9
        && bytes[0] == b'7'
        && matches!(bytes[1], b'2' | b'3' | b'8' | b'9')
        && bytes.iter().all(u8::is_ascii_digit)
}

/// Contact numbers are only checked for a plausible length.
pub fn is_contact_number(phone: &str) -> bool {
    phone.trim().chars().count() >= 10
}

pub fn is_email(email: &str) -> bool {
    match email.trim().split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.ends_with('.'),
        None => false,
    }
}

/// Lowercase, alphanumeric words joined by `-`.
pub fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Trims a free-text field and turns blanks into `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mobile_numbers() {
        assert!(is_mobile_number("0781234567"));
        assert!(is_mobile_number("+250721234567"));
        assert!(is_mobile_number(" 0731234567 "));
        assert!(!is_mobile_number("0741234567"));
        assert!(!is_mobile_number("078123456"));
        assert!(!is_mobile_number("07812345678"));
        assert!(!is_mobile_number("781234567"));
        assert!(!is_mobile_number("078123456a"));
    }

    #[test]
    fn contact_numbers_need_ten_characters() {
        assert!(is_contact_number("0781234567"));
        assert!(!is_contact_number("078123"));
    }

    #[test]
    fn emails() {
        assert!(is_email("student@ur.ac.rw"));
        assert!(!is_email("student"));
        assert!(!is_email("@ur.ac.rw"));
        assert!(!is_email("student@localhost"));
    }

    #[test]
    fn slugs() {
        assert_eq!(slugify("Flash Disks"), "flash-disks");
        assert_eq!(slugify("  Power-Banks & Chargers "), "power-banks-chargers");
    }

    #[test]
    fn validator_collects_all_errors() {
        let errors = Validator::new()
            .required("name", Some("  "))
            .required("phone", None)
            .amount("price", -1.0)
            .required("category", Some("Notes"))
            .finish()
            .unwrap_err();

        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["name", "phone", "price"]);
    }
}
