use axum::{http::StatusCode, Json};
use regex::Regex;
use serde_json::json;
use std::borrow::Cow;
use std::sync::OnceLock;
use validator::{ValidationError, ValidationErrors};

pub fn into_response(errors: ValidationErrors) -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors })))
}

fn phone_number_regex() -> &'static Regex {
    static PHONE_NUMBER: OnceLock<Regex> = OnceLock::new();
    PHONE_NUMBER.get_or_init(|| {
        Regex::new(r"^\+?[0-9]{7,15}$").expect("phone number regex is valid")
    })
}

pub fn validate_phone_number(phone_number: &str) -> Result<(), ValidationError> {
    match phone_number_regex().is_match(phone_number) {
        true => Ok(()),
        false => Err(ValidationError::new("INVALID_PHONE_NUMBER")
            .with_message(Cow::from("Phone number must contain 7 to 15 digits"))),
    }
}

pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    static SLUG: OnceLock<Regex> = OnceLock::new();
    let regex = SLUG.get_or_init(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("slug regex is valid"));

    match regex.is_match(slug) {
        true => Ok(()),
        false => Err(ValidationError::new("INVALID_SLUG")
            .with_message(Cow::from("Slug may only contain lowercase letters, digits and dashes"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_international_phone_numbers() {
        assert!(validate_phone_number("+2348012345678").is_ok());
        assert!(validate_phone_number("08012345678").is_ok());
    }

    #[test]
    fn rejects_phone_numbers_with_letters() {
        assert!(validate_phone_number("0801-CALL-ME").is_err());
        assert!(validate_phone_number("12").is_err());
    }

    #[test]
    fn slugs_must_be_kebab_case() {
        assert!(validate_slug("linen-summer-dress").is_ok());
        assert!(validate_slug("Linen Summer Dress").is_err());
        assert!(validate_slug("-leading-dash").is_err());
    }
}
