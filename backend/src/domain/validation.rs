//! Field checks shared by the entity constructors.

use serde_json::json;

use super::Error;

pub(crate) fn require_non_blank(field: &'static str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(
            Error::invalid_request(format!("{field} is mandatory")).with_details(json!({
                "field": field,
                "code": "missing_field",
            })),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_carry_field_details() {
        let err = require_non_blank("title", " ").expect_err("blank rejected");
        let details = err.details().expect("details attached");
        assert_eq!(details["field"], "title");
        assert_eq!(details["code"], "missing_field");
    }

    #[test]
    fn populated_values_pass() {
        assert!(require_non_blank("title", "Rust in production").is_ok());
    }
}
