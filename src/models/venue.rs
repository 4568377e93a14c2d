use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Форма регистрации заведения. Числовые поля приходят прямо из формы и
/// могут быть нулевыми или отрицательными, пока оператор печатает.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct VenueDraft {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    // пределы совпадают с layout::editor::{MAX_SEATS, MAX_GRID_SIDE}
    #[validate(range(min = 1, max = 10000, message = "seat count must be in 1..=10000"))]
    pub seat_count: i64,
    #[validate(range(min = 1, max = 65535, message = "port must be in 1..=65535"))]
    pub port: i64,
    /// Количество колонок.
    #[validate(range(min = 1, max = 500, message = "width must be in 1..=500"))]
    pub width: i64,
    /// Количество рядов.
    #[validate(range(min = 1, max = 500, message = "height must be in 1..=500"))]
    pub height: i64,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("venue name must not be empty".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, port: i64) -> VenueDraft {
        VenueDraft {
            name: name.to_string(),
            seat_count: 10,
            port,
            width: 5,
            height: 2,
        }
    }

    #[test]
    fn complete_draft_validates() {
        assert!(draft("Arena PC", 7000).validate().is_ok());
    }

    #[test]
    fn blank_name_and_bad_port_are_rejected() {
        let errors = draft("   ", 0).validate().unwrap_err().to_string();
        assert!(errors.contains("name"));
        assert!(errors.contains("port"));
    }

    #[test]
    fn grid_outside_editor_limits_is_rejected() {
        let mut oversized = draft("Arena PC", 7000);
        oversized.seat_count = 2_000_000_000;
        oversized.width = 100_000;
        oversized.height = 0;
        let errors = oversized.validate().unwrap_err().to_string();
        assert!(errors.contains("seat_count"));
        assert!(errors.contains("width"));
        assert!(errors.contains("height"));
    }

    #[test]
    fn limits_match_the_editor() {
        use crate::layout::editor::{MAX_GRID_SIDE, MAX_SEATS};
        let mut largest = draft("Arena PC", 7000);
        largest.seat_count = i64::from(MAX_SEATS);
        largest.width = i64::from(MAX_GRID_SIDE);
        largest.height = i64::from(MAX_GRID_SIDE);
        assert!(largest.validate().is_ok());

        largest.seat_count += 1;
        assert!(largest.validate().is_err());
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let draft: VenueDraft = serde_json::from_str(r#"{"name":"x","seatCount":4}"#).unwrap();
        assert_eq!(draft.seat_count, 4);
        assert_eq!(draft.width, 0);
        assert_eq!(draft.port, 0);
    }
}
