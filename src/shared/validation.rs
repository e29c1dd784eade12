use lazy_static::lazy_static;
use regex::Regex;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

lazy_static! {
    /// Regex for category names, which become a directory in the prompt repository
    /// - Valid: "coding", "marketing-ru", "общие", "data_science"
    /// - Invalid: "a/b", "..", ".hidden", "with space"
    pub static ref CATEGORY_REGEX: Regex = Regex::new(r"^[\p{L}\p{N}_-]+$").unwrap();
}

/// Accepts any RFC 4122 UUID in its hyphenated form
pub fn validate_uuid(value: &str) -> Result<(), ValidationError> {
    if value.len() == 36 && Uuid::parse_str(value).is_ok() {
        Ok(())
    } else {
        Err(ValidationError::new("uuid").with_message("Invalid UUID format".into()))
    }
}

/// Flattens nested validator output into `path: message` lines, with list
/// indices as path segments (`prompt_variants.0.variant_id.type`).
pub fn field_errors(errors: &ValidationErrors) -> Vec<String> {
    let mut out = Vec::new();
    collect(errors, "", &mut out);
    out.sort();
    out
}

fn collect(errors: &ValidationErrors, prefix: &str, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(list) => {
                for error in list {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| default_message(&error.code));
                    out.push(format!("{}: {}", path, message));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(inner, &format!("{}.{}", path, index), out);
                }
            }
        }
    }
}

fn default_message(code: &str) -> String {
    match code {
        "required" => "Required".to_string(),
        "length" => "Cannot be empty".to_string(),
        "regex" => "Invalid format".to_string(),
        other => format!("Invalid value ({})", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Debug, Validate)]
    struct Inner {
        #[validate(length(min = 1, message = "Type cannot be empty"))]
        kind: String,
    }

    #[derive(Debug, Validate)]
    struct Outer {
        #[validate(required)]
        title: Option<String>,
        #[validate(nested)]
        items: Vec<Inner>,
    }

    #[test]
    fn test_category_regex() {
        assert!(CATEGORY_REGEX.is_match("coding"));
        assert!(CATEGORY_REGEX.is_match("marketing-ru"));
        assert!(CATEGORY_REGEX.is_match("общие"));
        assert!(CATEGORY_REGEX.is_match("data_science"));
        assert!(!CATEGORY_REGEX.is_match("a/b"));
        assert!(!CATEGORY_REGEX.is_match(".."));
        assert!(!CATEGORY_REGEX.is_match(".hidden"));
        assert!(!CATEGORY_REGEX.is_match("with space"));
        assert!(!CATEGORY_REGEX.is_match(""));
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("6f1c1e0a-3b1d-4f8e-9a43-1c2d3e4f5a6b").is_ok());
        assert!(validate_uuid("not-a-uuid").is_err());
        assert!(validate_uuid("6f1c1e0a3b1d4f8e9a431c2d3e4f5a6b").is_err());
    }

    #[test]
    fn test_field_errors_include_nested_paths() {
        let value = Outer {
            title: None,
            items: vec![
                Inner {
                    kind: "ok".into(),
                },
                Inner { kind: String::new() },
            ],
        };

        let errors = field_errors(&value.validate().unwrap_err());
        assert_eq!(
            errors,
            vec![
                "items.1.kind: Type cannot be empty".to_string(),
                "title: Required".to_string(),
            ]
        );
    }
}
