use thiserror::Error;

/// 配置驗證錯誤
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("配置項 {field} 不可為空")]
    Empty { field: &'static str },

    #[error("配置項 {field} 的值 {value} 無效，可用選項: {}", .allowed.join(", "))]
    NotAllowed {
        field: &'static str,
        value: String,
        allowed: &'static [&'static str],
    },
}

/// 可自我驗證的配置區段
pub trait Validator {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// 值必須是允許的選項之一（不分大小寫）
pub fn expect_choice(
    field: &'static str,
    value: &str,
    allowed: &'static [&'static str],
) -> Result<(), ValidationError> {
    if allowed.iter().any(|option| option.eq_ignore_ascii_case(value)) {
        Ok(())
    } else {
        Err(ValidationError::NotAllowed {
            field,
            value: value.to_string(),
            allowed,
        })
    }
}

pub fn expect_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORMATS: &[&str] = &["pretty", "json"];

    #[test]
    fn test_expect_choice_ignores_case() {
        assert!(expect_choice("log.format", "JSON", FORMATS).is_ok());

        let err = expect_choice("log.format", "xml", FORMATS).unwrap_err();
        assert_eq!(
            err.to_string(),
            "配置項 log.format 的值 xml 無效，可用選項: pretty, json"
        );
    }

    #[test]
    fn test_expect_non_empty() {
        assert!(expect_non_empty("log.level", "info").is_ok());
        assert_eq!(
            expect_non_empty("log.level", "   "),
            Err(ValidationError::Empty { field: "log.level" })
        );
    }
}
