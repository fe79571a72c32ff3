//! Environment variable expansion for configuration strings.

use std::borrow::Cow;

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in `value`.
///
/// `field` is the dotted config path used in error messages.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    shellexpand::env(value)
        .map(Cow::into_owned)
        .map_err(|err| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", err.var_name),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_value_unchanged() {
        assert_eq!(
            expand_env("secret_abc", "notion.api_key").unwrap(),
            "secret_abc"
        );
    }

    #[test]
    fn test_default_used_when_unset() {
        let value = expand_env(
            "${QUILL_TEST_DEFINITELY_UNSET_VAR:-https://api.notion.com}",
            "notion.base_url",
        )
        .unwrap();
        assert_eq!(value, "https://api.notion.com");
    }

    #[test]
    fn test_unset_variable_errors_with_field() {
        let err = expand_env("${QUILL_TEST_DEFINITELY_UNSET_VAR}", "notion.api_key").unwrap_err();
        match err {
            ConfigError::EnvVar { field, message } => {
                assert_eq!(field, "notion.api_key");
                assert!(message.contains("QUILL_TEST_DEFINITELY_UNSET_VAR"));
            }
            other => panic!("expected EnvVar error, got {other:?}"),
        }
    }
}
