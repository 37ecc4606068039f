use thiserror::Error;

/// Failures reported synchronously to whoever installs or dispatches.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterceptError {
    #[error("class `{class}` does not resolve method `{method}`")]
    ClassMissingMethod { class: String, method: String },

    #[error("method `{method}` on class `{class}` is already intercepted")]
    AlreadyIntercepted { class: String, method: String },

    #[error("instance of `{class}` does not respond to `{method}`")]
    DoesNotRespond { class: String, method: String },
}

impl InterceptError {
    /// Class name the error refers to.
    #[must_use]
    pub fn class(&self) -> &str {
        match self {
            Self::ClassMissingMethod { class, .. }
            | Self::AlreadyIntercepted { class, .. }
            | Self::DoesNotRespond { class, .. } => class,
        }
    }

    /// Method name the error refers to.
    #[must_use]
    pub fn method(&self) -> &str {
        match self {
            Self::ClassMissingMethod { method, .. }
            | Self::AlreadyIntercepted { method, .. }
            | Self::DoesNotRespond { method, .. } => method,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::InterceptError;

    #[test]
    fn display_names_class_and_method() {
        let err = InterceptError::AlreadyIntercepted {
            class: "Bundle".into(),
            method: "localize".into(),
        };
        assert_eq!(
            err.to_string(),
            "method `localize` on class `Bundle` is already intercepted"
        );
        assert_eq!(err.class(), "Bundle");
        assert_eq!(err.method(), "localize");
    }
}
