use thiserror::Error;

/// Failure modes surfaced by a product store.
///
/// Permission and availability failures are expected whenever no backend is
/// configured or the machine is offline; callers degrade to the next
/// fallback tier without bothering the user.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Other(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl StoreError {
    /// Truncate a response body to avoid logging excessive data. The cut
    /// backs up to a char boundary so multibyte bodies cannot panic.
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut cut = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!(
            "{}... (truncated, {} total bytes)",
            &body[..cut],
            body.len()
        )
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 | 403 => StoreError::PermissionDenied(truncated),
            404 => StoreError::NotFound(truncated),
            408 | 429 | 500..=599 => StoreError::Unavailable(truncated),
            _ => StoreError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    /// Whether this failure is an expected consequence of running without a
    /// reachable backend. Expected failures degrade silently; everything
    /// else gets a non-blocking notice.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            StoreError::PermissionDenied(_) | StoreError::Unavailable(_) | StoreError::Network(_)
        )
    }
}

/// Check an HTTP response, mapping failure statuses onto the taxonomy.
pub(crate) async fn check_response(
    response: reqwest::Response,
) -> Result<reqwest::Response, StoreError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::from_status(status, &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn status_mapping() {
        assert!(matches!(
            StoreError::from_status(StatusCode::FORBIDDEN, "nope"),
            StoreError::PermissionDenied(_)
        ));
        assert!(matches!(
            StoreError::from_status(StatusCode::UNAUTHORIZED, ""),
            StoreError::PermissionDenied(_)
        ));
        assert!(matches!(
            StoreError::from_status(StatusCode::NOT_FOUND, ""),
            StoreError::NotFound(_)
        ));
        assert!(matches!(
            StoreError::from_status(StatusCode::SERVICE_UNAVAILABLE, ""),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            StoreError::from_status(StatusCode::IM_A_TEAPOT, ""),
            StoreError::InvalidResponse(_)
        ));
    }

    #[test]
    fn expected_failures_degrade_silently() {
        assert!(StoreError::PermissionDenied(String::new()).is_expected());
        assert!(StoreError::Unavailable(String::new()).is_expected());
        assert!(!StoreError::NotFound(String::new()).is_expected());
        assert!(!StoreError::InvalidResponse(String::new()).is_expected());
        assert!(!StoreError::Other(String::new()).is_expected());
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(2000);
        let err = StoreError::from_status(StatusCode::FORBIDDEN, &body);
        let msg = err.to_string();
        assert!(msg.len() < 700);
        assert!(msg.contains("truncated"));
    }

    #[test]
    fn multibyte_bodies_truncate_on_a_char_boundary() {
        // 3 bytes per char, so the cut point lands mid-character.
        let body = "€".repeat(200);
        let err = StoreError::from_status(StatusCode::FORBIDDEN, &body);
        let msg = err.to_string();
        assert!(msg.contains("truncated, 600 total bytes"));
        assert!(msg.chars().filter(|c| *c == '€').count() < 200);
    }
}
