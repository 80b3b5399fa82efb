//! Caller identity
//!
//! Authentication happens upstream; requests arrive with the caller's id in
//! the `x-user-id` header. Handlers that record who did something take an
//! [`AuthenticatedUser`] argument and get a 401 when the header is unusable.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const MAX_USER_ID_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
}

impl AuthenticatedUser {
    fn from_header(value: Option<&str>) -> Result<Self, AppError> {
        let user_id = value
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::Unauthorized(format!("Missing {} header", USER_ID_HEADER)))?;

        if user_id.chars().count() > MAX_USER_ID_LEN {
            return Err(AppError::Unauthorized(format!(
                "{} must be at most {} characters",
                USER_ID_HEADER, MAX_USER_ID_LEN
            )));
        }

        Ok(Self {
            user_id: user_id.to_string(),
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(USER_ID_HEADER)
            .map(|v| v.to_str())
            .transpose()
            .map_err(|_| AppError::Unauthorized(format!("{} is not valid text", USER_ID_HEADER)))?;

        Self::from_header(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_header() {
        assert_eq!(
            AuthenticatedUser::from_header(Some(" operator-7 ")).unwrap().user_id,
            "operator-7"
        );
        assert!(AuthenticatedUser::from_header(None).is_err());
        assert!(AuthenticatedUser::from_header(Some("   ")).is_err());
        assert!(AuthenticatedUser::from_header(Some(&"u".repeat(129))).is_err());
        assert!(AuthenticatedUser::from_header(Some(&"u".repeat(128))).is_ok());
    }

    #[tokio::test]
    async fn test_extractor_reads_header() {
        let request = axum::http::Request::builder()
            .header(USER_ID_HEADER, "operator-7")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();

        let user = AuthenticatedUser::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(user.user_id, "operator-7");

        let (mut parts, _) = axum::http::Request::builder().body(()).unwrap().into_parts();
        assert!(matches!(
            AuthenticatedUser::from_request_parts(&mut parts, &()).await,
            Err(AppError::Unauthorized(_))
        ));
    }
}
