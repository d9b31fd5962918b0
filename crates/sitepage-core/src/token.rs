//! Write-authorization token (form digest)
//!
//! Fetched immediately before each mutating sequence and never cached.

use crate::client::SiteClient;
use crate::error::{PipelineError, Result};
use crate::transport::ApiRequest;
use sitepage_odata::find_field;
use std::fmt::{self, Debug, Formatter};

const VERBOSE_KEY: &str = "GetContextWebInformation";
const DIGEST_FIELD: &str = "FormDigestValue";

/// Short-lived digest bound to the current session
///
/// Not `Clone`; one token per update transaction.
pub struct AuthToken(String);

impl AuthToken {
    /// Header value for `X-RequestDigest`
    #[inline]
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for AuthToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

/// POST `contextinfo` and read the form digest
///
/// # Errors
/// `TransportError` for any non-success status, `AuthError` when the digest
/// is absent from both response shapes
pub async fn acquire_token(client: &SiteClient) -> Result<AuthToken> {
    let request = ApiRequest::post(client.api_url("contextinfo"));
    let response = client.send_required(request, "contextinfo").await?;
    let document = response
        .json("contextinfo")
        .map_err(|e| PipelineError::Auth(e.to_string()))?;

    let digest = find_field(&document, Some(VERBOSE_KEY), DIGEST_FIELD)
        .and_then(|value| value.as_str())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| PipelineError::Auth(format!("{DIGEST_FIELD} missing from contextinfo")))?;

    tracing::debug!("Acquired form digest");
    Ok(AuthToken(digest.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{ApiResponse, MockTransport, Method};
    use std::sync::Arc;
    use url::Url;

    fn client_answering(status: u16, body: &'static str) -> SiteClient {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|request| request.method == Method::Post && request.url.ends_with("/_api/contextinfo"))
            .times(1)
            .returning(move |_| Ok(ApiResponse::new(status, body)));
        SiteClient::new(Arc::new(mock), Url::parse("https://c.example/sites/X").unwrap())
    }

    #[tokio::test]
    async fn modern_shape() {
        let client = client_answering(200, r#"{"FormDigestValue":"0x1,2024"}"#);
        let token = acquire_token(&client).await.unwrap();
        assert_eq!(token.expose(), "0x1,2024");
    }

    #[tokio::test]
    async fn verbose_shape() {
        let client = client_answering(
            200,
            r#"{"d":{"GetContextWebInformation":{"FormDigestValue":"0xV"}}}"#,
        );
        assert_eq!(acquire_token(&client).await.unwrap().expose(), "0xV");
    }

    #[tokio::test]
    async fn missing_digest_is_auth_error() {
        let client = client_answering(200, r#"{"WebFullUrl":"x"}"#);
        let err = acquire_token(&client).await.unwrap_err();
        assert!(matches!(err, PipelineError::Auth(_)));
    }

    #[tokio::test]
    async fn forbidden_is_transport_error() {
        let client = client_answering(403, "denied");
        let err = acquire_token(&client).await.unwrap_err();
        assert!(matches!(err, PipelineError::Transport(_)));
    }

    #[test]
    fn debug_is_redacted() {
        let token = AuthToken("secret".into());
        assert!(!format!("{token:?}").contains("secret"));
    }
}
