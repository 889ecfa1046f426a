//! Terminal failures of one proxy invocation and their fixed HTTP mapping.

use super::ProxyResponse;

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("request body is not valid json")]
    InvalidJson,
    #[error("request has no message")]
    MissingMessage,
    #[error("upstream credentials are not configured")]
    Misconfigured,
    /// Status and body are kept for logging only; callers never see them.
    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("internal error: {0}")]
    Internal(String),
}

const MISCONFIGURED_MESSAGE: &str =
    "Server misconfigured: missing ABACUS_API_KEY or ABACUS_API_URL";

impl ProxyError {
    fn status_code(&self) -> u16 {
        match self {
            ProxyError::MethodNotAllowed => 405,
            ProxyError::InvalidJson | ProxyError::MissingMessage => 400,
            ProxyError::Misconfigured | ProxyError::Internal(_) => 500,
            ProxyError::Upstream { .. } => 502,
        }
    }

    pub fn into_response(self) -> ProxyResponse {
        let status = self.status_code();
        match self {
            ProxyError::MethodNotAllowed => ProxyResponse::text(status, "Method Not Allowed"),
            ProxyError::InvalidJson => ProxyResponse::text(status, "Invalid JSON"),
            ProxyError::MissingMessage => ProxyResponse::error(status, "Missing message"),
            ProxyError::Misconfigured => ProxyResponse::error(status, MISCONFIGURED_MESSAGE),
            ProxyError::Upstream { .. } => ProxyResponse::error(status, "Upstream service error"),
            ProxyError::Internal(_) => ProxyResponse::error(status, "Internal Server Error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_details_are_not_leaked() {
        let res = ProxyError::Upstream {
            status: 500,
            body: "secret stack trace".to_string(),
        }
        .into_response();
        assert_eq!(res.status_code, 502);
        assert_eq!(res.body, r#"{"error":"Upstream service error"}"#);
    }

    #[test]
    fn plain_text_errors() {
        let res = ProxyError::MethodNotAllowed.into_response();
        assert_eq!(res.status_code, 405);
        assert_eq!(res.body, "Method Not Allowed");
        assert!(!res.is_json());

        let res = ProxyError::InvalidJson.into_response();
        assert_eq!(res.status_code, 400);
        assert_eq!(res.body, "Invalid JSON");
    }

    #[test]
    fn misconfigured_message_names_both_variables() {
        let res = ProxyError::Misconfigured.into_response();
        assert_eq!(res.status_code, 500);
        assert!(res.is_json());
        assert_eq!(
            res.body,
            r#"{"error":"Server misconfigured: missing ABACUS_API_KEY or ABACUS_API_URL"}"#
        );
    }

    #[test]
    fn internal_is_generic() {
        let res = ProxyError::Internal("boom".to_string()).into_response();
        assert_eq!(res.status_code, 500);
        assert_eq!(res.body, r#"{"error":"Internal Server Error"}"#);
    }
}
