use log::{debug, warn};
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use std::time::Duration;
use url::Url;

use crate::api::Backend;
use crate::api::error::{ApiError, GENERIC_FAILURE};
use crate::api::types::{Credentials, Registration, TokenResponse, error_detail};
use crate::domain::email::Email;
use crate::domain::session::UserProfile;

/// Blocking HTTP client for the portal backend.
pub struct ApiClient {
    http: Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(ApiError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Append path segments to the base url. Segments are percent-encoded, so an
    /// attachment name containing `/` stays a single segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn send(&self, req: RequestBuilder) -> Result<Response, ApiError> {
        let resp = req.send()?;
        let status = resp.status();
        debug!("{} -> {}", resp.url().path(), status);
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().unwrap_or_default();
        let detail = error_detail(&body);
        warn!("backend returned {status}: {}", detail.as_deref().unwrap_or("-"));
        let detail = detail.unwrap_or_else(|| GENERIC_FAILURE.to_string());
        if status == StatusCode::UNAUTHORIZED {
            Err(ApiError::Unauthorized(detail))
        } else {
            Err(ApiError::Status {
                status: status.as_u16(),
                detail,
            })
        }
    }
}

impl Backend for ApiClient {
    fn login(&self, credentials: &Credentials) -> Result<TokenResponse, ApiError> {
        let req = self.http.post(self.endpoint(&["login"])).json(credentials);
        Ok(self.send(req)?.json()?)
    }

    fn register(&self, registration: &Registration) -> Result<(), ApiError> {
        let req = self
            .http
            .post(self.endpoint(&["register"]))
            .json(registration);
        self.send(req)?;
        Ok(())
    }

    fn profile(&self, token: &str) -> Result<UserProfile, ApiError> {
        let req = self
            .http
            .get(self.endpoint(&["user", "profile"]))
            .bearer_auth(token);
        Ok(self.send(req)?.json()?)
    }

    fn emails(&self, token: &str) -> Result<Vec<Email>, ApiError> {
        let req = self.http.get(self.endpoint(&["emails"])).bearer_auth(token);
        Ok(self.send(req)?.json()?)
    }

    fn attachment(&self, token: &str, email_id: &str, filename: &str) -> Result<Vec<u8>, ApiError> {
        let req = self
            .http
            .get(self.endpoint(&["emails", email_id, "attachments", filename]))
            .bearer_auth(token);
        match self.send(req) {
            Ok(resp) => Ok(resp.bytes()?.to_vec()),
            Err(ApiError::Status { status, detail }) => Err(ApiError::Status {
                status,
                detail: download_failure(&detail),
            }),
            Err(e) => Err(e),
        }
    }

    fn logout(&self, token: &str) -> Result<(), ApiError> {
        let req = self.http.post(self.endpoint(&["logout"])).bearer_auth(token);
        self.send(req)?;
        Ok(())
    }
}

fn download_failure(detail: &str) -> String {
    if detail == GENERIC_FAILURE {
        "Download failed".to_string()
    } else {
        format!("Download failed: {detail}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn endpoint_joins_under_base_path() {
        let c = client("http://localhost:8000/api");
        assert_eq!(c.endpoint(&["login"]).as_str(), "http://localhost:8000/api/login");

        let c = client("http://localhost:8000/api/");
        assert_eq!(
            c.endpoint(&["user", "profile"]).as_str(),
            "http://localhost:8000/api/user/profile"
        );
    }

    #[test]
    fn endpoint_encodes_segments() {
        let c = client("http://localhost:8000/api");
        assert_eq!(
            c.endpoint(&["emails", "12", "attachments", "q1/q2 report.pdf"]).as_str(),
            "http://localhost:8000/api/emails/12/attachments/q1%2Fq2%20report.pdf"
        );
    }

    #[test]
    fn rejects_unusable_base() {
        assert!(matches!(
            ApiClient::new("mailto:someone@example.com", Duration::from_secs(1)),
            Err(ApiError::Url(_))
        ));
        assert!(ApiClient::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn download_failure_text() {
        assert_eq!(download_failure(GENERIC_FAILURE), "Download failed");
        assert_eq!(
            download_failure("Attachment not found"),
            "Download failed: Attachment not found"
        );
    }
}
