//! Connection check against the work item service

use tracing::warn;

use crate::core::devops::{ApiSettings, Credentials, DevOpsClient, WorkItemApi};
use crate::core::text::truncate;

/// Longest response or error text included in a failure message
const DIAGNOSTIC_LIMIT: usize = 200;

/// Outcome of a connection check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionCheck {
    pub success: bool,
    pub message: String,
}

impl ConnectionCheck {
    fn ok(message: String) -> Self {
        Self {
            success: true,
            message,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            success: false,
            message,
        }
    }
}

/// Check that `credentials` can reach the project.
///
/// Blank credentials fail locally before any client is built.
pub fn validate(credentials: &Credentials, settings: &ApiSettings) -> ConnectionCheck {
    if let Some(check) = check_credentials(credentials) {
        return check;
    }
    match DevOpsClient::new(credentials.clone(), settings.clone()) {
        Ok(client) => validate_with(&client, credentials),
        Err(e) => ConnectionCheck::failed(format!(
            "Error: {}",
            truncate(&e.to_string(), DIAGNOSTIC_LIMIT)
        )),
    }
}

/// Check a connection through an existing client with one read-only call
pub fn validate_with(api: &dyn WorkItemApi, credentials: &Credentials) -> ConnectionCheck {
    if let Some(check) = check_credentials(credentials) {
        return check;
    }

    match api.list_work_item_types() {
        // A rejected token is answered with 203 and a sign-in page
        Ok(response) if response.status == 200 => ConnectionCheck::ok(format!(
            "Connection successful! Project: {}",
            credentials.project
        )),
        Ok(response) => {
            warn!(status = response.status, "Connection check rejected");
            ConnectionCheck::failed(format!(
                "Connection failed: HTTP {}\nResponse: {}",
                response.status,
                truncate(&response.body, DIAGNOSTIC_LIMIT)
            ))
        }
        Err(e) => {
            warn!(error = %e, "Connection check failed");
            ConnectionCheck::failed(format!(
                "Error: {}",
                truncate(&e.to_string(), DIAGNOSTIC_LIMIT)
            ))
        }
    }
}

fn check_credentials(credentials: &Credentials) -> Option<ConnectionCheck> {
    let missing = credentials.missing_fields();
    if missing.is_empty() {
        None
    } else {
        Some(ConnectionCheck::failed(format!(
            "Please provide the {}.",
            missing.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::devops::{ApiError, ApiResponse, PatchOperation};
    use std::cell::Cell;

    struct StubApi {
        response: Result<ApiResponse, ApiError>,
        calls: Cell<usize>,
    }

    impl StubApi {
        fn new(response: Result<ApiResponse, ApiError>) -> Self {
            Self {
                response,
                calls: Cell::new(0),
            }
        }
    }

    impl WorkItemApi for StubApi {
        fn list_work_item_types(&self) -> Result<ApiResponse, ApiError> {
            self.calls.set(self.calls.get() + 1);
            self.response.clone()
        }

        fn create_work_item(
            &self,
            _work_item_type: &str,
            _operations: &[PatchOperation],
        ) -> Result<ApiResponse, ApiError> {
            unreachable!("validation must stay read-only")
        }

        fn update_work_item(
            &self,
            _id: u64,
            _operations: &[PatchOperation],
        ) -> Result<ApiResponse, ApiError> {
            unreachable!("validation must stay read-only")
        }
    }

    fn creds() -> Credentials {
        Credentials::new("contoso", "CDMS", "pat")
    }

    #[test]
    fn test_success() {
        let api = StubApi::new(Ok(ApiResponse {
            status: 200,
            body: "{\"count\": 12}".to_string(),
        }));
        let check = validate_with(&api, &creds());
        assert!(check.success);
        assert_eq!(check.message, "Connection successful! Project: CDMS");
        assert_eq!(api.calls.get(), 1);
    }

    #[test]
    fn test_http_failure_is_truncated() {
        let api = StubApi::new(Ok(ApiResponse {
            status: 401,
            body: "x".repeat(1000),
        }));
        let check = validate_with(&api, &creds());
        assert!(!check.success);
        assert!(check.message.starts_with("Connection failed: HTTP 401"));
        assert!(check.message.len() < 300);
        assert_eq!(api.calls.get(), 1);
    }

    #[test]
    fn test_sign_in_page_is_not_success() {
        let api = StubApi::new(Ok(ApiResponse {
            status: 203,
            body: "<html>Sign In</html>".to_string(),
        }));
        let check = validate_with(&api, &creds());
        assert!(!check.success);
        assert_eq!(
            check.message,
            "Connection failed: HTTP 203\nResponse: <html>Sign In</html>"
        );
    }

    #[test]
    fn test_transport_failure() {
        let api = StubApi::new(Err(ApiError::Timeout("operation timed out".to_string())));
        let check = validate_with(&api, &creds());
        assert!(!check.success);
        assert_eq!(check.message, "Error: Request timed out: operation timed out");
    }

    #[test]
    fn test_missing_credentials_short_circuit() {
        let api = StubApi::new(Ok(ApiResponse {
            status: 200,
            body: String::new(),
        }));
        let check = validate_with(&api, &Credentials::new("contoso", "", ""));
        assert!(!check.success);
        assert_eq!(
            check.message,
            "Please provide the project, personal access token."
        );
        assert_eq!(api.calls.get(), 0);
    }

    #[test]
    fn test_validate_missing_token_without_client() {
        let check = validate(&Credentials::new("a", "b", " "), &ApiSettings::default());
        assert!(!check.success);
        assert!(check.message.contains("personal access token"));
    }

    #[test]
    fn test_validate_unreachable_endpoint() {
        let settings = ApiSettings {
            base_url: "http://127.0.0.1:9".to_string(),
            read_timeout: std::time::Duration::from_secs(2),
            ..ApiSettings::default()
        };
        let check = validate(&creds(), &settings);
        assert!(!check.success);
        assert!(check.message.starts_with("Error: "));
    }
}
