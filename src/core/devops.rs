//! Azure DevOps work item client
//!
//! `WorkItemApi` is the seam between the upload/validation logic and the
//! network. `DevOpsClient` implements it over blocking HTTP; tests supply an
//! in-memory implementation.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::core::text::escape_xml;
use crate::entities::test_case::{Step, TestCase};

pub const DEFAULT_BASE_URL: &str = "https://dev.azure.com";
pub const DEFAULT_API_VERSION: &str = "7.0";
/// Work item type created for every test case
pub const TEST_CASE_TYPE: &str = "Test Case";
pub const STEPS_FIELD: &str = "Microsoft.VSTS.TCM.Steps";

const JSON_PATCH: &str = "application/json-patch+json";

/// Organization, project and personal access token for one connection
#[derive(Clone, Default)]
pub struct Credentials {
    pub organization: String,
    pub project: String,
    pub token: String,
}

impl Credentials {
    pub fn new(
        organization: impl Into<String>,
        project: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            organization: organization.into(),
            project: project.into(),
            token: token.into(),
        }
    }

    /// Names of the credential fields that are blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.organization.trim().is_empty() {
            missing.push("organization");
        }
        if self.project.trim().is_empty() {
            missing.push("project");
        }
        if self.token.trim().is_empty() {
            missing.push("personal access token");
        }
        missing
    }

    /// Value of the `Authorization` header: Basic auth with an empty user
    pub fn basic_auth(&self) -> String {
        format!("Basic {}", BASE64.encode(format!(":{}", self.token)))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("organization", &self.organization)
            .field("project", &self.project)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Endpoint and timeout settings
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub api_version: String,
    /// Timeout for read-only calls
    pub read_timeout: Duration,
    /// Timeout for create and update calls
    pub write_timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            read_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(30),
        }
    }
}

/// A single JSON-patch operation on a work item field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchOperation {
    pub op: String,
    pub path: String,
    pub value: String,
}

impl PatchOperation {
    /// `add` operation on `/fields/<field>`
    pub fn add_field(field: &str, value: impl Into<String>) -> Self {
        Self {
            op: "add".to_string(),
            path: format!("/fields/{}", field),
            value: value.into(),
        }
    }
}

/// Caller-supplied values that take precedence over the test case's own
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub area_path: Option<String>,
    pub iteration_path: Option<String>,
}

/// Status and body of a completed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures that prevented an HTTP exchange from completing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("{0}")]
    Transport(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// Work item operations used by the uploader and the connection validator
pub trait WorkItemApi {
    /// Enumerate work item types (read-only)
    fn list_work_item_types(&self) -> Result<ApiResponse, ApiError>;

    /// Create a work item of `work_item_type` with the given field operations
    fn create_work_item(
        &self,
        work_item_type: &str,
        operations: &[PatchOperation],
    ) -> Result<ApiResponse, ApiError>;

    /// Apply field operations to an existing work item
    fn update_work_item(
        &self,
        id: u64,
        operations: &[PatchOperation],
    ) -> Result<ApiResponse, ApiError>;
}

/// Body returned by the create endpoint; only the id is needed
#[derive(Debug, Deserialize)]
pub struct CreatedWorkItem {
    pub id: u64,
}

/// Blocking HTTP client for the Azure DevOps work item endpoints
pub struct DevOpsClient {
    http: Client,
    credentials: Credentials,
    settings: ApiSettings,
}

impl DevOpsClient {
    pub fn new(credentials: Credentials, settings: ApiSettings) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&credentials.basic_auth())
            .map_err(|e| ApiError::Transport(format!("Invalid token: {}", e)))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_PATCH));

        let http = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            credentials,
            settings,
        })
    }

    /// `{base}/{organization}/{project}/_apis/wit/<segments>?api-version=..`
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.settings.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", self.settings.base_url, e)))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidUrl(self.settings.base_url.clone()))?;
            path.pop_if_empty();
            path.push(&self.credentials.organization);
            path.push(&self.credentials.project);
            path.push("_apis");
            path.push("wit");
            path.extend(segments);
        }
        url.query_pairs_mut()
            .append_pair("api-version", &self.settings.api_version);
        Ok(url)
    }

    fn send(
        &self,
        method: Method,
        url: Url,
        timeout: Duration,
        body: Option<&[PatchOperation]>,
    ) -> Result<ApiResponse, ApiError> {
        debug!(method = method.as_str(), url = url.as_str(), "Azure DevOps request");
        let mut request = self.http.request(method, url).timeout(timeout);
        if let Some(ops) = body {
            let payload = serde_json::to_vec(ops)
                .map_err(|e| ApiError::Transport(format!("Failed to encode payload: {}", e)))?;
            request = request.body(payload);
        }
        let response = request.send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(ApiResponse { status, body })
    }
}

impl WorkItemApi for DevOpsClient {
    fn list_work_item_types(&self) -> Result<ApiResponse, ApiError> {
        let url = self.endpoint(&["workitemtypes"])?;
        self.send(Method::GET, url, self.settings.read_timeout, None)
    }

    fn create_work_item(
        &self,
        work_item_type: &str,
        operations: &[PatchOperation],
    ) -> Result<ApiResponse, ApiError> {
        let type_segment = format!("${}", work_item_type);
        let url = self.endpoint(&["workitems", &type_segment])?;
        self.send(
            Method::POST,
            url,
            self.settings.write_timeout,
            Some(operations),
        )
    }

    fn update_work_item(
        &self,
        id: u64,
        operations: &[PatchOperation],
    ) -> Result<ApiResponse, ApiError> {
        let id = id.to_string();
        let url = self.endpoint(&["workitems", &id])?;
        self.send(
            Method::PATCH,
            url,
            self.settings.write_timeout,
            Some(operations),
        )
    }
}

/// Field operations for creating the work item behind `case`
pub fn create_payload(
    case: &TestCase,
    overrides: &Overrides,
    include_custom_fields: bool,
) -> Vec<PatchOperation> {
    let mut ops = vec![
        PatchOperation::add_field("System.Title", &case.title),
        PatchOperation::add_field("System.State", &case.state),
        PatchOperation::add_field("System.Description", &case.description),
    ];

    let area_path = pick(overrides.area_path.as_deref(), &case.area_path);
    if let Some(area_path) = area_path {
        ops.push(PatchOperation::add_field("System.AreaPath", area_path));
    }
    let iteration_path = pick(overrides.iteration_path.as_deref(), &case.iteration_path);
    if let Some(iteration_path) = iteration_path {
        ops.push(PatchOperation::add_field("System.IterationPath", iteration_path));
    }

    if include_custom_fields {
        ops.push(PatchOperation::add_field(
            "Custom.TestCaseClassification",
            case.classification.as_str(),
        ));
        ops.push(PatchOperation::add_field("Custom.FormName", &case.form_name));
    }
    if !case.testing_tier.is_empty() {
        ops.push(PatchOperation::add_field(
            "Custom.TestingTier",
            &case.testing_tier,
        ));
    }

    ops
}

/// Non-blank override, else non-blank case value
fn pick<'a>(override_value: Option<&'a str>, case_value: &'a str) -> Option<&'a str> {
    override_value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| Some(case_value.trim()).filter(|v| !v.is_empty()))
}

/// Encode steps as the XML fragment stored in the test case steps field
pub fn steps_xml(steps: &[Step]) -> String {
    let mut xml = format!("<steps id=\"0\" last=\"{}\">", steps.len());
    for step in steps {
        xml.push_str(&format!(
            "<step id=\"{}\" type=\"ValidateStep\">\
             <parameterizedString isformatted=\"true\">&lt;DIV&gt;&lt;P&gt;{}&lt;/P&gt;&lt;/DIV&gt;</parameterizedString>\
             <parameterizedString isformatted=\"true\">&lt;DIV&gt;&lt;P&gt;{}&lt;/P&gt;&lt;/DIV&gt;</parameterizedString>\
             <description/></step>",
            step.step_number,
            escape_xml(&step.action),
            escape_xml(&step.expected),
        ));
    }
    xml.push_str("</steps>");
    xml
}

/// Update operation attaching `steps` to an existing work item
pub fn steps_payload(steps: &[Step]) -> Vec<PatchOperation> {
    vec![PatchOperation::add_field(STEPS_FIELD, steps_xml(steps))]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::row::Classification;
    use crate::entities::test_case::TestCaseKind;

    fn case() -> TestCase {
        TestCase {
            kind: TestCaseKind::FieldReviews,
            title: "AE - Field Reviews".to_string(),
            form_name: "AE".to_string(),
            classification: Classification::FieldLevel,
            testing_tier: String::new(),
            description: "Field-level validation for form AE. Total fields: 1".to_string(),
            area_path: "Study\\AE".to_string(),
            iteration_path: String::new(),
            state: "Design".to_string(),
            steps: vec![Step {
                step_number: 1,
                action: "Review field: AESEV".to_string(),
                expected: "Severity <= 3 & \"graded\"".to_string(),
                source_name: Some("AESEV".to_string()),
            }],
        }
    }

    fn paths(ops: &[PatchOperation]) -> Vec<&str> {
        ops.iter().map(|o| o.path.as_str()).collect()
    }

    #[test]
    fn test_basic_auth_header() {
        let creds = Credentials::new("org", "proj", "secret");
        // base64(":secret")
        assert_eq!(creds.basic_auth(), "Basic OnNlY3JldA==");
    }

    #[test]
    fn test_credentials_debug_redacts_token() {
        let creds = Credentials::new("org", "proj", "secret");
        let shown = format!("{:?}", creds);
        assert!(!shown.contains("secret"));
        assert!(shown.contains("<redacted>"));
    }

    #[test]
    fn test_missing_fields() {
        let creds = Credentials::new("org", " ", "");
        assert_eq!(
            creds.missing_fields(),
            vec!["project", "personal access token"]
        );
    }

    #[test]
    fn test_create_payload_uses_case_area_path() {
        let ops = create_payload(&case(), &Overrides::default(), true);
        assert_eq!(
            paths(&ops),
            vec![
                "/fields/System.Title",
                "/fields/System.State",
                "/fields/System.Description",
                "/fields/System.AreaPath",
                "/fields/Custom.TestCaseClassification",
                "/fields/Custom.FormName",
            ]
        );
        assert_eq!(ops[3].value, "Study\\AE");
        assert!(ops.iter().all(|o| o.op == "add"));
    }

    #[test]
    fn test_create_payload_override_wins() {
        let mut c = case();
        c.testing_tier = "Tier 2".to_string();
        let overrides = Overrides {
            area_path: Some("Override\\Area".to_string()),
            iteration_path: Some("Sprint 4".to_string()),
        };
        let ops = create_payload(&c, &overrides, false);

        let area = ops.iter().find(|o| o.path == "/fields/System.AreaPath").unwrap();
        assert_eq!(area.value, "Override\\Area");
        let iteration = ops
            .iter()
            .find(|o| o.path == "/fields/System.IterationPath")
            .unwrap();
        assert_eq!(iteration.value, "Sprint 4");
        let tier = ops
            .iter()
            .find(|o| o.path == "/fields/Custom.TestingTier")
            .unwrap();
        assert_eq!(tier.value, "Tier 2");
        assert!(!paths(&ops).contains(&"/fields/Custom.FormName"));
    }

    #[test]
    fn test_blank_override_falls_back() {
        let overrides = Overrides {
            area_path: Some("  ".to_string()),
            iteration_path: None,
        };
        let ops = create_payload(&case(), &overrides, true);
        let area = ops.iter().find(|o| o.path == "/fields/System.AreaPath").unwrap();
        assert_eq!(area.value, "Study\\AE");
    }

    #[test]
    fn test_patch_operation_json() {
        let op = PatchOperation::add_field("System.Title", "T");
        let json = serde_json::to_string(&op).unwrap();
        assert_eq!(json, r#"{"op":"add","path":"/fields/System.Title","value":"T"}"#);
    }

    #[test]
    fn test_steps_xml() {
        let xml = steps_xml(&case().steps);
        insta::assert_snapshot!(xml, @r#"<steps id="0" last="1"><step id="1" type="ValidateStep"><parameterizedString isformatted="true">&lt;DIV&gt;&lt;P&gt;Review field: AESEV&lt;/P&gt;&lt;/DIV&gt;</parameterizedString><parameterizedString isformatted="true">&lt;DIV&gt;&lt;P&gt;Severity &lt;= 3 &amp; &quot;graded&quot;&lt;/P&gt;&lt;/DIV&gt;</parameterizedString><description/></step></steps>"#);
    }

    #[test]
    fn test_steps_payload_field() {
        let ops = steps_payload(&case().steps);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].path, "/fields/Microsoft.VSTS.TCM.Steps");
    }

    #[test]
    fn test_endpoint_encoding() {
        let client = DevOpsClient::new(
            Credentials::new("my org", "Clinical Forms", "pat"),
            ApiSettings::default(),
        )
        .unwrap();
        let url = client.endpoint(&["workitems", "$Test Case"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://dev.azure.com/my%20org/Clinical%20Forms/_apis/wit/workitems/$Test%20Case?api-version=7.0"
        );
    }

    #[test]
    fn test_endpoint_with_trailing_slash_base() {
        let settings = ApiSettings {
            base_url: "http://localhost:8080/tfs/".to_string(),
            ..ApiSettings::default()
        };
        let client = DevOpsClient::new(Credentials::new("c", "p", "t"), settings).unwrap();
        let url = client.endpoint(&["workitemtypes"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/tfs/c/p/_apis/wit/workitemtypes?api-version=7.0"
        );
    }
}
