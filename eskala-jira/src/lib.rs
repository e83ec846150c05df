use std::{
    collections::{BTreeMap, HashMap},
    time::Duration,
};

use anyhow::{anyhow, bail, Context, Result};
use eskala_config::EskalaConfig;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::COOKIE;
use serde::Deserialize;
use serde_json::Value;

mod session;
mod types;

pub use session::Session;
pub use types::{ChangelogEntry, FieldChange, Issue};

use types::{flatten_field_value, non_empty};

const REQUEST_TIMEOUT_SECS: u64 = 30;
pub const SEARCH_PAGE_SIZE: usize = 200;

pub trait IssueSearcher {
    fn search_issues(&self, jql: &str) -> Result<Vec<Issue>>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum AuthMode {
    Basic { user: String, password: String },
    Bearer { token: String },
    Session { cookie: String },
}

pub struct JiraClient {
    api_version: String,
    base_url: String,
    http: Client,
    auth_mode: AuthMode,
}

#[derive(Deserialize)]
struct SearchPayload {
    #[serde(default)]
    issues: Vec<IssuePayload>,
    #[serde(default)]
    total: usize,
}

#[derive(Deserialize)]
struct IssuePayload {
    id: String,
    key: String,
    #[serde(default)]
    fields: serde_json::Map<String, Value>,
    #[serde(default)]
    changelog: ChangelogPayload,
}

#[derive(Default, Deserialize)]
struct ChangelogPayload {
    #[serde(default)]
    histories: Vec<HistoryPayload>,
}

#[derive(Default, Deserialize)]
struct HistoryPayload {
    created: Option<String>,
    #[serde(default)]
    items: Vec<HistoryItemPayload>,
}

#[derive(Default, Deserialize)]
struct HistoryItemPayload {
    field: Option<String>,
    #[serde(rename = "fromString")]
    from_string: Option<String>,
    #[serde(rename = "toString")]
    to_string: Option<String>,
}

#[derive(Default, Deserialize)]
struct FieldInfoPayload {
    id: Option<String>,
    name: Option<String>,
}

#[derive(Default, Deserialize)]
struct MyselfPayload {
    #[serde(rename = "displayName")]
    display_name: Option<String>,
    name: Option<String>,
    #[serde(rename = "emailAddress")]
    email_address: Option<String>,
}

impl JiraClient {
    pub fn from_config(config: &EskalaConfig) -> Result<Self> {
        let auth_mode = parse_auth_mode(config)?;
        Self::with_auth_mode(config, auth_mode)
    }

    pub fn from_session(config: &EskalaConfig, session: &Session) -> Result<Self> {
        Self::with_auth_mode(
            config,
            AuthMode::Session {
                cookie: session.cookie_header().to_string(),
            },
        )
    }

    fn with_auth_mode(config: &EskalaConfig, auth_mode: AuthMode) -> Result<Self> {
        let server = config
            .jira_server
            .as_deref()
            .ok_or_else(|| anyhow!("jira_server not configured"))?;
        let api_version = config.api_version().to_string();

        let http = Client::builder()
            .danger_accept_invalid_certs(config.insecure)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .with_context(|| "failed to build Jira HTTP client")?;

        Ok(Self {
            api_version: api_version.clone(),
            base_url: format!("{server}/rest/api/{api_version}"),
            http,
            auth_mode,
        })
    }

    pub fn current_user(&self) -> Result<String> {
        let endpoint = format!("{}/myself", self.base_url);
        let response = self
            .with_auth(self.http.get(endpoint))
            .send()
            .with_context(|| "failed to fetch current user")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            bail!(
                "jira myself request failed: status={} body={}",
                status,
                body
            );
        }

        let payload: MyselfPayload = response
            .json()
            .with_context(|| "failed to decode Jira user response")?;
        payload
            .display_name
            .or(payload.name)
            .or(payload.email_address)
            .and_then(|value| non_empty(&value))
            .ok_or_else(|| anyhow!("jira did not report a user name"))
    }

    pub fn search_issues_all(&self, jql: &str, max_results: usize) -> Result<Vec<Issue>> {
        let catalog = self.field_catalog()?;
        let mut issues = Vec::new();
        let mut start_at = 0usize;

        loop {
            let page = self.search_issues_page(jql, start_at, max_results)?;
            let page_len = page.issues.len();
            issues.extend(
                page.issues
                    .into_iter()
                    .map(|payload| into_issue(payload, &catalog)),
            );

            if page_len == 0 || start_at + max_results >= page.total {
                break;
            }
            start_at += max_results;
        }

        Ok(issues)
    }

    // Maps raw field ids ("customfield_10101") to their display names so
    // snapshots stay readable and custom field positions do not matter.
    fn field_catalog(&self) -> Result<HashMap<String, String>> {
        let endpoint = format!("{}/field", self.base_url);
        let response = self
            .with_auth(self.http.get(endpoint))
            .send()
            .with_context(|| "failed to fetch Jira field catalog")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            bail!(
                "jira field request failed: status={} body={}",
                status,
                body
            );
        }

        let payload: Vec<FieldInfoPayload> = response
            .json()
            .with_context(|| "failed to decode Jira field catalog response")?;
        Ok(payload
            .into_iter()
            .filter_map(|field| Some((field.id?, field.name?)))
            .collect())
    }

    fn search_issues_page(
        &self,
        jql: &str,
        start_at: usize,
        max_results: usize,
    ) -> Result<SearchPayload> {
        let endpoint = format!("{}/{}", self.base_url, self.search_endpoint());
        let response = self
            .with_auth(self.http.get(endpoint))
            .query(&[
                ("jql", jql.to_string()),
                ("startAt", start_at.to_string()),
                ("maxResults", max_results.to_string()),
                ("fields", "*all".to_string()),
                ("expand", "changelog".to_string()),
            ])
            .send()
            .with_context(|| "failed to execute Jira search request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            bail!(
                "jira search request failed: status={} body={}",
                status,
                body
            );
        }

        response
            .json()
            .with_context(|| "failed to decode Jira search response (session may have expired)")
    }

    fn search_endpoint(&self) -> &str {
        if self.api_version == "3" {
            "search/jql"
        } else {
            "search"
        }
    }

    fn with_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_mode {
            AuthMode::Basic { user, password } => request.basic_auth(user, Some(password)),
            AuthMode::Bearer { token } => request.bearer_auth(token),
            AuthMode::Session { cookie } => request.header(COOKIE, cookie.as_str()),
        }
    }
}

impl IssueSearcher for JiraClient {
    fn search_issues(&self, jql: &str) -> Result<Vec<Issue>> {
        self.search_issues_all(jql, SEARCH_PAGE_SIZE)
    }
}

fn parse_auth_mode(config: &EskalaConfig) -> Result<AuthMode> {
    let secret = config
        .jira_password
        .as_deref()
        .ok_or_else(|| anyhow!("jira_password not configured"))?;

    match config.auth_method() {
        "basic" => {
            let user = config
                .jira_user
                .as_deref()
                .ok_or_else(|| anyhow!("jira_user not configured for basic auth"))?;
            Ok(AuthMode::Basic {
                user: user.to_string(),
                password: secret.to_string(),
            })
        }
        "bearer" => Ok(AuthMode::Bearer {
            token: secret.to_string(),
        }),
        "session" => bail!("session auth needs a form login; build the client via from_session"),
        other => bail!("unsupported auth method '{}'", other),
    }
}

fn into_issue(payload: IssuePayload, catalog: &HashMap<String, String>) -> Issue {
    let mut fields = BTreeMap::new();
    for (raw_name, value) in payload.fields {
        let Some(rendered) = flatten_field_value(&value) else {
            continue;
        };
        let name = catalog.get(&raw_name).cloned().unwrap_or(raw_name);
        fields.insert(name, rendered);
    }

    Issue {
        id: payload.id,
        key: payload.key,
        fields,
        changelog: payload
            .changelog
            .histories
            .into_iter()
            .map(into_changelog_entry)
            .collect(),
    }
}

fn into_changelog_entry(payload: HistoryPayload) -> ChangelogEntry {
    ChangelogEntry {
        created: payload.created.unwrap_or_default(),
        changes: payload
            .items
            .into_iter()
            .filter_map(into_field_change)
            .collect(),
    }
}

fn into_field_change(payload: HistoryItemPayload) -> Option<FieldChange> {
    let field = payload.field.and_then(|value| non_empty(&value))?;
    Some(FieldChange {
        field,
        from: payload.from_string.and_then(|value| non_empty(&value)),
        to: payload.to_string.and_then(|value| non_empty(&value)),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use eskala_config::{EskalaConfig, ReportConfig};
    use serde_json::json;

    use super::{into_issue, parse_auth_mode, AuthMode, IssuePayload, JiraClient};

    fn config_with_method(method: &str) -> EskalaConfig {
        EskalaConfig {
            jira_server: Some("https://jira.example.com".to_string()),
            jira_user: Some("alice".to_string()),
            jira_password: Some("secret".to_string()),
            api_version: None,
            auth_method: Some(method.to_string()),
            login_path: None,
            insecure: false,
            report: ReportConfig {
                project: "DC".to_string(),
                labels: Vec::new(),
                cache_dir: "cachedIssues".into(),
            },
        }
    }

    #[test]
    fn chooses_correct_search_endpoint_for_api_versions() {
        let client_2 = JiraClient {
            api_version: "2".to_string(),
            base_url: "https://jira.example.com/rest/api/2".to_string(),
            http: reqwest::blocking::Client::new(),
            auth_mode: AuthMode::Session {
                cookie: "PD-S-SESSION-ID=x".to_string(),
            },
        };
        let client_3 = JiraClient {
            api_version: "3".to_string(),
            base_url: "https://jira.example.com/rest/api/3".to_string(),
            http: reqwest::blocking::Client::new(),
            auth_mode: AuthMode::Bearer {
                token: "x".to_string(),
            },
        };

        assert_eq!(client_2.search_endpoint(), "search");
        assert_eq!(client_3.search_endpoint(), "search/jql");
    }

    #[test]
    fn parses_basic_auth_mode() {
        let mode = parse_auth_mode(&config_with_method("basic")).expect("auth mode");
        assert_eq!(
            mode,
            AuthMode::Basic {
                user: "alice".to_string(),
                password: "secret".to_string(),
            }
        );
    }

    #[test]
    fn rejects_session_auth_without_login() {
        let error = parse_auth_mode(&config_with_method("session")).expect_err("must fail");
        assert!(error.to_string().contains("from_session"));
    }

    #[test]
    fn maps_search_payload_into_issues() {
        let payload: IssuePayload = serde_json::from_value(json!({
            "id": "10042",
            "key": "DC-42",
            "fields": {
                "summary": "Portal absichern",
                "customfield_10101": {"value": "Vertrieb"},
                "labels": ["VW-PKW"],
                "progress": {"progress": 0, "total": 0},
                "duedate": null
            },
            "changelog": {"histories": [
                {
                    "created": "2018-09-12T09:30:00.000+0200",
                    "items": [
                        {"field": "duedate", "fromString": null, "toString": "2018-11-05"},
                        {"field": null, "toString": "ignored"}
                    ]
                }
            ]}
        }))
        .expect("payload");

        let catalog = HashMap::from([
            ("summary".to_string(), "Summary".to_string()),
            ("customfield_10101".to_string(), "Department".to_string()),
        ]);

        let issue = into_issue(payload, &catalog);
        assert_eq!(issue.id, "10042");
        assert_eq!(issue.key, "DC-42");
        assert_eq!(issue.field("Summary"), Some("Portal absichern"));
        assert_eq!(issue.field("Department"), Some("Vertrieb"));
        assert_eq!(issue.field("labels"), Some("VW-PKW"));
        assert_eq!(issue.field("progress"), None);
        assert_eq!(issue.field("duedate"), None);

        assert_eq!(issue.changelog.len(), 1);
        assert_eq!(issue.changelog[0].created, "2018-09-12T09:30:00.000+0200");
        assert_eq!(issue.changelog[0].changes.len(), 1);
        assert_eq!(issue.changelog[0].changes[0].field, "duedate");
        assert_eq!(issue.changelog[0].changes[0].from, None);
        assert_eq!(
            issue.changelog[0].changes[0].to.as_deref(),
            Some("2018-11-05")
        );
    }

    #[test]
    fn tolerates_missing_changelog_sections() {
        let payload: IssuePayload = serde_json::from_value(json!({
            "id": "10001",
            "key": "DC-1",
            "fields": {}
        }))
        .expect("payload");

        let issue = into_issue(payload, &HashMap::new());
        assert!(issue.fields.is_empty());
        assert!(issue.changelog.is_empty());
    }
}
