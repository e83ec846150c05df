use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use eskala_config::EskalaConfig;
use eskala_jira::{JiraClient, Session};
use eskala_report::IssueFilter;

use crate::cli_args::RunOptions;

pub fn load_config(options: &RunOptions) -> Result<EskalaConfig> {
    match options.config_path.as_deref() {
        Some(path) => EskalaConfig::load_from_path(path),
        None => EskalaConfig::load_default(),
    }
}

/// Builds the tracker client, running the gateway form login first when the
/// config asks for session auth. Basic and bearer credentials go straight
/// onto the requests, so no separate login round-trip is needed for them.
pub fn login(config: &EskalaConfig) -> Result<JiraClient> {
    if config.auth_method() != "session" {
        return JiraClient::from_config(config);
    }

    let server = config
        .jira_server
        .as_deref()
        .ok_or_else(|| anyhow!("jira_server not configured"))?;
    let user = config
        .jira_user
        .as_deref()
        .ok_or_else(|| anyhow!("jira_user not configured for session auth"))?;
    let password = config
        .jira_password
        .as_deref()
        .ok_or_else(|| anyhow!("jira_password not configured for session auth"))?;

    let session = Session::form_login(
        server,
        config.login_path(),
        user,
        password,
        config.insecure,
    )?;
    JiraClient::from_session(config, &session)
}

pub fn issue_filter(config: &EskalaConfig) -> IssueFilter {
    IssueFilter::new(config.report.project.clone(), config.report.labels.clone())
}

pub fn resolve_cache_dir(options: &RunOptions, config: &EskalaConfig) -> PathBuf {
    options
        .cache_dir
        .clone()
        .unwrap_or_else(|| config.report.cache_dir.clone())
}

// The original shell's save dialog appended the extension for the user;
// the flag keeps that behavior.
pub fn resolve_output_path(raw: &Path) -> PathBuf {
    let already_xlsx = raw
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension.eq_ignore_ascii_case("xlsx"))
        .unwrap_or(false);

    if already_xlsx {
        return raw.to_path_buf();
    }

    let mut name = raw.as_os_str().to_os_string();
    name.push(".xlsx");
    PathBuf::from(name)
}
