use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, SET_COOKIE};
use reqwest::redirect::Policy;

const LOGIN_TIMEOUT_SECS: u64 = 30;

// A cookie-backed login against a form gateway sitting in front of the
// tracker, e.g. WebSEAL's pkmslogin.form.
pub struct Session {
    cookie: String,
}

impl Session {
    pub fn form_login(
        server: &str,
        login_path: &str,
        username: &str,
        password: &str,
        insecure: bool,
    ) -> Result<Self> {
        let http = Client::builder()
            .danger_accept_invalid_certs(insecure)
            .timeout(Duration::from_secs(LOGIN_TIMEOUT_SECS))
            // the gateway sets its session cookie on the form response itself
            // and then redirects; following the redirect would lose it
            .redirect(Policy::none())
            .build()
            .with_context(|| "failed to build login HTTP client")?;

        let endpoint = format!("{}{}", server.trim_end_matches('/'), login_path);
        let response = http
            .post(&endpoint)
            .form(&[
                ("username", username),
                ("password", password),
                ("login-form-type", "token"),
            ])
            .send()
            .with_context(|| format!("failed to reach login endpoint {endpoint}"))?;

        let status = response.status();
        match cookie_header_from_response(response.headers()) {
            Some(cookie) => Ok(Self { cookie }),
            None => bail!(
                "login returned status={} without a session cookie; check username and/or password",
                status
            ),
        }
    }

    pub fn cookie_header(&self) -> &str {
        &self.cookie
    }
}

fn cookie_header_from_response(headers: &HeaderMap) -> Option<String> {
    let mut pairs = Vec::new();
    for value in headers.get_all(SET_COOKIE) {
        let Ok(raw) = value.to_str() else {
            continue;
        };
        let trimmed = raw.split(';').next().unwrap_or_default().trim();
        if trimmed.is_empty() || !trimmed.contains('=') {
            continue;
        }
        pairs.push(trimmed.to_string());
    }

    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}
