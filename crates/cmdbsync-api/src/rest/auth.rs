// REST session authentication
//
// Form-based login against `/logincheck`. The appliance answers with a
// session cookie plus a `ccsrftoken` cookie whose value must be echoed in
// the `X-CSRFTOKEN` header on every mutating request.

use reqwest::header::SET_COOKIE;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::error::Error;
use crate::rest::client::{CSRF_COOKIE, RestSession};

impl RestSession {
    /// Authenticate with the appliance using username/password.
    ///
    /// `POST /logincheck` with `username`, `secretkey`, `ajax=1`. Success is
    /// signalled by the presence of the CSRF cookie; a bare 200 without it
    /// means the credentials were rejected.
    pub async fn login(
        &self,
        host: &str,
        username: &str,
        password: &SecretString,
    ) -> Result<(), Error> {
        let base = self.base_for_host(host)?;
        let url = base.join("logincheck")?;

        debug!("logging in at {}", url);

        let form = [
            ("username", username),
            ("secretkey", password.expose_secret()),
            ("ajax", "1"),
        ];
        let resp = self.dispatch(self.http().post(url).form(&form)).await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {body}"),
            });
        }

        let token = resp
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(csrf_from_set_cookie);

        let Some(token) = token else {
            return Err(Error::Authentication {
                message: format!("login rejected for user '{username}'"),
            });
        };

        self.set_csrf_token(token);
        self.begin(base);
        debug!("login successful");
        Ok(())
    }

    /// End the current session with `POST /logout`.
    ///
    /// Local session state is cleared even if the request fails.
    pub async fn logout(&self) -> Result<(), Error> {
        let base = self.require_base()?;
        let url = base.join("logout")?;

        debug!("logging out at {}", url);

        let result = self
            .dispatch(self.apply_csrf(self.http().post(url)))
            .await
            .map(|_| ());
        self.end();

        debug!("logout complete");
        result
    }
}

/// Pull the CSRF token out of one `Set-Cookie` header value.
///
/// The appliance quotes the value (`ccsrftoken="ABC123"`); quotes are stripped.
fn csrf_from_set_cookie(header: &str) -> Option<String> {
    let pair = header.split(';').next()?.trim();
    let (name, value) = pair.split_once('=')?;
    if name.trim() != CSRF_COOKIE {
        return None;
    }
    let value = value.trim().trim_matches('"');
    (!value.is_empty()).then(|| value.to_owned())
}
