// ── Session lifecycle guard ──
//
// Brackets work against a session with login/logout. Logout runs exactly
// once after a successful login, whether the work returns normally, returns
// an error, or panics. A panic resumes unwinding after logout.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use cmdbsync_api::Session;
use futures_util::FutureExt;
use tracing::{debug, info, warn};

use crate::config::LoginInfo;
use crate::error::ReconcileError;
use crate::outcome::Outcome;

/// How the guard obtains an authenticated session.
#[derive(Debug, Clone)]
pub enum Connection {
    /// Log in before the work and log out after it.
    Login(LoginInfo),
    /// The session is already authenticated and owned by someone else.
    /// Login and logout are skipped.
    Reuse,
}

/// Run `body` inside an authenticated session and return its value.
///
/// Fails with [`ReconcileError::AuthFailure`] if login is rejected; `body`
/// is not run and no logout is attempted in that case.
pub async fn guarded<'s, S, F, Fut, T>(
    session: &'s S,
    connection: &Connection,
    body: F,
) -> Result<T, ReconcileError>
where
    S: Session,
    F: FnOnce(&'s S) -> Fut,
    Fut: Future<Output = T>,
{
    let Connection::Login(info) = connection else {
        debug!("reusing existing session");
        return Ok(body(session).await);
    };

    session.https(info.https);
    session.debug(info.debug);

    if let Err(e) = session
        .login(&info.host, &info.username, &info.password)
        .await
    {
        warn!(host = %info.host, error = %e, "login failed");
        return Err(ReconcileError::AuthFailure {
            message: auth_message(e),
        });
    }
    info!(host = %info.host, user = %info.username, "logged in");

    let result = AssertUnwindSafe(async move { body(session).await })
        .catch_unwind()
        .await;

    match session.logout().await {
        Ok(()) => debug!("logged out"),
        Err(e) => warn!(error = %e, "logout failed"),
    }

    match result {
        Ok(value) => Ok(value),
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

/// Run one reconciliation inside a guarded session.
///
/// Every failure, login included, is folded into a failed [`Outcome`].
pub async fn with_session<'s, S, F, Fut>(session: &'s S, connection: &Connection, body: F) -> Outcome
where
    S: Session,
    F: FnOnce(&'s S) -> Fut,
    Fut: Future<Output = Result<Outcome, ReconcileError>>,
{
    match guarded(session, connection, body).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) | Err(e) => Outcome::failure(e),
    }
}

fn auth_message(err: cmdbsync_api::Error) -> String {
    match err {
        cmdbsync_api::Error::Authentication { message } => message,
        other => other.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::MockSession;
    use cmdbsync_api::ApiResponse;
    use secrecy::SecretString;

    fn login(https: bool) -> Connection {
        Connection::Login(LoginInfo {
            host: "fw.example.net".into(),
            username: "admin".into(),
            password: SecretString::from("pw".to_string()),
            https,
            debug: false,
        })
    }

    fn applied() -> Outcome {
        Outcome::applied(ApiResponse::bare("success", "PUT", 200))
    }

    #[tokio::test]
    async fn logs_out_once_after_success() {
        let session = MockSession::new();

        let outcome = with_session(&session, &login(true), |_| async { Ok(applied()) }).await;

        assert!(outcome.changed());
        assert_eq!(session.logins(), 1);
        assert_eq!(session.logouts(), 1);
        assert_eq!(session.https_setting(), Some(true));
    }

    #[tokio::test]
    async fn logs_out_once_after_error() {
        let session = MockSession::new();

        let outcome = with_session(&session, &login(false), |_| async {
            Err(ReconcileError::MissingKey {
                resource: "user.device".into(),
                key: "alias".into(),
            })
        })
        .await;

        assert!(outcome.failed());
        assert!(matches!(outcome.error(), Some(ReconcileError::MissingKey { .. })));
        assert_eq!(session.logouts(), 1);
        assert_eq!(session.https_setting(), Some(false));
    }

    #[tokio::test]
    async fn logs_out_once_after_panic_and_resumes_it() {
        let session = MockSession::new();

        let result = AssertUnwindSafe(with_session(&session, &login(true), |s| async move {
            if s.logins() > 0 {
                panic!("body exploded");
            }
            Ok(applied())
        }))
        .catch_unwind()
        .await;

        assert!(result.is_err());
        assert_eq!(session.logins(), 1);
        assert_eq!(session.logouts(), 1);
    }

    #[tokio::test]
    async fn login_failure_skips_body_and_logout() {
        let session = MockSession::new().reject_login();
        let mut ran = false;

        let outcome = with_session(&session, &login(true), |_| {
            ran = true;
            async { Ok(applied()) }
        })
        .await;

        assert!(!ran);
        assert!(outcome.failed());
        assert!(outcome.raw().is_none());
        assert!(matches!(outcome.error(), Some(ReconcileError::AuthFailure { .. })));
        assert_eq!(session.logouts(), 0);
    }

    #[tokio::test]
    async fn logout_failure_does_not_change_outcome() {
        let session = MockSession::new().fail_logout();

        let outcome = with_session(&session, &login(true), |_| async { Ok(applied()) }).await;

        assert!(!outcome.failed());
        assert!(outcome.changed());
        assert_eq!(session.logouts(), 1);
    }

    #[tokio::test]
    async fn reuse_skips_login_and_logout() {
        let session = MockSession::new();

        let outcome = with_session(&session, &Connection::Reuse, |_| async { Ok(applied()) }).await;

        assert!(outcome.changed());
        assert_eq!(session.logins(), 0);
        assert_eq!(session.logouts(), 0);
        assert_eq!(session.https_setting(), None);
    }

    #[tokio::test]
    async fn body_receives_the_session() {
        let session = MockSession::new();

        let outcome = with_session(&session, &Connection::Reuse, |s| async move {
            let map = serde_json::Map::new();
            s.set("system", "storage", &map, "root")
                .await
                .map(crate::classify::classify)
                .map_err(ReconcileError::from)
        })
        .await;

        assert!(outcome.changed());
        assert_eq!(session.calls().len(), 1);
    }
}
