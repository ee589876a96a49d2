// In-memory `Session` for unit tests.
#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use cmdbsync_api::{ApiResponse, Error, Session};
use secrecy::SecretString;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Set {
        category: String,
        table: String,
        data: Map<String, Value>,
        vdom: String,
    },
    Delete {
        category: String,
        table: String,
        mkey: Value,
        vdom: String,
    },
}

/// Records every call. Replies come from a queue, falling back to a
/// `success` reply echoing the verb.
#[derive(Default)]
pub(crate) struct MockSession {
    replies: Mutex<VecDeque<ApiResponse>>,
    calls: Mutex<Vec<Call>>,
    reject_login: bool,
    fail_logout: bool,
    transport_error: bool,
    logins: AtomicUsize,
    logouts: AtomicUsize,
    https: Mutex<Option<bool>>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, response: ApiResponse) -> Self {
        self.replies.lock().unwrap().push_back(response);
        self
    }

    pub fn reject_login(mut self) -> Self {
        self.reject_login = true;
        self
    }

    pub fn fail_logout(mut self) -> Self {
        self.fail_logout = true;
        self
    }

    pub fn transport_error(mut self) -> Self {
        self.transport_error = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    pub fn logouts(&self) -> usize {
        self.logouts.load(Ordering::SeqCst)
    }

    pub fn https_setting(&self) -> Option<bool> {
        *self.https.lock().unwrap()
    }

    fn answer(&self, call: Call, method: &str) -> Result<ApiResponse, Error> {
        self.calls.lock().unwrap().push(call);
        if self.transport_error {
            return Err(Error::Timeout { timeout_secs: 30 });
        }
        Ok(self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ApiResponse::bare("success", method, 200)))
    }
}

impl Session for MockSession {
    async fn login(&self, _host: &str, username: &str, _password: &SecretString) -> Result<(), Error> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        if self.reject_login {
            return Err(Error::Authentication {
                message: format!("login rejected for user '{username}'"),
            });
        }
        Ok(())
    }

    async fn logout(&self) -> Result<(), Error> {
        self.logouts.fetch_add(1, Ordering::SeqCst);
        if self.fail_logout {
            return Err(Error::NotLoggedIn);
        }
        Ok(())
    }

    fn https(&self, enabled: bool) {
        *self.https.lock().unwrap() = Some(enabled);
    }

    fn debug(&self, _enabled: bool) {}

    async fn set(
        &self,
        category: &str,
        table: &str,
        data: &Map<String, Value>,
        vdom: &str,
    ) -> Result<ApiResponse, Error> {
        let call = Call::Set {
            category: category.to_owned(),
            table: table.to_owned(),
            data: data.clone(),
            vdom: vdom.to_owned(),
        };
        self.answer(call, "PUT")
    }

    async fn delete(
        &self,
        category: &str,
        table: &str,
        mkey: &Value,
        vdom: &str,
    ) -> Result<ApiResponse, Error> {
        let call = Call::Delete {
            category: category.to_owned(),
            table: table.to_owned(),
            mkey: mkey.clone(),
            vdom: vdom.to_owned(),
        };
        self.answer(call, "DELETE")
    }
}
