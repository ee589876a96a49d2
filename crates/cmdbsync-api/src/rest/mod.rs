// REST session modules
//
// Hand-written client for the appliance's `/api/v2/cmdb` endpoints plus the
// form-based login flow. `RestSession` implements the crate's `Session`
// trait by delegating to its inherent methods.

pub mod auth;
pub mod client;
pub mod cmdb;

pub use client::RestSession;

use secrecy::SecretString;
use serde_json::{Map, Value};

use crate::error::Error;
use crate::response::ApiResponse;
use crate::session::Session;

impl Session for RestSession {
    async fn login(
        &self,
        host: &str,
        username: &str,
        password: &SecretString,
    ) -> Result<(), Error> {
        RestSession::login(self, host, username, password).await
    }

    async fn logout(&self) -> Result<(), Error> {
        RestSession::logout(self).await
    }

    fn https(&self, enabled: bool) {
        self.set_https(enabled);
    }

    fn debug(&self, enabled: bool) {
        self.set_debug(enabled);
    }

    async fn set(
        &self,
        category: &str,
        table: &str,
        data: &Map<String, Value>,
        vdom: &str,
    ) -> Result<ApiResponse, Error> {
        RestSession::set(self, category, table, data, vdom).await
    }

    async fn delete(
        &self,
        category: &str,
        table: &str,
        mkey: &Value,
        vdom: &str,
    ) -> Result<ApiResponse, Error> {
        RestSession::delete(self, category, table, mkey, vdom).await
    }
}
