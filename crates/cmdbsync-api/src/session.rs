// Session abstraction
//
// The reconciler never talks HTTP directly. It drives a `Session`, which
// owns connection and auth state. `RestSession` is the reqwest-backed
// implementation; tests substitute in-memory mocks.

use secrecy::SecretString;
use serde_json::{Map, Value};

use crate::error::Error;
use crate::response::ApiResponse;

/// An authenticated channel to one appliance's configuration database.
///
/// `set` must behave as an upsert (create-or-update). Non-success replies
/// are returned as `Ok(ApiResponse)`; `Err` is reserved for failures where
/// no reply could be obtained at all.
#[allow(async_fn_in_trait)]
pub trait Session {
    /// Open a session against `host`.
    async fn login(&self, host: &str, username: &str, password: &SecretString)
    -> Result<(), Error>;

    /// Close the session. Safe to call once after a successful `login`.
    async fn logout(&self) -> Result<(), Error>;

    /// Select HTTPS (`true`) or plain HTTP for subsequent `login` calls.
    fn https(&self, enabled: bool);

    /// Toggle verbose request logging.
    fn debug(&self, enabled: bool);

    /// Create or update an object in `category/table` inside `vdom`.
    async fn set(
        &self,
        category: &str,
        table: &str,
        data: &Map<String, Value>,
        vdom: &str,
    ) -> Result<ApiResponse, Error>;

    /// Delete the object addressed by `mkey` from `category/table` inside `vdom`.
    async fn delete(
        &self,
        category: &str,
        table: &str,
        mkey: &Value,
        vdom: &str,
    ) -> Result<ApiResponse, Error>;
}
