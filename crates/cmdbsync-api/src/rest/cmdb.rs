// CMDB write endpoints
//
// `set` is an upsert built from the table schema: the mkey field name is
// looked up with `?action=schema`, then the object is PUT in place and
// POSTed to the collection if it does not exist yet. Singleton tables
// (no mkey) are PUT on the collection path directly.

use reqwest::Method;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::Error;
use crate::response::{ApiResponse, mkey_segment};
use crate::rest::client::RestSession;

/// Reply to `GET ...?action=schema`. Only the mkey name is of interest.
#[derive(Debug, Deserialize)]
struct SchemaReply {
    #[serde(default)]
    results: Option<SchemaResults>,
}

#[derive(Debug, Deserialize)]
struct SchemaResults {
    #[serde(default)]
    mkey: Option<String>,
}

/// What a `?action=schema` lookup says about a table's addressing.
#[derive(Debug, Clone, PartialEq)]
pub enum TableKey {
    /// Keyed table; objects are addressed by this field.
    Keyed(String),
    /// Singleton table, written on the collection path.
    Singleton,
    /// The appliance refused or failed the lookup. Its reply is kept so the
    /// caller can report it instead of guessing the table's shape.
    Unavailable(Box<ApiResponse>),
}

impl RestSession {
    /// Look up how objects in `category/table` are addressed.
    pub async fn table_mkey(
        &self,
        category: &str,
        table: &str,
        vdom: &str,
    ) -> Result<TableKey, Error> {
        let mut url = self.cmdb_url(category, table, None, vdom)?;
        url.query_pairs_mut().append_pair("action", "schema");

        debug!("GET {}", url);
        let resp = self.dispatch(self.apply_csrf(self.http().get(url))).await?;
        if !resp.status().is_success() {
            debug!(http_status = resp.status().as_u16(), "schema lookup failed");
            let mut reply = self.parse_reply(&Method::GET, resp).await?;
            if reply.is_success() {
                reply.status = "error".into();
            }
            return Ok(TableKey::Unavailable(Box::new(reply)));
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        let reply: SchemaReply =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: body.clone(),
            })?;

        Ok(reply
            .results
            .and_then(|r| r.mkey)
            .filter(|name| !name.is_empty())
            .map_or(TableKey::Singleton, TableKey::Keyed))
    }

    /// Create or update an object.
    ///
    /// - mkey known and present in `data`: `PUT .../{mkey}`, falling back to
    ///   `POST` on the collection if the object does not exist (404)
    /// - keyed table, mkey absent from `data`: `POST` on the collection
    /// - singleton table: `PUT` on the collection
    /// - schema unreadable: the failed lookup reply is returned, nothing is
    ///   written
    pub async fn set(
        &self,
        category: &str,
        table: &str,
        data: &Map<String, Value>,
        vdom: &str,
    ) -> Result<ApiResponse, Error> {
        let mkey_name = match self.table_mkey(category, table, vdom).await? {
            TableKey::Keyed(name) => name,
            TableKey::Singleton => {
                let url = self.cmdb_url(category, table, None, vdom)?;
                return self.cmdb_request(Method::PUT, url, Some(data)).await;
            }
            TableKey::Unavailable(reply) => return Ok(*reply),
        };

        let Some(segment) = data.get(&mkey_name).and_then(mkey_segment) else {
            let url = self.cmdb_url(category, table, None, vdom)?;
            return self.cmdb_request(Method::POST, url, Some(data)).await;
        };

        let url = self.cmdb_url(category, table, Some(&segment), vdom)?;
        let reply = self.cmdb_request(Method::PUT, url, Some(data)).await?;
        if reply.http_status != 404 {
            return Ok(reply);
        }

        debug!(%segment, "object not found, creating");
        let url = self.cmdb_url(category, table, None, vdom)?;
        self.cmdb_request(Method::POST, url, Some(data)).await
    }

    /// Delete the object addressed by `mkey`.
    pub async fn delete(
        &self,
        category: &str,
        table: &str,
        mkey: &Value,
        vdom: &str,
    ) -> Result<ApiResponse, Error> {
        let segment = mkey_segment(mkey).ok_or_else(|| Error::InvalidMkey {
            mkey: mkey.to_string(),
        })?;
        let url = self.cmdb_url(category, table, Some(&segment), vdom)?;
        self.cmdb_request(Method::DELETE, url, None).await
    }
}
