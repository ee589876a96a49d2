// cmdbsync-api: Async session client for appliance CMDB REST endpoints

pub mod error;
pub mod response;
pub mod rest;
pub mod session;
pub mod transport;

pub use error::Error;
pub use response::{ApiResponse, STATUS_SUCCESS, mkey_segment};
pub use rest::RestSession;
pub use rest::cmdb::TableKey;
pub use session::Session;
pub use transport::{TlsMode, TransportConfig};
