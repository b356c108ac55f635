/// Application name
pub const APP_NAME: &str = "Oasis";

/// Default REST API base URL (local development)
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080/api";

/// Default transport timeout for a single REST request, in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// File name of the local cache database
pub const DB_FILE_NAME: &str = "oasis.db";

/// Payload key carrying the server-assigned record identity
pub const ID_FIELD: &str = "id";

/// Capacity of the store change broadcast channel
pub const STORE_CHANGE_CAPACITY: usize = 64;
