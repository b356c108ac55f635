use oasis_shared::ProtocolError;
use oasis_store::StoreError;
use thiserror::Error;

/// Failures at the REST boundary.  Each one aborts the whole operation and
/// leaves local data untouched.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Connectivity failure, timeout or an unreadable body.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-2xx status, with the server-supplied message if there was one.
    #[error("Server responded {status}")]
    Status { status: u16, message: Option<String> },

    /// The body was not a valid response envelope.
    #[error("Invalid response: {0}")]
    Decode(#[from] ProtocolError),
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Local store error: {0}")]
    Store(#[from] StoreError),

    /// A local action was called with unusable input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SyncError {
    /// Text suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            SyncError::Api(ApiError::Transport(_)) => {
                "Unable to reach the server. Check your connection and try again.".to_string()
            }
            SyncError::Api(ApiError::Status {
                message: Some(message),
                ..
            }) => message.clone(),
            SyncError::Api(ApiError::Status { status, .. }) => {
                format!("The server returned an error ({status}). Please try again later.")
            }
            SyncError::Api(ApiError::Decode(_)) => {
                "Received an unexpected response from the server.".to_string()
            }
            SyncError::Store(StoreError::NotFound) => {
                "This item is no longer available.".to_string()
            }
            SyncError::Store(_) => "Unable to update local data.".to_string(),
            SyncError::InvalidInput(reason) => reason.clone(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
