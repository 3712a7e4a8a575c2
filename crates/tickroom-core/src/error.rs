//! Shared error type across tickroom crates.

use thiserror::Error;

/// Stable error codes (logged, asserted by tests, safe to show to clients).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Framing,
    Decode,
    EmptyPayload,
    UnexpectedCommand,
    HandlerNotFound,
    PlayerCantJoin,
    PlayerDoesntExist,
    NodeDoesntExist,
    NodeAlreadyExists,
    ClientRejected,
    ClientNotConnected,
    ConnectionClosed,
    FrameTooLarge,
    AssetNotFound,
    Config,
    Io,
    Internal,
}

impl ErrorCode {
    /// String representation used in logs and test vectors.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Framing => "FRAMING",
            ErrorCode::Decode => "DECODE",
            ErrorCode::EmptyPayload => "EMPTY_PAYLOAD",
            ErrorCode::UnexpectedCommand => "UNEXPECTED_COMMAND",
            ErrorCode::HandlerNotFound => "HANDLER_NOT_FOUND",
            ErrorCode::PlayerCantJoin => "PLAYER_CANT_JOIN",
            ErrorCode::PlayerDoesntExist => "PLAYER_DOESNT_EXIST",
            ErrorCode::NodeDoesntExist => "NODE_DOESNT_EXIST",
            ErrorCode::NodeAlreadyExists => "NODE_ALREADY_EXISTS",
            ErrorCode::ClientRejected => "CLIENT_REJECTED",
            ErrorCode::ClientNotConnected => "CLIENT_NOT_CONNECTED",
            ErrorCode::ConnectionClosed => "CONNECTION_CLOSED",
            ErrorCode::FrameTooLarge => "FRAME_TOO_LARGE",
            ErrorCode::AssetNotFound => "ASSET_NOT_FOUND",
            ErrorCode::Config => "CONFIG",
            ErrorCode::Io => "IO",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, RoomError>;

/// Unified error type used by core, server and client.
#[derive(Debug, Error)]
pub enum RoomError {
    #[error("framing: {0}")]
    Framing(String),
    #[error("decode: {0}")]
    Decode(String),
    #[error("payload is empty or already consumed")]
    EmptyPayload,
    #[error("unexpected command: expected {expected}, got {actual}")]
    UnexpectedCommand { expected: String, actual: String },
    #[error("no handler for command: {0}")]
    HandlerNotFound(String),
    #[error("player is unable to join")]
    PlayerCantJoin,
    #[error("player {0} does not exist")]
    PlayerDoesntExist(u64),
    #[error("node {node_id} of player {player_id} does not exist")]
    NodeDoesntExist { player_id: u64, node_id: u64 },
    #[error("node {node_id} of player {player_id} already exists")]
    NodeAlreadyExists { player_id: u64, node_id: u64 },
    #[error("client was rejected by the server: {0}")]
    ClientRejected(String),
    #[error("client is not connected to a server")]
    ClientNotConnected,
    #[error("connection closed")]
    ConnectionClosed,
    #[error("frame too large: limit={limit} actual={actual}")]
    FrameTooLarge { limit: usize, actual: usize },
    #[error("asset not found: {0}")]
    AssetNotFound(String),
    #[error("config: {0}")]
    Config(String),
    #[error("io: {0}")]
    Io(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl RoomError {
    /// Map to the stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            RoomError::Framing(_) => ErrorCode::Framing,
            RoomError::Decode(_) => ErrorCode::Decode,
            RoomError::EmptyPayload => ErrorCode::EmptyPayload,
            RoomError::UnexpectedCommand { .. } => ErrorCode::UnexpectedCommand,
            RoomError::HandlerNotFound(_) => ErrorCode::HandlerNotFound,
            RoomError::PlayerCantJoin => ErrorCode::PlayerCantJoin,
            RoomError::PlayerDoesntExist(_) => ErrorCode::PlayerDoesntExist,
            RoomError::NodeDoesntExist { .. } => ErrorCode::NodeDoesntExist,
            RoomError::NodeAlreadyExists { .. } => ErrorCode::NodeAlreadyExists,
            RoomError::ClientRejected(_) => ErrorCode::ClientRejected,
            RoomError::ClientNotConnected => ErrorCode::ClientNotConnected,
            RoomError::ConnectionClosed => ErrorCode::ConnectionClosed,
            RoomError::FrameTooLarge { .. } => ErrorCode::FrameTooLarge,
            RoomError::AssetNotFound(_) => ErrorCode::AssetNotFound,
            RoomError::Config(_) => ErrorCode::Config,
            RoomError::Io(_) => ErrorCode::Io,
            RoomError::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Errors after which the underlying stream can no longer be trusted.
    pub fn is_connection_fatal(&self) -> bool {
        matches!(
            self,
            RoomError::Framing(_)
                | RoomError::FrameTooLarge { .. }
                | RoomError::ConnectionClosed
                | RoomError::Io(_)
        )
    }
}

impl From<std::io::Error> for RoomError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::BrokenPipe => RoomError::ConnectionClosed,
            _ => RoomError::Io(e.to_string()),
        }
    }
}
