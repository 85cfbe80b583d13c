use thiserror::Error;

/// A masked gateway-originated error code, per §6.4: `0xFFFF` for anything not coming
/// straight from the native library.
pub const GATEWAY_ERROR_CODE: u32 = 0xFFFF;

/// The outcome of a single native-consumer call that failed.
#[derive(Clone, Debug)]
pub struct NativeError {
    pub code: i32,
    pub message: String,
}

impl NativeError {
    /// The code as it appears on the wire: `native_code & 0xFFFF`.
    pub fn wire_code(&self) -> u32 {
        // Masked to the low 16 bits regardless of sign.
        #[allow(clippy::cast_sign_loss)]
        let code = self.code as u32;
        code & GATEWAY_ERROR_CODE
    }
}

impl std::fmt::Display for NativeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

/// An error produced while running a single dispatched action. Converted into a `{code,
/// message}` wire error (§6.4) rather than propagated.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The consumer is in the wrong state, or the request is otherwise malformed in a way
    /// that is specific to this protocol (not a JSON/envelope problem). See §7.
    #[error("{0}")]
    Precondition(&'static str),

    /// A nonzero return from the native consumer library.
    #[error(transparent)]
    Native(#[from] NativeError),

    /// The first-observed failure in a §4.13 fan-out; other in-flight results were
    /// discarded.
    #[error(transparent)]
    FanOut(NativeError),
}

impl ActionError {
    /// The masked wire code for this error, per §6.4.
    pub fn wire_code(&self) -> u32 {
        match self {
            ActionError::Precondition(_) => GATEWAY_ERROR_CODE,
            ActionError::Native(error) | ActionError::FanOut(error) => error.wire_code(),
        }
    }

    /// The human-readable message to put on the wire.
    pub fn wire_message(&self) -> String {
        self.to_string()
    }
}

/// An error that ends the session outright: the socket, the JSON layer, or the session's
/// own native worker going away. Unlike [`ActionError`], these are not converted into a
/// reply — there is no longer anyone to send one to, or the connection is no longer
/// trustworthy.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("native worker is no longer running")]
    WorkerGone,
}
