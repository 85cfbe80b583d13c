mod auto_release;
mod config;
mod dispatcher;
mod error;
mod fan_out;
mod framer;
mod message;
mod message_buffer;
mod native;
mod protocol;
mod response;
mod server;
mod session;
mod spawn;
mod state;
mod time;
mod worker;

// Public interface
pub use config::GatewayConfig;
pub use error::{ActionError, GatewayError, NativeError};
pub use message::MessageId;
pub use native::{
    Assignment, Block, ConsumerConfig, FieldDescriptor, MessageType, NativeConsumer,
    NativeConsumerFactory, NativeMessage, RawMeta, ResultHandle,
};
pub use server::Gateway;
pub use session::SessionId;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
