//! Line-oriented TCP Chat Server Library
//!
//! A concurrent broadcast chat server over raw TCP built on tokio.
//! Every line a client sends is relayed to every other connected client.
//!
//! # Features
//! - One supervised task per connection
//! - Join / leave announcements
//! - `Exit` command to leave
//! - Bounded per-connection outbound queues with drop-on-full
//! - Write deadlines that disconnect stalled clients
//! - Graceful shutdown on SIGINT/SIGTERM
//!
//! # Architecture
//! - `Registry` is the only shared mutable state, behind one mutex
//! - `Broadcaster` snapshots the registry, releases the lock, then pushes
//!   into each recipient's `Outbox`
//! - Each session has a writer task draining its `Outbox` to the socket
//! - `ShutdownCoordinator` force-closes every registered connection
//!
//! # Example
//! ```ignore
//! use line_chat::{spawn_signal_listener, ChatServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = ChatServer::bind(ServerConfig::with_addr("127.0.0.1:8080")).await?;
//!     spawn_signal_listener(server.shutdown_token());
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod broadcast;
pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;
pub mod server;
pub mod shutdown;
pub mod types;

// Re-export main types for convenience
pub use broadcast::{Broadcaster, Delivery};
pub use client::{Member, Outbox};
pub use config::ServerConfig;
pub use error::{RegistryError, SendError, ServerError, SessionError};
pub use handler::{handle_connection, SessionContext};
pub use message::{ChatEvent, ClientCommand, EXIT_COMMAND};
pub use registry::{Recipient, Registry};
pub use server::ChatServer;
pub use shutdown::{spawn_signal_listener, ShutdownCoordinator, ShutdownReport};
pub use types::ConnectionId;
