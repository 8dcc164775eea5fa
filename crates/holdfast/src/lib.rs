//! # Holdfast
//!
//! Server for a real-time "hold the button" bidding game. Two to four
//! players share a room; each round they hold a button, and whoever
//! holds longest wins a token but pays for it out of a shrinking time
//! budget.
//!
//! The crate ties the layers together: WebSocket transport → JSON
//! protocol → per-connection handler → room actors.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use holdfast::prelude::*;
//!
//! # async fn start() -> Result<(), HoldfastError> {
//! let server = HoldfastServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::ServerConfig;
pub use error::HoldfastError;
pub use server::{HoldfastServer, HoldfastServerBuilder};

/// Everything needed to run a server or write a client against it.
pub mod prelude {
    pub use crate::{HoldfastError, HoldfastServer, HoldfastServerBuilder, ServerConfig};
    pub use holdfast_protocol::{
        ClientMessage, Codec, Envelope, ErrorCode, GameOverReason, GameResult,
        JsonCodec, PROTOCOL_VERSION, Phase, PlayerId, RoomId, RoomSnapshot,
        ServerMessage,
    };
    pub use holdfast_room::RoomConfig;
}
