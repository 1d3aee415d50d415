//! Network Module
//!
//! The spectator gateway: JSON protocol messages, the wallet boundary,
//! the arena session coordinating clients with the store, and the
//! WebSocket server moving frames.

pub mod protocol;
pub mod wallet;
pub mod session;
pub mod server;

// Re-export key types
pub use protocol::{ClientMessage, ServerMessage, WelcomeInfo, PoolInfo, GatewayError, ErrorCode};
pub use wallet::{WalletProvider, WalletInfo, WalletError, SimulatedWallet, short_address};
pub use session::{ArenaSession, ArenaStore, SessionConfig, ClientId};
pub use server::{ArenaServer, ServerConfig, ArenaServerError};
