pub mod api;
mod board;
pub mod bot;
pub mod collaborators;
mod common;
mod config;
pub mod engine;
mod game;
mod grid;
mod logging;
pub mod matchmaking;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod service;
pub mod session;
mod ship;
pub mod skeleton;
pub mod store;
pub mod stub;
pub mod transport;

pub use api::GameApi;
pub use board::*;
pub use common::*;
pub use config::*;
pub use engine::AttackReport;
pub use game::*;
pub use grid::{in_bounds, CellMask};
pub use logging::{init_logging, parse_level, LOG_ENV};
pub use matchmaking::MatchQueue;
pub use protocol::*;
pub use registry::{ConnectionHandle, ConnectionRegistry, Outbound, Presence, RegistryError};
pub use service::{GameService, RematchOutcome};
pub use session::{serve_connection, PushSession};
pub use ship::*;
pub use skeleton::Skeleton;
pub use store::{GameStore, SharedGame};
pub use stub::Stub;
pub use transport::in_memory::InMemoryTransport;
pub use transport::tcp::TcpTransport;
pub use transport::Transport;
