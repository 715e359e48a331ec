//! UI 層: TCP 接続の多重化とシャットダウン処理

pub mod connection;
pub mod server;
pub mod signal;

pub use server::Server;
pub use signal::shutdown_signal;
