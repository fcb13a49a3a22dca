//! CLI module for streamchat.
//!
//! ```ignore
//! use streamchat::cli::{parse_args, CliCommand};
//!
//! match parse_args(std::env::args()) {
//!     CliCommand::Send { chat_id, content } => { /* stream the reply */ }
//!     other => { /* version, help, usage error */ }
//! }
//! ```

pub mod args;

pub use args::{parse_args, CliCommand, USAGE};

/// The current version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Print the version line.
pub fn print_version() {
    println!("streamchat {}", VERSION);
}
