//! Chat surfaces for Confidant.
//!
//! Each channel relays user submissions to the assistant session and prints
//! or delivers its replies. The web surface lives in `confidant-gateway`.
//!
//! Available channels:
//! - **CLI**: interactive terminal chat (stdin/stdout)

pub mod cli;

pub use cli::CliChannel;
