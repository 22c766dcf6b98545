//! Linux `/proc` backend for the process collaborator.
//!
//! This module provides parsers for the `/proc` files the collector reads and
//! a [`ProcFs`] process source built on them.

pub mod parser;
pub mod process;

pub use parser::{ParseError, SocketEntry, UserResolver};
pub use process::{ProcFs, ProcfsProcess};
