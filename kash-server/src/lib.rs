//! # kash-server
//!
//! A tokio-based TCP server exposing a [`kash_core::Store`] over a
//! line-oriented protocol: `<CMD> <arg1> <arg2> ...\n` requests, `OK\n` /
//! `<payload>\n` / `ERR <message>\n` responses.

pub mod config;
pub mod protocol;
pub mod server;
