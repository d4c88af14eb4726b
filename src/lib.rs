//! notebox: a small notes service.
//!
//! The [`db::Database`] owns the persisted notes, [`api`] exposes it over HTTP,
//! and [`client`] talks to a running server (including the [`client::poller`]
//! used by `notebox watch`).

pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
