//! # Menu API Server
//!
//! Restaurant menu CRUD with a QR code per menu. Each menu's QR image encodes
//! the menu's public URL, is stored in object storage under a key derived
//! from the menu id, and its storage URL is written back into the menu row.

pub mod config;
pub mod database;
pub mod handlers;
pub mod router;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

pub use router::build_router;
pub use state::AppState;
