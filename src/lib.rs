// src/lib.rs

//! Job board client library.
//!
//! - `feed`: filter state, paginated fetching, refresh bus and view model
//! - `query`: filter selection to backend query composition
//! - `store`: backend collaborators (REST and in-memory)
//! - `services`: posting, applying, bookmarks, alerts and uploads

pub mod config;
pub mod error;
pub mod feed;
pub mod models;
pub mod query;
pub mod services;
pub mod store;
pub mod utils;
