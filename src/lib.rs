//! # Nomad Places
//!
//! A two-service places recommendation system: an HTTP API backed by
//! PostgreSQL and Qdrant vector search, and a Telegram bot that relays
//! user requests to the API and keeps community data (favorites,
//! submissions, likes) in local JSON storage under `DATA_DIR`.

pub mod api;
pub mod api_client;
pub mod bot;
pub mod config;
pub mod db;
pub mod domain;
pub mod embedding;
pub mod localization;
pub mod service;
pub mod vector;
