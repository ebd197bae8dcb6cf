pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod download;
pub mod portal;
pub mod terminal;
