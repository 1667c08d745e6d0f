//! # Taskboard API Server Library
//!
//! Backend-for-frontend over the hosted record service: session handling
//! for the authentication widget plus JSON routes for projects, tasks,
//! comments, users and the activity log.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers
//! - `sessions`: Bearer token to session store registry

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
pub mod sessions;
