//! # tutor-match
//!
//! A web backend that matches students with tutors. It keeps tutor,
//! student and subject records in SQLite, answers search and
//! recommendation queries over HTTP, and explains each recommendation in
//! plain language.
//!
//! ## Request flow
//!
//! ```text
//!   HTTP request
//!        │
//!        ▼
//!   ┌──────────┐   spawn_blocking   ┌──────────────┐
//!   │   api    │ ─────────────────▶ │  db (SQLite) │
//!   └────┬─────┘                    └──────────────┘
//!        │ tutors + student
//!        ▼
//!   ┌──────────┐
//!   │ matching │  filter → sort → truncate
//!   └────┬─────┘
//!        ▼
//!   ┌──────────┐   provider configured?   ┌──────────┐
//!   │ explain  │ ───────────────────────▶ │   llm    │
//!   └────┬─────┘ ◀─── text / failure ──── └──────────┘
//!        │ template fallback per tutor
//!        ▼
//!   JSON response
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for the server, database and LLM provider
//! - [`models`] - Entities and request/response types
//! - [`db`] - SQLite schema, CRUD, cascading deletes and demo data
//! - [`matching`] - Tutor search, recommendations and similar tutors
//! - [`explain`] - Template explanations, chat replies and LLM-backed explanations
//! - [`llm`] - Text generation against Hugging Face, Azure OpenAI, OpenAI-compatible or Ollama
//! - [`api`] - Axum HTTP handlers and the router
//! - [`error`] - Store errors and their HTTP status mapping
//! - [`state`] - Shared application state

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod explain;
pub mod llm;
pub mod matching;
pub mod models;
pub mod state;
