//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store mutations, automation cascades and persistence into
//!   use-case level APIs.
//! - Keep UI layers decoupled from store and storage details.

pub mod workspace_service;
