//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate model rules and repository persistence into store
//!   operations.
//! - Keep presentation layers decoupled from storage details.

pub mod task_store;
