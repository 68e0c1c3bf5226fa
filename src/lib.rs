#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Dispatch Core
//!
//! Rust core for a last-mile delivery platform: parcels move through a
//! delivery lifecycle, shippers work time-boxed **sessions**, and parcels
//! are grouped into **assignments** created manually by an operator or by
//! the auto-assignment engine.
//!
//! ## Architecture
//!
//! The crate owns the hard part of the platform: the parcel, assignment
//! and session state machines, the VRP-style auto-assignment over an
//! external route matrix service, the session lifecycle with its atomic
//! cascades, and the daily auto-close sweep. CRUD services, identity and
//! the notification consumer live behind the gateway and only meet this
//! core at the event bus and REST surface.
//!
//! ## Module Organization
//!
//! - [`state_machine`] - Pure transition tables for parcels, assignments and sessions
//! - [`models`] - Persisted entities
//! - [`storage`] - Store trait with in-memory and Postgres backends
//! - [`routing`] - Route matrix service adapter
//! - [`solver`] - Auto-assignment (VRP) engine
//! - [`orchestration`] - Assignment/session managers and the auto-close scheduler
//! - [`events`] - Lifecycle event envelopes and the publisher
//! - [`web`] - Axum API surface
//! - [`config`] - Configuration management
//! - [`error`] - Crate-level error type
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dispatch_core::config::DispatchConfig;
//! use dispatch_core::events::EventPublisher;
//! use dispatch_core::orchestration::SessionLifecycleManager;
//! use dispatch_core::storage::InMemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DispatchConfig::default();
//! let store = Arc::new(InMemoryStore::new());
//! let publisher = EventPublisher::new(config.event_buffer_size);
//! let sessions = SessionLifecycleManager::new(store, publisher);
//! # let _ = sessions;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod routing;
pub mod solver;
pub mod state_machine;
pub mod storage;
pub mod web;

pub use config::{DispatchConfig, RoutingConfig, ShiftConfig};
pub use error::{DispatchError, Result};
pub use state_machine::{AssignmentStatus, ParcelStatus, SessionStatus};
