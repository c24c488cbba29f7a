// SPDX-License-Identifier: MPL-2.0
//! Application layer - ports between the engine and its backends.
//!
//! - [`port`]: Trait definitions (interfaces) for dependency inversion
//!
//! # Dependency Rule
//!
//! - Application layer depends on domain layer (uses domain types)
//! - Infrastructure layer implements application layer ports
//! - The store, media pipeline and engine depend on ports, never on adapters

pub mod port;
