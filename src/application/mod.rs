// SPDX-License-Identifier: MPL-2.0
//! Application layer - the contracts the playback engine is written against.
//!
//! - [`port`]: Trait definitions (interfaces) for dependency inversion
//!
//! # Dependency Rule
//!
//! - Application layer depends on domain layer (uses domain types)
//! - Infrastructure layer implements application layer ports
//! - The playback engine (`video_player`) only talks to ports
//!
//! # Example
//!
//! ```ignore
//! use vidsync::application::port::AudioChannel;
//!
//! // Infrastructure implements the port trait
//! struct CpalChannel { /* ... */ }
//! impl AudioChannel for CpalChannel { /* ... */ }
//! ```

pub mod port;
