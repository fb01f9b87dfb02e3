//! Core types shared by the Ontoscope diagram editor.
//!
//! This crate holds the domain-independent building blocks: geometry and
//! polyline math, interned identifiers, colors, a single-threaded event bus,
//! and deferred-work scheduling primitives.

pub mod color;
pub mod events;
pub mod geometry;
pub mod identifier;
pub mod scheduler;
