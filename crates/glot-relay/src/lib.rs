//! # glot-relay
//!
//! The relay between UI surfaces and the chat client: it accepts task
//! requests addressed by surface id, runs the prompt → client → stream
//! pipeline, and forwards each decoded chunk to the owning surface as a
//! discrete, task-namespaced message.
//!
//! Two invariants drive the design:
//!
//! - **At most one request per surface.** Starting a new task for a
//!   surface silently cancels the one already in flight (supersede).
//! - **Exactly one terminal message per delivered request.** A surface
//!   receives chunks in order followed by one `done` or one `error` —
//!   unless it cancelled, in which case it receives nothing further.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`message`] | Wire messages to and from surfaces |
//! | [`relay`] | The [`Relay`] service and its registry |
//! | [`sink`] | The [`SurfaceSink`] delivery abstraction |

#![warn(missing_docs)]

pub mod message;
pub mod relay;
pub mod sink;

pub use message::{SurfaceMessage, SurfaceRequest};
pub use relay::Relay;
pub use sink::{ChannelSink, SurfaceId, SurfaceSink};
