//! `campuscard-http` is an async HTTP client for the campus lost-and-found
//! card service.
//!
//! Two independent pieces make up the crate:
//! - a resilient request client — [`CampusCardClient::call`] with bounded
//!   linear-backoff retry, a shared [`Connectivity`] flag and a periodic
//!   heartbeat probe;
//! - a responsive marker projector — [`geometry::project`] maps native-space
//!   map annotations onto a responsively scaled image, and
//!   [`session::MapView`] keeps them positioned across image loading and
//!   resizing.
//!
//! Typed wrappers for the service endpoints live in [`api`].

pub mod api;
mod client;
mod error;
pub mod geometry;
mod options;
mod status;
mod wire;

#[cfg(not(target_arch = "wasm32"))]
mod heartbeat;
#[cfg(not(target_arch = "wasm32"))]
pub mod session;

pub use client::CampusCardClient;
pub use error::CampusCardError;
pub use geometry::{Marker, PositionedMarker, RenderSurface};
pub use options::ClientOptions;
pub use status::{Connectivity, ConnectivityState};

pub type Result<T> = std::result::Result<T, CampusCardError>;
