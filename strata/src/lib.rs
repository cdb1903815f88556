//! Strata is the GPU-facing core of a real-time renderer.
//!
//! It deduplicates GPU resources by content ([`AssetCache`](rendering::AssetCache)),
//! keeps drawables in a container sorted for minimal state changes
//! ([`DrawList`](scene::DrawList)) and submits them through a state-diffing
//! [`Renderer`](rendering::Renderer) that ring-buffers per-draw uniforms across
//! frames in flight.
//!
//! Everything that talks to the GPU goes through the
//! [`RenderBackend`](rendering::RenderBackend) trait. [`WgpuBackend`](rendering::WgpuBackend)
//! drives real hardware, [`RecordingBackend`](rendering::RecordingBackend) records
//! every call for headless use and tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod engine;
pub mod utils;

pub use engine::{assets, drawables, error, rendering, scene};

pub use ::nalgebra;
pub use ::tracing;
pub use ::wgpu;
