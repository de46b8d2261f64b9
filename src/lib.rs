// THEORY:
// This file is the main entry point for the `arena_sight` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the public
// API that will be exposed to external consumers (a browser hook, the
// `trace_replayer` tool, an automated agent).
//
// The primary goal is to export the `DetectionPipeline` and its associated data
// structures (`PipelineConfig`, `FrameReport`, etc.) as the high-level interface
// of the engine. The layered internals live under `core_modules` and remain
// reachable for hosts that want to drive a single layer directly.

pub mod core_modules;
pub mod error;
pub mod pipeline;

pub use core_modules::collaborators::{
    CameraConverter, CoordinateConverter, FrameClock, ManualClock, SystemClock,
};
pub use core_modules::draw_call::{CanvasCall, DrawEvent, Paint};
pub use core_modules::entity::{Entity, EntityId, EntityKind, Extras};
pub use error::{PaintParseError, PipelineError};
pub use pipeline::{DetectionPipeline, EntitySnapshot, FrameReport, PipelineBuilder, PipelineConfig};
