// Detection layer.
pub mod circle_sequence;
pub mod detection;
pub mod draw_call;
pub mod geometry;
pub mod paint;
pub mod radius_normalizer;
pub mod shape_classifier;

// Tracking layer.
pub mod entity;
pub mod frame_cycle;
pub mod identity_resolver;
pub mod motion;
pub mod self_locator;

pub mod collaborators;
