//! Force-directed dependency graph: layout, interaction and export, plus the
//! Leptos component that mounts it on a canvas.

mod commands;
mod component;
mod config;
mod download;
mod engine;
pub mod export;
pub mod interaction;
pub mod keyboard;
pub mod normalize;
pub mod policy;
mod quadtree;
mod render;
mod sample;
mod scene;
pub mod search;
pub mod simulation;
mod types;
pub mod viewport;

pub use commands::{GraphCommands, GraphHandle};
pub use component::DependencyGraph;
pub use config::EngineConfig;
pub use engine::{ClickTarget, GraphEngine};
pub use export::{ExportError, ExportedFile};
pub use sample::sample_graph;
pub use types::{GraphData, GraphEdge, GraphNode, GraphOptions, Network, NodeId};
