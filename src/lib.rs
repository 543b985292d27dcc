//! Graph visualization and interaction engine: payload normalization, search, selection,
//! force and tree layouts, style resolution, render surface lifecycle and input handling.

pub mod config;
pub mod error;
pub mod graph;
pub mod interaction;
pub mod layout;
pub mod search;
pub mod selection;
pub mod session;
pub mod style;
pub mod surface;
pub mod util;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use graph::{Graph, Link, Node, normalize};
pub use interaction::{EngineCallbacks, InteractionController};
