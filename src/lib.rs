//! Terminal prompt pad: a three-pane editor (code, context, output) with
//! draggable splitters, a collapsible side panel and a submit/poll cycle
//! against a code-assistant backend.
//!
//! The crate is layered the same way top to bottom: `runtime` drives
//! terminal events through plugins, `layout`/`registry`/`render` turn zone
//! content into ANSI output, `workspace` owns pane geometry, `prompt` owns
//! the request cycle and `app` wires them together.

pub mod app;
pub mod config;
pub mod cursor;
pub mod editor;
pub mod error;
pub mod files;
pub mod geometry;
pub mod layout;
pub mod logging;
pub mod metrics;
pub mod prompt;
pub mod registry;
pub mod render;
pub mod runtime;
pub mod session;
pub mod transform;
pub mod width;
pub mod workspace;

pub use app::PadApp;
pub use config::{AppConfig, ConfigError, load_config};
pub use error::{PadError, Result};
pub use geometry::{Rect, Size};
pub use layout::{Constraint, Direction, LayoutNode, LayoutTree};
pub use logging::{LogEvent, LogFields, LogLevel, Logger, LoggingError, LoggingResult};
pub use metrics::{MetricSnapshot, RuntimeMetrics};
pub use registry::{ZoneContent, ZoneId, ZoneRegistry};
pub use render::{AnsiRenderer, RendererSettings};
pub use runtime::diagnostics::LifecycleLoggerPlugin;
pub use runtime::driver::cli::{CliDriver, CliDriverError, DriverResult};
pub use runtime::{
    EventFlow, PadPlugin, PadRuntime, RuntimeConfig, RuntimeContext, RuntimeEvent,
};
pub use width::display_width;
