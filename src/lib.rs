//! A console view widget: renders incoming log payloads as highlighted lines
//! in a scrolling panel, fed by events or by polling an HTTP endpoint.

pub mod capability;
pub mod config;
pub mod delivery;
pub mod dom;
pub mod error;
pub mod models;
pub mod registry;
pub mod render;

pub use capability::{FullscreenSupport, StaticFullscreen};
pub use config::{configure, Configuration, Endpoint, Mode, Overrides, RequestOptions};
pub use delivery::{Fetcher, HttpFetcher};
pub use dom::{Document, ElementId};
pub use error::{ConfigError, ConsoleError, DeliveryError};
pub use models::WidgetStatus;
pub use registry::{ConsoleRegistry, WidgetHandle};
pub use render::{render, HighlightRule, Matcher, Transform};
