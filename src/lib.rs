//! stache - A logic-light Mustache template engine with pluggable helpers
//!
//! stache turns delimiter-based template text into a cached, immutable
//! node graph and evaluates it against `serde_json` data:
//! - Mustache variables, sections, inverted sections and partials
//! - Handlebars-style helper tags with positional and hash arguments
//! - Template inheritance (`{{<base}}` / `{{$section}}`)
//! - A priority-ordered, pluggable value-resolution chain
//! - Lifecycle listeners with LIFO release callbacks
//!
//! ```
//! use stache::{Engine, MapTemplateLocator};
//! use serde_json::json;
//!
//! let engine = Engine::builder()
//!     .add_locator(MapTemplateLocator::default().with_template("greet", "Hello {{name}}!"))
//!     .build()
//!     .unwrap();
//! assert_eq!(engine.render("greet", &json!({"name": "World"})).unwrap(), "Hello World!");
//! ```

// Enforce error handling best practices
#![cfg_attr(
    not(test),
    warn(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
    )
)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used,))]

mod compiler;
pub mod config;
pub mod engine;
pub mod error;
pub mod escape;
pub mod helpers;
pub mod interpolation;
pub mod lambda;
pub mod lexer;
pub mod listener;
pub mod locator;
pub mod node;
pub mod parser;
mod render;
pub mod resolver;
pub mod template;

// Re-export main types for public API
pub use config::{Delimiters, EngineConfig};
pub use engine::{Engine, EngineBuilder};
pub use error::{Error, Result};
pub use escape::HtmlEscaper;
pub use helpers::{Helper, HelperPlacement, Options};
pub use interpolation::{
    BracketDotKeySplitter, DotKeySplitter, KeySplitter, MissingValueHandler, NoValueHandler,
    PlaceholderValueHandler, StrictValueHandler,
};
pub use lambda::Lambda;
pub use listener::{CompilationEvent, EngineListener, ParsingEvent, RenderingEvent};
pub use locator::{FileTemplateLocator, MapTemplateLocator, TemplateLocator};
pub use node::{KeyPath, Node, NodeList, Param, TagInfo};
pub use resolver::{Resolved, ResolverChain, ValueResolver};
pub use template::CompiledTemplate;

// Re-export commonly used external types
pub use serde_json::{json, Value};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::config::{Delimiters, EngineConfig};
    pub use crate::engine::{Engine, EngineBuilder};
    pub use crate::error::{Error, Result};
    pub use crate::helpers::{Helper, HelperPlacement, Options};
    pub use crate::interpolation::{KeySplitter, MissingValueHandler};
    pub use crate::lambda::Lambda;
    pub use crate::listener::EngineListener;
    pub use crate::locator::{FileTemplateLocator, MapTemplateLocator, TemplateLocator};
    pub use crate::resolver::{Resolved, ValueResolver};
    pub use serde_json::{json, Value};
}
