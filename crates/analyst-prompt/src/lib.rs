//! Prompt template management for local-analyst
//!
//! Templates use Jinja2 syntax rendered by MiniJinja with strict undefined
//! handling, and are shared through a thread-safe [`PromptRegistry`].
//!
//! # Quick Start
//!
//! ```
//! use analyst_prompt::{JinjaTemplate, PromptRegistry};
//! use serde_json::json;
//!
//! let registry = PromptRegistry::new();
//! registry.register(JinjaTemplate::new("analyzer", "Analyze {{ symbol }}").unwrap());
//!
//! let prompt = registry.render("analyzer", &json!({ "symbol": "AAPL" })).unwrap();
//! assert_eq!(prompt, "Analyze AAPL");
//! ```

mod error;
mod jinja;
mod registry;
mod template;

pub use error::{PromptError, Result};
pub use jinja::JinjaTemplate;
pub use registry::PromptRegistry;
pub use template::PromptTemplate;
