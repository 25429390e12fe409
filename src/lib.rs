//! Run JavaScript through an external runtime.
//!
//! The snippet is wrapped in a small bootstrap ([`runner`]), written to a
//! temporary file and run by a runtime found on PATH ([`runtime`]). The child
//! prints one blank line and one JSON result line ([`protocol`]), which is
//! decoded back into a [`serde_json::Value`].
//!
//! ```no_run
//! # async fn demo() -> execjs::Result<()> {
//! let value = execjs::eval("'red yellow blue'.split(' ')").await?;
//! assert_eq!(value, serde_json::json!(["red", "yellow", "blue"]));
//!
//! let ctx = execjs::compile("function add(x, y) { return x + y; }")?;
//! assert_eq!(ctx.call("add", &[1.into(), 2.into()]).await?, 3);
//! # Ok(())
//! # }
//! ```

use std::sync::OnceLock;

use serde_json::Value;

pub mod config;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod runner;
pub mod runtime;

pub use config::Config;
pub use error::{Error, Result};
pub use protocol::Outcome;
pub use registry::Registry;
pub use runtime::{Context, Encoding, ExternalRuntime};

fn default_registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(Registry::with_defaults)
}

/// A runtime from the built-in registry; `None` picks the default.
pub fn get(name: Option<&str>) -> Result<&'static ExternalRuntime> {
    default_registry().get(name, &Config::load())
}

/// Context on the default runtime, with the configured timeout applied.
pub fn compile(source: &str) -> Result<Context<'static>> {
    let cfg = Config::load();
    let ctx = default_registry().get(None, &cfg)?.compile(source)?;
    Ok(match cfg.timeout() {
        Some(limit) => ctx.timeout(limit),
        None => ctx,
    })
}

pub async fn eval(source: &str) -> Result<Value> {
    compile("")?.eval(source).await
}

pub async fn exec(source: &str) -> Result<Value> {
    compile("")?.exec(source).await
}
