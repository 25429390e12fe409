//! Named runtimes and default runtime selection.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::runner::RunnerSource;
use crate::runtime::{Encoding, ExternalRuntime};

/// Runtimes in registration order; auto-detection prefers earlier entries.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<(String, ExternalRuntime)>,
}

impl Registry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add or replace `name`. Replacing keeps the original position.
    pub fn register(&mut self, name: impl Into<String>, runtime: ExternalRuntime) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = runtime,
            None => self.entries.push((name, runtime)),
        }
    }

    pub fn runtimes(&self) -> impl Iterator<Item = (&str, &ExternalRuntime)> {
        self.entries.iter().map(|(n, r)| (n.as_str(), r))
    }

    pub fn available_runtimes(&self) -> impl Iterator<Item = (&str, &ExternalRuntime)> {
        self.runtimes().filter(|(_, r)| r.is_available())
    }

    /// Look up `name`, or pick a default when `name` is `None`.
    pub fn get(&self, name: Option<&str>, cfg: &Config) -> Result<&ExternalRuntime> {
        match name {
            Some(name) => self.get_named(name),
            None => self.auto_detect(cfg),
        }
    }

    fn get_named(&self, name: &str) -> Result<&ExternalRuntime> {
        let runtime = self
            .entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| r)
            .ok_or_else(|| Error::RuntimeUnavailable(format!("{name} runtime is not defined")))?;
        if !runtime.is_available() {
            return Err(Error::RuntimeUnavailable(format!(
                "{} runtime is not available on this system",
                runtime.name()
            )));
        }
        Ok(runtime)
    }

    /// The runtime named by `EXECJS_RUNTIME`, if set and non-empty.
    pub fn get_from_environment(&self, cfg: &Config) -> Result<Option<&ExternalRuntime>> {
        match cfg.runtime_name() {
            Some(name) => self.get_named(&name).map(Some),
            None => Ok(None),
        }
    }

    fn auto_detect(&self, cfg: &Config) -> Result<&ExternalRuntime> {
        if let Some(runtime) = self.get_from_environment(cfg)? {
            return Ok(runtime);
        }
        self.available_runtimes()
            .map(|(_, r)| r)
            .next()
            .ok_or_else(|| Error::RuntimeUnavailable("Could not find a JavaScript runtime.".into()))
    }
}

pub fn node() -> ExternalRuntime {
    ExternalRuntime::new("Node.js (V8)", ["node"], RunnerSource::Node)
}

pub fn nodejs() -> ExternalRuntime {
    ExternalRuntime::new("Node.js (V8)", ["nodejs"], RunnerSource::Node)
}

pub fn javascriptcore() -> ExternalRuntime {
    ExternalRuntime::new(
        "JavaScriptCore",
        ["/System/Library/Frameworks/JavaScriptCore.framework/Versions/A/Resources/jsc"],
        RunnerSource::JavaScriptCore,
    )
}

pub fn spidermonkey() -> ExternalRuntime {
    ExternalRuntime::new("SpiderMonkey", ["js"], RunnerSource::SpiderMonkey)
}

pub fn jscript() -> ExternalRuntime {
    ExternalRuntime::new("JScript", ["cscript", "//E:jscript", "//Nologo"], RunnerSource::JScript)
        .with_encoding(Encoding::Ascii)
}

pub fn phantomjs() -> ExternalRuntime {
    ExternalRuntime::new("PhantomJS", ["phantomjs"], RunnerSource::PhantomJS)
}

pub fn slimerjs() -> ExternalRuntime {
    ExternalRuntime::new("SlimerJS", ["slimerjs"], RunnerSource::PhantomJS)
}

pub fn nashorn() -> ExternalRuntime {
    ExternalRuntime::new("Nashorn", ["jjs"], RunnerSource::SpiderMonkey)
}

impl Registry {
    /// Every runtime this crate knows how to drive.
    pub fn with_defaults() -> Self {
        let mut reg = Self::empty();
        let node = node();
        reg.register("Node", if node.is_available() { node } else { nodejs() });
        reg.register("JavaScriptCore", javascriptcore());
        reg.register("SpiderMonkey", spidermonkey());
        reg.register("Spidermonkey", spidermonkey());
        reg.register("JScript", jscript());
        reg.register("PhantomJS", phantomjs());
        reg.register("SlimerJS", slimerjs());
        reg.register("Nashorn", nashorn());
        reg
    }
}
