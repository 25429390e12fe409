//! External runtimes: run the wrapped program in a child process and read
//! back its result line.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use serde_json::Value;
use tokio::{process::Command, time::timeout};

use crate::error::{Error, Result};
use crate::protocol::{self, Outcome};
use crate::runner::{encode_unicode_codepoints, RunnerSource};

pub mod which;

/// Text encoding of the program file and of the child's stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    Ascii,
}

impl Encoding {
    pub fn label(self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Ascii => "ascii",
        }
    }

    /// `None` when `text` has characters this encoding cannot carry.
    pub fn encode(self, text: &str) -> Option<Vec<u8>> {
        match self {
            Encoding::Utf8 => Some(text.as_bytes().to_vec()),
            Encoding::Ascii if text.is_ascii() => Some(text.as_bytes().to_vec()),
            Encoding::Ascii => None,
        }
    }

    pub fn decode(self, bytes: Vec<u8>) -> Result<String> {
        match self {
            Encoding::Ascii if !bytes.is_ascii() => Err(Error::OutputEncoding(self.label())),
            _ => String::from_utf8(bytes).map_err(|_| Error::OutputEncoding(self.label())),
        }
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "utf8" => Ok(Encoding::Utf8),
            "ascii" | "usascii" => Ok(Encoding::Ascii),
            other => Err(format!("unsupported encoding: {other}")),
        }
    }
}

/// A JavaScript runtime reached by launching an executable.
#[derive(Debug, Clone)]
pub struct ExternalRuntime {
    name: String,
    command: Vec<String>,
    runner: RunnerSource,
    encoding: Encoding,
    binary: OnceLock<Option<Vec<String>>>,
}

impl ExternalRuntime {
    pub fn new<I, S>(name: impl Into<String>, command: I, runner: RunnerSource) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            command: command.into_iter().map(Into::into).collect(),
            runner,
            encoding: Encoding::Utf8,
            binary: OnceLock::new(),
        }
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn runner(&self) -> RunnerSource {
        self.runner
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Resolved argv prefix; looked up on PATH once per runtime.
    pub fn binary(&self) -> Option<&[String]> {
        self.binary
            .get_or_init(|| which::which(&self.command))
            .as_deref()
    }

    pub fn is_available(&self) -> bool {
        self.binary().is_some()
    }

    /// Bundle `source` as a context that later snippets run after.
    pub fn compile(&self, source: impl Into<String>) -> Result<Context<'_>> {
        if !self.is_available() {
            return Err(Error::RuntimeUnavailable(format!(
                "{} runtime is not available on this system",
                self.name
            )));
        }
        Ok(Context {
            runtime: self,
            source: source.into(),
            cwd: None,
            timeout: None,
        })
    }

    pub async fn exec(&self, source: &str) -> Result<Value> {
        self.compile("")?.exec(source).await
    }

    pub async fn eval(&self, source: &str) -> Result<Value> {
        self.compile("")?.eval(source).await
    }
}

impl fmt::Display for ExternalRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExternalRuntime({})", self.name)
    }
}

/// Preloaded source plus process options for one runtime.
#[derive(Debug, Clone)]
pub struct Context<'a> {
    runtime: &'a ExternalRuntime,
    source: String,
    cwd: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl<'a> Context<'a> {
    /// Directory the child runs in.
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Kill the child if it has not finished after `limit`.
    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    pub fn runtime(&self) -> &'a ExternalRuntime {
        self.runtime
    }

    pub fn is_available(&self) -> bool {
        self.runtime.is_available()
    }

    /// Run `snippet` as a function body; its `return` value is the result.
    /// A snippet without a value yields `null`.
    pub async fn exec(&self, snippet: &str) -> Result<Value> {
        match self.run(snippet).await? {
            Outcome::NoValue => Ok(Value::Null),
            Outcome::Value(v) => Ok(v),
            Outcome::Unrepresentable => Err(Error::Unrepresentable),
            Outcome::Thrown(msg) if msg.starts_with("SyntaxError:") => Err(Error::Runtime(msg)),
            Outcome::Thrown(msg) => Err(Error::Program(msg)),
        }
    }

    /// Evaluate `expr` as an expression.
    pub async fn eval(&self, expr: &str) -> Result<Value> {
        let data = if expr.trim().is_empty() {
            "''".to_string()
        } else {
            let literal = encode_unicode_codepoints(&Value::String(expr.to_string()).to_string());
            format!("'('+{literal}+')'")
        };
        self.exec(&format!("return eval({data})")).await
    }

    /// Call the function reachable as `identifier` with JSON arguments.
    pub async fn call(&self, identifier: &str, args: &[Value]) -> Result<Value> {
        let args = Value::Array(args.to_vec());
        self.eval(&format!("{identifier}.apply(this, {args})")).await
    }

    /// Run `snippet` and return the raw outcome without mapping errors.
    pub async fn run(&self, snippet: &str) -> Result<Outcome> {
        let source = if self.source.is_empty() {
            snippet.to_string()
        } else {
            format!("{}\n{}", self.source, snippet)
        };
        let program = self.runtime.runner.compile(&source);

        let file = tempfile::Builder::new()
            .prefix("execjs")
            .suffix(".js")
            .tempfile()?;
        let encoding = self.runtime.encoding;
        let bytes = encoding.encode(&program).ok_or_else(|| Error::SourceEncoding {
            encoding: encoding.label(),
            path: file.path().to_path_buf(),
        })?;
        std::fs::write(file.path(), bytes)?;
        let path = file.into_temp_path();

        let stdout = self.exec_file(&path).await?;
        protocol::extract_result(&stdout)
    }

    async fn exec_file(&self, path: &Path) -> Result<String> {
        let argv = self.runtime.binary().ok_or_else(|| {
            Error::RuntimeUnavailable(format!(
                "{} runtime is not available on this system",
                self.runtime.name
            ))
        })?;
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| Error::RuntimeUnavailable(format!("{} has no command", self.runtime.name)))?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        log::debug!("running {} on {}", program, path.display());
        let child = cmd.spawn()?;
        let out = match self.timeout {
            Some(limit) => timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| Error::Timeout(limit))??,
            None => child.wait_with_output().await?,
        };

        let status = out.status.code().unwrap_or(-1);
        log::debug!("{} exited with status {}", self.runtime.name, status);
        if !out.status.success() {
            return Err(Error::ProcessExited {
                status,
                stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
            });
        }
        self.runtime.encoding.decode(out.stdout)
    }
}
