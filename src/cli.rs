use std::path::PathBuf;

use clap::Parser;
use execjs::Encoding;

#[derive(Parser, Debug, Clone)]
#[command(name = "execjs", about = "Evaluate JavaScript with an external runtime", version)]
pub struct Cli {
    /// Source files loaded before the expression, joined by newlines.
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Print the names of installed runtimes and exit.
    #[arg(long = "print-available-runtimes")]
    pub print_available_runtimes: bool,

    /// Runtime to use (defaults to EXECJS_RUNTIME, then the first one found).
    #[arg(short = 'r', long)]
    pub runtime: Option<String>,

    /// Expression to evaluate. Read from stdin when omitted.
    #[arg(short = 'e', long = "eval")]
    pub expr: Option<String>,

    /// Encoding of the source files (utf8 or ascii).
    #[arg(long)]
    pub encoding: Option<Encoding>,

    /// Kill the runtime after this many seconds (0 disables).
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// The `-e` expression; an empty one falls back to stdin.
    pub fn expression(&self) -> Option<&str> {
        self.expr.as_deref().filter(|e| !e.is_empty())
    }
}
