mod cli;

use std::{
    fs,
    io::{self, Read},
    process::ExitCode,
    time::Duration,
};

use anyhow::{Context, Result};
use execjs::{Config, Registry};
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    match run(cli::Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if io::stderr().is_terminal() {
                eprintln!("{}: {:#}", "error".red().bold(), e);
            } else {
                eprintln!("error: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: cli::Cli) -> Result<()> {
    let cfg = Config::load();
    let registry = Registry::with_defaults();

    if args.print_available_runtimes {
        for (name, _) in registry.available_runtimes() {
            println!("{}", name);
        }
        return Ok(());
    }

    let runtime = registry.get(args.runtime.as_deref(), &cfg)?;
    log::debug!("using {}", runtime);

    let encoding = args.encoding.unwrap_or_else(|| cfg.encoding());
    let mut codes = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let text = encoding
            .decode(bytes)
            .with_context(|| format!("decoding {}", path.display()))?;
        codes.push(text);
    }

    let mut ctx = runtime.compile(codes.join("\n"))?;
    // --timeout 0 turns off a limit set in the config
    let limit = match args.timeout {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => cfg.timeout(),
    };
    if let Some(limit) = limit {
        ctx = ctx.timeout(limit);
    }

    let expr = match args.expression() {
        Some(expr) => expr.to_string(),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let value = ctx.eval(&expr).await?;
    println!("{}", value);
    Ok(())
}
