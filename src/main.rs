//! Runner binary: read a classified report, analyze it, emit the
//! artifact as JSON plus a plain-text summary.

use std::path::PathBuf;
use std::process::ExitCode;

use lablens::config::EngineConfig;
use lablens::engine::{report, verifier, ReasoningEngine};

struct Args {
    input: PathBuf,
    config_dir: Option<PathBuf>,
    out: Option<PathBuf>,
    strict: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut input = None;
    let mut config_dir = None;
    let mut out = None;
    let mut strict = false;

    let mut argv = std::env::args().skip(1);
    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "--config" => {
                config_dir = Some(PathBuf::from(
                    argv.next().ok_or("--config requires a directory")?,
                ));
            }
            "--out" => {
                out = Some(PathBuf::from(argv.next().ok_or("--out requires a path")?));
            }
            "--strict" => strict = true,
            "--help" | "-h" => {
                return Err(
                    "usage: lablens <report.json> [--config DIR] [--out FILE] [--strict]".into(),
                );
            }
            other if input.is_none() => input = Some(PathBuf::from(other)),
            other => return Err(format!("unexpected argument: {other}")),
        }
    }

    Ok(Args {
        input: input.ok_or("missing input report path")?,
        config_dir,
        out,
        strict,
    })
}

fn run(args: Args) -> Result<(), String> {
    let config = match &args.config_dir {
        Some(dir) => EngineConfig::load(dir).map_err(|e| e.to_string())?,
        None => EngineConfig::builtin(),
    };
    let engine = ReasoningEngine::new(config);

    let json = std::fs::read_to_string(&args.input)
        .map_err(|e| format!("cannot read {}: {e}", args.input.display()))?;
    let artifact = engine.analyze_json(&json).map_err(|e| e.to_string())?;

    if args.strict {
        verifier::enforce(&artifact).map_err(|e| e.to_string())?;
    }

    if let Some(out) = &args.out {
        let encoded =
            serde_json::to_string_pretty(&artifact).map_err(|e| e.to_string())?;
        std::fs::write(out, encoded)
            .map_err(|e| format!("cannot write {}: {e}", out.display()))?;
        tracing::info!(path = %out.display(), "artifact written");
    }

    println!("{}", report::render_text(&artifact));
    Ok(())
}

fn main() -> ExitCode {
    lablens::init_tracing();

    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::from(2);
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::FAILURE
        }
    }
}
