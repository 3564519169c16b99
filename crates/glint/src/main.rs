use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Command as ProcessCommand, Stdio};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use parking_lot::Mutex;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use glint::replay::{self, Direction};
use glint::{AnnotateConfig, DebugObserver, EditorHost, InMemoryHost};
use glint_annotate::DecorationStyle;
use glint_dap::codec;

/// Observe a live or captured debug-adapter session and annotate what ran.
#[derive(Debug, Parser)]
#[command(name = "glint", version, about)]
struct Cli {
    /// Path to a JSON annotation config file.
    ///
    /// When unset, `GLINT_CONFIG` is used as a fallback; when neither is
    /// provided the defaults apply.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Re-run a captured `-> {json}` / `<- {json}` trace against an
    /// in-memory editor and print the resulting annotations.
    Replay {
        /// The capture file.
        trace: PathBuf,
        /// Source files to open as visible surfaces, keyed by their path.
        #[arg(long = "open", value_name = "FILE")]
        open: Vec<PathBuf>,
    },
    /// Sit between an editor and a debug adapter: spawn the adapter,
    /// forward framed stdio in both directions, observe everything.
    Proxy {
        /// The adapter command line to spawn.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        adapter: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config);

    match cli.command {
        Command::Replay { trace, open } => run_replay(&trace, &open, config),
        Command::Proxy { adapter } => run_proxy(&adapter, config),
    }
}

fn load_config(cli_path: Option<PathBuf>) -> AnnotateConfig {
    let path = cli_path.or_else(|| std::env::var_os("GLINT_CONFIG").map(PathBuf::from));
    let Some(path) = path else {
        return AnnotateConfig::default();
    };

    let loaded = std::fs::read_to_string(&path)
        .map_err(anyhow::Error::from)
        .and_then(|text| serde_json::from_str(&text).map_err(anyhow::Error::from));
    match loaded {
        Ok(config) => config,
        Err(err) => {
            eprintln!(
                "glint: failed to load config from {}: {err}; continuing with defaults",
                path.display()
            );
            AnnotateConfig::default()
        }
    }
}

fn run_replay(trace: &Path, open: &[PathBuf], config: AnnotateConfig) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(trace)
        .with_context(|| format!("reading trace {}", trace.display()))?;

    let mut host = InMemoryHost::new();
    for path in open {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading source {}", path.display()))?;
        host.open(path.to_string_lossy(), &content);
    }

    let mut observer = DebugObserver::new();
    observer.session_will_start(&mut host, &config);

    let mut replayed = 0usize;
    let mut skipped = 0usize;
    for (index, line) in text.lines().enumerate() {
        match replay::parse_trace_line(index + 1, line) {
            Ok(None) => {}
            Ok(Some(entry)) => {
                replayed += 1;
                match entry.direction {
                    Direction::ToAdapter => observer.message_to_adapter(&entry.message),
                    Direction::FromAdapter => observer.message_from_adapter(
                        &mut host,
                        &config,
                        &entry.message,
                        Instant::now(),
                    ),
                }
            }
            Err(err) => {
                skipped += 1;
                tracing::warn!(%err, "skipping malformed trace line");
            }
        }
    }
    observer.session_will_stop();

    println!("replayed {replayed} messages ({skipped} skipped)");
    for resource in host.visible_resources() {
        for (style, span) in host.spans_with_style(&resource) {
            if let DecorationStyle::AfterText { .. } = style {
                let line = span.range.start.line;
                let text = span.after_text.as_deref().unwrap_or("");
                println!("{resource}:{}  {text}", line + 1);
            }
        }
    }
    Ok(())
}

struct ProxyState {
    observer: DebugObserver,
    host: InMemoryHost,
    config: AnnotateConfig,
}

fn run_proxy(adapter: &[String], config: AnnotateConfig) -> anyhow::Result<()> {
    let (program, args) = adapter
        .split_first()
        .context("empty adapter command line")?;
    let mut child = ProcessCommand::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawning debug adapter {program:?}"))?;
    let child_stdin = child.stdin.take().context("adapter stdin not piped")?;
    let child_stdout = child.stdout.take().context("adapter stdout not piped")?;

    let state = Mutex::new(ProxyState {
        observer: DebugObserver::new(),
        host: InMemoryHost::new(),
        config,
    });
    {
        let mut state = state.lock();
        let ProxyState {
            observer,
            host,
            config,
        } = &mut *state;
        observer.session_will_start(host, config);
    }

    let (to_adapter, from_adapter) = std::thread::scope(|scope| {
        let state = &state;
        let editor_side = scope.spawn(move || {
            let mut reader = BufReader::new(io::stdin());
            let mut writer = BufWriter::new(child_stdin);
            pump(&mut reader, &mut writer, |message| {
                state.lock().observer.message_to_adapter(message);
            })
        });
        let adapter_side = scope.spawn(move || {
            let mut reader = BufReader::new(child_stdout);
            let mut writer = BufWriter::new(io::stdout());
            pump(&mut reader, &mut writer, |message| {
                let now = Instant::now();
                let mut state = state.lock();
                let ProxyState {
                    observer,
                    host,
                    config,
                } = &mut *state;
                observer.sweep(host, now);
                observer.message_from_adapter(host, config, message, now);
            })
        });
        (editor_side.join(), adapter_side.join())
    });

    for side in [("editor", to_adapter), ("adapter", from_adapter)] {
        match side.1 {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::warn!(side = side.0, %err, "pump stopped on error"),
            Err(_) => tracing::error!(side = side.0, "pump thread panicked"),
        }
    }

    {
        let mut state = state.lock();
        state.observer.session_will_stop();
        tracing::info!(
            tracked_lines = state.observer.history().tracked_line_count(),
            "session finished"
        );
    }

    let status = child.wait().context("waiting for the adapter to exit")?;
    anyhow::ensure!(status.success(), "adapter exited with {status}");
    Ok(())
}

/// Forward framed messages from `reader` to `writer`, handing each decoded
/// payload to `observe` on the way past. Payloads are forwarded byte-for-byte
/// even when they do not decode.
fn pump<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    mut observe: impl FnMut(&Value),
) -> Result<(), codec::CodecError> {
    while let Some(payload) = codec::read_message(reader)? {
        match serde_json::from_slice::<Value>(&payload) {
            Ok(message) => observe(&message),
            Err(err) => tracing::warn!(%err, "forwarding undecodable payload"),
        }
        codec::write_message(writer, &payload)?;
    }
    Ok(())
}
