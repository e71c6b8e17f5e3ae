//! The replay command: run a command script through an orchestrator.
//!
//! A script has one request per line:
//!
//! ```text
//! # comments and blank lines are skipped
//! set <key> <value> [flags] [exptime] [quiet]
//! add <key> <value> [flags] [exptime] [quiet]
//! replace <key> <value> [flags] [exptime] [quiet]
//! delete <key>
//! touch <key> <exptime>
//! get <key>...
//! gat <key> <exptime>
//! noop
//! quit [quiet]
//! version
//! ```
//!
//! Any other first word is sent as an unknown command. Each request's opaque
//! is its line number, so replies can be matched back to the script.

use std::sync::Arc;

use bytes::Bytes;
use clap::Args;
use tracing::debug;

use crate::cli::{CliError, GlobalArgs, InputSource, OutputSink, Result};
use crate::common::{
    DeleteRequest, GatRequest, GetRequest, NoopRequest, Opaque, QuitRequest, Request, SetRequest,
    TouchRequest, VersionRequest,
};
use crate::config::{ConfigHelper, TierName};
use crate::handlers::{Handler, MemoryHandler};
use crate::metrics::{
    CounterRegistry, FacadeMetrics, FanOutMetrics, MetricsSink, init_prometheus,
    render_prometheus,
};
use crate::orca::{L1L2Orca, handle_request};
use crate::responder::{RecordingResponder, Responder, Response};

// =============================================================================
// Arguments
// =============================================================================

/// Arguments for the replay command.
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// The script itself. Read from --input-file or stdin when absent.
    pub script: Option<String>,

    #[command(flatten)]
    pub input: InputSource,

    /// Print the non-zero counters after the last reply.
    #[arg(long)]
    pub counters: bool,

    /// Print every counter in Prometheus text format after the last reply.
    #[arg(long)]
    pub prometheus: bool,

    #[command(flatten)]
    pub output: OutputSink,
}

impl ReplayArgs {
    pub async fn run(self, helper: &ConfigHelper, global: &GlobalArgs) -> Result<()> {
        let script = self.input.read(self.script.as_deref()).await?;
        let requests = parse_script(&script)?;

        if self.prometheus {
            init_prometheus();
        }

        let replay = Replay::new(helper);
        let responses = replay.run(requests).await?;

        let mut lines = Vec::with_capacity(responses.len());
        for response in &responses {
            lines.push(if global.json {
                serde_json::to_string(response)?
            } else {
                response.to_string()
            });
        }

        if self.counters {
            let counters = replay.metrics.snapshot();
            if global.json {
                lines.push(serde_json::to_string(&counters)?);
            } else {
                lines.extend(
                    counters
                        .iter()
                        .map(|(name, value)| format!("{} {}", name, value)),
                );
            }
        }

        if self.prometheus {
            if let Some(rendered) = render_prometheus() {
                lines.push(rendered.trim_end().to_string());
            }
        }

        self.output.write_lines(&lines).await?;
        Ok(())
    }
}

// =============================================================================
// Replay
// =============================================================================

/// An orchestrator over two in-memory tiers that records what it replies.
///
/// Counters go to the `metrics` facade and to a local registry for the
/// `--counters` summary.
struct Replay {
    orca: L1L2Orca,
    responder: Arc<RecordingResponder>,
    metrics: Arc<CounterRegistry>,
}

impl Replay {
    fn new(helper: &ConfigHelper) -> Self {
        let l1 = MemoryHandler::with_config(helper.memory_handler_config(TierName::L1));
        let l2 = MemoryHandler::with_config(helper.memory_handler_config(TierName::L2));
        let responder = Arc::new(RecordingResponder::new());
        let metrics = Arc::new(CounterRegistry::new());
        let sink = FanOutMetrics::new(vec![
            Arc::new(FacadeMetrics) as Arc<dyn MetricsSink>,
            Arc::clone(&metrics) as Arc<dyn MetricsSink>,
        ]);
        let orca = L1L2Orca::new(
            Arc::new(l1) as Arc<dyn Handler>,
            Arc::new(l2) as Arc<dyn Handler>,
            Arc::clone(&responder) as Arc<dyn Responder>,
            Arc::new(sink),
        );
        Self {
            orca,
            responder,
            metrics,
        }
    }

    /// Serve each request in order and return the replies a client would see.
    ///
    /// A quit ends the replay, like a closed connection.
    async fn run(&self, requests: Vec<Request>) -> Result<Vec<Response>> {
        for req in requests {
            let is_quit = matches!(req, Request::Quit(_));
            handle_request(&self.orca, req).await?;
            if is_quit {
                debug!("quit received, skipping the rest of the script");
                break;
            }
        }

        Ok(self
            .responder
            .take()
            .into_iter()
            .filter(|r| !r.is_suppressed())
            .collect())
    }
}

// =============================================================================
// Script Parsing
// =============================================================================

/// Parse every request in a script.
fn parse_script(script: &str) -> Result<Vec<Request>> {
    let mut requests = Vec::new();
    for (ix, text) in script.lines().enumerate() {
        let line = u32::try_from(ix + 1).map_err(|_| CliError::Script {
            line: u32::MAX,
            message: "script too long".to_string(),
        })?;
        if let Some(req) = parse_line(line, text)? {
            requests.push(req);
        }
    }
    Ok(requests)
}

fn script_error(line: u32, message: impl Into<String>) -> CliError {
    CliError::Script {
        line,
        message: message.into(),
    }
}

/// Parse one script line. Returns `None` for blank lines and comments.
fn parse_line(line: u32, text: &str) -> Result<Option<Request>> {
    let text = text.trim();
    if text.is_empty() || text.starts_with('#') {
        return Ok(None);
    }

    let mut words: Vec<&str> = text.split_whitespace().collect();
    let command = words.remove(0);
    let opaque: Opaque = line;

    let req = match command {
        "set" => Request::Set(parse_store(line, &words)?),
        "add" => Request::Add(parse_store(line, &words)?),
        "replace" => Request::Replace(parse_store(line, &words)?),
        "delete" => {
            let [key] = exact::<1>(line, command, &words)?;
            Request::Delete(DeleteRequest {
                key: to_bytes(key),
                opaque,
                quiet: false,
            })
        }
        "touch" => {
            let [key, exptime] = exact::<2>(line, command, &words)?;
            Request::Touch(TouchRequest {
                key: to_bytes(key),
                exptime: parse_u32(line, "exptime", exptime)?,
                opaque,
                quiet: false,
            })
        }
        "get" => {
            if words.is_empty() {
                return Err(script_error(line, "get needs at least one key"));
            }
            Request::Get(GetRequest {
                opaques: vec![opaque; words.len()],
                noop_opaque: opaque,
                ..GetRequest::for_keys(words.iter().map(|w| to_bytes(w)))
            })
        }
        "gat" => {
            let [key, exptime] = exact::<2>(line, command, &words)?;
            Request::Gat(GatRequest {
                key: to_bytes(key),
                exptime: parse_u32(line, "exptime", exptime)?,
                opaque,
                quiet: false,
            })
        }
        "noop" => {
            exact::<0>(line, command, &words)?;
            Request::Noop(NoopRequest { opaque })
        }
        "quit" => {
            let quiet = take_quiet(&mut words);
            exact::<0>(line, command, &words)?;
            Request::Quit(QuitRequest { opaque, quiet })
        }
        "version" => {
            exact::<0>(line, command, &words)?;
            Request::Version(VersionRequest { opaque })
        }
        _ => Request::Unknown { opaque },
    };
    Ok(Some(req))
}

/// `<key> <value> [flags] [exptime] [quiet]`
fn parse_store(line: u32, words: &[&str]) -> Result<SetRequest> {
    let mut words = words.to_vec();
    let quiet = take_quiet(&mut words);

    let (key, data, rest) = match words.as_slice() {
        [key, data, rest @ ..] if rest.len() <= 2 => (*key, *data, rest),
        _ => {
            return Err(script_error(
                line,
                "expected <key> <value> [flags] [exptime] [quiet]",
            ));
        }
    };

    let flags = rest
        .first()
        .map(|w| parse_u32(line, "flags", w))
        .transpose()?
        .unwrap_or(0);
    let exptime = rest
        .get(1)
        .map(|w| parse_u32(line, "exptime", w))
        .transpose()?
        .unwrap_or(0);

    Ok(SetRequest {
        key: to_bytes(key),
        data: to_bytes(data),
        flags,
        exptime,
        opaque: line,
        quiet,
    })
}

/// Remove a trailing `quiet` word, reporting whether there was one.
fn take_quiet(words: &mut Vec<&str>) -> bool {
    if words.last() == Some(&"quiet") {
        words.pop();
        true
    } else {
        false
    }
}

fn exact<'a, const N: usize>(line: u32, command: &str, words: &[&'a str]) -> Result<[&'a str; N]> {
    <[&str; N]>::try_from(words).map_err(|_| {
        script_error(
            line,
            format!("{} takes {} argument(s), got {}", command, N, words.len()),
        )
    })
}

fn parse_u32(line: u32, what: &str, word: &str) -> Result<u32> {
    word.parse()
        .map_err(|_| script_error(line, format!("invalid {} '{}'", what, word)))
}

fn to_bytes(word: &str) -> Bytes {
    Bytes::copy_from_slice(word.as_bytes())
}
