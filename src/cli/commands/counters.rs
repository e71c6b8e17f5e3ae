//! The counters command: list the orchestrator's counter names.

use clap::Args;

use crate::cli::{GlobalArgs, OutputSink, Result};
use crate::metrics::names;

/// Arguments for the counters command.
#[derive(Args, Debug)]
pub struct CountersArgs {
    /// Only list counters whose name starts with this prefix.
    pub prefix: Option<String>,

    #[command(flatten)]
    pub output: OutputSink,
}

impl CountersArgs {
    pub async fn run(self, global: &GlobalArgs) -> Result<()> {
        let matching = matching_counters(self.prefix.as_deref());
        if global.json {
            self.output
                .write_str(&serde_json::to_string_pretty(&matching)?)
                .await?;
        } else {
            let lines: Vec<String> = matching.iter().map(|name| name.to_string()).collect();
            self.output.write_lines(&lines).await?;
        }
        Ok(())
    }
}

fn matching_counters(prefix: Option<&str>) -> Vec<&'static str> {
    let prefix = prefix.unwrap_or("");
    names::ALL
        .iter()
        .copied()
        .filter(|name| name.starts_with(prefix))
        .collect()
}
