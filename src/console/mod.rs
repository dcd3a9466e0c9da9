//! Console front-end — the read/answer loop.
//!
//! Reads one line per turn, skips blank lines, hands the rest to the
//! orchestrator and renders the answer. Turn errors are printed and the
//! session carries on; EOF ends it.

pub mod render;

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::warn;

use crate::agent::Orchestrator;
use render::Renderer;

pub const BANNER: &str = "Documentation assistant started...";
const USER_PROMPT: &str = "User: ";
const ASSISTANT_PREFIX: &str = "Assistant: ";

/// Run the session until `input` is exhausted.
pub async fn run<R, W>(
    orchestrator: &mut Orchestrator,
    input: R,
    out: &mut W,
    renderer: Renderer,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "{BANNER}")?;
    let mut lines = input.lines();

    loop {
        write!(out, "{USER_PROMPT}")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            return Ok(());
        };
        if line.trim().is_empty() {
            continue;
        }

        match orchestrator.run_turn(&line).await {
            Ok(Some(answer)) => {
                write!(out, "{ASSISTANT_PREFIX}")?;
                renderer.render(&answer, out)?;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(unimplemented = e.is_unimplemented(), "turn aborted: {e}");
                renderer.error(&e.to_string(), out)?;
            }
        }
    }
}
