// Terminal chat surface: one line in, one reply out.

use std::io::{BufRead, Write};

use anyhow::Result;
use tracing::info;

use crate::constants::{SEARCHING_STATUS, SEARCH_USED_NOTICE, SEED_ACKNOWLEDGEMENT};
use crate::conversation::ConversationLog;
use crate::orchestrator::{Orchestrator, TurnOutcome};

/// Renders one outcome the way both the REPL and `ask` print it.
pub fn render_outcome(outcome: &TurnOutcome) -> String {
    match outcome {
        TurnOutcome::Answered(reply) | TurnOutcome::SearchFailed { reply, .. } => {
            if reply.searched_web {
                format!("[{}]\n{}", SEARCH_USED_NOTICE, reply.text)
            } else {
                reply.text.clone()
            }
        }
        other => other.error_message().unwrap_or_default(),
    }
}

/// Runs a chat session until EOF, `exit` or `quit`. Returns the session log.
pub async fn run_chat<R: BufRead, W: Write>(
    orchestrator: &Orchestrator,
    mut input: R,
    mut output: W,
) -> Result<ConversationLog> {
    info!("Starting terminal chat session");
    let mut log = ConversationLog::new();

    writeln!(output, "{}", SEED_ACKNOWLEDGEMENT)?;
    loop {
        write!(output, "> ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        writeln!(output, "Gamkers is thinking...")?;
        let search = orchestrator.needs_search(line).await;
        if search {
            writeln!(output, "{}", SEARCHING_STATUS)?;
        }
        let outcome = orchestrator.exchange_decided(&mut log, line, search).await;
        writeln!(output, "{}\n", render_outcome(&outcome))?;
    }

    info!(turns = log.len(), "Chat session finished");
    Ok(log)
}
