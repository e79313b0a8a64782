//! Console test triggers.
//!
//! Reads stdin on a dedicated OS thread. An empty line sends the stock test
//! donation; `<amount> [donor] [comment...]` sends a custom one.

use jarcast_core::events::{ManualTrigger, ManualTriggerSender};
use std::io::{self, BufRead};
use std::thread::{self, JoinHandle};

/// Start the stdin listener thread.
///
/// The thread ends at EOF or once the trigger channel closes. It is never
/// joined: a blocking stdin read cannot be interrupted.
pub fn spawn_console_listener(triggers: ManualTriggerSender) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("console-triggers".into())
        .spawn(move || {
            tracing::info!("Console ready: press Enter for a test donation, or type `<amount> [donor] [comment]`");
            run_console(io::stdin().lock(), &triggers);
            tracing::debug!("Console listener stopped");
        })
}

fn run_console(input: impl BufRead, triggers: &ManualTriggerSender) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read console input");
                return;
            }
        };

        match ManualTrigger::parse_command(&line) {
            Ok(trigger) => {
                if triggers.blocking_send(trigger).is_err() {
                    return;
                }
            }
            Err(e) => tracing::warn!(%line, error = %e, "Ignoring console command"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jarcast_core::events::manual_trigger_channel;

    #[test]
    fn test_lines_become_triggers() {
        let (tx, mut rx) = manual_trigger_channel();
        let input = "\n50.25 Petro thanks for the stream\nabc\n-5\n10\n";

        run_console(input.as_bytes(), &tx);

        let default = rx.try_recv().unwrap();
        assert_eq!(default, ManualTrigger::default());

        let custom = rx.try_recv().unwrap();
        assert_eq!(custom.amount, 5_025);
        assert_eq!(custom.donor_name.as_deref(), Some("Petro"));
        assert_eq!(custom.comment.as_deref(), Some("thanks for the stream"));

        let bare = rx.try_recv().unwrap();
        assert_eq!(bare.amount, 1_000);
        assert_eq!(bare.donor_name, None);

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_stops_when_channel_closes() {
        let (tx, rx) = manual_trigger_channel();
        drop(rx);
        run_console("\n\n".as_bytes(), &tx);
    }
}
