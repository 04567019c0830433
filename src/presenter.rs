//! Terminal presenter
//!
//! Renders the orchestrator's published state as plain lines: one per status
//! change and one per elapsed-time tick.

use std::io::Write;
use tokio::sync::watch;

use crate::job::JobSnapshot;

pub fn status_line(snapshot: &JobSnapshot) -> String {
    format!("Status: {}", snapshot.message)
}

pub fn elapsed_line(secs: u64) -> String {
    format!("Processing time: {} seconds", secs)
}

/// Write lines to `out` until a terminal status is published or the job side
/// goes away, then hand the writer back.
///
/// Pending ticks are written before a status change seen at the same time.
pub async fn present<W: Write>(
    mut out: W,
    mut snapshots: watch::Receiver<JobSnapshot>,
    mut elapsed: watch::Receiver<u64>,
) -> W {
    let mut ticking = true;
    loop {
        tokio::select! {
            biased;
            changed = elapsed.changed(), if ticking => {
                if changed.is_err() {
                    ticking = false;
                    continue;
                }
                let secs = *elapsed.borrow_and_update();
                if let Err(e) = writeln!(out, "{}", elapsed_line(secs)) {
                    tracing::warn!("Presenter write failed: {}", e);
                }
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if let Err(e) = writeln!(out, "{}", status_line(&snapshot)) {
                    tracing::warn!("Presenter write failed: {}", e);
                }
                if snapshot.status.is_terminal() {
                    break;
                }
            }
        }
    }
    let _ = out.flush();
    out
}

/// Run the presenter against stdout on its own task
pub fn spawn(
    snapshots: watch::Receiver<JobSnapshot>,
    elapsed: watch::Receiver<u64>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        present(std::io::stdout(), snapshots, elapsed).await;
    })
}
