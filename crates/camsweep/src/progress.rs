//! Spinner that follows the attack orchestrator's state channel.

use std::io::{self, IsTerminal};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use camsweep_core::{AttackState, Phase};

/// Live progress display. Hidden when quiet or stderr is not a terminal.
pub struct Progress {
    bar: ProgressBar,
    follower: Option<JoinHandle<()>>,
}

impl Progress {
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet || !io::stderr().is_terminal() {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {msg} {elapsed:.dim}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };
        Self {
            bar,
            follower: None,
        }
    }

    pub fn message(&self, message: impl Into<String>) {
        self.bar.set_message(message.into());
    }

    /// Mirror orchestrator phase changes onto the spinner until the run ends.
    pub fn follow(&mut self, mut state: watch::Receiver<AttackState>) {
        let bar = self.bar.clone();
        self.follower = Some(tokio::spawn(async move {
            loop {
                let current = *state.borrow_and_update();
                bar.set_message(describe(current));
                if current.phase == Phase::Done || state.changed().await.is_err() {
                    return;
                }
            }
        }));
    }

    pub fn finish(mut self) {
        if let Some(follower) = self.follower.take() {
            follower.abort();
        }
        self.bar.finish_and_clear();
    }
}

fn describe(state: AttackState) -> String {
    match state.phase {
        Phase::Idle => "Preparing attack".into(),
        Phase::Done => format!("Attack finished on {} devices", state.devices),
        phase if state.round > 1 => {
            format!("{phase} on {} devices (second round)", state.devices)
        }
        phase => format!("{phase} on {} devices", state.devices),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_names_phase_and_round() {
        let state = AttackState {
            phase: Phase::RouteDiscovery,
            round: 2,
            devices: 3,
        };
        assert_eq!(describe(state), "Route Discovery on 3 devices (second round)");

        let state = AttackState {
            phase: Phase::CredentialAttack,
            round: 1,
            devices: 1,
        };
        assert_eq!(describe(state), "Credential Attack on 1 devices");
    }
}
