//! Single-writer mailbox around a [`RuleGovernor`].
//!
//! A dedicated worker thread owns the governor; callers on any thread submit
//! commands through a bounded channel and wait on a one-shot reply. Every
//! read-modify-write of the rule set therefore runs on one thread, in
//! submission order.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use serde::{Deserialize, Serialize};

use crate::error::ExecutionError;
use crate::governance::governor::{GovernanceOutcome, GovernorStats, RuleGovernor};
use crate::rule::{Rule, RuleSummary};

/// Mailbox configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailboxConfig {
    /// Maximum queued commands.
    pub queue_capacity: usize,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self { queue_capacity: 256 }
    }
}

enum Command {
    Process {
        rule: Box<Rule>,
        reply: Sender<GovernanceOutcome>,
    },
    Stats {
        reply: Sender<GovernorStats>,
    },
    Summaries {
        reply: Sender<Vec<RuleSummary>>,
    },
    RecordApplication {
        rule_id: String,
        success: bool,
    },

    #[cfg(test)]
    Sleep {
        duration: Duration,
        reply: Sender<()>,
    },
}

/// Pending reply to a submitted candidate.
pub struct PendingOutcome {
    rx: Receiver<GovernanceOutcome>,
}

impl PendingOutcome {
    /// Waits for the governor's decision.
    pub fn wait(self) -> Result<GovernanceOutcome, ExecutionError> {
        self.rx.recv().map_err(|_| ExecutionError::Disconnected)
    }

    /// Waits at most `timeout`.
    pub fn wait_timeout(self, timeout: Duration) -> Result<GovernanceOutcome, ExecutionError> {
        self.rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => ExecutionError::Timeout {
                duration_ms: timeout.as_millis().min(u128::from(u64::MAX)) as u64,
            },
            RecvTimeoutError::Disconnected => ExecutionError::Disconnected,
        })
    }
}

/// Owns a governor on a worker thread.
pub struct GovernorMailbox {
    tx: Option<Sender<Command>>,
    worker: Option<JoinHandle<RuleGovernor>>,
    queue_capacity: usize,
}

impl GovernorMailbox {
    /// Moves `governor` onto a new worker thread.
    pub fn start(governor: RuleGovernor, config: MailboxConfig) -> Result<Self, ExecutionError> {
        let queue_capacity = config.queue_capacity.max(1);
        let (tx, rx) = bounded::<Command>(queue_capacity);

        let worker = thread::Builder::new()
            .name("kyrolearn-governor".to_string())
            .spawn(move || run(governor, &rx))
            .map_err(|err| ExecutionError::WorkerSpawn {
                message: err.to_string(),
            })?;

        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
            queue_capacity,
        })
    }

    fn try_submit(&self, command: Command) -> Result<(), ExecutionError> {
        let tx = self.tx.as_ref().ok_or(ExecutionError::Disconnected)?;
        match tx.try_send(command) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(ExecutionError::MailboxFull {
                capacity: self.queue_capacity,
            }),
            Err(TrySendError::Disconnected(_)) => Err(ExecutionError::Disconnected),
        }
    }

    /// Queues a candidate without waiting for the decision.
    pub fn submit(&self, rule: Rule) -> Result<PendingOutcome, ExecutionError> {
        let (reply, rx) = bounded(1);
        self.try_submit(Command::Process {
            rule: Box::new(rule),
            reply,
        })?;
        Ok(PendingOutcome { rx })
    }

    /// Governs a candidate and waits for the decision.
    pub fn process(&self, rule: Rule) -> Result<GovernanceOutcome, ExecutionError> {
        self.submit(rule)?.wait()
    }

    /// Governor counters.
    pub fn stats(&self) -> Result<GovernorStats, ExecutionError> {
        let (reply, rx) = bounded(1);
        self.try_submit(Command::Stats { reply })?;
        rx.recv().map_err(|_| ExecutionError::Disconnected)
    }

    /// Serializable snapshot of the rule set.
    pub fn rule_summaries(&self) -> Result<Vec<RuleSummary>, ExecutionError> {
        let (reply, rx) = bounded(1);
        self.try_submit(Command::Summaries { reply })?;
        rx.recv().map_err(|_| ExecutionError::Disconnected)
    }

    /// Feeds an application outcome into the performance history.
    pub fn record_application(&self, rule_id: impl Into<String>, success: bool) -> Result<(), ExecutionError> {
        self.try_submit(Command::RecordApplication {
            rule_id: rule_id.into(),
            success,
        })
    }

    /// Drains queued commands, stops the worker and returns the governor.
    pub fn shutdown(mut self) -> Result<RuleGovernor, ExecutionError> {
        self.tx.take();
        let worker = self.worker.take().ok_or(ExecutionError::Disconnected)?;
        worker.join().map_err(|_| ExecutionError::Disconnected)
    }

    #[cfg(test)]
    fn submit_sleep(&self, duration: Duration) -> Result<Receiver<()>, ExecutionError> {
        let (reply, rx) = bounded(1);
        self.try_submit(Command::Sleep { duration, reply })?;
        Ok(rx)
    }
}

impl Drop for GovernorMailbox {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain and exit.
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run(mut governor: RuleGovernor, rx: &Receiver<Command>) -> RuleGovernor {
    for command in rx {
        match command {
            Command::Process { rule, reply } => {
                let _ = reply.send(governor.process_candidate_rule(*rule));
            }
            Command::Stats { reply } => {
                let _ = reply.send(governor.stats());
            }
            Command::Summaries { reply } => {
                let _ = reply.send(governor.rule_summaries());
            }
            Command::RecordApplication { rule_id, success } => {
                governor.record_application(&rule_id, success);
            }

            #[cfg(test)]
            Command::Sleep { duration, reply } => {
                thread::sleep(duration);
                let _ = reply.send(());
            }
        }
    }
    tracing::debug!("governor mailbox closed");
    governor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::governance::governor::GovernorConfig;
    use crate::rule::{condition, Applicability, IdentityTransform};
    use std::sync::Arc;

    fn rule(id: &str, priority: i32) -> Rule {
        Rule::new(
            id,
            condition(|_, _, _| Ok(Applicability::Applicable)),
            Arc::new(IdentityTransform),
            Context::algebra(),
            priority,
        )
    }

    #[test]
    fn test_process_and_shutdown_returns_governor() {
        let mailbox = GovernorMailbox::start(RuleGovernor::default(), MailboxConfig::default()).unwrap();
        assert!(mailbox.process(rule("first", 1)).unwrap().is_accepted());
        mailbox.record_application("first", true).unwrap();
        assert_eq!(mailbox.stats().unwrap().rules_accepted, 1);
        assert_eq!(mailbox.rule_summaries().unwrap()[0].id, "first");

        let governor = mailbox.shutdown().unwrap();
        assert_eq!(governor.rules().len(), 1);
        assert_eq!(
            governor.state().scorer().performance_of("first").map(|p| p.total),
            Some(1)
        );
    }

    #[test]
    fn test_concurrent_submissions_are_serialized() {
        let mailbox = GovernorMailbox::start(
            RuleGovernor::new(GovernorConfig::default()),
            MailboxConfig { queue_capacity: 64 },
        )
        .unwrap();

        thread::scope(|scope| {
            for t in 0..4 {
                let mailbox = &mailbox;
                scope.spawn(move || {
                    for i in 0..8 {
                        let id = format!("rule_{t}_{i}");
                        // Distinct priorities keep the candidates from overlapping.
                        let outcome = mailbox.process(rule(&id, t * 100 + i)).unwrap();
                        assert!(outcome.is_accepted());
                    }
                });
            }
        });

        let governor = mailbox.shutdown().unwrap();
        assert_eq!(governor.rules().len(), 32);
        assert_eq!(governor.stats().rules_processed, 32);
    }

    #[test]
    fn test_full_mailbox_is_reported() {
        let mailbox = GovernorMailbox::start(RuleGovernor::default(), MailboxConfig { queue_capacity: 1 }).unwrap();

        let sleeping = mailbox.submit_sleep(Duration::from_millis(200)).unwrap();
        // Wait until the worker has picked the sleep job up, then fill the queue.
        thread::sleep(Duration::from_millis(50));
        let queued = mailbox.submit(rule("queued", 1)).unwrap();
        let err = mailbox.submit(rule("overflow", 2)).err().unwrap();
        assert!(matches!(err, ExecutionError::MailboxFull { capacity: 1 }));

        sleeping.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(queued.wait().unwrap().is_accepted());
    }

    #[test]
    fn test_wait_reports_disconnected_when_reply_dropped() {
        let (tx, rx) = bounded::<GovernanceOutcome>(1);
        drop(tx);
        let pending = PendingOutcome { rx };
        assert!(matches!(
            pending.wait_timeout(Duration::from_millis(10)),
            Err(ExecutionError::Disconnected)
        ));
    }
}
