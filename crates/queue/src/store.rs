use chrono::{DateTime, Utc};
use dashmap::DashMap;
use eabridge_core::{Command, CommandStatus, NewCommand};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info};
use uuid::Uuid;

/// Pending-command count for one EA.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueDepth {
    pub ea_id: String,
    pub pending: usize,
}

/// In-memory command queues, one FIFO per EA id.
///
/// Share it behind an `Arc`. Every method is a short critical section on the
/// shard holding the key and never blocks across an `.await`.
#[derive(Debug, Default)]
pub struct QueueStore {
    queues: DashMap<String, VecDeque<Command>>,
}

impl QueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign identity to `command` and append it to the tail of its EA's queue.
    pub fn enqueue(&self, command: NewCommand) -> Command {
        let command = command.into_command();
        self.queues
            .entry(command.ea_id.clone())
            .or_default()
            .push_back(command.clone());

        debug!(
            ea_id = %command.ea_id,
            command_id = %command.id,
            order_type = %command.order_type,
            "Command enqueued"
        );
        command
    }

    /// Pending commands for `ea_id` in FIFO order, without removing them.
    pub fn peek(&self, ea_id: &str) -> Vec<Command> {
        self.queues
            .get(ea_id)
            .map(|queue| queue.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Remove and return every pending command for `ea_id` in FIFO order.
    ///
    /// The whole queue is detached under the key's lock, so an enqueue either
    /// lands in this batch or starts a fresh queue for the next one.
    pub fn drain(&self, ea_id: &str) -> Vec<Command> {
        let Some((_, queue)) = self.queues.remove(ea_id) else {
            return Vec::new();
        };

        let delivered: Vec<Command> = queue
            .into_iter()
            .map(|mut c| {
                c.status = CommandStatus::Delivered;
                c
            })
            .collect();

        if !delivered.is_empty() {
            info!(ea_id = %ea_id, count = delivered.len(), "Commands delivered");
        }
        delivered
    }

    /// Remove the listed commands from `ea_id`'s queue.
    ///
    /// Returns the ids that were pending and are now delivered, in queue order.
    /// Ids that are unknown or already consumed are skipped.
    pub fn acknowledge(&self, ea_id: &str, command_ids: &[Uuid]) -> Vec<Uuid> {
        let wanted: HashSet<Uuid> = command_ids.iter().copied().collect();
        let mut acknowledged = Vec::new();

        {
            let Some(mut queue) = self.queues.get_mut(ea_id) else {
                return acknowledged;
            };
            queue.retain(|c| {
                if wanted.contains(&c.id) {
                    acknowledged.push(c.id);
                    false
                } else {
                    true
                }
            });
        }
        self.queues.remove_if(ea_id, |_, queue| queue.is_empty());

        if !acknowledged.is_empty() {
            info!(ea_id = %ea_id, count = acknowledged.len(), "Commands acknowledged");
        }
        acknowledged
    }

    /// Drop every command created before `cutoff`, across all EAs.
    ///
    /// Returns the dropped commands marked as expired.
    pub fn expire_older_than(&self, cutoff: DateTime<Utc>) -> Vec<Command> {
        let mut expired = Vec::new();

        self.queues.retain(|_, queue| {
            // Timestamps are taken before the push, so concurrent enqueues can
            // land slightly out of order; scan the whole queue.
            queue.retain(|c| {
                if c.created_at < cutoff {
                    expired.push(c.with_status(CommandStatus::Expired));
                    false
                } else {
                    true
                }
            });
            !queue.is_empty()
        });

        for c in &expired {
            info!(ea_id = %c.ea_id, command_id = %c.id, "Command expired");
        }
        expired
    }

    pub fn pending_count(&self, ea_id: &str) -> usize {
        self.queues.get(ea_id).map(|q| q.len()).unwrap_or(0)
    }

    pub fn total_pending(&self) -> usize {
        self.queues.iter().map(|entry| entry.value().len()).sum()
    }

    /// Per-EA queue depths, sorted by EA id.
    pub fn snapshot(&self) -> Vec<QueueDepth> {
        let mut depths: Vec<QueueDepth> = self
            .queues
            .iter()
            .map(|entry| QueueDepth {
                ea_id: entry.key().clone(),
                pending: entry.value().len(),
            })
            .collect();
        depths.sort_by(|a, b| a.ea_id.cmp(&b.ea_id));
        depths
    }
}
