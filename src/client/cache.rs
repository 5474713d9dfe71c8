//! Client cache layer.
//!
//! A single actor task owns the ordered task list. Everything else talks to
//! it through a cloneable [`CacheHandle`], so writes are serialized without
//! locks and the ordering between "cancel refreshes" and "write optimistic
//! value" is the order in which the actor receives the commands.
//!
//! Background refreshes tag their result with the epoch current when they
//! started. [`CacheHandle::cancel_in_flight_reads`] bumps the epoch, and the
//! actor drops any refresh result carrying an older one, so a slow refresh can
//! never overwrite an optimistic write with stale data.
//!
//! The actor also counts optimistic mutations between
//! [`CacheHandle::begin_mutation`] and [`CacheHandle::end_mutation`]. While
//! any is pending, refresh results are dropped too: the server cannot have
//! seen a mutation it has not answered yet.

use super::{ClientError, ClientResult};
use crate::types::Task;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, trace};

/// Command channel depth. Senders wait when the actor falls behind.
const COMMAND_BUFFER: usize = 64;

type ModifyFn = Box<dyn FnOnce(&[Task]) -> Vec<Task> + Send>;

enum CacheCommand {
    Read {
        reply: oneshot::Sender<Vec<Task>>,
    },
    Write {
        tasks: Vec<Task>,
        reply: oneshot::Sender<()>,
    },
    Modify {
        apply: ModifyFn,
        reply: oneshot::Sender<()>,
    },
    CancelRefreshes {
        reply: oneshot::Sender<u64>,
    },
    BeginMutation {
        reply: oneshot::Sender<()>,
    },
    EndMutation {
        reply: oneshot::Sender<usize>,
    },
    BeginRefresh {
        reply: oneshot::Sender<u64>,
    },
    ApplyRefresh {
        epoch: u64,
        tasks: Vec<Task>,
        reply: oneshot::Sender<bool>,
    },
}

/// Drop repeated ids, keeping the first occurrence.
fn dedupe(tasks: Vec<Task>) -> Vec<Task> {
    let mut seen = HashSet::with_capacity(tasks.len());
    tasks.into_iter().filter(|t| seen.insert(t.id)).collect()
}

struct CacheActor {
    tasks: Vec<Task>,
    epoch: u64,
    pending_mutations: usize,
    publisher: Arc<watch::Sender<Arc<Vec<Task>>>>,
    rx: mpsc::Receiver<CacheCommand>,
}

impl CacheActor {
    async fn run(mut self) {
        while let Some(command) = self.rx.recv().await {
            self.handle(command);
        }
        debug!("Task cache actor stopped");
    }

    fn handle(&mut self, command: CacheCommand) {
        match command {
            CacheCommand::Read { reply } => {
                let _ = reply.send(self.tasks.clone());
            }
            CacheCommand::Write { tasks, reply } => {
                self.replace(tasks);
                let _ = reply.send(());
            }
            CacheCommand::Modify { apply, reply } => {
                let next = apply(&self.tasks);
                self.replace(next);
                let _ = reply.send(());
            }
            CacheCommand::CancelRefreshes { reply } => {
                self.epoch += 1;
                trace!(epoch = self.epoch, "Refreshes cancelled");
                let _ = reply.send(self.epoch);
            }
            CacheCommand::BeginMutation { reply } => {
                self.epoch += 1;
                self.pending_mutations += 1;
                trace!(
                    epoch = self.epoch,
                    pending = self.pending_mutations,
                    "Mutation started"
                );
                let _ = reply.send(());
            }
            CacheCommand::EndMutation { reply } => {
                self.pending_mutations = self.pending_mutations.saturating_sub(1);
                trace!(pending = self.pending_mutations, "Mutation settled");
                let _ = reply.send(self.pending_mutations);
            }
            CacheCommand::BeginRefresh { reply } => {
                let _ = reply.send(self.epoch);
            }
            CacheCommand::ApplyRefresh {
                epoch,
                tasks,
                reply,
            } => {
                let current = epoch == self.epoch && self.pending_mutations == 0;
                if current {
                    self.replace(tasks);
                } else {
                    debug!(
                        refresh_epoch = epoch,
                        current_epoch = self.epoch,
                        pending = self.pending_mutations,
                        "Discarding stale refresh"
                    );
                }
                let _ = reply.send(current);
            }
        }
    }

    fn replace(&mut self, tasks: Vec<Task>) {
        self.tasks = dedupe(tasks);
        self.publisher.send_replace(Arc::new(self.tasks.clone()));
    }
}

/// Constructor for the cache actor.
pub struct TaskCache;

impl TaskCache {
    /// Spawn the cache actor on the current tokio runtime.
    pub fn spawn(initial: Vec<Task>) -> CacheHandle {
        let initial = dedupe(initial);
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let (publisher, _) = watch::channel(Arc::new(initial.clone()));
        let publisher = Arc::new(publisher);

        let actor = CacheActor {
            tasks: initial,
            epoch: 0,
            pending_mutations: 0,
            publisher: Arc::clone(&publisher),
            rx,
        };
        tokio::spawn(actor.run());

        CacheHandle { tx, publisher }
    }
}

/// Cloneable handle to the cache actor.
#[derive(Clone)]
pub struct CacheHandle {
    tx: mpsc::Sender<CacheCommand>,
    publisher: Arc<watch::Sender<Arc<Vec<Task>>>>,
}

impl CacheHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> CacheCommand,
    ) -> ClientResult<T> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| ClientError::CacheClosed)?;
        response.await.map_err(|_| ClientError::CacheClosed)
    }

    /// Current ordered list, in command order with respect to writes.
    pub async fn read(&self) -> ClientResult<Vec<Task>> {
        self.request(|reply| CacheCommand::Read { reply }).await
    }

    /// Atomically replace the list.
    pub async fn write(&self, tasks: Vec<Task>) -> ClientResult<()> {
        self.request(|reply| CacheCommand::Write { tasks, reply })
            .await
    }

    /// Replace the list with `f` applied to it, in one step with respect to
    /// every other command. Returns what `f` returned alongside the new list.
    pub async fn modify<R, F>(&self, f: F) -> ClientResult<R>
    where
        F: FnOnce(&[Task]) -> (Vec<Task>, R) + Send + 'static,
        R: Send + 'static,
    {
        let (out_tx, out_rx) = oneshot::channel();
        let apply: ModifyFn = Box::new(move |tasks: &[Task]| {
            let (next, out) = f(tasks);
            let _ = out_tx.send(out);
            next
        });
        self.request(|reply| CacheCommand::Modify { apply, reply })
            .await?;
        out_rx.await.map_err(|_| ClientError::CacheClosed)
    }

    /// Mark an optimistic mutation as pending and invalidate every refresh
    /// started before this call.
    pub async fn begin_mutation(&self) -> ClientResult<()> {
        self.request(|reply| CacheCommand::BeginMutation { reply })
            .await
    }

    /// Mark a mutation as settled. Returns how many are still pending.
    pub async fn end_mutation(&self) -> ClientResult<usize> {
        self.request(|reply| CacheCommand::EndMutation { reply })
            .await
    }

    /// Invalidate every refresh started before this call. Returns the new epoch.
    pub async fn cancel_in_flight_reads(&self) -> ClientResult<u64> {
        self.request(|reply| CacheCommand::CancelRefreshes { reply })
            .await
    }

    /// Epoch to tag a refresh with.
    pub async fn begin_refresh(&self) -> ClientResult<u64> {
        self.request(|reply| CacheCommand::BeginRefresh { reply })
            .await
    }

    /// Store a refresh result if no cancel happened since `epoch` was taken
    /// and no mutation is pending. Returns whether the result was applied.
    pub async fn apply_refresh(&self, epoch: u64, tasks: Vec<Task>) -> ClientResult<bool> {
        self.request(|reply| CacheCommand::ApplyRefresh {
            epoch,
            tasks,
            reply,
        })
        .await
    }

    /// Latest published list, without a round trip to the actor.
    pub fn current(&self) -> Arc<Vec<Task>> {
        self.publisher.borrow().clone()
    }

    /// Watch the list. The receiver starts with the current value marked seen.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Task>>> {
        self.publisher.subscribe()
    }
}
