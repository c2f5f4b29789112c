//! Bounded-concurrency worker pool for field extraction
//!
//! Tasks wait in a queue ordered by priority (highest first, insertion order
//! among equals). Whenever a slot is free the head of the queue is spawned
//! onto the tokio runtime; each finished task frees its slot and pulls the
//! next one, so the pool drains continuously instead of in fixed batches.
//!
//! The pool enforces no timeout of its own. A running task ends when its LLM
//! call ends.

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::parser::parse_response;
use crate::prompt::PromptBuilder;
use crate::types::{ExtractionResult, ExtractionTask, PoolStatus};
use metacanvas_domain::traits::LlmProvider;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

struct QueuedTask {
    task: ExtractionTask,
    reply: oneshot::Sender<ExtractionResult>,
}

struct PoolState {
    queue: Vec<QueuedTask>,
    active: usize,
    max_workers: usize,
}

struct PoolInner<L> {
    llm: Arc<L>,
    found_confidence: f64,
    state: Mutex<PoolState>,
}

/// Worker pool running one LLM call per extraction task
///
/// Cloning the pool yields another handle to the same queue and slots.
/// Methods that may start work ([`submit`](Self::submit) and
/// [`set_max_workers`](Self::set_max_workers)) must be called from within a
/// tokio runtime.
pub struct WorkerPool<L> {
    inner: Arc<PoolInner<L>>,
}

impl<L> Clone for WorkerPool<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L> PoolInner<L> {
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<L> WorkerPool<L>
where
    L: LlmProvider + 'static,
{
    /// Create a pool from a shared LLM provider
    pub fn new(llm: Arc<L>, config: &ExtractorConfig) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                llm,
                found_confidence: config.found_confidence,
                state: Mutex::new(PoolState {
                    queue: Vec::new(),
                    active: 0,
                    max_workers: config.max_workers.max(1),
                }),
            }),
        }
    }

    /// Queue a task and return a future for its result
    ///
    /// The task is queued immediately, before the returned future is polled.
    /// The future resolves once a worker has processed the task. LLM failures
    /// resolve to a result with `error` set; the future itself only fails if
    /// the task is discarded by [`clear_queue`](Self::clear_queue) or its
    /// worker panics.
    pub fn submit(
        &self,
        task: ExtractionTask,
    ) -> impl Future<Output = Result<ExtractionResult, ExtractorError>> + Send + 'static {
        let field_id = task.field.id.clone();
        let (reply, rx) = oneshot::channel();

        {
            let mut state = self.inner.lock();
            let position = state
                .queue
                .partition_point(|queued| queued.task.priority >= task.priority);
            debug!(
                "Queued {} (priority {}) at position {}",
                field_id, task.priority, position
            );
            state.queue.insert(position, QueuedTask { task, reply });
        }

        advance(&self.inner);

        async move { rx.await.map_err(|_| ExtractorError::TaskDropped(field_id)) }
    }

    /// Change the worker cap; raising it starts queued tasks right away
    pub fn set_max_workers(&self, max_workers: usize) {
        self.inner.lock().max_workers = max_workers.max(1);
        info!("Worker pool cap set to {}", max_workers.max(1));
        advance(&self.inner);
    }

    /// Current worker cap
    pub fn max_workers(&self) -> usize {
        self.inner.lock().max_workers
    }

    /// Active workers and queue length
    pub fn status(&self) -> PoolStatus {
        let state = self.inner.lock();
        PoolStatus {
            active_workers: state.active,
            queue_length: state.queue.len(),
        }
    }

    /// Discard every task that has not started yet
    ///
    /// Running tasks are unaffected. Futures of discarded tasks resolve to
    /// [`ExtractorError::TaskDropped`]. Returns the number of discarded tasks.
    pub fn clear_queue(&self) -> usize {
        let dropped = std::mem::take(&mut self.inner.lock().queue);
        if !dropped.is_empty() {
            info!("Cleared {} queued extraction tasks", dropped.len());
        }
        dropped.len()
    }
}

/// Start queued tasks while slots are free
fn advance<L>(inner: &Arc<PoolInner<L>>)
where
    L: LlmProvider + 'static,
{
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        warn!("Worker pool advanced outside a tokio runtime; queued tasks stay pending");
        return;
    };

    loop {
        let next = {
            let mut state = inner.lock();
            if state.active >= state.max_workers || state.queue.is_empty() {
                return;
            }
            state.active += 1;
            state.queue.remove(0)
        };

        let worker = Arc::clone(inner);
        runtime.spawn(async move {
            let slot = Slot(Arc::clone(&worker));
            let result = worker.extract(&next.task).await;
            drop(slot);
            if next.reply.send(result).is_err() {
                debug!("Result for {} discarded: caller went away", next.task.field_id());
            }
        });
    }
}

/// Holds one worker slot; releasing it pulls the next task
///
/// Released on drop, so a panicking extraction still frees its slot.
struct Slot<L: LlmProvider + 'static>(Arc<PoolInner<L>>);

impl<L: LlmProvider + 'static> Drop for Slot<L> {
    fn drop(&mut self) {
        {
            let mut state = self.0.lock();
            state.active = state.active.saturating_sub(1);
        }
        advance(&self.0);
    }
}

impl<L> PoolInner<L>
where
    L: LlmProvider,
{
    async fn extract(&self, task: &ExtractionTask) -> ExtractionResult {
        let field = &task.field;
        let prompt = PromptBuilder::new(field, &task.source_text).build();

        debug!("Extracting field: {} ({})", field.label, field.id);

        match self.llm.generate(&prompt).await {
            Ok(response) => {
                let value = parse_response(response.trim(), field);
                match &value {
                    Some(v) => debug!("Extracted {}: {}", field.id, v),
                    None => debug!("No value found for {}", field.id),
                }
                ExtractionResult::found(field.id.clone(), value, self.found_confidence)
            }
            Err(e) => {
                warn!("Extraction error for field {} ({}): {}", field.id, field.label, e);
                ExtractionResult::failed(field.id.clone(), e.to_string())
            }
        }
    }
}
