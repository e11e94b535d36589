use crate::config::{ErrorPolicy, RunConfig};
use crate::error::{CompositeError, Result, error_chain};
use crate::pipeline::{
    BatchReport, FileOutcome, ProgressSink, ensure_output_dir, list_entries, log_summary,
    process_file,
};
use futures::future::join_all;
use log::{debug, error, info};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinError;

pub struct FileTask {
    /// Position of the file in directory order.
    pub index: usize,
    pub source: PathBuf,
    pub result_sender: oneshot::Sender<Result<FileOutcome>>,
}

/// What a worker reports about a task before it does any work on it.
pub enum TaskEvent {
    /// The worker will composite `source` as soon as `proceed` is answered.
    Started {
        index: usize,
        source: PathBuf,
        proceed: oneshot::Sender<()>,
    },
    /// The batch was aborted before the worker reached this task.
    Cancelled { index: usize },
}

/// Round-robin pool of file workers. Must be created inside a tokio runtime.
pub struct WorkerPool {
    task_sender: mpsc::UnboundedSender<FileTask>,
    event_receiver: mpsc::UnboundedReceiver<TaskEvent>,
    dispatcher: tokio::task::JoinHandle<()>,
    workers: Vec<tokio::task::JoinHandle<()>>,
    cancelled: Arc<AtomicBool>,
}

impl WorkerPool {
    pub fn new(worker_count: usize, output_dir: PathBuf, error_policy: ErrorPolicy) -> Self {
        let worker_count = worker_count.max(1);
        let output_dir = Arc::new(output_dir);
        let cancelled = Arc::new(AtomicBool::new(false));
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<FileTask>();
        let (event_sender, event_receiver) = mpsc::unbounded_channel::<TaskEvent>();
        let mut workers = Vec::with_capacity(worker_count);

        // Create a single dispatcher that distributes tasks to workers
        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<FileTask>())
            .unzip();

        let dispatcher = tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                // A dropped task closes its reply channel, the submitter sees that.
                let _ = worker_senders[worker_idx].send(task);
                worker_idx = (worker_idx + 1) % worker_count;
            }
        });

        for mut worker_receiver in worker_receivers {
            let output_dir = Arc::clone(&output_dir);
            let cancelled = Arc::clone(&cancelled);
            let events = event_sender.clone();

            let worker = tokio::spawn(async move {
                while let Some(task) = worker_receiver.recv().await {
                    let outcome = Self::process_file_worker(
                        task.index,
                        task.source,
                        Arc::clone(&output_dir),
                        &events,
                        &cancelled,
                        error_policy,
                    )
                    .await;

                    let _ = task.result_sender.send(outcome);
                }
            });

            workers.push(worker);
        }

        Self {
            task_sender,
            event_receiver,
            dispatcher,
            workers,
            cancelled,
        }
    }

    async fn process_file_worker(
        index: usize,
        source: PathBuf,
        output_dir: Arc<PathBuf>,
        events: &mpsc::UnboundedSender<TaskEvent>,
        cancelled: &AtomicBool,
        error_policy: ErrorPolicy,
    ) -> Result<FileOutcome> {
        if cancelled.load(Ordering::Acquire) {
            let _ = events.send(TaskEvent::Cancelled { index });
            return Err(CompositeError::Cancelled { path: source });
        }

        let (proceed, proceed_receiver) = oneshot::channel();
        let started = TaskEvent::Started {
            index,
            source: source.clone(),
            proceed,
        };
        if events.send(started).is_err() || proceed_receiver.await.is_err() {
            return Err(CompositeError::WorkerPool("progress listener went away"));
        }

        // Decode, blend and encode are blocking work.
        let joined = tokio::task::spawn_blocking(move || process_file(&source, &output_dir)).await;
        settle(joined, cancelled, error_policy)
    }

    pub fn submit(
        &self,
        index: usize,
        source: PathBuf,
    ) -> Result<oneshot::Receiver<Result<FileOutcome>>> {
        let (result_sender, result_receiver) = oneshot::channel();

        let task = FileTask {
            index,
            source,
            result_sender,
        };

        self.task_sender
            .send(task)
            .map_err(|_| CompositeError::WorkerPool("failed to send task to worker pool"))?;

        Ok(result_receiver)
    }

    /// Next start or cancellation report from any worker.
    pub async fn next_event(&mut self) -> Option<TaskEvent> {
        self.event_receiver.recv().await
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Closes the task queue and waits for every worker to drain.
    pub async fn shutdown(self) {
        drop(self.task_sender);
        let _ = self.dispatcher.await;
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

/// Turns a finished blocking task into its outcome. Under `Abort`, any failure,
/// including a panicked task, cancels the files not yet started.
fn settle(
    joined: std::result::Result<Result<FileOutcome>, JoinError>,
    cancelled: &AtomicBool,
    error_policy: ErrorPolicy,
) -> Result<FileOutcome> {
    let outcome = joined.unwrap_or(Err(CompositeError::WorkerPool("file worker panicked")));
    if outcome.is_err() && error_policy == ErrorPolicy::Abort {
        cancelled.store(true, Ordering::Release);
    }
    outcome
}

/// Parallel directory compositor.
///
/// Produces the same files, progress trace and `BatchReport` as the sequential
/// `Compositor` whenever no file fails under `Abort`. A worker reports each file
/// before touching it and waits until its progress line has been written. Lines
/// are released in sorted order, so files start in directory order while their
/// transforms overlap. Cancelled files are never traced.
pub struct ParallelCompositor {
    config: RunConfig,
}

impl ParallelCompositor {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub async fn process_directory<P: ProgressSink + ?Sized>(&self, progress: &mut P) -> Result<BatchReport> {
        let entries = list_entries(&self.config.input_dir)?;
        ensure_output_dir(&self.config.output_dir)?;
        info!(
            "compositing {} entries from {} into {} with {} workers",
            entries.len(),
            self.config.input_dir.display(),
            self.config.output_dir.display(),
            self.config.workers
        );

        let mut pool = WorkerPool::new(
            self.config.workers,
            self.config.output_dir.clone(),
            self.config.error_policy,
        );

        let mut pending = Vec::with_capacity(entries.len());
        for (index, source) in entries.into_iter().enumerate() {
            let receiver = pool.submit(index, source.clone())?;
            pending.push((source, receiver));
        }

        release_in_order(&mut pool, pending.len(), progress).await;

        let results = join_all(pending.into_iter().map(|(source, receiver)| async move {
            let outcome = receiver
                .await
                .unwrap_or(Err(CompositeError::WorkerPool("worker dropped a task")));
            (source, outcome)
        }))
        .await;

        if pool.is_cancelled() {
            debug!("abort requested, remaining tasks were cancelled");
        }
        pool.shutdown().await;

        let mut report = BatchReport::default();
        for (source, outcome) in results {
            match outcome {
                // Cancellation only follows a real failure, which is reported instead.
                Err(CompositeError::Cancelled { .. }) => {}
                Err(e) if self.config.error_policy == ErrorPolicy::Abort => {
                    error!("aborting at {}: {}", source.display(), error_chain(&e));
                    return Err(e);
                }
                outcome => report.record(source, outcome),
            }
        }

        log_summary(&report);
        Ok(report)
    }
}

/// Collects one event per task and answers start requests in index order,
/// writing each progress line just before the worker is allowed to proceed.
async fn release_in_order<P: ProgressSink + ?Sized>(
    pool: &mut WorkerPool,
    task_count: usize,
    progress: &mut P,
) {
    let mut slots: Vec<Option<TaskEvent>> = (0..task_count).map(|_| None).collect();
    let mut next = 0;

    while next < task_count {
        let Some(event) = pool.next_event().await else {
            break;
        };
        let index = match &event {
            TaskEvent::Started { index, .. } | TaskEvent::Cancelled { index } => *index,
        };
        if let Some(slot) = slots.get_mut(index) {
            *slot = Some(event);
        }

        while let Some(event) = slots.get_mut(next).and_then(Option::take) {
            if let TaskEvent::Started {
                source, proceed, ..
            } = event
            {
                progress.on_file(&source);
                let _ = proceed.send(());
            }
            next += 1;
        }
    }
}
