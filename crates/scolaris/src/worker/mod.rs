//! Background worker for validation, analysis, and bulk apply.
//!
//! Large imports mean O(rows × rules) scans; running them on a separate
//! thread keeps the interactive side responsive. The boundary is a plain
//! request/response channel: one terminal message per request, routed back
//! through the ticket that submitted it. A broken channel surfaces as
//! [`ImportError::Delivery`], never as an empty result.
//!
//! Cancellation is not supported; a new request does not cancel a prior
//! one. Instead each request kind carries a generation counter, and callers
//! that resubmit compare a ticket's generation against
//! [`ImportWorker::current_generation`] to discard stale responses.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use crate::analysis::{AnalysisPattern, PatternAnalyzer};
use crate::changelog::{ChangeLog, ChangeType};
use crate::correction::{CorrectionMemory, CorrectionRule};
use crate::error::{ImportError, Result};
use crate::input::ImportTable;
use crate::rules::RuleRegistry;
use crate::validation::{ValidationEngine, Violation};

/// The kinds of work the worker accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Validate,
    Analyze,
    ApplyRules,
}

/// A request message. Input snapshots are moved in, so the caller cannot
/// mutate a table the worker is scanning.
#[derive(Debug)]
pub enum WorkerRequest {
    /// Validate a table against a rule registry.
    Validate {
        table: ImportTable,
        registry: RuleRegistry,
    },
    /// Derive patterns from a prior validation run.
    Analyze {
        violations: Vec<Violation>,
        table: ImportTable,
    },
    /// Replay correction rules against a table.
    ApplyRules {
        table: ImportTable,
        rules: Vec<CorrectionRule>,
        provenance: ChangeType,
        label_column: Option<String>,
        source_file: String,
        import_type: String,
    },
}

impl WorkerRequest {
    /// The kind of this request.
    pub fn kind(&self) -> RequestKind {
        match self {
            WorkerRequest::Validate { .. } => RequestKind::Validate,
            WorkerRequest::Analyze { .. } => RequestKind::Analyze,
            WorkerRequest::ApplyRules { .. } => RequestKind::ApplyRules,
        }
    }
}

/// The single terminal response to a request.
#[derive(Debug)]
pub enum WorkerResponse {
    /// Result of a `Validate` request.
    Validated(Vec<Violation>),
    /// Result of an `Analyze` request.
    Analyzed(Vec<AnalysisPattern>),
    /// Result of an `ApplyRules` request.
    Applied {
        table: ImportTable,
        applied: usize,
        log: ChangeLog,
    },
}

struct Job {
    request: WorkerRequest,
    reply: mpsc::Sender<Result<WorkerResponse>>,
}

/// Handle to one pending request.
pub struct Ticket {
    kind: RequestKind,
    generation: u64,
    receiver: mpsc::Receiver<Result<WorkerResponse>>,
}

impl Ticket {
    /// The request kind this ticket belongs to.
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// The generation stamped at submission.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Block until the terminal response arrives.
    ///
    /// A disconnected channel (worker crashed or shut down mid-request)
    /// yields a delivery error so the caller can show a retryable failure
    /// state instead of treating it as a clean result.
    pub fn wait(self) -> Result<WorkerResponse> {
        match self.receiver.recv() {
            Ok(result) => result,
            Err(_) => Err(ImportError::Delivery(
                "Worker stopped before delivering a response".to_string(),
            )),
        }
    }
}

/// Owns the worker thread and the per-kind generation counters.
pub struct ImportWorker {
    sender: Option<mpsc::Sender<Job>>,
    handle: Option<thread::JoinHandle<()>>,
    generations: Arc<Generations>,
}

#[derive(Default)]
struct Generations {
    validate: AtomicU64,
    analyze: AtomicU64,
    apply: AtomicU64,
}

impl Generations {
    fn counter(&self, kind: RequestKind) -> &AtomicU64 {
        match kind {
            RequestKind::Validate => &self.validate,
            RequestKind::Analyze => &self.analyze,
            RequestKind::ApplyRules => &self.apply,
        }
    }
}

impl ImportWorker {
    /// Spawn the worker thread.
    pub fn spawn() -> Self {
        let (sender, receiver) = mpsc::channel::<Job>();

        let handle = thread::spawn(move || {
            while let Ok(job) = receiver.recv() {
                let result = run_request(job.request);
                // A dropped ticket just means nobody is waiting anymore.
                let _ = job.reply.send(result);
            }
        });

        Self {
            sender: Some(sender),
            handle: Some(handle),
            generations: Arc::new(Generations::default()),
        }
    }

    /// Submit a request and get a ticket for its response.
    ///
    /// Requests of different kinds may be outstanding at the same time;
    /// each ticket routes only its own response.
    pub fn submit(&self, request: WorkerRequest) -> Result<Ticket> {
        let kind = request.kind();
        let generation = self
            .generations
            .counter(kind)
            .fetch_add(1, Ordering::SeqCst)
            + 1;

        let (reply, receiver) = mpsc::channel();
        let sender = self.sender.as_ref().ok_or_else(|| {
            ImportError::Delivery("Worker has been shut down".to_string())
        })?;
        sender
            .send(Job { request, reply })
            .map_err(|_| ImportError::Delivery("Worker thread is not running".to_string()))?;

        Ok(Ticket {
            kind,
            generation,
            receiver,
        })
    }

    /// The newest generation issued for a request kind. A ticket whose
    /// generation is older refers to a superseded request and its response
    /// should be ignored.
    pub fn current_generation(&self, kind: RequestKind) -> u64 {
        self.generations.counter(kind).load(Ordering::SeqCst)
    }

    /// Whether a ticket has been superseded by a newer request of the same
    /// kind.
    pub fn is_stale(&self, ticket: &Ticket) -> bool {
        ticket.generation < self.current_generation(ticket.kind)
    }
}

impl Drop for ImportWorker {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_request(request: WorkerRequest) -> Result<WorkerResponse> {
    match request {
        WorkerRequest::Validate { table, registry } => {
            let engine = ValidationEngine::from_registry(&registry)?;
            Ok(WorkerResponse::Validated(engine.validate(&table)))
        }
        WorkerRequest::Analyze { violations, table } => Ok(WorkerResponse::Analyzed(
            PatternAnalyzer::new().analyze(&violations, &table),
        )),
        WorkerRequest::ApplyRules {
            table,
            rules,
            provenance,
            label_column,
            source_file,
            import_type,
        } => {
            let memory = CorrectionMemory::from_rules(rules);
            let mut log = ChangeLog::new(source_file, import_type);
            let (table, applied) =
                memory.apply(&table, provenance, label_column.as_deref(), &mut log);
            Ok(WorkerResponse::Applied {
                table,
                applied,
                log,
            })
        }
    }
}
