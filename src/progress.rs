use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

/// Progress notifications emitted while scraping or uploading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Started { country: String },
    Status(String),
    CategoryStarted { name: String, position: usize, total: usize },
    CardProcessed { position: usize, total: usize, name: String },
    ProductExtracted { name: String },
    ProductFailed { name: String, error: String },
    CategoryFinished { name: String, products: usize },
    Finished { products: usize },
    Stopped { products: usize },
    Failed(String),
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::Started { country } => write!(f, "Starting catalog scraping for {}", country),
            ProgressEvent::Status(msg) => write!(f, "{}", msg),
            ProgressEvent::CategoryStarted { name, position, total } => {
                write!(f, "Processing category {}/{}: {}", position, total, name)
            }
            ProgressEvent::CardProcessed { position, total, name } => {
                write!(f, "Processing product card {}/{}: {}", position, total, name)
            }
            ProgressEvent::ProductExtracted { name } => write!(f, "Extracted {}", name),
            ProgressEvent::ProductFailed { name, error } => write!(f, "Failed {}: {}", name, error),
            ProgressEvent::CategoryFinished { name, products } => {
                write!(f, "Category {} done: {} products", name, products)
            }
            ProgressEvent::Finished { products } => {
                write!(f, "Catalog scraping completed! Found {} products", products)
            }
            ProgressEvent::Stopped { products } => {
                write!(f, "Scraping stopped by user after {} products", products)
            }
            ProgressEvent::Failed(msg) => write!(f, "Scraping failed: {}", msg),
        }
    }
}

pub type ProgressSender = mpsc::UnboundedSender<ProgressEvent>;
pub type ProgressReceiver = mpsc::UnboundedReceiver<ProgressEvent>;

pub fn channel() -> (ProgressSender, ProgressReceiver) {
    mpsc::unbounded_channel()
}

/// Sends progress if anyone is listening; a closed receiver is not an error.
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    tx: Option<ProgressSender>,
}

impl ProgressReporter {
    pub fn new(tx: ProgressSender) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn silent() -> Self {
        Self { tx: None }
    }

    pub fn send(&self, event: ProgressEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }

    pub fn status(&self, msg: impl Into<String>) {
        self.send(ProgressEvent::Status(msg.into()));
    }
}

/// Running totals folded from progress events
#[derive(Debug, Default)]
pub struct ProgressTracker {
    cards: AtomicU64,
    extracted: AtomicU64,
    failed: AtomicU64,
    categories: AtomicU64,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::CardProcessed { .. } => {
                self.cards.fetch_add(1, Ordering::Relaxed);
            }
            ProgressEvent::ProductExtracted { .. } => {
                self.extracted.fetch_add(1, Ordering::Relaxed);
            }
            ProgressEvent::ProductFailed { .. } => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
            ProgressEvent::CategoryFinished { .. } => {
                self.categories.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }

    pub fn cards(&self) -> u64 {
        self.cards.load(Ordering::Relaxed)
    }

    pub fn extracted(&self) -> u64 {
        self.extracted.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn categories(&self) -> u64 {
        self.categories.load(Ordering::Relaxed)
    }
}

impl fmt::Display for ProgressTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cards: {}, extracted: {}, failed: {}, categories: {}",
            self.cards(),
            self.extracted(),
            self.failed(),
            self.categories()
        )
    }
}
