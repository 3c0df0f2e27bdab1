use std::path::{Path, PathBuf};
use std::sync::Arc;

use cds_core::errors::SurveyError;
use once_cell::sync::OnceCell;
use tracing::debug;

use crate::bank::QuestionBank;
use crate::loader::load_questions;

/// Load-once, read-only bank shared by every session of a process.
///
/// A failed load is not cached: the next call retries, so an operator can fix
/// the file and start the experiment without restarting the program.
#[derive(Debug)]
pub struct BankStore {
    path: PathBuf,
    bank: OnceCell<Arc<QuestionBank>>,
}

impl BankStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            bank: OnceCell::new(),
        }
    }

    /// Store that is already initialised with an in-memory bank.
    pub fn preloaded(bank: QuestionBank) -> Self {
        let path = bank.source().map(Path::to_path_buf).unwrap_or_default();
        let cell = OnceCell::new();
        // A freshly created cell is always empty.
        let _ = cell.set(Arc::new(bank));
        Self { path, bank: cell }
    }

    pub fn get_or_load(&self) -> Result<Arc<QuestionBank>, SurveyError> {
        self.bank
            .get_or_try_init(|| {
                debug!(path = %self.path.display(), "bank store initialising");
                load_questions(&self.path).map(Arc::new)
            })
            .cloned()
    }

    /// The bank if it has been loaded already.
    pub fn get(&self) -> Option<Arc<QuestionBank>> {
        self.bank.get().cloned()
    }
}
