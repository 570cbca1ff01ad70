use crate::{data::Request, verdict::MismatchRecord, verdict::VerificationVerdict};
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

/// Run-scoped, append-only record of every mismatch the mock provider saw, keyed by request.
#[derive(Debug, Default)]
pub struct MismatchLedger {
    mismatches: Mutex<HashMap<Request, Vec<MismatchRecord>>>,
}

impl MismatchLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, key: Request, mismatch: MismatchRecord) {
        self.lock().entry(key).or_insert_with(Vec::new).push(mismatch);
    }

    pub fn snapshot(&self) -> VerificationVerdict {
        let mismatches = self.lock();

        if mismatches.is_empty() {
            VerificationVerdict::Ok
        } else {
            VerificationVerdict::Mismatches(mismatches.values().flatten().cloned().collect())
        }
    }

    pub fn mismatches_for(&self, key: &Request) -> Vec<MismatchRecord> {
        self.lock().get(key).cloned().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // a panicking writer can't leave a half-pushed record behind, so poisoning is ignored
    fn lock(&self) -> MutexGuard<'_, HashMap<Request, Vec<MismatchRecord>>> {
        self.mismatches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
