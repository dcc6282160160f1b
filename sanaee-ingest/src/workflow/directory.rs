//! Ingestion flow for the worker directory
//!
//! [`Directory`] owns the authoritative in-memory collection (newest
//! first) and is its only writer. Every mutation goes through
//! [`Directory::commit_with`]: apply to a working copy, persist, and adopt
//! the copy only when the save succeeded.
//!
//! "Add worker" state machine:
//!
//! ```text
//! Idle → Validating ─reject→ Idle
//!      → Compressing (image only) ─reject→ Idle
//!      → Persisting ─fail→ RolledBack → Idle
//!                   → Committed → Idle
//! ```

use sanaee_common::{NewWorker, Specialty, WorkerRecord};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{IngestError, IngestResult};
use crate::services::{EncodedImage, MediaFile, MediaPipeline, WorkerStore};
use crate::validators::{validate, FieldRule, ValidationReport, WorkerForm, DEFAULT_RULES};

/// Position in the ingestion state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestPhase {
    Idle,
    Validating,
    Compressing,
    Persisting,
    Committed,
    RolledBack,
}

/// Worker directory: authoritative collection plus its collaborators
pub struct Directory {
    workers: Vec<WorkerRecord>,
    store: WorkerStore,
    media: MediaPipeline,
    rules: &'static [FieldRule],
    phase: IngestPhase,
}

impl Directory {
    /// Load the collection from `store` (seeding defaults if needed)
    pub async fn open(store: WorkerStore, media: MediaPipeline) -> Self {
        let workers = store.load().await;
        info!(count = workers.len(), "Worker directory opened");

        Self {
            workers,
            store,
            media,
            rules: DEFAULT_RULES,
            phase: IngestPhase::Idle,
        }
    }

    /// Replace the validation rule set
    pub fn with_rules(mut self, rules: &'static [FieldRule]) -> Self {
        self.rules = rules;
        self
    }

    /// Authoritative collection, newest first
    pub fn workers(&self) -> &[WorkerRecord] {
        &self.workers
    }

    pub fn get(&self, id: &str) -> Option<&WorkerRecord> {
        self.workers.iter().find(|w| w.id == id)
    }

    pub fn phase(&self) -> IngestPhase {
        self.phase
    }

    pub fn store(&self) -> &WorkerStore {
        &self.store
    }

    /// Run this directory's rule set over `form` without side effects
    ///
    /// Callers that must open an image file should check the form first;
    /// no media work may happen for an invalid form.
    pub fn validate_form(&self, form: &WorkerForm) -> ValidationReport {
        validate(self.rules, form)
    }

    /// Validate, compress the optional image, and persist a new worker
    ///
    /// The record is prepended. On any failure the collection and the
    /// store are left exactly as they were.
    pub async fn add(
        &mut self,
        form: &WorkerForm,
        image: Option<&MediaFile>,
    ) -> IngestResult<WorkerRecord> {
        self.check_form(form)?;

        let image = match image {
            Some(file) => {
                self.enter(IngestPhase::Compressing);
                let compressed = self.media.compress(file).await;
                match compressed {
                    Ok(encoded) => Some(encoded.into_data_url()),
                    Err(e) => {
                        debug!(file = %file.name, error = %e, "Worker image rejected");
                        self.enter(IngestPhase::Idle);
                        return Err(e.into());
                    }
                }
            }
            None => None,
        };

        self.persist_new(form, image).await
    }

    /// Like [`Directory::add`], with an image already compressed for
    /// preview (see [`super::ImagePreview::take`])
    pub async fn add_prepared(
        &mut self,
        form: &WorkerForm,
        image: Option<EncodedImage>,
    ) -> IngestResult<WorkerRecord> {
        self.check_form(form)?;
        self.persist_new(form, image.map(EncodedImage::into_data_url)).await
    }

    fn check_form(&mut self, form: &WorkerForm) -> IngestResult<()> {
        self.enter(IngestPhase::Validating);
        let report = self.validate_form(form);
        if !report.is_valid() {
            debug!(failures = report.failures().len(), "Worker form rejected");
            self.enter(IngestPhase::Idle);
            return Err(IngestError::Validation(report));
        }
        Ok(())
    }

    async fn persist_new(
        &mut self,
        form: &WorkerForm,
        image: Option<String>,
    ) -> IngestResult<WorkerRecord> {
        // Custom rule sets may skip the specialty check; unknown values
        // degrade to Other
        let specialty = Specialty::parse(&form.specialty)
            .unwrap_or_else(|| Specialty::Other(form.specialty.trim().to_string()));

        let record = WorkerRecord::create(NewWorker {
            name: form.name.clone(),
            specialty,
            area: form.area.clone(),
            phone: form.phone.clone(),
            rating: form.rating,
            image,
        });

        let inserted = record.clone();
        self.commit_with(move |workers| workers.insert(0, inserted)).await?;

        info!(id = %record.id, name = %record.name, "Worker added");
        Ok(record)
    }

    /// Remove the worker with `id`
    ///
    /// Returns whether a record was removed. An unknown id still persists
    /// the (unchanged) collection.
    pub async fn delete(&mut self, id: &str) -> IngestResult<bool> {
        let before = self.workers.len();
        self.commit_with(|workers| workers.retain(|w| w.id != id)).await?;

        let removed = self.workers.len() < before;
        if removed {
            info!(id, "Worker deleted");
        } else {
            debug!(id, "Delete requested for unknown worker id");
        }
        Ok(removed)
    }

    /// Apply `mutate` to a working copy and persist it
    ///
    /// The working copy becomes authoritative only if the save succeeds;
    /// otherwise it is discarded and the prior collection stays.
    pub async fn commit_with<F>(&mut self, mutate: F) -> IngestResult<()>
    where
        F: FnOnce(&mut Vec<WorkerRecord>),
    {
        self.enter(IngestPhase::Persisting);

        let mut working = self.workers.clone();
        mutate(&mut working);

        let saved = self.store.try_save(&working).await;
        match saved {
            Ok(()) => {
                self.workers = working;
                self.enter(IngestPhase::Committed);
                self.enter(IngestPhase::Idle);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Persist failed, rolling back");
                self.enter(IngestPhase::RolledBack);
                self.enter(IngestPhase::Idle);
                Err(e.into())
            }
        }
    }

    /// Re-read the collection from the store
    pub async fn reload(&mut self) {
        self.workers = self.store.load().await;
    }

    fn enter(&mut self, phase: IngestPhase) {
        debug!(from = ?self.phase, to = ?phase, "Ingest phase");
        self.phase = phase;
    }
}
