//! Read-only views over the worker collection
//!
//! Filtering, area listing, statistics and the render-safe helpers a view
//! needs. All functions are pure over a slice of records.

use sanaee_common::models::{clamp_rating, MAX_PHONE_LEN, MAX_RATING};
use sanaee_common::{Specialty, WorkerRecord};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::services::is_safe_embed_source;

/// Specialty / area filter; `None` means "all"
#[derive(Debug, Clone, Default)]
pub struct WorkerFilter {
    pub specialty: Option<Specialty>,
    pub area: Option<String>,
}

impl WorkerFilter {
    pub fn matches(&self, worker: &WorkerRecord) -> bool {
        self.specialty.as_ref().map_or(true, |s| &worker.specialty == s)
            && self.area.as_deref().map_or(true, |a| worker.area == a)
    }
}

/// Workers passing `filter`, in collection order
pub fn filter_workers<'a>(workers: &'a [WorkerRecord], filter: &WorkerFilter) -> Vec<&'a WorkerRecord> {
    workers.iter().filter(|w| filter.matches(w)).collect()
}

/// Distinct areas, sorted
pub fn distinct_areas(workers: &[WorkerRecord]) -> Vec<String> {
    workers
        .iter()
        .map(|w| w.area.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Header counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DirectoryStats {
    pub total_workers: usize,
    pub total_areas: usize,
    pub total_specialties: usize,
}

pub fn directory_stats(workers: &[WorkerRecord]) -> DirectoryStats {
    DirectoryStats {
        total_workers: workers.len(),
        total_areas: distinct_areas(workers).len(),
        total_specialties: Specialty::ALL.len(),
    }
}

/// Phone digits safe for a `tel:` link: digits and `+` only, at most 15
pub fn sanitize_phone(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .take(MAX_PHONE_LEN)
        .collect()
}

/// Five-star line, e.g. `★★★☆☆`
pub fn star_line(rating: u8) -> String {
    let filled = clamp_rating(rating as i64) as usize;
    let total = MAX_RATING as usize;
    format!("{}{}", "★".repeat(filled), "☆".repeat(total - filled))
}

/// What to show as a worker's avatar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Avatar<'a> {
    /// Embeddable image value that passed the safety check
    Image(&'a str),
    /// Specialty icon
    Icon(&'static str),
}

/// Avatar for `worker`; unsafe stored images fall back to the icon
pub fn avatar_for(worker: &WorkerRecord) -> Avatar<'_> {
    match worker.image.as_deref() {
        Some(src) if is_safe_embed_source(src) => Avatar::Image(src),
        _ => Avatar::Icon(worker.specialty.icon()),
    }
}
