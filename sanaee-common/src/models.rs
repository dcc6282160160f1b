//! Worker record model
//!
//! A [`WorkerRecord`] is the unit of storage: one tradesperson listing.
//! Records are only created through [`WorkerRecord::create`], which assigns
//! the id and normalizes the phone number; afterwards they are never
//! mutated, only deleted.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::uuid_utils;

/// Highest star rating a worker can carry
pub const MAX_RATING: u8 = 5;

/// Maximum stored phone length, including a leading `+`
pub const MAX_PHONE_LEN: usize = 15;

/// Icon shown for a specialty outside the fixed set
pub const DEFAULT_ICON: &str = "👷";

/// Trade category from the fixed specialty set
///
/// Serialized as its display label. Labels outside the set survive a
/// storage round-trip as [`Specialty::Other`] and render with
/// [`DEFAULT_ICON`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Specialty {
    Carpenter,
    Plumber,
    Electrician,
    Mechanic,
    Other(String),
}

impl Specialty {
    /// The fixed set, in display order
    pub const ALL: [Specialty; 4] = [
        Specialty::Carpenter,
        Specialty::Plumber,
        Specialty::Electrician,
        Specialty::Mechanic,
    ];

    /// Display label (also the serialized form)
    pub fn label(&self) -> &str {
        match self {
            Specialty::Carpenter => "نجار",
            Specialty::Plumber => "سباك",
            Specialty::Electrician => "كهربائي",
            Specialty::Mechanic => "ميكانيكي",
            Specialty::Other(raw) => raw,
        }
    }

    /// English key accepted on the command line
    pub fn key(&self) -> &str {
        match self {
            Specialty::Carpenter => "carpenter",
            Specialty::Plumber => "plumber",
            Specialty::Electrician => "electrician",
            Specialty::Mechanic => "mechanic",
            Specialty::Other(raw) => raw,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Specialty::Carpenter => "🪵",
            Specialty::Plumber => "🔧",
            Specialty::Electrician => "⚡",
            Specialty::Mechanic => "🔩",
            Specialty::Other(_) => DEFAULT_ICON,
        }
    }

    /// Whether this value belongs to the fixed set
    pub fn is_known(&self) -> bool {
        !matches!(self, Specialty::Other(_))
    }

    /// Resolve user input (display label or English key) to a member of
    /// the fixed set. Returns `None` for anything else.
    pub fn parse(input: &str) -> Option<Specialty> {
        let input = input.trim();
        Specialty::ALL
            .iter()
            .find(|s| s.label() == input || s.key().eq_ignore_ascii_case(input))
            .cloned()
    }
}

impl From<String> for Specialty {
    fn from(raw: String) -> Self {
        Specialty::ALL
            .iter()
            .find(|s| s.label() == raw)
            .cloned()
            .unwrap_or(Specialty::Other(raw))
    }
}

impl From<Specialty> for String {
    fn from(specialty: Specialty) -> Self {
        match specialty {
            Specialty::Other(raw) => raw,
            known => known.label().to_string(),
        }
    }
}

impl fmt::Display for Specialty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One tradesperson listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRecord {
    /// Opaque unique id, immutable after creation
    pub id: String,
    pub name: String,
    pub specialty: Specialty,
    /// Free-text locality
    pub area: String,
    /// Digits with an optional leading `+`, at most 15 characters
    pub phone: String,
    /// Star rating, always within 0..=5
    #[serde(deserialize_with = "deserialize_rating")]
    pub rating: u8,
    /// Self-describing encoded image (`data:image/...`), if any
    pub image: Option<String>,
}

/// Field values for a record that does not exist yet
#[derive(Debug, Clone)]
pub struct NewWorker {
    pub name: String,
    pub specialty: Specialty,
    pub area: String,
    pub phone: String,
    pub rating: i64,
    pub image: Option<String>,
}

impl WorkerRecord {
    /// Build a record with a fresh id, normalized phone and clamped rating
    pub fn create(new: NewWorker) -> Self {
        Self {
            id: uuid_utils::generate_worker_id(),
            name: new.name.trim().to_string(),
            specialty: new.specialty,
            area: new.area.trim().to_string(),
            phone: normalize_phone(&new.phone),
            rating: clamp_rating(new.rating),
            image: new.image,
        }
    }
}

/// Clamp any integer rating into 0..=5
pub fn clamp_rating(rating: i64) -> u8 {
    rating.clamp(0, MAX_RATING as i64) as u8
}

/// Remove whitespace and hyphens from user-typed phone input
pub fn strip_phone_separators(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// Normalize a phone number for storage
///
/// Separators are stripped, then only digits survive, except for a `+`
/// in first position. The result is truncated to [`MAX_PHONE_LEN`].
pub fn normalize_phone(raw: &str) -> String {
    strip_phone_separators(raw)
        .chars()
        .enumerate()
        .filter(|(i, c)| c.is_ascii_digit() || (*i == 0 && *c == '+'))
        .map(|(_, c)| c)
        .take(MAX_PHONE_LEN)
        .collect()
}

// Stored ratings are untrusted: accept any number, round, clamp.
fn deserialize_rating<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if raw.is_nan() {
        return Ok(0);
    }
    Ok(raw.round().clamp(0.0, MAX_RATING as f64) as u8)
}

/// Seed collection written on first run and after storage corruption
///
/// Returns a fresh owned vector on every call.
pub fn default_roster() -> Vec<WorkerRecord> {
    let seed = [
        ("w1", "محمد السيد", Specialty::Electrician, "المنصورة", "01012345678", 5),
        ("w2", "أحمد إبراهيم", Specialty::Plumber, "الزقازيق", "01098765432", 4),
        ("w3", "حسن علي", Specialty::Carpenter, "المنصورة", "01155556666", 4),
        ("w4", "خالد عبد الله", Specialty::Mechanic, "طنطا", "01234567890", 5),
        ("w5", "عمرو حسين", Specialty::Carpenter, "الزقازيق", "01123456789", 3),
        ("w6", "ياسر ممدوح", Specialty::Electrician, "طنطا", "01056789012", 5),
    ];

    seed.into_iter()
        .map(|(id, name, specialty, area, phone, rating)| WorkerRecord {
            id: id.to_string(),
            name: name.to_string(),
            specialty,
            area: area.to_string(),
            phone: phone.to_string(),
            rating,
            image: None,
        })
        .collect()
}
