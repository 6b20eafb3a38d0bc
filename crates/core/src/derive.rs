//! Current-state derivation: folds a student's dated history into one
//! snapshot per exercise. Pure functions over already-fetched data.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::model::{CategoryId, ProgressRecord, ProgressRecordId, Reps};

/// Sorts records newest first. The sort is stable, so records sharing a
/// timestamp keep their insertion order.
pub fn order_history(records: &mut [ProgressRecord]) {
    records.sort_by(|a, b| b.recorded_at().cmp(&a.recorded_at()));
}

/// Keeps the first record seen per exercise.
///
/// `history` must already be newest first (see [`order_history`]), which
/// makes the first occurrence the current record.
pub fn current_per_exercise<I>(history: I) -> Vec<ProgressRecord>
where
    I: IntoIterator<Item = ProgressRecord>,
{
    let mut seen = HashSet::new();
    history
        .into_iter()
        .filter(|record| seen.insert(record.exercise_id()))
        .collect()
}

/// Detailed set rows supersede the legacy aggregate once any exist.
#[must_use]
pub fn effective_set_count(detailed: Option<u32>, legacy: u32) -> u32 {
    match detailed {
        Some(count) if count > 0 => count,
        _ => legacy,
    }
}

/// Values as they should be shown. `None` means "not recorded yet"; zero is
/// never a real measurement here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayValues {
    pub load: Option<f64>,
    pub reps: Option<Reps>,
    pub sets: Option<u32>,
}

impl DisplayValues {
    #[must_use]
    pub fn from_parts(load: f64, reps: &Reps, sets: u32) -> Self {
        Self {
            load: (load != 0.0).then_some(load),
            reps: (!reps.is_unrecorded()).then(|| reps.clone()),
            sets: (sets != 0).then_some(sets),
        }
    }
}

/// The current record of one exercise, annotated for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentView {
    pub record: ProgressRecord,
    pub effective_sets: u32,
    pub display: DisplayValues,
}

impl CurrentView {
    #[must_use]
    pub fn new(record: ProgressRecord, detailed_sets: Option<u32>) -> Self {
        let effective_sets = effective_set_count(detailed_sets, record.set_count());
        let display = DisplayValues::from_parts(record.load(), record.reps(), effective_sets);
        Self {
            record,
            effective_sets,
            display,
        }
    }

    #[must_use]
    pub fn category_id(&self) -> Option<CategoryId> {
        self.record.category_id()
    }
}

/// Folds a newest-first history into one view per exercise.
///
/// `detailed_counts` holds per-record set row counts; records without rows
/// are simply absent.
#[must_use]
pub fn derive_current(
    history: Vec<ProgressRecord>,
    detailed_counts: &HashMap<ProgressRecordId, u32>,
) -> Vec<CurrentView> {
    current_per_exercise(history)
        .into_iter()
        .map(|record| {
            let detailed = detailed_counts.get(&record.id()).copied();
            CurrentView::new(record, detailed)
        })
        .collect()
}
