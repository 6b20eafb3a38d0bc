//! Exercise catalog helpers: muscle-group grouping and the "available to
//! add" search used when assigning exercises to a student.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::model::{Exercise, ProgressRecord};

/// Label used for exercises without a muscle group.
pub const UNGROUPED: &str = "Ungrouped";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MuscleGroup {
    pub label: String,
    pub exercises: Vec<Exercise>,
}

/// Groups exercises by muscle-group label (sorted), names sorted within a group.
#[must_use]
pub fn group_by_muscle(exercises: Vec<Exercise>) -> Vec<MuscleGroup> {
    let mut groups: BTreeMap<String, Vec<Exercise>> = BTreeMap::new();
    for exercise in exercises {
        let label = match exercise.muscle_group() {
            "" => UNGROUPED.to_owned(),
            label => label.to_owned(),
        };
        groups.entry(label).or_default().push(exercise);
    }

    groups
        .into_iter()
        .map(|(label, mut exercises)| {
            exercises.sort_by(|a, b| a.name().cmp(b.name()));
            MuscleGroup { label, exercises }
        })
        .collect()
}

/// Exercises the student does not have yet, matching `term` against name or
/// muscle group (case-insensitive). An empty term matches everything.
#[must_use]
pub fn available_exercises(
    catalog: &[Exercise],
    current: &[ProgressRecord],
    term: &str,
) -> Vec<Exercise> {
    let assigned: HashSet<_> = current.iter().map(ProgressRecord::exercise_id).collect();
    let needle = term.trim().to_lowercase();
    catalog
        .iter()
        .filter(|exercise| !assigned.contains(&exercise.id()))
        .filter(|exercise| {
            needle.is_empty()
                || exercise.name().to_lowercase().contains(&needle)
                || exercise.muscle_group().to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}
