use crate::{
    error::LoadError,
    models::{
        Block, BlockDocument, Exercise, ExerciseDocument, ExerciseMode, Routine, RoutineDocument,
        FALLBACK_DURATION_SECS,
    },
    settings::RestDefaults,
};

/// Turns a stored document into a playable routine.
///
/// Blocks and exercises are ordered by their `order` field (stable, so documents
/// without one keep insertion order). The routine is rejected if it has no
/// blocks, if any block has no exercises or a zero repeat count, if a
/// preparation block is anything other than a single exercise played once, or
/// if an exercise is not exactly one of timed / rep-based.
pub fn validate(
    document: RoutineDocument,
    fallback_id: &str,
    defaults: &RestDefaults,
) -> Result<Routine, LoadError> {
    let id = document
        .id
        .clone()
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| fallback_id.to_string());

    if document.blocks.is_empty() {
        return Err(LoadError::invalid(id, "routine has no blocks"));
    }

    let mut block_docs = document.blocks;
    block_docs.sort_by_key(|block| block.order.unwrap_or(i64::MAX));

    let blocks = block_docs
        .into_iter()
        .map(|block| validate_block(&id, block))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Routine {
        id,
        name: document.name,
        style: document.style,
        level: document.level,
        estimated_minutes: document.duration,
        rest_between_exercises: document
            .rest_between_exercises
            .unwrap_or(defaults.between_exercises_secs),
        rest_between_blocks: document
            .rest_between_blocks
            .unwrap_or(defaults.between_blocks_secs),
        blocks,
    })
}

fn validate_block(routine_id: &str, block: BlockDocument) -> Result<Block, LoadError> {
    if block.exercises.is_empty() {
        return Err(LoadError::invalid(
            routine_id,
            format!("block '{}' has no exercises", block.title),
        ));
    }
    if block.repeat == 0 {
        return Err(LoadError::invalid(
            routine_id,
            format!("block '{}' repeats zero times", block.title),
        ));
    }
    if block.is_preparation && (block.repeat != 1 || block.exercises.len() != 1) {
        return Err(LoadError::invalid(
            routine_id,
            format!(
                "preparation block '{}' must hold one exercise played once",
                block.title
            ),
        ));
    }

    let mut exercise_docs = block.exercises;
    exercise_docs.sort_by_key(|exercise| exercise.order.unwrap_or(i64::MAX));

    let exercises = exercise_docs
        .into_iter()
        .map(|exercise| validate_exercise(routine_id, &block.title, exercise))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Block {
        title: block.title,
        repeat_count: block.repeat,
        is_preparation: block.is_preparation,
        exercises,
    })
}

fn validate_exercise(
    routine_id: &str,
    block_title: &str,
    exercise: ExerciseDocument,
) -> Result<Exercise, LoadError> {
    let mode = match (exercise.duration, exercise.reps) {
        (Some(_), Some(_)) => {
            return Err(LoadError::invalid(
                routine_id,
                format!(
                    "exercise '{}' in '{}' sets both duration and reps",
                    exercise.name, block_title
                ),
            ))
        }
        (Some(0), None) | (None, Some(0)) => {
            return Err(LoadError::invalid(
                routine_id,
                format!("exercise '{}' in '{}' is empty", exercise.name, block_title),
            ))
        }
        (Some(secs), None) => ExerciseMode::Duration(secs),
        (None, Some(count)) => ExerciseMode::Reps(count),
        (None, None) => {
            log::warn!(
                "Exercise '{}' in '{}' has no duration or reps; using {}s",
                exercise.name,
                block_title,
                FALLBACK_DURATION_SECS
            );
            ExerciseMode::Duration(FALLBACK_DURATION_SECS)
        }
    };

    Ok(Exercise {
        name: exercise.name,
        mode,
        equipment: exercise.equipment.filter(|equipment| !equipment.is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(name: &str, duration: Option<u32>, reps: Option<u32>) -> ExerciseDocument {
        ExerciseDocument {
            name: name.into(),
            duration,
            reps,
            ..Default::default()
        }
    }

    fn block(title: &str, exercises: Vec<ExerciseDocument>) -> BlockDocument {
        BlockDocument {
            title: title.into(),
            repeat: 1,
            exercises,
            ..Default::default()
        }
    }

    fn document(blocks: Vec<BlockDocument>) -> RoutineDocument {
        RoutineDocument {
            id: Some("r1".into()),
            name: "Routine".into(),
            blocks,
            ..Default::default()
        }
    }

    fn reason(err: LoadError) -> String {
        match err {
            LoadError::Invalid { reason, .. } => reason,
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn resolves_modes_and_defaults() {
        let doc = document(vec![block(
            "Main",
            vec![
                exercise("Timed", Some(40), None),
                exercise("Counted", None, Some(8)),
                exercise("Bare", None, None),
            ],
        )]);

        let routine = validate(doc, "unused", &RestDefaults::default()).unwrap();

        assert_eq!(routine.id, "r1");
        assert_eq!(routine.rest_between_exercises, 5);
        assert_eq!(routine.rest_between_blocks, 5);
        let modes: Vec<_> = routine.blocks[0].exercises.iter().map(|e| e.mode).collect();
        assert_eq!(
            modes,
            vec![
                ExerciseMode::Duration(40),
                ExerciseMode::Reps(8),
                ExerciseMode::Duration(FALLBACK_DURATION_SECS),
            ]
        );
    }

    #[test]
    fn explicit_rests_win_over_defaults() {
        let mut doc = document(vec![block("Main", vec![exercise("A", Some(10), None)])]);
        doc.rest_between_exercises = Some(0);
        doc.rest_between_blocks = Some(60);

        let defaults = RestDefaults {
            between_exercises_secs: 20,
            between_blocks_secs: 20,
        };
        let routine = validate(doc, "r1", &defaults).unwrap();

        assert_eq!(routine.rest_between_exercises, 0);
        assert_eq!(routine.rest_between_blocks, 60);
    }

    #[test]
    fn sorts_by_order_field() {
        let mut first = block("First", vec![exercise("A", Some(10), None)]);
        first.order = Some(1);
        let mut second = block(
            "Second",
            vec![
                ExerciseDocument {
                    order: Some(2),
                    ..exercise("Y", Some(10), None)
                },
                ExerciseDocument {
                    order: Some(1),
                    ..exercise("X", Some(10), None)
                },
            ],
        );
        second.order = Some(2);

        let routine = validate(document(vec![second, first]), "r1", &RestDefaults::default())
            .unwrap();

        assert_eq!(routine.blocks[0].title, "First");
        assert_eq!(routine.blocks[1].exercises[0].name, "X");
    }

    #[test]
    fn falls_back_to_requested_id() {
        let mut doc = document(vec![block("Main", vec![exercise("A", Some(10), None)])]);
        doc.id = None;

        let routine = validate(doc, "from-caller", &RestDefaults::default()).unwrap();
        assert_eq!(routine.id, "from-caller");
    }

    #[test]
    fn rejects_empty_routine() {
        let err = validate(document(vec![]), "r1", &RestDefaults::default()).unwrap_err();
        assert!(reason(err).contains("no blocks"));
    }

    #[test]
    fn rejects_empty_block() {
        let err = validate(document(vec![block("Hollow", vec![])]), "r1", &RestDefaults::default())
            .unwrap_err();
        assert!(reason(err).contains("Hollow"));
    }

    #[test]
    fn rejects_zero_repeat() {
        let mut b = block("Main", vec![exercise("A", Some(10), None)]);
        b.repeat = 0;
        assert!(validate(document(vec![b]), "r1", &RestDefaults::default()).is_err());
    }

    #[test]
    fn rejects_oversized_preparation() {
        let mut prep = block(
            "Prep",
            vec![exercise("A", Some(10), None), exercise("B", Some(10), None)],
        );
        prep.is_preparation = true;
        let err = validate(document(vec![prep]), "r1", &RestDefaults::default()).unwrap_err();
        assert!(reason(err).contains("preparation"));

        let mut repeated = block("Prep", vec![exercise("A", Some(10), None)]);
        repeated.is_preparation = true;
        repeated.repeat = 2;
        assert!(validate(document(vec![repeated]), "r1", &RestDefaults::default()).is_err());
    }

    #[test]
    fn rejects_ambiguous_or_empty_exercise() {
        let both = document(vec![block("Main", vec![exercise("A", Some(10), Some(5))])]);
        assert!(reason(validate(both, "r1", &RestDefaults::default()).unwrap_err())
            .contains("both"));

        let zero = document(vec![block("Main", vec![exercise("A", None, Some(0))])]);
        assert!(validate(zero, "r1", &RestDefaults::default()).is_err());
    }
}
