//! Trial-type labels.
//!
//! 'Left' and 'right' refer to the trial's correct side, i.e. which cue LED was
//! lit. An `incorrect_left` trial is therefore a reach to the right-hand target
//! while the left LED was on.

label_set! {
    /// Set of trial-type labels, written once per trial at its cue onset.
    pub struct ActionLabels {
        primitives {
            MISS_LEFT = 0, "miss_left";
            MISS_RIGHT = 1, "miss_right";
            CORRECT_LEFT = 2, "correct_left";
            CORRECT_RIGHT = 3, "correct_right";
            INCORRECT_LEFT = 4, "incorrect_left";
            INCORRECT_RIGHT = 5, "incorrect_right";

            /// Cue-only sessions, bucketed by cue duration.
            NAIVE_LEFT_SHORT = 6, "naive_left_short";
            NAIVE_LEFT_LONG = 7, "naive_left_long";
            NAIVE_RIGHT_SHORT = 8, "naive_right_short";
            NAIVE_RIGHT_LONG = 9, "naive_right_long";

            /// Cued single reach to grasp (from motion tracking).
            CLEAN_LEFT = 10, "clean_left";
            CLEAN_RIGHT = 11, "clean_right";
            /// Cued multiple reaches before reward.
            MULTI_LEFT = 12, "multi_left";
            MULTI_RIGHT = 13, "multi_right";
            /// Cued by a well-timed spontaneous reach right before.
            PRECUE_REWARDED_LEFT = 14, "precue_rewarded_left";
            PRECUE_REWARDED_RIGHT = 15, "precue_rewarded_right";
            /// Motion tracking failed to get the reach trajectory.
            TRACKING_FAIL_LEFT = 16, "tracking_fail_left";
            TRACKING_FAIL_RIGHT = 17, "tracking_fail_right";
            LONG_REACH_DURATION_LEFT = 18, "long_reach_duration_left";
            LONG_REACH_DURATION_RIGHT = 19, "long_reach_duration_right";

            CLEAN_INCORRECT_LEFT = 20, "clean_incorrect_left";
            CLEAN_INCORRECT_RIGHT = 21, "clean_incorrect_right";
            MULTI_INCORRECT_LEFT = 22, "multi_incorrect_left";
            MULTI_INCORRECT_RIGHT = 23, "multi_incorrect_right";
            PRECUE_INCORRECT_LEFT = 24, "precue_incorrect_left";
            PRECUE_INCORRECT_RIGHT = 25, "precue_incorrect_right";
            TRACKING_FAIL_INCORRECT_LEFT = 26, "tracking_fail_incorrect_left";
            TRACKING_FAIL_INCORRECT_RIGHT = 27, "tracking_fail_incorrect_right";
            LONG_REACH_DURATION_INCORRECT_LEFT = 28, "long_reach_duration_incorrect_left";
            LONG_REACH_DURATION_INCORRECT_RIGHT = 29, "long_reach_duration_incorrect_right";
        }
        composites {
            MISS = MISS_LEFT | MISS_RIGHT, "miss";
            CORRECT = CORRECT_LEFT | CORRECT_RIGHT, "correct";
            INCORRECT = INCORRECT_LEFT | INCORRECT_RIGHT, "incorrect";
            LEFT = MISS_LEFT | CORRECT_LEFT | INCORRECT_LEFT, "left";
            RIGHT = MISS_RIGHT | CORRECT_RIGHT | INCORRECT_RIGHT, "right";

            NAIVE_LONG = NAIVE_LEFT_LONG | NAIVE_RIGHT_LONG, "naive_long";
            NAIVE_SHORT = NAIVE_LEFT_SHORT | NAIVE_RIGHT_SHORT, "naive_short";
            NAIVE = NAIVE_LEFT_SHORT | NAIVE_LEFT_LONG | NAIVE_RIGHT_SHORT | NAIVE_RIGHT_LONG, "naive";

            CLEAN = CLEAN_LEFT | CLEAN_RIGHT, "clean";
            MULTI = MULTI_LEFT | MULTI_RIGHT, "multi";
            PRECUE_REWARDED = PRECUE_REWARDED_LEFT | PRECUE_REWARDED_RIGHT, "precue_rewarded";
            TRACKING_FAIL = TRACKING_FAIL_LEFT | TRACKING_FAIL_RIGHT, "tracking_fail";
            LONG_REACH_DURATION = LONG_REACH_DURATION_LEFT | LONG_REACH_DURATION_RIGHT, "long_reach_duration";

            CLEAN_INCORRECT = CLEAN_INCORRECT_LEFT | CLEAN_INCORRECT_RIGHT, "clean_incorrect";
            MULTI_INCORRECT = MULTI_INCORRECT_LEFT | MULTI_INCORRECT_RIGHT, "multi_incorrect";
            PRECUE_INCORRECT = PRECUE_INCORRECT_LEFT | PRECUE_INCORRECT_RIGHT, "precue_incorrect";
            TRACKING_FAIL_INCORRECT = TRACKING_FAIL_INCORRECT_LEFT | TRACKING_FAIL_INCORRECT_RIGHT, "tracking_fail_incorrect";
            LONG_REACH_DURATION_INCORRECT = LONG_REACH_DURATION_INCORRECT_LEFT | LONG_REACH_DURATION_INCORRECT_RIGHT, "long_reach_duration_incorrect";
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_primitives_are_distinct_single_bits() {
        let mut seen = 0u64;
        for (name, label) in ActionLabels::PRIMITIVES {
            assert_eq!(label.bits().count_ones(), 1, "{name} is not a single bit");
            assert_eq!(seen & label.bits(), 0, "{name} collides with another label");
            seen |= label.bits();
        }
    }

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<&str> = ActionLabels::PRIMITIVES
            .iter()
            .chain(ActionLabels::COMPOSITES)
            .map(|(n, _)| *n)
            .collect();
        assert_eq!(
            names.len(),
            ActionLabels::PRIMITIVES.len() + ActionLabels::COMPOSITES.len()
        );
    }

    #[test]
    fn test_composites_equal_union_of_components() {
        let cases = [
            (ActionLabels::MISS, &["miss_left", "miss_right"][..]),
            (ActionLabels::CORRECT, &["correct_left", "correct_right"][..]),
            (ActionLabels::INCORRECT, &["incorrect_left", "incorrect_right"][..]),
            (
                ActionLabels::LEFT,
                &["miss_left", "correct_left", "incorrect_left"][..],
            ),
            (
                ActionLabels::RIGHT,
                &["miss_right", "correct_right", "incorrect_right"][..],
            ),
            (
                ActionLabels::NAIVE,
                &[
                    "naive_left_short",
                    "naive_left_long",
                    "naive_right_short",
                    "naive_right_long",
                ][..],
            ),
            (ActionLabels::CLEAN, &["clean_left", "clean_right"][..]),
            (
                ActionLabels::LONG_REACH_DURATION,
                &["long_reach_duration_left", "long_reach_duration_right"][..],
            ),
            (
                ActionLabels::TRACKING_FAIL_INCORRECT,
                &[
                    "tracking_fail_incorrect_left",
                    "tracking_fail_incorrect_right",
                ][..],
            ),
        ];

        for (composite, parts) in cases {
            let union = parts
                .iter()
                .map(|p| ActionLabels::from_name(p).unwrap())
                .fold(ActionLabels::empty(), |acc, l| acc | l);
            assert_eq!(composite, union, "{composite}");
        }
    }

    #[test]
    fn test_every_composite_is_union_of_listed_primitives() {
        for (name, composite) in ActionLabels::COMPOSITES {
            let rebuilt = composite
                .names()
                .iter()
                .map(|n| ActionLabels::from_name(n).unwrap())
                .fold(ActionLabels::empty(), |acc, l| acc | l);
            assert_eq!(*composite, rebuilt, "{name}");
        }
    }

    #[test]
    fn test_queries() {
        let cell = ActionLabels::CORRECT_RIGHT;
        assert!(cell.intersects(ActionLabels::CORRECT));
        assert!(cell.intersects(ActionLabels::RIGHT));
        assert!(!cell.intersects(ActionLabels::MISS));
        assert!(ActionLabels::CORRECT.contains(cell));
        assert!(!cell.contains(ActionLabels::CORRECT));
        assert_eq!(
            (ActionLabels::CORRECT & ActionLabels::RIGHT),
            ActionLabels::CORRECT_RIGHT
        );
    }

    #[test]
    fn test_lookup_and_display() {
        assert_eq!(
            ActionLabels::from_name("incorrect_left"),
            Some(ActionLabels::INCORRECT_LEFT)
        );
        assert_eq!(ActionLabels::from_name("punished"), None);
        assert_eq!(ActionLabels::MISS.to_string(), "miss_left|miss_right");
        assert_eq!(ActionLabels::empty().to_string(), "none");
    }
}
