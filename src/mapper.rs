//! Reshapes raw engine output into the simplified callback schema.

use crate::types::{
    GestureClassification, GestureLabel, HandClassification, HandResult, HandType, RawRecognition,
};

/// Pure, stateless transform from the engine's parallel candidate lists to
/// one [`HandResult`] per detected-hand slot, in slot order.
///
/// Only the top-ranked candidate of each list is kept. The hand side is
/// inverted to compensate for the mirrored front-facing camera view;
/// landmarks pass through unchanged.
pub fn map_recognition(raw: &RawRecognition) -> Vec<HandResult> {
    (0..raw.num_hands())
        .map(|slot| {
            let hand = match raw.handednesses[slot].first() {
                Some(top) => HandClassification {
                    hand_type: HandType::from_engine_name(&top.name)
                        .unwrap_or(HandType::Right)
                        .mirrored(),
                    confidence: top.score,
                },
                None => HandClassification {
                    hand_type: HandType::Left,
                    confidence: 0.0,
                },
            };

            let gesture = match raw.gestures.get(slot).and_then(|list| list.first()) {
                Some(top) => GestureClassification {
                    gesture_type: GestureLabel::from_engine_name(&top.name),
                    confidence: top.score,
                },
                None => GestureClassification {
                    gesture_type: GestureLabel::None,
                    confidence: 0.0,
                },
            };

            let landmarks = raw.landmarks.get(slot).cloned().unwrap_or_default();

            HandResult {
                hand,
                gesture,
                landmarks,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, Landmark};

    fn single_hand_raw(hand: &str, gesture: &str) -> RawRecognition {
        RawRecognition {
            handednesses: vec![vec![Category::new(hand, 0.9)]],
            gestures: vec![vec![Category::new(gesture, 0.8)]],
            landmarks: vec![vec![Landmark {
                x: 0.1,
                y: 0.2,
                z: 0.0,
            }]],
        }
    }

    #[test]
    fn maps_one_entry_per_detected_hand() {
        let raw = RawRecognition {
            handednesses: vec![
                vec![Category::new("Right", 0.9)],
                vec![Category::new("Left", 0.7)],
            ],
            gestures: vec![
                vec![Category::new("Open_Palm", 0.8)],
                vec![Category::new("Victory", 0.6)],
            ],
            landmarks: vec![Vec::new(), Vec::new()],
        };
        let mapped = map_recognition(&raw);
        assert_eq!(mapped.len(), 2);
        assert_eq!(mapped[0].hand.hand_type, HandType::Left);
        assert_eq!(mapped[1].hand.hand_type, HandType::Right);
    }

    #[test]
    fn hand_side_is_always_inverted() {
        let left = map_recognition(&single_hand_raw("Left", "None"));
        assert_eq!(left[0].hand.hand_type, HandType::Right);
        let right = map_recognition(&single_hand_raw("Right", "None"));
        assert_eq!(right[0].hand.hand_type, HandType::Left);
    }

    #[test]
    fn takes_top_ranked_candidate_unmodified() {
        let raw = RawRecognition {
            handednesses: vec![vec![
                Category::new("Right", 0.9),
                Category::new("Left", 0.1),
            ]],
            gestures: vec![vec![
                Category::new("Thumb_Up", 0.75),
                Category::new("Thumb_Down", 0.2),
            ]],
            landmarks: vec![Vec::new()],
        };
        let mapped = map_recognition(&raw);
        assert_eq!(mapped[0].hand.confidence, 0.9);
        assert_eq!(mapped[0].gesture.gesture_type, GestureLabel::ThumbUp);
        assert_eq!(mapped[0].gesture.confidence, 0.75);
    }

    #[test]
    fn landmarks_pass_through_in_value_and_order() {
        let points = vec![
            Landmark {
                x: 0.1,
                y: 0.2,
                z: 0.0,
            },
            Landmark {
                x: 0.3,
                y: 0.4,
                z: -0.1,
            },
        ];
        let raw = RawRecognition {
            handednesses: vec![vec![Category::new("Right", 0.9)]],
            gestures: vec![vec![Category::new("Open_Palm", 0.8)]],
            landmarks: vec![points.clone()],
        };
        let mapped = map_recognition(&raw);
        assert_eq!(mapped[0].landmarks, points);
    }

    #[test]
    fn worked_example_from_engine_output() {
        let mapped = map_recognition(&single_hand_raw("Right", "Open_Palm"));
        assert_eq!(
            mapped,
            vec![HandResult {
                hand: HandClassification {
                    hand_type: HandType::Left,
                    confidence: 0.9,
                },
                gesture: GestureClassification {
                    gesture_type: GestureLabel::OpenPalm,
                    confidence: 0.8,
                },
                landmarks: vec![Landmark {
                    x: 0.1,
                    y: 0.2,
                    z: 0.0,
                }],
            }]
        );
    }

    #[test]
    fn zero_hands_maps_to_empty_sequence() {
        let mapped = map_recognition(&RawRecognition::default());
        assert!(mapped.is_empty());
    }
}
