use std::time::Instant;

/// One RGBA8 camera frame. The timestamp is assigned at capture time and
/// doubles as the frame's identity for duplicate detection.
#[derive(Clone, Debug)]
pub struct Frame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp: Instant,
}

/// A single 3D hand landmark in normalized engine coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// One ranked classification candidate as emitted by the engine.
#[derive(Clone, Debug, PartialEq)]
pub struct Category {
    pub name: String,
    pub score: f32,
}

impl Category {
    pub fn new(name: impl Into<String>, score: f32) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

/// Raw per-frame engine output: parallel sequences index-aligned by
/// detected-hand slot, each candidate list ranked by descending score.
#[derive(Clone, Debug, Default)]
pub struct RawRecognition {
    pub handednesses: Vec<Vec<Category>>,
    pub gestures: Vec<Vec<Category>>,
    pub landmarks: Vec<Vec<Landmark>>,
}

impl RawRecognition {
    pub fn num_hands(&self) -> usize {
        self.handednesses.len()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandType {
    Left,
    Right,
}

impl HandType {
    pub fn from_engine_name(name: &str) -> Option<Self> {
        match name {
            "Left" => Some(HandType::Left),
            "Right" => Some(HandType::Right),
            _ => None,
        }
    }

    /// The opposite side. The engine labels hands as seen from its own
    /// viewpoint; a front-facing camera mirrors the user, so the reported
    /// side is always the negation of the engine label.
    pub fn mirrored(self) -> Self {
        match self {
            HandType::Left => HandType::Right,
            HandType::Right => HandType::Left,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HandType::Left => "Left",
            HandType::Right => "Right",
        }
    }
}

/// The closed set of gestures the classifier can report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureLabel {
    None,
    ClosedFist,
    OpenPalm,
    PointingUp,
    ThumbDown,
    ThumbUp,
    Victory,
    ILoveYou,
}

impl GestureLabel {
    pub fn from_engine_name(name: &str) -> Self {
        match name {
            "Closed_Fist" => GestureLabel::ClosedFist,
            "Open_Palm" => GestureLabel::OpenPalm,
            "Pointing_Up" => GestureLabel::PointingUp,
            "Thumb_Down" => GestureLabel::ThumbDown,
            "Thumb_Up" => GestureLabel::ThumbUp,
            "Victory" => GestureLabel::Victory,
            "ILoveYou" => GestureLabel::ILoveYou,
            _ => GestureLabel::None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GestureLabel::None => "None",
            GestureLabel::ClosedFist => "Closed_Fist",
            GestureLabel::OpenPalm => "Open_Palm",
            GestureLabel::PointingUp => "Pointing_Up",
            GestureLabel::ThumbDown => "Thumb_Down",
            GestureLabel::ThumbUp => "Thumb_Up",
            GestureLabel::Victory => "Victory",
            GestureLabel::ILoveYou => "ILoveYou",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandClassification {
    pub hand_type: HandType,
    pub confidence: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureClassification {
    pub gesture_type: GestureLabel,
    pub confidence: f32,
}

/// Simplified per-hand result handed to the user callback, one per detected
/// hand per frame. Freshly constructed every frame, never retained.
#[derive(Clone, Debug, PartialEq)]
pub struct HandResult {
    pub hand: HandClassification,
    pub gesture: GestureClassification,
    pub landmarks: Vec<Landmark>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hand_type_mirroring_negates_side() {
        assert_eq!(HandType::Left.mirrored(), HandType::Right);
        assert_eq!(HandType::Right.mirrored(), HandType::Left);
        assert_eq!(HandType::Left.mirrored().mirrored(), HandType::Left);
    }

    #[test]
    fn gesture_labels_round_trip_engine_names() {
        for label in [
            GestureLabel::None,
            GestureLabel::ClosedFist,
            GestureLabel::OpenPalm,
            GestureLabel::PointingUp,
            GestureLabel::ThumbDown,
            GestureLabel::ThumbUp,
            GestureLabel::Victory,
            GestureLabel::ILoveYou,
        ] {
            assert_eq!(GestureLabel::from_engine_name(label.as_str()), label);
        }
    }

    #[test]
    fn unknown_gesture_name_reports_none() {
        assert_eq!(GestureLabel::from_engine_name("Spock"), GestureLabel::None);
    }
}
