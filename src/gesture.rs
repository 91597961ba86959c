//! Medical sign vocabulary and the rule cascade that classifies a fused frame.

use std::{env, fmt};

use crate::{
    body::landmark::PoseLandmarks,
    hand::landmark::{Finger, HandLandmarks},
    predicate::{
        are_hands_down, is_finger_up, is_fist, is_hand_near_head, is_hand_near_shoulder,
        is_hand_near_throat, is_open_palm, is_thumb_down, is_thumb_up, Region,
    },
};

/// Both index tips must be above this line for the two-handed "Help" sign.
pub const HELP_INDEX_TIP_MAX_Y: f32 = 0.4;
/// Both wrists must be above this line for the two-handed "Help" sign.
pub const HELP_WRIST_MAX_Y: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gesture {
    Doctor,
    Fever,
    ChestPain,
    Headache,
    ThroatPain,
    Yes,
    No,
    I,
    You,
    Help,
    /// All visible hands are lowered (or no hands are visible).
    NoGesture,
}

impl Gesture {
    pub const ALL: [Gesture; 11] = [
        Gesture::Doctor,
        Gesture::Fever,
        Gesture::ChestPain,
        Gesture::Headache,
        Gesture::ThroatPain,
        Gesture::Yes,
        Gesture::No,
        Gesture::I,
        Gesture::You,
        Gesture::Help,
        Gesture::NoGesture,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gesture::Doctor => "Doctor",
            Gesture::Fever => "Fever",
            Gesture::ChestPain => "Chest Pain",
            Gesture::Headache => "Headache",
            Gesture::ThroatPain => "Throat Pain",
            Gesture::Yes => "Yes",
            Gesture::No => "No",
            Gesture::I => "I",
            Gesture::You => "You",
            Gesture::Help => "Help",
            Gesture::NoGesture => "No Gestures Detected",
        }
    }

    /// Returns whether this sign should raise an alert for volunteers.
    pub fn is_emergency(&self) -> bool {
        matches!(
            self,
            Gesture::Fever | Gesture::ChestPain | Gesture::Headache
        )
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hand shape required for the "Fever" sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeverShape {
    /// Open palm on the forehead.
    OpenPalm,
    /// Index and middle finger raised, tips above the wrist.
    TwoFingers,
}

/// Thresholds and rule variations of the classifier.
///
/// Two independently tuned rule sets exist, see [`RuleSet::dashboard`] and
/// [`RuleSet::standalone`]. They differ in the shape required for "Fever", the size of the
/// regions around the head and chest, and whether "Throat Pain" is recognized at all.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    pub fever_shape: FeverShape,
    /// Around the nose.
    pub head: Region,
    /// Around the right shoulder.
    pub chest: Region,
    /// Around the nose, offset downwards. `None` disables "Throat Pain".
    pub throat: Option<Region>,
}

impl RuleSet {
    /// Rules of the web dashboard: open-palm "Fever", tight head and chest regions, no
    /// "Throat Pain".
    pub const fn dashboard() -> Self {
        Self {
            fever_shape: FeverShape::OpenPalm,
            head: Region::symmetric(0.1, 0.2),
            chest: Region {
                offset: 0.0,
                above: 0.1,
                below: 0.2,
                horizontal: 0.25,
            },
            throat: None,
        }
    }

    /// Rules of the standalone page: two-finger "Fever", wider regions, and "Throat Pain".
    pub const fn standalone() -> Self {
        Self {
            fever_shape: FeverShape::TwoFingers,
            head: Region::symmetric(0.15, 0.3),
            chest: Region {
                offset: 0.0,
                above: 0.1,
                below: 0.15,
                horizontal: 0.3,
            },
            throat: Some(Region {
                offset: 0.1,
                above: 0.05,
                below: 0.15,
                horizontal: 0.3,
            }),
        }
    }

    /// Selects a rule set via the `SRISHTI_RULES` environment variable.
    ///
    /// Accepts `dashboard` and `standalone`. Unset or unknown values select the default
    /// ([`RuleSet::dashboard`]).
    pub fn from_env() -> Self {
        match env::var("SRISHTI_RULES") {
            Ok(name) => Self::from_name(&name).unwrap_or_else(|| {
                log::warn!("unknown SRISHTI_RULES value '{name}', using dashboard rules");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "dashboard" => Some(Self::dashboard()),
            "standalone" => Some(Self::standalone()),
            _ => None,
        }
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::dashboard()
    }
}

/// Classifies one fused frame.
///
/// Rules are tried in a fixed order and the first match wins; the order is the only tie-break
/// between overlapping hand shapes. Only the first hand is inspected, except by the two-handed
/// "Help" rule.
///
/// Returns `None` when a hand is raised but matches no sign.
pub fn classify(
    hands: &[HandLandmarks],
    pose: Option<&PoseLandmarks>,
    rules: &RuleSet,
) -> Option<Gesture> {
    if are_hands_down(hands) {
        return Some(Gesture::NoGesture);
    }

    let hand = &hands[0];
    let up = |f| is_finger_up(hand, f);
    let index = up(Finger::Index);
    let middle = up(Finger::Middle);
    let ring = up(Finger::Ring);
    let pinky = up(Finger::Pinky);
    let thumb_up = is_thumb_up(hand);
    let wrist = hand.wrist();
    let above_wrist = |f| hand.tip(f).is_above(&wrist);
    let two_fingers = index && middle && above_wrist(Finger::Index) && above_wrist(Finger::Middle);

    if two_fingers && !ring && !pinky {
        return Some(Gesture::Doctor);
    }

    let fever_shape = match rules.fever_shape {
        FeverShape::OpenPalm => is_open_palm(hand),
        FeverShape::TwoFingers => two_fingers,
    };
    if fever_shape && is_hand_near_head(hand, pose, &rules.head) {
        return Some(Gesture::Fever);
    }

    let fist = is_fist(hand);
    if fist && is_hand_near_shoulder(hand, pose, &rules.chest) {
        return Some(Gesture::ChestPain);
    }
    if fist && is_hand_near_head(hand, pose, &rules.head) {
        return Some(Gesture::Headache);
    }
    if let Some(throat) = &rules.throat {
        if fist && is_hand_near_throat(hand, pose, throat) {
            return Some(Gesture::ThroatPain);
        }
    }

    if thumb_up && !index && !middle && above_wrist(Finger::Thumb) {
        return Some(Gesture::Yes);
    }
    if is_thumb_down(hand) && !index && !middle && wrist.is_above(&hand.tip(Finger::Thumb)) {
        return Some(Gesture::No);
    }
    if pinky && !thumb_up && !index && !middle && !ring && above_wrist(Finger::Pinky) {
        return Some(Gesture::I);
    }
    if index && !middle && !thumb_up && above_wrist(Finger::Index) {
        return Some(Gesture::You);
    }

    if let [first, second] = hands {
        let raised = |h: &HandLandmarks| {
            h.tip(Finger::Index).y() < HELP_INDEX_TIP_MAX_Y && h.wrist().y() < HELP_WRIST_MAX_Y
        };
        if raised(first) && raised(second) {
            return Some(Gesture::Help);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{hand, pose, upright_pose};

    fn one(h: HandLandmarks, pose: Option<&PoseLandmarks>) -> Option<Gesture> {
        classify(&[h], pose, &RuleSet::dashboard())
    }

    #[test]
    fn no_hands_is_no_gesture() {
        assert_eq!(
            classify(&[], Some(&upright_pose()), &RuleSet::default()),
            Some(Gesture::NoGesture)
        );
        assert_eq!(
            one(hand(0.5, 0.8).build(), None),
            Some(Gesture::NoGesture)
        );
    }

    #[test]
    fn doctor_is_peace_sign() {
        let h = hand(0.8, 0.8).up(Finger::Index).up(Finger::Middle).build();
        assert_eq!(one(h, None), Some(Gesture::Doctor));
        // Doctor wins even at the forehead.
        let h = hand(0.5, 0.3).up(Finger::Index).up(Finger::Middle).build();
        assert_eq!(one(h, Some(&upright_pose())), Some(Gesture::Doctor));
    }

    #[test]
    fn fever_is_open_palm_at_forehead() {
        let pose = upright_pose();
        let palm = hand(0.5, 0.32).all_up().build();
        assert_eq!(one(palm, Some(&pose)), Some(Gesture::Fever));

        // Same palm away from the head matches nothing.
        let palm = hand(0.9, 0.8).all_up().build();
        assert_eq!(one(palm, Some(&pose)), None);

        // Without a pose, no positional sign can be recognized.
        let palm = hand(0.5, 0.32).all_up().build();
        assert_eq!(one(palm, None), None);
    }

    #[test]
    fn standalone_fever_uses_two_fingers() {
        let rules = RuleSet::standalone();
        let pose = upright_pose();
        // A plain peace sign is still "Doctor"; "Fever" needs the ring or pinky up as well.
        let h = hand(0.5, 0.3)
            .up(Finger::Index)
            .up(Finger::Middle)
            .up(Finger::Ring)
            .build();
        assert_eq!(classify(&[h], Some(&pose), &rules), Some(Gesture::Fever));
        // An open palm has index and middle raised, so it matches the two-finger shape too.
        let palm = hand(0.5, 0.3).all_up().build();
        assert_eq!(classify(&[palm], Some(&pose), &rules), Some(Gesture::Fever));
    }

    /// A fist with the thumb raised. A fist with a lowered thumb counts as "hands down".
    fn thumb_fist(x: f32, y: f32) -> HandLandmarks {
        hand(x, y).up(Finger::Thumb).build()
    }

    #[test]
    fn plain_fist_is_hands_down() {
        let fist = hand(0.4, 0.55).build();
        assert_eq!(one(fist, Some(&upright_pose())), Some(Gesture::NoGesture));
    }

    #[test]
    fn fist_positions() {
        let pose = upright_pose();
        assert_eq!(
            one(thumb_fist(0.4, 0.55), Some(&pose)),
            Some(Gesture::ChestPain)
        );
        assert_eq!(
            one(thumb_fist(0.5, 0.3), Some(&pose)),
            Some(Gesture::Headache)
        );
    }

    #[test]
    fn throat_only_in_standalone_rules() {
        let pose = pose((0.5, 0.2), (0.4, 0.6));
        let throat = thumb_fist(0.5, 0.4);
        assert_eq!(
            classify(&[throat], Some(&pose), &RuleSet::standalone()),
            Some(Gesture::ThroatPain)
        );
        // The dashboard rules fall through to the raised thumb.
        assert_eq!(one(throat, Some(&pose)), Some(Gesture::Yes));
    }

    #[test]
    fn chest_uses_right_shoulder() {
        let pose = pose((0.5, 0.2), (0.7, 0.6));
        assert_eq!(
            one(thumb_fist(0.72, 0.65), Some(&pose)),
            Some(Gesture::ChestPain)
        );
        assert_eq!(one(thumb_fist(0.3, 0.65), Some(&pose)), Some(Gesture::Yes));
    }

    #[test]
    fn single_finger_signs() {
        let yes = hand(0.8, 0.8).up(Finger::Thumb).build();
        assert_eq!(one(yes, None), Some(Gesture::Yes));

        let you = hand(0.8, 0.8).up(Finger::Index).build();
        assert_eq!(one(you, None), Some(Gesture::You));

        let i = hand(0.8, 0.8).up(Finger::Pinky).build();
        assert_eq!(one(i, None), Some(Gesture::I));
    }

    #[test]
    fn thumb_down_is_no() {
        // A lowered thumb alone leaves all hands "down", so another finger must be raised for the
        // cascade to reach the "No" rule.
        let h = hand(0.8, 0.8).thumb_down().up(Finger::Ring).build();
        assert_eq!(one(h, None), Some(Gesture::No));
    }

    #[test]
    fn thumb_and_index_match_neither_yes_nor_you() {
        let h = hand(0.8, 0.8).up(Finger::Thumb).up(Finger::Index).build();
        let result = one(h, None);
        assert_ne!(result, Some(Gesture::Yes));
        assert_ne!(result, Some(Gesture::You));
        assert_eq!(result, None);
    }

    #[test]
    fn help_needs_two_raised_hands() {
        // Ring finger only: matches no single-hand sign.
        let a = hand(0.3, 0.45).up(Finger::Ring).build();
        let b = hand(0.7, 0.45).up(Finger::Ring).build();
        assert_eq!(
            classify(&[a, b], None, &RuleSet::default()),
            Some(Gesture::Help)
        );
        assert_eq!(classify(&[a], None, &RuleSet::default()), None);

        let low = hand(0.7, 0.9).up(Finger::Ring).build();
        assert_eq!(classify(&[a, low], None, &RuleSet::default()), None);
    }

    #[test]
    fn result_is_always_one_label_or_none() {
        let mut rng = fastrand::Rng::with_seed(3);
        let pose = upright_pose();
        for _ in 0..500 {
            let mut b = hand(rng.f32(), rng.f32());
            for f in Finger::ALL {
                if rng.bool() {
                    b = b.up(f);
                }
            }
            let h = b.build();
            let a = classify(&[h], Some(&pose), &RuleSet::default());
            let again = classify(&[h], Some(&pose), &RuleSet::default());
            assert_eq!(a, again);
            if let Some(g) = a {
                assert!(Gesture::ALL.contains(&g));
            }
        }
    }

    #[test]
    fn rule_set_names() {
        assert_eq!(RuleSet::from_name("Standalone"), Some(RuleSet::standalone()));
        assert_eq!(RuleSet::from_name(" dashboard "), Some(RuleSet::dashboard()));
        assert_eq!(RuleSet::from_name("legacy"), None);
    }

    #[test]
    fn emergency_subset() {
        let emergencies: Vec<_> = Gesture::ALL.into_iter().filter(|g| g.is_emergency()).collect();
        assert_eq!(
            emergencies,
            [Gesture::Fever, Gesture::ChestPain, Gesture::Headache]
        );
    }
}
