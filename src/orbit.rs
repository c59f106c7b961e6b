//! Text labels on elliptical orbits around the focal point.
//!
//! Labels are stored as a flat array indexed by position in the input list.
//! Each label's orbit (phase and radii) is fixed when the list is set, so the
//! same list at the same time always lands in the same place. Replacing the
//! list rebuilds every orbit from scratch; no index survives a list change.
//!
//! ```ignore
//! let mut orbits = OrbitLabelSystem::new(42);
//! orbits.set_labels(ProfileLabels::new().with_hobby("camping").with_age(30).build());
//! orbits.step_into(t, progress, &mut placements);
//! ```

use crate::progress::ProgressSignal;
use crate::random::keyed;
use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Progress (normalized) at which labels stop being drawn.
pub const LABEL_CUTOFF: f32 = 0.99;

/// Angular speed of the main orbit (rad/s).
const ORBIT_RATE: f32 = 0.5;

/// One label and its orbit.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitLabel {
    /// Label text as supplied.
    pub text: String,
    /// Phase around the ellipse, `i / total · 2π`.
    pub angle_offset: f32,
    /// Semi-axis along X, in `[4, 6)`.
    pub radius_x: f32,
    /// Semi-axis along Z, in `[3, 5)`.
    pub radius_z: f32,
}

impl OrbitLabel {
    /// Position on the orbit at `time`.
    pub fn position(&self, time: f32) -> Vec3 {
        let t = time * ORBIT_RATE + self.angle_offset;
        let bob = time * ORBIT_RATE * 3.0 + self.angle_offset;
        Vec3::new(
            t.cos() * self.radius_x,
            bob.sin() + t.cos() * 0.5,
            t.sin() * self.radius_z,
        )
    }

    /// Text as drawn, bracketed.
    pub fn display_text(&self) -> String {
        format!("[{}]", self.text)
    }
}

/// Where to draw one label this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelPlacement {
    /// Index into [`OrbitLabelSystem::labels`].
    pub index: usize,
    /// World position.
    pub position: Vec3,
    /// Orientation with local +Z pointing at the origin.
    pub rotation: Quat,
}

/// Places a variable number of labels on independent orbits.
#[derive(Debug, Clone, Default)]
pub struct OrbitLabelSystem {
    labels: Vec<OrbitLabel>,
    seed: u64,
}

impl OrbitLabelSystem {
    /// Empty system; orbit radii for future labels are keyed by `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            labels: Vec::new(),
            seed,
        }
    }

    /// Replace the label list, rebuilding every orbit.
    ///
    /// Re-supplying an identical list is a no-op.
    pub fn set_labels<I, S>(&mut self, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let texts: Vec<String> = labels.into_iter().map(Into::into).collect();
        if texts.len() == self.labels.len() && texts.iter().zip(&self.labels).all(|(a, b)| *a == b.text) {
            return;
        }

        let total = texts.len();
        self.labels = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| OrbitLabel {
                text,
                angle_offset: i as f32 / total as f32 * TAU,
                radius_x: 4.0 + keyed(self.seed, i as u32, 0) * 2.0,
                radius_z: 3.0 + keyed(self.seed, i as u32, 1) * 2.0,
            })
            .collect();
        log::debug!("orbit labels rebuilt ({} labels)", total);
    }

    /// Drop all labels.
    pub fn clear(&mut self) {
        self.labels.clear();
    }

    /// Current labels in input order.
    pub fn labels(&self) -> &[OrbitLabel] {
        &self.labels
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether there are no labels.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Whether labels are drawn at this progress.
    #[inline]
    pub fn is_visible(progress: ProgressSignal) -> bool {
        progress.value() < LABEL_CUTOFF
    }

    /// Write one placement per label, or none once terminal.
    pub fn step_into(&self, time: f32, progress: ProgressSignal, out: &mut Vec<LabelPlacement>) {
        out.clear();
        if !Self::is_visible(progress) {
            return;
        }
        out.extend(self.labels.iter().enumerate().map(|(index, label)| {
            let position = label.position(time);
            LabelPlacement {
                index,
                position,
                rotation: look_at_origin(position),
            }
        }));
    }
}

/// Orientation whose +Z axis points from `position` toward the origin, Y up.
fn look_at_origin(position: Vec3) -> Quat {
    let forward = -position;
    if forward.length_squared() < 1e-12 {
        return Quat::IDENTITY;
    }
    // look_at_rh builds a view matrix looking down -Z; inverting it and
    // flipping yields a model frame whose +Z faces the target.
    let view = Mat4::look_at_rh(position, Vec3::ZERO, Vec3::Y);
    let model = view.inverse();
    let (_, rotation, _) = model.to_scale_rotation_translation();
    rotation * Quat::from_rotation_y(std::f32::consts::PI)
}

/// Builds an orbit label list from the gift profile form.
///
/// Empty fields are skipped; the age is rendered with the `歳` suffix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileLabels {
    pub gender: Option<String>,
    pub relationship: Option<String>,
    pub occasion: Option<String>,
    pub hobby: Option<String>,
    pub age: Option<u32>,
    pub budget: Option<String>,
}

impl ProfileLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    pub fn with_relationship(mut self, relationship: impl Into<String>) -> Self {
        self.relationship = Some(relationship.into());
        self
    }

    pub fn with_occasion(mut self, occasion: impl Into<String>) -> Self {
        self.occasion = Some(occasion.into());
        self
    }

    pub fn with_hobby(mut self, hobby: impl Into<String>) -> Self {
        self.hobby = Some(hobby.into());
        self
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_budget(mut self, budget: impl Into<String>) -> Self {
        self.budget = Some(budget.into());
        self
    }

    /// Labels in display order.
    pub fn build(&self) -> Vec<String> {
        let text_fields = [&self.gender, &self.relationship, &self.occasion, &self.hobby];
        let mut labels: Vec<String> = text_fields
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .cloned()
            .collect();
        if let Some(age) = self.age.filter(|&a| a > 0) {
            labels.push(format!("{age}歳"));
        }
        if let Some(budget) = self.budget.as_ref().filter(|s| !s.is_empty()) {
            labels.push(budget.clone());
        }
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system(labels: &[&str]) -> OrbitLabelSystem {
        let mut orbits = OrbitLabelSystem::new(7);
        orbits.set_labels(labels.iter().copied());
        orbits
    }

    #[test]
    fn test_one_placement_per_label() {
        let orbits = system(&["a", "b", "c", "d"]);
        let mut out = Vec::new();
        orbits.step_into(2.0, ProgressSignal::from_percent(50.0), &mut out);
        assert_eq!(out.len(), 4);
        assert!(out.iter().enumerate().all(|(i, p)| p.index == i));
    }

    #[test]
    fn test_orbit_parameters() {
        let orbits = system(&["a", "b", "c", "d"]);
        for (i, label) in orbits.labels().iter().enumerate() {
            assert!((label.angle_offset - i as f32 / 4.0 * TAU).abs() < 1e-6);
            assert!((4.0..6.0).contains(&label.radius_x));
            assert!((3.0..5.0).contains(&label.radius_z));
        }
    }

    #[test]
    fn test_position_formula() {
        let label = OrbitLabel {
            text: "x".into(),
            angle_offset: 0.0,
            radius_x: 5.0,
            radius_z: 4.0,
        };
        let p = label.position(0.0);
        assert!((p.x - 5.0).abs() < 1e-6);
        assert!((p.y - 0.5).abs() < 1e-6);
        assert!(p.z.abs() < 1e-6);
    }

    #[test]
    fn test_same_labels_same_positions() {
        let a = system(&["gift", "friend"]);
        let b = system(&["gift", "friend"]);
        let (mut pa, mut pb) = (Vec::new(), Vec::new());
        a.step_into(3.3, ProgressSignal::ZERO, &mut pa);
        b.step_into(3.3, ProgressSignal::ZERO, &mut pb);
        assert_eq!(pa, pb);
    }

    #[test]
    fn test_list_change_resets_orbits() {
        let mut orbits = system(&["a", "b", "c"]);
        orbits.set_labels(["a", "b"]);
        assert_eq!(orbits.len(), 2);
        assert!((orbits.labels()[1].angle_offset - TAU / 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_and_terminal_produce_nothing() {
        let mut out = Vec::new();
        system(&[]).step_into(1.0, ProgressSignal::from_percent(10.0), &mut out);
        assert!(out.is_empty());

        system(&["a"]).step_into(1.0, ProgressSignal::from_percent(99.0), &mut out);
        assert!(out.is_empty());
        system(&["a"]).step_into(1.0, ProgressSignal::from_percent(98.9), &mut out);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_labels_face_origin() {
        let orbits = system(&["a", "b", "c"]);
        let mut out = Vec::new();
        orbits.step_into(1.7, ProgressSignal::ZERO, &mut out);
        for placement in &out {
            let facing = placement.rotation * Vec3::Z;
            let to_origin = (-placement.position).normalize();
            assert!(facing.dot(to_origin) > 0.999, "facing {facing:?}");
        }
    }

    #[test]
    fn test_profile_labels() {
        let labels = ProfileLabels::new()
            .with_gender("female")
            .with_hobby("")
            .with_age(30)
            .with_budget("5000円")
            .build();
        assert_eq!(labels, vec!["female", "30歳", "5000円"]);

        let label = OrbitLabel {
            text: labels[1].clone(),
            angle_offset: 0.0,
            radius_x: 4.0,
            radius_z: 3.0,
        };
        assert_eq!(label.display_text(), "[30歳]");
    }
}
