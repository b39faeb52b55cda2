//! Timed status-effect modifiers

use serde::{Deserialize, Serialize};

use crate::core::types::Hours;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Movement speed scaled by `1 - magnitude`
    Slowed,
    /// Hunger gain scaled by `1 - magnitude`
    WellFed,
    /// Hitpoints lost per hour
    Bleeding,
}

/// A modifier that lasts until `expires_at`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub kind: EffectKind,
    pub magnitude: f32,
    pub expires_at: Hours,
}

impl StatusEffect {
    pub fn new(kind: EffectKind, magnitude: f32, expires_at: Hours) -> Self {
        Self {
            kind,
            magnitude: magnitude.clamp(0.0, 1.0),
            expires_at,
        }
    }

    pub fn is_expired(&self, now: Hours) -> bool {
        now >= self.expires_at
    }
}

/// Effects attached to one entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Effects {
    active: Vec<StatusEffect>,
}

impl Effects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an effect; an existing effect of the same kind is replaced
    pub fn apply(&mut self, effect: StatusEffect) {
        self.active.retain(|e| e.kind != effect.kind);
        self.active.push(effect);
    }

    pub fn has(&self, kind: EffectKind) -> bool {
        self.active.iter().any(|e| e.kind == kind)
    }

    pub fn magnitude(&self, kind: EffectKind) -> f32 {
        self.active
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.magnitude)
            .fold(0.0, f32::max)
    }

    pub fn speed_multiplier(&self) -> f32 {
        1.0 - self.magnitude(EffectKind::Slowed)
    }

    pub fn hunger_multiplier(&self) -> f32 {
        1.0 - self.magnitude(EffectKind::WellFed)
    }

    /// Drop expired effects, returning how many were removed
    pub fn expire(&mut self, now: Hours) -> usize {
        let before = self.active.len();
        self.active.retain(|e| !e.is_expired(now));
        before - self.active.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusEffect> {
        self.active.iter()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_replaces_same_kind() {
        let mut effects = Effects::new();
        effects.apply(StatusEffect::new(EffectKind::Slowed, 0.5, 2.0));
        effects.apply(StatusEffect::new(EffectKind::Slowed, 0.2, 3.0));
        assert_eq!(effects.len(), 1);
        assert!((effects.speed_multiplier() - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_expire() {
        let mut effects = Effects::new();
        effects.apply(StatusEffect::new(EffectKind::Slowed, 0.5, 2.0));
        effects.apply(StatusEffect::new(EffectKind::WellFed, 0.5, 5.0));
        assert_eq!(effects.expire(2.0), 1);
        assert!(!effects.has(EffectKind::Slowed));
        assert!(effects.has(EffectKind::WellFed));
    }

    #[test]
    fn test_magnitude_is_clamped() {
        let effect = StatusEffect::new(EffectKind::Bleeding, 3.0, 1.0);
        assert_eq!(effect.magnitude, 1.0);
    }
}
