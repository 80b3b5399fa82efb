//! Three-phase measurement primitives
//!
//! A distribution transformer reports voltage and current separately for each
//! of its three phases, conventionally labelled R, S and T. [`PhaseValues`]
//! keeps one optional value per phase and knows how to combine them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TrafoError;

/// One of the three phases of a transformer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Phase {
    R,
    S,
    T,
}

impl Phase {
    /// All phases in reporting order
    pub const ALL: [Phase; 3] = [Phase::R, Phase::S, Phase::T];

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::R => "R",
            Phase::S => "S",
            Phase::T => "T",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = TrafoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "R" | "r" => Ok(Phase::R),
            "S" | "s" => Ok(Phase::S),
            "T" | "t" => Ok(Phase::T),
            other => Err(TrafoError::InvalidPhase(other.to_string())),
        }
    }
}

/// One optional value per phase.
///
/// Values are `None` when the measurement was missing or could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PhaseValues<T> {
    pub r: Option<T>,
    pub s: Option<T>,
    pub t: Option<T>,
}

impl<T: Copy> PhaseValues<T> {
    pub fn new(r: Option<T>, s: Option<T>, t: Option<T>) -> Self {
        Self { r, s, t }
    }

    pub fn get(&self, phase: Phase) -> Option<T> {
        match phase {
            Phase::R => self.r,
            Phase::S => self.s,
            Phase::T => self.t,
        }
    }

    /// Build from a per-phase function, evaluated in R, S, T order.
    pub fn from_fn(mut f: impl FnMut(Phase) -> Option<T>) -> Self {
        Self {
            r: f(Phase::R),
            s: f(Phase::S),
            t: f(Phase::T),
        }
    }

    pub fn map<U: Copy>(&self, mut f: impl FnMut(T) -> Option<U>) -> PhaseValues<U> {
        PhaseValues::from_fn(|phase| self.get(phase).and_then(&mut f))
    }

    /// Combine two triples phase by phase. A phase is `None` unless both
    /// sides have a value for it.
    pub fn zip_with<U: Copy, V: Copy>(
        &self,
        other: &PhaseValues<U>,
        mut f: impl FnMut(T, U) -> Option<V>,
    ) -> PhaseValues<V> {
        PhaseValues::from_fn(|phase| match (self.get(phase), other.get(phase)) {
            (Some(a), Some(b)) => f(a, b),
            _ => None,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.r.is_some() && self.s.is_some() && self.t.is_some()
    }
}

impl PhaseValues<f64> {
    /// Sum of the three phases, or `None` if any phase is missing.
    pub fn total(&self) -> Option<f64> {
        Some(self.r? + self.s? + self.t?)
    }
}
