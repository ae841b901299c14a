//! Problems that can be estimated by hit-or-miss sampling.
//!
//! Each kind carries its sampling domain, membership predicate, scaling rule
//! and the analytically known value used for error reporting. The reference
//! value is never consulted while estimating.

use std::fmt;

use rand::distributions::{Distribution, Uniform};
use rand::Rng;

/// A sampled point and whether it satisfied the membership predicate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    pub x: f64,
    pub y: f64,
    pub hit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProblemKind {
    /// Points in `[-1, 1) x [-1, 1)` falling inside the unit circle; estimates π.
    CircleMembership,
    /// Points in `[0, 1) x [0, 1)` falling under `y = x²`; estimates ∫₀¹ x² dx.
    CurveMembership,
}

impl ProblemKind {
    pub const ALL: [ProblemKind; 2] = [ProblemKind::CircleMembership, ProblemKind::CurveMembership];

    /// Half-open range both coordinates are drawn from.
    pub fn domain(&self) -> (f64, f64) {
        match self {
            ProblemKind::CircleMembership => (-1.0, 1.0),
            ProblemKind::CurveMembership => (0.0, 1.0),
        }
    }

    pub fn is_hit(&self, x: f64, y: f64) -> bool {
        match self {
            ProblemKind::CircleMembership => x * x + y * y <= 1.0,
            ProblemKind::CurveMembership => y < x * x,
        }
    }

    /// Turn a hit ratio into an estimate of the target quantity.
    pub fn scale(&self, hit_ratio: f64) -> f64 {
        match self {
            // circle area / square area = π / 4
            ProblemKind::CircleMembership => 4.0 * hit_ratio,
            ProblemKind::CurveMembership => hit_ratio,
        }
    }

    /// Scale `hits / samples`; `None` when nothing was sampled.
    pub fn estimate_from(&self, hits: u64, samples: u64) -> Option<f64> {
        (samples > 0).then(|| self.scale(hits as f64 / samples as f64))
    }

    pub fn reference_value(&self) -> f64 {
        match self {
            ProblemKind::CircleMembership => std::f64::consts::PI,
            ProblemKind::CurveMembership => 1.0 / 3.0,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProblemKind::CircleMembership => "Pi Estimation (Circle)",
            ProblemKind::CurveMembership => "Integration x^2 [0,1]",
        }
    }

    pub fn sampler(&self) -> PointSampler {
        let (low, high) = self.domain();
        PointSampler {
            problem: *self,
            range: Uniform::new(low, high),
        }
    }
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Draws independent points from a problem's domain and classifies them.
#[derive(Debug, Clone, Copy)]
pub struct PointSampler {
    problem: ProblemKind,
    range: Uniform<f64>,
}

impl PointSampler {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> SamplePoint {
        let x = self.range.sample(rng);
        let y = self.range.sample(rng);
        SamplePoint {
            x,
            y,
            hit: self.problem.is_hit(x, y),
        }
    }
}
