//! FSRS Core Formulas
//!
//! One implementation of the difficulty/stability/retrievability model shared
//! by FSRS-4.5 (17 weights) and FSRS-6 (21 weights). The two versions differ
//! only in which weight drives which term and in a handful of formula
//! switches, all of which live in a [`WeightLayout`]. Every function here is
//! pure and takes the weight vector plus the layout.

use crate::card::Rating;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Default FSRS-4.5 weights (17 parameters)
pub const FSRS45_WEIGHTS: [f64; 17] = [
    0.4872, 1.4003, 3.7145, 13.8206, 5.1618, 1.2298, 0.8975, 0.031, 1.6474, 0.1367, 1.0461,
    2.1072, 0.0793, 0.3246, 1.587, 0.2272, 2.8755,
];

/// Default FSRS-6 weights (21 parameters)
pub const FSRS6_WEIGHTS: [f64; 21] = [
    0.212, 1.2931, 2.3065, 8.2956, 6.4133, 0.8334, 3.0194, 0.001, 1.8722, 0.1666, 0.796, 1.4835,
    0.0614, 0.2629, 1.6483, 0.6014, 1.8729, 0.5425, 0.0912, 0.0658, 0.1542,
];

/// Forgetting-curve decay used when the layout has no decay weight
pub const DEFAULT_DECAY: f64 = 0.5;

/// Default target retention
pub const DEFAULT_RETENTION: f64 = 0.9;

pub const MIN_DIFFICULTY: f64 = 1.0;
pub const MAX_DIFFICULTY: f64 = 10.0;

/// Stability floor; keeps every transition strictly positive
pub const MIN_STABILITY: f64 = 0.01;
pub const MAX_STABILITY: f64 = 36500.0;

// ============================================================================
// WEIGHT LAYOUT
// ============================================================================

/// FSRS model generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsrsVariant {
    /// FSRS-4.5: 17 weights, fixed decay 0.5, no same-day term
    Fsrs45,
    /// FSRS-6: 21 weights, trainable decay, same-day term with S^(-w19)
    Fsrs6,
}

impl FsrsVariant {
    pub fn layout(&self) -> &'static WeightLayout {
        match self {
            FsrsVariant::Fsrs45 => &FSRS45_LAYOUT,
            FsrsVariant::Fsrs6 => &FSRS6_LAYOUT,
        }
    }

    pub fn default_weights(&self) -> Vec<f64> {
        match self {
            FsrsVariant::Fsrs45 => FSRS45_WEIGHTS.to_vec(),
            FsrsVariant::Fsrs6 => FSRS6_WEIGHTS.to_vec(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FsrsVariant::Fsrs45 => "FSRS-4.5",
            FsrsVariant::Fsrs6 => "FSRS-6",
        }
    }
}

/// How D0 is derived from the first rating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitialDifficulty {
    /// D0(G) = w4 - w5 * (G - 3)
    Linear,
    /// D0(G) = w4 - e^(w5 * (G - 1)) + 1
    Exponential,
}

/// Where the forgetting-curve decay comes from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecaySource {
    Fixed(f64),
    Weight(usize),
}

/// Weight indices for the same-day stability term
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SameDayWeights {
    pub scale: usize,
    pub offset: usize,
    /// Stability damping exponent (S^-w); absent means no damping
    pub damping: Option<usize>,
}

/// Named weight-index table for one FSRS generation
#[derive(Debug, Clone, PartialEq)]
pub struct WeightLayout {
    pub weight_count: usize,
    /// S0 for Again, Hard, Good, Easy
    pub initial_stability: [usize; 4],
    pub initial_difficulty_base: usize,
    pub initial_difficulty_scale: usize,
    pub initial_difficulty: InitialDifficulty,
    pub difficulty_delta: usize,
    /// Damp difficulty changes by (10 - D) / 9
    pub linear_damping: bool,
    pub mean_reversion: usize,
    /// D0 rating that difficulty reverts towards
    pub mean_reversion_target: Rating,
    pub recall_base: usize,
    pub recall_stability_decay: usize,
    pub recall_retrievability: usize,
    pub hard_penalty: usize,
    pub easy_bonus: usize,
    pub forget_base: usize,
    pub forget_difficulty: usize,
    pub forget_stability: usize,
    pub forget_retrievability: usize,
    pub same_day: Option<SameDayWeights>,
    pub decay: DecaySource,
}

pub static FSRS45_LAYOUT: WeightLayout = WeightLayout {
    weight_count: 17,
    initial_stability: [0, 1, 2, 3],
    initial_difficulty_base: 4,
    initial_difficulty_scale: 5,
    initial_difficulty: InitialDifficulty::Linear,
    difficulty_delta: 6,
    linear_damping: false,
    mean_reversion: 7,
    mean_reversion_target: Rating::Good,
    recall_base: 8,
    recall_stability_decay: 9,
    recall_retrievability: 10,
    hard_penalty: 15,
    easy_bonus: 16,
    forget_base: 11,
    forget_difficulty: 12,
    forget_stability: 13,
    forget_retrievability: 14,
    same_day: None,
    decay: DecaySource::Fixed(DEFAULT_DECAY),
};

pub static FSRS6_LAYOUT: WeightLayout = WeightLayout {
    weight_count: 21,
    initial_stability: [0, 1, 2, 3],
    initial_difficulty_base: 4,
    initial_difficulty_scale: 5,
    initial_difficulty: InitialDifficulty::Exponential,
    difficulty_delta: 6,
    linear_damping: true,
    mean_reversion: 7,
    mean_reversion_target: Rating::Easy,
    recall_base: 8,
    recall_stability_decay: 9,
    recall_retrievability: 10,
    hard_penalty: 15,
    easy_bonus: 16,
    forget_base: 11,
    forget_difficulty: 12,
    forget_stability: 13,
    forget_retrievability: 14,
    same_day: Some(SameDayWeights {
        scale: 17,
        offset: 18,
        damping: Some(19),
    }),
    decay: DecaySource::Weight(20),
};

impl WeightLayout {
    /// Positive decay exponent for the forgetting curve
    pub fn decay(&self, w: &[f64]) -> f64 {
        let d = match self.decay {
            DecaySource::Fixed(d) => d,
            DecaySource::Weight(i) => w[i],
        };
        // A zero decay flattens the curve into a division by zero
        if d > 0.0 { d } else { DEFAULT_DECAY }
    }
}

// ============================================================================
// FORMULAS
// ============================================================================

fn clamp_difficulty(d: f64) -> f64 {
    d.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

fn clamp_stability(s: f64) -> f64 {
    if s.is_nan() {
        return MIN_STABILITY;
    }
    s.clamp(MIN_STABILITY, MAX_STABILITY)
}

/// Curve factor chosen so that R(S, S) = 0.9
fn curve_factor(decay: f64) -> f64 {
    0.9_f64.powf(-1.0 / decay) - 1.0
}

/// S0(G)
pub fn initial_stability(w: &[f64], layout: &WeightLayout, rating: Rating) -> f64 {
    let index = layout.initial_stability[(rating.as_i32() - 1) as usize];
    clamp_stability(w[index])
}

/// D0(G)
pub fn initial_difficulty(w: &[f64], layout: &WeightLayout, rating: Rating) -> f64 {
    let g = rating.as_f64();
    let base = w[layout.initial_difficulty_base];
    let scale = w[layout.initial_difficulty_scale];
    let d = match layout.initial_difficulty {
        InitialDifficulty::Linear => base - scale * (g - 3.0),
        InitialDifficulty::Exponential => base - (scale * (g - 1.0)).exp() + 1.0,
    };
    clamp_difficulty(d)
}

/// D' after a rating, with mean reversion towards D0 of the layout's target
pub fn next_difficulty(w: &[f64], layout: &WeightLayout, difficulty: f64, rating: Rating) -> f64 {
    let delta = -w[layout.difficulty_delta] * (rating.as_f64() - 3.0);
    let moved = if layout.linear_damping {
        difficulty + delta * (MAX_DIFFICULTY - difficulty) / 9.0
    } else {
        difficulty + delta
    };
    let target = initial_difficulty(w, layout, layout.mean_reversion_target);
    let reversion = w[layout.mean_reversion];
    clamp_difficulty(reversion * target + (1.0 - reversion) * moved)
}

/// R(t, S) = (1 + factor * t / S)^(-decay)
///
/// Non-positive stability is treated as fully forgotten.
pub fn retrievability(w: &[f64], layout: &WeightLayout, elapsed_days: f64, stability: f64) -> f64 {
    if stability <= 0.0 {
        return 0.0;
    }
    let decay = layout.decay(w);
    let t = elapsed_days.max(0.0);
    (1.0 + curve_factor(decay) * t / stability)
        .powf(-decay)
        .clamp(0.0, 1.0)
}

/// Stability after a successful recall (Hard, Good or Easy)
pub fn recall_stability(
    w: &[f64],
    layout: &WeightLayout,
    difficulty: f64,
    stability: f64,
    retrievability: f64,
    rating: Rating,
) -> f64 {
    let hard = if rating == Rating::Hard { w[layout.hard_penalty] } else { 1.0 };
    let easy = if rating == Rating::Easy { w[layout.easy_bonus] } else { 1.0 };
    let growth = w[layout.recall_base].exp()
        * (11.0 - difficulty)
        * stability.powf(-w[layout.recall_stability_decay])
        * ((w[layout.recall_retrievability] * (1.0 - retrievability)).exp() - 1.0)
        * hard
        * easy;
    clamp_stability(stability * (1.0 + growth))
}

/// Stability after a lapse; never exceeds the stability before it
pub fn forget_stability(
    w: &[f64],
    layout: &WeightLayout,
    difficulty: f64,
    stability: f64,
    retrievability: f64,
) -> f64 {
    let new_s = w[layout.forget_base]
        * difficulty.powf(-w[layout.forget_difficulty])
        * ((stability + 1.0).powf(w[layout.forget_stability]) - 1.0)
        * (w[layout.forget_retrievability] * (1.0 - retrievability)).exp();

    let ceiling = match layout.same_day {
        Some(sd) => stability / (w[sd.scale] * w[sd.offset]).exp(),
        None => stability,
    };
    clamp_stability(new_s.min(ceiling))
}

/// Stability after a review on the same day as the previous one.
///
/// Layouts without same-day weights leave stability unchanged.
pub fn same_day_stability(w: &[f64], layout: &WeightLayout, stability: f64, rating: Rating) -> f64 {
    let Some(sd) = layout.same_day else {
        return clamp_stability(stability);
    };
    let damping = sd.damping.map(|i| stability.powf(-w[i])).unwrap_or(1.0);
    let mut increase = (w[sd.scale] * (rating.as_f64() - 3.0 + w[sd.offset])).exp() * damping;
    if rating.as_i32() >= 3 {
        increase = increase.max(1.0);
    }
    clamp_stability(stability * increase)
}

/// Interval in days at which R decays to `retention`, before rounding
pub fn next_interval_raw(w: &[f64], layout: &WeightLayout, stability: f64, retention: f64) -> f64 {
    let decay = layout.decay(w);
    stability / curve_factor(decay) * (retention.powf(-1.0 / decay) - 1.0)
}

/// Whole-day interval clamped to `[1, maximum_interval]`
pub fn next_interval(
    w: &[f64],
    layout: &WeightLayout,
    stability: f64,
    retention: f64,
    maximum_interval: u32,
) -> i64 {
    let raw = next_interval_raw(w, layout, stability, retention);
    clamp_interval(raw.round(), maximum_interval)
}

pub(crate) fn clamp_interval(days: f64, maximum_interval: u32) -> i64 {
    let max = maximum_interval.max(1) as i64;
    if days.is_nan() {
        return 1;
    }
    (days.max(1.0).min(max as f64) as i64).clamp(1, max)
}

// ============================================================================
// TESTS
// ============================================================================
