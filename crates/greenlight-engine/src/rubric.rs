//! Rubric arithmetic: weighted scores, penalties, and verdict tiers.
//!
//! The numbers here reproduce the scoring prompt's documented rubric
//! exactly. Same inputs always produce same outputs: no randomness, no
//! hidden state, no clock.

use tracing::warn;

use greenlight_models::{CriticalFailureDetail, Recommendation};

// --- pillar weights ---
pub const EXECUTION_CRAFT_WEIGHT: f64 = 0.40;
pub const CHARACTER_SYSTEM_WEIGHT: f64 = 0.30;
pub const CONCEPTUAL_STRENGTH_WEIGHT: f64 = 0.20;
pub const VOICE_AND_TONE_WEIGHT: f64 = 0.10;

// --- sub-dimension weights within each pillar ---
pub const STRUCTURE_WEIGHT: f64 = 0.375;
pub const SCENE_WRITING_WEIGHT: f64 = 0.375;
pub const DIALOGUE_WEIGHT: f64 = 0.25;
pub const PROTAGONIST_WEIGHT: f64 = 0.50;
pub const SUPPORTING_CAST_WEIGHT: f64 = 0.333;
pub const RELATIONSHIPS_WEIGHT: f64 = 0.167;
pub const PREMISE_WEIGHT: f64 = 0.50;
pub const THEME_WEIGHT: f64 = 0.50;

/// Hard floor for the summed critical-failure penalty.
pub const PENALTY_FLOOR: f64 = -3.0;

/// The nine leaf sub-dimension scores the rubric operates on.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SubScores {
    pub structure: f64,
    pub scene_writing: f64,
    pub dialogue: f64,
    pub protagonist: f64,
    pub supporting_cast: f64,
    pub relationships: f64,
    pub premise: f64,
    pub theme: f64,
    pub voice_and_tone: f64,
}

impl SubScores {
    /// Clamp every score into [0, 10]. Returns the clamped copy and whether
    /// anything actually moved, so callers can log without aborting.
    pub fn clamped(&self) -> (Self, bool) {
        let mut out = *self;
        let mut changed = false;
        for v in [
            &mut out.structure,
            &mut out.scene_writing,
            &mut out.dialogue,
            &mut out.protagonist,
            &mut out.supporting_cast,
            &mut out.relationships,
            &mut out.premise,
            &mut out.theme,
            &mut out.voice_and_tone,
        ] {
            let clamped = v.clamp(0.0, 10.0);
            if clamped != *v {
                changed = true;
                *v = clamped;
            }
        }
        (out, changed)
    }

    /// All nine scores, for sub-dimension counting rules.
    pub fn all(&self) -> [f64; 9] {
        [
            self.structure,
            self.scene_writing,
            self.dialogue,
            self.protagonist,
            self.supporting_cast,
            self.relationships,
            self.premise,
            self.theme,
            self.voice_and_tone,
        ]
    }

    pub fn execution_craft(&self) -> f64 {
        self.structure * STRUCTURE_WEIGHT
            + self.scene_writing * SCENE_WRITING_WEIGHT
            + self.dialogue * DIALOGUE_WEIGHT
    }

    pub fn character_system(&self) -> f64 {
        self.protagonist * PROTAGONIST_WEIGHT
            + self.supporting_cast * SUPPORTING_CAST_WEIGHT
            + self.relationships * RELATIONSHIPS_WEIGHT
    }

    pub fn conceptual_strength(&self) -> f64 {
        self.premise * PREMISE_WEIGHT + self.theme * THEME_WEIGHT
    }

    /// The final weighted quality score.
    pub fn final_weighted(&self) -> f64 {
        self.execution_craft() * EXECUTION_CRAFT_WEIGHT
            + self.character_system() * CHARACTER_SYSTEM_WEIGHT
            + self.conceptual_strength() * CONCEPTUAL_STRENGTH_WEIGHT
            + self.voice_and_tone * VOICE_AND_TONE_WEIGHT
    }
}

/// Sum the per-failure penalties and clamp to the floor.
///
/// Clamp-then-add: the clamped sum is what gets added to the weighted
/// score, so the adjustment never exceeds 3.0 points. Result is always in
/// [-3.0, 0.0].
pub fn penalty_total(failures: &[CriticalFailureDetail]) -> f64 {
    let sum: f64 = failures.iter().map(|f| f.penalty).sum();
    sum.clamp(PENALTY_FLOOR, 0.0)
}

/// The rubric's deterministic output for one record.
#[derive(Debug, Clone, PartialEq)]
pub struct RubricOutcome {
    /// Final weighted score before penalties, in [0, 10]
    pub weighted_score: f64,
    /// Clamped penalty sum, in [-3.0, 0.0]
    pub penalty_total: f64,
    /// Weighted score after penalties, in [0, 10]
    pub adjusted_score: f64,
    /// Verdict before trap adjustment
    pub verdict: Recommendation,
    /// True when any input score had to be clamped into range
    pub clamped: bool,
}

/// Evaluate the rubric for one set of sub-scores.
///
/// Out-of-range scores are clamped and flagged, never rejected; the
/// pipeline must not abort on producer sloppiness.
pub fn evaluate(
    scores: &SubScores,
    failures: &[CriticalFailureDetail],
    major_weaknesses: usize,
) -> RubricOutcome {
    let (s, clamped) = scores.clamped();
    if clamped {
        warn!("sub-scores outside [0, 10] were clamped before rubric evaluation");
    }

    let weighted = s.final_weighted();
    let penalty = penalty_total(failures);
    let adjusted = (weighted + penalty).clamp(0.0, 10.0);

    let verdict = verdict_for(&s, adjusted, penalty, failures, major_weaknesses);

    RubricOutcome {
        weighted_score: weighted,
        penalty_total: penalty,
        adjusted_score: adjusted,
        verdict,
        clamped,
    }
}

/// Tier assignment: the PASS force-conditions override everything; then the
/// tiers are checked from most to least restrictive and the first full
/// match wins.
fn verdict_for(
    s: &SubScores,
    adjusted: f64,
    penalty: f64,
    failures: &[CriticalFailureDetail],
    major_weaknesses: usize,
) -> Recommendation {
    let below_5 = s.all().iter().filter(|&&v| v < 5.0).count();
    let min_sub = s.all().iter().cloned().fold(f64::INFINITY, f64::min);

    // Any one of these forces PASS regardless of the other tiers.
    if adjusted < 5.5
        || s.protagonist < 4.0
        || below_5 >= 3
        || s.premise < 4.0
        || penalty <= -2.5
    {
        return Recommendation::Pass;
    }

    let pillars_at_8 = s.execution_craft() >= 8.0
        && s.character_system() >= 8.0
        && s.conceptual_strength() >= 8.0
        && s.voice_and_tone >= 8.0;

    if adjusted >= 8.5
        && pillars_at_8
        && s.protagonist >= 9.0
        && s.voice_and_tone >= 9.0
        && failures.is_empty()
        && major_weaknesses == 0
    {
        return Recommendation::FilmNow;
    }

    if adjusted >= 7.5
        && s.premise >= 8.0
        && s.protagonist >= 7.0
        && min_sub >= 6.0
        && penalty > -1.0
        && major_weaknesses <= 1
    {
        return Recommendation::Recommend;
    }

    if (5.5..7.5).contains(&adjusted) && s.premise >= 6.0 && penalty > -2.0 && below_5 <= 2 {
        return Recommendation::Consider;
    }

    Recommendation::Pass
}

#[cfg(test)]
mod tests {
    use super::*;
    use greenlight_models::Severity;

    fn failure(severity: Severity) -> CriticalFailureDetail {
        CriticalFailureDetail {
            failure: "test".to_string(),
            severity,
            penalty: severity.default_penalty(),
            evidence: None,
        }
    }

    fn uniform(v: f64) -> SubScores {
        SubScores {
            structure: v,
            scene_writing: v,
            dialogue: v,
            protagonist: v,
            supporting_cast: v,
            relationships: v,
            premise: v,
            theme: v,
            voice_and_tone: v,
        }
    }

    #[test]
    fn test_execution_craft_arithmetic() {
        let s = SubScores {
            structure: 8.0,
            scene_writing: 6.0,
            dialogue: 7.0,
            ..Default::default()
        };
        // 8*0.375 + 6*0.375 + 7*0.25 = 7.0
        assert!((s.execution_craft() - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_uniform_scores_are_idempotent() {
        let s = uniform(8.0);
        assert!((s.final_weighted() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_penalty_clamps_to_floor() {
        // Four criticals sum to -4.8 but must clamp to exactly -3.0.
        let failures = vec![
            failure(Severity::Critical),
            failure(Severity::Critical),
            failure(Severity::Critical),
            failure(Severity::Critical),
        ];
        assert_eq!(penalty_total(&failures), -3.0);
    }

    #[test]
    fn test_penalty_below_cap_is_untouched() {
        let failures = vec![failure(Severity::Minor), failure(Severity::Moderate)];
        assert!((penalty_total(&failures) - (-0.8)).abs() < 1e-9);
    }

    #[test]
    fn test_penalty_empty_is_zero() {
        assert_eq!(penalty_total(&[]), 0.0);
    }

    #[test]
    fn test_verdict_boundary_at_5_5() {
        // adjusted 5.49 → PASS
        let outcome = evaluate(&uniform(5.49), &[], 0);
        assert_eq!(outcome.verdict, Recommendation::Pass);

        // adjusted exactly 5.5 with premise ≥ 6 qualifies for CONSIDER.
        // premise 6 / theme 5 keeps conceptual_strength at 5.5, so the
        // weighted score lands on the boundary exactly.
        let s = SubScores {
            premise: 6.0,
            theme: 5.0,
            ..uniform(5.5)
        };
        let outcome = evaluate(&s, &[], 0);
        assert!((outcome.adjusted_score - 5.5).abs() < 1e-9);
        assert_eq!(outcome.verdict, Recommendation::Consider);
    }

    #[test]
    fn test_film_now_requires_zero_failures() {
        let s = SubScores {
            protagonist: 9.0,
            voice_and_tone: 9.0,
            ..uniform(9.0)
        };
        assert_eq!(evaluate(&s, &[], 0).verdict, Recommendation::FilmNow);

        let with_failure = evaluate(&s, &[failure(Severity::Minor)], 0);
        assert_ne!(with_failure.verdict, Recommendation::FilmNow);
    }

    #[test]
    fn test_recommend_tier() {
        let s = SubScores {
            premise: 8.0,
            theme: 8.0,
            protagonist: 8.0,
            ..uniform(7.5)
        };
        let outcome = evaluate(&s, &[], 0);
        assert!(outcome.adjusted_score >= 7.5);
        assert_eq!(outcome.verdict, Recommendation::Recommend);

        // Two major weaknesses disqualify RECOMMEND
        let outcome = evaluate(&s, &[], 2);
        assert_ne!(outcome.verdict, Recommendation::Recommend);
    }

    #[test]
    fn test_low_protagonist_forces_pass() {
        let s = SubScores {
            protagonist: 3.9,
            ..uniform(9.0)
        };
        assert_eq!(evaluate(&s, &[], 0).verdict, Recommendation::Pass);
    }

    #[test]
    fn test_heavy_penalty_forces_pass() {
        let s = uniform(8.0);
        let failures = vec![
            failure(Severity::Critical),
            failure(Severity::Critical),
            failure(Severity::Critical),
        ];
        // sum -3.6 clamps to -3.0, and -3.0 <= -2.5 forces PASS
        assert_eq!(evaluate(&s, &failures, 0).verdict, Recommendation::Pass);
    }

    #[test]
    fn test_out_of_range_scores_are_clamped_not_rejected() {
        let s = SubScores {
            structure: 14.0,
            premise: -2.0,
            ..uniform(7.0)
        };
        let outcome = evaluate(&s, &[], 0);
        assert!(outcome.clamped);
        assert!(outcome.weighted_score <= 10.0);
        // premise clamped to 0 < 4 forces PASS
        assert_eq!(outcome.verdict, Recommendation::Pass);
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let s = uniform(7.3);
        let failures = vec![failure(Severity::Moderate)];
        assert_eq!(evaluate(&s, &failures, 1), evaluate(&s, &failures, 1));
    }
}
