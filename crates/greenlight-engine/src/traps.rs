//! False-positive trap detection.
//!
//! Traps are heuristic pattern-matches over sub-scores that flag likely
//! score inflation: one strong axis masking a weak one. Each trap carries a
//! tier (fundamental, addressable, warning) whose weight feeds the verdict
//! adjustment. Detection is recomputed from sub-scores; trap entries the
//! model asserted in a V6 `false_positive_check` block are OR-ed in as
//! corroborating signal.

use greenlight_models::{RawTrapEntry, Recommendation, TrapTier, TriggeredTrap};

use crate::rubric::SubScores;

/// Trap weight at which the verdict is downgraded one tier.
pub const DOWNGRADE_THRESHOLD: f64 = 2.0;
/// Trap weight at which the verdict is capped at CONSIDER.
pub const CAP_THRESHOLD: f64 = 3.0;

pub const CHARACTER_VACUUM: &str = "Character Vacuum";
pub const DIALOGUE_DISGUISE: &str = "Dialogue Disguise";
pub const PREMISE_MIRAGE: &str = "Premise Mirage";
pub const STRUCTURE_SCAFFOLD: &str = "Structure Scaffold";
pub const PROTAGONIST_PROXY: &str = "Protagonist Proxy";
pub const TONE_GLOSS: &str = "Tone Gloss";
pub const THEME_SERMON: &str = "Theme Sermon";
pub const RELATIONSHIP_SHORTCUT: &str = "Relationship Shortcut";
pub const POLISH_HALO: &str = "Polish Halo";

/// One named trap check.
struct TrapCheck {
    name: &'static str,
    tier: TrapTier,
    check: fn(&SubScores) -> bool,
}

fn character_avg(s: &SubScores) -> f64 {
    (s.protagonist + s.supporting_cast + s.relationships) / 3.0
}

fn execution_avg(s: &SubScores) -> f64 {
    (s.structure + s.scene_writing + s.dialogue) / 3.0
}

fn conceptual_avg(s: &SubScores) -> f64 {
    (s.premise + s.theme) / 2.0
}

/// The nine documented trap checks.
const TRAP_CHECKS: [TrapCheck; 9] = [
    // Plot machinery works but nobody is home.
    TrapCheck {
        name: CHARACTER_VACUUM,
        tier: TrapTier::Fundamental,
        check: |s| s.structure - character_avg(s) >= 2.0,
    },
    // Sparkling dialogue covering a hollow story.
    TrapCheck {
        name: DIALOGUE_DISGUISE,
        tier: TrapTier::Addressable,
        check: |s| s.dialogue - conceptual_avg(s) >= 2.0,
    },
    // A great idea the pages don't deliver.
    TrapCheck {
        name: PREMISE_MIRAGE,
        tier: TrapTier::Fundamental,
        check: |s| s.premise - execution_avg(s) >= 3.0,
    },
    // Outline-level command without scene craft.
    TrapCheck {
        name: STRUCTURE_SCAFFOLD,
        tier: TrapTier::Addressable,
        check: |s| s.structure - s.scene_writing >= 2.0,
    },
    // The ensemble is carrying a passive lead.
    TrapCheck {
        name: PROTAGONIST_PROXY,
        tier: TrapTier::Fundamental,
        check: |s| s.supporting_cast - s.protagonist >= 2.0,
    },
    // Voice outrunning every substantive axis.
    TrapCheck {
        name: TONE_GLOSS,
        tier: TrapTier::Warning,
        check: |s| {
            let substance = (execution_avg(s) + character_avg(s) + conceptual_avg(s)) / 3.0;
            s.voice_and_tone - substance >= 2.0
        },
    },
    // Message delivered by lecture instead of drama.
    TrapCheck {
        name: THEME_SERMON,
        tier: TrapTier::Addressable,
        check: |s| s.theme - s.dialogue >= 3.0,
    },
    // A strong lead with no one real to push against.
    TrapCheck {
        name: RELATIONSHIP_SHORTCUT,
        tier: TrapTier::Warning,
        check: |s| s.protagonist >= 8.0 && s.relationships < 5.0,
    },
    // Line-level polish masking a premise that isn't there.
    TrapCheck {
        name: POLISH_HALO,
        tier: TrapTier::Addressable,
        check: |s| s.scene_writing - s.premise >= 3.0,
    },
];

/// Detect triggered traps for one record.
///
/// Every check runs independently against the sub-scores; `asserted`
/// entries with `triggered: true` are merged in by name. The cross-trigger
/// escalation applies afterwards: Dialogue Disguise escalates from 0.5 to
/// 1.0 when Character Vacuum also fires.
pub fn detect(scores: &SubScores, asserted: &[RawTrapEntry]) -> Vec<TriggeredTrap> {
    let mut traps: Vec<TriggeredTrap> = Vec::new();

    for check in &TRAP_CHECKS {
        let recomputed = (check.check)(scores);
        let model_asserted = asserted
            .iter()
            .any(|t| t.triggered && names_match(&t.name, check.name));

        if recomputed || model_asserted {
            traps.push(TriggeredTrap {
                name: check.name.to_string(),
                tier: check.tier,
                weight: check.tier.weight(),
            });
        }
    }

    // Asserted traps whose names we don't recognize still count, at the
    // tier the model gave them (warning when unspecified).
    for entry in asserted {
        if !entry.triggered {
            continue;
        }
        let known = TRAP_CHECKS.iter().any(|c| names_match(&entry.name, c.name));
        if !known && !entry.name.trim().is_empty() {
            let tier = entry
                .tier
                .as_deref()
                .map(TrapTier::parse_lenient)
                .unwrap_or(TrapTier::Warning);
            traps.push(TriggeredTrap {
                name: entry.name.clone(),
                tier,
                weight: tier.weight(),
            });
        }
    }

    escalate(&mut traps);
    traps
}

/// Dialogue Disguise escalates to fundamental weight when Character Vacuum
/// fires in the same record.
fn escalate(traps: &mut [TriggeredTrap]) {
    let vacuum_fired = traps.iter().any(|t| t.name == CHARACTER_VACUUM);
    if !vacuum_fired {
        return;
    }
    for trap in traps.iter_mut() {
        if trap.name == DIALOGUE_DISGUISE {
            trap.weight = TrapTier::Fundamental.weight();
        }
    }
}

/// Sum of triggered trap weights (post-escalation).
pub fn weighted_trap_score(traps: &[TriggeredTrap]) -> f64 {
    traps.iter().map(|t| t.weight).sum()
}

/// Apply the trap adjustment to a computed verdict.
///
/// Weight ≥ 2.0 downgrades exactly one tier (never below PASS); weight
/// ≥ 3.0 additionally caps the result at CONSIDER.
pub fn adjust_verdict(verdict: Recommendation, trap_weight: f64) -> Recommendation {
    let mut adjusted = verdict;

    if trap_weight >= DOWNGRADE_THRESHOLD {
        adjusted = adjusted.downgraded();
    }

    if trap_weight >= CAP_THRESHOLD && adjusted.sort_rank() < Recommendation::Consider.sort_rank()
    {
        adjusted = Recommendation::Consider;
    }

    adjusted
}

/// Case- and separator-insensitive trap name comparison.
fn names_match(a: &str, b: &str) -> bool {
    fold(a) == fold(b)
}

fn fold(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_no_traps_on_even_scores() {
        assert!(detect(&uniform(7.0), &[]).is_empty());
    }

    #[test]
    fn test_character_vacuum_triggers_on_gap() {
        let s = SubScores {
            structure: 9.0,
            protagonist: 6.0,
            supporting_cast: 6.0,
            relationships: 6.0,
            ..uniform(7.0)
        };
        let traps = detect(&s, &[]);
        assert!(traps.iter().any(|t| t.name == CHARACTER_VACUUM));
    }

    #[test]
    fn test_dialogue_disguise_escalation() {
        // Both Character Vacuum and Dialogue Disguise trigger: the combined
        // contribution must be 1.0 + 1.0 = 2.0, not 1.0 + 0.5 = 1.5.
        let s = SubScores {
            structure: 9.0,
            dialogue: 9.0,
            protagonist: 6.0,
            supporting_cast: 6.0,
            relationships: 6.0,
            premise: 6.5,
            theme: 6.5,
            scene_writing: 8.0,
            voice_and_tone: 7.0,
        };
        let traps = detect(&s, &[]);
        let vacuum = traps.iter().find(|t| t.name == CHARACTER_VACUUM).unwrap();
        let disguise = traps.iter().find(|t| t.name == DIALOGUE_DISGUISE).unwrap();

        assert_eq!(vacuum.weight, 1.0);
        assert_eq!(disguise.weight, 1.0);
        assert_eq!(
            weighted_trap_score(&[vacuum.clone(), disguise.clone()]),
            2.0
        );
    }

    #[test]
    fn test_dialogue_disguise_alone_keeps_addressable_weight() {
        let s = SubScores {
            dialogue: 9.0,
            premise: 6.0,
            theme: 6.0,
            ..uniform(7.0)
        };
        let traps = detect(&s, &[]);
        let disguise = traps.iter().find(|t| t.name == DIALOGUE_DISGUISE).unwrap();
        assert_eq!(disguise.weight, 0.5);
    }

    #[test]
    fn test_asserted_trap_is_merged_by_name() {
        let asserted = vec![RawTrapEntry {
            name: "character_vacuum".to_string(),
            tier: Some("fundamental".to_string()),
            triggered: true,
            note: None,
        }];
        let traps = detect(&uniform(7.0), &asserted);
        assert!(traps.iter().any(|t| t.name == CHARACTER_VACUUM));
    }

    #[test]
    fn test_unasserted_model_entry_does_not_fire() {
        let asserted = vec![RawTrapEntry {
            name: CHARACTER_VACUUM.to_string(),
            tier: Some("fundamental".to_string()),
            triggered: false,
            note: None,
        }];
        assert!(detect(&uniform(7.0), &asserted).is_empty());
    }

    #[test]
    fn test_adjust_verdict_downgrades_one_tier() {
        assert_eq!(
            adjust_verdict(Recommendation::FilmNow, 2.0),
            Recommendation::Recommend
        );
        assert_eq!(
            adjust_verdict(Recommendation::Recommend, 2.5),
            Recommendation::Consider
        );
        assert_eq!(
            adjust_verdict(Recommendation::Pass, 2.0),
            Recommendation::Pass
        );
    }

    #[test]
    fn test_adjust_verdict_caps_at_consider() {
        // FILM_NOW with weight 3.5: one-tier downgrade lands on RECOMMEND,
        // then the cap pulls it to CONSIDER.
        assert_eq!(
            adjust_verdict(Recommendation::FilmNow, 3.5),
            Recommendation::Consider
        );
        // Already PASS stays PASS; the cap never upgrades.
        assert_eq!(
            adjust_verdict(Recommendation::Pass, 3.5),
            Recommendation::Pass
        );
    }

    #[test]
    fn test_below_threshold_is_untouched() {
        assert_eq!(
            adjust_verdict(Recommendation::FilmNow, 1.5),
            Recommendation::FilmNow
        );
    }
}
