//! Normalization of raw analysis documents into canonical records.
//!
//! One pure function per schema version, dispatched on the tagged
//! [`RawAnalysis`] union, both returning the same canonical [`Screenplay`].
//! Missing optional fields never fail a record; missing identity (no title
//! and no source filename) does. Re-normalizing the same input yields an
//! identical record.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, warn};

use greenlight_models::{
    canonical_genre, screenplay_id_from_filename, BudgetCategory, Collection,
    CriticalFailureDetail, DimensionScores, FileMeta, PillarScores, ProducerMetrics, RawAnalysis,
    RawAnalysisV5, RawAnalysisV6, RawCriticalFailure, RawFileMetadata, RawPillar,
    RawProducerMetrics, Recommendation, SchemaVersion, Screenplay, Severity, TmdbStatus,
};

use crate::rubric::{self, SubScores};
use crate::traps;

/// Result type for normalization.
pub type NormalizeResult<T> = Result<T, NormalizeError>;

/// Errors that fail a single record (the batch continues without it).
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Record has neither a title nor a source filename")]
    MissingIdentity,

    #[error("Cannot derive id from filename {filename:?}: {reason}")]
    UnusableFilename { filename: String, reason: String },
}

/// Default category label when the producer supplied none.
const DEFAULT_CATEGORY: &str = "OTHER";

/// Normalize one raw analysis document.
pub fn normalize(raw: &RawAnalysis, collection: Collection) -> NormalizeResult<Screenplay> {
    match raw {
        RawAnalysis::V5(v5) => normalize_v5(v5, collection),
        RawAnalysis::V6(v6) => normalize_v6(v6, collection),
    }
}

/// Normalize a batch, skipping (and logging) records that fail.
///
/// A single malformed file never blanks the whole set.
pub fn normalize_batch(raws: &[RawAnalysis], collection: Collection) -> Vec<Screenplay> {
    let mut out = Vec::with_capacity(raws.len());
    for raw in raws {
        match normalize(raw, collection) {
            Ok(screenplay) => out.push(screenplay),
            Err(e) => {
                warn!(
                    source = raw.source_filename().unwrap_or("<unknown>"),
                    "Skipping malformed record: {}", e
                );
            }
        }
    }
    out
}

/// De-duplicate by case-insensitive trimmed title.
///
/// When the same script appears under both schema versions, the
/// V6-derived record wins (it is the richer one). Otherwise the first
/// occurrence is kept. Output order follows first occurrence.
pub fn dedup_by_title(screenplays: Vec<Screenplay>) -> Vec<Screenplay> {
    let mut order: Vec<String> = Vec::new();
    let mut by_key: BTreeMap<String, Screenplay> = BTreeMap::new();

    for screenplay in screenplays {
        let key = screenplay.title_key();
        let keep = match by_key.get(&key) {
            None => {
                order.push(key.clone());
                true
            }
            Some(existing) => {
                let richer =
                    existing.schema == SchemaVersion::V5 && screenplay.schema == SchemaVersion::V6;
                if richer {
                    debug!(title = %screenplay.title, "Duplicate title: preferring V6 record");
                }
                richer
            }
        };
        if keep {
            by_key.insert(key, screenplay);
        }
    }

    order
        .into_iter()
        .filter_map(|key| by_key.remove(&key))
        .collect()
}

/// Make ids unique within a loaded set by suffixing later collisions.
/// Deterministic for a given input order.
pub fn ensure_unique_ids(screenplays: &mut [Screenplay]) {
    let mut seen: BTreeMap<String, u32> = BTreeMap::new();
    for screenplay in screenplays.iter_mut() {
        let count = seen.entry(screenplay.id.clone()).or_insert(0);
        *count += 1;
        if *count > 1 {
            let unique = format!("{}-{}", screenplay.id, count);
            warn!(id = %screenplay.id, "Duplicate id in loaded set, using {}", unique);
            screenplay.id = unique;
        }
    }
}

// ============================================================================
// Shared pieces
// ============================================================================

/// Derive the record id, falling back to the title when no filename exists.
fn derive_identity(
    title: Option<&str>,
    filename: Option<&str>,
) -> NormalizeResult<(String, String)> {
    let title = title.map(str::trim).filter(|t| !t.is_empty());
    let filename = filename.map(str::trim).filter(|f| !f.is_empty());

    match (title, filename) {
        (None, None) => Err(NormalizeError::MissingIdentity),
        (title, Some(file)) => {
            let id = screenplay_id_from_filename(file).map_err(|e| {
                NormalizeError::UnusableFilename {
                    filename: file.to_string(),
                    reason: e.to_string(),
                }
            })?;
            // Title recovered from the slug when the producer dropped it.
            let title = title.map(str::to_string).unwrap_or_else(|| {
                warn!(filename = file, "Record has no title; using id as title");
                id.clone()
            });
            Ok((id, title))
        }
        (Some(title), None) => {
            let id = screenplay_id_from_filename(title).map_err(|e| {
                NormalizeError::UnusableFilename {
                    filename: title.to_string(),
                    reason: e.to_string(),
                }
            })?;
            Ok((id, title.to_string()))
        }
    }
}

/// Normalize a raw critical-failure list into the dual representation:
/// a flat display list and the structured details, always both.
fn normalize_critical_failures(
    raw: &[RawCriticalFailure],
) -> (Vec<String>, Vec<CriticalFailureDetail>) {
    let mut flat = Vec::with_capacity(raw.len());
    let mut details = Vec::with_capacity(raw.len());

    for entry in raw {
        match entry {
            RawCriticalFailure::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                flat.push(text.to_string());
                // Flat entries default to major severity and carry no
                // penalty; only structured producers assert penalties.
                details.push(CriticalFailureDetail {
                    failure: text.to_string(),
                    severity: Severity::Major,
                    penalty: 0.0,
                    evidence: None,
                });
            }
            RawCriticalFailure::Detail(detail) => {
                let severity = detail
                    .severity
                    .as_deref()
                    .map(Severity::parse_lenient)
                    .unwrap_or_default();
                let penalty = detail
                    .penalty
                    .map(|p| p.value())
                    .unwrap_or_else(|| severity.default_penalty())
                    // Penalties are negative by definition.
                    .min(0.0);
                flat.push(detail.failure.clone());
                details.push(CriticalFailureDetail {
                    failure: detail.failure.clone(),
                    severity,
                    penalty,
                    evidence: detail.evidence.clone(),
                });
            }
        }
    }

    (flat, details)
}

fn file_meta(metadata: Option<&RawFileMetadata>, fallback_name: &str) -> FileMeta {
    let filename = metadata
        .and_then(|m| m.filename.clone())
        .unwrap_or_else(|| fallback_name.to_string());
    FileMeta {
        filename,
        page_count: metadata
            .and_then(|m| m.page_count)
            .map(|n| n.value().max(0.0) as u32)
            .unwrap_or(0),
        word_count: metadata
            .and_then(|m| m.word_count)
            .map(|n| n.value().max(0.0) as u32)
            .unwrap_or(0),
    }
}

fn producer_metrics(raw: Option<&RawProducerMetrics>) -> Option<ProducerMetrics> {
    // None means the external producer pass has not run: "pending", not 0.
    raw.map(|m| ProducerMetrics {
        producer_score: m.producer_score.value(),
        market_fit: m.market_fit.value(),
        audience_breadth: m.audience_breadth.value(),
        notes: m.notes.clone(),
    })
}

fn canonical_list(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|s| canonical_genre(s))
        .filter(|s| !s.is_empty())
        .collect()
}

fn category_or_default(raw: Option<&str>) -> String {
    raw.map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| c.to_uppercase())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
}

fn clamp_score(v: f64) -> f64 {
    if v.is_finite() {
        v.clamp(0.0, 10.0)
    } else {
        0.0
    }
}

// ============================================================================
// V5
// ============================================================================

fn normalize_v5(raw: &RawAnalysisV5, collection: Collection) -> NormalizeResult<Screenplay> {
    let body = &raw.analysis;

    let filename = raw
        .source_file
        .as_deref()
        .or_else(|| raw.metadata.as_ref().and_then(|m| m.filename.as_deref()));
    let (id, title) = derive_identity(body.title.as_deref(), filename)?;

    let d = &body.dimensions;
    let score_of = |dim: &Option<greenlight_models::raw::RawDimensionScore>| {
        dim.as_ref().map(|d| clamp_score(d.score.value())).unwrap_or(0.0)
    };
    let dimension_scores = DimensionScores {
        concept: score_of(&d.concept),
        structure: score_of(&d.structure),
        protagonist: score_of(&d.protagonist),
        supporting_cast: score_of(&d.supporting_cast),
        dialogue: score_of(&d.dialogue),
        genre_execution: score_of(&d.genre_execution),
        originality: score_of(&d.originality),
    };

    let mut dimension_notes = BTreeMap::new();
    for (key, dim) in [
        ("concept", &d.concept),
        ("structure", &d.structure),
        ("protagonist", &d.protagonist),
        ("supporting_cast", &d.supporting_cast),
        ("dialogue", &d.dialogue),
        ("genre_execution", &d.genre_execution),
        ("originality", &d.originality),
    ] {
        if let Some(justification) = dim.as_ref().and_then(|d| d.justification.clone()) {
            dimension_notes.insert(key.to_string(), justification);
        }
    }

    let (critical_failures, critical_failure_details) =
        normalize_critical_failures(&body.critical_failures);
    let penalty = rubric::penalty_total(&critical_failure_details);

    let weighted_score = clamp_score(body.weighted_score.map(|s| s.value()).unwrap_or(0.0));
    let adjusted_score = clamp_score(weighted_score + penalty);

    let recommendation = body
        .assessment
        .as_ref()
        .and_then(|a| a.recommendation.as_deref())
        .map(Recommendation::parse_lenient)
        .unwrap_or_default();

    let cvs_total = body
        .commercial_viability
        .as_ref()
        .map(cvs_total_of)
        .unwrap_or(0);

    let assessment = body.assessment.as_ref();

    Ok(Screenplay {
        id,
        title,
        author: body.author.clone(),
        genre: canonical_genre(body.genre.as_deref().unwrap_or("unknown")),
        subgenres: canonical_list(&body.subgenres),
        themes: canonical_list(&body.themes),
        logline: body.logline.clone(),
        tone: body.tone.clone(),
        collection,
        category: category_or_default(body.category.as_deref()),
        recommendation,
        is_film_now: recommendation == Recommendation::FilmNow,
        weighted_score,
        adjusted_score,
        cvs_total,
        dimension_scores,
        dimension_notes,
        pillar_scores: None,
        critical_failures,
        critical_failure_details,
        critical_failure_total_penalty: penalty,
        triggered_traps: Vec::new(),
        producer_metrics: producer_metrics(body.producer_metrics.as_ref()),
        budget_category: body
            .budget_tier
            .as_deref()
            .map(BudgetCategory::parse_lenient)
            .unwrap_or_default(),
        tmdb_status: body.tmdb_status.as_deref().map(TmdbStatus::parse_lenient),
        strengths: assessment.map(|a| a.strengths.clone()).unwrap_or_default(),
        weaknesses: assessment.map(|a| a.weaknesses.clone()).unwrap_or_default(),
        development_notes: assessment
            .map(|a| a.development_notes.clone())
            .unwrap_or_default(),
        schema: SchemaVersion::V5,
        file: file_meta(raw.metadata.as_ref(), filename.unwrap_or_default()),
    })
}

fn cvs_total_of(cv: &greenlight_models::raw::RawCommercialViability) -> i64 {
    let total = match cv.cvs_total {
        Some(total) => total.value(),
        None => {
            cv.concept_hook.value()
                + cv.castability.value()
                + cv.budget_ratio.value()
                + cv.audience_breadth.value()
                + cv.comp_freshness.value()
                + cv.franchise_potential.value()
        }
    };
    (total.max(0.0).min(18.0)) as i64
}

// ============================================================================
// V6
// ============================================================================

fn normalize_v6(raw: &RawAnalysisV6, collection: Collection) -> NormalizeResult<Screenplay> {
    let body = &raw.analysis;
    let core = &body.core_quality;

    let filename = raw
        .source_file
        .as_deref()
        .or_else(|| raw.metadata.as_ref().and_then(|m| m.filename.as_deref()));
    let (id, title) = derive_identity(body.title.as_deref(), filename)?;

    let scores = sub_scores_of(core);

    let (critical_failures, critical_failure_details) =
        normalize_critical_failures(&core.critical_failures);

    let outcome = rubric::evaluate(&scores, &critical_failure_details, core.major_weaknesses.len());

    let asserted = core
        .false_positive_check
        .as_ref()
        .map(|c| c.traps.as_slice())
        .unwrap_or_default();
    let triggered_traps = traps::detect(&scores, asserted);
    let trap_weight = traps::weighted_trap_score(&triggered_traps);
    let recommendation = traps::adjust_verdict(outcome.verdict, trap_weight);

    if let Some(model_verdict) = core.verdict.as_deref() {
        let parsed = Recommendation::parse_lenient(model_verdict);
        if parsed != recommendation {
            debug!(
                computed = recommendation.as_str(),
                model = parsed.as_str(),
                title = %title,
                "Computed verdict differs from model-asserted verdict"
            );
        }
    }

    let pillar_scores = PillarScores {
        execution_craft: scores.execution_craft(),
        character_system: scores.character_system(),
        conceptual_strength: scores.conceptual_strength(),
        voice_and_tone: scores.voice_and_tone,
    };

    // The 7-key dimension block stays populated for V6 so numeric consumers
    // never branch on schema; display goes through the version-aware
    // adapter, which uses pillar labels instead.
    let dimension_scores = DimensionScores {
        concept: scores.premise,
        structure: scores.structure,
        protagonist: scores.protagonist,
        supporting_cast: scores.supporting_cast,
        dialogue: scores.dialogue,
        genre_execution: pillar_scores.execution_craft,
        originality: scores.voice_and_tone,
    };

    let mut dimension_notes = BTreeMap::new();
    for (key, pillar) in [
        ("execution_craft", &core.execution_craft),
        ("character_system", &core.character_system),
        ("conceptual_strength", &core.conceptual_strength),
        ("voice_and_tone", &core.voice_and_tone),
    ] {
        if let Some(note) = pillar_note(pillar) {
            dimension_notes.insert(key.to_string(), note);
        }
    }

    let budget_category = body
        .lenses
        .as_ref()
        .and_then(|l| l.production.as_ref())
        .and_then(|p| p.budget_tier.as_deref())
        .map(BudgetCategory::parse_lenient)
        .unwrap_or_default();

    let cvs_total = body
        .commercial_viability
        .as_ref()
        .map(cvs_total_of)
        .unwrap_or(0);

    Ok(Screenplay {
        id,
        title,
        author: body.author.clone(),
        genre: canonical_genre(body.genre.as_deref().unwrap_or("unknown")),
        subgenres: canonical_list(&body.subgenres),
        themes: canonical_list(&body.themes),
        logline: body.logline.clone(),
        tone: body.tone.clone(),
        collection,
        category: category_or_default(body.category.as_deref()),
        recommendation,
        is_film_now: recommendation == Recommendation::FilmNow,
        weighted_score: outcome.weighted_score,
        adjusted_score: outcome.adjusted_score,
        cvs_total,
        dimension_scores,
        dimension_notes,
        pillar_scores: Some(pillar_scores),
        critical_failures,
        critical_failure_details,
        critical_failure_total_penalty: outcome.penalty_total,
        triggered_traps,
        producer_metrics: producer_metrics(body.producer_metrics.as_ref()),
        budget_category,
        tmdb_status: body.tmdb_status.as_deref().map(TmdbStatus::parse_lenient),
        strengths: Vec::new(),
        weaknesses: core.major_weaknesses.clone(),
        development_notes: Vec::new(),
        schema: SchemaVersion::V6,
        file: file_meta(raw.metadata.as_ref(), filename.unwrap_or_default()),
    })
}

/// Pull the nine rubric sub-scores out of the pillar sub-dimension maps.
///
/// Sub-dimension keys are matched case- and separator-insensitively.
/// Voice & Tone usually arrives as a bare pillar score; when only
/// sub-dimensions exist their mean is used.
fn sub_scores_of(core: &greenlight_models::raw::RawCoreQuality) -> SubScores {
    let ec = &core.execution_craft;
    let cs = &core.character_system;
    let con = &core.conceptual_strength;

    SubScores {
        structure: sub_dimension(ec, "structure"),
        scene_writing: sub_dimension(ec, "scene_writing"),
        dialogue: sub_dimension(ec, "dialogue"),
        protagonist: sub_dimension(cs, "protagonist"),
        supporting_cast: sub_dimension(cs, "supporting_cast"),
        relationships: sub_dimension(cs, "relationships"),
        premise: sub_dimension(con, "premise"),
        theme: sub_dimension(con, "theme"),
        voice_and_tone: pillar_score(&core.voice_and_tone),
    }
}

fn sub_dimension(pillar: &RawPillar, key: &str) -> f64 {
    let folded_key = fold(key);
    pillar
        .sub_dimensions
        .iter()
        .find(|(k, _)| fold(k) == folded_key)
        .map(|(_, sub)| clamp_score(sub.score.value()))
        .unwrap_or(0.0)
}

fn pillar_score(pillar: &RawPillar) -> f64 {
    if let Some(score) = pillar.score {
        return clamp_score(score.value());
    }
    if pillar.sub_dimensions.is_empty() {
        return 0.0;
    }
    let sum: f64 = pillar
        .sub_dimensions
        .values()
        .map(|s| clamp_score(s.score.value()))
        .sum();
    sum / pillar.sub_dimensions.len() as f64
}

fn pillar_note(pillar: &RawPillar) -> Option<String> {
    let notes: Vec<&str> = pillar
        .sub_dimensions
        .values()
        .filter_map(|s| s.justification.as_deref())
        .collect();
    if notes.is_empty() {
        None
    } else {
        Some(notes.join(" "))
    }
}

fn fold(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v5_doc() -> serde_json::Value {
        json!({
            "source_file": "Night_Shift_analysis_v5.json",
            "analysis_version": "v5",
            "metadata": {"filename": "Night_Shift_analysis_v5.json", "page_count": 104, "word_count": 21890},
            "analysis": {
                "title": "Night Shift",
                "author": "R. Vasquez",
                "genre": "Thriller",
                "subgenres": ["Neo-Noir"],
                "themes": ["guilt", "redemption"],
                "logline": "A night-shift nurse covers up a death that wasn't an accident.",
                "tone": "taut, procedural",
                "weighted_score": "7.2",
                "dimensions": {
                    "concept": {"score": 8, "justification": "Fresh angle on a familiar setup"},
                    "structure": {"score": 7, "justification": "Second act sags"},
                    "protagonist": {"score": "8", "justification": "Clear want and wound"},
                    "supporting_cast": {"score": 6},
                    "dialogue": {"score": 7},
                    "genre_execution": {"score": 7},
                    "originality": {"score": 8}
                },
                "commercial_viability": {
                    "concept_hook": 3, "castability": 2, "budget_ratio": 3,
                    "audience_breadth": 2, "comp_freshness": 2, "franchise_potential": 1,
                    "cvs_total": 13
                },
                "budget_tier": "medium ($30-60M)",
                "critical_failures": ["Antagonist disappears for 30 pages"],
                "assessment": {
                    "recommendation": "Film-Now",
                    "strengths": ["voice"],
                    "weaknesses": ["pacing"],
                    "development_notes": ["tighten act two"]
                }
            }
        })
    }

    fn v6_doc() -> serde_json::Value {
        json!({
            "source_file": "night_shift_analysis_v6.json",
            "analysis_version": "v6_core_lenses",
            "metadata": {"filename": "night_shift_analysis_v6.json", "page_count": 104, "word_count": 21890},
            "analysis": {
                "title": "Night Shift",
                "author": "R. Vasquez",
                "genre": "thriller",
                "core_quality": {
                    "execution_craft": {
                        "weight": 0.40,
                        "sub_dimensions": {
                            "structure": {"score": 8, "page_citations": ["p. 12"], "justification": "Locked midpoint"},
                            "scene_writing": {"score": 8, "page_citations": ["p. 33"]},
                            "dialogue": {"score": 8, "page_citations": ["p. 41"]}
                        }
                    },
                    "character_system": {
                        "weight": 0.30,
                        "sub_dimensions": {
                            "protagonist": {"score": 8},
                            "supporting_cast": {"score": 8},
                            "relationships": {"score": 8}
                        }
                    },
                    "conceptual_strength": {
                        "weight": 0.20,
                        "sub_dimensions": {
                            "premise": {"score": 8},
                            "theme": {"score": 8}
                        }
                    },
                    "voice_and_tone": {"weight": 0.10, "score": 8},
                    "false_positive_check": {"traps": []},
                    "critical_failures": [],
                    "verdict": "recommend"
                },
                "lenses": {
                    "production": {"budget_tier": "low (under $10M)"}
                }
            }
        })
    }

    #[test]
    fn test_v5_normalization() {
        let raw = RawAnalysis::from_value(v5_doc()).unwrap();
        let sp = normalize(&raw, Collection::Submissions).unwrap();

        assert_eq!(sp.id, "night-shift");
        assert_eq!(sp.schema, SchemaVersion::V5);
        assert_eq!(sp.recommendation, Recommendation::FilmNow);
        assert!(sp.is_film_now);
        assert_eq!(sp.weighted_score, 7.2);
        assert_eq!(sp.cvs_total, 13);
        assert_eq!(sp.budget_category, BudgetCategory::Medium);
        assert_eq!(sp.dimension_scores.concept, 8.0);
        assert_eq!(sp.dimension_scores.protagonist, 8.0);
        assert_eq!(sp.genre, "thriller");
        assert_eq!(sp.subgenres, vec!["neo-noir".to_string()]);
        assert_eq!(sp.category, "OTHER");
        assert_eq!(sp.file.page_count, 104);
        // Flat failure list produces both representations
        assert_eq!(sp.critical_failures.len(), 1);
        assert_eq!(sp.critical_failure_details.len(), 1);
        assert_eq!(sp.critical_failure_details[0].severity, Severity::Major);
        assert_eq!(sp.critical_failure_details[0].penalty, 0.0);
        // Producer pass has not run
        assert!(sp.producer_metrics.is_none());
        assert!(sp.pillar_scores.is_none());
    }

    #[test]
    fn test_v6_normalization_computes_rubric() {
        let raw = RawAnalysis::from_value(v6_doc()).unwrap();
        let sp = normalize(&raw, Collection::Submissions).unwrap();

        assert_eq!(sp.schema, SchemaVersion::V6);
        // Uniform 8s: weighted score is exactly 8.0
        assert!((sp.weighted_score - 8.0).abs() < 1e-9);
        assert_eq!(sp.critical_failure_total_penalty, 0.0);
        assert_eq!(sp.recommendation, Recommendation::Recommend);
        assert_eq!(sp.budget_category, BudgetCategory::Low);
        let pillars = sp.pillar_scores.unwrap();
        assert!((pillars.execution_craft - 8.0).abs() < 1e-9);
        // 7-key block still populated for numeric consumers
        assert_eq!(sp.dimension_scores.structure, 8.0);
    }

    #[test]
    fn test_normalization_is_deterministic() {
        let raw = RawAnalysis::from_value(v6_doc()).unwrap();
        let a = normalize(&raw, Collection::Slate).unwrap();
        let b = normalize(&raw, Collection::Slate).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_identity_is_an_error() {
        let raw = RawAnalysis::from_value(json!({"analysis": {}})).unwrap();
        assert!(matches!(
            normalize(&raw, Collection::Other),
            Err(NormalizeError::MissingIdentity)
        ));
    }

    #[test]
    fn test_title_only_record_survives() {
        let raw = RawAnalysis::from_value(json!({
            "analysis": {"title": "Untracked Draft"}
        }))
        .unwrap();
        let sp = normalize(&raw, Collection::Other).unwrap();
        assert_eq!(sp.id, "untracked-draft");
        assert_eq!(sp.recommendation, Recommendation::Pass);
        assert_eq!(sp.weighted_score, 0.0);
    }

    #[test]
    fn test_batch_skips_malformed_records() {
        let good = RawAnalysis::from_value(v5_doc()).unwrap();
        let bad = RawAnalysis::from_value(json!({"analysis": {}})).unwrap();
        let out = normalize_batch(&[bad, good], Collection::Submissions);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Night Shift");
    }

    #[test]
    fn test_dedup_prefers_v6() {
        let v5 = normalize(
            &RawAnalysis::from_value(v5_doc()).unwrap(),
            Collection::Submissions,
        )
        .unwrap();
        let v6 = normalize(
            &RawAnalysis::from_value(v6_doc()).unwrap(),
            Collection::Submissions,
        )
        .unwrap();

        let deduped = dedup_by_title(vec![v5.clone(), v6.clone()]);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].schema, SchemaVersion::V6);

        // Order flipped: still one record, still the V6 one
        let deduped = dedup_by_title(vec![v6, v5]);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].schema, SchemaVersion::V6);
    }

    #[test]
    fn test_ensure_unique_ids() {
        let raw = RawAnalysis::from_value(v5_doc()).unwrap();
        let a = normalize(&raw, Collection::Submissions).unwrap();
        let mut b = a.clone();
        b.title = "Night Shift II".to_string();

        let mut set = vec![a, b];
        ensure_unique_ids(&mut set);
        assert_eq!(set[0].id, "night-shift");
        assert_eq!(set[1].id, "night-shift-2");
    }

    #[test]
    fn test_structured_failures_resolve_penalties() {
        let raw = RawAnalysis::from_value(json!({
            "source_file": "x_analysis_v5.json",
            "analysis": {
                "title": "X",
                "critical_failures": [
                    {"failure": "No ending", "severity": "critical", "evidence": "p. 98"},
                    {"failure": "Flat stakes", "severity": "minor", "penalty": -0.2}
                ]
            }
        }))
        .unwrap();
        let sp = normalize(&raw, Collection::Other).unwrap();
        let details = &sp.critical_failure_details;
        assert_eq!(details[0].penalty, -1.2); // severity default
        assert_eq!(details[1].penalty, -0.2); // explicit override
        assert!((sp.critical_failure_total_penalty - (-1.4)).abs() < 1e-9);
    }
}
