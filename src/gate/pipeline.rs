// ABOUTME: Stage orchestration — pre-filter, triage, explanation, preference, resolver.
// ABOUTME: Early exits per stage; any transport failure resolves to a deterministic ask.

use tracing::{debug, warn};

use super::prefilter::{self, PrefilterOutcome};
use super::resolver::{self, ResolverInput};
use super::types::{
    Decision, Explanation, PreferenceVerdict, Resolution, ToolCategory, TriageResult,
};
use super::{explain, preference, triage};
use crate::oracle::Oracle;
use crate::request::ActionRequest;

/// How one invocation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    /// Passthrough tool: the fixed empty-object line, nothing evaluated.
    Passthrough,
    /// A full decision, from a hard rule, a triage short-circuit, a stage
    /// failure, or the resolver.
    Decided(Resolution),
}

/// The outcome plus every stage result that actually ran, for the audit record.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub outcome: GateOutcome,
    pub triage: Option<TriageResult>,
    pub explanation: Option<Explanation>,
    pub preference: Option<PreferenceVerdict>,
}

impl Evaluation {
    fn decided(resolution: Resolution) -> Self {
        Self {
            outcome: GateOutcome::Decided(resolution),
            triage: None,
            explanation: None,
            preference: None,
        }
    }
}

/// The decision pipeline. Holds the oracle seam and the verbatim policy text;
/// all other state arrives with the request.
pub struct Gate<'a> {
    oracle: &'a dyn Oracle,
    policy: &'a str,
}

impl<'a> Gate<'a> {
    pub fn new(oracle: &'a dyn Oracle, policy: &'a str) -> Self {
        Self { oracle, policy }
    }

    /// Run the full pipeline for one request.
    ///
    /// Never errors: content problems substitute defaults inside the stages,
    /// and a stage transport failure resolves to `ask` carrying the failure
    /// text, so the caller always has exactly one decision to emit.
    pub async fn evaluate(&self, req: &ActionRequest) -> Evaluation {
        match prefilter::check(req) {
            Some(PrefilterOutcome::Passthrough) => {
                debug!(tool = %req.tool_name, "passthrough tool, skipping pipeline");
                return Evaluation {
                    outcome: GateOutcome::Passthrough,
                    triage: None,
                    explanation: None,
                    preference: None,
                };
            }
            Some(PrefilterOutcome::Decided(resolution)) => {
                debug!(decision = resolution.decision.as_str(), "pre-filter hard rule");
                return Evaluation::decided(resolution);
            }
            None => {}
        }

        let raw_text = req.combined_text();
        let triage = match triage::assess(self.oracle, &raw_text).await {
            Ok(t) => t,
            Err(e) => return fail_to_ask("triage", e),
        };
        debug!(score = triage.score, flags = ?triage.flags, "triage complete");

        if triage.short_circuits() {
            let reason = format!(
                "possible prompt manipulation (flags: [{}], score {}): {}",
                triage.flags.join(", "),
                triage.score,
                triage.rationale
            );
            return Evaluation {
                outcome: GateOutcome::Decided(Resolution {
                    decision: Decision::Ask,
                    baseline: Decision::Ask,
                    reason,
                }),
                triage: Some(triage),
                explanation: None,
                preference: None,
            };
        }

        let explanation = match explain::describe(self.oracle, req).await {
            Ok(e) => e,
            Err(e) => {
                let mut evaluation = fail_to_ask("explanation", e);
                evaluation.triage = Some(triage);
                return evaluation;
            }
        };
        debug!(paths = ?explanation.affected_paths, "explanation complete");

        let pref = match preference::judge(self.oracle, &explanation, self.policy).await {
            Ok(p) => p,
            Err(e) => {
                let mut evaluation = fail_to_ask("preference", e);
                evaluation.triage = Some(triage);
                evaluation.explanation = Some(explanation);
                return evaluation;
            }
        };
        debug!(verdict = ?pref.verdict, "preference complete");

        let resolution = resolver::resolve(&ResolverInput {
            verdict: pref.verdict,
            mode: req.mode,
            category: ToolCategory::of(&req.tool_name),
            summary: &explanation.summary,
            affected_paths: &explanation.affected_paths,
            violated_rules: &pref.violated_rules,
            matched_allowed: &pref.matched_allowed,
            review_reasons: &pref.review_reasons,
        });

        Evaluation {
            outcome: GateOutcome::Decided(resolution),
            triage: Some(triage),
            explanation: Some(explanation),
            preference: Some(pref),
        }
    }
}

/// An unrecoverable stage failure becomes a deterministic ask — the host gets
/// exactly one line either way, never silence.
fn fail_to_ask(stage: &str, err: anyhow::Error) -> Evaluation {
    warn!(stage, error = %format!("{err:#}"), "stage failed, deferring to human review");
    Evaluation::decided(Resolution {
        decision: Decision::Ask,
        baseline: Decision::Ask,
        reason: format!("{stage} stage failed ({err:#}); deferring to human review"),
    })
}
