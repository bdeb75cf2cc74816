//! Gate prompt templates.
//!
//! [`build_prompt`] renders the instruction text sent to a gate's agent. It is
//! a pure function of the story and the gate: identical inputs always yield
//! byte-identical prompts.
//!
//! Layout:
//! - header naming the gate and the responsible role
//! - story metadata
//! - acceptance criteria as `N. [type] WHEN trigger IF condition THEN behavior`
//! - the gate checklist and the rigor required by the story's criticality
//! - the verdict instruction

use crate::gates::{GateSpec, catalog, resolve_role};
use crate::story::{AcceptanceCriterion, Story};

/// Build the prompt for `gate_id` on `story`.
///
/// Unknown gate identifiers produce a generic review instruction.
pub fn build_prompt(story: &Story, gate_id: &str) -> String {
    match catalog().lookup(gate_id) {
        Some(spec) => build_gate_prompt(story, spec),
        None => build_fallback_prompt(story, gate_id),
    }
}

fn build_gate_prompt(story: &Story, spec: &GateSpec) -> String {
    let role = resolve_role(spec.gate, story.domain);
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "# Gate {}: {}\n\n\
         You are the {} agent verifying story {} at gate {} ({}).\n\
         {}.\n\n",
        spec.gate.position(),
        spec.name,
        role,
        story.id,
        spec.gate,
        spec.name,
        spec.description
    ));

    prompt.push_str(&format_story_section(story));

    prompt.push_str("## Checklist\n\n");
    for item in spec.checklist {
        prompt.push_str(&format!("- {}\n", item));
    }
    prompt.push('\n');

    prompt.push_str("## Rigor\n\n");
    prompt.push_str(&format!(
        "Criticality {}: {}.\n\n",
        story.criticality,
        story.criticality.rigor()
    ));

    prompt.push_str(&build_verdict_section());
    prompt
}

fn build_fallback_prompt(story: &Story, gate_id: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str(&format!(
        "# Gate review: {}\n\n\
         Review story {} for gate '{}'.\n\n",
        gate_id, story.id, gate_id
    ));
    prompt.push_str(&format_story_section(story));
    prompt.push_str("## Task\n\n");
    prompt.push_str(
        "Verify that the story's acceptance criteria are satisfied by the current state \
         of the project.\n\n",
    );
    prompt.push_str(&build_verdict_section());
    prompt
}

fn format_story_section(story: &Story) -> String {
    let mut section = String::new();
    section.push_str("## Story\n\n");
    section.push_str(&format!("- **ID**: {}\n", story.id));
    section.push_str(&format!("- **Title**: {}\n", story.title));
    section.push_str(&format!("- **Epic**: {}\n", story.epic));
    section.push_str(&format!("- **Wave**: {}\n", story.wave));
    section.push_str(&format!("- **Criticality**: {}\n", story.criticality));
    section.push_str(&format!("- **Status**: {}\n", story.status));
    section.push('\n');

    section.push_str("## Acceptance Criteria\n\n");
    for (i, ac) in story.acceptance_criteria.iter().enumerate() {
        section.push_str(&format_criterion(i + 1, ac));
        section.push('\n');
    }
    section.push('\n');
    section
}

/// `N. [type] WHEN trigger IF condition THEN behavior`, absent clauses omitted.
pub fn format_criterion(index: usize, ac: &AcceptanceCriterion) -> String {
    let mut line = format!("{}. [{}]", index, ac.kind);
    if let Some(trigger) = &ac.trigger {
        line.push_str(&format!(" WHEN {}", trigger));
    }
    if let Some(condition) = &ac.condition {
        line.push_str(&format!(" IF {}", condition));
    }
    line.push_str(&format!(" THEN {}", ac.behavior));
    line
}

fn build_verdict_section() -> String {
    "## Verdict\n\n\
     Finish with a single line `VERDICT: PASS` if every item holds, or \
     `VERDICT: FAIL` followed by the reasons.\n"
        .to_string()
}
