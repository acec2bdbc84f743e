//! Built-in command and agent candidate tables.
//!
//! These are the source units discovery scans at startup. Command handlers
//! here are deliberately small: they shape their inputs into structured
//! output and leave heavyweight work (template downloads, git bootstrap) to
//! external collaborators.

use std::sync::Arc;

use anyhow::anyhow;
use serde_json::{Value, json};
use speckit_agent::{Agent, AgentCandidate};
use speckit_registry::{CandidateOverrides, CommandCandidate, ParamDecl};
use speckit_types::ParamType;

pub fn command_candidates() -> Vec<CommandCandidate> {
    vec![
        CommandCandidate::new("cmd_create_spec", "speckit::builtins::spec_command", Arc::new(create_spec))
            .with_doc("Create a new feature specification from a description")
            .with_signature(vec![
                ParamDecl::required("description", ParamType::String),
                ParamDecl::with_default("template", ParamType::String, json!("default")),
            ])
            .with_overrides(CandidateOverrides {
                name: Some("spec".to_string()),
                aliases: vec!["specify".to_string()],
                requires_project: Some(true),
                ..CandidateOverrides::default()
            }),
        CommandCandidate::new("cmd_create_plan", "speckit::builtins::plan_command", Arc::new(create_plan))
            .with_doc("Create an implementation plan for an existing specification")
            .with_signature(vec![
                ParamDecl::required("spec", ParamType::String),
                ParamDecl::with_default("detail", ParamType::String, json!("standard")),
            ])
            .with_overrides(CandidateOverrides {
                name: Some("plan".to_string()),
                requires_project: Some(true),
                ..CandidateOverrides::default()
            }),
        CommandCandidate::new("cmd_research", "speckit::builtins::research_command", Arc::new(research))
            .with_doc("Collect research notes on a topic")
            .with_signature(vec![
                ParamDecl::required("topic", ParamType::String),
                ParamDecl::with_default("depth", ParamType::Int, json!(1)),
            ]),
        CommandCandidate::new("cmd_echo", "speckit::builtins::util_command", Arc::new(echo))
            .with_doc("Echo arguments back; useful for checking the dispatch pipeline")
            .with_overrides(CandidateOverrides {
                hidden: Some(true),
                ..CandidateOverrides::default()
            }),
    ]
}

pub fn agent_candidates() -> Vec<AgentCandidate> {
    vec![
        AgentCandidate::new("SpecBuilderAgent", "speckit::builtins::agents", spec_builder_factory),
        AgentCandidate::new("ResearchAgent", "speckit::builtins::agents", research_agent_factory),
    ]
}

fn create_spec(
    args: &[Value],
    kwargs: &serde_json::Map<String, Value>,
    context: &speckit_types::ExecutionContext,
) -> anyhow::Result<Value> {
    let description = kwargs
        .get("description")
        .or_else(|| args.first())
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("a feature description is required"))?;
    let template = kwargs.get("template").and_then(Value::as_str).unwrap_or("default");

    Ok(json!({
        "kind": "specification",
        "description": description,
        "template": template,
        "project_path": context.project_path(),
    }))
}

fn create_plan(
    args: &[Value],
    kwargs: &serde_json::Map<String, Value>,
    _context: &speckit_types::ExecutionContext,
) -> anyhow::Result<Value> {
    let spec = kwargs
        .get("spec")
        .or_else(|| args.first())
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("a specification name is required"))?;
    let detail = kwargs.get("detail").and_then(Value::as_str).unwrap_or("standard");

    Ok(json!({
        "kind": "plan",
        "spec": spec,
        "detail": detail,
    }))
}

fn research(
    args: &[Value],
    kwargs: &serde_json::Map<String, Value>,
    _context: &speckit_types::ExecutionContext,
) -> anyhow::Result<Value> {
    let topic = kwargs
        .get("topic")
        .or_else(|| args.first())
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("a research topic is required"))?;
    let depth = kwargs.get("depth").and_then(Value::as_i64).unwrap_or(1);

    Ok(json!({
        "kind": "research",
        "topic": topic,
        "depth": depth,
    }))
}

fn echo(
    args: &[Value],
    kwargs: &serde_json::Map<String, Value>,
    _context: &speckit_types::ExecutionContext,
) -> anyhow::Result<Value> {
    Ok(json!({ "args": args, "kwargs": kwargs }))
}

/// Accumulates spec sections across calls; `reload` starts a fresh draft.
struct SpecBuilderAgent {
    sections: Vec<String>,
}

impl Agent for SpecBuilderAgent {
    fn name(&self) -> &str {
        "specbuilder"
    }

    fn description(&self) -> &str {
        "Builds specification documents section by section"
    }

    fn capabilities(&self) -> Vec<String> {
        vec!["spec-generation".to_string(), "refinement".to_string()]
    }

    fn execute(&mut self, input: &Value) -> anyhow::Result<Value> {
        match input.get("action").and_then(Value::as_str) {
            Some("add-section") => {
                let text = input
                    .get("text")
                    .and_then(Value::as_str)
                    .ok_or_else(|| anyhow!("add-section requires a 'text' field"))?;
                self.sections.push(text.to_string());
                Ok(json!({ "sections": self.sections.len() }))
            }
            Some("render") => Ok(json!({ "document": self.sections.join("\n\n") })),
            other => Err(anyhow!("unsupported action: {:?}", other)),
        }
    }
}

struct ResearchAgent;

impl Agent for ResearchAgent {
    fn name(&self) -> &str {
        "research"
    }

    fn description(&self) -> &str {
        "Summarizes research topics into structured notes"
    }

    fn capabilities(&self) -> Vec<String> {
        vec!["summarize".to_string()]
    }

    fn execute(&mut self, input: &Value) -> anyhow::Result<Value> {
        match input.get("action").and_then(Value::as_str) {
            Some("summarize") => {
                let topic = input
                    .get("topic")
                    .and_then(Value::as_str)
                    .ok_or_else(|| anyhow!("summarize requires a 'topic' field"))?;
                Ok(json!({ "topic": topic, "notes": [] }))
            }
            other => Err(anyhow!("unsupported action: {:?}", other)),
        }
    }
}

fn spec_builder_factory() -> anyhow::Result<Box<dyn Agent>> {
    Ok(Box::new(SpecBuilderAgent { sections: Vec::new() }))
}

fn research_agent_factory() -> anyhow::Result<Box<dyn Agent>> {
    Ok(Box::new(ResearchAgent))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_tables_are_nonempty_and_well_formed() {
        let commands = command_candidates();
        assert!(commands.iter().any(|candidate| candidate.ident == "cmd_create_spec"));

        let agents = agent_candidates();
        assert!(agents.iter().all(|candidate| candidate.class_name.ends_with("Agent")));
    }
}
