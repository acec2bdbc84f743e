//! Command discovery over declared candidate tables.
//!
//! Discovery is driven by explicit tables assembled at process start: each
//! [`CommandCandidate`] describes one source function (identifier, module
//! path, doc text, signature), and discovery applies acceptance heuristics
//! and metadata synthesis over it. Population is best-effort: a candidate
//! that fails heuristics is skipped silently, a registration that fails is
//! logged and skipped, and an unknown namespace degrades to an empty result.

use heck::ToKebabCase;
use indexmap::IndexMap;
use serde_json::Value;
use speckit_types::{CommandMetadata, ParamSpec, ParamType};
use tracing::{debug, warn};

use crate::models::{CommandHandler, CommandRegistry};

/// Module-name keywords mapped to command categories.
const CATEGORY_KEYWORDS: &[(&str, &str)] = &[
    ("spec_command", "specification"),
    ("plan_command", "planning"),
    ("tasks_command", "task-management"),
    ("research_command", "research"),
    ("analyze_command", "analysis"),
    ("migrate_command", "migration"),
];

/// Module-name keywords mapped to search tags.
const TAG_KEYWORDS: &[(&str, &str)] = &[
    ("spec", "specification"),
    ("plan", "planning"),
    ("task", "task-management"),
    ("research", "research"),
    ("analyze", "analysis"),
    ("migrate", "migration"),
];

/// One declared parameter of a candidate's signature.
#[derive(Debug, Clone)]
pub struct ParamDecl {
    pub name: String,
    /// Declared annotation; `Any` when the source left it unannotated.
    pub ty: ParamType,
    /// Declared default; a parameter without one is required.
    pub default: Option<Value>,
}

impl ParamDecl {
    pub fn required(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
        }
    }

    pub fn with_default(name: impl Into<String>, ty: ParamType, default: Value) -> Self {
        Self {
            name: name.into(),
            ty,
            default: Some(default),
        }
    }
}

/// Explicit overrides a candidate may declare, taking precedence over
/// everything synthesized from naming conventions.
#[derive(Debug, Clone, Default)]
pub struct CandidateOverrides {
    pub name: Option<String>,
    pub description: Option<String>,
    pub aliases: Vec<String>,
    pub tags: Vec<String>,
    pub requires_project: Option<bool>,
    pub hidden: Option<bool>,
    /// Explicit command marker; accepted regardless of naming heuristics.
    pub marker: bool,
}

/// A candidate source unit considered by discovery.
#[derive(Clone)]
pub struct CommandCandidate {
    /// Source identifier, e.g. `cmd_create_spec`.
    pub ident: String,
    /// Originating module path, e.g. `speckit::builtins::spec_command`.
    pub module: String,
    /// Documentation text; the first line becomes the description.
    pub doc: String,
    pub signature: Vec<ParamDecl>,
    pub overrides: CandidateOverrides,
    pub handler: CommandHandler,
}

impl CommandCandidate {
    pub fn new(ident: impl Into<String>, module: impl Into<String>, handler: CommandHandler) -> Self {
        Self {
            ident: ident.into(),
            module: module.into(),
            doc: String::new(),
            signature: Vec::new(),
            overrides: CandidateOverrides::default(),
            handler,
        }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    pub fn with_signature(mut self, signature: Vec<ParamDecl>) -> Self {
        self.signature = signature;
        self
    }

    pub fn with_overrides(mut self, overrides: CandidateOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

/// A candidate accepted by discovery, with synthesized metadata.
#[derive(Clone)]
pub struct DiscoveredCommand {
    pub name: String,
    pub metadata: CommandMetadata,
    pub module: String,
    pub handler: CommandHandler,
}

impl std::fmt::Debug for DiscoveredCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveredCommand")
            .field("name", &self.name)
            .field("module", &self.module)
            .finish()
    }
}

/// Summary of one discover-and-register pass.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DiscoveryReport {
    pub discovered_count: usize,
    pub registered_count: usize,
    pub commands: Vec<String>,
}

/// Discovery service over namespace → candidate tables.
#[derive(Default)]
pub struct CommandDiscovery {
    sources: IndexMap<String, Vec<CommandCandidate>>,
    discovered: IndexMap<String, DiscoveredCommand>,
}

impl CommandDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the candidates reachable under a namespace.
    pub fn add_namespace(&mut self, namespace: impl Into<String>, candidates: Vec<CommandCandidate>) {
        self.sources.insert(namespace.into(), candidates);
    }

    /// Enumerate and accept candidates under a namespace.
    ///
    /// An unknown namespace is a degraded, not failed, outcome: it logs a
    /// warning and yields nothing. Candidates that fail the acceptance
    /// heuristics are skipped without noise. Re-running with the same
    /// inputs reproduces the same relative order.
    pub fn discover(&mut self, namespace: &str) -> Vec<DiscoveredCommand> {
        let Some(candidates) = self.sources.get(namespace) else {
            warn!(namespace, "could not enumerate command namespace; discovery found nothing");
            return Vec::new();
        };

        let accepted: Vec<DiscoveredCommand> = candidates
            .iter()
            .filter(|candidate| is_command_candidate(candidate))
            .map(synthesize_command)
            .collect();

        debug!(
            namespace,
            candidate_count = candidates.len(),
            accepted_count = accepted.len(),
            "command discovery pass complete"
        );

        for command in &accepted {
            self.discovered.insert(command.name.clone(), command.clone());
        }
        accepted
    }

    pub fn discovered_commands(&self) -> Vec<&DiscoveredCommand> {
        self.discovered.values().collect()
    }

    pub fn get_discovered(&self, name: &str) -> Option<&DiscoveredCommand> {
        self.discovered.get(name)
    }

    pub fn clear_discovered(&mut self) {
        self.discovered.clear();
    }

    /// Register every discovered command, tolerating per-unit failure.
    ///
    /// A registration that fails (for example an alias collision) is logged
    /// and skipped; the pass continues. Returns the count actually
    /// registered, which may be less than the count discovered.
    pub fn register_discovered(&self, registry: &mut CommandRegistry) -> usize {
        let mut registered = 0;
        for command in self.discovered.values() {
            match registry.register_in_module(command.metadata.clone(), command.handler.clone(), &command.module) {
                Ok(()) => registered += 1,
                Err(error) => {
                    warn!(command = %command.name, %error, "could not register discovered command");
                }
            }
        }
        registered
    }

    /// Discover and register a namespace in one pass, from a clean slate.
    pub fn discover_and_register(&mut self, namespace: &str, registry: &mut CommandRegistry) -> DiscoveryReport {
        self.clear_discovered();
        let discovered = self.discover(namespace);
        let registered_count = self.register_discovered(registry);
        DiscoveryReport {
            discovered_count: discovered.len(),
            registered_count,
            commands: discovered.into_iter().map(|command| command.name).collect(),
        }
    }
}

/// Acceptance heuristics: naming prefix, doc keyword, or explicit marker.
fn is_command_candidate(candidate: &CommandCandidate) -> bool {
    if candidate.overrides.marker {
        return true;
    }
    if candidate.ident.starts_with("cmd_") || candidate.ident.starts_with("command_") {
        return true;
    }
    let doc = candidate.doc.to_lowercase();
    ["command", "cmd", "@command"].iter().any(|keyword| doc.contains(keyword))
}

fn synthesize_command(candidate: &CommandCandidate) -> DiscoveredCommand {
    let name = derive_name(candidate);

    let mut metadata = CommandMetadata::new(&name, derive_description(candidate, &name));
    metadata.category = derive_category(&candidate.module);
    metadata.aliases = candidate.overrides.aliases.clone();
    metadata.parameters = derive_parameters(&candidate.signature);
    metadata.tags = derive_tags(candidate);
    metadata.requires_project = candidate.overrides.requires_project.unwrap_or_else(|| {
        let ident = candidate.ident.to_lowercase();
        ["project", "workspace", "git"].iter().any(|keyword| ident.contains(keyword))
    });
    metadata.hidden = candidate
        .overrides
        .hidden
        .unwrap_or_else(|| candidate.ident.starts_with('_') || candidate.ident.to_lowercase().contains("internal"));

    DiscoveredCommand {
        name,
        metadata,
        module: candidate.module.clone(),
        handler: candidate.handler.clone(),
    }
}

/// Explicit override, else the ident with its command prefix stripped,
/// converted to the registry's kebab-case form.
fn derive_name(candidate: &CommandCandidate) -> String {
    if let Some(name) = &candidate.overrides.name {
        return name.clone();
    }
    let stripped = candidate
        .ident
        .strip_prefix("cmd_")
        .or_else(|| candidate.ident.strip_prefix("command_"))
        .unwrap_or(&candidate.ident);
    stripped.to_kebab_case()
}

fn derive_description(candidate: &CommandCandidate, name: &str) -> String {
    if let Some(description) = &candidate.overrides.description {
        return description.clone();
    }
    let first_line = candidate.doc.trim().lines().next().unwrap_or("").trim();
    if !first_line.is_empty() {
        return first_line.to_string();
    }
    format!("Execute {} command", name)
}

fn derive_category(module: &str) -> String {
    CATEGORY_KEYWORDS
        .iter()
        .find(|(keyword, _)| module.contains(keyword))
        .map(|(_, category)| (*category).to_string())
        .unwrap_or_else(|| "general".to_string())
}

/// Union of explicit override tags and module-keyword matches, first
/// occurrence wins.
fn derive_tags(candidate: &CommandCandidate) -> Vec<String> {
    let module = candidate.module.to_lowercase();
    let mut tags: Vec<String> = candidate.overrides.tags.clone();
    for (keyword, tag) in TAG_KEYWORDS {
        if module.contains(keyword) && !tags.iter().any(|existing| existing == tag) {
            tags.push((*tag).to_string());
        }
    }
    tags
}

fn derive_parameters(signature: &[ParamDecl]) -> IndexMap<String, ParamSpec> {
    signature
        .iter()
        .filter(|decl| decl.name != "args" && decl.name != "kwargs")
        .map(|decl| {
            let spec = ParamSpec {
                ty: decl.ty,
                required: decl.default.is_none(),
                default: decl.default.clone(),
            };
            (decl.name.clone(), spec)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn noop_handler() -> CommandHandler {
        Arc::new(|_args, _kwargs, _context| Ok(Value::Null))
    }

    fn candidate(ident: &str, module: &str) -> CommandCandidate {
        CommandCandidate::new(ident, module, noop_handler())
    }

    #[test]
    fn accepts_prefixed_idents_and_doc_keywords_and_markers() {
        assert!(is_command_candidate(&candidate("cmd_create_spec", "m")));
        assert!(is_command_candidate(&candidate("command_run", "m")));
        assert!(is_command_candidate(
            &candidate("create", "m").with_doc("Spec creation command")
        ));
        let marked = candidate("create", "m").with_overrides(CandidateOverrides {
            marker: true,
            ..Default::default()
        });
        assert!(is_command_candidate(&marked));
        assert!(!is_command_candidate(&candidate("helper", "m").with_doc("A helper")));
    }

    #[test]
    fn name_strips_prefix_and_kebab_cases() {
        let discovered = synthesize_command(&candidate("cmd_create_spec", "speckit::builtins"));
        assert_eq!(discovered.name, "create-spec");

        let overridden = candidate("cmd_create_spec", "m").with_overrides(CandidateOverrides {
            name: Some("specify".into()),
            ..Default::default()
        });
        assert_eq!(synthesize_command(&overridden).name, "specify");
    }

    #[test]
    fn description_falls_back_from_doc_to_generated() {
        let documented = candidate("cmd_plan", "m").with_doc("Create an implementation plan.\n\nMore detail.");
        assert_eq!(
            synthesize_command(&documented).metadata.description,
            "Create an implementation plan."
        );

        let bare = candidate("cmd_plan", "m");
        assert_eq!(synthesize_command(&bare).metadata.description, "Execute plan command");
    }

    #[test]
    fn category_and_tags_derive_from_module_keywords() {
        let discovered = synthesize_command(&candidate("cmd_create_spec", "speckit::builtins::spec_command"));
        assert_eq!(discovered.metadata.category, "specification");
        assert_eq!(discovered.metadata.tags, vec!["specification"]);

        let general = synthesize_command(&candidate("cmd_misc", "speckit::builtins::misc"));
        assert_eq!(general.metadata.category, "general");
        assert!(general.metadata.tags.is_empty());
    }

    #[test]
    fn parameters_derive_required_from_missing_default() {
        let with_signature = candidate("cmd_spec", "m").with_signature(vec![
            ParamDecl::required("description", ParamType::String),
            ParamDecl::with_default("template", ParamType::String, json!("default")),
            ParamDecl::required("kwargs", ParamType::Any),
        ]);
        let parameters = synthesize_command(&with_signature).metadata.parameters;

        assert_eq!(parameters.len(), 2);
        assert!(parameters["description"].required);
        assert!(!parameters["template"].required);
        assert_eq!(parameters["template"].default, Some(json!("default")));
    }

    #[test]
    fn project_and_hidden_heuristics_follow_ident() {
        assert!(synthesize_command(&candidate("cmd_init_project", "m")).metadata.requires_project);
        assert!(!synthesize_command(&candidate("cmd_spec", "m")).metadata.requires_project);
        assert!(synthesize_command(&candidate("cmd_internal_sync", "m")).metadata.hidden);
    }

    #[test]
    fn unknown_namespace_degrades_to_empty() {
        let mut discovery = CommandDiscovery::new();
        assert!(discovery.discover("no.such.namespace").is_empty());
    }

    #[test]
    fn discover_and_register_reports_counts_and_tolerates_failures() {
        let mut discovery = CommandDiscovery::new();
        let colliding = candidate("cmd_plan", "m").with_overrides(CandidateOverrides {
            aliases: vec!["spec".into()],
            ..Default::default()
        });
        discovery.add_namespace(
            "speckit.builtins",
            vec![
                candidate("cmd_spec", "speckit::builtins::spec_command"),
                colliding,
                candidate("not_a_command", "m"),
            ],
        );

        let mut registry = CommandRegistry::new();
        let report = discovery.discover_and_register("speckit.builtins", &mut registry);

        // The alias collision is logged and skipped, not fatal.
        assert_eq!(report.discovered_count, 2);
        assert_eq!(report.registered_count, 1);
        assert_eq!(report.commands, vec!["spec", "plan"]);
        assert!(registry.get("spec").is_some());
        assert!(registry.get("plan").is_none());
    }

    #[test]
    fn rediscovery_is_order_stable() {
        let mut discovery = CommandDiscovery::new();
        discovery.add_namespace(
            "ns",
            vec![candidate("cmd_alpha", "m"), candidate("cmd_beta", "m"), candidate("cmd_gamma", "m")],
        );

        let first: Vec<String> = discovery.discover("ns").into_iter().map(|c| c.name).collect();
        discovery.clear_discovered();
        let second: Vec<String> = discovery.discover("ns").into_iter().map(|c| c.name).collect();
        assert_eq!(first, second);
        assert_eq!(first, vec!["alpha", "beta", "gamma"]);
    }
}
