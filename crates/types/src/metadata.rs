//! Command and agent metadata descriptors.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared type of a command parameter.
///
/// Parameter schemas are descriptive: the registry checks coarse shape
/// against these before delegating to a handler, nothing more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Int,
    Float,
    Bool,
    List,
    Dict,
    /// Matches any supplied value, including null.
    #[default]
    Any,
}

impl ParamType {
    /// Check whether a coerced scalar satisfies this declared type.
    ///
    /// `Any` accepts everything; every other type requires an exact JSON
    /// shape match, so a null value only ever satisfies `Any`.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ParamType::Any => true,
            ParamType::String => value.is_string(),
            ParamType::Int => value.is_i64() || value.is_u64(),
            ParamType::Float => value.is_f64(),
            ParamType::Bool => value.is_boolean(),
            ParamType::List => value.is_array(),
            ParamType::Dict => value.is_object(),
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ParamType::String => "string",
            ParamType::Int => "int",
            ParamType::Float => "float",
            ParamType::Bool => "bool",
            ParamType::List => "list",
            ParamType::Dict => "dict",
            ParamType::Any => "any",
        };
        write!(f, "{}", name)
    }
}

/// Schema entry for a single named parameter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Declared type; defaults to `any` when absent from the encoding.
    #[serde(rename = "type", default)]
    pub ty: ParamType,
    /// Whether the parameter must be supplied by the caller.
    #[serde(default)]
    pub required: bool,
    /// Default value, when the parameter declaration carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamSpec {
    /// A required parameter of the given type.
    pub fn required(ty: ParamType) -> Self {
        Self {
            ty,
            required: true,
            default: None,
        }
    }

    /// An optional parameter of the given type.
    pub fn optional(ty: ParamType) -> Self {
        Self {
            ty,
            required: false,
            default: None,
        }
    }
}

fn default_category() -> String {
    "general".to_string()
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_author() -> String {
    "speckit".to_string()
}

/// Descriptor for a registered command.
///
/// Created once at discovery/registration time and immutable afterwards;
/// re-registering the same name replaces the descriptor wholesale. The
/// enabled flag lives on the registry entry, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandMetadata {
    /// Unique primary key within the registry. Case-preserving.
    pub name: String,
    /// Human-readable summary shown in listings and help.
    #[serde(default)]
    pub description: String,
    /// Grouping key used by listings and search.
    #[serde(default = "default_category")]
    pub category: String,
    /// Secondary lookup keys resolving to this command.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Parameter schema keyed by parameter name, insertion-ordered.
    #[serde(default)]
    pub parameters: IndexMap<String, ParamSpec>,
    /// Usage examples for help output.
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_author")]
    pub author: String,
    /// Free-text labels used by search.
    #[serde(default)]
    pub tags: Vec<String>,
    /// When true, invocation requires a `project_path` in the context.
    #[serde(default)]
    pub requires_project: bool,
    /// Hidden commands are excluded from listings but remain invocable.
    #[serde(default)]
    pub hidden: bool,
}

impl CommandMetadata {
    /// Create metadata with defaults for everything beyond name/description.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            category: default_category(),
            aliases: Vec::new(),
            parameters: IndexMap::new(),
            examples: Vec::new(),
            version: default_version(),
            author: default_author(),
            tags: Vec::new(),
            requires_project: false,
            hidden: false,
        }
    }

    /// Canonical dictionary encoding for persistence and inspection.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Reconstruct from the canonical encoding, defaulting absent fields.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

/// Descriptor for a registered agent (capability provider).
///
/// Mirrors [`CommandMetadata`] with capability and provenance fields plus a
/// per-action input schema keyed by the agent's own action dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Ordered capability labels exposed by the agent.
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_author")]
    pub author: String,
    /// Source type name the agent was constructed from.
    #[serde(default)]
    pub class_name: String,
    /// Module path the agent was discovered in.
    #[serde(default)]
    pub module: String,
    /// Field specs per action name; descriptive only, the core never
    /// interprets actions.
    #[serde(default)]
    pub input_schema: IndexMap<String, IndexMap<String, ParamSpec>>,
}

impl AgentMetadata {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            capabilities: Vec::new(),
            version: default_version(),
            author: default_author(),
            class_name: String::new(),
            module: String::new(),
            input_schema: IndexMap::new(),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}
