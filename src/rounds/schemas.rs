//! JSON schemas and system prompts for the six LLM rounds (spec §4.9/§4.12).
//! Each schema mirrors its round's payload type in `rounds::types` field for
//! field; the provider layer forces the model to call a single tool whose
//! arguments must validate against it (spec §4.9 "structured output").

use serde_json::{json, Value};

/// Round 1: high-level module inventory.
pub fn modules_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "modules": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "path": {"type": "string"},
                        "purpose": {"type": "string"},
                        "key_files": {"type": "array", "items": {"type": "string"}}
                    },
                    "required": ["name", "path", "purpose", "key_files"]
                }
            },
            "summary": {"type": "string"}
        },
        "required": ["modules", "summary"]
    })
}

/// Round 2: architectural analysis.
pub fn architecture_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "overview": {"type": "string"},
            "layers": {"type": "array", "items": {"type": "string"}},
            "relationships": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "from": {"type": "string"},
                        "to": {"type": "string"},
                        "kind": {"type": "string"}
                    },
                    "required": ["from", "to", "kind"]
                }
            },
            "entry_points": {"type": "array", "items": {"type": "string"}}
        },
        "required": ["overview", "layers", "relationships", "entry_points"]
    })
}

/// Round 3: feature inventory.
pub fn features_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "features": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "description": {"type": "string"},
                        "entry_files": {"type": "array", "items": {"type": "string"}}
                    },
                    "required": ["name", "description", "entry_files"]
                }
            }
        },
        "required": ["features"]
    })
}

/// Round 4: conventions, edge cases, and open questions.
pub fn conventions_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "conventions": {"type": "array", "items": {"type": "string"}},
            "edge_cases": {"type": "array", "items": {"type": "string"}},
            "open_questions": {"type": "array", "items": {"type": "string"}}
        },
        "required": ["conventions", "edge_cases", "open_questions"]
    })
}

/// Round 5: a single module's deep dive (fanned out one call per module).
pub fn module_deep_dive_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "module": {"type": "string"},
            "responsibilities": {"type": "array", "items": {"type": "string"}},
            "dependencies": {"type": "array", "items": {"type": "string"}},
            "risks": {"type": "array", "items": {"type": "string"}}
        },
        "required": ["module", "responsibilities", "dependencies", "risks"]
    })
}

/// Round 6: operations/deployment analysis.
pub fn operations_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "deployment_notes": {"type": "array", "items": {"type": "string"}},
            "environment_requirements": {"type": "array", "items": {"type": "string"}},
            "observability_notes": {"type": "array", "items": {"type": "string"}}
        },
        "required": ["deployment_notes", "environment_requirements", "observability_notes"]
    })
}

pub const MODULES_SYSTEM_PROMPT: &str = "You are analyzing a source repository to produce a high-level module \
inventory. List the repository's major modules, each with its path, a one-sentence purpose, and its key files. \
Close with a brief overall summary.";

pub const ARCHITECTURE_SYSTEM_PROMPT: &str = "You are analyzing a source repository's architecture, building on a \
prior module inventory. Describe the overall architecture, the layers present, the relationships between modules \
(as from/to/kind triples), and the entry points a new contributor would start reading from.";

pub const FEATURES_SYSTEM_PROMPT: &str = "You are cataloging the user-facing and developer-facing features of this \
repository, building on its module inventory and architecture. For each feature, give a name, a description, and \
the files most relevant to understanding it.";

pub const CONVENTIONS_SYSTEM_PROMPT: &str = "You are identifying the coding conventions, edge cases, and open \
questions in this repository, building on its module inventory, architecture, and feature set. List conventions \
a new contributor should follow, edge cases the code handles, and anything left ambiguous or undocumented.";

pub const OPERATIONS_SYSTEM_PROMPT: &str = "You are analyzing this repository's operational surface, building on \
its module inventory and architecture. Describe how it is deployed, what environment it requires, and what \
observability (logging, metrics, tracing) it exposes.";

/// Builds the per-module system prompt for round 5's fan-out.
pub fn module_deep_dive_system_prompt(module_name: &str) -> String {
    format!(
        "You are producing a deep dive on the module \"{module_name}\", building on the repository's module \
inventory and architecture. Describe its responsibilities, the other modules or external packages it depends on, \
and any risks (bugs, missing tests, fragile assumptions) you observe."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_required_matches_properties(schema: &Value) {
        let properties = schema["properties"].as_object().expect("schema must have properties");
        let required = schema["required"].as_array().expect("schema must have required");
        for name in required {
            let key = name.as_str().unwrap();
            assert!(properties.contains_key(key), "required field {key} missing from properties");
        }
    }

    #[test]
    fn all_round_schemas_are_well_formed_objects() {
        for schema in [
            modules_schema(),
            architecture_schema(),
            features_schema(),
            conventions_schema(),
            module_deep_dive_schema(),
            operations_schema(),
        ] {
            assert_eq!(schema["type"], "object");
            assert_required_matches_properties(&schema);
        }
    }

    #[test]
    fn module_deep_dive_prompt_interpolates_module_name() {
        let prompt = module_deep_dive_system_prompt("packer::context_packer");
        assert!(prompt.contains("packer::context_packer"));
    }
}
