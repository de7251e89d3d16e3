// Tool schema registry - the functions the model is allowed to call

use crate::error::{AgentError, Result};
use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::HashSet;

/// Parameter types the hosted model understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchemaType {
    String,
    Integer,
    Boolean,
    Object,
}

impl SchemaType {
    fn matches(&self, value: &Value) -> bool {
        match self {
            SchemaType::String => value.is_string(),
            // Numbers come back from the model as doubles, so 3.0 counts as an integer
            SchemaType::Integer => {
                value.is_i64()
                    || value.is_u64()
                    || value.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
            }
            SchemaType::Boolean => value.is_boolean(),
            SchemaType::Object => value.is_object(),
        }
    }
}

const DATE_FORMAT: &str = "date";
const DATE_TIME_FORMAT: &str = "date-time";

/// One named parameter of a tool
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    pub schema_type: SchemaType,
    pub description: String,
    pub format: Option<String>,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, schema_type: SchemaType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema_type,
            description: description.into(),
            format: None,
        }
    }

    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, SchemaType::String, description)
    }

    pub fn integer(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, SchemaType::Integer, description)
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    fn to_schema(&self) -> Value {
        let mut schema = json!({
            "type": self.schema_type,
            "description": self.description,
        });
        if let Some(format) = &self.format {
            schema["format"] = json!(format);
        }
        schema
    }

    fn check_value(&self, value: &Value) -> std::result::Result<(), String> {
        if !self.schema_type.matches(value) {
            return Err(format!(
                "'{}' should be {:?}, got {}",
                self.name, self.schema_type, value
            ));
        }

        let (Some(format), Some(text)) = (self.format.as_deref(), value.as_str()) else {
            return Ok(());
        };
        let parsed = match format {
            DATE_FORMAT => NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok(),
            DATE_TIME_FORMAT => DateTime::parse_from_rfc3339(text).is_ok(),
            _ => true,
        };
        if parsed {
            Ok(())
        } else {
            Err(format!("'{}' is not a valid {}: {}", self.name, format, text))
        }
    }
}

/// A function the model may request by name
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub properties: Vec<ParameterSpec>,
    pub required: Vec<String>,
}

impl ToolDeclaration {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            properties: Vec::new(),
            required: Vec::new(),
        }
    }

    pub fn param(mut self, spec: ParameterSpec) -> Self {
        self.properties.push(spec);
        self
    }

    pub fn require(mut self, names: &[&str]) -> Self {
        self.required.extend(names.iter().map(|n| n.to_string()));
        self
    }

    pub fn property(&self, name: &str) -> Option<&ParameterSpec> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// `functionDeclarations` entry as the model API expects it
    pub fn to_function_declaration(&self) -> Value {
        let properties: Map<String, Value> = self
            .properties
            .iter()
            .map(|p| (p.name.clone(), p.to_schema()))
            .collect();

        let mut parameters = json!({
            "type": SchemaType::Object,
            "properties": properties,
        });
        if !self.required.is_empty() {
            parameters["required"] = json!(self.required);
        }

        json!({
            "name": self.name,
            "description": self.description,
            "parameters": parameters,
        })
    }

    /// Checks extracted arguments against this declaration: no undeclared keys,
    /// every required key present, every value of the declared type and format.
    pub fn validate_arguments(&self, arguments: &Map<String, Value>) -> std::result::Result<(), String> {
        for (key, value) in arguments {
            let spec = self
                .property(key)
                .ok_or_else(|| format!("unexpected parameter '{}'", key))?;
            spec.check_value(value)?;
        }

        for name in &self.required {
            if !arguments.contains_key(name) {
                return Err(format!("missing '{}' parameter", name));
            }
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AgentError::Configuration("tool with empty name".to_string()));
        }

        let mut seen = HashSet::new();
        for spec in &self.properties {
            if !seen.insert(spec.name.as_str()) {
                return Err(AgentError::Configuration(format!(
                    "tool '{}' declares parameter '{}' twice",
                    self.name, spec.name
                )));
            }
            if let Some(format) = &spec.format {
                if spec.schema_type != SchemaType::String {
                    return Err(AgentError::Configuration(format!(
                        "tool '{}': format on non-string parameter '{}'",
                        self.name, spec.name
                    )));
                }
                if format != DATE_FORMAT && format != DATE_TIME_FORMAT {
                    return Err(AgentError::Configuration(format!(
                        "tool '{}': unsupported format '{}' on '{}'",
                        self.name, format, spec.name
                    )));
                }
            }
        }

        for name in &self.required {
            if self.property(name).is_none() {
                return Err(AgentError::Configuration(format!(
                    "tool '{}' requires undeclared parameter '{}'",
                    self.name, name
                )));
            }
        }

        Ok(())
    }
}

/// Ordered, validated set of declarations bound to the model for a whole session
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSet {
    declarations: Vec<ToolDeclaration>,
}

impl ToolSet {
    /// Validates every declaration; any defect is a `Configuration` error.
    pub fn new(declarations: Vec<ToolDeclaration>) -> Result<Self> {
        let mut names = HashSet::new();
        for declaration in &declarations {
            declaration.validate()?;
            if !names.insert(declaration.name.as_str()) {
                return Err(AgentError::Configuration(format!(
                    "tool '{}' declared twice",
                    declaration.name
                )));
            }
        }

        Ok(Self { declarations })
    }

    pub fn get(&self, name: &str) -> Option<&ToolDeclaration> {
        self.declarations.iter().find(|d| d.name == name)
    }

    pub fn declarations(&self) -> &[ToolDeclaration] {
        &self.declarations
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// All declarations bundled as a single `tools` entry
    pub fn to_wire(&self) -> Value {
        let declarations: Vec<Value> = self
            .declarations
            .iter()
            .map(ToolDeclaration::to_function_declaration)
            .collect();
        json!({ "functionDeclarations": declarations })
    }
}
