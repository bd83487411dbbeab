//! Typed tool arguments
//!
//! Model output is loose: numbers arrive as strings, flags as `"true"`, and
//! argument names in either camelCase or snake_case. Everything is coerced
//! here, once, so handlers only ever see well-typed values.

use serde::Deserialize;
use serde_json::Value;

use crate::agent::tool_call::AgentToolCall;
use crate::tools::registry::{parse_params, ToolResult};

/// Lenient field deserializers for model-written arguments
pub mod coerce {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn kind(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "a boolean",
            Value::Number(_) => "a number",
            Value::String(_) => "a string",
            Value::Array(_) => "an array",
            Value::Object(_) => "an object",
        }
    }

    fn scalar_text(value: Value) -> Result<String, String> {
        match value {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(format!("expected a string, found {}", kind(&other))),
        }
    }

    fn unsigned(value: Value) -> Result<Option<u64>, String> {
        match value {
            Value::Null => Ok(None),
            Value::Number(n) => match (n.as_u64(), n.as_f64()) {
                (Some(v), _) => Ok(Some(v)),
                (None, Some(f)) if f.is_finite() && f >= 0.0 => Ok(Some(f as u64)),
                _ => Err(format!("expected a non-negative number, found {}", n)),
            },
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => s
                .trim()
                .parse::<u64>()
                .map(Some)
                .map_err(|_| format!("expected a non-negative number, found {:?}", s)),
            other => Err(format!("expected a number, found {}", kind(&other))),
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        scalar_text(Value::deserialize(d)?).map_err(D::Error::custom)
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(None),
            other => scalar_text(other).map(Some).map_err(D::Error::custom),
        }
    }

    pub fn opt_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
        unsigned(Value::deserialize(d)?).map_err(D::Error::custom)
    }

    pub fn opt_usize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<usize>, D::Error> {
        let value = unsigned(Value::deserialize(d)?).map_err(D::Error::custom)?;
        value
            .map(|v| usize::try_from(v).map_err(D::Error::custom))
            .transpose()
    }

    pub fn opt_bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(None),
            Value::Bool(b) => Ok(Some(b)),
            Value::Number(n) => Ok(Some(n.as_f64().is_some_and(|f| f != 0.0))),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(Some(true)),
                "false" | "no" | "0" | "" => Ok(Some(false)),
                _ => Err(D::Error::custom(format!("expected a boolean, found {:?}", s))),
            },
            other => Err(D::Error::custom(format!(
                "expected a boolean, found {}",
                kind(&other)
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunArgs {
    #[serde(alias = "cmd", deserialize_with = "coerce::string")]
    pub command: String,
    /// Seconds
    #[serde(default, deserialize_with = "coerce::opt_u64")]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadArgs {
    #[serde(alias = "file_path", alias = "path", deserialize_with = "coerce::string")]
    pub file_path: String,
    /// 0-based chunk to start from
    #[serde(default, deserialize_with = "coerce::opt_usize")]
    pub chunk: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteArgs {
    #[serde(alias = "file_path", alias = "path", deserialize_with = "coerce::string")]
    pub file_path: String,
    #[serde(deserialize_with = "coerce::string")]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyDiffArgs {
    #[serde(
        alias = "diff_content",
        alias = "diff",
        alias = "patch",
        deserialize_with = "coerce::string"
    )]
    pub diff_content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListArgs {
    #[serde(default, alias = "dir", deserialize_with = "coerce::opt_string")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindArgs {
    #[serde(alias = "glob", deserialize_with = "coerce::string")]
    pub pattern: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrepArgs {
    #[serde(alias = "regex", deserialize_with = "coerce::string")]
    pub pattern: String,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub path: Option<String>,
    #[serde(default, alias = "ignore_case", deserialize_with = "coerce::opt_bool")]
    pub ignore_case: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchArgs {
    #[serde(deserialize_with = "coerce::string")]
    pub query: String,
    #[serde(default, alias = "limit", deserialize_with = "coerce::opt_usize")]
    pub k: Option<usize>,
}

/// A tool call whose arguments have been validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolInvocation {
    Run(RunArgs),
    Read(ReadArgs),
    Write(WriteArgs),
    ApplyDiff(ApplyDiffArgs),
    List(ListArgs),
    Find(FindArgs),
    Grep(GrepArgs),
    Search(SearchArgs),
    /// Name that matches no built-in tool
    Unknown(String),
}

impl ToolInvocation {
    pub fn from_call(call: &AgentToolCall) -> Result<Self, ToolResult> {
        let args = Value::Object(call.args.clone());
        let invocation = match call.tool.as_str() {
            "run" => Self::Run(parse_params(args)?),
            "read" => Self::Read(parse_params(args)?),
            "write" => Self::Write(parse_params(args)?),
            "applydiff" => Self::ApplyDiff(parse_params(args)?),
            "list" => Self::List(parse_params(args)?),
            "find" => Self::Find(parse_params(args)?),
            "grep" => Self::Grep(parse_params(args)?),
            "search" => Self::Search(parse_params(args)?),
            other => Self::Unknown(other.to_string()),
        };
        Ok(invocation)
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Run(_) => "run",
            Self::Read(_) => "read",
            Self::Write(_) => "write",
            Self::ApplyDiff(_) => "applydiff",
            Self::List(_) => "list",
            Self::Find(_) => "find",
            Self::Grep(_) => "grep",
            Self::Search(_) => "search",
            Self::Unknown(name) => name,
        }
    }
}
