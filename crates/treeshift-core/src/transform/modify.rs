//! Modify: recompute values in place
//!
//! A leaf's right-hand side is one of:
//!
//! - a literal value: `"status": "active"`
//! - a lookup: `"name": "@(1,fullName)"`
//! - a function call: `"name": "=toUpper"`, `"total": "=intSum(@(1,items))"`
//! - a list of the above, tried in order until one produces a value
//!
//! Function arguments may be quoted strings (`'text'`), numbers, `true`,
//! `false`, `null`, `@` (the current value), lookups, `&` references and
//! nested calls. `=name` without parentheses is called with the current
//! value. Any argument that cannot be resolved skips the write.
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

use super::Transform;
use crate::config::EngineConfig;
use crate::error::SpecError;
use crate::functions::{Function, FunctionRegistry};
use crate::path::scanner::{ScanError, Scanner};
use crate::path::{PathElement, Reference, Transpose};
use crate::walked::WalkedPath;
use crate::walker::{CompiledSpec, LeafPolicy, MatchContext, TargetContext, WriteDecision};
use regex::Regex;
use serde_json::{Number, Value};
use std::fmt;
use std::sync::{Arc, LazyLock};

static FUNCTION_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid function name regex"));

static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?$").expect("valid number regex")
});

/// When a modify leaf writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifyMode {
    /// Always
    Overwrite,
    /// When the value is absent or null
    Default,
    /// When the value is absent
    Define,
}

impl ModifyMode {
    pub fn name(self) -> &'static str {
        match self {
            ModifyMode::Overwrite => "modify-overwrite",
            ModifyMode::Default => "modify-default",
            ModifyMode::Define => "modify-define",
        }
    }

    fn applies_to(self, current: Option<&Value>) -> bool {
        match self {
            ModifyMode::Overwrite => true,
            ModifyMode::Default => matches!(current, None | Some(Value::Null)),
            ModifyMode::Define => current.is_none(),
        }
    }
}

/// A function argument
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Literal(Value),
    /// `@`
    Current,
    Lookup(Transpose),
    Reference(Reference),
    Call(Box<FunctionCall>),
}

impl Argument {
    fn resolve(&self, current: Option<&Value>, walked: &WalkedPath<'_>) -> Option<Value> {
        match self {
            Argument::Literal(value) => Some(value.clone()),
            Argument::Current => current.cloned(),
            Argument::Lookup(transpose) => transpose.lookup(walked).cloned(),
            Argument::Reference(reference) => reference.resolve(walked).map(|key| Value::String(key.to_string())),
            Argument::Call(call) => call.evaluate(current, walked),
        }
    }
}

/// A resolved `=name(args)` expression
#[derive(Clone)]
pub struct FunctionCall {
    name: String,
    function: Function,
    args: Vec<Argument>,
}

impl FunctionCall {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[Argument] {
        &self.args
    }

    /// Resolve the arguments and call the function
    pub fn evaluate(&self, current: Option<&Value>, walked: &WalkedPath<'_>) -> Option<Value> {
        let args = self
            .args
            .iter()
            .map(|arg| arg.resolve(current, walked))
            .collect::<Option<Vec<_>>>()?;
        (self.function)(&args)
    }
}

impl PartialEq for FunctionCall {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.args == other.args
    }
}

impl fmt::Debug for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionCall")
            .field("name", &self.name)
            .field("args", &self.args)
            .finish()
    }
}

/// One way of producing a value
#[derive(Debug, Clone, PartialEq)]
pub enum ValueSource {
    Literal(Value),
    Lookup(Transpose),
    Call(FunctionCall),
}

impl ValueSource {
    fn evaluate(&self, current: Option<&Value>, walked: &WalkedPath<'_>) -> Option<Value> {
        match self {
            ValueSource::Literal(value) => Some(value.clone()),
            ValueSource::Lookup(transpose) => transpose.lookup(walked).cloned(),
            ValueSource::Call(call) => call.evaluate(current, walked),
        }
    }
}

/// Compiled right-hand side of a modify leaf
#[derive(Debug, Clone, PartialEq)]
pub struct ModifyTarget {
    candidates: Vec<ValueSource>,
}

impl ModifyTarget {
    pub fn candidates(&self) -> &[ValueSource] {
        &self.candidates
    }

    /// The first candidate that produces a value
    pub fn evaluate(&self, current: Option<&Value>, walked: &WalkedPath<'_>) -> Option<Value> {
        self.candidates
            .iter()
            .find_map(|candidate| candidate.evaluate(current, walked))
    }
}

/// Leaf behaviour of a modify spec
#[derive(Debug, Clone)]
pub struct ModifyPolicy {
    mode: ModifyMode,
    registry: Arc<FunctionRegistry>,
}

impl ModifyPolicy {
    pub fn new(mode: ModifyMode, registry: Arc<FunctionRegistry>) -> Self {
        Self { mode, registry }
    }

    pub fn mode(&self) -> ModifyMode {
        self.mode
    }

    fn compile_source(&self, rhs: &Value, context: &TargetContext<'_>) -> Result<ValueSource, SpecError> {
        let Value::String(text) = rhs else {
            return Ok(ValueSource::Literal(rhs.clone()));
        };

        if let Some(expression) = text.strip_prefix('=') {
            if !context.config().functions {
                return Err(SpecError::invalid_value(
                    context.location(),
                    "function expressions are disabled",
                ));
            }
            return self.parse_call(expression, context).map(ValueSource::Call);
        }
        if text.starts_with('@') {
            return Transpose::parse(text)
                .map(ValueSource::Lookup)
                .map_err(|e| SpecError::invalid_value(context.location(), format!("invalid lookup '{}': {}", text, e.message)));
        }
        if let Some(escaped) = text.strip_prefix('\\').filter(|rest| rest.starts_with(['@', '='])) {
            return Ok(ValueSource::Literal(Value::String(escaped.to_string())));
        }
        Ok(ValueSource::Literal(rhs.clone()))
    }

    /// `name` or `name(arg, ...)`, without the leading `=`
    fn parse_call(&self, expression: &str, context: &TargetContext<'_>) -> Result<FunctionCall, SpecError> {
        let expression = expression.trim();
        let (name, args) = match expression.find('(') {
            None => (expression, None),
            Some(open) => {
                let Some(inner) = expression[open + 1..].strip_suffix(')') else {
                    return Err(SpecError::invalid_value(
                        context.location(),
                        format!("unclosed argument list in '={}'", expression),
                    ));
                };
                (expression[..open].trim(), Some(inner))
            }
        };

        if !FUNCTION_NAME.is_match(name) {
            return Err(SpecError::invalid_value(
                context.location(),
                format!("invalid function name '{}'", name),
            ));
        }
        let function = self.registry.get(name).ok_or_else(|| SpecError::UnknownFunction {
            name: name.to_string(),
            location: context.location().to_string(),
        })?;

        let args = match args {
            None => vec![Argument::Current],
            Some(inner) => split_arguments(inner)
                .map_err(|e| SpecError::invalid_value(context.location(), format!("in '={}': {}", expression, e.message)))?
                .into_iter()
                .map(|arg| self.parse_argument(&arg, context))
                .collect::<Result<_, _>>()?,
        };

        Ok(FunctionCall {
            name: name.to_string(),
            function,
            args,
        })
    }

    fn parse_argument(&self, arg: &str, context: &TargetContext<'_>) -> Result<Argument, SpecError> {
        let invalid = |message: String| SpecError::invalid_value(context.location(), message);

        if arg.len() >= 2 && arg.starts_with('\'') && arg.ends_with('\'') {
            return Ok(Argument::Literal(Value::String(unquote(&arg[1..arg.len() - 1]))));
        }
        match arg {
            "@" => return Ok(Argument::Current),
            "true" => return Ok(Argument::Literal(Value::Bool(true))),
            "false" => return Ok(Argument::Literal(Value::Bool(false))),
            "null" => return Ok(Argument::Literal(Value::Null)),
            _ => {}
        }
        if arg.starts_with('@') {
            return Transpose::parse(arg)
                .map(Argument::Lookup)
                .map_err(|e| invalid(format!("invalid lookup argument '{}': {}", arg, e.message)));
        }
        if arg.starts_with('&') {
            let mut scanner = Scanner::new(arg);
            scanner.advance();
            let reference = scanner
                .parse_reference_tail()
                .map_err(|e| invalid(format!("invalid reference argument '{}': {}", arg, e.message)))?;
            if !scanner.is_at_end() {
                return Err(invalid(format!("invalid reference argument '{}'", arg)));
            }
            return Ok(Argument::Reference(reference));
        }
        if let Some(expression) = arg.strip_prefix('=') {
            return self.parse_call(expression, context).map(|call| Argument::Call(Box::new(call)));
        }
        if NUMBER.is_match(arg) {
            if let Ok(integer) = arg.parse::<i64>() {
                return Ok(Argument::Literal(Value::from(integer)));
            }
            if let Some(number) = arg.parse::<f64>().ok().and_then(Number::from_f64) {
                return Ok(Argument::Literal(Value::Number(number)));
            }
        }
        Err(invalid(format!("unrecognized argument '{}'", arg)))
    }
}

/// Split on commas outside quotes and parentheses
fn split_arguments(inner: &str) -> Result<Vec<String>, ScanError> {
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut args = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quoted = false;
    let mut chars = inner.chars().enumerate();

    while let Some((position, ch)) = chars.next() {
        match ch {
            '\\' if quoted => {
                current.push(ch);
                if let Some((_, escaped)) = chars.next() {
                    current.push(escaped);
                }
                continue;
            }
            '\'' => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| ScanError::new("unbalanced `)`", position))?;
            }
            ',' if !quoted && depth == 0 => {
                let arg = std::mem::take(&mut current).trim().to_string();
                if arg.is_empty() {
                    return Err(ScanError::new("empty argument", position));
                }
                args.push(arg);
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }

    if quoted {
        return Err(ScanError::new("unterminated string", inner.chars().count()));
    }
    let arg = current.trim().to_string();
    if arg.is_empty() {
        return Err(ScanError::new("empty argument", inner.chars().count()));
    }
    args.push(arg);
    Ok(args)
}

fn unquote(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(escaped) = chars.next() {
                result.push(escaped);
            }
        } else {
            result.push(ch);
        }
    }
    result
}

impl LeafPolicy for ModifyPolicy {
    type Target = ModifyTarget;

    const NAME: &'static str = "modify";

    fn compile_target(&self, rhs: &Value, context: &TargetContext<'_>) -> Result<Self::Target, SpecError> {
        let candidates = match rhs {
            Value::Array(items) if items.is_empty() => {
                return Err(SpecError::invalid_value(context.location(), "empty list of candidates"))
            }
            Value::Array(items) => items
                .iter()
                .map(|item| self.compile_source(item, context))
                .collect::<Result<_, _>>()?,
            other => vec![self.compile_source(other, context)?],
        };
        Ok(ModifyTarget { candidates })
    }

    fn validate_element(&self, element: &PathElement, context: &TargetContext<'_>) -> Result<(), SpecError> {
        match element {
            PathElement::At => Ok(()),
            other if other.is_special() => Err(SpecError::invalid_key(
                other.canonical(),
                format!("{} keys are not supported in modify specs", other.kind()),
                None,
            )
            .at(context.location())),
            _ => Ok(()),
        }
    }

    fn visits_missing(&self) -> bool {
        true
    }

    fn leaf_action<'t>(&self, target: &'t Self::Target, matched: &MatchContext<'_, '_>) -> WriteDecision<'t> {
        let current = matched.data();
        if !self.mode.applies_to(current) {
            return WriteDecision::Skip;
        }
        target
            .evaluate(current, matched.walked())
            .map(WriteDecision::Replace)
            .unwrap_or(WriteDecision::Skip)
    }
}

/// A compiled modify spec
#[derive(Debug, PartialEq)]
pub struct Modify {
    spec: CompiledSpec<ModifyPolicy>,
}

impl Modify {
    /// Compile with the built-in functions and the default configuration
    pub fn new(mode: ModifyMode, spec: &Value) -> Result<Self, SpecError> {
        Self::with_registry(mode, spec, Arc::new(FunctionRegistry::builtin()), &EngineConfig::default())
    }

    pub fn overwrite(spec: &Value) -> Result<Self, SpecError> {
        Self::new(ModifyMode::Overwrite, spec)
    }

    pub fn default_values(spec: &Value) -> Result<Self, SpecError> {
        Self::new(ModifyMode::Default, spec)
    }

    pub fn define(spec: &Value) -> Result<Self, SpecError> {
        Self::new(ModifyMode::Define, spec)
    }

    pub fn with_config(mode: ModifyMode, spec: &Value, config: &EngineConfig) -> Result<Self, SpecError> {
        Self::with_registry(mode, spec, Arc::new(FunctionRegistry::builtin()), config)
    }

    /// Compile against a custom function registry
    pub fn with_registry(
        mode: ModifyMode,
        spec: &Value,
        registry: Arc<FunctionRegistry>,
        config: &EngineConfig,
    ) -> Result<Self, SpecError> {
        Ok(Self {
            spec: CompiledSpec::compile(ModifyPolicy::new(mode, registry), spec, config)?,
        })
    }

    pub fn mode(&self) -> ModifyMode {
        self.spec.policy().mode()
    }

    pub fn compiled(&self) -> &CompiledSpec<ModifyPolicy> {
        &self.spec
    }

    pub fn apply(&self, input: &Value) -> Value {
        self.spec.walk(input).apply_edits(input)
    }
}

impl Transform for Modify {
    fn transform(&self, input: &Value) -> Value {
        self.apply(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_modes() {
        let spec = json!({"a": "new", "b": "new", "c": "new"});
        let input = json!({"a": "old", "b": null});

        assert_eq!(
            Modify::overwrite(&spec).unwrap().apply(&input),
            json!({"a": "new", "b": "new", "c": "new"})
        );
        assert_eq!(
            Modify::default_values(&spec).unwrap().apply(&input),
            json!({"a": "old", "b": "new", "c": "new"})
        );
        assert_eq!(
            Modify::define(&spec).unwrap().apply(&input),
            json!({"a": "old", "b": null, "c": "new"})
        );
    }

    #[test]
    fn test_function_on_current_value() {
        let modify = Modify::overwrite(&json!({"name": "=toUpper", "tags": {"*": "=trim"}})).unwrap();
        let input = json!({"name": "ada", "tags": [" x ", "y "]});
        assert_eq!(modify.apply(&input), json!({"name": "ADA", "tags": ["x", "y"]}));
    }

    #[test]
    fn test_function_arguments() {
        let spec = json!({
            "label": "=concat(@(1,first), ' ', @(1,last))",
            "total": "=intSum(@(1,items))",
            "key": "=concat('k-', &0)",
            "nested": "=toUpper(=concat('a', 'b'))"
        });
        let input = json!({"first": "Ada", "last": "L", "items": [1, 2, 3]});
        let output = Modify::overwrite(&spec).unwrap().apply(&input);

        assert_eq!(output["label"], json!("Ada L"));
        assert_eq!(output["total"], json!(6));
        assert_eq!(output["key"], json!("k-key"));
        assert_eq!(output["nested"], json!("AB"));
    }

    #[test]
    fn test_lookup_and_fallback_candidates() {
        let spec = json!({"id": ["=toInteger", 0], "copy": "@(1,id)"});
        let output = Modify::overwrite(&spec).unwrap().apply(&json!({"id": "x"}));
        assert_eq!(output, json!({"id": 0, "copy": "x"}));
    }

    #[test]
    fn test_missing_arguments_skip_the_write() {
        let modify = Modify::overwrite(&json!({"a": "=toUpper(@(1,missing))", "b": "=toUpper"})).unwrap();
        assert_eq!(modify.apply(&json!({})), json!({}));
    }

    #[test]
    fn test_compile_errors() {
        let err = Modify::overwrite(&json!({"a": "=nope(@)"})).unwrap_err();
        assert!(matches!(err, SpecError::UnknownFunction { ref name, ref location } if name == "nope" && location == "a"));

        assert!(Modify::overwrite(&json!({"a": "=concat('x'"})).is_err());
        assert!(Modify::overwrite(&json!({"a": "=concat('x)"})).is_err());
        assert!(Modify::overwrite(&json!({"a": "=concat(x)"})).is_err());

        let config = EngineConfig::default().with_functions(false);
        let registry = Arc::new(FunctionRegistry::builtin());
        let err = Modify::with_registry(ModifyMode::Overwrite, &json!({"a": "=trim"}), registry, &config).unwrap_err();
        assert!(matches!(err, SpecError::InvalidValue { .. }));
    }

    #[test]
    fn test_split_arguments() {
        assert_eq!(
            split_arguments("'a,b', @(1,x), =f(1, 2)").unwrap(),
            vec!["'a,b'", "@(1,x)", "=f(1, 2)"]
        );
        assert_eq!(split_arguments("  ").unwrap(), Vec::<String>::new());
        assert!(split_arguments("a,,b").is_err());
    }
}
