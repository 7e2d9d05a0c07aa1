//! Flag declarations and the flat flag-state store
//!
//! Declarations ([`FlagSpec`]) live on the command nodes that own them. The
//! mutable part of every flag (current value and `changed` marker) lives in a
//! single [`FlagStore`] keyed by `(owner node, flag name)`, so visiting every
//! flag owned by a node is a range query and the whole state can be
//! snapshotted and restored without touching the tree.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::NodeId;
use crate::error::ParseError;

/// Value-completion callback for a flag.
///
/// Receives the tokens of the current line and the flag name, and returns
/// candidates. A candidate may carry a description after a tab character:
/// `"Mary\tJohn's mother"`.
pub type CompletionFn = Arc<dyn Fn(&[String], &str) -> Vec<String> + Send + Sync>;

/// Type of the value a flag accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagType {
    /// Toggled by presence, never given a value suggestion.
    Bool,
    String,
    Int,
    Uint,
    Float,
    /// Duration text such as `500ms`, `2s` or `1m30s`.
    Duration,
}

impl FlagType {
    /// Name used in usage text and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            FlagType::Bool => "bool",
            FlagType::String => "string",
            FlagType::Int => "int",
            FlagType::Uint => "uint",
            FlagType::Float => "float",
            FlagType::Duration => "duration",
        }
    }

    /// Check whether `raw` is a valid value of this type.
    pub fn accepts(&self, raw: &str) -> bool {
        match self {
            FlagType::Bool => parse_bool(raw).is_some(),
            FlagType::String => true,
            FlagType::Int => raw.parse::<i64>().is_ok(),
            FlagType::Uint => raw.parse::<u64>().is_ok(),
            FlagType::Float => raw.parse::<f64>().is_ok(),
            FlagType::Duration => parse_duration(raw).is_some(),
        }
    }

    /// Normalize a value before storing it.
    ///
    /// Booleans are stored as `true`/`false` so comparisons with the default
    /// are textual.
    fn normalize(&self, raw: &str) -> String {
        match self {
            FlagType::Bool => parse_bool(raw).unwrap_or(false).to_string(),
            _ => raw.to_string(),
        }
    }
}

impl fmt::Display for FlagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declaration of a single flag.
#[derive(Debug, Clone)]
pub struct FlagSpec {
    name: String,
    shorthand: Option<char>,
    usage: String,
    value_type: FlagType,
    default: String,
    hidden: bool,
    persistent: bool,
}

impl FlagSpec {
    fn new(name: impl Into<String>, value_type: FlagType, default: String) -> Self {
        Self {
            name: name.into(),
            shorthand: None,
            usage: String::new(),
            value_type,
            default,
            hidden: false,
            persistent: false,
        }
    }

    /// Boolean flag.
    pub fn bool(name: impl Into<String>, default: bool) -> Self {
        Self::new(name, FlagType::Bool, default.to_string())
    }

    /// String flag.
    pub fn string(name: impl Into<String>, default: impl Into<String>) -> Self {
        Self::new(name, FlagType::String, default.into())
    }

    /// Signed integer flag.
    pub fn int(name: impl Into<String>, default: i64) -> Self {
        Self::new(name, FlagType::Int, default.to_string())
    }

    /// Unsigned integer flag.
    pub fn uint(name: impl Into<String>, default: u64) -> Self {
        Self::new(name, FlagType::Uint, default.to_string())
    }

    /// Floating point flag.
    pub fn float(name: impl Into<String>, default: f64) -> Self {
        Self::new(name, FlagType::Float, default.to_string())
    }

    /// Duration flag; `default` uses the same syntax as values (`500ms`).
    pub fn duration(name: impl Into<String>, default: impl Into<String>) -> Self {
        Self::new(name, FlagType::Duration, default.into())
    }

    pub fn shorthand(mut self, shorthand: char) -> Self {
        self.shorthand = Some(shorthand);
        self
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Make the flag visible on every descendant of the declaring command.
    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shorthand_char(&self) -> Option<char> {
        self.shorthand
    }

    pub fn usage_text(&self) -> &str {
        &self.usage
    }

    pub fn value_type(&self) -> FlagType {
        self.value_type
    }

    pub fn default_value(&self) -> &str {
        &self.default
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn is_bool(&self) -> bool {
        self.value_type == FlagType::Bool
    }
}

/// Stable identity of a flag: the command that declares it plus its name.
///
/// Inherited flags keep the key of their declaring ancestor, so a value set
/// at any depth is seen by every command that inherits the flag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlagKey {
    pub node: NodeId,
    pub name: String,
}

impl FlagKey {
    pub fn new(node: NodeId, name: impl Into<String>) -> Self {
        Self {
            node,
            name: name.into(),
        }
    }
}

/// Mutable state of one flag.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagState {
    value_type: FlagType,
    default: String,
    value: String,
    changed: bool,
}

impl FlagState {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn default_value(&self) -> &str {
        &self.default
    }

    pub fn value_type(&self) -> FlagType {
        self.value_type
    }

    /// Whether the value was set explicitly since the last reset.
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn is_default(&self) -> bool {
        self.value == self.default
    }
}

/// Point-in-time copy of a [`FlagStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct FlagSnapshot(BTreeMap<FlagKey, FlagState>);

/// Flat store of flag values for a whole command tree.
#[derive(Debug, Clone, Default)]
pub struct FlagStore {
    entries: BTreeMap<FlagKey, FlagState>,
}

impl FlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, key: FlagKey, spec: &FlagSpec) {
        let default = spec.value_type.normalize(&spec.default);
        self.entries.insert(
            key,
            FlagState {
                value_type: spec.value_type,
                value: default.clone(),
                default,
                changed: false,
            },
        );
    }

    pub fn get(&self, key: &FlagKey) -> Option<&FlagState> {
        self.entries.get(key)
    }

    /// Set a flag from its textual value and mark it changed.
    pub fn set(&mut self, key: &FlagKey, raw: &str) -> Result<(), ParseError> {
        let Some(state) = self.entries.get_mut(key) else {
            return Err(ParseError::UnknownFlag(key.name.clone()));
        };
        if !state.value_type.accepts(raw) {
            return Err(ParseError::InvalidFlagValue {
                flag: key.name.clone(),
                value: raw.to_string(),
                expected: state.value_type.name(),
            });
        }
        state.value = state.value_type.normalize(raw);
        state.changed = true;
        Ok(())
    }

    /// Restore a flag to its default.
    ///
    /// Returns `true` when the value or the changed marker was modified.
    pub fn reset(&mut self, key: &FlagKey) -> bool {
        match self.entries.get_mut(key) {
            Some(state) if !state.is_default() || state.changed => {
                state.value = state.default.clone();
                state.changed = false;
                true
            }
            _ => false,
        }
    }

    /// Flags declared by `node`, ordered by name.
    pub fn owned_by(&self, node: NodeId) -> impl Iterator<Item = (&FlagKey, &FlagState)> + '_ {
        self.entries
            .range(FlagKey::new(node, String::new())..)
            .take_while(move |(key, _)| key.node == node)
    }

    pub fn snapshot(&self) -> FlagSnapshot {
        FlagSnapshot(self.entries.clone())
    }

    pub fn restore(&mut self, snapshot: FlagSnapshot) {
        self.entries = snapshot.0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse a boolean the way command-line flag parsers usually accept them.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Parse a duration such as `250ms`, `2s`, `5m`, `1h` or `1m30s`.
///
/// A bare `0` is accepted; any other value needs a unit on every component.
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if raw == "0" {
        return Some(Duration::ZERO);
    }
    if raw.is_empty() {
        return None;
    }

    let mut total = Duration::ZERO;
    let mut rest = raw;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits == 0 {
            return None;
        }
        let amount: u64 = rest[..digits].parse().ok()?;
        rest = &rest[digits..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let part = match &rest[..unit_len] {
            "ms" => Duration::from_millis(amount),
            "s" => Duration::from_secs(amount),
            "m" => Duration::from_secs(amount.checked_mul(60)?),
            "h" => Duration::from_secs(amount.checked_mul(3600)?),
            _ => return None,
        };
        total = total.checked_add(part)?;
        rest = &rest[unit_len..];
    }
    Some(total)
}
