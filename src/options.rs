//! Validated, insertion-ordered option storage for a generation session.

use crate::schema::{self, OptionScope};
use crate::error::PdfResult;

/// A value attached to an option name.
///
/// `Enable` and `Disable` are the boolean sentinels: an enabled flag emits
/// `--name` with no value token, a disabled one is skipped entirely when the
/// command is built. Repeatable options must be set as [`OptionValue::Many`];
/// repeated `set` calls overwrite by key instead of accumulating.
///
/// Every occurrence carries at most one value token, including for options
/// whose schema arity is 2 (`cookie`, `custom-header`, `post`, `post-file`,
/// `replace`): pass both tokens pre-joined in one value. There is no
/// pair-shaped variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionValue {
    /// Emit the bare `--name` flag.
    Enable,
    /// Suppress the option entirely.
    Disable,
    /// A single value token.
    Single(String),
    /// One value per occurrence of a repeatable option.
    Many(Vec<String>),
}

impl OptionValue {
    /// View the value as a sequence of occurrences, the shape the command
    /// builder iterates over. A scalar is a single-element sequence.
    pub(crate) fn occurrences(&self) -> Vec<Occurrence<'_>> {
        match self {
            OptionValue::Enable => vec![Occurrence::Bare],
            OptionValue::Disable => Vec::new(),
            OptionValue::Single(v) => vec![Occurrence::Valued(v)],
            OptionValue::Many(vs) => vs.iter().map(|v| Occurrence::Valued(v)).collect(),
        }
    }
}

/// One command-line occurrence of an option.
pub(crate) enum Occurrence<'a> {
    /// `--name` alone.
    Bare,
    /// `--name <value>`.
    Valued(&'a str),
}

impl From<bool> for OptionValue {
    fn from(enabled: bool) -> Self {
        if enabled {
            OptionValue::Enable
        } else {
            OptionValue::Disable
        }
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Single(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Single(value)
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(values: Vec<String>) -> Self {
        OptionValue::Many(values)
    }
}

impl From<Vec<&str>> for OptionValue {
    fn from(values: Vec<&str>) -> Self {
        OptionValue::Many(values.into_iter().map(str::to_string).collect())
    }
}

/// An insertion-ordered `name -> value` store validated against one scope's
/// schema.
///
/// Overwriting an existing name keeps its original position, so the emitted
/// argument order is stable across re-sets (last value wins at the data
/// level, per the renderer's own semantics).
#[derive(Clone, Debug, Default)]
pub struct OptionSet {
    entries: Vec<(String, OptionValue)>,
}

impl OptionSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `name` against `scope` and store the value.
    pub fn set(
        &mut self,
        name: &str,
        value: impl Into<OptionValue>,
        scope: OptionScope,
    ) -> PdfResult<()> {
        schema::validate(name, scope)?;
        self.set_unchecked(name, value);
        Ok(())
    }

    /// Store without schema validation. Used for the pre-seeded defaults,
    /// which come straight from the catalog.
    pub(crate) fn set_unchecked(&mut self, name: &str, value: impl Into<OptionValue>) {
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing == name)
        {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    /// The stored value for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Number of distinct option names set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no options are set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
