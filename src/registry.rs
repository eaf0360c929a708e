use crate::errors::{ConfigError, ParseError};
use crate::field::{AssignError, Settable};
use crate::key::ArgumentKey;
use crate::model::{Cardinality, ValueMode};

/// One registered argument: its destination, value mode, cardinality,
/// mandatory flag, and parse-time occurrence count.
pub(crate) struct ArgumentDescriptor<'a> {
    name: String,
    settable: Box<dyn Settable + 'a>,
    value_mode: ValueMode,
    cardinality: Cardinality,
    mandatory: bool,
    observed: usize,
    help: Option<String>,
}

impl<'a> std::fmt::Debug for ArgumentDescriptor<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArgumentDescriptor")
            .field("name", &self.name)
            .field("value_mode", &self.value_mode)
            .field("cardinality", &self.cardinality)
            .field("mandatory", &self.mandatory)
            .field("observed", &self.observed)
            .finish()
    }
}

impl<'a> ArgumentDescriptor<'a> {
    pub(crate) fn new(
        name: impl Into<String>,
        settable: Box<dyn Settable + 'a>,
        value_mode: ValueMode,
        cardinality: Cardinality,
        mandatory: bool,
        help: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            settable,
            value_mode,
            cardinality,
            mandatory,
            observed: 0,
            help,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn value_mode(&self) -> ValueMode {
        self.value_mode
    }

    pub(crate) fn mandatory(&self) -> bool {
        self.mandatory
    }

    pub(crate) fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub(crate) fn takes_multiple(&self) -> bool {
        self.settable.takes_multiple()
    }

    pub(crate) fn expected_type(&self) -> &'static str {
        self.settable.describe_expected_type()
    }

    pub(crate) fn record_occurrence(&mut self) {
        self.observed += 1;
    }

    /// Matched without a value, possibly in inverted (`!`) form.
    pub(crate) fn apply_set(&mut self, inverted: bool) -> Result<(), ParseError> {
        let result = if inverted {
            self.settable.set_inverted()
        } else {
            self.settable.set()
        };
        result.map_err(|error| self.convert_error(error))
    }

    /// Matched with a textual value.
    pub(crate) fn apply_value(&mut self, token: &str) -> Result<(), ParseError> {
        self.settable
            .assign(token)
            .map_err(|error| self.convert_error(error))
    }

    fn convert_error(&self, error: AssignError) -> ParseError {
        match error {
            AssignError::Conversion { token, expected } => {
                ParseError::Conversion { token, expected }
            }
            AssignError::InversionUnsupported => ParseError::InvalidInversion(self.name.clone()),
        }
    }

    /// Post-parse validation of the mandatory flag and cardinality range.
    pub(crate) fn check_mandatory_cardinality(&self) -> Result<(), ParseError> {
        if self.mandatory && self.observed == 0 {
            return Err(ParseError::MissingMandatory(self.name.clone()));
        }

        // An argument that never appeared only violates cardinality when a
        // minimum was explicitly required via the mandatory flag.
        if self.observed > 0 || self.mandatory {
            if !self.cardinality.accepts(self.observed) {
                return Err(ParseError::Cardinality {
                    name: self.name.clone(),
                    observed: self.observed,
                    allowed: self.cardinality.to_string(),
                });
            }
        }

        Ok(())
    }

    pub(crate) fn reset(&mut self) {
        self.observed = 0;
    }
}

/// A per-handler container mapping [`ArgumentKey`] to a registered argument
/// descriptor. Keys are unique within one registry; long-name lookup is
/// abbreviation tolerant.
#[derive(Debug, Default)]
pub(crate) struct Registry<'a> {
    entries: Vec<(ArgumentKey, ArgumentDescriptor<'a>)>,
}

impl<'a> Registry<'a> {
    pub(crate) fn add(
        &mut self,
        key: ArgumentKey,
        descriptor: ArgumentDescriptor<'a>,
    ) -> Result<(), ConfigError> {
        if self.entries.iter().any(|(k, _)| k.collides(&key)) {
            return Err(ConfigError::DuplicateKey(key.to_string()));
        }

        self.entries.push((key, descriptor));
        Ok(())
    }

    pub(crate) fn get(&self, index: usize) -> &ArgumentDescriptor<'a> {
        &self.entries[index].1
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> &mut ArgumentDescriptor<'a> {
        &mut self.entries[index].1
    }

    pub(crate) fn key(&self, index: usize) -> &ArgumentKey {
        &self.entries[index].0
    }

    /// Short-character lookup is always exact.
    pub(crate) fn find_short(&self, short: char) -> Option<usize> {
        self.entries
            .iter()
            .position(|(key, _)| key.short() == Some(short))
    }

    pub(crate) fn has_short(&self, short: char) -> bool {
        self.find_short(short).is_some()
    }

    /// Long-name lookup: exact match first, then unambiguous prefix
    /// (abbreviation) matching.
    pub(crate) fn find_long(&self, name: &str) -> Result<Option<usize>, ParseError> {
        if let Some(index) = self
            .entries
            .iter()
            .position(|(key, _)| key.long() == Some(name))
        {
            return Ok(Some(index));
        }

        let candidates: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(index, (key, _))| match key.long() {
                Some(long) if long.starts_with(name) => Some(index),
                _ => None,
            })
            .collect();

        match candidates.as_slice() {
            [] => Ok(None),
            [index] => Ok(Some(*index)),
            _ => {
                let mut names: Vec<String> = candidates
                    .iter()
                    .map(|index| {
                        self.entries[*index]
                            .0
                            .long()
                            .expect("internal error - a prefix candidate must have a long form")
                            .to_string()
                    })
                    .collect();
                names.sort();
                Err(ParseError::AmbiguousArgument {
                    token: name.to_string(),
                    candidates: names,
                })
            }
        }
    }

    /// Check all keys of `other` against this registry, as used by the
    /// group-level cross-handler collision check.
    pub(crate) fn collides_with(&self, key: &ArgumentKey) -> bool {
        self.entries.iter().any(|(k, _)| k.collides(key))
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = &ArgumentKey> {
        self.entries.iter().map(|(key, _)| key)
    }

    pub(crate) fn descriptors(&self) -> impl Iterator<Item = (&ArgumentKey, &ArgumentDescriptor<'a>)> {
        self.entries.iter().map(|(key, descriptor)| (key, descriptor))
    }

    /// Post-parse sweep over every descriptor.
    pub(crate) fn check_mandatory_cardinality(&self) -> Result<(), ParseError> {
        for (_, descriptor) in &self.entries {
            descriptor.check_mandatory_cardinality()?;
        }

        Ok(())
    }

    pub(crate) fn reset(&mut self) {
        for (_, descriptor) in &mut self.entries {
            descriptor.reset();
        }
    }
}
