use crate::errors::{ConfigError, ParseError};
use crate::key::ArgumentKey;

/// A rule spanning multiple arguments, consulted incrementally after every
/// successful match and once more at end-of-parse.
pub trait Constraint {
    /// Report that the argument identified by `key` was matched.
    fn argument_identified(&mut self, key: &ArgumentKey);

    /// Report the textual value matched for `key`, if any.
    fn value_identified(&mut self, _key: &ArgumentKey, _value: &str) {
        // Most constraints only care about presence.
    }

    /// Immediate check, run after every successful match.
    fn execute(&self) -> Result<(), ParseError>;

    /// Deferred check, run once after the full stream is consumed.
    fn check_end_condition(&self) -> Result<(), ParseError>;

    /// Forget everything observed, for evaluation isolation.
    fn reset(&mut self);
}

fn parse_keys(specs: &[&str]) -> Result<Vec<ArgumentKey>, ConfigError> {
    specs.iter().map(|spec| ArgumentKey::from_spec(spec)).collect()
}

fn joined(keys: &[ArgumentKey]) -> String {
    keys.iter()
        .map(|key| key.to_string())
        .collect::<Vec<String>>()
        .join(", ")
}

/// If any one of the related arguments is supplied, all of them must be.
/// Violations surface at end-of-parse.
pub struct RequiredTogether {
    keys: Vec<ArgumentKey>,
    seen: Vec<bool>,
}

impl RequiredTogether {
    /// Create from argument key specification strings (ex: `["v,verbose", "o"]`).
    pub fn new(specs: &[&str]) -> Result<Self, ConfigError> {
        let keys = parse_keys(specs)?;
        let seen = vec![false; keys.len()];
        Ok(Self { keys, seen })
    }
}

impl Constraint for RequiredTogether {
    fn argument_identified(&mut self, key: &ArgumentKey) {
        for (index, own) in self.keys.iter().enumerate() {
            if own.collides(key) {
                self.seen[index] = true;
            }
        }
    }

    fn execute(&self) -> Result<(), ParseError> {
        // Cannot fire mid-parse; the missing partner may still show up.
        Ok(())
    }

    fn check_end_condition(&self) -> Result<(), ParseError> {
        if self.seen.iter().any(|seen| *seen) && !self.seen.iter().all(|seen| *seen) {
            return Err(ParseError::ConstraintViolation(format!(
                "the arguments {} are required together",
                joined(&self.keys)
            )));
        }

        Ok(())
    }

    fn reset(&mut self) {
        self.seen.fill(false);
    }
}

/// At most one of the related arguments may be supplied.
/// Violations fire immediately upon the second match.
pub struct MutuallyExclusive {
    keys: Vec<ArgumentKey>,
    seen: Vec<bool>,
}

impl MutuallyExclusive {
    /// Create from argument key specification strings.
    pub fn new(specs: &[&str]) -> Result<Self, ConfigError> {
        let keys = parse_keys(specs)?;
        let seen = vec![false; keys.len()];
        Ok(Self { keys, seen })
    }
}

impl Constraint for MutuallyExclusive {
    fn argument_identified(&mut self, key: &ArgumentKey) {
        for (index, own) in self.keys.iter().enumerate() {
            if own.collides(key) {
                self.seen[index] = true;
            }
        }
    }

    fn execute(&self) -> Result<(), ParseError> {
        if self.seen.iter().filter(|seen| **seen).count() > 1 {
            return Err(ParseError::ConstraintViolation(format!(
                "the arguments {} are mutually exclusive",
                joined(&self.keys)
            )));
        }

        Ok(())
    }

    fn check_end_condition(&self) -> Result<(), ParseError> {
        self.execute()
    }

    fn reset(&mut self) {
        self.seen.fill(false);
    }
}

/// A relation over the textual values of multiple arguments, evaluated at
/// end-of-parse once every observed value is known.
///
/// The predicate receives one `Option<&str>` per related argument, in
/// registration order (`None` when the argument never received a value).
pub struct ValueRelation {
    keys: Vec<ArgumentKey>,
    values: Vec<Option<String>>,
    predicate: Box<dyn Fn(&[Option<String>]) -> bool>,
    description: String,
}

impl ValueRelation {
    /// Create from argument key specification strings and a predicate.
    pub fn new(
        specs: &[&str],
        description: impl Into<String>,
        predicate: impl Fn(&[Option<String>]) -> bool + 'static,
    ) -> Result<Self, ConfigError> {
        let keys = parse_keys(specs)?;
        let values = vec![None; keys.len()];
        Ok(Self {
            keys,
            values,
            predicate: Box::new(predicate),
            description: description.into(),
        })
    }
}

impl Constraint for ValueRelation {
    fn argument_identified(&mut self, _key: &ArgumentKey) {
        // Only values matter here.
    }

    fn value_identified(&mut self, key: &ArgumentKey, value: &str) {
        for (index, own) in self.keys.iter().enumerate() {
            if own.collides(key) {
                self.values[index].replace(value.to_string());
            }
        }
    }

    fn execute(&self) -> Result<(), ParseError> {
        // Deferred until all values are in.
        Ok(())
    }

    fn check_end_condition(&self) -> Result<(), ParseError> {
        if !(self.predicate)(&self.values) {
            return Err(ParseError::ConstraintViolation(self.description.clone()));
        }

        Ok(())
    }

    fn reset(&mut self) {
        self.values.fill(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn key(spec: &str) -> ArgumentKey {
        ArgumentKey::from_spec(spec).unwrap()
    }

    #[test]
    fn required_together_all_absent() {
        let constraint = RequiredTogether::new(&["a", "b"]).unwrap();
        constraint.check_end_condition().unwrap();
    }

    #[test]
    fn required_together_all_present() {
        let mut constraint = RequiredTogether::new(&["a", "b"]).unwrap();
        constraint.argument_identified(&key("a"));
        constraint.argument_identified(&key("b"));
        constraint.execute().unwrap();
        constraint.check_end_condition().unwrap();
    }

    #[test]
    fn required_together_partial() {
        let mut constraint = RequiredTogether::new(&["a", "b"]).unwrap();
        constraint.argument_identified(&key("a"));
        // Mid-parse, the partner may still show up.
        constraint.execute().unwrap();
        assert_matches!(
            constraint.check_end_condition(),
            Err(ParseError::ConstraintViolation(_))
        );
    }

    #[test]
    fn mutually_exclusive_fires_immediately() {
        let mut constraint = MutuallyExclusive::new(&["a", "b"]).unwrap();
        constraint.argument_identified(&key("a"));
        constraint.execute().unwrap();
        constraint.argument_identified(&key("b"));
        assert_matches!(
            constraint.execute(),
            Err(ParseError::ConstraintViolation(_))
        );
    }

    #[test]
    fn mutually_exclusive_single() {
        let mut constraint = MutuallyExclusive::new(&["a", "b"]).unwrap();
        constraint.argument_identified(&key("b"));
        constraint.execute().unwrap();
        constraint.check_end_condition().unwrap();
    }

    #[test]
    fn matches_either_key_form() {
        let mut constraint = MutuallyExclusive::new(&["v,verbose", "q,quiet"]).unwrap();
        // Identified by long form only; the constraint key carries both forms.
        constraint.argument_identified(&key("verbose"));
        constraint.argument_identified(&key("q"));
        assert_matches!(
            constraint.execute(),
            Err(ParseError::ConstraintViolation(_))
        );
    }

    #[test]
    fn value_relation() {
        let mut constraint = ValueRelation::new(
            &["min", "max"],
            "'min' must not exceed 'max'",
            |values| match (&values[0], &values[1]) {
                (Some(min), Some(max)) => min.parse::<u32>().unwrap_or(0) <= max.parse::<u32>().unwrap_or(0),
                _ => true,
            },
        )
        .unwrap();

        constraint.value_identified(&key("min"), "2");
        constraint.value_identified(&key("max"), "10");
        constraint.check_end_condition().unwrap();

        constraint.value_identified(&key("max"), "1");
        assert_eq!(
            constraint.check_end_condition().unwrap_err(),
            ParseError::ConstraintViolation("'min' must not exceed 'max'".to_string())
        );
    }
}
