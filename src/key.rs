use crate::constant::EQUALS;
use crate::errors::ConfigError;

/// Identifies one registered argument by a short character and/or a long name.
///
/// Built from a specification string: `"x"`, `"long"`, or `"x,long"`.
/// A single character part becomes the short form; anything longer becomes the
/// long form. At least one form is always present.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArgumentKey {
    short: Option<char>,
    long: Option<String>,
}

impl ArgumentKey {
    /// Parse an argument key from its specification string.
    ///
    /// ### Example
    /// ```
    /// use clarg::ArgumentKey;
    ///
    /// let key = ArgumentKey::from_spec("v,verbose").unwrap();
    /// assert_eq!(key.short(), Some('v'));
    /// assert_eq!(key.long(), Some("verbose"));
    /// ```
    pub fn from_spec(spec: &str) -> Result<Self, ConfigError> {
        if spec.is_empty() {
            return Err(ConfigError::EmptyKeySpec);
        }

        let parts: Vec<&str> = spec.split(',').collect();

        if parts.len() > 2 {
            return Err(ConfigError::MalformedKeySpec(spec.to_string()));
        }

        let mut short: Option<char> = None;
        let mut long: Option<String> = None;

        for part in parts {
            if part.is_empty() {
                return Err(ConfigError::MalformedKeySpec(spec.to_string()));
            }

            if part.starts_with('-') || part.contains(EQUALS) || part.contains(char::is_whitespace)
            {
                return Err(ConfigError::InvalidKeyCharacter {
                    spec: spec.to_string(),
                    part: part.to_string(),
                });
            }

            let mut chars = part.chars();
            let first = chars
                .next()
                .expect("internal error - a non-empty part must have a first character");

            if chars.next().is_none() {
                // Single character part.
                if short.replace(first).is_some() {
                    return Err(ConfigError::InvalidShortForm(spec.to_string()));
                }
            } else if long.replace(part.to_string()).is_some() {
                return Err(ConfigError::MalformedKeySpec(spec.to_string()));
            }
        }

        Ok(Self { short, long })
    }

    pub(crate) fn from_forms(short: Option<char>, long: Option<String>) -> Self {
        assert!(
            short.is_some() || long.is_some(),
            "internal error - an argument key must have at least one form"
        );
        Self { short, long }
    }

    /// The short (single character) form, if any.
    pub fn short(&self) -> Option<char> {
        self.short
    }

    /// The long (name) form, if any.
    pub fn long(&self) -> Option<&str> {
        self.long.as_deref()
    }

    /// Whether this key collides with `other`: their short forms match (when
    /// both have one), or their long forms match (when both have one).
    ///
    /// A key with only a short form never collides with a key with only a
    /// long form.
    pub(crate) fn collides(&self, other: &ArgumentKey) -> bool {
        if let (Some(a), Some(b)) = (self.short, other.short) {
            if a == b {
                return true;
            }
        }

        if let (Some(a), Some(b)) = (&self.long, &other.long) {
            if a == b {
                return true;
            }
        }

        false
    }
}

impl std::fmt::Display for ArgumentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.short, &self.long) {
            (Some(short), Some(long)) => write!(f, "-{short}, --{long}"),
            (Some(short), None) => write!(f, "-{short}"),
            (None, Some(long)) => write!(f, "--{long}"),
            (None, None) => unreachable!("internal error - a key must have at least one form"),
        }
    }
}
