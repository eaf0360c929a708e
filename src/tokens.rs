use crate::constant::*;

/// A control character standing alone on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ControlToken {
    BracketOpen,
    BracketClose,
    Invert,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ElementKind {
    /// A free-standing value string.
    Value(String),
    /// A single character flag, possibly one of several packed into one token.
    Short(char),
    /// A long-name flag.
    Long(String),
    /// One of `(`, `)`, `!`.
    Control(ControlToken),
}

/// One normalized element of the argument stream.
/// Carries the raw source token for error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Element {
    pub kind: ElementKind,
    pub raw: String,
}

impl Element {
    fn new(kind: ElementKind, raw: impl Into<String>) -> Self {
        Self {
            kind,
            raw: raw.into(),
        }
    }
}

/// State of a partially unpacked short-flag token (ex: `-vts`).
#[derive(Debug)]
struct Packed {
    raw: String,
    // Byte offset of the next unread character within `raw`.
    offset: usize,
}

impl Packed {
    fn suffix(&self) -> &str {
        &self.raw[self.offset..]
    }
}

/// Forward-only iterator over the raw argument list, producing [`Element`]s.
///
/// There is no backtracking across tokens.  Within a single packed short-flag
/// token, the resolver may call [`TokenStream::remainder_as_value`], which the
/// stream honours on its next advance.
#[derive(Debug)]
pub(crate) struct TokenStream {
    args: Vec<String>,
    // Index of the next unread raw token.
    index: usize,
    // Index of the raw token backing the most recently produced element.
    current: usize,
    packed: Option<Packed>,
    // A value split off a `--long=value` token, produced on the next advance.
    pending_value: Option<(String, String)>,
    positional_escape: bool,
    remainder_as_value: bool,
}

impl TokenStream {
    pub(crate) fn new(args: Vec<String>) -> Self {
        Self {
            args,
            index: 0,
            current: 0,
            packed: None,
            pending_value: None,
            positional_escape: false,
            remainder_as_value: false,
        }
    }

    /// Produce the next element, or `None` when the stream is exhausted.
    pub(crate) fn next_element(&mut self) -> Option<Element> {
        if let Some((value, raw)) = self.pending_value.take() {
            return Some(Element::new(ElementKind::Value(value), raw));
        }

        if self.remainder_as_value {
            self.remainder_as_value = false;

            if let Some(packed) = self.packed.take() {
                let suffix = packed.suffix();
                // A leading '=' is the attached-value delimiter; strip it.
                let value = suffix.strip_prefix(EQUALS).unwrap_or(suffix).to_string();
                return Some(Element::new(ElementKind::Value(value), packed.raw.clone()));
            }
        }

        let mut packed_exhausted = false;

        if let Some(packed) = self.packed.as_mut() {
            if let Some(single) = packed.suffix().chars().next() {
                packed.offset += single.len_utf8();
                let raw = packed.raw.clone();
                return Some(Element::new(ElementKind::Short(single), raw));
            }

            packed_exhausted = true;
        }

        if packed_exhausted {
            self.packed = None;
        }

        loop {
            if self.index >= self.args.len() {
                return None;
            }

            self.current = self.index;
            let token = self.args[self.index].clone();
            self.index += 1;

            if self.positional_escape {
                return Some(Element::new(ElementKind::Value(token.clone()), token));
            }

            if token == POSITIONAL_ESCAPE {
                // The rest of the stream is positional, even tokens starting with '-'.
                self.positional_escape = true;
                continue;
            }

            if let Some(name) = token.strip_prefix(LONG_PREFIX) {
                // A bare '--' was handled above; anything else with the prefix is a long flag.
                match name.split_once(EQUALS) {
                    Some((name, value)) => {
                        self.pending_value
                            .replace((value.to_string(), token.clone()));
                        return Some(Element::new(ElementKind::Long(name.to_string()), token));
                    }
                    None => {
                        return Some(Element::new(ElementKind::Long(name.to_string()), token));
                    }
                }
            }

            if token.len() > 1 && token.starts_with(SHORT_PREFIX) {
                self.packed.replace(Packed {
                    raw: token,
                    offset: SHORT_PREFIX.len(),
                });
                return self.next_element();
            }

            if token.len() == 1 {
                let control = match token
                    .chars()
                    .next()
                    .expect("internal error - a length one token must have a character")
                {
                    BRACKET_OPEN => Some(ControlToken::BracketOpen),
                    BRACKET_CLOSE => Some(ControlToken::BracketClose),
                    INVERT => Some(ControlToken::Invert),
                    _ => None,
                };

                if let Some(control) = control {
                    return Some(Element::new(ElementKind::Control(control), token));
                }
            }

            return Some(Element::new(ElementKind::Value(token.clone()), token));
        }
    }

    /// The unread suffix of the current packed short-flag token, if any.
    pub(crate) fn packed_suffix(&self) -> Option<&str> {
        match &self.packed {
            Some(packed) if !packed.suffix().is_empty() => Some(packed.suffix()),
            _ => None,
        }
    }

    /// Request that the unread suffix of the current packed short-flag token
    /// be produced as a single value element on the next advance.
    pub(crate) fn remainder_as_value(&mut self) {
        if self.packed_suffix().is_some() {
            self.remainder_as_value = true;
        }
    }

    /// Reconstruct the remaining raw command line from the current position,
    /// optionally including the token backing the current element.
    ///
    /// Excluding the current element, a value already split off it (the
    /// `--long=value` form, or a packed short-flag suffix) still belongs to
    /// the remainder.
    pub(crate) fn args_as_string(&self, include_current: bool) -> String {
        let mut parts: Vec<&str> = Vec::default();
        let from = if include_current {
            self.current
        } else {
            if let Some((value, _)) = &self.pending_value {
                parts.push(value.as_str());
            }

            if let Some(suffix) = self.packed_suffix() {
                parts.push(suffix.strip_prefix(EQUALS).unwrap_or(suffix));
            }

            self.index
        };

        parts.extend(self.args[from..].iter().map(String::as_str));
        parts.join(" ")
    }

    /// Discard all remaining elements.
    pub(crate) fn drain(&mut self) {
        self.index = self.args.len();
        self.packed = None;
        self.pending_value = None;
        self.remainder_as_value = false;
    }
}
