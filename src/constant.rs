pub(crate) const HELP_NAME: &str = "help";
pub(crate) const HELP_SHORT: char = 'h';
pub(crate) const HELP_MESSAGE: &str = "Show this help message and exit.";

pub(crate) const LONG_PREFIX: &str = "--";
pub(crate) const SHORT_PREFIX: &str = "-";
pub(crate) const POSITIONAL_ESCAPE: &str = "--";
pub(crate) const EQUALS: char = '=';

pub(crate) const BRACKET_OPEN: char = '(';
pub(crate) const BRACKET_CLOSE: char = ')';
pub(crate) const INVERT: char = '!';

/// Directory (under `$HOME`) holding per-program arguments files.
pub(crate) const ARGS_FILE_DIR: &str = ".progargs";
/// Extension of per-program arguments files.
pub(crate) const ARGS_FILE_SUFFIX: &str = "pa";
