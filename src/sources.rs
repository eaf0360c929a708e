use std::path::PathBuf;

use crate::constant::{ARGS_FILE_DIR, ARGS_FILE_SUFFIX};

/// The environment variable consulted for a program: the program name
/// uppercased, with `-` mapped to `_`.
pub(crate) fn environment_name(program: &str) -> String {
    program
        .chars()
        .map(|c| match c {
            '-' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

/// Pre-formatted arguments from the environment, if the variable is set.
pub(crate) fn environment_arguments(name: &str) -> Option<Vec<String>> {
    std::env::var(name).ok().map(|value| split_line(&value))
}

fn arguments_file_path(program: &str) -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| {
        PathBuf::from(home)
            .join(ARGS_FILE_DIR)
            .join(format!("{program}.{ARGS_FILE_SUFFIX}"))
    })
}

/// Argument sets from `$HOME/.progargs/<program>.pa`, one per line.
/// A missing or unreadable file contributes nothing.
pub(crate) fn arguments_file(program: &str) -> Vec<Vec<String>> {
    match arguments_file_path(program).and_then(|path| std::fs::read_to_string(path).ok()) {
        Some(content) => parse_arguments_file(&content),
        None => Vec::default(),
    }
}

/// Each non-blank, non-`#` line is one logical argument set.
pub(crate) fn parse_arguments_file(content: &str) -> Vec<Vec<String>> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(split_line)
        .collect()
}

/// Split a pre-formatted argument string the way a shell would: on
/// whitespace, with single or double quotes grouping embedded spaces.
pub(crate) fn split_line(line: &str) -> Vec<String> {
    let mut arguments = Vec::default();
    let mut current = String::default();
    // Whether `current` holds a started argument (possibly empty, ex: `""`).
    let mut started = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => {
                quote = None;
            }
            Some(_) => {
                current.push(c);
            }
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                started = true;
            }
            None if c.is_whitespace() => {
                if started {
                    arguments.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            None => {
                current.push(c);
                started = true;
            }
        }
    }

    if started {
        arguments.push(current);
    }

    arguments
}
