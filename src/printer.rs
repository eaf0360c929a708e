use terminal_size::{terminal_size, Width};

use crate::constant::*;
use crate::interface::UserInterface;
use crate::model::ValueMode;
use crate::registry::ArgumentDescriptor;
use crate::key::ArgumentKey;

// Wide enough for roughly three average words per help line.
const MINIMUM_HELP_WIDTH: usize = 17;
const PADDING_WIDTH: usize = 3;
const INDENT: usize = 2;

/// One line of the usage listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UsageEntry {
    display: String,
    mandatory: bool,
    help: Option<String>,
}

impl UsageEntry {
    pub(crate) fn keyed(key: &ArgumentKey, descriptor: &ArgumentDescriptor) -> Self {
        let meta = match descriptor.value_mode() {
            ValueMode::None => String::default(),
            ValueMode::Required => format!(" <{}>", short_type(descriptor.expected_type())),
            ValueMode::Optional => format!(" [<{}>]", short_type(descriptor.expected_type())),
            ValueMode::Command => " ...".to_string(),
        };

        Self {
            display: format!("{key}{meta}"),
            mandatory: descriptor.mandatory(),
            help: descriptor.help().map(|help| help.to_string()),
        }
    }

    pub(crate) fn free(descriptor: &ArgumentDescriptor) -> Self {
        Self {
            display: descriptor.name().to_uppercase(),
            mandatory: descriptor.mandatory(),
            help: descriptor.help().map(|help| help.to_string()),
        }
    }

    #[cfg(test)]
    pub(crate) fn basic(display: &str, mandatory: bool, help: Option<&str>) -> Self {
        Self {
            display: display.to_string(),
            mandatory,
            help: help.map(|help| help.to_string()),
        }
    }
}

fn short_type(full: &str) -> &str {
    full.rsplit("::").next().unwrap_or(full)
}

/// Renders the usage listing for a set of handlers, one section per symbolic
/// name, mandatory entries first within each section.
pub(crate) struct Printer {
    program: String,
    sections: Vec<(String, Vec<UsageEntry>)>,
    terminal_width: Option<usize>,
}

impl Printer {
    pub(crate) fn terminal(
        program: impl Into<String>,
        sections: Vec<(String, Vec<UsageEntry>)>,
    ) -> Self {
        let terminal_width =
            terminal_size().map(|(Width(terminal_width), _)| terminal_width as usize);

        Self::new(program, sections, terminal_width)
    }

    pub(crate) fn new(
        program: impl Into<String>,
        sections: Vec<(String, Vec<UsageEntry>)>,
        terminal_width: Option<usize>,
    ) -> Self {
        let sections = sections
            .into_iter()
            .map(|(name, mut entries)| {
                // Stable, so mandatory entries keep their relative order.
                entries.sort_by_key(|entry| !entry.mandatory);
                (name, entries)
            })
            .collect();

        Self {
            program: program.into(),
            sections,
            terminal_width,
        }
    }

    pub(crate) fn print_usage(&self, interface: &(impl UserInterface + ?Sized)) {
        let help_display = format!("-{HELP_SHORT}, --{HELP_NAME}");
        let mut summary = vec![format!("[-{HELP_SHORT}]")];

        for (_, entries) in &self.sections {
            for entry in entries {
                if entry.mandatory {
                    summary.push(entry.display.clone());
                } else {
                    summary.push(format!("[{}]", entry.display));
                }
            }
        }

        interface.print(format!("usage: {} {}", self.program, summary.join(" ")));

        let left_width = self
            .sections
            .iter()
            .flat_map(|(_, entries)| entries.iter().map(|entry| entry.display.len()))
            .chain(std::iter::once(help_display.len()))
            .max()
            .unwrap_or(help_display.len());
        let help_width = match self.terminal_width {
            Some(total) if total > INDENT + left_width + PADDING_WIDTH + MINIMUM_HELP_WIDTH => {
                total - INDENT - left_width - PADDING_WIDTH
            }
            Some(_) => MINIMUM_HELP_WIDTH,
            None => usize::MAX,
        };

        interface.print(String::default());
        self.render_entry(interface, &help_display, Some(HELP_MESSAGE), left_width, help_width);

        for (name, entries) in &self.sections {
            if !name.is_empty() {
                interface.print(String::default());
                interface.print(format!("{name}:"));
            }

            for entry in entries {
                self.render_entry(
                    interface,
                    &entry.display,
                    entry.help.as_deref(),
                    left_width,
                    help_width,
                );
            }
        }
    }

    fn render_entry(
        &self,
        interface: &(impl UserInterface + ?Sized),
        display: &str,
        help: Option<&str>,
        left_width: usize,
        help_width: usize,
    ) {
        let help = help.unwrap_or("");

        if help.is_empty() {
            interface.print(format!("{:INDENT$}{display}", ""));
            return;
        }

        for (i, part) in chunk(help, help_width).into_iter().enumerate() {
            if i == 0 {
                interface.print(format!("{:INDENT$}{display:left_width$}{:PADDING_WIDTH$}{part}", "", ""));
            } else {
                interface.print(format!("{:INDENT$}{:left_width$}{:PADDING_WIDTH$}{part}", "", "", ""));
            }
        }
    }
}

/// Greedy word wrap; words longer than the width are hyphenated.
fn chunk(paragraph: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::default();
    let mut current = String::default();

    for word in paragraph.split(' ') {
        if word.is_empty() {
            continue;
        }

        if !current.is_empty() {
            if current.len() + word.len() + 1 <= width {
                current.push(' ');
                current.push_str(word);
                continue;
            }

            lines.push(std::mem::take(&mut current));
        }

        hyphenate(width, &mut lines, &mut current, word);
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

fn hyphenate(width: usize, lines: &mut Vec<String>, current: &mut String, word: &str) {
    let increment = width.saturating_sub(1).max(1);
    let mut left = 0;

    while left + increment + 1 < word.len() {
        lines.push(format!("{}-", &word[left..left + increment]));
        left += increment;
    }

    current.push_str(&word[left..]);
}
