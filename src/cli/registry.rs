//! Shell command table: lookup, typo suggestions and argument completion.

use strsim::levenshtein;

use crate::cli::core::CommandResult;
use crate::cli::shell_context::ShellContext;

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

/// Largest edit distance still offered as a "did you mean" suggestion.
const MAX_SUGGESTION_DISTANCE: usize = 3;

#[derive(Clone, Copy)]
pub struct CommandEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub handler: CommandHandler,
    /// Fixed values the completer offers for one argument position.
    pub argument_values: Option<(usize, &'static [&'static str])>,
}

impl CommandEntry {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            handler,
            argument_values: None,
        }
    }

    pub const fn completing(mut self, position: usize, values: &'static [&'static str]) -> Self {
        self.argument_values = Some((position, values));
        self
    }
}

/// Commands in registration order, which is also the order `help` lists them in.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    entries: Vec<CommandEntry>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `entry`; a later entry with the same name replaces the earlier one in place.
    pub fn register(&mut self, entry: CommandEntry) {
        match self.entries.iter_mut().find(|existing| existing.name == entry.name) {
            Some(slot) => *slot = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn get(&self, name: &str) -> Option<&CommandEntry> {
        self.entries
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
    }

    pub fn list(&self) -> &[CommandEntry] {
        &self.entries
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.name)
    }

    /// The registered name nearest to `input`, if it is close enough to be a typo.
    pub fn closest(&self, input: &str) -> Option<&'static str> {
        let needle = input.to_lowercase();
        self.names()
            .map(|name| (levenshtein(name, &needle), name))
            .filter(|(distance, _)| *distance <= MAX_SUGGESTION_DISTANCE)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, name)| name)
    }

    /// Completion candidates for `prefix`. `words` holds the complete words typed
    /// before it, so an empty slice means the command name itself is being typed.
    pub fn completions(&self, words: &[&str], prefix: &str) -> Vec<&'static str> {
        let needle = prefix.to_ascii_lowercase();
        let candidates: Vec<&'static str> = match words.split_first() {
            None => self.names().collect(),
            Some((command, args)) => self
                .get(command)
                .and_then(|entry| entry.argument_values)
                .filter(|(position, _)| *position == args.len())
                .map(|(_, values)| values.to_vec())
                .unwrap_or_default(),
        };
        candidates
            .into_iter()
            .filter(|candidate| candidate.starts_with(&needle))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
        Ok(())
    }

    fn registry() -> CommandRegistry {
        let mut registry = CommandRegistry::new();
        registry.register(CommandEntry::new("reconcile", "first", "reconcile <YYYY-MM>", noop));
        registry.register(CommandEntry::new("list", "", "list [all]", noop).completing(0, &["all"]));
        registry.register(
            CommandEntry::new("add-bill", "", "add-bill", noop)
                .completing(3, &["monthly", "one-time", "quarterly"]),
        );
        registry
    }

    #[test]
    fn reregistering_replaces_in_place() {
        let mut registry = registry();
        registry.register(CommandEntry::new("reconcile", "second", "reconcile", noop));
        assert_eq!(registry.list().len(), 3);
        assert_eq!(registry.list()[0].description, "second");
        assert!(registry.get("RECONCILE").is_some());
    }

    #[test]
    fn typos_suggest_the_nearest_command() {
        let registry = registry();
        assert_eq!(registry.closest("reconcil"), Some("reconcile"));
        assert_eq!(registry.closest("lsit"), Some("list"));
        assert_eq!(registry.closest("transfer"), None);
    }

    #[test]
    fn completion_follows_argument_position() {
        let registry = registry();
        assert_eq!(registry.completions(&[], "re"), vec!["reconcile"]);
        assert_eq!(registry.completions(&["list"], ""), vec!["all"]);
        assert!(registry.completions(&["list", "all"], "").is_empty());
        assert_eq!(
            registry.completions(&["add-bill", "Water", "30", "2024-01-22"], "q"),
            vec!["quarterly"]
        );
        assert!(registry.completions(&["add-bill", "Water"], "q").is_empty());
    }
}
