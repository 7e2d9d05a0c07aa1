//! Suggestion sources
//!
//! This module provides the host-facing [`DynamicSuggestions`] trait and the
//! [`SuggestionAggregator`], which reads flags, subcommands and value
//! completions off the command tree.

use tracing::trace;

use crate::tree::{CommandTree, DynamicSuggestionKey, FlagKey, FlagType, NodeId};

use super::engine::Suggestion;
use super::token_stream::Document;

/// Host-supplied provider for commands tagged with a dynamic-suggestion key
pub trait DynamicSuggestions: Send + Sync {
    /// Suggestions for a command tagged with `key`
    ///
    /// # Arguments
    /// * `key` - The tag declared on the command
    /// * `doc` - The line being edited
    fn suggest(&self, key: &DynamicSuggestionKey, doc: &Document) -> Vec<Suggestion>;
}

impl<F> DynamicSuggestions for F
where
    F: Fn(&DynamicSuggestionKey, &Document) -> Vec<Suggestion> + Send + Sync,
{
    fn suggest(&self, key: &DynamicSuggestionKey, doc: &Document) -> Vec<Suggestion> {
        self(key, doc)
    }
}

/// Which hidden items are offered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Visibility {
    pub show_hidden_commands: bool,
    pub show_hidden_flags: bool,
}

/// Reads suggestion candidates for one command off the tree
pub struct SuggestionAggregator<'a> {
    /// Command tree
    tree: &'a CommandTree,
    /// Hidden-item toggles
    visibility: Visibility,
    /// Provider for tagged commands
    dynamic: Option<&'a dyn DynamicSuggestions>,
}

impl<'a> SuggestionAggregator<'a> {
    pub fn new(
        tree: &'a CommandTree,
        visibility: Visibility,
        dynamic: Option<&'a dyn DynamicSuggestions>,
    ) -> Self {
        Self {
            tree,
            visibility,
            dynamic,
        }
    }

    /// Flag names visible at `node`, spelled the way the current word starts
    ///
    /// `--` offers long names; a single `-` offers shorthands; anything else
    /// offers nothing.
    pub fn flags(&self, node: NodeId, doc: &Document) -> Vec<Suggestion> {
        let word = doc.word_before_cursor();
        if !word.starts_with('-') {
            return Vec::new();
        }
        let long = word.starts_with("--");

        self.tree
            .visible_flags(node)
            .into_iter()
            .filter(|flag| self.visibility.show_hidden_flags || !flag.spec.is_hidden())
            .filter_map(|flag| {
                let text = if long {
                    format!("--{}", flag.spec.name())
                } else {
                    format!("-{}", flag.spec.shorthand_char()?)
                };
                Some(Suggestion::new(text, flag.spec.usage_text()))
            })
            .collect()
    }

    /// Subcommands of `node` in declaration order
    pub fn commands(&self, node: NodeId) -> Vec<Suggestion> {
        self.tree
            .children(node)
            .iter()
            .map(|id| self.tree.node(*id))
            .filter(|child| self.visibility.show_hidden_commands || !child.is_hidden())
            .map(|child| Suggestion::new(child.name(), child.short()))
            .collect()
    }

    /// Suggestions from the host provider, if `node` is tagged and a
    /// provider is installed
    pub fn dynamic(&self, node: NodeId, doc: &Document) -> Vec<Suggestion> {
        match (self.tree.node(node).dynamic_suggestions(), self.dynamic) {
            (Some(key), Some(provider)) => {
                let suggestions = provider.suggest(key, doc);
                trace!(
                    "Dynamic provider returned {} suggestions for '{}'",
                    suggestions.len(),
                    key.as_str()
                );
                suggestions
            }
            _ => Vec::new(),
        }
    }

    /// Value candidates for a flag, not yet filtered by the typed value
    ///
    /// Booleans never get value suggestions. Each candidate returned by the
    /// flag's completion callback may carry a description after a tab.
    ///
    /// # Arguments
    /// * `flag` - The flag whose value is being completed
    /// * `line_tokens` - Tokens of the current line
    pub fn flag_values(&self, flag: &FlagKey, line_tokens: &[String]) -> Vec<Suggestion> {
        let is_bool = self
            .tree
            .flags()
            .get(flag)
            .is_some_and(|state| state.value_type() == FlagType::Bool);
        if is_bool {
            return Vec::new();
        }

        let Some(completion) = self.tree.flag_completion(flag.node, &flag.name) else {
            return Vec::new();
        };
        completion(line_tokens, &flag.name)
            .into_iter()
            .map(|candidate| match candidate.split_once('\t') {
                Some((text, description)) => Suggestion::new(text, description),
                None => Suggestion::new(candidate, ""),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{CommandSpec, FlagSpec};

    fn texts(suggestions: &[Suggestion]) -> Vec<&str> {
        suggestions.iter().map(|s| s.text.as_str()).collect()
    }

    struct Sample {
        tree: CommandTree,
        get: NodeId,
        food: NodeId,
    }

    fn sample() -> Sample {
        let mut tree = CommandTree::new(CommandSpec::new("root"));
        let get = tree
            .add_command(tree.root(), CommandSpec::new("get"))
            .unwrap();
        tree.add_command(get, CommandSpec::new("object").short("Get an object"))
            .unwrap();
        tree.add_command(get, CommandSpec::new("secret").hidden())
            .unwrap();
        let food = tree
            .add_command(get, CommandSpec::new("food").dynamic_suggestions("food"))
            .unwrap();
        tree.add_flag(get, FlagSpec::bool("verbose", false).shorthand('v').persistent())
            .unwrap();
        tree.add_flag(food, FlagSpec::string("name", "John").shorthand('n').usage("Name"))
            .unwrap();
        tree.add_flag(food, FlagSpec::string("diet", "").hidden())
            .unwrap();
        tree.register_flag_completion(food, "name", |_, _| {
            vec!["John\tThe first".to_string(), "Mary".to_string()]
        })
        .unwrap();
        Sample { tree, get, food }
    }

    #[test]
    fn test_flag_spelling_follows_word() {
        let s = sample();
        let agg = SuggestionAggregator::new(&s.tree, Visibility::default(), None);

        let long = agg.flags(s.food, &Document::at_end("get food --"));
        assert_eq!(texts(&long), vec!["--name", "--verbose"]);
        assert_eq!(long[0].description, "Name");

        let short = agg.flags(s.food, &Document::at_end("get food -"));
        assert_eq!(texts(&short), vec!["-n", "-v"]);

        assert!(agg.flags(s.food, &Document::at_end("get food ")).is_empty());
    }

    #[test]
    fn test_hidden_items() {
        let s = sample();
        let agg = SuggestionAggregator::new(&s.tree, Visibility::default(), None);
        assert_eq!(texts(&agg.commands(s.get)), vec!["object", "food"]);

        let all = Visibility {
            show_hidden_commands: true,
            show_hidden_flags: true,
        };
        let agg = SuggestionAggregator::new(&s.tree, all, None);
        assert_eq!(texts(&agg.commands(s.get)), vec!["object", "secret", "food"]);
        assert_eq!(
            texts(&agg.flags(s.food, &Document::at_end("--"))),
            vec!["--name", "--diet", "--verbose"]
        );
    }

    #[test]
    fn test_dynamic_needs_tag_and_provider() {
        let s = sample();
        let provider = |key: &DynamicSuggestionKey, _: &Document| {
            vec![Suggestion::new(format!("{}-apple", key.as_str()), "")]
        };

        let agg = SuggestionAggregator::new(&s.tree, Visibility::default(), Some(&provider));
        assert_eq!(texts(&agg.dynamic(s.food, &Document::at_end(""))), vec!["food-apple"]);
        assert!(agg.dynamic(s.get, &Document::at_end("")).is_empty());

        let agg = SuggestionAggregator::new(&s.tree, Visibility::default(), None);
        assert!(agg.dynamic(s.food, &Document::at_end("")).is_empty());
    }

    #[test]
    fn test_flag_values_split_descriptions() {
        let s = sample();
        let agg = SuggestionAggregator::new(&s.tree, Visibility::default(), None);

        let values = agg.flag_values(&FlagKey::new(s.food, "name"), &[]);
        assert_eq!(
            values,
            vec![Suggestion::new("John", "The first"), Suggestion::new("Mary", "")]
        );

        assert!(agg.flag_values(&FlagKey::new(s.get, "verbose"), &[]).is_empty());
        assert!(agg.flag_values(&FlagKey::new(s.food, "diet"), &[]).is_empty());
    }
}
