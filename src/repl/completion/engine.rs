//! Completion engine - orchestrates the completion flow
//!
//! This module ties together the completion components: tokenizing the
//! document, resolving the cursor context, gathering candidates (through the
//! value cache for flag values) and applying the final filter.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::tree::{CommandTree, FlagType, NodeId, parse_duration};

use super::cache::{CACHE_INTERVAL_FLAG, SuggestionCache};
use super::context::{ContextResolver, CursorPosition, ResolvedContext};
use super::filter::{PrefixFilter, SuggestionFilter, filter_has_prefix};
use super::provider::{DynamicSuggestions, SuggestionAggregator, Visibility};
use super::token_stream::{Document, Tokenizer, WhitespaceTokenizer};

/// A completion candidate
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Suggestion {
    /// Text to insert
    pub text: String,
    /// Description shown next to the candidate
    pub description: String,
}

impl Suggestion {
    pub fn new(text: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            description: description.into(),
        }
    }
}

/// Main completion engine
pub struct CompletionEngine {
    /// Splits lines into tokens
    tokenizer: Arc<dyn Tokenizer>,
    /// Final filter over the aggregated list
    filter: Arc<dyn SuggestionFilter>,
    /// Provider for commands tagged with a dynamic-suggestion key
    dynamic: Option<Arc<dyn DynamicSuggestions>>,
    /// Hidden-item toggles
    visibility: Visibility,
    /// Append dynamic suggestions after filtering instead of filtering them
    trust_dynamic: bool,
    /// Flag-value suggestion cache
    cache: SuggestionCache,
}

impl CompletionEngine {
    /// Create an engine with the whitespace tokenizer, the prefix filter and
    /// the default cache interval
    pub fn new() -> Self {
        Self {
            tokenizer: Arc::new(WhitespaceTokenizer),
            filter: Arc::new(PrefixFilter::new()),
            dynamic: None,
            visibility: Visibility::default(),
            trust_dynamic: false,
            cache: SuggestionCache::default(),
        }
    }

    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn with_filter(mut self, filter: Arc<dyn SuggestionFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_dynamic_suggestions(mut self, provider: Arc<dyn DynamicSuggestions>) -> Self {
        self.dynamic = Some(provider);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_cache_interval(mut self, interval: Duration) -> Self {
        self.cache.set_interval(interval);
        self
    }

    /// Skip the final filter for dynamic suggestions
    pub fn trust_dynamic_suggestions(mut self, trust: bool) -> Self {
        self.trust_dynamic = trust;
        self
    }

    pub fn tokenizer(&self) -> &dyn Tokenizer {
        self.tokenizer.as_ref()
    }

    /// Resolve the document to a command and cursor position
    pub fn resolve(&self, tree: &CommandTree, doc: &Document) -> ResolvedContext {
        ContextResolver::new(tree, self.tokenizer.as_ref()).resolve(doc)
    }

    /// Complete the document
    ///
    /// # Arguments
    /// * `tree` - Command tree to complete against
    /// * `doc` - The line being edited
    ///
    /// # Returns
    /// * `Vec<Suggestion>` - Filtered candidates in aggregation order
    pub fn complete(&mut self, tree: &CommandTree, doc: &Document) -> Vec<Suggestion> {
        let context = self.resolve(tree, doc);
        self.complete_resolved(tree, doc, context, Instant::now())
    }

    /// Complete an already resolved document at time `now`
    ///
    /// # Arguments
    /// * `tree` - Command tree to complete against
    /// * `doc` - The line being edited
    /// * `context` - Result of [`CompletionEngine::resolve`] for `doc`
    /// * `now` - Time used for the value cache
    pub fn complete_resolved(
        &mut self,
        tree: &CommandTree,
        doc: &Document,
        context: ResolvedContext,
        now: Instant,
    ) -> Vec<Suggestion> {
        let aggregator = SuggestionAggregator::new(tree, self.visibility, self.dynamic.as_deref());

        let suggestions = match &context.position {
            CursorPosition::FlagValue(value) => {
                let Some(flag) = &value.flag else {
                    return Vec::new();
                };
                if value.is_bool {
                    return Vec::new();
                }
                let interval = self.interval_for(tree, context.node);
                let candidates = self.cache.get_or_compute(flag, now, interval, || {
                    aggregator.flag_values(flag, &context.line_tokens)
                });
                let candidates = filter_has_prefix(candidates, &value.partial);
                self.filter.filter(candidates, doc)
            }
            _ => {
                let mut suggestions = aggregator.flags(context.node, doc);
                suggestions.extend(aggregator.commands(context.node));
                let dynamic = aggregator.dynamic(context.node, doc);
                if self.trust_dynamic {
                    let mut filtered = self.filter.filter(suggestions, doc);
                    filtered.extend(dynamic);
                    filtered
                } else {
                    suggestions.extend(dynamic);
                    self.filter.filter(suggestions, doc)
                }
            }
        };

        debug!(
            "{} suggestions for '{}' at {:?}",
            suggestions.len(),
            tree.command_path(context.node),
            context.position
        );
        suggestions
    }

    /// Cache interval for `node`: a non-zero `cache-interval` duration flag
    /// visible there wins over the configured interval
    fn interval_for(&self, tree: &CommandTree, node: NodeId) -> Duration {
        tree.flag_state(node, CACHE_INTERVAL_FLAG)
            .filter(|state| state.value_type() == FlagType::Duration)
            .and_then(|state| parse_duration(state.value()))
            .filter(|interval| !interval.is_zero())
            .unwrap_or_else(|| self.cache.interval())
    }
}

impl Default for CompletionEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::tree::{CommandSpec, DynamicSuggestionKey, FlagSpec};

    fn texts(suggestions: &[Suggestion]) -> Vec<&str> {
        suggestions.iter().map(|s| s.text.as_str()).collect()
    }

    /// root -> {get(alias eat) -> {object, thing, food}, secret(hidden)}
    fn sample_tree(names: Arc<Mutex<Vec<&'static str>>>) -> CommandTree {
        let mut tree = CommandTree::new(CommandSpec::new("root"));
        let get = tree
            .add_command(tree.root(), CommandSpec::new("get").alias("eat").short("Get something"))
            .unwrap();
        tree.add_command(tree.root(), CommandSpec::new("secret").hidden())
            .unwrap();
        let object = tree
            .add_command(get, CommandSpec::new("object").short("Get the object"))
            .unwrap();
        tree.add_command(get, CommandSpec::new("thing").short("The thing"))
            .unwrap();
        let food = tree
            .add_command(get, CommandSpec::new("food").dynamic_suggestions("food"))
            .unwrap();
        tree.add_flag(object, FlagSpec::bool("verbose", false).shorthand('v').usage("Verbose"))
            .unwrap();
        tree.add_flag(food, FlagSpec::string("name", "John").shorthand('n'))
            .unwrap();
        tree.register_flag_completion(food, "name", move |_, _| {
            names
                .lock()
                .unwrap()
                .iter()
                .map(|name| name.to_string())
                .collect()
        })
        .unwrap();
        tree
    }

    fn names(list: &[&'static str]) -> Arc<Mutex<Vec<&'static str>>> {
        Arc::new(Mutex::new(list.to_vec()))
    }

    fn complete(engine: &mut CompletionEngine, tree: &CommandTree, line: &str) -> Vec<String> {
        engine
            .complete(tree, &Document::at_end(line))
            .into_iter()
            .map(|s| s.text)
            .collect()
    }

    #[test]
    fn test_empty_input_lists_visible_top_level_commands() {
        let tree = sample_tree(names(&[]));
        let mut engine = CompletionEngine::new();
        assert_eq!(complete(&mut engine, &tree, ""), vec!["get"]);
    }

    #[test]
    fn test_subcommands_in_declaration_order() {
        let tree = sample_tree(names(&[]));
        let mut engine = CompletionEngine::new();
        assert_eq!(complete(&mut engine, &tree, "get "), vec!["object", "thing", "food"]);
        assert_eq!(complete(&mut engine, &tree, "eat fo"), vec!["food"]);
    }

    #[test]
    fn test_bool_flag_names() {
        let tree = sample_tree(names(&[]));
        let mut engine = CompletionEngine::new();
        assert_eq!(complete(&mut engine, &tree, "get object -"), vec!["-v"]);
        assert_eq!(complete(&mut engine, &tree, "get object --"), vec!["--verbose"]);
        assert!(complete(&mut engine, &tree, "get object -v ").is_empty());
    }

    #[test]
    fn test_flag_values() {
        let tree = sample_tree(names(&["John", "Mary", "Anne"]));
        let mut engine = CompletionEngine::new();
        assert_eq!(
            complete(&mut engine, &tree, "get food --name "),
            vec!["John", "Mary", "Anne"]
        );
        assert_eq!(complete(&mut engine, &tree, "get food --name J"), vec!["John"]);
        assert_eq!(
            complete(&mut engine, &tree, "get food -n "),
            vec!["John", "Mary", "Anne"]
        );
    }

    #[test]
    fn test_unknown_flag_has_no_values() {
        let tree = sample_tree(names(&["John"]));
        let mut engine = CompletionEngine::new();
        assert!(complete(&mut engine, &tree, "get food --nope ").is_empty());
    }

    #[test]
    fn test_idempotent() {
        let tree = sample_tree(names(&["John", "Mary"]));
        let mut engine = CompletionEngine::new();
        for line in ["", "get ", "get object --", "get food --name "] {
            let first = engine.complete(&tree, &Document::at_end(line));
            let second = engine.complete(&tree, &Document::at_end(line));
            assert_eq!(first, second, "line {line:?}");
        }
    }

    #[test]
    fn test_value_cache_interval() {
        let source = names(&["John"]);
        let tree = sample_tree(source.clone());
        let mut engine = CompletionEngine::new().with_cache_interval(Duration::from_millis(500));
        let doc = Document::at_end("get food --name ");
        let start = Instant::now();

        let ctx = engine.resolve(&tree, &doc);
        let first = engine.complete_resolved(&tree, &doc, ctx, start);
        assert_eq!(texts(&first), vec!["John"]);

        *source.lock().unwrap() = vec!["Mary"];
        let ctx = engine.resolve(&tree, &doc);
        let cached = engine.complete_resolved(&tree, &doc, ctx, start + Duration::from_millis(100));
        assert_eq!(cached, first);

        let ctx = engine.resolve(&tree, &doc);
        let fresh = engine.complete_resolved(&tree, &doc, ctx, start + Duration::from_millis(600));
        assert_eq!(texts(&fresh), vec!["Mary"]);
    }

    #[test]
    fn test_cache_interval_flag_overrides() {
        let source = names(&["John"]);
        let mut tree = sample_tree(source.clone());
        let root = tree.root();
        tree.add_flag(root, FlagSpec::duration(CACHE_INTERVAL_FLAG, "10s").persistent())
            .unwrap();
        let mut engine = CompletionEngine::new();
        let doc = Document::at_end("get food --name ");
        let start = Instant::now();

        let ctx = engine.resolve(&tree, &doc);
        engine.complete_resolved(&tree, &doc, ctx, start);
        *source.lock().unwrap() = vec!["Mary"];

        let ctx = engine.resolve(&tree, &doc);
        let later = engine.complete_resolved(&tree, &doc, ctx, start + Duration::from_secs(1));
        assert_eq!(texts(&later), vec!["John"]);
    }

    #[test]
    fn test_dynamic_suggestions_filtered_unless_trusted() {
        let tree = sample_tree(names(&[]));
        let provider = Arc::new(|_: &DynamicSuggestionKey, _: &Document| {
            vec![Suggestion::new("apple", ""), Suggestion::new("zucchini", "")]
        });

        let mut engine = CompletionEngine::new().with_dynamic_suggestions(provider.clone());
        assert_eq!(complete(&mut engine, &tree, "get food a"), vec!["apple"]);

        let mut engine = CompletionEngine::new()
            .with_dynamic_suggestions(provider)
            .trust_dynamic_suggestions(true);
        assert_eq!(complete(&mut engine, &tree, "get food a"), vec!["apple", "zucchini"]);
    }

    #[test]
    fn test_custom_filter_and_tokenizer() {
        let tree = sample_tree(names(&[]));
        let upper = |suggestions: Vec<Suggestion>, _: &Document| {
            suggestions
                .into_iter()
                .map(|s| Suggestion::new(s.text.to_uppercase(), s.description))
                .collect::<Vec<_>>()
        };
        let commas = |line: &str| {
            line.split(',')
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect::<Vec<_>>()
        };
        let mut engine = CompletionEngine::new()
            .with_filter(Arc::new(upper))
            .with_tokenizer(Arc::new(commas));

        // unfiltered, and "get," resolves through the comma tokenizer
        assert_eq!(complete(&mut engine, &tree, "get,"), vec!["OBJECT", "THING", "FOOD"]);
    }

    #[test]
    fn test_hidden_commands_toggle() {
        let tree = sample_tree(names(&[]));
        let mut engine = CompletionEngine::new().with_visibility(Visibility {
            show_hidden_commands: true,
            show_hidden_flags: false,
        });
        assert_eq!(complete(&mut engine, &tree, ""), vec!["get", "secret"]);
    }
}
