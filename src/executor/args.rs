//! Flag and positional argument parsing for a resolved command
//!
//! Accepted forms:
//! - `--name value`, `--name=value`
//! - `--verbose` (booleans take no separate value), `--verbose=false`
//! - `-n value`, `-nvalue`, `-n=value`
//! - `-vn value` (boolean shorthands may be clustered; a value flag ends the cluster)
//! - `--` stops flag parsing; everything after it is positional

use crate::error::ParseError;
use crate::tree::{CommandTree, FlagKey, NodeId};

/// Result of parsing the arguments left over after the command walk.
#[derive(Debug, Default, PartialEq)]
pub struct ParsedArgs {
    /// Flag assignments in the order they were written.
    pub assignments: Vec<(FlagKey, String)>,
    /// Positional arguments.
    pub positionals: Vec<String>,
}

/// Parse `args` against the flags visible at `node`.
///
/// Values are not validated here; the flag store checks them on assignment.
pub fn parse_args(tree: &CommandTree, node: NodeId, args: &[String]) -> Result<ParsedArgs, ParseError> {
    let mut parsed = ParsedArgs::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        if arg == "--" {
            parsed.positionals.extend(iter.by_ref().cloned());
            break;
        }

        if let Some(long) = arg.strip_prefix("--") {
            let (name, inline) = match long.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (long, None),
            };
            let flag = tree
                .lookup_flag(node, name)
                .ok_or_else(|| ParseError::UnknownFlag(name.to_string()))?;
            let value = match inline {
                Some(value) => value.to_string(),
                None if flag.spec.is_bool() => "true".to_string(),
                None => iter
                    .next()
                    .cloned()
                    .ok_or_else(|| ParseError::MissingFlagValue(name.to_string()))?,
            };
            parsed.assignments.push((flag.key(), value));
            continue;
        }

        if arg.len() > 1 && arg.starts_with('-') {
            let cluster = &arg[1..];
            for (i, c) in cluster.char_indices() {
                let flag = tree
                    .lookup_shorthand(node, c)
                    .ok_or(ParseError::UnknownShorthand(c))?;
                let after = &cluster[i + c.len_utf8()..];

                if flag.spec.is_bool() {
                    if let Some(value) = after.strip_prefix('=') {
                        parsed.assignments.push((flag.key(), value.to_string()));
                        break;
                    }
                    parsed.assignments.push((flag.key(), "true".to_string()));
                    continue;
                }

                let value = if after.is_empty() {
                    iter.next().cloned().ok_or_else(|| {
                        ParseError::MissingFlagValue(flag.spec.name().to_string())
                    })?
                } else {
                    after.strip_prefix('=').unwrap_or(after).to_string()
                };
                parsed.assignments.push((flag.key(), value));
                break;
            }
            continue;
        }

        parsed.positionals.push(arg.clone());
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{CommandSpec, FlagSpec};

    fn tokens(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    fn tree() -> (CommandTree, NodeId) {
        let mut tree = CommandTree::new(CommandSpec::new("root"));
        let food = tree
            .add_command(tree.root(), CommandSpec::new("food"))
            .unwrap();
        tree.add_flag(food, FlagSpec::string("name", "John").shorthand('n'))
            .unwrap();
        tree.add_flag(food, FlagSpec::bool("verbose", false).shorthand('v'))
            .unwrap();
        tree.add_flag(food, FlagSpec::bool("quiet", false).shorthand('q'))
            .unwrap();
        (tree, food)
    }

    fn values(parsed: &ParsedArgs) -> Vec<(&str, &str)> {
        parsed
            .assignments
            .iter()
            .map(|(key, value)| (key.name.as_str(), value.as_str()))
            .collect()
    }

    #[test]
    fn test_long_forms() {
        let (tree, food) = tree();
        let parsed = parse_args(&tree, food, &tokens("--name Mary --verbose=false apple")).unwrap();
        assert_eq!(values(&parsed), vec![("name", "Mary"), ("verbose", "false")]);
        assert_eq!(parsed.positionals, tokens("apple"));

        let parsed = parse_args(&tree, food, &tokens("--name=Anne")).unwrap();
        assert_eq!(values(&parsed), vec![("name", "Anne")]);
    }

    #[test]
    fn test_short_forms() {
        let (tree, food) = tree();
        let parsed = parse_args(&tree, food, &tokens("-n Mary -nAnne -n=Bob")).unwrap();
        assert_eq!(
            values(&parsed),
            vec![("name", "Mary"), ("name", "Anne"), ("name", "Bob")]
        );
    }

    #[test]
    fn test_clustered_shorthands() {
        let (tree, food) = tree();
        let parsed = parse_args(&tree, food, &tokens("-vqn Mary")).unwrap();
        assert_eq!(
            values(&parsed),
            vec![("verbose", "true"), ("quiet", "true"), ("name", "Mary")]
        );
    }

    #[test]
    fn test_double_dash_ends_flags() {
        let (tree, food) = tree();
        let parsed = parse_args(&tree, food, &tokens("-v -- --name x")).unwrap();
        assert_eq!(values(&parsed), vec![("verbose", "true")]);
        assert_eq!(parsed.positionals, tokens("--name x"));
    }

    #[test]
    fn test_errors() {
        let (tree, food) = tree();
        assert!(matches!(
            parse_args(&tree, food, &tokens("--nope")),
            Err(ParseError::UnknownFlag(name)) if name == "nope"
        ));
        assert!(matches!(
            parse_args(&tree, food, &tokens("-x")),
            Err(ParseError::UnknownShorthand('x'))
        ));
        assert!(matches!(
            parse_args(&tree, food, &tokens("--name")),
            Err(ParseError::MissingFlagValue(name)) if name == "name"
        ));
    }
}
