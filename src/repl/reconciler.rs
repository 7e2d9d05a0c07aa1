//! Flag-state reconciliation between runs
//!
//! Under [`FlagPolicy::ResetAfterRun`] every flag visible anywhere in the
//! executed command's subtree returns to its default once the command has
//! run. Under [`FlagPolicy::Persist`] values survive runs; the root carries a
//! `--persist-flag-values` toggle, and while it is off, changed flags are
//! reverted the next time a command that sees them is completed or run.

use tracing::debug;

use crate::config::FlagPolicy;
use crate::error::Result;
use crate::tree::{CommandTree, FlagKey, FlagSpec, NodeId};

/// Reserved boolean flag on the root, registered under [`FlagPolicy::Persist`]
pub const PERSIST_FLAG: &str = "persist-flag-values";

/// Applies the flag policy after runs and before suggestion passes
#[derive(Debug, Clone)]
pub struct Reconciler {
    policy: FlagPolicy,
    toggle: Option<FlagKey>,
}

impl Reconciler {
    pub fn new(policy: FlagPolicy) -> Self {
        Self {
            policy,
            toggle: None,
        }
    }

    pub fn policy(&self) -> FlagPolicy {
        self.policy
    }

    /// Register the reserved persistence toggle on the root when the policy
    /// needs it
    pub fn install(&mut self, tree: &mut CommandTree) -> Result<()> {
        if self.policy != FlagPolicy::Persist || self.toggle.is_some() {
            return Ok(());
        }
        let root = tree.root();
        let key = tree.add_flag(
            root,
            FlagSpec::bool(PERSIST_FLAG, false)
                .usage("Persist flag values")
                .persistent(),
        )?;
        self.toggle = Some(key);
        Ok(())
    }

    /// Whether the user switched persistence on
    pub fn persistence_enabled(&self, tree: &CommandTree) -> bool {
        self.toggle
            .as_ref()
            .and_then(|key| tree.flags().get(key))
            .is_some_and(|state| state.value() == "true")
    }

    /// Reconcile after `executed` has run
    ///
    /// # Returns
    /// * `usize` - Number of flags returned to their default
    pub fn after_run(&self, tree: &mut CommandTree, executed: NodeId) -> usize {
        if self.policy != FlagPolicy::ResetAfterRun {
            return 0;
        }

        // Flags inherited from above the subtree, then everything declared in it
        let mut keys: Vec<FlagKey> = tree.inherited_flags(executed).map(|f| f.key()).collect();
        for node in tree.subtree(executed) {
            keys.extend(tree.flags().owned_by(node).map(|(key, _)| key.clone()));
        }
        let reset = keys
            .iter()
            .filter(|key| tree.flags_mut().reset(key))
            .count();
        if reset > 0 {
            debug!(
                "Reset {} flags under '{}' to defaults",
                reset,
                tree.command_path(executed)
            );
        }
        reset
    }

    /// Reconcile before suggestions are generated at `node`
    ///
    /// # Returns
    /// * `usize` - Number of flags returned to their default
    pub fn before_suggest(&self, tree: &mut CommandTree, node: NodeId) -> usize {
        self.revert_unpersisted(tree, node)
    }

    /// Reconcile before the line resolved to `node` applies its own flags
    ///
    /// The front end only asks for suggestions on demand, so a line can be
    /// submitted without any suggestion pass since the previous run.
    ///
    /// # Returns
    /// * `usize` - Number of flags returned to their default
    pub fn before_run(&self, tree: &mut CommandTree, node: NodeId) -> usize {
        self.revert_unpersisted(tree, node)
    }

    fn revert_unpersisted(&self, tree: &mut CommandTree, node: NodeId) -> usize {
        if self.policy != FlagPolicy::Persist || self.persistence_enabled(tree) {
            return 0;
        }

        let keys: Vec<FlagKey> = tree
            .visible_flags(node)
            .into_iter()
            .map(|f| f.key())
            .filter(|key| tree.flags().get(key).is_some_and(|state| state.is_changed()))
            .collect();
        for key in &keys {
            tree.flags_mut().reset(key);
        }
        if !keys.is_empty() {
            debug!(
                "Reverted {} unpersisted flags under '{}'",
                keys.len(),
                tree.command_path(node)
            );
        }
        keys.len()
    }
}
