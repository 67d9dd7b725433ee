//! The output scope graph: source files and the namespaces nested within
//! them (§4.4).
//!
//! A [`ScopeGraph`] is a forest rooted at one [`Scope::SourceFile`] per
//! output file. `declaration` results are filed into whichever scope is
//! current at the time they're produced (§4.6); [`ScopeGraph::path_to_root`]
//! and [`ScopeGraph::common_ancestor`] let the dispatcher work out which
//! scopes to close and reopen when emission moves between declarations that
//! don't share an immediate parent.

use slotmap::{new_key_type, SlotMap};

use crate::error::{EmitError, UnknownScopeCtx};
use crate::type_graph::TypeId;

new_key_type! {
    /// Arena key for a node in the scope graph.
    pub struct ScopeId;
}

/// An output file a [`Scope::SourceFile`] is rooted in.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: String,
}

/// A node in the scope graph.
#[derive(Debug, Clone)]
pub enum Scope {
    /// The root scope of one output file.
    SourceFile { source_file: SourceFile },
    /// A nested scope, usually corresponding to a namespace declaration.
    /// `block` records the type-graph node that opened it, when there is
    /// one (a namespace node); anonymous blocks (e.g. `Interface` nesting)
    /// pass `None`.
    Namespace {
        block: Option<TypeId>,
        name: String,
        parent: ScopeId,
    },
}

impl Scope {
    #[must_use]
    pub fn parent(&self) -> Option<ScopeId> {
        match self {
            Scope::SourceFile { .. } => None,
            Scope::Namespace { parent, .. } => Some(*parent),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Scope::SourceFile { .. } => "",
            Scope::Namespace { name, .. } => name,
        }
    }
}

/// The forest of scopes produced over one emit run.
#[derive(Debug, Default)]
pub struct ScopeGraph {
    scopes: SlotMap<ScopeId, Scope>,
}

impl ScopeGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new root scope for an output file.
    pub fn create_source_file(&mut self, path: impl Into<String>) -> ScopeId {
        self.scopes.insert(Scope::SourceFile {
            source_file: SourceFile { path: path.into() },
        })
    }

    /// Allocates a nested scope under `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`EmitError::UnknownScope`] if `parent` isn't in this graph.
    pub fn create_scope(
        &mut self,
        block: Option<TypeId>,
        name: impl Into<String>,
        parent: ScopeId,
    ) -> Result<ScopeId, EmitError> {
        if !self.scopes.contains_key(parent) {
            return UnknownScopeCtx { scope: parent }.fail();
        }
        Ok(self.scopes.insert(Scope::Namespace {
            block,
            name: name.into(),
            parent,
        }))
    }

    #[must_use]
    pub fn get(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id)
    }

    /// Every root source-file scope allocated so far, in arena order.
    pub fn source_files(&self) -> impl Iterator<Item = (ScopeId, &SourceFile)> {
        self.scopes.iter().filter_map(|(id, scope)| match scope {
            Scope::SourceFile { source_file } => Some((id, source_file)),
            Scope::Namespace { .. } => None,
        })
    }

    #[must_use]
    pub fn source_file_of(&self, mut id: ScopeId) -> Option<&SourceFile> {
        loop {
            match self.scopes.get(id)? {
                Scope::SourceFile { source_file } => return Some(source_file),
                Scope::Namespace { parent, .. } => id = *parent,
            }
        }
    }

    /// The chain of scopes from `id` up to and including its root source
    /// file, innermost first.
    #[must_use]
    pub fn path_to_root(&self, mut id: ScopeId) -> Vec<ScopeId> {
        let mut path = Vec::new();
        loop {
            path.push(id);
            match self.scopes.get(id) {
                Some(scope) => match scope.parent() {
                    Some(parent) => id = parent,
                    None => break,
                },
                None => break,
            }
        }
        path
    }

    /// The deepest scope shared by both `a` and `b`'s ancestry, if any —
    /// used to compute which scopes to close/open when the dispatcher moves
    /// from emitting one declaration to another (§4.6).
    #[must_use]
    pub fn common_ancestor(&self, a: ScopeId, b: ScopeId) -> Option<ScopeId> {
        let a_path = self.path_to_root(a);
        let b_path: std::collections::HashSet<ScopeId> =
            self.path_to_root(b).into_iter().collect();
        a_path.into_iter().find(|scope| b_path.contains(scope))
    }

    /// `chain` minus the prefix it shares with `from`'s own path to root,
    /// i.e. the scopes still left to open to reach `chain`'s innermost
    /// scope starting at their common ancestor.
    #[must_use]
    pub fn diff(&self, from: ScopeId, to: ScopeId) -> Vec<ScopeId> {
        let Some(ancestor) = self.common_ancestor(from, to) else {
            return self.path_to_root(to).into_iter().rev().collect();
        };
        let mut diff = Vec::new();
        let mut current = to;
        while current != ancestor {
            diff.push(current);
            let Some(scope) = self.scopes.get(current) else {
                break;
            };
            match scope.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }
        diff.reverse();
        diff
    }

    /// The full scope-diff triple used to render a reference (§4.4, §4.7
    /// step 4): the scopes to close walking up from `from` to (but
    /// excluding) the common ancestor, the scopes to open walking down from
    /// the common ancestor to `to` ([`Self::diff`]), and the ancestor
    /// itself. `None` for the ancestor means `from` and `to` live in
    /// different source files — `path_up`/`path_down` then run all the way
    /// to each one's own root.
    #[must_use]
    pub fn scope_diff(&self, from: ScopeId, to: ScopeId) -> (Vec<ScopeId>, Vec<ScopeId>, Option<ScopeId>) {
        let Some(ancestor) = self.common_ancestor(from, to) else {
            return (
                self.path_to_root(from),
                self.path_to_root(to).into_iter().rev().collect(),
                None,
            );
        };
        let mut path_up = Vec::new();
        let mut current = from;
        while current != ancestor {
            path_up.push(current);
            let Some(scope) = self.scopes.get(current) else {
                break;
            };
            match scope.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }
        (path_up, self.diff(from, to), Some(ancestor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_file_has_no_parent() {
        let mut graph = ScopeGraph::new();
        let root = graph.create_source_file("out.json");
        assert!(graph.get(root).unwrap().parent().is_none());
    }

    #[test]
    fn nested_scope_reports_parent() {
        let mut graph = ScopeGraph::new();
        let root = graph.create_source_file("out.json");
        let child = graph.create_scope(None, "Widgets", root).unwrap();
        assert_eq!(graph.get(child).unwrap().parent(), Some(root));
        assert_eq!(graph.source_file_of(child).unwrap().path, "out.json");
    }

    #[test]
    fn create_scope_rejects_unknown_parent() {
        let mut other = ScopeGraph::new();
        let dangling = other.create_source_file("x.json");
        let mut graph = ScopeGraph::new();
        assert!(graph.create_scope(None, "A", dangling).is_err());
    }

    #[test]
    fn common_ancestor_of_siblings_is_their_parent() {
        let mut graph = ScopeGraph::new();
        let root = graph.create_source_file("out.json");
        let a = graph.create_scope(None, "A", root).unwrap();
        let b = graph.create_scope(None, "B", root).unwrap();
        assert_eq!(graph.common_ancestor(a, b), Some(root));
    }

    #[test]
    fn diff_returns_scopes_to_open() {
        let mut graph = ScopeGraph::new();
        let root = graph.create_source_file("out.json");
        let a = graph.create_scope(None, "A", root).unwrap();
        let a_b = graph.create_scope(None, "B", a).unwrap();
        let diff = graph.diff(root, a_b);
        assert_eq!(diff, vec![a, a_b]);
    }

    #[test]
    fn scope_diff_splits_at_common_ancestor() {
        let mut graph = ScopeGraph::new();
        let root = graph.create_source_file("out.json");
        let a = graph.create_scope(None, "A", root).unwrap();
        let a_b = graph.create_scope(None, "B", a).unwrap();
        let c = graph.create_scope(None, "C", root).unwrap();
        let (path_up, path_down, ancestor) = graph.scope_diff(a_b, c);
        assert_eq!(path_up, vec![a_b, a]);
        assert_eq!(path_down, vec![c]);
        assert_eq!(ancestor, Some(root));
    }
}
