//! The two context halves folded on every dispatch: lexical context
//! (namespaces, interfaces, anything the walk is lexically inside) and
//! reference context (state contributed only because the current node was
//! reached *by reference* from another one) (§4.5).
//!
//! Context records are small key/value maps. Because the memo table keys on
//! context identity rather than value (§4.3), every map that's ever folded
//! is canonicalised through an [`Interner`] first — two lexically distinct
//! frames that happen to carry the same entries collapse to one `Rc`, so a
//! memo lookup for the same `(op, node)` pair under both hits the same slot.

use std::rc::Rc;

use crate::interner::Interner;
use crate::scope::ScopeId;

/// A value a `<opKey>Context`/`<opKey>ReferenceContext` hook may contribute.
/// Closed rather than type-erased: the memo table needs structural
/// `Eq`/`Hash` over contexts, which a `dyn Any`-style map can't give us.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContextValue {
    Bool(bool),
    Int(i64),
    Str(String),
    Scope(ScopeId),
}

impl From<bool> for ContextValue {
    fn from(v: bool) -> Self {
        ContextValue::Bool(v)
    }
}

impl From<i64> for ContextValue {
    fn from(v: i64) -> Self {
        ContextValue::Int(v)
    }
}

impl From<&str> for ContextValue {
    fn from(v: &str) -> Self {
        ContextValue::Str(v.to_owned())
    }
}

impl From<String> for ContextValue {
    fn from(v: String) -> Self {
        ContextValue::Str(v)
    }
}

impl From<ScopeId> for ContextValue {
    fn from(v: ScopeId) -> Self {
        ContextValue::Scope(v)
    }
}

/// An immutable record of named context entries — the unit a single
/// `<opKey>Context` (or `ReferenceContext`) call contributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ContextMap {
    entries: std::collections::BTreeMap<String, ContextValue>,
}

impl ContextMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overlays `other`'s entries on top of `self`'s, `other` winning on
    /// collision — the right-biased merge §4.5 folds a nested contribution
    /// with over whatever its enclosing frame already carried.
    #[must_use]
    pub fn overlay(&self, other: &ContextMap) -> ContextMap {
        let mut entries = self.entries.clone();
        entries.extend(other.entries.iter().map(|(k, v)| (k.clone(), v.clone())));
        ContextMap { entries }
    }
}

/// A context record canonicalised by value: two equal `ContextMap`s always
/// intern to the same `Rc`, so a [`Context`] can compare its halves by
/// pointer (§4.3, "Identity of context states").
pub type InternedContext = Rc<ContextMap>;

/// The folded `(lexical, reference)` state active at one point in the
/// traversal — what a memo key captures alongside `(op, node)`, and what a
/// dispatched operation reads `getContext()`/the current scope from (§4.5).
///
/// Equality and hashing are by interned pointer, not by value: two `Context`s
/// are the "same" context for memoization purposes exactly when they were
/// folded to equal content, which the interner already guarantees collapses
/// to one `Rc` each.
#[derive(Debug, Clone)]
pub struct Context {
    pub lexical: InternedContext,
    pub reference: InternedContext,
}

impl Context {
    /// An uninterned, all-empty context. Used only as the placeholder value
    /// before the program context is computed for the first time; every
    /// real fold step replaces it via the interner.
    #[must_use]
    pub fn blank() -> Self {
        let empty = Rc::new(ContextMap::new());
        Self {
            lexical: empty.clone(),
            reference: empty,
        }
    }

    /// The scope a dispatched operation sees: `reference.scope`, falling
    /// back to `lexical.scope`, falling back to nothing (§4.5). The
    /// framework never synthesises a scope — this only ever reflects what a
    /// `<opKey>Context`/`ReferenceContext` hook returned.
    #[must_use]
    pub fn scope(&self) -> Option<ScopeId> {
        self.reference
            .get("scope")
            .or_else(|| self.lexical.get("scope"))
            .and_then(|value| match value {
                ContextValue::Scope(id) => Some(*id),
                _ => None,
            })
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.lexical, &other.lexical) && Rc::ptr_eq(&self.reference, &other.reference)
    }
}

impl Eq for Context {}

impl std::hash::Hash for Context {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.lexical) as usize).hash(state);
        (Rc::as_ptr(&self.reference) as usize).hash(state);
    }
}

/// The interner backing every context fold in one run (§4.3).
#[derive(Debug, Default)]
pub struct ContextInterner {
    interner: Interner<ContextMap>,
}

impl ContextInterner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, map: ContextMap) -> InternedContext {
        self.interner.intern(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_maps_intern_to_the_same_rc() {
        let mut interner = ContextInterner::new();
        let a = interner.intern(ContextMap::new().with("scope", "x"));
        let b = interner.intern(ContextMap::new().with("scope", "x"));
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn overlay_is_right_biased() {
        let base = ContextMap::new().with("a", 1_i64);
        let overlay = ContextMap::new().with("a", 2_i64).with("b", true);
        let folded = base.overlay(&overlay);
        assert_eq!(folded.get("a"), Some(&ContextValue::Int(2)));
        assert_eq!(folded.get("b"), Some(&ContextValue::Bool(true)));
    }

    #[test]
    fn context_scope_prefers_reference_over_lexical() {
        let mut interner = ContextInterner::new();
        let lexical = interner.intern(ContextMap::new().with("inNamespace", true));
        let reference = interner.intern(ContextMap::new());
        let ctx = Context { lexical, reference };
        assert_eq!(ctx.scope(), None);
    }

    #[test]
    fn contexts_with_equal_interned_halves_compare_equal() {
        let mut interner = ContextInterner::new();
        let lex_a = interner.intern(ContextMap::new().with("a", 1_i64));
        let lex_b = interner.intern(ContextMap::new().with("a", 1_i64));
        let empty = interner.intern(ContextMap::new());
        let ctx_a = Context {
            lexical: lex_a,
            reference: empty.clone(),
        };
        let ctx_b = Context {
            lexical: lex_b,
            reference: empty,
        };
        assert_eq!(ctx_a, ctx_b);
    }
}
