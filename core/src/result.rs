//! What a dispatched operation produces, and the key the memo table files
//! it under (§4.1, §4.3).

use crate::context::Context;
use crate::op_key::OpKey;
use crate::placeholder::Placeholder;
use crate::scope::ScopeId;
use crate::type_graph::TypeId;

/// Either a value is known outright, or it's deferred behind a
/// [`Placeholder`] because resolving it would otherwise recurse into a
/// reference cycle still being emitted (§4.2).
#[derive(Debug, Clone)]
pub enum Rendered<V> {
    Value(V),
    Placeholder(Placeholder<V>),
}

impl<V: Clone> Rendered<V> {
    /// The value if known now; `None` while still deferred.
    #[must_use]
    pub fn value(&self) -> Option<V> {
        match self {
            Rendered::Value(v) => Some(v.clone()),
            Rendered::Placeholder(p) => p.get(),
        }
    }

    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Rendered::Placeholder(_))
    }
}

/// A named result filed into a scope (§4.6) — the outcome of any op key
/// that [`OpKey::produces_declaration`] reports as declaration-producing.
///
/// `value` is mutable: a circular reference that resolved to a
/// `Declaration` is allowed to patch its rendered value in place once the
/// cycle closes, rather than forcing every holder of the declaration to
/// re-fetch it (§4.7).
#[derive(Debug, Clone)]
pub struct Declaration<V> {
    pub name: String,
    pub scope: ScopeId,
    pub value: Rendered<V>,
}

impl<V> Declaration<V> {
    #[must_use]
    pub fn new(name: impl Into<String>, scope: ScopeId, value: Rendered<V>) -> Self {
        Self {
            name: name.into(),
            scope,
            value,
        }
    }
}

/// What dispatching a type node to an operation produced.
#[derive(Debug, Clone)]
pub enum EmitEntity<V> {
    /// A named result filed into the current scope.
    Declaration(Declaration<V>),
    /// An inline result with no scope of its own (a literal, a property, a
    /// tuple value, ...).
    Raw(Rendered<V>),
    /// The user emitter explicitly opted this node out of emission;
    /// propagates through builders as an omitted entry (§4.8, §9 open
    /// question — an omitted placeholder resolves to this, not an error).
    NoEmit,
    /// Still being computed by an enclosing call further up the stack; the
    /// waiter list on the associated [`Placeholder`] will be notified when
    /// it resolves (§4.2).
    Circular(TypeId),
}

impl<V> From<V> for EmitEntity<V> {
    fn from(value: V) -> Self {
        EmitEntity::Raw(Rendered::Value(value))
    }
}

impl<V: Clone> EmitEntity<V> {
    /// The rendered value, if this entity carries one outright rather than
    /// being `NoEmit` or a live `Circular` marker.
    #[must_use]
    pub fn rendered(&self) -> Option<Rendered<V>> {
        match self {
            EmitEntity::Declaration(decl) => Some(decl.value.clone()),
            EmitEntity::Raw(rendered) => Some(rendered.clone()),
            EmitEntity::NoEmit | EmitEntity::Circular(_) => None,
        }
    }

    #[must_use]
    pub fn is_no_emit(&self) -> bool {
        matches!(self, EmitEntity::NoEmit)
    }
}

/// The identity a memo table entry is filed and looked up under: which
/// operation produced it, for which node, under which folded context
/// (§4.3). Two lookups with equal contexts hit the same slot because
/// contexts are interned before a `MemoKey` is ever built (§4.5).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemoKey {
    pub op: OpKey,
    pub node: TypeId,
    pub context: Context,
}

impl MemoKey {
    #[must_use]
    pub fn new(op: OpKey, node: TypeId, context: Context) -> Self {
        Self { op, node, context }
    }
}
