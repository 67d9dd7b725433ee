//! Errors raised while traversing and emitting a type graph.
//!
//! Per §7, error kinds 1 ("missing operation") and 2 ("missing context
//! method") of the source design don't have a runtime counterpart here: the
//! user emitter is a statically dispatched trait, so a missing method is a
//! compile error, not a value in this enum. Kind 3 ("unknown intrinsic")
//! belongs to a downstream target emitter's own error type.

use snafu::{Backtrace, Snafu};

use crate::scope::ScopeId;
use crate::type_graph::TypeId;

/// Errors the engine itself can raise while dispatching, folding context, or
/// writing output. Never recovered locally; the active context frame is
/// restored by the caller before this propagates (§7).
#[derive(Debug, Snafu)]
#[snafu(visibility(pub), context(suffix(Ctx)))]
pub enum EmitError {
    /// A `declaration` result was produced with no current scope in context
    /// (§7 kind 4).
    #[snafu(display("cannot create a declaration named \"{name}\" with no current scope"))]
    ScopeAbsent { name: String, backtrace: Backtrace },

    /// The dispatch key for a type node could not be derived (§7 kind 5) —
    /// this only happens for malformed graphs, e.g. a `Union` instantiation
    /// whose generic is itself anonymous.
    #[snafu(display("unsupported type kind for node {node:?}"))]
    UnsupportedKind {
        node: TypeId,
        backtrace: Backtrace,
    },

    /// A non-model type was used to name a model template instantiation
    /// (§7 kind 7, §6).
    #[snafu(display("template argument of {node:?} is not a model; cannot derive a declaration name"))]
    InvalidTemplateArgument {
        node: TypeId,
        backtrace: Backtrace,
    },

    /// A placeholder was assigned a value twice.
    #[snafu(display("placeholder was already resolved"))]
    PlaceholderAlreadyResolved { backtrace: Backtrace },

    /// §7 kind 6 / §4.7 step 4: a `reference` operation returned a value
    /// that was itself still an unresolved placeholder when the waiter
    /// fired — disallowed to prevent double deferral, and indicates a
    /// user-introduced cycle the framework cannot break.
    #[snafu(display("reference resolution for {node:?} produced a nested placeholder"))]
    DoubleDeferral {
        node: TypeId,
        backtrace: Backtrace,
    },

    /// The host filesystem failed to write a source file.
    #[snafu(display("failed to write output file \"{path}\": {source}"))]
    Write {
        path: String,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// `createScope`/`createSourceFile` was asked to nest a scope under one
    /// that does not exist in this run's scope graph.
    #[snafu(display("unknown scope {scope:?}"))]
    UnknownScope {
        scope: ScopeId,
        backtrace: Backtrace,
    },
}

pub type Result<T, E = EmitError> = std::result::Result<T, E>;
