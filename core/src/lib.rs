//! A general-purpose emitter framework: traversal, context, memoization,
//! and reference-cycle resolution over a typed graph.
//!
//! A front end builds a [`type_graph::Program`] once; a target implements
//! [`emitter::UserEmitter`] to say how each kind of node renders; an
//! [`asset_emitter::AssetEmitter`] drives the two together, filing named
//! results into a [`scope::ScopeGraph`] and writing completed source files
//! out through a [`emitter::Host`].
//!
//! ```ignore
//! let emitter = AssetEmitter::new(program, MyTarget::default(), EmitProgramOptions::default());
//! ```

pub mod asset_emitter;
pub mod builder;
pub mod context;
pub mod emitter;
pub mod error;
pub mod interner;
pub mod keyed_map;
pub mod op_key;
pub mod placeholder;
pub mod result;
pub mod scope;
pub mod type_graph;

pub use asset_emitter::{AssetEmitter, EmitContext, EmitProgramOptions};
pub use context::{Context, ContextMap, ContextValue};
pub use emitter::{Host, UserEmitter};
pub use error::{EmitError, Result};
pub use op_key::OpKey;
pub use placeholder::Placeholder;
pub use result::{Declaration, EmitEntity, MemoKey, Rendered};
pub use scope::{Scope, ScopeGraph, ScopeId, SourceFile};
pub use type_graph::{Program, ProgramBuilder, Type, TypeId, TypeKind};
