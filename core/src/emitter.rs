//! The trait a target (a concrete code generator) implements: one method
//! per dispatch key in [`crate::op_key::OpKey`] (§3, §6), plus the context
//! fold hooks and the reference-rendering hook (§4.5, §4.7).
//!
//! Every method has a default body and takes `&self`: the framework drives
//! an arbitrarily deep chain of recursive dispatch calls through one shared
//! [`EmitContext`], and a type node can legitimately reference itself
//! (directly or through a cycle), so no single call through this trait can
//! assume it holds the only live reference to the target. A target that
//! needs scratch state of its own reaches for interior mutability (a
//! `RefCell`-wrapped buffer, say) the same way the teacher's keyword state
//! does, rather than through `&mut self` here.
//!
//! A target that only cares about models can leave every other method
//! unimplemented: the defaults still walk into a node's children wherever
//! the framework itself wouldn't (model properties, operation parameters,
//! union variants, ...), so nested declarations still get a chance to
//! emit, but contribute no rendered value of their own — mirroring the
//! teacher's `Visitor` trait, whose default method bodies recurse without
//! acting.

use crate::asset_emitter::EmitContext;
use crate::context::ContextMap;
use crate::error::EmitError;
use crate::op_key::OpKey;
use crate::result::{Declaration, EmitEntity};
use crate::scope::ScopeId;
use crate::type_graph::{
    Enum, EnumMember, Interface, Model, ModelProperty, Operation, Tuple, TypeId, Union,
    UnionVariant,
};

type Result<T> = std::result::Result<T, EmitError>;

/// The target-specific emission logic the framework dispatches into.
///
/// `Value` is whatever representation the target builds its output from —
/// a string, a `serde_json::Value`, a handle into its own AST, and so on.
/// [`crate::builder`] helpers exist to compose a `Value` out of pieces that
/// may still be deferred behind a reference cycle.
pub trait UserEmitter: Sized {
    type Value: Clone + 'static;

    fn program(&self, _ctx: &mut EmitContext<'_, Self>) -> Result<EmitEntity<Self::Value>> {
        Ok(EmitEntity::NoEmit)
    }

    fn source_file(
        &self,
        _ctx: &mut EmitContext<'_, Self>,
        _path: &str,
    ) -> Result<EmitEntity<Self::Value>> {
        Ok(EmitEntity::NoEmit)
    }

    /// Assembles one output file's final text out of every declaration
    /// filed into it (§4.8). The default produces nothing; a real target
    /// almost always overrides this.
    fn render_source_file(&self, _declarations: &[Declaration<Self::Value>]) -> String {
        String::new()
    }

    fn namespace(
        &self,
        _ctx: &mut EmitContext<'_, Self>,
        _id: TypeId,
        _name: &str,
    ) -> Result<EmitEntity<Self::Value>> {
        Ok(EmitEntity::NoEmit)
    }

    fn model_declaration(
        &self,
        ctx: &mut EmitContext<'_, Self>,
        id: TypeId,
        model: &Model,
    ) -> Result<EmitEntity<Self::Value>> {
        ctx.emit_model_properties(id, model)?;
        Ok(EmitEntity::NoEmit)
    }

    fn model_literal(
        &self,
        ctx: &mut EmitContext<'_, Self>,
        id: TypeId,
        model: &Model,
    ) -> Result<EmitEntity<Self::Value>> {
        ctx.emit_model_properties(id, model)?;
        Ok(EmitEntity::NoEmit)
    }

    fn model_instantiation(
        &self,
        ctx: &mut EmitContext<'_, Self>,
        id: TypeId,
        model: &Model,
    ) -> Result<EmitEntity<Self::Value>> {
        ctx.emit_model_properties(id, model)?;
        Ok(EmitEntity::NoEmit)
    }

    fn model_scalar(
        &self,
        _ctx: &mut EmitContext<'_, Self>,
        _id: TypeId,
        _model: &Model,
    ) -> Result<EmitEntity<Self::Value>> {
        Ok(EmitEntity::NoEmit)
    }

    fn model_property(
        &self,
        _ctx: &mut EmitContext<'_, Self>,
        _id: TypeId,
        _property: &ModelProperty,
    ) -> Result<EmitEntity<Self::Value>> {
        Ok(EmitEntity::NoEmit)
    }

    /// Property references are a distinct operation from property literals
    /// (§4.7 step 1) — a model's own properties are walked in place via
    /// [`UserEmitter::model_property`], but another node referring to a
    /// property (e.g. an operation parameter list built from a model's
    /// properties) goes through here instead.
    fn model_property_reference(
        &self,
        _ctx: &mut EmitContext<'_, Self>,
        _id: TypeId,
        _property: &ModelProperty,
    ) -> Result<EmitEntity<Self::Value>> {
        Ok(EmitEntity::NoEmit)
    }

    fn operation_declaration(
        &self,
        ctx: &mut EmitContext<'_, Self>,
        id: TypeId,
        operation: &Operation,
    ) -> Result<EmitEntity<Self::Value>> {
        ctx.emit_operation_parameters(id, operation)?;
        ctx.emit_operation_return_type(id, operation)?;
        Ok(EmitEntity::NoEmit)
    }

    fn interface_declaration(
        &self,
        ctx: &mut EmitContext<'_, Self>,
        id: TypeId,
        interface: &Interface,
    ) -> Result<EmitEntity<Self::Value>> {
        ctx.emit_interface_operations(id, interface)?;
        Ok(EmitEntity::NoEmit)
    }

    fn interface_operation_declaration(
        &self,
        _ctx: &mut EmitContext<'_, Self>,
        _id: TypeId,
        _operation: &Operation,
    ) -> Result<EmitEntity<Self::Value>> {
        Ok(EmitEntity::NoEmit)
    }

    fn union_declaration(
        &self,
        ctx: &mut EmitContext<'_, Self>,
        id: TypeId,
        union: &Union,
    ) -> Result<EmitEntity<Self::Value>> {
        ctx.emit_union_variants(id, union)?;
        Ok(EmitEntity::NoEmit)
    }

    fn union_literal(
        &self,
        ctx: &mut EmitContext<'_, Self>,
        id: TypeId,
        union: &Union,
    ) -> Result<EmitEntity<Self::Value>> {
        ctx.emit_union_variants(id, union)?;
        Ok(EmitEntity::NoEmit)
    }

    fn union_instantiation(
        &self,
        ctx: &mut EmitContext<'_, Self>,
        id: TypeId,
        union: &Union,
    ) -> Result<EmitEntity<Self::Value>> {
        ctx.emit_union_variants(id, union)?;
        Ok(EmitEntity::NoEmit)
    }

    fn union_variant(
        &self,
        _ctx: &mut EmitContext<'_, Self>,
        _id: TypeId,
        _variant: &UnionVariant,
    ) -> Result<EmitEntity<Self::Value>> {
        Ok(EmitEntity::NoEmit)
    }

    fn enum_declaration(
        &self,
        ctx: &mut EmitContext<'_, Self>,
        id: TypeId,
        enum_: &Enum,
    ) -> Result<EmitEntity<Self::Value>> {
        ctx.emit_enum_members(id, enum_)?;
        Ok(EmitEntity::NoEmit)
    }

    fn enum_member(
        &self,
        _ctx: &mut EmitContext<'_, Self>,
        _id: TypeId,
        _member: &EnumMember,
    ) -> Result<EmitEntity<Self::Value>> {
        Ok(EmitEntity::NoEmit)
    }

    fn tuple_literal(
        &self,
        ctx: &mut EmitContext<'_, Self>,
        id: TypeId,
        tuple: &Tuple,
    ) -> Result<EmitEntity<Self::Value>> {
        ctx.emit_tuple_literal_values(id, tuple)?;
        Ok(EmitEntity::NoEmit)
    }

    fn boolean_literal(
        &self,
        _ctx: &mut EmitContext<'_, Self>,
        _value: bool,
    ) -> Result<EmitEntity<Self::Value>> {
        Ok(EmitEntity::NoEmit)
    }

    fn string_literal(
        &self,
        _ctx: &mut EmitContext<'_, Self>,
        _value: &str,
    ) -> Result<EmitEntity<Self::Value>> {
        Ok(EmitEntity::NoEmit)
    }

    fn numeric_literal(
        &self,
        _ctx: &mut EmitContext<'_, Self>,
        _value: f64,
    ) -> Result<EmitEntity<Self::Value>> {
        Ok(EmitEntity::NoEmit)
    }

    /// Names a declaration about to be filed into scope (§4.6). The default
    /// falls back to whatever name the framework already derived; a target
    /// typically overrides this only for template instantiations, where a
    /// name has to be synthesized from the generic and its arguments (§6).
    fn declaration_name(
        &self,
        _ctx: &mut EmitContext<'_, Self>,
        id: TypeId,
        default_name: &str,
    ) -> Result<String> {
        let _ = id;
        Ok(default_name.to_owned())
    }

    /// The lexical-context contribution a node on the enclosure stack makes
    /// (§4.5) — the `<opKey>Context(type)` hook, looked up here by `op`
    /// rather than by a mangled method name (see the module doc on
    /// [`OpKey`]). Called once per `(op, node)` per distinct incoming
    /// context and memoized as `knownContexts`.
    ///
    /// The default contributes nothing, which is correct for any op key a
    /// target doesn't care to scope — e.g. a target with a single output
    /// file never needs to open a new scope from `namespaceContext`.
    #[allow(unused_variables)]
    fn context(
        &self,
        ctx: &mut EmitContext<'_, Self>,
        op: OpKey,
        id: TypeId,
    ) -> Result<ContextMap> {
        Ok(ContextMap::new())
    }

    /// The reference-context contribution a node on the enclosure stack
    /// makes (§4.5) — the `<opKey>ReferenceContext(type)` hook, skipped
    /// entirely for keys [`OpKey::has_reference_context`] reports exempt.
    #[allow(unused_variables)]
    fn reference_context(
        &self,
        ctx: &mut EmitContext<'_, Self>,
        op: OpKey,
        id: TypeId,
    ) -> Result<ContextMap> {
        Ok(ContextMap::new())
    }

    /// Renders a pointer to an already-emitted declaration (§4.7 step 4).
    /// `path_up` and `path_down` are the scope-diff halves between the
    /// scope the reference is being rendered from and `declaration`'s own
    /// scope, split at `common_scope` (§4.4) — enough for a target to
    /// compute a relative import path or a fully qualified name. The
    /// default renders nothing, matching the base class's trivial-recurse
    /// convention for every other hook.
    #[allow(unused_variables)]
    fn reference(
        &self,
        ctx: &mut EmitContext<'_, Self>,
        declaration: &Declaration<Self::Value>,
        path_up: &[ScopeId],
        path_down: &[ScopeId],
        common_scope: Option<ScopeId>,
    ) -> Result<EmitEntity<Self::Value>> {
        Ok(EmitEntity::NoEmit)
    }
}

/// The single async boundary in the engine: writing a completed source
/// file's rendered content to wherever the host wants it (§4.8). Kept
/// separate from [`UserEmitter`] because it's infrastructure, not emission
/// logic — a target rarely needs to override it.
pub trait Host {
    fn write_file(&self, path: &str, content: &str) -> impl std::future::Future<Output = Result<()>>;
}
