//! The dispatcher: walks a [`Program`], routes every node to the matching
//! [`UserEmitter`] method, folds context, memoizes by [`MemoKey`], and
//! breaks reference cycles with [`Placeholder`]s (§4.6–§4.9).

use std::collections::{HashMap, HashSet};

use snafu::OptionExt;
use tracing::instrument;

use crate::context::{Context, ContextInterner, ContextMap, ContextValue, InternedContext};
use crate::emitter::UserEmitter;
use crate::error::{DoubleDeferralCtx, EmitError, InvalidTemplateArgumentCtx, ScopeAbsentCtx};
use crate::keyed_map::KeyedMap;
use crate::op_key::OpKey;
use crate::placeholder::Placeholder;
use crate::result::{Declaration, EmitEntity, MemoKey, Rendered};
use crate::scope::{Scope, ScopeGraph, ScopeId};
use crate::type_graph::{Enum, Interface, Model, Operation, Program, Tuple, Type, TypeId, Union};

type Result<T> = std::result::Result<T, EmitError>;

/// Top-level knobs for one emit run (§4.9).
#[derive(Debug, Clone, Copy, Default)]
pub struct EmitProgramOptions {
    /// Whether the compiler's synthetic global namespace gets its own
    /// `namespace()` call, rather than just having its children walked.
    pub emit_global_namespace: bool,
    /// Whether a namespace the front end marked `is_builtin` (e.g. a
    /// `Cadl`/`TypeSpec` standard library namespace) is walked at all.
    pub emit_builtin_namespace: bool,
}

/// Mutable bookkeeping for one run: the scope forest, the folded-context
/// machinery (§4.5), the memo table, and the cycle-resolution waiter lists.
/// Split out of [`AssetEmitter`] so an [`EmitContext`] can borrow it
/// independently of the (immutably shared) [`UserEmitter`] and the
/// (immutable) [`Program`].
struct EngineState<V> {
    scopes: ScopeGraph,
    context_interner: ContextInterner,
    /// The enclosure stack for whichever node is currently being dispatched
    /// (§4.5) — reset on a declaration, extended on anything else.
    enclosure_stack: Vec<TypeId>,
    /// The folded `(lexical, reference)` state for the node currently being
    /// dispatched; what gets captured into the next `MemoKey` and exposed
    /// via `EmitContext::current_scope`.
    current_context: Context,
    /// `knownContexts`: memoizes one enclosure-stack fold step, keyed by
    /// `(entry, inputContext)` (§4.5).
    known_contexts: HashMap<(TypeId, Context), Context>,
    /// The program context, computed once on first use (§4.5).
    program_context: Option<Context>,
    /// The "incoming reference context" captured by `emitTypeReference`,
    /// consumed the moment the fold reaches the enclosure entry equal to
    /// the type being referenced (§4.5).
    incoming_reference: Option<(TypeId, ContextMap)>,
    /// The root scope created by `emitProgram`, seeding the program context
    /// with a default `scope` entry.
    program_root_scope: Option<ScopeId>,
    /// An explicit scope override set by [`EmitContext::with_scope`],
    /// checked ahead of whatever the folded context derived (§4.4
    /// convenience — outside the strict context-fold model but needed for
    /// a target to temporarily redirect where nested content files without
    /// a full context-fold round trip).
    scope_override: Option<ScopeId>,
    memo: KeyedMap<V>,
    in_progress: HashSet<MemoKey>,
    /// `waitingCircularRefs`, restricted to the one caller that actually
    /// produces them — [`EmitContext::emit_type_reference`] (§4.7 step 3).
    /// Each waiter is resolved by running step 4 against the real
    /// declaration once dispatch for the key completes, not by handing back
    /// the declaration's own raw value.
    reference_waiters: HashMap<MemoKey, Vec<ReferenceWaiter<V>>>,
    declarations: Vec<Declaration<V>>,
}

impl<V> Default for EngineState<V> {
    fn default() -> Self {
        Self {
            scopes: ScopeGraph::new(),
            context_interner: ContextInterner::new(),
            enclosure_stack: Vec::new(),
            current_context: Context::blank(),
            known_contexts: HashMap::new(),
            program_context: None,
            incoming_reference: None,
            program_root_scope: None,
            scope_override: None,
            memo: KeyedMap::new(),
            in_progress: HashSet::new(),
            reference_waiters: HashMap::new(),
            declarations: Vec::new(),
        }
    }
}

/// One `emitTypeReference` call stalled behind a cycle still being
/// dispatched further up the call stack (§4.7 step 3): the scope it was
/// called from (needed to compute the scope diff once the real declaration
/// is known) and the placeholder handed back to that caller.
struct ReferenceWaiter<V> {
    from_scope: Option<ScopeId>,
    placeholder: Placeholder<V>,
}

/// Resolves which [`OpKey`] a node dispatches to (§3). Almost every kind
/// dispatches to the same key whether visited directly or reached by
/// reference — `ModelProperty` is the one spec-named exception, handled
/// separately in [`EmitContext::emit_type_reference`] rather than here
/// (§4.7 step 1).
fn resolve_op_key(program: &Program, id: TypeId) -> Result<OpKey> {
    Ok(match program.get(id) {
        Type::Namespace(_) => OpKey::Namespace,
        Type::Model(m) => {
            if m.is_intrinsic {
                OpKey::ModelScalar
            } else if m.name.is_empty() || m.name == "Array" {
                OpKey::ModelLiteral
            } else if !m.template_arguments.is_empty() || m.generic.is_some() {
                OpKey::ModelInstantiation
            } else {
                OpKey::ModelDeclaration
            }
        }
        Type::ModelProperty(_) => OpKey::ModelPropertyLiteral,
        Type::Operation(operation) => {
            if operation.interface.is_some() {
                OpKey::InterfaceOperationDeclaration
            } else {
                OpKey::OperationDeclaration
            }
        }
        Type::Interface(_) => OpKey::InterfaceDeclaration,
        Type::Union(u) => {
            if u.name.is_empty() {
                OpKey::UnionLiteral
            } else if !u.template_arguments.is_empty() || u.generic.is_some() {
                OpKey::UnionInstantiation
            } else {
                OpKey::UnionDeclaration
            }
        }
        Type::UnionVariant(_) => OpKey::UnionVariant,
        Type::Enum(_) => OpKey::EnumDeclaration,
        Type::EnumMember(_) => OpKey::EnumMember,
        Type::Tuple(_) => OpKey::TupleLiteral,
        Type::Boolean(_) => OpKey::BooleanLiteral,
        Type::StringLiteral(_) => OpKey::StringLiteral,
        Type::NumericLiteral(_) => OpKey::NumericLiteral,
    })
}

/// The dispatcher and its caches, parameterized over one target.
pub struct AssetEmitter<E: UserEmitter> {
    program: Program,
    state: EngineState<E::Value>,
    user: E,
    options: EmitProgramOptions,
}

/// The view into an in-flight run that [`UserEmitter`] methods operate
/// through: recursive dispatch, scope/context manipulation, and the
/// structural-child helpers the default method bodies call.
pub struct EmitContext<'a, E: UserEmitter> {
    program: &'a Program,
    state: &'a mut EngineState<E::Value>,
    user: &'a E,
    options: &'a EmitProgramOptions,
}

impl<E: UserEmitter> AssetEmitter<E> {
    #[must_use]
    pub fn new(program: Program, user: E, options: EmitProgramOptions) -> Self {
        Self {
            program,
            state: EngineState::default(),
            user,
            options,
        }
    }

    fn ctx(&mut self) -> EmitContext<'_, E> {
        EmitContext {
            program: &self.program,
            state: &mut self.state,
            user: &self.user,
            options: &self.options,
        }
    }

    /// Runs the program operation and walks every declaration reachable
    /// from the global namespace (§4.9). Returns the `program()` result;
    /// individual declarations are filed into scope as a side effect and
    /// collected for [`Self::write_output`].
    #[instrument(skip(self))]
    pub fn emit_program(&mut self) -> Result<EmitEntity<E::Value>> {
        let root = self.state.scopes.create_source_file("output");
        self.state.program_root_scope = Some(root);
        let global = self.program.global_namespace;
        tracing::debug!("walking global namespace");
        let result = {
            let mut ctx = self.ctx();
            let base = ctx.program_context()?;
            ctx.state.current_context = base;
            let user = ctx.user;
            user.program(&mut ctx)?
        };
        if self.options.emit_global_namespace {
            // §4.9: emit the global namespace as a single type and return —
            // no separate structural walk of its children.
            self.ctx().emit_type(global)?;
        } else {
            self.walk_namespace(global, true)?;
        }
        tracing::debug!(
            declarations = self.state.declarations.len(),
            "program walk complete"
        );
        Ok(result)
    }

    /// Visits a namespace's children before its own declarations, matching
    /// §4.9's order: child namespaces, models, operations, enums, unions,
    /// interfaces.
    fn walk_namespace(&mut self, ns_id: TypeId, is_root: bool) -> Result<()> {
        let Type::Namespace(ns) = self.program.get(ns_id) else {
            return Ok(());
        };
        if ns.is_builtin && !self.options.emit_builtin_namespace {
            return Ok(());
        }
        let children = ns.namespaces.clone();
        let models = ns.models.clone();
        let operations = ns.operations.clone();
        let enums = ns.enums.clone();
        let unions = ns.unions.clone();
        let interfaces = ns.interfaces.clone();

        if !is_root {
            self.ctx().emit_type(ns_id)?;
        }
        for child in children {
            self.walk_namespace(child, false)?;
        }
        for model in models {
            if !self.program.is_template_declaration(model) {
                self.ctx().emit_type(model)?;
            }
        }
        for operation in operations {
            self.ctx().emit_type(operation)?;
        }
        for enum_ in enums {
            self.ctx().emit_type(enum_)?;
        }
        for union in unions {
            if !self.program.is_template_declaration(union) {
                self.ctx().emit_type(union)?;
            }
        }
        for interface in interfaces {
            self.ctx().emit_type(interface)?;
        }
        Ok(())
    }

    /// Writes every source file that accumulated at least one declaration
    /// (§4.8), via the single async boundary [`crate::emitter::Host`].
    #[instrument(skip(self, host))]
    pub async fn write_output<H: crate::emitter::Host>(&self, host: &H) -> Result<()> {
        for (file_scope, source_file) in self.state.scopes.source_files() {
            let declarations: Vec<Declaration<E::Value>> = self
                .state
                .declarations
                .iter()
                .filter(|decl| {
                    self.state
                        .scopes
                        .path_to_root(decl.scope)
                        .last()
                        .copied()
                        == Some(file_scope)
                })
                .cloned()
                .collect();
            if declarations.is_empty() {
                continue;
            }
            tracing::debug!(path = %source_file.path, count = declarations.len(), "writing source file");
            let content = self.user.render_source_file(&declarations);
            host.write_file(&source_file.path, &content).await?;
        }
        Ok(())
    }

    #[must_use]
    pub fn program(&self) -> &Program {
        &self.program
    }
}

impl<'a, E: UserEmitter> EmitContext<'a, E> {
    fn reborrow(&mut self) -> EmitContext<'_, E> {
        EmitContext {
            program: self.program,
            state: self.state,
            user: self.user,
            options: self.options,
        }
    }

    fn intern_context(&mut self, map: ContextMap) -> InternedContext {
        self.state.context_interner.intern(map)
    }

    /// The program context, computed lazily once per run by folding in
    /// whatever `program()`'s `<opKey>Context` hook contributes on top of a
    /// base map seeded with the root source-file scope (§4.5).
    fn program_context(&mut self) -> Result<Context> {
        if let Some(ctx) = self.state.program_context.clone() {
            return Ok(ctx);
        }
        let base = match self.state.program_root_scope {
            Some(scope) => ContextMap::new().with("scope", scope),
            None => ContextMap::new(),
        };
        let global = self.program.global_namespace;
        let user = self.user;
        let contrib = user.context(self, OpKey::Program, global)?;
        let lexical = self.intern_context(base.overlay(&contrib));
        let reference = self.intern_context(ContextMap::new());
        let ctx = Context { lexical, reference };
        self.state.program_context = Some(ctx.clone());
        Ok(ctx)
    }

    /// Folds one enclosure-stack entry on top of `state`, consulting and
    /// populating `knownContexts`, and merging in the incoming reference
    /// context the moment `entry` is the type a reference is resolving to
    /// (§4.5). The merge happens after the memo lookup so it never pollutes
    /// the cached fold for plain (non-reference) traversal of the same
    /// entry.
    fn fold_entry(&mut self, entry: TypeId, state: Context) -> Result<Context> {
        let key = (entry, state.clone());
        let folded = if let Some(cached) = self.state.known_contexts.get(&key) {
            cached.clone()
        } else {
            let op = resolve_op_key(self.program, entry)?;
            let user = self.user;
            let lex_contrib = user.context(self, op, entry)?;
            let ref_contrib = if op.has_reference_context() {
                let user = self.user;
                user.reference_context(self, op, entry)?
            } else {
                ContextMap::new()
            };
            let new_lexical = self.intern_context(key.1.lexical.overlay(&lex_contrib));
            let new_reference = self.intern_context(key.1.reference.overlay(&ref_contrib));
            let folded = Context {
                lexical: new_lexical,
                reference: new_reference,
            };
            self.state.known_contexts.insert(key, folded.clone());
            folded
        };

        if let Some((target, incoming)) = self.state.incoming_reference.take() {
            if target == entry {
                let merged_reference = self.intern_context(folded.reference.overlay(&incoming));
                return Ok(Context {
                    lexical: folded.lexical,
                    reference: merged_reference,
                });
            }
            self.state.incoming_reference = Some((target, incoming));
        }
        Ok(folded)
    }

    /// Builds the enclosure stack for `id` (§4.5) and folds it on top of
    /// the program context, returning the previous stack/context so the
    /// caller can restore them once dispatch for `id` completes.
    fn enter_context(&mut self, id: TypeId) -> Result<(Vec<TypeId>, Context)> {
        let previous_stack = self.state.enclosure_stack.clone();
        let previous_context = self.state.current_context.clone();

        let stack = if self.program.is_declaration(id) {
            let mut stack = self.program.namespace_chain(id);
            stack.push(id);
            stack
        } else {
            let mut stack = previous_stack.clone();
            stack.push(id);
            stack
        };

        let mut folded = self.program_context()?;
        for &entry in &stack {
            folded = self.fold_entry(entry, folded)?;
        }
        self.state.enclosure_stack = stack;
        self.state.current_context = folded;
        Ok((previous_stack, previous_context))
    }

    fn restore_context(&mut self, stack: Vec<TypeId>, context: Context) {
        self.state.enclosure_stack = stack;
        self.state.current_context = context;
    }

    /// Dispatches `id`, memoizing by `(op, id, context)` and returning
    /// [`EmitEntity::Circular`] if this exact key is already being computed
    /// further up the call stack (§4.6).
    pub fn emit_type(&mut self, id: TypeId) -> Result<EmitEntity<E::Value>> {
        let op = resolve_op_key(self.program, id)?;
        Ok(self.emit_with_op(op, id)?.1)
    }

    /// Dispatches `id` as a reference from elsewhere (§4.7): captures the
    /// current reference context as the "incoming" context for `id`'s own
    /// fold, dispatches (the same op key as direct emission, except
    /// `ModelProperty` which routes to `modelPropertyReference`), and, if
    /// the result is a `Declaration`, renders a pointer to it via
    /// [`UserEmitter::reference`] using the scope diff between here and
    /// there (§4.4, §4.7 step 4).
    ///
    /// If dispatch instead reports `id`'s own emission is already in
    /// progress further up the stack (a cycle), a fresh placeholder is
    /// returned immediately and registered as a waiter on `id`'s memo key:
    /// once the enclosing dispatch actually finishes, the waiter runs step
    /// 4 itself — scope diff plus [`UserEmitter::reference`] — against the
    /// *resolved* declaration, and the placeholder is filled with that
    /// reference's rendering, not with the declaration's own raw value
    /// (§8 invariant: "every reference that encountered a circular marker
    /// is filled with the eventual declaration's rendered reference value").
    pub fn emit_type_reference(&mut self, id: TypeId) -> Result<EmitEntity<E::Value>> {
        if let Type::ModelProperty(_) = self.program.get(id) {
            return Ok(self.emit_with_op(OpKey::ModelPropertyReference, id)?.1);
        }

        let incoming = (*self.state.current_context.reference).clone();
        self.state.incoming_reference = Some((id, incoming));
        let op = resolve_op_key(self.program, id)?;
        let (key, entity) = self.emit_with_op(op, id)?;
        // Defensive: if the fold never reached `id` (shouldn't happen —
        // `id` is always the last entry of its own enclosure stack) don't
        // leak the capture into the next reference.
        self.state.incoming_reference = None;

        if matches!(entity, EmitEntity::Circular(_)) {
            let from_scope = self.current_scope();
            let placeholder = Placeholder::new();
            self.state
                .reference_waiters
                .entry(key)
                .or_default()
                .push(ReferenceWaiter {
                    from_scope,
                    placeholder: placeholder.clone(),
                });
            return Ok(EmitEntity::Raw(Rendered::Placeholder(placeholder)));
        }

        self.finish_reference(id, entity)
    }

    fn finish_reference(
        &mut self,
        id: TypeId,
        entity: EmitEntity<E::Value>,
    ) -> Result<EmitEntity<E::Value>> {
        let EmitEntity::Declaration(declaration) = entity else {
            return Ok(entity);
        };
        let from_scope = self.current_scope();
        self.render_reference(id, from_scope, &declaration)
    }

    /// Computes the scope diff between `from_scope` and `declaration`'s own
    /// scope and calls [`UserEmitter::reference`] (§4.4, §4.7 step 4).
    /// Shared by the synchronous path ([`Self::finish_reference`]) and the
    /// deferred-waiter drain in [`Self::emit_with_op`].
    fn render_reference(
        &mut self,
        id: TypeId,
        from_scope: Option<ScopeId>,
        declaration: &Declaration<E::Value>,
    ) -> Result<EmitEntity<E::Value>> {
        let (path_up, path_down, common) = match from_scope {
            Some(from) => self.state.scopes.scope_diff(from, declaration.scope),
            None => (
                Vec::new(),
                self.state
                    .scopes
                    .path_to_root(declaration.scope)
                    .into_iter()
                    .rev()
                    .collect(),
                None,
            ),
        };
        let user = self.user;
        let rendered = user.reference(self, declaration, &path_up, &path_down, common)?;
        if matches!(
            rendered.rendered(),
            Some(Rendered::Placeholder(ref p)) if !p.is_resolved()
        ) {
            return DoubleDeferralCtx { node: id }.fail();
        }
        Ok(rendered)
    }

    fn emit_with_op(&mut self, op: OpKey, id: TypeId) -> Result<(MemoKey, EmitEntity<E::Value>)> {
        let (previous_stack, previous_context) = self.enter_context(id)?;
        let context = self.state.current_context.clone();
        let key = MemoKey::new(op, id, context);

        if let Some(entity) = self.state.memo.get(&key) {
            tracing::trace!(%op, ?id, "memo hit");
            self.restore_context(previous_stack, previous_context);
            return Ok((key, entity));
        }
        if self.state.in_progress.contains(&key) {
            tracing::debug!(%op, ?id, "cycle detected, returning circular marker");
            self.restore_context(previous_stack, previous_context);
            return Ok((key, EmitEntity::Circular(id)));
        }

        self.state.in_progress.insert(key.clone());
        // The declaration-producing wrap (§4.6 step 6, "append it to its
        // scope's declarations list") must see the scope active *during*
        // id's own dispatch, so it runs before the context frame is
        // restored, not after.
        let outcome: Result<EmitEntity<E::Value>> = (|| {
            let raw = self.dispatch(op, id)?;
            self.finalize_declaration(op, id, raw)
        })();
        self.state.in_progress.remove(&key);
        self.restore_context(previous_stack, previous_context);
        let entity = outcome?;

        if let Some(waiters) = self.state.reference_waiters.remove(&key) {
            for waiter in waiters {
                let resolved = match &entity {
                    EmitEntity::Declaration(declaration) => self
                        .render_reference(id, waiter.from_scope, declaration)?
                        .rendered()
                        .and_then(|rendered| rendered.value()),
                    other => other.rendered().and_then(|rendered| rendered.value()),
                };
                // `None` here means the target resolved to `NoEmit` (§9 open
                // question: no generic "empty of V" exists to fill the
                // placeholder with) — left unresolved rather than guessed at.
                if let Some(value) = resolved {
                    waiter.placeholder.resolve(value)?;
                }
            }
        }

        self.state.memo.insert(key.clone(), entity.clone());
        Ok((key, entity))
    }

    fn dispatch(&mut self, op: OpKey, id: TypeId) -> Result<EmitEntity<E::Value>> {
        let user = self.user;
        match (op, self.program.get(id)) {
            (OpKey::Namespace, Type::Namespace(n)) => user.namespace(self, id, &n.name),
            (OpKey::ModelDeclaration, Type::Model(m)) => user.model_declaration(self, id, m),
            (OpKey::ModelLiteral, Type::Model(m)) => user.model_literal(self, id, m),
            (OpKey::ModelInstantiation, Type::Model(m)) => user.model_instantiation(self, id, m),
            (OpKey::ModelScalar, Type::Model(m)) => user.model_scalar(self, id, m),
            (OpKey::ModelPropertyLiteral, Type::ModelProperty(p)) => {
                user.model_property(self, id, p)
            }
            (OpKey::ModelPropertyReference, Type::ModelProperty(p)) => {
                user.model_property_reference(self, id, p)
            }
            (OpKey::OperationDeclaration, Type::Operation(o)) => {
                user.operation_declaration(self, id, o)
            }
            (OpKey::InterfaceOperationDeclaration, Type::Operation(o)) => {
                user.interface_operation_declaration(self, id, o)
            }
            (OpKey::InterfaceDeclaration, Type::Interface(i)) => {
                user.interface_declaration(self, id, i)
            }
            (OpKey::UnionDeclaration, Type::Union(u)) => user.union_declaration(self, id, u),
            (OpKey::UnionLiteral, Type::Union(u)) => user.union_literal(self, id, u),
            (OpKey::UnionInstantiation, Type::Union(u)) => user.union_instantiation(self, id, u),
            (OpKey::UnionVariant, Type::UnionVariant(v)) => user.union_variant(self, id, v),
            (OpKey::EnumDeclaration, Type::Enum(e)) => user.enum_declaration(self, id, e),
            (OpKey::EnumMember, Type::EnumMember(m)) => user.enum_member(self, id, m),
            (OpKey::TupleLiteral, Type::Tuple(t)) => user.tuple_literal(self, id, t),
            (OpKey::BooleanLiteral, Type::Boolean(b)) => user.boolean_literal(self, *b),
            (OpKey::StringLiteral, Type::StringLiteral(s)) => user.string_literal(self, s),
            (OpKey::NumericLiteral, Type::NumericLiteral(n)) => user.numeric_literal(self, *n),
            _ => crate::error::UnsupportedKindCtx { node: id }.fail(),
        }
    }

    fn default_declaration_name(&self, id: TypeId) -> Result<String> {
        match self.program.get(id) {
            Type::Model(m) if !m.name.is_empty() => Ok(m.name.clone()),
            Type::Model(m) => {
                self.synthesize_instantiation_name(id, m.generic, &m.template_arguments)
            }
            Type::Union(u) if !u.name.is_empty() => Ok(u.name.clone()),
            Type::Union(u) => {
                self.synthesize_instantiation_name(id, u.generic, &u.template_arguments)
            }
            Type::Interface(i) => Ok(i.name.clone()),
            Type::Enum(e) => Ok(e.name.clone()),
            Type::Operation(o) => Ok(o.name.clone()),
            Type::Namespace(n) => Ok(n.name.clone()),
            _ => Ok(String::new()),
        }
    }

    /// Synthesizes `Generic_Arg1_Arg2`-style names for template
    /// instantiations that the front end didn't already name (§6). Every
    /// argument must itself be a named model; an anonymous or literal
    /// argument can't contribute a name fragment (§7 kind 7).
    fn synthesize_instantiation_name(
        &self,
        id: TypeId,
        generic: Option<TypeId>,
        arguments: &[TypeId],
    ) -> Result<String> {
        let mut name = generic
            .and_then(|g| match self.program.get(g) {
                Type::Model(m) => Some(m.name.clone()),
                Type::Union(u) => Some(u.name.clone()),
                _ => None,
            })
            .unwrap_or_default();
        for argument in arguments {
            match self.program.get(*argument) {
                Type::Model(m) if !m.name.is_empty() => name.push_str(&m.name),
                _ => return InvalidTemplateArgumentCtx { node: id }.fail(),
            }
        }
        Ok(name)
    }

    /// Wraps a raw result into a [`Declaration`] for op keys that produce
    /// one, naming and filing it into the current scope (§4.6). Results
    /// that are already `Declaration`, `NoEmit`, or still `Circular` pass
    /// through untouched — only a fresh `Raw` result from a
    /// declaration-producing op key gets wrapped.
    fn finalize_declaration(
        &mut self,
        op: OpKey,
        id: TypeId,
        raw: EmitEntity<E::Value>,
    ) -> Result<EmitEntity<E::Value>> {
        if !op.produces_declaration() {
            return Ok(raw);
        }
        let EmitEntity::Raw(rendered) = raw else {
            return Ok(raw);
        };
        let default_name = self.default_declaration_name(id)?;
        let scope = self.current_scope().context(ScopeAbsentCtx {
            name: default_name.clone(),
        })?;
        let user = self.user;
        let name = user.declaration_name(self, id, &default_name)?;
        let declaration = Declaration::new(name, scope, rendered);
        self.state.declarations.push(declaration.clone());
        Ok(EmitEntity::Declaration(declaration))
    }

    pub fn emit_model_properties(
        &mut self,
        _id: TypeId,
        model: &Model,
    ) -> Result<Vec<(String, EmitEntity<E::Value>)>> {
        let mut out = Vec::with_capacity(model.properties.len());
        for (name, property_id) in &model.properties {
            let entity = self.reborrow().emit_type(*property_id)?;
            out.push((name.clone(), entity));
        }
        Ok(out)
    }

    /// Emits one already-resolved property id directly, bypassing the
    /// model-level loop — the single-item counterpart to
    /// [`Self::emit_model_properties`] exposed on the external surface
    /// (§6) for a target that wants to emit a property out of its usual
    /// position (e.g. hoisting one to the top of a rendered object).
    pub fn emit_model_property(&mut self, property_id: TypeId) -> Result<EmitEntity<E::Value>> {
        self.emit_type(property_id)
    }

    pub fn emit_operation_parameters(
        &mut self,
        _id: TypeId,
        operation: &Operation,
    ) -> Result<EmitEntity<E::Value>> {
        let Some(parameters_id) = operation.parameters else {
            return Ok(EmitEntity::NoEmit);
        };
        self.emit_type_reference(parameters_id)
    }

    pub fn emit_operation_return_type(
        &mut self,
        _id: TypeId,
        operation: &Operation,
    ) -> Result<EmitEntity<E::Value>> {
        let Some(return_type) = operation.return_type else {
            return Ok(EmitEntity::NoEmit);
        };
        self.emit_type_reference(return_type)
    }

    pub fn emit_interface_operations(
        &mut self,
        _id: TypeId,
        interface: &Interface,
    ) -> Result<Vec<(String, EmitEntity<E::Value>)>> {
        let mut out = Vec::with_capacity(interface.operations.len());
        for operation_id in &interface.operations {
            let Type::Operation(operation) = self.program.get(*operation_id) else {
                continue;
            };
            let name = operation.name.clone();
            let entity = self.reborrow().emit_type(*operation_id)?;
            out.push((name, entity));
        }
        Ok(out)
    }

    /// The single-item counterpart to [`Self::emit_interface_operations`]
    /// (§6), for a target that wants to emit one interface operation
    /// outside the default member loop.
    pub fn emit_interface_operation(&mut self, operation_id: TypeId) -> Result<EmitEntity<E::Value>> {
        self.emit_type(operation_id)
    }

    pub fn emit_union_variants(
        &mut self,
        _id: TypeId,
        union: &Union,
    ) -> Result<Vec<(String, EmitEntity<E::Value>)>> {
        let mut out = Vec::with_capacity(union.variants.len());
        for (index, variant_id) in union.variants.iter().enumerate() {
            let Type::UnionVariant(variant) = self.program.get(*variant_id) else {
                continue;
            };
            let key = variant.name.clone().unwrap_or_else(|| index.to_string());
            let entity = self.reborrow().emit_type(*variant_id)?;
            out.push((key, entity));
        }
        Ok(out)
    }

    pub fn emit_enum_members(
        &mut self,
        _id: TypeId,
        enum_: &Enum,
    ) -> Result<Vec<(String, EmitEntity<E::Value>)>> {
        let mut out = Vec::with_capacity(enum_.members.len());
        for member_id in &enum_.members {
            let Type::EnumMember(member) = self.program.get(*member_id) else {
                continue;
            };
            let name = member.name.clone();
            let entity = self.reborrow().emit_type(*member_id)?;
            out.push((name, entity));
        }
        Ok(out)
    }

    pub fn emit_tuple_literal_values(
        &mut self,
        _id: TypeId,
        tuple: &Tuple,
    ) -> Result<Vec<EmitEntity<E::Value>>> {
        tuple
            .values
            .iter()
            .map(|value_id| self.reborrow().emit_type_reference(*value_id))
            .collect()
    }

    #[must_use]
    pub fn program(&self) -> &Program {
        self.program
    }

    /// The scope a declaration produced right now would be filed into: an
    /// explicit [`Self::with_scope`] override if one is active, else
    /// whatever the folded context derived (§4.5).
    #[must_use]
    pub fn current_scope(&self) -> Option<ScopeId> {
        self.state
            .scope_override
            .or_else(|| self.state.current_context.scope())
    }

    /// Reads one entry out of the currently folded context (§4.5),
    /// preferring the reference half over the lexical half — the same
    /// priority [`Context::scope`] uses, generalized to any key a
    /// `<opKey>Context`/`ReferenceContext` hook contributed.
    #[must_use]
    pub fn context_value(&self, key: &str) -> Option<ContextValue> {
        self.state
            .current_context
            .reference
            .get(key)
            .or_else(|| self.state.current_context.lexical.get(key))
            .cloned()
    }

    /// Temporarily overrides the current scope for the duration of `body`,
    /// restoring whatever was active afterward regardless of how `body`
    /// returns.
    pub fn with_scope<R>(&mut self, scope: ScopeId, body: impl FnOnce(&mut Self) -> R) -> R {
        let previous = self.state.scope_override;
        self.state.scope_override = Some(scope);
        let result = body(self);
        self.state.scope_override = previous;
        result
    }

    pub fn create_scope(
        &mut self,
        block: Option<TypeId>,
        name: impl Into<String>,
    ) -> Result<ScopeId> {
        let name = name.into();
        let parent = self
            .current_scope()
            .context(ScopeAbsentCtx { name: name.clone() })?;
        self.state.scopes.create_scope(block, name, parent)
    }

    #[must_use]
    pub fn scope(&self, id: ScopeId) -> Option<&Scope> {
        self.state.scopes.get(id)
    }
}
