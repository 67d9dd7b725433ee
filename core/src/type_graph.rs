//! The input type graph.
//!
//! This module owns the immutable data model the framework traverses. A
//! real deployment receives this graph from a compiler front end; here it is
//! just an arena of [`Type`] nodes addressed by [`TypeId`], built once (via
//! [`ProgramBuilder`]) and never mutated again during emission.

use emitgraph_macros::NodeKind;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Arena key for a node in the type graph.
    pub struct TypeId;
}

/// A node in the type graph, tagged by [`TypeKind`] via `#[derive(NodeKind)]`.
#[derive(Debug, NodeKind)]
pub enum Type {
    Namespace(Namespace),
    Model(Model),
    ModelProperty(ModelProperty),
    Operation(Operation),
    Interface(Interface),
    Union(Union),
    UnionVariant(UnionVariant),
    Enum(Enum),
    EnumMember(EnumMember),
    Tuple(Tuple),
    Boolean(bool),
    StringLiteral(String),
    NumericLiteral(f64),
}

#[derive(Debug, Clone, Default)]
pub struct Namespace {
    pub name: String,
    pub parent: Option<TypeId>,
    pub namespaces: Vec<TypeId>,
    pub models: Vec<TypeId>,
    pub operations: Vec<TypeId>,
    pub enums: Vec<TypeId>,
    pub unions: Vec<TypeId>,
    pub interfaces: Vec<TypeId>,
    /// The compiler's own built-in namespace (e.g. `Cadl`/`TypeSpec`),
    /// skipped by [`crate::asset_emitter::AssetEmitter::emit_program`]
    /// unless `emit_builtin_namespace` is set.
    pub is_builtin: bool,
}

#[derive(Debug, Clone)]
pub struct Indexer {
    pub key: TypeId,
    pub value: TypeId,
}

#[derive(Debug, Clone, Default)]
pub struct Model {
    /// Empty for anonymous model expressions, `"Array"` for array
    /// instantiations.
    pub name: String,
    pub namespace: Option<TypeId>,
    /// Insertion-ordered property name -> `ModelProperty` node.
    pub properties: Vec<(String, TypeId)>,
    pub base_model: Option<TypeId>,
    pub indexer: Option<Indexer>,
    pub template_arguments: Vec<TypeId>,
    /// True for the uninstantiated generic declaration itself (e.g. `Page<T>`);
    /// such declarations are skipped by the program walk (§4.9) but may
    /// still be reached and emitted via a reference.
    pub is_template: bool,
    /// Set on a template instantiation, pointing back at the generic
    /// declaration it was produced from. Used to default a declaration
    /// name (§6).
    pub generic: Option<TypeId>,
    /// True for compiler intrinsics (`string`, `int32`, ...); dispatches to
    /// `modelScalar` rather than `modelDeclaration`.
    pub is_intrinsic: bool,
}

#[derive(Debug, Clone)]
pub struct ModelProperty {
    pub name: String,
    pub ty: TypeId,
    pub optional: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Operation {
    pub name: String,
    /// Set when this operation is nested within an `Interface`.
    pub interface: Option<TypeId>,
    pub namespace: Option<TypeId>,
    /// A `Model` node representing the parameter list.
    pub parameters: Option<TypeId>,
    pub return_type: Option<TypeId>,
}

#[derive(Debug, Clone, Default)]
pub struct Interface {
    pub name: String,
    pub namespace: Option<TypeId>,
    pub operations: Vec<TypeId>,
}

#[derive(Debug, Clone, Default)]
pub struct Union {
    /// Empty for anonymous union expressions.
    pub name: String,
    pub namespace: Option<TypeId>,
    pub variants: Vec<TypeId>,
    pub template_arguments: Vec<TypeId>,
    pub is_template: bool,
    pub generic: Option<TypeId>,
}

#[derive(Debug, Clone)]
pub struct UnionVariant {
    pub name: Option<String>,
    pub ty: TypeId,
}

#[derive(Debug, Clone, Default)]
pub struct Enum {
    pub name: String,
    pub namespace: Option<TypeId>,
    pub members: Vec<TypeId>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnumMemberValue {
    Str(&'static str),
    Num(f64),
}

#[derive(Debug, Clone)]
pub struct EnumMember {
    pub name: String,
    pub value: Option<EnumMemberValue>,
}

#[derive(Debug, Clone, Default)]
pub struct Tuple {
    pub values: Vec<TypeId>,
}

/// The type graph for one run, plus the arena it was built in.
#[derive(Debug)]
pub struct Program {
    types: SlotMap<TypeId, Type>,
    pub global_namespace: TypeId,
}

impl Program {
    #[must_use]
    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id]
    }

    /// The namespace a declarative node belongs to, following an operation
    /// nested in an interface through to the interface's namespace.
    #[must_use]
    pub fn namespace_of(&self, id: TypeId) -> Option<TypeId> {
        match self.get(id) {
            Type::Model(m) => m.namespace,
            Type::Interface(i) => i.namespace,
            Type::Enum(e) => e.namespace,
            Type::Union(u) => u.namespace,
            Type::Operation(o) => o
                .namespace
                .or_else(|| o.interface.and_then(|i| self.namespace_of(i))),
            Type::Namespace(n) => n.parent,
            _ => None,
        }
    }

    /// The chain of non-empty enclosing namespaces, outermost first, used
    /// to reset the enclosure stack when a declaration is entered (§4.5).
    #[must_use]
    pub fn namespace_chain(&self, id: TypeId) -> Vec<TypeId> {
        let mut chain = Vec::new();
        let mut current = self.namespace_of(id);
        while let Some(ns_id) = current {
            let Type::Namespace(ns) = self.get(ns_id) else {
                break;
            };
            if !ns.name.is_empty() {
                chain.push(ns_id);
            }
            current = ns.parent;
        }
        chain.reverse();
        chain
    }

    /// Whether `id` is a declaration per §4.5: named model/union, interface,
    /// enum, operation, or namespace.
    #[must_use]
    pub fn is_declaration(&self, id: TypeId) -> bool {
        match self.get(id) {
            Type::Namespace(_) | Type::Interface(_) | Type::Enum(_) | Type::Operation(_) => true,
            Type::Model(m) => !m.name.is_empty(),
            Type::Union(u) => !u.name.is_empty(),
            _ => false,
        }
    }

    /// Whether `id` is an uninstantiated generic declaration, skipped by
    /// the program walk (§4.9).
    #[must_use]
    pub fn is_template_declaration(&self, id: TypeId) -> bool {
        match self.get(id) {
            Type::Model(m) => m.is_template,
            Type::Union(u) => u.is_template,
            _ => false,
        }
    }
}

/// Builds a [`Program`] by inserting nodes into the arena and wiring up
/// parent/child links. The compiler front end this framework assumes would
/// construct a `Program` this way; tests and fixtures do the same.
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    types: SlotMap<TypeId, Type>,
}

impl ProgramBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ty: Type) -> TypeId {
        self.types.insert(ty)
    }

    pub fn get_mut(&mut self, id: TypeId) -> &mut Type {
        &mut self.types[id]
    }

    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id]
    }

    #[must_use]
    pub fn build(self, global_namespace: TypeId) -> Program {
        Program {
            types: self.types,
            global_namespace,
        }
    }
}
