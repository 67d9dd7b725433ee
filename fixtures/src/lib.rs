#![cfg_attr(all(doc, CHANNEL_NIGHTLY), feature(doc_auto_cfg))]
#![cfg_attr(doc_cfg, feature(doc_cfg))]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::missing_errors_doc
)]
//! Sample type graphs and a reference JSON-ish emitter, shared by
//! `emitgraph-core`'s integration tests and anyone prototyping a new
//! target against a known-good graph.

use emitgraph_core::builder::ObjectBuilder;
use emitgraph_core::type_graph::{
    Enum, EnumMember, Model, ModelProperty, Namespace, Operation, ProgramBuilder, Type, TypeId,
};
use emitgraph_core::{
    AssetEmitter, ContextMap, Declaration, EmitContext, EmitEntity, EmitProgramOptions, OpKey,
    Placeholder, Program, Rendered, ScopeId, UserEmitter,
};
use serde_json::{Map, Value};

/// Turns an `ObjectBuilder`'s collected `(name, value)` pairs into a JSON
/// object, staying behind a placeholder if any property is still deferred
/// (e.g. the back-edge of a reference cycle) rather than dropping it.
fn object_from_pairs(pairs: Rendered<Vec<(String, Value)>>) -> Rendered<Value> {
    match pairs {
        Rendered::Value(pairs) => Rendered::Value(Value::Object(pairs.into_iter().collect())),
        Rendered::Placeholder(pending) => {
            let resolved = Placeholder::new();
            let forward = resolved.clone();
            pending.on_resolve(move |pairs: &Vec<(String, Value)>| {
                let object: Map<String, Value> = pairs.clone().into_iter().collect();
                let _ = forward.resolve(Value::Object(object));
            });
            Rendered::Placeholder(resolved)
        }
    }
}

/// Two models that reference each other through a property — the minimal
/// reference cycle a target's `modelReference` has to break with a
/// placeholder.
#[must_use]
pub fn two_model_cycle() -> (Program, TypeId, TypeId) {
    let mut builder = ProgramBuilder::new();
    let global = builder.insert(Type::Namespace(Namespace::default()));

    let a = builder.insert(Type::Model(Model {
        name: "A".into(),
        namespace: Some(global),
        ..Model::default()
    }));
    let b = builder.insert(Type::Model(Model {
        name: "B".into(),
        namespace: Some(global),
        ..Model::default()
    }));

    let a_to_b = builder.insert(Type::ModelProperty(ModelProperty {
        name: "b".into(),
        ty: b,
        optional: false,
    }));
    let b_to_a = builder.insert(Type::ModelProperty(ModelProperty {
        name: "a".into(),
        ty: a,
        optional: false,
    }));

    if let Type::Model(m) = builder.get_mut(a) {
        m.properties.push(("b".into(), a_to_b));
    }
    if let Type::Model(m) = builder.get_mut(b) {
        m.properties.push(("a".into(), b_to_a));
    }
    if let Type::Namespace(n) = builder.get_mut(global) {
        n.models.push(a);
        n.models.push(b);
    }

    (builder.build(global), a, b)
}

/// Three models where the third shares a reference already held by the
/// first, exercising memoization alongside cycle resolution: `C` should be
/// emitted once and reused, not recomputed for each incoming edge.
#[must_use]
pub fn three_type_cycle_with_shared_reference() -> (Program, TypeId, TypeId, TypeId) {
    let mut builder = ProgramBuilder::new();
    let global = builder.insert(Type::Namespace(Namespace::default()));

    let c = builder.insert(Type::Model(Model {
        name: "C".into(),
        namespace: Some(global),
        ..Model::default()
    }));
    let a = builder.insert(Type::Model(Model {
        name: "A".into(),
        namespace: Some(global),
        ..Model::default()
    }));
    let b = builder.insert(Type::Model(Model {
        name: "B".into(),
        namespace: Some(global),
        ..Model::default()
    }));

    let a_to_b = builder.insert(Type::ModelProperty(ModelProperty {
        name: "b".into(),
        ty: b,
        optional: false,
    }));
    let a_to_c = builder.insert(Type::ModelProperty(ModelProperty {
        name: "c".into(),
        ty: c,
        optional: false,
    }));
    let b_to_c = builder.insert(Type::ModelProperty(ModelProperty {
        name: "c".into(),
        ty: c,
        optional: false,
    }));
    let b_to_a = builder.insert(Type::ModelProperty(ModelProperty {
        name: "a".into(),
        ty: a,
        optional: false,
    }));

    if let Type::Model(m) = builder.get_mut(a) {
        m.properties.push(("b".into(), a_to_b));
        m.properties.push(("c".into(), a_to_c));
    }
    if let Type::Model(m) = builder.get_mut(b) {
        m.properties.push(("c".into(), b_to_c));
        m.properties.push(("a".into(), b_to_a));
    }
    if let Type::Namespace(n) = builder.get_mut(global) {
        n.models.push(a);
        n.models.push(b);
        n.models.push(c);
    }

    (builder.build(global), a, b, c)
}

/// One model nested two namespaces deep, plus a sibling operation, for
/// exercising namespace-chain and scope-filing behaviour.
#[must_use]
pub fn namespaced_model() -> (Program, TypeId, TypeId) {
    let mut builder = ProgramBuilder::new();
    let global = builder.insert(Type::Namespace(Namespace::default()));
    let widgets = builder.insert(Type::Namespace(Namespace {
        name: "Widgets".into(),
        parent: Some(global),
        ..Namespace::default()
    }));

    let widget = builder.insert(Type::Model(Model {
        name: "Widget".into(),
        namespace: Some(widgets),
        ..Model::default()
    }));

    let params = builder.insert(Type::Model(Model::default()));
    let list_widgets = builder.insert(Type::Operation(Operation {
        name: "listWidgets".into(),
        namespace: Some(widgets),
        parameters: Some(params),
        return_type: Some(widget),
        ..Operation::default()
    }));

    if let Type::Namespace(n) = builder.get_mut(widgets) {
        n.models.push(widget);
        n.operations.push(list_widgets);
    }
    if let Type::Namespace(n) = builder.get_mut(global) {
        n.namespaces.push(widgets);
    }

    (builder.build(global), widget, list_widgets)
}

/// A color enum with three string-valued members.
#[must_use]
pub fn color_enum() -> (Program, TypeId) {
    let mut builder = ProgramBuilder::new();
    let global = builder.insert(Type::Namespace(Namespace::default()));

    let red = builder.insert(Type::EnumMember(EnumMember {
        name: "Red".into(),
        value: None,
    }));
    let green = builder.insert(Type::EnumMember(EnumMember {
        name: "Green".into(),
        value: None,
    }));
    let blue = builder.insert(Type::EnumMember(EnumMember {
        name: "Blue".into(),
        value: None,
    }));

    let color = builder.insert(Type::Enum(Enum {
        name: "Color".into(),
        namespace: Some(global),
        members: vec![red, green, blue],
    }));

    if let Type::Namespace(n) = builder.get_mut(global) {
        n.enums.push(color);
    }

    (builder.build(global), color)
}

/// A reference target that renders every declaration as a `serde_json::Value`
/// object, used to give `emitgraph-core`'s tests something concrete to
/// assert on. Properties are rendered inline; a property whose type is
/// itself a named model resolves to a `{"$ref": "#/definitions/Name"}`
/// pointer once the referenced declaration's name is known (deferred behind
/// a placeholder if it isn't yet, same as any other reference in the
/// framework) via [`UserEmitter::reference`]. Every namespace opens its own
/// nested scope via [`UserEmitter::context`], so declarations two namespaces
/// deep still get filed correctly even though every declaration lands in
/// the same output file.
#[derive(Debug, Default)]
pub struct JsonEmitter;

impl UserEmitter for JsonEmitter {
    type Value = Value;

    fn model_declaration(
        &self,
        ctx: &mut EmitContext<'_, Self>,
        id: TypeId,
        model: &Model,
    ) -> emitgraph_core::Result<EmitEntity<Value>> {
        let properties = ctx.emit_model_properties(id, model)?;
        let mut builder: ObjectBuilder<Value> = ObjectBuilder::new();
        for (name, entity) in properties {
            builder.push(name, entity);
        }
        Ok(EmitEntity::Raw(object_from_pairs(builder.build())))
    }

    fn model_property(
        &self,
        ctx: &mut EmitContext<'_, Self>,
        _id: TypeId,
        property: &ModelProperty,
    ) -> emitgraph_core::Result<EmitEntity<Value>> {
        ctx.emit_type_reference(property.ty)
    }

    fn reference(
        &self,
        _ctx: &mut EmitContext<'_, Self>,
        declaration: &Declaration<Value>,
        _path_up: &[ScopeId],
        _path_down: &[ScopeId],
        _common_scope: Option<ScopeId>,
    ) -> emitgraph_core::Result<EmitEntity<Value>> {
        let mut pointer = Map::new();
        pointer.insert(
            "$ref".into(),
            Value::String(format!("#/definitions/{}", declaration.name)),
        );
        Ok(EmitEntity::from(Value::Object(pointer)))
    }

    /// Every non-global namespace opens a scope named after itself (§4.5) —
    /// declarations nested inside file under it rather than directly under
    /// the source file root.
    fn context(
        &self,
        ctx: &mut EmitContext<'_, Self>,
        op: OpKey,
        id: TypeId,
    ) -> emitgraph_core::Result<ContextMap> {
        if op != OpKey::Namespace {
            return Ok(ContextMap::new());
        }
        let Type::Namespace(ns) = ctx.program().get(id) else {
            return Ok(ContextMap::new());
        };
        if ns.name.is_empty() {
            return Ok(ContextMap::new());
        }
        let scope = ctx.create_scope(Some(id), ns.name.clone())?;
        Ok(ContextMap::new().with("scope", scope))
    }

    fn enum_member(
        &self,
        _ctx: &mut EmitContext<'_, Self>,
        _id: TypeId,
        member: &EnumMember,
    ) -> emitgraph_core::Result<EmitEntity<Value>> {
        Ok(EmitEntity::from(Value::String(member.name.clone())))
    }

    fn enum_declaration(
        &self,
        ctx: &mut EmitContext<'_, Self>,
        id: TypeId,
        enum_: &Enum,
    ) -> emitgraph_core::Result<EmitEntity<Value>> {
        let members = ctx.emit_enum_members(id, enum_)?;
        let values: Vec<Value> = members
            .into_iter()
            .filter_map(|(_, entity)| entity.rendered().and_then(|r| r.value()))
            .collect();
        Ok(EmitEntity::from(Value::Array(values)))
    }

    fn render_source_file(&self, declarations: &[Declaration<Value>]) -> String {
        let mut definitions = Map::new();
        for declaration in declarations {
            if let Some(value) = declaration.value.value() {
                definitions.insert(declaration.name.clone(), value);
            }
        }
        serde_json::to_string_pretty(&Value::Object(definitions)).unwrap_or_default()
    }
}

#[must_use]
pub fn json_emitter(program: Program) -> AssetEmitter<JsonEmitter> {
    AssetEmitter::new(program, JsonEmitter, EmitProgramOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_model_cycle_builds_a_graph_with_two_models() {
        let (program, a, b) = two_model_cycle();
        assert!(matches!(program.get(a), Type::Model(_)));
        assert!(matches!(program.get(b), Type::Model(_)));
    }

    #[test]
    fn namespaced_model_has_a_two_deep_namespace_chain() {
        let (program, widget, _) = namespaced_model();
        let chain = program.namespace_chain(widget);
        assert_eq!(chain.len(), 1);
    }
}
