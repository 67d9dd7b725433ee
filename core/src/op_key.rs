//! The dispatch table: which [`crate::emitter::UserEmitter`] method a type
//! node's kind and role resolve to (§3).
//!
//! A type node doesn't map to a single operation — a `Model` is emitted as
//! `modelDeclaration`, `modelLiteral`, `modelInstantiation` or `modelScalar`
//! depending on whether it's named, anonymous, a generic instantiation, or
//! an intrinsic (§3). Almost every kind dispatches to the *same* key whether
//! it's visited directly or reached by reference — `ModelProperty` is the
//! one spec-named exception, routing to `modelPropertyReference` instead of
//! `modelPropertyLiteral` (§4.7 step 1). [`OpKey`] is the identity half of a
//! memo key (§4.3) alongside the node's `TypeId` and current context.
//!
//! This also backs the per-enclosure context fold (§4.5): every entry on the
//! enclosure stack is looked up by its `OpKey` to find the `<opKey>Context`/
//! `<opKey>ReferenceContext` contribution it makes. Per the source's own
//! design notes, that string-keyed method lookup is reproduced here as a
//! static kind → key mapping plus a match on `OpKey` inside one pair of
//! trait methods ([`crate::emitter::UserEmitter::context`] /
//! [`crate::emitter::UserEmitter::reference_context`]), rather than as 25
//! separately named trait methods — a virtual-dispatch-by-kind table is
//! exactly what the design notes call out as the intended shape.

use strum::{Display, EnumString};

/// One dispatch target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum OpKey {
    Program,
    SourceFile,
    Namespace,

    ModelDeclaration,
    ModelLiteral,
    ModelInstantiation,
    ModelScalar,

    ModelPropertyLiteral,
    ModelPropertyReference,

    OperationDeclaration,

    InterfaceDeclaration,
    InterfaceOperationDeclaration,

    UnionDeclaration,
    UnionLiteral,
    UnionInstantiation,

    UnionVariant,

    EnumDeclaration,

    EnumMember,

    TupleLiteral,

    BooleanLiteral,
    StringLiteral,
    NumericLiteral,
}

impl OpKey {
    /// Whether this key has a paired `<opKey>ReferenceContext` hook that the
    /// context engine folds in before the operation runs (§4.5).
    ///
    /// The exempt set named in §4.5 is "literals, intrinsic scalar,
    /// enum/member" — every other declaration-shaped key (including
    /// `namespace`, which can itself sit on the enclosure stack of a type
    /// reached by reference) still gets asked for reference context.
    #[must_use]
    pub fn has_reference_context(self) -> bool {
        !matches!(
            self,
            OpKey::ModelLiteral
                | OpKey::ModelScalar
                | OpKey::ModelPropertyLiteral
                | OpKey::UnionLiteral
                | OpKey::TupleLiteral
                | OpKey::EnumDeclaration
                | OpKey::EnumMember
                | OpKey::BooleanLiteral
                | OpKey::StringLiteral
                | OpKey::NumericLiteral
        )
    }

    /// Whether a node dispatched to this key is a declaration result that
    /// must be filed into the current scope (§4.6) rather than inlined.
    #[must_use]
    pub fn produces_declaration(self) -> bool {
        matches!(
            self,
            OpKey::Namespace
                | OpKey::ModelDeclaration
                | OpKey::ModelInstantiation
                | OpKey::ModelScalar
                | OpKey::OperationDeclaration
                | OpKey::InterfaceDeclaration
                | OpKey::UnionDeclaration
                | OpKey::UnionInstantiation
                | OpKey::EnumDeclaration
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_are_exempt_from_reference_context() {
        assert!(!OpKey::StringLiteral.has_reference_context());
        assert!(!OpKey::BooleanLiteral.has_reference_context());
        assert!(!OpKey::NumericLiteral.has_reference_context());
        assert!(!OpKey::ModelLiteral.has_reference_context());
        assert!(!OpKey::UnionLiteral.has_reference_context());
        assert!(!OpKey::TupleLiteral.has_reference_context());
        assert!(!OpKey::ModelPropertyLiteral.has_reference_context());
    }

    #[test]
    fn intrinsic_scalar_and_enum_member_are_exempt() {
        assert!(!OpKey::ModelScalar.has_reference_context());
        assert!(!OpKey::EnumDeclaration.has_reference_context());
        assert!(!OpKey::EnumMember.has_reference_context());
    }

    #[test]
    fn declaration_kinds_carry_reference_context() {
        assert!(OpKey::ModelDeclaration.has_reference_context());
        assert!(OpKey::ModelInstantiation.has_reference_context());
        assert!(OpKey::Namespace.has_reference_context());
        assert!(OpKey::InterfaceDeclaration.has_reference_context());
        assert!(OpKey::UnionDeclaration.has_reference_context());
    }

    #[test]
    fn display_is_camel_case() {
        assert_eq!(OpKey::ModelDeclaration.to_string(), "modelDeclaration");
        assert_eq!(OpKey::TupleLiteral.to_string(), "tupleLiteral");
    }
}
