//! Composing rendered output that may still contain deferred pieces (§4.2).
//!
//! An emitter operation that wants to, say, build a JSON object out of its
//! model's properties can't just assume every property resolved already —
//! some may still be behind a [`Placeholder`] waiting on a reference cycle.
//! These builders collect pieces as they're produced and flatten once, at
//! the end: if every piece is already known the result is immediate; if any
//! piece is still deferred the result is itself a placeholder that resolves
//! the moment the last outstanding piece does.
//!
//! [`EmitEntity::NoEmit`] entries are dropped silently when pushed — an
//! omitted property or array element simply isn't present in the built
//! result (§4.8).

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::placeholder::Placeholder;
use crate::result::{EmitEntity, Rendered};

/// Waits on every still-deferred part of `parts` and resolves a combined
/// placeholder once they've all fired, preserving input order.
fn join<T: Clone + 'static>(parts: Vec<Rendered<T>>) -> Rendered<Vec<T>> {
    let snapshots: Vec<Option<T>> = parts.iter().map(Rendered::value).collect();
    if snapshots.iter().all(Option::is_some) {
        return Rendered::Value(snapshots.into_iter().map(|v| v.expect("checked above")).collect());
    }

    let result = Placeholder::new();
    let values = Rc::new(RefCell::new(snapshots));
    let remaining = Rc::new(Cell::new(
        values.borrow().iter().filter(|v| v.is_none()).count(),
    ));

    for (index, part) in parts.into_iter().enumerate() {
        if let Rendered::Placeholder(ph) = part {
            if values.borrow()[index].is_none() {
                let values = values.clone();
                let remaining = remaining.clone();
                let result = result.clone();
                ph.on_resolve(move |value: &T| {
                    values.borrow_mut()[index] = Some(value.clone());
                    let left = remaining.get() - 1;
                    remaining.set(left);
                    if left == 0 {
                        let joined = values
                            .borrow_mut()
                            .iter_mut()
                            .map(|v| v.take().expect("all resolved"))
                            .collect();
                        let _ = result.resolve(joined);
                    }
                });
            }
        }
    }
    Rendered::Placeholder(result)
}

/// Applies `f` to a rendered value once it's known, without forcing the
/// caller to block if it isn't known yet.
fn map_rendered<T, U, F>(rendered: Rendered<T>, f: F) -> Rendered<U>
where
    T: Clone + 'static,
    U: Clone + 'static,
    F: FnOnce(T) -> U + 'static,
{
    match rendered {
        Rendered::Value(value) => Rendered::Value(f(value)),
        Rendered::Placeholder(ph) => {
            let result = Placeholder::new();
            let f = RefCell::new(Some(f));
            let result_for_cb = result.clone();
            ph.on_resolve(move |value: &T| {
                if let Some(f) = f.borrow_mut().take() {
                    let _ = result_for_cb.resolve(f(value.clone()));
                }
            });
            Rendered::Placeholder(result)
        }
    }
}

/// Flattens the spans of a string template (a Cadl/TypeSpec-style
/// interpolated string literal) into one `Rendered<String>`, deferring only
/// if an interpolated span is still unresolved.
#[must_use]
pub fn flatten_template_parts(parts: Vec<Rendered<String>>) -> Rendered<String> {
    map_rendered(join(parts), |pieces| pieces.concat())
}

/// Builds a string out of literal and deferred pieces, in order.
#[derive(Debug, Default)]
pub struct StringBuilder {
    parts: Vec<Rendered<String>>,
}

impl StringBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_str(&mut self, literal: impl Into<String>) -> &mut Self {
        self.parts.push(Rendered::Value(literal.into()));
        self
    }

    pub fn push(&mut self, part: Rendered<String>) -> &mut Self {
        self.parts.push(part);
        self
    }

    #[must_use]
    pub fn build(self) -> Rendered<String> {
        flatten_template_parts(self.parts)
    }
}

/// Builds an ordered array, dropping `NoEmit` entries.
#[derive(Debug, Default)]
pub struct ArrayBuilder<V> {
    values: Vec<Rendered<V>>,
}

impl<V: Clone + 'static> ArrayBuilder<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entity: EmitEntity<V>) -> &mut Self {
        if let Some(rendered) = entity.rendered() {
            self.values.push(rendered);
        }
        self
    }

    #[must_use]
    pub fn build(self) -> Rendered<Vec<V>> {
        join(self.values)
    }
}

/// Builds an ordered `(name, value)` object, dropping `NoEmit` entries.
#[derive(Debug, Default)]
pub struct ObjectBuilder<V> {
    keys: Vec<String>,
    values: Vec<Rendered<V>>,
}

impl<V: Clone + 'static> ObjectBuilder<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, entity: EmitEntity<V>) -> &mut Self {
        if let Some(rendered) = entity.rendered() {
            self.keys.push(key.into());
            self.values.push(rendered);
        }
        self
    }

    #[must_use]
    pub fn build(self) -> Rendered<Vec<(String, V)>> {
        map_rendered(join(self.values), move |values| {
            self.keys.into_iter().zip(values).collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_builder_flattens_immediately_when_no_placeholders() {
        let mut builder = StringBuilder::new();
        builder.push_str("hello, ").push_str("world");
        assert_eq!(builder.build().value(), Some("hello, world".to_owned()));
    }

    #[test]
    fn string_builder_defers_until_placeholder_resolves() {
        let ph: Placeholder<String> = Placeholder::new();
        let mut builder = StringBuilder::new();
        builder
            .push_str("count: ")
            .push(Rendered::Placeholder(ph.clone()));
        let built = builder.build();
        assert!(built.value().is_none());
        ph.resolve("3".to_owned()).unwrap();
        assert_eq!(built.value(), Some("count: 3".to_owned()));
    }

    #[test]
    fn array_builder_drops_no_emit_entries() {
        let mut builder: ArrayBuilder<i32> = ArrayBuilder::new();
        builder.push(EmitEntity::from(1));
        builder.push(EmitEntity::NoEmit);
        builder.push(EmitEntity::from(2));
        assert_eq!(builder.build().value(), Some(vec![1, 2]));
    }

    #[test]
    fn object_builder_preserves_key_order_and_waits_on_placeholders() {
        let ph: Placeholder<i32> = Placeholder::new();
        let mut builder: ObjectBuilder<i32> = ObjectBuilder::new();
        builder.push("a", EmitEntity::from(1));
        builder.push("b", EmitEntity::Raw(Rendered::Placeholder(ph.clone())));
        builder.push("c", EmitEntity::NoEmit);
        let built = builder.build();
        assert!(built.value().is_none());
        ph.resolve(2).unwrap();
        assert_eq!(
            built.value(),
            Some(vec![("a".to_owned(), 1), ("b".to_owned(), 2)])
        );
    }
}
