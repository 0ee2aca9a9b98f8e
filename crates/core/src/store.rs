//! Merge store for facts from many translation units
//!
//! Two tables with two deliberately different policies:
//!
//! - **Symbols** are first-write-wins. A later fact for the same identity
//!   with different content is a collision: it is logged, recorded in
//!   [`FactStore::collisions`] and dropped.
//! - **References** are last-write-wins keyed by `(from, to, kind)`, so two
//!   members pointing at the same type the same way collapse into one entry.
//!
//! Facts may name identities that are never declared; those are resolved by
//! the graph builder, not rejected here.

use std::collections::BTreeMap;

use tracing::warn;

use crate::facts::{Fact, Reference, ReferenceKey, Symbol};
use crate::identity::Identity;

/// Symbols keyed by identity
pub type SymbolTable = BTreeMap<Identity, Symbol>;

/// References keyed by `(from, to, kind)`
pub type ReferenceTable = BTreeMap<ReferenceKey, Reference>;

/// A symbol fact that lost against an earlier one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub kept: Symbol,
    pub rejected: Symbol,
}

/// Deduplicated symbol and reference tables
#[derive(Debug, Default, Clone)]
pub struct FactStore {
    symbols: SymbolTable,
    references: ReferenceTable,
    collisions: Vec<Collision>,
}

impl FactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a batch of facts into the store
    pub fn merge<I>(&mut self, facts: I)
    where
        I: IntoIterator<Item = Fact>,
    {
        for fact in facts {
            match fact {
                Fact::Symbol(symbol) => self.insert_symbol(symbol),
                Fact::Reference(reference) => self.insert_reference(reference),
            }
        }
    }

    /// Insert unless the identity is already present
    pub fn insert_symbol(&mut self, symbol: Symbol) {
        match self.symbols.get(&symbol.identity) {
            None => {
                self.symbols.insert(symbol.identity.clone(), symbol);
            }
            Some(existing) if *existing == symbol => {}
            Some(existing) => {
                warn!(
                    identity = %symbol.identity,
                    kind = %symbol.identity.kind,
                    kept = ?existing.location,
                    rejected = ?symbol.location,
                    "symbol collision, keeping first declaration"
                );
                self.collisions.push(Collision {
                    kept: existing.clone(),
                    rejected: symbol,
                });
            }
        }
    }

    /// Insert, replacing any reference with the same `(from, to, kind)`
    pub fn insert_reference(&mut self, reference: Reference) {
        self.references.insert(reference.key(), reference);
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn references(&self) -> &ReferenceTable {
        &self.references
    }

    pub fn symbol(&self, identity: &Identity) -> Option<&Symbol> {
        self.symbols.get(identity)
    }

    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty() && self.references.is_empty()
    }
}

/// Build a fresh store from a fact stream
pub fn merge<I>(facts: I) -> FactStore
where
    I: IntoIterator<Item = Fact>,
{
    let mut store = FactStore::new();
    store.merge(facts);
    store
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Location;
    use crate::facts::RelationshipKind;
    use std::io;
    use std::sync::{Arc, Mutex};

    fn point_at(line: usize) -> Fact {
        Symbol::record(
            Identity::record("Foo"),
            Some(Location::new("/project/foo.h", line)),
        )
        .into()
    }

    fn line_to_point(kind: RelationshipKind, field: &str) -> Fact {
        Reference::new(Identity::record("Line"), Identity::record("Point"), kind, field).into()
    }

    #[test]
    fn test_empty_input() {
        let store = merge(Vec::<Fact>::new());
        assert!(store.is_empty());
        assert!(store.collisions().is_empty());
    }

    #[test]
    fn test_symbol_first_write_wins() {
        let store = merge(vec![point_at(1), point_at(7)]);

        let kept = store.symbol(&Identity::record("Foo")).unwrap();
        assert_eq!(kept.location.as_ref().map(|l| l.line), Some(1));
        assert_eq!(store.collisions().len(), 1);
        assert_eq!(store.collisions()[0].rejected.location.as_ref().map(|l| l.line), Some(7));
    }

    #[test]
    fn test_identical_symbol_is_not_a_collision() {
        let store = merge(vec![point_at(1), point_at(1)]);
        assert_eq!(store.symbols().len(), 1);
        assert!(store.collisions().is_empty());
    }

    #[test]
    fn test_same_name_different_kind_are_distinct() {
        let store = merge(vec![
            Symbol::record(Identity::record("Node"), None).into(),
            Symbol::alias(Identity::alias("Node"), None, Some(Identity::record("Node"))).into(),
        ]);
        assert_eq!(store.symbols().len(), 2);
        assert!(store.collisions().is_empty());
    }

    #[test]
    fn test_reference_last_write_wins() {
        let store = merge(vec![
            line_to_point(RelationshipKind::Composition, "start"),
            line_to_point(RelationshipKind::Composition, "end"),
        ]);
        assert_eq!(store.references().len(), 1);
        let only = store.references().values().next().unwrap();
        assert_eq!(only.field_name, "end");
    }

    #[test]
    fn test_reference_kind_is_part_of_key() {
        let store = merge(vec![
            line_to_point(RelationshipKind::Aggregation, "start"),
            line_to_point(RelationshipKind::Composition, "end"),
        ]);
        assert_eq!(store.references().len(), 2);
    }

    #[test]
    fn test_undeclared_endpoints_are_accepted() {
        let store = merge(vec![line_to_point(RelationshipKind::Composition, "end")]);
        assert!(store.symbols().is_empty());
        assert_eq!(store.references().len(), 1);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let facts = vec![
            point_at(1),
            point_at(7),
            line_to_point(RelationshipKind::Composition, "start"),
            line_to_point(RelationshipKind::Composition, "end"),
        ];
        let once = merge(facts.clone());
        let twice = merge(facts.iter().cloned().chain(facts.iter().cloned()));

        assert_eq!(once.symbols(), twice.symbols());
        assert_eq!(once.references(), twice.references());
    }

    /// In-memory sink for a `tracing_subscriber::fmt` subscriber
    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLog {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[test]
    fn test_collision_warning_is_emitted_once() {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();

        let store = tracing::subscriber::with_default(subscriber, || {
            merge(vec![point_at(1), point_at(7), point_at(1)])
        });

        let output = log.contents();
        assert_eq!(output.matches("symbol collision").count(), 1);
        assert!(output.contains("WARN"));
        assert!(output.contains("identity=Foo"));
        assert_eq!(store.collisions().len(), 1);
    }
}
