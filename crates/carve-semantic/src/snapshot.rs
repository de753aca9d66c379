use std::collections::HashMap;

use carve_core::{ranges_intersect, TextRange};
use carve_syntax::SyntaxTree;
use carve_types::{TypeParamDef, TypeParamEnv, TypeParamId};
use indexmap::IndexMap;

use crate::{
    ControlFlowFacts, DataFlowFacts, DataFlowProvider, FlowRegion, Nullability, ReturnTypeFacts,
    SemanticError, SemanticModel, Symbol, SymbolId, SymbolReference,
};

/// Per-region facts with an optional fallback used for any region that has no
/// exact entry.
#[derive(Debug, Clone)]
struct RegionTable<T> {
    exact: HashMap<TextRange, T>,
    fallback: Option<T>,
}

impl<T> Default for RegionTable<T> {
    fn default() -> Self {
        Self {
            exact: HashMap::new(),
            fallback: None,
        }
    }
}

impl<T: Clone> RegionTable<T> {
    fn lookup(&self, what: &'static str, range: TextRange) -> Result<T, SemanticError> {
        self.exact
            .get(&range)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or(SemanticError::MissingFacts { what, range })
    }
}

/// An in-memory semantic model built from precomputed tables.
///
/// Hosts that already ran their own analysis fill one of these and hand it
/// to the engine; the test suites use it the same way.
#[derive(Debug, Clone, Default)]
pub struct SemanticSnapshot {
    symbols: IndexMap<SymbolId, Symbol>,
    type_params: IndexMap<TypeParamId, TypeParamDef>,
    references: Vec<SymbolReference>,
    nullability: HashMap<SymbolId, Nullability>,
    data_flow: RegionTable<DataFlowFacts>,
    control_flow: RegionTable<ControlFlowFacts>,
    return_types: RegionTable<ReturnTypeFacts>,
}

impl SemanticSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_symbol(&mut self, symbol: Symbol) -> SymbolId {
        let id = symbol.id;
        self.symbols.insert(id, symbol);
        id
    }

    pub fn add_type_param(&mut self, def: TypeParamDef) {
        self.type_params.insert(def.id, def);
    }

    pub fn add_reference(&mut self, reference: SymbolReference) {
        let at = self
            .references
            .partition_point(|existing| existing.range.start() <= reference.range.start());
        self.references.insert(at, reference);
    }

    /// Flow state of `symbol` for every range it is queried with.
    pub fn set_nullability(&mut self, symbol: SymbolId, state: Nullability) {
        self.nullability.insert(symbol, state);
    }

    pub fn set_data_flow(&mut self, range: TextRange, facts: DataFlowFacts) {
        self.data_flow.exact.insert(range, facts);
    }

    pub fn set_default_data_flow(&mut self, facts: DataFlowFacts) {
        self.data_flow.fallback = Some(facts);
    }

    pub fn set_control_flow(&mut self, range: TextRange, facts: ControlFlowFacts) {
        self.control_flow.exact.insert(range, facts);
    }

    pub fn set_default_control_flow(&mut self, facts: ControlFlowFacts) {
        self.control_flow.fallback = Some(facts);
    }

    pub fn set_return_type_facts(&mut self, range: TextRange, facts: ReturnTypeFacts) {
        self.return_types.exact.insert(range, facts);
    }

    pub fn set_default_return_type_facts(&mut self, facts: ReturnTypeFacts) {
        self.return_types.fallback = Some(facts);
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }
}

impl TypeParamEnv for SemanticSnapshot {
    fn type_param(&self, id: TypeParamId) -> Option<&TypeParamDef> {
        self.type_params.get(&id)
    }
}

impl SemanticModel for SemanticSnapshot {
    fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(&id)
    }

    fn referenced_symbols(&self, range: TextRange) -> Vec<SymbolReference> {
        self.references
            .iter()
            .filter(|reference| {
                ranges_intersect(range, reference.range)
                    || (reference.range.is_empty() && range.contains(reference.range.start()))
            })
            .copied()
            .collect()
    }

    fn flow_nullability(&self, symbol: SymbolId, _range: TextRange) -> Nullability {
        self.nullability.get(&symbol).copied().unwrap_or_default()
    }

    fn return_type_facts(
        &self,
        tree: &SyntaxTree,
        region: &FlowRegion,
    ) -> Result<ReturnTypeFacts, SemanticError> {
        self.return_types.lookup("return type", region.span(tree)?)
    }
}

impl DataFlowProvider for SemanticSnapshot {
    fn analyze_data_flow(
        &self,
        tree: &SyntaxTree,
        region: &FlowRegion,
    ) -> Result<DataFlowFacts, SemanticError> {
        self.data_flow.lookup("data-flow", region.span(tree)?)
    }

    fn analyze_control_flow(
        &self,
        tree: &SyntaxTree,
        region: &FlowRegion,
    ) -> Result<ControlFlowFacts, SemanticError> {
        self.control_flow.lookup("control-flow", region.span(tree)?)
    }
}

#[cfg(test)]
mod tests {
    use carve_core::Name;
    use carve_syntax::{SyntaxKind, TreeBuilder};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{FlowFlags, SymbolKind};

    fn tree() -> SyntaxTree {
        let mut b = TreeBuilder::new();
        b.start_node(SyntaxKind::Block);
        b.token(SyntaxKind::LBrace, "{");
        b.start_node(SyntaxKind::ExpressionStatement);
        b.start_node(SyntaxKind::NameExpression);
        b.token(SyntaxKind::Identifier, "x");
        b.finish_node();
        b.token(SyntaxKind::Semicolon, ";");
        b.finish_node();
        b.token(SyntaxKind::RBrace, "}");
        b.finish_node();
        b.finish().unwrap()
    }

    #[test]
    fn exact_region_facts_win_over_fallback() {
        let tree = tree();
        let stmt = tree.child_node_of_kind(tree.root(), SyntaxKind::ExpressionStatement).unwrap();
        let expr = tree.child_node_of_kind(stmt, SyntaxKind::NameExpression).unwrap();

        let mut snapshot = SemanticSnapshot::new();
        let x = snapshot.add_symbol(Symbol {
            id: SymbolId(0),
            name: Name::new("x"),
            kind: SymbolKind::local(),
            ty: None,
            declaration: None,
        });

        let mut exact = DataFlowFacts::new();
        exact.insert(
            x,
            FlowFlags {
                read_inside: true,
                ..FlowFlags::default()
            },
        );
        snapshot.set_data_flow(tree.node_span(expr), exact.clone());
        snapshot.set_default_data_flow(DataFlowFacts::new());

        let region = FlowRegion::Expression(expr);
        assert_eq!(snapshot.analyze_data_flow(&tree, &region).unwrap(), exact);

        let region = FlowRegion::Statements { first: stmt, last: stmt };
        assert!(snapshot.analyze_data_flow(&tree, &region).unwrap().is_empty());

        assert_eq!(
            snapshot.analyze_control_flow(&tree, &region),
            Err(SemanticError::MissingFacts {
                what: "control-flow",
                range: TextRange::new(1.into(), 3.into()),
            })
        );
    }

    #[test]
    fn references_are_kept_in_document_order() {
        let mut snapshot = SemanticSnapshot::new();
        for start in [8u32, 2, 5] {
            snapshot.add_reference(SymbolReference {
                symbol: SymbolId(start),
                range: TextRange::at(start.into(), 1.into()),
                is_written: false,
            });
        }

        let found: Vec<_> = snapshot
            .referenced_symbols(TextRange::new(0.into(), 6.into()))
            .into_iter()
            .map(|reference| reference.symbol.0)
            .collect();
        assert_eq!(found, vec![2, 5]);
    }
}
