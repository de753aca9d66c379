use carve_core::{Name, TextRange};
use carve_semantic::{
    ControlFlowFacts, DataFlowFacts, FlowFlags, Nullability, ReturnTypeFacts, SemanticSnapshot,
    Symbol, SymbolId, SymbolKind, SymbolReference,
};
use carve_types::{Type, TypeParamDef};

/// Parses a compact flag list into [`FlowFlags`].
///
/// Words: `captured`, `in` (data flows in), `out` (data flows out), `always`
/// (always assigned), `decl` (declared inside), `ri`/`wi` (read/written
/// inside), `ro`/`wo` (read/written outside), `unsafe` (address taken).
pub fn flow(words: &str) -> FlowFlags {
    let mut flags = FlowFlags::default();
    for word in words.split_whitespace() {
        let slot = match word {
            "captured" => &mut flags.captured,
            "in" => &mut flags.data_flows_in,
            "out" => &mut flags.data_flows_out,
            "always" => &mut flags.always_assigned,
            "decl" => &mut flags.declared_inside,
            "ri" => &mut flags.read_inside,
            "wi" => &mut flags.written_inside,
            "ro" => &mut flags.read_outside,
            "wo" => &mut flags.written_outside,
            "unsafe" => &mut flags.unsafe_address_taken,
            other => panic!("unknown flow flag `{other}`"),
        };
        *slot = true;
    }
    flags
}

/// Builds a [`SemanticSnapshot`] whose data-flow, control-flow and return-type
/// facts apply to whatever region the analysis asks about.
#[derive(Debug, Default)]
pub struct FactsBuilder {
    snapshot: SemanticSnapshot,
    next_id: u32,
    data_flow: DataFlowFacts,
    control_flow: ControlFlowFacts,
    return_types: ReturnTypeFacts,
}

impl FactsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn symbol(
        &mut self,
        name: &str,
        kind: SymbolKind,
        ty: Option<Type>,
        declaration: Option<TextRange>,
    ) -> SymbolId {
        let id = SymbolId(self.next_id);
        self.next_id += 1;
        self.snapshot.add_symbol(Symbol {
            id,
            name: Name::new(name),
            kind,
            ty,
            declaration,
        })
    }

    /// A local declared outside the selection.
    pub fn local(&mut self, name: &str, ty: Type) -> SymbolId {
        self.symbol(name, SymbolKind::local(), Some(ty), None)
    }

    pub fn local_declared_at(&mut self, name: &str, ty: Type, declaration: TextRange) -> SymbolId {
        self.symbol(name, SymbolKind::local(), Some(ty), Some(declaration))
    }

    pub fn param(&mut self, name: &str, ty: Type) -> SymbolId {
        self.symbol(name, SymbolKind::parameter(), Some(ty), None)
    }

    pub fn this(&mut self, ty: Type) -> SymbolId {
        self.symbol("this", SymbolKind::this(), Some(ty), None)
    }

    /// Data-flow flags for `symbol`, see [`flow`].
    pub fn flags(&mut self, symbol: SymbolId, words: &str) -> &mut Self {
        self.data_flow.insert(symbol, flow(words));
        self
    }

    pub fn reference(&mut self, symbol: SymbolId, range: TextRange, is_written: bool) -> &mut Self {
        self.snapshot.add_reference(SymbolReference {
            symbol,
            range,
            is_written,
        });
        self
    }

    pub fn nullability(&mut self, symbol: SymbolId, state: Nullability) -> &mut Self {
        self.snapshot.set_nullability(symbol, state);
        self
    }

    pub fn type_param(&mut self, def: TypeParamDef) -> &mut Self {
        self.snapshot.add_type_param(def);
        self
    }

    pub fn control_flow(&mut self, facts: ControlFlowFacts) -> &mut Self {
        self.control_flow = facts;
        self
    }

    pub fn return_types(&mut self, facts: ReturnTypeFacts) -> &mut Self {
        self.return_types = facts;
        self
    }

    pub fn build(self) -> SemanticSnapshot {
        let mut snapshot = self.snapshot;
        snapshot.set_default_data_flow(self.data_flow);
        snapshot.set_default_control_flow(self.control_flow);
        snapshot.set_default_return_type_facts(self.return_types);
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flag_words() {
        let flags = flow("in out ri  wi");
        assert!(flags.data_flows_in && flags.data_flows_out);
        assert!(flags.read_inside && flags.written_inside);
        assert!(!flags.declared_inside && !flags.captured);
        assert_eq!(flow(""), FlowFlags::default());
    }

    #[test]
    #[should_panic(expected = "unknown flow flag")]
    fn rejects_unknown_words() {
        flow("inside");
    }
}
