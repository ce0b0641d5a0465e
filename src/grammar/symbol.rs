//! Symbol numbering and metadata.

use std::fmt;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

/// A grammar symbol id. Terminals occupy the low ids, starting with [`Symbol::END`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u16);

impl Symbol {
    /// End of input.
    pub const END: Symbol = Symbol(0);
    /// Error nodes and unrecognised tokens.
    pub const ERROR: Symbol = Symbol(u16::MAX);

    pub const fn from_raw(raw: u16) -> Self {
        Symbol(raw)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A field name id, indexing [`SymbolTable::field_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldId(u16);

impl FieldId {
    pub const fn from_raw(raw: u16) -> Self {
        FieldId(raw)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    End,
    /// Token produced by the lexer (named or literal).
    Terminal,
    /// Token produced by the external scanner.
    External,
    NonTerminal,
    /// Hidden helper rule generated for `repeat`.
    Auxiliary,
    /// Kind only reachable through `alias`.
    Alias,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInfo {
    pub name: SmolStr,
    pub kind: SymbolKind,
    pub visible: bool,
    pub named: bool,
}

impl SymbolInfo {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            SymbolKind::End | SymbolKind::Terminal | SymbolKind::External
        )
    }
}

/// Every symbol and field name of a compiled grammar.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<SymbolInfo>,
    by_name: FxHashMap<(SmolStr, bool), Symbol>,
    fields: Vec<SmolStr>,
    field_ids: FxHashMap<SmolStr, FieldId>,
    terminal_count: usize,
}

impl SymbolTable {
    pub(crate) fn push(&mut self, info: SymbolInfo) -> Symbol {
        let symbol = Symbol(self.symbols.len() as u16);
        if info.is_terminal() {
            self.terminal_count = self.symbols.len() + 1;
        }
        self.by_name
            .entry((info.name.clone(), info.named))
            .or_insert(symbol);
        self.symbols.push(info);
        symbol
    }

    pub(crate) fn intern_field(&mut self, name: &SmolStr) -> FieldId {
        if let Some(&id) = self.field_ids.get(name) {
            return id;
        }
        let id = FieldId(self.fields.len() as u16);
        self.fields.push(name.clone());
        self.field_ids.insert(name.clone(), id);
        id
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Number of terminal symbols; terminal ids are `0..terminal_count`.
    pub fn terminal_count(&self) -> usize {
        self.terminal_count
    }

    pub fn is_terminal(&self, symbol: Symbol) -> bool {
        symbol == Symbol::ERROR || symbol.index() < self.terminal_count
    }

    pub fn info(&self, symbol: Symbol) -> Option<&SymbolInfo> {
        self.symbols.get(symbol.index())
    }

    pub fn name(&self, symbol: Symbol) -> &str {
        if symbol == Symbol::ERROR {
            return "ERROR";
        }
        self.symbols
            .get(symbol.index())
            .map(|info| info.name.as_str())
            .unwrap_or("")
    }

    pub fn lookup(&self, name: &str, named: bool) -> Option<Symbol> {
        if named && name == "ERROR" {
            return Some(Symbol::ERROR);
        }
        self.by_name.get(&(SmolStr::new(name), named)).copied()
    }

    /// A terminal by name, named or literal.
    pub fn terminal(&self, name: &str) -> Option<Symbol> {
        [true, false]
            .into_iter()
            .filter_map(|named| self.lookup(name, named))
            .find(|&symbol| self.is_terminal(symbol))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &SymbolInfo)> + '_ {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, info)| (Symbol(i as u16), info))
    }

    pub fn field_name(&self, field: FieldId) -> Option<&str> {
        self.fields.get(field.0 as usize).map(SmolStr::as_str)
    }

    pub fn field_id(&self, name: &str) -> Option<FieldId> {
        self.field_ids.get(name).copied()
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}
