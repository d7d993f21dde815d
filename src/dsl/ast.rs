//! Syntax tree for the Starlark subset.

/// A parsed file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    pub statements: Vec<Stmt>,
}

/// Top-level statements.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// A bare expression, normally a rule call
    Expr(Expr),

    /// `NAME = value`
    Assign {
        target: String,
        value: Expr,
        line: usize,
    },

    /// `load("label", "sym", alias = "sym")`
    Load {
        module: String,
        symbols: Vec<LoadSymbol>,
        line: usize,
    },
}

/// One binding requested by a `load` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadSymbol {
    /// Name bound in the loading file
    pub local: String,
    /// Name exported by the loaded file
    pub exported: String,
    /// Written as `local = "exported"`
    pub aliased: bool,
}

/// Expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Str(String),
    Int(i64),
    Bool(bool),
    None,
    Name { name: String, line: usize },
    List(Vec<Expr>),
    Dict {
        entries: Vec<(Expr, Expr)>,
        line: usize,
    },
    Call(Call),
    /// `lhs + rhs`
    Add {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        line: usize,
    },
    /// `glob(include, exclude = [...])`
    Glob { args: Vec<Argument>, line: usize },
    /// `select({...})`
    Select { args: Vec<Argument>, line: usize },
}

/// A call expression. Dotted callees (`native.cc_library`) keep the dots.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub callee: String,
    pub args: Vec<Argument>,
    pub line: usize,
}

/// A call argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Positional(Expr),
    Keyword(String, Expr),
}
