//! Syntax Tree for Attribute Expressions
//!
//! Defines the node types the parser produces and the interpreter walks.
//! The language is a restricted expression/statement subset: no loops, no
//! function definitions, no object construction beyond literals.

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,

    // Comparison
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    StrictEq,
    StrictNe,
}

/// Short-circuiting operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Nullish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
    TypeOf,
}

/// `=` or a compound assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    /// `op=` for an arithmetic operator.
    Compound(BinaryOp),
    /// `??=`
    Nullish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

/// A piece of a template literal.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Text(String),
    Expr(Expr),
}

/// How a member is named.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    /// `object.name`
    Named(String),
    /// `object[expr]`
    Computed(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Template(Vec<TemplatePart>),
    Ident(String),
    Array(Vec<Expr>),
    Object(Vec<(String, Expr)>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    Member {
        object: Box<Expr>,
        property: Property,
        /// `?.` access: yields `undefined` on a nullish object
        optional: bool,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        optional: bool,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Update {
        op: UpdateOp,
        prefix: bool,
        target: Box<Expr>,
    },
}

impl Expr {
    /// Whether this expression may appear on the left of an assignment.
    pub fn is_assignable(&self) -> bool {
        match self {
            Expr::Ident(_) => true,
            Expr::Member {
                object, optional, ..
            } => !optional && object.is_assignable(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    /// `let` or `const`; both declare a handler-local name.
    Let {
        name: String,
        init: Option<Expr>,
    },
    If {
        test: Expr,
        consequent: Box<Stmt>,
        alternate: Option<Box<Stmt>>,
    },
    Block(Vec<Stmt>),
    Empty,
}

/// A parsed statement sequence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub body: Vec<Stmt>,
}

impl Program {
    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Box<Expr> {
        Box::new(Expr::Ident(name.to_string()))
    }

    #[test]
    fn member_chains_rooted_at_identifiers_are_assignable() {
        let member = Expr::Member {
            object: ident("user"),
            property: Property::Named("name".into()),
            optional: false,
        };
        assert!(member.is_assignable());
        assert!(Expr::Ident("x".into()).is_assignable());
    }

    #[test]
    fn optional_and_call_targets_are_not_assignable() {
        let optional = Expr::Member {
            object: ident("user"),
            property: Property::Named("name".into()),
            optional: true,
        };
        let call = Expr::Call {
            callee: ident("f"),
            args: Vec::new(),
            optional: false,
        };
        assert!(!optional.is_assignable());
        assert!(!call.is_assignable());
        assert!(!Expr::Literal(Literal::Number(1.0)).is_assignable());
    }
}
