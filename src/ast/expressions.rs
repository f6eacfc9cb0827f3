use crate::ast::BinOp;

/// Abstract Syntax Tree node representing a parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // Literals
    /// Literal floating point number
    Float(f64),

    /// Literal integer
    Integer(i64),

    /// String literal
    String(String),

    /// Boolean literal
    Boolean(bool),

    /// Null literal
    Null,

    // References
    /// Variable or declared type name
    ///
    /// # Examples
    /// ```text
    /// object
    /// ObjectMutator
    /// ```
    Ident(String),

    // Access
    /// Member access with a field name
    ///
    /// # Examples
    /// ```text
    /// object.spec
    /// object.spec.replicas
    /// ```
    Member { object: Box<Expr>, field: String },

    /// Index access with a computed key
    ///
    /// # Examples
    /// ```text
    /// object.items[0]
    /// object["metadata"]
    /// ```
    Index { object: Box<Expr>, index: Box<Expr> },

    // Calls
    /// Receiver-style call
    ///
    /// # Examples
    /// ```text
    /// object.spec.merge({"replicas": 3})
    /// object.items[1].remove()
    /// ```
    MethodCall {
        object: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },

    /// Global function call
    ///
    /// # Example
    /// ```text
    /// type(object.spec)
    /// ```
    Call { function: String, args: Vec<Expr> },

    // Operations
    /// Binary operation (arithmetic, comparison, logical)
    BinaryOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Logical negation (`!`)
    Not(Box<Expr>),

    // Literals with structure
    /// List literal
    ///
    /// # Example
    /// ```text
    /// ["b", "c"]
    /// ```
    List(Vec<Expr>),

    /// Map literal; keys are expressions
    ///
    /// # Example
    /// ```text
    /// {"name": "sidecar", "image": "example.com/sidecar:v1"}
    /// ```
    Map(Vec<(Expr, Expr)>),
}
