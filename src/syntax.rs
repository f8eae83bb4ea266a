//! The syntax model: a strict owned tree over method bodies
//!
//! Trees are immutable once built. Every transformation produces a new
//! tree via structural copy (`with_replacement`), so findings produced
//! against one tree can detect that they have gone stale against another.

use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Error for trees that violate the model's structural invariants
#[derive(Debug, Error)]
pub enum SyntaxError {
    #[error("malformed syntax at {path}: {detail}")]
    Malformed { path: NodePath, detail: String },
}

/// Literal values carried by [`SyntaxNode::Literal`]
///
/// Decimals keep their textual form so the tree stays `Eq + Hash`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralValue {
    Int(i64),
    Decimal(String),
    Bool(bool),
    Str(String),
    Null,
}

impl LiteralValue {
    /// Numeric value of an Int/Decimal literal, if it parses
    pub fn as_number(&self) -> Option<f64> {
        match self {
            LiteralValue::Int(n) => Some(*n as f64),
            LiteralValue::Decimal(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, LiteralValue::Int(_) | LiteralValue::Decimal(_))
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Int(n) => write!(f, "{}", n),
            LiteralValue::Decimal(s) => write!(f, "{}", s),
            LiteralValue::Bool(b) => write!(f, "{}", b),
            LiteralValue::Str(s) => write!(f, "\"{}\"", s),
            LiteralValue::Null => write!(f, "null"),
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod
        )
    }

    /// The comparison with the opposite truth value, if this is one
    pub fn inverted(self) -> Option<BinaryOp> {
        match self {
            BinaryOp::Eq => Some(BinaryOp::Ne),
            BinaryOp::Ne => Some(BinaryOp::Eq),
            BinaryOp::Lt => Some(BinaryOp::Ge),
            BinaryOp::Ge => Some(BinaryOp::Lt),
            BinaryOp::Gt => Some(BinaryOp::Le),
            BinaryOp::Le => Some(BinaryOp::Gt),
            _ => None,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        }
    }

    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq | BinaryOp::Ne => 3,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 4,
            BinaryOp::Add | BinaryOp::Sub => 5,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 6,
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Not,
    Neg,
}

/// A node in a method body tree
///
/// Statements and expressions share one variant space; which variants are
/// legal where is enforced by [`validate`], not by the type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyntaxNode {
    Block {
        statements: Vec<SyntaxNode>,
    },
    If {
        condition: Box<SyntaxNode>,
        then_branch: Box<SyntaxNode>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        else_branch: Option<Box<SyntaxNode>>,
    },
    Return {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Box<SyntaxNode>>,
    },
    Assignment {
        target: String,
        value: Box<SyntaxNode>,
    },
    MethodCall {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        receiver: Option<String>,
        name: String,
        #[serde(default)]
        arguments: Vec<SyntaxNode>,
    },
    BinaryExpr {
        op: BinaryOp,
        left: Box<SyntaxNode>,
        right: Box<SyntaxNode>,
    },
    UnaryExpr {
        op: UnaryOp,
        operand: Box<SyntaxNode>,
    },
    Literal {
        value: LiteralValue,
    },
    Identifier {
        name: String,
    },
}

impl SyntaxNode {
    // Construction helpers, used heavily by rules and tests.

    pub fn block(statements: Vec<SyntaxNode>) -> Self {
        SyntaxNode::Block { statements }
    }

    pub fn if_then(condition: SyntaxNode, then_branch: SyntaxNode) -> Self {
        SyntaxNode::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: None,
        }
    }

    pub fn if_else(condition: SyntaxNode, then_branch: SyntaxNode, else_branch: SyntaxNode) -> Self {
        SyntaxNode::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Some(Box::new(else_branch)),
        }
    }

    pub fn ret(value: Option<SyntaxNode>) -> Self {
        SyntaxNode::Return {
            value: value.map(Box::new),
        }
    }

    pub fn assign(target: &str, value: SyntaxNode) -> Self {
        SyntaxNode::Assignment {
            target: target.to_string(),
            value: Box::new(value),
        }
    }

    pub fn call(name: &str, arguments: Vec<SyntaxNode>) -> Self {
        SyntaxNode::MethodCall {
            receiver: None,
            name: name.to_string(),
            arguments,
        }
    }

    pub fn call_on(receiver: &str, name: &str, arguments: Vec<SyntaxNode>) -> Self {
        SyntaxNode::MethodCall {
            receiver: Some(receiver.to_string()),
            name: name.to_string(),
            arguments,
        }
    }

    pub fn binary(op: BinaryOp, left: SyntaxNode, right: SyntaxNode) -> Self {
        SyntaxNode::BinaryExpr {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn not(operand: SyntaxNode) -> Self {
        SyntaxNode::UnaryExpr {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        }
    }

    pub fn int(n: i64) -> Self {
        SyntaxNode::Literal {
            value: LiteralValue::Int(n),
        }
    }

    pub fn decimal(s: &str) -> Self {
        SyntaxNode::Literal {
            value: LiteralValue::Decimal(s.to_string()),
        }
    }

    pub fn boolean(b: bool) -> Self {
        SyntaxNode::Literal {
            value: LiteralValue::Bool(b),
        }
    }

    pub fn ident(name: &str) -> Self {
        SyntaxNode::Identifier {
            name: name.to_string(),
        }
    }

    /// Node kind name, used in messages and reports
    pub fn kind(&self) -> &'static str {
        match self {
            SyntaxNode::Block { .. } => "block",
            SyntaxNode::If { .. } => "if",
            SyntaxNode::Return { .. } => "return",
            SyntaxNode::Assignment { .. } => "assignment",
            SyntaxNode::MethodCall { .. } => "method_call",
            SyntaxNode::BinaryExpr { .. } => "binary_expr",
            SyntaxNode::UnaryExpr { .. } => "unary_expr",
            SyntaxNode::Literal { .. } => "literal",
            SyntaxNode::Identifier { .. } => "identifier",
        }
    }

    /// Children in deterministic order (condition before branches)
    pub fn children(&self) -> Vec<&SyntaxNode> {
        match self {
            SyntaxNode::Block { statements } => statements.iter().collect(),
            SyntaxNode::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let mut out = vec![condition.as_ref(), then_branch.as_ref()];
                if let Some(e) = else_branch {
                    out.push(e.as_ref());
                }
                out
            }
            SyntaxNode::Return { value } => value.iter().map(|v| v.as_ref()).collect(),
            SyntaxNode::Assignment { value, .. } => vec![value.as_ref()],
            SyntaxNode::MethodCall { arguments, .. } => arguments.iter().collect(),
            SyntaxNode::BinaryExpr { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            SyntaxNode::UnaryExpr { operand, .. } => vec![operand.as_ref()],
            SyntaxNode::Literal { .. } | SyntaxNode::Identifier { .. } => Vec::new(),
        }
    }

    /// Depth-first pre-order traversal including the node itself
    ///
    /// Lazy and restartable: the tree never changes under the iterator.
    pub fn walk(&self) -> Descendants<'_> {
        Descendants {
            stack: vec![(NodePath::root(), self)],
        }
    }

    /// Resolve a child-index path from this node
    pub fn node_at(&self, path: &NodePath) -> Option<&SyntaxNode> {
        let mut current = self;
        for &idx in &path.0 {
            current = *current.children().get(idx)?;
        }
        Some(current)
    }

    /// Structural fingerprint of the subtree rooted here
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    /// Persistent update: a new tree with the subtree at `path` replaced
    ///
    /// Siblings and ancestors are structurally copied; the original tree
    /// is untouched. Returns `None` if the path does not resolve.
    pub fn with_replacement(&self, path: &NodePath, replacement: SyntaxNode) -> Option<SyntaxNode> {
        self.replace_inner(&path.0, replacement)
    }

    fn replace_inner(&self, path: &[usize], replacement: SyntaxNode) -> Option<SyntaxNode> {
        let Some((&idx, rest)) = path.split_first() else {
            return Some(replacement);
        };

        match self {
            SyntaxNode::Block { statements } => {
                let new_child = statements.get(idx)?.replace_inner(rest, replacement)?;
                let mut out = statements.clone();
                out[idx] = new_child;
                Some(SyntaxNode::Block { statements: out })
            }
            SyntaxNode::If {
                condition,
                then_branch,
                else_branch,
            } => match idx {
                0 => Some(SyntaxNode::If {
                    condition: Box::new(condition.replace_inner(rest, replacement)?),
                    then_branch: then_branch.clone(),
                    else_branch: else_branch.clone(),
                }),
                1 => Some(SyntaxNode::If {
                    condition: condition.clone(),
                    then_branch: Box::new(then_branch.replace_inner(rest, replacement)?),
                    else_branch: else_branch.clone(),
                }),
                2 => Some(SyntaxNode::If {
                    condition: condition.clone(),
                    then_branch: then_branch.clone(),
                    else_branch: Some(Box::new(
                        else_branch.as_deref()?.replace_inner(rest, replacement)?,
                    )),
                }),
                _ => None,
            },
            SyntaxNode::Return { value } => {
                if idx != 0 {
                    return None;
                }
                Some(SyntaxNode::Return {
                    value: Some(Box::new(
                        value.as_deref()?.replace_inner(rest, replacement)?,
                    )),
                })
            }
            SyntaxNode::Assignment { target, value } => {
                if idx != 0 {
                    return None;
                }
                Some(SyntaxNode::Assignment {
                    target: target.clone(),
                    value: Box::new(value.replace_inner(rest, replacement)?),
                })
            }
            SyntaxNode::MethodCall {
                receiver,
                name,
                arguments,
            } => {
                let new_child = arguments.get(idx)?.replace_inner(rest, replacement)?;
                let mut out = arguments.clone();
                out[idx] = new_child;
                Some(SyntaxNode::MethodCall {
                    receiver: receiver.clone(),
                    name: name.clone(),
                    arguments: out,
                })
            }
            SyntaxNode::BinaryExpr { op, left, right } => match idx {
                0 => Some(SyntaxNode::BinaryExpr {
                    op: *op,
                    left: Box::new(left.replace_inner(rest, replacement)?),
                    right: right.clone(),
                }),
                1 => Some(SyntaxNode::BinaryExpr {
                    op: *op,
                    left: left.clone(),
                    right: Box::new(right.replace_inner(rest, replacement)?),
                }),
                _ => None,
            },
            SyntaxNode::UnaryExpr { op, operand } => {
                if idx != 0 {
                    return None;
                }
                Some(SyntaxNode::UnaryExpr {
                    op: *op,
                    operand: Box::new(operand.replace_inner(rest, replacement)?),
                })
            }
            SyntaxNode::Literal { .. } | SyntaxNode::Identifier { .. } => None,
        }
    }

    /// Logical negation for guard-clause rewrites
    ///
    /// Comparisons flip their operator; an existing not unwraps; anything
    /// else is wrapped in a logical not. No De Morgan expansion.
    pub fn negated(&self) -> SyntaxNode {
        match self {
            SyntaxNode::UnaryExpr {
                op: UnaryOp::Not,
                operand,
            } => operand.as_ref().clone(),
            SyntaxNode::BinaryExpr { op, left, right } => match op.inverted() {
                Some(inv) => SyntaxNode::BinaryExpr {
                    op: inv,
                    left: left.clone(),
                    right: right.clone(),
                },
                None => SyntaxNode::not(self.clone()),
            },
            SyntaxNode::Literal {
                value: LiteralValue::Bool(b),
            } => SyntaxNode::boolean(!b),
            other => SyntaxNode::not(other.clone()),
        }
    }

    fn write_expr(&self, out: &mut String, parent_prec: u8) {
        match self {
            SyntaxNode::BinaryExpr { op, left, right } => {
                let prec = op.precedence();
                if prec < parent_prec {
                    out.push('(');
                }
                left.write_expr(out, prec);
                out.push(' ');
                out.push_str(op.symbol());
                out.push(' ');
                right.write_expr(out, prec + 1);
                if prec < parent_prec {
                    out.push(')');
                }
            }
            SyntaxNode::UnaryExpr { op, operand } => {
                out.push_str(match op {
                    UnaryOp::Not => "!",
                    UnaryOp::Neg => "-",
                });
                operand.write_expr(out, u8::MAX);
            }
            SyntaxNode::Literal { value } => {
                out.push_str(&value.to_string());
            }
            SyntaxNode::Identifier { name } => out.push_str(name),
            SyntaxNode::MethodCall {
                receiver,
                name,
                arguments,
            } => {
                if let Some(r) = receiver {
                    out.push_str(r);
                    out.push('.');
                }
                out.push_str(name);
                out.push('(');
                for (i, arg) in arguments.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    arg.write_expr(out, 0);
                }
                out.push(')');
            }
            // Statements rendered in expression position fall back to the
            // statement printer without indentation.
            other => other.write_stmt(out, 0),
        }
    }

    fn write_stmt(&self, out: &mut String, indent: usize) {
        let pad = "    ".repeat(indent);
        match self {
            SyntaxNode::Block { statements } => {
                for stmt in statements {
                    stmt.write_stmt(out, indent);
                }
            }
            SyntaxNode::If {
                condition,
                then_branch,
                else_branch,
            } => {
                out.push_str(&pad);
                out.push_str("if (");
                condition.write_expr(out, 0);
                out.push_str(") {\n");
                then_branch.write_stmt(out, indent + 1);
                out.push_str(&pad);
                out.push('}');
                if let Some(e) = else_branch {
                    out.push_str(" else {\n");
                    e.write_stmt(out, indent + 1);
                    out.push_str(&pad);
                    out.push('}');
                }
                out.push('\n');
            }
            SyntaxNode::Return { value } => {
                out.push_str(&pad);
                out.push_str("return");
                if let Some(v) = value {
                    out.push(' ');
                    v.write_expr(out, 0);
                }
                out.push_str(";\n");
            }
            SyntaxNode::Assignment { target, value } => {
                out.push_str(&pad);
                out.push_str(target);
                out.push_str(" = ");
                value.write_expr(out, 0);
                out.push_str(";\n");
            }
            expr => {
                out.push_str(&pad);
                expr.write_expr(out, 0);
                out.push_str(";\n");
            }
        }
    }

    /// Pseudocode rendering of this subtree
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        match self {
            SyntaxNode::Block { .. }
            | SyntaxNode::If { .. }
            | SyntaxNode::Return { .. }
            | SyntaxNode::Assignment { .. } => self.write_stmt(&mut out, 0),
            _ => self.write_expr(&mut out, 0),
        }
        out
    }
}

impl fmt::Display for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_source())
    }
}

/// Child-index path from a body root to a node
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodePath(pub Vec<usize>);

impl NodePath {
    pub fn root() -> Self {
        NodePath(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn child(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(index);
        NodePath(segments)
    }

    /// True if `self` lies on or below `ancestor`
    pub fn starts_with(&self, ancestor: &NodePath) -> bool {
        self.0.len() >= ancestor.0.len() && self.0[..ancestor.0.len()] == ancestor.0[..]
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "(root)");
        }
        let parts: Vec<String> = self.0.iter().map(|i| i.to_string()).collect();
        write!(f, "{}", parts.join("."))
    }
}

/// Pre-order iterator over a subtree, yielding paths relative to the root
pub struct Descendants<'a> {
    stack: Vec<(NodePath, &'a SyntaxNode)>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = (NodePath, &'a SyntaxNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (path, node) = self.stack.pop()?;
        let children = node.children();
        for (i, child) in children.into_iter().enumerate().rev() {
            self.stack.push((path.child(i), child));
        }
        Some((path, node))
    }
}

/// A named constant in a method's enclosing scope
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constant {
    pub name: String,
    pub value: LiteralValue,
}

impl Constant {
    pub fn new(name: &str, value: LiteralValue) -> Self {
        Self {
            name: name.to_string(),
            value,
        }
    }
}

/// A method under analysis: the unit of scanning and rewriting
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub constants: Vec<Constant>,
    pub body: SyntaxNode,
}

impl Method {
    pub fn new(name: &str, parameters: Vec<&str>, body: SyntaxNode) -> Self {
        Self {
            name: name.to_string(),
            parameters: parameters.into_iter().map(String::from).collect(),
            constants: Vec::new(),
            body,
        }
    }

    /// Pre-order traversal of the body
    pub fn walk(&self) -> Descendants<'_> {
        self.body.walk()
    }

    /// Pseudocode rendering including constants
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        for c in &self.constants {
            out.push_str(&format!("const {} = {};\n", c.name, c.value));
        }
        if !self.constants.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!("{}({}) {{\n", self.name, self.parameters.join(", ")));
        self.body.write_stmt(&mut out, 1);
        out.push_str("}\n");
        out
    }
}

/// Check the structural invariants scan and rewrite rely on
///
/// Fails fast instead of silently skipping malformed nodes: the body and
/// every if-branch must be a Block, names must be non-empty, and decimal
/// literals must hold parsable text.
pub fn validate(method: &Method) -> Result<(), SyntaxError> {
    if !matches!(method.body, SyntaxNode::Block { .. }) {
        return Err(SyntaxError::Malformed {
            path: NodePath::root(),
            detail: "method body must be a block".to_string(),
        });
    }

    for (path, node) in method.walk() {
        match node {
            SyntaxNode::If {
                then_branch,
                else_branch,
                ..
            } => {
                if !matches!(then_branch.as_ref(), SyntaxNode::Block { .. }) {
                    return Err(SyntaxError::Malformed {
                        path,
                        detail: "if then-branch must be a block".to_string(),
                    });
                }
                if let Some(e) = else_branch {
                    if !matches!(e.as_ref(), SyntaxNode::Block { .. }) {
                        return Err(SyntaxError::Malformed {
                            path,
                            detail: "if else-branch must be a block".to_string(),
                        });
                    }
                }
            }
            SyntaxNode::Assignment { target, .. } if target.is_empty() => {
                return Err(SyntaxError::Malformed {
                    path,
                    detail: "assignment target must not be empty".to_string(),
                });
            }
            SyntaxNode::MethodCall { name, .. } if name.is_empty() => {
                return Err(SyntaxError::Malformed {
                    path,
                    detail: "method call name must not be empty".to_string(),
                });
            }
            SyntaxNode::Identifier { name } if name.is_empty() => {
                return Err(SyntaxError::Malformed {
                    path,
                    detail: "identifier name must not be empty".to_string(),
                });
            }
            SyntaxNode::Literal {
                value: LiteralValue::Decimal(s),
            } if s.parse::<f64>().is_err() => {
                return Err(SyntaxError::Malformed {
                    path,
                    detail: format!("invalid decimal literal '{}'", s),
                });
            }
            _ => {}
        }
    }

    Ok(())
}
