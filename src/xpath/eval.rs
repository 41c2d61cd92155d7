//! XPath Evaluation Engine
//!
//! Evaluates compiled XPath programs against the arena DOM. Every query runs
//! inside the tree of its context node: `/` is the top ancestor of the
//! context, which for a detached subtree is the subtree root.

use super::axes::{matches_node_test, navigate};
use super::compiler::{compile_cached, CompiledExpr, Op};
use super::functions::{self, number_value, string_value};
use super::parser::{BinaryOp, NodeTest};
use super::value::XPathValue;
use crate::dom::namespace::ns;
use crate::dom::{Document, NodeId};
use std::collections::HashMap;

/// Evaluation context
pub struct EvalContext<'a> {
    pub doc: &'a Document,
    pub context_node: NodeId,
    pub context_position: usize,
    pub context_size: usize,
    /// Prefix bindings for name tests, first match wins
    pub namespaces: &'a [(String, String)],
    /// Document order of the context node's tree
    pub order: &'a HashMap<NodeId, usize>,
}

impl<'a> EvalContext<'a> {
    fn at(&self, node: NodeId, position: usize, size: usize) -> EvalContext<'a> {
        EvalContext {
            doc: self.doc,
            context_node: node,
            context_position: position,
            context_size: size,
            namespaces: self.namespaces,
            order: self.order,
        }
    }

    fn resolve_prefix(&self, prefix: &str) -> Result<&'a str, String> {
        if prefix == "xml" {
            return Ok(ns::XML);
        }
        self.namespaces
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
            .ok_or_else(|| format!("Unbound namespace prefix: {}", prefix))
    }

    fn sort_document_order(&self, nodes: &mut Vec<NodeId>) {
        nodes.sort_by_key(|&n| (self.order.get(&n).copied().unwrap_or(usize::MAX), n));
        nodes.dedup();
    }
}

/// Evaluate an XPath expression from a context node.
///
/// Prefixed name tests resolve through `namespaces` first, then through the
/// namespaces in scope at the context node.
#[must_use = "XPath evaluation result should be used"]
pub fn evaluate(
    doc: &Document,
    context_node: NodeId,
    xpath: &str,
    namespaces: &[(String, String)],
) -> Result<XPathValue, String> {
    let compiled = compile_cached(xpath)?;
    let mut bindings = namespaces.to_vec();
    bindings.extend(doc.in_scope_namespaces(context_node));
    let order = doc.document_order(doc.top_ancestor(context_node));
    let ctx = EvalContext {
        doc,
        context_node,
        context_position: 1,
        context_size: 1,
        namespaces: &bindings,
        order: &order,
    };
    evaluate_compiled(&compiled, &ctx)
}

/// Evaluate an expression that must produce a node-set
pub fn select_nodes(
    doc: &Document,
    context_node: NodeId,
    xpath: &str,
    namespaces: &[(String, String)],
) -> Result<Vec<NodeId>, String> {
    evaluate(doc, context_node, xpath, namespaces)?
        .into_nodeset()
        .ok_or_else(|| "Expression does not select nodes".to_string())
}

/// Evaluate a compiled expression
pub fn evaluate_compiled(expr: &CompiledExpr, ctx: &EvalContext<'_>) -> Result<XPathValue, String> {
    let mut stack: Vec<XPathValue> = Vec::new();

    for op in &expr.ops {
        match op {
            Op::Root => {
                stack.push(XPathValue::single_node(ctx.doc.top_ancestor(ctx.context_node)));
            }

            Op::Context => {
                stack.push(XPathValue::single_node(ctx.context_node));
            }

            Op::Navigate {
                axis,
                test,
                predicates,
            } => {
                let input = pop_nodeset(&mut stack, "Location step")?;
                let uri = match test {
                    NodeTest::QName(prefix, _) | NodeTest::NamespaceWildcard(prefix) => {
                        Some(ctx.resolve_prefix(prefix)?)
                    }
                    _ => None,
                };

                let mut result = Vec::new();
                for node in input {
                    let mut candidates: Vec<NodeId> = navigate(ctx.doc, node, *axis)
                        .into_iter()
                        .filter(|&n| matches_node_test(ctx.doc, n, *axis, test, uri))
                        .collect();
                    for predicate in predicates {
                        candidates = filter(&candidates, predicate, ctx)?;
                    }
                    result.extend(candidates);
                }
                ctx.sort_document_order(&mut result);
                stack.push(XPathValue::NodeSet(result));
            }

            Op::Predicate(predicate) => {
                let input = pop_nodeset(&mut stack, "Predicate")?;
                stack.push(XPathValue::NodeSet(filter(&input, predicate, ctx)?));
            }

            Op::Union => {
                let right = pop_nodeset(&mut stack, "Union")?;
                let mut left = pop_nodeset(&mut stack, "Union")?;
                left.extend(right);
                ctx.sort_document_order(&mut left);
                stack.push(XPathValue::NodeSet(left));
            }

            Op::Number(n) => stack.push(XPathValue::Number(*n)),

            Op::String(s) => stack.push(XPathValue::String(s.clone())),

            Op::Call(name, argc) => {
                let split = stack
                    .len()
                    .checked_sub(*argc)
                    .ok_or_else(|| format!("Stack underflow calling {}()", name))?;
                let args = stack.split_off(split);
                stack.push(functions::call(name, args, ctx)?);
            }

            Op::Binary(op) => {
                let right = pop(&mut stack)?;
                let left = pop(&mut stack)?;
                let doc = ctx.doc;
                let num = |v: &XPathValue| number_value(doc, v);
                let result = match op {
                    BinaryOp::Or => XPathValue::Boolean(left.to_boolean() || right.to_boolean()),
                    BinaryOp::And => XPathValue::Boolean(left.to_boolean() && right.to_boolean()),
                    BinaryOp::Eq
                    | BinaryOp::NotEq
                    | BinaryOp::Lt
                    | BinaryOp::LtEq
                    | BinaryOp::Gt
                    | BinaryOp::GtEq => XPathValue::Boolean(compare(doc, *op, &left, &right)),
                    BinaryOp::Add => XPathValue::Number(num(&left) + num(&right)),
                    BinaryOp::Sub => XPathValue::Number(num(&left) - num(&right)),
                    BinaryOp::Mul => XPathValue::Number(num(&left) * num(&right)),
                    BinaryOp::Div => XPathValue::Number(num(&left) / num(&right)),
                    BinaryOp::Mod => XPathValue::Number(num(&left) % num(&right)),
                };
                stack.push(result);
            }

            Op::Negate => {
                let value = pop(&mut stack)?;
                stack.push(XPathValue::Number(-number_value(ctx.doc, &value)));
            }

            Op::Variable(name) => {
                return Err(format!("Unbound variable: ${}", name));
            }
        }
    }

    pop(&mut stack)
}

fn pop(stack: &mut Vec<XPathValue>) -> Result<XPathValue, String> {
    stack.pop().ok_or_else(|| "Stack underflow".to_string())
}

fn pop_nodeset(stack: &mut Vec<XPathValue>, what: &str) -> Result<Vec<NodeId>, String> {
    pop(stack)?
        .into_nodeset()
        .ok_or_else(|| format!("{} requires a node-set", what))
}

/// Keep the nodes for which the predicate holds. A number result selects
/// by position within `nodes`.
fn filter(
    nodes: &[NodeId],
    predicate: &CompiledExpr,
    ctx: &EvalContext<'_>,
) -> Result<Vec<NodeId>, String> {
    let size = nodes.len();
    let mut kept = Vec::new();
    for (i, &node) in nodes.iter().enumerate() {
        let position = i + 1;
        let keep = match evaluate_compiled(predicate, &ctx.at(node, position, size))? {
            XPathValue::Number(n) => n == position as f64,
            other => other.to_boolean(),
        };
        if keep {
            kept.push(node);
        }
    }
    Ok(kept)
}

/// Comparable primitive
enum Atom {
    Str(String),
    Num(f64),
    Bool(bool),
}

impl Atom {
    fn from_value(doc: &Document, value: &XPathValue) -> Self {
        match value {
            XPathValue::String(s) => Atom::Str(s.clone()),
            XPathValue::Number(n) => Atom::Num(*n),
            XPathValue::Boolean(b) => Atom::Bool(*b),
            XPathValue::NodeSet(_) => Atom::Str(string_value(doc, value)),
        }
    }

    fn number(&self) -> f64 {
        match self {
            Atom::Str(s) => super::value::parse_number(s),
            Atom::Num(n) => *n,
            Atom::Bool(b) => f64::from(u8::from(*b)),
        }
    }

    fn boolean(&self) -> bool {
        match self {
            Atom::Str(s) => !s.is_empty(),
            Atom::Num(n) => *n != 0.0 && !n.is_nan(),
            Atom::Bool(b) => *b,
        }
    }
}

fn compare_atoms(op: BinaryOp, a: &Atom, b: &Atom) -> bool {
    match op {
        BinaryOp::Eq | BinaryOp::NotEq => {
            let equal = match (a, b) {
                (Atom::Bool(_), _) | (_, Atom::Bool(_)) => a.boolean() == b.boolean(),
                (Atom::Num(_), _) | (_, Atom::Num(_)) => a.number() == b.number(),
                (Atom::Str(x), Atom::Str(y)) => x == y,
            };
            (op == BinaryOp::Eq) == equal
        }
        BinaryOp::Lt => a.number() < b.number(),
        BinaryOp::LtEq => a.number() <= b.number(),
        BinaryOp::Gt => a.number() > b.number(),
        BinaryOp::GtEq => a.number() >= b.number(),
        _ => false,
    }
}

/// XPath 1.0 comparison. Node-sets compare existentially through the
/// string values of their nodes, except against a boolean.
fn compare(doc: &Document, op: BinaryOp, left: &XPathValue, right: &XPathValue) -> bool {
    let node_atom = |n: NodeId| Atom::Str(doc.string_value(n));
    match (left, right) {
        (XPathValue::NodeSet(l), XPathValue::NodeSet(r)) => {
            let right_atoms: Vec<Atom> = r.iter().map(|&n| node_atom(n)).collect();
            l.iter().any(|&n| {
                let a = node_atom(n);
                right_atoms.iter().any(|b| compare_atoms(op, &a, b))
            })
        }
        (XPathValue::NodeSet(l), XPathValue::Boolean(b)) => {
            compare_atoms(op, &Atom::Bool(!l.is_empty()), &Atom::Bool(*b))
        }
        (XPathValue::Boolean(b), XPathValue::NodeSet(r)) => {
            compare_atoms(op, &Atom::Bool(*b), &Atom::Bool(!r.is_empty()))
        }
        (XPathValue::NodeSet(l), other) => {
            let b = Atom::from_value(doc, other);
            l.iter().any(|&n| compare_atoms(op, &node_atom(n), &b))
        }
        (other, XPathValue::NodeSet(r)) => {
            let a = Atom::from_value(doc, other);
            r.iter().any(|&n| compare_atoms(op, &a, &node_atom(n)))
        }
        (a, b) => compare_atoms(op, &Atom::from_value(doc, a), &Atom::from_value(doc, b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(doc: &Document, xpath: &str) -> Vec<String> {
        let root = doc.root_element().unwrap();
        select_nodes(doc, root, xpath, &[])
            .unwrap()
            .into_iter()
            .map(|n| doc.string_value(n))
            .collect()
    }

    fn eval(doc: &Document, xpath: &str) -> XPathValue {
        evaluate(doc, doc.root_element().unwrap(), xpath, &[]).unwrap()
    }

    fn list() -> Document {
        Document::parse("<ul><li>a</li><li>b</li><li>c</li></ul>").unwrap()
    }

    #[test]
    fn test_simple_path() {
        let doc = list();
        assert_eq!(select(&doc, "/ul/li"), vec!["a", "b", "c"]);
        assert_eq!(select(&doc, "li"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_descendant() {
        let doc = Document::parse("<r><a><b>1</b></a><b>2</b></r>").unwrap();
        assert_eq!(select(&doc, "//b"), vec!["1", "2"]);
        assert_eq!(select(&doc, ".//b"), vec!["1", "2"]);
    }

    #[test]
    fn test_positional_predicates() {
        let doc = list();
        assert_eq!(select(&doc, "li[1]"), vec!["a"]);
        assert_eq!(select(&doc, "li[last()]"), vec!["c"]);
        assert_eq!(select(&doc, "li[position() > 1]"), vec!["b", "c"]);
    }

    #[test]
    fn test_predicates_apply_per_context_node() {
        let doc = Document::parse("<r><ul><li>a</li><li>b</li></ul><ul><li>c</li></ul></r>")
            .unwrap();
        assert_eq!(select(&doc, "//li[1]"), vec!["a", "c"]);
        assert_eq!(select(&doc, "(//li)[1]"), vec!["a"]);
    }

    #[test]
    fn test_reverse_axis_positions() {
        let doc = list();
        let root = doc.root_element().unwrap();
        let last = select_nodes(&doc, root, "li[3]", &[]).unwrap()[0];
        let prev = select_nodes(&doc, last, "preceding-sibling::li[1]", &[]).unwrap();
        assert_eq!(doc.string_value(prev[0]), "b");
    }

    #[test]
    fn test_union_in_document_order() {
        let doc = Document::parse("<r><a/><b/><c/></r>").unwrap();
        let root = doc.root_element().unwrap();
        let nodes = select_nodes(&doc, root, "c | a", &[]).unwrap();
        let names: Vec<&str> = nodes.iter().map(|&n| doc.name(n)).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_attribute_comparisons() {
        let doc = Document::parse(r#"<r><i n="1"/><i n="2"/><i n="3"/></r>"#).unwrap();
        assert_eq!(eval(&doc, "count(i[@n > 1])"), XPathValue::Number(2.0));
        assert_eq!(eval(&doc, "count(i[@n = '2'])"), XPathValue::Number(1.0));
        assert_eq!(eval(&doc, "i/@n = 3"), XPathValue::Boolean(true));
        assert_eq!(eval(&doc, "i/@n != 1"), XPathValue::Boolean(true));
        assert_eq!(eval(&doc, "missing = false()"), XPathValue::Boolean(true));
    }

    #[test]
    fn test_arithmetic() {
        let doc = list();
        assert_eq!(eval(&doc, "1 + 2 * 3"), XPathValue::Number(7.0));
        assert_eq!(eval(&doc, "7 mod 3"), XPathValue::Number(1.0));
        assert_eq!(eval(&doc, "-count(li)"), XPathValue::Number(-3.0));
    }

    #[test]
    fn test_namespaces() {
        let doc = Document::parse(r#"<r xmlns:a="urn:a"><a:x>1</a:x><x>2</x></r>"#).unwrap();
        let root = doc.root_element().unwrap();
        assert_eq!(select(&doc, "a:x"), vec!["1"]);
        assert_eq!(select(&doc, "x"), vec!["2"]);
        let bindings = vec![("p".to_string(), "urn:a".to_string())];
        let nodes = select_nodes(&doc, root, "p:*", &bindings).unwrap();
        assert_eq!(nodes.len(), 1);
        assert!(select_nodes(&doc, root, "q:x", &[]).is_err());
    }

    #[test]
    fn test_detached_subtree_root() {
        let mut doc = list();
        let root = doc.root_element().unwrap();
        let li = select_nodes(&doc, root, "li[2]", &[]).unwrap()[0];
        doc.detach(li);
        let found = select_nodes(&doc, li, "/", &[]).unwrap();
        assert_eq!(found, vec![li]);
        assert!(select_nodes(&doc, li, "//li", &[]).unwrap().is_empty());
    }

    #[test]
    fn test_errors() {
        let doc = list();
        let root = doc.root_element().unwrap();
        assert!(evaluate(&doc, root, "$x", &[]).is_err());
        assert!(evaluate(&doc, root, "1 | li", &[]).is_err());
        assert!(select_nodes(&doc, root, "count(li)", &[]).is_err());
    }
}
