//! XPath Expression Compiler
//!
//! Compiles parsed XPath expressions into a flat stack-machine program.
//! Compiled programs are shared through a process-wide LRU cache keyed by
//! the expression text.

use super::parser::{Axis, BinaryOp, Expr, NodeTest, Step};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, LazyLock, Mutex};

/// Compiled expressions kept per process
const CACHE_CAPACITY: usize = 256;

/// Compiled XPath expression
#[derive(Debug, Clone)]
pub struct CompiledExpr {
    pub ops: Vec<Op>,
}

/// Compiled operation
#[derive(Debug, Clone)]
pub enum Op {
    /// Push the root of the context node's tree
    Root,
    /// Push the context node
    Context,
    /// Navigate along an axis, filtering each context node's candidates by
    /// the node test and then the step predicates (positions in axis order)
    Navigate {
        axis: Axis,
        test: NodeTest,
        predicates: Vec<CompiledExpr>,
    },
    /// Filter a node-set by a predicate (positions in document order)
    Predicate(Box<CompiledExpr>),
    /// Union two node sets
    Union,
    /// Push literal number
    Number(f64),
    /// Push literal string
    String(String),
    /// Call function: name, arg count
    Call(String, usize),
    /// Binary operation
    Binary(BinaryOp),
    /// Negate
    Negate,
    /// Variable reference
    Variable(String),
}

impl CompiledExpr {
    /// Compile an XPath expression
    pub fn compile(expr: &Expr) -> Self {
        let mut ops = Vec::new();
        Self::compile_expr(expr, &mut ops);
        CompiledExpr { ops }
    }

    fn compile_expr(expr: &Expr, ops: &mut Vec<Op>) {
        match expr {
            Expr::Root => ops.push(Op::Root),
            Expr::Number(n) => ops.push(Op::Number(*n)),
            Expr::String(s) => ops.push(Op::String(s.clone())),
            Expr::Variable(name) => ops.push(Op::Variable(name.clone())),
            Expr::Negate(inner) => {
                Self::compile_expr(inner, ops);
                ops.push(Op::Negate);
            }
            Expr::Binary(left, op, right) => {
                Self::compile_expr(left, ops);
                Self::compile_expr(right, ops);
                ops.push(Op::Binary(*op));
            }
            Expr::Union(left, right) => {
                Self::compile_expr(left, ops);
                Self::compile_expr(right, ops);
                ops.push(Op::Union);
            }
            Expr::Path(base, step) => {
                Self::compile_expr(base, ops);
                Self::compile_step(step, ops);
            }
            Expr::Filter(base, pred) => {
                Self::compile_expr(base, ops);
                ops.push(Op::Predicate(Box::new(CompiledExpr::compile(pred))));
            }
            Expr::Step(step) => {
                ops.push(Op::Context);
                Self::compile_step(step, ops);
            }
            Expr::Function(name, args) => {
                for arg in args {
                    Self::compile_expr(arg, ops);
                }
                ops.push(Op::Call(name.clone(), args.len()));
            }
        }
    }

    fn compile_step(step: &Step, ops: &mut Vec<Op>) {
        ops.push(Op::Navigate {
            axis: step.axis,
            test: step.node_test.clone(),
            predicates: step.predicates.iter().map(CompiledExpr::compile).collect(),
        });
    }
}

/// Compile an XPath expression string
pub fn compile(xpath: &str) -> Result<CompiledExpr, String> {
    let expr = super::parser::parse(xpath)?;
    Ok(CompiledExpr::compile(&expr))
}

static CACHE: LazyLock<Mutex<LruCache<String, Arc<CompiledExpr>>>> = LazyLock::new(|| {
    let capacity = NonZeroUsize::new(CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
    Mutex::new(LruCache::new(capacity))
});

/// Compile through the process-wide cache. Parse errors are not cached.
pub fn compile_cached(xpath: &str) -> Result<Arc<CompiledExpr>, String> {
    if let Some(hit) = CACHE
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .get(xpath)
    {
        return Ok(Arc::clone(hit));
    }

    tracing::trace!(xpath, "compiling xpath");
    let compiled = Arc::new(compile(xpath)?);
    CACHE
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .put(xpath.to_string(), Arc::clone(&compiled));
    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_simple() {
        let compiled = compile("/root").unwrap();
        assert!(matches!(compiled.ops[0], Op::Root));
        assert!(matches!(compiled.ops[1], Op::Navigate { axis: Axis::Child, .. }));
    }

    #[test]
    fn test_step_predicates_compiled_into_navigate() {
        let compiled = compile("li[1]").unwrap();
        assert_eq!(compiled.ops.len(), 2);
        match &compiled.ops[1] {
            Op::Navigate { predicates, .. } => assert_eq!(predicates.len(), 1),
            other => panic!("expected navigate, got {other:?}"),
        }
    }

    #[test]
    fn test_cache_returns_shared_program() {
        let a = compile_cached("//cached-item").unwrap();
        let b = compile_cached("//cached-item").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(compile_cached("//[").is_err());
    }
}
