//! XPath 1.0 Functions
//!
//! The XPath 1.0 core function library:
//!
//! Node Set Functions:
//! - position(), last(), count(), local-name(), namespace-uri(), name()
//!
//! String Functions:
//! - string(), concat(), starts-with(), contains(), substring(),
//!   substring-before(), substring-after(), string-length(),
//!   normalize-space(), translate()
//!
//! Boolean Functions:
//! - boolean(), not(), true(), false(), lang()
//!
//! Number Functions:
//! - number(), sum(), floor(), ceiling(), round()
//!
//! id() needs DTD attribute types, which are never read, and always fails.

use super::eval::EvalContext;
use super::value::{format_number, parse_number, XPathValue};
use crate::dom::{Document, NodeId};

/// Evaluate a function call
pub fn call(name: &str, args: Vec<XPathValue>, ctx: &EvalContext<'_>) -> Result<XPathValue, String> {
    let doc = ctx.doc;
    match name {
        // Node Set Functions
        "position" => {
            arity(name, &args, 0, 0)?;
            Ok(XPathValue::Number(ctx.context_position as f64))
        }
        "last" => {
            arity(name, &args, 0, 0)?;
            Ok(XPathValue::Number(ctx.context_size as f64))
        }
        "count" => {
            arity(name, &args, 1, 1)?;
            Ok(XPathValue::Number(nodeset_arg(name, &args[0])?.len() as f64))
        }
        "local-name" => node_name_fn(name, &args, ctx, |doc, n| doc.local_name(n).to_string()),
        "namespace-uri" => node_name_fn(name, &args, ctx, |doc, n| {
            doc.namespace_uri(n).unwrap_or_default().to_string()
        }),
        "name" => node_name_fn(name, &args, ctx, |doc, n| doc.name(n).to_string()),
        "id" => Err("id() is not supported".to_string()),

        // String Functions
        "string" => {
            arity(name, &args, 0, 1)?;
            Ok(XPathValue::String(string_arg(&args, 0, ctx)))
        }
        "concat" => {
            if args.len() < 2 {
                return Err("concat() requires at least 2 arguments".to_string());
            }
            let result: String = args.iter().map(|a| string_value(doc, a)).collect();
            Ok(XPathValue::String(result))
        }
        "starts-with" => {
            arity(name, &args, 2, 2)?;
            let s = string_value(doc, &args[0]);
            Ok(XPathValue::Boolean(s.starts_with(&string_value(doc, &args[1]))))
        }
        "contains" => {
            arity(name, &args, 2, 2)?;
            let s = string_value(doc, &args[0]);
            Ok(XPathValue::Boolean(s.contains(&string_value(doc, &args[1]))))
        }
        "substring" => {
            arity(name, &args, 2, 3)?;
            let s = string_value(doc, &args[0]);
            let start = round(number_value(doc, &args[1]));
            let end = match args.get(2) {
                Some(len) => start + round(number_value(doc, len)),
                None => f64::INFINITY,
            };
            let result: String = s
                .chars()
                .enumerate()
                .filter(|(i, _)| {
                    let p = (*i + 1) as f64;
                    p >= start && p < end
                })
                .map(|(_, c)| c)
                .collect();
            Ok(XPathValue::String(result))
        }
        "substring-before" => {
            arity(name, &args, 2, 2)?;
            let s = string_value(doc, &args[0]);
            let pattern = string_value(doc, &args[1]);
            let result = s.find(&pattern).map_or("", |i| &s[..i]);
            Ok(XPathValue::String(result.to_string()))
        }
        "substring-after" => {
            arity(name, &args, 2, 2)?;
            let s = string_value(doc, &args[0]);
            let pattern = string_value(doc, &args[1]);
            let result = s.find(&pattern).map_or("", |i| &s[i + pattern.len()..]);
            Ok(XPathValue::String(result.to_string()))
        }
        "string-length" => {
            arity(name, &args, 0, 1)?;
            let s = string_arg(&args, 0, ctx);
            Ok(XPathValue::Number(s.chars().count() as f64))
        }
        "normalize-space" => {
            arity(name, &args, 0, 1)?;
            Ok(XPathValue::String(normalize_space(&string_arg(&args, 0, ctx))))
        }
        "translate" => {
            arity(name, &args, 3, 3)?;
            let s = string_value(doc, &args[0]);
            let from: Vec<char> = string_value(doc, &args[1]).chars().collect();
            let to: Vec<char> = string_value(doc, &args[2]).chars().collect();
            let result: String = s
                .chars()
                .filter_map(|c| match from.iter().position(|&f| f == c) {
                    Some(i) => to.get(i).copied(),
                    None => Some(c),
                })
                .collect();
            Ok(XPathValue::String(result))
        }

        // Boolean Functions
        "boolean" => {
            arity(name, &args, 1, 1)?;
            Ok(XPathValue::Boolean(args[0].to_boolean()))
        }
        "not" => {
            arity(name, &args, 1, 1)?;
            Ok(XPathValue::Boolean(!args[0].to_boolean()))
        }
        "true" => {
            arity(name, &args, 0, 0)?;
            Ok(XPathValue::Boolean(true))
        }
        "false" => {
            arity(name, &args, 0, 0)?;
            Ok(XPathValue::Boolean(false))
        }
        "lang" => {
            arity(name, &args, 1, 1)?;
            let wanted = string_value(doc, &args[0]).to_ascii_lowercase();
            Ok(XPathValue::Boolean(lang_matches(doc, ctx.context_node, &wanted)))
        }

        // Number Functions
        "number" => {
            arity(name, &args, 0, 1)?;
            let n = match args.first() {
                Some(arg) => number_value(doc, arg),
                None => parse_number(&doc.string_value(ctx.context_node)),
            };
            Ok(XPathValue::Number(n))
        }
        "sum" => {
            arity(name, &args, 1, 1)?;
            let total = nodeset_arg(name, &args[0])?
                .iter()
                .map(|&n| parse_number(&doc.string_value(n)))
                .sum();
            Ok(XPathValue::Number(total))
        }
        "floor" => {
            arity(name, &args, 1, 1)?;
            Ok(XPathValue::Number(number_value(doc, &args[0]).floor()))
        }
        "ceiling" => {
            arity(name, &args, 1, 1)?;
            Ok(XPathValue::Number(number_value(doc, &args[0]).ceil()))
        }
        "round" => {
            arity(name, &args, 1, 1)?;
            Ok(XPathValue::Number(round(number_value(doc, &args[0]))))
        }

        _ => Err(format!("Unknown function: {}()", name)),
    }
}

fn arity(name: &str, args: &[XPathValue], min: usize, max: usize) -> Result<(), String> {
    if args.len() < min || args.len() > max {
        return Err(format!(
            "{}() takes {} argument(s), got {}",
            name,
            if min == max { min.to_string() } else { format!("{}..{}", min, max) },
            args.len()
        ));
    }
    Ok(())
}

fn nodeset_arg<'v>(name: &str, value: &'v XPathValue) -> Result<&'v [NodeId], String> {
    value
        .as_nodeset()
        .ok_or_else(|| format!("{}() argument must be a node-set", name))
}

/// String of argument `i`, or of the context node when absent
fn string_arg(args: &[XPathValue], i: usize, ctx: &EvalContext<'_>) -> String {
    match args.get(i) {
        Some(arg) => string_value(ctx.doc, arg),
        None => ctx.doc.string_value(ctx.context_node),
    }
}

/// name(), local-name() and namespace-uri(): first node of the argument or
/// the context node
fn node_name_fn(
    name: &str,
    args: &[XPathValue],
    ctx: &EvalContext<'_>,
    get: impl Fn(&Document, NodeId) -> String,
) -> Result<XPathValue, String> {
    arity(name, args, 0, 1)?;
    let node = match args.first() {
        None => Some(ctx.context_node),
        Some(arg) => nodeset_arg(name, arg)?.first().copied(),
    };
    Ok(XPathValue::String(node.map(|n| get(ctx.doc, n)).unwrap_or_default()))
}

/// string() conversion; a node-set converts through its first node
pub fn string_value(doc: &Document, value: &XPathValue) -> String {
    match value {
        XPathValue::NodeSet(nodes) => nodes
            .first()
            .map(|&n| doc.string_value(n))
            .unwrap_or_default(),
        XPathValue::Boolean(b) => b.to_string(),
        XPathValue::Number(n) => format_number(*n),
        XPathValue::String(s) => s.clone(),
    }
}

/// number() conversion
pub fn number_value(doc: &Document, value: &XPathValue) -> f64 {
    match value {
        XPathValue::Number(n) => *n,
        XPathValue::Boolean(b) => f64::from(u8::from(*b)),
        XPathValue::String(s) => parse_number(s),
        XPathValue::NodeSet(_) => parse_number(&string_value(doc, value)),
    }
}

/// XPath round(): nearest integer, halves toward positive infinity
fn round(n: f64) -> f64 {
    if n.is_finite() {
        (n + 0.5).floor()
    } else {
        n
    }
}

/// Collapse runs of XML whitespace to one space and trim
pub fn normalize_space(s: &str) -> String {
    s.split(|c: char| matches!(c, ' ' | '\t' | '\n' | '\r'))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn lang_matches(doc: &Document, context: NodeId, wanted: &str) -> bool {
    let mut current = Some(context);
    while let Some(node) = current {
        if let Some(lang) = doc.attribute_value(node, "xml:lang") {
            let lang = lang.to_ascii_lowercase();
            return lang == wanted
                || lang
                    .strip_prefix(wanted)
                    .is_some_and(|rest| rest.starts_with('-'));
        }
        current = doc.parent(node);
    }
    false
}
