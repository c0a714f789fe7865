//! The string constraint parser (spec.md §4.E): rewrites Python-like
//! arithmetic/comparison expressions into built-in constraint objects
//! where possible, falling back to a compiled predicate otherwise.
//!
//! Grounded on `original_source/constraint/parser.py`'s
//! `parseVariablesString`/`convertStrExpression` pipeline; `eval`
//! supplies the tokenizer, recursive-descent parser and AST this module
//! walks instead of calling into a host interpreter (§9: "must not
//! expose host-language eval"). The pipeline is implemented as the
//! eight stages of spec.md §4.E, numbered in the doc comments below.
//!
//! The parser only ever produces constraints over `Problem<String, f64>`
//! — string expressions name their variables as bare identifiers, which
//! only makes sense for a `String`-keyed problem, and the arithmetic the
//! grammar supports (`+ - * / ** <= >= < > == != and or`) is evaluated
//! as `f64` throughout, matching §9's "evaluates arithmetic over `f64`
//! internally regardless of the problem's concrete domain type".

mod eval;

use std::collections::{HashMap, HashSet};

use crate::constraint::{
    AllDifferentConstraint, AllEqualConstraint, Constraint, LinkedBound, PredicateConstraint,
    ProdBound, ProdConstraint, SumBound, SumConstraint, VariableLinkedProdConstraint,
    VariableLinkedSumConstraint,
};
use crate::domain::Domain;
use crate::error::CspError;
use crate::problem::ParserMode;

use eval::{CmpOp, Comparison, Expr};

/// One parsed result: the constraint object, the variables it touches
/// (in declaration order), and — only for the predicate fallback, and
/// only in `ParserMode::Serializable` — the source text a worker can
/// recompile from, per spec.md §4.E's output shape.
#[derive(Clone)]
pub struct ParsedConstraint {
    pub constraint: Constraint<String, f64>,
    pub variables: Vec<String>,
    pub source: Option<String>,
}

/// The parser's single entry point (spec.md §6: "Parser entry point").
///
/// `domains` is consulted only to tell a bare identifier apart from a
/// variable name — it drives stage 3's "collect the set of variables
/// touched" and stage 8's fallback-predicate argument list.
pub fn compile_to_constraints(
    strings: &[String],
    domains: &HashMap<String, Domain<f64>>,
    mode: ParserMode,
) -> Result<Vec<ParsedConstraint>, CspError> {
    let mut out = Vec::new();
    for source in dedup(strings) {
        out.extend(compile_one(&source, domains, mode)?);
    }
    Ok(out)
}

/// Stage 1: strip whitespace from each string, keep only the first
/// occurrence (order-preserving).
fn dedup(strings: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for raw in strings {
        let trimmed = raw.trim().to_string();
        if seen.insert(trimmed.clone()) {
            out.push(trimmed);
        }
    }
    out
}

fn contains_boolean_keyword(source: &str) -> bool {
    source.split_whitespace().any(|tok| tok == "and" || tok == "or")
}

fn compile_one(
    source: &str,
    domains: &HashMap<String, Domain<f64>>,
    mode: ParserMode,
) -> Result<Vec<ParsedConstraint>, CspError> {
    if source.is_empty() {
        return Err(CspError::ParseFailure(
            source.to_string(),
            "empty constraint expression".into(),
        ));
    }

    // Stage 2: chain splitting is only attempted on strings with no
    // `and`/`or` — boolean algebra is preserved untouched inside the
    // fallback predicate (§4.E non-goals).
    if contains_boolean_keyword(source) {
        return Ok(vec![fallback_predicate(source, domains, mode)?]);
    }

    let comparisons = match eval::parse_comparisons(source) {
        Ok(c) => c,
        Err(_) => {
            // Not a structural failure (unbalanced brackets, empty
            // expression already handled above) — just not a shape the
            // comparator grammar accepts. Fall through to the predicate,
            // which re-parses the raw source for its own evaluation.
            return Ok(vec![fallback_predicate(source, domains, mode)?]);
        }
    };

    let mut results = Vec::new();
    for (index, comparison) in comparisons.iter().enumerate() {
        let name = if comparisons.len() > 1 {
            format!("{source}#{index}")
        } else {
            source.to_string()
        };
        match match_comparison(&name, comparison, domains) {
            Some(parsed) => results.push(parsed),
            None => {
                // Stage 8 fallback operates on the *whole* original
                // source when chain-splitting produced more than one
                // piece and any piece fails structural matching would
                // be unsound to fall back on independently; the
                // original python implementation instead falls back
                // per-piece, which this mirrors for simplicity and to
                // keep each comparator's fallback scoped to just its
                // own two sides.
                results.push(fallback_comparison_predicate(
                    &name, comparison, domains, mode,
                )?);
            }
        }
    }
    Ok(results)
}

fn flip(op: &CmpOp) -> CmpOp {
    match op {
        CmpOp::Eq => CmpOp::Eq,
        CmpOp::Ne => CmpOp::Ne,
        CmpOp::Lt => CmpOp::Gt,
        CmpOp::Le => CmpOp::Ge,
        CmpOp::Gt => CmpOp::Lt,
        CmpOp::Ge => CmpOp::Le,
    }
}

/// Stages 5-7: try numeric-constant matching, then variable-linked
/// matching, then equality matching, in that order, on one comparison.
fn match_comparison(
    name: &str,
    comparison: &Comparison,
    domains: &HashMap<String, Domain<f64>>,
) -> Option<ParsedConstraint> {
    match_numeric_constraint(name, comparison, domains)
        .or_else(|| match_variable_linked(name, comparison, domains))
        .or_else(|| match_equality(name, comparison, domains))
}

/// Every variable an additive/multiplicative chain names, in order,
/// with duplicates rejected (the grammar wants a chain of *distinct*
/// variables) and every name checked against `domains`.
fn chain_variables(terms: &[String], domains: &HashMap<String, Domain<f64>>) -> Option<Vec<String>> {
    let mut seen = HashSet::new();
    for name in terms {
        if !domains.contains_key(name) || !seen.insert(name.clone()) {
            return None;
        }
    }
    Some(terms.to_vec())
}

/// Classifies `expr` as either a single variable, an unweighted sum
/// chain (`a+b+c`, every flattened term a distinct variable with
/// coefficient `+1` — no `-`, per the narrowed stage-4 rewrite this
/// crate implements, see the module doc), or an unweighted product
/// chain (`a*b*c`, no division). Returns `None` for anything else,
/// including any expression that mixes `+` and `*`.
enum Chain {
    Var(String),
    Sum(Vec<String>),
    Prod(Vec<String>),
}

fn classify_chain(expr: &Expr, domains: &HashMap<String, Domain<f64>>) -> Option<Chain> {
    if let Expr::Var(name) = expr {
        return domains.contains_key(name).then(|| Chain::Var(name.clone()));
    }
    if eval::is_purely_additive(expr) {
        let terms = eval::flatten_additive(expr);
        if terms.len() < 2 || terms.iter().any(|(sign, _)| *sign != 1.0) {
            return None;
        }
        let names: Vec<String> = terms
            .into_iter()
            .map(|(_, term)| match term {
                Expr::Var(name) => Some(name),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?;
        return chain_variables(&names, domains).map(Chain::Sum);
    }
    if eval::is_purely_multiplicative(expr) {
        let terms = eval::flatten_multiplicative(expr);
        if terms.len() < 2 || terms.iter().any(|(_, recip)| *recip) {
            return None;
        }
        let names: Vec<String> = terms
            .into_iter()
            .map(|(term, _)| match term {
                Expr::Var(name) => Some(name),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?;
        return chain_variables(&names, domains).map(Chain::Prod);
    }
    None
}

/// True if every value in every named domain is integral, which governs
/// whether `<`/`>` are mapped to `<=`/`>=` by ±1 (integer bounds) or by
/// ±1e-12 (general bounds), per spec.md §4.E stage 5.
fn is_integer_domain(names: &[String], domains: &HashMap<String, Domain<f64>>) -> bool {
    names.iter().all(|name| {
        domains
            .get(name)
            .map(|d| d.values().iter().all(|v| v.fract() == 0.0))
            .unwrap_or(false)
    })
}

/// Stage 5: one side evaluates to a numeric literal via the safe
/// expression evaluator; the other side is a single variable, a `+`
/// chain, or a `*` chain.
fn match_numeric_constraint(
    name: &str,
    comparison: &Comparison,
    domains: &HashMap<String, Domain<f64>>,
) -> Option<ParsedConstraint> {
    let (chain_expr, literal, op) = if let Some(value) = eval::eval_numeric_literal(&comparison.rhs) {
        (&comparison.lhs, value, comparison.op.clone())
    } else if let Some(value) = eval::eval_numeric_literal(&comparison.lhs) {
        (&comparison.rhs, value, flip(&comparison.op))
    } else {
        return None;
    };

    if op == CmpOp::Ne {
        // No sound numeric-bound mapping for "sum != k"; leave to the
        // predicate fallback.
        return None;
    }

    let chain = classify_chain(chain_expr, domains)?;
    let (variables, is_product) = match &chain {
        Chain::Var(v) => (vec![v.clone()], false),
        Chain::Sum(vars) => (vars.clone(), false),
        Chain::Prod(vars) => (vars.clone(), true),
    };

    let step = if is_integer_domain(&variables, domains) { 1.0 } else { 1e-12 };
    let (max_bound, min_bound, exact_bound) = match op {
        CmpOp::Le => (Some(literal), None, None),
        CmpOp::Ge => (None, Some(literal), None),
        CmpOp::Lt => (Some(literal - step), None, None),
        CmpOp::Gt => (None, Some(literal + step), None),
        CmpOp::Eq => (None, None, Some(literal)),
        CmpOp::Ne => unreachable!(),
    };

    let constraint = if is_product {
        let bound = if let Some(b) = exact_bound {
            ProdBound::Exact(b)
        } else if let Some(b) = max_bound {
            ProdBound::Max(b)
        } else {
            ProdBound::Min(min_bound.unwrap())
        };
        Constraint::Prod(ProdConstraint::new(name.to_string(), variables.clone(), bound))
    } else {
        let bound = if let Some(b) = exact_bound {
            SumBound::Exact(b)
        } else if let Some(b) = max_bound {
            SumBound::Max(b)
        } else {
            SumBound::Min(min_bound.unwrap())
        };
        Constraint::Sum(SumConstraint::new(name.to_string(), variables.clone(), bound))
    };

    Some(ParsedConstraint {
        constraint,
        variables,
        source: None,
    })
}

/// Stage 6: both sides contain variables (neither evaluates to a
/// constant), one side is a bare target variable and the other is a
/// `+`/`*` chain of distinct source variables.
fn match_variable_linked(
    name: &str,
    comparison: &Comparison,
    domains: &HashMap<String, Domain<f64>>,
) -> Option<ParsedConstraint> {
    if eval::eval_numeric_literal(&comparison.lhs).is_some()
        || eval::eval_numeric_literal(&comparison.rhs).is_some()
    {
        return None;
    }
    if comparison.op == CmpOp::Ne {
        return None;
    }

    let try_sides = |target_expr: &Expr, chain_expr: &Expr, op: CmpOp| -> Option<ParsedConstraint> {
        let Expr::Var(target) = target_expr else {
            return None;
        };
        if !domains.contains_key(target) {
            return None;
        }
        let chain = classify_chain(chain_expr, domains)?;
        let (sources, is_product) = match chain {
            Chain::Var(_) => return None,
            Chain::Sum(vars) => (vars, false),
            Chain::Prod(vars) => (vars, true),
        };
        if sources.contains(target) {
            return None;
        }
        let bound = match op {
            CmpOp::Eq => LinkedBound::Exact,
            CmpOp::Le => LinkedBound::Max,
            CmpOp::Ge => LinkedBound::Min,
            _ => return None,
        };
        let mut variables = vec![target.clone()];
        variables.extend(sources.iter().cloned());
        let constraint = if is_product {
            Constraint::LinkedProd(VariableLinkedProdConstraint::new(
                name.to_string(),
                target.clone(),
                sources,
                bound,
            ))
        } else {
            Constraint::LinkedSum(VariableLinkedSumConstraint::new(
                name.to_string(),
                target.clone(),
                sources,
                bound,
            ))
        };
        Some(ParsedConstraint {
            constraint,
            variables,
            source: None,
        })
    };

    try_sides(&comparison.lhs, &comparison.rhs, flip(&comparison.op))
        .or_else(|| try_sides(&comparison.rhs, &comparison.lhs, comparison.op.clone()))
}

/// Stage 7: a bare `x == y` / `x != y` between two distinct declared
/// variables becomes `AllEqual`/`AllDifferent`.
fn match_equality(
    name: &str,
    comparison: &Comparison,
    domains: &HashMap<String, Domain<f64>>,
) -> Option<ParsedConstraint> {
    let (Expr::Var(left), Expr::Var(right)) = (&comparison.lhs, &comparison.rhs) else {
        return None;
    };
    if left == right || !domains.contains_key(left) || !domains.contains_key(right) {
        return None;
    }
    let variables = vec![left.clone(), right.clone()];
    let constraint = match comparison.op {
        CmpOp::Eq => Constraint::AllEqual(AllEqualConstraint::new(name.to_string(), variables.clone())),
        CmpOp::Ne => {
            Constraint::AllDifferent(AllDifferentConstraint::new(name.to_string(), variables.clone()))
        }
        _ => return None,
    };
    Some(ParsedConstraint {
        constraint,
        variables,
        source: None,
    })
}

/// Stage 8 fallback for a single, already-isolated comparison: rebuilds
/// `lhs op rhs` as a closure over the comparison's own variables.
fn fallback_comparison_predicate(
    name: &str,
    comparison: &Comparison,
    domains: &HashMap<String, Domain<f64>>,
    mode: ParserMode,
) -> Result<ParsedConstraint, CspError> {
    let mut names = Vec::new();
    eval::collect_vars(&comparison.lhs, &mut names);
    eval::collect_vars(&comparison.rhs, &mut names);
    for unknown in names.iter().filter(|v| !domains.contains_key(*v)) {
        return Err(CspError::ParseFailure(
            name.to_string(),
            format!("unknown variable {unknown:?} in constraint expression"),
        ));
    }

    let lhs = comparison.lhs.clone();
    let rhs = comparison.rhs.clone();
    let op = comparison.op.clone();
    let vars = names.clone();
    let predicate = PredicateConstraint::new(name.to_string(), vars.clone(), move |args: &[Option<f64>]| {
        let bindings: HashMap<String, f64> = vars
            .iter()
            .zip(args.iter())
            .filter_map(|(v, value)| value.map(|x| (v.clone(), x)))
            .collect();
        let Some(l) = eval::eval_expr(&lhs, &bindings) else {
            return true;
        };
        let Some(r) = eval::eval_expr(&rhs, &bindings) else {
            return true;
        };
        match op {
            CmpOp::Eq => l == r,
            CmpOp::Ne => l != r,
            CmpOp::Lt => l < r,
            CmpOp::Le => l <= r,
            CmpOp::Gt => l > r,
            CmpOp::Ge => l >= r,
        }
    });

    let source = matches!(mode, ParserMode::Serializable).then(|| name.to_string());
    Ok(ParsedConstraint {
        constraint: Constraint::Predicate(predicate),
        variables: names,
        source,
    })
}

/// Stage 8 fallback for an expression that never reached comparator
/// splitting at all (contains `and`/`or`, or doesn't tokenize as a
/// chain of comparisons): the *raw source text* becomes the predicate's
/// source string in serializable mode, since there's no single
/// `Comparison` to recompile from.
fn fallback_predicate(
    source: &str,
    domains: &HashMap<String, Domain<f64>>,
    mode: ParserMode,
) -> Result<ParsedConstraint, CspError> {
    let declared: Vec<String> = domains.keys().cloned().collect();
    let mentioned: Vec<String> = declared
        .into_iter()
        .filter(|name| mentions_identifier(source, name))
        .collect();
    if mentioned.is_empty() {
        return Err(CspError::ParseFailure(
            source.to_string(),
            "constraint expression names no known variable".into(),
        ));
    }

    // A boolean-algebra expression over bare comparisons is evaluated
    // by splitting on `and`/`or` textually and reusing the same
    // arithmetic evaluator per clause — deliberately not a full
    // boolean-algebra normalisation (§4.E non-goals).
    let source_owned = source.to_string();
    let vars = mentioned.clone();
    let predicate = PredicateConstraint::new(source.to_string(), vars.clone(), move |args: &[Option<f64>]| {
        let bindings: HashMap<String, f64> = vars
            .iter()
            .zip(args.iter())
            .filter_map(|(v, value)| value.map(|x| (v.clone(), x)))
            .collect();
        eval_boolean_expression(&source_owned, &bindings).unwrap_or(true)
    });

    let source_text = matches!(mode, ParserMode::Serializable).then(|| source.to_string());
    Ok(ParsedConstraint {
        constraint: Constraint::Predicate(predicate),
        variables: mentioned,
        source: source_text,
    })
}

fn mentions_identifier(source: &str, name: &str) -> bool {
    let mut vars = Vec::new();
    if let Ok(comparisons) = eval::parse_comparisons(source) {
        for comparison in &comparisons {
            eval::collect_vars(&comparison.lhs, &mut vars);
            eval::collect_vars(&comparison.rhs, &mut vars);
        }
        return vars.iter().any(|v| v == name);
    }
    // Best-effort substring-with-word-boundaries scan for expressions
    // the comparator grammar can't parse at all (e.g. `and`/`or`).
    source
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .any(|tok| tok == name)
}

/// Evaluates `and`/`or`-joined comparisons without normalising operator
/// precedence (`and` binds tighter than `or`, matching Python), by
/// splitting on `or` first and each `and`-clause second, then parsing
/// every leaf as a single comparison via the same safe evaluator.
fn eval_boolean_expression(source: &str, vars: &HashMap<String, f64>) -> Option<bool> {
    for or_clause in split_keyword(source, "or") {
        let mut all_true = true;
        for and_clause in split_keyword(&or_clause, "and") {
            let comparisons = eval::parse_comparisons(and_clause.trim()).ok()?;
            for comparison in &comparisons {
                let l = eval::eval_expr(&comparison.lhs, vars)?;
                let r = eval::eval_expr(&comparison.rhs, vars)?;
                let ok = match comparison.op {
                    CmpOp::Eq => l == r,
                    CmpOp::Ne => l != r,
                    CmpOp::Lt => l < r,
                    CmpOp::Le => l <= r,
                    CmpOp::Gt => l > r,
                    CmpOp::Ge => l >= r,
                };
                if !ok {
                    all_true = false;
                }
            }
        }
        if all_true {
            return Some(true);
        }
    }
    Some(false)
}

fn split_keyword(source: &str, keyword: &str) -> Vec<String> {
    source
        .split_whitespace()
        .collect::<Vec<_>>()
        .split(|tok| *tok == keyword)
        .map(|piece| piece.join(" "))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domains(names: &[&str], values: &[f64]) -> HashMap<String, Domain<f64>> {
        names
            .iter()
            .map(|n| (n.to_string(), Domain::new(values.to_vec()).unwrap()))
            .collect()
    }

    #[test]
    fn splits_chained_bound_into_min_and_max_sum() {
        let domains = domains(&["x", "y"], &[1.0, 2.0, 3.0, 4.0, 5.0]);
        let parsed = compile_to_constraints(
            &["3 <= x+y <= 5".to_string()],
            &domains,
            ParserMode::Inline,
        )
        .unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(matches!(parsed[0].constraint, Constraint::Sum(_)));
        assert!(matches!(parsed[1].constraint, Constraint::Sum(_)));
    }

    #[test]
    fn equality_string_becomes_all_different() {
        let domains = domains(&["a", "b"], &[1.0, 2.0]);
        let parsed =
            compile_to_constraints(&["a != b".to_string()], &domains, ParserMode::Inline).unwrap();
        assert_eq!(parsed.len(), 1);
        assert!(matches!(parsed[0].constraint, Constraint::AllDifferent(_)));
    }

    #[test]
    fn equality_string_becomes_all_equal() {
        let domains = domains(&["a", "b"], &[1.0, 2.0]);
        let parsed =
            compile_to_constraints(&["a == b".to_string()], &domains, ParserMode::Inline).unwrap();
        assert_eq!(parsed.len(), 1);
        assert!(matches!(parsed[0].constraint, Constraint::AllEqual(_)));
    }

    #[test]
    fn variable_linked_sum_is_recognised() {
        let domains = domains(&["a", "b", "c"], &[1.0, 2.0, 3.0]);
        let parsed =
            compile_to_constraints(&["c == a+b".to_string()], &domains, ParserMode::Inline).unwrap();
        assert_eq!(parsed.len(), 1);
        assert!(matches!(parsed[0].constraint, Constraint::LinkedSum(_)));
    }

    #[test]
    fn unmatched_expression_falls_back_to_a_predicate() {
        // Subtraction isn't a chain this parser rewrites (no negative
        // terms in stage 4's narrowed sum/product matching), so this
        // falls through every structural stage to the predicate.
        let domains = domains(&["a", "b"], &[1.0, 2.0, 3.0]);
        let parsed =
            compile_to_constraints(&["a - b == 1".to_string()], &domains, ParserMode::Inline).unwrap();
        assert_eq!(parsed.len(), 1);
        assert!(matches!(parsed[0].constraint, Constraint::Predicate(_)));
    }

    #[test]
    fn duplicate_strings_are_deduplicated() {
        let domains = domains(&["a", "b"], &[1.0, 2.0]);
        let parsed = compile_to_constraints(
            &["a != b".to_string(), " a != b ".to_string()],
            &domains,
            ParserMode::Inline,
        )
        .unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn boolean_expression_is_preserved_for_the_fallback_predicate() {
        let domains = domains(&["a", "b"], &[1.0, 2.0]);
        let parsed = compile_to_constraints(
            &["a == 1 or b == 1".to_string()],
            &domains,
            ParserMode::Inline,
        )
        .unwrap();
        assert_eq!(parsed.len(), 1);
        assert!(matches!(parsed[0].constraint, Constraint::Predicate(_)));
    }
}
