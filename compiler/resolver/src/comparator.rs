//! Equality and implicit convertibility of results.

use super::{
    base_class::inherits_from,
    result::{BareResult, Deduction, ResolveResult},
};
use ast::BareNode;
use lexer::token::TokenKind;

/// Whether two results denote the same symbol or type.
pub fn is_equal(left: &ResolveResult<'_>, right: &ResolveResult<'_>) -> bool {
    use BareResult::*;

    let bases_are_equal = || match (left.base(), right.base()) {
        (Some(left), Some(right)) => is_equal(left, right),
        (None, None) => true,
        _ => false,
    };

    match (&left.bare, &right.bare) {
        (Member(left), Member(right)) => left == right,
        (
            Type { declaration: left, deduced: left_deduced, .. },
            Type { declaration: right, deduced: right_deduced, .. },
        ) => {
            left == right
                && left_deduced.len() == right_deduced.len()
                && left_deduced.iter().all(|(name, left)| right_deduced.get(name).map_or(false, |right| is_equal(left, right)))
        }
        (Module(left), Module(right)) => std::ptr::eq(*left, *right),
        (ModulePackage(left), ModulePackage(right)) => left == right,
        (Static(left), Static(right)) => left == right,
        (Array { size: left }, Array { size: right }) => {
            let sizes_are_equal = match (left, right) {
                (Some(left), Some(right)) => left.to_string() == right.to_string(),
                (None, None) => true,
                _ => false,
            };
            sizes_are_equal && bases_are_equal()
        }
        (AssociativeArray { key: left }, AssociativeArray { key: right }) => is_equal(left, right) && bases_are_equal(),
        (Pointer, Pointer) => bases_are_equal(),
        (Delegate(left), Delegate(right)) => left.to_string() == right.to_string() && bases_are_equal(),
        (TypeTuple(left), TypeTuple(right)) => {
            left.len() == right.len() && left.iter().zip(right).all(|(left, right)| is_equal(left, right))
        }
        (ExpressionValue(left), ExpressionValue(right)) => left.to_string() == right.to_string(),
        (Property { name: left, .. }, Property { name: right, .. }) => left == right && bases_are_equal(),
        (Qualified(left), Qualified(right)) => left == right && bases_are_equal(),
        _ => false,
    }
}

/// Whether a value of the candidate type can be used where the target type is expected
/// without a cast.
///
/// Template parameters occuring in the target accept anything and record the deduced
/// result in `deduced`.
pub fn is_implicitly_convertible<'a>(
    candidate: &ResolveResult<'a>,
    target: &ResolveResult<'a>,
    deduced: &mut Deduction<'a>,
) -> bool {
    let candidate = candidate.type_().unwrap_or(candidate);
    let target = target.type_().unwrap_or(target);

    if target.is_naked_template_parameter() {
        return deduce(candidate, target, deduced);
    }
    if is_equal(candidate, target) {
        return true;
    }

    let (candidate, candidate_qualifier) = candidate.unqualified();
    let (target, target_qualifier) = target.unqualified();
    if !is_qualifier_convertible(candidate, candidate_qualifier, target_qualifier) {
        return false;
    }

    match (&candidate.bare, &target.bare) {
        (BareResult::Static(TokenKind::Null), _) => is_nullable(target),
        (BareResult::Static(candidate), BareResult::Static(target)) => is_numeric_convertible(*candidate, *target),
        (BareResult::Pointer, BareResult::Pointer) => match (candidate.base(), target.base()) {
            (_, Some(target)) if matches!(target.unqualified().0.bare, BareResult::Static(TokenKind::Void)) => true,
            (Some(candidate), Some(target)) => is_element_convertible(candidate, target, deduced),
            _ => false,
        },
        (BareResult::Array { .. }, BareResult::Array { size: None }) => match (candidate.base(), target.base()) {
            (Some(candidate), Some(target)) => is_element_convertible(candidate, target, deduced),
            _ => false,
        },
        (BareResult::AssociativeArray { key: candidate_key }, BareResult::AssociativeArray { key: target_key }) => {
            let keys_match = match target_key.is_naked_template_parameter() {
                true => deduce(candidate_key, target_key, deduced),
                false => is_equal(candidate_key, target_key),
            };
            keys_match
                && match (candidate.base(), target.base()) {
                    (Some(candidate), Some(target)) => is_element_convertible(candidate, target, deduced),
                    _ => false,
                }
        }
        // enums convert to their base type
        (BareResult::Type { declaration, .. }, _) if matches!(declaration.node().bare, BareNode::Enum(_)) => {
            candidate.base().map_or(false, |base| is_implicitly_convertible(base, target, deduced))
        }
        (BareResult::Type { .. }, BareResult::Type { declaration, .. }) => inherits_from(candidate, *declaration),
        (BareResult::TypeTuple(candidates), BareResult::TypeTuple(targets)) => {
            candidates.len() == targets.len()
                && candidates
                    .iter()
                    .zip(targets)
                    .all(|(candidate, target)| is_implicitly_convertible(candidate, target, deduced))
        }
        _ => false,
    }
}

/// Record what a template parameter is deduced to. Conflicting deductions are rejected.
fn deduce<'a>(candidate: &ResolveResult<'a>, parameter: &ResolveResult<'a>, deduced: &mut Deduction<'a>) -> bool {
    let Some(name) = parameter.declaration().map(|parameter| parameter.node().name.clone()) else {
        return false;
    };

    match deduced.get(&name) {
        Some(previous) => is_equal(previous, candidate),
        None => {
            deduced.insert(name, candidate.clone());
            true
        }
    }
}

/// Whether the element type of an array or pointer converts.
///
/// Elements are not copied, so apart from adding `const` they have to be equal.
fn is_element_convertible<'a>(candidate: &ResolveResult<'a>, target: &ResolveResult<'a>, deduced: &mut Deduction<'a>) -> bool {
    let (bare_candidate, candidate_qualifier) = candidate.unqualified();
    let (bare_target, target_qualifier) = target.unqualified();

    if bare_target.is_naked_template_parameter() {
        return deduce(bare_candidate, bare_target, deduced);
    }

    let qualifiers_match = candidate_qualifier == target_qualifier || target_qualifier == Some(TokenKind::Const);
    qualifiers_match && (is_equal(bare_candidate, bare_target) || is_element_convertible_nested(bare_candidate, bare_target, deduced))
}

/// Arrays of arrays and pointers to pointers convert if their elements do.
fn is_element_convertible_nested<'a>(candidate: &ResolveResult<'a>, target: &ResolveResult<'a>, deduced: &mut Deduction<'a>) -> bool {
    match (&candidate.bare, &target.bare, candidate.base(), target.base()) {
        (BareResult::Array { size: None }, BareResult::Array { size: None }, Some(candidate), Some(target))
        | (BareResult::Pointer, BareResult::Pointer, Some(candidate), Some(target)) => {
            is_element_convertible(candidate, target, deduced)
        }
        _ => false,
    }
}

/// Values are copied on conversion, so only reference types need compatible qualifiers.
fn is_qualifier_convertible(candidate: &ResolveResult<'_>, from: Option<TokenKind>, to: Option<TokenKind>) -> bool {
    if from == to || to == Some(TokenKind::Const) {
        return true;
    }
    matches!(candidate.bare, BareResult::Static(_))
        || matches!(candidate.bare, BareResult::Type { declaration, .. } if declaration.node().class().map_or(true, |class| !class.kind.is_reference()))
}

fn is_nullable(target: &ResolveResult<'_>) -> bool {
    match &target.bare {
        BareResult::Pointer
        | BareResult::Array { size: None }
        | BareResult::AssociativeArray { .. }
        | BareResult::Delegate(_)
        | BareResult::Static(TokenKind::Null) => true,
        BareResult::Type { declaration, .. } => declaration.node().class().map_or(false, |class| class.kind.is_reference()),
        _ => false,
    }
}

/// The implicit conversions between basic types.
///
/// Integral types convert to integral types of no smaller size and to floating point types.
/// Floating point types convert among each other.
fn is_numeric_convertible(candidate: TokenKind, target: TokenKind) -> bool {
    if candidate == target {
        return true;
    }

    match (candidate.basic_type_size(), target.basic_type_size()) {
        _ if candidate == TokenKind::Void || target == TokenKind::Void => false,
        (Some(candidate_size), Some(target_size)) if candidate.is_integral_type() && target.is_integral_type() => {
            candidate_size <= target_size
        }
        _ if candidate.is_integral_type() => target.is_floating_point_type(),
        _ if candidate.is_floating_point_type() => target.is_floating_point_type(),
        _ => false,
    }
}
