//! The static properties of types like `.sizeof` or `.length`.

use super::{
    context::ResolutionContext,
    result::{BareResult, ResolveResult},
    Depth,
};
use ast::{BareNode, ClassKind, Expression};
use lexer::token::TokenKind;
use utility::obtain;

pub(crate) const INIT: &str = "init";
/// The properties every type has.
const COMMON: &[&str] = &[INIT, "sizeof", "alignof", "mangleof", "stringof"];
const ARRAY: &[&str] = &["length", "ptr", "dup", "idup"];
const ASSOCIATIVE_ARRAY: &[&str] = &["keys", "values", "length"];
const INTEGRAL: &[&str] = &["min", "max"];
const FLOATING_POINT: &[&str] = &["nan", "infinity", "epsilon", "min_normal", "max"];
const CLASS: &[&str] = &["classinfo"];
const AGGREGATE: &[&str] = &["tupleof"];

fn size_t<'a>() -> ResolveResult<'a> {
    ResolveResult::basic(TokenKind::Ulong)
}

/// The initializer of a variable, reused as the value of its `.init` property.
pub(crate) fn initializer(result: &ResolveResult<'_>) -> Option<Expression> {
    let declaration = obtain!(result.bare, BareResult::Member(declaration) => declaration)?;
    declaration.node().variable()?.initializer.clone()
}

impl<'a> ResolutionContext<'a> {
    /// Resolve a static property of a type or of the type of a value.
    pub(crate) fn resolve_property(&mut self, base: &ResolveResult<'a>, name: &str, depth: Depth) -> Option<ResolveResult<'a>> {
        self.synthesize_property(base, name, depth).map(|property| property.reached_through(base))
    }

    fn synthesize_property(&mut self, base: &ResolveResult<'a>, name: &str, depth: Depth) -> Option<ResolveResult<'a>> {
        let type_ = base.type_()?.clone();
        let (unqualified, _) = type_.unqualified();
        let unqualified = unqualified.clone();

        let property = |properties: &[&'static str]| properties.iter().copied().find(|&property| property == name);
        let typed = |name: &'static str, type_: ResolveResult<'a>| {
            Some(ResolveResult::with_base(BareResult::Property { name, value: None }, type_))
        };

        if let Some(name) = property(COMMON) {
            return match name {
                INIT => Some(ResolveResult::with_base(BareResult::Property { name, value: initializer(base) }, type_)),
                "sizeof" | "alignof" => typed(name, size_t()),
                _ => typed(name, ResolveResult::string()),
            };
        }

        match &unqualified.bare {
            BareResult::Array { .. } => {
                let name = property(ARRAY)?;
                let element = unqualified.base()?.clone();
                match name {
                    "length" => typed(name, size_t()),
                    "ptr" => typed(name, ResolveResult::with_base(BareResult::Pointer, element)),
                    "dup" => typed(name, ResolveResult::with_base(BareResult::Array { size: None }, element.unqualified().0.clone())),
                    _ => {
                        let element = ResolveResult::with_base(BareResult::Qualified(TokenKind::Immutable), element.unqualified().0.clone());
                        typed(name, ResolveResult::with_base(BareResult::Array { size: None }, element))
                    }
                }
            }
            BareResult::AssociativeArray { key } => {
                let name = property(ASSOCIATIVE_ARRAY)?;
                match name {
                    "keys" => typed(name, ResolveResult::with_base(BareResult::Array { size: None }, (**key).clone())),
                    "values" => typed(name, ResolveResult::with_base(BareResult::Array { size: None }, unqualified.base()?.clone())),
                    _ => typed(name, size_t()),
                }
            }
            BareResult::Static(kind) if kind.is_integral_type() => typed(property(INTEGRAL)?, type_),
            BareResult::Static(kind) if kind.is_floating_point_type() => typed(property(FLOATING_POINT)?, type_),
            BareResult::Type { declaration, .. } => {
                let declaration = *declaration;
                let node = declaration.node();

                match &node.bare {
                    BareNode::Class(class) => {
                        if let Some(name) = property(CLASS).filter(|_| class.kind.is_reference()) {
                            let span = node.name_span;
                            let scope = super::Scope::new(declaration, None);
                            let info = self.look_up("TypeInfo_Class", span, scope, depth.next()).into_iter().next();
                            return Some(match info {
                                Some(info) => ResolveResult::with_base(BareResult::Property { name, value: None }, info),
                                None => ResolveResult::new(BareResult::Property { name, value: None }),
                            });
                        }

                        let name = property(AGGREGATE)
                            .filter(|_| matches!(class.kind, ClassKind::Class | ClassKind::Struct | ClassKind::Union))?;
                        let fields: Vec<_> = declaration
                            .module
                            .children(declaration.index)
                            .filter(|(_, field)| {
                                field.variable().is_some()
                                    && !field.is_alias()
                                    && !field.attributes.is_static()
                                    && !field.attributes.is_manifest_constant()
                            })
                            .map(|(index, _)| declaration.with_index(index))
                            .collect();
                        let mut elements = Vec::new();
                        for field in fields {
                            elements.extend(self.member_type(field, field.node().name_span, depth.next()));
                        }
                        typed(name, ResolveResult::new(BareResult::TypeTuple(elements)))
                    }
                    // the properties of the base type
                    BareNode::Enum(_) => {
                        let base = unqualified.base()?.clone();
                        self.synthesize_property(&base, name, depth.next())
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }
}
