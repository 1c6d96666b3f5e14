//! Template instantiation and the deduction of template parameters.

use super::{
    comparator::is_implicitly_convertible,
    context::{ResolutionContext, Scope},
    declaration::template_parameters,
    error::ResolutionError,
    result::{BareResult, Declaration, Deduction, ResolveResult},
    scope::members,
    Depth,
};
use ast::{BareExpression, ClassKind, Expression, NodeIndex, TemplateArgument, TemplateParameterKind};
use span::Span;

impl<'a> ResolutionContext<'a> {
    /// Apply template arguments to a result.
    ///
    /// Eponymous templates are replaced by their eponymous member. Results that are not
    /// templates are returned unchanged.
    pub(crate) fn instantiate(
        &mut self,
        result: ResolveResult<'a>,
        arguments: &[TemplateArgument],
        span: Span,
        scope: Scope<'a>,
        depth: Depth,
    ) -> ResolveResult<'a> {
        let template = result
            .declaration()
            .filter(|&declaration| !template_parameters(declaration).is_empty())
            .or_else(|| naked_parameter_owner(&result));
        let Some(template) = template else {
            return result;
        };
        let Some(deduced) = self.deduce(template, arguments, span, scope, depth) else {
            return result;
        };

        let node = template.node();
        if let Some(class) = node.class() {
            if class.kind == ClassKind::Template {
                let eponymous = members(template.module, template.index, &node.name).into_iter().next();
                if let Some(member) = eponymous {
                    let member = template.with_index(member);
                    if let Some(instance) = self.resolve_declaration(member, span, depth.next()).into_iter().next() {
                        return substitute(&instance, &deduced);
                    }
                }
            }
        }

        match result.bare {
            BareResult::Type { declaration, interfaces, .. } if declaration == template => ResolveResult {
                bare: BareResult::Type {
                    declaration,
                    interfaces: interfaces.iter().map(|interface| substitute(interface, &deduced)).collect(),
                    deduced: deduced.clone(),
                },
                base: result.base.map(|base| Box::new(substitute(&base, &deduced))),
                result_base: result.result_base,
                origin: result.origin,
            },
            _ => substitute(&result, &deduced),
        }
    }

    /// Deduce the template parameters of a template from explicit template arguments.
    ///
    /// Missing arguments are taken from the defaults. Records an error and returns `None` if
    /// the arguments do not fit the parameters.
    pub(crate) fn deduce(
        &mut self,
        template: Declaration<'a>,
        arguments: &[TemplateArgument],
        span: Span,
        scope: Scope<'a>,
        depth: Depth,
    ) -> Option<Deduction<'a>> {
        let parameters = template_parameters(template);
        let template_scope = Scope::new(template, None);
        let mut deduced = Deduction::default();
        let mut arguments = arguments.iter();

        for parameter in parameters {
            let node = &template.module[parameter];
            let Some(kind) = node.template_parameter().map(|parameter| &parameter.kind) else {
                continue;
            };

            let value = match kind {
                TemplateParameterKind::Tuple => {
                    let elements = arguments
                        .by_ref()
                        .filter_map(|argument| self.resolve_template_argument(argument, scope, depth))
                        .collect();
                    ResolveResult::new(BareResult::TypeTuple(elements))
                }
                TemplateParameterKind::Type { specialization, default }
                | TemplateParameterKind::This { specialization, default } => {
                    let value = match arguments.next() {
                        Some(argument) => self.resolve_template_argument(argument, scope, depth),
                        None => default.as_ref().and_then(|default| {
                            let value = self.resolve_type_declaration(default, template_scope, depth.next()).into_iter().next();
                            value.map(|value| substitute(&value, &deduced))
                        }),
                    };
                    let Some(value) = value else {
                        return self.deduction_failed(template, span, format!("missing a type for ‘{}’", node.name));
                    };
                    if matches!(value.bare, BareResult::ExpressionValue(_)) {
                        return self.deduction_failed(template, span, format!("‘{}’ expects a type", node.name));
                    }
                    if let Some(specialization) = specialization {
                        let specialization = self.resolve_type_declaration(specialization, template_scope, depth.next());
                        if let Some(specialization) = specialization.first() {
                            if !is_implicitly_convertible(&value, specialization, &mut deduced) {
                                return self.deduction_failed(
                                    template,
                                    span,
                                    format!("‘{value}’ does not match the specialization of ‘{}’", node.name),
                                );
                            }
                        }
                    }
                    value
                }
                TemplateParameterKind::Value { specialization, default } => {
                    let value = match arguments.next() {
                        Some(argument) => self.resolve_template_value(argument, parameter, template, scope, depth),
                        None => match default {
                            Some(default) => self.resolve_value(default, parameter, template, template_scope, depth),
                            None => None,
                        },
                    };
                    let Some(value) = value else {
                        return self.deduction_failed(template, span, format!("missing a value for ‘{}’", node.name));
                    };
                    if let (Some(specialization), BareResult::ExpressionValue(expression)) = (specialization, &value.bare) {
                        if specialization.to_string() != expression.to_string() {
                            return self.deduction_failed(
                                template,
                                span,
                                format!("‘{expression}’ does not match the specialization of ‘{}’", node.name),
                            );
                        }
                    }
                    value
                }
                TemplateParameterKind::Alias { default, .. } => {
                    let value = match arguments.next() {
                        Some(argument) => self.resolve_template_argument(argument, scope, depth),
                        None => default
                            .as_ref()
                            .and_then(|default| self.resolve_template_argument(default, template_scope, depth.next())),
                    };
                    let Some(value) = value else {
                        return self.deduction_failed(template, span, format!("missing a symbol for ‘{}’", node.name));
                    };
                    value
                }
            };

            deduced.insert(node.name.clone(), value);
        }

        if arguments.next().is_some() {
            return self.deduction_failed(template, span, "too many template arguments".into());
        }

        Some(deduced)
    }

    /// Deduce the template parameters of a function template from the arguments of a call.
    pub(crate) fn deduce_from_call(
        &mut self,
        function: Declaration<'a>,
        arguments: &[Expression],
        scope: Scope<'a>,
        depth: Depth,
    ) -> Deduction<'a> {
        let mut deduced = Deduction::default();
        let Some(method) = function.node().method() else {
            return deduced;
        };

        for (&parameter, argument) in method.parameters.iter().zip(arguments) {
            let parameter = function.with_index(parameter);
            let Some(type_) = &parameter.node().type_ else {
                continue;
            };
            let Some(parameter_type) = self.resolve_type_declaration(type_, Scope::of(parameter), depth.next()).into_iter().next()
            else {
                continue;
            };
            let Some(argument_type) = self
                .resolve_expression(argument, scope, depth.next())
                .into_iter()
                .next()
                .and_then(|argument| argument.type_().cloned())
            else {
                continue;
            };

            is_implicitly_convertible(&argument_type, &parameter_type, &mut deduced);
        }

        deduced
    }

    fn resolve_template_argument(
        &mut self,
        argument: &TemplateArgument,
        scope: Scope<'a>,
        depth: Depth,
    ) -> Option<ResolveResult<'a>> {
        match argument {
            TemplateArgument::Type(type_) => self.resolve_type_declaration(type_, scope, depth.next()).into_iter().next(),
            TemplateArgument::Expression(expression) if expression.is_type_like() => {
                self.resolve_expression(expression, scope, depth.next()).into_iter().next()
            }
            TemplateArgument::Expression(expression) => {
                let type_ = self
                    .resolve_expression(expression, scope, depth.next())
                    .into_iter()
                    .next()
                    .and_then(|result| result.type_().cloned());
                let bare = BareResult::ExpressionValue(expression.clone());
                Some(match type_ {
                    Some(type_) => ResolveResult::with_base(bare, type_),
                    None => ResolveResult::new(bare),
                })
            }
        }
    }

    /// The argument of a value template parameter.
    ///
    /// Identifiers are parsed as types but may denote constants.
    fn resolve_template_value(
        &mut self,
        argument: &TemplateArgument,
        parameter: NodeIndex,
        template: Declaration<'a>,
        scope: Scope<'a>,
        depth: Depth,
    ) -> Option<ResolveResult<'a>> {
        match argument {
            TemplateArgument::Expression(expression) => self.resolve_value(expression, parameter, template, scope, depth),
            TemplateArgument::Type(type_) => {
                let expression = Expression::new(type_.span, BareExpression::Type(type_.clone()));
                let result = self.resolve_type_declaration(type_, scope, depth.next()).into_iter().next()?;
                match result.bare {
                    BareResult::Member(_) | BareResult::ExpressionValue(_) => {
                        let mut value = ResolveResult::new(BareResult::ExpressionValue(expression));
                        value.base = result.base;
                        Some(value)
                    }
                    _ => None,
                }
            }
        }
    }

    fn resolve_value(
        &mut self,
        expression: &Expression,
        parameter: NodeIndex,
        template: Declaration<'a>,
        scope: Scope<'a>,
        depth: Depth,
    ) -> Option<ResolveResult<'a>> {
        let declared = self.member_type(template.with_index(parameter), expression.span, depth.next());
        let type_ = declared.or_else(|| {
            self.resolve_expression(expression, scope, depth.next())
                .into_iter()
                .next()
                .and_then(|result| result.type_().cloned())
        });

        let bare = BareResult::ExpressionValue(expression.clone());
        Some(match type_ {
            Some(type_) => ResolveResult::with_base(bare, type_),
            None => ResolveResult::new(bare),
        })
    }

    fn deduction_failed<T>(&mut self, template: Declaration<'a>, span: Span, reason: String) -> Option<T> {
        self.error(ResolutionError::DeductionFailed { template: template.path(), span, reason });
        None
    }
}

/// Replace the template parameters occuring in a result by what was deduced for them.
pub(crate) fn substitute<'a>(result: &ResolveResult<'a>, deduced: &Deduction<'a>) -> ResolveResult<'a> {
    if deduced.is_empty() {
        return result.clone();
    }
    if result.is_naked_template_parameter() {
        if let Some(substitution) = result.declaration().and_then(|parameter| deduced.get(&parameter.node().name)) {
            return substitution.clone();
        }
    }

    let mut result = result.clone();
    result.base = result.base.map(|base| Box::new(substitute(&base, deduced)));
    match &mut result.bare {
        BareResult::AssociativeArray { key } => **key = substitute(key, deduced),
        BareResult::TypeTuple(elements) => {
            for element in elements {
                *element = substitute(element, deduced);
            }
        }
        BareResult::Type { deduced: inner, .. } => {
            for value in inner.values_mut() {
                *value = substitute(value, deduced);
            }
        }
        _ => {}
    }
    result
}

/// The template owning the first template parameter occuring in a result.
fn naked_parameter_owner<'a>(result: &ResolveResult<'a>) -> Option<Declaration<'a>> {
    if result.is_naked_template_parameter() {
        return result.declaration().and_then(Declaration::parent);
    }

    let nested = match &result.bare {
        BareResult::AssociativeArray { key } => naked_parameter_owner(key),
        BareResult::TypeTuple(elements) => elements.iter().find_map(naked_parameter_owner),
        _ => None,
    };
    nested.or_else(|| result.base().and_then(naked_parameter_owner))
}
