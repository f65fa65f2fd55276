//! Props destructure handling.
//!
//! `const { foo, bar: baz = 1 } = defineProps()` binds reactive prop locals.
//! Every reference to such a local is rewritten into a `__props` access so
//! that reactivity is preserved.

use oxc_ast::ast::{
    BindingPatternKind, CallExpression, Expression, IdentifierReference, ObjectPattern,
};
use oxc_span::{GetSpan, Span};
use tracing::debug;
use vize_carton::FxHashMap;

use crate::error::{ScriptErrorKind, ScriptResult};
use crate::types::{BindingType, PropsDestructure};

use super::context::ScriptCompileContext;
use super::resolve_type::{RuntimeTag, RuntimeTypes};
use super::utils::{
    callee_name, gen_props_access_exp, is_function_type, is_literal_node, resolve_object_key,
    unwrap_ts_node,
};
use super::walk::{ReferenceKind, ReferenceVisitor, ScopeWalker, Scopes};

/// A destructured prop binding.
#[derive(Debug, Clone)]
pub struct PropsDestructureBinding<'a> {
    /// Public prop key.
    pub key: String,
    /// Local identifier.
    pub local: String,
    pub default: Option<&'a Expression<'a>>,
}

/// Register the bindings of a destructured `defineProps()` declaration.
pub fn process_props_destructure<'a>(
    ctx: &mut ScriptCompileContext<'a>,
    pattern: &'a ObjectPattern<'a>,
) -> ScriptResult<()> {
    match ctx.options.props_destructure {
        PropsDestructure::Error => {
            return Err(ctx.setup_error(
                ScriptErrorKind::MacroProtocol,
                "Props destructure is explicitly prohibited via config.",
                pattern.span,
            ));
        }
        PropsDestructure::Disabled => return Ok(()),
        PropsDestructure::Enabled => {}
    }

    ctx.props_destructure_decl = Some(pattern);

    for prop in pattern.properties.iter() {
        let Some(key) = resolve_object_key(&prop.key, prop.computed) else {
            return Err(ctx.setup_error(
                ScriptErrorKind::MacroProtocol,
                "defineProps() destructure cannot use computed key.",
                prop.key.span(),
            ));
        };
        let (local, default) = match &prop.value.kind {
            BindingPatternKind::BindingIdentifier(id) => (id.name.as_str(), None),
            BindingPatternKind::AssignmentPattern(assign) => match &assign.left.kind {
                BindingPatternKind::BindingIdentifier(id) => (id.name.as_str(), Some(&assign.right)),
                _ => return Err(nested_pattern_error(ctx, prop.span)),
            },
            _ => return Err(nested_pattern_error(ctx, prop.span)),
        };

        if local != key {
            ctx.bindings.register(local, BindingType::PropsAliased);
            ctx.bindings
                .props_aliases
                .insert(local.to_string(), key.clone());
        }
        ctx.props_destructured_bindings.push(PropsDestructureBinding {
            key,
            local: local.to_string(),
            default,
        });
    }

    if let Some(rest) = &pattern.rest {
        if let BindingPatternKind::BindingIdentifier(id) = &rest.argument.kind {
            ctx.props_destructure_rest_id = Some(id.name.as_str());
            ctx.bindings
                .register(id.name.as_str(), BindingType::SetupReactiveConst);
        }
    }

    debug!(
        count = ctx.props_destructured_bindings.len(),
        rest = ?ctx.props_destructure_rest_id,
        "props destructure"
    );
    Ok(())
}

fn nested_pattern_error(
    ctx: &ScriptCompileContext<'_>,
    span: Span,
) -> crate::error::ScriptCompileError {
    ctx.setup_error(
        ScriptErrorKind::MacroProtocol,
        "defineProps() destructure does not support nested patterns.",
        span,
    )
}

/// Generated default value of a destructured prop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestructuredDefault {
    pub value: String,
    /// The default is passed as-is and must not be called as a factory.
    pub need_skip_factory: bool,
}

/// Default value of the destructured prop `key`, checked against the
/// declared types when known.
pub fn gen_destructured_default_value(
    ctx: &ScriptCompileContext<'_>,
    key: &str,
    inferred: Option<&RuntimeTypes>,
) -> ScriptResult<Option<DestructuredDefault>> {
    let Some(default) = ctx
        .props_destructured_bindings
        .iter()
        .find(|b| b.key == key)
        .and_then(|b| b.default)
    else {
        return Ok(None);
    };

    let value = ctx.setup_text(default.span());
    let unwrapped = unwrap_ts_node(default);

    if let Some(inferred) = inferred {
        if !inferred.is_empty() && !inferred.contains(RuntimeTag::Null) {
            if let Some(value_type) = infer_value_type(unwrapped) {
                if !inferred.contains(value_type) {
                    return Err(ctx.setup_error(
                        ScriptErrorKind::MacroProtocol,
                        format!("Default value of prop \"{key}\" does not match declared type."),
                        unwrapped.span(),
                    ));
                }
            }
        }
    }

    let need_skip_factory = inferred.is_none()
        && (is_function_type(unwrapped) || matches!(unwrapped, Expression::Identifier(_)));
    let need_factory_wrap = !need_skip_factory
        && !is_literal_node(unwrapped)
        && !inferred.is_some_and(|t| t.contains(RuntimeTag::Function));

    Ok(Some(DestructuredDefault {
        value: if need_factory_wrap {
            format!("() => ({value})")
        } else {
            value.to_string()
        },
        need_skip_factory,
    }))
}

fn infer_value_type(expr: &Expression<'_>) -> Option<RuntimeTag> {
    match expr {
        Expression::StringLiteral(_) | Expression::TemplateLiteral(_) => Some(RuntimeTag::String),
        Expression::NumericLiteral(_) => Some(RuntimeTag::Number),
        Expression::BooleanLiteral(_) => Some(RuntimeTag::Boolean),
        Expression::ObjectExpression(_) => Some(RuntimeTag::Object),
        Expression::ArrayExpression(_) => Some(RuntimeTag::Array),
        Expression::FunctionExpression(_) | Expression::ArrowFunctionExpression(_) => {
            Some(RuntimeTag::Function)
        }
        _ => None,
    }
}

enum PropRewrite {
    Overwrite(Span, String),
    AppendLeft(u32, String),
}

struct DestructuredPropsVisitor<'m> {
    local_to_key: &'m FxHashMap<String, String>,
    watch_alias: String,
    to_ref_alias: String,
    rewrites: Vec<PropRewrite>,
    errors: Vec<(String, Span)>,
}

impl DestructuredPropsVisitor<'_> {
    fn check_usage(&mut self, call: &CallExpression<'_>, scopes: &Scopes<'_>) {
        let method = match callee_name(call) {
            Some(name) if name == self.watch_alias => "watch",
            Some(name) if name == self.to_ref_alias => "toRef",
            _ => return,
        };
        let Some(arg) = call.arguments.first().and_then(|a| a.as_expression()) else {
            return;
        };
        if let Expression::Identifier(id) = unwrap_ts_node(arg) {
            let name = id.name.as_str();
            if self.local_to_key.contains_key(name) && !scopes.is_local(name) {
                self.errors.push((
                    format!(
                        "\"{name}\" is a destructured prop and should not be passed directly to {method}(). Pass a getter () => {name} instead."
                    ),
                    id.span,
                ));
            }
        }
    }
}

impl<'a> ReferenceVisitor<'a> for DestructuredPropsVisitor<'_> {
    fn visit_reference(&mut self, id: &'a IdentifierReference<'a>, kind: ReferenceKind) {
        let Some(key) = self.local_to_key.get(id.name.as_str()) else {
            return;
        };
        match kind {
            ReferenceKind::Write => self.errors.push((
                "Cannot assign to destructured props as they are readonly.".to_string(),
                id.span,
            )),
            ReferenceKind::Shorthand => self.rewrites.push(PropRewrite::AppendLeft(
                id.span.end,
                format!(": {}", gen_props_access_exp(key)),
            )),
            ReferenceKind::Read => self
                .rewrites
                .push(PropRewrite::Overwrite(id.span, gen_props_access_exp(key))),
        }
    }

    fn visit_call(&mut self, call: &'a CallExpression<'a>, scopes: &Scopes<'a>) {
        self.check_usage(call, scopes);
    }
}

/// Rewrite references to destructured prop locals in the setup block.
pub fn transform_destructured_props(ctx: &mut ScriptCompileContext<'_>) -> ScriptResult<()> {
    if ctx.props_destructure_decl.is_none() || ctx.props_destructured_bindings.is_empty() {
        return Ok(());
    }
    let Some(setup) = ctx.script_setup else {
        return Ok(());
    };

    let local_to_key: FxHashMap<String, String> = ctx
        .props_destructured_bindings
        .iter()
        .map(|b| (b.local.clone(), b.key.clone()))
        .collect();
    let mut visitor = DestructuredPropsVisitor {
        local_to_key: &local_to_key,
        watch_alias: ctx.runtime_alias("watch"),
        to_ref_alias: ctx.runtime_alias("toRef"),
        rewrites: Vec::new(),
        errors: Vec::new(),
    };
    ScopeWalker::new(&mut visitor)
        .skip_props_declarations(true)
        .walk_program(&setup.program.body);

    if let Some((message, span)) = visitor.errors.into_iter().next() {
        return Err(ctx.setup_error(ScriptErrorKind::MacroProtocol, message, span));
    }

    debug!(count = visitor.rewrites.len(), "rewrite destructured prop references");
    let offset = setup.start;
    for rewrite in visitor.rewrites {
        match rewrite {
            PropRewrite::Overwrite(span, content) => ctx.s.overwrite(
                offset + span.start as usize,
                offset + span.end as usize,
                content,
            ),
            PropRewrite::AppendLeft(at, content) => {
                ctx.s.append_left(offset + at as usize, content);
            }
        }
    }
    Ok(())
}
