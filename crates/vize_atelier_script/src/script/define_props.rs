//! defineProps and withDefaults macro handling.
//!
//! Records the props declaration of `<script setup>` and generates the
//! runtime `props` option from either the runtime argument or the type
//! argument.

use oxc_ast::ast::{
    BindingPattern, BindingPatternKind, Expression, ObjectPropertyKind, PropertyKind,
};
use oxc_span::GetSpan;
use tracing::debug;
use vize_carton::get_escaped_prop_name;

use crate::error::{ScriptErrorKind, ScriptResult};
use crate::types::BindingType;

use super::context::ScriptCompileContext;
use super::define_model::gen_model_props;
use super::define_props_destructure::{gen_destructured_default_value, process_props_destructure};
use super::resolve_type::{infer_member_type, RuntimeTag, RuntimeTypes, TypeOrigin};
use super::utils::{concat_strings, get_object_or_array_expression_keys, is_call_of, resolve_object_key};

pub const DEFINE_PROPS: &str = "defineProps";
pub const WITH_DEFAULTS: &str = "withDefaults";

/// A prop resolved from a type argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropEntry {
    pub key: String,
    pub types: RuntimeTypes,
    pub required: bool,
    pub skip_check: bool,
}

/// Process a `defineProps()` or `withDefaults()` call.
///
/// Returns `false` when `expr` is neither.
pub fn process_define_props<'a>(
    ctx: &mut ScriptCompileContext<'a>,
    expr: &'a Expression<'a>,
    decl_id: Option<&'a BindingPattern<'a>>,
) -> ScriptResult<bool> {
    process_define_props_inner(ctx, expr, decl_id, false)
}

fn process_define_props_inner<'a>(
    ctx: &mut ScriptCompileContext<'a>,
    expr: &'a Expression<'a>,
    decl_id: Option<&'a BindingPattern<'a>>,
    is_with_defaults: bool,
) -> ScriptResult<bool> {
    let Some(call) = is_call_of(expr, DEFINE_PROPS) else {
        return process_with_defaults(ctx, expr, decl_id);
    };

    if ctx.has_define_props_call {
        return Err(ctx.setup_error(
            ScriptErrorKind::MacroProtocol,
            format!("duplicate {DEFINE_PROPS}() call"),
            call.span,
        ));
    }
    ctx.has_define_props_call = true;

    ctx.props_runtime_decl = call.arguments.first().and_then(|arg| arg.as_expression());
    if let Some(runtime_decl) = ctx.props_runtime_decl {
        for key in get_object_or_array_expression_keys(runtime_decl) {
            ctx.bindings.register_if_absent(&key, BindingType::Props);
        }
    }

    if let Some(type_params) = &call.type_parameters {
        if ctx.props_runtime_decl.is_some() {
            return Err(ctx.setup_error(
                ScriptErrorKind::MacroProtocol,
                format!(
                    "{DEFINE_PROPS}() cannot accept both type and non-type arguments at the same time. Use one or the other."
                ),
                call.span,
            ));
        }
        ctx.props_type_decl = type_params.params.first();
    }

    if !is_with_defaults {
        if let Some(BindingPattern {
            kind: BindingPatternKind::ObjectPattern(pattern),
            ..
        }) = decl_id
        {
            process_props_destructure(ctx, pattern)?;
        }
    }

    ctx.props_call = Some(call);
    ctx.props_decl = decl_id;
    debug!(
        runtime = ctx.props_runtime_decl.is_some(),
        typed = ctx.props_type_decl.is_some(),
        "defineProps"
    );
    Ok(true)
}

fn process_with_defaults<'a>(
    ctx: &mut ScriptCompileContext<'a>,
    expr: &'a Expression<'a>,
    decl_id: Option<&'a BindingPattern<'a>>,
) -> ScriptResult<bool> {
    let Some(call) = is_call_of(expr, WITH_DEFAULTS) else {
        return Ok(false);
    };

    let first = call.arguments.first().and_then(|arg| arg.as_expression());
    let is_props_call = match first {
        Some(first) => process_define_props_inner(ctx, first, decl_id, true)?
            && is_call_of(first, DEFINE_PROPS).is_some(),
        None => false,
    };
    if !is_props_call {
        let span = first.map_or(call.span, GetSpan::span);
        return Err(ctx.setup_error(
            ScriptErrorKind::MacroProtocol,
            format!("{WITH_DEFAULTS}' first argument must be a {DEFINE_PROPS} call."),
            span,
        ));
    }

    if ctx.props_runtime_decl.is_some() {
        return Err(ctx.setup_error(
            ScriptErrorKind::MacroProtocol,
            format!("{WITH_DEFAULTS} can only be used with type-based {DEFINE_PROPS} declaration."),
            call.span,
        ));
    }

    if let Some(BindingPattern {
        kind: BindingPatternKind::ObjectPattern(pattern),
        ..
    }) = decl_id
    {
        let has_destructure_default = pattern
            .properties
            .iter()
            .any(|p| matches!(p.value.kind, BindingPatternKind::AssignmentPattern(_)));
        if has_destructure_default {
            return Err(ctx.setup_error(
                ScriptErrorKind::MacroProtocol,
                format!(
                    "{WITH_DEFAULTS}() cannot be combined with destructure default values. Declare defaults in one place only."
                ),
                pattern.span,
            ));
        }
        ctx.warn(format!(
            "{WITH_DEFAULTS}() is unnecessary when using destructure with {DEFINE_PROPS}().\nReactive destructure will be disabled when using withDefaults().\nPrefer using destructure default values, e.g. const {{ foo = 1 }} = defineProps(...)."
        ));
    }

    ctx.props_runtime_defaults = call.arguments.get(1).and_then(|arg| arg.as_expression());
    if ctx.props_runtime_defaults.is_none() {
        return Err(ctx.setup_error(
            ScriptErrorKind::MacroProtocol,
            format!("The 2nd argument of {WITH_DEFAULTS} is required."),
            call.span,
        ));
    }

    ctx.props_call = Some(call);
    Ok(true)
}

/// The `props` option, or `None` when the component declares no props.
pub fn gen_runtime_props(ctx: &mut ScriptCompileContext<'_>) -> ScriptResult<Option<String>> {
    let mut props_decls = None;

    if let Some(runtime_decl) = ctx.props_runtime_decl {
        let mut decl = ctx.setup_text(runtime_decl.span()).trim().to_string();
        if ctx.props_destructure_decl.is_some() {
            let keys: Vec<String> = ctx
                .props_destructured_bindings
                .iter()
                .map(|b| b.key.clone())
                .collect();
            let mut defaults = Vec::new();
            for key in keys {
                if let Some(d) = gen_destructured_default_value(ctx, &key, None)? {
                    let final_key = get_escaped_prop_name(&key);
                    if d.need_skip_factory {
                        let skip_key = get_escaped_prop_name(&format!("__skip_{key}"));
                        defaults.push(format!("{final_key}: {}, {skip_key}: true", d.value));
                    } else {
                        defaults.push(format!("{final_key}: {}", d.value));
                    }
                }
            }
            if !defaults.is_empty() {
                let helper = ctx.helper("mergeDefaults");
                decl = format!(
                    "/*@__PURE__*/{helper}({decl}, {{\n  {}\n}})",
                    defaults.join(",\n  ")
                );
            }
        }
        props_decls = Some(decl);
    } else if ctx.props_type_decl.is_some() {
        props_decls = extract_runtime_props(ctx)?;
    }

    let model_decls = gen_model_props(ctx);
    Ok(match (props_decls, model_decls) {
        (Some(props), Some(models)) => {
            let helper = ctx.helper("mergeModels");
            Some(format!("/*@__PURE__*/{helper}({props}, {models})"))
        }
        (props, models) => models.or(props),
    })
}

/// Runtime props object generated from the type argument.
pub fn extract_runtime_props(ctx: &mut ScriptCompileContext<'_>) -> ScriptResult<Option<String>> {
    let props = resolve_runtime_props_from_type(ctx)?;
    if props.is_empty() {
        return Ok(None);
    }

    let has_static_defaults = has_static_with_defaults(ctx);
    let mut prop_strings = Vec::with_capacity(props.len());
    for prop in &props {
        prop_strings.push(gen_runtime_prop_from_type(ctx, prop, has_static_defaults)?);
        ctx.bindings.register_if_absent(&prop.key, BindingType::Props);
    }

    let mut decl = format!("{{\n    {}\n  }}", prop_strings.join(",\n    "));
    if let Some(defaults) = ctx.props_runtime_defaults {
        if !has_static_defaults {
            let helper = ctx.helper("mergeDefaults");
            decl = format!(
                "/*@__PURE__*/{helper}({decl}, {})",
                ctx.setup_text(defaults.span())
            );
        }
    }
    Ok(Some(decl))
}

/// Resolve the type argument into prop entries.
pub fn resolve_runtime_props_from_type(
    ctx: &ScriptCompileContext<'_>,
) -> ScriptResult<Vec<PropEntry>> {
    let Some(ty) = ctx.props_type_decl else {
        return Ok(Vec::new());
    };
    let elements = match ctx.type_scope.resolve_type_elements(ty, TypeOrigin::Setup) {
        Ok(elements) => elements,
        Err(err) if err.span == ty.span() && err.origin == TypeOrigin::Setup => {
            return Err(ctx.setup_error(
                ScriptErrorKind::TypeResolution,
                format!(
                    "type argument passed to {DEFINE_PROPS}() must be a literal type, or a reference to an interface or literal type."
                ),
                ty.span(),
            ));
        }
        Err(err) => return Err(ctx.type_error(err)),
    };

    Ok(elements
        .props
        .iter()
        .map(|member| {
            let mut types = infer_member_type(&ctx.type_scope, &member.ty);
            let mut skip_check = false;
            if types.contains(RuntimeTag::Unknown) {
                if types.contains(RuntimeTag::Boolean) || types.contains(RuntimeTag::Function) {
                    types.remove(RuntimeTag::Unknown);
                    skip_check = true;
                } else {
                    types = RuntimeTypes::single(RuntimeTag::Null);
                }
            }
            PropEntry {
                key: member.key.clone(),
                types,
                required: !member.optional,
                skip_check,
            }
        })
        .collect())
}

fn gen_runtime_prop_from_type(
    ctx: &ScriptCompileContext<'_>,
    prop: &PropEntry,
    has_static_defaults: bool,
) -> ScriptResult<String> {
    let mut default_string = None;
    if let Some(d) = gen_destructured_default_value(ctx, &prop.key, Some(&prop.types))? {
        default_string = Some(if d.need_skip_factory {
            format!("default: {}, skipFactory: true", d.value)
        } else {
            format!("default: {}", d.value)
        });
    } else if has_static_defaults {
        default_string = static_default_for(ctx, &prop.key);
    }

    let final_key = get_escaped_prop_name(&prop.key);
    let type_string = format!("type: {}", prop.types.to_runtime_string());

    if !ctx.options.is_prod {
        let required = format!("required: {}", prop.required);
        return Ok(format!(
            "{final_key}: {{ {} }}",
            concat_strings(&[
                Some(&type_string),
                Some(&required),
                prop.skip_check.then_some("skipCheck: true"),
                default_string.as_deref(),
            ])
        ));
    }

    let keep_type = prop.types.iter().any(|tag| {
        tag == RuntimeTag::Boolean
            || ((!has_static_defaults || default_string.is_some()) && tag == RuntimeTag::Function)
    });
    if keep_type {
        Ok(format!(
            "{final_key}: {{ {} }}",
            concat_strings(&[Some(&type_string), default_string.as_deref()])
        ))
    } else {
        Ok(match default_string {
            Some(default) => format!("{final_key}: {{ {default} }}"),
            None => format!("{final_key}: {{}}"),
        })
    }
}

fn static_default_for(ctx: &ScriptCompileContext<'_>, key: &str) -> Option<String> {
    let Some(Expression::ObjectExpression(obj)) = ctx.props_runtime_defaults else {
        return None;
    };
    obj.properties.iter().find_map(|prop| {
        let ObjectPropertyKind::ObjectProperty(p) = prop else {
            return None;
        };
        if resolve_object_key(&p.key, p.computed).as_deref() != Some(key) {
            return None;
        }
        match &p.value {
            Expression::FunctionExpression(func) if p.method || p.kind != PropertyKind::Init => {
                let body = func.body.as_ref()?;
                let prefix = match p.kind {
                    PropertyKind::Get => "get ",
                    PropertyKind::Set => "set ",
                    PropertyKind::Init => "",
                };
                let asyncness = if func.r#async { "async " } else { "" };
                Some(format!(
                    "{asyncness}{prefix}default() {}",
                    ctx.setup_text(body.span)
                ))
            }
            value => Some(format!("default: {}", ctx.setup_text(value.span()))),
        }
    })
}

/// Whether the `withDefaults` defaults object can be inlined per prop.
pub fn has_static_with_defaults(ctx: &ScriptCompileContext<'_>) -> bool {
    let Some(Expression::ObjectExpression(obj)) = ctx.props_runtime_defaults else {
        return false;
    };
    obj.properties.iter().all(|prop| match prop {
        ObjectPropertyKind::SpreadProperty(_) => false,
        ObjectPropertyKind::ObjectProperty(p) => {
            !p.computed || resolve_object_key(&p.key, true).is_some()
        }
    })
}

