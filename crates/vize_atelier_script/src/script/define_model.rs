//! defineModel macro handling.
//!
//! `defineModel()` declares a two-way bound prop together with its
//! `update:*` event and is rewritten into a `useModel()` call.

use oxc_ast::ast::{BindingPattern, BindingPatternKind, Expression, ObjectPropertyKind, PropertyKey, TSType};
use oxc_span::GetSpan;
use tracing::debug;
use vize_carton::to_json_string;

use crate::error::{ScriptErrorKind, ScriptResult};
use crate::types::BindingType;

use super::context::ScriptCompileContext;
use super::resolve_type::{infer_runtime_type, RuntimeTag, RuntimeTypes};
use super::utils::{is_call_of, unwrap_ts_node};

pub const DEFINE_MODEL: &str = "defineModel";

/// A model declared through `defineModel()`.
#[derive(Debug, Clone)]
pub struct ModelDecl<'a> {
    pub name: String,
    pub ty: Option<&'a TSType<'a>>,
    /// Prop options source, with runtime-only `get`/`set` stripped.
    pub options: Option<String>,
    /// Prop option values moved out of the runtime call.
    pub runtime_option_nodes: Vec<&'a Expression<'a>>,
    pub identifier: Option<String>,
}

fn is_runtime_only_option(key: &PropertyKey<'_>) -> bool {
    match key {
        PropertyKey::StaticIdentifier(id) => matches!(id.name.as_str(), "get" | "set"),
        PropertyKey::StringLiteral(s) => matches!(s.value.as_str(), "get" | "set"),
        _ => false,
    }
}

/// Process a `defineModel()` call. Returns `false` for any other expression.
pub fn process_define_model<'a>(
    ctx: &mut ScriptCompileContext<'a>,
    expr: &'a Expression<'a>,
    decl_id: Option<&'a BindingPattern<'a>>,
) -> ScriptResult<bool> {
    let Some(call) = is_call_of(expr, DEFINE_MODEL) else {
        return Ok(false);
    };
    ctx.has_define_model_call = true;

    let ty = call
        .type_parameters
        .as_ref()
        .and_then(|params| params.params.first());

    let arg0 = call
        .arguments
        .first()
        .and_then(|arg| arg.as_expression())
        .map(unwrap_ts_node);
    let (name, has_name, options) = match arg0 {
        Some(Expression::StringLiteral(s)) => (
            s.value.to_string(),
            true,
            call.arguments.get(1).and_then(|arg| arg.as_expression()),
        ),
        _ => ("modelValue".to_string(), false, arg0),
    };

    if ctx.model_decls.iter().any(|m| m.name == name) {
        return Err(ctx.setup_error(
            ScriptErrorKind::MacroProtocol,
            format!("duplicate model name {}", to_json_string(&name)),
            call.span,
        ));
    }

    let offset = ctx.setup_offset();
    let mut options_string = options.map(|o| ctx.setup_text(o.span()).to_string());
    let mut options_removed = options.is_none();
    let mut runtime_option_nodes = Vec::new();

    if let Some(Expression::ObjectExpression(obj)) = options {
        let splittable = obj.properties.iter().all(|p| match p {
            ObjectPropertyKind::ObjectProperty(p) => !p.computed,
            ObjectPropertyKind::SpreadProperty(_) => false,
        });
        if splittable {
            let options_start = obj.span.start as usize;
            let mut removed = 0;
            for (i, prop) in obj.properties.iter().enumerate().rev() {
                let ObjectPropertyKind::ObjectProperty(p) = prop else {
                    continue;
                };
                let start = p.span.start as usize;
                let end = obj
                    .properties
                    .get(i + 1)
                    .map_or(obj.span.end as usize - 1, |next| next.span().start as usize);
                if is_runtime_only_option(&p.key) {
                    if let Some(options) = options_string.as_mut() {
                        options.replace_range(start - options_start..end - options_start, "");
                    }
                } else {
                    removed += 1;
                    ctx.s.remove(offset + start, offset + end);
                    runtime_option_nodes.push(&p.value);
                }
            }
            if removed == obj.properties.len() {
                options_removed = true;
                let remove_from = match arg0 {
                    Some(first) if has_name => first.span().end as usize,
                    _ => obj.span.start as usize,
                };
                ctx.s.remove(offset + remove_from, offset + obj.span.end as usize);
            }
        }
    }

    let identifier = match decl_id.map(|d| &d.kind) {
        Some(BindingPatternKind::BindingIdentifier(id)) => Some(id.name.to_string()),
        _ => None,
    };

    ctx.bindings.register(&name, BindingType::Props);

    let use_model = ctx.helper("useModel");
    let (callee_start, callee_end) = ctx.setup_range(call.callee.span());
    ctx.s.overwrite(callee_start, callee_end, use_model);

    let inject_at = match call.arguments.first() {
        Some(first) => first.span().start as usize,
        None => call.span.end as usize - 1,
    };
    let injected = if has_name {
        "__props, ".to_string()
    } else if options_removed {
        format!("__props, {}", to_json_string(&name))
    } else {
        format!("__props, {}, ", to_json_string(&name))
    };
    ctx.s.append_left(offset + inject_at, injected);

    debug!(name = %name, typed = ty.is_some(), "defineModel");
    ctx.model_decls.push(ModelDecl {
        name,
        ty,
        options: options_string,
        runtime_option_nodes,
        identifier,
    });
    Ok(true)
}

/// Prop declarations of every model, including the modifiers props.
pub fn gen_model_props(ctx: &ScriptCompileContext<'_>) -> Option<String> {
    if !ctx.has_define_model_call {
        return None;
    }
    let is_prod = ctx.options.is_prod;
    let mut decl = String::new();

    for model in &ctx.model_decls {
        let mut skip_check = false;
        let mut codegen_options = None;

        if let Some(ty) = model.ty {
            let mut types = infer_runtime_type(&ctx.type_scope, ty);
            let has_boolean = types.contains(RuntimeTag::Boolean);
            let has_function = types.contains(RuntimeTag::Function);
            if types.contains(RuntimeTag::Unknown) {
                if has_boolean || has_function {
                    types.remove(RuntimeTag::Unknown);
                    skip_check = true;
                } else {
                    types = RuntimeTypes::single(RuntimeTag::Null);
                }
            }
            if !is_prod {
                let mut options = format!("type: {}", types.to_runtime_string());
                if skip_check {
                    options.push_str(", skipCheck: true");
                }
                codegen_options = Some(options);
            } else if has_boolean || (model.options.is_some() && has_function) {
                codegen_options = Some(format!("type: {}", types.to_runtime_string()));
            }
        }

        let value = match (&codegen_options, &model.options) {
            (Some(codegen), Some(runtime)) if ctx.is_ts => format!("{{ {codegen}, ...{runtime} }}"),
            (Some(codegen), Some(runtime)) => format!("Object.assign({{ {codegen} }}, {runtime})"),
            (Some(codegen), None) => format!("{{ {codegen} }}"),
            (None, Some(runtime)) => runtime.clone(),
            (None, None) => "{}".to_string(),
        };
        decl.push_str(&format!("\n    {}: {value},", to_json_string(&model.name)));

        let modifiers = if model.name == "modelValue" {
            "modelModifiers".to_string()
        } else {
            format!("{}Modifiers", model.name)
        };
        decl.push_str(&format!("\n    {}: {{}},", to_json_string(&modifiers)));
    }

    Some(format!("{{{decl}\n  }}"))
}

/// Event names emitted by the declared models.
pub fn gen_model_emits(ctx: &ScriptCompileContext<'_>) -> Option<String> {
    if !ctx.has_define_model_call {
        return None;
    }
    let events: Vec<String> = ctx
        .model_decls
        .iter()
        .map(|m| to_json_string(&format!("update:{}", m.name)))
        .collect();
    Some(format!("[{}]", events.join(", ")))
}
