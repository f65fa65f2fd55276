//! defineEmits macro handling.
//!
//! Handles the `defineEmits` Compiler Macro.

use oxc_ast::ast::{BindingPattern, BindingPatternKind, Expression, FormalParameters, TSLiteral, TSType};
use oxc_span::GetSpan;
use tracing::debug;
use vize_carton::to_json_string;

use crate::error::{ScriptErrorKind, ScriptResult};

use super::context::ScriptCompileContext;
use super::define_model::gen_model_emits;
use super::resolve_type::TypeOrigin;
use super::utils::is_call_of;

pub const DEFINE_EMITS: &str = "defineEmits";

/// Process a `defineEmits()` call. Returns `false` for any other expression.
pub fn process_define_emits<'a>(
    ctx: &mut ScriptCompileContext<'a>,
    expr: &'a Expression<'a>,
    decl_id: Option<&'a BindingPattern<'a>>,
) -> ScriptResult<bool> {
    let Some(call) = is_call_of(expr, DEFINE_EMITS) else {
        return Ok(false);
    };

    if ctx.has_define_emit_call {
        return Err(ctx.setup_error(
            ScriptErrorKind::MacroProtocol,
            format!("duplicate {DEFINE_EMITS}() call"),
            call.span,
        ));
    }
    ctx.has_define_emit_call = true;

    ctx.emits_runtime_decl = call.arguments.first().and_then(|arg| arg.as_expression());
    if let Some(type_params) = &call.type_parameters {
        if ctx.emits_runtime_decl.is_some() {
            return Err(ctx.setup_error(
                ScriptErrorKind::MacroProtocol,
                format!(
                    "{DEFINE_EMITS}() cannot accept both type and non-type arguments at the same time. Use one or the other."
                ),
                call.span,
            ));
        }
        ctx.emits_type_decl = type_params.params.first();
    }
    ctx.emit_decl = decl_id;

    debug!(
        runtime = ctx.emits_runtime_decl.is_some(),
        typed = ctx.emits_type_decl.is_some(),
        "defineEmits"
    );
    Ok(true)
}

/// The `emits` option, or `None` when nothing is emitted.
pub fn gen_runtime_emits(ctx: &mut ScriptCompileContext<'_>) -> ScriptResult<Option<String>> {
    let mut emits_decl = None;
    if let Some(runtime_decl) = ctx.emits_runtime_decl {
        emits_decl = Some(ctx.setup_text(runtime_decl.span()).trim().to_string());
    } else if ctx.emits_type_decl.is_some() {
        let events = extract_runtime_emits(ctx)?;
        if !events.is_empty() {
            let quoted: Vec<String> = events.iter().map(|e| to_json_string(e)).collect();
            emits_decl = Some(format!("[{}]", quoted.join(", ")));
        }
    }

    if let Some(model_emits) = gen_model_emits(ctx) {
        emits_decl = Some(match emits_decl {
            Some(decl) => {
                let helper = ctx.helper("mergeModels");
                format!("/*@__PURE__*/{helper}({decl}, {model_emits})")
            }
            None => model_emits,
        });
    }
    Ok(emits_decl)
}

/// Event names declared by the type argument, in declaration order.
pub fn extract_runtime_emits(ctx: &ScriptCompileContext<'_>) -> ScriptResult<Vec<String>> {
    let mut emits = Vec::new();
    let Some(ty) = ctx.emits_type_decl else {
        return Ok(emits);
    };

    if let TSType::TSFunctionType(func) = ty {
        extract_event_names(ctx, &func.params, &mut emits);
        return Ok(emits);
    }

    let elements = ctx
        .type_scope
        .resolve_type_elements(ty, TypeOrigin::Setup)
        .map_err(|err| ctx.type_error(err))?;

    for prop in &elements.props {
        push_unique(&mut emits, prop.key.clone());
    }
    if !elements.calls.is_empty() {
        if !elements.props.is_empty() {
            return Err(ctx.setup_error(
                ScriptErrorKind::MacroProtocol,
                format!("{DEFINE_EMITS}() type cannot mixed call signature and property syntax."),
                ty.span(),
            ));
        }
        for params in elements.calls.iter().copied() {
            extract_event_names(ctx, params, &mut emits);
        }
    }
    Ok(emits)
}

fn extract_event_names<'a>(
    ctx: &ScriptCompileContext<'a>,
    params: &'a FormalParameters<'a>,
    emits: &mut Vec<String>,
) {
    let Some(first) = params.items.first() else {
        return;
    };
    if !matches!(first.pattern.kind, BindingPatternKind::BindingIdentifier(_)) {
        return;
    }
    let Some(annotation) = &first.pattern.type_annotation else {
        return;
    };
    for ty in ctx.type_scope.resolve_union_type(&annotation.type_annotation) {
        if let TSType::TSLiteralType(lit) = ty {
            let name = match &lit.literal {
                TSLiteral::StringLiteral(s) => s.value.to_string(),
                TSLiteral::NumericLiteral(n) => n.value.to_string(),
                TSLiteral::BooleanLiteral(b) => b.value.to_string(),
                _ => continue,
            };
            push_unique(emits, name);
        }
    }
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}
