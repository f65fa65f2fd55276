//! defineOptions macro handling.
//!
//! Component options declared inside `<script setup>` are merged into the
//! generated component definition. Options that have a dedicated macro are
//! rejected.

use oxc_ast::ast::{Expression, ObjectPropertyKind, PropertyKey};

use crate::error::{ScriptErrorKind, ScriptResult};

use super::context::ScriptCompileContext;
use super::define_emits::DEFINE_EMITS;
use super::define_expose::DEFINE_EXPOSE;
use super::define_props::DEFINE_PROPS;
use super::define_slots::DEFINE_SLOTS;
use super::utils::{is_call_of, unwrap_ts_node};

pub const DEFINE_OPTIONS: &str = "defineOptions";

/// Process a `defineOptions()` call. Returns `false` for any other expression.
pub fn process_define_options<'a>(
    ctx: &mut ScriptCompileContext<'a>,
    expr: &'a Expression<'a>,
) -> ScriptResult<bool> {
    let Some(call) = is_call_of(expr, DEFINE_OPTIONS) else {
        return Ok(false);
    };
    if ctx.has_define_options_call {
        return Err(ctx.setup_error(
            ScriptErrorKind::MacroProtocol,
            format!("duplicate {DEFINE_OPTIONS}() call"),
            call.span,
        ));
    }
    if call.type_parameters.is_some() {
        return Err(ctx.setup_error(
            ScriptErrorKind::MacroProtocol,
            format!("{DEFINE_OPTIONS}() cannot accept type arguments"),
            call.span,
        ));
    }
    ctx.has_define_options_call = true;
    let Some(arg) = call.arguments.first().and_then(|arg| arg.as_expression()) else {
        return Ok(true);
    };

    let decl = unwrap_ts_node(arg);
    ctx.options_runtime_decl = Some(decl);

    if let Expression::ObjectExpression(obj) = decl {
        for prop in obj.properties.iter() {
            let ObjectPropertyKind::ObjectProperty(p) = prop else {
                continue;
            };
            let PropertyKey::StaticIdentifier(key) = &p.key else {
                continue;
            };
            let replacement = match key.name.as_str() {
                "props" => DEFINE_PROPS,
                "emits" => DEFINE_EMITS,
                "expose" => DEFINE_EXPOSE,
                "slots" => DEFINE_SLOTS,
                _ => continue,
            };
            return Err(ctx.setup_error(
                ScriptErrorKind::MacroProtocol,
                format!(
                    "{DEFINE_OPTIONS}() cannot be used to declare {}. Use {replacement}() instead.",
                    key.name
                ),
                p.span,
            ));
        }
    }
    Ok(true)
}
