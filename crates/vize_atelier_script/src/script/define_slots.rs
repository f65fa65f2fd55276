//! defineSlots macro handling.
//!
//! The macro only exists for typing; an assigned result becomes a
//! `useSlots()` call.

use oxc_ast::ast::{BindingPattern, Expression};

use crate::error::{ScriptErrorKind, ScriptResult};

use super::context::ScriptCompileContext;
use super::utils::is_call_of;

pub const DEFINE_SLOTS: &str = "defineSlots";

/// Process a `defineSlots()` call. Returns `false` for any other expression.
pub fn process_define_slots(
    ctx: &mut ScriptCompileContext<'_>,
    expr: &Expression<'_>,
    decl_id: Option<&BindingPattern<'_>>,
) -> ScriptResult<bool> {
    let Some(call) = is_call_of(expr, DEFINE_SLOTS) else {
        return Ok(false);
    };
    if ctx.has_define_slots_call {
        return Err(ctx.setup_error(
            ScriptErrorKind::MacroProtocol,
            format!("duplicate {DEFINE_SLOTS}() call"),
            call.span,
        ));
    }
    ctx.has_define_slots_call = true;

    if !call.arguments.is_empty() {
        return Err(ctx.setup_error(
            ScriptErrorKind::MacroProtocol,
            format!("{DEFINE_SLOTS}() cannot accept arguments"),
            call.span,
        ));
    }

    if decl_id.is_some() {
        let use_slots = ctx.helper("useSlots");
        let (start, end) = ctx.setup_range(call.span);
        ctx.s.overwrite(start, end, format!("{use_slots}()"));
    }
    Ok(true)
}
