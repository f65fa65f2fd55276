//! defineExpose macro handling.

use oxc_ast::ast::Expression;

use crate::error::{ScriptErrorKind, ScriptResult};

use super::context::ScriptCompileContext;
use super::utils::is_call_of;

pub const DEFINE_EXPOSE: &str = "defineExpose";

/// Process a `defineExpose()` call. Returns `false` for any other expression.
pub fn process_define_expose(
    ctx: &mut ScriptCompileContext<'_>,
    expr: &Expression<'_>,
) -> ScriptResult<bool> {
    let Some(call) = is_call_of(expr, DEFINE_EXPOSE) else {
        return Ok(false);
    };
    if ctx.has_define_expose_call {
        return Err(ctx.setup_error(
            ScriptErrorKind::MacroProtocol,
            format!("duplicate {DEFINE_EXPOSE}() call"),
            call.span,
        ));
    }
    ctx.has_define_expose_call = true;
    Ok(true)
}
