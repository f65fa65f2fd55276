//! The `<script setup>` body.
//!
//! Walks the top-level statements once: macro calls are processed and
//! rewritten, bindings are classified, literal constants and type
//! declarations are hoisted to module scope and top-level `await` is made
//! async-context aware.

use once_cell::sync::Lazy;
use oxc_ast::ast::{
    AwaitExpression, BindingPatternKind, Declaration, Expression, Statement, VariableDeclaration,
};
use oxc_span::GetSpan;
use regex::Regex;
use tracing::{debug, trace};

use crate::error::{ScriptErrorKind, ScriptResult};
use crate::script::{
    collect_references, process_define_emits, process_define_expose, process_define_model,
    process_define_options, process_define_props, process_define_slots, unwrap_ts_node,
    DeclarationClassifier, ReferenceVisitor, ScopeWalker, ScriptCompileContext, DEFINE_EMITS,
    DEFINE_MODEL, DEFINE_OPTIONS, DEFINE_PROPS,
};
use crate::types::BindingType;

use super::hoist_setup_node;

static AWAIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bawait\b").expect("valid await regex"));

/// Process every top-level statement of `<script setup>`.
pub(super) fn process_setup_body(ctx: &mut ScriptCompileContext<'_>) -> ScriptResult<()> {
    let Some(setup) = ctx.script_setup else {
        return Ok(());
    };
    let hoist_static = ctx.options.hoist_static && ctx.script.is_none();

    for stmt in setup.program.body.iter() {
        if let Statement::ExpressionStatement(expr_stmt) = stmt {
            let expr = unwrap_ts_node(&expr_stmt.expression);
            if process_define_props(ctx, expr, None)?
                || process_define_emits(ctx, expr, None)?
                || process_define_options(ctx, expr)?
                || process_define_slots(ctx, expr, None)?
            {
                let (start, end) = ctx.setup_range(expr_stmt.span);
                ctx.s.remove(start, end);
            } else if process_define_expose(ctx, expr)? {
                if let Expression::CallExpression(call) = expr {
                    let (start, end) = ctx.setup_range(call.callee.span());
                    ctx.s.overwrite(start, end, "__expose");
                }
            } else {
                process_define_model(ctx, expr, None)?;
            }
        }

        if let Statement::VariableDeclaration(var) = stmt {
            if !var.declare {
                process_declarators(ctx, var)?;
            }
        }

        let is_all_literal = match stmt.as_declaration() {
            Some(
                decl @ (Declaration::VariableDeclaration(_)
                | Declaration::FunctionDeclaration(_)
                | Declaration::ClassDeclaration(_)
                | Declaration::TSEnumDeclaration(_)),
            ) => {
                let classifier = DeclarationClassifier {
                    aliases: &ctx.user_import_aliases,
                    literal_const: hoist_static,
                    props_destructure: ctx.props_destructure_decl.is_some(),
                };
                classifier.walk(decl, &mut ctx.setup_bindings)
            }
            _ => false,
        };
        if hoist_static && is_all_literal {
            trace!("hoist literal constant");
            hoist_setup_node(ctx, stmt.span());
        }

        let is_value_export = match stmt {
            Statement::ExportNamedDeclaration(export) => {
                !is_type_export(export.export_kind.is_type(), export.declaration.as_ref())
            }
            Statement::ExportAllDeclaration(export) => !export.export_kind.is_type(),
            Statement::ExportDefaultDeclaration(_) => true,
            _ => false,
        };
        if is_value_export {
            return Err(ctx.setup_error(
                ScriptErrorKind::InvalidInput,
                "<script setup> cannot contain ES module exports. If you are using a previous version of <script setup>, please consult the updated RFC at https://github.com/vuejs/rfcs/pull/227.",
                stmt.span(),
            ));
        }

        if ctx.is_ts && is_type_only_statement(stmt) {
            trace!("hoist type declaration");
            hoist_setup_node(ctx, stmt.span());
        }
    }

    debug!(
        bindings = ctx.setup_bindings.len(),
        props = ctx.has_define_props_call,
        emits = ctx.has_define_emit_call,
        models = ctx.model_decls.len(),
        "processed setup body"
    );
    Ok(())
}

fn is_type_export(is_type_kind: bool, declaration: Option<&Declaration<'_>>) -> bool {
    is_type_kind
        || matches!(
            declaration,
            Some(
                Declaration::TSTypeAliasDeclaration(_)
                    | Declaration::TSInterfaceDeclaration(_)
            )
        )
}

/// Statements that only exist for the type checker.
fn is_type_only_statement(stmt: &Statement<'_>) -> bool {
    match stmt {
        Statement::TSTypeAliasDeclaration(_)
        | Statement::TSInterfaceDeclaration(_)
        | Statement::TSModuleDeclaration(_)
        | Statement::TSImportEqualsDeclaration(_)
        | Statement::TSExportAssignment(_)
        | Statement::TSNamespaceExportDeclaration(_) => true,
        Statement::ExportNamedDeclaration(export) => {
            is_type_export(export.export_kind.is_type(), export.declaration.as_ref())
        }
        Statement::VariableDeclaration(var) => var.declare,
        Statement::TSEnumDeclaration(e) => e.declare,
        Statement::ClassDeclaration(class) => class.declare,
        Statement::FunctionDeclaration(func) => func.declare || func.body.is_none(),
        _ => false,
    }
}

/// Process macro initializers of a variable declaration.
fn process_declarators<'a>(
    ctx: &mut ScriptCompileContext<'a>,
    var: &'a VariableDeclaration<'a>,
) -> ScriptResult<()> {
    let total = var.declarations.len();
    let mut left = total;
    let mut last_non_removed = None;
    let offset = ctx.setup_offset();

    for (i, decl) in var.declarations.iter().enumerate() {
        let Some(init) = decl.init.as_ref().map(unwrap_ts_node) else {
            continue;
        };

        if process_define_options(ctx, init)? {
            return Err(ctx.setup_error(
                ScriptErrorKind::MacroProtocol,
                format!("{DEFINE_OPTIONS}() has no returning value, it cannot be assigned."),
                var.span,
            ));
        }

        let is_define_props = process_define_props(ctx, init, Some(&decl.id))?;
        if let Some(rest) = ctx.props_destructure_rest_id {
            ctx.setup_bindings.insert(rest, BindingType::SetupReactiveConst);
        }
        let is_define_emits = !is_define_props && process_define_emits(ctx, init, Some(&decl.id))?;
        if !is_define_emits && !process_define_slots(ctx, init, Some(&decl.id))? {
            process_define_model(ctx, init, Some(&decl.id))?;
        }

        if is_define_props
            && ctx.props_destructure_rest_id.is_none()
            && ctx.props_destructure_decl.is_some()
        {
            if left == 1 {
                let (start, end) = ctx.setup_range(var.span);
                ctx.s.remove(start, end);
            } else {
                let (mut start, mut end) = ctx.setup_range(decl.span);
                if i == total - 1 {
                    if let Some(prev) = last_non_removed.and_then(|p: usize| var.declarations.get(p)) {
                        start = offset + prev.span.end as usize;
                    }
                } else if let Some(next) = var.declarations.get(i + 1) {
                    end = offset + next.span.start as usize;
                }
                ctx.s.remove(start, end);
                left -= 1;
            }
        } else if is_define_emits {
            let (start, end) = ctx.setup_range(init.span());
            ctx.s.overwrite(start, end, "__emit");
        } else {
            last_non_removed = Some(i);
        }
    }
    Ok(())
}

#[derive(Default)]
struct AwaitCollector<'a> {
    awaits: Vec<(&'a AwaitExpression<'a>, bool, bool)>,
    has_for_await: bool,
}

impl<'a> ReferenceVisitor<'a> for AwaitCollector<'a> {
    fn visit_await(&mut self, expr: &'a AwaitExpression<'a>, is_statement: bool, needs_semi: bool) {
        self.awaits.push((expr, is_statement, needs_semi));
    }

    fn visit_for_await(&mut self) {
        self.has_for_await = true;
    }
}

/// Wrap every top-level `await` so the component instance is restored
/// after it resolves.
pub(super) fn rewrite_top_level_awaits(ctx: &mut ScriptCompileContext<'_>) {
    let Some(setup) = ctx.script_setup else {
        return;
    };
    let mut collector = AwaitCollector::default();
    ScopeWalker::new(&mut collector).walk_program(&setup.program.body);

    if collector.awaits.is_empty() && !collector.has_for_await {
        return;
    }
    ctx.has_await = true;
    debug!(count = collector.awaits.len(), "top-level await");
    for (expr, is_statement, needs_semi) in collector.awaits {
        process_await(ctx, expr, is_statement, needs_semi);
    }
}

fn process_await(
    ctx: &mut ScriptCompileContext<'_>,
    node: &AwaitExpression<'_>,
    is_statement: bool,
    needs_semi: bool,
) {
    let offset = ctx.setup_offset();
    let argument = node.argument.span();
    let contains_nested_await = AWAIT_RE.is_match(ctx.setup_text(argument));
    let helper = ctx.helper("withAsyncContext");

    ctx.s.overwrite(
        offset + node.span.start as usize,
        offset + argument.start as usize,
        format!(
            "{}(\n  ([__temp,__restore] = {helper}({}() => ",
            if needs_semi { ";" } else { "" },
            if contains_nested_await { "async " } else { "" },
        ),
    );
    ctx.s.append_left(
        offset + node.span.end as usize,
        format!(
            ")),\n  {}await __temp,\n  __restore(){}\n)",
            if is_statement { "" } else { "__temp = " },
            if is_statement { "" } else { ",\n  __temp" },
        ),
    );
}

/// Macro arguments are hoisted out of `setup()` and must not reference
/// setup-scope bindings other than literal constants.
pub(super) fn check_macro_scope_references(ctx: &ScriptCompileContext<'_>) -> ScriptResult<()> {
    check_scope_reference(ctx, ctx.props_runtime_decl, DEFINE_PROPS)?;
    check_scope_reference(ctx, ctx.props_runtime_defaults, DEFINE_PROPS)?;
    if let Some(pattern) = ctx.props_destructure_decl {
        for prop in pattern.properties.iter() {
            if let BindingPatternKind::AssignmentPattern(assign) = &prop.value.kind {
                check_scope_reference(ctx, Some(&assign.right), DEFINE_PROPS)?;
            }
        }
    }
    check_scope_reference(ctx, ctx.emits_runtime_decl, DEFINE_EMITS)?;
    check_scope_reference(ctx, ctx.options_runtime_decl, DEFINE_OPTIONS)?;
    for model in &ctx.model_decls {
        for node in model.runtime_option_nodes.iter().copied() {
            check_scope_reference(ctx, Some(node), DEFINE_MODEL)?;
        }
    }
    Ok(())
}

fn check_scope_reference<'a>(
    ctx: &ScriptCompileContext<'a>,
    node: Option<&'a Expression<'a>>,
    method: &str,
) -> ScriptResult<()> {
    let Some(node) = node else {
        return Ok(());
    };
    for (id, _) in collect_references(node) {
        match ctx.setup_bindings.get(id.name.as_str()) {
            Some(binding) if binding != BindingType::LiteralConst => {
                return Err(ctx.setup_error(
                    ScriptErrorKind::MacroProtocol,
                    format!(
                        "`{method}()` in <script setup> cannot reference locally declared variables because it will be hoisted outside of the setup() function. If your component options require initialization in the module scope, use a separate normal <script> to export the options instead."
                    ),
                    id.span,
                ));
            }
            _ => {}
        }
    }
    Ok(())
}
