//! AST helpers shared by the macro processors and the binding classifier.

use once_cell::sync::Lazy;
use oxc_ast::ast::{
    ArrayExpressionElement, Expression, ObjectExpression, ObjectPropertyKind, PropertyKey,
};
use regex::Regex;
use vize_carton::{get_escaped_prop_name, is_simple_identifier};

/// Strip TypeScript-only wrappers and parentheses from an expression.
pub fn unwrap_ts_node<'b, 'a>(expr: &'b Expression<'a>) -> &'b Expression<'a> {
    match expr {
        Expression::TSAsExpression(e) => unwrap_ts_node(&e.expression),
        Expression::TSSatisfiesExpression(e) => unwrap_ts_node(&e.expression),
        Expression::TSNonNullExpression(e) => unwrap_ts_node(&e.expression),
        Expression::TSTypeAssertion(e) => unwrap_ts_node(&e.expression),
        Expression::ParenthesizedExpression(e) => unwrap_ts_node(&e.expression),
        _ => expr,
    }
}

/// Name of a call's callee when it is a plain identifier.
pub fn callee_name<'a>(call: &oxc_ast::ast::CallExpression<'a>) -> Option<&'a str> {
    match &call.callee {
        Expression::Identifier(id) => Some(id.name.as_str()),
        _ => None,
    }
}

/// The call expression when `expr` calls the identifier `name`.
pub fn is_call_of<'b, 'a>(
    expr: &'b Expression<'a>,
    name: &str,
) -> Option<&'b oxc_ast::ast::CallExpression<'a>> {
    match expr {
        Expression::CallExpression(call) if callee_name(call) == Some(name) => Some(call),
        _ => None,
    }
}

/// Static name of a property key. Computed keys resolve only when literal.
pub fn resolve_object_key(key: &PropertyKey<'_>, computed: bool) -> Option<String> {
    match key {
        PropertyKey::StaticIdentifier(id) if !computed => Some(id.name.to_string()),
        PropertyKey::StringLiteral(s) => Some(s.value.to_string()),
        PropertyKey::NumericLiteral(n) => Some(n.value.to_string()),
        PropertyKey::TemplateLiteral(t) if t.expressions.is_empty() => t
            .quasis
            .first()
            .map(|q| q.value.cooked.as_ref().unwrap_or(&q.value.raw).to_string()),
        _ => None,
    }
}

/// Keys of a runtime props/emits declaration in source order.
pub fn get_object_or_array_expression_keys(expr: &Expression<'_>) -> Vec<String> {
    match unwrap_ts_node(expr) {
        Expression::ObjectExpression(obj) => get_object_expression_keys(obj),
        Expression::ArrayExpression(arr) => arr
            .elements
            .iter()
            .filter_map(|elem| match elem {
                ArrayExpressionElement::StringLiteral(s) => Some(s.value.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

pub fn get_object_expression_keys(obj: &ObjectExpression<'_>) -> Vec<String> {
    obj.properties
        .iter()
        .filter_map(|prop| match prop {
            ObjectPropertyKind::ObjectProperty(p) => resolve_object_key(&p.key, p.computed),
            ObjectPropertyKind::SpreadProperty(_) => None,
        })
        .collect()
}

/// Any literal node, template literals included.
pub fn is_literal_node(expr: &Expression<'_>) -> bool {
    matches!(
        expr,
        Expression::StringLiteral(_)
            | Expression::NumericLiteral(_)
            | Expression::BooleanLiteral(_)
            | Expression::NullLiteral(_)
            | Expression::BigIntLiteral(_)
            | Expression::RegExpLiteral(_)
            | Expression::TemplateLiteral(_)
    )
}

/// Whether an expression is built only from primitive literals.
pub fn is_static_node(expr: &Expression<'_>) -> bool {
    match unwrap_ts_node(expr) {
        Expression::UnaryExpression(unary) => is_static_node(&unary.argument),
        Expression::LogicalExpression(logical) => {
            is_static_node(&logical.left) && is_static_node(&logical.right)
        }
        Expression::BinaryExpression(bin) => is_static_node(&bin.left) && is_static_node(&bin.right),
        Expression::ConditionalExpression(cond) => {
            is_static_node(&cond.test)
                && is_static_node(&cond.consequent)
                && is_static_node(&cond.alternate)
        }
        Expression::SequenceExpression(seq) => seq.expressions.iter().all(is_static_node),
        Expression::TemplateLiteral(template) => template.expressions.iter().all(is_static_node),
        Expression::StringLiteral(_)
        | Expression::NumericLiteral(_)
        | Expression::BooleanLiteral(_)
        | Expression::NullLiteral(_)
        | Expression::BigIntLiteral(_) => true,
        _ => false,
    }
}

/// Whether a const initializer can never evaluate to a ref.
pub fn can_never_be_ref(expr: &Expression<'_>, reactive_alias: &str) -> bool {
    if is_call_of(expr, reactive_alias).is_some() {
        return true;
    }
    match expr {
        Expression::UnaryExpression(_)
        | Expression::BinaryExpression(_)
        | Expression::ArrayExpression(_)
        | Expression::ObjectExpression(_)
        | Expression::FunctionExpression(_)
        | Expression::ArrowFunctionExpression(_)
        | Expression::UpdateExpression(_)
        | Expression::ClassExpression(_)
        | Expression::TaggedTemplateExpression(_) => true,
        Expression::SequenceExpression(seq) => seq
            .expressions
            .last()
            .is_some_and(|last| can_never_be_ref(last, reactive_alias)),
        _ => is_literal_node(expr),
    }
}

pub fn is_function_type(expr: &Expression<'_>) -> bool {
    matches!(
        expr,
        Expression::FunctionExpression(_) | Expression::ArrowFunctionExpression(_)
    )
}

/// Property access on `__props` for a prop key.
pub fn gen_props_access_exp(key: &str) -> String {
    if is_simple_identifier(key) {
        format!("__props.{key}")
    } else {
        format!("__props[{}]", get_escaped_prop_name(key))
    }
}

/// Join the non-empty parts with `, `.
pub fn concat_strings(parts: &[Option<&str>]) -> String {
    parts
        .iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}

static COMPONENT_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([^/\\]+)\.\w+$").expect("valid component name regex"));

/// Component name inferred from the file name (`src/Foo.vue` -> `Foo`).
pub fn component_name_from_filename(filename: &str) -> Option<&str> {
    COMPONENT_NAME_RE
        .captures(filename)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use oxc_ast::ast::Statement;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    fn with_expr(source: &str, f: impl FnOnce(&Expression<'_>)) {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::ts()).parse();
        match ret.program.body.first() {
            Some(Statement::ExpressionStatement(stmt)) => f(&stmt.expression),
            _ => panic!("expected expression statement"),
        }
    }

    #[test]
    fn test_is_static_node() {
        with_expr("1 + 2 * 3", |e| assert!(is_static_node(e)));
        with_expr("`a${1}` as string", |e| assert!(is_static_node(e)));
        with_expr("-1 || 'x'", |e| assert!(is_static_node(e)));
        with_expr("foo + 1", |e| assert!(!is_static_node(e)));
        with_expr("/re/", |e| assert!(!is_static_node(e)));
    }

    #[test]
    fn test_can_never_be_ref() {
        with_expr("reactive({})", |e| assert!(can_never_be_ref(e, "reactive")));
        with_expr("[1, 2]", |e| assert!(can_never_be_ref(e, "reactive")));
        with_expr("(foo, () => 1)", |e| assert!(can_never_be_ref(e, "reactive")));
        with_expr("useThing()", |e| assert!(!can_never_be_ref(e, "reactive")));
        with_expr("a ?? b", |e| assert!(!can_never_be_ref(e, "reactive")));
    }

    #[test]
    fn test_expression_keys() {
        with_expr("({ foo: String, 'bar-baz': Number, [`q`]: 1, ...rest })", |e| {
            assert_eq!(get_object_or_array_expression_keys(e), vec!["foo", "bar-baz", "q"]);
        });
        with_expr("['a', 'b']", |e| {
            assert_eq!(get_object_or_array_expression_keys(e), vec!["a", "b"]);
        });
    }

    #[test]
    fn test_gen_props_access_exp() {
        assert_eq!(gen_props_access_exp("foo"), "__props.foo");
        assert_eq!(gen_props_access_exp("foo-bar"), "__props[\"foo-bar\"]");
    }

    #[test]
    fn test_component_name_from_filename() {
        assert_eq!(component_name_from_filename("src/components/FooBar.vue"), Some("FooBar"));
        assert_eq!(component_name_from_filename("C:\\app\\Baz.vue"), Some("Baz"));
        assert_eq!(component_name_from_filename("noext"), None);
    }
}
