//! Binding analysis of a normal `<script>` component.
//!
//! Reads the options object of `export default { ... }` so the template
//! compiler knows where each name comes from.

use oxc_ast::ast::{
    Expression, ObjectExpression, ObjectPropertyKind, Program, PropertyKey, PropertyKind,
    Statement,
};

use crate::types::{BindingMetadata, BindingType};

use super::utils::{get_object_expression_keys, get_object_or_array_expression_keys, unwrap_ts_node};

/// Analyze bindings of a component declared with the options API.
pub fn analyze_script_bindings(program: &Program<'_>) -> BindingMetadata {
    for stmt in program.body.iter() {
        if let Statement::ExportDefaultDeclaration(export) = stmt {
            if let Some(Expression::ObjectExpression(obj)) =
                export.declaration.as_expression().map(unwrap_ts_node)
            {
                return analyze_bindings_from_options(obj);
            }
        }
    }
    BindingMetadata::default()
}

fn analyze_bindings_from_options(obj: &ObjectExpression<'_>) -> BindingMetadata {
    let mut bindings = BindingMetadata::default();

    for prop in obj.properties.iter() {
        let ObjectPropertyKind::ObjectProperty(prop) = prop else {
            continue;
        };
        let PropertyKey::StaticIdentifier(key) = &prop.key else {
            continue;
        };
        if prop.computed {
            continue;
        }
        let key = key.name.as_str();

        if prop.method {
            if prop.kind != PropertyKind::Init || !matches!(key, "setup" | "data") {
                continue;
            }
            let Expression::FunctionExpression(func) = &prop.value else {
                continue;
            };
            let Some(body) = &func.body else {
                continue;
            };
            let binding_type = if key == "setup" {
                BindingType::SetupMaybeRef
            } else {
                BindingType::Data
            };
            for stmt in body.statements.iter() {
                if let Statement::ReturnStatement(ret) = stmt {
                    if let Some(Expression::ObjectExpression(returned)) = &ret.argument {
                        for name in get_object_expression_keys(returned) {
                            bindings.bindings.insert(name, binding_type);
                        }
                    }
                }
            }
            continue;
        }

        match key {
            "props" => {
                for name in get_object_or_array_expression_keys(&prop.value) {
                    bindings.bindings.insert(name, BindingType::Props);
                }
            }
            "inject" => {
                for name in get_object_or_array_expression_keys(&prop.value) {
                    bindings.bindings.insert(name, BindingType::Options);
                }
            }
            "computed" | "methods" => {
                if let Expression::ObjectExpression(inner) = &prop.value {
                    for name in get_object_expression_keys(inner) {
                        bindings.bindings.insert(name, BindingType::Options);
                    }
                }
            }
            _ => {}
        }
    }

    bindings
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    fn analyze(source: &str) -> BindingMetadata {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
        assert!(ret.errors.is_empty(), "{:?}", ret.errors);
        analyze_script_bindings(&ret.program)
    }

    #[test]
    fn test_options_api_bindings() {
        let bindings = analyze(
            r#"export default {
  props: ['foo', 'bar'],
  inject: { theme: 'theme' },
  computed: { total() { return 1 } },
  methods: { onClick() {} },
  data() { return { count: 0 } },
  setup() { return { state } },
}"#,
        );
        assert_eq!(bindings.get("foo"), Some(BindingType::Props));
        assert_eq!(bindings.get("bar"), Some(BindingType::Props));
        assert_eq!(bindings.get("theme"), Some(BindingType::Options));
        assert_eq!(bindings.get("total"), Some(BindingType::Options));
        assert_eq!(bindings.get("onClick"), Some(BindingType::Options));
        assert_eq!(bindings.get("count"), Some(BindingType::Data));
        assert_eq!(bindings.get("state"), Some(BindingType::SetupMaybeRef));
        assert!(!bindings.is_script_setup);
    }

    #[test]
    fn test_object_props_and_non_object_export() {
        let bindings = analyze("export default { props: { msg: String, 'with-dash': Number } }");
        assert_eq!(bindings.get("msg"), Some(BindingType::Props));
        assert_eq!(bindings.get("with-dash"), Some(BindingType::Props));

        let empty = analyze("export default defineComponent({ props: ['a'] })");
        assert!(empty.bindings.is_empty());
    }

    #[test]
    fn test_setup_property_function_is_ignored() {
        let bindings = analyze("export default { setup: function () { return { a } } }");
        assert!(bindings.get("a").is_none());
    }
}
