//! Binding classification of top-level declarations.
//!
//! Every name declared at the top level of a script block gets a
//! [`BindingType`] describing how the template may access it.

use oxc_ast::ast::{
    ArrayPattern, BindingPattern, BindingPatternKind, Declaration, Expression, ObjectPattern,
    VariableDeclaration, VariableDeclarationKind,
};
use vize_carton::FxHashMap;

use crate::types::BindingType;

use super::context::OrderedBindings;
use super::define_emits::DEFINE_EMITS;
use super::define_model::DEFINE_MODEL;
use super::define_props::{DEFINE_PROPS, WITH_DEFAULTS};
use super::define_slots::DEFINE_SLOTS;
use super::utils::{callee_name, can_never_be_ref, is_call_of, is_static_node, unwrap_ts_node};

/// Runtime APIs whose const result is always a ref.
const REF_CREATORS: [&str; 5] = ["ref", "computed", "shallowRef", "customRef", "toRef"];

/// Classifies declarations of one block.
pub struct DeclarationClassifier<'m> {
    /// Local names of runtime imports keyed by imported name.
    pub aliases: &'m FxHashMap<String, String>,
    /// Static const initializers become `literal-const`.
    pub literal_const: bool,
    /// Destructured `defineProps()` is registered by the destructure pass.
    pub props_destructure: bool,
}

impl DeclarationClassifier<'_> {
    fn alias(&self, imported: &str) -> Option<&str> {
        self.aliases.get(imported).map(String::as_str)
    }

    fn calls_alias(&self, init: &Expression<'_>, imported: &str) -> bool {
        self.alias(imported)
            .is_some_and(|alias| is_call_of(init, alias).is_some())
    }

    /// Register the names of `decl`. Returns whether every declared value is
    /// a static literal.
    pub fn walk(&self, decl: &Declaration<'_>, bindings: &mut OrderedBindings) -> bool {
        match decl {
            Declaration::VariableDeclaration(var) => self.walk_variables(var, bindings),
            Declaration::TSEnumDeclaration(e) if !e.declare => {
                let all_literal = e
                    .members
                    .iter()
                    .all(|m| m.initializer.as_ref().map_or(true, is_static_node));
                let binding_type = if all_literal {
                    BindingType::LiteralConst
                } else {
                    BindingType::SetupConst
                };
                bindings.insert(e.id.name.as_str(), binding_type);
                all_literal
            }
            Declaration::FunctionDeclaration(f) if !f.declare => {
                if let Some(id) = &f.id {
                    bindings.insert(id.name.as_str(), BindingType::SetupConst);
                }
                false
            }
            Declaration::ClassDeclaration(c) if !c.declare => {
                if let Some(id) = &c.id {
                    bindings.insert(id.name.as_str(), BindingType::SetupConst);
                }
                false
            }
            _ => false,
        }
    }

    fn walk_variables(&self, var: &VariableDeclaration<'_>, bindings: &mut OrderedBindings) -> bool {
        if var.declare {
            return false;
        }
        let is_const = var.kind == VariableDeclarationKind::Const;
        let is_all_literal = is_const
            && var.declarations.iter().all(|d| {
                matches!(d.id.kind, BindingPatternKind::BindingIdentifier(_))
                    && d.init.as_ref().is_some_and(is_static_node)
            });

        for declarator in var.declarations.iter() {
            let init = declarator.init.as_ref().map(unwrap_ts_node);
            let is_const_macro_call = is_const
                && init.is_some_and(|init| {
                    [DEFINE_PROPS, DEFINE_EMITS, WITH_DEFAULTS, DEFINE_SLOTS]
                        .iter()
                        .any(|m| is_call_of(init, m).is_some())
                });

            match &declarator.id.kind {
                BindingPatternKind::BindingIdentifier(id) => {
                    let binding_type =
                        self.identifier_type(init, is_const, is_all_literal, is_const_macro_call);
                    bindings.insert(id.name.as_str(), binding_type);
                }
                _ if self.props_destructure
                    && init.is_some_and(|init| is_call_of(init, DEFINE_PROPS).is_some()) => {}
                _ => walk_pattern(&declarator.id, bindings, is_const, is_const_macro_call),
            }
        }
        is_all_literal
    }

    fn identifier_type(
        &self,
        init: Option<&Expression<'_>>,
        is_const: bool,
        is_all_literal: bool,
        is_const_macro_call: bool,
    ) -> BindingType {
        let static_const = is_const && init.is_some_and(is_static_node);
        if self.literal_const && (is_all_literal || static_const) {
            return BindingType::LiteralConst;
        }
        let Some(init) = init else {
            return if is_const {
                BindingType::SetupMaybeRef
            } else {
                BindingType::SetupLet
            };
        };

        if self.calls_alias(init, "reactive") {
            return if is_const {
                BindingType::SetupReactiveConst
            } else {
                BindingType::SetupLet
            };
        }
        let never_ref =
            is_const && can_never_be_ref(init, self.alias("reactive").unwrap_or_default());
        if is_const_macro_call || never_ref {
            return if is_call_of(init, DEFINE_PROPS).is_some() {
                BindingType::SetupReactiveConst
            } else {
                BindingType::SetupConst
            };
        }
        if !is_const {
            return BindingType::SetupLet;
        }

        let creates_ref = match init {
            Expression::CallExpression(call) => callee_name(call).is_some_and(|name| {
                name == DEFINE_MODEL || REF_CREATORS.iter().any(|r| self.alias(r) == Some(name))
            }),
            _ => false,
        };
        if creates_ref {
            BindingType::SetupRef
        } else {
            BindingType::SetupMaybeRef
        }
    }
}

fn leaf_type(is_const: bool, is_define_call: bool) -> BindingType {
    if is_define_call {
        BindingType::SetupConst
    } else if is_const {
        BindingType::SetupMaybeRef
    } else {
        BindingType::SetupLet
    }
}

fn rest_type(is_const: bool) -> BindingType {
    if is_const {
        BindingType::SetupConst
    } else {
        BindingType::SetupLet
    }
}

fn walk_pattern(
    pattern: &BindingPattern<'_>,
    bindings: &mut OrderedBindings,
    is_const: bool,
    is_define_call: bool,
) {
    match &pattern.kind {
        BindingPatternKind::BindingIdentifier(id) => {
            bindings.insert(id.name.as_str(), leaf_type(is_const, is_define_call));
        }
        BindingPatternKind::ObjectPattern(obj) => {
            walk_object_pattern(obj, bindings, is_const, is_define_call);
        }
        BindingPatternKind::ArrayPattern(arr) => {
            walk_array_pattern(arr, bindings, is_const, is_define_call);
        }
        BindingPatternKind::AssignmentPattern(assign) => match &assign.left.kind {
            BindingPatternKind::BindingIdentifier(id) => {
                bindings.insert(id.name.as_str(), leaf_type(is_const, is_define_call));
            }
            _ => walk_pattern(&assign.left, bindings, is_const, false),
        },
    }
}

fn walk_object_pattern(
    obj: &ObjectPattern<'_>,
    bindings: &mut OrderedBindings,
    is_const: bool,
    is_define_call: bool,
) {
    for prop in obj.properties.iter() {
        walk_pattern(&prop.value, bindings, is_const, is_define_call);
    }
    if let Some(rest) = &obj.rest {
        walk_rest(&rest.argument, bindings, is_const);
    }
}

fn walk_array_pattern(
    arr: &ArrayPattern<'_>,
    bindings: &mut OrderedBindings,
    is_const: bool,
    is_define_call: bool,
) {
    for element in arr.elements.iter().flatten() {
        walk_pattern(element, bindings, is_const, is_define_call);
    }
    if let Some(rest) = &arr.rest {
        walk_rest(&rest.argument, bindings, is_const);
    }
}

fn walk_rest(argument: &BindingPattern<'_>, bindings: &mut OrderedBindings, is_const: bool) {
    match &argument.kind {
        BindingPatternKind::BindingIdentifier(id) => {
            bindings.insert(id.name.as_str(), rest_type(is_const));
        }
        _ => walk_pattern(argument, bindings, is_const, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    fn classify(source: &str, literal_const: bool, aliases: &[(&str, &str)]) -> Vec<(String, BindingType)> {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::ts()).parse();
        assert!(ret.errors.is_empty(), "{:?}", ret.errors);
        let aliases: FxHashMap<String, String> = aliases
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let classifier = DeclarationClassifier {
            aliases: &aliases,
            literal_const,
            props_destructure: true,
        };
        let mut bindings = OrderedBindings::default();
        for stmt in ret.program.body.iter() {
            if let Some(decl) = stmt.as_declaration() {
                classifier.walk(decl, &mut bindings);
            }
        }
        bindings
            .iter()
            .map(|(name, ty)| (name.to_string(), ty))
            .collect()
    }

    fn type_of(bindings: &[(String, BindingType)], name: &str) -> BindingType {
        bindings
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| *t)
            .unwrap_or_else(|| panic!("no binding {name}"))
    }

    #[test]
    fn test_literal_const_requires_flag() {
        let source = "const a = 1\nconst b = `x${2}`\nlet c = 1";
        let hoisted = classify(source, true, &[]);
        assert_eq!(type_of(&hoisted, "a"), BindingType::LiteralConst);
        assert_eq!(type_of(&hoisted, "b"), BindingType::LiteralConst);
        assert_eq!(type_of(&hoisted, "c"), BindingType::SetupLet);

        let plain = classify(source, false, &[]);
        assert_eq!(type_of(&plain, "a"), BindingType::SetupConst);
    }

    #[test]
    fn test_ref_creators_need_runtime_import() {
        let source = "const a = ref(1)\nconst b = useThing()\nconst c = computed(() => 1)";
        let imported = classify(source, false, &[("ref", "ref"), ("computed", "computed")]);
        assert_eq!(type_of(&imported, "a"), BindingType::SetupRef);
        assert_eq!(type_of(&imported, "b"), BindingType::SetupMaybeRef);
        assert_eq!(type_of(&imported, "c"), BindingType::SetupRef);

        let unimported = classify(source, false, &[]);
        assert_eq!(type_of(&unimported, "a"), BindingType::SetupMaybeRef);
    }

    #[test]
    fn test_aliased_reactive() {
        let source = "const state = r({})\nlet other = r({})";
        let bindings = classify(source, false, &[("reactive", "r")]);
        assert_eq!(type_of(&bindings, "state"), BindingType::SetupReactiveConst);
        assert_eq!(type_of(&bindings, "other"), BindingType::SetupLet);
    }

    #[test]
    fn test_macro_calls() {
        let source = "const props = defineProps(['a'])\nconst emit = defineEmits(['x'])\nconst model = defineModel()\nconst slots = defineSlots()";
        let bindings = classify(source, false, &[]);
        assert_eq!(type_of(&bindings, "props"), BindingType::SetupReactiveConst);
        assert_eq!(type_of(&bindings, "emit"), BindingType::SetupConst);
        assert_eq!(type_of(&bindings, "model"), BindingType::SetupRef);
        assert_eq!(type_of(&bindings, "slots"), BindingType::SetupConst);
    }

    #[test]
    fn test_destructured_props_are_skipped() {
        let bindings = classify("const { a, b } = defineProps(['a', 'b'])", false, &[]);
        assert!(bindings.is_empty());
    }

    #[test]
    fn test_patterns() {
        let source = "const { a, b: [c, ...d], ...e } = useThing()\nlet [f = 1] = list\nconst { g } = defineEmits()";
        let bindings = classify(source, false, &[]);
        assert_eq!(type_of(&bindings, "a"), BindingType::SetupMaybeRef);
        assert_eq!(type_of(&bindings, "c"), BindingType::SetupMaybeRef);
        assert_eq!(type_of(&bindings, "d"), BindingType::SetupConst);
        assert_eq!(type_of(&bindings, "e"), BindingType::SetupConst);
        assert_eq!(type_of(&bindings, "f"), BindingType::SetupLet);
        assert_eq!(type_of(&bindings, "g"), BindingType::SetupConst);
    }

    #[test]
    fn test_functions_classes_enums() {
        let source = "function f() {}\nclass C {}\nenum E { A = 1, B }\nenum F { A = foo() }\ndeclare function g(): void";
        let bindings = classify(source, true, &[]);
        assert_eq!(type_of(&bindings, "f"), BindingType::SetupConst);
        assert_eq!(type_of(&bindings, "C"), BindingType::SetupConst);
        assert_eq!(type_of(&bindings, "E"), BindingType::LiteralConst);
        assert_eq!(type_of(&bindings, "F"), BindingType::SetupConst);
        assert!(!bindings.iter().any(|(n, _)| n == "g"));
    }

    #[test]
    fn test_never_ref_initializers() {
        let source = "const a = { x: 1 }\nconst b = () => {}\nconst c = !flag\nconst d = `t${x}`";
        let bindings = classify(source, false, &[]);
        assert_eq!(type_of(&bindings, "a"), BindingType::SetupConst);
        assert_eq!(type_of(&bindings, "b"), BindingType::SetupConst);
        assert_eq!(type_of(&bindings, "c"), BindingType::SetupConst);
        assert_eq!(type_of(&bindings, "d"), BindingType::SetupConst);
    }
}
