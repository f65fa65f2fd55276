//! Scope-aware AST walking.
//!
//! A manual recursive walker over statements, expressions and patterns that
//! tracks locally declared names so that identifier references can be told
//! apart from shadowing declarations. Visitors receive only references that
//! are not shadowed by a local declaration.

use oxc_ast::ast::{
    Argument, ArrayExpressionElement, AssignmentTarget, AssignmentTargetMaybeDefault,
    AssignmentTargetProperty, AwaitExpression, BindingPattern, BindingPatternKind, CallExpression,
    Class, ClassElement, Declaration, ExportDefaultDeclarationKind, Expression, ForStatementInit,
    ForStatementLeft, FormalParameters, Function, IdentifierReference, JSXAttributeItem,
    JSXAttributeValue, JSXChild, JSXElement, MemberExpression, ObjectPropertyKind,
    SimpleAssignmentTarget, Statement, VariableDeclaration,
};
use vize_carton::FxHashSet;

use super::utils::{is_call_of, unwrap_ts_node};

/// How an identifier reference is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// Plain read.
    Read,
    /// Value of a shorthand object property (`{ foo }`).
    Shorthand,
    /// Assignment or update target.
    Write,
}

/// Stack of locally declared names.
#[derive(Debug, Default)]
pub struct Scopes<'a> {
    stack: Vec<FxHashSet<&'a str>>,
}

impl<'a> Scopes<'a> {
    /// Whether `name` is declared by any enclosing local scope.
    pub fn is_local(&self, name: &str) -> bool {
        self.stack.iter().any(|scope| scope.contains(name))
    }

    fn push(&mut self, names: FxHashSet<&'a str>) {
        self.stack.push(names);
    }

    fn pop(&mut self) {
        self.stack.pop();
    }
}

/// Callbacks invoked by [`ScopeWalker`].
pub trait ReferenceVisitor<'a> {
    /// A non-shadowed identifier reference.
    fn visit_reference(&mut self, _id: &'a IdentifierReference<'a>, _kind: ReferenceKind) {}

    /// Every call expression, before its callee and arguments are walked.
    fn visit_call(&mut self, _call: &'a CallExpression<'a>, _scopes: &Scopes<'a>) {}

    /// An `await` outside of any nested function.
    fn visit_await(
        &mut self,
        _expr: &'a AwaitExpression<'a>,
        _is_statement: bool,
        _needs_semi: bool,
    ) {
    }

    /// A `for await` loop outside of any nested function.
    fn visit_for_await(&mut self) {}
}

/// Recursive walker dispatching to a [`ReferenceVisitor`].
pub struct ScopeWalker<'a, 'v, V: ReferenceVisitor<'a>> {
    visitor: &'v mut V,
    scopes: Scopes<'a>,
    function_depth: usize,
    /// Leave `const { .. } = defineProps()` declarators of the root scope alone.
    skip_props_declarations: bool,
}

impl<'a, 'v, V: ReferenceVisitor<'a>> ScopeWalker<'a, 'v, V> {
    pub fn new(visitor: &'v mut V) -> Self {
        Self {
            visitor,
            scopes: Scopes::default(),
            function_depth: 0,
            skip_props_declarations: false,
        }
    }

    pub fn skip_props_declarations(mut self, skip: bool) -> Self {
        self.skip_props_declarations = skip;
        self
    }

    /// Walk the top-level statements of a program.
    pub fn walk_program(&mut self, body: &'a [Statement<'a>]) {
        let names = self.block_declarations(body, true);
        self.scopes.push(names);
        for (index, stmt) in body.iter().enumerate() {
            self.walk_statement_at(stmt, true, index);
        }
        self.scopes.pop();
    }

    /// Walk a single expression with no enclosing local scope.
    pub fn walk_root_expression(&mut self, expr: &'a Expression<'a>) {
        self.walk_expression(expr);
    }

    fn is_root_props_declarator(&self, init: Option<&'a Expression<'a>>, is_root: bool) -> bool {
        self.skip_props_declarations
            && is_root
            && init.is_some_and(|init| is_call_of(unwrap_ts_node(init), "defineProps").is_some())
    }

    fn block_declarations(&self, body: &'a [Statement<'a>], is_root: bool) -> FxHashSet<&'a str> {
        let mut names = FxHashSet::default();
        for stmt in body {
            match stmt {
                Statement::VariableDeclaration(decl) => {
                    self.variable_declaration_names(decl, is_root, &mut names);
                }
                Statement::FunctionDeclaration(func) if !func.declare => {
                    if let Some(id) = &func.id {
                        names.insert(id.name.as_str());
                    }
                }
                Statement::ClassDeclaration(class) if !class.declare => {
                    if let Some(id) = &class.id {
                        names.insert(id.name.as_str());
                    }
                }
                Statement::ExportNamedDeclaration(export) => {
                    if let Some(Declaration::VariableDeclaration(decl)) = &export.declaration {
                        self.variable_declaration_names(decl, is_root, &mut names);
                    }
                }
                Statement::LabeledStatement(labeled) => {
                    if let Statement::VariableDeclaration(decl) = &labeled.body {
                        self.variable_declaration_names(decl, is_root, &mut names);
                    }
                }
                _ => {}
            }
        }
        names
    }

    fn variable_declaration_names(
        &self,
        decl: &'a VariableDeclaration<'a>,
        is_root: bool,
        names: &mut FxHashSet<&'a str>,
    ) {
        if decl.declare {
            return;
        }
        for declarator in decl.declarations.iter() {
            if self.is_root_props_declarator(declarator.init.as_ref(), is_root) {
                continue;
            }
            collect_binding_names(&declarator.id, names);
        }
    }

    fn walk_block(&mut self, body: &'a [Statement<'a>]) {
        let names = self.block_declarations(body, false);
        self.scopes.push(names);
        for (index, stmt) in body.iter().enumerate() {
            self.walk_statement_at(stmt, false, index);
        }
        self.scopes.pop();
    }

    fn walk_statement_at(&mut self, stmt: &'a Statement<'a>, is_root: bool, index: usize) {
        match stmt {
            Statement::ExpressionStatement(expr_stmt) => {
                if let Expression::AwaitExpression(await_expr) = &expr_stmt.expression {
                    if self.function_depth == 0 {
                        let needs_semi = is_root || index > 0;
                        self.visitor.visit_await(await_expr, true, needs_semi);
                    }
                    self.walk_expression(&await_expr.argument);
                } else {
                    self.walk_expression(&expr_stmt.expression);
                }
            }
            Statement::VariableDeclaration(decl) => self.walk_variable_declaration(decl, is_root),
            _ => self.walk_statement(stmt),
        }
    }

    fn walk_statement(&mut self, stmt: &'a Statement<'a>) {
        match stmt {
            Statement::BlockStatement(block) => self.walk_block(&block.body),
            Statement::ExpressionStatement(_) => self.walk_statement_at(stmt, false, 1),
            Statement::VariableDeclaration(decl) => self.walk_variable_declaration(decl, false),
            Statement::FunctionDeclaration(func) => self.walk_function(func),
            Statement::ClassDeclaration(class) => self.walk_class(class),
            Statement::IfStatement(if_stmt) => {
                self.walk_expression(&if_stmt.test);
                self.walk_statement(&if_stmt.consequent);
                if let Some(alt) = &if_stmt.alternate {
                    self.walk_statement(alt);
                }
            }
            Statement::ForStatement(for_stmt) => {
                let mut names = FxHashSet::default();
                if let Some(ForStatementInit::VariableDeclaration(decl)) = &for_stmt.init {
                    self.variable_declaration_names(decl, false, &mut names);
                }
                self.scopes.push(names);
                if let Some(init) = &for_stmt.init {
                    match init {
                        ForStatementInit::VariableDeclaration(decl) => {
                            self.walk_variable_declaration(decl, false);
                        }
                        _ => {
                            if let Some(expr) = init.as_expression() {
                                self.walk_expression(expr);
                            }
                        }
                    }
                }
                if let Some(test) = &for_stmt.test {
                    self.walk_expression(test);
                }
                if let Some(update) = &for_stmt.update {
                    self.walk_expression(update);
                }
                self.walk_statement(&for_stmt.body);
                self.scopes.pop();
            }
            Statement::ForInStatement(for_in) => {
                self.walk_expression(&for_in.right);
                self.walk_for_left(&for_in.left, &for_in.body);
            }
            Statement::ForOfStatement(for_of) => {
                if for_of.r#await && self.function_depth == 0 {
                    self.visitor.visit_for_await();
                }
                self.walk_expression(&for_of.right);
                self.walk_for_left(&for_of.left, &for_of.body);
            }
            Statement::WhileStatement(while_stmt) => {
                self.walk_expression(&while_stmt.test);
                self.walk_statement(&while_stmt.body);
            }
            Statement::DoWhileStatement(do_while) => {
                self.walk_statement(&do_while.body);
                self.walk_expression(&do_while.test);
            }
            Statement::ReturnStatement(ret) => {
                if let Some(arg) = &ret.argument {
                    self.walk_expression(arg);
                }
            }
            Statement::ThrowStatement(throw) => self.walk_expression(&throw.argument),
            Statement::TryStatement(try_stmt) => {
                self.walk_block(&try_stmt.block.body);
                if let Some(handler) = &try_stmt.handler {
                    let mut names = FxHashSet::default();
                    if let Some(param) = &handler.param {
                        collect_binding_names(&param.pattern, &mut names);
                    }
                    self.scopes.push(names);
                    self.walk_block(&handler.body.body);
                    self.scopes.pop();
                }
                if let Some(finalizer) = &try_stmt.finalizer {
                    self.walk_block(&finalizer.body);
                }
            }
            Statement::SwitchStatement(switch) => {
                self.walk_expression(&switch.discriminant);
                let mut names = FxHashSet::default();
                for case in switch.cases.iter() {
                    names.extend(self.block_declarations(&case.consequent, false));
                }
                self.scopes.push(names);
                for case in switch.cases.iter() {
                    if let Some(test) = &case.test {
                        self.walk_expression(test);
                    }
                    for (index, stmt) in case.consequent.iter().enumerate() {
                        self.walk_statement_at(stmt, false, index);
                    }
                }
                self.scopes.pop();
            }
            Statement::LabeledStatement(labeled) => self.walk_statement(&labeled.body),
            Statement::WithStatement(with) => {
                self.walk_expression(&with.object);
                self.walk_statement(&with.body);
            }
            Statement::ExportNamedDeclaration(export) => match &export.declaration {
                Some(Declaration::VariableDeclaration(decl)) => {
                    self.walk_variable_declaration(decl, false);
                }
                Some(Declaration::FunctionDeclaration(func)) => self.walk_function(func),
                Some(Declaration::ClassDeclaration(class)) => self.walk_class(class),
                _ => {}
            },
            Statement::ExportDefaultDeclaration(export) => match &export.declaration {
                ExportDefaultDeclarationKind::FunctionDeclaration(func) => self.walk_function(func),
                ExportDefaultDeclarationKind::ClassDeclaration(class) => self.walk_class(class),
                kind => {
                    if let Some(expr) = kind.as_expression() {
                        self.walk_expression(expr);
                    }
                }
            },
            _ => {}
        }
    }

    fn walk_for_left(&mut self, left: &'a ForStatementLeft<'a>, body: &'a Statement<'a>) {
        let mut names = FxHashSet::default();
        match left {
            ForStatementLeft::VariableDeclaration(decl) => {
                self.variable_declaration_names(decl, false, &mut names);
                self.scopes.push(names);
                self.walk_variable_declaration(decl, false);
            }
            _ => {
                self.scopes.push(names);
                if let Some(target) = left.as_assignment_target() {
                    self.walk_assignment_target(target);
                }
            }
        }
        self.walk_statement(body);
        self.scopes.pop();
    }

    fn walk_variable_declaration(&mut self, decl: &'a VariableDeclaration<'a>, is_root: bool) {
        if decl.declare {
            return;
        }
        for declarator in decl.declarations.iter() {
            if self.is_root_props_declarator(declarator.init.as_ref(), is_root) {
                continue;
            }
            self.walk_binding_pattern(&declarator.id);
            if let Some(init) = &declarator.init {
                self.walk_expression(init);
            }
        }
    }

    /// Visit default values and computed keys inside a binding pattern.
    fn walk_binding_pattern(&mut self, pattern: &'a BindingPattern<'a>) {
        match &pattern.kind {
            BindingPatternKind::BindingIdentifier(_) => {}
            BindingPatternKind::ObjectPattern(obj) => {
                for prop in obj.properties.iter() {
                    if prop.computed {
                        if let Some(key) = prop.key.as_expression() {
                            self.walk_expression(key);
                        }
                    }
                    self.walk_binding_pattern(&prop.value);
                }
                if let Some(rest) = &obj.rest {
                    self.walk_binding_pattern(&rest.argument);
                }
            }
            BindingPatternKind::ArrayPattern(arr) => {
                for elem in arr.elements.iter().flatten() {
                    self.walk_binding_pattern(elem);
                }
                if let Some(rest) = &arr.rest {
                    self.walk_binding_pattern(&rest.argument);
                }
            }
            BindingPatternKind::AssignmentPattern(assign) => {
                self.walk_binding_pattern(&assign.left);
                self.walk_expression(&assign.right);
            }
        }
    }

    fn walk_params(&mut self, params: &'a FormalParameters<'a>) -> FxHashSet<&'a str> {
        let mut names = FxHashSet::default();
        for param in params.items.iter() {
            collect_binding_names(&param.pattern, &mut names);
        }
        if let Some(rest) = &params.rest {
            collect_binding_names(&rest.argument, &mut names);
        }
        names
    }

    fn walk_function_body(
        &mut self,
        mut names: FxHashSet<&'a str>,
        params: &'a FormalParameters<'a>,
        body: &'a [Statement<'a>],
    ) {
        names.extend(self.walk_params(params));
        names.extend(self.block_declarations(body, false));
        self.function_depth += 1;
        self.scopes.push(names);
        for param in params.items.iter() {
            self.walk_binding_pattern(&param.pattern);
        }
        for (index, stmt) in body.iter().enumerate() {
            self.walk_statement_at(stmt, false, index);
        }
        self.scopes.pop();
        self.function_depth -= 1;
    }

    fn walk_function(&mut self, func: &'a Function<'a>) {
        let mut names = FxHashSet::default();
        if let Some(id) = &func.id {
            names.insert(id.name.as_str());
        }
        match &func.body {
            Some(body) => self.walk_function_body(names, &func.params, &body.statements),
            None => self.walk_function_body(names, &func.params, &[]),
        }
    }

    fn walk_class(&mut self, class: &'a Class<'a>) {
        if let Some(super_class) = &class.super_class {
            self.walk_expression(super_class);
        }
        self.function_depth += 1;
        for element in class.body.body.iter() {
            match element {
                ClassElement::MethodDefinition(method) => {
                    if method.computed {
                        if let Some(key) = method.key.as_expression() {
                            self.walk_expression(key);
                        }
                    }
                    self.walk_function(&method.value);
                }
                ClassElement::PropertyDefinition(prop) => {
                    if prop.computed {
                        if let Some(key) = prop.key.as_expression() {
                            self.walk_expression(key);
                        }
                    }
                    if let Some(value) = &prop.value {
                        self.walk_expression(value);
                    }
                }
                ClassElement::StaticBlock(block) => self.walk_block(&block.body),
                _ => {}
            }
        }
        self.function_depth -= 1;
    }

    fn report(&mut self, id: &'a IdentifierReference<'a>, kind: ReferenceKind) {
        if !self.scopes.is_local(id.name.as_str()) {
            self.visitor.visit_reference(id, kind);
        }
    }

    fn walk_member(&mut self, member: &'a MemberExpression<'a>) {
        match member {
            MemberExpression::ComputedMemberExpression(computed) => {
                self.walk_expression(&computed.object);
                self.walk_expression(&computed.expression);
            }
            MemberExpression::StaticMemberExpression(stat) => self.walk_expression(&stat.object),
            MemberExpression::PrivateFieldExpression(private) => {
                self.walk_expression(&private.object);
            }
        }
    }

    fn walk_call(&mut self, call: &'a CallExpression<'a>) {
        self.visitor.visit_call(call, &self.scopes);
        self.walk_expression(&call.callee);
        self.walk_arguments(&call.arguments);
    }

    fn walk_arguments(&mut self, arguments: &'a [Argument<'a>]) {
        for arg in arguments {
            match arg {
                Argument::SpreadElement(spread) => self.walk_expression(&spread.argument),
                _ => {
                    if let Some(expr) = arg.as_expression() {
                        self.walk_expression(expr);
                    }
                }
            }
        }
    }

    pub fn walk_expression(&mut self, expr: &'a Expression<'a>) {
        match expr {
            Expression::Identifier(id) => self.report(id, ReferenceKind::Read),
            Expression::TemplateLiteral(template) => {
                for e in template.expressions.iter() {
                    self.walk_expression(e);
                }
            }
            Expression::ArrayExpression(arr) => {
                for elem in arr.elements.iter() {
                    match elem {
                        ArrayExpressionElement::SpreadElement(spread) => {
                            self.walk_expression(&spread.argument);
                        }
                        ArrayExpressionElement::Elision(_) => {}
                        _ => {
                            if let Some(e) = elem.as_expression() {
                                self.walk_expression(e);
                            }
                        }
                    }
                }
            }
            Expression::ObjectExpression(obj) => {
                for prop in obj.properties.iter() {
                    match prop {
                        ObjectPropertyKind::ObjectProperty(p) => {
                            if p.computed {
                                if let Some(key) = p.key.as_expression() {
                                    self.walk_expression(key);
                                }
                            }
                            match &p.value {
                                Expression::Identifier(id) if p.shorthand => {
                                    self.report(id, ReferenceKind::Shorthand);
                                }
                                value => self.walk_expression(value),
                            }
                        }
                        ObjectPropertyKind::SpreadProperty(spread) => {
                            self.walk_expression(&spread.argument);
                        }
                    }
                }
            }
            Expression::ArrowFunctionExpression(arrow) => {
                self.walk_function_body(FxHashSet::default(), &arrow.params, &arrow.body.statements);
            }
            Expression::FunctionExpression(func) => self.walk_function(func),
            Expression::ClassExpression(class) => self.walk_class(class),
            Expression::CallExpression(call) => self.walk_call(call),
            Expression::NewExpression(new_expr) => {
                self.walk_expression(&new_expr.callee);
                self.walk_arguments(&new_expr.arguments);
            }
            Expression::ChainExpression(chain) => {
                if let oxc_ast::ast::ChainElement::CallExpression(call) = &chain.expression {
                    self.walk_call(call);
                } else if let Some(member) = chain.expression.as_member_expression() {
                    self.walk_member(member);
                }
            }
            Expression::AssignmentExpression(assign) => {
                self.walk_assignment_target(&assign.left);
                self.walk_expression(&assign.right);
            }
            Expression::UpdateExpression(update) => {
                self.walk_simple_assignment_target(&update.argument);
            }
            Expression::UnaryExpression(unary) => self.walk_expression(&unary.argument),
            Expression::BinaryExpression(bin) => {
                self.walk_expression(&bin.left);
                self.walk_expression(&bin.right);
            }
            Expression::LogicalExpression(logical) => {
                self.walk_expression(&logical.left);
                self.walk_expression(&logical.right);
            }
            Expression::ConditionalExpression(cond) => {
                self.walk_expression(&cond.test);
                self.walk_expression(&cond.consequent);
                self.walk_expression(&cond.alternate);
            }
            Expression::SequenceExpression(seq) => {
                for e in seq.expressions.iter() {
                    self.walk_expression(e);
                }
            }
            Expression::ParenthesizedExpression(paren) => self.walk_expression(&paren.expression),
            Expression::AwaitExpression(await_expr) => {
                if self.function_depth == 0 {
                    self.visitor.visit_await(await_expr, false, false);
                }
                self.walk_expression(&await_expr.argument);
            }
            Expression::YieldExpression(yield_expr) => {
                if let Some(arg) = &yield_expr.argument {
                    self.walk_expression(arg);
                }
            }
            Expression::TaggedTemplateExpression(tagged) => {
                self.walk_expression(&tagged.tag);
                for e in tagged.quasi.expressions.iter() {
                    self.walk_expression(e);
                }
            }
            Expression::ImportExpression(import) => {
                self.walk_expression(&import.source);
                for e in import.arguments.iter() {
                    self.walk_expression(e);
                }
            }
            Expression::PrivateInExpression(private_in) => self.walk_expression(&private_in.right),
            Expression::TSAsExpression(e) => self.walk_expression(&e.expression),
            Expression::TSSatisfiesExpression(e) => self.walk_expression(&e.expression),
            Expression::TSNonNullExpression(e) => self.walk_expression(&e.expression),
            Expression::TSTypeAssertion(e) => self.walk_expression(&e.expression),
            Expression::TSInstantiationExpression(e) => self.walk_expression(&e.expression),
            Expression::JSXElement(element) => self.walk_jsx_element(element),
            Expression::JSXFragment(fragment) => self.walk_jsx_children(&fragment.children),
            _ => {
                if let Some(member) = expr.as_member_expression() {
                    self.walk_member(member);
                }
            }
        }
    }

    // Tag names are not references; only embedded expressions are walked.
    fn walk_jsx_element(&mut self, element: &'a JSXElement<'a>) {
        for attr in element.opening_element.attributes.iter() {
            match attr {
                JSXAttributeItem::Attribute(attr) => match &attr.value {
                    Some(JSXAttributeValue::ExpressionContainer(container)) => {
                        if let Some(expr) = container.expression.as_expression() {
                            self.walk_expression(expr);
                        }
                    }
                    Some(JSXAttributeValue::Element(inner)) => self.walk_jsx_element(inner),
                    Some(JSXAttributeValue::Fragment(inner)) => {
                        self.walk_jsx_children(&inner.children);
                    }
                    Some(JSXAttributeValue::StringLiteral(_)) | None => {}
                },
                JSXAttributeItem::SpreadAttribute(spread) => self.walk_expression(&spread.argument),
            }
        }
        self.walk_jsx_children(&element.children);
    }

    fn walk_jsx_children(&mut self, children: &'a [JSXChild<'a>]) {
        for child in children {
            match child {
                JSXChild::Element(element) => self.walk_jsx_element(element),
                JSXChild::Fragment(fragment) => self.walk_jsx_children(&fragment.children),
                JSXChild::ExpressionContainer(container) => {
                    if let Some(expr) = container.expression.as_expression() {
                        self.walk_expression(expr);
                    }
                }
                JSXChild::Spread(spread) => self.walk_expression(&spread.expression),
                JSXChild::Text(_) => {}
            }
        }
    }

    fn walk_simple_assignment_target(&mut self, target: &'a SimpleAssignmentTarget<'a>) {
        match target {
            SimpleAssignmentTarget::AssignmentTargetIdentifier(id) => {
                self.report(id, ReferenceKind::Write);
            }
            SimpleAssignmentTarget::TSAsExpression(e) => self.walk_expression(&e.expression),
            SimpleAssignmentTarget::TSSatisfiesExpression(e) => self.walk_expression(&e.expression),
            SimpleAssignmentTarget::TSNonNullExpression(e) => self.walk_expression(&e.expression),
            SimpleAssignmentTarget::TSTypeAssertion(e) => self.walk_expression(&e.expression),
            _ => {
                if let Some(member) = target.as_member_expression() {
                    self.walk_member(member);
                }
            }
        }
    }

    fn walk_assignment_target(&mut self, target: &'a AssignmentTarget<'a>) {
        match target {
            AssignmentTarget::ObjectAssignmentTarget(obj) => {
                for prop in obj.properties.iter() {
                    match prop {
                        AssignmentTargetProperty::AssignmentTargetPropertyIdentifier(p) => {
                            self.report(&p.binding, ReferenceKind::Write);
                            if let Some(init) = &p.init {
                                self.walk_expression(init);
                            }
                        }
                        AssignmentTargetProperty::AssignmentTargetPropertyProperty(p) => {
                            if let Some(key) = p.name.as_expression() {
                                self.walk_expression(key);
                            }
                            self.walk_maybe_default(&p.binding);
                        }
                    }
                }
                if let Some(rest) = &obj.rest {
                    self.walk_assignment_target(&rest.target);
                }
            }
            AssignmentTarget::ArrayAssignmentTarget(arr) => {
                for elem in arr.elements.iter().flatten() {
                    self.walk_maybe_default(elem);
                }
                if let Some(rest) = &arr.rest {
                    self.walk_assignment_target(&rest.target);
                }
            }
            _ => {
                if let Some(simple) = target.as_simple_assignment_target() {
                    self.walk_simple_assignment_target(simple);
                }
            }
        }
    }

    fn walk_maybe_default(&mut self, target: &'a AssignmentTargetMaybeDefault<'a>) {
        match target {
            AssignmentTargetMaybeDefault::AssignmentTargetWithDefault(with_default) => {
                self.walk_assignment_target(&with_default.binding);
                self.walk_expression(&with_default.init);
            }
            _ => {
                if let Some(inner) = target.as_assignment_target() {
                    self.walk_assignment_target(inner);
                }
            }
        }
    }
}

/// Collect every identifier bound by a pattern.
pub fn collect_binding_names<'a>(pattern: &'a BindingPattern<'a>, names: &mut FxHashSet<&'a str>) {
    match &pattern.kind {
        BindingPatternKind::BindingIdentifier(id) => {
            names.insert(id.name.as_str());
        }
        BindingPatternKind::ObjectPattern(obj) => {
            for prop in obj.properties.iter() {
                collect_binding_names(&prop.value, names);
            }
            if let Some(rest) = &obj.rest {
                collect_binding_names(&rest.argument, names);
            }
        }
        BindingPatternKind::ArrayPattern(arr) => {
            for elem in arr.elements.iter().flatten() {
                collect_binding_names(elem, names);
            }
            if let Some(rest) = &arr.rest {
                collect_binding_names(&rest.argument, names);
            }
        }
        BindingPatternKind::AssignmentPattern(assign) => {
            collect_binding_names(&assign.left, names);
        }
    }
}

/// Collects every non-shadowed identifier reference.
#[derive(Debug, Default)]
pub struct ReferenceCollector<'a> {
    pub references: Vec<(&'a IdentifierReference<'a>, ReferenceKind)>,
}

impl<'a> ReferenceVisitor<'a> for ReferenceCollector<'a> {
    fn visit_reference(&mut self, id: &'a IdentifierReference<'a>, kind: ReferenceKind) {
        self.references.push((id, kind));
    }
}

/// Identifier references of an expression that are not declared inside it.
pub fn collect_references<'a>(
    expr: &'a Expression<'a>,
) -> Vec<(&'a IdentifierReference<'a>, ReferenceKind)> {
    let mut collector = ReferenceCollector::default();
    ScopeWalker::new(&mut collector).walk_root_expression(expr);
    collector.references
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    fn names_in(source: &str) -> Vec<(String, ReferenceKind)> {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::ts()).parse();
        assert!(ret.errors.is_empty());
        let program = allocator.alloc(ret.program);
        let mut collector = ReferenceCollector::default();
        ScopeWalker::new(&mut collector).walk_program(&program.body);
        collector
            .references
            .iter()
            .map(|(id, kind)| (id.name.to_string(), *kind))
            .collect()
    }

    #[test]
    fn test_function_params_shadow() {
        let refs = names_in("const f = (foo) => foo + bar");
        assert_eq!(refs, vec![("bar".to_string(), ReferenceKind::Read)]);
    }

    #[test]
    fn test_block_declarations_shadow_before_use() {
        let refs = names_in("{ log(x); const x = 1 }");
        assert_eq!(refs, vec![("log".to_string(), ReferenceKind::Read)]);
    }

    #[test]
    fn test_shorthand_and_writes() {
        let refs = names_in("use({ a }); b = 1; c++; obj.prop = d");
        assert_eq!(
            refs,
            vec![
                ("use".to_string(), ReferenceKind::Read),
                ("a".to_string(), ReferenceKind::Shorthand),
                ("b".to_string(), ReferenceKind::Write),
                ("c".to_string(), ReferenceKind::Write),
                ("obj".to_string(), ReferenceKind::Read),
                ("d".to_string(), ReferenceKind::Read),
            ]
        );
    }

    #[test]
    fn test_member_property_is_not_reference() {
        let refs = names_in("a.b.c; x[y]");
        let names: Vec<_> = refs.into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "x", "y"]);
    }

    #[test]
    fn test_jsx_expression_containers() {
        let allocator = Allocator::default();
        let source = "const el = <Comp title={title} {...attrs}><>{items.map((item) => <li key={item}>{item}</li>)}</></Comp>";
        let ret = Parser::new(&allocator, source, SourceType::tsx()).parse();
        assert!(ret.errors.is_empty());
        let program = allocator.alloc(ret.program);
        let mut collector = ReferenceCollector::default();
        ScopeWalker::new(&mut collector).walk_program(&program.body);
        let names: Vec<_> = collector.references.iter().map(|(id, _)| id.name.as_str()).collect();
        assert_eq!(names, vec!["title", "attrs", "items"]);
    }

    #[test]
    fn test_top_level_await_detection() {
        #[derive(Default)]
        struct Awaits(Vec<(bool, bool)>);
        impl<'a> ReferenceVisitor<'a> for Awaits {
            fn visit_await(&mut self, _e: &'a AwaitExpression<'a>, stmt: bool, semi: bool) {
                self.0.push((stmt, semi));
            }
        }

        let allocator = Allocator::default();
        let source = "await a\nconst x = await b\nasync function f() { await c }\nif (ok) { await d }";
        let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
        let program = allocator.alloc(ret.program);
        let mut awaits = Awaits::default();
        ScopeWalker::new(&mut awaits).walk_program(&program.body);
        assert_eq!(awaits.0, vec![(true, true), (false, false), (true, false)]);
    }
}
