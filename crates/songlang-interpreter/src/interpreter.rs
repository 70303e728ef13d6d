//! The tree-walking interpreter (spec §4.4, §4.5): executes a statement
//! sequence against a [`Graph`], emitting output lines through an
//! injected callback.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use songlang_common::Position;
use songlang_parser::{
    AllTarget, BinaryOp, DebugTarget, Expression, Literal, LosesKind, QueryPattern, QueryRelation,
    Statement, UnaryOp,
};
use tracing::{debug, trace, warn};

use crate::error::{ErrorKind, InterpreterError};
use crate::graph::{Graph, NodeId};
use crate::rng::SongRng;
use crate::value::Value;
use indexmap::IndexSet;

/// Rebuilds a `Relation` action statement with a new subject, used by
/// `ALL` to dispatch its action against each matched node (spec §9:
/// "constructing a fresh relation statement").
fn rebind_relation_subject(stmt: &Statement, new_subject: &str) -> Statement {
    match stmt {
        Statement::Relation {
            relation,
            args,
            position,
            ..
        } => Statement::Relation {
            subject: new_subject.to_string(),
            relation: relation.clone(),
            args: args.clone(),
            position: *position,
        },
        other => other.clone(),
    }
}

fn literal_to_raw_value(literal: &Literal) -> Value {
    match literal {
        Literal::Number(n) => Value::Number(*n),
        Literal::String(s) => Value::String(s.clone()),
        Literal::Identifier(s) => Value::String(s.clone()),
    }
}

fn values_strict_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::NodeRef(x), Value::NodeRef(y)) => x == y,
        (Value::Null, Value::Null) => true,
        _ => false,
    }
}

/// The tolerant equality used for `HAS`-test conditions and query value
/// matching (spec §4.4: "number comparison using |a-b|<1e-4 tolerance").
fn values_equal_with_tolerance(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => (x - y).abs() < 1e-4,
        _ => values_strict_equal(a, b),
    }
}

pub struct Interpreter {
    pub graph: Graph,
    context: Vec<FxHashMap<String, Value>>,
    when_subject: Option<NodeId>,
    rng: SongRng,
    on_output: Box<dyn FnMut(&str)>,
}

impl Interpreter {
    pub fn new(on_output: impl FnMut(&str) + 'static) -> Self {
        Self {
            graph: Graph::new(),
            context: vec![FxHashMap::default()],
            when_subject: None,
            rng: SongRng::from_entropy(),
            on_output: Box::new(on_output),
        }
    }

    /// A deterministic variant for tests (spec §5, §9: "expose a way to
    /// seed it").
    pub fn with_seed(seed: u64, on_output: impl FnMut(&str) + 'static) -> Self {
        let mut interpreter = Self::new(on_output);
        interpreter.rng = SongRng::from_seed(seed);
        interpreter
    }

    pub fn execute(&mut self, statements: &[Statement]) -> Result<(), InterpreterError> {
        debug!(count = statements.len(), "executing statement sequence");
        self.execute_statements(statements)
    }

    /// Formatted multi-line dump of every node (spec §4.4 `DEBUG GRAPH`).
    pub fn dump_graph(&mut self) {
        let count = self.graph.count();
        self.emit(format!("=== Graph ({count} nodes) ==="));
        for id in self.graph.all_node_ids() {
            for line in self.format_node_lines(id) {
                self.emit(line);
            }
        }
    }

    fn emit(&mut self, line: impl Into<String>) {
        (self.on_output)(&line.into());
    }

    // ── Context stack ────────────────────────────────────────────────
    //
    // A stack of frames rather than one flat map (spec §9): bindings
    // introduced by WHEN/EACH/custom-relation calls never leak into an
    // enclosing or sibling frame, even under reentrant invocation.

    fn push_frame(&mut self) {
        self.context.push(FxHashMap::default());
    }

    fn pop_frame(&mut self) {
        self.context.pop();
    }

    fn bind(&mut self, name: &str, value: Value) {
        self.context
            .last_mut()
            .expect("at least one context frame")
            .insert(name.to_string(), value);
    }

    fn lookup_context(&self, name: &str) -> Option<&Value> {
        self.context.iter().rev().find_map(|frame| frame.get(name))
    }

    /// Resolves a statement's bare-name subject: a role bound in the
    /// current context frame (spec §9 "context mapping") wins over a
    /// graph node of the same name, creating one if neither exists.
    fn resolve_subject_id(&mut self, name: &str) -> NodeId {
        let bound = self.lookup_context(name).and_then(|v| match v {
            Value::NodeRef(id) => Some(*id),
            _ => None,
        });
        match bound {
            Some(id) => id,
            None => self.graph.get_or_create_node(name),
        }
    }

    /// Same priority as [`Self::resolve_subject_id`], but never creates a
    /// node -- used where the subject must already exist (`EACH`).
    fn resolve_existing_subject_id(&self, name: &str) -> Option<NodeId> {
        match self.lookup_context(name) {
            Some(Value::NodeRef(id)) => Some(*id),
            _ => self.graph.get_node_id(name),
        }
    }

    fn auto_promote(&self, value: Value) -> Value {
        if let Value::String(s) = &value {
            if let Some(id) = self.graph.get_node_id(s) {
                return Value::NodeRef(id);
            }
        }
        value
    }

    fn stringify_value(&self, value: &Value) -> String {
        match value {
            Value::NodeRef(id) => self.resolve_node_display(*id),
            other => other.display_string(),
        }
    }

    /// `PRINT`'s resolution rule: the `Name` property via inheritance,
    /// falling back to the node's own name (spec §4.4).
    fn resolve_node_display(&self, id: NodeId) -> String {
        match self.graph.get_property(id, "Name") {
            Some(value) => self.stringify_value(value),
            None => self.graph.node(id).name.clone(),
        }
    }

    fn format_node_lines(&self, id: NodeId) -> Vec<String> {
        let node = self.graph.node(id);
        let mut lines = Vec::new();
        let mut header = node.name.clone();
        if !node.parents.is_empty() {
            let parent_names: Vec<String> = node
                .parents
                .iter()
                .map(|&p| self.graph.node(p).name.clone())
                .collect();
            header.push_str(&format!(" IS {}", parent_names.join(", ")));
        }
        lines.push(header);
        for (key, value) in node.properties.iter() {
            match key.as_str() {
                "_Abilities" => {
                    if let Value::StringSet(set) = value {
                        if !set.is_empty() {
                            lines.push(format!(
                                "  CAN {}",
                                set.iter().cloned().collect::<Vec<_>>().join(", ")
                            ));
                        }
                    }
                }
                "_Items" => {
                    if let Value::NodeList(ids) = value {
                        let names: Vec<String> =
                            ids.iter().map(|&i| self.graph.node(i).name.clone()).collect();
                        lines.push(format!("  _Items = [{}]", names.join(", ")));
                    }
                }
                _ if key.starts_with('_') => {}
                _ => lines.push(format!("  {key} = {}", self.stringify_value(value))),
            }
        }
        lines
    }

    // ── Statement execution ──────────────────────────────────────────

    fn execute_statements(&mut self, statements: &[Statement]) -> Result<(), InterpreterError> {
        for statement in statements {
            self.execute_statement(statement)?;
        }
        Ok(())
    }

    fn execute_statement(&mut self, statement: &Statement) -> Result<(), InterpreterError> {
        match statement {
            Statement::Relation {
                subject,
                relation,
                args,
                position,
            } => self.execute_relation(subject, relation, args, *position),
            Statement::HasExpression {
                subject,
                property,
                value_expression,
                ..
            } => self.execute_has_expression(subject, property, value_expression),
            Statement::ExpressionPrint { subject, .. } => self.execute_expression_print(subject),
            Statement::ExpressionHas {
                subject,
                property,
                literal_value,
                value_expression,
                position,
            } => self.execute_expression_has(subject, property, literal_value, value_expression, *position),
            Statement::RoleDefinition { subject, role_name, .. } => {
                self.execute_role_definition(subject, role_name);
                Ok(())
            }
            Statement::DoBlock { subject, body, .. } => {
                self.execute_do_block(subject, body);
                Ok(())
            }
            Statement::Can { subject, ability, .. } => {
                self.execute_can(subject, ability);
                Ok(())
            }
            Statement::Loses { subject, target, kind, .. } => {
                self.execute_loses(subject, target, *kind);
                Ok(())
            }
            Statement::Debug { target, .. } => {
                self.execute_debug(*target);
                Ok(())
            }
            Statement::When { condition, body, .. } => self.execute_when(condition, body),
            Statement::WhenExpression {
                subject,
                condition,
                body,
                else_body,
                else_when,
                ..
            } => self.execute_when_expression(subject, condition, body, else_body, else_when),
            Statement::Chance {
                percent,
                body,
                else_body,
                position,
            } => self.execute_chance(percent, body, else_body, *position),
            Statement::All { target, action, .. } => self.execute_all(target, action),
            Statement::Each {
                collection,
                variable,
                body,
                position,
            } => self.execute_each(collection, variable, body, *position),
            Statement::Query {
                subject,
                relation,
                target,
                target_value,
                where_condition,
                ..
            } => self.execute_query(subject, *relation, target, target_value, where_condition),
        }
    }

    fn execute_relation(
        &mut self,
        subject: &str,
        relation: &str,
        args: &[Literal],
        position: Position,
    ) -> Result<(), InterpreterError> {
        let subject_id = self.resolve_subject_id(subject);
        match relation.to_ascii_uppercase().as_str() {
            "IS" => {
                if let Some(type_literal) = args.first() {
                    let type_id = self.graph.get_or_create_node(&type_literal.lexeme());
                    self.graph.node_mut(subject_id).add_parent(type_id);
                }
                Ok(())
            }
            "HAS" => {
                if let Some(prop_literal) = args.first() {
                    let property = prop_literal.lexeme();
                    let value = match args.get(1) {
                        Some(value_literal) => self.auto_promote(literal_to_raw_value(value_literal)),
                        None => Value::Null,
                    };
                    self.graph.node_mut(subject_id).set_property(property, value);
                }
                Ok(())
            }
            "PRINT" => {
                let line = self.resolve_node_display(subject_id);
                self.emit(line);
                Ok(())
            }
            _ => self.execute_custom_relation(subject_id, relation, args, position),
        }
    }

    fn execute_custom_relation(
        &mut self,
        subject_id: NodeId,
        relation: &str,
        args: &[Literal],
        position: Position,
    ) -> Result<(), InterpreterError> {
        let Some(relation_id) = self.graph.get_node_id(relation) else {
            trace!(relation, "no node for this relation name; recording a stub reference");
            if let Some(first_arg) = args.first() {
                let arg_name = first_arg.lexeme();
                let arg_id = self.graph.get_or_create_node(&arg_name);
                let arg_node_name = self.graph.node(arg_id).name.clone();
                self.graph
                    .node_mut(subject_id)
                    .set_property(format!("_{relation}"), Value::String(arg_node_name));
            }
            return Ok(());
        };

        if !self.graph.is(relation_id, "RELATION") {
            warn!(relation, "attempted to invoke a node that is not tagged RELATION");
            return Err(InterpreterError::new(
                ErrorKind::RuntimeError,
                format!("{relation} is not a relation"),
                position,
            ));
        }

        let body = match self.graph.get_property(relation_id, "_DoBody") {
            Some(Value::StatementList(stmts)) => Rc::clone(stmts),
            _ => return Ok(()),
        };
        let roles = match self.graph.get_property(relation_id, "_Roles") {
            Some(Value::RoleList(roles)) => roles.clone(),
            _ => Vec::new(),
        };

        trace!(relation, roles = roles.len(), "dispatching custom relation");
        self.push_frame();
        for (i, role) in roles.iter().enumerate() {
            let bound = if i == 0 {
                Value::NodeRef(subject_id)
            } else {
                let arg_name = args.get(i - 1).map(Literal::lexeme).unwrap_or_default();
                Value::NodeRef(self.graph.get_or_create_node(&arg_name))
            };
            self.bind(role, bound);
        }
        let result = self.execute_statements(&body);
        self.pop_frame();
        result
    }

    fn execute_has_expression(
        &mut self,
        subject: &str,
        property: &str,
        value_expression: &Expression,
    ) -> Result<(), InterpreterError> {
        let value = self.evaluate(value_expression)?;
        let subject_id = self.resolve_subject_id(subject);
        self.graph.node_mut(subject_id).set_property(property.to_string(), value);
        Ok(())
    }

    fn execute_expression_print(&mut self, subject: &Expression) -> Result<(), InterpreterError> {
        let value = self.evaluate(subject)?;
        let line = match &value {
            Value::NodeRef(id) => self.resolve_node_display(*id),
            other => self.stringify_value(other),
        };
        self.emit(line);
        Ok(())
    }

    fn execute_expression_has(
        &mut self,
        subject: &Expression,
        property: &str,
        literal_value: &Option<Literal>,
        value_expression: &Option<Expression>,
        position: Position,
    ) -> Result<(), InterpreterError> {
        let subject_value = self.evaluate(subject)?;
        let Value::NodeRef(subject_id) = subject_value else {
            return Err(InterpreterError::new(
                ErrorKind::TypeMismatch,
                "HAS requires a node on the left",
                position,
            ));
        };
        let value = if let Some(expr) = value_expression {
            self.evaluate(expr)?
        } else if let Some(literal) = literal_value {
            self.auto_promote(literal_to_raw_value(literal))
        } else {
            Value::Null
        };
        self.graph.node_mut(subject_id).set_property(property.to_string(), value);
        Ok(())
    }

    fn execute_role_definition(&mut self, subject: &str, role_name: &str) {
        let subject_id = self.resolve_subject_id(subject);
        let node = self.graph.node_mut(subject_id);
        match node.properties.get_mut("_Roles") {
            Some(Value::RoleList(roles)) => {
                if !roles.iter().any(|r| r == role_name) {
                    roles.push(role_name.to_string());
                }
            }
            _ => node.set_property("_Roles", Value::RoleList(vec![role_name.to_string()])),
        }
    }

    fn execute_do_block(&mut self, subject: &str, body: &[Statement]) {
        let subject_id = self.resolve_subject_id(subject);
        self.graph
            .node_mut(subject_id)
            .set_property("_DoBody", Value::StatementList(Rc::new(body.to_vec())));
    }

    fn execute_can(&mut self, subject: &str, ability: &str) {
        let subject_id = self.resolve_subject_id(subject);
        let node = self.graph.node_mut(subject_id);
        match node.properties.get_mut("_Abilities") {
            Some(Value::StringSet(set)) => {
                set.insert(ability.to_string());
            }
            _ => {
                let mut set = IndexSet::new();
                set.insert(ability.to_string());
                node.set_property("_Abilities", Value::StringSet(set));
            }
        }
    }

    fn execute_loses(&mut self, subject: &str, target: &str, kind: LosesKind) {
        let subject_id = self.resolve_subject_id(subject);
        match kind {
            LosesKind::Is => {
                if let Some(parent_id) = self.graph.get_node_id(target) {
                    self.graph.node_mut(subject_id).remove_parent(parent_id);
                }
            }
            LosesKind::Auto => {
                let node = self.graph.node_mut(subject_id);
                let removed_ability = match node.properties.get_mut("_Abilities") {
                    Some(Value::StringSet(set)) => set.shift_remove(target),
                    _ => false,
                };
                if !removed_ability {
                    node.remove_property(target);
                }
            }
        }
    }

    fn execute_debug(&mut self, target: DebugTarget) {
        match target {
            DebugTarget::Graph => self.dump_graph(),
            DebugTarget::Tokens => self.emit("DEBUG TOKENS is not implemented"),
            DebugTarget::Ast => self.emit("DEBUG AST is not implemented"),
        }
    }

    /// The legacy form (spec §4.2, §4.4): a trailing `WHEN` promotes any
    /// statement into a predicate, re-evaluated every time its body runs.
    fn execute_when(&mut self, condition: &Statement, body: &[Statement]) -> Result<(), InterpreterError> {
        if self.evaluate_condition_statement(condition)? {
            self.execute_statements(body)
        } else {
            Ok(())
        }
    }

    fn evaluate_condition_statement(&mut self, statement: &Statement) -> Result<bool, InterpreterError> {
        let Statement::Relation { subject, relation, args, .. } = statement else {
            return Ok(false);
        };
        let Some(subject_id) = self.graph.get_node_id(subject) else {
            return Ok(false);
        };
        match relation.to_ascii_uppercase().as_str() {
            "HAS" => {
                let property = match args.first() {
                    Some(literal) => literal.lexeme(),
                    None => return Ok(false),
                };
                let Some(value) = self.graph.get_property(subject_id, &property) else {
                    return Ok(false);
                };
                match args.get(1) {
                    Some(expected_literal) => {
                        let expected = self.auto_promote(literal_to_raw_value(expected_literal));
                        Ok(values_equal_with_tolerance(value, &expected))
                    }
                    None => Ok(true),
                }
            }
            "IS" => {
                let type_name = args.first().map(Literal::lexeme).unwrap_or_default();
                Ok(self.graph.is(subject_id, &type_name))
            }
            "CAN" => {
                let ability = args.first().map(Literal::lexeme).unwrap_or_default();
                Ok(self.graph.can(subject_id, &ability))
            }
            _ => Ok(false),
        }
    }

    fn execute_when_expression(
        &mut self,
        subject: &str,
        condition: &Expression,
        body: &[Statement],
        else_body: &Option<Vec<Statement>>,
        else_when: &Option<Box<Statement>>,
    ) -> Result<(), InterpreterError> {
        let subject_id = self.resolve_existing_subject_id(subject);
        let prior_when_subject = self.when_subject;
        self.push_frame();
        if let Some(id) = subject_id {
            self.bind(subject, Value::NodeRef(id));
        }
        self.when_subject = subject_id;

        let outcome = self.evaluate(condition).and_then(|condition_value| {
            if condition_value.is_truthy() {
                self.execute_statements(body)
            } else if let Some(nested) = else_when {
                self.execute_statement(nested)
            } else if let Some(else_statements) = else_body {
                self.execute_statements(else_statements)
            } else {
                Ok(())
            }
        });

        self.when_subject = prior_when_subject;
        self.pop_frame();
        outcome
    }

    fn execute_chance(
        &mut self,
        percent: &Expression,
        body: &[Statement],
        else_body: &Option<Vec<Statement>>,
        position: Position,
    ) -> Result<(), InterpreterError> {
        let percent_value = self.evaluate(percent)?;
        let p = self.to_number(&percent_value, position)?;
        let draw = self.rng.next_int_inclusive(0, 99);
        trace!(percent = p, draw, "chance check");
        if (draw as f64) < p {
            self.execute_statements(body)
        } else if let Some(else_statements) = else_body {
            self.execute_statements(else_statements)
        } else {
            Ok(())
        }
    }

    fn execute_all(&mut self, target: &AllTarget, action: &Option<Box<Statement>>) -> Result<(), InterpreterError> {
        let matches = match target {
            AllTarget::QueryVariable(name) => {
                let Some(var_id) = self.graph.get_node_id(name) else {
                    self.emit(format!("ALL ?{name}: No query results found (run query first)"));
                    return Ok(());
                };
                match self.graph.get_property(var_id, "_Items") {
                    Some(Value::NodeList(ids)) if !ids.is_empty() => ids.clone(),
                    _ => {
                        self.emit(format!("ALL ?{name}: No query results found (run query first)"));
                        return Ok(());
                    }
                }
            }
            AllTarget::TypeName(type_name) => self
                .graph
                .all_node_ids()
                .into_iter()
                .filter(|&id| self.graph.node(id).name != *type_name && self.graph.is(id, type_name))
                .collect::<Vec<_>>(),
        };

        let Some(action_statement) = action else {
            let label = match target {
                AllTarget::QueryVariable(name) => format!("?{name}"),
                AllTarget::TypeName(name) => name.clone(),
            };
            self.emit(format!("ALL {label}: {} nodes found", matches.len()));
            return Ok(());
        };

        for id in matches {
            let rebind_name = self.graph.node(id).name.clone();
            let rebuilt = rebind_relation_subject(action_statement, &rebind_name);
            self.execute_statement(&rebuilt)?;
        }
        Ok(())
    }

    fn execute_each(
        &mut self,
        collection: &str,
        variable: &str,
        body: &[Statement],
        position: Position,
    ) -> Result<(), InterpreterError> {
        let Some(collection_id) = self.resolve_existing_subject_id(collection) else {
            return Err(InterpreterError::new(
                ErrorKind::NodeNotFound,
                format!("{collection} is not defined"),
                position,
            ));
        };
        let members: Vec<NodeId> = self
            .graph
            .all_node_ids()
            .into_iter()
            .filter(|&id| self.graph.node(id).parents.contains(&collection_id))
            .collect();

        for member_id in members {
            self.push_frame();
            self.bind(variable, Value::NodeRef(member_id));
            let result = self.execute_statements(body);
            self.pop_frame();
            result?;
        }
        Ok(())
    }

    fn execute_query(
        &mut self,
        pattern: &QueryPattern,
        relation: QueryRelation,
        target: &Option<String>,
        target_value: &Option<Literal>,
        where_condition: &Option<Expression>,
    ) -> Result<(), InterpreterError> {
        let candidates: Vec<NodeId> = self
            .graph
            .all_node_ids()
            .into_iter()
            .filter(|&id| self.query_candidate_matches(id, relation, target, target_value))
            .collect();

        let filtered: Vec<NodeId> = if let Some(where_expr) = where_condition {
            candidates
                .into_iter()
                .filter(|&id| self.query_where_matches(pattern, id, where_expr))
                .collect()
        } else {
            candidates
        };

        match pattern {
            QueryPattern::Variable(name) => {
                let var_id = self.graph.get_or_create_node(name);
                let query_result_id = self.graph.get_or_create_node("QueryResult");
                self.graph.node_mut(var_id).add_parent(query_result_id);
                self.graph
                    .node_mut(var_id)
                    .set_property("_Items", Value::NodeList(filtered.clone()));
                self.emit(format!("Query ?{name}: {} nodes found", filtered.len()));
            }
            QueryPattern::Wildcard => {
                self.emit(format!("Query ?: {} nodes found", filtered.len()));
            }
        }
        for &id in &filtered {
            let name = self.graph.node(id).name.clone();
            self.emit(format!("  - {name}"));
        }
        Ok(())
    }

    fn query_candidate_matches(
        &self,
        id: NodeId,
        relation: QueryRelation,
        target: &Option<String>,
        target_value: &Option<Literal>,
    ) -> bool {
        match relation {
            QueryRelation::Is => match target {
                // A type's own node never counts as an instance of itself
                // here, even though `Graph::is` (used elsewhere, e.g. the
                // legacy WHEN form) is reflexive by definition.
                Some(type_name) => self.graph.node(id).name != *type_name && self.graph.is(id, type_name),
                None => true,
            },
            QueryRelation::Has => match target {
                Some(property) => match self.graph.get_property(id, property) {
                    None => false,
                    Some(value) => match target_value {
                        Some(expected_literal) => {
                            let expected = self.auto_promote(literal_to_raw_value(expected_literal));
                            values_equal_with_tolerance(value, &expected)
                        }
                        None => true,
                    },
                },
                None => self
                    .graph
                    .node(id)
                    .properties
                    .keys()
                    .any(|key| !key.starts_with('_')),
            },
            QueryRelation::Can => match target {
                Some(ability) => self.graph.can(id, ability),
                None => match self.graph.node(id).properties.get("_Abilities") {
                    Some(Value::StringSet(set)) => !set.is_empty(),
                    _ => false,
                },
            },
        }
    }

    fn query_where_matches(&mut self, pattern: &QueryPattern, id: NodeId, where_expr: &Expression) -> bool {
        self.push_frame();
        self.bind(pattern.binding_name(), Value::NodeRef(id));
        let outcome = self.evaluate(where_expr);
        self.pop_frame();
        match outcome {
            Ok(value) => value.is_truthy(),
            Err(_) => false,
        }
    }

    // ── Expression evaluation ────────────────────────────────────────

    fn evaluate(&mut self, expression: &Expression) -> Result<Value, InterpreterError> {
        match expression {
            Expression::Number { value, .. } => Ok(Value::Number(*value)),
            Expression::String { value, .. } => Ok(Value::String(value.clone())),
            Expression::Identifier { name, position } => self.resolve_identifier(name, *position),
            Expression::PropertyAccess { object, property, position } => {
                let receiver = self.evaluate(object)?;
                match receiver {
                    Value::NodeRef(id) => match self.graph.get_property(id, property) {
                        Some(value) => Ok(value.clone()),
                        None => Err(InterpreterError::new(
                            ErrorKind::PropertyNotFound,
                            format!("{property} not found"),
                            *position,
                        )),
                    },
                    _ => Err(InterpreterError::new(
                        ErrorKind::TypeMismatch,
                        "property access requires a node",
                        *position,
                    )),
                }
            }
            Expression::Binary { left, op, right, position } => self.evaluate_binary(left, *op, right, *position),
            Expression::Unary { op, operand, position } => self.evaluate_unary(*op, operand, *position),
            Expression::Grouping { inner, .. } => self.evaluate(inner),
            Expression::Random { min, max, position } => self.evaluate_random(min, max, *position),
        }
    }

    fn resolve_identifier(&self, name: &str, position: Position) -> Result<Value, InterpreterError> {
        if let Some(value) = self.lookup_context(name) {
            return Ok(value.clone());
        }
        if let Some(id) = self.graph.get_node_id(name) {
            return Ok(Value::NodeRef(id));
        }
        if let Some(subject_id) = self.when_subject {
            if let Some(value) = self.graph.get_property(subject_id, name) {
                return Ok(value.clone());
            }
        }
        Err(InterpreterError::new(
            ErrorKind::NodeNotFound,
            format!("{name} is not defined"),
            position,
        ))
    }

    fn evaluate_random(&mut self, min: &Expression, max: &Expression, position: Position) -> Result<Value, InterpreterError> {
        let min_value = self.evaluate(min)?;
        let lo = self.to_number(&min_value, position)?.floor() as i64;
        let max_value = self.evaluate(max)?;
        let hi = self.to_number(&max_value, position)?.floor() as i64;
        let draw = self.rng.next_int_inclusive(lo, hi);
        Ok(Value::Number(draw as f64))
    }

    fn evaluate_binary(
        &mut self,
        left: &Expression,
        op: BinaryOp,
        right: &Expression,
        position: Position,
    ) -> Result<Value, InterpreterError> {
        if op == BinaryOp::And {
            let left_value = self.evaluate(left)?;
            if !left_value.is_truthy() {
                return Ok(Value::Boolean(false));
            }
            let right_value = self.evaluate(right)?;
            return Ok(Value::Boolean(right_value.is_truthy()));
        }
        if op == BinaryOp::Or {
            let left_value = self.evaluate(left)?;
            if left_value.is_truthy() {
                return Ok(Value::Boolean(true));
            }
            let right_value = self.evaluate(right)?;
            return Ok(Value::Boolean(right_value.is_truthy()));
        }

        let left_value = self.evaluate(left)?;
        let right_value = self.evaluate(right)?;

        match op {
            BinaryOp::Add => {
                if matches!(left_value, Value::String(_)) || matches!(right_value, Value::String(_)) {
                    let joined = format!(
                        "{}{}",
                        self.stringify_value(&left_value),
                        self.stringify_value(&right_value)
                    );
                    Ok(Value::String(joined))
                } else {
                    let a = self.to_number(&left_value, position)?;
                    let b = self.to_number(&right_value, position)?;
                    Ok(Value::Number(a + b))
                }
            }
            BinaryOp::Sub => {
                let a = self.to_number(&left_value, position)?;
                let b = self.to_number(&right_value, position)?;
                Ok(Value::Number(a - b))
            }
            BinaryOp::Mul => {
                let a = self.to_number(&left_value, position)?;
                let b = self.to_number(&right_value, position)?;
                Ok(Value::Number(a * b))
            }
            BinaryOp::Div => {
                let a = self.to_number(&left_value, position)?;
                let b = self.to_number(&right_value, position)?;
                if b == 0.0 {
                    Err(InterpreterError::new(ErrorKind::DivisionByZero, "division by zero", position))
                } else {
                    Ok(Value::Number(a / b))
                }
            }
            BinaryOp::Mod => {
                let a = self.to_number(&left_value, position)?;
                let b = self.to_number(&right_value, position)?;
                if b == 0.0 {
                    Err(InterpreterError::new(ErrorKind::DivisionByZero, "modulo by zero", position))
                } else {
                    Ok(Value::Number(a % b))
                }
            }
            BinaryOp::Eq => Ok(Value::Boolean(values_strict_equal(&left_value, &right_value))),
            BinaryOp::Neq => Ok(Value::Boolean(!values_strict_equal(&left_value, &right_value))),
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Lte | BinaryOp::Gte => {
                let a = self.to_number(&left_value, position)?;
                let b = self.to_number(&right_value, position)?;
                let result = match op {
                    BinaryOp::Lt => a < b,
                    BinaryOp::Gt => a > b,
                    BinaryOp::Lte => a <= b,
                    BinaryOp::Gte => a >= b,
                    _ => unreachable!(),
                };
                Ok(Value::Boolean(result))
            }
            BinaryOp::And | BinaryOp::Or => unreachable!("handled above via short-circuit"),
        }
    }

    fn evaluate_unary(&mut self, op: UnaryOp, operand: &Expression, position: Position) -> Result<Value, InterpreterError> {
        let value = self.evaluate(operand)?;
        match op {
            UnaryOp::Negate => {
                let n = self.to_number(&value, position)?;
                Ok(Value::Number(-n))
            }
            UnaryOp::Not => Ok(Value::Boolean(!value.is_truthy())),
        }
    }

    /// Numeric coercion (spec §4.5): numbers pass through, booleans
    /// become 0/1, everything else is a `TypeMismatch`.
    fn to_number(&self, value: &Value, position: Position) -> Result<f64, InterpreterError> {
        match value {
            Value::Number(n) => Ok(*n),
            Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            _ => Err(InterpreterError::new(ErrorKind::TypeMismatch, "expected a number", position)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn run_collecting(source: &str) -> Vec<String> {
        let tokens = songlang_lexer::tokenize(source).expect("tokenize");
        let statements = songlang_parser::parse(tokens).expect("parse");
        let output = Rc::new(RefCell::new(Vec::new()));
        let output_handle = Rc::clone(&output);
        let mut interpreter = Interpreter::new(move |line: &str| {
            output_handle.borrow_mut().push(line.to_string());
        });
        interpreter.execute(&statements).expect("execute");
        Rc::try_unwrap(output).unwrap().into_inner()
    }

    #[test]
    fn s1_print_falls_back_to_node_name() {
        assert_eq!(run_collecting("Player HAS HP 100\nPlayer PRINT\n"), vec!["Player"]);
    }

    #[test]
    fn s2_print_prefers_inherited_name() {
        let out = run_collecting("Player IS Entity\nPlayer HAS Name \"Hero\"\nPlayer PRINT\n");
        assert_eq!(out, vec!["Hero"]);
    }

    #[test]
    fn s3_of_desugars_to_property_access() {
        let out = run_collecting(
            "Goblin HAS HP 50\nGoblin HAS HP (HP OF Goblin - 10)\nGoblin.HP PRINT\n",
        );
        assert_eq!(out, vec!["40"]);
    }

    #[test]
    fn s4_when_expression_picks_the_matching_branch() {
        let out = run_collecting(
            "Player HAS HP 0\nPlayer WHEN (HP == 0) DO Player PRINT END\n",
        );
        assert_eq!(out, vec!["Player"]);
    }

    #[test]
    fn s5_query_materializes_matches_in_insertion_order() {
        let out = run_collecting("Orc IS Monster\nGoblin IS Monster\n?m IS Monster\n");
        assert_eq!(out, vec!["Query ?m: 2 nodes found", "  - Orc", "  - Goblin"]);
    }

    #[test]
    fn s6_can_query_matches_through_inheritance() {
        let out = run_collecting("Knight CAN ATTACK\nSquire IS Knight\n?w CAN ATTACK\n");
        assert_eq!(out, vec!["Query ?w: 2 nodes found", "  - Knight", "  - Squire"]);
    }

    #[test]
    fn auto_promotion_stores_node_ref_when_name_exists() {
        let tokens = songlang_lexer::tokenize("Sword HAS Damage 10\nPlayer HAS Weapon Sword\n").unwrap();
        let statements = songlang_parser::parse(tokens).unwrap();
        let mut interpreter = Interpreter::new(|_| {});
        interpreter.execute(&statements).unwrap();
        let player = interpreter.graph.get_node_id("Player").unwrap();
        let weapon = interpreter.graph.get_property(player, "Weapon").cloned();
        let sword = interpreter.graph.get_node_id("Sword").unwrap();
        assert_eq!(weapon, Some(Value::NodeRef(sword)));
    }

    #[test]
    fn auto_promotion_keeps_string_when_no_matching_node() {
        let tokens = songlang_lexer::tokenize("Player HAS Weapon Sword\n").unwrap();
        let statements = songlang_parser::parse(tokens).unwrap();
        let mut interpreter = Interpreter::new(|_| {});
        interpreter.execute(&statements).unwrap();
        let player = interpreter.graph.get_node_id("Player").unwrap();
        let weapon = interpreter.graph.get_property(player, "Weapon").cloned();
        assert_eq!(weapon, Some(Value::String("Sword".to_string())));
    }

    #[test]
    fn loses_is_restores_parents_after_is() {
        let tokens = songlang_lexer::tokenize("Player IS Entity\nPlayer LOSES IS Entity\n").unwrap();
        let statements = songlang_parser::parse(tokens).unwrap();
        let mut interpreter = Interpreter::new(|_| {});
        interpreter.execute(&statements).unwrap();
        let player = interpreter.graph.get_node_id("Player").unwrap();
        assert!(interpreter.graph.node(player).parents.is_empty());
    }

    #[test]
    fn and_short_circuits_the_right_operand() {
        // `Undefined` names no node and no property of Flag; if AND did not
        // short-circuit, evaluating it would raise NodeNotFound.
        let out = run_collecting(
            "Flag HAS HP 0\n\
             Flag WHEN ((HP == 1) AND (Undefined - 1)) DO Flag PRINT END\n\
             Flag PRINT\n",
        );
        assert_eq!(out, vec!["Flag"]);
    }

    #[test]
    fn custom_relation_binds_roles_and_executes_body() {
        let source = "\
Attack IS RELATION\n\
Attack HAS Attacker (Node)\n\
Attack HAS Target (Node)\n\
Attack DO\n\
Target HAS HP (Target.HP - 10)\n\
END\n\
Goblin HAS HP 50\n\
Player Attack Goblin\n\
Goblin.HP PRINT\n";
        let out = run_collecting(source);
        assert_eq!(out, vec!["40"]);
    }

    #[test]
    fn chance_zero_never_fires_and_hundred_always_fires() {
        let tokens = songlang_lexer::tokenize("CHANCE 0 DO Hit HAS Fired true END\n").unwrap();
        let statements = songlang_parser::parse(tokens).unwrap();
        let mut interpreter = Interpreter::with_seed(1, |_| {});
        interpreter.execute(&statements).unwrap();
        assert!(interpreter.graph.get_node_id("Hit").is_none());

        let tokens = songlang_lexer::tokenize("CHANCE 100 DO Hit HAS Fired true END\n").unwrap();
        let statements = songlang_parser::parse(tokens).unwrap();
        let mut interpreter = Interpreter::with_seed(1, |_| {});
        interpreter.execute(&statements).unwrap();
        let hit = interpreter.graph.get_node_id("Hit").unwrap();
        assert_eq!(
            interpreter.graph.get_property(hit, "Fired").cloned(),
            Some(Value::String("true".to_string()))
        );
    }

    #[test]
    fn division_by_zero_is_an_interpreter_error() {
        let tokens = songlang_lexer::tokenize("Player HAS X (1 / 0)\n").unwrap();
        let statements = songlang_parser::parse(tokens).unwrap();
        let mut interpreter = Interpreter::new(|_| {});
        let err = interpreter.execute(&statements).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DivisionByZero);
    }
}
