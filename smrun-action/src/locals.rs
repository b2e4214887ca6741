//! Local declaration tables and use-before-assign analysis.

use crate::error::ActionError;
use crate::expr::{AssignOp, Expr, ExprKind};
use smrun_vars::{Value, VarType};
use std::collections::{HashMap, HashSet};

/// A `type id;` declaration at the top of an entry or exit block.
#[derive(Debug, Clone, PartialEq)]
pub struct Decl {
    pub ty: VarType,
    pub name: String,
    pub line: u32,
}

/// An entry or exit block: local declarations followed by statements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub decls: Vec<Decl>,
    pub stmts: Vec<Expr>,
}

impl Block {
    pub fn is_empty(&self) -> bool {
        self.decls.is_empty() && self.stmts.is_empty()
    }
}

/// Runtime storage for a block's locals. A fresh frame is created each
/// time a block executes; slots start at the declared type's default.
#[derive(Debug, Default)]
pub struct Frame {
    slots: HashMap<String, Value>,
}

impl Frame {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_decls(decls: &[Decl]) -> Self {
        let slots = decls
            .iter()
            .map(|d| (d.name.clone(), d.ty.default_value()))
            .collect();
        Self { slots }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.slots.get(name).cloned()
    }

    /// Stores a value, converting it to the local's declared type, and
    /// returns what was stored.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<Value, ActionError> {
        let slot = self
            .slots
            .get_mut(name)
            .ok_or_else(|| ActionError::UnknownLocal {
                name: name.to_string(),
                line: 0,
            })?;
        let converted = value.convert_to(slot.ty())?;
        *slot = converted.clone();
        Ok(converted)
    }
}

/// A declared local read before anything was assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct UnassignedUse {
    pub name: String,
    pub line: u32,
}

/// Flags declared locals that are read before their first assignment.
/// The check is linear over the statement list: an assignment anywhere
/// earlier in the walk satisfies later reads.
pub fn check_use_before_assign(block: &Block) -> Vec<UnassignedUse> {
    let declared: HashSet<&str> = block.decls.iter().map(|d| d.name.as_str()).collect();
    let mut assigned: HashSet<String> = HashSet::new();
    let mut out = Vec::new();

    for stmt in &block.stmts {
        walk(stmt, &declared, &mut assigned, &mut out);
    }
    out
}

fn walk(
    expr: &Expr,
    declared: &HashSet<&str>,
    assigned: &mut HashSet<String>,
    out: &mut Vec<UnassignedUse>,
) {
    match &expr.kind {
        ExprKind::Local(name) => {
            if declared.contains(name.as_str()) && !assigned.contains(name) {
                out.push(UnassignedUse {
                    name: name.clone(),
                    line: expr.line,
                });
            }
        }
        ExprKind::Assign { op, target, value } => {
            walk(value, declared, assigned, out);
            // A compound assignment reads the target before writing it.
            if *op != AssignOp::Assign {
                walk(target, declared, assigned, out);
            }
            if let ExprKind::Local(name) = &target.kind {
                assigned.insert(name.clone());
            }
        }
        ExprKind::PreIncDec { target, .. } | ExprKind::PostIncDec { target, .. } => {
            walk(target, declared, assigned, out);
            if let ExprKind::Local(name) = &target.kind {
                assigned.insert(name.clone());
            }
        }
        _ => {
            for child in expr.children() {
                walk(child, declared, assigned, out);
            }
        }
    }
}
