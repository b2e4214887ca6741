//! Expression evaluation.
//!
//! Numeric operators follow C promotion: `short` promotes to `int`, and any
//! `float` operand promotes the operation to floating point. Comparison and
//! logical operators yield `int` 0 or 1. Assignments convert the value to
//! the target's declared type and evaluate to what was stored.

use crate::error::ActionError;
use crate::expr::{AssignOp, BinaryOp, Expr, ExprKind, IncDec};
use crate::locals::{Block, Frame};
use crate::timer::TimerControl;
use smrun_vars::{Value, VarRegistry, VarType};
use std::process::Command;

/// Everything an expression can touch while evaluating: the variable
/// registry, the timer service, and the active-timer register.
pub struct EvalContext<'a> {
    pub vars: &'a dyn VarRegistry,
    pub timers: &'a dyn TimerControl,
    pub active_timer: u32,
}

/// Runs an entry/exit block: a fresh frame is built from the block's
/// declarations and the statements evaluate in order. The first failing
/// statement aborts the block.
pub fn run_block(cx: &EvalContext<'_>, block: &Block) -> Result<(), ActionError> {
    let mut frame = Frame::from_decls(&block.decls);
    for stmt in &block.stmts {
        evaluate(cx, &mut frame, stmt)?;
    }
    Ok(())
}

/// Evaluates an expression tree to a typed value.
pub fn evaluate(
    cx: &EvalContext<'_>,
    frame: &mut Frame,
    expr: &Expr,
) -> Result<Value, ActionError> {
    let line = expr.line;
    match &expr.kind {
        ExprKind::Literal(v) => Ok(v.clone()),

        ExprKind::Local(name) => frame.get(name).ok_or_else(|| ActionError::UnknownLocal {
            name: name.clone(),
            line,
        }),

        ExprKind::SysVar { name, handle } => {
            if !handle.is_valid() {
                return Err(ActionError::UnresolvedVariable {
                    name: name.clone(),
                    line,
                });
            }
            Ok(cx.vars.get(*handle)?)
        }

        ExprKind::Timer(id) => Ok(Value::Int(*id as i32)),

        ExprKind::ActiveTimer => Ok(Value::Int(cx.active_timer as i32)),

        ExprKind::Not(inner) => {
            let v = evaluate(cx, frame, inner)?;
            Ok(flag(!v.is_truthy()))
        }

        ExprKind::PreIncDec { op, target } => {
            let current = evaluate(cx, frame, target)?;
            let updated = step(*op, current, line)?;
            write_place(cx, frame, target, updated)
        }

        ExprKind::PostIncDec { op, target } => {
            let current = evaluate(cx, frame, target)?;
            let updated = step(*op, current.clone(), line)?;
            write_place(cx, frame, target, updated)?;
            Ok(current)
        }

        ExprKind::Binary { op, left, right } => match op {
            BinaryOp::And => {
                let l = evaluate(cx, frame, left)?;
                if !l.is_truthy() {
                    return Ok(flag(false));
                }
                let r = evaluate(cx, frame, right)?;
                Ok(flag(r.is_truthy()))
            }
            BinaryOp::Or => {
                let l = evaluate(cx, frame, left)?;
                if l.is_truthy() {
                    return Ok(flag(true));
                }
                let r = evaluate(cx, frame, right)?;
                Ok(flag(r.is_truthy()))
            }
            _ => {
                let l = evaluate(cx, frame, left)?;
                let r = evaluate(cx, frame, right)?;
                apply_binary(*op, l, r, line)
            }
        },

        ExprKind::Assign { op, target, value } => {
            let rhs = evaluate(cx, frame, value)?;
            let stored = match op.binary_op() {
                None => rhs,
                Some(binop) => {
                    let current = evaluate(cx, frame, target)?;
                    apply_binary(binop, current, rhs, line)?
                }
            };
            write_place(cx, frame, target, stored)
        }

        ExprKind::Cast { to, expr: inner } => {
            let v = evaluate(cx, frame, inner)?;
            cast(v, *to, line)
        }

        ExprKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            let c = evaluate(cx, frame, cond)?;
            let branch = if c.is_truthy() {
                then_branch
            } else {
                else_branch
            };
            let mut last = Value::Int(0);
            for stmt in branch {
                last = evaluate(cx, frame, stmt)?;
            }
            Ok(last)
        }

        ExprKind::CreateTimer { id, interval } => {
            let ms = millis(&evaluate(cx, frame, interval)?, line)?;
            if let Err(e) = cx.timers.create_oneshot(*id, ms) {
                tracing::warn!(line, "create timer failed: {e}");
            }
            Ok(Value::Int(0))
        }

        ExprKind::CreateTick { id, interval } => {
            let ms = millis(&evaluate(cx, frame, interval)?, line)?;
            if let Err(e) = cx.timers.create_tick(*id, ms) {
                tracing::warn!(line, "create tick failed: {e}");
            }
            Ok(Value::Int(0))
        }

        ExprKind::DeleteTimer { id } => {
            if let Err(e) = cx.timers.delete(*id) {
                tracing::warn!(line, "delete timer failed: {e}");
            }
            Ok(Value::Int(0))
        }

        ExprKind::Shell(script) => Ok(run_shell(script, line)),
    }
}

/// Stores a value into a local or registry variable and returns what the
/// target now holds.
fn write_place(
    cx: &EvalContext<'_>,
    frame: &mut Frame,
    target: &Expr,
    value: Value,
) -> Result<Value, ActionError> {
    match &target.kind {
        ExprKind::Local(name) => frame.assign(name, value).map_err(|e| match e {
            ActionError::UnknownLocal { name, .. } => ActionError::UnknownLocal {
                name,
                line: target.line,
            },
            other => other,
        }),
        ExprKind::SysVar { name, handle } => {
            if !handle.is_valid() {
                return Err(ActionError::UnresolvedVariable {
                    name: name.clone(),
                    line: target.line,
                });
            }
            cx.vars.set(*handle, value)?;
            Ok(cx.vars.get(*handle)?)
        }
        _ => Err(ActionError::NotAssignable { line: target.line }),
    }
}

fn flag(b: bool) -> Value {
    Value::Int(if b { 1 } else { 0 })
}

fn step(op: IncDec, value: Value, line: u32) -> Result<Value, ActionError> {
    let delta = match op {
        IncDec::Inc => Value::Int(1),
        IncDec::Dec => Value::Int(-1),
    };
    apply_binary(BinaryOp::Add, value, delta, line)
}

fn is_float(v: &Value) -> bool {
    v.ty() == VarType::Float
}

fn apply_binary(op: BinaryOp, l: Value, r: Value, line: u32) -> Result<Value, ActionError> {
    use BinaryOp::*;

    let mismatch = || ActionError::TypeMismatch {
        op: op.symbol(),
        line,
    };

    match op {
        And => Ok(flag(l.is_truthy() && r.is_truthy())),
        Or => Ok(flag(l.is_truthy() || r.is_truthy())),

        Eq | Ne => {
            let equal = match (&l, &r) {
                (Value::Str(a), Value::Str(b)) => a == b,
                _ => match numeric_pair(&l, &r).ok_or_else(mismatch)? {
                    NumPair::Ints(a, b) => a == b,
                    NumPair::Floats(a, b) => a == b,
                },
            };
            Ok(flag(if op == Eq { equal } else { !equal }))
        }

        Lt | Gt | Le | Ge => {
            let holds = match numeric_pair(&l, &r).ok_or_else(mismatch)? {
                NumPair::Floats(a, b) => match op {
                    Lt => a < b,
                    Gt => a > b,
                    Le => a <= b,
                    _ => a >= b,
                },
                NumPair::Ints(a, b) => match op {
                    Lt => a < b,
                    Gt => a > b,
                    Le => a <= b,
                    _ => a >= b,
                },
            };
            Ok(flag(holds))
        }

        Add | Sub | Mul | Div => {
            match numeric_pair(&l, &r).ok_or_else(mismatch)? {
                NumPair::Floats(a, b) => Ok(Value::Float(match op {
                    Add => a + b,
                    Sub => a - b,
                    Mul => a * b,
                    _ => a / b,
                })),
                NumPair::Ints(a, b) => {
                    if op == Div && b == 0 {
                        return Err(ActionError::DivisionByZero { line });
                    }
                    Ok(Value::Int(match op {
                        Add => a.wrapping_add(b),
                        Sub => a.wrapping_sub(b),
                        Mul => a.wrapping_mul(b),
                        _ => a.wrapping_div(b),
                    }))
                }
            }
        }

        BitAnd | BitOr | BitXor | Shl | Shr => {
            if is_float(&l) || is_float(&r) {
                return Err(mismatch());
            }
            let a = l.as_i32().ok_or_else(mismatch)?;
            let b = r.as_i32().ok_or_else(mismatch)?;
            Ok(Value::Int(match op {
                BitAnd => a & b,
                BitOr => a | b,
                BitXor => a ^ b,
                Shl => a.wrapping_shl(b as u32),
                _ => a.wrapping_shr(b as u32),
            }))
        }
    }
}

enum Num {
    Int(i32),
    Float(f32),
}

impl Num {
    fn of(v: &Value) -> Option<Num> {
        match v {
            Value::Short(n) => Some(Num::Int(i32::from(*n))),
            Value::Int(n) => Some(Num::Int(*n)),
            Value::Float(x) => Some(Num::Float(*x)),
            Value::Str(_) => None,
        }
    }

    fn as_float(self) -> f32 {
        match self {
            Num::Int(n) => n as f32,
            Num::Float(x) => x,
        }
    }
}

/// A numeric operand pair after promotion.
enum NumPair {
    Ints(i32, i32),
    Floats(f32, f32),
}

/// Promotes a numeric operand pair: any float operand makes the operation
/// floating point, otherwise both sides widen to `int`. `None` when a
/// string is involved.
fn numeric_pair(l: &Value, r: &Value) -> Option<NumPair> {
    Some(match (Num::of(l)?, Num::of(r)?) {
        (Num::Int(a), Num::Int(b)) => NumPair::Ints(a, b),
        (a, b) => NumPair::Floats(a.as_float(), b.as_float()),
    })
}

fn cast(v: Value, to: VarType, line: u32) -> Result<Value, ActionError> {
    // Casts are more permissive than assignment conversion: a string
    // operand parses as the target numeric type.
    if let Value::Str(s) = &v {
        let text = s.trim();
        let bad = || ActionError::BadCast {
            value: s.clone(),
            to,
            line,
        };
        return match to {
            VarType::Str => Ok(v.clone()),
            VarType::Int => text.parse::<i32>().map(Value::Int).map_err(|_| bad()),
            VarType::Short => text.parse::<i16>().map(Value::Short).map_err(|_| bad()),
            VarType::Float => text.parse::<f32>().map(Value::Float).map_err(|_| bad()),
        };
    }
    v.convert_to(to).map_err(ActionError::Var)
}

fn millis(v: &Value, line: u32) -> Result<u64, ActionError> {
    match v.as_i32() {
        Some(n) if n >= 0 => Ok(n as u64),
        Some(_) => Ok(0),
        None => Err(ActionError::TypeMismatch {
            op: "timer interval",
            line,
        }),
    }
}

/// Runs a shell block through `sh -c`, inheriting stdout/stderr. Failure
/// to run the shell is non-fatal; the expression yields the exit code.
fn run_shell(script: &str, line: u32) -> Value {
    match Command::new("sh").arg("-c").arg(script).status() {
        Ok(status) => Value::Int(status.code().unwrap_or(-1)),
        Err(e) => {
            tracing::warn!(line, "shell execution failed: {e}");
            Value::Int(-1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locals::Decl;
    use crate::timer::TimerError;
    use smrun_vars::{MemoryVars, VarHandle};
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubTimers {
        calls: Mutex<Vec<(&'static str, u32, u64)>>,
        reject: bool,
    }

    impl TimerControl for StubTimers {
        fn create_oneshot(&self, id: u32, interval_ms: u64) -> Result<(), TimerError> {
            if self.reject {
                return Err(TimerError::NotFound { id });
            }
            self.calls.lock().unwrap().push(("oneshot", id, interval_ms));
            Ok(())
        }

        fn create_tick(&self, id: u32, interval_ms: u64) -> Result<(), TimerError> {
            if self.reject {
                return Err(TimerError::NotFound { id });
            }
            self.calls.lock().unwrap().push(("tick", id, interval_ms));
            Ok(())
        }

        fn delete(&self, id: u32) -> Result<(), TimerError> {
            if self.reject {
                return Err(TimerError::NotFound { id });
            }
            self.calls.lock().unwrap().push(("delete", id, 0));
            Ok(())
        }
    }

    fn lit(v: Value) -> Expr {
        Expr::new(ExprKind::Literal(v), 1)
    }

    fn binary(op: BinaryOp, l: Expr, r: Expr) -> Expr {
        Expr::new(
            ExprKind::Binary {
                op,
                left: Box::new(l),
                right: Box::new(r),
            },
            1,
        )
    }

    fn eval_with(
        vars: &MemoryVars,
        timers: &StubTimers,
        frame: &mut Frame,
        expr: &Expr,
    ) -> Result<Value, ActionError> {
        let cx = EvalContext {
            vars,
            timers,
            active_timer: 0,
        };
        evaluate(&cx, frame, expr)
    }

    fn eval(expr: &Expr) -> Result<Value, ActionError> {
        let vars = MemoryVars::open();
        let timers = StubTimers::default();
        let mut frame = Frame::empty();
        eval_with(&vars, &timers, &mut frame, expr)
    }

    #[test]
    fn test_integer_arithmetic() {
        let e = binary(BinaryOp::Add, lit(Value::Int(2)), lit(Value::Int(3)));
        assert_eq!(eval(&e).unwrap(), Value::Int(5));

        let e = binary(BinaryOp::Mul, lit(Value::Short(4)), lit(Value::Short(5)));
        assert_eq!(eval(&e).unwrap(), Value::Int(20));
    }

    #[test]
    fn test_float_promotion() {
        let e = binary(BinaryOp::Add, lit(Value::Int(1)), lit(Value::Float(0.5)));
        assert_eq!(eval(&e).unwrap(), Value::Float(1.5));
    }

    #[test]
    fn test_integer_division_by_zero() {
        let e = binary(BinaryOp::Div, lit(Value::Int(1)), lit(Value::Int(0)));
        assert!(matches!(
            eval(&e),
            Err(ActionError::DivisionByZero { line: 1 })
        ));
    }

    #[test]
    fn test_float_division_by_zero_is_infinite() {
        let e = binary(BinaryOp::Div, lit(Value::Float(1.0)), lit(Value::Float(0.0)));
        match eval(&e).unwrap() {
            Value::Float(x) => assert!(x.is_infinite()),
            other => panic!("expected float, got {other:?}"),
        }
    }

    #[test]
    fn test_comparisons() {
        let e = binary(BinaryOp::Lt, lit(Value::Int(1)), lit(Value::Int(2)));
        assert_eq!(eval(&e).unwrap(), Value::Int(1));

        let e = binary(BinaryOp::Ge, lit(Value::Float(1.5)), lit(Value::Int(2)));
        assert_eq!(eval(&e).unwrap(), Value::Int(0));
    }

    #[test]
    fn test_string_equality() {
        let e = binary(
            BinaryOp::Eq,
            lit(Value::Str("on".into())),
            lit(Value::Str("on".into())),
        );
        assert_eq!(eval(&e).unwrap(), Value::Int(1));

        let e = binary(
            BinaryOp::Eq,
            lit(Value::Str("1".into())),
            lit(Value::Int(1)),
        );
        assert!(matches!(eval(&e), Err(ActionError::TypeMismatch { .. })));
    }

    #[test]
    fn test_bitwise_and_shifts() {
        let e = binary(BinaryOp::BitAnd, lit(Value::Int(0x0f)), lit(Value::Int(0x3c)));
        assert_eq!(eval(&e).unwrap(), Value::Int(0x0c));

        let e = binary(BinaryOp::Shl, lit(Value::Int(1)), lit(Value::Int(4)));
        assert_eq!(eval(&e).unwrap(), Value::Int(16));

        let e = binary(BinaryOp::Shr, lit(Value::Int(-8)), lit(Value::Int(1)));
        assert_eq!(eval(&e).unwrap(), Value::Int(-4));

        let e = binary(BinaryOp::BitOr, lit(Value::Float(1.0)), lit(Value::Int(1)));
        assert!(matches!(eval(&e), Err(ActionError::TypeMismatch { .. })));
    }

    #[test]
    fn test_logical_short_circuit() {
        // The right side assigns a local; it must not run when the left
        // side already decides the result.
        let decls = [Decl {
            ty: VarType::Int,
            name: "x".into(),
            line: 1,
        }];
        let mut frame = Frame::from_decls(&decls);
        let vars = MemoryVars::open();
        let timers = StubTimers::default();

        let side_effect = Expr::new(
            ExprKind::Assign {
                op: AssignOp::Assign,
                target: Box::new(Expr::new(ExprKind::Local("x".into()), 1)),
                value: Box::new(lit(Value::Int(5))),
            },
            1,
        );
        let e = binary(BinaryOp::Or, lit(Value::Int(1)), side_effect);

        let result = eval_with(&vars, &timers, &mut frame, &e).unwrap();
        assert_eq!(result, Value::Int(1));
        assert_eq!(frame.get("x"), Some(Value::Int(0)));
    }

    #[test]
    fn test_assignment_to_registry_variable() {
        let vars = MemoryVars::open();
        let h = vars.define("/sys/test/a", Value::Short(0));
        let timers = StubTimers::default();
        let mut frame = Frame::empty();

        let e = Expr::new(
            ExprKind::Assign {
                op: AssignOp::Assign,
                target: Box::new(Expr::new(
                    ExprKind::SysVar {
                        name: "/sys/test/a".into(),
                        handle: h,
                    },
                    1,
                )),
                value: Box::new(lit(Value::Int(1))),
            },
            1,
        );

        let stored = eval_with(&vars, &timers, &mut frame, &e).unwrap();
        assert_eq!(stored, Value::Short(1));
        assert_eq!(vars.get(h).unwrap(), Value::Short(1));
    }

    #[test]
    fn test_compound_assignment() {
        let decls = [Decl {
            ty: VarType::Int,
            name: "x".into(),
            line: 1,
        }];
        let mut frame = Frame::from_decls(&decls);
        frame.assign("x", Value::Int(6)).unwrap();
        let vars = MemoryVars::open();
        let timers = StubTimers::default();

        let e = Expr::new(
            ExprKind::Assign {
                op: AssignOp::MulAssign,
                target: Box::new(Expr::new(ExprKind::Local("x".into()), 1)),
                value: Box::new(lit(Value::Int(7))),
            },
            1,
        );

        assert_eq!(
            eval_with(&vars, &timers, &mut frame, &e).unwrap(),
            Value::Int(42)
        );
        assert_eq!(frame.get("x"), Some(Value::Int(42)));
    }

    #[test]
    fn test_increment_prefix_and_postfix() {
        let decls = [Decl {
            ty: VarType::Int,
            name: "x".into(),
            line: 1,
        }];
        let mut frame = Frame::from_decls(&decls);
        let vars = MemoryVars::open();
        let timers = StubTimers::default();

        let pre = Expr::new(
            ExprKind::PreIncDec {
                op: IncDec::Inc,
                target: Box::new(Expr::new(ExprKind::Local("x".into()), 1)),
            },
            1,
        );
        assert_eq!(
            eval_with(&vars, &timers, &mut frame, &pre).unwrap(),
            Value::Int(1)
        );

        let post = Expr::new(
            ExprKind::PostIncDec {
                op: IncDec::Dec,
                target: Box::new(Expr::new(ExprKind::Local("x".into()), 1)),
            },
            1,
        );
        assert_eq!(
            eval_with(&vars, &timers, &mut frame, &post).unwrap(),
            Value::Int(1)
        );
        assert_eq!(frame.get("x"), Some(Value::Int(0)));
    }

    #[test]
    fn test_casts() {
        let e = Expr::new(
            ExprKind::Cast {
                to: VarType::Int,
                expr: Box::new(lit(Value::Float(3.9))),
            },
            1,
        );
        assert_eq!(eval(&e).unwrap(), Value::Int(3));

        let e = Expr::new(
            ExprKind::Cast {
                to: VarType::Float,
                expr: Box::new(lit(Value::Str("2.5".into()))),
            },
            1,
        );
        assert_eq!(eval(&e).unwrap(), Value::Float(2.5));

        let e = Expr::new(
            ExprKind::Cast {
                to: VarType::Int,
                expr: Box::new(lit(Value::Str("not a number".into()))),
            },
            1,
        );
        assert!(matches!(eval(&e), Err(ActionError::BadCast { .. })));
    }

    #[test]
    fn test_if_else_branches() {
        let decls = [Decl {
            ty: VarType::Int,
            name: "x".into(),
            line: 1,
        }];
        let mut frame = Frame::from_decls(&decls);
        let vars = MemoryVars::open();
        let timers = StubTimers::default();

        let set = |n: i32| {
            Expr::new(
                ExprKind::Assign {
                    op: AssignOp::Assign,
                    target: Box::new(Expr::new(ExprKind::Local("x".into()), 1)),
                    value: Box::new(lit(Value::Int(n))),
                },
                1,
            )
        };

        let e = Expr::new(
            ExprKind::If {
                cond: Box::new(lit(Value::Int(0))),
                then_branch: vec![set(1)],
                else_branch: vec![set(2)],
            },
            1,
        );

        eval_with(&vars, &timers, &mut frame, &e).unwrap();
        assert_eq!(frame.get("x"), Some(Value::Int(2)));
    }

    #[test]
    fn test_active_timer_equality() {
        let vars = MemoryVars::open();
        let timers = StubTimers::default();
        let mut frame = Frame::empty();
        let cx = EvalContext {
            vars: &*vars,
            timers: &timers,
            active_timer: 3,
        };

        let e = binary(
            BinaryOp::Eq,
            Expr::new(ExprKind::Timer(3), 1),
            Expr::new(ExprKind::ActiveTimer, 1),
        );
        assert_eq!(evaluate(&cx, &mut frame, &e).unwrap(), Value::Int(1));

        let e = binary(
            BinaryOp::Eq,
            Expr::new(ExprKind::Timer(4), 1),
            Expr::new(ExprKind::ActiveTimer, 1),
        );
        assert_eq!(evaluate(&cx, &mut frame, &e).unwrap(), Value::Int(0));
    }

    #[test]
    fn test_timer_creation_calls_service() {
        let vars = MemoryVars::open();
        let timers = StubTimers::default();
        let mut frame = Frame::empty();

        let e = Expr::new(
            ExprKind::CreateTick {
                id: 2,
                interval: Box::new(lit(Value::Int(500))),
            },
            1,
        );
        eval_with(&vars, &timers, &mut frame, &e).unwrap();

        assert_eq!(*timers.calls.lock().unwrap(), vec![("tick", 2, 500)]);
    }

    #[test]
    fn test_timer_failure_is_not_fatal() {
        let vars = MemoryVars::open();
        let timers = StubTimers {
            reject: true,
            ..Default::default()
        };
        let mut frame = Frame::empty();

        let e = Expr::new(
            ExprKind::CreateTimer {
                id: 400,
                interval: Box::new(lit(Value::Int(10))),
            },
            1,
        );
        // The statement reports not-found but the block keeps going.
        assert_eq!(eval_with(&vars, &timers, &mut frame, &e).unwrap(), Value::Int(0));
    }

    #[test]
    fn test_unresolved_variable() {
        let e = Expr::new(
            ExprKind::SysVar {
                name: "/missing".into(),
                handle: VarHandle::INVALID,
            },
            7,
        );
        assert!(matches!(
            eval(&e),
            Err(ActionError::UnresolvedVariable { line: 7, .. })
        ));
    }

    #[test]
    fn test_shell_exit_code() {
        let e = Expr::new(ExprKind::Shell("exit 3".into()), 1);
        assert_eq!(eval(&e).unwrap(), Value::Int(3));

        let e = Expr::new(ExprKind::Shell("true".into()), 1);
        assert_eq!(eval(&e).unwrap(), Value::Int(0));
    }

    #[test]
    fn test_run_block_executes_in_order() {
        let vars = MemoryVars::open();
        let h = vars.define("/out", Value::Int(0));
        let timers = StubTimers::default();
        let cx = EvalContext {
            vars: &*vars,
            timers: &timers,
            active_timer: 0,
        };

        let sysvar = || {
            Expr::new(
                ExprKind::SysVar {
                    name: "/out".into(),
                    handle: h,
                },
                1,
            )
        };
        // /out = /out * 10 + 1; /out = /out * 10 + 2;
        let append = |digit: i32| {
            Expr::new(
                ExprKind::Assign {
                    op: AssignOp::Assign,
                    target: Box::new(sysvar()),
                    value: Box::new(binary(
                        BinaryOp::Add,
                        binary(BinaryOp::Mul, sysvar(), lit(Value::Int(10))),
                        lit(Value::Int(digit)),
                    )),
                },
                1,
            )
        };

        let block = Block {
            decls: Vec::new(),
            stmts: vec![append(1), append(2)],
        };
        run_block(&cx, &block).unwrap();
        assert_eq!(vars.get(h).unwrap(), Value::Int(12));
    }
}
