//! Recursive-descent parser for state machine definitions.
//!
//! The grammar is C expression precedence grafted onto a small block
//! structure. Parsing is best-effort: syntax errors are recorded as
//! line-numbered diagnostics and the parser resynchronizes so later
//! errors still surface. Completing a transition has a side effect: every
//! registry variable referenced by the guard gets a modification
//! subscription, which is what makes the runtime wake up for it.

use crate::definition::{MachineDef, StateDef, TransitionDef};
use crate::diag::Diagnostic;
use crate::lexer::tokenize;
use crate::token::{Tok, Token};
use smrun_action::{
    check_use_before_assign, AssignOp, BinaryOp, Block, Decl, Expr, ExprKind, IncDec,
};
use smrun_vars::{Value, VarHandle, VarRegistry, VarType};

/// Result of parsing a definition. The machine is always returned, even
/// when errors were recorded; the runtime decides whether it is runnable
/// (it refuses to start without an `init` state).
pub struct ParseOutcome {
    pub machine: MachineDef,
    pub diagnostics: Vec<Diagnostic>,
    pub had_errors: bool,
}

/// Parses a definition text against a variable registry.
pub fn parse_definition(src: &str, vars: &dyn VarRegistry) -> ParseOutcome {
    let (toks, diags) = tokenize(src);
    let had_errors = !diags.is_empty();
    let mut parser = Parser {
        toks,
        pos: 0,
        vars,
        diags,
        had_errors,
        locals: Vec::new(),
    };
    let machine = parser.parse_machine();
    ParseOutcome {
        machine,
        diagnostics: parser.diags,
        had_errors: parser.had_errors,
    }
}

struct Parser<'a> {
    toks: Vec<Tok>,
    pos: usize,
    vars: &'a dyn VarRegistry,
    diags: Vec<Diagnostic>,
    had_errors: bool,
    /// Declarations of the block currently being parsed; locals shadow
    /// registry variables during identifier resolution.
    locals: Vec<Decl>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.toks.get(self.pos).map(|t| &t.token)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.toks.get(self.pos + offset).map(|t| &t.token)
    }

    fn peek_line(&self) -> u32 {
        self.toks
            .get(self.pos)
            .map(|t| t.line)
            .or_else(|| self.toks.last().map(|t| t.line))
            .unwrap_or(1)
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.toks.get(self.pos).map(|t| t.token.clone());
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn at(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.at(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> bool {
        if self.eat(token) {
            true
        } else {
            self.syntax_error();
            false
        }
    }

    fn syntax_error(&mut self) {
        self.had_errors = true;
        let line = self.peek_line();
        self.diags.push(Diagnostic::syntax(line));
    }

    // ------------------------------------------------------------------
    // Machine structure
    // ------------------------------------------------------------------

    fn parse_machine(&mut self) -> MachineDef {
        let mut def = MachineDef::default();

        self.expect(&Token::StateMachine);
        self.expect(&Token::LBrace);

        if self.eat(&Token::Name) {
            self.expect(&Token::Colon);
            def.name = self.string_value();
        } else {
            self.syntax_error();
        }

        if self.eat(&Token::Description) {
            self.expect(&Token::Colon);
            def.description = self.string_value();
        } else {
            self.syntax_error();
        }

        loop {
            match self.peek() {
                Some(Token::State) => {
                    let state = self.parse_state();
                    def.states.push(state);
                }
                Some(Token::RBrace) => {
                    self.bump();
                    break;
                }
                Some(_) => {
                    self.syntax_error();
                    self.bump();
                }
                None => {
                    self.syntax_error();
                    break;
                }
            }
        }

        def
    }

    fn parse_state(&mut self) -> StateDef {
        let line = self.peek_line();
        self.bump(); // 'state'
        let id = self.ident_value();
        self.expect(&Token::LBrace);

        // An omitted entry block is legal; the runtime warns and treats
        // it as empty when the state is entered.
        let entry = if self.eat(&Token::Entry) {
            Some(self.parse_block())
        } else {
            None
        };

        let mut transitions = Vec::new();
        if self.eat(&Token::Transition) {
            self.expect(&Token::LBrace);
            loop {
                match self.peek() {
                    Some(Token::Ident(_)) => {
                        let transition = self.parse_transition();
                        transitions.push(transition);
                    }
                    Some(Token::RBrace) => {
                        self.bump();
                        break;
                    }
                    Some(_) => {
                        self.syntax_error();
                        self.bump();
                    }
                    None => {
                        self.syntax_error();
                        break;
                    }
                }
            }
        } else {
            self.syntax_error();
        }

        // Same as entry: absence is not a parse error.
        let exit = if self.eat(&Token::Exit) {
            Some(self.parse_block())
        } else {
            None
        };

        self.expect(&Token::RBrace);

        StateDef {
            id,
            line,
            entry,
            transitions,
            exit,
        }
    }

    fn parse_transition(&mut self) -> TransitionDef {
        let line = self.peek_line();
        let target = self.ident_value();
        self.expect(&Token::Colon);
        let guard = self.parse_guard();
        // Side effect: the runtime only sees events it subscribed to, so
        // every registry variable in the guard registers interest now.
        self.subscribe_guard(&guard);
        TransitionDef {
            target,
            guard,
            line,
        }
    }

    /// A guard is either a whole `timer N` clause, rewritten to
    /// `TIMER(N) == ACTIVE_TIMER` so evaluation stays uniform, or an
    /// ordinary expression.
    fn parse_guard(&mut self) -> Expr {
        if self.at(&Token::Timer) {
            let line = self.peek_line();
            self.bump();
            let id = self.timer_id();
            let timer = Expr::new(ExprKind::Timer(id), line);
            let active = Expr::new(ExprKind::ActiveTimer, line);
            return Expr::new(
                ExprKind::Binary {
                    op: BinaryOp::Eq,
                    left: Box::new(timer),
                    right: Box::new(active),
                },
                line,
            );
        }
        self.parse_expr()
    }

    fn subscribe_guard(&mut self, expr: &Expr) {
        if let ExprKind::SysVar { name, handle } = &expr.kind {
            if handle.is_valid() {
                if let Err(e) = self.vars.subscribe(*handle) {
                    tracing::error!(name = %name, line = expr.line, "subscription failed: {e}");
                    self.diags.push(Diagnostic::new(
                        expr.line,
                        format!(
                            "failed to subscribe to '{}' at line {}: {}",
                            name, expr.line, e
                        ),
                    ));
                }
            }
        }
        for child in expr.children() {
            self.subscribe_guard(child);
        }
    }

    // ------------------------------------------------------------------
    // Blocks and statements
    // ------------------------------------------------------------------

    fn parse_block(&mut self) -> Block {
        self.expect(&Token::LBrace);

        let mut decls = Vec::new();
        while self.peek().is_some_and(Token::is_type_keyword) {
            let line = self.peek_line();
            let ty = match self.bump() {
                Some(Token::TypeFloat) => VarType::Float,
                Some(Token::TypeInt) => VarType::Int,
                Some(Token::TypeShort) => VarType::Short,
                _ => VarType::Str,
            };
            let name = self.ident_value();
            self.expect(&Token::Semi);
            decls.push(Decl { ty, name, line });
        }
        self.locals = decls.clone();

        let mut stmts = Vec::new();
        loop {
            match self.peek() {
                Some(Token::RBrace) => {
                    self.bump();
                    break;
                }
                None => {
                    self.syntax_error();
                    break;
                }
                Some(_) => {
                    let before = self.pos;
                    stmts.push(self.parse_stmt());
                    if self.pos == before {
                        self.bump();
                    }
                }
            }
        }
        self.locals.clear();

        let block = Block { decls, stmts };
        for used in check_use_before_assign(&block) {
            self.diags.push(Diagnostic::new(
                used.line,
                format!(
                    "variable '{}' may be used before assignment at line {}",
                    used.name, used.line
                ),
            ));
        }
        block
    }

    fn parse_stmt(&mut self) -> Expr {
        match self.peek() {
            Some(Token::If) => self.parse_if(),
            Some(Token::Shell(_)) => {
                let line = self.peek_line();
                let script = match self.bump() {
                    Some(Token::Shell(s)) => s,
                    _ => String::new(),
                };
                self.eat(&Token::Semi);
                Expr::new(ExprKind::Shell(script), line)
            }
            _ => {
                let expr = self.parse_expr();
                self.expect(&Token::Semi);
                expr
            }
        }
    }

    fn parse_if(&mut self) -> Expr {
        let line = self.peek_line();
        self.bump(); // 'if'
        self.expect(&Token::LParen);
        let cond = self.parse_expr();
        self.expect(&Token::RParen);
        let then_branch = self.parse_branch();
        // 'else' pairs with the nearest 'if'.
        let else_branch = if self.eat(&Token::Else) {
            self.parse_branch()
        } else {
            Vec::new()
        };
        Expr::new(
            ExprKind::If {
                cond: Box::new(cond),
                then_branch,
                else_branch,
            },
            line,
        )
    }

    fn parse_branch(&mut self) -> Vec<Expr> {
        if self.eat(&Token::LBrace) {
            let mut stmts = Vec::new();
            loop {
                match self.peek() {
                    Some(Token::RBrace) => {
                        self.bump();
                        break;
                    }
                    None => {
                        self.syntax_error();
                        break;
                    }
                    Some(_) => {
                        let before = self.pos;
                        stmts.push(self.parse_stmt());
                        if self.pos == before {
                            self.bump();
                        }
                    }
                }
            }
            stmts
        } else {
            vec![self.parse_stmt()]
        }
    }

    // ------------------------------------------------------------------
    // Expressions, lowest to highest precedence
    // ------------------------------------------------------------------

    fn parse_expr(&mut self) -> Expr {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Expr {
        let left = self.parse_binary(0);

        let op = match self.peek() {
            Some(Token::Assign) => Some(AssignOp::Assign),
            Some(Token::PlusAssign) => Some(AssignOp::AddAssign),
            Some(Token::MinusAssign) => Some(AssignOp::SubAssign),
            Some(Token::StarAssign) => Some(AssignOp::MulAssign),
            Some(Token::SlashAssign) => Some(AssignOp::DivAssign),
            Some(Token::AmpAssign) => Some(AssignOp::AndAssign),
            Some(Token::PipeAssign) => Some(AssignOp::OrAssign),
            Some(Token::CaretAssign) => Some(AssignOp::XorAssign),
            _ => None,
        };

        let Some(op) = op else { return left };

        let line = self.peek_line();
        self.bump();
        if !matches!(left.kind, ExprKind::Local(_) | ExprKind::SysVar { .. }) {
            self.had_errors = true;
            self.diags.push(Diagnostic::new(
                line,
                format!("invalid assignment target at line {}", line),
            ));
        }
        // Right-associative.
        let value = self.parse_assignment();
        Expr::new(
            ExprKind::Assign {
                op,
                target: Box::new(left),
                value: Box::new(value),
            },
            line,
        )
    }

    fn parse_binary(&mut self, level: usize) -> Expr {
        const LEVELS: &[&[(Token, BinaryOp)]] = &[
            &[(Token::OrOr, BinaryOp::Or)],
            &[(Token::AndAnd, BinaryOp::And)],
            &[(Token::Pipe, BinaryOp::BitOr)],
            &[(Token::Caret, BinaryOp::BitXor)],
            &[(Token::Amp, BinaryOp::BitAnd)],
            &[(Token::EqEq, BinaryOp::Eq), (Token::NotEq, BinaryOp::Ne)],
            &[
                (Token::Lt, BinaryOp::Lt),
                (Token::Gt, BinaryOp::Gt),
                (Token::Le, BinaryOp::Le),
                (Token::Ge, BinaryOp::Ge),
            ],
            &[(Token::Shl, BinaryOp::Shl), (Token::Shr, BinaryOp::Shr)],
            &[(Token::Plus, BinaryOp::Add), (Token::Minus, BinaryOp::Sub)],
            &[(Token::Star, BinaryOp::Mul), (Token::Slash, BinaryOp::Div)],
        ];

        if level == LEVELS.len() {
            return self.parse_unary();
        }

        let mut left = self.parse_binary(level + 1);
        loop {
            let op = LEVELS[level]
                .iter()
                .find(|(token, _)| self.at(token))
                .map(|(_, op)| *op);
            let Some(op) = op else { break };

            let line = self.peek_line();
            self.bump();
            let right = self.parse_binary(level + 1);
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                line,
            );
        }
        left
    }

    fn parse_unary(&mut self) -> Expr {
        let line = self.peek_line();
        match self.peek() {
            Some(Token::Not) => {
                self.bump();
                Expr::new(ExprKind::Not(Box::new(self.parse_unary())), line)
            }
            Some(Token::PlusPlus) => {
                self.bump();
                Expr::new(
                    ExprKind::PreIncDec {
                        op: IncDec::Inc,
                        target: Box::new(self.parse_unary()),
                    },
                    line,
                )
            }
            Some(Token::MinusMinus) => {
                self.bump();
                Expr::new(
                    ExprKind::PreIncDec {
                        op: IncDec::Dec,
                        target: Box::new(self.parse_unary()),
                    },
                    line,
                )
            }
            Some(Token::LParen) if self.peek_at(1).is_some_and(Token::is_type_keyword) => {
                self.bump();
                let to = match self.bump() {
                    Some(Token::TypeFloat) => VarType::Float,
                    Some(Token::TypeInt) => VarType::Int,
                    Some(Token::TypeShort) => VarType::Short,
                    _ => VarType::Str,
                };
                self.expect(&Token::RParen);
                Expr::new(
                    ExprKind::Cast {
                        to,
                        expr: Box::new(self.parse_unary()),
                    },
                    line,
                )
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Expr {
        let mut expr = self.parse_primary();
        loop {
            let line = self.peek_line();
            let op = match self.peek() {
                Some(Token::PlusPlus) => IncDec::Inc,
                Some(Token::MinusMinus) => IncDec::Dec,
                _ => break,
            };
            self.bump();
            expr = Expr::new(
                ExprKind::PostIncDec {
                    op,
                    target: Box::new(expr),
                },
                line,
            );
        }
        expr
    }

    fn parse_primary(&mut self) -> Expr {
        let line = self.peek_line();
        match self.peek().cloned() {
            Some(Token::Int(n)) => {
                self.bump();
                Expr::new(ExprKind::Literal(Value::Int(n)), line)
            }
            Some(Token::Float(x)) => {
                self.bump();
                Expr::new(ExprKind::Literal(Value::Float(x)), line)
            }
            Some(Token::Str(s)) => {
                self.bump();
                Expr::new(ExprKind::Literal(Value::Str(s)), line)
            }
            Some(Token::Shell(s)) => {
                self.bump();
                Expr::new(ExprKind::Shell(s), line)
            }
            Some(Token::Ident(name)) => {
                self.bump();
                self.resolve_ident(name, line)
            }
            Some(Token::LParen) => {
                self.bump();
                let expr = self.parse_expr();
                self.expect(&Token::RParen);
                expr
            }
            Some(Token::Create) => self.parse_create(),
            Some(Token::Delete) => self.parse_delete(),
            Some(Token::Timer) => {
                self.had_errors = true;
                self.diags.push(Diagnostic::new(
                    line,
                    format!(
                        "timer expression at line {} is only valid as a transition guard",
                        line
                    ),
                ));
                self.bump();
                if matches!(self.peek(), Some(Token::Int(_))) {
                    self.bump();
                }
                Expr::new(ExprKind::Literal(Value::Int(0)), line)
            }
            _ => {
                self.syntax_error();
                Expr::new(ExprKind::Literal(Value::Int(0)), line)
            }
        }
    }

    fn parse_create(&mut self) -> Expr {
        let line = self.peek_line();
        self.bump(); // 'create'
        let tick = if self.eat(&Token::Tick) {
            true
        } else {
            self.expect(&Token::Timer);
            false
        };
        let id = self.timer_id();
        let interval = Box::new(self.parse_expr());
        let kind = if tick {
            ExprKind::CreateTick { id, interval }
        } else {
            ExprKind::CreateTimer { id, interval }
        };
        Expr::new(kind, line)
    }

    fn parse_delete(&mut self) -> Expr {
        let line = self.peek_line();
        self.bump(); // 'delete'
        self.expect(&Token::Timer);
        let id = self.timer_id();
        Expr::new(ExprKind::DeleteTimer { id }, line)
    }

    // ------------------------------------------------------------------
    // Leaves
    // ------------------------------------------------------------------

    fn resolve_ident(&mut self, name: String, line: u32) -> Expr {
        // Locals declared at the top of the enclosing block win over
        // registry variables.
        if self.locals.iter().any(|d| d.name == name) {
            return Expr::new(ExprKind::Local(name), line);
        }
        match self.vars.find(&name) {
            Some(handle) => Expr::new(ExprKind::SysVar { name, handle }, line),
            None => {
                self.diags.push(Diagnostic::new(
                    line,
                    format!("unknown variable '{}' at line {}", name, line),
                ));
                Expr::new(
                    ExprKind::SysVar {
                        name,
                        handle: VarHandle::INVALID,
                    },
                    line,
                )
            }
        }
    }

    fn string_value(&mut self) -> String {
        match self.peek() {
            Some(Token::Str(_)) => match self.bump() {
                Some(Token::Str(s)) => s,
                _ => String::new(),
            },
            _ => {
                self.syntax_error();
                String::new()
            }
        }
    }

    fn ident_value(&mut self) -> String {
        match self.peek() {
            Some(Token::Ident(_)) => match self.bump() {
                Some(Token::Ident(s)) => s,
                _ => String::new(),
            },
            _ => {
                self.syntax_error();
                String::new()
            }
        }
    }

    fn timer_id(&mut self) -> u32 {
        match self.peek() {
            Some(Token::Int(_)) => match self.bump() {
                Some(Token::Int(n)) if n >= 0 => n as u32,
                _ => 0,
            },
            _ => {
                self.syntax_error();
                0
            }
        }
    }
}
