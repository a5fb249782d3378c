//! Recursive-descent parser for Mython source.
//!
//! Consumes the lexer's `current()`/`next()` stream and produces the AST
//! walked by `interpreter`. Classes are resolved while parsing: both
//! instantiation and parent references must name a class declared earlier
//! in the program. Method bodies are wrapped in `MethodBody` so `return`
//! unwinds no further than the call boundary.

use std::collections::HashMap;
use std::rc::Rc;

use anyhow::{Result, anyhow, bail};

use crate::ast::{ComparisonOp, Statement};
use crate::lexer::{Lexer, Token};
use crate::runtime::{Class, Method};

/// Parses a whole program into a `Compound` of top-level statements.
pub fn parse_program(lexer: &mut Lexer<'_>) -> Result<Statement> {
    Parser::new(lexer).program()
}

struct Parser<'a, 'b> {
    lexer: &'a mut Lexer<'b>,
    classes: HashMap<String, Rc<Class>>,
}

impl<'a, 'b> Parser<'a, 'b> {
    fn new(lexer: &'a mut Lexer<'b>) -> Self {
        Self {
            lexer,
            classes: HashMap::new(),
        }
    }

    fn program(mut self) -> Result<Statement> {
        let mut statements = Vec::new();
        while !matches!(self.current(), Token::Eof) {
            if self.consume_newlines()? {
                continue;
            }
            statements.push(self.statement()?);
        }
        Ok(Statement::Compound { statements })
    }

    fn statement(&mut self) -> Result<Statement> {
        match self.current() {
            Token::Class => self.class_definition(),
            Token::If => self.if_else(),
            Token::Print => self.print_statement(),
            Token::Return => self.return_statement(),
            _ => self.simple_statement(),
        }
    }

    fn class_definition(&mut self) -> Result<Statement> {
        self.expect(Token::Class)?;
        let name = self.expect_id()?;
        let parent = if matches!(self.current(), Token::Char('(')) {
            self.advance()?;
            let parent_name = self.expect_id()?;
            self.expect(Token::Char(')'))?;
            Some(self.lookup_class(&parent_name)?)
        } else {
            None
        };
        self.expect(Token::Char(':'))?;
        self.expect(Token::Newline)?;
        self.expect(Token::Indent)?;

        let mut methods = Vec::new();
        while matches!(self.current(), Token::Def) {
            methods.push(self.method()?);
        }
        self.expect(Token::Dedent)?;

        let class = Rc::new(Class::new(name.clone(), methods, parent));
        self.classes.insert(name, Rc::clone(&class));
        Ok(Statement::ClassDefinition { class })
    }

    fn method(&mut self) -> Result<Method> {
        self.expect(Token::Def)?;
        let name = self.expect_id()?;
        self.expect(Token::Char('('))?;
        let mut formal_params = Vec::new();
        if !matches!(self.current(), Token::Char(')')) {
            loop {
                formal_params.push(self.expect_id()?);
                if matches!(self.current(), Token::Char(',')) {
                    self.advance()?;
                } else {
                    break;
                }
            }
        }
        self.expect(Token::Char(')'))?;
        self.expect(Token::Char(':'))?;
        let body = Statement::MethodBody {
            body: Box::new(self.suite()?),
        };
        Ok(Method {
            name,
            formal_params,
            body,
        })
    }

    /// An indented statement block: `Newline Indent stmt+ Dedent`.
    fn suite(&mut self) -> Result<Statement> {
        self.expect(Token::Newline)?;
        self.expect(Token::Indent)?;
        let mut statements = Vec::new();
        while !matches!(self.current(), Token::Dedent | Token::Eof) {
            statements.push(self.statement()?);
        }
        self.expect(Token::Dedent)?;
        Ok(Statement::Compound { statements })
    }

    fn if_else(&mut self) -> Result<Statement> {
        self.expect(Token::If)?;
        let condition = self.expression()?;
        self.expect(Token::Char(':'))?;
        let if_body = self.suite()?;
        let else_body = if matches!(self.current(), Token::Else) {
            self.advance()?;
            self.expect(Token::Char(':'))?;
            Some(Box::new(self.suite()?))
        } else {
            None
        };
        Ok(Statement::IfElse {
            condition: Box::new(condition),
            if_body: Box::new(if_body),
            else_body,
        })
    }

    fn print_statement(&mut self) -> Result<Statement> {
        self.expect(Token::Print)?;
        let mut args = Vec::new();
        if !matches!(self.current(), Token::Newline) {
            loop {
                args.push(self.expression()?);
                if matches!(self.current(), Token::Char(',')) {
                    self.advance()?;
                } else {
                    break;
                }
            }
        }
        self.expect(Token::Newline)?;
        Ok(Statement::Print { args })
    }

    fn return_statement(&mut self) -> Result<Statement> {
        self.expect(Token::Return)?;
        let statement = self.expression()?;
        self.expect(Token::Newline)?;
        Ok(Statement::Return {
            statement: Box::new(statement),
        })
    }

    /// Assignment or bare expression, terminated by a newline.
    fn simple_statement(&mut self) -> Result<Statement> {
        let expr = self.expression()?;
        if matches!(self.current(), Token::Char('=')) {
            self.advance()?;
            let rv = Box::new(self.expression()?);
            let target = match expr {
                Statement::VariableValue { mut dotted_ids } => match dotted_ids.pop() {
                    Some(var) if dotted_ids.is_empty() => Statement::Assignment { var, rv },
                    // `a.b.c = rv` writes field `c` of the object `a.b`.
                    Some(field) => Statement::FieldAssignment {
                        object: Box::new(Statement::VariableValue { dotted_ids }),
                        field,
                        rv,
                    },
                    None => bail!("Cannot assign to an empty name"),
                },
                other => bail!("Cannot assign to {other:?}"),
            };
            self.expect(Token::Newline)?;
            return Ok(target);
        }
        self.expect(Token::Newline)?;
        Ok(expr)
    }

    fn expression(&mut self) -> Result<Statement> {
        self.or_test()
    }

    fn or_test(&mut self) -> Result<Statement> {
        let mut expr = self.and_test()?;
        while matches!(self.current(), Token::Or) {
            self.advance()?;
            let rhs = self.and_test()?;
            expr = Statement::Or {
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
            };
        }
        Ok(expr)
    }

    fn and_test(&mut self) -> Result<Statement> {
        let mut expr = self.not_test()?;
        while matches!(self.current(), Token::And) {
            self.advance()?;
            let rhs = self.not_test()?;
            expr = Statement::And {
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
            };
        }
        Ok(expr)
    }

    fn not_test(&mut self) -> Result<Statement> {
        if matches!(self.current(), Token::Not) {
            self.advance()?;
            let arg = self.not_test()?;
            return Ok(Statement::Not { arg: Box::new(arg) });
        }
        self.comparison()
    }

    /// A single, non-chaining comparison.
    fn comparison(&mut self) -> Result<Statement> {
        let lhs = self.sum()?;
        let op = match self.current() {
            Token::Eq => ComparisonOp::Equal,
            Token::NotEq => ComparisonOp::NotEqual,
            Token::Char('<') => ComparisonOp::Less,
            Token::Char('>') => ComparisonOp::Greater,
            Token::LessOrEq => ComparisonOp::LessOrEqual,
            Token::GreaterOrEq => ComparisonOp::GreaterOrEqual,
            _ => return Ok(lhs),
        };
        self.advance()?;
        let rhs = self.sum()?;
        Ok(Statement::Comparison {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn sum(&mut self) -> Result<Statement> {
        let mut expr = self.term()?;
        loop {
            if matches!(self.current(), Token::Char('+')) {
                self.advance()?;
                let rhs = self.term()?;
                expr = Statement::Add {
                    lhs: Box::new(expr),
                    rhs: Box::new(rhs),
                };
            } else if matches!(self.current(), Token::Char('-')) {
                self.advance()?;
                let rhs = self.term()?;
                expr = Statement::Sub {
                    lhs: Box::new(expr),
                    rhs: Box::new(rhs),
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn term(&mut self) -> Result<Statement> {
        let mut expr = self.factor()?;
        loop {
            if matches!(self.current(), Token::Char('*')) {
                self.advance()?;
                let rhs = self.factor()?;
                expr = Statement::Mult {
                    lhs: Box::new(expr),
                    rhs: Box::new(rhs),
                };
            } else if matches!(self.current(), Token::Char('/')) {
                self.advance()?;
                let rhs = self.factor()?;
                expr = Statement::Div {
                    lhs: Box::new(expr),
                    rhs: Box::new(rhs),
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn factor(&mut self) -> Result<Statement> {
        if matches!(self.current(), Token::Char('-')) {
            self.advance()?;
            let arg = self.factor()?;
            // Unary minus is sugar for subtraction from zero.
            return Ok(Statement::Sub {
                lhs: Box::new(Statement::NumericConst(0)),
                rhs: Box::new(arg),
            });
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Statement> {
        match self.current().clone() {
            Token::Number(value) => {
                self.advance()?;
                Ok(Statement::NumericConst(value))
            }
            Token::String(value) => {
                self.advance()?;
                Ok(Statement::StringConst(value))
            }
            Token::True => {
                self.advance()?;
                Ok(Statement::BoolConst(true))
            }
            Token::False => {
                self.advance()?;
                Ok(Statement::BoolConst(false))
            }
            Token::None => {
                self.advance()?;
                Ok(Statement::NoneConst)
            }
            Token::Char('(') => {
                self.advance()?;
                let expr = self.expression()?;
                self.expect(Token::Char(')'))?;
                Ok(expr)
            }
            Token::Id(first) => {
                self.advance()?;
                let mut dotted_ids = vec![first];
                while matches!(self.current(), Token::Char('.')) {
                    self.advance()?;
                    dotted_ids.push(self.expect_id()?);
                }
                if !matches!(self.current(), Token::Char('(')) {
                    return Ok(Statement::VariableValue { dotted_ids });
                }

                let args = self.call_args()?;
                let mut expr = self.call_expression(dotted_ids, args)?;
                // Chained calls on the result: `B().f().g()`.
                while matches!(self.current(), Token::Char('.')) {
                    self.advance()?;
                    let method = self.expect_id()?;
                    let args = self.call_args()?;
                    expr = Statement::MethodCall {
                        object: Box::new(expr),
                        method,
                        args,
                    };
                }
                Ok(expr)
            }
            token => bail!("Expected an expression, got {token}"),
        }
    }

    fn call_args(&mut self) -> Result<Vec<Statement>> {
        self.expect(Token::Char('('))?;
        let mut args = Vec::new();
        if !matches!(self.current(), Token::Char(')')) {
            loop {
                args.push(self.expression()?);
                if matches!(self.current(), Token::Char(',')) {
                    self.advance()?;
                } else {
                    break;
                }
            }
        }
        self.expect(Token::Char(')'))?;
        Ok(args)
    }

    /// A called dotted chain: `str(x)`, `ClassName(args)`, or a method call
    /// on the chain prefix.
    fn call_expression(
        &mut self,
        mut dotted_ids: Vec<String>,
        args: Vec<Statement>,
    ) -> Result<Statement> {
        let Some(name) = dotted_ids.pop() else {
            bail!("Expected a name before '('");
        };
        if dotted_ids.is_empty() {
            if name == "str" {
                let mut args = args;
                if args.len() != 1 {
                    bail!("str() takes exactly one argument, got {}", args.len());
                }
                return Ok(Statement::Stringify {
                    arg: Box::new(args.remove(0)),
                });
            }
            let class = self.lookup_class(&name)?;
            return Ok(Statement::NewInstance { class, args });
        }
        Ok(Statement::MethodCall {
            object: Box::new(Statement::VariableValue { dotted_ids }),
            method: name,
            args,
        })
    }

    fn lookup_class(&self, name: &str) -> Result<Rc<Class>> {
        self.classes
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("Unknown class '{name}'"))
    }

    fn current(&self) -> &Token {
        self.lexer.current()
    }

    fn advance(&mut self) -> Result<()> {
        self.lexer.next()?;
        Ok(())
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        if *self.current() == expected {
            self.advance()?;
            Ok(())
        } else {
            bail!("Expected {expected}, got {}", self.current());
        }
    }

    fn expect_id(&mut self) -> Result<String> {
        if let Token::Id(name) = self.current() {
            let name = name.clone();
            self.advance()?;
            Ok(name)
        } else {
            bail!("Expected an identifier, got {}", self.current());
        }
    }

    fn consume_newlines(&mut self) -> Result<bool> {
        let mut consumed = false;
        while matches!(self.current(), Token::Newline) {
            consumed = true;
            self.advance()?;
        }
        Ok(consumed)
    }
}
