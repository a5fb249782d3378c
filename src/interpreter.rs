//! Tree-walking evaluator.
//!
//! Implements the runtime semantics of every AST node plus the end-to-end
//! `run` pipeline (lex, parse, execute). Statement execution reports
//! through [`ExecResult`]: `?` forwards both hard errors and the early
//! return signal, and `MethodBody` is where the signal stops.

use std::io::Write;
use std::rc::Rc;

use anyhow::Result;

use crate::ast::{ComparisonOp, Statement};
use crate::lexer::Lexer;
use crate::parser;
use crate::runtime::compare;
use crate::runtime::{
    Closure, Context, ExecResult, Interrupt, ObjectHolder, RuntimeError, Value, is_true,
};
use crate::runtime::value::ClassInstance;

/// Executes a Mython program read from `source`, writing to `output`.
pub fn run(source: &str, output: &mut dyn Write) -> Result<()> {
    let mut lexer = Lexer::new(source)?;
    let program = parser::parse_program(&mut lexer)?;

    let mut closure = Closure::new();
    let mut context = Context::new(output);
    match program.execute(&mut closure, &mut context) {
        Ok(_) => Ok(()),
        Err(Interrupt::Error(error)) => Err(error.into()),
        Err(Interrupt::Return(_)) => Err(RuntimeError::ReturnOutsideMethod.into()),
    }
}

impl Statement {
    /// Evaluates this node under `closure`, producing a holder or an
    /// interrupt.
    pub fn execute(&self, closure: &mut Closure, context: &mut Context<'_>) -> ExecResult {
        match self {
            Statement::NumericConst(value) => Ok(ObjectHolder::own(Value::Number(*value))),
            Statement::StringConst(value) => Ok(ObjectHolder::own(Value::String(value.clone()))),
            Statement::BoolConst(value) => Ok(ObjectHolder::own(Value::Bool(*value))),
            Statement::NoneConst => Ok(ObjectHolder::none()),
            Statement::VariableValue { dotted_ids } => lookup_dotted(dotted_ids, closure),
            Statement::Assignment { var, rv } => {
                let value = rv.execute(closure, context)?;
                closure.insert(var.clone(), value.share());
                Ok(value)
            }
            Statement::FieldAssignment { object, field, rv } => {
                let target = object.execute(closure, context)?;
                if !matches!(target.value().as_deref(), Some(Value::Instance(_))) {
                    return Err(RuntimeError::ExpectedInstance {
                        type_name: target.type_name().to_string(),
                    }
                    .into());
                }
                let value = rv.execute(closure, context)?;
                if let Some(Value::Instance(instance)) = target.value_mut().as_deref_mut() {
                    instance.fields_mut().insert(field.clone(), value.share());
                }
                Ok(value)
            }
            Statement::Print { args } => {
                let mut delim = "";
                for arg in args {
                    let value = arg.execute(closure, context)?;
                    let text = value.to_output(context)?;
                    write!(context.output_stream(), "{delim}{text}")?;
                    delim = " ";
                }
                writeln!(context.output_stream())?;
                Ok(ObjectHolder::none())
            }
            Statement::MethodCall {
                object,
                method,
                args,
            } => {
                let receiver = object.execute(closure, context)?;
                let mut actual_args = Vec::with_capacity(args.len());
                for arg in args {
                    actual_args.push(arg.execute(closure, context)?);
                }
                Ok(receiver.call_method(method, &actual_args, context)?)
            }
            Statement::NewInstance { class, args } => {
                let instance =
                    ObjectHolder::own(Value::Instance(ClassInstance::new(Rc::clone(class))));
                // Constructor arguments are only evaluated when a matching
                // __init__ exists; otherwise they are ignored.
                let has_init = class
                    .get_method("__init__")
                    .is_some_and(|init| init.formal_params.len() == args.len());
                if has_init {
                    let mut actual_args = Vec::with_capacity(args.len());
                    for arg in args {
                        actual_args.push(arg.execute(closure, context)?);
                    }
                    instance.call_method("__init__", &actual_args, context)?;
                }
                Ok(instance)
            }
            Statement::Stringify { arg } => {
                let value = arg.execute(closure, context)?;
                let text = value.to_output(context)?;
                Ok(ObjectHolder::own(Value::String(text)))
            }
            Statement::Add { lhs, rhs } => {
                let left = lhs.execute(closure, context)?;
                let right = rhs.execute(closure, context)?;
                if matches!(left.value().as_deref(), Some(Value::Instance(_))) {
                    return Ok(left.call_method("__add__", &[right.share()], context)?);
                }
                let sum = match (left.value().as_deref(), right.value().as_deref()) {
                    (Some(Value::Number(a)), Some(Value::Number(b))) => Some(Value::Number(a + b)),
                    (Some(Value::String(a)), Some(Value::String(b))) => {
                        Some(Value::String(format!("{a}{b}")))
                    }
                    _ => None,
                };
                match sum {
                    Some(value) => Ok(ObjectHolder::own(value)),
                    None => Err(RuntimeError::InvalidOperands {
                        operation: "+",
                        lhs: left.type_name().to_string(),
                        rhs: right.type_name().to_string(),
                    }
                    .into()),
                }
            }
            Statement::Sub { lhs, rhs } => {
                binary_numeric(lhs, rhs, "-", closure, context, |a, b| Ok(a - b))
            }
            Statement::Mult { lhs, rhs } => {
                binary_numeric(lhs, rhs, "*", closure, context, |a, b| Ok(a * b))
            }
            Statement::Div { lhs, rhs } => binary_numeric(lhs, rhs, "/", closure, context, |a, b| {
                if b == 0 {
                    Err(RuntimeError::DivisionByZero)
                } else {
                    Ok(a / b)
                }
            }),
            Statement::Or { lhs, rhs } => {
                let mut result = is_true(&lhs.execute(closure, context)?);
                if !result {
                    result = is_true(&rhs.execute(closure, context)?);
                }
                Ok(ObjectHolder::own(Value::Bool(result)))
            }
            Statement::And { lhs, rhs } => {
                let mut result = is_true(&lhs.execute(closure, context)?);
                if result {
                    result = is_true(&rhs.execute(closure, context)?);
                }
                Ok(ObjectHolder::own(Value::Bool(result)))
            }
            Statement::Not { arg } => {
                let value = arg.execute(closure, context)?;
                Ok(ObjectHolder::own(Value::Bool(!is_true(&value))))
            }
            Statement::Comparison { op, lhs, rhs } => {
                let left = lhs.execute(closure, context)?;
                let right = rhs.execute(closure, context)?;
                let result = match op {
                    ComparisonOp::Equal => compare::equal(&left, &right, context),
                    ComparisonOp::NotEqual => compare::not_equal(&left, &right, context),
                    ComparisonOp::Less => compare::less(&left, &right, context),
                    ComparisonOp::Greater => compare::greater(&left, &right, context),
                    ComparisonOp::LessOrEqual => compare::less_or_equal(&left, &right, context),
                    ComparisonOp::GreaterOrEqual => {
                        compare::greater_or_equal(&left, &right, context)
                    }
                }?;
                Ok(ObjectHolder::own(Value::Bool(result)))
            }
            Statement::Compound { statements } => {
                // Statement results are discarded; interrupts bubble up.
                for statement in statements {
                    statement.execute(closure, context)?;
                }
                Ok(ObjectHolder::none())
            }
            Statement::Return { statement } => {
                Err(Interrupt::Return(statement.execute(closure, context)?))
            }
            Statement::IfElse {
                condition,
                if_body,
                else_body,
            } => {
                let condition = condition.execute(closure, context)?;
                if is_true(&condition) {
                    if_body.execute(closure, context)
                } else if let Some(else_body) = else_body {
                    else_body.execute(closure, context)
                } else {
                    Ok(ObjectHolder::none())
                }
            }
            Statement::ClassDefinition { class } => {
                let holder = ObjectHolder::own(Value::Class(Rc::clone(class)));
                closure.insert(class.name().to_string(), holder.share());
                Ok(holder)
            }
            Statement::MethodBody { body } => match body.execute(closure, context) {
                // The sole handler for the early-return signal.
                Err(Interrupt::Return(value)) => Ok(value),
                other => other,
            },
        }
    }
}

fn lookup_dotted(dotted_ids: &[String], closure: &Closure) -> ExecResult {
    let Some((first, fields)) = dotted_ids.split_first() else {
        return Err(RuntimeError::UndefinedName {
            name: String::new(),
        }
        .into());
    };
    let mut object = closure
        .get(first)
        .ok_or_else(|| RuntimeError::UndefinedName {
            name: first.clone(),
        })?
        .share();

    for field in fields {
        let next = match object.value().as_deref() {
            Some(Value::Instance(instance)) => {
                instance.fields().get(field).map(ObjectHolder::share)
            }
            _ => {
                return Err(RuntimeError::ExpectedInstance {
                    type_name: object.type_name().to_string(),
                }
                .into());
            }
        };
        object = next.ok_or_else(|| RuntimeError::UnknownField {
            field: field.clone(),
        })?;
    }
    Ok(object)
}

fn binary_numeric(
    lhs: &Statement,
    rhs: &Statement,
    operation: &'static str,
    closure: &mut Closure,
    context: &mut Context<'_>,
    apply: impl Fn(i32, i32) -> Result<i32, RuntimeError>,
) -> ExecResult {
    let left = lhs.execute(closure, context)?;
    let right = rhs.execute(closure, context)?;
    match (left.as_number(), right.as_number()) {
        (Some(a), Some(b)) => Ok(ObjectHolder::own(Value::Number(apply(a, b)?))),
        _ => Err(RuntimeError::InvalidOperands {
            operation,
            lhs: left.type_name().to_string(),
            rhs: right.type_name().to_string(),
        }
        .into()),
    }
}
