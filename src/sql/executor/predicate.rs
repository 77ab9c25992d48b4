//! Predicate compilation and evaluation.
//!
//! A [`Predicate`] is compiled once against the working table: column
//! references become positions and literals are coerced to the column's
//! inferred type. Evaluation is then a plain walk over the row. Ordering
//! comparisons are numeric whenever both sides read as numbers, text cells
//! included.
//!
//! `LIKE` is a case-insensitive substring test. `%` and `_` have no special
//! meaning in the pattern.

use std::cmp::Ordering;

use crate::{
    error::Result,
    sql::{
        executor::ResultSet,
        parser::ast::{Literal, Operand, Operator, Predicate},
        types::{DataType, Row, Value, parse_number},
    },
};

/// Predicate bound to column positions
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledPredicate {
    Compare {
        index: usize,
        op: Operator,
        operand: CompiledOperand,
    },
    And(Box<CompiledPredicate>, Box<CompiledPredicate>),
    Or(Box<CompiledPredicate>, Box<CompiledPredicate>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompiledOperand {
    Value(Value),
    /// Lowercased LIKE pattern
    Pattern(String),
    /// Stringified IN list; NULL entries never match
    Set(Vec<String>),
    Column(usize),
}

/// Compiles a predicate against a working table. Fails with
/// `UnknownColumn` (or `AmbiguousColumn`) before any row is looked at.
pub fn compile(predicate: &Predicate, rs: &ResultSet) -> Result<CompiledPredicate> {
    Ok(match predicate {
        Predicate::And(lhs, rhs) => {
            CompiledPredicate::And(Box::new(compile(lhs, rs)?), Box::new(compile(rhs, rs)?))
        }
        Predicate::Or(lhs, rhs) => {
            CompiledPredicate::Or(Box::new(compile(lhs, rs)?), Box::new(compile(rhs, rs)?))
        }
        Predicate::Compare {
            column,
            op,
            operand,
        } => {
            let index = rs.resolve(column)?;
            let datatype = rs.columns[index].datatype;
            let operand = match (op, operand) {
                (_, Operand::Column(other)) => CompiledOperand::Column(rs.resolve(other)?),
                (_, Operand::List(items)) => CompiledOperand::Set(
                    items
                        .iter()
                        .filter(|l| **l != Literal::Null)
                        .map(|l| Value::from(l.clone()).to_string())
                        .collect(),
                ),
                (Operator::Like, Operand::Literal(lit)) => {
                    CompiledOperand::Pattern(Value::from(lit.clone()).to_string().to_lowercase())
                }
                (_, Operand::Literal(lit)) => CompiledOperand::Value(coerce(lit, datatype)),
            };
            CompiledPredicate::Compare {
                index,
                op: *op,
                operand,
            }
        }
    })
}

/// Coerces a literal to the column type it is compared against: numeric
/// text becomes a number for numeric columns. Text columns keep numeric
/// literals as numbers, since numeric text cells compare by value.
fn coerce(literal: &Literal, datatype: DataType) -> Value {
    match (literal, datatype) {
        (Literal::String(s), dt) if dt.is_numeric() => {
            parse_number(s).unwrap_or_else(|| Value::String(s.clone()))
        }
        (lit, _) => Value::from(lit.clone()),
    }
}

impl CompiledPredicate {
    /// Evaluates the predicate against a row. AND/OR short-circuit.
    pub fn evaluate(&self, row: &Row) -> bool {
        match self {
            CompiledPredicate::And(lhs, rhs) => lhs.evaluate(row) && rhs.evaluate(row),
            CompiledPredicate::Or(lhs, rhs) => lhs.evaluate(row) || rhs.evaluate(row),
            CompiledPredicate::Compare { index, op, operand } => {
                let cell = &row[*index];
                match operand {
                    CompiledOperand::Value(Value::Null) => match op {
                        Operator::Equal => cell.is_null(),
                        Operator::NotEqual => !cell.is_null(),
                        _ => false,
                    },
                    CompiledOperand::Value(value) => compare(cell, *op, value),
                    CompiledOperand::Column(other) => compare(cell, *op, &row[*other]),
                    CompiledOperand::Pattern(pattern) => {
                        !cell.is_null() && cell.to_string().to_lowercase().contains(pattern.as_str())
                    }
                    CompiledOperand::Set(set) => {
                        if cell.is_null() {
                            return false;
                        }
                        let text = cell.to_string();
                        let found = set.iter().any(|s| *s == text);
                        match op {
                            Operator::NotIn => !found,
                            _ => found,
                        }
                    }
                }
            }
        }
    }
}

/// Applies a comparison operator; comparisons involving NULL are false
fn compare(lhs: &Value, op: Operator, rhs: &Value) -> bool {
    let Some(ordering) = lhs.compare(rhs) else {
        return false;
    };
    match op {
        Operator::Equal => ordering == Ordering::Equal,
        Operator::NotEqual => ordering != Ordering::Equal,
        Operator::GreaterThan => ordering == Ordering::Greater,
        Operator::GreaterThanOrEqual => ordering != Ordering::Less,
        Operator::LessThan => ordering == Ordering::Less,
        Operator::LessThanOrEqual => ordering != Ordering::Greater,
        Operator::Like | Operator::In | Operator::NotIn => false,
    }
}

#[cfg(test)]
mod tests {
    use super::compile;
    use crate::{
        error::{ErrorKind, Result},
        sql::{
            executor::{Field, ResultSet},
            parser::{Parser, ast::Predicate},
            types::{DataType, Value},
        },
    };

    fn table() -> ResultSet {
        let field = |name: &str, datatype| Field {
            binding: Some("t".to_string()),
            name: name.to_string(),
            datatype,
        };
        ResultSet {
            columns: vec![
                field("id", DataType::String),
                field("amount", DataType::Float),
                field("status", DataType::String),
                field("commission", DataType::Float),
            ],
            rows: vec![
                vec![Value::from("PA001"), Value::Float(120.5), Value::from("success"), Value::Float(2.91)],
                vec![Value::from("PA002"), Value::Float(80.0), Value::from("failed"), Value::Null],
                vec![Value::from("PB001"), Value::Float(300.0), Value::from("SUCCESS"), Value::Float(5.5)],
            ],
        }
    }

    fn predicate(condition: &str) -> Result<Predicate> {
        let stmt = Parser::new(&format!("SELECT * FROM t WHERE {}", condition)).parse()?;
        Ok(stmt.predicate.expect("predicate"))
    }

    /// ids of the rows matching the condition
    fn matching(condition: &str) -> Result<Vec<String>> {
        let rs = table();
        let compiled = compile(&predicate(condition)?, &rs)?;
        Ok(rs
            .rows
            .iter()
            .filter(|r| compiled.evaluate(r))
            .map(|r| r[0].to_string())
            .collect())
    }

    #[test]
    fn test_predicate_comparisons() -> Result<()> {
        assert_eq!(matching("status = 'success'")?, vec!["PA001"]);
        assert_eq!(matching("status != 'success'")?, vec!["PA002", "PB001"]);
        assert_eq!(matching("amount > 100")?, vec!["PA001", "PB001"]);
        assert_eq!(matching("amount <= 120.5")?, vec!["PA001", "PA002"]);
        // numeric text is coerced for numeric columns
        assert_eq!(matching("amount >= '300'")?, vec!["PB001"]);
        assert_eq!(matching("amount < 100.0")?, vec!["PA002"]);
        Ok(())
    }

    #[test]
    fn test_predicate_nulls() -> Result<()> {
        assert_eq!(matching("commission = NULL")?, vec!["PA002"]);
        assert_eq!(matching("commission != NULL")?, vec!["PA001", "PB001"]);
        assert_eq!(matching("commission < 100")?, vec!["PA001", "PB001"]);
        assert_eq!(matching("commission NOT IN (1)")?, vec!["PA001", "PB001"]);
        Ok(())
    }

    #[test]
    fn test_predicate_like_is_substring() -> Result<()> {
        assert_eq!(matching("status LIKE 'SUCC'")?, vec!["PA001", "PB001"]);
        assert_eq!(matching("id LIKE 'pa0'")?, vec!["PA001", "PA002"]);
        // wildcards are literal characters
        assert!(matching("id LIKE 'PA%'")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_predicate_in_lists() -> Result<()> {
        assert_eq!(matching("id IN ('PA001', 'PB001')")?, vec!["PA001", "PB001"]);
        assert_eq!(matching("id NOT IN ('PA001', 'PB001')")?, vec!["PA002"]);
        assert_eq!(matching("amount IN (80, 300)")?, vec!["PA002", "PB001"]);
        Ok(())
    }

    #[test]
    fn test_predicate_boolean_combinations() -> Result<()> {
        assert_eq!(matching("amount > 100 AND status = 'success'")?, vec!["PA001"]);
        // left to right: (status = 'failed' OR id = 'PB001') AND amount > 100
        assert_eq!(matching("status = 'failed' OR id = 'PB001' AND amount > 100")?, vec!["PB001"]);
        assert_eq!(
            matching("status = 'failed' OR (id = 'PB001' AND amount > 100)")?,
            vec!["PA002", "PB001"]
        );
        assert_eq!(matching("amount > commission")?, vec!["PA001", "PB001"]);
        Ok(())
    }

    #[test]
    fn test_predicate_unknown_column() -> Result<()> {
        let err = compile(&predicate("missing = 1")?, &table()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownColumn);
        let err = compile(&predicate("id = other")?, &table()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownColumn);
        Ok(())
    }

    #[test]
    fn test_predicate_numeric_text() -> Result<()> {
        let rs = ResultSet {
            columns: vec![Field {
                binding: Some("r".to_string()),
                name: "order_id".to_string(),
                datatype: DataType::String,
            }],
            rows: vec![
                vec![Value::from("9")],
                vec![Value::from("10")],
                vec![Value::from("1")],
                vec![Value::from("R-7")],
                vec![Value::Integer(12)],
            ],
        };
        let matching = |condition: &str| -> Result<Vec<String>> {
            let compiled = compile(&predicate(condition)?, &rs)?;
            Ok(rs
                .rows
                .iter()
                .filter(|r| compiled.evaluate(r))
                .map(|r| r[0].to_string())
                .collect())
        };
        assert_eq!(matching("order_id > 2 AND order_id < 100")?, vec!["9", "10", "12"]);
        assert_eq!(matching("order_id <= '9'")?, vec!["9", "1"]);
        assert_eq!(matching("order_id = 10.0")?, vec!["10"]);
        // text that is not a number falls back to text order
        assert_eq!(matching("order_id > 'Q'")?, vec!["R-7"]);
        assert_eq!(matching("order_id > 2")?, vec!["9", "10", "R-7", "12"]);
        Ok(())
    }
}
