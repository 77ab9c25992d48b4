use std::collections::HashMap;

use crate::{
    error::{Clause, Error, Result},
    sql::{
        catalog::TableProvider,
        executor::{Context, Field, KeyValue, ResultSet},
        parser::ast::{AggregateCall, AggregateFunc, ColumnRef},
        types::{DataType, Row, Value},
    },
};

use super::Executor;

/// Group-aggregate executor.
///
/// Rows are bucketed by the GROUP BY columns, groups in order of first
/// appearance. Without explicit aggregate calls every remaining numeric
/// column is summed. Without GROUP BY the whole table is one group, so an
/// empty input still yields one row.
pub struct Aggregate<T: TableProvider> {
    source: Box<dyn Executor<T>>,
    group_by: Vec<ColumnRef>,
    aggregates: Vec<(AggregateCall, Option<String>)>,
}

impl<T: TableProvider> Aggregate<T> {
    pub fn new(
        source: Box<dyn Executor<T>>,
        group_by: Vec<ColumnRef>,
        aggregates: Vec<(AggregateCall, Option<String>)>,
    ) -> Box<Self> {
        Box::new(Self {
            source,
            group_by,
            aggregates,
        })
    }
}

/// One output column of the aggregate: reducer, input position, output field
struct Reducer {
    calculator: Box<dyn Calculator>,
    position: Option<usize>,
    field: Field,
}

/// Builds the reducers for `aggregates` over `rs`, skipping the group keys
fn reducers(
    aggregates: &[(AggregateCall, Option<String>)],
    rs: &ResultSet,
    keys: &[usize],
) -> Result<Vec<Reducer>> {
    if aggregates.is_empty() {
        return Ok(rs
            .columns
            .iter()
            .enumerate()
            .filter(|(pos, f)| !keys.contains(pos) && f.datatype.is_numeric())
            .map(|(pos, f)| Reducer {
                calculator: <dyn Calculator>::build(AggregateFunc::Sum),
                position: Some(pos),
                field: f.clone(),
            })
            .collect());
    }

    let mut reducers = Vec::with_capacity(aggregates.len());
    for (call, alias) in aggregates {
        let position = call.column.as_ref().map(|col| rs.resolve(col)).transpose()?;
        let input = position.map(|pos| rs.columns[pos].datatype);
        if matches!(call.func, AggregateFunc::Sum | AggregateFunc::Avg) && input == Some(DataType::String) {
            return Err(Error::malformed(
                Clause::Select,
                format!("{} needs a numeric column", call.output_name()),
            ));
        }
        let calculator = <dyn Calculator>::build(call.func);
        reducers.push(Reducer {
            field: Field {
                binding: None,
                name: alias.clone().unwrap_or_else(|| call.output_name()),
                datatype: calculator.datatype(input),
            },
            calculator,
            position,
        });
    }
    Ok(reducers)
}

impl<T: TableProvider> Executor<T> for Aggregate<T> {
    fn execute(self: Box<Self>, ctx: &mut Context<'_, T>) -> Result<ResultSet> {
        let Aggregate {
            source,
            group_by,
            aggregates,
        } = *self;
        let rs = source.execute(ctx)?;
        let keys = group_by
            .iter()
            .map(|col| rs.resolve(col))
            .collect::<Result<Vec<_>>>()?;
        let reducers = reducers(&aggregates, &rs, &keys)?;

        let mut groups: Vec<Vec<&Row>> = Vec::new();
        if keys.is_empty() {
            groups.push(rs.rows.iter().collect());
        } else {
            let mut index: HashMap<Vec<KeyValue>, usize> = HashMap::new();
            for row in &rs.rows {
                let key = keys
                    .iter()
                    .map(|&pos| KeyValue::new(&row[pos], rs.columns[pos].datatype == DataType::String))
                    .collect();
                let next = groups.len();
                let i = *index.entry(key).or_insert(next);
                if i == next {
                    groups.push(Vec::new());
                }
                groups[i].push(row);
            }
        }

        let rows = groups
            .iter()
            .map(|group| -> Result<Row> {
                let mut row: Row = match group.first() {
                    Some(first) => keys.iter().map(|&pos| first[pos].clone()).collect(),
                    None => Vec::new(),
                };
                for r in &reducers {
                    row.push(r.calculator.calc(r.position, group)?);
                }
                Ok(row)
            })
            .collect::<Result<Vec<Row>>>()?;

        let mut columns: Vec<Field> = keys.iter().map(|&pos| rs.columns[pos].clone()).collect();
        columns.extend(reducers.into_iter().map(|r| r.field));
        Ok(ResultSet { columns, rows })
    }
}

/// Trait for aggregate function calculations
pub trait Calculator {
    /// Reduces one group. `pos` is None for `COUNT(*)`.
    fn calc(&self, pos: Option<usize>, rows: &[&Row]) -> Result<Value>;

    /// Output type given the input column type
    fn datatype(&self, input: Option<DataType>) -> DataType;
}

impl dyn Calculator {
    /// Runtime dispatch to appropriate calculator based on function
    pub fn build(func: AggregateFunc) -> Box<dyn Calculator> {
        match func {
            AggregateFunc::Count => Count::new(),
            AggregateFunc::Sum => Sum::new(),
            AggregateFunc::Min => Min::new(),
            AggregateFunc::Max => Max::new(),
            AggregateFunc::Avg => Avg::new(),
        }
    }
}

/// Non-null cells of one column across a group
fn values<'a>(pos: Option<usize>, rows: &'a [&'a Row]) -> impl Iterator<Item = &'a Value> {
    rows.iter()
        .filter_map(move |row| pos.map(|pos| &row[pos]))
        .filter(|v| !v.is_null())
}

/// COUNT - counts rows, or non-null values of a column
pub struct Count;

impl Count {
    fn new() -> Box<Self> {
        Box::new(Self {})
    }
}

impl Calculator for Count {
    fn calc(&self, pos: Option<usize>, rows: &[&Row]) -> Result<Value> {
        let count = match pos {
            None => rows.len(),
            Some(_) => values(pos, rows).count(),
        };
        Ok(Value::Integer(count as i64))
    }

    fn datatype(&self, _: Option<DataType>) -> DataType {
        DataType::Integer
    }
}

/// SUM - integer sum while every value is an integer, float otherwise.
/// An integer sum that leaves the i64 range is an error.
pub struct Sum;

impl Sum {
    fn new() -> Box<Self> {
        Box::new(Self {})
    }
}

impl Calculator for Sum {
    fn calc(&self, pos: Option<usize>, rows: &[&Row]) -> Result<Value> {
        let mut int_sum: Option<i64> = Some(0);
        let mut float_sum = 0.0;
        let mut seen = false;
        for value in values(pos, rows) {
            let Some(n) = value.as_f64() else { continue };
            seen = true;
            float_sum += n;
            int_sum = match (int_sum, value) {
                (Some(acc), Value::Integer(i)) => Some(
                    acc.checked_add(*i)
                        .ok_or_else(|| Error::Internal("integer overflow in sum".into()))?,
                ),
                _ => None,
            };
        }
        Ok(match (seen, int_sum) {
            (false, _) => Value::Null,
            (true, Some(i)) => Value::Integer(i),
            (true, None) => Value::Float(float_sum),
        })
    }

    fn datatype(&self, input: Option<DataType>) -> DataType {
        match input {
            Some(DataType::Integer) => DataType::Integer,
            _ => DataType::Float,
        }
    }
}

/// MIN - smallest non-null value
pub struct Min;

impl Min {
    fn new() -> Box<Self> {
        Box::new(Self {})
    }
}

impl Calculator for Min {
    fn calc(&self, pos: Option<usize>, rows: &[&Row]) -> Result<Value> {
        Ok(values(pos, rows)
            .min_by(|a, b| a.sort_cmp(b))
            .cloned()
            .unwrap_or(Value::Null))
    }

    fn datatype(&self, input: Option<DataType>) -> DataType {
        input.unwrap_or(DataType::Null)
    }
}

/// MAX - largest non-null value
pub struct Max;

impl Max {
    fn new() -> Box<Self> {
        Box::new(Self {})
    }
}

impl Calculator for Max {
    fn calc(&self, pos: Option<usize>, rows: &[&Row]) -> Result<Value> {
        Ok(values(pos, rows)
            .max_by(|a, b| a.sort_cmp(b))
            .cloned()
            .unwrap_or(Value::Null))
    }

    fn datatype(&self, input: Option<DataType>) -> DataType {
        input.unwrap_or(DataType::Null)
    }
}

/// AVG - mean of the non-null numeric values
pub struct Avg;

impl Avg {
    fn new() -> Box<Self> {
        Box::new(Self {})
    }
}

impl Calculator for Avg {
    fn calc(&self, pos: Option<usize>, rows: &[&Row]) -> Result<Value> {
        let (sum, count) = values(pos, rows)
            .filter_map(Value::as_f64)
            .fold((0.0, 0usize), |(sum, count), n| (sum + n, count + 1));
        Ok(match count {
            0 => Value::Null,
            _ => Value::Float(sum / count as f64),
        })
    }

    fn datatype(&self, _: Option<DataType>) -> DataType {
        DataType::Float
    }
}
