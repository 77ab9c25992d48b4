use std::iter::Peekable;

use crate::error::{Clause, Error, Result};
use crate::sql::parser::ast::{
    AggregateCall, AggregateFunc, ColumnRef, Join, JoinType, Literal, Operand, Operator,
    OrderDirection, Predicate, Projection, SelectItem, Statement, TableRef,
};
use crate::sql::parser::lexer::{Keyword, Lexer, Token};

pub mod ast;
mod lexer;

/// Parser - Converts query text into a [`Statement`].
///
/// Only SELECT is accepted. Text starting with a mutating keyword is refused
/// with [`Error::PermissionDenied`] after reading a single token.
pub struct Parser<'a> {
    lexer: Peekable<Lexer<'a>>,
    /// Clause being parsed, attached to syntax errors
    clause: Clause,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given query text
    pub fn new(input: &'a str) -> Self {
        Parser {
            lexer: Lexer::new(input).peekable(),
            clause: Clause::Select,
        }
    }

    /// Parses the input into a statement with all aliases normalized
    pub fn parse(&mut self) -> Result<Statement> {
        match self.lexer.peek().cloned().transpose()? {
            Some(Token::Keyword(k)) if k.is_mutating() => {
                return Err(Error::PermissionDenied(k.to_string()));
            }
            Some(Token::Keyword(Keyword::Select)) => {}
            Some(t) => {
                return Err(Error::UnsupportedSyntax(format!(
                    "only SELECT statements are supported, got {}",
                    t
                )));
            }
            None => return Err(Error::UnsupportedSyntax("empty query".into())),
        }

        let mut stmt = self.parse_select()?;

        // Nothing but a single optional semicolon may follow the statement
        self.next_if_token(Token::Semicolon);
        match self.peek()? {
            None => {}
            Some(Token::Keyword(k)) if k.is_mutating() => {
                return Err(Error::PermissionDenied(k.to_string()));
            }
            Some(Token::Keyword(Keyword::Select)) => {
                return Err(Error::UnsupportedSyntax(
                    "only one statement per query is supported".into(),
                ));
            }
            Some(token) => {
                return Err(Error::UnsupportedSyntax(format!(
                    "unexpected token {} after end of statement",
                    token
                )));
            }
        }

        normalize_aliases(&mut stmt)?;
        Ok(stmt)
    }

    /// Parses the clauses of a SELECT statement in their fixed order
    fn parse_select(&mut self) -> Result<Statement> {
        self.clause = Clause::Select;
        self.next_expect(Token::Keyword(Keyword::Select))?;
        let projection = self.parse_projection()?;

        self.clause = Clause::From;
        if self.next_if_token(Token::Keyword(Keyword::From)).is_none() {
            return Err(match self.peek()? {
                Some(token) => self.malformed(format!("expected FROM, got {}", token)),
                None => self.malformed("missing FROM clause"),
            });
        }
        let from = self.parse_table_ref()?;

        let mut joins = Vec::new();
        while let Some(join) = self.parse_join()? {
            joins.push(join);
        }

        Ok(Statement {
            from,
            joins,
            projection,
            predicate: self.parse_where_clause()?,
            group_by: self.parse_group_by()?,
            order_by: self.parse_order_by()?,
            limit: self.parse_limit()?,
        })
    }

    /// Parses the SELECT list: `*` or comma separated columns and aggregates
    fn parse_projection(&mut self) -> Result<Projection> {
        if self.next_if_token(Token::Asterisk).is_some() {
            return Ok(Projection::Wildcard);
        }

        let mut items = Vec::new();
        loop {
            let name = self.next_ident()?;
            let item = if self.next_if_token(Token::OpenParen).is_some() {
                let func = AggregateFunc::from_name(&name)
                    .ok_or_else(|| self.malformed(format!("unknown function {}", name)))?;
                let column = match self.next_if_token(Token::Asterisk) {
                    Some(_) if func == AggregateFunc::Count => None,
                    Some(_) => return Err(self.malformed(format!("{}(*) is not supported", func))),
                    None => {
                        let first = self.next_ident()?;
                        Some(self.parse_column_after(first)?)
                    }
                };
                self.next_expect(Token::CloseParen)?;
                SelectItem::Aggregate(AggregateCall { func, column }, self.parse_alias()?)
            } else {
                SelectItem::Column(self.parse_column_after(name)?, self.parse_alias()?)
            };
            items.push(item);

            if self.next_if_token(Token::Comma).is_none() {
                break;
            }
        }
        Ok(Projection::Items(items))
    }

    /// Parses `name [[AS] alias]` for FROM and JOIN
    fn parse_table_ref(&mut self) -> Result<TableRef> {
        Ok(TableRef {
            name: self.next_ident()?,
            alias: self.parse_alias()?,
        })
    }

    /// Parses an optional alias, with or without `AS`
    fn parse_alias(&mut self) -> Result<Option<String>> {
        if self.next_if_token(Token::Keyword(Keyword::As)).is_some() {
            return Ok(Some(self.next_ident()?));
        }
        Ok(match self.peek()? {
            Some(Token::Ident(_)) => Some(self.next_ident()?),
            _ => None,
        })
    }

    /// Parses `[INNER | LEFT [OUTER]] JOIN table [alias] ON a = b`
    fn parse_join(&mut self) -> Result<Option<Join>> {
        let join_type = match self.peek()? {
            Some(Token::Keyword(Keyword::Join)) => JoinType::Inner,
            Some(Token::Keyword(Keyword::Inner)) => {
                self.next()?;
                JoinType::Inner
            }
            Some(Token::Keyword(Keyword::Left)) => {
                self.next()?;
                self.next_if_token(Token::Keyword(Keyword::Outer));
                JoinType::Left
            }
            Some(Token::Keyword(k @ (Keyword::Right | Keyword::Full | Keyword::Cross))) => {
                self.clause = Clause::Join;
                return Err(self.malformed(format!("{} JOIN is not supported", k)));
            }
            _ => return Ok(None),
        };
        self.clause = Clause::Join;
        self.next_expect(Token::Keyword(Keyword::Join))?;

        let table = self.parse_table_ref()?;
        self.next_expect(Token::Keyword(Keyword::On))?;
        let left = self.parse_column()?;
        self.next_expect(Token::Equal)?;
        let right = self.parse_column()?;

        if let Some(Token::Keyword(Keyword::And | Keyword::Or)) = self.peek()? {
            return Err(self.malformed("only a single equality condition is supported"));
        }
        Ok(Some(Join {
            join_type,
            table,
            left,
            right,
        }))
    }

    /// Parses the WHERE condition
    fn parse_where_clause(&mut self) -> Result<Option<Predicate>> {
        if self.next_if_token(Token::Keyword(Keyword::Where)).is_none() {
            return Ok(None);
        }
        self.clause = Clause::Where;
        Ok(Some(self.parse_predicate()?))
    }

    /// Parses conditions joined by AND/OR, grouping strictly left to right:
    /// `a AND b OR c AND d` is `((a AND b) OR c) AND d`.
    fn parse_predicate(&mut self) -> Result<Predicate> {
        let mut predicate = self.parse_predicate_term()?;
        loop {
            if self.next_if_token(Token::Keyword(Keyword::And)).is_some() {
                let rhs = self.parse_predicate_term()?;
                predicate = Predicate::And(Box::new(predicate), Box::new(rhs));
            } else if self.next_if_token(Token::Keyword(Keyword::Or)).is_some() {
                let rhs = self.parse_predicate_term()?;
                predicate = Predicate::Or(Box::new(predicate), Box::new(rhs));
            } else {
                return Ok(predicate);
            }
        }
    }

    /// Parses a parenthesized condition or a single comparison
    fn parse_predicate_term(&mut self) -> Result<Predicate> {
        if self.next_if_token(Token::OpenParen).is_some() {
            let predicate = self.parse_predicate()?;
            self.next_expect(Token::CloseParen)?;
            return Ok(predicate);
        }

        let column = self.parse_column()?;
        let op = match self.next()? {
            Token::Equal => Operator::Equal,
            Token::NotEqual => Operator::NotEqual,
            Token::GreaterThan => Operator::GreaterThan,
            Token::GreaterThanOrEqual => Operator::GreaterThanOrEqual,
            Token::LessThan => Operator::LessThan,
            Token::LessThanOrEqual => Operator::LessThanOrEqual,
            Token::Keyword(Keyword::Like) => Operator::Like,
            Token::Keyword(Keyword::In) => Operator::In,
            Token::Keyword(Keyword::Not) => {
                self.next_expect(Token::Keyword(Keyword::In))?;
                Operator::NotIn
            }
            token => {
                return Err(self.malformed(format!("expected comparison operator, got {}", token)))
            }
        };

        let operand = match op {
            Operator::In | Operator::NotIn => Operand::List(self.parse_literal_list()?),
            _ => match self.peek()? {
                Some(Token::Ident(_)) => Operand::Column(self.parse_column()?),
                _ => Operand::Literal(self.parse_literal()?),
            },
        };
        if op == Operator::Like && !matches!(operand, Operand::Literal(Literal::String(_))) {
            return Err(self.malformed("LIKE expects a string pattern"));
        }
        Ok(Predicate::Compare {
            column,
            op,
            operand,
        })
    }

    /// Parses `(literal, literal, ...)` for IN lists
    fn parse_literal_list(&mut self) -> Result<Vec<Literal>> {
        self.next_expect(Token::OpenParen)?;
        let mut values = Vec::new();
        loop {
            values.push(self.parse_literal()?);
            match self.next()? {
                Token::CloseParen => break,
                Token::Comma => {}
                token => {
                    return Err(self.malformed(format!("unbalanced IN list near {}", token)));
                }
            }
        }
        Ok(values)
    }

    /// Parses a constant: number, optionally negative, string or NULL
    fn parse_literal(&mut self) -> Result<Literal> {
        Ok(match self.next()? {
            Token::Number(n) => self.parse_number(&n, false)?,
            Token::Minus => match self.next()? {
                Token::Number(n) => self.parse_number(&n, true)?,
                token => return Err(self.malformed(format!("expected number after -, got {}", token))),
            },
            Token::String(s) => Literal::String(s),
            Token::Keyword(Keyword::Null) => Literal::Null,
            token => return Err(self.malformed(format!("expected literal, got {}", token))),
        })
    }

    fn parse_number(&self, n: &str, negative: bool) -> Result<Literal> {
        let text = if negative { format!("-{}", n) } else { n.to_string() };
        // The lexer scans both 123 and 123.45 as Token::Number
        if n.chars().all(|c| c.is_ascii_digit()) {
            text.parse::<i64>()
                .map(Literal::Integer)
                .map_err(|e| self.malformed(format!("invalid integer {}: {}", text, e)))
        } else {
            text.parse::<f64>()
                .map(Literal::Float)
                .map_err(|e| self.malformed(format!("invalid number {}: {}", text, e)))
        }
    }

    /// Parses `GROUP BY col, ...`
    fn parse_group_by(&mut self) -> Result<Vec<ColumnRef>> {
        if self.next_if_token(Token::Keyword(Keyword::Group)).is_none() {
            return Ok(Vec::new());
        }
        self.clause = Clause::GroupBy;
        self.next_expect(Token::Keyword(Keyword::By))?;

        let mut columns = Vec::new();
        loop {
            columns.push(self.parse_column()?);
            if self.next_if_token(Token::Comma).is_none() {
                break;
            }
        }
        Ok(columns)
    }

    /// Parses `ORDER BY col [ASC|DESC]`
    fn parse_order_by(&mut self) -> Result<Option<(ColumnRef, OrderDirection)>> {
        if self.next_if_token(Token::Keyword(Keyword::Order)).is_none() {
            return Ok(None);
        }
        self.clause = Clause::OrderBy;
        self.next_expect(Token::Keyword(Keyword::By))?;

        let column = self.parse_column()?;
        let direction = if self.next_if_token(Token::Keyword(Keyword::Desc)).is_some() {
            OrderDirection::Desc
        } else {
            self.next_if_token(Token::Keyword(Keyword::Asc));
            OrderDirection::Asc
        };
        if self.next_if_token(Token::Comma).is_some() {
            return Err(self.malformed("only one ORDER BY column is supported"));
        }
        Ok(Some((column, direction)))
    }

    /// Parses `LIMIT n`
    fn parse_limit(&mut self) -> Result<Option<usize>> {
        if self.next_if_token(Token::Keyword(Keyword::Limit)).is_none() {
            return Ok(None);
        }
        self.clause = Clause::Limit;
        match self.next()? {
            Token::Number(n) => n
                .parse::<usize>()
                .map(Some)
                .map_err(|_| self.malformed(format!("LIMIT expects a non-negative integer, got {}", n))),
            token => Err(self.malformed(format!("LIMIT expects a non-negative integer, got {}", token))),
        }
    }

    /// Parses `col` or `qualifier.col`
    fn parse_column(&mut self) -> Result<ColumnRef> {
        let name = self.next_ident()?;
        self.parse_column_after(name)
    }

    /// Finishes a column reference whose first identifier is already consumed
    fn parse_column_after(&mut self, first: String) -> Result<ColumnRef> {
        if self.next_if_token(Token::Period).is_some() {
            return Ok(ColumnRef::qualified(first, self.next_ident()?));
        }
        Ok(ColumnRef::bare(first))
    }

    /// Builds a syntax error for the clause being parsed
    fn malformed(&self, message: impl Into<String>) -> Error {
        Error::malformed(self.clause, message)
    }

    /// Lexer failures are reported against the clause being parsed
    fn lex_error(&self, err: Error) -> Error {
        match err {
            Error::UnsupportedSyntax(msg) => self.malformed(msg),
            err => err,
        }
    }

    /// Peeks at the next token
    fn peek(&mut self) -> Result<Option<Token>> {
        let token = self.lexer.peek().cloned().transpose();
        token.map_err(|e| self.lex_error(e))
    }

    /// Consumes and returns the next token
    fn next(&mut self) -> Result<Token> {
        match self.lexer.next() {
            Some(Ok(token)) => Ok(token),
            Some(Err(err)) => Err(self.lex_error(err)),
            None => Err(self.malformed("unexpected end of input")),
        }
    }

    /// Expects and consumes an identifier
    fn next_ident(&mut self) -> Result<String> {
        match self.next()? {
            Token::Ident(ident) => Ok(ident),
            token => Err(self.malformed(format!("expected identifier, got {}", token))),
        }
    }

    /// Expects a specific token, returns error if different
    fn next_expect(&mut self, expect: Token) -> Result<()> {
        let token = self.next()?;
        if token != expect {
            return Err(self.malformed(format!("expected {}, got {}", expect, token)));
        }
        Ok(())
    }

    /// Consumes next token if it satisfies the predicate
    fn next_if<F: Fn(&Token) -> bool>(&mut self, predicate: F) -> Option<Token> {
        self.peek().unwrap_or(None).filter(|t| predicate(t))?;
        self.next().ok()
    }

    /// Consumes next token if it matches the given token
    fn next_if_token(&mut self, token: Token) -> Option<Token> {
        self.next_if(|t| t == &token)
    }
}

/// Rewrites every qualified column reference to the canonical binding of the
/// table it names. Only qualifiers naming a table in FROM/JOIN are accepted;
/// anything else is reported as an unknown column.
fn normalize_aliases(stmt: &mut Statement) -> Result<()> {
    let refs = stmt.tables().cloned().collect::<Vec<_>>();
    for (i, table) in refs.iter().enumerate() {
        if refs[..i].iter().any(|t| t.binding() == table.binding()) {
            let clause = if i == 0 { Clause::From } else { Clause::Join };
            return Err(Error::malformed(
                clause,
                format!("table reference {} is used twice, give it an alias", table.binding()),
            ));
        }
    }

    let resolve = |col: &mut ColumnRef| -> Result<()> {
        let Some(qualifier) = &col.table else {
            return Ok(());
        };
        let binding = refs
            .iter()
            .find(|t| t.binding() == qualifier.as_str())
            .or_else(|| {
                let mut by_name = refs.iter().filter(|t| t.name == *qualifier);
                match (by_name.next(), by_name.next()) {
                    (Some(t), None) => Some(t),
                    _ => None,
                }
            })
            .map(|t| t.binding().to_string())
            .ok_or_else(|| Error::UnknownColumn(col.to_string()))?;
        col.table = Some(binding);
        Ok(())
    };

    if let Projection::Items(items) = &mut stmt.projection {
        for item in items.iter_mut() {
            match item {
                SelectItem::Column(col, _) => resolve(col)?,
                SelectItem::Aggregate(AggregateCall { column: Some(col), .. }, _) => resolve(col)?,
                SelectItem::Aggregate(..) => {}
            }
        }
    }
    for join in stmt.joins.iter_mut() {
        resolve(&mut join.left)?;
        resolve(&mut join.right)?;
    }
    if let Some(predicate) = &mut stmt.predicate {
        let mut stack = vec![predicate];
        while let Some(node) = stack.pop() {
            match node {
                Predicate::Compare {
                    column, operand, ..
                } => {
                    resolve(column)?;
                    if let Operand::Column(other) = operand {
                        resolve(other)?;
                    }
                }
                Predicate::And(lhs, rhs) | Predicate::Or(lhs, rhs) => {
                    stack.push(lhs.as_mut());
                    stack.push(rhs.as_mut());
                }
            }
        }
    }
    for col in stmt.group_by.iter_mut() {
        resolve(col)?;
    }
    if let Some((col, _)) = &mut stmt.order_by {
        resolve(col)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Parser;
    use crate::{
        error::{Clause, Error, ErrorKind, Result},
        sql::parser::ast::{
            AggregateCall, AggregateFunc, ColumnRef, Join, JoinType, Literal, Operand, Operator,
            OrderDirection, Predicate, Projection, SelectItem, Statement, TableRef,
        },
    };

    fn compare(column: ColumnRef, op: Operator, operand: Operand) -> Predicate {
        Predicate::Compare {
            column,
            op,
            operand,
        }
    }

    #[test]
    fn test_parser_simple_select() -> Result<()> {
        let stmt = Parser::new("SELECT id, amount FROM orders WHERE status = 'success';").parse()?;
        assert_eq!(
            stmt,
            Statement {
                from: TableRef {
                    name: "orders".into(),
                    alias: None
                },
                joins: vec![],
                projection: Projection::Items(vec![
                    SelectItem::Column(ColumnRef::bare("id"), None),
                    SelectItem::Column(ColumnRef::bare("amount"), None),
                ]),
                predicate: Some(compare(
                    ColumnRef::bare("status"),
                    Operator::Equal,
                    Operand::Literal(Literal::String("success".into()))
                )),
                group_by: vec![],
                order_by: None,
                limit: None,
            }
        );

        // keywords are case-insensitive and the semicolon is optional
        let stmt2 = Parser::new("select ID, Amount from ORDERS where STATUS = 'success'").parse()?;
        assert_eq!(stmt, stmt2);
        Ok(())
    }

    #[test]
    fn test_parser_join_and_aliases() -> Result<()> {
        let stmt = Parser::new(
            "SELECT o.id, p.status AS partner_status FROM orders AS o \
             LEFT OUTER JOIN payments p ON o.id = p.order_id \
             WHERE o.amount >= -10.5 ORDER BY o.id DESC LIMIT 5",
        )
        .parse()?;

        assert_eq!(stmt.from.binding(), "o");
        assert_eq!(
            stmt.joins,
            vec![Join {
                join_type: JoinType::Left,
                table: TableRef {
                    name: "payments".into(),
                    alias: Some("p".into())
                },
                left: ColumnRef::qualified("o", "id"),
                right: ColumnRef::qualified("p", "order_id"),
            }]
        );
        assert_eq!(
            stmt.projection,
            Projection::Items(vec![
                SelectItem::Column(ColumnRef::qualified("o", "id"), None),
                SelectItem::Column(ColumnRef::qualified("p", "status"), Some("partner_status".into())),
            ])
        );
        assert_eq!(
            stmt.predicate,
            Some(compare(
                ColumnRef::qualified("o", "amount"),
                Operator::GreaterThanOrEqual,
                Operand::Literal(Literal::Float(-10.5))
            ))
        );
        assert_eq!(stmt.order_by, Some((ColumnRef::qualified("o", "id"), OrderDirection::Desc)));
        assert_eq!(stmt.limit, Some(5));
        Ok(())
    }

    #[test]
    fn test_parser_qualifier_by_table_name() -> Result<()> {
        let stmt = Parser::new("SELECT orders.id FROM orders JOIN payments ON orders.id = payments.order_id").parse()?;
        assert_eq!(stmt.joins[0].join_type, JoinType::Inner);
        assert_eq!(stmt.joins[0].right, ColumnRef::qualified("payments", "order_id"));

        // unknown qualifiers are never silently stripped
        let err = Parser::new("SELECT x.id FROM orders o").parse().unwrap_err();
        assert_eq!(err, Error::UnknownColumn("x.id".into()));

        // qualified-looking literals are left alone
        let stmt = Parser::new("SELECT id FROM orders o WHERE o.created = '2025.01'").parse()?;
        assert_eq!(
            stmt.predicate,
            Some(compare(
                ColumnRef::qualified("o", "created"),
                Operator::Equal,
                Operand::Literal(Literal::String("2025.01".into()))
            ))
        );
        Ok(())
    }

    #[test]
    fn test_parser_predicates_left_to_right() -> Result<()> {
        let stmt = Parser::new("SELECT * FROM t WHERE a = 1 OR b = 2 AND c IN ('x', 'y')").parse()?;
        let a = compare(ColumnRef::bare("a"), Operator::Equal, Operand::Literal(Literal::Integer(1)));
        let b = compare(ColumnRef::bare("b"), Operator::Equal, Operand::Literal(Literal::Integer(2)));
        let c = compare(
            ColumnRef::bare("c"),
            Operator::In,
            Operand::List(vec![Literal::String("x".into()), Literal::String("y".into())]),
        );
        assert_eq!(
            stmt.predicate,
            Some(Predicate::And(
                Box::new(Predicate::Or(Box::new(a.clone()), Box::new(b.clone()))),
                Box::new(c.clone())
            ))
        );

        let stmt = Parser::new("SELECT * FROM t WHERE a = 1 OR (b = 2 AND c IN ('x', 'y'))").parse()?;
        assert_eq!(
            stmt.predicate,
            Some(Predicate::Or(
                Box::new(a),
                Box::new(Predicate::And(Box::new(b), Box::new(c)))
            ))
        );

        let stmt = Parser::new("SELECT * FROM t WHERE s NOT IN (1, NULL) AND d LIKE 'abc' AND x <> y").parse()?;
        let Some(Predicate::And(lhs, rhs)) = stmt.predicate else {
            panic!("expected AND");
        };
        assert_eq!(
            *rhs,
            compare(ColumnRef::bare("x"), Operator::NotEqual, Operand::Column(ColumnRef::bare("y")))
        );
        assert!(matches!(*lhs, Predicate::And(..)));
        Ok(())
    }

    #[test]
    fn test_parser_group_by_aggregates() -> Result<()> {
        let stmt = Parser::new(
            "SELECT status, COUNT(*) AS n, sum(o.amount) FROM orders o GROUP BY o.status ORDER BY n",
        )
        .parse()?;
        assert_eq!(
            stmt.projection,
            Projection::Items(vec![
                SelectItem::Column(ColumnRef::bare("status"), None),
                SelectItem::Aggregate(
                    AggregateCall {
                        func: AggregateFunc::Count,
                        column: None
                    },
                    Some("n".into())
                ),
                SelectItem::Aggregate(
                    AggregateCall {
                        func: AggregateFunc::Sum,
                        column: Some(ColumnRef::qualified("o", "amount"))
                    },
                    None
                ),
            ])
        );
        assert_eq!(stmt.group_by, vec![ColumnRef::qualified("o", "status")]);
        assert_eq!(stmt.order_by, Some((ColumnRef::bare("n"), OrderDirection::Asc)));
        Ok(())
    }

    #[test]
    fn test_parser_rejects_mutations() {
        for sql in [
            "UPDATE orders SET status = 'x'",
            "insert into orders values (1)",
            "DELETE FROM orders WHERE id = 1",
            "drop table orders",
            "CREATE TABLE t (a int)",
            "ALTER TABLE orders ADD c int",
            "truncate orders",
            // syntax after the keyword does not matter
            "DELETE ### garbage '",
            "SELECT * FROM orders; DROP TABLE orders",
        ] {
            let err = Parser::new(sql).parse().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::PermissionDenied, "{}", sql);
        }
    }

    #[test]
    fn test_parser_errors() {
        let cases = [
            ("", ErrorKind::UnsupportedSyntax),
            ("WITH x AS (SELECT 1) SELECT * FROM x", ErrorKind::UnsupportedSyntax),
            ("SELECT * FROM a; SELECT * FROM b", ErrorKind::UnsupportedSyntax),
            ("SELECT * FROM t HAVING x", ErrorKind::UnsupportedSyntax),
            ("SELECT id", ErrorKind::MalformedClause),
            ("SELECT * FROM t WHERE a IN (1, 2", ErrorKind::MalformedClause),
            ("SELECT * FROM t WHERE a LIKE 5", ErrorKind::MalformedClause),
            ("SELECT * FROM t LIMIT -1", ErrorKind::MalformedClause),
            ("SELECT * FROM t o JOIN t o ON o.a = o.b", ErrorKind::MalformedClause),
        ];
        for (sql, kind) in cases {
            let err = Parser::new(sql).parse().unwrap_err();
            assert_eq!(err.kind(), kind, "{}: {}", sql, err);
        }

        assert!(matches!(
            Parser::new("SELECT id FROM").parse(),
            Err(Error::MalformedClause { clause: Clause::From, .. })
        ));
        assert!(matches!(
            Parser::new("SELECT id, FROM t").parse(),
            Err(Error::MalformedClause { clause: Clause::Select, .. })
        ));
        assert!(matches!(
            Parser::new("SELECT * FROM a RIGHT JOIN b ON a.x = b.x").parse(),
            Err(Error::MalformedClause { clause: Clause::Join, .. })
        ));
        assert!(matches!(
            Parser::new("SELECT * FROM a JOIN b ON a.x = b.x AND a.y = b.y").parse(),
            Err(Error::MalformedClause { clause: Clause::Join, .. })
        ));
        assert!(matches!(
            Parser::new("SELECT * FROM a ORDER BY x, y").parse(),
            Err(Error::MalformedClause { clause: Clause::OrderBy, .. })
        ));
        assert!(matches!(
            Parser::new("SELECT * FROM a WHERE x = 'open").parse(),
            Err(Error::MalformedClause { clause: Clause::Where, .. })
        ));
    }
}
