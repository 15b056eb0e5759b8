//! Fitness queries for filtering the record pool.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Record;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CompareOp {
    #[inline]
    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            CompareOp::Lt => lhs < rhs,
            CompareOp::Le => lhs <= rhs,
            CompareOp::Gt => lhs > rhs,
            CompareOp::Ge => lhs >= rhs,
            CompareOp::Eq => lhs == rhs,
            CompareOp::Ne => lhs != rhs,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
        }
    }
}

/// Two-character operators come first so `<=` is not read as `<`.
const OPERATORS: [(&str, CompareOp); 6] = [
    ("<=", CompareOp::Le),
    (">=", CompareOp::Ge),
    ("==", CompareOp::Eq),
    ("!=", CompareOp::Ne),
    ("<", CompareOp::Lt),
    (">", CompareOp::Gt),
];

/// Boolean predicate over records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FitnessQuery {
    /// Matches every record.
    #[default]
    All,
    /// Compare one field against a constant. Records lacking the field never match.
    Compare {
        field: String,
        op: CompareOp,
        value: f64,
    },
    And {
        queries: Vec<FitnessQuery>,
    },
    Or {
        queries: Vec<FitnessQuery>,
    },
    Not {
        query: Box<FitnessQuery>,
    },
}

impl FitnessQuery {
    pub fn compare(field: impl Into<String>, op: CompareOp, value: f64) -> Self {
        Self::Compare {
            field: field.into(),
            op,
            value,
        }
    }

    /// Evaluate the predicate.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            FitnessQuery::All => true,
            FitnessQuery::Compare { field, op, value } => record
                .get(field)
                .is_some_and(|actual| op.apply(actual, *value)),
            FitnessQuery::And { queries } => queries.iter().all(|q| q.matches(record)),
            FitnessQuery::Or { queries } => queries.iter().any(|q| q.matches(record)),
            FitnessQuery::Not { query } => !query.matches(record),
        }
    }
}

/// Compact text form accepted back by `FromStr`.
impl fmt::Display for FitnessQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitnessQuery::All => write!(f, "*"),
            FitnessQuery::Compare { field, op, value } => {
                write!(f, "{}{}{}", field, op.symbol(), value)
            }
            FitnessQuery::And { queries } if queries.is_empty() => write!(f, "*"),
            FitnessQuery::Or { queries } if queries.is_empty() => write!(f, "!*"),
            FitnessQuery::And { queries } => write_joined(f, queries, " && "),
            FitnessQuery::Or { queries } => write_joined(f, queries, " || "),
            FitnessQuery::Not { query } => write!(f, "!({})", query),
        }
    }
}

/// Nested combinators are parenthesized so the grouping survives a reparse.
fn write_joined(f: &mut fmt::Formatter<'_>, queries: &[FitnessQuery], sep: &str) -> fmt::Result {
    for (i, q) in queries.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", sep)?;
        }
        match q {
            FitnessQuery::And { .. } | FitnessQuery::Or { .. } => write!(f, "({})", q)?,
            _ => write!(f, "{}", q)?,
        }
    }
    Ok(())
}

/// Query parse errors.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum QueryParseError {
    #[error("No comparison operator in '{0}'")]
    MissingOperator(String),
    #[error("Empty field name in '{0}'")]
    EmptyField(String),
    #[error("Invalid number '{value}' in '{clause}'")]
    InvalidNumber { clause: String, value: String },
    #[error("Unbalanced parentheses in '{0}'")]
    Unbalanced(String),
}

/// Parses compact text such as `step<59`, `step<59 && height>=2.5` or
/// `!(step==1) || (a<1 && b>2)`. `&&` binds tighter than `||`.
/// An empty string or `*` matches everything.
impl FromStr for FitnessQuery {
    type Err = QueryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(FitnessQuery::All);
        }

        let mut parser = Parser { src: s, pos: 0 };
        let query = parser.parse_or()?;
        parser.skip_ws();
        if parser.pos != s.len() {
            return Err(QueryParseError::Unbalanced(s.to_string()));
        }
        Ok(query)
    }
}

/// Recursive-descent parser over the query text.
struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_ws(&mut self) {
        self.pos = self.src.len() - self.rest().trim_start().len();
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn parse_or(&mut self) -> Result<FitnessQuery, QueryParseError> {
        let mut queries = vec![self.parse_and()?];
        while self.eat("||") {
            queries.push(self.parse_and()?);
        }
        Ok(combine(queries, |queries| FitnessQuery::Or { queries }))
    }

    fn parse_and(&mut self) -> Result<FitnessQuery, QueryParseError> {
        let mut queries = vec![self.parse_unary()?];
        while self.eat("&&") {
            queries.push(self.parse_unary()?);
        }
        Ok(combine(queries, |queries| FitnessQuery::And { queries }))
    }

    fn parse_unary(&mut self) -> Result<FitnessQuery, QueryParseError> {
        self.skip_ws();
        let rest = self.rest();

        if rest.starts_with('!') && !rest.starts_with("!=") {
            self.pos += 1;
            let query = self.parse_unary()?;
            return Ok(FitnessQuery::Not {
                query: Box::new(query),
            });
        }

        if self.eat("(") {
            let inner = self.parse_or()?;
            if !self.eat(")") {
                return Err(QueryParseError::Unbalanced(self.src.to_string()));
            }
            return Ok(inner);
        }

        let end = ["&&", "||", "(", ")"]
            .iter()
            .filter_map(|token| rest.find(token))
            .min()
            .unwrap_or(rest.len());
        self.pos += end;

        let atom = rest[..end].trim();
        if atom == "*" {
            Ok(FitnessQuery::All)
        } else {
            parse_comparison(atom)
        }
    }
}

fn combine(
    mut queries: Vec<FitnessQuery>,
    build: impl FnOnce(Vec<FitnessQuery>) -> FitnessQuery,
) -> FitnessQuery {
    if queries.len() == 1 {
        queries.remove(0)
    } else {
        build(queries)
    }
}

fn parse_comparison(clause: &str) -> Result<FitnessQuery, QueryParseError> {
    let clause = clause.trim();
    let (pos, token, op) = OPERATORS
        .iter()
        .find_map(|(token, op)| clause.find(token).map(|pos| (pos, *token, *op)))
        .ok_or_else(|| QueryParseError::MissingOperator(clause.to_string()))?;

    let field = clause[..pos].trim();
    if field.is_empty() {
        return Err(QueryParseError::EmptyField(clause.to_string()));
    }

    let raw = clause[pos + token.len()..].trim();
    let value = raw
        .parse::<f64>()
        .map_err(|_| QueryParseError::InvalidNumber {
            clause: clause.to_string(),
            value: raw.to_string(),
        })?;

    Ok(FitnessQuery::compare(field, op, value))
}
