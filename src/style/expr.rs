//! Filter and paint expression trees.
//!
//! Style expressions arrive as nested JSON arrays (`["==", ["get", "type"], "x"]`).
//! They are parsed into a small tagged tree so callers can inspect them by
//! node kind instead of by array position. Parsing is total: anything that
//! is not recognised becomes a [`Expr::Call`] or [`Expr::Literal`], and
//! [`Expr::to_value`] reproduces the input exactly.

use serde_json::Value;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl ComparisonOp {
    fn parse(op: &str) -> Option<Self> {
        match op {
            "==" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// Boolean combinators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    All,
    Any,
    None,
    Not,
}

impl BooleanOp {
    fn parse(op: &str) -> Option<Self> {
        match op {
            "all" => Some(Self::All),
            "any" => Some(Self::Any),
            "none" => Some(Self::None),
            "!" => Some(Self::Not),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Any => "any",
            Self::None => "none",
            Self::Not => "!",
        }
    }
}

/// One `label, output` pair of a `match` expression.
///
/// Labels are a literal or an array of literals and are never parsed as
/// expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchArm {
    pub labels: Value,
    pub output: Expr,
}

impl MatchArm {
    pub fn contains_label(&self, value: &str) -> bool {
        match &self.labels {
            Value::Array(labels) => labels.iter().any(|l| l.as_str() == Some(value)),
            label => label.as_str() == Some(value),
        }
    }
}

/// A parsed style expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Scalars, objects, `["literal", ..]` wrappers and headless arrays.
    Literal(Value),
    /// `["get", property]`
    Get(String),
    Comparison {
        op: ComparisonOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Boolean {
        op: BooleanOp,
        operands: Vec<Expr>,
    },
    /// `["match", input, label, output, ..., fallback]`
    Match {
        input: Box<Expr>,
        arms: Vec<MatchArm>,
        fallback: Box<Expr>,
    },
    /// Any other operator.
    Call { op: String, args: Vec<Expr> },
}

impl Expr {
    pub fn get(property: impl Into<String>) -> Self {
        Expr::Get(property.into())
    }

    pub fn compare(op: ComparisonOp, left: Expr, right: Expr) -> Self {
        Expr::Comparison {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn from_value(value: &Value) -> Self {
        let Value::Array(items) = value else {
            return Expr::Literal(value.clone());
        };
        let Some((Value::String(op), args)) = items.split_first() else {
            return Expr::Literal(value.clone());
        };

        if op == "literal" {
            return Expr::Literal(value.clone());
        }

        if op == "get" {
            if let [Value::String(property)] = args {
                return Expr::Get(property.clone());
            }
        }

        if let Some(cmp) = ComparisonOp::parse(op) {
            if let [left, right] = args {
                return Expr::compare(cmp, Expr::from_value(left), Expr::from_value(right));
            }
        }

        if let Some(bool_op) = BooleanOp::parse(op) {
            return Expr::Boolean {
                op: bool_op,
                operands: args.iter().map(Expr::from_value).collect(),
            };
        }

        if op == "match" {
            if let Some(expr) = Self::parse_match(args) {
                return expr;
            }
        }

        Expr::Call {
            op: op.clone(),
            args: args.iter().map(Expr::from_value).collect(),
        }
    }

    fn parse_match(args: &[Value]) -> Option<Expr> {
        // input, at least one arm, fallback
        if args.len() < 4 || args.len() % 2 != 0 {
            return None;
        }
        let (input, rest) = args.split_first()?;
        let (fallback, pairs) = rest.split_last()?;
        let arms = pairs
            .chunks_exact(2)
            .map(|pair| MatchArm {
                labels: pair[0].clone(),
                output: Expr::from_value(&pair[1]),
            })
            .collect();
        Some(Expr::Match {
            input: Box::new(Expr::from_value(input)),
            arms,
            fallback: Box::new(Expr::from_value(fallback)),
        })
    }

    pub fn to_value(&self) -> Value {
        match self {
            Expr::Literal(value) => value.clone(),
            Expr::Get(property) => Value::Array(vec!["get".into(), property.as_str().into()]),
            Expr::Comparison { op, left, right } => {
                Value::Array(vec![op.as_str().into(), left.to_value(), right.to_value()])
            }
            Expr::Boolean { op, operands } => {
                let mut items = Vec::with_capacity(operands.len() + 1);
                items.push(op.as_str().into());
                items.extend(operands.iter().map(Expr::to_value));
                Value::Array(items)
            }
            Expr::Match {
                input,
                arms,
                fallback,
            } => {
                let mut items = Vec::with_capacity(arms.len() * 2 + 3);
                items.push("match".into());
                items.push(input.to_value());
                for arm in arms {
                    items.push(arm.labels.clone());
                    items.push(arm.output.to_value());
                }
                items.push(fallback.to_value());
                Value::Array(items)
            }
            Expr::Call { op, args } => {
                let mut items = Vec::with_capacity(args.len() + 1);
                items.push(op.as_str().into());
                items.extend(args.iter().map(Expr::to_value));
                Value::Array(items)
            }
        }
    }

    /// Operator name for array expressions.
    pub fn operator(&self) -> Option<&str> {
        match self {
            Expr::Literal(_) => None,
            Expr::Get(_) => Some("get"),
            Expr::Comparison { op, .. } => Some(op.as_str()),
            Expr::Boolean { op, .. } => Some(op.as_str()),
            Expr::Match { .. } => Some("match"),
            Expr::Call { op, .. } => Some(op.as_str()),
        }
    }

    /// `<=` / `>=` clauses, the shape the year window is written in.
    pub fn is_range_bound(&self) -> bool {
        matches!(self.operator(), Some("<=") | Some(">="))
    }

    /// Reads a feature property reference, accepting both the expression
    /// form `["get", p]` and the legacy bare-string form.
    fn property_ref(&self) -> Option<&str> {
        match self {
            Expr::Get(property) => Some(property.as_str()),
            Expr::Literal(Value::String(property)) => Some(property.as_str()),
            _ => None,
        }
    }

    /// Returns true if this tree requires feature `property` to equal `value`.
    ///
    /// Recognises equality comparisons in either operand order and `match`
    /// expressions whose first arm lists `value`. Descends through `all` and
    /// `any` only; negated branches never count as an assertion.
    pub fn asserts_property(&self, property: &str, value: &str) -> bool {
        match self {
            Expr::Comparison {
                op: ComparisonOp::Eq,
                left,
                right,
            } => {
                let hit = |prop: &Expr, lit: &Expr| {
                    prop.property_ref() == Some(property)
                        && matches!(lit, Expr::Literal(Value::String(s)) if s == value)
                };
                // A legacy `["==", "type", "x"]` is only read left-to-right.
                hit(left.as_ref(), right.as_ref())
                    || (matches!(**right, Expr::Get(_)) && hit(right.as_ref(), left.as_ref()))
            }
            Expr::Match { input, arms, .. } => {
                matches!(&**input, Expr::Get(p) if p == property)
                    && arms.first().is_some_and(|arm| arm.contains_label(value))
            }
            Expr::Boolean {
                op: BooleanOp::All | BooleanOp::Any,
                operands,
            } => {
                let found = operands.iter().any(|e| e.asserts_property(property, value));
                if found {
                    log::trace!("expr: found {} == {:?} clause", property, value);
                }
                found
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_structure() {
        let value = json!([
            "all",
            ["<=", ["get", "firstyear"], 1900],
            ["==", ["get", "type"], "residential"]
        ]);
        let Expr::Boolean { op, operands } = Expr::from_value(&value) else {
            panic!("expected boolean node");
        };
        assert_eq!(op, BooleanOp::All);
        assert_eq!(operands.len(), 2);
        assert!(operands[0].is_range_bound());
        assert_eq!(
            operands[1],
            Expr::compare(ComparisonOp::Eq, Expr::get("type"), Expr::literal("residential"))
        );
    }

    #[test]
    fn test_round_trip_is_exact() {
        let cases = [
            json!(["all", ["==", ["get", "type"], "x"], ["!", ["has", "name"]]]),
            json!(["match", ["get", "type"], ["a", "b"], true, "c", true, false]),
            json!(["in", ["get", "type"], ["literal", ["a", "b"]]]),
            json!(["==", ["get", "type"], "x", ["collator", {"case-sensitive": false}]]),
            json!([
                "case",
                ["boolean", ["feature-state", "hover"], false],
                "#fff",
                "hsl(0, 0%, 50%)"
            ]),
            json!([1, 2, 3]),
            json!("#123456"),
        ];
        for value in cases {
            assert_eq!(Expr::from_value(&value).to_value(), value);
        }
    }

    #[test]
    fn test_literal_arguments_are_not_parsed() {
        let value = json!(["literal", ["get", "type"]]);
        assert_eq!(Expr::from_value(&value), Expr::Literal(value.clone()));
    }

    #[test]
    fn test_asserts_property_forms() {
        let yes = [
            json!(["==", ["get", "type"], "residential"]),
            json!(["==", "residential", ["get", "type"]]),
            json!(["==", "type", "residential"]),
            json!(["match", ["get", "type"], ["residential", "mixed"], true, false]),
            json!([
                "all",
                ["<=", ["get", "firstyear"], 1950],
                ["==", ["get", "type"], "residential"]
            ]),
            json!([
                "any",
                ["==", ["get", "type"], "residential"],
                ["==", ["get", "type"], "mixed"]
            ]),
        ];
        for value in yes {
            assert!(
                Expr::from_value(&value).asserts_property("type", "residential"),
                "{value}"
            );
        }

        let no = [
            json!(["==", ["get", "type"], "commercial"]),
            json!(["!=", ["get", "type"], "residential"]),
            json!(["!", ["==", ["get", "type"], "residential"]]),
            json!(["none", ["==", ["get", "type"], "residential"]]),
            json!(["==", ["get", "kind"], "residential"]),
            json!(["match", ["get", "type"], "commercial", true, "residential", false, false]),
            json!(["all", ["<=", ["get", "firstyear"], 1950]]),
            json!(true),
        ];
        for value in no {
            assert!(
                !Expr::from_value(&value).asserts_property("type", "residential"),
                "{value}"
            );
        }
    }
}
