//! Dotted-key operator grammar.
//!
//! A raw key either names a field path (`due_date`, `assignee.first_name`)
//! or carries an operator suffix after its last dot (`due_date.gte`). The
//! suffix is only treated as an operator when it belongs to the allowed set;
//! otherwise the whole key is the field path. A field that happens to share
//! its name with an operator token therefore cannot be disambiguated when no
//! operator is intended.

use crate::query::schema::TypeClass;

/// Comparison operators accepted by the filter grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Not,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
    NotLike,
    ILike,
}

/// Operators recognized by the request parser. `iLike` is deliberately
/// absent: it is reserved for callers of the where-builder.
pub const PARSER_OPERATORS: &[Operator] = &[
    Operator::Eq,
    Operator::Not,
    Operator::Lt,
    Operator::Lte,
    Operator::Gt,
    Operator::Gte,
    Operator::Like,
    Operator::NotLike,
];

/// Full operator set understood by the where-builder.
pub const WHERE_OPERATORS: &[Operator] = &[
    Operator::Eq,
    Operator::Not,
    Operator::Lt,
    Operator::Lte,
    Operator::Gt,
    Operator::Gte,
    Operator::Like,
    Operator::NotLike,
    Operator::ILike,
];

impl Operator {
    /// Parse one suffix token, e.g. `gte` or `notLike`.
    pub fn parse(token: &str) -> Option<Operator> {
        match token {
            "eq" => Some(Operator::Eq),
            "not" => Some(Operator::Not),
            "lt" => Some(Operator::Lt),
            "lte" => Some(Operator::Lte),
            "gt" => Some(Operator::Gt),
            "gte" => Some(Operator::Gte),
            "like" => Some(Operator::Like),
            "notLike" => Some(Operator::NotLike),
            "iLike" => Some(Operator::ILike),
            _ => None,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Not => "not",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Like => "like",
            Operator::NotLike => "notLike",
            Operator::ILike => "iLike",
        }
    }

    /// SQL rendering of the operator.
    pub fn sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Not => "<>",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::ILike => "ILIKE",
        }
    }

    /// Whether the operator is legal for a field of the given declared type.
    /// Text fields take equality and pattern operators only; number and date
    /// fields additionally take the range operators.
    pub fn legal_for(&self, class: TypeClass) -> bool {
        match class {
            TypeClass::Text => matches!(
                self,
                Operator::Eq | Operator::Not | Operator::Like | Operator::NotLike
            ),
            TypeClass::Number | TypeClass::Date => matches!(
                self,
                Operator::Eq
                    | Operator::Not
                    | Operator::Lt
                    | Operator::Lte
                    | Operator::Gt
                    | Operator::Gte
                    | Operator::Like
                    | Operator::NotLike
            ),
        }
    }

    pub fn is_pattern(&self) -> bool {
        matches!(self, Operator::Like | Operator::NotLike | Operator::ILike)
    }
}

/// Split a raw key into its field path and optional operator suffix. The
/// operator, if any, is the token after the last `.` and must be a member of
/// `allowed`.
pub fn split_key<'k>(key: &'k str, allowed: &[Operator]) -> (&'k str, Option<Operator>) {
    if let Some((field, suffix)) = key.rsplit_once('.') {
        if let Some(op) = Operator::parse(suffix) {
            if allowed.contains(&op) {
                return (field, Some(op));
            }
        }
    }
    (key, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_operator_suffix() {
        assert_eq!(split_key("due_date.gte", WHERE_OPERATORS), ("due_date", Some(Operator::Gte)));
        assert_eq!(split_key("title", WHERE_OPERATORS), ("title", None));
    }

    #[test]
    fn unknown_suffix_is_part_of_the_field() {
        assert_eq!(split_key("stats.total", WHERE_OPERATORS), ("stats.total", None));
    }

    #[test]
    fn nested_path_keeps_relation_prefix() {
        let (field, op) = split_key("assignee.first_name.not", WHERE_OPERATORS);
        assert_eq!(field, "assignee.first_name");
        assert_eq!(op, Some(Operator::Not));
    }

    #[test]
    fn ilike_is_where_builder_only() {
        assert_eq!(split_key("title.iLike", PARSER_OPERATORS), ("title.iLike", None));
        assert_eq!(split_key("title.iLike", WHERE_OPERATORS), ("title", Some(Operator::ILike)));
    }

    #[test]
    fn range_operators_are_type_gated() {
        assert!(!Operator::Gt.legal_for(TypeClass::Text));
        assert!(Operator::Gt.legal_for(TypeClass::Number));
        assert!(Operator::Like.legal_for(TypeClass::Date));
    }
}
