//! Inlines positional parameters as SQL literals for drivers without bound parameters.

use super::value::SqlValue;
use crate::error::DbError;
use std::fmt::Write as _;

const PLACEHOLDER: char = '?';

impl SqlValue {
    /// Renders the value as a SQL literal.
    pub fn to_literal(&self) -> String {
        let mut out = String::new();
        self.write_literal(&mut out);
        out
    }

    fn write_literal(&self, out: &mut String) {
        match self {
            SqlValue::Null => out.push_str("NULL"),
            SqlValue::Integer(v) => {
                let _ = write!(out, "{v}");
            }
            SqlValue::Real(v) if v.is_finite() => {
                let _ = write!(out, "{v}");
            }
            SqlValue::Real(_) => out.push_str("NULL"),
            SqlValue::Bool(v) => out.push(if *v { '1' } else { '0' }),
            SqlValue::Text(s) => {
                out.push('\'');
                for ch in s.chars() {
                    if ch == '\'' {
                        out.push('\'');
                    }
                    out.push(ch);
                }
                out.push('\'');
            }
        }
    }
}

/// Replaces each `?` left to right with the next parameter's literal.
///
/// The replacement is purely textual; the number of `?` occurrences must equal `params.len()`.
pub fn inline_params(sql: &str, params: &[SqlValue]) -> Result<String, DbError> {
    let expected = sql.matches(PLACEHOLDER).count();
    if expected != params.len() {
        return Err(DbError::ParameterCount {
            expected,
            supplied: params.len(),
        });
    }
    if expected == 0 {
        return Ok(sql.to_string());
    }

    let mut out = String::with_capacity(sql.len() + params.len() * 8);
    let mut params = params.iter();
    for ch in sql.chars() {
        if ch != PLACEHOLDER {
            out.push(ch);
        } else if let Some(param) = params.next() {
            param.write_literal(&mut out);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_embedded_quotes() {
        let sql = inline_params(
            "SELECT * FROM skills WHERE category = ?",
            &[SqlValue::from("Back'end")],
        )
        .unwrap();
        assert_eq!(sql, "SELECT * FROM skills WHERE category = 'Back''end'");
    }

    #[test]
    fn renders_each_value_kind() {
        let sql = inline_params(
            "INSERT INTO projects (title, featured, image_url, id, score) VALUES (?, ?, ?, ?, ?)",
            &[
                SqlValue::from("Folio"),
                SqlValue::from(true),
                SqlValue::from(None::<String>),
                SqlValue::from(42_i64),
                SqlValue::from(4.5),
            ],
        )
        .unwrap();
        assert_eq!(
            sql,
            "INSERT INTO projects (title, featured, image_url, id, score) VALUES ('Folio', 1, NULL, 42, 4.5)"
        );
        assert_eq!(SqlValue::from(false).to_literal(), "0");
        assert_eq!(SqlValue::from(-7).to_literal(), "-7");
        assert_eq!(SqlValue::Real(f64::NAN).to_literal(), "NULL");
    }

    #[test]
    fn consumes_parameters_in_order() {
        let sql = inline_params(
            "SELECT * FROM contact_submissions WHERE status = ? LIMIT ? OFFSET ?",
            &["unread".into(), 10.into(), 20.into()],
        )
        .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM contact_submissions WHERE status = 'unread' LIMIT 10 OFFSET 20"
        );
    }

    #[test]
    fn rejects_mismatched_parameter_count() {
        let err = inline_params("DELETE FROM skills WHERE id = ?", &[]).unwrap_err();
        assert!(matches!(
            err,
            DbError::ParameterCount {
                expected: 1,
                supplied: 0
            }
        ));

        let err = inline_params("SELECT 1", &[1.into()]).unwrap_err();
        assert!(matches!(
            err,
            DbError::ParameterCount {
                expected: 0,
                supplied: 1
            }
        ));
    }

    #[test]
    fn injection_attempt_stays_inside_the_literal() {
        let sql = inline_params(
            "SELECT * FROM profile WHERE email = ?",
            &["x' OR '1'='1".into()],
        )
        .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM profile WHERE email = 'x'' OR ''1''=''1'"
        );
    }
}
