//! Positional placeholder rewriting.
//!
//! Statements reach drivers with `?` placeholders. PostgreSQL wants `$1`,
//! SQL Server wants `@P1`. Question marks inside quoted strings, quoted
//! identifiers and comments are left alone.
//!
//! Statements without parameters are not rewritten, so a `?` typed by the
//! user (the jsonb key operator, say) reaches the server unchanged.

use std::borrow::Cow;

use crate::services::database::traits::Value;

/// `to_dollar` when `params` is non-empty, otherwise `sql` as is.
pub fn dollar_params<'a>(sql: &'a str, params: &[Value]) -> Cow<'a, str> {
    if params.is_empty() {
        Cow::Borrowed(sql)
    } else {
        Cow::Owned(to_dollar(sql))
    }
}

/// `to_at_p` when `params` is non-empty, otherwise `sql` as is.
pub fn at_p_params<'a>(sql: &'a str, params: &[Value]) -> Cow<'a, str> {
    if params.is_empty() {
        Cow::Borrowed(sql)
    } else {
        Cow::Owned(to_at_p(sql))
    }
}

/// Rewrite `?` to `$1`, `$2`, ...
pub fn to_dollar(sql: &str) -> String {
    rewrite(sql, |n| format!("${n}"))
}

/// Rewrite `?` to `@P1`, `@P2`, ...
pub fn to_at_p(sql: &str) -> String {
    rewrite(sql, |n| format!("@P{n}"))
}

fn rewrite(sql: &str, placeholder: impl Fn(usize) -> String) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut chars = sql.chars().peekable();
    let mut n = 0;

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' | '`' | '[' => {
                let close = if c == '[' { ']' } else { c };
                out.push(c);
                while let Some(inner) = chars.next() {
                    out.push(inner);
                    if inner == close {
                        // doubled quote is an escape, stay inside
                        if close != ']' && chars.peek() == Some(&close) {
                            if let Some(escaped) = chars.next() {
                                out.push(escaped);
                            }
                            continue;
                        }
                        break;
                    }
                }
            }
            '-' if chars.peek() == Some(&'-') => {
                out.push(c);
                for inner in chars.by_ref() {
                    out.push(inner);
                    if inner == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                out.push(c);
                let mut prev = '\0';
                for inner in chars.by_ref() {
                    out.push(inner);
                    if prev == '*' && inner == '/' {
                        break;
                    }
                    prev = inner;
                }
            }
            '?' => {
                n += 1;
                out.push_str(&placeholder(n));
            }
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_dollar() {
        assert_eq!(
            to_dollar("UPDATE t SET a=?,b=? WHERE id=?"),
            "UPDATE t SET a=$1,b=$2 WHERE id=$3"
        );
        assert_eq!(to_dollar("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn test_to_at_p() {
        assert_eq!(
            to_at_p("INSERT INTO t (a,b) VALUES (?,?)"),
            "INSERT INTO t (a,b) VALUES (@P1,@P2)"
        );
    }

    #[test]
    fn test_quoted_text_untouched() {
        assert_eq!(
            to_dollar("SELECT '?', \"a?\", 'it''s ?' FROM t WHERE x = ?"),
            "SELECT '?', \"a?\", 'it''s ?' FROM t WHERE x = $1"
        );
        assert_eq!(to_at_p("SELECT [what?] FROM t WHERE a=?"), "SELECT [what?] FROM t WHERE a=@P1");
    }

    #[test]
    fn test_unparameterized_sql_passes_through() {
        let jsonb = "SELECT id FROM docs WHERE body ? 'k' AND tags ?| array['a']";
        assert_eq!(dollar_params(jsonb, &[]), jsonb);
        assert!(matches!(dollar_params(jsonb, &[]), Cow::Borrowed(_)));
        assert_eq!(at_p_params("SELECT '?' AS q, ? AS p", &[]), "SELECT '?' AS q, ? AS p");

        let bound = [Value::Int64(1)];
        assert_eq!(
            dollar_params("SELECT * FROM t WHERE id = ?", &bound),
            "SELECT * FROM t WHERE id = $1"
        );
        assert_eq!(
            at_p_params("SELECT * FROM t WHERE id = ?", &bound),
            "SELECT * FROM t WHERE id = @P1"
        );
    }

    #[test]
    fn test_comments_untouched() {
        assert_eq!(
            to_dollar("SELECT a -- why?\nFROM t /* ok? */ WHERE b=?"),
            "SELECT a -- why?\nFROM t /* ok? */ WHERE b=$1"
        );
    }
}
