//! String functions.

use crate::data::{ExprType, ExprValue};
use crate::expression::{ExpressionError, ExpressionResult};
use crate::function::{FunctionResolver, RepositoryBuilder};

const S: ExprType = ExprType::String;
const I: ExprType = ExprType::Integer;

pub fn register(repo: &mut RepositoryBuilder) {
    repo.register(ExprType::SCALARS.into_iter().fold(
        FunctionResolver::new("tostring"),
        |resolver, ty| {
            resolver.scalar(&[ty], S, |args| Ok(ExprValue::String(plain_text(&args[0])?)))
        },
    ));

    repo.register(string_map("upper", |s| s.to_uppercase()));
    repo.register(string_map("lower", |s| s.to_lowercase()));
    repo.register(string_map("trim", |s| s.trim().to_string()));
    repo.register(string_map("ltrim", |s| s.trim_start().to_string()));
    repo.register(string_map("rtrim", |s| s.trim_end().to_string()));

    repo.register(FunctionResolver::new("length").scalar(&[S], I, |args| {
        let len = args[0].string_value()?.len();
        i32::try_from(len)
            .map(ExprValue::Integer)
            .map_err(|_| ExpressionError::evaluation(format!("string length {} overflows INTEGER", len)))
    }));
    repo.register(FunctionResolver::new("concat").scalar(&[S, S], S, |args| {
        Ok(ExprValue::String(format!(
            "{}{}",
            args[0].string_value()?,
            args[1].string_value()?
        )))
    }));

    for name in ["substring", "substr"] {
        repo.register(
            FunctionResolver::new(name)
                .scalar(&[S, I], S, |args| {
                    let text = args[0].string_value()?;
                    Ok(ExprValue::String(substring(text, args[1].integer_value()?, None)))
                })
                .scalar(&[S, I, I], S, |args| {
                    let text = args[0].string_value()?;
                    let len = args[2].integer_value()?;
                    Ok(ExprValue::String(substring(text, args[1].integer_value()?, Some(len))))
                }),
        );
    }
}

fn string_map(name: &str, f: fn(&str) -> String) -> FunctionResolver {
    FunctionResolver::new(name).scalar(&[S], S, move |args| {
        Ok(ExprValue::String(f(args[0].string_value()?)))
    })
}

/// Unquoted text of a scalar value
fn plain_text(value: &ExprValue) -> ExpressionResult<String> {
    match value {
        ExprValue::Tuple(_) | ExprValue::Array(_) => Err(ExpressionError::evaluation(format!(
            "tostring does not accept {}",
            value.expr_type()
        ))),
        other => Ok(other.to_text()),
    }
}

/// 1-based substring; a negative start counts back from the end
fn substring(text: &str, start: i32, len: Option<i32>) -> String {
    let chars: Vec<char> = text.chars().collect();
    let count = chars.len() as i64;
    let begin = match i64::from(start) {
        0 => return String::new(),
        s if s > 0 => s - 1,
        s => count + s,
    };
    if begin < 0 || begin >= count {
        return String::new();
    }
    let end = match len {
        Some(l) if l <= 0 => return String::new(),
        Some(l) => (begin + i64::from(l)).min(count),
        None => count,
    };
    chars[begin as usize..end as usize].iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Tuple;
    use crate::expression::eval::evaluate_expression;
    use crate::expression::{dsl, Expression};
    use crate::function::BuiltinFunctionRepository;

    fn call(name: &str, args: Vec<Expression>) -> ExpressionResult<ExprValue> {
        let repo = BuiltinFunctionRepository::new();
        evaluate_expression(&dsl::function(&repo, name, args)?, &Tuple::new())
    }

    #[test]
    fn test_case_and_trim() -> ExpressionResult<()> {
        assert_eq!(call("upper", vec![dsl::literal("abc")])?, ExprValue::string("ABC"));
        assert_eq!(call("lower", vec![dsl::literal("AbC")])?, ExprValue::string("abc"));
        assert_eq!(call("trim", vec![dsl::literal("  x  ")])?, ExprValue::string("x"));
        assert_eq!(call("ltrim", vec![dsl::literal("  x  ")])?, ExprValue::string("x  "));
        assert_eq!(call("rtrim", vec![dsl::literal("  x  ")])?, ExprValue::string("  x"));
        Ok(())
    }

    #[test]
    fn test_length_and_concat() -> ExpressionResult<()> {
        assert_eq!(call("length", vec![dsl::literal("héllo")])?, ExprValue::Integer(6));
        assert_eq!(call("concat", vec![dsl::literal("foo"), dsl::literal("bar")])?, ExprValue::string("foobar"));
        assert!(call("concat", vec![dsl::literal("foo"), dsl::null()])?.is_null());
        Ok(())
    }

    #[test]
    fn test_substring() -> ExpressionResult<()> {
        assert_eq!(call("substring", vec![dsl::literal("quadratically"), dsl::literal(5)])?, ExprValue::string("ratically"));
        assert_eq!(
            call("substr", vec![dsl::literal("quadratically"), dsl::literal(5), dsl::literal(6)])?,
            ExprValue::string("ratica")
        );
        assert_eq!(call("substring", vec![dsl::literal("Sakila"), dsl::literal(-3)])?, ExprValue::string("ila"));
        assert_eq!(call("substring", vec![dsl::literal("Sakila"), dsl::literal(0)])?, ExprValue::string(""));
        assert_eq!(call("substring", vec![dsl::literal("Sakila"), dsl::literal(10)])?, ExprValue::string(""));
        Ok(())
    }

    #[test]
    fn test_tostring() -> ExpressionResult<()> {
        assert_eq!(call("tostring", vec![dsl::literal(42)])?, ExprValue::string("42"));
        assert_eq!(call("tostring", vec![dsl::literal("x")])?, ExprValue::string("x"));
        assert_eq!(call("tostring", vec![dsl::literal(true)])?, ExprValue::string("true"));
        assert_eq!(call("tostring", vec![dsl::date("2020-08-26")?])?, ExprValue::string("2020-08-26"));
        Ok(())
    }
}
