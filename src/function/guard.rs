//! The NULL/MISSING short-circuit shared by every scalar function.
//!
//! Registration wraps each scalar body exactly once. Bodies therefore only
//! ever see concrete argument values.

use crate::data::ExprValue;
use crate::expression::FunctionImpl;
use std::sync::Arc;

/// Wrap `body` so that any MISSING argument yields MISSING, otherwise any
/// NULL argument yields NULL, and only concrete arguments reach `body`.
pub fn null_missing_handling(body: FunctionImpl) -> FunctionImpl {
    Arc::new(move |args: &[ExprValue]| {
        if args.iter().any(ExprValue::is_missing) {
            return Ok(ExprValue::Missing);
        }
        if args.iter().any(ExprValue::is_null) {
            return Ok(ExprValue::Null);
        }
        body(args)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{ExpressionError, ExpressionResult};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_guard_short_circuits() -> ExpressionResult<()> {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let guarded = null_missing_handling(Arc::new(move |args: &[ExprValue]| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(ExprValue::Integer(args.len() as i32))
        }));

        assert!(guarded(&[ExprValue::Null, ExprValue::Missing])?.is_missing());
        assert!(guarded(&[ExprValue::Missing, ExprValue::Missing])?.is_missing());
        assert!(guarded(&[ExprValue::Integer(1), ExprValue::Null])?.is_null());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(guarded(&[ExprValue::Integer(1), ExprValue::Integer(2)])?, ExprValue::Integer(2));
        assert_eq!(guarded(&[])?, ExprValue::Integer(0));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        Ok(())
    }

    #[test]
    fn test_guard_keeps_body_errors() {
        let guarded = null_missing_handling(Arc::new(|_: &[ExprValue]| {
            Err(ExpressionError::evaluation("boom"))
        }));
        assert!(guarded(&[ExprValue::Integer(1)]).is_err());
        assert!(guarded(&[ExprValue::Null]).is_ok());
    }
}
