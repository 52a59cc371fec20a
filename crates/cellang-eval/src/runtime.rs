//! Shared evaluation semantics: operator application, truthiness-based
//! logic, range expansion and argument flattening, and the built-in
//! aggregate functions.
//!
//! Both backends call through here, which is what makes them agree: the VM
//! and the interpreter differ only in *how* they walk the program, never in
//! what an operator or function means.

use crate::symtab::SymbolTable;
use cellang_common::Value;
use cellang_common::key::parse_range;
use cellang_parse::{BinOp, Func, UnaryOp};

/// Apply a binary operator. Operand errors win (left before right);
/// arithmetic and comparisons go through numeric coercion, `AND`/`OR`
/// through truthiness. Division by zero produces an error value.
pub fn binary_op(op: BinOp, a: &Value, b: &Value) -> Value {
    if a.is_error() {
        return a.clone();
    }
    if b.is_error() {
        return b.clone();
    }
    let (x, y) = (a.as_number(), b.as_number());
    match op {
        BinOp::Add => Value::Number(x + y),
        BinOp::Sub => Value::Number(x - y),
        BinOp::Mul => Value::Number(x * y),
        BinOp::Div => {
            if y == 0.0 {
                Value::error("Division by zero")
            } else {
                Value::Number(x / y)
            }
        }
        BinOp::Pow => Value::Number(x.powf(y)),
        BinOp::Gt => Value::Boolean(x > y),
        BinOp::Lt => Value::Boolean(x < y),
        BinOp::Gte => Value::Boolean(x >= y),
        BinOp::Lte => Value::Boolean(x <= y),
        BinOp::Eq => Value::Boolean(x == y),
        BinOp::Ne => Value::Boolean(x != y),
        BinOp::And => Value::Boolean(a.is_truthy() && b.is_truthy()),
        BinOp::Or => Value::Boolean(a.is_truthy() || b.is_truthy()),
    }
}

/// Apply a unary operator, propagating operand errors.
pub fn unary_op(op: UnaryOp, v: &Value) -> Value {
    if v.is_error() {
        return v.clone();
    }
    match op {
        UnaryOp::Neg => Value::Number(-v.as_number()),
        UnaryOp::Not => Value::Boolean(!v.is_truthy()),
    }
}

/// Expand range text into cell values in column-major order (`A1:B2` →
/// A1, A2, B1, B2). Undefined cells contribute 0. Returns `None` when the
/// text is not an expandable range (malformed, multi-letter columns, or
/// start beyond end); callers then treat it as a plain string.
pub fn expand_range(text: &str, symtab: &SymbolTable) -> Option<Vec<Value>> {
    let bounds = parse_range(text)?;
    if !bounds.is_ordered() {
        return None;
    }
    Some(
        bounds
            .cells()
            .map(|key| Value::Number(symtab.value_of(&key)))
            .collect(),
    )
}

/// Push an evaluated argument into a flat argument vector, transparently
/// splicing in the expansion when the value is text that names a range.
/// Shared by both backends; this is the range-as-implicit-list rule.
pub fn flatten_arg(value: Value, symtab: &SymbolTable, out: &mut Vec<Value>) {
    if let Value::Text(text) = &value
        && let Some(expanded) = expand_range(text, symtab)
    {
        out.extend(expanded);
        return;
    }
    out.push(value);
}

/// Dispatch a built-in by selector. `IF` never arrives here (it compiles
/// to jumps and the interpreter special-cases it); `AND`/`OR` are lowered
/// to binary operators by the parser.
pub fn dispatch(func: Func, args: &[Value]) -> Value {
    match func {
        Func::Sum => sum(args),
        Func::Average => average(args),
        Func::Min => min(args),
        Func::Max => max(args),
        Func::Not => not(args),
        Func::If | Func::And | Func::Or => {
            Value::error(format!("Unknown function '{}' in call position", func.name()))
        }
    }
}

fn numeric(args: &[Value]) -> impl Iterator<Item = f64> + '_ {
    args.iter().filter_map(|v| match v {
        Value::Number(n) => Some(*n),
        _ => None,
    })
}

/// Sum of the numeric elements; everything else is ignored. Empty → 0.
pub fn sum(args: &[Value]) -> Value {
    Value::Number(numeric(args).sum())
}

/// Mean of the numeric elements; no numeric input is a divide-by-zero.
pub fn average(args: &[Value]) -> Value {
    let (mut total, mut count) = (0.0, 0u32);
    for n in numeric(args) {
        total += n;
        count += 1;
    }
    if count == 0 {
        return Value::error("AVERAGE divide by zero (no numeric args)");
    }
    Value::Number(total / f64::from(count))
}

/// Smallest numeric element; none → 0.
pub fn min(args: &[Value]) -> Value {
    Value::Number(numeric(args).reduce(f64::min).unwrap_or(0.0))
}

/// Largest numeric element; none → 0.
pub fn max(args: &[Value]) -> Value {
    Value::Number(numeric(args).reduce(f64::max).unwrap_or(0.0))
}

/// Logical negation of exactly one argument's truthiness.
pub fn not(args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::error("NOT expects exactly 1 argument");
    }
    Value::Boolean(!args[0].is_truthy())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(values: &[f64]) -> Vec<Value> {
        values.iter().copied().map(Value::Number).collect()
    }

    #[test]
    fn arithmetic_and_comparisons() {
        let two = Value::Number(2.0);
        let three = Value::Number(3.0);
        assert_eq!(binary_op(BinOp::Add, &two, &three), Value::Number(5.0));
        assert_eq!(binary_op(BinOp::Pow, &two, &three), Value::Number(8.0));
        assert_eq!(binary_op(BinOp::Gt, &three, &two), Value::Boolean(true));
        assert_eq!(binary_op(BinOp::Eq, &two, &two), Value::Boolean(true));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let r = binary_op(BinOp::Div, &Value::Number(4.0), &Value::Number(0.0));
        assert_eq!(r, Value::error("Division by zero"));
    }

    #[test]
    fn operand_errors_propagate_left_first() {
        let e1 = Value::error("first");
        let e2 = Value::error("second");
        assert_eq!(binary_op(BinOp::Add, &e1, &e2), e1);
        assert_eq!(binary_op(BinOp::Add, &Value::Number(1.0), &e2), e2);
        assert_eq!(unary_op(UnaryOp::Neg, &e1), e1);
    }

    #[test]
    fn logic_uses_truthiness_of_both_sides() {
        let text = Value::Text("x".into());
        let zero = Value::Number(0.0);
        assert_eq!(binary_op(BinOp::And, &text, &zero), Value::Boolean(false));
        assert_eq!(binary_op(BinOp::Or, &text, &zero), Value::Boolean(true));
    }

    #[test]
    fn comparisons_coerce_booleans() {
        let t = Value::Boolean(true);
        let one = Value::Number(1.0);
        assert_eq!(binary_op(BinOp::Eq, &t, &one), Value::Boolean(true));
    }

    #[test]
    fn sum_ignores_non_numbers() {
        let mut args = nums(&[1.0, 2.0]);
        args.push(Value::Text("skip".into()));
        args.push(Value::Boolean(true));
        args.push(Value::error("also skipped"));
        assert_eq!(sum(&args), Value::Number(3.0));
        assert_eq!(sum(&[]), Value::Number(0.0));
    }

    #[test]
    fn average_of_nothing_is_an_error() {
        assert_eq!(average(&nums(&[3.0, 5.0, 7.0])), Value::Number(5.0));
        assert!(average(&[]).is_error());
        assert!(average(&[Value::Text("x".into())]).is_error());
    }

    #[test]
    fn min_max_extrema() {
        let args = nums(&[4.0, -1.0, 7.5]);
        assert_eq!(min(&args), Value::Number(-1.0));
        assert_eq!(max(&args), Value::Number(7.5));
        assert_eq!(min(&[]), Value::Number(0.0));
        assert_eq!(max(&[Value::Text("x".into())]), Value::Number(0.0));
    }

    #[test]
    fn not_requires_exactly_one_argument() {
        assert_eq!(not(&[Value::Number(0.0)]), Value::Boolean(true));
        assert_eq!(not(&[Value::Number(2.0)]), Value::Boolean(false));
        assert!(not(&[]).is_error());
        assert!(not(&nums(&[1.0, 2.0])).is_error());
    }

    #[test]
    fn expand_range_reads_cells_column_major() {
        let mut st = SymbolTable::new();
        st.define("A1", 1.0, None, 1);
        st.define("A2", 2.0, None, 1);
        st.define("B1", 3.0, None, 1);
        // B2 left undefined → 0
        let vals = expand_range("A1:B2", &st).unwrap();
        assert_eq!(vals, nums(&[1.0, 2.0, 3.0, 0.0]));
    }

    #[test]
    fn expand_range_single_cell() {
        let mut st = SymbolTable::new();
        st.define("A1", 9.0, None, 1);
        assert_eq!(expand_range("A1:A1", &st).unwrap(), nums(&[9.0]));
    }

    #[test]
    fn non_range_text_is_not_expanded() {
        let st = SymbolTable::new();
        assert!(expand_range("hello", &st).is_none());
        assert!(expand_range("AA1:B2", &st).is_none());
        assert!(expand_range("A3:A1", &st).is_none());
    }

    #[test]
    fn flatten_splices_ranges_in_place() {
        let mut st = SymbolTable::new();
        st.define("A1", 1.0, None, 1);
        st.define("A2", 2.0, None, 1);
        let mut out = Vec::new();
        flatten_arg(Value::Number(10.0), &st, &mut out);
        flatten_arg(Value::Text("A1:A2".into()), &st, &mut out);
        flatten_arg(Value::Text("plain".into()), &st, &mut out);
        assert_eq!(
            out,
            vec![
                Value::Number(10.0),
                Value::Number(1.0),
                Value::Number(2.0),
                Value::Text("plain".into()),
            ]
        );
    }

    #[test]
    fn dispatch_rejects_jump_only_functions() {
        assert!(dispatch(Func::If, &[]).is_error());
        assert!(dispatch(Func::And, &[]).is_error());
    }
}
