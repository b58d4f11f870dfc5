use std::cmp::Ordering;

use super::op::CompareOp;

/// Compare two tag values with the given operator.
///
/// When both sides parse as numbers the comparison is numeric, otherwise the
/// raw strings are compared lexically. NaN never satisfies any operator.
#[must_use]
pub fn compare_values(left: &str, op: CompareOp, right: &str) -> bool {
    let Some(ord) = order(left, right) else {
        return false;
    };
    match op {
        CompareOp::Gt => ord == Ordering::Greater,
        CompareOp::Gte => ord != Ordering::Less,
        CompareOp::Lt => ord == Ordering::Less,
        CompareOp::Lte => ord != Ordering::Greater,
    }
}

fn order(left: &str, right: &str) -> Option<Ordering> {
    match (parse_number(left), parse_number(right)) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        _ => Some(left.cmp(right)),
    }
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}
