//! Combining elementary predicates into one.

use crate::builder::QueryBuilder;

/// Fold `predicates` into a single predicate.
///
/// An empty list yields the unconstrained predicate. Otherwise predicates
/// are left-folded in emission order with OR when `inclusive` is
/// `Some(true)` and AND in every other case. When `distinct` is set, the
/// builder's distinct marker is ANDed in at the top.
pub fn assemble<B: QueryBuilder>(
    builder: &mut B,
    predicates: Vec<B::Predicate>,
    inclusive: Option<bool>,
    distinct: Option<bool>,
) -> B::Predicate {
    let inclusive = inclusive.unwrap_or(false);
    let mut predicates = predicates.into_iter();

    let combined = match predicates.next() {
        None => builder.always_true(),
        Some(first) => predicates.fold(first, |acc, next| {
            if inclusive {
                builder.or(acc, next)
            } else {
                builder.and(acc, next)
            }
        }),
    };

    match distinct {
        Some(distinct) => {
            let marker = builder.distinct(distinct);
            builder.and(marker, combined)
        }
        None => combined,
    }
}
