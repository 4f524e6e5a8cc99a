//! Pure decimal utilities shared by the calculators.
//! Stateless functions with no I/O.

use rust_decimal::prelude::*;

/// Round a currency amount to cents, half away from zero.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `amount * percent / 100`, unrounded.
pub fn percent_of(amount: Decimal, percent: Decimal) -> Decimal {
    amount * percent / Decimal::ONE_HUNDRED
}

/// `numerator / denominator`, or zero when the denominator is zero.
pub fn safe_ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    numerator.checked_div(denominator).unwrap_or(Decimal::ZERO)
}

/// Number of holders in the top `percent` of `n`, rounded up.
/// `top_count(10, 15) == 2`, `top_count(25, 4) == 1`.
pub fn top_count(percent: usize, n: usize) -> usize {
    (n * percent + 99) / 100
}

/// Share of the total held by the top `percent` of holders (0-1).
pub fn top_share(values: &[Decimal], percent: usize) -> Decimal {
    let total: Decimal = values.iter().sum();
    if values.is_empty() || total.is_zero() {
        return Decimal::ZERO;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| b.cmp(a));
    let top: Decimal = sorted.iter().take(top_count(percent, values.len())).sum();
    safe_ratio(top, total)
}

/// Gini coefficient via the sorted-array form:
/// `G = sum((2i - n - 1) * x_i) / (n * sum(x))` with `x` ascending, `i` from 1.
/// O(n log n). Returns zero for empty or all-zero input.
pub fn gini_coefficient(values: &[Decimal]) -> Decimal {
    let n = values.len();
    let total: Decimal = values.iter().sum();
    if n == 0 || total.is_zero() {
        return Decimal::ZERO;
    }
    let mut sorted = values.to_vec();
    sorted.sort();

    let n_dec = Decimal::from(n);
    let weighted: Decimal = sorted
        .iter()
        .enumerate()
        .map(|(idx, x)| (Decimal::from(2 * (idx + 1)) - n_dec - Decimal::ONE) * *x)
        .sum();

    safe_ratio(weighted, n_dec * total)
}

/// Gini coefficient as mean absolute pairwise difference over `2 * n * mean`.
/// O(n^2); kept to cross-check [`gini_coefficient`] on small populations.
pub fn gini_pairwise(values: &[Decimal]) -> Decimal {
    let n = values.len();
    let total: Decimal = values.iter().sum();
    if n == 0 || total.is_zero() {
        return Decimal::ZERO;
    }
    let mut abs_diff = Decimal::ZERO;
    for a in values {
        for b in values {
            abs_diff += (*a - *b).abs();
        }
    }
    // n^2 * 2 * mean == 2 * n * total
    safe_ratio(abs_diff, Decimal::from(2 * n) * total)
}

/// Index of the largest value; ties resolve to the first occurrence.
pub fn index_of_largest(values: &[Decimal]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, Decimal)>, (idx, v)| match best {
            Some((_, b)) if b >= *v => best,
            _ => Some((idx, *v)),
        })
        .map(|(idx, _)| idx)
}

/// Split `target` (already in cents) across `raw` amounts: truncate each to
/// cents, then move the leftover cents one at a time onto the amounts with the
/// largest truncated remainders. The result always sums to `target`.
pub fn largest_remainder(raw: &[Decimal], target: Decimal) -> Vec<Decimal> {
    let cent = Decimal::new(1, 2);
    let mut amounts: Vec<Decimal> = raw
        .iter()
        .map(|r| r.round_dp_with_strategy(2, RoundingStrategy::ToZero))
        .collect();
    if amounts.is_empty() {
        return amounts;
    }

    let floor_sum: Decimal = amounts.iter().sum();
    let leftover = ((target - floor_sum) / cent).round().to_i64().unwrap_or(0);
    if leftover == 0 {
        return amounts;
    }

    let mut order: Vec<usize> = (0..raw.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = (raw[a] - amounts[a]).abs();
        let rb = (raw[b] - amounts[b]).abs();
        rb.cmp(&ra).then(a.cmp(&b))
    });

    let step = if leftover > 0 { cent } else { -cent };
    for k in 0..leftover.unsigned_abs() as usize {
        amounts[order[k % order.len()]] += step;
    }
    amounts
}
