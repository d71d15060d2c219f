//! Constant-product quote math (Uniswap V2 library semantics).
//!
//! All helpers return `None` instead of panicking when an input is
//! degenerate (non-positive amount, empty reserve) or a product overflows.

/// Swap fee numerator: 0.3 % fee leaves 997/1000 of the input.
pub const FEE_NUMERATOR: i128 = 997;
pub const FEE_DENOMINATOR: i128 = 1000;

/// Amount of `b` worth `amount_a` at the current reserve ratio.
pub fn quote(amount_a: i128, reserve_a: i128, reserve_b: i128) -> Option<i128> {
    if amount_a <= 0 || reserve_a <= 0 || reserve_b <= 0 {
        return None;
    }
    amount_a.checked_mul(reserve_b)?.checked_div(reserve_a)
}

/// Output of an exact-input swap after the pool fee.
pub fn get_amount_out(amount_in: i128, reserve_in: i128, reserve_out: i128) -> Option<i128> {
    if amount_in <= 0 || reserve_in <= 0 || reserve_out <= 0 {
        return None;
    }
    let amount_in_with_fee = amount_in.checked_mul(FEE_NUMERATOR)?;
    let numerator = amount_in_with_fee.checked_mul(reserve_out)?;
    let denominator = reserve_in
        .checked_mul(FEE_DENOMINATOR)?
        .checked_add(amount_in_with_fee)?;
    match numerator / denominator {
        0 => None,
        out => Some(out),
    }
}

/// Largest deposit not exceeding `(desired_a, desired_b)` that matches the
/// pool ratio. An empty pool accepts the desired amounts unchanged.
///
/// The result is a fixed point: passing it back in as the desired amounts
/// returns the same pair, so a caller can pre-authorise exactly the amounts
/// a router will pull.
pub fn optimal_deposit(
    desired_a: i128,
    desired_b: i128,
    reserve_a: i128,
    reserve_b: i128,
) -> Option<(i128, i128)> {
    if desired_a <= 0 || desired_b <= 0 {
        return None;
    }
    if reserve_a == 0 && reserve_b == 0 {
        return Some((desired_a, desired_b));
    }

    let b_optimal = quote(desired_a, reserve_a, reserve_b)?;
    let (a, b) = if b_optimal <= desired_b {
        (desired_a, b_optimal)
    } else {
        let a_optimal = quote(desired_b, reserve_b, reserve_a)?;
        (a_optimal, quote(a_optimal, reserve_a, reserve_b)?)
    };

    if a <= 0 || b <= 0 {
        return None;
    }
    Some((a, b))
}

/// Integer square root (floor), used for the first deposit into a pool.
pub fn sqrt(value: i128) -> i128 {
    if value <= 0 {
        return 0;
    }
    let mut x = value;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + value / x) / 2;
    }
    x
}
