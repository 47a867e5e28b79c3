// Kubernetes resource quantity parsing.
//
// A quantity is a signed decimal number followed by either a binary suffix
// (Ki, Mi, Gi, Ti, Pi, Ei), a decimal suffix (n, u, m, k, M, G, T, P, E)
// or a decimal exponent (e3, E-2). Values are scaled with integer arithmetic
// and rounded up, the same way the apiserver's Value()/MilliValue() do.

use std::convert::TryFrom;

// Quantity in its smallest whole unit, e.g. bytes for memory.
pub fn value(quantity: &str) -> Option<f64> {
    scaled(quantity, 0)
}

// Quantity in thousandths, e.g. millicores for CPU.
pub fn milli_value(quantity: &str) -> Option<f64> {
    scaled(quantity, 3)
}

struct Parsed {
    mantissa: i128,
    pow2: u32,
    pow10: i32,
}

fn parse(quantity: &str) -> Option<Parsed> {
    let q = quantity.trim();
    let number_end = q
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || *c == '.' || ((*c == '+' || *c == '-') && *i == 0)))
        .map(|(i, _)| i)
        .unwrap_or_else(|| q.len());
    let (number, suffix) = q.split_at(number_end);

    let (negative, digits) = match number.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, number.strip_prefix('+').unwrap_or(number)),
    };
    let mut parts = digits.splitn(2, '.');
    let whole = parts.next().unwrap_or("");
    let fraction = parts.next().unwrap_or("");
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if fraction.contains('.') {
        return None;
    }

    let mut mantissa: i128 = 0;
    for c in whole.chars().chain(fraction.chars()) {
        let d = c.to_digit(10)? as i128;
        mantissa = mantissa.checked_mul(10)?.checked_add(d)?;
    }
    if negative {
        mantissa = -mantissa;
    }

    let (pow2, suffix_pow10) = match suffix {
        "" => (0, 0),
        "Ki" => (10, 0),
        "Mi" => (20, 0),
        "Gi" => (30, 0),
        "Ti" => (40, 0),
        "Pi" => (50, 0),
        "Ei" => (60, 0),
        "n" => (0, -9),
        "u" => (0, -6),
        "m" => (0, -3),
        "k" => (0, 3),
        "M" => (0, 6),
        "G" => (0, 9),
        "T" => (0, 12),
        "P" => (0, 15),
        "E" => (0, 18),
        s if s.starts_with('e') || s.starts_with('E') => (0, s[1..].parse::<i32>().ok()?),
        _ => return None,
    };

    let fraction_digits = i32::try_from(fraction.len()).ok()?;
    Some(Parsed {
        mantissa,
        pow2,
        pow10: suffix_pow10.checked_sub(fraction_digits)?,
    })
}

fn scaled(quantity: &str, scale: i32) -> Option<f64> {
    let p = parse(quantity)?;
    if p.mantissa == 0 {
        return Some(0.0);
    }
    let exp = p.pow10.checked_add(scale)?;

    let exact = p.mantissa.checked_mul(1i128.checked_shl(p.pow2)?).and_then(|m| {
        if exp >= 0 {
            m.checked_mul(10i128.checked_pow(exp as u32)?)
        } else {
            // round up, towards positive infinity
            match 10i128.checked_pow(exp.unsigned_abs()) {
                Some(divisor) if m >= 0 => Some(m.checked_add(divisor - 1)? / divisor),
                Some(divisor) => Some(-(m.checked_neg()? / divisor)),
                // divisor exceeds any mantissa, only the sign is left
                None => Some(if m > 0 { 1 } else { 0 }),
            }
        }
    });

    let v = match exact {
        Some(v) => v as f64,
        None => (p.mantissa as f64 * 2f64.powi(p.pow2 as i32) * 10f64.powi(exp)).ceil(),
    };
    if v.is_finite() { Some(v) } else { None }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_quantities_in_millicores() {
        assert_eq!(milli_value("500m"), Some(500.0));
        assert_eq!(milli_value("1"), Some(1000.0));
        assert_eq!(milli_value("1.1"), Some(1100.0));
        assert_eq!(milli_value("0.25"), Some(250.0));
        assert_eq!(milli_value("100u"), Some(1.0));
    }

    #[test]
    fn memory_quantities_in_bytes() {
        assert_eq!(value("1Gi"), Some(1073741824.0));
        assert_eq!(value("128Mi"), Some(134217728.0));
        assert_eq!(value("1G"), Some(1000000000.0));
        assert_eq!(value("1.5Ki"), Some(1536.0));
        assert_eq!(value("12e6"), Some(12000000.0));
        assert_eq!(value("1E3"), Some(1000.0));
        assert_eq!(value("1E"), Some(1e18));
        assert_eq!(value(" 42 "), Some(42.0));
    }

    #[test]
    fn fractional_bytes_round_up() {
        assert_eq!(value("1500m"), Some(2.0));
        assert_eq!(value("-1500m"), Some(-1.0));
    }

    #[test]
    fn malformed_quantities() {
        assert_eq!(value(""), None);
        assert_eq!(value("Gi"), None);
        assert_eq!(value("1.2.3"), None);
        assert_eq!(value("12XB"), None);
        assert_eq!(value("1e"), None);
        assert_eq!(value("1e99999999999"), None);
    }

    #[test]
    fn extreme_exponents_do_not_overflow() {
        assert_eq!(milli_value("1e2147483647"), None);
        assert_eq!(milli_value("1e2147483644"), None);
        assert_eq!(value("1.5e-2147483648"), None);
        assert_eq!(value("1e-2147483648"), Some(1.0));
        assert_eq!(value("1e-2147483647"), Some(1.0));
        assert_eq!(value("-1e-40"), Some(0.0));
        assert_eq!(value("1e400"), None);
        assert_eq!(value("0e400"), Some(0.0));
    }
}
