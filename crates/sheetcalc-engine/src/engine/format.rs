/// Largest magnitude still shown as a plain integer.
const INTEGER_DISPLAY_LIMIT: f64 = 1e15;
/// Significant digits for everything else.
const SIGNIFICANT_DIGITS: usize = 10;

/// Format a numeric result for cell display.
///
/// Integral values below 1e15 print as integers (`7`, not `7.0`). Anything else
/// uses up to 10 significant digits with trailing zeros trimmed, switching to
/// exponent notation (`1.5e+20`) for very large or very small magnitudes.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < INTEGER_DISPLAY_LIMIT {
        // `-0.0` prints as "0".
        return format!("{:.0}", n + 0.0);
    }
    format_significant(n, SIGNIFICANT_DIGITS)
}

fn format_significant(n: f64, digits: usize) -> String {
    if !n.is_finite() {
        return n.to_string();
    }
    // Round to `digits` significant digits first; the exponent may move (9.99.. -> 10).
    let sci = format!("{:.*e}", digits - 1, n);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);

    if exp < -4 || exp >= digits as i32 {
        let mantissa = trim_fraction(mantissa);
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exp.abs())
    } else {
        let decimals = (digits as i32 - 1 - exp).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, n)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::format_number;

    #[test]
    fn test_integers() {
        assert_eq!(format_number(7.0), "7");
        assert_eq!(format_number(-12.0), "-12");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(999_999_999_999_999.0), "999999999999999");
    }

    #[test]
    fn test_fractions() {
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(1.0 / 3.0), "0.3333333333");
        assert_eq!(format_number(2.0 / 3.0), "0.6666666667");
        assert_eq!(format_number(0.1 + 0.2), "0.3");
        assert_eq!(format_number(123456.789), "123456.789");
    }

    #[test]
    fn test_exponent_forms() {
        assert_eq!(format_number(1e15), "1e+15");
        assert_eq!(format_number(1.5e20), "1.5e+20");
        assert_eq!(format_number(0.00001234), "1.234e-05");
        assert_eq!(format_number(0.0001234), "0.0001234");
    }
}
