#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Grouping {
    /// Thousands: `8,500,000`.
    #[default]
    International,
    /// Lakh/crore: `85,00,000`.
    Indian,
}

/// Renders a price as a whole number with digit grouping.
pub fn format_price(value: f64, grouping: Grouping) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let grouped = match grouping {
        Grouping::International => group_digits(&digits, 3, 3),
        Grouping::Indian => group_digits(&digits, 3, 2),
    };

    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

pub fn currency_symbol(currency: &str) -> Option<&'static str> {
    match currency.to_ascii_uppercase().as_str() {
        "INR" => Some("₹"),
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        _ => None,
    }
}

fn group_digits(digits: &str, first: usize, rest: usize) -> String {
    if digits.len() <= first {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - first);
    let mut groups = vec![tail];
    let mut remaining = head;
    while remaining.len() > rest {
        let (left, right) = remaining.split_at(remaining.len() - rest);
        groups.push(right);
        remaining = left;
    }
    groups.push(remaining);
    groups.reverse();
    groups.join(",")
}
