//! Presentation helpers for standings rows and chart axes.

use crate::game::{Cents, Profile, UserId};

/// Axis range used when there is nothing to plot, in dollars
pub const EMPTY_DOMAIN: (i64, i64) = (-10, 10);

/// Name shown for a player: display name, then Venmo handle, then a short id
pub fn display_name(user_id: UserId, profile: Option<&Profile>) -> String {
    profile
        .and_then(|p| {
            p.display_name
                .as_deref()
                .filter(|n| !n.is_empty())
                .or(p.venmo_handle.as_deref().filter(|h| !h.is_empty()))
        })
        .map(str::to_string)
        .unwrap_or_else(|| user_id.to_string()[..8].to_string())
}

/// Whole-dollar y-axis bounds for a set of cent values.
///
/// Always includes zero and pads the range by 20% on both sides.
pub fn y_domain(values: &[Cents]) -> (i64, i64) {
    if values.is_empty() {
        return EMPTY_DOMAIN;
    }

    let dollars = values.iter().map(|&v| v as f64 / 100.0);
    let max = dollars.clone().fold(0.0_f64, f64::max);
    let min = dollars.fold(0.0_f64, f64::min);

    let range = if max - min == 0.0 { 1.0 } else { max - min };
    let pad = range * 0.2;

    ((min - pad).floor() as i64, (max + pad).ceil() as i64)
}

/// Format cents as a dollar string, dropping zero cents: `$12`, `-$3.50`
pub fn format_dollars(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let (dollars, rem) = (abs / 100, abs % 100);

    if rem == 0 {
        format!("{sign}${dollars}")
    } else {
        format!("{sign}${dollars}.{rem:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn profile(display_name: Option<&str>, venmo_handle: Option<&str>) -> Profile {
        Profile {
            user_id: Uuid::new_v4(),
            display_name: display_name.map(str::to_string),
            venmo_handle: venmo_handle.map(str::to_string),
            email: None,
        }
    }

    #[test]
    fn test_display_name_fallbacks() {
        let id = Uuid::parse_str("0123abcd-0000-4000-8000-000000000000").unwrap();

        let named = profile(Some("Ace"), Some("@ace"));
        assert_eq!(display_name(id, Some(&named)), "Ace");

        let handle_only = profile(Some(""), Some("@ace"));
        assert_eq!(display_name(id, Some(&handle_only)), "@ace");

        assert_eq!(display_name(id, None), "0123abcd");
    }

    #[test]
    fn test_y_domain() {
        assert_eq!(y_domain(&[]), EMPTY_DOMAIN);
        assert_eq!(y_domain(&[0, 0]), (-1, 1));
        // 0..100 dollars, padded by 20
        assert_eq!(y_domain(&[10_000, 5_000]), (-20, 120));
        assert_eq!(y_domain(&[-5_000]), (-60, 10));
    }

    #[test]
    fn test_format_dollars() {
        assert_eq!(format_dollars(0), "$0");
        assert_eq!(format_dollars(1200), "$12");
        assert_eq!(format_dollars(-350), "-$3.50");
        assert_eq!(format_dollars(5), "$0.05");
    }
}
