use serde::{Deserialize, Serialize};

use crate::{LedgerError, Money};

/// ISO-like currency code shared by every wallet of a deployment.
///
/// Coffer is mono-currency per installation: the active code comes from the
/// settings file and is threaded through [`crate::LedgerBuilder::currency`].
/// Wallets still persist the code they were created with, so older databases
/// keep their meaning when the configuration changes.
///
/// ## Display decimals
///
/// Amounts are stored as 1e-8 major units (see [`Money`]) regardless of the
/// currency; `decimals()` only controls rounding at the formatting edge.
/// Example: EUR renders 2 fraction digits, JPY none, BTC all 8.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Eur,
    Usd,
    Gbp,
    Chf,
    Jpy,
    Btc,
}

impl Currency {
    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
            Currency::Gbp => "GBP",
            Currency::Chf => "CHF",
            Currency::Jpy => "JPY",
            Currency::Btc => "BTC",
        }
    }

    /// Symbol appended to formatted amounts. Falls back to the code where no
    /// conventional glyph exists.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Currency::Eur => "€",
            Currency::Usd => "$",
            Currency::Gbp => "£",
            Currency::Chf => "CHF",
            Currency::Jpy => "¥",
            Currency::Btc => "₿",
        }
    }

    /// Number of fraction digits rendered for this currency.
    #[must_use]
    pub const fn decimals(self) -> u8 {
        match self {
            Currency::Eur | Currency::Usd | Currency::Gbp | Currency::Chf => 2,
            Currency::Jpy => 0,
            Currency::Btc => 8,
        }
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "EUR" => Ok(Currency::Eur),
            "USD" => Ok(Currency::Usd),
            "GBP" => Ok(Currency::Gbp),
            "CHF" => Ok(Currency::Chf),
            "JPY" => Ok(Currency::Jpy),
            "BTC" => Ok(Currency::Btc),
            other => Err(LedgerError::CurrencyMismatch(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}

/// Formats an amount for display in the given currency.
///
/// Rounds half away from zero to the currency's display decimals and appends
/// the symbol: `1.005 EUR` renders as `1.01€`, `-1200 JPY` as `-1200¥`.
#[must_use]
pub fn format_amount(amount: Money, currency: Currency) -> String {
    render(amount, currency.decimals(), currency.symbol())
}

/// Formats an amount using a raw currency code, e.g. one read back from a
/// wallet row.
///
/// Known codes behave exactly like [`format_amount`]; unknown codes render
/// with two decimals and the code itself as the symbol.
#[must_use]
pub fn format_with_code(amount: Money, code: &str) -> String {
    match Currency::try_from(code) {
        Ok(currency) => format_amount(amount, currency),
        Err(_) => render(amount, 2, code.trim()),
    }
}

fn render(amount: Money, decimals: u8, symbol: &str) -> String {
    let rounded = amount.round_to(decimals);
    let sign = if rounded < 0 { "-" } else { "" };
    let abs = rounded.unsigned_abs();
    if decimals == 0 {
        return format!("{sign}{abs}{symbol}");
    }
    let scale = 10u64.pow(u32::from(decimals));
    let major = abs / scale;
    let frac = abs % scale;
    format!("{sign}{major}.{frac:0width$}{symbol}", width = usize::from(decimals))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for currency in [
            Currency::Eur,
            Currency::Usd,
            Currency::Gbp,
            Currency::Chf,
            Currency::Jpy,
            Currency::Btc,
        ] {
            assert_eq!(Currency::try_from(currency.code()), Ok(currency));
        }
        assert_eq!(Currency::try_from(" eur "), Ok(Currency::Eur));
        assert!(Currency::try_from("XAU").is_err());
    }

    #[test]
    fn format_rounds_half_away_from_zero() {
        let amount = Money::from_units(1_005_000_00);
        assert_eq!(format_amount(amount, Currency::Eur), "1.01€");
        assert_eq!(format_amount(-amount, Currency::Eur), "-1.01€");
        assert_eq!(format_amount(Money::from_major(10), Currency::Usd), "10.00$");
    }

    #[test]
    fn format_respects_currency_decimals() {
        let amount = Money::from_units(1_234_567_890);
        assert_eq!(format_amount(amount, Currency::Jpy), "12¥");
        assert_eq!(format_amount(amount, Currency::Btc), "12.34567890₿");
        assert_eq!(format_amount(Money::from_units(-50_000_000), Currency::Jpy), "-1¥");
    }

    #[test]
    fn unknown_code_falls_back_to_two_decimals() {
        let amount = Money::from_units(1_234_000_000);
        assert_eq!(format_with_code(amount, "EUR"), "12.34€");
        assert_eq!(format_with_code(amount, "XAU"), "12.34XAU");
    }
}
