use rust_decimal::{Decimal, RoundingStrategy};

use super::fx_errors::FxError;
use crate::constants::{AMOUNT_DECIMAL_PRECISION, RATE_DECIMAL_PRECISION};

/// Outcome of a single conversion: the rounded amount plus the effective
/// rate that was applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub converted_amount: Decimal,
    pub exchange_rate: Decimal,
}

/// Exact-decimal conversion arithmetic. All intermediate and final rounding
/// is half-up (midpoint away from zero): amounts to 4 decimal places, rates
/// to 6.
pub struct CurrencyConverter;

impl CurrencyConverter {
    /// Base currency into a quoted currency: multiply by the quote.
    pub fn from_base(amount: Decimal, rate: Decimal) -> Conversion {
        Conversion {
            converted_amount: round_amount(amount * rate),
            exchange_rate: round_rate(rate),
        }
    }

    /// Quoted currency back into the base: divide by the quote.
    pub fn to_base(amount: Decimal, rate: Decimal) -> Result<Conversion, FxError> {
        if rate.is_zero() {
            return Err(FxError::ConversionError(
                "exchange rate is zero".to_string(),
            ));
        }
        Ok(Conversion {
            converted_amount: round_amount(amount / rate),
            exchange_rate: round_rate(rate),
        })
    }

    /// Cross conversion through the base: into the base at rate precision,
    /// then out again at amount precision. The reported rate is the ratio
    /// of the two quotes.
    pub fn cross(
        amount: Decimal,
        from_rate: Decimal,
        to_rate: Decimal,
    ) -> Result<Conversion, FxError> {
        if from_rate.is_zero() {
            return Err(FxError::ConversionError(
                "exchange rate is zero".to_string(),
            ));
        }
        let base_amount = round_rate(amount / from_rate);
        Ok(Conversion {
            converted_amount: round_amount(base_amount * to_rate),
            exchange_rate: round_rate(to_rate / from_rate),
        })
    }
}

fn round_amount(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(AMOUNT_DECIMAL_PRECISION, RoundingStrategy::MidpointAwayFromZero)
}

fn round_rate(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(RATE_DECIMAL_PRECISION, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn from_base_multiplies_and_rounds_to_four_places() {
        let conversion = CurrencyConverter::from_base(dec!(10), dec!(1.0856));
        assert_eq!(conversion.converted_amount, dec!(10.8560));
        assert_eq!(conversion.exchange_rate, dec!(1.0856));
    }

    #[test]
    fn to_base_divides_and_rounds_to_four_places() {
        let conversion = CurrencyConverter::to_base(dec!(10), dec!(1.0856)).unwrap();
        assert_eq!(conversion.converted_amount, dec!(9.2115));
    }

    #[test]
    fn to_base_rejects_zero_rate() {
        assert!(matches!(
            CurrencyConverter::to_base(dec!(10), Decimal::ZERO),
            Err(FxError::ConversionError(_))
        ));
    }

    #[test]
    fn cross_goes_through_the_base_currency() {
        // 100 USD -> EUR -> GBP at USD 1.0856, GBP 0.8599
        let conversion =
            CurrencyConverter::cross(dec!(100), dec!(1.0856), dec!(0.8599)).unwrap();
        assert_eq!(conversion.converted_amount, dec!(79.2097));
        assert_eq!(conversion.exchange_rate, dec!(0.792097));
    }

    #[test]
    fn cross_rejects_zero_from_rate() {
        assert!(matches!(
            CurrencyConverter::cross(dec!(100), Decimal::ZERO, dec!(0.8599)),
            Err(FxError::ConversionError(_))
        ));
    }

    #[test]
    fn base_round_trip_stays_within_rounding_tolerance() {
        let outbound = CurrencyConverter::from_base(dec!(123.45), dec!(1.0856));
        let back = CurrencyConverter::to_base(outbound.converted_amount, dec!(1.0856)).unwrap();

        let drift = (back.converted_amount - dec!(123.45)).abs();
        assert!(drift <= dec!(0.0001), "drift was {}", drift);
    }

    #[test]
    fn cross_round_trip_error_is_bounded_not_exact() {
        let outbound = CurrencyConverter::cross(dec!(100), dec!(1.0856), dec!(0.8599)).unwrap();
        let back =
            CurrencyConverter::cross(outbound.converted_amount, dec!(0.8599), dec!(1.0856))
                .unwrap();

        // Intermediate rounding compounds, so the round trip only
        // approximates the original amount.
        let drift = (back.converted_amount - dec!(100)).abs();
        assert!(drift <= dec!(0.001), "drift was {}", drift);
    }

    #[test]
    fn midpoint_rounds_away_from_zero() {
        let conversion = CurrencyConverter::from_base(dec!(1), dec!(0.00005));
        assert_eq!(conversion.converted_amount, dec!(0.0001));
    }
}
