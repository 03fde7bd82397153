// crates/ladder-rs/src/memory/address.rs
//! Textual address resolution.
//!
//! Addresses are case-insensitive: `M17`, `I0`, `Q3`, `D10`, `D10.3`,
//! `T<name>`, `C<name>`. Numeric regions require an all-digit index;
//! the dotted form selects one bit of a D word.

use alloc::string::String;
use core::fmt;

/// Error type for textual addresses that do not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressError {
    /// The address text is empty (after trimming).
    Empty,
    /// The leading letter does not name a known region.
    UnknownRegion(char),
    /// The index part is empty or contains non-digit characters.
    BadIndex,
    /// The bit part of a dotted D address is not below 32.
    BitOutOfRange,
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty address"),
            Self::UnknownRegion(c) => write!(f, "unknown region prefix '{}'", c),
            Self::BadIndex => write!(f, "index is not a plain decimal number"),
            Self::BitOutOfRange => write!(f, "bit index must be below 32"),
        }
    }
}

/// A resolved, typed memory reference.
///
/// Timer and counter references carry the full uppercased address text as
/// the instance name, so a `T0` contact matches the instance a `TON T0:…`
/// instruction creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    /// Marker (internal relay) bit `M<i>`.
    M(usize),
    /// Physical input bit `I<i>`.
    I(usize),
    /// Physical output bit `Q<i>`.
    Q(usize),
    /// Data word `D<i>`.
    D(usize),
    /// Bit `<b>` of data word `D<i>` (0-indexed, `b < 32`).
    DBit(usize, u8),
    /// Timer output, referenced by instance name.
    Timer(String),
    /// Counter output, referenced by instance name.
    Counter(String),
}

impl Address {
    /// Parses a textual address. Case-insensitive, whitespace-trimmed.
    pub fn parse(text: &str) -> Result<Address, AddressError> {
        let trimmed = text.trim();
        let mut chars = trimmed.chars();
        let region = chars.next().ok_or(AddressError::Empty)?;
        let rest = chars.as_str();

        match region.to_ascii_uppercase() {
            'M' => Ok(Address::M(parse_index(rest)?)),
            'I' => Ok(Address::I(parse_index(rest)?)),
            'Q' => Ok(Address::Q(parse_index(rest)?)),
            'D' => match rest.split_once('.') {
                Some((word, bit)) => {
                    let bit = parse_index(bit)?;
                    if bit >= 32 {
                        return Err(AddressError::BitOutOfRange);
                    }
                    Ok(Address::DBit(parse_index(word)?, bit as u8))
                }
                None => Ok(Address::D(parse_index(rest)?)),
            },
            'T' => {
                if rest.is_empty() {
                    Err(AddressError::BadIndex)
                } else {
                    Ok(Address::Timer(trimmed.to_ascii_uppercase()))
                }
            }
            'C' => {
                if rest.is_empty() {
                    Err(AddressError::BadIndex)
                } else {
                    Ok(Address::Counter(trimmed.to_ascii_uppercase()))
                }
            }
            other => Err(AddressError::UnknownRegion(other)),
        }
    }

    /// True for references the memory bank can store to (M/I/Q/D). Timer and
    /// counter outputs are read-only from the program's point of view.
    pub fn is_writable(&self) -> bool {
        !matches!(self, Address::Timer(_) | Address::Counter(_))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::M(i) => write!(f, "M{}", i),
            Address::I(i) => write!(f, "I{}", i),
            Address::Q(i) => write!(f, "Q{}", i),
            Address::D(i) => write!(f, "D{}", i),
            Address::DBit(i, b) => write!(f, "D{}.{}", i, b),
            Address::Timer(name) | Address::Counter(name) => write!(f, "{}", name),
        }
    }
}

/// An index must be a non-empty, all-digit decimal number.
fn parse_index(text: &str) -> Result<usize, AddressError> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AddressError::BadIndex);
    }
    text.parse().map_err(|_| AddressError::BadIndex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_parse_bit_regions() {
        assert_eq!(Address::parse("M17"), Ok(Address::M(17)));
        assert_eq!(Address::parse("i0"), Ok(Address::I(0)));
        assert_eq!(Address::parse(" Q3 "), Ok(Address::Q(3)));
    }

    #[test]
    fn test_parse_words_and_dotted_bits() {
        assert_eq!(Address::parse("D10"), Ok(Address::D(10)));
        assert_eq!(Address::parse("d10.3"), Ok(Address::DBit(10, 3)));
        assert_eq!(Address::parse("D0.31"), Ok(Address::DBit(0, 31)));
        assert_eq!(Address::parse("D0.32"), Err(AddressError::BitOutOfRange));
    }

    #[test]
    fn test_parse_timer_and_counter_names() {
        assert_eq!(Address::parse("t0"), Ok(Address::Timer("T0".to_string())));
        assert_eq!(
            Address::parse("cUp1"),
            Ok(Address::Counter("CUP1".to_string()))
        );
        assert_eq!(Address::parse("T"), Err(AddressError::BadIndex));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Address::parse(""), Err(AddressError::Empty));
        assert_eq!(Address::parse("   "), Err(AddressError::Empty));
        assert_eq!(Address::parse("X5"), Err(AddressError::UnknownRegion('X')));
        assert_eq!(Address::parse("M"), Err(AddressError::BadIndex));
        assert_eq!(Address::parse("M1a"), Err(AddressError::BadIndex));
        assert_eq!(Address::parse("D-1"), Err(AddressError::BadIndex));
    }

    #[test]
    fn test_display_round_trip() {
        for text in ["M17", "I0", "Q3", "D10", "D10.3", "T0", "C1"] {
            let addr = Address::parse(text).unwrap();
            assert_eq!(addr.to_string(), text);
        }
    }
}
