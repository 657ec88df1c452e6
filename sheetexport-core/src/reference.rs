//! A1-style cell references and print title row ranges

use crate::error::AutomationError;
use std::fmt;
use std::str::FromStr;

/// Cell reference with 0-based row and column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Convert column number to letters (0 -> A, 26 -> AA)
    fn col_to_letters(mut col: u32) -> String {
        let mut result = String::new();
        loop {
            result.insert(0, (b'A' + (col % 26) as u8) as char);
            if col < 26 {
                break;
            }
            col = col / 26 - 1;
        }
        result
    }
}

impl FromStr for CellRef {
    type Err = AutomationError;

    /// Parse "C5" (or "$C$5") into 0-based indices
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AutomationError::InvalidReference(s.to_string());
        let mut col = 0u32;
        let mut row_str = String::new();

        for ch in s.trim().chars() {
            match ch {
                '$' => {}
                c if c.is_ascii_alphabetic() && row_str.is_empty() => {
                    col = col
                        .checked_mul(26)
                        .and_then(|v| v.checked_add(c.to_ascii_uppercase() as u32 - 'A' as u32 + 1))
                        .ok_or_else(invalid)?;
                }
                c if c.is_ascii_digit() => row_str.push(c),
                _ => return Err(invalid()),
            }
        }

        if col == 0 || row_str.is_empty() {
            return Err(invalid());
        }
        let row: u32 = row_str.parse().map_err(|_| invalid())?;
        if row == 0 {
            return Err(invalid());
        }

        Ok(Self::new(row - 1, col - 1))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::col_to_letters(self.col), self.row + 1)
    }
}

/// Inclusive span of 1-based worksheet rows, e.g. `$2:$4`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub first: u32,
    pub last: u32,
}

impl RowRange {
    pub fn new(first: u32, last: u32) -> Result<Self, AutomationError> {
        if first == 0 || last < first {
            return Err(AutomationError::InvalidReference(format!("{}:{}", first, last)));
        }
        Ok(Self { first, last })
    }
}

impl FromStr for RowRange {
    type Err = AutomationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AutomationError::InvalidReference(s.to_string());
        let (first, last) = s.trim().split_once(':').ok_or_else(invalid)?;
        let parse = |part: &str| -> Result<u32, AutomationError> {
            part.trim_start_matches('$').parse().map_err(|_| invalid())
        };
        Self::new(parse(first)?, parse(last)?)
    }
}

impl fmt::Display for RowRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}:${}", self.first, self.last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell_ref() {
        assert_eq!("A1".parse::<CellRef>().unwrap(), CellRef::new(0, 0));
        assert_eq!("C5".parse::<CellRef>().unwrap(), CellRef::new(4, 2));
        assert_eq!("$C$6".parse::<CellRef>().unwrap(), CellRef::new(5, 2));
        assert_eq!("AA1".parse::<CellRef>().unwrap(), CellRef::new(0, 26));
        assert_eq!("ab10".parse::<CellRef>().unwrap(), CellRef::new(9, 27));
    }

    #[test]
    fn test_invalid_cell_ref() {
        assert!("".parse::<CellRef>().is_err());
        assert!("C".parse::<CellRef>().is_err());
        assert!("5".parse::<CellRef>().is_err());
        assert!("C0".parse::<CellRef>().is_err());
        assert!("5C".parse::<CellRef>().is_err());
        assert!("C-5".parse::<CellRef>().is_err());
    }

    #[test]
    fn test_cell_ref_display() {
        assert_eq!(CellRef::new(4, 2).to_string(), "C5");
        assert_eq!(CellRef::new(0, 26).to_string(), "AA1");
        assert_eq!(CellRef::new(9, 701).to_string(), "ZZ10");
    }

    #[test]
    fn test_row_range() {
        let rows: RowRange = "$2:$4".parse().unwrap();
        assert_eq!(rows, RowRange { first: 2, last: 4 });
        assert_eq!(rows.to_string(), "$2:$4");

        assert_eq!("24:25".parse::<RowRange>().unwrap().to_string(), "$24:$25");
        assert!("$4:$2".parse::<RowRange>().is_err());
        assert!("$0:$2".parse::<RowRange>().is_err());
        assert!("$A:$B".parse::<RowRange>().is_err());
        assert!("12".parse::<RowRange>().is_err());
    }
}
