//! Metadata tokens as they appear in dynamic method instruction streams.
//!
//! A dynamic method has no metadata tables of its own. Its generator hands out tokens whose
//! high byte still names a metadata table, while the low 24 bits are an index into the
//! capture's symbol table instead of a table row.

use std::fmt;
use std::hash::{Hash, Hasher};

/// A metadata token: table byte in bits 24-31, row (or symbol index) in bits 0-23.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Token(pub u32);

impl Token {
    /// `TypeRef` table byte
    pub const TYPE_REF: u8 = 0x01;
    /// `TypeDef` table byte, used for type handles by the dynamic IL generator
    pub const TYPE_DEF: u8 = 0x02;
    /// `Field` table byte
    pub const FIELD: u8 = 0x04;
    /// `MethodDef` table byte
    pub const METHOD_DEF: u8 = 0x06;
    /// `MemberRef` table byte, used for var-arg call sites
    pub const MEMBER_REF: u8 = 0x0A;
    /// `StandAloneSig` table byte
    pub const STANDALONE_SIG: u8 = 0x11;
    /// `TypeSpec` table byte
    pub const TYPE_SPEC: u8 = 0x1B;
    /// `MethodSpec` table byte
    pub const METHOD_SPEC: u8 = 0x2B;
    /// User string heap marker
    pub const USER_STRING: u8 = 0x70;

    /// Creates a new token from a raw 32-bit value
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Creates a token from a table byte and a row
    #[must_use]
    pub fn from_parts(table: u8, row: u32) -> Self {
        Token((u32::from(table) << 24) | (row & 0x00FF_FFFF))
    }

    /// Returns the raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Extracts the table type from the token (high byte)
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Extracts the row index from the token (low 24 bits)
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns true if this is a null token (value 0)
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_token_parts() {
        let token = Token::new(0x0600_0001);
        assert_eq!(token.value(), 0x0600_0001);
        assert_eq!(token.table(), Token::METHOD_DEF);
        assert_eq!(token.row(), 1);

        let string = Token::new(0x7000_0123);
        assert_eq!(string.table(), Token::USER_STRING);
        assert_eq!(string.row(), 0x123);

        assert_eq!(Token::new(0x06FF_FFFF).row(), 0x00FF_FFFF);
    }

    #[test]
    fn test_token_from_parts() {
        assert_eq!(Token::from_parts(Token::FIELD, 7), Token(0x0400_0007));
        // Row is truncated to 24 bits
        assert_eq!(Token::from_parts(Token::TYPE_DEF, 0x0100_0002), Token(0x0200_0002));
    }

    #[test]
    fn test_token_is_null() {
        assert!(Token(0).is_null());
        assert!(!Token(0x0200_0001).is_null());
    }

    #[test]
    fn test_token_conversions() {
        let token: Token = 0x0A00_0003u32.into();
        let raw: u32 = token.into();
        assert_eq!(raw, 0x0A00_0003);
    }

    #[test]
    fn test_token_formatting() {
        let token = Token(0x0200_0005);
        assert_eq!(format!("{token}"), "0x02000005");
        assert_eq!(
            format!("{token:?}"),
            "Token(0x02000005, table: 0x02, row: 5)"
        );
    }

    #[test]
    fn test_token_hash() {
        let mut set = HashSet::new();
        set.insert(Token(0x0600_0001));
        set.insert(Token(0x0600_0001));
        set.insert(Token(0x0600_0002));
        assert_eq!(set.len(), 2);
    }
}
