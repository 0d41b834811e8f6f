//! WR3223 protocol command codes
//!
//! Every wire request names a two-character command code. Codes are
//! case-sensitive: `Az` (defrost fan level) and `AA` (defrost end temperature)
//! are different commands.

use std::fmt;

/// Two-character command code understood by the controller firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProtocolCommand {
    T1,
    T2,
    T3,
    T4,
    T5,
    T6,
    T7,
    T8,
    Nz,
    Na,
    Zh,
    Ls,
    Md,
    Sp,
    Ra,
    D1,
    D2,
    D3,
    E1,
    E2,
    E3,
    Lr,
    L1,
    L2,
    L3,
    Es,
    Ew,
    Ae,
    Aa,
    Az,
    Ap,
    An,
    Ar,
    Sm,
    Sn,
    Da,
    De,
    Km,
    Pa,
    S1,
    S2,
    S3,
    Ua,
    Uz,
    Ws,
    Wp,
    /// Status word read
    Ta,
    /// EVU blockade word
    Tf,
    /// Status / keep-alive write
    Sw,
    /// Relay word
    Rl,
    /// Error word
    Er,
}

impl ProtocolCommand {
    /// All command codes.
    pub const ALL: [ProtocolCommand; 51] = [
        Self::T1,
        Self::T2,
        Self::T3,
        Self::T4,
        Self::T5,
        Self::T6,
        Self::T7,
        Self::T8,
        Self::Nz,
        Self::Na,
        Self::Zh,
        Self::Ls,
        Self::Md,
        Self::Sp,
        Self::Ra,
        Self::D1,
        Self::D2,
        Self::D3,
        Self::E1,
        Self::E2,
        Self::E3,
        Self::Lr,
        Self::L1,
        Self::L2,
        Self::L3,
        Self::Es,
        Self::Ew,
        Self::Ae,
        Self::Aa,
        Self::Az,
        Self::Ap,
        Self::An,
        Self::Ar,
        Self::Sm,
        Self::Sn,
        Self::Da,
        Self::De,
        Self::Km,
        Self::Pa,
        Self::S1,
        Self::S2,
        Self::S3,
        Self::Ua,
        Self::Uz,
        Self::Ws,
        Self::Wp,
        Self::Ta,
        Self::Tf,
        Self::Sw,
        Self::Rl,
        Self::Er,
    ];

    /// The code as sent on the wire.
    pub const fn code(self) -> &'static str {
        match self {
            Self::T1 => "T1",
            Self::T2 => "T2",
            Self::T3 => "T3",
            Self::T4 => "T4",
            Self::T5 => "T5",
            Self::T6 => "T6",
            Self::T7 => "T7",
            Self::T8 => "T8",
            Self::Nz => "NZ",
            Self::Na => "NA",
            Self::Zh => "ZH",
            Self::Ls => "LS",
            Self::Md => "MD",
            Self::Sp => "SP",
            Self::Ra => "RA",
            Self::D1 => "D1",
            Self::D2 => "D2",
            Self::D3 => "D3",
            Self::E1 => "E1",
            Self::E2 => "E2",
            Self::E3 => "E3",
            Self::Lr => "LR",
            Self::L1 => "L1",
            Self::L2 => "L2",
            Self::L3 => "L3",
            Self::Es => "ES",
            Self::Ew => "EW",
            Self::Ae => "AE",
            Self::Aa => "AA",
            Self::Az => "Az",
            Self::Ap => "AP",
            Self::An => "AN",
            Self::Ar => "AR",
            Self::Sm => "SM",
            Self::Sn => "SN",
            Self::Da => "DA",
            Self::De => "DE",
            Self::Km => "KM",
            Self::Pa => "PA",
            Self::S1 => "S1",
            Self::S2 => "S2",
            Self::S3 => "S3",
            Self::Ua => "UA",
            Self::Uz => "UZ",
            Self::Ws => "WS",
            Self::Wp => "WP",
            Self::Ta => "Ta",
            Self::Tf => "Tf",
            Self::Sw => "SW",
            Self::Rl => "RL",
            Self::Er => "ER",
        }
    }

    /// The two code bytes as framed on the wire.
    #[inline]
    pub fn bytes(self) -> [u8; 2] {
        let code = self.code().as_bytes();
        [code[0], code[1]]
    }

    /// Look up a command by its exact wire code.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|cmd| cmd.code() == code)
    }
}

impl fmt::Display for ProtocolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_codes_are_unique_two_char_ascii() {
        let mut seen = HashSet::new();
        for cmd in ProtocolCommand::ALL {
            let code = cmd.code();
            assert_eq!(code.len(), 2, "{:?}", cmd);
            assert!(code.is_ascii());
            assert!(seen.insert(code), "duplicate code {}", code);
        }
    }

    #[test]
    fn test_from_code_is_case_sensitive() {
        assert_eq!(ProtocolCommand::from_code("Az"), Some(ProtocolCommand::Az));
        assert_eq!(ProtocolCommand::from_code("AA"), Some(ProtocolCommand::Aa));
        assert_eq!(ProtocolCommand::from_code("AZ"), None);
        assert_eq!(ProtocolCommand::from_code("Ta"), Some(ProtocolCommand::Ta));
        assert_eq!(ProtocolCommand::from_code("TA"), None);
    }

    #[test]
    fn test_bytes() {
        assert_eq!(ProtocolCommand::Rl.bytes(), *b"RL");
        assert_eq!(ProtocolCommand::Tf.to_string(), "Tf");
    }
}
