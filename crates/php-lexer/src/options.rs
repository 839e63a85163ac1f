use bitflags::bitflags;

use crate::state::LexicalState;
use crate::strings::StringPool;

bitflags! {
    /// Optional language behaviour, each flag independently toggleable.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LanguageFeatures: u32 {
        /// Accept `<?` as an open tag.
        const SHORT_OPEN_TAGS = 1 << 0;
        /// Decode `\u{...}` in double-quoted strings and heredocs.
        const UNICODE_CODEPOINT_ESCAPES = 1 << 1;

        const BASIC = 0;
        const PHP70 = Self::UNICODE_CODEPOINT_ESCAPES.bits();
    }
}

/// Text encoding of the source, used to decode input bytes and to encode
/// characters when a literal is rebuilt next to raw escape bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    Latin1,
}

impl Encoding {
    /// Decode source bytes. Invalid UTF-8 is replaced, Latin-1 always maps.
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Encoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
        }
    }

    /// Decode bytes only if they are valid in this encoding.
    pub fn decode_exact(self, bytes: &[u8]) -> Option<String> {
        match self {
            Encoding::Utf8 => String::from_utf8(bytes.to_vec()).ok(),
            Encoding::Latin1 => Some(self.decode(bytes)),
        }
    }

    /// Append the encoded form of `c`. Characters Latin-1 cannot hold
    /// become `?`.
    pub fn encode_char(self, c: char, out: &mut Vec<u8>) {
        match self {
            Encoding::Utf8 => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
            Encoding::Latin1 => out.push(u8::try_from(u32::from(c)).unwrap_or(b'?')),
        }
    }
}

impl std::str::FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Encoding::Utf8),
            "latin1" | "latin-1" | "iso-8859-1" => Ok(Encoding::Latin1),
            other => Err(format!("unknown encoding '{other}'")),
        }
    }
}

/// Scanner construction settings.
#[derive(Debug, Clone, Default)]
pub struct ScannerOptions {
    pub encoding: Encoding,
    pub features: LanguageFeatures,
    /// Added to every span start, for scanning a suffix of a larger file.
    pub position_shift: usize,
    pub initial_state: LexicalState,
    /// String-table pool to check out from; the process-wide pool if unset.
    pub pool: Option<StringPool>,
}

impl ScannerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_features(mut self, features: LanguageFeatures) -> Self {
        self.features = features;
        self
    }

    pub fn with_position_shift(mut self, shift: usize) -> Self {
        self.position_shift = shift;
        self
    }

    pub fn with_initial_state(mut self, state: LexicalState) -> Self {
        self.initial_state = state;
        self
    }

    pub fn with_pool(mut self, pool: StringPool) -> Self {
        self.pool = Some(pool);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_features_combine() {
        let both = LanguageFeatures::SHORT_OPEN_TAGS | LanguageFeatures::PHP70;
        assert!(both.contains(LanguageFeatures::UNICODE_CODEPOINT_ESCAPES));
        assert!(both.contains(LanguageFeatures::SHORT_OPEN_TAGS));
        assert!(LanguageFeatures::BASIC.is_empty());
    }

    #[test]
    fn test_latin1_round_trip() {
        let mut out = Vec::new();
        Encoding::Latin1.encode_char('é', &mut out);
        Encoding::Latin1.encode_char('€', &mut out);
        assert_eq!(out, vec![0xe9, b'?']);
        assert_eq!(Encoding::Latin1.decode(&[0xe9]), "é");
    }

    #[test]
    fn test_utf8_exact_rejects_invalid() {
        assert_eq!(Encoding::Utf8.decode_exact(&[0xff]), None);
        assert_eq!(Encoding::Utf8.decode_exact(b"ok").as_deref(), Some("ok"));
    }

    #[test]
    fn test_encoding_from_str() {
        assert_eq!("UTF-8".parse::<Encoding>(), Ok(Encoding::Utf8));
        assert_eq!("latin1".parse::<Encoding>(), Ok(Encoding::Latin1));
        assert!("ebcdic".parse::<Encoding>().is_err());
    }
}
