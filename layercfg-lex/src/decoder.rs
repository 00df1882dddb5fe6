//! UTF-8 decoder built on the Bjoern Hoehrmann DFA.
//!
//! The decoder turns a byte slice into a sequence of Unicode scalar values.
//! It has no notion of lines or columns — that bookkeeping belongs to
//! [`crate::cursor::Cursor`], which drives the decoder one code point at a
//! time.

use layercfg_util::DecoderError;

const UTF8_ACCEPT: u8 = 0;
const UTF8_REJECT: u8 = 12;

#[rustfmt::skip]
const UTF8D: [u8; 364] = [
    // Byte -> character class.
    0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0, 0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,
    0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0, 0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,
    0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0, 0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,
    0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0, 0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,
    1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1, 9,9,9,9,9,9,9,9,9,9,9,9,9,9,9,9,
    7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7, 7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,
    8,8,2,2,2,2,2,2,2,2,2,2,2,2,2,2, 2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,
    10,3,3,3,3,3,3,3,3,3,3,3,3,4,3,3, 11,6,6,6,5,8,8,8,8,8,8,8,8,8,8,8,

    // (state, class) -> state transition table.
    0,12,24,36,60,96,84,12,12,12,48,72, 12,12,12,12,12,12,12,12,12,12,12,12,
    12,0,12,12,12,12,12,0,12,0,12,12, 12,24,12,12,12,12,12,24,12,24,12,12,
    12,12,12,12,12,12,12,24,12,12,12,12, 12,24,12,12,12,12,12,12,12,24,12,12,
    12,12,12,12,12,12,12,36,12,36,12,12, 12,36,12,12,12,12,12,36,12,36,12,12,
    12,36,12,12,12,12,12,12,12,12,12,12,
];

/// A pull-based UTF-8 decoder over an in-memory byte buffer.
pub struct Decoder<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    /// Decodes and returns the next code point, or `Ok(0)` at clean EOF.
    pub fn next_codepoint(&mut self) -> Result<u32, DecoderError> {
        let mut state = UTF8_ACCEPT;
        let mut codep: u32 = 0;
        let start = self.position;

        loop {
            let Some(&byte) = self.bytes.get(self.position) else {
                if state == UTF8_ACCEPT {
                    return Ok(0);
                }
                return Err(DecoderError::Incomplete);
            };

            let class = UTF8D[byte as usize];
            codep = if state != UTF8_ACCEPT {
                (u32::from(byte) & 0x3f) | (codep << 6)
            } else {
                (0xffu32 >> class) & u32::from(byte)
            };
            state = UTF8D[(256 + state as usize + class as usize)];
            self.position += 1;

            match state {
                UTF8_ACCEPT => return Ok(codep),
                UTF8_REJECT => {
                    return Err(DecoderError::InvalidByte {
                        byte,
                        position: start,
                    })
                }
                _ => continue,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(bytes: &[u8]) -> Result<Vec<char>, DecoderError> {
        let mut decoder = Decoder::new(bytes);
        let mut out = Vec::new();
        loop {
            let cp = decoder.next_codepoint()?;
            if cp == 0 && decoder.position >= bytes.len() {
                break;
            }
            out.push(char::from_u32(cp).unwrap());
        }
        Ok(out)
    }

    #[test]
    fn decodes_ascii() {
        assert_eq!(decode_all(b"abc").unwrap(), vec!['a', 'b', 'c']);
    }

    #[test]
    fn decodes_multibyte() {
        let s = "héllo — wörld";
        assert_eq!(decode_all(s.as_bytes()).unwrap(), s.chars().collect::<Vec<_>>());
    }

    #[test]
    fn rejects_invalid_byte() {
        let err = decode_all(&[0x61, 0xff, 0x62]).unwrap_err();
        assert!(matches!(err, DecoderError::InvalidByte { byte: 0xff, position: 1 }));
    }

    #[test]
    fn rejects_truncated_sequence() {
        let err = decode_all(&[0xe2, 0x82]).unwrap_err();
        assert!(matches!(err, DecoderError::Incomplete));
    }

    #[test]
    fn empty_input_yields_no_codepoints() {
        assert_eq!(decode_all(b"").unwrap(), Vec::<char>::new());
    }
}
