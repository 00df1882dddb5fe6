//! Character cursor driving the [`crate::decoder::Decoder`].
//!
//! `Cursor` is the "Location & source stream" component: it pulls code
//! points out of the decoder, tracks `(line, column)`, and lets the
//! tokenizer push a character back so a single rune of lookahead can decide
//! which scanning routine to dispatch to.

use crate::decoder::Decoder;
use layercfg_util::{DecoderError, Location};

/// The sentinel returned once the underlying byte stream is exhausted.
pub const EOF: char = '\0';

pub struct Cursor<'a> {
    decoder: Decoder<'a>,
    location: Location,
    pushed_back: Vec<(char, Location)>,
}

impl<'a> Cursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            decoder: Decoder::new(bytes),
            location: Location::START,
            pushed_back: Vec::new(),
        }
    }

    /// Returns the next character and the location it started at.
    ///
    /// `\0` marks end of stream; it is returned repeatedly once reached.
    pub fn get_char(&mut self) -> Result<(char, Location), DecoderError> {
        if let Some((ch, loc)) = self.pushed_back.pop() {
            return Ok((ch, loc));
        }

        let here = self.location;
        let codepoint = self.decoder.next_codepoint()?;
        if codepoint == 0 {
            return Ok((EOF, here));
        }

        // Values from the DFA are already guaranteed valid scalar values.
        let ch = char::from_u32(codepoint).unwrap();
        self.location.advance(ch);
        Ok((ch, here))
    }

    /// Restores a character (and the location it started at) so the next
    /// `get_char` call returns it again.
    pub fn push_back(&mut self, ch: char, at: Location) {
        self.pushed_back.push((ch, at));
    }

    /// The location the next `get_char` call will report, absent push-back.
    pub fn location(&self) -> Location {
        self.location
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_characters_in_order() {
        let mut cursor = Cursor::new("ab".as_bytes());
        assert_eq!(cursor.get_char().unwrap().0, 'a');
        assert_eq!(cursor.get_char().unwrap().0, 'b');
        assert_eq!(cursor.get_char().unwrap().0, EOF);
        assert_eq!(cursor.get_char().unwrap().0, EOF);
    }

    #[test]
    fn push_back_replays_character_and_location() {
        let mut cursor = Cursor::new("ab".as_bytes());
        let (ch, loc) = cursor.get_char().unwrap();
        assert_eq!(ch, 'a');
        cursor.push_back(ch, loc);
        assert_eq!(cursor.get_char().unwrap(), (ch, loc));
        assert_eq!(cursor.get_char().unwrap().0, 'b');
    }

    #[test]
    fn newline_resets_column_and_bumps_line() {
        let mut cursor = Cursor::new("a\nb".as_bytes());
        let (_, loc_a) = cursor.get_char().unwrap();
        assert_eq!(loc_a, Location::new(1, 1));
        let (_, loc_nl) = cursor.get_char().unwrap();
        assert_eq!(loc_nl, Location::new(1, 2));
        let (_, loc_b) = cursor.get_char().unwrap();
        assert_eq!(loc_b, Location::new(2, 1));
    }
}
