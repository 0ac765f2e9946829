//! Line break classification.
//!
//! A pair table based implementation of the Unicode line breaking rules,
//! with a few deviations that give nicer results for numbers and prefixes.

use alloc::vec;
use alloc::vec::Vec;

use super::unicode::{self, is_high_surrogate, is_low_surrogate};

/// A Unicode line break class.
///
/// The first 26 classes index the pair table. The remaining ones are
/// handled before the table is consulted and their order matters:
/// everything from `SP` on is white space, everything from `CR` on skips
/// the table and everything from `LF` on is a mandatory break.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum LineBreakClass {
    OP = 0,
    CL,
    QU,
    GL,
    NS,
    EX,
    SY,
    IS,
    PR,
    PO,
    NU,
    AL,
    ID,
    IN,
    HY,
    BA,
    BB,
    B2,
    ZW,
    CM,
    WJ,
    H2,
    H3,
    JL,
    JV,
    JT,
    /// Complex context (Thai, Lao, Khmer, Myanmar).
    SA,
    /// Surrogate code unit.
    SG,
    SP,
    CR,
    LF,
    BK,
}

impl LineBreakClass {
    /// Resolves the class to one the pair table knows about.
    #[inline]
    fn to_table_class(self) -> LineBreakClass {
        if self >= LineBreakClass::SA {
            LineBreakClass::ID
        } else {
            self
        }
    }
}

/// A line break opportunity after a character.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LineBreakType {
    /// No break is allowed.
    #[default]
    NoBreak,
    /// A break is allowed and a hyphen should be shown.
    SoftHyphen,
    /// A break is allowed.
    Break,
    /// A break is mandatory.
    ForcedBreak,
}

/// Line breaking and cursor properties of a UTF-16 code unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CharAttributes {
    /// The character is a space or a line separator.
    pub white_space: bool,
    /// The cursor may stop before this code unit.
    pub char_stop: bool,
    /// Break opportunity after this code unit.
    pub line_break_type: LineBreakType,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BreakAction {
    /// Direct break.
    DB,
    /// Indirect break: only after a space.
    IB,
    /// Indirect break for combining marks.
    CI,
    /// Prohibited break for combining marks.
    CP,
    /// Prohibited break.
    PB,
}

const TABLE_CLASSES: usize = LineBreakClass::SA as usize;

use BreakAction::{CI, CP, DB, IB, PB};

// Rows are the class before the opportunity, columns the class after it.
//
// Deviates from UAX #14: EX AL, SY AL, SY PO, SY PR, SY OP, AL PR, AL PO,
// PR PR, PO PO, PR PO, PO PR, HY PO, HY PR, HY OP, EX PO and NU EX are
// indirect breaks.
#[rustfmt::skip]
static BREAK_TABLE: [[BreakAction; TABLE_CLASSES]; TABLE_CLASSES] = [
    //        OP  CL  QU  GL  NS  EX  SY  IS  PR  PO  NU  AL  ID  IN  HY  BA  BB  B2  ZW  CM  WJ  H2  H3  JL  JV  JT
    /* OP */ [PB, PB, PB, PB, PB, PB, PB, PB, PB, PB, PB, PB, PB, PB, PB, PB, PB, PB, PB, CP, PB, PB, PB, PB, PB, PB],
    /* CL */ [DB, PB, IB, IB, PB, PB, PB, PB, IB, IB, IB, IB, DB, DB, IB, IB, DB, DB, PB, CI, PB, DB, DB, DB, DB, DB],
    /* QU */ [PB, PB, IB, IB, IB, PB, PB, PB, IB, IB, IB, IB, IB, IB, IB, IB, IB, IB, PB, CI, PB, IB, IB, IB, IB, IB],
    /* GL */ [IB, PB, IB, IB, IB, PB, PB, PB, IB, IB, IB, IB, IB, IB, IB, IB, IB, IB, PB, CI, PB, IB, IB, IB, IB, IB],
    /* NS */ [DB, PB, IB, IB, IB, PB, PB, PB, DB, DB, DB, DB, DB, DB, IB, IB, DB, DB, PB, CI, PB, DB, DB, DB, DB, DB],
    /* EX */ [DB, PB, IB, IB, IB, PB, PB, PB, DB, IB, DB, IB, DB, DB, IB, IB, DB, DB, PB, CI, PB, DB, DB, DB, DB, DB],
    /* SY */ [IB, PB, IB, IB, IB, PB, PB, PB, IB, IB, IB, IB, DB, DB, IB, IB, DB, DB, PB, CI, PB, DB, DB, DB, DB, DB],
    /* IS */ [DB, PB, IB, IB, IB, PB, PB, PB, DB, DB, IB, IB, DB, DB, IB, IB, DB, DB, PB, CI, PB, DB, DB, DB, DB, DB],
    /* PR */ [IB, PB, IB, IB, IB, PB, PB, PB, IB, IB, IB, IB, IB, DB, IB, IB, DB, DB, PB, CI, PB, IB, IB, IB, IB, IB],
    /* PO */ [IB, PB, IB, IB, IB, PB, PB, PB, IB, IB, IB, IB, DB, DB, IB, IB, DB, DB, PB, CI, PB, DB, DB, DB, DB, DB],
    /* NU */ [IB, PB, IB, IB, IB, IB, PB, PB, IB, IB, IB, IB, DB, IB, IB, IB, DB, DB, PB, CI, PB, DB, DB, DB, DB, DB],
    /* AL */ [IB, PB, IB, IB, IB, PB, PB, PB, IB, IB, IB, IB, DB, IB, IB, IB, DB, DB, PB, CI, PB, DB, DB, DB, DB, DB],
    /* ID */ [DB, PB, IB, IB, IB, PB, PB, PB, DB, IB, DB, DB, DB, IB, IB, IB, DB, DB, PB, CI, PB, DB, DB, DB, DB, DB],
    /* IN */ [DB, PB, IB, IB, IB, PB, PB, PB, DB, DB, DB, DB, DB, IB, IB, IB, DB, DB, PB, CI, PB, DB, DB, DB, DB, DB],
    /* HY */ [IB, PB, IB, IB, IB, PB, PB, PB, IB, IB, IB, DB, DB, DB, IB, IB, DB, DB, PB, CI, PB, DB, DB, DB, DB, DB],
    /* BA */ [DB, PB, IB, IB, IB, PB, PB, PB, DB, DB, DB, DB, DB, DB, IB, IB, DB, DB, PB, CI, PB, DB, DB, DB, DB, DB],
    /* BB */ [IB, PB, IB, IB, IB, PB, PB, PB, IB, IB, IB, IB, IB, IB, IB, IB, IB, IB, PB, CI, PB, IB, IB, IB, IB, IB],
    /* B2 */ [DB, PB, IB, IB, IB, PB, PB, PB, DB, DB, DB, DB, DB, DB, IB, IB, DB, PB, PB, CI, PB, DB, DB, DB, DB, DB],
    /* ZW */ [DB, DB, DB, DB, DB, DB, DB, DB, DB, DB, DB, DB, DB, DB, DB, DB, DB, DB, PB, DB, DB, DB, DB, DB, DB, DB],
    /* CM */ [DB, PB, IB, IB, IB, PB, PB, PB, DB, DB, IB, IB, DB, IB, IB, IB, DB, DB, PB, CI, PB, DB, DB, DB, DB, DB],
    /* WJ */ [IB, PB, IB, IB, IB, PB, PB, PB, IB, IB, IB, IB, IB, IB, IB, IB, IB, IB, PB, CI, PB, IB, IB, IB, IB, IB],
    /* H2 */ [DB, PB, IB, IB, IB, PB, PB, PB, DB, IB, DB, DB, DB, IB, IB, IB, DB, DB, PB, CI, PB, DB, DB, DB, IB, IB],
    /* H3 */ [DB, PB, IB, IB, IB, PB, PB, PB, DB, IB, DB, DB, DB, IB, IB, IB, DB, DB, PB, CI, PB, DB, DB, DB, DB, IB],
    /* JL */ [DB, PB, IB, IB, IB, PB, PB, PB, DB, IB, DB, DB, DB, IB, IB, IB, DB, DB, PB, CI, PB, IB, IB, IB, IB, DB],
    /* JV */ [DB, PB, IB, IB, IB, PB, PB, PB, DB, IB, DB, DB, DB, IB, IB, IB, DB, DB, PB, CI, PB, DB, DB, DB, IB, IB],
    /* JT */ [DB, PB, IB, IB, IB, PB, PB, PB, DB, IB, DB, DB, DB, IB, IB, IB, DB, DB, PB, CI, PB, DB, DB, DB, DB, IB],
];

#[inline]
fn break_action(cls: LineBreakClass, ncls: LineBreakClass) -> BreakAction {
    BREAK_TABLE[cls.to_table_class() as usize][ncls.to_table_class() as usize]
}

/// How the rolling classes move after a position was processed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Continuation {
    /// The position is the tail of a surrogate pair. Nothing moves.
    Skip,
    /// Only the last class moves.
    HoldClass,
    /// Both classes move.
    Advance,
}

struct Scanner<'a> {
    text: &'a [u16],
    /// Class of the last character that is not a space.
    cls: LineBreakClass,
    /// Class of the last character.
    lcls: LineBreakClass,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a [u16]) -> (Self, CharAttributes) {
        let (u, len) = unicode::code_point_at(text, 0);
        let mut cls = if len == 1 && unicode::is_surrogate(u) {
            LineBreakClass::AL
        } else {
            unicode::line_break_class(u)
        };

        if cls == LineBreakClass::LF {
            cls = LineBreakClass::BK;
        }

        let first = CharAttributes {
            white_space: cls == LineBreakClass::SP || cls == LineBreakClass::BK,
            char_stop: true,
            line_break_type: LineBreakType::NoBreak,
        };

        (Scanner { text, cls, lcls: cls }, first)
    }

    /// Classifies the code unit at `i`.
    ///
    /// Returns `None` for the low half of a surrogate pair, which was
    /// classified together with its high half.
    fn classify(&self, i: usize) -> Option<LineBreakClass> {
        let u = self.text[i];
        if is_low_surrogate(u) && is_high_surrogate(self.text[i - 1]) {
            return None;
        }

        let (cp, len) = unicode::code_point_at(self.text, i);
        if len == 1 && unicode::is_surrogate(cp) {
            return Some(LineBreakClass::AL);
        }

        Some(unicode::line_break_class(cp))
    }

    /// Processes the code unit at `i`, writing the break opportunity
    /// after the previous character.
    fn step(&mut self, i: usize, attributes: &mut [CharAttributes]) -> (Continuation, LineBreakClass) {
        attributes[i].white_space = false;
        attributes[i].char_stop = true;

        let ncls = match self.classify(i) {
            Some(ncls) => ncls,
            None => {
                attributes[i].char_stop = false;
                return (Continuation::Skip, self.cls);
            }
        };

        if ncls >= LineBreakClass::SP {
            attributes[i].white_space = true;
        }
        if ncls == LineBreakClass::CM {
            attributes[i].char_stop = false;
        }

        // Only the character right before this one can force a break.
        let mut line_break = if self.lcls >= LineBreakClass::LF {
            LineBreakType::ForcedBreak
        } else if self.lcls == LineBreakClass::CR && ncls != LineBreakClass::LF {
            LineBreakType::ForcedBreak
        } else {
            LineBreakType::NoBreak
        };
        let forced = line_break == LineBreakType::ForcedBreak;

        let continuation = if ncls == LineBreakClass::SP {
            Continuation::HoldClass
        } else if ncls >= LineBreakClass::CR {
            Continuation::Advance
        } else if self.cls == LineBreakClass::SA && ncls == LineBreakClass::SA {
            // Best guess. Script specific attributes may refine it.
            line_break = LineBreakType::Break;
            Continuation::Advance
        } else {
            let action = break_action(self.cls, ncls);
            self.cls = self.cls.to_table_class();

            let (table_break, continuation) = match action {
                BreakAction::DB => {
                    let t = if self.text[i - 1] == 0x00AD {
                        LineBreakType::SoftHyphen
                    } else {
                        LineBreakType::Break
                    };
                    (t, Continuation::Advance)
                }
                BreakAction::IB => {
                    let t = if self.lcls == LineBreakClass::SP {
                        LineBreakType::Break
                    } else {
                        LineBreakType::NoBreak
                    };
                    (t, Continuation::Advance)
                }
                BreakAction::CI => {
                    if self.lcls == LineBreakClass::SP {
                        if i > 1 {
                            attributes[i - 2].line_break_type = LineBreakType::Break;
                        }
                        (LineBreakType::NoBreak, Continuation::Advance)
                    } else {
                        (LineBreakType::NoBreak, Continuation::HoldClass)
                    }
                }
                BreakAction::CP => {
                    if self.lcls != LineBreakClass::SP {
                        (LineBreakType::NoBreak, Continuation::HoldClass)
                    } else {
                        (LineBreakType::NoBreak, Continuation::Advance)
                    }
                }
                BreakAction::PB => (LineBreakType::NoBreak, Continuation::Advance),
            };

            if !forced {
                line_break = table_break;
            }

            continuation
        };

        attributes[i - 1].line_break_type = line_break;
        (continuation, ncls)
    }

    fn update(&mut self, continuation: Continuation, ncls: LineBreakClass) {
        match continuation {
            Continuation::Skip => {}
            Continuation::HoldClass => self.lcls = ncls,
            Continuation::Advance => {
                self.cls = ncls;
                self.lcls = ncls;
            }
        }
    }
}

/// Computes line break opportunities, white space and cursor stops for
/// every code unit of `text`.
///
/// The break opportunity of a position is the one *after* it, so the last
/// code unit always gets a [`LineBreakType::ForcedBreak`].
pub fn calc_line_breaks(text: &[u16]) -> Vec<CharAttributes> {
    let mut attributes = vec![CharAttributes::default(); text.len()];
    fill_line_breaks(text, &mut attributes);
    attributes
}

pub(crate) fn fill_line_breaks(text: &[u16], attributes: &mut [CharAttributes]) {
    debug_assert_eq!(text.len(), attributes.len());

    if text.is_empty() {
        return;
    }

    let (mut scanner, first) = Scanner::new(text);
    attributes[0] = first;

    for i in 1..text.len() {
        let (continuation, ncls) = scanner.step(i, attributes);
        scanner.update(continuation, ncls);
    }

    attributes[text.len() - 1].line_break_type = LineBreakType::ForcedBreak;
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn breaks(s: &str) -> Vec<LineBreakType> {
        let text: Vec<u16> = s.encode_utf16().collect();
        calc_line_breaks(&text)
            .iter()
            .map(|a| a.line_break_type)
            .collect()
    }

    use LineBreakType::{Break as B, ForcedBreak as F, NoBreak as N, SoftHyphen as S};

    #[test]
    fn table_is_complete() {
        assert_eq!(TABLE_CLASSES, 26);
        assert_eq!(LineBreakClass::JT as usize, TABLE_CLASSES - 1);
        for row in BREAK_TABLE.iter() {
            assert_eq!(row.len(), TABLE_CLASSES);
        }

        // Everything but another ZW can follow a zero width space.
        for (i, action) in BREAK_TABLE[LineBreakClass::ZW as usize].iter().enumerate() {
            if i == LineBreakClass::ZW as usize {
                assert_eq!(*action, PB);
            } else {
                assert_eq!(*action, DB);
            }
        }
    }

    #[test]
    fn table_deviations() {
        use LineBreakClass::*;

        let indirect = [
            (EX, AL),
            (SY, AL),
            (SY, PO),
            (SY, PR),
            (SY, OP),
            (AL, PR),
            (AL, PO),
            (PR, PR),
            (PO, PO),
            (PR, PO),
            (PO, PR),
            (HY, PO),
            (HY, PR),
            (HY, OP),
            (EX, PO),
            (NU, EX),
        ];

        for (a, b) in indirect {
            assert_eq!(break_action(a, b), IB, "{:?} {:?}", a, b);
        }

        assert_eq!(break_action(OP, CL), PB);
        assert_eq!(break_action(OP, CM), CP);
        assert_eq!(break_action(AL, CM), CI);
        assert_eq!(break_action(ID, ID), DB);
        assert_eq!(break_action(SA, SA), DB);
    }

    #[test]
    fn empty() {
        assert!(calc_line_breaks(&[]).is_empty());
    }

    #[test]
    fn last_char_is_forced() {
        assert_eq!(breaks("a"), [F]);
        assert_eq!(breaks("("), [F]);
        assert_eq!(breaks("ab"), [N, F]);
    }

    #[test]
    fn spaces() {
        assert_eq!(breaks("a b"), [N, B, F]);
        assert_eq!(breaks("1!"), [N, F]);
        assert_eq!(breaks("1 !"), [N, B, F]);
        assert_eq!(breaks("( )"), [N, N, F]);

        let text: Vec<u16> = " a".encode_utf16().collect();
        let attrs = calc_line_breaks(&text);
        assert!(attrs[0].white_space);
        assert!(!attrs[1].white_space);
    }

    #[test]
    fn soft_hyphen() {
        assert_eq!(breaks("a\u{AD}b"), [N, S, F]);
    }

    #[test]
    fn mandatory_breaks() {
        assert_eq!(breaks("a\r\nb"), [N, N, F, F]);
        assert_eq!(breaks("a\rb"), [N, F, F]);
        assert_eq!(breaks("a\nb"), [N, F, F]);
        assert_eq!(breaks("\nb"), [F, F]);

        // A space after a newline is an ordinary break opportunity.
        assert_eq!(breaks("a\n b"), [N, F, B, F]);
        assert_eq!(breaks("a\r b"), [N, F, B, F]);

        let text: Vec<u16> = "\nb".encode_utf16().collect();
        assert!(calc_line_breaks(&text)[0].white_space);
    }

    #[test]
    fn complex_context() {
        assert_eq!(breaks("\u{0E01}\u{0E02}"), [B, F]);
    }

    #[test]
    fn combining_marks() {
        let text: Vec<u16> = "a\u{301}".encode_utf16().collect();
        let attrs = calc_line_breaks(&text);
        assert!(attrs[0].char_stop);
        assert!(!attrs[1].char_stop);
        assert_eq!(attrs[0].line_break_type, N);

        // A mark after a space breaks before the space.
        assert_eq!(breaks("a \u{301}b"), [B, N, N, F]);
    }

    #[test]
    fn surrogate_pairs() {
        // a U+1F600 b
        let text = [0x61, 0xD83D, 0xDE00, 0x62];
        let attrs = calc_line_breaks(&text);
        assert_eq!(attrs[0].line_break_type, B);
        assert_eq!(attrs[1].line_break_type, N);
        assert_eq!(attrs[2].line_break_type, B);
        assert_eq!(attrs[3].line_break_type, F);
        assert!(attrs[1].char_stop);
        assert!(!attrs[2].char_stop);

        let text = [0xD83D, 0xDE00, 0x62];
        let attrs = calc_line_breaks(&text);
        assert!(!attrs[1].char_stop);
        assert_eq!(attrs[0].line_break_type, N);
        assert_eq!(attrs[1].line_break_type, B);
    }

    #[test]
    fn unpaired_surrogates_are_alphabetic() {
        let text = [0x61, 0xD800, 0x62];
        let attrs = calc_line_breaks(&text);
        assert_eq!(attrs[0].line_break_type, N);
        assert_eq!(attrs[1].line_break_type, N);
        assert!(attrs[1].char_stop);

        let text = [0xDC00, 0x62];
        assert_eq!(calc_line_breaks(&text)[0].line_break_type, N);
    }
}
