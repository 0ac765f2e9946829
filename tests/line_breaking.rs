use harfshape::{char_attributes, CharAttributes, LineBreakType, Script, ScriptItem, ShapeError};

fn breaks(s: &str) -> String {
    let text: Vec<u16> = s.encode_utf16().collect();
    let items = [ScriptItem::new(0, text.len(), Script::Common, 0)];
    let attributes = char_attributes(&text, &items).unwrap();
    format(&attributes)
}

fn format(attributes: &[CharAttributes]) -> String {
    attributes
        .iter()
        .map(|a| match a.line_break_type {
            LineBreakType::NoBreak => '.',
            LineBreakType::SoftHyphen => '-',
            LineBreakType::Break => '|',
            LineBreakType::ForcedBreak => '!',
        })
        .collect()
}

#[test]
fn words() {
    assert_eq!(breaks("Hello world"), ".....|....!");
    assert_eq!(breaks("a  b"), "..|!");
}

#[test]
fn mandatory_breaks() {
    assert_eq!(breaks("a\nb\r\nc"), ".!..!!");
    assert_eq!(breaks("a\n b"), ".!|!");
}

#[test]
fn numbers_and_prefixes() {
    // No break inside a price or after a hyphen before a digit.
    assert_eq!(breaks("$10.50"), ".....!");
    assert_eq!(breaks("-5"), ".!");
}

#[test]
fn soft_hyphen() {
    assert_eq!(breaks("co\u{AD}op"), "..-.!");
}

#[test]
fn whitespace_and_char_stops() {
    let text: Vec<u16> = "a \u{301}\u{1F600}".encode_utf16().collect();
    let items = [ScriptItem::new(0, text.len(), Script::Common, 0)];
    let attributes = char_attributes(&text, &items).unwrap();

    let white: Vec<bool> = attributes.iter().map(|a| a.white_space).collect();
    assert_eq!(white, [false, true, false, false, false]);

    let stops: Vec<bool> = attributes.iter().map(|a| a.char_stop).collect();
    assert_eq!(stops, [true, true, false, true, false]);
}

#[test]
fn runs_outside_of_the_string() {
    let text: Vec<u16> = "abc".encode_utf16().collect();
    let items = [
        ScriptItem::new(0, 2, Script::Common, 0),
        ScriptItem::new(2, 2, Script::Common, 0),
    ];
    assert_eq!(
        char_attributes(&text, &items),
        Err(ShapeError::InvalidRun {
            pos: 2,
            end: 4,
            len: 3
        })
    );
}

#[test]
fn empty() {
    assert_eq!(breaks(""), "");
}
