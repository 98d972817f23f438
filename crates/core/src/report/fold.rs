//! Diacritic folding for the PDF renderer.
//!
//! The built-in PDF fonts only cover a narrow single-byte repertoire, so every
//! string bound for the PDF is reduced to plain ASCII first. Accented letters
//! keep their case (`É` becomes `E`), typographic punctuation becomes its
//! ASCII counterpart, and anything left over becomes `?`.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Fold `text` to ASCII. Folding ASCII text returns it unchanged.
pub fn fold_diacritics(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii() {
            out.push(c);
        } else if let Some(folded) = substitute(c) {
            out.push_str(folded);
        } else {
            let stripped: String =
                std::iter::once(c).nfkd().filter(|m| !is_combining_mark(*m)).collect();
            if !stripped.is_empty() && stripped.is_ascii() {
                out.push_str(&stripped);
            } else {
                out.push('?');
            }
        }
    }
    out
}

fn substitute(c: char) -> Option<&'static str> {
    let folded = match c {
        // Latin-1 Supplement
        'À'..='Å' => "A",
        'à'..='å' => "a",
        'Æ' => "AE",
        'æ' => "ae",
        'Ç' => "C",
        'ç' => "c",
        'È'..='Ë' => "E",
        'è'..='ë' => "e",
        'Ì'..='Ï' => "I",
        'ì'..='ï' => "i",
        'Ð' => "D",
        'ð' => "d",
        'Ñ' => "N",
        'ñ' => "n",
        'Ò'..='Ö' | 'Ø' => "O",
        'ò'..='ö' | 'ø' => "o",
        'Ù'..='Ü' => "U",
        'ù'..='ü' => "u",
        'Ý' => "Y",
        'ý' | 'ÿ' => "y",
        'Þ' => "Th",
        'þ' => "th",
        'ß' => "ss",
        '×' => "x",
        '÷' => "/",
        '°' => "o",
        'µ' => "u",
        '±' => "+/-",
        '²' => "2",
        '³' => "3",
        '½' => "1/2",
        '¼' => "1/4",
        '¾' => "3/4",
        // Latin Extended-A letters with no NFKD decomposition
        'Đ' => "D",
        'đ' => "d",
        'Ħ' => "H",
        'ħ' => "h",
        'ı' => "i",
        'Ł' => "L",
        'ł' => "l",
        'Œ' => "OE",
        'œ' => "oe",
        'Ŧ' => "T",
        'ŧ' => "t",
        // Greek letters seen in drug names
        'α' => "alpha",
        'β' => "beta",
        'γ' => "gamma",
        'δ' => "delta",
        'ω' => "omega",
        // Punctuation and spacing
        '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}'
        | '\u{2212}' => {
            "-"
        }
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => "'",
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => "\"",
        '\u{00AB}' => "<<",
        '\u{00BB}' => ">>",
        '\u{2026}' => "...",
        '\u{2022}' | '\u{00B7}' => "*",
        '\u{00A0}' | '\u{2002}' | '\u{2003}' | '\u{2009}' | '\u{202F}' => " ",
        '\u{2264}' => "<=",
        '\u{2265}' => ">=",
        '\u{2122}' => "(TM)",
        '\u{00AE}' => "(R)",
        '\u{00A9}' => "(C)",
        '\u{20AC}' => "EUR",
        '\u{00A3}' => "GBP",
        _ => return None,
    };
    Some(folded)
}
