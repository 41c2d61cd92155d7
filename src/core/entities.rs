//! Character and Entity References
//!
//! Two tables live here:
//! - the XML predefined entities plus numeric character references, decoded
//!   by the tokenizer (`decode_text`)
//! - the HTML 4.01 named reference set, used by the markup normalizer to turn
//!   author-facing references like `&nbsp;` into literal characters before the
//!   strict parser sees them (`html_entities`, `decode_html_entities`)
//!
//! Uses Cow for zero-copy when no references are present.

use memchr::memchr;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Names of U+00A0..=U+00FF in code point order
const LATIN1: [&str; 96] = [
    "nbsp", "iexcl", "cent", "pound", "curren", "yen", "brvbar", "sect", "uml", "copy", "ordf",
    "laquo", "not", "shy", "reg", "macr", "deg", "plusmn", "sup2", "sup3", "acute", "micro",
    "para", "middot", "cedil", "sup1", "ordm", "raquo", "frac14", "frac12", "frac34", "iquest",
    "Agrave", "Aacute", "Acirc", "Atilde", "Auml", "Aring", "AElig", "Ccedil", "Egrave", "Eacute",
    "Ecirc", "Euml", "Igrave", "Iacute", "Icirc", "Iuml", "ETH", "Ntilde", "Ograve", "Oacute",
    "Ocirc", "Otilde", "Ouml", "times", "Oslash", "Ugrave", "Uacute", "Ucirc", "Uuml", "Yacute",
    "THORN", "szlig", "agrave", "aacute", "acirc", "atilde", "auml", "aring", "aelig", "ccedil",
    "egrave", "eacute", "ecirc", "euml", "igrave", "iacute", "icirc", "iuml", "eth", "ntilde",
    "ograve", "oacute", "ocirc", "otilde", "ouml", "divide", "oslash", "ugrave", "uacute", "ucirc",
    "uuml", "yacute", "thorn", "yuml",
];

/// Symbols, Greek letters and the special set of HTML 4.01.
///
/// The markup-significant references (amp, lt, gt, quot, apos) are left out:
/// decoding them would let text be reinterpreted as markup.
const SYMBOLS: &[(&str, u32)] = &[
    ("OElig", 338), ("oelig", 339), ("Scaron", 352), ("scaron", 353), ("Yuml", 376),
    ("fnof", 402), ("circ", 710), ("tilde", 732),
    ("Alpha", 913), ("Beta", 914), ("Gamma", 915), ("Delta", 916), ("Epsilon", 917),
    ("Zeta", 918), ("Eta", 919), ("Theta", 920), ("Iota", 921), ("Kappa", 922),
    ("Lambda", 923), ("Mu", 924), ("Nu", 925), ("Xi", 926), ("Omicron", 927), ("Pi", 928),
    ("Rho", 929), ("Sigma", 931), ("Tau", 932), ("Upsilon", 933), ("Phi", 934), ("Chi", 935),
    ("Psi", 936), ("Omega", 937),
    ("alpha", 945), ("beta", 946), ("gamma", 947), ("delta", 948), ("epsilon", 949),
    ("zeta", 950), ("eta", 951), ("theta", 952), ("iota", 953), ("kappa", 954),
    ("lambda", 955), ("mu", 956), ("nu", 957), ("xi", 958), ("omicron", 959), ("pi", 960),
    ("rho", 961), ("sigmaf", 962), ("sigma", 963), ("tau", 964), ("upsilon", 965),
    ("phi", 966), ("chi", 967), ("psi", 968), ("omega", 969), ("thetasym", 977),
    ("upsih", 978), ("piv", 982),
    ("ensp", 8194), ("emsp", 8195), ("thinsp", 8201), ("zwnj", 8204), ("zwj", 8205),
    ("lrm", 8206), ("rlm", 8207), ("ndash", 8211), ("mdash", 8212), ("lsquo", 8216),
    ("rsquo", 8217), ("sbquo", 8218), ("ldquo", 8220), ("rdquo", 8221), ("bdquo", 8222),
    ("dagger", 8224), ("Dagger", 8225), ("bull", 8226), ("hellip", 8230), ("permil", 8240),
    ("prime", 8242), ("Prime", 8243), ("lsaquo", 8249), ("rsaquo", 8250), ("oline", 8254),
    ("frasl", 8260), ("euro", 8364),
    ("image", 8465), ("weierp", 8472), ("real", 8476), ("trade", 8482), ("alefsym", 8501),
    ("larr", 8592), ("uarr", 8593), ("rarr", 8594), ("darr", 8595), ("harr", 8596),
    ("crarr", 8629), ("lArr", 8656), ("uArr", 8657), ("rArr", 8658), ("dArr", 8659),
    ("hArr", 8660),
    ("forall", 8704), ("part", 8706), ("exist", 8707), ("empty", 8709), ("nabla", 8711),
    ("isin", 8712), ("notin", 8713), ("ni", 8715), ("prod", 8719), ("sum", 8721),
    ("minus", 8722), ("lowast", 8727), ("radic", 8730), ("prop", 8733), ("infin", 8734),
    ("ang", 8736), ("and", 8743), ("or", 8744), ("cap", 8745), ("cup", 8746), ("int", 8747),
    ("there4", 8756), ("sim", 8764), ("cong", 8773), ("asymp", 8776), ("ne", 8800),
    ("equiv", 8801), ("le", 8804), ("ge", 8805), ("sub", 8834), ("sup", 8835),
    ("nsub", 8836), ("sube", 8838), ("supe", 8839), ("oplus", 8853), ("otimes", 8855),
    ("perp", 8869), ("sdot", 8901), ("lceil", 8968), ("rceil", 8969), ("lfloor", 8970),
    ("rfloor", 8971), ("lang", 9001), ("rang", 9002), ("loz", 9674), ("spades", 9824),
    ("clubs", 9827), ("hearts", 9829), ("diams", 9830),
];

static HTML_ENTITIES: LazyLock<HashMap<&'static str, char>> = LazyLock::new(|| {
    let latin1 = LATIN1
        .iter()
        .zip(0xA0u32..)
        .filter_map(|(name, cp)| char::from_u32(cp).map(|c| (*name, c)));
    let symbols = SYMBOLS
        .iter()
        .filter_map(|&(name, cp)| char::from_u32(cp).map(|c| (name, c)));
    let table: HashMap<_, _> = latin1.chain(symbols).collect();
    tracing::trace!(entries = table.len(), "built named entity table");
    table
});

/// Process-wide named reference table, built on first use
pub fn html_entities() -> &'static HashMap<&'static str, char> {
    &HTML_ENTITIES
}

/// Replace every `&name;` found in the named reference table with its
/// literal character. Unknown names, numeric references and the
/// markup-significant references are kept verbatim.
pub fn decode_html_entities(input: &str) -> Cow<'_, str> {
    let bytes = input.as_bytes();
    if memchr(b'&', bytes).is_none() {
        return Cow::Borrowed(input);
    }

    let table = html_entities();
    let mut out = String::with_capacity(input.len());
    let mut pos = 0;

    while let Some(offset) = memchr(b'&', &bytes[pos..]) {
        let amp = pos + offset;
        out.push_str(&input[pos..amp]);

        let name_end = bytes[amp + 1..]
            .iter()
            .position(|b| !b.is_ascii_alphanumeric())
            .map(|n| amp + 1 + n);

        match name_end {
            Some(end) if end > amp + 1 && bytes[end] == b';' => {
                match table.get(&input[amp + 1..end]) {
                    Some(&c) => out.push(c),
                    None => out.push_str(&input[amp..=end]),
                }
                pos = end + 1;
            }
            _ => {
                out.push('&');
                pos = amp + 1;
            }
        }
    }
    out.push_str(&input[pos..]);

    Cow::Owned(out)
}

/// Decode XML character data: the five predefined entities and numeric
/// character references.
///
/// Returns Err naming the offending reference if it is undefined, malformed
/// or refers to a character that is not allowed in XML.
pub fn decode_text(input: &str) -> Result<Cow<'_, str>, String> {
    let bytes = input.as_bytes();
    if memchr(b'&', bytes).is_none() {
        return Ok(Cow::Borrowed(input));
    }

    let mut out = String::with_capacity(input.len());
    let mut pos = 0;

    while let Some(offset) = memchr(b'&', &bytes[pos..]) {
        let amp = pos + offset;
        out.push_str(&input[pos..amp]);

        let semi = memchr(b';', &bytes[amp..])
            .map(|n| amp + n)
            .ok_or_else(|| "Unterminated entity reference".to_string())?;
        let reference = &input[amp + 1..semi];

        out.push(decode_reference(reference)?);
        pos = semi + 1;
    }
    out.push_str(&input[pos..]);

    Ok(Cow::Owned(out))
}

/// Decode one reference body (between '&' and ';')
fn decode_reference(reference: &str) -> Result<char, String> {
    if let Some(numeric) = reference.strip_prefix('#') {
        let code = match numeric.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => numeric.parse::<u32>(),
        }
        .map_err(|_| format!("Invalid character reference: &{};", reference))?;

        return char::from_u32(code)
            .filter(|&c| is_xml_char(c))
            .ok_or_else(|| format!("Invalid character reference: &{};", reference));
    }

    match reference {
        "lt" => Ok('<'),
        "gt" => Ok('>'),
        "amp" => Ok('&'),
        "quot" => Ok('"'),
        "apos" => Ok('\''),
        "" => Err("Empty entity reference".to_string()),
        _ => Err(format!("Undefined entity: &{};", reference)),
    }
}

/// XML 1.0 Char production
#[inline]
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}
