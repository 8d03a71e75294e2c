// src/matching/address.rs - Street address decomposition and normalization
//
// Addresses are tokenized, each token is tagged with a component label, and the
// normalized form is rebuilt from the first house number, street name and
// street type found. Anything the tagger cannot make sense of falls back to the
// raw input.
use log::debug;
use std::fmt;

const STREET_TYPES: &[&str] = &[
    "st", "str", "street", "ave", "av", "avenue", "blvd", "blv", "boulevard", "rd", "road", "ln",
    "lane", "dr", "drive", "way", "pl", "place", "ct", "court", "ter", "terrace", "cir", "circle",
    "pkwy", "parkway", "hwy", "highway", "sq", "square", "trl", "trail", "pike", "aly", "alley",
    "plz", "plaza", "loop", "row", "xing", "crossing", "run", "path", "walk", "expy", "expressway",
    "fwy", "freeway", "cres", "crescent", "pt", "point", "park", "tpke", "turnpike", "cv", "cove",
    "hts", "heights", "mall", "bnd", "bend", "crk", "creek", "rdg", "ridge",
];

const DIRECTIONALS: &[&str] = &[
    "n", "s", "e", "w", "ne", "nw", "se", "sw", "north", "south", "east", "west", "northeast",
    "northwest", "southeast", "southwest",
];

const OCCUPANCY_MARKERS: &[&str] = &[
    "apt", "apartment", "suite", "ste", "unit", "bldg", "building", "fl", "floor", "rm", "room",
    "#", "dept", "lot", "spc", "trlr", "po",
];

const STATE_CODES: &[&str] = &[
    "al", "ak", "az", "ar", "ca", "co", "ct", "de", "dc", "fl", "ga", "hi", "id", "il", "in", "ia",
    "ks", "ky", "la", "me", "md", "ma", "mi", "mn", "ms", "mo", "mt", "ne", "nv", "nh", "nj", "nm",
    "ny", "nc", "nd", "oh", "ok", "or", "pa", "ri", "sc", "sd", "tn", "tx", "ut", "vt", "va", "wa",
    "wv", "wi", "wy", "pr", "gu", "vi", "as", "mp",
];

// Tokens that carry no content of their own but are common in hand-typed addresses.
const SEPARATORS: &[&str] = &["-", "/", "&"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressLabel {
    AddressNumber,
    StreetNamePreDirectional,
    StreetName,
    StreetNamePostType,
    StreetNamePostDirectional,
    OccupancyType,
    OccupancyIdentifier,
    PlaceName,
    StateName,
    ZipCode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedToken {
    pub text: String,
    pub label: AddressLabel,
}

/// The three components the normalized address is built from. Absent ones are `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressComponents {
    pub number: String,
    pub street_name: String,
    pub street_type: String,
}

impl AddressComponents {
    pub fn is_empty(&self) -> bool {
        self.number.is_empty() && self.street_name.is_empty() && self.street_type.is_empty()
    }

    fn from_tagged(tokens: &[TaggedToken]) -> Self {
        let first = |label: AddressLabel| {
            tokens
                .iter()
                .find(|t| t.label == label)
                .map(|t| t.text.clone())
                .unwrap_or_default()
        };
        Self {
            number: first(AddressLabel::AddressNumber),
            street_name: first(AddressLabel::StreetName),
            street_type: first(AddressLabel::StreetNamePostType),
        }
    }

    pub fn to_normalized(&self) -> String {
        format!("{} {} {}", self.number, self.street_name, self.street_type)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    ControlCharacter,
    UnparseableToken(String),
    RepeatedLabel(AddressLabel),
    NoStreetComponents,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::ControlCharacter => write!(f, "address contains a control character"),
            FallbackReason::UnparseableToken(token) => write!(f, "unparseable token '{}'", token),
            FallbackReason::RepeatedLabel(label) => write!(f, "repeated component {:?}", label),
            FallbackReason::NoStreetComponents => write!(f, "no house number, street name or street type"),
        }
    }
}

impl std::error::Error for FallbackReason {}

/// Outcome of address normalization: either the address was decomposed, or
/// the raw input is used as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressNormalization {
    Parsed(AddressComponents),
    FellBack(FallbackReason),
}

impl AddressNormalization {
    pub fn is_parsed(&self) -> bool {
        matches!(self, AddressNormalization::Parsed(_))
    }

    /// The normalized address string; `raw` is returned for the fallback path.
    pub fn normalized(&self, raw: &str) -> String {
        match self {
            AddressNormalization::Parsed(components) => components.to_normalized(),
            AddressNormalization::FellBack(_) => raw.to_string(),
        }
    }
}

pub fn classify_address(raw: &str) -> AddressNormalization {
    let outcome = tag_address(raw).and_then(|tokens| {
        let components = AddressComponents::from_tagged(&tokens);
        // Only unit or locality tokens: keep the raw text rather than an empty address
        if components.is_empty() && !tokens.is_empty() {
            return Err(FallbackReason::NoStreetComponents);
        }
        Ok(components)
    });
    match outcome {
        Ok(components) => AddressNormalization::Parsed(components),
        Err(reason) => {
            debug!("Address '{}' kept as-is: {}", raw, reason);
            AddressNormalization::FellBack(reason)
        }
    }
}

/// `"{number} {street name} {street type}"`, or the raw address when it cannot be decomposed.
pub fn normalize_address(raw: &str) -> String {
    classify_address(raw).normalized(raw)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreetStage {
    Number,
    PreDirectional,
    Name,
    AfterType,
    Locality,
}

struct Token<'a> {
    text: &'a str,
    key: String,
    segment: usize,
    /// Preceded by `-`, `/` or `&` on the same line.
    after_separator: bool,
}

fn tokenize(raw: &str) -> Result<Vec<Token<'_>>, FallbackReason> {
    let mut tokens = Vec::new();
    let mut segment = 0;
    let mut after_separator = false;

    for piece in raw.split_whitespace() {
        let leading = piece.len() - piece.trim_start_matches(',').len();
        let trimmed = piece.trim_matches(',');
        let trailing = piece.len() - leading - trimmed.len();

        if leading > 0 && !tokens.is_empty() {
            segment += 1;
            after_separator = false;
        }
        if !trimmed.is_empty() {
            let key = trimmed.trim_end_matches('.').to_lowercase();
            if SEPARATORS.contains(&key.as_str()) {
                after_separator = true;
            } else if !trimmed.chars().any(|c| c.is_alphanumeric()) && key != "#" {
                return Err(FallbackReason::UnparseableToken(trimmed.to_string()));
            } else {
                tokens.push(Token {
                    text: trimmed,
                    key,
                    segment,
                    after_separator,
                });
                after_separator = false;
            }
        }
        if trailing > 0 && !tokens.is_empty() {
            segment += 1;
            after_separator = false;
        }
    }
    Ok(tokens)
}

/// Tags every token of `raw` with a component label, in document order.
pub fn tag_address(raw: &str) -> Result<Vec<TaggedToken>, FallbackReason> {
    if raw.chars().any(|c| c.is_control() && !c.is_whitespace()) {
        return Err(FallbackReason::ControlCharacter);
    }
    let tokens = tokenize(raw)?;

    let mut tagged = Vec::with_capacity(tokens.len());
    let mut stage = StreetStage::Number;
    let mut name_tokens = 0usize;
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];
        let key = token.key.as_str();

        // Everything after the first comma describes the unit or the locality.
        if token.segment > 0 && stage != StreetStage::Locality {
            stage = StreetStage::Locality;
        }

        match stage {
            StreetStage::Number => {
                stage = StreetStage::PreDirectional;
                if is_house_number(key) {
                    push_tag(&mut tagged, token.text, AddressLabel::AddressNumber);
                    i += 1;
                }
                continue;
            }
            StreetStage::PreDirectional => {
                // "12 & 14", "12 - 14": the range end is another house number
                if token.after_separator
                    && is_house_number(key)
                    && tagged.last().map_or(false, |t| t.label == AddressLabel::AddressNumber)
                {
                    push_tag(&mut tagged, token.text, AddressLabel::AddressNumber);
                    i += 1;
                    continue;
                }
                stage = StreetStage::Name;
                let next_is_name = tokens
                    .get(i + 1)
                    .map(|next| {
                        next.segment == token.segment
                            && !is_street_type(&next.key)
                            && !is_occupancy_marker(&next.key)
                    })
                    .unwrap_or(false);
                if is_directional(key) && next_is_name {
                    push_tag(&mut tagged, token.text, AddressLabel::StreetNamePreDirectional);
                    i += 1;
                }
                continue;
            }
            StreetStage::Name => {
                if is_occupancy_marker(key) || is_unit_identifier(key) {
                    i += tag_occupancy(&tokens, i, &mut tagged);
                    // A unit written before the street: the street line starts after it
                    stage = if name_tokens > 0 {
                        StreetStage::AfterType
                    } else if tagged.iter().any(|t| t.label == AddressLabel::AddressNumber) {
                        StreetStage::Name
                    } else {
                        StreetStage::Number
                    };
                    continue;
                }
                if name_tokens > 0 && is_street_type(key) {
                    push_tag(&mut tagged, token.text, AddressLabel::StreetNamePostType);
                    stage = StreetStage::AfterType;
                } else {
                    push_tag(&mut tagged, token.text, AddressLabel::StreetName);
                    name_tokens += 1;
                }
            }
            StreetStage::AfterType => {
                if is_occupancy_marker(key) || is_unit_identifier(key) {
                    i += tag_occupancy(&tokens, i, &mut tagged);
                    continue;
                }
                if is_directional(key)
                    && !tagged
                        .iter()
                        .any(|t| t.label == AddressLabel::StreetNamePostDirectional)
                {
                    push_tag(&mut tagged, token.text, AddressLabel::StreetNamePostDirectional);
                } else {
                    stage = StreetStage::Locality;
                    continue;
                }
            }
            StreetStage::Locality => {
                if is_occupancy_marker(key) || is_unit_identifier(key) {
                    i += tag_occupancy(&tokens, i, &mut tagged);
                    continue;
                }
                if token.segment == 0 && is_house_number(key) && !is_zip_code(key) {
                    // A second street line run together with the first
                    return Err(FallbackReason::RepeatedLabel(AddressLabel::AddressNumber));
                }
                push_tag(&mut tagged, token.text, classify_locality(key));
            }
        }
        i += 1;
    }

    Ok(tagged)
}

fn push_tag(tagged: &mut Vec<TaggedToken>, text: &str, label: AddressLabel) {
    tagged.push(TaggedToken {
        text: text.to_string(),
        label,
    });
}

/// Tags an occupancy marker and its identifier starting at `i`; returns tokens consumed.
fn tag_occupancy(tokens: &[Token<'_>], i: usize, tagged: &mut Vec<TaggedToken>) -> usize {
    let token = &tokens[i];
    if is_unit_identifier(&token.key) {
        push_tag(tagged, token.text, AddressLabel::OccupancyIdentifier);
        return 1;
    }
    push_tag(tagged, token.text, AddressLabel::OccupancyType);
    match tokens.get(i + 1) {
        Some(next) if next.segment == token.segment && !is_occupancy_marker(&next.key) => {
            push_tag(tagged, next.text, AddressLabel::OccupancyIdentifier);
            2
        }
        _ => 1,
    }
}

fn classify_locality(key: &str) -> AddressLabel {
    if is_zip_code(key) {
        AddressLabel::ZipCode
    } else if STATE_CODES.contains(&key) {
        AddressLabel::StateName
    } else {
        AddressLabel::PlaceName
    }
}

fn is_house_number(key: &str) -> bool {
    let starts_with_digit = key.chars().next().map_or(false, |c| c.is_ascii_digit());
    starts_with_digit
        && !is_ordinal(key)
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '/')
}

fn is_ordinal(key: &str) -> bool {
    let digits = key.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0 && matches!(&key[digits..], "st" | "nd" | "rd" | "th")
}

fn is_zip_code(key: &str) -> bool {
    let bytes = key.as_bytes();
    let five = |b: &[u8]| b.len() == 5 && b.iter().all(u8::is_ascii_digit);
    match bytes.len() {
        5 => five(bytes),
        10 => five(&bytes[..5]) && bytes[5] == b'-' && bytes[6..].iter().all(u8::is_ascii_digit),
        _ => false,
    }
}

fn is_street_type(key: &str) -> bool {
    STREET_TYPES.contains(&key)
}

fn is_directional(key: &str) -> bool {
    DIRECTIONALS.contains(&key)
}

fn is_occupancy_marker(key: &str) -> bool {
    OCCUPANCY_MARKERS.contains(&key)
}

/// `#12`, `#B`: a unit marker glued to its identifier.
fn is_unit_identifier(key: &str) -> bool {
    key.len() > 1 && key.starts_with('#') && key[1..].chars().all(|c| c.is_alphanumeric() || c == '-')
}
