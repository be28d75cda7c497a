//! Feed document parser.
//!
//! The daily document looks like:
//!
//! ```xml
//! <?xml version="1.0" encoding="windows-1251"?>
//! <ValCurs Date="10.01.2024" name="Foreign Currency Market">
//!   <Valute ID="R01235">
//!     <NumCode>840</NumCode>
//!     <CharCode>USD</CharCode>
//!     <Nominal>1</Nominal>
//!     <Name>...</Name>
//!     <Value>73,5000</Value>
//!   </Valute>
//! </ValCurs>
//! ```
//!
//! A broken `<Valute>` entry is skipped and reported; only a broken document
//! (bad XML, unknown encoding, a root other than `<ValCurs>`, no as-of date)
//! fails the parse.

use std::borrow::Cow;
use std::fmt::Display;

use chrono::NaiveDate;
use encoding_rs::{Encoding, UTF_8};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::warn;

use rates_types::{
    CurrencyCode, ParseError, ParsedFeed, RawCurrencyRecord, RecordError, SkipReason,
    SkippedRecord, parse_decimal,
};

const DATE_FORMATS: [&str; 2] = ["%d.%m.%Y", "%Y-%m-%d"];

const ROOT: &[u8] = b"ValCurs";
const ENTRY: &[u8] = b"Valute";
const DATE: &[u8] = b"Date";

/// Root date and the raw content of every `<Valute>`, in document order.
struct Document<'a> {
    date_attr: Option<String>,
    date_elem: Option<String>,
    entries: Vec<&'a str>,
}

/// One `<Valute>`. Repeated children are tolerated and the first one wins.
#[derive(Debug, Deserialize)]
struct EntryXml {
    #[serde(rename = "CharCode", default)]
    char_code: Vec<String>,
    #[serde(rename = "Nominal", default)]
    nominal: Vec<String>,
    #[serde(rename = "Value", default)]
    value: Vec<String>,
}

/// Parses one feed document.
pub fn parse(bytes: &[u8]) -> Result<ParsedFeed, ParseError> {
    let text = decode(bytes)?;
    let doc = split(&text)?;

    let as_of = doc
        .date_attr
        .as_deref()
        .or(doc.date_elem.as_deref())
        .ok_or_else(|| ParseError::Malformed("no as-of date in document".into()))
        .and_then(parse_date)?;

    let mut records = Vec::with_capacity(doc.entries.len());
    let mut skipped = Vec::new();

    for (position, content) in doc.entries.into_iter().enumerate() {
        let (code, result) = match read_xml(content) {
            Ok(entry) => (
                entry.char_code.first().map(|c| c.trim().to_string()),
                read_entry(entry, as_of),
            ),
            Err(err) => (None, Err(err)),
        };
        match result {
            Ok(record) => records.push(record),
            Err(err) => {
                warn!(position, code = ?code, error = %err, "skipping feed entry");
                skipped.push(SkippedRecord {
                    position: Some(position),
                    code,
                    reason: SkipReason::Record(err),
                });
            }
        }
    }

    Ok(ParsedFeed {
        as_of,
        records,
        skipped,
    })
}

/// Collects the root date and the raw content of each `<ValCurs>` child entry.
fn split(text: &str) -> Result<Document<'_>, ParseError> {
    let mut reader = Reader::from_str(text);

    let (date_attr, has_children) = loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(root) => break (root_date(&root)?, true),
            Event::Empty(root) => break (root_date(&root)?, false),
            Event::Eof => return Err(ParseError::Malformed("no root element".into())),
            _ => {}
        }
    };

    let mut doc = Document {
        date_attr,
        date_elem: None,
        entries: Vec::new(),
    };
    if !has_children {
        return Ok(doc);
    }

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(e) if e.local_name().as_ref() == ENTRY => {
                let span = reader.read_to_end(e.name()).map_err(malformed)?;
                let content = text
                    .get(span.start as usize..span.end as usize)
                    .ok_or_else(|| ParseError::Malformed("entry out of bounds".into()))?;
                doc.entries.push(content);
            }
            Event::Empty(e) if e.local_name().as_ref() == ENTRY => doc.entries.push(""),
            Event::Start(e) if e.local_name().as_ref() == DATE => {
                let date = reader.read_text(e.name()).map_err(malformed)?;
                doc.date_elem = Some(date.into_owned());
            }
            Event::Start(e) => {
                reader.read_to_end(e.name()).map_err(malformed)?;
            }
            Event::End(_) => return Ok(doc),
            Event::Eof => {
                return Err(ParseError::Malformed("document ends inside <ValCurs>".into()));
            }
            _ => {}
        }
    }
}

fn root_date(root: &BytesStart<'_>) -> Result<Option<String>, ParseError> {
    if root.local_name().as_ref() != ROOT {
        return Err(ParseError::Malformed(format!(
            "unexpected root element <{}>",
            String::from_utf8_lossy(root.name().as_ref())
        )));
    }
    root.try_get_attribute("Date")
        .map_err(malformed)?
        .map(|attr| attr.unescape_value().map(Cow::into_owned).map_err(malformed))
        .transpose()
}

fn read_xml(content: &str) -> Result<EntryXml, RecordError> {
    quick_xml::de::from_str(&format!("<Valute>{}</Valute>", content))
        .map_err(|e| RecordError::Unreadable(e.to_string()))
}

fn malformed(err: impl Display) -> ParseError {
    ParseError::Malformed(err.to_string())
}

fn read_entry(entry: EntryXml, as_of: NaiveDate) -> Result<RawCurrencyRecord, RecordError> {
    let code = first(entry.char_code).ok_or(RecordError::MissingField("CharCode"))?;
    let code = CurrencyCode::new(&code).map_err(RecordError::InvalidCode)?;
    let unit_value = number("Value", first(entry.value))?;
    let nominal = number("Nominal", first(entry.nominal))?;

    Ok(RawCurrencyRecord {
        code,
        unit_value,
        nominal,
        as_of,
    })
}

fn first(values: Vec<String>) -> Option<String> {
    values.into_iter().next()
}

fn number(field: &'static str, raw: Option<String>) -> Result<Decimal, RecordError> {
    let raw = raw.ok_or(RecordError::MissingField(field))?;
    parse_decimal(&raw).map_err(|_| RecordError::InvalidNumber { field, value: raw })
}

fn parse_date(raw: &str) -> Result<NaiveDate, ParseError> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| ParseError::Malformed(format!("unrecognised as-of date {:?}", raw)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Character decoding
// ─────────────────────────────────────────────────────────────────────────────

/// Decodes the document using its BOM or XML declaration; UTF-8 otherwise.
fn decode(bytes: &[u8]) -> Result<Cow<'_, str>, ParseError> {
    let encoding = match Encoding::for_bom(bytes) {
        Some((encoding, _)) => encoding,
        None => match declared_encoding(bytes) {
            Some(label) => Encoding::for_label(label.as_bytes()).ok_or_else(|| {
                ParseError::Malformed(format!("unsupported encoding {:?}", label))
            })?,
            None => UTF_8,
        },
    };

    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(ParseError::Malformed(format!(
            "invalid {} byte sequence",
            encoding.name()
        )));
    }
    Ok(text)
}

/// Reads `encoding="..."` from a leading `<?xml ...?>` declaration.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(256)];
    let head = String::from_utf8_lossy(head);
    let decl = head.strip_prefix("<?xml")?;
    let decl = &decl[..decl.find("?>")?];
    let rest = &decl[decl.find("encoding")? + "encoding".len()..];
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &rest[1..];
    Some(value[..value.find(quote)?].to_string())
}
