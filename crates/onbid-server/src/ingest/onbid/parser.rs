// Onbid list page parser
//
// Streams one page of XML with quick-xml and yields an AuctionItem per
// response/body/items/item element. Nothing is materialized beyond the item
// being read, so a 10,000-row page is never held as a tree.
//
// Envelope problems (missing response, body or items) are not errors: the page
// simply yields no records. Broken XML syntax yields one Err and ends.

use quick_xml::{events::Event, Reader};
use std::collections::HashSet;
use tracing::{debug, warn};

use super::models::{is_image_url, AuctionItem};
use super::{IngestError, Result};

const ENVELOPE: [&[u8]; 3] = [b"response", b"body", b"items"];
const ITEM: &[u8] = b"item";
const IMAGE_GROUP: &str = "CLTR_IMG_FILES";
const IMAGE_FILE: &[u8] = b"CLTR_IMG_FILE";

/// Parse one page of the list endpoint into a lazy record sequence
pub fn parse_page(xml: &str) -> PageItems<'_> {
    PageItems {
        reader: Reader::from_str(xml),
        open: Vec::new(),
        reached: 0,
        yielded: 0,
        done: false,
    }
}

/// Iterator over the records of one page
///
/// Finite and single-pass; after an `Err` it returns `None`.
pub struct PageItems<'a> {
    reader: Reader<&'a [u8]>,
    /// Open elements with the envelope depth reached at each
    open: Vec<(Vec<u8>, usize)>,
    /// Deepest envelope level seen anywhere in the page
    reached: usize,
    yielded: usize,
    done: bool,
}

impl PageItems<'_> {
    fn envelope_depth(&self) -> usize {
        self.open.last().map_or(0, |(_, depth)| *depth)
    }

    fn at_items(&self) -> bool {
        self.envelope_depth() == ENVELOPE.len()
            && self.open.last().is_some_and(|(name, _)| name.as_slice() == ENVELOPE[2])
    }

    fn descend(&self, name: &[u8]) -> usize {
        let depth = self.envelope_depth();
        if depth < ENVELOPE.len() && name == ENVELOPE[depth] {
            depth + 1
        } else {
            depth
        }
    }

    fn next_item(&mut self) -> Result<Option<AuctionItem>> {
        loop {
            let position = self.reader.buffer_position();
            let event = self
                .reader
                .read_event()
                .map_err(|e| IngestError::xml(e, position))?;

            match event {
                Event::Start(e) => {
                    let name = local(e.name().into_inner());
                    if name == ITEM && self.at_items() {
                        return read_item(&mut self.reader).map(Some);
                    }
                    let depth = self.descend(name);
                    self.reached = self.reached.max(depth);
                    self.open.push((name.to_vec(), depth));
                },
                Event::Empty(e) => {
                    let name = local(e.name().into_inner());
                    if name == ITEM && self.at_items() {
                        return Ok(Some(AuctionItem::default()));
                    }
                    self.reached = self.reached.max(self.descend(name));
                },
                Event::End(_) => {
                    self.open.pop();
                },
                Event::Eof => {
                    if self.reached < ENVELOPE.len() {
                        let missing = String::from_utf8_lossy(ENVELOPE[self.reached]);
                        warn!(missing = %missing, "Page envelope incomplete, no records on this page");
                    } else if self.yielded == 0 {
                        debug!("Page contains no <item> elements");
                    }
                    return Ok(None);
                },
                _ => {},
            }
        }
    }
}

impl Iterator for PageItems<'_> {
    type Item = Result<AuctionItem>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.next_item() {
            Ok(Some(item)) => {
                self.yielded += 1;
                Some(Ok(item))
            },
            Ok(None) => {
                self.done = true;
                None
            },
            Err(e) => {
                self.done = true;
                Some(Err(e))
            },
        }
    }
}

/// Status block of an upstream response (`response/header`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeader {
    pub result_code: Option<String>,
    pub result_msg: Option<String>,
}

impl ResponseHeader {
    /// Read `response/header/resultCode` and `resultMsg`, if present
    ///
    /// Returns `None` when the page has no header or the XML is unreadable;
    /// the page parser reports syntax problems.
    pub fn from_xml(xml: &str) -> Option<Self> {
        let mut reader = Reader::from_str(xml);
        let mut open: Vec<Vec<u8>> = Vec::new();
        let mut header: Option<ResponseHeader> = None;

        loop {
            match reader.read_event().ok()? {
                Event::Start(e) => {
                    let name = local(e.name().into_inner());
                    let in_header = open.last().is_some_and(|n| n == b"header");
                    match name {
                        b"resultCode" if in_header => {
                            let code = read_text(&mut reader).ok()?;
                            header.get_or_insert_with(Default::default).result_code =
                                non_blank(&code);
                        },
                        b"resultMsg" if in_header => {
                            let msg = read_text(&mut reader).ok()?;
                            header.get_or_insert_with(Default::default).result_msg =
                                non_blank(&msg);
                        },
                        b"body" => return header,
                        _ => open.push(name.to_vec()),
                    }
                },
                Event::End(_) => {
                    if open.pop().is_some_and(|n| n == b"header") {
                        return header;
                    }
                },
                Event::Eof => return header,
                _ => {},
            }
        }
    }

    /// `true` unless the upstream reported a code other than `00`
    pub fn is_normal(&self) -> bool {
        self.result_code.as_deref().map_or(true, |code| code == "00")
    }
}

/// Read the children of one `<item>`; the reader sits just past its start tag
fn read_item(reader: &mut Reader<&[u8]>) -> Result<AuctionItem> {
    let mut item = AuctionItem::default();
    let mut seen: HashSet<Vec<u8>> = HashSet::new();

    loop {
        let position = reader.buffer_position();
        match reader.read_event().map_err(|e| IngestError::xml(e, position))? {
            Event::Start(e) => {
                let name = local(e.name().into_inner());
                let first = seen.insert(name.to_vec());
                let tag = String::from_utf8_lossy(name);

                if tag == IMAGE_GROUP {
                    if first {
                        item.image_files = read_images(reader)?;
                    } else {
                        read_text(reader)?;
                    }
                    continue;
                }

                let text = read_text(reader)?;
                if first {
                    if let Some(field) = item.field_mut(&tag) {
                        *field = non_blank(&text);
                    }
                }
            },
            Event::Empty(e) => {
                seen.insert(local(e.name().into_inner()).to_vec());
            },
            Event::End(_) => return Ok(item),
            Event::Eof => {
                return Err(IngestError::Parse(
                    "document ended inside <item>".to_string(),
                ))
            },
            _ => {},
        }
    }
}

/// Collect qualifying `CLTR_IMG_FILE` values in document order
fn read_images(reader: &mut Reader<&[u8]>) -> Result<Option<Vec<String>>> {
    let mut urls = Vec::new();
    let mut depth = 1usize;

    loop {
        let position = reader.buffer_position();
        match reader.read_event().map_err(|e| IngestError::xml(e, position))? {
            Event::Start(e) => {
                if local(e.name().into_inner()) == IMAGE_FILE {
                    let text = read_text(reader)?;
                    let url = text.trim();
                    if is_image_url(url) {
                        urls.push(url.to_string());
                    }
                } else {
                    depth += 1;
                }
            },
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            },
            Event::Eof => {
                return Err(IngestError::Parse(format!(
                    "document ended inside <{}>",
                    IMAGE_GROUP
                )))
            },
            _ => {},
        }
    }

    Ok(if urls.is_empty() { None } else { Some(urls) })
}

/// Concatenated text content of the element just opened, through its end tag
fn read_text(reader: &mut Reader<&[u8]>) -> Result<String> {
    let mut text = String::new();
    let mut depth = 1usize;

    loop {
        let position = reader.buffer_position();
        match reader.read_event().map_err(|e| IngestError::xml(e, position))? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(text);
                }
            },
            Event::Text(t) => {
                let unescaped = t.unescape().map_err(|e| IngestError::xml(e, position))?;
                text.push_str(&unescaped);
            },
            Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
            Event::Eof => return Err(IngestError::Parse("unexpected end of document".to_string())),
            _ => {},
        }
    }
}

/// Element name without a namespace prefix
fn local(name: &[u8]) -> &[u8] {
    match name.iter().position(|b| *b == b':') {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
