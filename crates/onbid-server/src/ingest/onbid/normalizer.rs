// Tree normalizer for the interactive list query
//
// The list endpoint response is read into a generic XmlNode tree, then walked
// recursively: SNAKE_CASE keys become camelCase and text is trimmed. The
// CLTR_IMG_FILES group is rewritten into an `imageLinks` list.
//
// Note: when no image qualifies this path produces `imageLinks: []`, while the
// batch parser stores `None`. Both shapes have consumers; keep them distinct.

use quick_xml::{events::Event, Reader};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::models::{is_image_url, ImageLink, OnbidListPage};
use super::{IngestError, Result};

const IMAGE_GROUP_KEY: &str = "cltrImgFiles";
const IMAGE_FILE_TAG: &str = "CLTR_IMG_FILE";

/// Generic XML tree
///
/// Repeated sibling elements collapse into `Array`; an element with only text
/// (or nothing) is a `Scalar`. Attributes are not represented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Object(BTreeMap<String, XmlNode>),
    Array(Vec<XmlNode>),
    Scalar(String),
}

impl XmlNode {
    /// Parse a document, returning the content of its root element
    pub fn parse(xml: &str) -> Result<XmlNode> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Frame> = Vec::new();

        loop {
            let position = reader.buffer_position();
            match reader.read_event().map_err(|e| IngestError::xml(e, position))? {
                Event::Start(e) => {
                    stack.push(Frame::new(&String::from_utf8_lossy(e.name().as_ref())));
                },
                Event::Empty(e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    match stack.last_mut() {
                        Some(parent) => parent.children.push((name, XmlNode::Scalar(String::new()))),
                        None => return Ok(XmlNode::Scalar(String::new())),
                    }
                },
                Event::Text(t) => {
                    if let Some(frame) = stack.last_mut() {
                        let text = t.unescape().map_err(|e| IngestError::xml(e, position))?;
                        frame.text.push_str(&text);
                    }
                },
                Event::CData(c) => {
                    if let Some(frame) = stack.last_mut() {
                        frame.text.push_str(&String::from_utf8_lossy(&c));
                    }
                },
                Event::End(_) => {
                    let Some(frame) = stack.pop() else {
                        return Err(IngestError::Parse("unbalanced end tag".to_string()));
                    };
                    let (name, node) = frame.finish();
                    match stack.last_mut() {
                        Some(parent) => parent.children.push((name, node)),
                        None => return Ok(node),
                    }
                },
                Event::Eof => {
                    return Err(IngestError::Parse("document has no root element".to_string()))
                },
                _ => {},
            }
        }
    }

    /// Child of an `Object` node
    pub fn get(&self, key: &str) -> Option<&XmlNode> {
        match self {
            XmlNode::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Text of a `Scalar` node
    pub fn as_text(&self) -> Option<&str> {
        match self {
            XmlNode::Scalar(text) => Some(text),
            _ => None,
        }
    }

    /// Untransformed JSON form (original keys, untrimmed text)
    pub fn to_json(&self) -> Value {
        match self {
            XmlNode::Object(map) => Value::Object(
                map.iter().map(|(key, node)| (key.clone(), node.to_json())).collect(),
            ),
            XmlNode::Array(nodes) => Value::Array(nodes.iter().map(XmlNode::to_json).collect()),
            XmlNode::Scalar(text) => Value::String(text.clone()),
        }
    }
}

struct Frame {
    name: String,
    text: String,
    children: Vec<(String, XmlNode)>,
}

impl Frame {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            text: String::new(),
            children: Vec::new(),
        }
    }

    fn finish(self) -> (String, XmlNode) {
        if self.children.is_empty() {
            return (self.name, XmlNode::Scalar(self.text));
        }

        let mut map: BTreeMap<String, XmlNode> = BTreeMap::new();
        for (key, node) in self.children {
            match map.remove(&key) {
                None => {
                    map.insert(key, node);
                },
                Some(XmlNode::Array(mut nodes)) => {
                    nodes.push(node);
                    map.insert(key, XmlNode::Array(nodes));
                },
                Some(previous) => {
                    map.insert(key, XmlNode::Array(vec![previous, node]));
                },
            }
        }
        (self.name, XmlNode::Object(map))
    }
}

/// SNAKE_CASE to camelCase
///
/// `_` is dropped and upper-cases the next character; everything else is
/// lower-cased. `"CLTR_NM"` becomes `"cltrNm"`.
pub fn to_camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;

    for c in key.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }

    out
}

/// Normalize the children of an object node into a camelCase JSON object
pub fn normalize_object(fields: &BTreeMap<String, XmlNode>) -> Map<String, Value> {
    let mut out = Map::new();

    for (key, node) in fields {
        let camel = to_camel_case(key);

        if camel == IMAGE_GROUP_KEY {
            let (links, original) = image_links(node);
            out.insert("imageLinks".to_string(), Value::Array(links));
            out.insert(camel, Value::String(original));
            continue;
        }

        out.insert(camel, normalize_node(node));
    }

    out
}

fn normalize_node(node: &XmlNode) -> Value {
    match node {
        XmlNode::Object(fields) => Value::Object(normalize_object(fields)),
        XmlNode::Array(nodes) => Value::Array(nodes.iter().map(normalize_node).collect()),
        XmlNode::Scalar(text) => Value::String(text.trim().to_string()),
    }
}

/// Build `imageLinks` and the diagnostic copy of the group
fn image_links(group: &XmlNode) -> (Vec<Value>, String) {
    let Some(files) = group.get(IMAGE_FILE_TAG) else {
        return (Vec::new(), String::new());
    };

    let candidates: Vec<&str> = match files {
        XmlNode::Array(nodes) => nodes.iter().filter_map(XmlNode::as_text).collect(),
        XmlNode::Scalar(text) => vec![text.as_str()],
        XmlNode::Object(_) => Vec::new(),
    };

    let links = candidates
        .into_iter()
        .map(str::trim)
        .filter(|url| is_image_url(url))
        .enumerate()
        .map(|(idx, url)| {
            Value::from(ImageLink {
                seq: (idx + 1).to_string(),
                url: url.to_string(),
            })
        })
        .collect();

    (links, format!("{:#}", group.to_json()))
}

/// Turn a raw list response into `{totalCount, items}`
///
/// `totalCount` falls back to 0; `items.item` may be one object or several.
pub fn normalize_list_response(xml: &str) -> Result<OnbidListPage> {
    let root = XmlNode::parse(xml)?;
    let body = root.get("body");

    let total_count = body
        .and_then(|b| b.get("totalCount"))
        .and_then(XmlNode::as_text)
        .and_then(|text| text.trim().parse::<i64>().ok())
        .unwrap_or(0);

    let items = match body.and_then(|b| b.get("items")).and_then(|i| i.get("item")) {
        Some(XmlNode::Array(nodes)) => nodes
            .iter()
            .filter_map(|node| match node {
                XmlNode::Object(fields) => Some(Value::Object(normalize_object(fields))),
                _ => None,
            })
            .collect(),
        Some(XmlNode::Object(fields)) => vec![Value::Object(normalize_object(fields))],
        _ => Vec::new(),
    };

    Ok(OnbidListPage { total_count, items })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_camel_case() {
        assert_eq!(to_camel_case("CLTR_NM"), "cltrNm");
        assert_eq!(to_camel_case("ok"), "ok");
        assert_eq!(to_camel_case(""), "");
        assert_eq!(to_camel_case("PBCT_BEGN_DTM"), "pbctBegnDtm");
        assert_eq!(to_camel_case("A__B"), "aB");
        assert_eq!(to_camel_case("RNUM"), "rnum");
        assert_eq!(to_camel_case("TRAILING_"), "trailing");
    }

    #[test]
    fn test_parse_tree_unwraps_root_and_groups_repeats() {
        let tree = XmlNode::parse("<response><a> x </a><b>1</b><b>2</b><c/></response>").unwrap();

        assert_eq!(tree.get("a"), Some(&XmlNode::Scalar(" x ".to_string())));
        assert_eq!(
            tree.get("b"),
            Some(&XmlNode::Array(vec![
                XmlNode::Scalar("1".to_string()),
                XmlNode::Scalar("2".to_string()),
            ]))
        );
        assert_eq!(tree.get("c"), Some(&XmlNode::Scalar(String::new())));
    }

    #[test]
    fn test_normalize_recurses_and_trims() {
        let tree = XmlNode::parse(
            "<item><CLTR_NM> Land </CLTR_NM><SUB_GROUP><INNER_KEY>v</INNER_KEY></SUB_GROUP>\
             <TAG_LIST> a </TAG_LIST><TAG_LIST><DEEP_KEY>b</DEEP_KEY></TAG_LIST></item>",
        )
        .unwrap();
        let XmlNode::Object(fields) = tree else { panic!("expected object") };

        let out = Value::Object(normalize_object(&fields));
        assert_eq!(out["cltrNm"], "Land");
        assert_eq!(out["subGroup"], json!({ "innerKey": "v" }));
        assert_eq!(out["tagList"], json!(["a", { "deepKey": "b" }]));
    }

    #[test]
    fn test_image_links_from_array() {
        let tree = XmlNode::parse(
            "<item><CLTR_IMG_FILES>\
               <CLTR_IMG_FILE>ftp://bad</CLTR_IMG_FILE>\
               <CLTR_IMG_FILE> https://img/1.jpg </CLTR_IMG_FILE>\
               <CLTR_IMG_FILE>http://img/2.jpg</CLTR_IMG_FILE>\
             </CLTR_IMG_FILES></item>",
        )
        .unwrap();
        let XmlNode::Object(fields) = tree else { panic!("expected object") };

        let out = normalize_object(&fields);
        assert_eq!(
            out["imageLinks"],
            json!([{ "seq": "1", "url": "https://img/1.jpg" }, { "seq": "2", "url": "http://img/2.jpg" }])
        );
        let original = out["cltrImgFiles"].as_str().unwrap();
        assert!(original.contains("CLTR_IMG_FILE"));
        assert!(original.contains('\n'));
    }

    #[test]
    fn test_image_links_from_single_value() {
        let tree = XmlNode::parse(
            "<item><CLTR_IMG_FILES><CLTR_IMG_FILE>https://img/only.jpg</CLTR_IMG_FILE></CLTR_IMG_FILES></item>",
        )
        .unwrap();
        let XmlNode::Object(fields) = tree else { panic!("expected object") };

        let out = normalize_object(&fields);
        assert_eq!(out["imageLinks"], json!([{ "seq": "1", "url": "https://img/only.jpg" }]));
    }

    #[test]
    fn test_image_group_without_files_is_empty_list() {
        let tree = XmlNode::parse("<item><CLTR_IMG_FILES/><RNUM>1</RNUM></item>").unwrap();
        let XmlNode::Object(fields) = tree else { panic!("expected object") };

        let out = normalize_object(&fields);
        assert_eq!(out["imageLinks"], json!([]));
        assert_eq!(out["cltrImgFiles"], "");
        assert_eq!(out["rnum"], "1");
    }

    #[test]
    fn test_list_response_single_and_many() {
        let single = "<response><header><resultCode>00</resultCode></header><body>\
            <items><item><CLTR_NM>One</CLTR_NM></item></items><totalCount>1</totalCount></body></response>";
        let page = normalize_list_response(single).unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.items, vec![json!({ "cltrNm": "One" })]);

        let many = "<response><body><items><item><RNUM>1</RNUM></item><item><RNUM>2</RNUM></item></items>\
            <totalCount>x</totalCount></body></response>";
        let page = normalize_list_response(many).unwrap();
        assert_eq!(page.total_count, 0);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[1]["rnum"], "2");
    }

    #[test]
    fn test_list_response_without_items() {
        let page = normalize_list_response("<response><body><items/><totalCount>0</totalCount></body></response>")
            .unwrap();
        assert_eq!(page.total_count, 0);
        assert!(page.items.is_empty());

        let serialized = serde_json::to_value(&page).unwrap();
        assert_eq!(serialized, json!({ "totalCount": 0, "items": [] }));
    }

    #[test]
    fn test_malformed_xml_is_parse_error() {
        assert!(matches!(
            normalize_list_response("<response><body></response>"),
            Err(IngestError::Parse(_))
        ));
        assert!(matches!(normalize_list_response(""), Err(IngestError::Parse(_))));
    }
}
