//! Namespace-aware XML document model for capability documents.
//!
//! Parsing is two passes over the raw body. The first pass collects every
//! namespace declaration into a [`NamespaceTable`]; the second builds the
//! element tree. A queryable [`XmlDocument`] can only be obtained from
//! [`XmlDocument::parse`], which always runs the first pass before the second,
//! so prefixed path lookups never happen without a table to resolve them.
//!
//! Paths follow the ElementTree subset used by capability parsers:
//! `ows:OperationsMetadata/ows:Operation`, `.//wfs:FeatureType`,
//! `gml:origin/gml:Point/gml:pos`, `*` and `{uri}local` steps.

use std::collections::{BTreeMap, HashMap};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;

use ogc_common::{OgcError, OgcResult};

/// URI bound to the reserved `xml` prefix.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Fallbacks for prefixes a document uses in paths without declaring them.
const WELL_KNOWN: &[(&str, &str)] = &[
    ("ows", "http://www.opengis.net/ows/1.1"),
    ("wfs", "http://www.opengis.net/wfs/2.0"),
    ("fes", "http://www.opengis.net/fes/2.0"),
    ("wcs", "http://www.opengis.net/wcs/2.0"),
    ("gml", "http://www.opengis.net/gml/3.2"),
    ("gmlcov", "http://www.opengis.net/gmlcov/1.0"),
    ("swe", "http://www.opengis.net/swe/2.0"),
    ("crs", "http://www.opengis.net/wcs/crs/1.0"),
    ("xlink", "http://www.w3.org/1999/xlink"),
    ("xsi", "http://www.w3.org/2001/XMLSchema-instance"),
    ("xml", XML_NS),
];

/// Prefix → URI table built by the first parsing pass.
///
/// The empty prefix holds the document's default namespace. When a prefix is
/// declared more than once, the first (outermost) declaration wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NamespaceTable {
    prefixes: BTreeMap<String, String>,
}

impl NamespaceTable {
    /// Collect every `xmlns` / `xmlns:p` declaration in document order.
    pub fn extract(body: &[u8]) -> OgcResult<Self> {
        let mut reader = Reader::from_reader(body);
        reader.trim_text(true);
        let mut buf = Vec::new();
        let mut table = NamespaceTable::default();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                    for (prefix, uri) in declarations(e)? {
                        table.prefixes.entry(prefix).or_insert(uri);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(parse_error(&reader, e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(table)
    }

    /// URI declared in the document for `prefix`.
    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(String::as_str)
    }

    /// URI for `prefix`, falling back to the well-known OGC namespaces.
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        self.get(prefix).or_else(|| {
            WELL_KNOWN
                .iter()
                .find(|(p, _)| *p == prefix)
                .map(|(_, uri)| *uri)
        })
    }

    /// The document's default namespace.
    pub fn default_namespace(&self) -> Option<&str> {
        self.get("")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

/// One element of the parsed tree.
#[derive(Debug, Clone)]
struct Element {
    local: String,
    namespace: Option<String>,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

/// A parsed document: the namespace table plus the element tree.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    namespaces: NamespaceTable,
    root: Element,
}

impl XmlDocument {
    /// Parse `body`, running the namespace pass first.
    pub fn parse(body: &[u8]) -> OgcResult<Self> {
        let namespaces = NamespaceTable::extract(body)?;
        let root = build_tree(body, &namespaces)?;
        Ok(Self { namespaces, root })
    }

    pub fn namespaces(&self) -> &NamespaceTable {
        &self.namespaces
    }

    pub fn root(&self) -> Node<'_> {
        Node {
            element: &self.root,
            namespaces: &self.namespaces,
        }
    }
}

/// Borrowed view of an element, carrying the table its paths resolve through.
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    element: &'a Element,
    namespaces: &'a NamespaceTable,
}

impl<'a> Node<'a> {
    pub fn local_name(&self) -> &'a str {
        &self.element.local
    }

    pub fn namespace(&self) -> Option<&'a str> {
        self.element.namespace.as_deref()
    }

    /// Trimmed text content ("" when the element has none).
    pub fn text(&self) -> &'a str {
        &self.element.text
    }

    /// Text content, `None` when empty.
    pub fn text_opt(&self) -> Option<&'a str> {
        let text = self.element.text.as_str();
        (!text.is_empty()).then_some(text)
    }

    /// Attribute by its qualified name as written (`name`, `xml:lang`).
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element
            .attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn children(&self) -> impl Iterator<Item = Node<'a>> + 'a {
        let namespaces = self.namespaces;
        self.element.children.iter().map(move |element| Node {
            element,
            namespaces,
        })
    }

    /// First element matching `path`.
    pub fn find(&self, path: &str) -> Option<Node<'a>> {
        self.find_all(path).into_iter().next()
    }

    /// Every element matching `path`, in document order.
    pub fn find_all(&self, path: &str) -> Vec<Node<'a>> {
        let steps = match parse_path(path, self.namespaces) {
            Some(steps) => steps,
            None => return Vec::new(),
        };

        let mut current = vec![*self];
        for step in &steps {
            let mut next = Vec::new();
            for node in &current {
                if step.descendant {
                    node.collect_descendants(&step.test, &mut next);
                } else {
                    next.extend(node.children().filter(|c| step.test.matches(c)));
                }
            }
            current = next;
            if current.is_empty() {
                break;
            }
        }
        current
    }

    /// Text of the first element matching `path`, `None` when absent or empty.
    pub fn find_text(&self, path: &str) -> Option<&'a str> {
        self.find(path).and_then(|n| n.text_opt())
    }

    fn collect_descendants(&self, test: &NameTest, out: &mut Vec<Node<'a>>) {
        for child in self.children() {
            if test.matches(&child) {
                out.push(child);
            }
            child.collect_descendants(test, out);
        }
    }
}

#[derive(Debug)]
struct Step {
    descendant: bool,
    test: NameTest,
}

#[derive(Debug)]
enum NameTest {
    Any,
    Name {
        namespace: Option<String>,
        local: String,
    },
}

impl NameTest {
    fn matches(&self, node: &Node<'_>) -> bool {
        match self {
            NameTest::Any => true,
            NameTest::Name { namespace, local } => {
                node.local_name() == local && node.namespace() == namespace.as_deref()
            }
        }
    }
}

/// Compile a path against `namespaces`. `None` when a prefix cannot be resolved.
fn parse_path(path: &str, namespaces: &NamespaceTable) -> Option<Vec<Step>> {
    let path = match path.strip_prefix("./") {
        Some(rest) => rest,
        None => path.strip_prefix('.').unwrap_or(path),
    };

    let mut steps = Vec::new();
    let mut descendant = false;
    for token in split_steps(path) {
        if token.is_empty() {
            descendant = true;
            continue;
        }
        steps.push(Step {
            descendant,
            test: name_test(token, namespaces)?,
        });
        descendant = false;
    }
    Some(steps)
}

/// Split on `/` outside of `{uri}` groups.
fn split_steps(path: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in path.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '/' if depth == 0 => {
                tokens.push(&path[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    tokens.push(&path[start..]);
    tokens
}

fn name_test(token: &str, namespaces: &NamespaceTable) -> Option<NameTest> {
    if token == "*" {
        return Some(NameTest::Any);
    }
    if let Some(rest) = token.strip_prefix('{') {
        let (uri, local) = rest.split_once('}')?;
        return Some(NameTest::Name {
            namespace: (!uri.is_empty()).then(|| uri.to_string()),
            local: local.to_string(),
        });
    }
    match token.split_once(':') {
        Some((prefix, local)) => Some(NameTest::Name {
            namespace: Some(namespaces.resolve(prefix)?.to_string()),
            local: local.to_string(),
        }),
        None => Some(NameTest::Name {
            namespace: namespaces.default_namespace().map(str::to_string),
            local: token.to_string(),
        }),
    }
}

fn declarations(e: &BytesStart<'_>) -> OgcResult<Vec<(String, String)>> {
    let mut out = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| OgcError::MalformedDocument(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let prefix = if key == "xmlns" {
            String::new()
        } else if let Some(p) = key.strip_prefix("xmlns:") {
            p.to_string()
        } else {
            continue;
        };
        out.push((prefix, attr.unescape_value()?.into_owned()));
    }
    Ok(out)
}

fn parse_error(reader: &Reader<&[u8]>, err: quick_xml::Error) -> OgcError {
    OgcError::MalformedDocument(format!(
        "XML parsing error at position {}: {}",
        reader.buffer_position(),
        err
    ))
}

/// Second pass: build the element tree, resolving prefixes through the
/// in-scope declarations first and the document table second.
fn build_tree(body: &[u8], namespaces: &NamespaceTable) -> OgcResult<Element> {
    let mut reader = Reader::from_reader(body);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut stack: Vec<Element> = Vec::new();
    let mut scopes: Vec<HashMap<String, String>> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let scope: HashMap<String, String> = declarations(e)?.into_iter().collect();
                scopes.push(scope);
                stack.push(open_element(e, &scopes, namespaces)?);
            }
            Ok(Event::Empty(ref e)) => {
                let scope: HashMap<String, String> = declarations(e)?.into_iter().collect();
                scopes.push(scope);
                let element = open_element(e, &scopes, namespaces)?;
                scopes.pop();
                attach(element, &mut stack, &mut root);
            }
            Ok(Event::End(_)) => {
                scopes.pop();
                if let Some(element) = stack.pop() {
                    attach(element, &mut stack, &mut root);
                }
            }
            Ok(Event::Text(ref t)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(t.unescape()?.trim());
                }
            }
            Ok(Event::CData(t)) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(String::from_utf8_lossy(&t.into_inner()).trim());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(parse_error(&reader, e)),
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(OgcError::MalformedDocument(
            "unexpected end of document".to_string(),
        ));
    }
    root.ok_or_else(|| OgcError::MalformedDocument("document has no root element".to_string()))
}

fn open_element(
    e: &BytesStart<'_>,
    scopes: &[HashMap<String, String>],
    namespaces: &NamespaceTable,
) -> OgcResult<Element> {
    let qname = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let (prefix, local) = match qname.split_once(':') {
        Some((p, l)) => (p.to_string(), l.to_string()),
        None => (String::new(), qname.clone()),
    };

    let namespace = scopes
        .iter()
        .rev()
        .find_map(|scope| scope.get(&prefix).cloned())
        .or_else(|| {
            if prefix.is_empty() {
                namespaces.default_namespace().map(str::to_string)
            } else {
                namespaces.resolve(&prefix).map(str::to_string)
            }
        })
        .filter(|uri| !uri.is_empty());

    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| OgcError::MalformedDocument(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }
        attributes.push((key, attr.unescape_value()?.into_owned()));
    }

    Ok(Element {
        local,
        namespace,
        attributes,
        text: String::new(),
        children: Vec::new(),
    })
}

fn attach(element: Element, stack: &mut [Element], root: &mut Option<Element>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}
