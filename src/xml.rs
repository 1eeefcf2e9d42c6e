//! A small element-tree builder for the generated nuspec and MSBuild
//! documents. Documents are assembled as a tree and serialized once, so
//! nesting and escaping cannot go wrong halfway through a file.

use std::fmt::Write as _;

#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
pub struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.children.push(Node::Text(text.to_string()));
        self
    }

    /// `<name>text</name>`, the common case for metadata fields.
    pub fn text_element(mut self, name: &str, text: &str) -> Self {
        self.children
            .push(Node::Element(Element::new(name).text(text)));
        self
    }

    pub fn comment(mut self, text: &str) -> Self {
        self.children.push(Node::Comment(text.to_string()));
        self
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn push_comment(&mut self, text: &str) {
        self.children.push(Node::Comment(text.to_string()));
    }

    fn write(&self, out: &mut String, depth: usize) {
        indent(out, depth);
        write!(out, "<{}", self.name).unwrap();
        for (name, value) in &self.attrs {
            write!(out, " {}=\"{}\"", name, escape_attr(value)).unwrap();
        }

        if self.children.is_empty() {
            out.push_str(" />\n");
            return;
        }

        // An element whose only child is text stays on one line.
        if let [Node::Text(text)] = self.children.as_slice() {
            writeln!(out, ">{}</{}>", escape_text(text), self.name).unwrap();
            return;
        }

        out.push_str(">\n");
        for child in &self.children {
            match child {
                Node::Element(e) => e.write(out, depth + 1),
                Node::Text(text) => {
                    indent(out, depth + 1);
                    out.push_str(&escape_text(text));
                    out.push('\n');
                }
                Node::Comment(text) => {
                    indent(out, depth + 1);
                    writeln!(out, "<!-- {} -->", text).unwrap();
                }
            }
        }
        indent(out, depth);
        writeln!(out, "</{}>", self.name).unwrap();
    }
}

/// A document: XML declaration, a leading comment marking the file as
/// generated, and the root element.
#[derive(Debug, Clone)]
pub struct Document {
    root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        out.push_str("<!-- Automatically generated -->\n");
        self.root.write(&mut out, 0);
        out
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}
