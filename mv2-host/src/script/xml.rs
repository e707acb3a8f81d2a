//! XML backend for the script model.
//!
//! Document shape: a `<scripts>` root with exactly one `<initialization>`
//! and one `<measurement>` child, each carrying command and loop elements.
//! Commands hold `<type>` and `<value>` hex children plus `outputIndex` /
//! `outputName` attributes; loops hold `count` and `average` attributes.
//! Schema validation proper is the validator's job; the structural checks
//! here reject what the compiler couldn't give a meaning to.

use std::path::Path;

use roxmltree::{Document, Node};

use crate::error::HostError;
use crate::script::{CommandSpec, Item, Repeat, ScriptSet, Section};

impl ScriptSet {
    /// Parse a script document from its text.
    pub fn from_xml(text: &str) -> Result<Self, HostError> {
        let doc = Document::parse(text)
            .map_err(|e| HostError::BadScript(format!("unable to parse XML: {e}")))?;
        let root = doc.root_element();
        if root.tag_name().name() != "scripts" {
            return Err(HostError::BadScript(format!(
                "expected <scripts> root, found <{}>",
                root.tag_name().name()
            )));
        }
        Ok(Self {
            initialization: section(root, "initialization")?,
            measurement: section(root, "measurement")?,
        })
    }

    /// Read and parse a script file.
    pub fn load(path: &Path) -> Result<Self, HostError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_xml(&text)
    }
}

fn section(root: Node, name: &str) -> Result<Section, HostError> {
    let mut nodes = root.children().filter(|n| n.has_tag_name(name));
    let node = nodes
        .next()
        .ok_or_else(|| HostError::BadScript(format!("missing <{name}> section")))?;
    if nodes.next().is_some() {
        return Err(HostError::BadScript(format!(
            "only one <{name}> section is handled"
        )));
    }

    let repeat = match node.attribute("repeat") {
        None => Repeat::from_attr(-1),
        Some(raw) => Repeat::from_attr(int_attr(raw, "repeat")?),
    };

    let mut items = Vec::new();
    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "command" => items.push(Item::Command(command(child)?)),
            "loop" => items.push(loop_item(child)?),
            other => {
                return Err(HostError::BadScript(format!(
                    "unexpected <{other}> element in <{name}>"
                )))
            }
        }
    }
    Ok(Section { repeat, items })
}

fn command(node: Node) -> Result<CommandSpec, HostError> {
    let output_index = int_attr(required_attr(node, "outputIndex")?, "outputIndex")?;
    let output_name = required_attr(node, "outputName")?.to_string();
    Ok(CommandSpec {
        type_byte: hex_child(node, "type")?,
        value: hex_child(node, "value")?,
        output_index: output_index as i32,
        output_name,
    })
}

fn loop_item(node: Node) -> Result<Item, HostError> {
    let count = int_attr(required_attr(node, "count")?, "count")?;
    let count = u8::try_from(count)
        .map_err(|_| HostError::BadScript(format!("loop count {count} out of range")))?;
    let average = required_attr(node, "average")? == "true";

    let mut body = Vec::new();
    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "command" => body.push(command(child)?),
            "loop" => return Err(HostError::NestedLoop),
            other => {
                return Err(HostError::BadScript(format!(
                    "unexpected <{other}> element in <loop>"
                )))
            }
        }
    }
    Ok(Item::Loop {
        count,
        average,
        body,
    })
}

fn required_attr<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str, HostError> {
    node.attribute(name).ok_or_else(|| {
        HostError::BadScript(format!(
            "<{}> is missing the {name} attribute",
            node.tag_name().name()
        ))
    })
}

fn int_attr(raw: &str, name: &str) -> Result<i64, HostError> {
    raw.trim()
        .parse()
        .map_err(|_| HostError::BadScript(format!("{name} attribute is not an integer: {raw:?}")))
}

fn hex_child(node: Node, name: &str) -> Result<u8, HostError> {
    let child = node
        .children()
        .find(|n| n.has_tag_name(name))
        .ok_or_else(|| HostError::BadScript(format!("<command> is missing a <{name}> child")))?;
    let text = child.text().unwrap_or("").trim();
    let text = text.strip_prefix("0x").unwrap_or(text);
    u8::from_str_radix(text, 16)
        .map_err(|_| HostError::BadScript(format!("<{name}> is not a hex byte: {text:?}")))
}
