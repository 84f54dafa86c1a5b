//! Nested (qs-style) key-value parsing.
//!
//! Each key is split into a parent and bracket segments, `a[b][]` becomes
//! `a`, `[b]`, `[]`. Every pair is turned into a small tree, leaf first, and merged
//! into the result:
//!
//! - `[]` appends to an array
//! - `[n]` with `n <= array_limit` places the value at index `n` of an array,
//!   holes are removed at the end so `a[1]=x` gives `a: ["x"]`
//! - any other segment is a map key, larger indices included
//!
//! Repeated keys first collect their values into an array, `a=1&a=2` gives
//! `a: ["1", "2"]`. When a string meets a map or an array during merging both end
//! up in one array, in arrival order.
//!
//! Nesting depth is unbounded unless [`ParseOptions::depth`] says otherwise; the
//! tree lives in a flat arena and is walked with explicit work-lists.

use crate::error::BodyError;
use crate::parser::{KeyValueParser, ParseOptions, tokenize};
use crate::value::{FormMap, FormValue};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};

const PROTOTYPE_KEYS: [&str; 12] = [
    "__proto__",
    "__defineGetter__",
    "__defineSetter__",
    "__lookupGetter__",
    "__lookupSetter__",
    "constructor",
    "hasOwnProperty",
    "isPrototypeOf",
    "propertyIsEnumerable",
    "toLocaleString",
    "toString",
    "valueOf",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct NestedParser;

impl KeyValueParser for NestedParser {
    fn name(&self) -> &'static str {
        "nested"
    }

    fn parse(&self, input: &[u8], options: &ParseOptions) -> Result<FormMap, BodyError> {
        let mut tree = Tree::default();
        let root = tree.add(Node::Map(BTreeMap::new()));

        for (key, values) in group_by_key(tokenize(input, options.max_keys)?) {
            if key.is_empty() {
                continue;
            }

            let Some(segments) = split_key(&key, options) else {
                continue;
            };

            let value = tree.add_values(values);
            let fragment = tree.build(&segments, value, options);
            tree.merge(root, fragment);
        }

        Ok(tree.into_form(root))
    }
}

type NodeId = usize;

/// Intermediate tree node, arrays stay sparse until compacted.
///
/// Children are referred to by their index in the owning `Tree`.
#[derive(Debug)]
enum Node {
    Leaf(String),
    List(BTreeMap<usize, NodeId>),
    Map(BTreeMap<String, NodeId>),
}

/// Arena holding every node of a parse.
///
/// Keys may nest arbitrarily deep, so building, merging, compacting and dropping
/// all walk the tree with explicit work-lists; none of them recurses per level.
#[derive(Debug, Default)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn add(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn take(&mut self, id: NodeId) -> Node {
        std::mem::replace(&mut self.nodes[id], Node::Leaf(String::new()))
    }

    fn is_container(&self, id: NodeId) -> bool {
        !matches!(self.nodes[id], Node::Leaf(_))
    }

    /// A single value stays a leaf, repeated values of one raw key become an array.
    fn add_values(&mut self, mut values: Vec<String>) -> NodeId {
        if values.len() == 1 {
            let value = values.pop().unwrap_or_default();
            return self.add(Node::Leaf(value));
        }

        let list = values.into_iter().enumerate().map(|(index, value)| (index, self.add(Node::Leaf(value)))).collect();
        self.add(Node::List(list))
    }

    /// Builds the nodes of a single pair, innermost segment first.
    fn build(&mut self, segments: &[String], value: NodeId, options: &ParseOptions) -> NodeId {
        let mut child = value;

        for segment in segments.iter().rev() {
            let node = if segment == "[]" {
                if matches!(self.nodes[child], Node::List(_)) {
                    continue;
                }
                Node::List(BTreeMap::from([(0, child)]))
            } else {
                let bracketed = segment.len() >= 2 && segment.starts_with('[') && segment.ends_with(']');
                let clean = if bracketed { &segment[1..segment.len() - 1] } else { segment.as_str() };

                match clean.parse::<usize>() {
                    Ok(index) if bracketed && index.to_string() == clean && index <= options.array_limit => {
                        Node::List(BTreeMap::from([(index, child)]))
                    }
                    _ => Node::Map(BTreeMap::from([(clean.to_owned(), child)])),
                }
            };
            child = self.add(node);
        }

        child
    }

    /// Re-keys a node as a map: array indices become string keys, a leaf lands under `"0"`.
    fn map_entries(&mut self, node: Node) -> BTreeMap<String, NodeId> {
        match node {
            Node::Map(map) => map,
            Node::List(list) => list.into_iter().map(|(index, id)| (index.to_string(), id)).collect(),
            leaf @ Node::Leaf(_) => BTreeMap::from([("0".to_owned(), self.add(leaf))]),
        }
    }

    /// Merges the subtree at `source` into the one at `target`, in place.
    ///
    /// Pairs of children that still need merging are pushed onto a work-list,
    /// each pair touches a disjoint subtree so the processing order is free.
    fn merge(&mut self, target: NodeId, source: NodeId) {
        let mut pending = vec![(target, source)];

        while let Some((target, source)) = pending.pop() {
            let incoming = self.take(source);
            let merged = match (self.take(target), incoming) {
                (Node::List(mut list), leaf @ Node::Leaf(_)) => {
                    let id = self.add(leaf);
                    push(&mut list, id);
                    Node::List(list)
                }
                (current, leaf @ Node::Leaf(_)) => {
                    let first = self.add(current);
                    let second = self.add(leaf);
                    Node::List(BTreeMap::from([(0, first), (1, second)]))
                }

                (leaf @ Node::Leaf(_), Node::List(list)) => {
                    let mut merged = BTreeMap::from([(0, self.add(leaf))]);
                    merged.extend(list.into_iter().map(|(index, id)| (index + 1, id)));
                    Node::List(merged)
                }
                (leaf @ Node::Leaf(_), map @ Node::Map(_)) => {
                    let first = self.add(leaf);
                    let second = self.add(map);
                    Node::List(BTreeMap::from([(0, first), (1, second)]))
                }

                (Node::List(mut list), Node::List(items)) => {
                    for (index, item) in items {
                        match list.get(&index) {
                            Some(&existing) if self.is_container(existing) && self.is_container(item) => {
                                pending.push((existing, item));
                            }
                            Some(_) => push(&mut list, item),
                            None => {
                                list.insert(index, item);
                            }
                        }
                    }
                    Node::List(list)
                }
                (list @ Node::List(_), Node::Map(items)) => {
                    let map = self.map_entries(list);
                    merge_maps(map, items, &mut pending)
                }
                (Node::Map(map), list @ Node::List(_)) => {
                    let items = self.map_entries(list);
                    merge_maps(map, items, &mut pending)
                }
                (Node::Map(map), Node::Map(items)) => merge_maps(map, items, &mut pending),
            };

            self.nodes[target] = merged;
        }
    }

    /// Turns the tree below `root` into form values, dropping array holes.
    ///
    /// Nodes are listed parents first, then converted in reverse so every child is
    /// ready before its parent takes it.
    fn into_form(mut self, root: NodeId) -> FormMap {
        let root_node = self.take(root);
        let root = self.map_entries(root_node);

        let mut order = Vec::new();
        let mut stack: Vec<NodeId> = root.values().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            match &self.nodes[id] {
                Node::Leaf(_) => {}
                Node::List(list) => stack.extend(list.values().copied()),
                Node::Map(map) => stack.extend(map.values().copied()),
            }
        }

        let mut values: Vec<Option<FormValue>> = std::iter::repeat_with(|| None).take(self.nodes.len()).collect();
        for id in order.into_iter().rev() {
            let value = match self.take(id) {
                Node::Leaf(value) => FormValue::String(value),
                Node::List(list) => FormValue::Array(list.into_values().filter_map(|child| values[child].take()).collect()),
                Node::Map(map) => FormValue::Map(
                    map.into_iter().filter_map(|(key, child)| values[child].take().map(|value| (key, value))).collect(),
                ),
            };
            values[id] = Some(value);
        }

        root.into_iter().filter_map(|(key, id)| values[id].take().map(|value| (key, value))).collect()
    }
}

fn merge_maps(
    mut map: BTreeMap<String, NodeId>,
    items: BTreeMap<String, NodeId>,
    pending: &mut Vec<(NodeId, NodeId)>,
) -> Node {
    for (key, item) in items {
        match map.entry(key) {
            Entry::Occupied(entry) => pending.push((*entry.get(), item)),
            Entry::Vacant(entry) => {
                entry.insert(item);
            }
        }
    }
    Node::Map(map)
}

fn push(list: &mut BTreeMap<usize, NodeId>, id: NodeId) {
    let next = list.last_key_value().map_or(0, |(index, _)| index + 1);
    list.insert(next, id);
}

/// Collects the values of identical raw keys, keeping first-seen key order.
fn group_by_key(pairs: Vec<(String, String)>) -> Vec<(String, Vec<String>)> {
    let mut grouped: Vec<(String, Vec<String>)> = Vec::with_capacity(pairs.len());
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(pairs.len());

    for (key, value) in pairs {
        match positions.get(&key) {
            Some(&position) => grouped[position].1.push(value),
            None => {
                positions.insert(key.clone(), grouped.len());
                grouped.push((key, vec![value]));
            }
        }
    }

    grouped
}

/// Splits `key` into its parent and bracket segments.
///
/// Returns `None` when a segment names an object built-in and prototypes are not
/// allowed; the whole pair is dropped then.
fn split_key(key: &str, options: &ParseOptions) -> Option<Vec<String>> {
    let dotted;
    let key = if options.allow_dots {
        dotted = dots_to_brackets(key);
        dotted.as_str()
    } else {
        key
    };

    let mut segments = Vec::new();
    let first = next_bracket(key, 0);
    let parent = match first {
        Some((start, _)) => &key[..start],
        None => key,
    };

    if !parent.is_empty() {
        if !options.allow_prototypes && PROTOTYPE_KEYS.contains(&parent) {
            return None;
        }
        segments.push(parent.to_owned());
    }

    let mut cursor = first;
    let mut children = 0;
    while let Some((start, end)) = cursor {
        if options.depth.is_some_and(|depth| children >= depth) {
            segments.push(format!("[{}]", &key[start..]));
            break;
        }

        let segment = &key[start..end];
        if !options.allow_prototypes && PROTOTYPE_KEYS.contains(&&segment[1..segment.len() - 1]) {
            return None;
        }
        segments.push(segment.to_owned());
        children += 1;
        cursor = next_bracket(key, end);
    }

    Some(segments)
}

/// Finds the next `[...]` group at or after `from` whose content holds no bracket,
/// returned as a `start..end` byte range including both brackets.
fn next_bracket(key: &str, from: usize) -> Option<(usize, usize)> {
    let bytes = key.as_bytes();
    let mut open = None;

    for (index, byte) in bytes.iter().enumerate().skip(from) {
        match byte {
            b'[' => open = Some(index),
            b']' => {
                if let Some(start) = open {
                    return Some((start, index + 1));
                }
            }
            _ => {}
        }
    }

    None
}

/// Rewrites `a.b.c` as `a[b][c]`; a dot followed by another dot or a bracket is kept,
/// so `d..e` becomes `d.[e]`.
fn dots_to_brackets(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut rest = key;

    while let Some(dot) = rest.find('.') {
        out.push_str(&rest[..dot]);
        let after = &rest[dot + 1..];
        let len = after.find(['.', '[']).unwrap_or(after.len());
        if len == 0 {
            out.push('.');
        } else {
            out.push('[');
            out.push_str(&after[..len]);
            out.push(']');
        }
        rest = &after[len..];
    }

    out.push_str(rest);
    out
}
