//! In-memory record tree shared by both dialects.
//!
//! Raw bytes live in blocks owned by the tree; records and fields refer to
//! them through [`Span`]s, so string values are never copied out of the
//! buffers they were read into.

use std::borrow::Cow;

use super::keywords::{FieldKey, RecordKind};
use super::units;
use crate::types::Coord;

/// A byte range within one block of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub block: usize,
    pub start: usize,
    pub end: usize,
}

/// Raw name of a record type or field key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Name {
    Span(Span),
    /// Names of fields synthesized from binary records.
    Static(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Str(Span),
    Coord(Coord),
    Double(f64),
    Int(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: FieldKey,
    pub name: Name,
    pub value: Value,
}

impl Field {
    pub fn synthetic(key: FieldKey, value: Value) -> Self {
        Self {
            key,
            name: Name::Static(key.as_str()),
            value,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Record {
    pub kind: RecordKind,
    pub name: Name,
    /// Ordinal within the record's bucket; cross references use it as id.
    pub index: usize,
    pub fields: Vec<Field>,
}

#[derive(Debug)]
struct Block {
    data: Box<[u8]>,
}

#[derive(Debug)]
pub struct Tree {
    blocks: Vec<Block>,
    buckets: Vec<Vec<Record>>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            buckets: (0..RecordKind::COUNT).map(|_| Vec::new()).collect(),
        }
    }

    /// Take ownership of a buffer; returns its block index.
    pub fn push_block(&mut self, data: Vec<u8>) -> usize {
        self.blocks.push(Block {
            data: data.into_boxed_slice(),
        });
        self.blocks.len() - 1
    }

    pub fn block(&self, id: usize) -> &[u8] {
        &self.blocks[id].data
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn bytes(&self, span: Span) -> &[u8] {
        &self.blocks[span.block].data[span.start..span.end]
    }

    /// Decode a span as text. PcbDoc strings are Windows-1252; bytes are
    /// mapped as Latin-1.
    pub fn str(&self, span: Span) -> Cow<'_, str> {
        latin1(self.bytes(span))
    }

    pub fn name(&self, name: &Name) -> Cow<'_, str> {
        match name {
            Name::Span(span) => self.str(*span),
            Name::Static(s) => Cow::Borrowed(s),
        }
    }

    /// Append a record to the bucket of its kind.
    pub fn add_record(&mut self, kind: RecordKind, name: Name, fields: Vec<Field>) -> &Record {
        let bucket = &mut self.buckets[kind.index()];
        let index = bucket.len();
        bucket.push(Record {
            kind,
            name,
            index,
            fields,
        });
        &bucket[index]
    }

    pub fn records(&self, kind: RecordKind) -> &[Record] {
        &self.buckets[kind.index()]
    }

    pub fn record_count(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn fields<'t>(&'t self, rec: &'t Record) -> impl Iterator<Item = FieldRef<'t>> + 't {
        rec.fields.iter().map(move |field| FieldRef { tree: self, field })
    }
}

fn latin1(bytes: &[u8]) -> Cow<'_, str> {
    if bytes.is_ascii() {
        if let Ok(s) = std::str::from_utf8(bytes) {
            return Cow::Borrowed(s);
        }
    }
    Cow::Owned(bytes.iter().map(|&b| b as char).collect())
}

/// A field together with the tree that owns its bytes.
#[derive(Clone, Copy)]
pub struct FieldRef<'t> {
    tree: &'t Tree,
    field: &'t Field,
}

impl<'t> FieldRef<'t> {
    pub fn key(&self) -> FieldKey {
        self.field.key
    }

    pub fn raw_key(&self) -> Cow<'t, str> {
        self.tree.name(&self.field.name)
    }

    pub fn value(&self) -> Value {
        self.field.value
    }

    pub fn str(&self) -> Cow<'t, str> {
        match self.field.value {
            Value::Str(span) => self.tree.str(span),
            Value::Int(i) => Cow::Owned(i.to_string()),
            Value::Double(d) => Cow::Owned(d.to_string()),
            Value::Coord(c) => Cow::Owned(format!("{}mil", units::to_mil(c))),
        }
    }

    pub fn coord(&self) -> Option<Coord> {
        match self.field.value {
            Value::Str(span) => units::parse_coord(&self.tree.str(span)),
            Value::Coord(c) => Some(c),
            Value::Int(i) => units::checked_mil(i as f64),
            Value::Double(d) => units::checked_mil(d),
        }
    }

    pub fn f64(&self) -> Option<f64> {
        match self.field.value {
            Value::Str(span) => self.tree.str(span).trim().parse().ok(),
            Value::Double(d) => Some(d),
            Value::Int(i) => Some(i as f64),
            Value::Coord(c) => Some(units::to_mil(c)),
        }
    }

    pub fn int(&self) -> Option<i64> {
        match self.field.value {
            Value::Str(span) => {
                let s = self.tree.str(span);
                let s = s.trim();
                s.parse().ok().or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|v| v.fract() == 0.0)
                        .map(|v| v as i64)
                })
            }
            Value::Int(i) => Some(i),
            Value::Double(_) | Value::Coord(_) => None,
        }
    }

    pub fn bool(&self) -> Option<bool> {
        match self.field.value {
            Value::Str(span) => match self.tree.str(span).trim().to_ascii_uppercase().as_str() {
                "TRUE" | "T" | "1" => Some(true),
                "FALSE" | "F" | "0" => Some(false),
                _ => None,
            },
            Value::Int(i) => Some(i != 0),
            Value::Double(_) | Value::Coord(_) => None,
        }
    }
}
