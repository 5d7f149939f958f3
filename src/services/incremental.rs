//! Classic incremental-update sections.
//!
//! A signed PDF must never be rewritten, so the DSS and the DocTimeStamp
//! signature are appended as incremental updates: re-emitted or new objects,
//! a cross-reference section over them, and a trailer chaining to the
//! previous `startxref`. This writer serializes `lopdf` objects directly so
//! the preceding bytes stay untouched.

use lopdf::{Dictionary, Object, ObjectId, Stream, StringFormat};

use crate::infra::error::{SigningError, SigningResult};

/// One pending incremental-update section.
pub struct UpdateSection {
    base_len: usize,
    needs_leading_newline: bool,
    prev_xref_offset: usize,
    root: ObjectId,
    max_object_number: u32,
    objects: Vec<(ObjectId, Object)>,
}

impl UpdateSection {
    /// Prepare a section that will be appended to `document` bytes.
    ///
    /// `root` is the catalog reference for the trailer; `max_object_number`
    /// the highest object number already allocated in the document.
    pub fn new(document: &[u8], root: ObjectId, max_object_number: u32) -> SigningResult<Self> {
        let prev_xref_offset = find_last_startxref(document)?;
        Ok(Self {
            base_len: document.len(),
            needs_leading_newline: document.last() != Some(&b'\n'),
            prev_xref_offset,
            root,
            max_object_number,
            objects: Vec::new(),
        })
    }

    /// Allocate the next free object number in this section.
    pub fn allocate(&mut self) -> ObjectId {
        self.max_object_number += 1;
        (self.max_object_number, 0)
    }

    /// Queue an object, either newly allocated or re-emitting an existing id.
    pub fn add_object(&mut self, id: ObjectId, object: Object) {
        self.max_object_number = self.max_object_number.max(id.0);
        self.objects.push((id, object));
    }

    /// Serialize the section: objects, xref subsections, trailer, startxref.
    /// The returned bytes are appended verbatim to the document.
    pub fn render(&self) -> Vec<u8> {
        let mut out = Vec::new();
        if self.needs_leading_newline {
            out.push(b'\n');
        }

        let mut offsets: Vec<(ObjectId, usize)> = Vec::with_capacity(self.objects.len());
        for (id, object) in &self.objects {
            offsets.push((*id, self.base_len + out.len()));
            out.extend_from_slice(format!("{} {} obj\n", id.0, id.1).as_bytes());
            serialize_object(&mut out, object);
            out.extend_from_slice(b"\nendobj\n");
        }

        let xref_offset = self.base_len + out.len();
        out.extend_from_slice(b"xref\n0 1\n0000000000 65535 f \n");
        offsets.sort_by_key(|(id, _)| id.0);
        let mut index = 0;
        while index < offsets.len() {
            let run_start = index;
            while index + 1 < offsets.len()
                && offsets[index + 1].0 .0 == offsets[index].0 .0 + 1
            {
                index += 1;
            }
            index += 1;
            let first = offsets[run_start].0 .0;
            out.extend_from_slice(format!("{} {}\n", first, index - run_start).as_bytes());
            for (id, offset) in &offsets[run_start..index] {
                out.extend_from_slice(format!("{offset:010} {:05} n \n", id.1).as_bytes());
            }
        }

        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root {} {} R /Prev {} >>\nstartxref\n{}\n%%EOF\n",
                self.max_object_number + 1,
                self.root.0,
                self.root.1,
                self.prev_xref_offset,
                xref_offset
            )
            .as_bytes(),
        );
        out
    }
}

/// Offset recorded by the last `startxref` keyword in the document.
pub fn find_last_startxref(bytes: &[u8]) -> SigningResult<usize> {
    let keyword = b"startxref";
    let position = (0..=bytes.len().saturating_sub(keyword.len()))
        .rev()
        .find(|&i| &bytes[i..i + keyword.len()] == keyword)
        .ok_or_else(|| SigningError::ParseFailure("no startxref keyword in PDF".into()))?;

    let tail = &bytes[position + keyword.len()..];
    let digits: String = tail
        .iter()
        .copied()
        .skip_while(|b| b.is_ascii_whitespace())
        .take_while(|b| b.is_ascii_digit())
        .map(char::from)
        .collect();
    digits
        .parse::<usize>()
        .map_err(|_| SigningError::ParseFailure("unreadable startxref offset".into()))
}

/// Serialize a single `lopdf` object body.
fn serialize_object(out: &mut Vec<u8>, object: &Object) {
    match object {
        Object::Null => out.extend_from_slice(b"null"),
        Object::Boolean(value) => {
            out.extend_from_slice(if *value { b"true" } else { b"false" });
        }
        Object::Integer(value) => out.extend_from_slice(value.to_string().as_bytes()),
        Object::Real(value) => out.extend_from_slice(value.to_string().as_bytes()),
        Object::Name(name) => {
            out.push(b'/');
            out.extend_from_slice(name);
        }
        Object::String(bytes, StringFormat::Hexadecimal) => {
            out.push(b'<');
            out.extend_from_slice(hex::encode(bytes).as_bytes());
            out.push(b'>');
        }
        Object::String(bytes, StringFormat::Literal) => {
            out.push(b'(');
            for &byte in bytes {
                match byte {
                    b'(' | b')' | b'\\' => {
                        out.push(b'\\');
                        out.push(byte);
                    }
                    other => out.push(other),
                }
            }
            out.push(b')');
        }
        Object::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b' ');
                }
                serialize_object(out, item);
            }
            out.push(b']');
        }
        Object::Dictionary(dict) => serialize_dictionary(out, dict),
        Object::Stream(stream) => serialize_stream(out, stream),
        Object::Reference(id) => {
            out.extend_from_slice(format!("{} {} R", id.0, id.1).as_bytes());
        }
    }
}

fn serialize_dictionary(out: &mut Vec<u8>, dict: &Dictionary) {
    out.extend_from_slice(b"<< ");
    for (key, value) in dict.iter() {
        out.push(b'/');
        out.extend_from_slice(key);
        out.push(b' ');
        serialize_object(out, value);
        out.push(b' ');
    }
    out.extend_from_slice(b">>");
}

fn serialize_stream(out: &mut Vec<u8>, stream: &Stream) {
    let mut dict = stream.dict.clone();
    dict.set("Length", Object::Integer(stream.content.len() as i64));
    serialize_dictionary(out, &dict);
    out.extend_from_slice(b"\nstream\n");
    out.extend_from_slice(&stream.content);
    out.extend_from_slice(b"\nendstream");
}
