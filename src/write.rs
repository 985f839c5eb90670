//! Writing values into a tree.
//!
//! The writer is the only place node values and tree shape are mutated.
//! Each supported type gets its own dispatch arm mirroring the DER rules it
//! lives under: integers are canonicalized, values equal to a declared
//! DEFAULT are stored empty (DER never encodes a default), strings are
//! length-wrapped, and the container types mutate shape instead of storing
//! bytes.
//!
//! A replacement value buffer is always built in full before it is
//! installed. If a write fails, the previous value of the node is intact.

use bytes::Bytes;
use smallvec::SmallVec;
use crate::der::{length_der, length_der_len, octet_der, bit_der};
use crate::error::Error;
use crate::int::{convert_integer, min_twos_complement, IntBuf};
use crate::node::{Flags, NodeType};
use crate::tree::{NodeId, Tree};
use crate::xerr;


//------------ Value ---------------------------------------------------------

/// An input value for [`Tree::write_value`].
#[derive(Clone, Copy, Debug)]
pub enum Value<'a> {
    /// No value.
    ///
    /// Written to an OPTIONAL element, this deletes the element. Written
    /// to a SEQUENCE OF or SET OF, this deletes every element after the
    /// template.
    Null,

    /// A textual form: decimal integers, `TRUE`/`FALSE`, dotted object
    /// identifiers, time strings, CHOICE alternative names, named
    /// constants, or the growth keyword `NEW`.
    Text(&'a str),

    /// Raw bytes: two's-complement integers, octet string content, or the
    /// pre-encoded DER of an ANY element.
    Bytes(&'a [u8]),

    /// Bit string content with an explicit bit count.
    Bits(&'a [u8], usize),
}


//------------ Writing -------------------------------------------------------

/// # Writing Values
///
impl Tree {
    /// Sets the value of the element at `path`.
    ///
    /// The interpretation of `value` depends on the type of the addressed
    /// element; see [`Value`] and the per-type helpers below. On failure
    /// nothing in the tree has changed.
    pub fn write_value(
        &mut self, path: &str, value: Value,
    ) -> Result<(), Error> {
        let id = self.find(path)?;
        let (typ, flags) = {
            let node = self.node(id);
            (node.node_type(), node.flags())
        };

        if let Value::Null = value {
            if flags.contains(Flags::OPTIONAL) {
                return self.delete_subtree(id)
            }
            if matches!(typ, NodeType::SequenceOf | NodeType::SetOf) {
                return self.truncate_to_template(id)
            }
        }

        match typ {
            NodeType::Boolean => self.write_boolean(id, flags, value),
            NodeType::Integer | NodeType::Enumerated => {
                self.write_integer(id, typ, flags, value)
            }
            NodeType::ObjectId => self.write_object_id(id, flags, value),
            NodeType::Time => self.write_time(id, flags, value),
            NodeType::OctetString | NodeType::GeneralString => {
                self.write_octets(id, value)
            }
            NodeType::BitString => self.write_bits(id, value),
            NodeType::Choice => self.write_choice(id, value),
            NodeType::Any => self.write_any(id, value),
            NodeType::SequenceOf | NodeType::SetOf => {
                match value {
                    Value::Text("NEW") => {
                        self.append_sequence_set(id)?;
                        Ok(())
                    }
                    _ => xerr!(Err(Error::ValueNotValid)),
                }
            }
            _ => xerr!(Err(Error::ElementNotFound)),
        }
    }

    /// Deletes every element of a SEQUENCE OF / SET OF after the template.
    fn truncate_to_template(&mut self, id: NodeId) -> Result<(), Error> {
        let extra: Vec<NodeId> = self.content_children(id).skip(1).collect();
        for child in extra {
            self.delete_subtree(child)?;
        }
        Ok(())
    }

    fn write_boolean(
        &mut self, id: NodeId, flags: Flags, value: Value,
    ) -> Result<(), Error> {
        let truth = match value {
            Value::Text("TRUE") => true,
            Value::Text("FALSE") => false,
            _ => xerr!(return Err(Error::ValueNotValid)),
        };
        if flags.contains(Flags::DEFAULT) {
            let default = match self.default_child(id) {
                Some(default) => default,
                None => xerr!(return Err(Error::Generic)),
            };
            let polarity = if truth { Flags::TRUE } else { Flags::FALSE };
            if self.node(default).flags().contains(polarity) {
                self.set_value(id, None);
                return Ok(())
            }
        }
        let marker: &[u8] = if truth { b"T" } else { b"F" };
        self.set_value(id, Some(Bytes::from_static(marker)));
        Ok(())
    }

    fn write_integer(
        &mut self, id: NodeId, typ: NodeType, flags: Flags, value: Value,
    ) -> Result<(), Error> {
        let canonical: IntBuf = match value {
            Value::Text(text) => {
                if text.starts_with(|ch: char| {
                    ch.is_ascii_digit() || ch == '-'
                }) {
                    convert_integer(text)?
                }
                else {
                    // A symbolic name from the declared constants list.
                    if !flags.contains(Flags::LIST) {
                        xerr!(return Err(Error::ValueNotValid))
                    }
                    self.symbolic_integer(id, text)?
                }
            }
            Value::Bytes(bytes) if !bytes.is_empty() => {
                SmallVec::from_slice(min_twos_complement(bytes))
            }
            _ => xerr!(return Err(Error::ValueNotValid)),
        };

        if typ == NodeType::Enumerated && canonical[0] & 0x80 != 0 {
            xerr!(return Err(Error::ValueNotValid))
        }

        if flags.contains(Flags::DEFAULT)
            && self.integer_default(id, flags)?.as_slice()
                == canonical.as_slice()
        {
            self.set_value(id, None);
            return Ok(())
        }

        let mut buf = value_buf(
            length_der_len(canonical.len()) + canonical.len()
        )?;
        octet_der(&canonical, &mut buf);
        self.set_value(id, Some(buf.into()));
        Ok(())
    }

    /// Resolves a named constant of an INTEGER/ENUMERATED to its encoding.
    pub(crate) fn symbolic_integer(
        &self, id: NodeId, name: &str,
    ) -> Result<IntBuf, Error> {
        let declared = self
            .constant_value(id, name)
            .and_then(|value| std::str::from_utf8(value).ok());
        match declared {
            Some(declared) => convert_integer(declared),
            None => xerr!(Err(Error::ValueNotValid)),
        }
    }

    /// Returns the canonical encoding of a declared INTEGER DEFAULT.
    ///
    /// The declaration is either decimal text or the name of one of the
    /// element's constants.
    pub(crate) fn integer_default(
        &self, id: NodeId, flags: Flags,
    ) -> Result<IntBuf, Error> {
        let default = match self.default_child(id) {
            Some(default) => default,
            None => xerr!(return Err(Error::Generic)),
        };
        let text = self
            .node(default)
            .value()
            .and_then(|value| std::str::from_utf8(value).ok());
        let text = match text {
            Some(text) => text,
            None => xerr!(return Err(Error::Generic)),
        };
        if text.starts_with(|ch: char| {
            ch.is_ascii_digit() || ch == '-' || ch == '+'
        }) {
            convert_integer(text)
        }
        else {
            if !flags.contains(Flags::LIST) {
                xerr!(return Err(Error::ValueNotValid))
            }
            self.symbolic_integer(id, text)
        }
    }

    fn write_object_id(
        &mut self, id: NodeId, flags: Flags, value: Value,
    ) -> Result<(), Error> {
        let text = match value {
            Value::Text(text) => text,
            _ => xerr!(return Err(Error::ValueNotValid)),
        };
        if !text.bytes().all(|ch| {
            ch.is_ascii_digit() || ch == b'.' || ch == b'+'
        }) {
            xerr!(return Err(Error::ValueNotValid))
        }
        if flags.contains(Flags::DEFAULT) {
            if let Some(default) = self.default_child(id) {
                if self.node(default).value() == Some(text.as_bytes()) {
                    self.set_value(id, None);
                    return Ok(())
                }
            }
        }
        let mut buf = value_buf(text.len())?;
        buf.extend_from_slice(text.as_bytes());
        self.set_value(id, Some(buf.into()));
        Ok(())
    }

    fn write_time(
        &mut self, id: NodeId, flags: Flags, value: Value,
    ) -> Result<(), Error> {
        let text = match value {
            Value::Text(text) => text,
            _ => xerr!(return Err(Error::ValueNotValid)),
        };
        if flags.contains(Flags::UTC) && !check_utc_time(text) {
            xerr!(return Err(Error::ValueNotValid))
        }
        // The GeneralizedTime variant is stored verbatim.
        let mut buf = value_buf(text.len())?;
        buf.extend_from_slice(text.as_bytes());
        self.set_value(id, Some(buf.into()));
        Ok(())
    }

    fn write_octets(
        &mut self, id: NodeId, value: Value,
    ) -> Result<(), Error> {
        let data = match value {
            Value::Bytes(data) => data,
            Value::Text(text) => text.as_bytes(),
            _ => xerr!(return Err(Error::ValueNotValid)),
        };
        let mut buf = value_buf(length_der_len(data.len()) + data.len())?;
        octet_der(data, &mut buf);
        self.set_value(id, Some(buf.into()));
        Ok(())
    }

    fn write_bits(
        &mut self, id: NodeId, value: Value,
    ) -> Result<(), Error> {
        let (data, bit_len) = match value {
            Value::Bits(data, bit_len) => (data, bit_len),
            Value::Bytes(data) => (data, data.len() * 8),
            // One bit per input byte, as for terminated string input in
            // the original interface.
            Value::Text(text) => (text.as_bytes(), text.len()),
            Value::Null => xerr!(return Err(Error::ValueNotValid)),
        };
        let octets = bit_len.div_ceil(8);
        if data.len() < octets {
            xerr!(return Err(Error::ValueNotValid))
        }
        let mut buf = value_buf(
            length_der_len(octets + 1) + octets + 1
        )?;
        bit_der(data, bit_len, &mut buf);
        self.set_value(id, Some(buf.into()));
        Ok(())
    }

    fn write_choice(
        &mut self, id: NodeId, value: Value,
    ) -> Result<(), Error> {
        let name = match value {
            Value::Text(name) => name,
            _ => xerr!(return Err(Error::ValueNotValid)),
        };
        let mut selected = None;
        let mut others = Vec::new();
        for child in self.content_children(id) {
            if self.node(child).name() == Some(name) {
                selected = Some(child);
            }
            else {
                others.push(child);
            }
        }
        if selected.is_none() {
            xerr!(return Err(Error::ElementNotFound))
        }
        for child in others {
            self.delete_subtree(child)?;
        }
        Ok(())
    }

    fn write_any(
        &mut self, id: NodeId, value: Value,
    ) -> Result<(), Error> {
        let der = match value {
            Value::Bytes(der) => der,
            _ => xerr!(return Err(Error::ValueNotValid)),
        };
        // The caller's bytes already start with the inner tag; only the
        // outer length is added.
        let mut buf = value_buf(length_der_len(der.len()) + der.len())?;
        length_der(der.len(), &mut buf);
        buf.extend_from_slice(der);
        self.set_value(id, Some(buf.into()));
        Ok(())
    }
}

/// Allocates the buffer for a replacement value.
///
/// Allocation failure is reported to the caller instead of aborting, so an
/// oversized write fails the call only.
fn value_buf(capacity: usize) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();
    if buf.try_reserve_exact(capacity).is_err() {
        xerr!(return Err(Error::Alloc))
    }
    Ok(buf)
}

/// Checks a UTCTime string against the accepted fixed-length forms.
///
/// The forms are ten digits followed by `Z`, twelve digits followed by
/// `Z`, ten digits followed by a signed four-digit offset, and twelve
/// digits followed by a signed four-digit offset.
fn check_utc_time(text: &str) -> bool {
    fn digits(text: &[u8]) -> bool {
        text.iter().all(u8::is_ascii_digit)
    }
    fn sign(ch: u8) -> bool {
        ch == b'+' || ch == b'-'
    }

    let text = text.as_bytes();
    if text.len() < 11 || !digits(&text[..10]) {
        return false
    }
    match text.len() {
        11 => text[10] == b'Z',
        13 => digits(&text[10..12]) && text[12] == b'Z',
        15 => sign(text[10]) && digits(&text[11..15]),
        17 => digits(&text[10..12]) && sign(text[12]) && digits(&text[13..17]),
        _ => false,
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    fn leaf(typ: NodeType) -> Tree {
        let mut tree = Tree::new(NodeType::Sequence, Some("t"));
        tree.add_child(tree.root(), typ, Some("v"));
        tree
    }

    fn stored(tree: &Tree, path: &str) -> Option<Vec<u8>> {
        let id = tree.find(path).unwrap();
        tree.node(id).value().map(Vec::from)
    }

    #[test]
    fn boolean_text_only() {
        let mut tree = leaf(NodeType::Boolean);
        tree.write_value("v", Value::Text("TRUE")).unwrap();
        assert_eq!(stored(&tree, "v").unwrap(), b"T");
        tree.write_value("v", Value::Text("FALSE")).unwrap();
        assert_eq!(stored(&tree, "v").unwrap(), b"F");
        assert_eq!(
            tree.write_value("v", Value::Text("true")),
            Err(Error::ValueNotValid)
        );
        assert_eq!(
            tree.write_value("v", Value::Bytes(b"\x01")),
            Err(Error::ValueNotValid)
        );
    }

    #[test]
    fn boolean_default_is_omitted() {
        let mut tree = leaf(NodeType::Boolean);
        let v = tree.find("v").unwrap();
        tree.set_flags(v, Flags::DEFAULT);
        let default = tree.add_child(v, NodeType::Default, None);
        tree.set_flags(default, Flags::TRUE);

        tree.write_value("v", Value::Text("TRUE")).unwrap();
        assert_eq!(stored(&tree, "v"), None);
        tree.write_value("v", Value::Text("FALSE")).unwrap();
        assert_eq!(stored(&tree, "v").unwrap(), b"F");
    }

    #[test]
    fn integer_from_text() {
        let mut tree = leaf(NodeType::Integer);
        tree.write_value("v", Value::Text("1")).unwrap();
        assert_eq!(stored(&tree, "v").unwrap(), b"\x01\x01");
        tree.write_value("v", Value::Text("-1")).unwrap();
        assert_eq!(stored(&tree, "v").unwrap(), b"\x01\xFF");
        tree.write_value("v", Value::Text("256")).unwrap();
        assert_eq!(stored(&tree, "v").unwrap(), b"\x02\x01\x00");
    }

    #[test]
    fn integer_from_bytes_is_canonicalized() {
        let mut tree = leaf(NodeType::Integer);
        tree.write_value("v", Value::Bytes(b"\x00\x00\x01")).unwrap();
        assert_eq!(stored(&tree, "v").unwrap(), b"\x01\x01");
        tree.write_value("v", Value::Bytes(b"\xFF\xFF\x80")).unwrap();
        assert_eq!(stored(&tree, "v").unwrap(), b"\x01\x80");
        tree.write_value("v", Value::Bytes(b"\xFF\x7F")).unwrap();
        assert_eq!(stored(&tree, "v").unwrap(), b"\x02\xFF\x7F");
    }

    #[test]
    fn integer_symbolic_constant() {
        let mut tree = leaf(NodeType::Integer);
        let v = tree.find("v").unwrap();
        tree.set_flags(v, Flags::LIST);
        let constant = tree.add_child(v, NodeType::Constant, Some("v3"));
        tree.set_text(constant, "2");

        tree.write_value("v", Value::Text("v3")).unwrap();
        assert_eq!(stored(&tree, "v").unwrap(), b"\x01\x02");
        assert_eq!(
            tree.write_value("v", Value::Text("v9")),
            Err(Error::ValueNotValid)
        );
    }

    #[test]
    fn integer_without_list_rejects_symbols() {
        let mut tree = leaf(NodeType::Integer);
        assert_eq!(
            tree.write_value("v", Value::Text("v3")),
            Err(Error::ValueNotValid)
        );
    }

    #[test]
    fn integer_default_is_omitted() {
        let mut tree = leaf(NodeType::Integer);
        let v = tree.find("v").unwrap();
        tree.set_flags(v, Flags::DEFAULT);
        let default = tree.add_child(v, NodeType::Default, None);
        tree.set_text(default, "5");

        tree.write_value("v", Value::Text("5")).unwrap();
        assert_eq!(stored(&tree, "v"), None);
        // Equality is checked on canonical bytes, whatever the input form.
        tree.write_value("v", Value::Bytes(b"\x00\x00\x05")).unwrap();
        assert_eq!(stored(&tree, "v"), None);
        tree.write_value("v", Value::Text("6")).unwrap();
        assert_eq!(stored(&tree, "v").unwrap(), b"\x01\x06");
    }

    #[test]
    fn enumerated_rejects_negative() {
        let mut tree = leaf(NodeType::Enumerated);
        assert_eq!(
            tree.write_value("v", Value::Text("-3")),
            Err(Error::ValueNotValid)
        );
        tree.write_value("v", Value::Text("3")).unwrap();
        assert_eq!(stored(&tree, "v").unwrap(), b"\x01\x03");
    }

    #[test]
    fn object_id_charset() {
        let mut tree = leaf(NodeType::ObjectId);
        tree.write_value("v", Value::Text("1.2.840.113549")).unwrap();
        assert_eq!(stored(&tree, "v").unwrap(), b"1.2.840.113549");
        assert_eq!(
            tree.write_value("v", Value::Text("1.2.bad")),
            Err(Error::ValueNotValid)
        );
        // The earlier value survives the failed write.
        assert_eq!(stored(&tree, "v").unwrap(), b"1.2.840.113549");
    }

    #[test]
    fn utc_time_forms() {
        let mut tree = leaf(NodeType::Time);
        let v = tree.find("v").unwrap();
        tree.set_flags(v, Flags::UTC);

        for good in [
            "9801011200Z",
            "980101120000Z",
            "9801011200+0100",
            "980101120000-0130",
        ] {
            tree.write_value("v", Value::Text(good)).unwrap();
            assert_eq!(stored(&tree, "v").unwrap(), good.as_bytes());
        }
        for bad in [
            "9801011200",
            "98010112x0Z",
            "9801011200z",
            "980101120000+01",
            "9801011200*0100",
        ] {
            assert_eq!(
                tree.write_value("v", Value::Text(bad)),
                Err(Error::ValueNotValid),
                "accepted {:?}", bad
            );
        }
    }

    #[test]
    fn generalized_time_is_verbatim() {
        let mut tree = leaf(NodeType::Time);
        let v = tree.find("v").unwrap();
        tree.set_flags(v, Flags::GENERALIZED);
        tree.write_value("v", Value::Text("20010101120001.12-0700"))
            .unwrap();
        assert_eq!(
            stored(&tree, "v").unwrap(),
            b"20010101120001.12-0700"
        );
    }

    #[test]
    fn octet_string_is_length_wrapped() {
        let mut tree = leaf(NodeType::OctetString);
        tree.write_value("v", Value::Bytes(b"\x01\x02\x03")).unwrap();
        assert_eq!(stored(&tree, "v").unwrap(), b"\x03\x01\x02\x03");
        // Text input uses the text bytes.
        tree.write_value("v", Value::Text("ab")).unwrap();
        assert_eq!(stored(&tree, "v").unwrap(), b"\x02ab");
    }

    #[test]
    fn bit_string_takes_bit_count() {
        let mut tree = leaf(NodeType::BitString);
        tree.write_value("v", Value::Bits(b"\xCF", 6)).unwrap();
        assert_eq!(stored(&tree, "v").unwrap(), b"\x02\x02\xCC");
        assert_eq!(
            tree.write_value("v", Value::Bits(b"\xCF", 9)),
            Err(Error::ValueNotValid)
        );
    }

    #[test]
    fn any_stores_opaque_der() {
        let mut tree = leaf(NodeType::Any);
        tree.write_value("v", Value::Bytes(b"\x02\x01\x05")).unwrap();
        assert_eq!(stored(&tree, "v").unwrap(), b"\x03\x02\x01\x05");
    }

    #[test]
    fn choice_keeps_single_alternative() {
        let mut tree = Tree::new(NodeType::Choice, Some("subject"));
        let root = tree.root();
        tree.add_child(root, NodeType::Sequence, Some("rdnSequence"));
        tree.add_child(root, NodeType::OctetString, Some("other"));

        tree.write_value("", Value::Text("rdnSequence")).unwrap();
        let live: Vec<_> = tree.content_children(root).collect();
        assert_eq!(live.len(), 1);
        assert_eq!(tree.node(live[0]).name(), Some("rdnSequence"));

        assert_eq!(
            tree.write_value("", Value::Text("nosuch")),
            Err(Error::ElementNotFound)
        );
    }

    #[test]
    fn optional_null_deletes() {
        let mut tree = leaf(NodeType::Integer);
        let v = tree.find("v").unwrap();
        tree.set_flags(v, Flags::OPTIONAL);
        tree.write_value("v", Value::Null).unwrap();
        assert_eq!(tree.find("v"), Err(Error::ElementNotFound));
    }

    #[test]
    fn null_write_truncates_sequence_of() {
        let mut tree = Tree::new(NodeType::SequenceOf, Some("items"));
        tree.add_child(tree.root(), NodeType::Integer, None);
        for _ in 0..3 {
            tree.write_value("", Value::Text("NEW")).unwrap();
        }
        assert_eq!(tree.children(tree.root()).len(), 4);
        tree.write_value("", Value::Null).unwrap();
        // Only the template placeholder remains.
        assert_eq!(tree.children(tree.root()).len(), 1);
    }

    #[test]
    fn sequence_of_requires_new_keyword() {
        let mut tree = Tree::new(NodeType::SequenceOf, Some("items"));
        tree.add_child(tree.root(), NodeType::Integer, None);
        assert_eq!(
            tree.write_value("", Value::Text("OLD")),
            Err(Error::ValueNotValid)
        );
    }

    #[test]
    fn structured_types_are_not_writable() {
        let mut tree = leaf(NodeType::Sequence);
        assert_eq!(
            tree.write_value("v", Value::Text("x")),
            Err(Error::ElementNotFound)
        );
        let mut tree = leaf(NodeType::Null);
        assert_eq!(
            tree.write_value("v", Value::Text("NULL")),
            Err(Error::ElementNotFound)
        );
    }
}
