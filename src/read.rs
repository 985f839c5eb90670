//! Reading values back out of a tree.
//!
//! The reader inverts the writer's dispatch. A node without a stored value
//! is not necessarily empty: if its type declares a DEFAULT the declared
//! value is synthesized, a NULL element always reads as the literal
//! `NULL`, and an OBJECT IDENTIFIER carrying the ASSIGN flag reconstructs
//! its dotted text from its named arc constants.
//!
//! Results are written into a caller-provided buffer. A too-small buffer
//! fails with [`Error::Capacity`] carrying the exact required size, leaving
//! the buffer untouched; retrying with that size succeeds. For BIT STRING
//! elements the returned length counts bits while the required size counts
//! bytes.

use crate::der::{get_bit_der, get_length_der, get_octet_der};
use crate::error::Error;
use crate::node::{Flags, NodeType};
use crate::tree::{NodeId, Tree};
use crate::xerr;


/// # Reading Values
///
impl Tree {
    /// Reads the value of the element at `path` into `dst`.
    ///
    /// Returns the number of bytes written, except for BIT STRING elements
    /// where it returns the number of significant bits.
    pub fn read_value(
        &self, path: &str, dst: &mut [u8],
    ) -> Result<usize, Error> {
        let id = self.find(path)?;
        let node = self.node(id);
        let (typ, flags) = (node.node_type(), node.flags());

        if typ != NodeType::Null && typ != NodeType::Choice
            && !flags.contains(Flags::DEFAULT)
            && !flags.contains(Flags::ASSIGN)
            && node.value().is_none()
        {
            return Err(Error::ValueNotFound)
        }

        match typ {
            NodeType::Null => put_text(dst, "NULL"),
            NodeType::Boolean => self.read_boolean(id, dst),
            NodeType::Integer | NodeType::Enumerated => {
                self.read_integer(id, flags, dst)
            }
            NodeType::ObjectId => self.read_object_id(id, flags, dst),
            NodeType::Time => {
                put_bytes(dst, self.node(id).value().unwrap_or_default())
            }
            NodeType::OctetString | NodeType::GeneralString => {
                let value = self.node(id).value().unwrap_or_default();
                get_octet_der(value, dst).map(|(len, _)| len)
            }
            NodeType::BitString => {
                let value = self.node(id).value().unwrap_or_default();
                get_bit_der(value, dst).map(|(bits, _)| bits)
            }
            NodeType::Choice => self.read_choice(id, dst),
            NodeType::Any => self.read_any(id, dst),
            _ => xerr!(Err(Error::ElementNotFound)),
        }
    }

    fn read_boolean(
        &self, id: NodeId, dst: &mut [u8],
    ) -> Result<usize, Error> {
        let truth = match self.node(id).value() {
            Some(value) => value.first() == Some(&b'T'),
            None => {
                // Empty with a DEFAULT: the declared polarity.
                let default = match self.default_child(id) {
                    Some(default) => default,
                    None => xerr!(return Err(Error::Generic)),
                };
                self.node(default).flags().contains(Flags::TRUE)
            }
        };
        put_text(dst, if truth { "TRUE" } else { "FALSE" })
    }

    fn read_integer(
        &self, id: NodeId, flags: Flags, dst: &mut [u8],
    ) -> Result<usize, Error> {
        match self.node(id).value() {
            Some(value) => {
                get_octet_der(value, dst).map(|(len, _)| len)
            }
            None => {
                // Synthesize the canonical form of the DEFAULT.
                let default = self.integer_default(id, flags)?;
                put_bytes(dst, &default)
            }
        }
    }

    fn read_object_id(
        &self, id: NodeId, flags: Flags, dst: &mut [u8],
    ) -> Result<usize, Error> {
        if flags.contains(Flags::ASSIGN) {
            return put_bytes(dst, self.assembled_oid(id).as_bytes())
        }
        match self.node(id).value() {
            Some(value) => put_bytes(dst, value),
            None => {
                let default = match self.default_child(id) {
                    Some(default) => default,
                    None => xerr!(return Err(Error::Generic)),
                };
                let text = self.node(default).value().unwrap_or_default();
                put_bytes(dst, text)
            }
        }
    }

    /// Joins the named arc constants of an ASSIGN object identifier.
    fn assembled_oid(&self, id: NodeId) -> String {
        let mut text = String::new();
        for child in self.children(id).iter().copied() {
            let node = self.node(child);
            if node.node_type() != NodeType::Constant {
                continue
            }
            if let Some(value) = node.value() {
                if !text.is_empty() {
                    text.push('.');
                }
                text.push_str(&String::from_utf8_lossy(value));
            }
        }
        text
    }

    fn read_choice(
        &self, id: NodeId, dst: &mut [u8],
    ) -> Result<usize, Error> {
        let selected = match self.content_children(id).next() {
            Some(selected) => selected,
            None => xerr!(return Err(Error::Generic)),
        };
        match self.node(selected).name() {
            Some(name) => put_bytes(dst, name.as_bytes()),
            None => xerr!(Err(Error::Generic)),
        }
    }

    fn read_any(
        &self, id: NodeId, dst: &mut [u8],
    ) -> Result<usize, Error> {
        let value = self.node(id).value().unwrap_or_default();
        let (len, hdr) = get_length_der(value)?;
        let inner = match value.get(hdr..hdr + len) {
            Some(inner) => inner,
            None => xerr!(return Err(Error::Der)),
        };
        put_bytes(dst, inner)
    }
}

/// Copies `data` into the front of `dst`, negotiating capacity.
fn put_bytes(dst: &mut [u8], data: &[u8]) -> Result<usize, Error> {
    match dst.get_mut(..data.len()) {
        Some(dst) => {
            dst.copy_from_slice(data);
            Ok(data.len())
        }
        None => Err(Error::Capacity { required: data.len() }),
    }
}

fn put_text(dst: &mut [u8], text: &str) -> Result<usize, Error> {
    put_bytes(dst, text.as_bytes())
}


//============ Tests =========================================================
