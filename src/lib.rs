//! Representing ASN.1-defined data as trees and encoding values in DER.
//!
//! This crate keeps ASN.1 structures as mutable in-memory trees. A tree is
//! built from a type definition, instantiated into a working copy, and its
//! element values are then set and retrieved by dotted-path name:
//!
//! ```
//! use asn1_tree::{NodeType, Tree, Value};
//!
//! let mut definition = Tree::new(NodeType::Sequence, Some("Message"));
//! let root = definition.root();
//! definition.add_child(root, NodeType::Integer, Some("version"));
//! definition.add_child(root, NodeType::OctetString, Some("payload"));
//!
//! let mut msg = definition.instantiate();
//! msg.write_value("version", Value::Text("2")).unwrap();
//! msg.write_value("payload", Value::Bytes(b"\x01\x02")).unwrap();
//!
//! let mut buf = [0u8; 16];
//! let len = msg.read_value("version", &mut buf).unwrap();
//! assert_eq!(&buf[..len], b"\x02");
//! ```
//!
//! Stored values follow the Distinguished Encoding Rules, the subset of
//! BER with all encoder freedom removed: integers are trimmed to their
//! minimal two's-complement form, length fields to their minimal octets,
//! and values equal to a declared DEFAULT are stored empty. The decoding
//! primitives reject everything a DER encoder could not have produced.
//!
//! The byte-level codecs live in [`der`] and [`int`] and are usable on
//! their own by external DER walkers.

pub use self::error::Error;
pub use self::node::{Class, Flags, Node, NodeType};
pub use self::tree::{NodeId, Tree};
pub use self::write::Value;

#[macro_use] pub mod debug;

pub mod der;
pub mod int;
pub mod tag;

mod error;
mod node;
mod read;
mod tree;
mod write;
