//! The elements an ASN.1 tree is made of.
//!
//! This is a private module. Its public items are re-exported by the parent.

use std::fmt;
use bytes::Bytes;
use crate::tree::NodeId;


//------------ NodeType ------------------------------------------------------

/// The ASN.1 type of a tree element.
///
/// Most variants correspond to an ASN.1 built-in type. The last four are
/// structural pseudo-types: they appear as leading children of a node and
/// describe the node rather than contribute content. Value-oriented
/// traversal skips them.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum NodeType {
    Null,
    Boolean,
    Integer,
    Enumerated,
    ObjectId,
    /// UTCTime or GeneralizedTime, distinguished by [`Flags::UTC`] and
    /// [`Flags::GENERALIZED`].
    Time,
    OctetString,
    GeneralString,
    BitString,
    Sequence,
    SequenceOf,
    Set,
    SetOf,
    Choice,
    Any,
    /// A tag override; the node value holds the tag number in decimal.
    Tag,
    /// A size constraint; carried along but not enforced here.
    Size,
    /// A DEFAULT declaration; the node value holds the default in its
    /// textual form, or the polarity flags for BOOLEAN.
    Default,
    /// A named constant; the node value holds the constant in decimal.
    Constant,
}

impl NodeType {
    /// Returns whether this is a structural pseudo-type.
    pub fn is_pseudo(self) -> bool {
        matches!(
            self,
            NodeType::Tag | NodeType::Size
            | NodeType::Default | NodeType::Constant
        )
    }
}


//------------ Class ---------------------------------------------------------

/// The class of a DER tag.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Class {
    Universal,
    Application,
    ContextSpecific,
    Private,
}


//------------ Flags ---------------------------------------------------------

/// The attribute flags of a tree element.
///
/// This is a plain bit set. Flags qualify either the element itself
/// (`OPTIONAL`, `DEFAULT`, ...) or, on a pseudo-child, the declaration it
/// represents (`IMPLICIT` and the class flags on a TAG child, the polarity
/// flags on a BOOLEAN DEFAULT child).
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
pub struct Flags(u16);

impl Flags {
    /// No flags at all.
    pub const EMPTY: Self = Flags(0);

    /// The element may be absent.
    pub const OPTIONAL: Self = Flags(0x0001);

    /// The element declares a DEFAULT pseudo-child.
    pub const DEFAULT: Self = Flags(0x0002);

    /// The element carries TAG pseudo-children.
    pub const TAGGED: Self = Flags(0x0004);

    /// On a TAG child: the tag is implicit.
    pub const IMPLICIT: Self = Flags(0x0008);

    /// On a TAG child: the tag is explicit.
    pub const EXPLICIT: Self = Flags(0x0010);

    /// On a TAG child: application class.
    pub const APPLICATION: Self = Flags(0x0020);

    /// On a TAG child: universal class.
    pub const UNIVERSAL: Self = Flags(0x0040);

    /// On a TAG child: private class.
    pub const PRIVATE: Self = Flags(0x0080);

    /// The element declares named integer constants.
    pub const LIST: Self = Flags(0x0100);

    /// An OBJECT IDENTIFIER assembled from named constant children.
    pub const ASSIGN: Self = Flags(0x0200);

    /// On a BOOLEAN DEFAULT child: the default is TRUE.
    pub const TRUE: Self = Flags(0x0400);

    /// On a BOOLEAN DEFAULT child: the default is FALSE.
    pub const FALSE: Self = Flags(0x0800);

    /// On a TIME element: UTCTime.
    pub const UTC: Self = Flags(0x1000);

    /// On a TIME element: GeneralizedTime.
    pub const GENERALIZED: Self = Flags(0x2000);

    /// Returns whether all flags in `other` are set in `self`.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Adds the flags in `other` to `self`.
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0
    }

    /// Removes the flags in `other` from `self`.
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0
    }

    /// Returns the union of the two flag sets.
    pub fn union(self, other: Self) -> Self {
        Flags(self.0 | other.0)
    }
}

impl std::ops::BitOr for Flags {
    type Output = Self;

    fn bitor(self, other: Self) -> Self {
        self.union(other)
    }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Flags({:#06x})", self.0)
    }
}


//------------ Node ----------------------------------------------------------

/// One element of an ASN.1 tree.
///
/// Nodes are pure data. They are held in the arena of a
/// [`Tree`][crate::tree::Tree] and addressed through
/// [`NodeId`][crate::tree::NodeId] handles; the tree owns each node exactly
/// once through its parent-to-child edge. The `parent` field is a lookup
/// back-reference only.
#[derive(Clone, Debug)]
pub struct Node {
    /// The identifier of the element, unique among its siblings.
    ///
    /// Elements cloned by SEQUENCE OF / SET OF growth get generated names
    /// of the form `?1`, `?2`, and so on.
    pub(crate) name: Option<String>,

    /// The ASN.1 type.
    pub(crate) typ: NodeType,

    /// The attribute flags.
    pub(crate) flags: Flags,

    /// The stored value.
    ///
    /// For INTEGER, ENUMERATED, OCTET STRING, GeneralString, BIT STRING,
    /// and ANY this holds DER-encoded bytes. For OBJECT IDENTIFIER, TIME,
    /// and the pseudo-types it holds a textual form. For BOOLEAN it holds
    /// the single marker byte `T` or `F`.
    ///
    /// Once set, the buffer is either fully valid for the type or the field
    /// is `None`; a node is never left half-written.
    pub(crate) value: Option<Bytes>,

    /// The lookup back-reference to the owning node.
    pub(crate) parent: Option<NodeId>,

    /// The children in declaration order, pseudo-children first.
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    pub(crate) fn new(typ: NodeType, name: Option<&str>) -> Self {
        Node {
            name: name.map(String::from),
            typ,
            flags: Flags::EMPTY,
            value: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Returns the name of the node, if it has one.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the ASN.1 type of the node.
    pub fn node_type(&self) -> NodeType {
        self.typ
    }

    /// Returns the attribute flags of the node.
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Returns the stored value, if there is one.
    pub fn value(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }
}


//============ Tests =========================================================
