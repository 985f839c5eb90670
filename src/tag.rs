//! The effective DER tag of a tree element.
//!
//! An element's tag is either one of its declared tag overrides or the
//! universal tag of its type. The resolver here implements the override
//! rule exactly as inherited: scanning the TAG pseudo-children in
//! declaration order, the first IMPLICIT tag is kept, and every EXPLICIT
//! marker discards whatever implicit tag was tracked before it. An explicit
//! wrapper therefore hides inner overrides; only an IMPLICIT tag appearing
//! after the last EXPLICIT marker is visible from the outside.

use crate::error::Error;
use crate::node::{Class, Flags, NodeType};
use crate::tree::{NodeId, Tree};
use crate::xerr;

/// The universal tag numbers of the supported types, per X.680 clause 8.
pub const TAG_BOOLEAN: u32 = 1;
pub const TAG_INTEGER: u32 = 2;
pub const TAG_BIT_STRING: u32 = 3;
pub const TAG_OCTET_STRING: u32 = 4;
pub const TAG_NULL: u32 = 5;
pub const TAG_OBJECT_ID: u32 = 6;
pub const TAG_ENUMERATED: u32 = 10;
pub const TAG_SEQUENCE: u32 = 16;
pub const TAG_SET: u32 = 17;
pub const TAG_UTC_TIME: u32 = 23;
pub const TAG_GENERALIZED_TIME: u32 = 24;
pub const TAG_GENERAL_STRING: u32 = 27;

/// # Tag Resolution
///
impl Tree {
    /// Returns the effective tag and class of the element at `path`.
    ///
    /// `Ok(None)` means the element carries no intrinsic tag: it is a
    /// CHOICE, an ANY, or a pseudo-element, and no tag override survives
    /// the implicit/explicit scan.
    pub fn read_tag(
        &self, path: &str,
    ) -> Result<Option<(Class, u32)>, Error> {
        let id = self.find(path)?;
        if let Some(tag) = self.tag_override(id)? {
            return Ok(Some(tag))
        }
        Ok(self.universal_tag(id))
    }

    /// Scans the TAG pseudo-children for a surviving override.
    fn tag_override(
        &self, id: NodeId,
    ) -> Result<Option<(Class, u32)>, Error> {
        if !self.node(id).flags().contains(Flags::TAGGED) {
            return Ok(None)
        }
        let mut tag = None;
        for child in self.children(id).iter().copied() {
            let node = self.node(child);
            if node.node_type() != NodeType::Tag {
                continue
            }
            if node.flags().contains(Flags::IMPLICIT) && tag.is_none() {
                tag = Some(child);
            }
            else if node.flags().contains(Flags::EXPLICIT) {
                tag = None;
            }
        }
        let tag = match tag {
            Some(tag) => tag,
            None => return Ok(None),
        };
        let node = self.node(tag);
        let number = node
            .value()
            .and_then(|value| std::str::from_utf8(value).ok())
            .and_then(|text| text.parse::<u32>().ok());
        let number = match number {
            Some(number) => number,
            None => xerr!(return Err(Error::ValueNotValid)),
        };
        let class = if node.flags().contains(Flags::APPLICATION) {
            Class::Application
        }
        else if node.flags().contains(Flags::UNIVERSAL) {
            Class::Universal
        }
        else if node.flags().contains(Flags::PRIVATE) {
            Class::Private
        }
        else {
            Class::ContextSpecific
        };
        Ok(Some((class, number)))
    }

    /// Returns the universal tag of the element's type, if it has one.
    fn universal_tag(&self, id: NodeId) -> Option<(Class, u32)> {
        let node = self.node(id);
        let number = match node.node_type() {
            NodeType::Null => TAG_NULL,
            NodeType::Boolean => TAG_BOOLEAN,
            NodeType::Integer => TAG_INTEGER,
            NodeType::Enumerated => TAG_ENUMERATED,
            NodeType::ObjectId => TAG_OBJECT_ID,
            NodeType::Time => {
                if node.flags().contains(Flags::UTC) {
                    TAG_UTC_TIME
                }
                else {
                    TAG_GENERALIZED_TIME
                }
            }
            NodeType::OctetString => TAG_OCTET_STRING,
            NodeType::GeneralString => TAG_GENERAL_STRING,
            NodeType::BitString => TAG_BIT_STRING,
            NodeType::Sequence | NodeType::SequenceOf => TAG_SEQUENCE,
            NodeType::Set | NodeType::SetOf => TAG_SET,
            _ => return None,
        };
        Some((Class::Universal, number))
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    fn tagged_integer(markers: &[(Flags, &str)]) -> Tree {
        let mut tree = Tree::new(NodeType::Sequence, Some("t"));
        let root = tree.root();
        let field = tree.add_child(root, NodeType::Integer, Some("field"));
        if !markers.is_empty() {
            tree.set_flags(field, Flags::TAGGED);
        }
        for &(flags, number) in markers {
            let tag = tree.add_child(field, NodeType::Tag, None);
            tree.set_flags(tag, flags);
            tree.set_text(tag, number);
        }
        tree
    }

    #[test]
    fn universal_tags() {
        let tree = tagged_integer(&[]);
        assert_eq!(
            tree.read_tag("field"),
            Ok(Some((Class::Universal, TAG_INTEGER)))
        );
    }

    #[test]
    fn implicit_override() {
        let tree = tagged_integer(&[(Flags::IMPLICIT, "5")]);
        assert_eq!(
            tree.read_tag("field"),
            Ok(Some((Class::ContextSpecific, 5)))
        );
    }

    #[test]
    fn implicit_with_class() {
        let tree =
            tagged_integer(&[(Flags::IMPLICIT | Flags::APPLICATION, "7")]);
        assert_eq!(
            tree.read_tag("field"),
            Ok(Some((Class::Application, 7)))
        );
    }

    #[test]
    fn explicit_exposes_inner_tag() {
        // [5] EXPLICIT over a plain INTEGER: the wrapper hides nothing but
        // its content tag, which is the universal one.
        let tree = tagged_integer(&[(Flags::EXPLICIT, "5")]);
        assert_eq!(
            tree.read_tag("field"),
            Ok(Some((Class::Universal, TAG_INTEGER)))
        );
    }

    #[test]
    fn explicit_resets_implicit() {
        // An implicit tag before an explicit marker is hidden by it; one
        // after it survives.
        let tree = tagged_integer(&[
            (Flags::IMPLICIT, "3"),
            (Flags::EXPLICIT, "5"),
        ]);
        assert_eq!(
            tree.read_tag("field"),
            Ok(Some((Class::Universal, TAG_INTEGER)))
        );

        let tree = tagged_integer(&[
            (Flags::EXPLICIT, "5"),
            (Flags::IMPLICIT, "3"),
        ]);
        assert_eq!(
            tree.read_tag("field"),
            Ok(Some((Class::ContextSpecific, 3)))
        );
    }

    #[test]
    fn first_implicit_wins() {
        let tree = tagged_integer(&[
            (Flags::IMPLICIT, "3"),
            (Flags::IMPLICIT, "9"),
        ]);
        assert_eq!(
            tree.read_tag("field"),
            Ok(Some((Class::ContextSpecific, 3)))
        );
    }

    #[test]
    fn choice_and_any_have_no_tag() {
        let mut tree = Tree::new(NodeType::Sequence, Some("t"));
        let root = tree.root();
        tree.add_child(root, NodeType::Choice, Some("which"));
        tree.add_child(root, NodeType::Any, Some("blob"));
        assert_eq!(tree.read_tag("which"), Ok(None));
        assert_eq!(tree.read_tag("blob"), Ok(None));
    }

    #[test]
    fn time_tags_follow_variant() {
        let mut tree = Tree::new(NodeType::Sequence, Some("t"));
        let root = tree.root();
        let utc = tree.add_child(root, NodeType::Time, Some("utc"));
        tree.set_flags(utc, Flags::UTC);
        let gen = tree.add_child(root, NodeType::Time, Some("gen"));
        tree.set_flags(gen, Flags::GENERALIZED);
        assert_eq!(
            tree.read_tag("utc"),
            Ok(Some((Class::Universal, TAG_UTC_TIME)))
        );
        assert_eq!(
            tree.read_tag("gen"),
            Ok(Some((Class::Universal, TAG_GENERALIZED_TIME)))
        );
    }

    #[test]
    fn bad_path() {
        let tree = tagged_integer(&[]);
        assert_eq!(tree.read_tag("nosuch"), Err(Error::ElementNotFound));
    }
}
