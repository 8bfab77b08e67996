//! Item kinds, stacks and display contexts
//!
//! An [`ItemId`] is the stable identity of an item kind. Stacks are cheap
//! value types; renderer state is always keyed by kind, never by stack.

use crate::foundation::identifier::{Identifier, IdentifierError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of an item kind
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Identifier);

impl ItemId {
    /// Wrap an identifier as an item id
    pub fn new(id: Identifier) -> Self {
        Self(id)
    }

    /// Parse `namespace:path`
    pub fn parse(text: &str) -> Result<Self, IdentifierError> {
        Identifier::parse(text).map(Self)
    }
}

impl From<Identifier> for ItemId {
    fn from(id: Identifier) -> Self {
        Self(id)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A stack of items of one kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemStack {
    /// Item kind
    pub item: ItemId,
    /// Number of items in the stack
    pub count: u32,
}

impl ItemStack {
    /// Create a stack with an explicit count
    pub fn new(item: ItemId, count: u32) -> Self {
        Self { item, count }
    }

    /// Create a single-item stack
    pub fn of(item: ItemId) -> Self {
        Self::new(item, 1)
    }

    /// Kind of the stacked item
    pub fn item(&self) -> &ItemId {
        &self.item
    }

    /// Whether this stack holds the given kind
    pub fn is_of(&self, item: &ItemId) -> bool {
        &self.item == item
    }

    /// Whether the stack holds nothing
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Context an item is displayed in
///
/// Passed through unchanged to routines that pick per-context display
/// transforms from a baked model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransformMode {
    /// No display transform
    None,
    /// Held in the left hand, third person
    ThirdPersonLeftHand,
    /// Held in the right hand, third person
    ThirdPersonRightHand,
    /// Held in the left hand, first person
    FirstPersonLeftHand,
    /// Held in the right hand, first person
    FirstPersonRightHand,
    /// Worn on the head
    Head,
    /// Inventory slot or other interface icon
    Gui,
    /// Dropped on the ground
    Ground,
    /// Inside an item frame
    Fixed,
}

impl TransformMode {
    /// Whether the item is rendered in someone's hand
    pub fn is_held(self) -> bool {
        matches!(
            self,
            Self::ThirdPersonLeftHand
                | Self::ThirdPersonRightHand
                | Self::FirstPersonLeftHand
                | Self::FirstPersonRightHand
        )
    }

    /// Whether the item is rendered as a left-handed item
    pub fn is_left_hand(self) -> bool {
        matches!(self, Self::ThirdPersonLeftHand | Self::FirstPersonLeftHand)
    }
}
