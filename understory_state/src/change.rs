// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The change-descriptor algebra.
//!
//! A [`ChangeSet`] is a 64-bit mask. Each [`Kind`] of change occupies one bit
//! in each of three 16-bit [`Scope`] lanes:
//!
//! - bits `0..16`: the node's own value or metadata changed,
//! - bits `16..32`: a direct child changed,
//! - bits `32..48`: something deeper in the subtree changed.
//!
//! Bits `48..64` are reserved.

use core::fmt;

bitflags::bitflags! {
    /// What changed, and where, relative to the node receiving the set.
    ///
    /// Combine with `|`, test with [`contains`](Self::contains) or
    /// [`intersects`](Self::intersects), and promote one level outward with
    /// [`shift`](Self::shift).
    #[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct ChangeSet: u64 {
        /// The node's primitive value changed without changing shape.
        const VALUE = 1 << 0;
        /// The node's value changed shape (e.g. number to string, null to object).
        const TYPE = 1 << 1;
        /// The node went from absent to present.
        const ATTACH = 1 << 2;
        /// The node went from present to absent.
        const DETACH = 1 << 3;
        /// The node's set of children changed.
        const SHAPE = 1 << 4;
        /// The node's baseline was committed while it was dirty.
        const COMMIT = 1 << 5;
        /// The node lost focus.
        const BLUR = 1 << 6;
        /// The node (or its subtree) went from invalid to valid.
        const VALID = 1 << 7;
        /// The node (or its subtree) went from valid to invalid.
        const INVALID = 1 << 8;
        /// The node's error list changed.
        const ERRORS = 1 << 9;
        /// The node's key changed because an array sibling was inserted or removed.
        const KEY = 1 << 10;

        /// A direct child's primitive value changed.
        const CHILD_VALUE = 1 << 16;
        /// A direct child changed shape.
        const CHILD_TYPE = 1 << 17;
        /// A direct child was attached.
        const CHILD_ATTACH = 1 << 18;
        /// A direct child was detached.
        const CHILD_DETACH = 1 << 19;
        /// A direct child's set of children changed.
        const CHILD_SHAPE = 1 << 20;
        /// A direct child was committed.
        const CHILD_COMMIT = 1 << 21;
        /// A direct child lost focus.
        const CHILD_BLUR = 1 << 22;
        /// A direct child became valid.
        const CHILD_VALID = 1 << 23;
        /// A direct child became invalid.
        const CHILD_INVALID = 1 << 24;
        /// A direct child's error list changed.
        const CHILD_ERRORS = 1 << 25;
        /// A direct child was renumbered.
        const CHILD_KEY = 1 << 26;

        /// A deeper descendant's primitive value changed.
        const DESCENDANT_VALUE = 1 << 32;
        /// A deeper descendant changed shape.
        const DESCENDANT_TYPE = 1 << 33;
        /// A deeper descendant was attached.
        const DESCENDANT_ATTACH = 1 << 34;
        /// A deeper descendant was detached.
        const DESCENDANT_DETACH = 1 << 35;
        /// A deeper descendant's set of children changed.
        const DESCENDANT_SHAPE = 1 << 36;
        /// A deeper descendant was committed.
        const DESCENDANT_COMMIT = 1 << 37;
        /// A deeper descendant lost focus.
        const DESCENDANT_BLUR = 1 << 38;
        /// A deeper descendant became valid.
        const DESCENDANT_VALID = 1 << 39;
        /// A deeper descendant became invalid.
        const DESCENDANT_INVALID = 1 << 40;
        /// A deeper descendant's error list changed.
        const DESCENDANT_ERRORS = 1 << 41;
        /// A deeper descendant was renumbered.
        const DESCENDANT_KEY = 1 << 42;
    }
}

const LANE: u32 = 16;
const LANE_MASK: u64 = 0xFFFF;

impl ChangeSet {
    /// Every own-scope bit.
    pub const OWN: Self = Self::from_bits_retain(LANE_MASK);
    /// Every child-scope bit.
    pub const CHILD: Self = Self::from_bits_retain(LANE_MASK << LANE);
    /// Every descendant-scope bit.
    pub const DESCENDANT: Self = Self::from_bits_retain(LANE_MASK << (2 * LANE));

    /// Kinds that describe a change of value, in any scope.
    pub const STRUCTURAL: Self = Self::spread(
        Self::VALUE.bits()
            | Self::TYPE.bits()
            | Self::ATTACH.bits()
            | Self::DETACH.bits()
            | Self::SHAPE.bits(),
    );

    /// Kinds that describe metadata only, in any scope.
    pub const META: Self = Self::spread(
        Self::COMMIT.bits()
            | Self::BLUR.bits()
            | Self::VALID.bits()
            | Self::INVALID.bits()
            | Self::ERRORS.bits()
            | Self::KEY.bits(),
    );

    const fn spread(own: u64) -> Self {
        Self::from_bits_retain(own | (own << LANE) | (own << (2 * LANE)))
    }

    /// Builds the single-bit set for `kind` in `scope`.
    #[must_use]
    pub const fn of(scope: Scope, kind: Kind) -> Self {
        Self::from_bits_retain(kind.own_bit() << scope.offset())
    }

    /// Promotes the set one scope level outward.
    ///
    /// Own bits become child bits, child bits become descendant bits, and
    /// descendant bits stay put. The original own bits are discarded.
    #[must_use]
    pub const fn shift(self) -> Self {
        let bits = self.bits();
        let own = bits & LANE_MASK;
        let child = (bits >> LANE) & LANE_MASK;
        let descendant = (bits >> (2 * LANE)) & LANE_MASK;
        Self::from_bits_retain((own << LANE) | ((child | descendant) << (2 * LANE)))
    }

    /// Applies [`shift`](Self::shift) `levels` times.
    #[must_use]
    pub const fn shift_by(self, levels: usize) -> Self {
        match levels {
            0 => self,
            1 => self.shift(),
            _ => self.shift().shift(),
        }
    }

    /// Returns the bits of `self` that fall in `scope`.
    #[must_use]
    pub const fn in_scope(self, scope: Scope) -> Self {
        Self::from_bits_retain(self.bits() & (LANE_MASK << scope.offset()))
    }

    /// Returns `true` if `kind` is present in any scope.
    #[must_use]
    pub const fn has(self, kind: Kind) -> bool {
        self.bits() & Self::spread(kind.own_bit()).bits() != 0
    }

    /// Returns `true` if `kind` is present in `scope`.
    #[must_use]
    pub const fn has_in(self, scope: Scope, kind: Kind) -> bool {
        self.bits() & Self::of(scope, kind).bits() != 0
    }

    /// Returns `true` if any value-describing kind is present.
    #[must_use]
    pub const fn is_structural(self) -> bool {
        self.intersects(Self::STRUCTURAL)
    }

    /// Returns `true` if the set is non-empty and carries metadata only.
    #[must_use]
    pub const fn is_meta_only(self) -> bool {
        !self.is_empty() && !self.is_structural()
    }

    /// Merges `incoming` into a withheld buffer.
    ///
    /// Within each scope, an incoming [`VALID`](Self::VALID) cancels a buffered
    /// [`INVALID`](Self::INVALID) and vice versa; both bits are dropped.
    #[must_use]
    pub fn absorb(self, incoming: Self) -> Self {
        let mut buffered = self;
        let mut incoming = incoming;
        for scope in Scope::ALL {
            let valid = Self::of(scope, Kind::Valid);
            let invalid = Self::of(scope, Kind::Invalid);
            if buffered.contains(invalid) && incoming.contains(valid) {
                buffered.remove(invalid);
                incoming.remove(valid);
            }
            if buffered.contains(valid) && incoming.contains(invalid) {
                buffered.remove(valid);
                incoming.remove(invalid);
            }
        }
        buffered | incoming
    }

    /// Iterates over the `(scope, kind)` pairs present in the set.
    pub fn entries(self) -> impl Iterator<Item = (Scope, Kind)> {
        Scope::ALL.into_iter().flat_map(move |scope| {
            Kind::ALL
                .into_iter()
                .filter(move |kind| self.has_in(scope, *kind))
                .map(move |kind| (scope, kind))
        })
    }
}

impl fmt::Debug for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("ChangeSet(empty)");
        }
        f.write_str("ChangeSet(")?;
        bitflags::parser::to_writer(self, &mut *f)?;
        f.write_str(")")
    }
}

/// How far from the receiving node a change happened.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    /// The node itself.
    Own,
    /// A direct child.
    Child,
    /// Any deeper descendant.
    Descendant,
}

impl Scope {
    /// All scopes, innermost first.
    pub const ALL: [Self; 3] = [Self::Own, Self::Child, Self::Descendant];

    const fn offset(self) -> u32 {
        match self {
            Self::Own => 0,
            Self::Child => LANE,
            Self::Descendant => 2 * LANE,
        }
    }
}

/// The kind of a change, independent of scope.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// See [`ChangeSet::VALUE`].
    Value,
    /// See [`ChangeSet::TYPE`].
    Type,
    /// See [`ChangeSet::ATTACH`].
    Attach,
    /// See [`ChangeSet::DETACH`].
    Detach,
    /// See [`ChangeSet::SHAPE`].
    Shape,
    /// See [`ChangeSet::COMMIT`].
    Commit,
    /// See [`ChangeSet::BLUR`].
    Blur,
    /// See [`ChangeSet::VALID`].
    Valid,
    /// See [`ChangeSet::INVALID`].
    Invalid,
    /// See [`ChangeSet::ERRORS`].
    Errors,
    /// See [`ChangeSet::KEY`].
    Key,
}

impl Kind {
    /// All kinds, in bit order.
    pub const ALL: [Self; 11] = [
        Self::Value,
        Self::Type,
        Self::Attach,
        Self::Detach,
        Self::Shape,
        Self::Commit,
        Self::Blur,
        Self::Valid,
        Self::Invalid,
        Self::Errors,
        Self::Key,
    ];

    const fn own_bit(self) -> u64 {
        1 << (self as u32)
    }

    /// Returns `true` for kinds that describe metadata rather than value.
    #[must_use]
    pub const fn is_meta(self) -> bool {
        matches!(
            self,
            Self::Commit | Self::Blur | Self::Valid | Self::Invalid | Self::Errors | Self::Key
        )
    }
}
