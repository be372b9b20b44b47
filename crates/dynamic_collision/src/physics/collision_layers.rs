//! Collision layer and group filtering
//!
//! Every collidable carries a 32-bit filter word. The low seven bits name its
//! layer, the high sixteen bits its system group. Two collidables interact if
//! the layer matrix allows their layers to meet and they are not in the same
//! non-zero group (an actor never collides with its own parts).

use bitflags::bitflags;

/// Layer numbers
pub struct CollisionLayers;

impl CollisionLayers {
    /// Unfiltered
    pub const UNIDENTIFIED: u32 = 0;

    /// Static world geometry
    pub const STATIC: u32 = 1;

    /// Generic animated or keyframed objects
    pub const ANIM_STATIC: u32 = 2;

    /// Loose clutter
    pub const CLUTTER: u32 = 4;

    /// Weapons
    pub const WEAPON: u32 = 5;

    /// Projectiles
    pub const PROJECTILE: u32 = 6;

    /// Trigger volumes
    pub const TRIGGER: u32 = 12;

    /// Terrain
    pub const TERRAIN: u32 = 13;

    /// Ragdoll and biped bones
    pub const BIPED: u32 = 8;

    /// Water surfaces
    pub const WATER: u32 = 15;

    /// Invisible walls
    pub const INVISIBLE_WALL: u32 = 27;

    /// Character controllers
    pub const CHAR_CONTROLLER: u32 = 30;

    /// Number of addressable layers
    pub const COUNT: u32 = 64;

    /// Mask bit of a layer
    pub const fn bit(layer: u32) -> u64 {
        if layer < Self::COUNT {
            1 << layer
        } else {
            0
        }
    }

    /// Helper to create a mask from multiple layers
    ///
    /// # Example
    /// ```
    /// use dynamic_collision::physics::CollisionLayers;
    ///
    /// let mask = CollisionLayers::mask(&[CollisionLayers::STATIC, CollisionLayers::TERRAIN]);
    /// assert_eq!(mask, (1 << 1) | (1 << 13));
    /// ```
    pub fn mask(layers: &[u32]) -> u64 {
        layers.iter().fold(0, |acc, &layer| acc | Self::bit(layer))
    }
}

bitflags! {
    /// Flag bits stored between the layer and the group
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FilterFlags: u32 {
        /// Collidable is excluded from every query
        const NO_COLLISION = 1 << 14;
        /// Collidable is linked to a skeleton bone
        const LINKED_GROUP = 1 << 15;
    }
}

/// Packed layer, flags and group word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CollisionFilterInfo(pub u32);

impl CollisionFilterInfo {
    const LAYER_MASK: u32 = 0x7F;
    const GROUP_SHIFT: u32 = 16;

    /// Pack a layer and a group
    pub const fn new(layer: u32, group: u16) -> Self {
        Self((layer & Self::LAYER_MASK) | ((group as u32) << Self::GROUP_SHIFT))
    }

    /// Layer number in the low seven bits
    pub const fn layer(self) -> u32 {
        self.0 & Self::LAYER_MASK
    }

    /// System group in the high sixteen bits
    pub const fn group(self) -> u16 {
        (self.0 >> Self::GROUP_SHIFT) as u16
    }

    /// Flag bits
    pub const fn flags(self) -> FilterFlags {
        FilterFlags::from_bits_truncate(self.0)
    }

    /// Same group, different layer
    pub const fn with_layer(self, layer: u32) -> Self {
        Self((self.0 & !Self::LAYER_MASK) | (layer & Self::LAYER_MASK))
    }
}

/// Per-layer collision masks
#[derive(Debug, Clone)]
pub struct CollisionMatrix {
    masks: Vec<u64>,
}

impl CollisionMatrix {
    /// Matrix where every layer collides with every layer
    pub fn all() -> Self {
        Self { masks: vec![u64::MAX; CollisionLayers::COUNT as usize] }
    }

    /// Matrix where nothing collides
    pub fn none() -> Self {
        Self { masks: vec![0; CollisionLayers::COUNT as usize] }
    }

    /// Enable or disable collision between two layers, symmetrically
    pub fn set(&mut self, a: u32, b: u32, enabled: bool) {
        let (Some(ma), Some(mb)) = (self.masks.get(a as usize), self.masks.get(b as usize)) else {
            return;
        };
        let (ma, mb) = if enabled {
            (ma | CollisionLayers::bit(b), mb | CollisionLayers::bit(a))
        } else {
            (ma & !CollisionLayers::bit(b), mb & !CollisionLayers::bit(a))
        };
        self.masks[a as usize] = ma;
        self.masks[b as usize] = mb;
    }

    /// Mask of the layers `layer` collides with
    pub fn mask(&self, layer: u32) -> u64 {
        self.masks.get(layer as usize).copied().unwrap_or(0)
    }

    /// Check if two collidables should interact based on their layers and groups
    pub fn should_collide(&self, a: CollisionFilterInfo, b: CollisionFilterInfo) -> bool {
        if a.flags().contains(FilterFlags::NO_COLLISION) || b.flags().contains(FilterFlags::NO_COLLISION) {
            return false;
        }
        if a.group() != 0 && a.group() == b.group() {
            return false;
        }
        // A's layer must be in B's mask AND B's layer must be in A's mask
        (self.mask(b.layer()) & CollisionLayers::bit(a.layer())) != 0
            && (self.mask(a.layer()) & CollisionLayers::bit(b.layer())) != 0
    }
}

impl Default for CollisionMatrix {
    fn default() -> Self {
        let mut matrix = Self::none();
        let solid = [
            CollisionLayers::UNIDENTIFIED,
            CollisionLayers::STATIC,
            CollisionLayers::ANIM_STATIC,
            CollisionLayers::CLUTTER,
            CollisionLayers::TERRAIN,
            CollisionLayers::INVISIBLE_WALL,
        ];
        for layer in solid {
            matrix.set(CollisionLayers::CHAR_CONTROLLER, layer, true);
        }
        matrix.set(CollisionLayers::CHAR_CONTROLLER, CollisionLayers::CHAR_CONTROLLER, true);
        matrix.set(CollisionLayers::PROJECTILE, CollisionLayers::STATIC, true);
        matrix.set(CollisionLayers::PROJECTILE, CollisionLayers::BIPED, true);
        matrix
    }
}
