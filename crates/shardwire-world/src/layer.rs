use serde::Serialize;

/// Equipment slot of an item, or [`Layer::INVALID`] for plain container contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Layer(pub u8);

impl Layer {
    pub const INVALID: Layer = Layer(0x00);
    pub const ONE_HANDED: Layer = Layer(0x01);
    pub const TWO_HANDED: Layer = Layer(0x02);
    pub const SHOES: Layer = Layer(0x03);
    pub const PANTS: Layer = Layer(0x04);
    pub const SHIRT: Layer = Layer(0x05);
    pub const HELMET: Layer = Layer(0x06);
    pub const GLOVES: Layer = Layer(0x07);
    pub const RING: Layer = Layer(0x08);
    pub const TALISMAN: Layer = Layer(0x09);
    pub const NECKLACE: Layer = Layer(0x0A);
    pub const HAIR: Layer = Layer(0x0B);
    pub const WAIST: Layer = Layer(0x0C);
    pub const TORSO: Layer = Layer(0x0D);
    pub const BRACELET: Layer = Layer(0x0E);
    pub const FACE: Layer = Layer(0x0F);
    pub const BEARD: Layer = Layer(0x10);
    pub const TUNIC: Layer = Layer(0x11);
    pub const EARRINGS: Layer = Layer(0x12);
    pub const ARMS: Layer = Layer(0x13);
    pub const CLOAK: Layer = Layer(0x14);
    pub const BACKPACK: Layer = Layer(0x15);
    pub const ROBE: Layer = Layer(0x16);
    pub const SKIRT: Layer = Layer(0x17);
    pub const LEGS: Layer = Layer(0x18);
    pub const MOUNT: Layer = Layer(0x19);
    pub const SHOP_BUY_RESTOCK: Layer = Layer(0x1A);
    pub const SHOP_BUY: Layer = Layer(0x1B);
    pub const SHOP_SELL: Layer = Layer(0x1C);
    pub const BANK: Layer = Layer(0x1D);

    pub const fn is_equipped(self) -> bool {
        self.0 != Self::INVALID.0
    }

    pub const fn is_shop(self) -> bool {
        self.0 >= Self::SHOP_BUY_RESTOCK.0 && self.0 <= Self::SHOP_SELL.0
    }

    /// Short slot name for listings.
    pub fn name(self) -> &'static str {
        match self {
            Self::INVALID => "none",
            Self::ONE_HANDED => "one-handed",
            Self::TWO_HANDED => "two-handed",
            Self::SHOES => "shoes",
            Self::PANTS => "pants",
            Self::SHIRT => "shirt",
            Self::HELMET => "helmet",
            Self::GLOVES => "gloves",
            Self::RING => "ring",
            Self::TALISMAN => "talisman",
            Self::NECKLACE => "necklace",
            Self::HAIR => "hair",
            Self::WAIST => "waist",
            Self::TORSO => "torso",
            Self::BRACELET => "bracelet",
            Self::FACE => "face",
            Self::BEARD => "beard",
            Self::TUNIC => "tunic",
            Self::EARRINGS => "earrings",
            Self::ARMS => "arms",
            Self::CLOAK => "cloak",
            Self::BACKPACK => "backpack",
            Self::ROBE => "robe",
            Self::SKIRT => "skirt",
            Self::LEGS => "legs",
            Self::MOUNT => "mount",
            Self::SHOP_BUY_RESTOCK => "shop-restock",
            Self::SHOP_BUY => "shop-buy",
            Self::SHOP_SELL => "shop-sell",
            Self::BANK => "bank",
            _ => "unknown",
        }
    }
}
