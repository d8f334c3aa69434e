//! Shop product artwork
//!
//! Amulets follow the twelve western zodiac signs, bracelets the twelve
//! animals of the Chinese zodiac. Ids are stable so the generator seed, and
//! therefore the artwork, stays the same across sessions.

use serde::Serialize;

pub const ZODIAC_SIGNS: [&str; 12] = [
    "Aries",
    "Taurus",
    "Gemini",
    "Cancer",
    "Leo",
    "Virgo",
    "Libra",
    "Scorpio",
    "Sagittarius",
    "Capricorn",
    "Aquarius",
    "Pisces",
];

pub const ZODIAC_ANIMALS: [&str; 12] = [
    "Rat", "Ox", "Tiger", "Rabbit", "Dragon", "Snake", "Horse", "Goat", "Monkey", "Rooster",
    "Dog", "Pig",
];

/// Thumbnail size used by the shop grid
pub const THUMBNAIL_SIZE: u32 = 150;

/// Size used on product detail pages
pub const DETAIL_SIZE: u32 = 512;

/// One image request: logical id, generator prompt, square size
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductImage {
    pub id: String,
    pub prompt: String,
    pub size: u32,
}

impl ProductImage {
    pub fn new(id: impl Into<String>, prompt: impl Into<String>, size: u32) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            size,
        }
    }
}

/// Zodiac amulet artwork, e.g. `amulet_Aries` / "gold amulet aries"
pub fn amulet(sign: &str, size: u32) -> ProductImage {
    ProductImage::new(
        format!("amulet_{}", sign),
        format!("gold amulet {}", sign.to_lowercase()),
        size,
    )
}

/// Zodiac animal bracelet artwork, e.g. `brace_Rat` / "obsidian bracelet rat"
pub fn bracelet(animal: &str, size: u32) -> ProductImage {
    ProductImage::new(
        format!("brace_{}", animal),
        format!("obsidian bracelet {}", animal.to_lowercase()),
        size,
    )
}

/// Every product image at the given size
pub fn all(size: u32) -> Vec<ProductImage> {
    ZODIAC_SIGNS
        .iter()
        .map(|sign| amulet(sign, size))
        .chain(ZODIAC_ANIMALS.iter().map(|animal| bracelet(animal, size)))
        .collect()
}
