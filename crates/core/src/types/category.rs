//! Product categories.

use serde::{Deserialize, Serialize};

/// Closed set of catalog categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    Shirts,
    Hoodies,
    Hats,
    Mugs,
    Posters,
    Stickers,
    Accessories,
    #[default]
    Other,
}

impl ProductCategory {
    /// Every category, in display order.
    pub const ALL: [Self; 8] = [
        Self::Shirts,
        Self::Hoodies,
        Self::Hats,
        Self::Mugs,
        Self::Posters,
        Self::Stickers,
        Self::Accessories,
        Self::Other,
    ];

    /// Storage and query-string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Shirts => "shirts",
            Self::Hoodies => "hoodies",
            Self::Hats => "hats",
            Self::Mugs => "mugs",
            Self::Posters => "posters",
            Self::Stickers => "stickers",
            Self::Accessories => "accessories",
            Self::Other => "other",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Shirts => "T-Shirts",
            Self::Hoodies => "Hoodies & Sweatshirts",
            Self::Hats => "Hats",
            Self::Mugs => "Mugs",
            Self::Posters => "Posters & Prints",
            Self::Stickers => "Stickers",
            Self::Accessories => "Accessories",
            Self::Other => "Other",
        }
    }

    /// Guess a category from a provider product name.
    ///
    /// Used when importing sync products, which carry no category of their own.
    #[must_use]
    pub fn infer_from_name(name: &str) -> Self {
        let name = name.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| name.contains(w));

        if has(&["hoodie", "sweatshirt", "crewneck"]) {
            Self::Hoodies
        } else if has(&["t-shirt", "tee", "shirt", "tank"]) {
            Self::Shirts
        } else if has(&["hat", "cap", "beanie"]) {
            Self::Hats
        } else if has(&["mug", "tumbler"]) {
            Self::Mugs
        } else if has(&["poster", "print", "canvas"]) {
            Self::Posters
        } else if has(&["sticker"]) {
            Self::Stickers
        } else if has(&["bag", "tote", "case", "pin", "patch"]) {
            Self::Accessories
        } else {
            Self::Other
        }
    }
}

impl std::fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("invalid category: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trips_through_str() {
        for category in ProductCategory::ALL {
            assert_eq!(category.as_str().parse::<ProductCategory>(), Ok(category));
        }
        assert!("shoes".parse::<ProductCategory>().is_err());
    }

    #[test]
    fn test_infer_from_name() {
        assert_eq!(
            ProductCategory::infer_from_name("Unisex Heavy Blend Hoodie"),
            ProductCategory::Hoodies
        );
        assert_eq!(
            ProductCategory::infer_from_name("Bella Canvas T-Shirt"),
            ProductCategory::Shirts
        );
        assert_eq!(
            ProductCategory::infer_from_name("White Glossy Mug"),
            ProductCategory::Mugs
        );
        assert_eq!(
            ProductCategory::infer_from_name("Mystery Item"),
            ProductCategory::Other
        );
    }
}
