//! Shop catalog, pricing and access gating
//!
//! Prices scale with the Fibonacci weight of the item tier and shrink with
//! the circulating supply: `floor(fib[tier] * supply / initial_supply)`.
//! Engage tier grants a percentage discount of `fib[engage_tier]` percent.

use crate::config::CatalogEntry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fibonacci weights indexed by tier (0-9)
pub const FIB: [u64; 10] = [0, 1, 1, 2, 3, 5, 8, 13, 21, 34];

/// A cosmetic item in the shop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopItem {
    pub id: String,
    pub name: String,
    /// Rank 0-9 driving price and access gating
    pub tier: u8,
    /// Default items ship with every account and are never purchasable
    pub default_item: bool,
}

impl ShopItem {
    pub fn summary(&self) -> crate::types::ItemSummary {
        crate::types::ItemSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            tier: self.tier,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    items: HashMap<String, ShopItem>,
}

impl Catalog {
    pub fn from_items(items: Vec<ShopItem>) -> Self {
        Self {
            items: items.into_iter().map(|i| (i.id.clone(), i)).collect(),
        }
    }

    /// Catalog from config entries, or the built-in set when empty
    pub fn from_config(entries: &[CatalogEntry]) -> Self {
        if entries.is_empty() {
            return Self::builtin();
        }
        Self::from_items(
            entries
                .iter()
                .map(|e| ShopItem {
                    id: e.id.clone(),
                    name: e.name.clone(),
                    tier: e.tier.min(9),
                    default_item: e.default_item,
                })
                .collect(),
        )
    }

    /// Default cosmetics shipped with the platform
    pub fn builtin() -> Self {
        let items = vec![
            ShopItem {
                id: "cap_classic".to_string(),
                name: "Classic Cap".to_string(),
                tier: 0,
                default_item: true,
            },
            ShopItem {
                id: "trail_sparks".to_string(),
                name: "Spark Trail".to_string(),
                tier: 2,
                default_item: false,
            },
            ShopItem {
                id: "skin_midnight".to_string(),
                name: "Midnight Skin".to_string(),
                tier: 3,
                default_item: false,
            },
            ShopItem {
                id: "aura_ember".to_string(),
                name: "Ember Aura".to_string(),
                tier: 5,
                default_item: false,
            },
            ShopItem {
                id: "crown_degen".to_string(),
                name: "Degen Crown".to_string(),
                tier: 7,
                default_item: false,
            },
        ];
        Self::from_items(items)
    }

    pub fn get(&self, id: &str) -> Option<&ShopItem> {
        self.items.get(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Base price in whole tokens for a tier at the current supply
pub fn calculate_price(tier: u8, supply: f64, initial_supply: f64) -> u64 {
    let weight = FIB[tier.min(9) as usize] as f64;
    if initial_supply <= 0.0 {
        return 0;
    }
    (weight * supply / initial_supply).floor().max(0.0) as u64
}

/// Engage-tier discount: `fib[engage_tier]` percent off, floored
pub fn apply_discount(price: u64, engage_tier: u8) -> u64 {
    let pct = FIB[engage_tier.min(9) as usize] as f64 / 100.0;
    (price as f64 * (1.0 - pct)).floor().max(0.0) as u64
}

/// Access gate: an item of `shop_tier` requires engage tier
/// `min(shop_tier - 2, 4)`
pub fn can_access_tier(shop_tier: u8, engage_tier: u8) -> bool {
    let required = shop_tier.saturating_sub(2).min(4);
    engage_tier >= required
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_price_halved_supply() {
        // fib[5]=5: floor(5 * 500M / 1B) = 2
        assert_eq!(calculate_price(5, 500_000_000.0, 1_000_000_000.0), 2);
    }

    #[test]
    fn test_calculate_price_full_supply() {
        assert_eq!(calculate_price(7, 1_000_000_000.0, 1_000_000_000.0), 13);
        // Tier 0 carries no weight
        assert_eq!(calculate_price(0, 1_000_000_000.0, 1_000_000_000.0), 0);
    }

    #[test]
    fn test_apply_discount() {
        // fib[2]=1: floor(100 * 0.99) = 99
        assert_eq!(apply_discount(100, 2), 99);
        // fib[0]=0: no discount
        assert_eq!(apply_discount(100, 0), 100);
        // fib[9]=34
        assert_eq!(apply_discount(100, 9), 66);
    }

    #[test]
    fn test_can_access_tier() {
        // required = min(5-2, 4) = 3; engage 2 < 3
        assert!(!can_access_tier(5, 2));
        assert!(can_access_tier(5, 3));
        // Low tiers are open to everyone
        assert!(can_access_tier(2, 0));
        assert!(can_access_tier(0, 0));
        // Requirement caps at 4
        assert!(can_access_tier(9, 4));
    }

    #[test]
    fn test_builtin_catalog() {
        let catalog = Catalog::builtin();
        assert!(!catalog.is_empty());
        assert!(catalog.get("cap_classic").unwrap().default_item);
        assert_eq!(catalog.get("aura_ember").unwrap().tier, 5);
        assert!(catalog.get("missing").is_none());
    }

    #[test]
    fn test_from_config_clamps_tier() {
        let entries = vec![CatalogEntry {
            id: "x".to_string(),
            name: "X".to_string(),
            tier: 42,
            default_item: false,
        }];
        let catalog = Catalog::from_config(&entries);
        assert_eq!(catalog.get("x").unwrap().tier, 9);
    }

    #[test]
    fn test_from_config_empty_falls_back_to_builtin() {
        let catalog = Catalog::from_config(&[]);
        assert!(catalog.get("cap_classic").is_some());
    }
}
