use serde::Serialize;

/// A cosmetic or utility item that can be bought with credits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShopItem {
    pub id: &'static str,
    pub name: &'static str,
    pub cost: u64,
    pub kind: ShopItemKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShopItemKind {
    Theme,
    AvatarFrame,
    StreakFreeze,
}

/// The fixed shop catalogue
pub const CATALOGUE: &[ShopItem] = &[
    ShopItem { id: "theme-midnight", name: "Midnight Theme", cost: 50, kind: ShopItemKind::Theme },
    ShopItem { id: "theme-forest", name: "Forest Theme", cost: 50, kind: ShopItemKind::Theme },
    ShopItem { id: "theme-sunset", name: "Sunset Theme", cost: 80, kind: ShopItemKind::Theme },
    ShopItem { id: "frame-gold", name: "Gold Avatar Frame", cost: 120, kind: ShopItemKind::AvatarFrame },
    ShopItem { id: "frame-neon", name: "Neon Avatar Frame", cost: 150, kind: ShopItemKind::AvatarFrame },
    ShopItem { id: "streak-freeze", name: "Streak Freeze", cost: 30, kind: ShopItemKind::StreakFreeze },
];

/// Looks up a catalogue item by id
pub fn find_item(id: &str) -> Option<&'static ShopItem> {
    CATALOGUE.iter().find(|item| item.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalogue_ids_are_unique() {
        let ids: HashSet<_> = CATALOGUE.iter().map(|item| item.id).collect();
        assert_eq!(ids.len(), CATALOGUE.len());
    }

    #[test]
    fn test_find_item() {
        assert_eq!(find_item("frame-gold").map(|i| i.cost), Some(120));
        assert!(find_item("nope").is_none());
    }
}
