//! Canonical stat identifiers.
//!
//! Stat ids are the Japanese in-game names, which is also how the external
//! alias map, max-roll table and weight profiles key them.

pub const STAT_CRIT_RATE: &str = "クリティカル率";
pub const STAT_CRIT_DMG: &str = "クリティカルダメージ";
pub const STAT_ATK_PERCENT: &str = "攻撃力%";
pub const STAT_ATK_FLAT: &str = "攻撃力";
pub const STAT_HP_PERCENT: &str = "HP%";
pub const STAT_HP_FLAT: &str = "HP";
pub const STAT_DEF_PERCENT: &str = "防御力%";
pub const STAT_DEF_FLAT: &str = "防御力";
pub const STAT_ER: &str = "共鳴効率";
pub const STAT_BASIC_DMG_BONUS: &str = "通常攻撃ダメージアップ";
pub const STAT_HEAVY_DMG_BONUS: &str = "重撃ダメージアップ";
pub const STAT_SKILL_DMG_BONUS: &str = "共鳴スキルダメージアップ";
pub const STAT_LIBERATION_DMG_BONUS: &str = "共鳴解放ダメージアップ";
pub const STAT_FUSION_DMG_BONUS: &str = "焦熱ダメージアップ";
pub const STAT_GLACIO_DMG_BONUS: &str = "凝縮ダメージアップ";
pub const STAT_ELECTRO_DMG_BONUS: &str = "電導ダメージアップ";
pub const STAT_AERO_DMG_BONUS: &str = "気動ダメージアップ";
pub const STAT_SPECTRO_DMG_BONUS: &str = "回折ダメージアップ";
pub const STAT_HAVOC_DMG_BONUS: &str = "消滅ダメージアップ";
pub const STAT_HEALING_BONUS: &str = "HP回復効果アップ";

/// Placeholder main-stat target meaning "any elemental damage bonus".
pub const ELEMENT_DMG_WILDCARD: &str = "属性ダメージアップ";

/// Suffix shared by every damage-bonus stat name.
pub const DMG_BONUS_SUFFIX: &str = "ダメージアップ";

/// Every skill-type and elemental damage-bonus stat.
pub const DAMAGE_BONUS_STATS: [&str; 10] = [
    STAT_BASIC_DMG_BONUS,
    STAT_HEAVY_DMG_BONUS,
    STAT_SKILL_DMG_BONUS,
    STAT_LIBERATION_DMG_BONUS,
    STAT_FUSION_DMG_BONUS,
    STAT_GLACIO_DMG_BONUS,
    STAT_ELECTRO_DMG_BONUS,
    STAT_AERO_DMG_BONUS,
    STAT_SPECTRO_DMG_BONUS,
    STAT_HAVOC_DMG_BONUS,
];

/// Stats that roll both as a flat value and as a percentage.
pub const DUAL_FORM_STATS: [&str; 3] = [STAT_ATK_FLAT, STAT_HP_FLAT, STAT_DEF_FLAT];

/// Maximum number of substats on one Echo.
pub const MAX_SUBSTATS: usize = 5;

/// Returns the percent variant paired with a flat scaling stat.
pub fn percent_variant(flat: &str) -> Option<&'static str> {
    match flat {
        STAT_ATK_FLAT => Some(STAT_ATK_PERCENT),
        STAT_HP_FLAT => Some(STAT_HP_PERCENT),
        STAT_DEF_FLAT => Some(STAT_DEF_PERCENT),
        _ => None,
    }
}

/// Strips a trailing `%` from a stat name, returning the base name.
pub fn base_name(stat: &str) -> &str {
    stat.trim_end_matches('%')
}

/// Returns true if the base name of `stat` has both a flat and a percent form.
pub fn is_dual_form(stat: &str) -> bool {
    DUAL_FORM_STATS.contains(&base_name(stat))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_variant() {
        assert_eq!(percent_variant(STAT_ATK_FLAT), Some(STAT_ATK_PERCENT));
        assert_eq!(percent_variant(STAT_HP_FLAT), Some(STAT_HP_PERCENT));
        assert_eq!(percent_variant(STAT_CRIT_RATE), None);
    }

    #[test]
    fn test_dual_form() {
        assert!(is_dual_form("攻撃力"));
        assert!(is_dual_form("攻撃力%"));
        assert!(is_dual_form("HP%"));
        assert!(!is_dual_form("共鳴効率"));
    }
}
