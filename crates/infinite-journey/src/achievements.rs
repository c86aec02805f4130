//! The achievement catalog and the thresholds that grant automatic badges.
//!
//! Three achievements are granted by the reducer as a side effect of counter
//! or collection growth. The remaining two are granted by layer flows when
//! the visitor performs a specific action.

use infinite_types::{Achievement, AchievementId, ContactMethod, Rarity};

/// Granted when the data point collection reaches [`DATA_COLLECTOR_THRESHOLD`].
pub const DATA_COLLECTOR: &str = "data-collector";

/// Granted when the dimension shift counter becomes [`DIMENSION_WALKER_THRESHOLD`].
pub const DIMENSION_WALKER: &str = "dimension-walker";

/// Granted when the infinity glimpse counter becomes [`INFINITY_SEEKER_THRESHOLD`].
pub const INFINITY_SEEKER: &str = "infinity-seeker";

/// Granted from the Technical layer's mastery action.
pub const TECHNICAL_MASTER: &str = "technical-master";

/// Granted the first time the visitor initiates contact.
pub const CONNECTION_ESTABLISHED: &str = "connection-established";

/// Number of data points that earns [`DATA_COLLECTOR`].
pub const DATA_COLLECTOR_THRESHOLD: usize = 10;

/// Dimension shift count that earns [`DIMENSION_WALKER`].
pub const DIMENSION_WALKER_THRESHOLD: u32 = 5;

/// Infinity glimpse count that earns [`INFINITY_SEEKER`].
pub const INFINITY_SEEKER_THRESHOLD: u32 = 3;

fn badge(id: &str, title: &str, description: String, rarity: Rarity, now: i64) -> Achievement {
    Achievement {
        id: AchievementId::new(id),
        title: title.to_owned(),
        description,
        unlocked_at: now,
        rarity,
    }
}

/// The common badge for collecting ten data points.
pub fn data_collector(now: i64) -> Achievement {
    badge(
        DATA_COLLECTOR,
        "Data Collector",
        "Gathered 10 data points across dimensions".to_owned(),
        Rarity::Common,
        now,
    )
}

/// The rare badge for the fifth dimension shift.
pub fn dimension_walker(now: i64) -> Achievement {
    badge(
        DIMENSION_WALKER,
        "Dimension Walker",
        "Shifted through 5 dimensional planes".to_owned(),
        Rarity::Rare,
        now,
    )
}

/// The legendary badge for the third infinity glimpse.
pub fn infinity_seeker(now: i64) -> Achievement {
    badge(
        INFINITY_SEEKER,
        "Infinity Seeker",
        "Glimpsed the infinite 3 times".to_owned(),
        Rarity::Legendary,
        now,
    )
}

/// The legendary badge claimed after the technical demonstrations.
pub fn technical_master(now: i64) -> Achievement {
    badge(
        TECHNICAL_MASTER,
        "Technical Mastery Demonstrated",
        "Explored all technical demonstrations".to_owned(),
        Rarity::Legendary,
        now,
    )
}

/// The transcendent badge for reaching out through `method`.
pub fn connection_established(method: ContactMethod, now: i64) -> Achievement {
    badge(
        CONNECTION_ESTABLISHED,
        "Connection Established",
        format!("Initiated contact through {}", method.as_str()),
        Rarity::Transcendent,
        now,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_rarities() {
        assert_eq!(data_collector(0).rarity, Rarity::Common);
        assert_eq!(dimension_walker(0).rarity, Rarity::Rare);
        assert_eq!(infinity_seeker(0).rarity, Rarity::Legendary);
        assert_eq!(technical_master(0).rarity, Rarity::Legendary);
        assert_eq!(
            connection_established(ContactMethod::Email, 0).rarity,
            Rarity::Transcendent
        );
    }

    #[test]
    fn connection_description_names_the_method() {
        let badge = connection_established(ContactMethod::Linkedin, 42);
        assert_eq!(badge.description, "Initiated contact through linkedin");
        assert_eq!(badge.unlocked_at, 42);
        assert!(badge.id == CONNECTION_ESTABLISHED);
    }
}
