//! Found-or-join decision for group ticks.

use crate::config::SimulationConfig;

/// What a group tick should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupAction {
    /// A random agent founds a new group
    Found,
    /// A random agent joins one of the groups it matches
    Join,
    /// Nothing to do; the reason is only logged
    Idle(&'static str),
}

/// Decide a group tick from one uniform roll in `[0, 1)`.
///
/// Founding wins when the roll falls under `found_group_probability` and
/// fewer than `max_groups` exist. Otherwise the tick tries to join, which
/// needs at least one existing group.
pub fn choose_group_action(roll: f64, group_count: usize, config: &SimulationConfig) -> GroupAction {
    if roll < config.found_group_probability && group_count < config.max_groups {
        GroupAction::Found
    } else if group_count > 0 {
        GroupAction::Join
    } else {
        GroupAction::Idle("no groups to join")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_roll_founds() {
        let config = SimulationConfig::default();
        assert_eq!(choose_group_action(0.1, 0, &config), GroupAction::Found);
        assert_eq!(choose_group_action(0.39, 19, &config), GroupAction::Found);
    }

    #[test]
    fn test_cap_blocks_founding() {
        let config = SimulationConfig::default();
        assert_eq!(choose_group_action(0.1, 20, &config), GroupAction::Join);
    }

    #[test]
    fn test_high_roll_joins_or_idles() {
        let config = SimulationConfig::default();
        assert_eq!(choose_group_action(0.4, 3, &config), GroupAction::Join);
        assert!(matches!(
            choose_group_action(0.9, 0, &config),
            GroupAction::Idle(_)
        ));
    }

    #[test]
    fn test_probability_is_tunable() {
        let config = SimulationConfig {
            found_group_probability: 0.0,
            ..Default::default()
        };
        assert_eq!(choose_group_action(0.0, 0, &config), GroupAction::Idle("no groups to join"));
    }
}
