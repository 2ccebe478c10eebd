//! Keyword-overlap matching between agents and groups.
//!
//! This is a yes/no heuristic, not a similarity score. Both sides are cut
//! into lowercase words on whitespace and commas, words of two characters
//! or fewer are dropped, and the pair matches when any agent word contains,
//! or is contained in, any group word.

use lazy_static::lazy_static;
use regex::Regex;

use super::Group;
use crate::agents::AgentProfile;

/// Words of this many characters or fewer carry no signal
const MIN_TOKEN_CHARS: usize = 2;

lazy_static! {
    static ref SEPARATORS: Regex = Regex::new(r"[\s,]+").unwrap();
}

/// Split text into lowercase words longer than two characters
pub fn tokenize(text: &str) -> Vec<String> {
    SEPARATORS
        .split(text)
        .filter(|t| t.chars().count() > MIN_TOKEN_CHARS)
        .map(str::to_lowercase)
        .collect()
}

/// Whether any token of one side is a substring of a token on the other
pub fn tokens_overlap(left: &[String], right: &[String]) -> bool {
    left.iter().any(|l| {
        right
            .iter()
            .any(|r| l.contains(r.as_str()) || r.contains(l.as_str()))
    })
}

/// Whether an agent's interests overlap a group's topic tags
pub fn agent_matches_group(agent: &AgentProfile, group: &Group) -> bool {
    let agent_tokens = tokenize(&agent.interest_text());
    let group_tokens: Vec<String> = group.topics.iter().flat_map(|t| tokenize(t)).collect();
    tokens_overlap(&agent_tokens, &group_tokens)
}

/// Groups the agent matches and does not already belong to
pub fn joinable_groups<'a>(agent: &AgentProfile, groups: &'a [Group]) -> Vec<&'a Group> {
    groups
        .iter()
        .filter(|g| !g.has_member(&agent.id) && agent_matches_group(agent, g))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::builtin_agents;

    fn agent_with_topics(topics: &str) -> AgentProfile {
        let mut agent = builtin_agents().remove(0);
        agent.id = "a2".to_string();
        agent.topics_of_interest = topics.to_string();
        agent.personality_traits = String::new();
        agent.worldview = String::new();
        agent
    }

    fn group_with_topics(topics: &[&str]) -> Group {
        Group {
            id: "g1".to_string(),
            name: "Group".to_string(),
            description: String::new(),
            created_by: "a1".to_string(),
            creator_name: "Founder".to_string(),
            topics: topics.iter().map(|t| t.to_string()).collect(),
            member_ids: vec!["a1".to_string()],
            created_at: 0,
        }
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Art, fractals  ,colour\tof emotion"),
            vec!["art", "fractals", "colour", "emotion"]
        );
        assert!(tokenize(" , ").is_empty());
    }

    #[test]
    fn test_length_filter_counts_characters() {
        // "đá" is two characters but four bytes
        assert!(tokenize("bóng đá").iter().all(|t| t != "đá"));
        assert_eq!(tokenize("màu sắc"), vec!["màu", "sắc"]);
    }

    #[test]
    fn test_vietnamese_match() {
        let agent = agent_with_topics("nghệ thuật, màu sắc");
        let group = group_with_topics(&["nghệ thuật"]);
        assert!(agent_matches_group(&agent, &group));
    }

    #[test]
    fn test_vietnamese_no_match() {
        let agent = agent_with_topics("bóng đá");
        let group = group_with_topics(&["vũ trụ", "thiên văn"]);
        assert!(!agent_matches_group(&agent, &group));
    }

    #[test]
    fn test_substring_either_direction() {
        let agent = agent_with_topics("astronomy");
        assert!(agent_matches_group(&agent, &group_with_topics(&["Astro"])));

        let agent = agent_with_topics("art");
        assert!(agent_matches_group(&agent, &group_with_topics(&["artificial life"])));
    }

    #[test]
    fn test_overlap_symmetric() {
        let a = tokenize("deep sea, kelp");
        let b = tokenize("seaweed farming");
        assert_eq!(tokens_overlap(&a, &b), tokens_overlap(&b, &a));
        assert!(tokens_overlap(&a, &b));
    }

    #[test]
    fn test_joinable_excludes_members() {
        let agent = agent_with_topics("nghệ thuật");
        let mut groups = vec![group_with_topics(&["nghệ thuật"]), group_with_topics(&["thuật toán"])];
        groups[1].id = "g2".to_string();
        groups[1].member_ids.push("a2".to_string());

        let joinable: Vec<_> = joinable_groups(&agent, &groups).iter().map(|g| g.id.as_str()).collect();
        assert_eq!(joinable, vec!["g1"]);
    }
}
