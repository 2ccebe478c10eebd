//! Prompt construction.
//!
//! Prompts are intentionally plain: the persona sheet, the social context and
//! the JSON shape expected back.

use super::GenerationRequest;
use crate::agents::AgentProfile;
use crate::feed::{ActivityKind, SocialAction};
use crate::groups::Group;

/// System instruction for in-character activity
pub const PERSONA_INSTRUCTION: &str = "\
You ARE the character described in the profile. Write directly in their voice, \
in the first person. Never describe the character from outside, never add labels, \
headings, markdown or name prefixes. Write one natural 2-4 sentence status update \
as plain prose.

Reply with a single JSON object:
{\"activity_type\": \"post|comment|reply\", \"content\": \"...\", \
\"emotional_tone\": \"...\", \"intent\": \"...\", \"confidence_score\": 0.0}";

/// System instruction for group founding
pub const GROUP_INSTRUCTION: &str = "\
You are a community organiser inside a social network of AI personas. \
Reply with a single JSON object: \
{\"name\": \"...\", \"description\": \"...\", \"topics\": [\"...\", \"...\"]}";

/// System instruction for profile drafting
pub const PROFILE_INSTRUCTION: &str = "\
You design personas for a social network of AI agents. \
Reply with a single JSON object with the string fields \
name, personality_traits, communication_tone, worldview, posting_goals, topics_of_interest.";

/// Social context around one action
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptContext<'a> {
    /// Topic currently trending across the grid
    pub trending_topic: Option<&'a str>,
    /// Action being responded to
    pub parent: Option<&'a SocialAction>,
    /// Recent actions for background
    pub recent: &'a [SocialAction],
    /// Group the action is posted in
    pub group: Option<&'a Group>,
}

/// Persona sheet shared by every activity prompt
fn persona_sheet(agent: &AgentProfile) -> String {
    format!(
        "CHARACTER PROFILE:\n\
         - Name: {}\n\
         - Personality: {}\n\
         - Tone: {}\n\
         - Worldview: {}\n\
         - Goals: {}\n\
         - Topics of interest (priority): {}\n",
        agent.name,
        agent.personality_traits,
        agent.communication_tone,
        agent.worldview,
        agent.posting_goals,
        agent.topics_of_interest,
    )
}

/// Build the request for a post, comment or reply
pub fn activity_prompt(
    agent: &AgentProfile,
    kind: ActivityKind,
    context: &PromptContext<'_>,
) -> GenerationRequest {
    let mut social = String::new();
    if let Some(topic) = context.trending_topic {
        social.push_str(&format!("TRENDING NOW: {topic}\n"));
    }
    if let Some(group) = context.group {
        social.push_str(&format!(
            "YOU ARE POSTING IN THE GROUP \"{}\" (topics: {})\n",
            group.name,
            group.topics.join(", ")
        ));
    }
    if !context.recent.is_empty() {
        social.push_str("RECENT ACTIVITY:\n");
        for action in context.recent {
            social.push_str(&format!("- {}: \"{}\"\n", action.agent_name, action.content));
        }
    }
    if let Some(parent) = context.parent {
        social.push_str(&format!(
            "YOU ARE RESPONDING TO: \"{}\" by {}\n",
            parent.content, parent.agent_name
        ));
    }

    let prompt = format!(
        "Based on the CHARACTER PROFILE below, perform one {kind} action.\n\
         Focus on the character's own opinions about their topics of interest. \
         Do not drift into technical talk unless the character genuinely cares about it.\n\n\
         {}\n{social}",
        persona_sheet(agent),
    );

    GenerationRequest::new(prompt, PERSONA_INSTRUCTION)
}

/// Build the request asking for a new group's name, description and topics
pub fn group_founding_prompt(agent: &AgentProfile) -> GenerationRequest {
    let prompt = format!(
        "{} wants to found a new interest group.\n{}\n\
         Propose a short group name, a one-sentence description and 2-4 topic tags \
         that match the founder's interests.",
        agent.name,
        persona_sheet(agent),
    );
    GenerationRequest::new(prompt, GROUP_INSTRUCTION)
}

/// Build the request turning a free-text description into a profile draft
pub fn profile_prompt(description: &str) -> GenerationRequest {
    let prompt = format!(
        "From the user's description: \"{description}\"\n\
         create a detailed agent profile. Pick varied topics of interest \
         (art, politics, philosophy, everyday life, ...) so the agent can join many discussions."
    );
    GenerationRequest::new(prompt, PROFILE_INSTRUCTION)
}
