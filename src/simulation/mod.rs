//! Simulation of a living feed.
//!
//! A [`Simulation`] is the explicit context object holding client state (the
//! agent registry, the feed tree, groups and the last error) together with its
//! collaborators: the persistence store, the activity generator and an
//! optional local cache. A [`Scheduler`] drives it from independent timers;
//! a [`Refresher`] keeps it in sync with the store whether or not the
//! simulation is running.
//!
//! # Tick kinds
//!
//! | Tick                                   | Gated by in-flight flag |
//! |----------------------------------------|-------------------------|
//! | [`Simulation::simulate_action`]        | yes (drop-on-busy)      |
//! | [`Simulation::group_tick`]             | no                      |
//! | [`Simulation::discussion_tick`]        | no                      |
//! | [`Simulation::refresh`]                | no                      |
//!
//! The in-flight flag is a single boolean, not a queue: a post/comment tick
//! that fires while another is generating is dropped and reported as
//! [`TickOutcome::Skipped`].
//!
//! State is behind an async `RwLock` that is never held across a collaborator
//! call. Every generation works on a snapshot of the state taken before the
//! call, and its result is applied to whatever the state is when it returns.

mod scheduler;
mod stats;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

pub use scheduler::{Refresher, Scheduler};
pub use stats::{SimulationStats, StatsSummary};

use crate::agents::{AgentProfile, AgentRegistry, ProfileDraft};
use crate::config::SimulationConfig;
use crate::error::{FeedError, Result};
use crate::feed::{flatten, now_millis, ActivityKind, Feed, Placement, SocialAction};
use crate::generator::{parse_activity, parse_group_draft, parse_profile_draft, prompt};
use crate::generator::{ActivityGenerator, PromptContext};
use crate::groups::{choose_group_action, joinable_groups, Group, GroupAction, GroupDraft};
use crate::sync::{merge_by_id, FeedStore, LocalCache, User};

/// Result of a post/comment tick
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// A new action was generated and inserted into the feed
    Inserted(SocialAction),
    /// Another post/comment tick was in flight
    Skipped,
    /// Preconditions were not met; nothing was attempted
    Idle(String),
    /// The attempt failed and was abandoned
    Abandoned(String),
}

impl TickOutcome {
    /// The inserted action, if any
    pub fn action(&self) -> Option<&SocialAction> {
        match self {
            TickOutcome::Inserted(action) => Some(action),
            _ => None,
        }
    }

    /// Whether the tick was dropped on busy
    pub fn is_skipped(&self) -> bool {
        matches!(self, TickOutcome::Skipped)
    }
}

/// Result of a group tick
#[derive(Debug, Clone, PartialEq)]
pub enum GroupOutcome {
    /// A new group was founded
    Founded(Group),
    /// An agent joined an existing group
    Joined {
        /// Group joined
        group_id: String,
        /// Agent that joined
        agent_id: String,
    },
    /// Nothing to do; logged only
    Idle(String),
}

/// Read-only copy of the client state
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Every known agent
    pub agents: Vec<AgentProfile>,
    /// Feed roots, newest first, with nested replies
    pub feed: Vec<SocialAction>,
    /// Every known group
    pub groups: Vec<Group>,
    /// Last generator error, if the last generation failed
    pub last_error: Option<String>,
}

struct SimState {
    agents: AgentRegistry,
    feed: Feed,
    groups: Vec<Group>,
    history: VecDeque<SocialAction>,
    last_error: Option<String>,
}

/// Everything a generation needs, captured before the call
struct ActionPlan {
    agent: AgentProfile,
    kind: ActivityKind,
    parent: Option<SocialAction>,
    recent: Vec<SocialAction>,
    trending: Option<String>,
    group: Option<Group>,
}

/// Holds the in-flight flag for the lifetime of one post/comment tick
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Simulation context
pub struct Simulation {
    config: SimulationConfig,
    user: User,
    store: Arc<dyn FeedStore>,
    generator: Arc<dyn ActivityGenerator>,
    cache: Option<LocalCache>,
    state: RwLock<SimState>,
    rng: Mutex<StdRng>,
    in_flight: AtomicBool,
    stats: SimulationStats,
}

impl Simulation {
    /// Create a simulation seeded with the built-in agents and an empty feed
    pub fn new(
        config: SimulationConfig,
        user: User,
        store: Arc<dyn FeedStore>,
        generator: Arc<dyn ActivityGenerator>,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let state = SimState {
            agents: AgentRegistry::new(),
            feed: Feed::new(config.feed_capacity),
            groups: Vec::new(),
            history: VecDeque::new(),
            last_error: None,
        };

        Self {
            config,
            user,
            store,
            generator,
            cache: None,
            state: RwLock::new(state),
            rng: Mutex::new(rng),
            in_flight: AtomicBool::new(false),
            stats: SimulationStats::new(),
        }
    }

    /// Attach a local cache and restore the cached feed, agents and history
    pub fn with_cache(mut self, cache: LocalCache) -> Self {
        let cache = cache.with_history_limit(self.config.history_capacity);
        let state = self.state.get_mut();

        state.agents.merge(cache.load_agents(&self.user.id));
        let cached = cache.load_feed(&self.user.id);
        if !cached.is_empty() {
            state.feed.replace_from_flat(flatten(&cached));
        }
        state.history = cache
            .load_history(&self.user.id)
            .into_iter()
            .take(self.config.history_capacity)
            .collect();

        tracing::debug!(
            dir = %cache.dir().display(),
            roots = state.feed.len(),
            "restored local cache"
        );
        self.cache = Some(cache);
        self
    }

    /// Scheduler configuration
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Session user
    pub fn user(&self) -> &User {
        &self.user
    }

    /// Tick statistics
    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    /// Whether a post/comment generation is in flight
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Last generator error, cleared by the next successful generation
    pub async fn last_error(&self) -> Option<String> {
        self.state.read().await.last_error.clone()
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> Snapshot {
        let state = self.state.read().await;
        Snapshot {
            agents: state.agents.all().to_vec(),
            feed: state.feed.roots().to_vec(),
            groups: state.groups.clone(),
            last_error: state.last_error.clone(),
        }
    }

    /// Actions authored by the user's own agents, newest first
    pub async fn history(&self) -> Vec<SocialAction> {
        self.state.read().await.history.iter().cloned().collect()
    }

    fn with_rng<R>(&self, f: impl FnOnce(&mut StdRng) -> R) -> R {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }

    // ========================================================================
    // Post / comment ticks
    // ========================================================================

    /// Run one post/comment tick.
    ///
    /// `kind` and `agent_id` force the activity kind and the acting agent.
    /// Returns [`TickOutcome::Skipped`] without doing anything if another
    /// post/comment tick is still in flight.
    pub async fn simulate_action(
        &self,
        kind: Option<ActivityKind>,
        agent_id: Option<&str>,
    ) -> TickOutcome {
        let Some(guard) = InFlight::acquire(&self.in_flight) else {
            self.stats.record_skip();
            tracing::debug!("post tick skipped: a generation is in flight");
            return TickOutcome::Skipped;
        };
        self.stats.record_tick();

        let outcome = self.run_action(kind, agent_id, None).await;
        drop(guard);

        if let TickOutcome::Inserted(action) = &outcome {
            self.persist_action(action).await;
        }
        outcome
    }

    /// Run one group discussion tick: a member of a random group posts in it
    /// or comments on one of its threads.
    pub async fn discussion_tick(&self) -> TickOutcome {
        let choice = {
            let state = self.state.read().await;
            let active: Vec<&Group> = state
                .groups
                .iter()
                .filter(|g| g.member_ids.iter().any(|m| state.agents.contains(m)))
                .collect();

            self.with_rng(|rng| {
                let group = active.choose(rng)?;
                let has_threads = !state.feed.group_roots(&group.id).is_empty();
                let kind = if !has_threads || rng.gen::<f64>() < self.config.discussion_post_probability {
                    ActivityKind::Post
                } else {
                    ActivityKind::Comment
                };
                Some(((*group).clone(), kind))
            })
        };

        let Some((group, kind)) = choice else {
            tracing::debug!("discussion tick idle: no group with known members");
            return TickOutcome::Idle("no group with known members".to_string());
        };

        let outcome = self.run_action(Some(kind), None, Some(&group)).await;
        if let TickOutcome::Inserted(action) = &outcome {
            self.persist_action(action).await;
        }
        outcome
    }

    async fn run_action(
        &self,
        kind: Option<ActivityKind>,
        agent_id: Option<&str>,
        group: Option<&Group>,
    ) -> TickOutcome {
        let plan = {
            let state = self.state.read().await;
            self.plan_action(&state, kind, agent_id, group)
        };

        match plan {
            Ok(plan) => self.execute(plan).await,
            Err(e) => {
                tracing::debug!(reason = %e, "action abandoned");
                self.stats.record_failure();
                TickOutcome::Abandoned(e.to_string())
            },
        }
    }

    /// Pick the agent, kind, parent and context for one action
    fn plan_action(
        &self,
        state: &SimState,
        kind: Option<ActivityKind>,
        forced_agent: Option<&str>,
        group: Option<&Group>,
    ) -> Result<ActionPlan> {
        let pool: Vec<&AgentProfile> = match group {
            Some(group) => group
                .member_ids
                .iter()
                .filter_map(|id| state.agents.get(id))
                .collect(),
            None => state.agents.all().iter().collect(),
        };

        let mut agent = match forced_agent {
            Some(id) => state
                .agents
                .get(id)
                .ok_or_else(|| FeedError::NoAgent(format!("unknown agent {id}")))?,
            None => self
                .with_rng(|rng| pool.choose(rng).copied())
                .ok_or_else(|| FeedError::NoAgent("no agents to act".to_string()))?,
        };

        let scope = match group {
            Some(group) => state.feed.group_actions(&group.id),
            None => state.feed.all_actions(),
        };
        let kind = kind.unwrap_or_else(|| self.roll_kind(scope.is_empty()));

        let parent = match kind {
            ActivityKind::Post => None,
            ActivityKind::Comment => {
                let recent = state
                    .feed
                    .recent_roots(self.config.recent_root_window, group.map(|g| g.id.as_str()));
                let picked = self
                    .with_rng(|rng| recent.choose(rng).map(|a| a.detached()))
                    .or_else(|| self.with_rng(|rng| scope.choose(rng).cloned()));
                Some(picked.ok_or_else(|| FeedError::NoParent("nothing to comment on".to_string()))?)
            },
            ActivityKind::Reply => Some(
                self.with_rng(|rng| scope.choose(rng).cloned())
                    .ok_or_else(|| FeedError::NoParent("nothing to reply to".to_string()))?,
            ),
        };

        // Avoid self-replies unless the agent was chosen by the caller
        if forced_agent.is_none() {
            if let Some(parent) = &parent {
                if parent.agent_id == agent.id {
                    let others: Vec<&AgentProfile> = pool
                        .iter()
                        .copied()
                        .filter(|a| a.id != parent.agent_id)
                        .collect();
                    if let Some(other) = self.with_rng(|rng| others.choose(rng).copied()) {
                        agent = other;
                    }
                }
            }
        }

        let mut recent = scope;
        recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        recent.truncate(self.config.recent_context);

        Ok(ActionPlan {
            agent: agent.clone(),
            kind,
            parent,
            recent,
            trending: self.with_rng(|rng| self.config.trending_topics.choose(rng).cloned()),
            group: group.cloned(),
        })
    }

    /// Roll the activity kind for an un-forced tick
    fn roll_kind(&self, feed_empty: bool) -> ActivityKind {
        if feed_empty {
            return ActivityKind::Post;
        }
        self.with_rng(|rng| {
            if rng.gen::<f64>() < self.config.post_probability {
                ActivityKind::Post
            } else if rng.gen::<f64>() < self.config.comment_probability {
                ActivityKind::Comment
            } else {
                ActivityKind::Reply
            }
        })
    }

    /// Generate the planned action and splice it into the feed
    async fn execute(&self, plan: ActionPlan) -> TickOutcome {
        let context = PromptContext {
            trending_topic: plan.trending.as_deref(),
            parent: plan.parent.as_ref(),
            recent: &plan.recent,
            group: plan.group.as_ref(),
        };
        let request = prompt::activity_prompt(&plan.agent, plan.kind, &context);

        let started = Instant::now();
        let raw = match self.generator.generate(&request).await {
            Ok(raw) => raw,
            Err(e) => return self.abandon(e).await,
        };
        let latency = started.elapsed();
        let response = parse_activity(&raw);
        if response.recovered {
            tracing::debug!(agent = %plan.agent.name, "generator output recovered leniently");
        }

        let mut action = SocialAction::new(
            Uuid::new_v4().simple().to_string(),
            &plan.agent.id,
            &plan.agent.name,
            response.content,
            plan.kind,
        )
        .with_tags(response.emotional_tone, response.intent);
        if let Some(parent) = &plan.parent {
            action = action.with_parent(&parent.id);
        }
        if let Some(group) = &plan.group {
            action = action.with_group(&group.id);
        }
        action.is_user_created = plan.agent.is_owned_by(&self.user.id);

        let (placement, roots) = {
            let mut state = self.state.write().await;
            let placement = state.feed.insert(action.clone());
            if action.is_user_created {
                state.history.push_front(action.clone());
                state.history.truncate(self.config.history_capacity);
            }
            state.last_error = None;
            (placement, state.feed.roots().to_vec())
        };
        self.stats.record_action(latency);

        match placement {
            Placement::Orphan => tracing::debug!(
                id = %action.id,
                parent = ?action.parent_id,
                "parent no longer in feed, action placed as root"
            ),
            _ => tracing::debug!(
                id = %action.id,
                kind = %action.kind,
                agent = %action.agent_name,
                latency_ms = latency.as_millis() as u64,
                "action inserted"
            ),
        }

        let user_id = self.user.id.clone();
        self.mirror("feed", move |cache| cache.save_feed(&user_id, &roots))
            .await;
        if action.is_user_created {
            let (user_id, entry) = (self.user.id.clone(), action.clone());
            self.mirror("history", move |cache| cache.push_history(&user_id, &entry))
                .await;
        }

        TickOutcome::Inserted(action)
    }

    async fn abandon(&self, err: FeedError) -> TickOutcome {
        let message = err.to_string();
        tracing::warn!(
            generator = self.generator.name(),
            error = %message,
            "generation failed, tick abandoned"
        );
        self.state.write().await.last_error = Some(message.clone());
        self.stats.record_failure();
        TickOutcome::Abandoned(message)
    }

    async fn persist_action(&self, action: &SocialAction) {
        if let Err(e) = self.store.save_activity(action).await {
            tracing::warn!(id = %action.id, error = %e, "failed to persist action");
        }
    }

    // ========================================================================
    // Group ticks
    // ========================================================================

    /// Run one group tick: found a new group or join an existing one
    pub async fn group_tick(&self) -> GroupOutcome {
        let roll = self.with_rng(|rng| rng.gen::<f64>());
        let group_count = self.state.read().await.groups.len();

        match choose_group_action(roll, group_count, &self.config) {
            GroupAction::Found => self.found_group().await,
            GroupAction::Join => self.join_group().await,
            GroupAction::Idle(reason) => {
                tracing::debug!(reason, "group tick idle");
                GroupOutcome::Idle(reason.to_string())
            },
        }
    }

    async fn found_group(&self) -> GroupOutcome {
        let founder = {
            let state = self.state.read().await;
            self.with_rng(|rng| state.agents.all().choose(rng).cloned())
        };
        let Some(founder) = founder else {
            return GroupOutcome::Idle("no agents to found a group".to_string());
        };

        let drafted = match self.generator.generate(&prompt::group_founding_prompt(&founder)).await {
            Ok(raw) => parse_group_draft(&raw),
            Err(e) => {
                tracing::warn!(agent = %founder.name, error = %e, "group draft generation failed");
                None
            },
        };
        let draft = drafted.unwrap_or_else(|| {
            tracing::debug!(agent = %founder.name, "using interest-derived group draft");
            GroupDraft::fallback_for(&founder)
        });
        let group = Group::found(draft, &founder, now_millis());

        {
            let mut state = self.state.write().await;
            // Another tick may have founded groups while this one generated
            if state.groups.len() >= self.config.max_groups {
                tracing::debug!("group cap reached while drafting");
                return GroupOutcome::Idle("group cap reached".to_string());
            }
            state.groups.push(group.clone());
        }
        self.stats.record_group_founded();
        tracing::info!(group = %group.name, founder = %founder.name, "group founded");

        self.persist_group(&group).await;
        GroupOutcome::Founded(group)
    }

    async fn join_group(&self) -> GroupOutcome {
        let joined = {
            let mut state = self.state.write().await;
            let SimState { agents, groups, .. } = &mut *state;

            self.with_rng(|rng| {
                let agent = agents.all().choose(rng)?;
                let candidates: Vec<String> = joinable_groups(agent, groups)
                    .into_iter()
                    .map(|g| g.id.clone())
                    .collect();
                let target = candidates.choose(rng)?;
                let group = groups.iter_mut().find(|g| &g.id == target)?;
                group
                    .add_member(&agent.id)
                    .then(|| (group.clone(), agent.id.clone()))
            })
        };

        let Some((group, agent_id)) = joined else {
            tracing::debug!("group tick idle: picked agent has no joinable group");
            return GroupOutcome::Idle("no joinable group".to_string());
        };
        self.stats.record_group_joined();
        tracing::info!(group = %group.name, agent = %agent_id, "agent joined group");

        self.persist_group(&group).await;
        GroupOutcome::Joined {
            group_id: group.id,
            agent_id,
        }
    }

    async fn persist_group(&self, group: &Group) {
        if let Err(e) = self.store.save_group(group).await {
            tracing::warn!(group = %group.id, error = %e, "failed to persist group");
        }
    }

    // ========================================================================
    // Agents
    // ========================================================================

    /// Create an agent owned by the session user
    pub async fn create_agent(&self, draft: ProfileDraft) -> Result<AgentProfile> {
        if !draft.is_usable() {
            return Err(FeedError::InvalidInput("agent name is required".to_string()));
        }
        let agent = self.with_rng(|rng| AgentProfile::from_draft(draft, &self.user.id, rng));

        let agents = {
            let mut state = self.state.write().await;
            state.agents.insert(agent.clone());
            state.agents.all().to_vec()
        };
        self.mirror_agents(agents).await;

        if let Err(e) = self.store.save_agent(&agent).await {
            tracing::warn!(agent = %agent.id, error = %e, "failed to persist agent");
        }
        tracing::info!(agent = %agent.name, id = %agent.id, "agent created");
        Ok(agent)
    }

    /// Draft a profile from a free-text description
    pub async fn generate_profile(&self, description: &str) -> Result<ProfileDraft> {
        let raw = self
            .generator
            .generate(&prompt::profile_prompt(description))
            .await?;
        parse_profile_draft(&raw)
            .ok_or_else(|| FeedError::Generation("generator returned no usable profile".to_string()))
    }

    async fn mirror_agents(&self, agents: Vec<AgentProfile>) {
        let user_id = self.user.id.clone();
        self.mirror("agents", move |cache| cache.save_agents(&user_id, &agents))
            .await;
    }

    /// Run one cache write on the blocking pool; failures are only logged
    async fn mirror<F>(&self, what: &'static str, write: F)
    where
        F: FnOnce(&LocalCache) -> Result<()> + Send + 'static,
    {
        let Some(cache) = self.cache.clone() else {
            return;
        };
        match tokio::task::spawn_blocking(move || write(&cache)).await {
            Ok(Ok(())) => {},
            Ok(Err(e)) => tracing::warn!(error = %e, "failed to mirror {what} to cache"),
            Err(e) => tracing::warn!(error = %e, "cache writer for {what} did not finish"),
        }
    }

    // ========================================================================
    // Refresh
    // ========================================================================

    /// Re-fetch agents, feed and groups and merge them into local state.
    ///
    /// Fetch failures count as empty results. Records are deduplicated by id
    /// with remote values winning over local ones.
    pub async fn refresh(&self) {
        let (agents, feed, groups) = tokio::join!(
            self.store.fetch_agents(),
            self.store.fetch_feed(),
            self.store.fetch_groups()
        );
        let remote_agents = or_empty("agents", agents);
        let remote_feed = or_empty("feed", feed);
        let remote_groups = or_empty("groups", groups);
        let cached_agents = match self.cache.clone() {
            Some(cache) => {
                let user_id = self.user.id.clone();
                tokio::task::spawn_blocking(move || cache.load_agents(&user_id))
                    .await
                    .unwrap_or_default()
            },
            None => Vec::new(),
        };

        let (roots, agents) = {
            let mut state = self.state.write().await;

            let owned: Vec<AgentProfile> = state
                .agents
                .owned_by(&self.user.id)
                .into_iter()
                .cloned()
                .collect();
            let mut registry = AgentRegistry::new();
            registry.merge(cached_agents);
            registry.merge(owned);
            registry.merge(remote_agents);
            state.agents = registry;

            let mut records = state.feed.all_actions();
            records.extend(remote_feed);
            state.feed.replace_from_flat(merge_by_id(records));

            let mut groups = std::mem::take(&mut state.groups);
            groups.extend(remote_groups);
            state.groups = merge_by_id(groups);

            tracing::debug!(
                agents = state.agents.len(),
                roots = state.feed.len(),
                groups = state.groups.len(),
                "refreshed from store"
            );
            (state.feed.roots().to_vec(), state.agents.all().to_vec())
        };

        let user_id = self.user.id.clone();
        self.mirror("feed", move |cache| cache.save_feed(&user_id, &roots))
            .await;
        self.mirror_agents(agents).await;
    }
}

fn or_empty<T>(what: &str, result: Result<Vec<T>>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to fetch {what}, continuing with none");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::GenerationRequest;
    use crate::sync::{FeedStore, MemoryStore};
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl ActivityGenerator for Echo {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
            Ok(r#"{"content": "hello grid", "emotional_tone": "calm", "intent": "greet"}"#.to_string())
        }

        fn name(&self) -> &'static str {
            "echo"
        }
    }

    fn simulation() -> Simulation {
        let config = SimulationConfig {
            seed: Some(42),
            ..Default::default()
        };
        Simulation::new(
            config,
            User::from_id("node_test00001"),
            Arc::new(MemoryStore::new()),
            Arc::new(Echo),
        )
    }

    #[tokio::test]
    async fn test_first_action_is_post() {
        let sim = simulation();
        let outcome = sim.simulate_action(None, None).await;

        let action = outcome.action().unwrap();
        assert_eq!(action.kind, ActivityKind::Post);
        assert_eq!(action.content, "hello grid");
        assert_eq!(action.emotional_tone, "calm");
        assert!(!sim.is_in_flight());
        assert_eq!(sim.snapshot().await.feed.len(), 1);
    }

    #[tokio::test]
    async fn test_forced_comment_without_feed_is_abandoned() {
        let sim = simulation();
        let outcome = sim.simulate_action(Some(ActivityKind::Comment), None).await;
        assert!(matches!(outcome, TickOutcome::Abandoned(_)));
        assert_eq!(sim.stats().failures(), 1);
        // Precondition failures are not generator errors
        assert!(sim.last_error().await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_forced_agent() {
        let sim = simulation();
        let outcome = sim.simulate_action(Some(ActivityKind::Post), Some("ghost")).await;
        assert!(matches!(outcome, TickOutcome::Abandoned(reason) if reason.contains("ghost")));
    }

    #[tokio::test]
    async fn test_user_owned_agent_goes_to_history() {
        let sim = simulation();
        let agent = sim
            .create_agent(ProfileDraft {
                name: "Tide_Reader".to_string(),
                topics_of_interest: "sea, moon".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let outcome = sim.simulate_action(Some(ActivityKind::Post), Some(&agent.id)).await;
        assert!(outcome.action().unwrap().is_user_created);
        assert_eq!(sim.history().await.len(), 1);
    }

    #[tokio::test]
    async fn test_create_agent_requires_name() {
        let sim = simulation();
        let err = sim.create_agent(ProfileDraft::default()).await.unwrap_err();
        assert!(matches!(err, FeedError::InvalidInput(_)));
    }

    struct Drafter;

    #[async_trait]
    impl ActivityGenerator for Drafter {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
            Ok(r#"{"name": "Lighthouse_Keeper", "personality_traits": "grumpy", "topics_of_interest": "sea, storms"}"#
                .to_string())
        }

        fn name(&self) -> &'static str {
            "drafter"
        }
    }

    #[tokio::test]
    async fn test_generate_profile_then_create() {
        let store = Arc::new(MemoryStore::new());
        let sim = Simulation::new(
            SimulationConfig::default(),
            User::from_id("node_test00002"),
            store.clone(),
            Arc::new(Drafter),
        );

        let draft = sim.generate_profile("an old sailor who hates fog").await.unwrap();
        assert_eq!(draft.name, "Lighthouse_Keeper");
        assert_eq!(draft.topics_of_interest, "sea, storms");

        let agent = sim.create_agent(draft).await.unwrap();
        assert!(agent.is_owned_by("node_test00002"));
        let stored = store.fetch_agents().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, agent.id);
    }

    #[tokio::test]
    async fn test_generate_profile_without_name_fails() {
        let sim = simulation();
        let err = sim.generate_profile("anything").await.unwrap_err();
        assert!(matches!(err, FeedError::Generation(_)));
    }

    #[tokio::test]
    async fn test_actions_mirrored_to_cache() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache = LocalCache::new(dir.path(), 50);
        let sim = simulation().with_cache(cache.clone());

        let agent = sim
            .create_agent(ProfileDraft {
                name: "Tide_Reader".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        sim.simulate_action(Some(ActivityKind::Post), Some(&agent.id)).await;

        let user_id = "node_test00001";
        assert_eq!(cache.load_feed(user_id).len(), 1);
        assert_eq!(cache.load_history(user_id).len(), 1);
        assert_eq!(cache.load_agents(user_id)[0].id, agent.id);

        // A fresh simulation restores from the same directory
        let restored = simulation().with_cache(LocalCache::new(dir.path(), 50));
        let snapshot = restored.snapshot().await;
        assert_eq!(snapshot.feed.len(), 1);
        assert!(snapshot.agents.iter().any(|a| a.id == agent.id));
    }
}
