//! End-to-end simulation tests.
//!
//! These drive a full `Simulation` against the in-memory store with scripted
//! generators, covering tick gating, tree placement, error reporting, group
//! membership, group discussions and feed retention.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use neuralnet::config::SimulationConfig;
use neuralnet::error::{FeedError, Result};
use neuralnet::feed::{ActivityKind, SocialAction};
use neuralnet::generator::prompt::GROUP_INSTRUCTION;
use neuralnet::generator::{ActivityGenerator, GenerationRequest};
use neuralnet::groups::Group;
use neuralnet::simulation::{GroupOutcome, Simulation, TickOutcome};
use neuralnet::sync::{FeedStore, HttpSyncClient, MemoryStore, User};
use tokio::sync::Notify;

const ACTIVITY_JSON: &str =
    r#"{"content": "packets drift like snow", "emotional_tone": "calm", "intent": "share"}"#;
const GROUP_JSON: &str =
    r#"{"name": "Quiet Circuits", "description": "Low-noise talk", "topics": ["systems"]}"#;

/// Always answers with a fixed activity
struct Scripted;

#[async_trait]
impl ActivityGenerator for Scripted {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        if request.system_instruction == GROUP_INSTRUCTION {
            return Ok(GROUP_JSON.to_string());
        }
        Ok(ACTIVITY_JSON.to_string())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Holds activity generations until released; group drafts answer at once
struct Gated {
    release: Arc<Notify>,
}

#[async_trait]
impl ActivityGenerator for Gated {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        if request.system_instruction == GROUP_INSTRUCTION {
            return Ok(GROUP_JSON.to_string());
        }
        self.release.notified().await;
        Ok(ACTIVITY_JSON.to_string())
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}

/// Fails while `failing` is set
struct Flaky {
    failing: AtomicBool,
}

#[async_trait]
impl ActivityGenerator for Flaky {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(FeedError::Upstream {
                status: 503,
                body: "model overloaded".to_string(),
            });
        }
        Ok(ACTIVITY_JSON.to_string())
    }

    fn name(&self) -> &'static str {
        "flaky"
    }
}

fn config() -> SimulationConfig {
    SimulationConfig {
        seed: Some(7),
        ..SimulationConfig::default()
    }
}

fn user() -> User {
    User::from_id("node_tester001")
}

fn group(id: &str, topics: &[&str], members: &[&str]) -> Group {
    Group {
        id: id.to_string(),
        name: format!("Group {id}"),
        description: String::new(),
        created_by: members[0].to_string(),
        creator_name: members[0].to_string(),
        topics: topics.iter().map(|t| t.to_string()).collect(),
        member_ids: members.iter().map(|m| m.to_string()).collect(),
        created_at: 1_000,
    }
}

fn post(id: &str, agent_id: &str, timestamp: i64) -> SocialAction {
    SocialAction::new(id, agent_id, agent_id, format!("post {id}"), ActivityKind::Post)
        .with_timestamp(timestamp)
}

/// Test a post tick is dropped while another generation is in flight,
/// while group ticks keep running
#[tokio::test]
async fn test_busy_post_tick_is_skipped() {
    let release = Arc::new(Notify::new());
    let generator = Arc::new(Gated {
        release: release.clone(),
    });
    let config = SimulationConfig {
        found_group_probability: 1.0,
        ..config()
    };
    let sim = Arc::new(Simulation::new(
        config,
        user(),
        Arc::new(MemoryStore::new()),
        generator,
    ));

    let first = tokio::spawn({
        let sim = sim.clone();
        async move { sim.simulate_action(Some(ActivityKind::Post), None).await }
    });
    while !sim.is_in_flight() {
        tokio::task::yield_now().await;
    }

    // Second post tick is dropped, not queued
    let second = sim.simulate_action(None, None).await;
    assert!(second.is_skipped());
    assert_eq!(sim.stats().skipped(), 1);

    // Group ticks are not gated
    let group = sim.group_tick().await;
    assert!(matches!(group, GroupOutcome::Founded(_)));

    release.notify_one();
    let outcome = first.await.unwrap();
    let action = outcome.action().expect("first tick should insert");
    assert_eq!(action.content, "packets drift like snow");
    assert!(!sim.is_in_flight());

    let snapshot = sim.snapshot().await;
    assert_eq!(snapshot.feed.len(), 1);
    assert_eq!(snapshot.groups.len(), 1);
}

/// Test a comment lands under its parent post
#[tokio::test]
async fn test_comment_attaches_to_post() {
    let store = Arc::new(MemoryStore::new());
    store.save_activity(&post("p1", "c1", 1_000)).await.unwrap();

    let sim = Simulation::new(config(), user(), store.clone(), Arc::new(Scripted));
    sim.refresh().await;

    let outcome = sim
        .simulate_action(Some(ActivityKind::Comment), Some("c2"))
        .await;
    let comment = outcome.action().expect("comment should be inserted").clone();
    assert_eq!(comment.parent_id.as_deref(), Some("p1"));
    assert_eq!(comment.agent_id, "c2");

    let snapshot = sim.snapshot().await;
    assert_eq!(snapshot.feed.len(), 1);
    assert_eq!(snapshot.feed[0].id, "p1");
    assert_eq!(snapshot.feed[0].replies.len(), 1);
    assert_eq!(snapshot.feed[0].replies[0].id, comment.id);

    // Persisted flat, after the tick
    let stored = store.fetch_feed().await.unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|a| a.replies.is_empty()));
}

/// Test a generator failure is reported and cleared by the next success
#[tokio::test]
async fn test_generator_failure_sets_last_error() {
    let generator = Arc::new(Flaky {
        failing: AtomicBool::new(true),
    });
    let sim = Simulation::new(
        config(),
        user(),
        Arc::new(MemoryStore::new()),
        generator.clone(),
    );

    let outcome = sim.simulate_action(Some(ActivityKind::Post), None).await;
    assert!(matches!(outcome, TickOutcome::Abandoned(_)));
    let error = sim.last_error().await.expect("error should be recorded");
    assert!(error.contains("503"));
    assert!(sim.snapshot().await.feed.is_empty());
    assert_eq!(sim.stats().failures(), 1);

    generator.failing.store(false, Ordering::SeqCst);
    let outcome = sim.simulate_action(Some(ActivityKind::Post), None).await;
    assert!(outcome.action().is_some());
    assert!(sim.last_error().await.is_none());
}

/// Test repeated join ticks never add a member twice
#[tokio::test]
async fn test_join_does_not_duplicate_members() {
    let store = Arc::new(MemoryStore::new());
    let group = Group {
        id: "g1".to_string(),
        name: "Night Shift".to_string(),
        description: "Dreams and paint".to_string(),
        created_by: "c1".to_string(),
        creator_name: "Philosopher_Cat".to_string(),
        topics: vec!["dreams".to_string(), "art".to_string()],
        member_ids: vec!["c1".to_string()],
        created_at: 1_000,
    };
    store.save_group(&group).await.unwrap();

    let config = SimulationConfig {
        found_group_probability: 0.0,
        ..config()
    };
    let sim = Simulation::new(config, user(), store.clone(), Arc::new(Scripted));
    sim.refresh().await;

    for _ in 0..60 {
        sim.group_tick().await;
    }

    let snapshot = sim.snapshot().await;
    assert_eq!(snapshot.groups.len(), 1);
    assert_eq!(snapshot.groups[0].member_ids, vec!["c1", "c2"]);
    assert_eq!(sim.stats().groups_joined(), 1);

    let stored = store.fetch_groups().await.unwrap();
    assert_eq!(stored[0].member_ids, vec!["c1", "c2"]);
}

/// Test the feed keeps only the newest roots
#[tokio::test]
async fn test_feed_capacity_enforced_on_refresh() {
    let store = Arc::new(MemoryStore::new().with_feed_limit(1_000));
    for i in 1..=150 {
        store
            .save_activity(&post(&format!("p{i}"), "c1", i))
            .await
            .unwrap();
    }

    let sim = Simulation::new(config(), user(), store, Arc::new(Scripted));
    sim.refresh().await;

    let feed = sim.snapshot().await.feed;
    assert_eq!(feed.len(), 100);
    assert_eq!(feed[0].id, "p150");
    assert_eq!(feed[99].id, "p51");
}

/// Test an unreachable backend leaves the built-in agents in place
#[tokio::test]
async fn test_refresh_tolerates_unreachable_backend() {
    let store = HttpSyncClient::new("http://127.0.0.1:9", Duration::from_millis(300)).unwrap();
    let sim = Simulation::new(config(), user(), Arc::new(store), Arc::new(Scripted));

    sim.refresh().await;

    let snapshot = sim.snapshot().await;
    assert!(snapshot.agents.iter().any(|a| a.id == "sys1"));
    assert!(snapshot.feed.is_empty());

    // Ticks still work offline
    let outcome = sim.simulate_action(Some(ActivityKind::Post), None).await;
    assert!(outcome.action().is_some());
}

/// Test discussion comments stay inside the group: member authors,
/// group-scoped parents, group id carried on the action
#[tokio::test]
async fn test_discussion_comments_stay_in_group() {
    let store = Arc::new(MemoryStore::new());
    store.save_group(&group("g1", &["dreams"], &["c1", "c2"])).await.unwrap();
    store
        .save_activity(&post("pg", "c1", 1_000).with_group("g1"))
        .await
        .unwrap();
    // Newer root outside the group must never be picked as a parent
    store.save_activity(&post("po", "c3", 2_000)).await.unwrap();

    let config = SimulationConfig {
        discussion_post_probability: 0.0,
        ..config()
    };
    let sim = Simulation::new(config, user(), store.clone(), Arc::new(Scripted));
    sim.refresh().await;

    for _ in 0..10 {
        let outcome = sim.discussion_tick().await;
        let action = outcome.action().expect("discussion tick should insert");
        assert_eq!(action.kind, ActivityKind::Comment);
        assert_eq!(action.group_id.as_deref(), Some("g1"));
        assert_eq!(action.parent_id.as_deref(), Some("pg"));
        assert!(["c1", "c2"].contains(&action.agent_id.as_str()));
    }

    let snapshot = sim.snapshot().await;
    let thread = snapshot.feed.iter().find(|r| r.id == "pg").unwrap();
    assert_eq!(thread.replies.len(), 10);
    let outside = snapshot.feed.iter().find(|r| r.id == "po").unwrap();
    assert!(outside.replies.is_empty());
}

/// Test a group without threads gets a first post
#[tokio::test]
async fn test_discussion_opens_thread_in_empty_group() {
    let store = Arc::new(MemoryStore::new());
    store.save_group(&group("g1", &["art"], &["c2"])).await.unwrap();

    let sim = Simulation::new(config(), user(), store, Arc::new(Scripted));
    sim.refresh().await;

    let outcome = sim.discussion_tick().await;
    let action = outcome.action().expect("discussion tick should insert");
    assert_eq!(action.kind, ActivityKind::Post);
    assert_eq!(action.agent_id, "c2");
    assert_eq!(action.group_id.as_deref(), Some("g1"));
    assert!(action.parent_id.is_none());
}

/// Test a discussion tick without groups does nothing
#[tokio::test]
async fn test_discussion_without_groups_is_idle() {
    let sim = Simulation::new(config(), user(), Arc::new(MemoryStore::new()), Arc::new(Scripted));

    let outcome = sim.discussion_tick().await;
    assert!(matches!(outcome, TickOutcome::Idle(_)));
    assert!(sim.snapshot().await.feed.is_empty());
    assert_eq!(sim.stats().failures(), 0);
}

/// Test discussion ticks ignore the in-flight flag
#[tokio::test]
async fn test_discussion_not_gated_by_post_tick() {
    let store = Arc::new(MemoryStore::new());
    store.save_group(&group("g1", &["art"], &["c2"])).await.unwrap();

    let release = Arc::new(Notify::new());
    let sim = Arc::new(Simulation::new(
        config(),
        user(),
        store,
        Arc::new(Gated {
            release: release.clone(),
        }),
    ));
    sim.refresh().await;

    let post_tick = tokio::spawn({
        let sim = sim.clone();
        async move { sim.simulate_action(Some(ActivityKind::Post), None).await }
    });
    while !sim.is_in_flight() {
        tokio::task::yield_now().await;
    }

    let discussion = tokio::spawn({
        let sim = sim.clone();
        async move { sim.discussion_tick().await }
    });
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert!(sim.is_in_flight());

    // Both generations are parked on the gate
    release.notify_waiters();

    assert!(post_tick.await.unwrap().action().is_some());
    assert!(discussion.await.unwrap().action().is_some());
    assert_eq!(sim.snapshot().await.feed.len(), 2);
}
