//! Event trace replay
//!
//! Drives an engine backed by in-memory storage with a recorded sequence of
//! browser events. A trace is a JSON array, or one JSON object per line:
//!
//! ```text
//! {"event":"startup"}
//! {"event":"message","tab":7,"message":{"type":"toggleTabProxy","url":"https://a.com/"}}
//! {"event":"navigate","tab":7,"frame":0,"url":"https://b.com/"}
//! {"event":"tabRemoved","tab":7}
//! ```

use std::rc::Rc;

use serde::Deserialize;
use tokio::task::LocalSet;

use sp_compiler::StorageSnapshot;
use sp_core::memory::{MemoryProfileStore, RecordingSink, SinkEvent};
use sp_core::{Engine, FrameId, PowerState, Profile, ProfileStore, Response, TabId};

/// One recorded browser event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum TraceEvent {
    Startup,
    Message {
        #[serde(default)]
        tab: Option<TabId>,
        message: serde_json::Value,
    },
    Navigate {
        tab: TabId,
        #[serde(default)]
        frame: FrameId,
        url: String,
    },
    TabRemoved {
        tab: TabId,
    },
}

/// Parse a trace file. Blank lines and `#` comments are skipped in the
/// line-per-event form.
pub fn parse_trace(text: &str) -> Result<Vec<TraceEvent>, String> {
    if text.trim_start().starts_with('[') {
        return serde_json::from_str(text).map_err(|e| format!("Invalid trace: {}", e));
    }

    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(idx, line)| {
            serde_json::from_str(line)
                .map_err(|e| format!("Invalid event on line {}: {}", idx + 1, e))
        })
        .collect()
}

/// Outcome of a replay.
#[derive(Debug, Clone)]
pub struct ReplayReport {
    /// Responses to control messages, keyed by event index
    pub responses: Vec<(usize, Response)>,
    pub power: PowerState,
    pub override_hosts: Vec<String>,
    pub enabled_tabs: Vec<TabId>,
    pub final_event: Option<SinkEvent>,
    pub installs: usize,
    pub recomputes: u64,
}

/// Profile store that suspends once per lookup, so concurrently replayed
/// events interleave the way browser events do.
struct TraceStore {
    inner: MemoryProfileStore,
    yield_on_lookup: bool,
}

impl ProfileStore for TraceStore {
    async fn get_profile(&self, name: &str) -> Option<Profile> {
        if self.yield_on_lookup {
            tokio::task::yield_now().await;
        }
        self.inner.get_profile(name).await
    }

    async fn active_profile(&self) -> Option<String> {
        self.inner.active_profile().await
    }

    async fn proxy_enabled(&self) -> bool {
        self.inner.proxy_enabled().await
    }
}

type TraceEngine = Engine<TraceStore, RecordingSink>;

/// Replay `events` against `storage`. With `concurrent`, every event runs as
/// its own task and handlers interleave at profile lookups.
pub fn replay(
    storage: StorageSnapshot,
    events: Vec<TraceEvent>,
    concurrent: bool,
) -> Result<ReplayReport, String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start tokio runtime: {}", e))?;

    let local = LocalSet::new();
    local.block_on(&runtime, run(storage, events, concurrent))
}

async fn run(
    storage: StorageSnapshot,
    events: Vec<TraceEvent>,
    concurrent: bool,
) -> Result<ReplayReport, String> {
    let store = MemoryProfileStore::new();
    for profile in storage.profiles {
        store.insert(profile);
    }
    store.set_active(storage.active_profile.as_deref());
    store.set_enabled(storage.proxy_enabled);

    let engine = Rc::new(Engine::new(
        TraceStore {
            inner: store,
            yield_on_lookup: concurrent,
        },
        RecordingSink::new(),
    ));

    let mut responses = Vec::new();
    if concurrent {
        let handles: Vec<_> = events
            .into_iter()
            .enumerate()
            .map(|(idx, event)| {
                let engine = Rc::clone(&engine);
                tokio::task::spawn_local(async move { (idx, apply(&engine, event).await) })
            })
            .collect();

        for handle in handles {
            let (idx, response) = handle
                .await
                .map_err(|e| format!("Replay task failed: {}", e))?;
            if let Some(response) = response {
                responses.push((idx, response));
            }
        }
    } else {
        for (idx, event) in events.into_iter().enumerate() {
            if let Some(response) = apply(&engine, event).await {
                responses.push((idx, response));
            }
        }
    }

    let mut enabled_tabs: Vec<TabId> = engine.with_tabs(|tabs| tabs.enabled_tabs().collect());
    enabled_tabs.sort_unstable();

    Ok(ReplayReport {
        responses,
        power: engine.power(),
        override_hosts: engine.override_hosts(),
        enabled_tabs,
        final_event: engine.sink().last(),
        installs: engine.sink().install_count(),
        recomputes: engine.generation(),
    })
}

async fn apply(engine: &TraceEngine, event: TraceEvent) -> Option<Response> {
    log::debug!("replay: {event:?}");
    match event {
        TraceEvent::Startup => {
            engine.startup().await;
            None
        }
        TraceEvent::Message { tab, message } => {
            Some(engine.handle_json(&message.to_string(), tab).await)
        }
        TraceEvent::Navigate { tab, frame, url } => {
            engine.on_navigation_committed(tab, frame, &url).await;
            None
        }
        TraceEvent::TabRemoved { tab } => {
            engine.on_tab_removed(tab).await;
            None
        }
    }
}
