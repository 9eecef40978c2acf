// ── Bridge abstraction ──
//
// Full lifecycle management for one bridged OpenList server: authenticate,
// run the initial refresh, keep the sensor table polled in the background,
// and route platform action calls to the API client.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use openlist_api::{
    ArchiveQuery, Credentials, DecompressOptions, ListQuery, OpenListClient, TransportConfig,
};

use crate::command::{Action, ActionEnvelope, FileRecord};
use crate::config::BridgeConfig;
use crate::error::CoreError;
use crate::poller::{Poller, dir_poll_loop, task_poll_loop};
use crate::store::SensorStore;

const ACTION_CHANNEL_SIZE: usize = 64;

// ── BridgeState ──────────────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ── Bridge ───────────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<BridgeInner>`. Owns the client, the fixed
/// sensor table, the polling coordinator, and the action channel.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<BridgeInner>,
}

struct BridgeInner {
    config: BridgeConfig,
    client: Arc<OpenListClient>,
    store: Arc<SensorStore>,
    poller: Arc<Poller>,
    state: watch::Sender<BridgeState>,
    // Retained so the watch channel stays open; without a live receiver
    // `state.send` fails silently and state transitions are discarded.
    _state_rx: watch::Receiver<BridgeState>,
    action_tx: mpsc::Sender<ActionEnvelope>,
    action_rx: Mutex<Option<mpsc::Receiver<ActionEnvelope>>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Bridge {
    /// Create a new Bridge from configuration. Does NOT connect --
    /// call [`connect()`](Self::connect) to authenticate and start the
    /// background tasks.
    pub fn new(config: BridgeConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: config.tls.clone(),
            timeout: config.timeout,
        };
        let client = Arc::new(OpenListClient::new(
            config.url.clone(),
            config.auth.clone(),
            &transport,
        )?);

        let track_dirs = config.unique_track_dirs();
        let store = Arc::new(SensorStore::new(&track_dirs));
        let poller = Arc::new(Poller::new(
            Arc::clone(&client),
            Arc::clone(&store),
            track_dirs,
        ));

        let (state, state_rx) = watch::channel(BridgeState::Disconnected);
        let (action_tx, action_rx) = mpsc::channel(ACTION_CHANNEL_SIZE);

        Ok(Self {
            inner: Arc::new(BridgeInner {
                config,
                client,
                store,
                poller,
                state,
                _state_rx: state_rx,
                action_tx,
                action_rx: Mutex::new(Some(action_rx)),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Access the bridge configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// Access the sensor table.
    pub fn store(&self) -> &Arc<SensorStore> {
        &self.inner.store
    }

    // ── Connection lifecycle ─────────────────────────────────────────

    /// Connect to the server.
    ///
    /// Authenticates, performs an immediate refresh of every sensor
    /// target, and spawns the background tasks (poll loops, action
    /// processor).
    pub async fn connect(&self) -> Result<(), CoreError> {
        let _ = self.inner.state.send(BridgeState::Connecting);

        if let Err(e) = self.inner.client.login().await {
            let _ = self.inner.state.send(BridgeState::Failed);
            return Err(e.into());
        }

        // API keys skip login, so probe /api/me to catch a bad key here
        // rather than on the first poll.
        if matches!(self.inner.config.auth, Credentials::ApiKey { .. }) {
            if let Err(e) = self.inner.client.verify().await {
                let _ = self.inner.state.send(BridgeState::Failed);
                return Err(e.into());
            }
        }
        debug!("authentication successful");

        // Initial data load -- failures land as unavailable sensors, they
        // do not abort the connect.
        self.inner.poller.poll_directories_once().await;
        self.inner.poller.poll_tasks_once().await;

        // Spawn background tasks
        let mut handles = self.inner.task_handles.lock().await;

        if let Some(rx) = self.inner.action_rx.lock().await.take() {
            let bridge = self.clone();
            handles.push(tokio::spawn(action_processor_task(bridge, rx)));
        }

        let dir_secs = self.inner.config.dir_poll_interval_secs;
        if dir_secs > 0 {
            handles.push(tokio::spawn(dir_poll_loop(
                Arc::clone(&self.inner.poller),
                dir_secs,
                self.inner.cancel.clone(),
            )));
        }

        let task_secs = self.inner.config.task_poll_interval_secs;
        if task_secs > 0 {
            handles.push(tokio::spawn(task_poll_loop(
                Arc::clone(&self.inner.poller),
                task_secs,
                self.inner.cancel.clone(),
            )));
        }

        let _ = self.inner.state.send(BridgeState::Connected);
        info!(sensors = self.inner.store.len(), "bridge connected");
        Ok(())
    }

    /// Shut the bridge down.
    ///
    /// Cancels background tasks (abandoning any in-flight poll cycle
    /// before it publishes), drops the session, and resets the state to
    /// [`Disconnected`](BridgeState::Disconnected).
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        self.inner.client.clear_session().await;
        let _ = self.inner.state.send(BridgeState::Disconnected);
        debug!("bridge shut down");
    }

    // ── Action execution ─────────────────────────────────────────────

    /// Execute a typed action against the server.
    ///
    /// Sends the action through the internal channel to the processor
    /// task and awaits the result.
    pub async fn execute(&self, action: Action) -> Result<Value, CoreError> {
        if *self.inner.state.borrow() != BridgeState::Connected {
            return Err(CoreError::BridgeDisconnected);
        }

        let (tx, rx) = tokio::sync::oneshot::channel();

        self.inner
            .action_tx
            .send(ActionEnvelope {
                action,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::BridgeDisconnected)?;

        rx.await.map_err(|_| CoreError::BridgeDisconnected)?
    }

    /// Parse and execute a named platform action call in one step.
    ///
    /// This is the surface the platform's service registration binds to:
    /// a name plus a loosely-typed parameter object.
    pub async fn call(&self, name: &str, params: &Value) -> Result<Value, CoreError> {
        let action = Action::parse(name, params)?;
        self.execute(action).await
    }

    // ── State observation ────────────────────────────────────────────

    /// Subscribe to bridge state changes.
    pub fn state(&self) -> watch::Receiver<BridgeState> {
        self.inner.state.subscribe()
    }

    /// Current snapshot of every sensor.
    pub fn sensors_snapshot(&self) -> Arc<Vec<Arc<crate::store::SensorState>>> {
        self.inner.store.snapshot()
    }

    /// Subscribe to sensor snapshot changes.
    pub fn subscribe_sensors(
        &self,
    ) -> watch::Receiver<Arc<Vec<Arc<crate::store::SensorState>>>> {
        self.inner.store.subscribe()
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Process actions from the mpsc channel, routing each to the
/// appropriate client call.
async fn action_processor_task(bridge: Bridge, mut rx: mpsc::Receiver<ActionEnvelope>) {
    let cancel = bridge.inner.cancel.clone();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = route_action(&bridge.inner.client, envelope.action).await;
                let _ = envelope.response_tx.send(result);
            }
        }
    }
}

// ── Action routing ───────────────────────────────────────────────────

/// Route an action to the matching client operation.
///
/// Results come back raw (mutation payloads pass through untouched) or
/// lightly shaped (`list_files` becomes ordered `FileRecord`s). Errors of
/// every kind surface to the caller -- nothing is retried or swallowed
/// here.
async fn route_action(client: &OpenListClient, action: Action) -> Result<Value, CoreError> {
    match action {
        // ── Filesystem reads ─────────────────────────────────────────
        Action::ListFiles {
            path,
            page,
            per_page,
        } => {
            let query = ListQuery {
                page: page.unwrap_or(1),
                per_page: per_page.unwrap_or(0),
                ..ListQuery::default()
            };
            let listing = client.list_files(&path, &query).await?;
            let files: Vec<FileRecord> = listing.entries().iter().map(FileRecord::from).collect();
            Ok(json!({ "total": listing.total, "files": files }))
        }

        Action::GetFileInfo { path } => shape(client.get_file_info(&path, "").await?),

        Action::SearchFiles {
            parent,
            keywords,
            scope,
        } => shape(client.search_files(&parent, &keywords, scope, 1, 20).await?),

        Action::GetDirs { path, force_root } => {
            shape(client.get_dirs(path.as_deref().unwrap_or("/"), force_root).await?)
        }

        // ── Filesystem mutations ─────────────────────────────────────
        Action::Mkdir { path } => Ok(client.mkdir(&path).await?),

        Action::Rename { path, name } => Ok(client.rename(&path, &name).await?),

        Action::BatchRename {
            src_dir,
            rename_objects,
        } => Ok(client.batch_rename(&src_dir, &rename_objects).await?),

        Action::RegexRename {
            src_dir,
            src_name_regex,
            new_name_regex,
        } => Ok(client
            .regex_rename(&src_dir, &src_name_regex, &new_name_regex)
            .await?),

        Action::MoveFiles {
            src_dir,
            dst_dir,
            names,
        } => Ok(client.move_files(&src_dir, &dst_dir, &names).await?),

        Action::RecursiveMove { src_dir, dst_dir } => {
            Ok(client.recursive_move(&src_dir, &dst_dir).await?)
        }

        Action::CopyFiles {
            src_dir,
            dst_dir,
            names,
        } => Ok(client.copy_files(&src_dir, &dst_dir, &names).await?),

        Action::RemoveFiles { dir_path, names } => {
            Ok(client.remove_files(&dir_path, &names).await?)
        }

        Action::RemoveEmptyDir { src_dir } => Ok(client.remove_empty_dir(&src_dir).await?),

        Action::AddOfflineDownload {
            path,
            urls,
            tool,
            delete_policy,
        } => Ok(client
            .add_offline_download(&path, &urls, &tool, &delete_policy)
            .await?),

        // ── Archives ─────────────────────────────────────────────────
        Action::GetArchiveMeta { path } => {
            shape(client.get_archive_meta(&path, &ArchiveQuery::default()).await?)
        }

        Action::ListArchive { path, inner_path } => shape(
            client
                .list_archive(
                    &path,
                    inner_path.as_deref().unwrap_or("/"),
                    &ArchiveQuery::default(),
                )
                .await?,
        ),

        Action::DecompressArchive {
            src_dir,
            dst_dir,
            names,
            inner_path,
        } => Ok(client
            .decompress_archive(
                &src_dir,
                &dst_dir,
                &names,
                inner_path.as_deref().unwrap_or("/"),
                &DecompressOptions::default(),
            )
            .await?),

        // ── Task queries ─────────────────────────────────────────────
        Action::GetTasks { task_type } => {
            let done = client.get_task_done(task_type).await?;
            let undone = client.get_task_undone(task_type).await?;
            Ok(json!({ "done": done, "undone": undone }))
        }

        Action::GetTaskInfo { task_type, tid } => {
            Ok(client.get_task_info(task_type, tid.as_deref()).await?)
        }

        Action::GetTaskDone { task_type } => shape(client.get_task_done(task_type).await?),

        Action::GetTaskUndone { task_type } => shape(client.get_task_undone(task_type).await?),

        // ── Task mutations ───────────────────────────────────────────
        Action::DeleteTask { task_type, tid } => Ok(client.delete_task(task_type, &tid).await?),

        Action::CancelTask { task_type, tid } => Ok(client.cancel_task(task_type, &tid).await?),

        Action::RetryTask { task_type, tid } => Ok(client.retry_task(task_type, &tid).await?),

        Action::DeleteSomeTasks { task_type, tids } => {
            Ok(client.delete_some_tasks(task_type, &tids).await?)
        }

        Action::CancelSomeTasks { task_type, tids } => {
            Ok(client.cancel_some_tasks(task_type, &tids).await?)
        }

        Action::RetrySomeTasks { task_type, tids } => {
            Ok(client.retry_some_tasks(task_type, &tids).await?)
        }

        Action::ClearDoneTasks { task_type } => Ok(client.clear_done_tasks(task_type).await?),

        Action::ClearSucceededTasks { task_type } => {
            Ok(client.clear_succeeded_tasks(task_type).await?)
        }

        Action::RetryFailedTasks { task_type } => {
            Ok(client.retry_failed_tasks(task_type).await?)
        }
    }
}

/// Serialize a typed payload back into the platform's JSON shape.
fn shape<T: Serialize>(payload: T) -> Result<Value, CoreError> {
    serde_json::to_value(payload).map_err(|e| CoreError::Internal(e.to_string()))
}
