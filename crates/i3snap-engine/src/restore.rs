//! Restore reconciliation.
//!
//! Per workspace, in document order:
//! switch → apply layout → launch → poll for windows → remove placeholders.
//!
//! Neither `append_layout` nor a process launch tells us when a window has
//! landed in its placeholder, so the engine polls the tree for a bounded
//! time and then cleans up whatever is still unswallowed. Failures before
//! launch abort only the current workspace; failures after it are logged
//! and ignored.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use i3snap_core::{
    ExclusionRules, ROOT_WORKSPACE_NAME, Snapshot, WindowRef, WorkspaceSnapshot, project_children,
};
use i3snap_sys::{CommandRunner, SysError, TreeNode, TreeSource, quote_arg};
use thiserror::Error;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task::JoinSet;
use tokio::time::{Instant, sleep, timeout};

use crate::launch::{LaunchSpec, Launcher};
use crate::stage::{StageError, StagedLayout};

// ─── Timing ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreTiming {
    /// Pause after switching workspace; i3 gives no completion signal.
    pub switch_settle: Duration,
    /// Pause after `append_layout` so placeholders exist before launch.
    pub layout_settle: Duration,
    pub poll_interval: Duration,
    /// Upper bound on waiting for launched windows to appear.
    pub window_timeout: Duration,
    /// How long to wait for all launches to at least start.
    pub launch_grace: Duration,
    /// Pause after every expected window is seen, before cleanup.
    pub match_settle: Duration,
}

impl Default for RestoreTiming {
    fn default() -> Self {
        Self {
            switch_settle: Duration::from_millis(200),
            layout_settle: Duration::from_millis(200),
            poll_interval: Duration::from_millis(200),
            window_timeout: Duration::from_secs(10),
            launch_grace: Duration::from_secs(2),
            match_settle: Duration::from_millis(500),
        }
    }
}

// ─── Errors and report ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestorePhase {
    Switch,
    Stage,
    ApplyLayout,
}

impl fmt::Display for RestorePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Switch => "switch",
            Self::Stage => "stage",
            Self::ApplyLayout => "apply layout",
        })
    }
}

/// A failure that aborts one workspace's restore.
#[derive(Debug, Error)]
pub enum RestoreError {
    #[error("cannot switch workspace: {0}")]
    Switch(#[source] SysError),

    #[error(transparent)]
    Stage(#[from] StageError),

    #[error("append_layout rejected: {0}")]
    ApplyLayout(#[source] SysError),
}

impl RestoreError {
    pub fn phase(&self) -> RestorePhase {
        match self {
            Self::Switch(_) => RestorePhase::Switch,
            Self::Stage(_) => RestorePhase::Stage,
            Self::ApplyLayout(_) => RestorePhase::ApplyLayout,
        }
    }
}

#[derive(Debug)]
pub enum WorkspaceOutcome {
    Skipped {
        reason: String,
    },
    Failed {
        phase: RestorePhase,
        error: RestoreError,
    },
    Restored {
        launched: usize,
        launch_failures: usize,
        /// Launches not yet returned when the launch grace ran out.
        still_starting: usize,
        /// Matching windows seen on the workspace at the last poll.
        matched: usize,
        expected: usize,
        timed_out: bool,
        moved: usize,
        placeholders_removed: usize,
    },
}

impl WorkspaceOutcome {
    fn failed(error: RestoreError) -> Self {
        Self::Failed {
            phase: error.phase(),
            error,
        }
    }
}

#[derive(Debug)]
pub struct WorkspaceReport {
    pub name: String,
    pub outcome: WorkspaceOutcome,
}

impl fmt::Display for WorkspaceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            WorkspaceOutcome::Skipped { reason } => {
                write!(f, "workspace {:?}: skipped ({reason})", self.name)
            }
            WorkspaceOutcome::Failed { phase, error } => {
                write!(f, "workspace {:?}: failed at {phase}: {error}", self.name)
            }
            WorkspaceOutcome::Restored {
                launched,
                launch_failures,
                still_starting,
                matched,
                expected,
                timed_out,
                moved,
                placeholders_removed,
            } => {
                write!(
                    f,
                    "workspace {:?}: {matched}/{expected} windows, {launched} launched",
                    self.name
                )?;
                if *still_starting > 0 {
                    write!(f, ", {still_starting} still starting")?;
                }
                if *launch_failures > 0 {
                    write!(f, ", {launch_failures} failed to launch")?;
                }
                if *moved > 0 {
                    write!(f, ", {moved} moved in")?;
                }
                if *placeholders_removed > 0 {
                    write!(f, ", {placeholders_removed} placeholders removed")?;
                }
                if *timed_out {
                    f.write_str(" (timed out)")?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug)]
pub struct RestoreReport {
    pub snapshot: String,
    /// One entry per snapshot workspace, in document order.
    pub workspaces: Vec<WorkspaceReport>,
}

impl RestoreReport {
    pub fn has_failures(&self) -> bool {
        self.workspaces
            .iter()
            .any(|w| matches!(w.outcome, WorkspaceOutcome::Failed { .. }))
    }
}

// ─── Engine ───────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Launches {
    started: usize,
    failed: usize,
    pending: usize,
}

#[derive(Debug, Default)]
struct Progress {
    matched: usize,
    moved: usize,
    timed_out: bool,
}

pub struct Restorer<T, C, L> {
    tree: T,
    commands: C,
    launcher: Arc<L>,
    rules: ExclusionRules,
    timing: RestoreTiming,
    stage_dir: Option<PathBuf>,
}

impl<T, C, L> Restorer<T, C, L>
where
    T: TreeSource,
    C: CommandRunner,
    L: Launcher + 'static,
{
    pub fn new(tree: T, commands: C, launcher: L) -> Self {
        Self {
            tree,
            commands,
            launcher: Arc::new(launcher),
            rules: ExclusionRules::default(),
            timing: RestoreTiming::default(),
            stage_dir: None,
        }
    }

    #[must_use]
    pub fn with_rules(mut self, rules: ExclusionRules) -> Self {
        self.rules = rules;
        self
    }

    #[must_use]
    pub fn with_timing(mut self, timing: RestoreTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Stage layouts under `dir` instead of the system temp directory.
    #[must_use]
    pub fn with_stage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.stage_dir = Some(dir.into());
        self
    }

    /// Restore every workspace of `snapshot`, one after another.
    pub async fn restore(&self, snapshot: &Snapshot) -> RestoreReport {
        let mut workspaces = Vec::with_capacity(snapshot.workspaces.len());
        for ws in &snapshot.workspaces {
            let outcome = self.restore_workspace(ws).await;
            let report = WorkspaceReport {
                name: ws.name.clone(),
                outcome,
            };
            match report.outcome {
                WorkspaceOutcome::Failed { .. } => tracing::warn!("{report}"),
                _ => tracing::info!("{report}"),
            }
            workspaces.push(report);
        }
        RestoreReport {
            snapshot: snapshot.name.clone(),
            workspaces,
        }
    }

    async fn restore_workspace(&self, ws: &WorkspaceSnapshot) -> WorkspaceOutcome {
        if let Some(reason) = skip_reason(ws) {
            return WorkspaceOutcome::Skipped { reason };
        }
        if let Err(e) = self.prepare(ws).await {
            return WorkspaceOutcome::failed(e);
        }

        let expected: Vec<&WindowRef> = ws.launchable().collect();
        let launches = self.launch_all(&expected).await;
        let progress = self.reconcile(&ws.name, &expected).await;
        // An empty leaf on a workspace that expects nothing may be the
        // user's own split container.
        let placeholders_removed = if expected.is_empty() {
            0
        } else {
            blocking(|| self.remove_placeholders(&ws.name))
        };

        WorkspaceOutcome::Restored {
            launched: launches.started,
            launch_failures: launches.failed,
            still_starting: launches.pending,
            matched: progress.matched,
            expected: expected.len(),
            timed_out: progress.timed_out,
            moved: progress.moved,
            placeholders_removed,
        }
    }

    /// Switch to the workspace and, if it had any containers, append its layout.
    async fn prepare(&self, ws: &WorkspaceSnapshot) -> Result<(), RestoreError> {
        tracing::info!("restoring workspace {:?}", ws.name);
        let switch = format!("workspace {}", quote_arg(&ws.name));
        blocking(|| self.commands.run_command(&switch)).map_err(RestoreError::Switch)?;
        sleep(self.timing.switch_settle).await;

        if ws.root.is_leaf() {
            tracing::debug!("workspace {:?} is empty, no layout to apply", ws.name);
            return Ok(());
        }

        let layout = project_children(&ws.root, &self.rules);
        let staged = match &self.stage_dir {
            Some(dir) => StagedLayout::write_in(dir, &layout)?,
            None => StagedLayout::write(&layout)?,
        };
        let apply = format!(
            "append_layout {}",
            quote_arg(&staged.path().to_string_lossy())
        );
        let applied = blocking(|| self.commands.run_command(&apply));
        // i3 has read the file by the time the command returns.
        drop(staged);
        applied.map_err(RestoreError::ApplyLayout)?;

        sleep(self.timing.layout_settle).await;
        Ok(())
    }

    /// Start every expected window's process concurrently and wait up to the
    /// launch grace for them to start.
    async fn launch_all(&self, expected: &[&WindowRef]) -> Launches {
        let mut set = JoinSet::new();
        let mut launches = Launches::default();
        for window in expected {
            let Some(spec) = LaunchSpec::from_window(window) else {
                launches.failed += 1;
                continue;
            };
            let launcher = Arc::clone(&self.launcher);
            set.spawn_blocking(move || {
                let result = launcher.launch(&spec);
                (spec, result)
            });
        }

        let joined = timeout(self.timing.launch_grace, async {
            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok((spec, Ok(pid))) => {
                        launches.started += 1;
                        tracing::debug!("launched {} (pid {pid})", spec.program);
                    }
                    Ok((spec, Err(e))) => {
                        launches.failed += 1;
                        tracing::warn!("failed to launch {}: {e}", spec.program);
                    }
                    Err(e) => {
                        launches.failed += 1;
                        tracing::warn!("launch task failed: {e}");
                    }
                }
            }
        })
        .await;

        if joined.is_err() {
            launches.pending = set.len();
            tracing::warn!(
                "{} launch(es) still starting after {:?}, continuing",
                launches.pending,
                self.timing.launch_grace
            );
            // Launched processes must keep running; never abort them.
            set.detach_all();
        }
        launches
    }

    /// Poll until every expected window is on the workspace or the window
    /// timeout passes. Matching windows found on other workspaces are
    /// moved over on each tick.
    async fn reconcile(&self, workspace: &str, expected: &[&WindowRef]) -> Progress {
        let mut progress = Progress::default();
        let target = expected.len();
        if target == 0 {
            return progress;
        }

        let deadline = Instant::now() + self.timing.window_timeout;
        loop {
            match blocking(|| self.tree.get_tree()) {
                Ok(tree) => {
                    if let Some(ws) = tree.find_workspace(workspace) {
                        progress.moved +=
                            blocking(|| self.pull_misplaced(&tree, workspace, expected));
                        progress.matched = count_matches(ws, expected);
                        if progress.matched >= target {
                            tracing::info!("all {target} window(s) present on {workspace:?}");
                            sleep(self.timing.match_settle).await;
                            return progress;
                        }
                    } else {
                        tracing::debug!("workspace {workspace:?} not in tree yet");
                    }
                }
                Err(e) => tracing::debug!("tree poll failed: {e}"),
            }

            if Instant::now() >= deadline {
                tracing::warn!(
                    "timed out on {workspace:?} with {}/{target} window(s)",
                    progress.matched
                );
                progress.timed_out = true;
                return progress;
            }
            sleep(self.timing.poll_interval).await;
        }
    }

    /// Move expected windows that opened on another workspace. Returns the
    /// number of move commands i3 accepted.
    fn pull_misplaced(&self, tree: &TreeNode, workspace: &str, expected: &[&WindowRef]) -> usize {
        let mut moved = 0;
        for other in tree.workspaces().into_iter().filter(|w| w.name != workspace) {
            for node in other.windows() {
                if !matches_any(node, expected) {
                    continue;
                }
                let Some(id) = node.window_id() else {
                    continue;
                };
                let command = format!(
                    "[id=\"{id}\"] move container to workspace {}",
                    quote_arg(workspace)
                );
                match self.commands.run_command(&command) {
                    Ok(()) => {
                        moved += 1;
                        tracing::info!(
                            "moved window {id:#x} ({}) from {:?} to {workspace:?}",
                            node.class(),
                            other.name
                        );
                    }
                    Err(e) => tracing::warn!("moving window {id:#x} failed, ignoring: {e}"),
                }
            }
        }
        moved
    }

    /// Kill every empty leaf container left on the workspace, last found
    /// first. Returns the number of kills i3 accepted.
    fn remove_placeholders(&self, workspace: &str) -> usize {
        let tree = match self.tree.get_tree() {
            Ok(tree) => tree,
            Err(e) => {
                tracing::warn!("cannot read tree for cleanup, skipping: {e}");
                return 0;
            }
        };
        let Some(ws) = tree.find_workspace(workspace) else {
            tracing::debug!("workspace {workspace:?} gone before cleanup");
            return 0;
        };

        let ids: Vec<u64> = ws.empty_leaves().iter().map(|n| n.id).collect();
        let mut removed = 0;
        for id in ids.into_iter().rev() {
            match self.commands.run_command(&format!("[con_id=\"{id}\"] kill")) {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!("removing placeholder {id} failed, ignoring: {e}"),
            }
        }
        if removed > 0 {
            tracing::info!("removed {removed} unswallowed placeholder(s) from {workspace:?}");
        }
        removed
    }
}

/// Run a synchronous i3 round trip without stalling the other tasks of a
/// multi-threaded runtime. A current-thread runtime has nothing to hand
/// its worker to, so the call runs inline there.
fn blocking<R>(f: impl FnOnce() -> R) -> R {
    match Handle::try_current() {
        Ok(handle) if matches!(handle.runtime_flavor(), RuntimeFlavor::MultiThread) => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

fn skip_reason(ws: &WorkspaceSnapshot) -> Option<String> {
    if ws.is_restorable() {
        return None;
    }
    Some(if ws.name.is_empty() {
        "unnamed workspace".to_string()
    } else if ws.name == ROOT_WORKSPACE_NAME {
        "tree root".to_string()
    } else {
        "internal workspace".to_string()
    })
}

fn matches_any(node: &TreeNode, expected: &[&WindowRef]) -> bool {
    expected
        .iter()
        .any(|w| w.matches(node.class(), node.instance()))
}

/// Real windows on `workspace` matching any expected window.
fn count_matches(workspace: &TreeNode, expected: &[&WindowRef]) -> usize {
    workspace
        .windows()
        .into_iter()
        .filter(|n| matches_any(n, expected))
        .count()
}
