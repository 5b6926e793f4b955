use std::io::{IsTerminal, Write};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::RunConfig;
use crate::error::{Result, VeteError};
use crate::render::{self, Painter, Renderer, TerminalGuard};
use crate::scheduler::{Dispatcher, RunSummary};
use crate::shutdown::install_signal_listener;
use crate::store::JobStore;
use crate::worker::{
    run_worker, HookError, JobContext, SelfExecLauncher, WorkHook, WorkerLauncher,
};

/// Exit status of the orchestrator after an interrupt.
pub const EXIT_INTERRUPTED: i32 = 130;

type SetupHook = Box<dyn FnOnce(&JobStore) -> Result<()> + Send>;

/// Host integration point.
///
/// A host program builds one `Vete`, registers an optional setup hook and a
/// work hook, and calls [`Vete::run`] first thing in `main`:
///
/// ```no_run
/// use vete::{RunConfig, Vete};
///
/// let summary = Vete::new(RunConfig::default().with_workers(4))
///     .setup(|store| {
///         store.initialize()?;
///         for i in 1..=100 {
///             store.enqueue(&i.to_string(), None)?;
///         }
///         Ok(())
///     })
///     .perform(|job| {
///         println!("working on {}", job.name);
///         Ok(())
///     })
///     .run()?;
/// # Ok::<(), vete::VeteError>(())
/// ```
///
/// When the binary is re-executed as a worker, `run` does not return: it
/// invokes the work hook for that one job and exits with its outcome.
pub struct Vete {
    config: RunConfig,
    setup: Option<SetupHook>,
    work: Option<WorkHook>,
    launcher: Option<Arc<dyn WorkerLauncher>>,
    interactive: Option<bool>,
    report: bool,
}

impl Vete {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            setup: None,
            work: None,
            launcher: None,
            interactive: None,
            report: true,
        }
    }

    /// Run once before the pending snapshot is taken.
    pub fn setup<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&JobStore) -> Result<()> + Send + 'static,
    {
        self.setup = Some(Box::new(hook));
        self
    }

    /// Per-job work, run inside an isolated worker process.
    pub fn perform<F>(mut self, hook: F) -> Self
    where
        F: Fn(&JobContext) -> std::result::Result<(), HookError> + Send + Sync + 'static,
    {
        self.work = Some(Box::new(hook));
        self
    }

    /// Start workers with `launcher` instead of re-executing this binary.
    pub fn launcher(mut self, launcher: impl WorkerLauncher + 'static) -> Self {
        self.launcher = Some(Arc::new(launcher));
        self
    }

    /// Force the live display on or off. Defaults to on when stdout is a
    /// terminal.
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = Some(interactive);
        self
    }

    /// Whether to print the closing report (default on).
    pub fn report(mut self, report: bool) -> Self {
        self.report = report;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run the whole thing: worker mode if this process is a worker,
    /// otherwise setup, dispatch and report.
    pub fn run(self) -> Result<RunSummary> {
        if let Some(ctx) = JobContext::from_env() {
            let hook = self.work.as_ref().ok_or(VeteError::MissingWorkHook)?;
            run_worker(hook, &ctx);
        }

        self.config.validate()?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| VeteError::io(&self.config.root, e))?;
        runtime.block_on(self.orchestrate())
    }

    async fn orchestrate(self) -> Result<RunSummary> {
        let Vete {
            config,
            setup,
            work,
            launcher,
            interactive,
            report,
        } = self;
        let store = JobStore::new(&config.root);

        if let Some(setup) = setup {
            setup(&store)?;
        }

        let jobs = store.list_pending()?;
        if jobs.is_empty() {
            tracing::info!(root = %store.root().display(), "No pending jobs");
            return Ok(RunSummary::empty(config.workers));
        }

        let launcher: Arc<dyn WorkerLauncher> = match (launcher, work) {
            (Some(launcher), _) => launcher,
            (None, Some(_)) => Arc::new(
                SelfExecLauncher::current().map_err(|e| VeteError::io(&config.root, e))?,
            ),
            (None, None) => return Err(VeteError::MissingWorkHook),
        };

        let interactive = interactive.unwrap_or_else(|| std::io::stdout().is_terminal());
        let dispatcher = Dispatcher::new(config.clone(), store, launcher);

        if !interactive {
            let cancel = install_signal_listener(None);
            let summary = tokio::select! {
                summary = dispatcher.run(jobs) => summary?,
                _ = cancel.cancelled() => std::process::exit(EXIT_INTERRUPTED),
            };
            if cancel.is_cancelled() {
                std::process::exit(EXIT_INTERRUPTED);
            }
            if report {
                println!("{summary}");
            }
            return Ok(summary);
        }

        let guard = TerminalGuard::hide().map_err(VeteError::Terminal)?;
        let mut renderer = Renderer::new(Painter::new(std::io::stdout(), &config));
        renderer.start().map_err(VeteError::Terminal)?;

        let (display_tx, display_rx) = mpsc::unbounded_channel();
        let cancel = install_signal_listener(Some(display_tx.downgrade()));
        let drawing = tokio::task::spawn_blocking(move || renderer.run_blocking(display_rx));

        let result = tokio::select! {
            result = dispatcher.with_display(display_tx).run(jobs) => result,
            _ = cancel.cancelled() => interrupted(),
        };

        let Some(mut renderer) = await_renderer(drawing, &cancel).await? else {
            interrupted();
        };
        let painter = renderer.painter_mut();
        let drawn = match &result {
            Ok(summary) if report => painter.draw_report(summary),
            _ => painter.park_cursor(),
        };
        drawn.map_err(VeteError::Terminal)?;
        drop(guard);
        result
    }
}

/// Wait for the renderer to drain its last events. `None` means an
/// interrupt arrived before the closing report could be drawn.
async fn await_renderer<W: Write + Send + 'static>(
    drawing: JoinHandle<Renderer<W>>,
    cancel: &CancellationToken,
) -> Result<Option<Renderer<W>>> {
    let renderer = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Ok(None),
        joined = drawing => joined?,
    };
    if cancel.is_cancelled() {
        return Ok(None);
    }
    Ok(Some(renderer))
}

fn interrupted() -> ! {
    render::restore_terminal();
    std::process::exit(EXIT_INTERRUPTED)
}
