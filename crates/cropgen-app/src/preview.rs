//! Debounced preview rendering.
//!
//! Preview requests carry a full snapshot of what to draw. The renderer
//! hands them to a [`DebounceScheduler`], and the surviving job renders
//! into a shared slot tagged with the session epoch it was made for.
//! Readers ask for a specific epoch, so a render that finishes after the
//! user picked another file is never shown.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use cropgen_core::{
    render_crop, CompletedCrop, InterpolationFilter, RenderError, RenderTarget, SourceImage,
    Surface, Transform,
};

use crate::debounce::{DebounceScheduler, DebounceToken};

/// Everything needed to draw one preview.
#[derive(Debug, Clone)]
pub struct PreviewJob {
    pub epoch: u64,
    pub source: Arc<SourceImage>,
    pub completed: CompletedCrop,
    pub transform: Transform,
    pub device_pixel_ratio: f64,
}

/// A finished preview and the inputs it was drawn from.
#[derive(Debug, Clone)]
pub struct RenderedPreview {
    pub epoch: u64,
    pub completed: CompletedCrop,
    pub transform: Transform,
    pub surface: Surface,
}

type Slot = Arc<Mutex<Option<RenderedPreview>>>;

fn lock_slot(slot: &Slot) -> MutexGuard<'_, Option<RenderedPreview>> {
    match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::warn!("preview slot lock poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

fn render_job(job: &PreviewJob) -> Result<RenderedPreview, RenderError> {
    let target = RenderTarget::preview(&job.completed, job.device_pixel_ratio)?;
    let mut surface = Surface::new();
    render_crop(
        &job.source,
        &job.completed,
        &job.transform,
        &target,
        &mut surface,
        InterpolationFilter::Bilinear,
    )?;
    Ok(RenderedPreview {
        epoch: job.epoch,
        completed: job.completed,
        transform: job.transform,
        surface,
    })
}

fn render_into(slot: &Slot, renders: &AtomicUsize, job: &PreviewJob) -> Result<(), RenderError> {
    let rendered = render_job(job)?;
    renders.fetch_add(1, Ordering::SeqCst);
    *lock_slot(slot) = Some(rendered);
    Ok(())
}

#[derive(Debug)]
pub struct PreviewRenderer {
    slot: Slot,
    renders: Arc<AtomicUsize>,
    scheduler: DebounceScheduler<PreviewJob>,
}

impl PreviewRenderer {
    pub fn new(quiet_period: Duration) -> Self {
        let slot: Slot = Arc::new(Mutex::new(None));
        let renders = Arc::new(AtomicUsize::new(0));

        let scheduler = {
            let slot = Arc::clone(&slot);
            let renders = Arc::clone(&renders);
            DebounceScheduler::new(quiet_period, move |job: PreviewJob| {
                if let Err(e) = render_into(&slot, &renders, &job) {
                    // Nothing waits on a debounced render; the next request retries
                    log::warn!("preview render skipped: {e}");
                }
            })
        };

        Self {
            slot,
            renders,
            scheduler,
        }
    }

    /// Queue a debounced render of `job`.
    pub fn request(&self, job: PreviewJob) -> DebounceToken {
        self.scheduler.schedule(job)
    }

    /// Render `job` immediately, dropping any queued request.
    ///
    /// A debounced render that is already drawing finishes first, so the
    /// slot always ends up holding `job`.
    pub fn render_now(&self, job: &PreviewJob) -> Result<(), RenderError> {
        self.scheduler
            .run_exclusive(|| render_into(&self.slot, &self.renders, job))
    }

    pub fn cancel(&self) {
        self.scheduler.cancel_all();
    }

    pub fn is_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// Drop the stored preview.
    pub fn clear(&self) {
        *lock_slot(&self.slot) = None;
    }

    /// Run `f` on the stored preview if it was rendered for `epoch`.
    pub fn with_latest<R>(&self, epoch: u64, f: impl FnOnce(&RenderedPreview) -> R) -> Option<R> {
        let slot = lock_slot(&self.slot);
        slot.as_ref().filter(|p| p.epoch == epoch).map(f)
    }

    /// Number of renders that have completed.
    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}
