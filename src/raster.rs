//! Cancellable page rasterization.
//!
//! A newer request for a page aborts the outstanding one, and a change of page count
//! aborts everything. An aborted request resolves to `Ok(None)`: cancellation is
//! routine, never an error.

use std::collections::HashMap;
use std::sync::Arc;
use std::task::{Context, Poll};

use egui::ColorImage;
use futures::future::{AbortHandle, BoxFuture, FutureExt, abortable};
use log::{debug, warn};
use parking_lot::Mutex;

use crate::document::{MAX_ZOOM, MIN_ZOOM};
use crate::error::RasterError;

/// Renders one PDF page into pixels.
pub trait Rasterizer {
    fn rasterize(&self, page: u32, scale: f32) -> BoxFuture<'static, Result<ColorImage, RasterError>>;
}

/// Pixels of one page at one scale.
#[derive(Clone)]
pub struct RasterImage {
    pub page: u32,
    pub scale: f32,
    pub image: ColorImage,
}

impl std::fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterImage")
            .field("page", &self.page)
            .field("scale", &self.scale)
            .field("size", &self.image.size)
            .finish()
    }
}

/// Device pixels per PDF point for a zoom level.
pub fn raster_scale(zoom_percent: f32, pixels_per_point: f32) -> f32 {
    zoom_percent.clamp(MIN_ZOOM, MAX_ZOOM) / 100.0 * pixels_per_point
}

#[derive(Debug, Default)]
struct Pending {
    next_ticket: u64,
    page_count: u32,
    by_page: HashMap<u32, (u64, AbortHandle)>,
}

#[derive(Debug, Clone, Default)]
pub struct RasterScheduler {
    pending: Arc<Mutex<Pending>>,
}

impl RasterScheduler {
    pub fn new(page_count: u32) -> Self {
        let scheduler = Self::default();
        scheduler.pending.lock().page_count = page_count;
        scheduler
    }

    pub fn page_count(&self) -> u32 {
        self.pending.lock().page_count
    }

    /// Update the page count; a change aborts every outstanding request.
    pub fn set_page_count(&self, page_count: u32) -> usize {
        let changed = {
            let mut pending = self.pending.lock();
            let changed = pending.page_count != page_count;
            pending.page_count = page_count;
            changed
        };
        if changed { self.cancel_all() } else { 0 }
    }

    /// Start rasterizing `page`, superseding any outstanding request for it.
    pub fn request(
        &self,
        page: u32,
        scale: f32,
        rasterizer: &dyn Rasterizer,
    ) -> BoxFuture<'static, Result<Option<RasterImage>, RasterError>> {
        let (future, handle) = abortable(rasterizer.rasterize(page, scale));
        let ticket = {
            let mut pending = self.pending.lock();
            if page == 0 || page > pending.page_count {
                return futures::future::ready(Err(RasterError::PageOutOfRange(page))).boxed();
            }
            pending.next_ticket += 1;
            let ticket = pending.next_ticket;
            if let Some((_, previous)) = pending.by_page.insert(page, (ticket, handle)) {
                previous.abort();
                debug!("raster of page {page} superseded");
            }
            ticket
        };

        let pending = Arc::clone(&self.pending);
        async move {
            let result = future.await;
            {
                let mut pending = pending.lock();
                if pending.by_page.get(&page).is_some_and(|(t, _)| *t == ticket) {
                    pending.by_page.remove(&page);
                }
            }
            match result {
                Ok(Ok(image)) => Ok(Some(RasterImage { page, scale, image })),
                Ok(Err(err)) => Err(err),
                Err(_aborted) => {
                    debug!("raster of page {page} cancelled");
                    Ok(None)
                }
            }
        }
        .boxed()
    }

    pub fn cancel(&self, page: u32) -> bool {
        let removed = self.pending.lock().by_page.remove(&page);
        match removed {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Abort every outstanding request; returns how many were running.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<_> = self.pending.lock().by_page.drain().collect();
        for (_, (_, handle)) in &drained {
            handle.abort();
        }
        if !drained.is_empty() {
            debug!("cancelled {} outstanding raster(s)", drained.len());
        }
        drained.len()
    }

    pub fn outstanding(&self) -> usize {
        self.pending.lock().by_page.len()
    }
}

type PendingRaster = BoxFuture<'static, Result<Option<RasterImage>, RasterError>>;

/// Frame-driven front of a [`RasterScheduler`]: remembers which page was asked for
/// at which scale and polls the requests without blocking.
///
/// A request that fails or gets cancelled is forgotten, so the next
/// [`RasterQueue::ensure`] for that page asks again.
pub struct RasterQueue {
    scheduler: RasterScheduler,
    pending: Vec<(u32, f32, PendingRaster)>,
    requested: HashMap<u32, f32>,
}

impl RasterQueue {
    pub fn new(page_count: u32) -> Self {
        Self {
            scheduler: RasterScheduler::new(page_count),
            pending: Vec::new(),
            requested: HashMap::new(),
        }
    }

    pub fn scheduler(&self) -> &RasterScheduler {
        &self.scheduler
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    /// Ask for `page` at `scale` unless that raster is bound or on its way.
    pub fn ensure(&mut self, page: u32, scale: f32, rasterizer: &dyn Rasterizer) {
        if self.requested.get(&page) == Some(&scale) {
            return;
        }
        self.requested.insert(page, scale);
        self.pending.push((page, scale, self.scheduler.request(page, scale, rasterizer)));
    }

    /// Drop whatever is known about `page` and abort its outstanding request.
    pub fn forget(&mut self, page: u32) {
        self.requested.remove(&page);
        if self.scheduler.cancel(page) {
            debug!("raster of page {page} dropped");
        }
    }

    /// New page geometry: everything in flight is abandoned. Returns how many
    /// requests were cancelled.
    pub fn reset(&mut self, page_count: u32) -> usize {
        self.requested.clear();
        self.scheduler.set_page_count(page_count)
    }

    /// Poll every outstanding request once and return the finished rasters.
    pub fn poll(&mut self) -> Vec<RasterImage> {
        let mut cx = Context::from_waker(futures::task::noop_waker_ref());
        let mut ready = Vec::new();
        let mut retry = Vec::new();
        self.pending.retain_mut(|(page, scale, future)| match future.poll_unpin(&mut cx) {
            Poll::Ready(Ok(Some(raster))) => {
                ready.push(raster);
                false
            }
            Poll::Ready(Ok(None)) => {
                retry.push((*page, *scale));
                false
            }
            Poll::Ready(Err(err)) => {
                warn!("rasterization of page {page} failed: {err}");
                retry.push((*page, *scale));
                false
            }
            Poll::Pending => true,
        });
        for (page, scale) in retry {
            if self.requested.get(&page) == Some(&scale) {
                self.requested.remove(&page);
            }
        }
        ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    struct Blank;

    impl Rasterizer for Blank {
        fn rasterize(&self, _page: u32, scale: f32) -> BoxFuture<'static, Result<ColorImage, RasterError>> {
            let side = (10.0 * scale) as usize;
            futures::future::ready(Ok(ColorImage::new([side, side], egui::Color32::WHITE))).boxed()
        }
    }

    #[test]
    fn test_newer_request_cancels_older() {
        let scheduler = RasterScheduler::new(3);
        let first = scheduler.request(1, 1.0, &Blank);
        let second = scheduler.request(1, 2.0, &Blank);

        assert!(block_on(first).unwrap().is_none());
        let image = block_on(second).unwrap().unwrap();
        assert_eq!(image.image.size, [20, 20]);
        assert_eq!(scheduler.outstanding(), 0);
    }

    #[test]
    fn test_other_pages_unaffected() {
        let scheduler = RasterScheduler::new(3);
        let one = scheduler.request(1, 1.0, &Blank);
        let two = scheduler.request(2, 1.0, &Blank);
        assert!(block_on(one).unwrap().is_some());
        assert!(block_on(two).unwrap().is_some());
    }

    #[test]
    fn test_page_count_change_cancels_all() {
        let scheduler = RasterScheduler::new(3);
        let one = scheduler.request(1, 1.0, &Blank);
        let two = scheduler.request(2, 1.0, &Blank);
        assert_eq!(scheduler.set_page_count(3), 0);
        assert_eq!(scheduler.set_page_count(5), 2);
        assert!(block_on(one).unwrap().is_none());
        assert!(block_on(two).unwrap().is_none());
    }

    #[test]
    fn test_out_of_range_page() {
        let scheduler = RasterScheduler::new(2);
        let err = block_on(scheduler.request(3, 1.0, &Blank)).unwrap_err();
        assert_eq!(err, RasterError::PageOutOfRange(3));
    }

    #[test]
    fn test_scale_from_zoom() {
        assert_eq!(raster_scale(150.0, 2.0), 3.0);
        assert_eq!(raster_scale(10.0, 1.0), 0.25);
        assert_eq!(raster_scale(500.0, 1.0), 2.0);
    }

    struct FailsOnce {
        calls: Mutex<u32>,
    }

    impl Rasterizer for FailsOnce {
        fn rasterize(&self, _page: u32, _scale: f32) -> BoxFuture<'static, Result<ColorImage, RasterError>> {
            let mut calls = self.calls.lock();
            *calls += 1;
            let result = if *calls == 1 {
                Err(RasterError::Backend("busy".into()))
            } else {
                Ok(ColorImage::new([4, 4], egui::Color32::WHITE))
            };
            futures::future::ready(result).boxed()
        }
    }

    #[test]
    fn test_queue_retries_after_failure() {
        let rasterizer = FailsOnce { calls: Mutex::new(0) };
        let mut queue = RasterQueue::new(2);

        queue.ensure(1, 1.0, &rasterizer);
        assert!(queue.poll().is_empty());
        assert!(queue.is_idle());

        queue.ensure(1, 1.0, &rasterizer);
        let ready = queue.poll();
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].page, 1);
        assert_eq!(*rasterizer.calls.lock(), 2);

        // Bound now; asking again is a no-op.
        queue.ensure(1, 1.0, &rasterizer);
        assert!(queue.is_idle());
    }

    #[test]
    fn test_queue_retries_after_cancel() {
        let mut queue = RasterQueue::new(2);
        queue.ensure(2, 1.0, &Blank);
        assert_eq!(queue.reset(3), 1);
        assert!(queue.poll().is_empty());

        queue.ensure(2, 1.0, &Blank);
        assert_eq!(queue.poll().len(), 1);
    }

    #[test]
    fn test_forget_cancels_and_rerequests() {
        let mut queue = RasterQueue::new(2);
        queue.ensure(1, 1.0, &Blank);
        queue.forget(1);
        assert_eq!(queue.scheduler().outstanding(), 0);
        assert!(queue.poll().is_empty());

        queue.ensure(1, 1.0, &Blank);
        assert_eq!(queue.poll().len(), 1);
    }
}
