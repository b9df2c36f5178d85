//! Drivers that feed measurements into a [`Paginator`].
//!
//! `paginate` runs on the caller's thread with a single measurement in flight.
//! `spawn_pagination` does the same on a background thread and reports
//! progress over a channel. `paginate_parallel` measures on a small pool but
//! sorts the heights back into file order before any page is assigned.

use super::geometry::PageGeometry;
use super::layout::BookLayout;
use super::measure::HeightMeasurer;
use super::paginator::{MeasureRequest, PaginationStep, Paginator};
use crate::cancellation::CancellationToken;
use anyhow::{Context, Result, anyhow};
use std::sync::{Arc, mpsc};
use std::thread::{self, JoinHandle};
use threadpool::ThreadPool;
use tracing::{debug, info, warn};

/// Notifications emitted while a book is being laid out.
#[derive(Debug, Clone)]
pub enum PaginationEvent {
    Progress { measured: usize, total: usize },
    Paginated(Arc<BookLayout>),
    Failed(String),
    Cancelled,
}

/// Lay out `files` on the current thread.
pub fn paginate<M>(
    files: Vec<String>,
    geometry: &PageGeometry,
    measurer: &mut M,
    cancel: &CancellationToken,
) -> Result<BookLayout>
where
    M: HeightMeasurer + ?Sized,
{
    paginate_with_progress(files, geometry, measurer, cancel, |_, _| {})
}

/// Like [`paginate`], calling `on_progress(measured, total)` after every file.
pub fn paginate_with_progress<M, F>(
    files: Vec<String>,
    geometry: &PageGeometry,
    measurer: &mut M,
    cancel: &CancellationToken,
    mut on_progress: F,
) -> Result<BookLayout>
where
    M: HeightMeasurer + ?Sized,
    F: FnMut(usize, usize),
{
    let mut paginator = Paginator::new(files, geometry)?;
    let total = paginator.file_count();
    let mut request = paginator
        .pending()
        .ok_or_else(|| anyhow!("Paginator did not schedule a measurement"))?;

    let outcome = loop {
        if let Err(err) = cancel.check_before_file(request.index, &request.path) {
            break Err(err);
        }
        let height = match measure_one(&mut paginator, measurer, &request) {
            Ok(height) => height,
            Err(err) => break Err(err),
        };
        match paginator.on_file_measured(request.index, height) {
            Ok(PaginationStep::Measure(next)) => {
                on_progress(paginator.measured(), total);
                request = next;
            }
            Ok(PaginationStep::Paginated { .. }) => {
                on_progress(paginator.measured(), total);
                break Ok(());
            }
            Err(err) => break Err(err.into()),
        }
    };

    measurer.release();
    outcome?;
    Ok(paginator.into_layout()?)
}

fn measure_one<M>(
    paginator: &mut Paginator,
    measurer: &mut M,
    request: &MeasureRequest,
) -> Result<f64>
where
    M: HeightMeasurer + ?Sized,
{
    match measurer.measure(&request.path) {
        Ok(height) => Ok(height),
        Err(err) => {
            let failure = paginator.on_measure_failed(request.index, format!("{err:#}"));
            Err(anyhow::Error::new(failure).context("This book could not be laid out"))
        }
    }
}

/// A pagination running on its own thread.
pub struct PaginationJob {
    events: mpsc::Receiver<PaginationEvent>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl PaginationJob {
    pub fn events(&self) -> &mpsc::Receiver<PaginationEvent> {
        &self.events
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Block until the job finishes and return the finished layout.
    pub fn wait(mut self) -> Result<Arc<BookLayout>> {
        let mut outcome = Err(anyhow!("Pagination worker exited without a result"));
        for event in self.events.iter() {
            match event {
                PaginationEvent::Progress { measured, total } => {
                    debug!(measured, total, "Pagination progress");
                }
                PaginationEvent::Paginated(layout) => {
                    outcome = Ok(layout);
                    break;
                }
                PaginationEvent::Failed(reason) => {
                    outcome = Err(anyhow!(reason));
                    break;
                }
                PaginationEvent::Cancelled => {
                    outcome = Err(anyhow!("Pagination cancelled"));
                    break;
                }
            }
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                return Err(anyhow!("Pagination worker panicked"));
            }
        }
        outcome
    }
}

/// Lay out `files` on a background thread.
pub fn spawn_pagination<M>(
    files: Vec<String>,
    geometry: PageGeometry,
    mut measurer: M,
    cancel: CancellationToken,
) -> Result<PaginationJob>
where
    M: HeightMeasurer + Send + 'static,
{
    // Surface configuration errors before any thread exists.
    geometry.single_page_height_px()?;
    if files.is_empty() {
        anyhow::bail!("Cannot paginate a book without files");
    }

    let (tx, rx) = mpsc::channel();
    let worker_cancel = cancel.clone();
    let handle = thread::Builder::new()
        .name("paginator".to_string())
        .spawn(move || {
            let progress_tx = tx.clone();
            let result = paginate_with_progress(
                files,
                &geometry,
                &mut measurer,
                &worker_cancel,
                |measured, total| {
                    let _ = progress_tx.send(PaginationEvent::Progress { measured, total });
                },
            );
            let event = match result {
                Ok(layout) => PaginationEvent::Paginated(Arc::new(layout)),
                Err(_) if worker_cancel.is_cancelled() => PaginationEvent::Cancelled,
                Err(err) => PaginationEvent::Failed(format!("{err:#}")),
            };
            let _ = tx.send(event);
        })
        .context("Failed to spawn pagination worker")?;

    Ok(PaginationJob {
        events: rx,
        cancel,
        handle: Some(handle),
    })
}

/// Measure on `threads` workers, then assign pages strictly in file order.
pub fn paginate_parallel<M>(
    files: Vec<String>,
    geometry: &PageGeometry,
    measurer: M,
    threads: usize,
    cancel: &CancellationToken,
) -> Result<BookLayout>
where
    M: HeightMeasurer + Clone + Send + 'static,
{
    let threads = threads.max(1);
    let mut measurer = measurer;
    if threads == 1 || files.len() <= 1 {
        return paginate(files, geometry, &mut measurer, cancel);
    }

    let mut paginator = Paginator::new(files.clone(), geometry)?;
    let total = files.len();
    let shared_files = Arc::new(files);
    info!(files = total, threads, "Measuring files in parallel");

    let pool = ThreadPool::new(threads);
    let (tx, rx) = mpsc::channel::<(usize, Result<f64>)>();
    for worker in 0..threads {
        let tx = tx.clone();
        let files = Arc::clone(&shared_files);
        let cancel = cancel.clone();
        let mut local = measurer.clone();
        pool.execute(move || {
            for index in (worker..files.len()).step_by(threads) {
                if cancel.is_cancelled() {
                    break;
                }
                let result = local.measure(&files[index]);
                if tx.send((index, result)).is_err() {
                    break;
                }
            }
            local.release();
        });
    }
    drop(tx);

    let mut heights: Vec<Option<Result<f64>>> = (0..total).map(|_| None).collect();
    for (index, result) in rx.iter() {
        heights[index] = Some(result);
    }
    pool.join();
    measurer.release();
    cancel.check_cancelled("paginate_parallel")?;

    for (index, height) in heights.into_iter().enumerate() {
        let height = match height {
            Some(Ok(height)) => height,
            Some(Err(err)) => {
                let failure = paginator.on_measure_failed(index, format!("{err:#}"));
                return Err(anyhow::Error::new(failure).context("This book could not be laid out"));
            }
            None => {
                warn!(index, "Measurement missing from worker results");
                let failure = paginator.on_measure_failed(index, "no result from worker");
                return Err(anyhow::Error::new(failure).context("This book could not be laid out"));
            }
        };
        paginator.on_file_measured(index, height)?;
    }

    Ok(paginator.into_layout()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::error::PaginationError;
    use std::collections::HashMap;

    /// 1000 px tall pages: 264.6 mm at 96 dpi rounds to 1000 px.
    fn geometry() -> PageGeometry {
        PageGeometry::new(264.6, 135.0, 96.0)
    }

    #[derive(Clone)]
    struct FixedHeights {
        heights: HashMap<String, f64>,
    }

    impl HeightMeasurer for FixedHeights {
        fn measure(&mut self, path: &str) -> Result<f64> {
            self.heights
                .get(path)
                .copied()
                .ok_or_else(|| anyhow!("unknown file {path}"))
        }
    }

    fn book(heights: &[f64]) -> (Vec<String>, FixedHeights) {
        let files: Vec<String> = (0..heights.len())
            .map(|idx| format!("/book/ch{idx}.xhtml"))
            .collect();
        let map = files.iter().cloned().zip(heights.iter().copied()).collect();
        (files, FixedHeights { heights: map })
    }

    #[test]
    fn geometry_fixture_is_one_thousand_pixels() {
        assert_eq!(geometry().single_page_height_px().unwrap(), 1000.0);
    }

    #[test]
    fn sequential_driver_measures_in_file_order() {
        let (files, fixed) = book(&[2500.0, 800.0]);
        let mut order = Vec::new();
        let mut released = false;

        struct Recording<'a> {
            inner: FixedHeights,
            order: &'a mut Vec<String>,
            released: &'a mut bool,
        }
        impl HeightMeasurer for Recording<'_> {
            fn measure(&mut self, path: &str) -> Result<f64> {
                self.order.push(path.to_string());
                self.inner.measure(path)
            }
            fn release(&mut self) {
                *self.released = true;
            }
        }

        let mut measurer = Recording {
            inner: fixed,
            order: &mut order,
            released: &mut released,
        };
        let layout = paginate(
            files.clone(),
            &geometry(),
            &mut measurer,
            &CancellationToken::new(),
        )
        .unwrap();
        drop(measurer);

        assert_eq!(order, files);
        assert!(released);
        assert_eq!(layout.total_pagecount(), 4);
    }

    #[test]
    fn collaborator_failure_halts_without_partial_layout() {
        let (mut files, mut fixed) = book(&[2500.0, 800.0]);
        files.push("/book/missing.xhtml".to_string());
        let err = paginate(files, &geometry(), &mut fixed, &CancellationToken::new()).unwrap_err();
        let failure = err.downcast_ref::<PaginationError>().unwrap();
        assert!(matches!(failure, PaginationError::MeasurementFailed { path, .. } if path == "/book/missing.xhtml"));
    }

    #[test]
    fn measurer_is_released_when_pagination_stops_early() {
        struct Flaky {
            released: bool,
        }
        impl HeightMeasurer for Flaky {
            fn measure(&mut self, path: &str) -> Result<f64> {
                Err(anyhow!("renderer lost {path}"))
            }
            fn release(&mut self) {
                self.released = true;
            }
        }

        let (files, _) = book(&[2500.0, 800.0]);
        let mut failing = Flaky { released: false };
        assert!(paginate(files.clone(), &geometry(), &mut failing, &CancellationToken::new()).is_err());
        assert!(failing.released);

        let mut cancelled = Flaky { released: false };
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(paginate(files, &geometry(), &mut cancelled, &cancel).is_err());
        assert!(cancelled.released);
    }

    #[test]
    fn cancelled_token_yields_no_layout() {
        let (files, mut fixed) = book(&[2500.0, 800.0]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(paginate(files, &geometry(), &mut fixed, &cancel).is_err());
    }

    #[test]
    fn configuration_errors_surface_before_measuring() {
        let mut calls = 0usize;
        let mut measurer = |_: &str| -> Result<f64> {
            calls += 1;
            Ok(0.0)
        };
        let bad = PageGeometry::new(216.0, 135.0, 0.0);
        let err = paginate(
            vec!["a".to_string()],
            &bad,
            &mut measurer,
            &CancellationToken::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PaginationError>(),
            Some(PaginationError::InvalidConfiguration(_))
        ));
        assert_eq!(calls, 0);
    }

    #[test]
    fn background_job_reports_progress_then_layout() {
        let (files, fixed) = book(&[2500.0, 800.0, 0.0]);
        let job = spawn_pagination(files, geometry(), fixed, CancellationToken::new()).unwrap();

        let mut progress = Vec::new();
        let mut layout = None;
        for event in job.events().iter() {
            match event {
                PaginationEvent::Progress { measured, total } => progress.push((measured, total)),
                PaginationEvent::Paginated(done) => {
                    layout = Some(done);
                    break;
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(layout.unwrap().total_pagecount(), 5);
    }

    #[test]
    fn background_job_wait_returns_layout() {
        let (files, fixed) = book(&[1500.0]);
        let job = spawn_pagination(files, geometry(), fixed, CancellationToken::new()).unwrap();
        assert_eq!(job.wait().unwrap().total_pagecount(), 2);
    }

    #[test]
    fn background_job_rejects_empty_book() {
        let (_, fixed) = book(&[]);
        assert!(spawn_pagination(Vec::new(), geometry(), fixed, CancellationToken::new()).is_err());
    }

    #[test]
    fn parallel_driver_matches_sequential_layout() {
        let heights = [2500.0, 800.0, 0.0, 4100.0, 1000.0, 1001.0, 333.0, 7777.0];
        let (files, mut fixed) = book(&heights);
        let sequential = paginate(
            files.clone(),
            &geometry(),
            &mut fixed,
            &CancellationToken::new(),
        )
        .unwrap();
        let parallel =
            paginate_parallel(files, &geometry(), fixed, 3, &CancellationToken::new()).unwrap();

        assert_eq!(parallel.total_pagecount(), sequential.total_pagecount());
        assert_eq!(parallel.files(), sequential.files());
        let a: Vec<_> = parallel.pages().map(|(n, r)| (n, *r)).collect();
        let b: Vec<_> = sequential.pages().map(|(n, r)| (n, *r)).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn parallel_driver_reports_first_failing_file() {
        let (mut files, fixed) = book(&[100.0, 200.0, 300.0]);
        files.insert(1, "/book/broken.xhtml".to_string());
        let err =
            paginate_parallel(files, &geometry(), fixed, 2, &CancellationToken::new()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PaginationError>(),
            Some(PaginationError::MeasurementFailed { path, .. }) if path == "/book/broken.xhtml"
        ));
    }
}
