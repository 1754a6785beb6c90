//! Worker pool - the concurrent crawl loop
//!
//! N workers share one [`Frontier`] and the growing page map behind a single
//! lock. Each worker owns one rendering session, which is closed on every
//! exit path. Run state (pause, resume, stop) comes from the job's
//! [`JobHandle`] and is polled at each loop boundary.

use crate::crawler::control::JobHandle;
use crate::crawler::extractor::{ExtractedPage, PageExtractor};
use crate::crawler::frontier::Frontier;
use crate::crawler::observer::{
    emit_log, CrawlObserver, ErrorEntry, LogLevel, NoopObserver, Progress,
};
use crate::crawler::render::{RenderEngine, RenderSession, ResourceKind};
use crate::health::LinkChecker;
use crate::index::{Finding, PageRecord, SearchQuery};
use crate::state::JobState;
use crate::JobError;
use chrono::Utc;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Tuning for one crawl job
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Page budget (0 = unbounded)
    pub max_pages: usize,
    pub concurrency: usize,
    /// Pause after each page, per worker
    pub page_delay: Duration,
    /// Offset between worker start-ups
    pub worker_stagger: Duration,
    /// Wait before re-polling an empty queue while siblings are busy
    pub idle_poll: Duration,
    /// Enqueue links discovered on extracted pages; off for incremental runs
    pub follow_links: bool,
    /// Skip images, stylesheets, fonts and media in rendering sessions
    pub block_heavy_resources: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_pages: 1000,
            concurrency: 3,
            page_delay: Duration::from_millis(200),
            worker_stagger: Duration::from_millis(200),
            idle_poll: Duration::from_millis(200),
            follow_links: true,
            block_heavy_resources: true,
        }
    }
}

impl CrawlOptions {
    pub fn from_config(config: &crate::config::CrawlerConfig) -> Self {
        Self {
            max_pages: config.max_pages as usize,
            concurrency: config.concurrency.max(1) as usize,
            page_delay: Duration::from_millis(config.page_delay),
            ..Self::default()
        }
    }
}

/// Everything a finished (or stopped) job produced
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    /// Final run state; stopped jobs end `Completed` too
    pub state: JobState,
    pub pages: BTreeMap<String, PageRecord>,
    pub errors: Vec<ErrorEntry>,
    pub findings: Vec<Finding>,
    /// Pages taken off the queue, successful or not
    pub pages_visited: usize,
    pub queue_remaining: usize,
    pub duration: Duration,
}

impl CrawlOutcome {
    pub fn total_links(&self) -> usize {
        self.pages.values().map(|p| p.links.len()).sum()
    }
}

/// State shared by all workers of one job
struct CrawlState {
    frontier: Frontier,
    pages: BTreeMap<String, PageRecord>,
    errors: Vec<ErrorEntry>,
    findings: Vec<Finding>,
    in_flight: usize,
    pages_started: usize,
    links_found: usize,
    sessions_opened: usize,
}

/// What a worker should do next
enum Step {
    Visit(url::Url, Progress),
    Wait,
    Done,
}

/// Drives a rendering engine over a frontier with N concurrent workers
pub struct WorkerPool {
    engine: Arc<dyn RenderEngine>,
    extractor: Arc<PageExtractor>,
    options: CrawlOptions,
    handle: JobHandle,
    observer: Arc<dyn CrawlObserver>,
    query: Option<SearchQuery>,
    sampler: Option<(Arc<LinkChecker>, usize)>,
}

impl WorkerPool {
    pub fn new(engine: Arc<dyn RenderEngine>, extractor: PageExtractor, options: CrawlOptions) -> Self {
        Self {
            engine,
            extractor: Arc::new(extractor),
            options,
            handle: JobHandle::new(),
            observer: Arc::new(NoopObserver),
            query: None,
            sampler: None,
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn CrawlObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Controls the pool through an externally owned handle
    #[must_use]
    pub fn with_handle(mut self, handle: JobHandle) -> Self {
        self.handle = handle;
        self
    }

    /// Evaluates every extracted page against a query and reports matches live
    #[must_use]
    pub fn with_live_search(mut self, query: SearchQuery) -> Self {
        self.query = Some(query);
        self
    }

    /// Checks the first `limit` internal links of every page while crawling
    #[must_use]
    pub fn with_link_sampling(mut self, checker: Arc<LinkChecker>, limit: usize) -> Self {
        self.sampler = Some((checker, limit));
        self
    }

    pub fn handle(&self) -> JobHandle {
        self.handle.clone()
    }

    /// Runs the crawl until the queue drains, the budget is spent, or the job is stopped
    ///
    /// # Errors
    ///
    /// An engine that fails to start, or one on which no worker could open a
    /// session, is an error. Page failures are recorded in the outcome and
    /// never abort the job.
    pub async fn run(&self, frontier: Frontier) -> Result<CrawlOutcome, JobError> {
        let started_at = Instant::now();

        if !self.handle.transition(JobState::Running) {
            info!("Job was stopped before it started");
            return Ok(self.finish(frontier_into_state(frontier), started_at, JobState::Completed));
        }

        if let Err(e) = self.engine.start().await {
            self.handle.transition(JobState::Failed);
            emit_log(
                self.observer.as_ref(),
                LogLevel::Error,
                &format!("Rendering engine failed to start: {}", e),
            );
            return Err(JobError::EngineInit(e.to_string()));
        }

        let state = Mutex::new(frontier_into_state(frontier));
        let workers = (0..self.options.concurrency.max(1)).map(|id| self.worker(id, &state));
        join_all(workers).await;

        if let Err(e) = self.engine.shutdown().await {
            warn!("Rendering engine shutdown failed: {}", e);
        }

        let state = state.into_inner();
        if state.sessions_opened == 0 {
            self.handle.transition(JobState::Failed);
            emit_log(
                self.observer.as_ref(),
                LogLevel::Error,
                "No worker could open a rendering session",
            );
            return Err(JobError::EngineInit(
                "no rendering session could be opened".to_string(),
            ));
        }
        if !self.handle.transition(JobState::Completed) {
            debug!("Job already in a terminal state");
        }

        Ok(self.finish(state, started_at, JobState::Completed))
    }

    fn finish(&self, state: CrawlState, started_at: Instant, final_state: JobState) -> CrawlOutcome {
        let outcome = CrawlOutcome {
            state: final_state,
            queue_remaining: state.frontier.len(),
            pages_visited: state.pages_started,
            pages: state.pages,
            errors: state.errors,
            findings: state.findings,
            duration: started_at.elapsed(),
        };
        info!(
            "Crawl finished: {} pages, {} links, {} errors in {:?}",
            outcome.pages.len(),
            outcome.total_links(),
            outcome.errors.len(),
            outcome.duration
        );
        outcome
    }

    async fn worker(&self, id: usize, state: &Mutex<CrawlState>) {
        if id > 0 && !self.options.worker_stagger.is_zero() {
            tokio::time::sleep(self.options.worker_stagger * id as u32).await;
        }

        let session = match self.engine.open_session().await {
            Ok(session) => session,
            Err(e) => {
                emit_log(
                    self.observer.as_ref(),
                    LogLevel::Error,
                    &format!("Worker {} could not open a session: {}", id, e),
                );
                return;
            }
        };
        state.lock().await.sessions_opened += 1;

        if self.options.block_heavy_resources {
            if let Err(e) = session.block_resources(&ResourceKind::HEAVY).await {
                debug!("Worker {} cannot block resources: {}", id, e);
            }
        }

        debug!("Worker {} started", id);
        self.work_loop(id, &session, state).await;

        if let Err(e) = session.close().await {
            debug!("Worker {} session close failed: {}", id, e);
        }
        debug!("Worker {} finished", id);
    }

    async fn work_loop(&self, id: usize, session: &Arc<dyn RenderSession>, state: &Mutex<CrawlState>) {
        let started = Instant::now();

        loop {
            match self.handle.state() {
                JobState::Running => {}
                JobState::Paused => {
                    if self.handle.wait_while_paused().await != JobState::Running {
                        break;
                    }
                }
                _ => break,
            }

            let step = {
                let mut s = state.lock().await;
                self.next_step(&mut s)
            };

            let (url, progress) = match step {
                Step::Visit(url, progress) => (url, progress),
                Step::Wait => {
                    tokio::time::sleep(self.options.idle_poll).await;
                    continue;
                }
                Step::Done => break,
            };

            self.observer.on_progress(&progress);
            if progress.pages_done % 10 == 0 {
                let rate = progress.pages_done as f64 / started.elapsed().as_secs_f64().max(0.001);
                info!(
                    "Progress: {} pages started, {} in queue, {:.2} pages/sec",
                    progress.pages_done, progress.queue_size, rate
                );
            }

            let result = self.extractor.extract(session, &url).await;
            match result {
                Ok(mut page) => {
                    if let Some((checker, limit)) = &self.sampler {
                        checker.sample_links(&mut page.links, *limit).await;
                    }
                    self.record_page(page, state).await;
                }
                Err(e) => {
                    let entry = ErrorEntry {
                        url: url.to_string(),
                        message: e.to_string(),
                    };
                    warn!("Worker {} failed on {}: {}", id, entry.url, entry.message);
                    self.observer.on_error(&entry);
                    let mut s = state.lock().await;
                    s.errors.push(entry);
                    s.in_flight -= 1;
                }
            }

            if !self.options.page_delay.is_zero() {
                tokio::time::sleep(self.options.page_delay).await;
            }
        }
    }

    /// Decides the next step under the lock
    fn next_step(&self, s: &mut CrawlState) -> Step {
        let budget_spent = self.options.max_pages > 0 && s.pages_started >= self.options.max_pages;
        if budget_spent {
            return Step::Done;
        }

        while let Some(url) = s.frontier.dequeue() {
            if s.frontier.is_visited(&url) {
                continue;
            }
            s.frontier.mark_visited(&url);
            s.in_flight += 1;
            s.pages_started += 1;

            let progress = Progress {
                current_url: url.to_string(),
                pages_done: s.pages_started,
                queue_size: s.frontier.len(),
                findings_count: s.findings.len(),
                links_found: s.links_found,
                max_pages: (self.options.max_pages > 0).then_some(self.options.max_pages),
            };
            return Step::Visit(url, progress);
        }

        if s.in_flight > 0 {
            Step::Wait
        } else {
            Step::Done
        }
    }

    async fn record_page(&self, page: ExtractedPage, state: &Mutex<CrawlState>) {
        let (key, record) = page.into_record(Utc::now());
        let findings = self
            .query
            .as_ref()
            .map(|q| q.evaluate_page(&key, &record))
            .unwrap_or_default();

        {
            let mut s = state.lock().await;
            if self.options.follow_links {
                for link in record.links.iter().filter(|l| !l.is_external) {
                    s.frontier.enqueue(&link.href);
                }
            }
            s.links_found += record.links.len();
            s.findings.extend(findings.iter().cloned());
            s.pages.insert(key, record);
            s.in_flight -= 1;
        }

        for finding in &findings {
            emit_log(
                self.observer.as_ref(),
                LogLevel::Warning,
                &format!("FOUND: {} on {}", finding.linked_to, finding.source_page),
            );
            self.observer.on_finding(finding);
        }
    }
}

fn frontier_into_state(frontier: Frontier) -> CrawlState {
    CrawlState {
        frontier,
        pages: BTreeMap::new(),
        errors: Vec::new(),
        findings: Vec::new(),
        in_flight: 0,
        pages_started: 0,
        links_found: 0,
        sessions_opened: 0,
    }
}
