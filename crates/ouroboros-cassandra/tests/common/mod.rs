//! In-memory transport shared by the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ouroboros_cassandra::{
    DataBridgeError, ExecutionOptions, PagingState, Result, ResultPage, Row, Session, Transport,
};

/// A statement as the transport received it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub cql: String,
    pub options: ExecutionOptions,
    pub asynchronous: bool,
}

/// Serves a fixed list of pages and records every statement.
///
/// The paging state handed out is the index of the next page, one byte.
#[derive(Default)]
pub struct RecordingTransport {
    pages: Vec<Vec<Row>>,
    fail_with: Option<DataBridgeError>,
    log: Mutex<Vec<Recorded>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_pages(pages: Vec<Vec<Row>>) -> Arc<Self> {
        Arc::new(Self {
            pages,
            ..Default::default()
        })
    }

    pub fn failing(error: DataBridgeError) -> Arc<Self> {
        Arc::new(Self {
            fail_with: Some(error),
            ..Default::default()
        })
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }

    pub fn last(&self) -> Recorded {
        self.recorded().pop().expect("no statement recorded")
    }

    fn record(&self, cql: &str, options: &ExecutionOptions, asynchronous: bool) {
        self.log.lock().unwrap().push(Recorded {
            cql: cql.to_string(),
            options: options.clone(),
            asynchronous,
        });
    }

    fn page_for(&self, options: &ExecutionOptions) -> Result<ResultPage> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        let index = options
            .paging_state
            .as_ref()
            .and_then(|s| s.as_bytes().first().copied())
            .unwrap_or(0) as usize;
        let rows = self.pages.get(index).cloned().unwrap_or_default();
        let next = (index + 1 < self.pages.len())
            .then(|| PagingState::from_bytes(vec![(index + 1) as u8]));
        Ok(ResultPage::new(rows, next))
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn execute(&self, cql: &str, options: ExecutionOptions) -> Result<ResultPage> {
        self.record(cql, &options, false);
        self.page_for(&options)
    }

    fn execute_async(
        self: Arc<Self>,
        cql: String,
        options: ExecutionOptions,
    ) -> ouroboros_cassandra::ResultFuture {
        // Recorded at dispatch time, like a driver that sends eagerly
        self.record(&cql, &options, true);
        let result = self.page_for(&options);
        Box::pin(async move { result })
    }
}

pub fn session(transport: &Arc<RecordingTransport>) -> Session {
    Session::new(transport.clone())
}

/// `count` rows with an `id` column, numbered from `start`.
pub fn rows(start: i32, count: i32) -> Vec<Row> {
    (start..start + count)
        .map(|id| Row::from_pairs([("id", id)]))
        .collect()
}
