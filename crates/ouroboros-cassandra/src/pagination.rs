//! Cursor-based paging.
//!
//! A page is either *HasMore* (the transport returned a paging state) or
//! *Exhausted*. Moving forward re-executes the original statement with the
//! stored cursor; there is no offset arithmetic and no way to jump back.

use std::fmt;

use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use tracing::debug;

use crate::executor::Executor;
use crate::transport::ExecutionOptions;
use crate::{DataBridgeError, Result, Row};

/// Opaque server-side scan position.
///
/// Tokens are produced by the transport and only passed back to it. They are
/// deliberately neither comparable nor orderable.
#[derive(Clone)]
pub struct PagingState(Bytes);

impl PagingState {
    /// Wraps the raw token returned by a driver.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Hex encoding, for transports that carry the token as text.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Debug for PagingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PagingState({} bytes)", self.0.len())
    }
}

/// One page of rows as returned by the transport.
#[derive(Debug, Clone, Default)]
pub struct ResultPage {
    rows: Vec<Row>,
    paging_state: Option<PagingState>,
}

impl ResultPage {
    pub fn new(rows: Vec<Row>, paging_state: Option<PagingState>) -> Self {
        Self { rows, paging_state }
    }

    /// A final page without rows (acknowledgements, DDL).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Number of rows on this page only.
    pub fn count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_last_page(&self) -> bool {
        self.paging_state.is_none()
    }

    /// Cursor for the next page, if any. Feed it back through `paginate`.
    pub fn paging_state(&self) -> Option<&PagingState> {
        self.paging_state.as_ref()
    }
}

/// A page that remembers the statement it came from, so it can fetch its successor.
#[derive(Debug)]
pub struct Rows {
    executor: Executor,
    cql: String,
    options: ExecutionOptions,
    page: ResultPage,
}

impl Rows {
    pub(crate) fn new(
        executor: Executor,
        cql: String,
        options: ExecutionOptions,
        page: ResultPage,
    ) -> Self {
        Self {
            executor,
            cql,
            options,
            page,
        }
    }

    pub fn rows(&self) -> &[Row] {
        self.page.rows()
    }

    pub fn count(&self) -> usize {
        self.page.count()
    }

    pub fn is_last_page(&self) -> bool {
        self.page.is_last_page()
    }

    pub fn paging_state(&self) -> Option<&PagingState> {
        self.page.paging_state()
    }

    /// The statement this page belongs to.
    pub fn cql(&self) -> &str {
        &self.cql
    }

    pub fn into_page(self) -> ResultPage {
        self.page
    }

    /// Fetches the following page.
    ///
    /// # Errors
    ///
    /// Returns a query error when called on the last page; transport errors are
    /// passed through.
    pub async fn next_page(&self) -> Result<Rows> {
        let state = self.page.paging_state().cloned().ok_or_else(|| {
            DataBridgeError::Query("Cannot fetch next page: result is on its last page".to_string())
        })?;

        let mut options = self.options.clone();
        options.paging_state = Some(state);

        let page = self.executor.execute(&self.cql, options.clone()).await?;
        Ok(Rows::new(self.executor.clone(), self.cql.clone(), options, page))
    }

    /// Pull-based iteration over the remaining pages, starting with this one.
    pub fn into_cursor(self) -> PageCursor {
        PageCursor {
            state: CursorState::Initial(self),
        }
    }

    /// Streams every row of this page and all following pages.
    pub fn into_row_stream(self) -> BoxStream<'static, Result<Row>> {
        stream::try_unfold(self.into_cursor(), |mut cursor| async move {
            let next = cursor.next().await?;
            let item = next.map(|rows| {
                let page = stream::iter(rows.into_iter().map(Ok::<Row, DataBridgeError>));
                (page, cursor)
            });
            Ok::<_, DataBridgeError>(item)
        })
        .try_flatten()
        .boxed()
    }

    /// Sums the row counts of this page and every following page.
    pub async fn count_all(self) -> Result<u64> {
        let mut total = self.count() as u64;
        let mut pages = 1u64;
        let mut current = self;
        while !current.is_last_page() {
            current = current.next_page().await?;
            total += current.count() as u64;
            pages += 1;
        }
        debug!(pages = pages, rows = total, "Counted rows across pages");
        Ok(total)
    }

    /// Collects every row of this page and all following pages.
    pub async fn collect_all(self) -> Result<Vec<Row>> {
        self.into_row_stream().try_collect().await
    }
}

enum CursorState {
    Initial(Rows),
    Advance(Rows),
    Done,
}

/// Forward-only page iterator.
///
/// Pages are fetched lazily on `next`; a cursor can only be restarted by
/// executing the statement again.
pub struct PageCursor {
    state: CursorState,
}

impl PageCursor {
    /// Whether another call to `next` can yield rows.
    pub fn has_next(&self) -> bool {
        !matches!(self.state, CursorState::Done)
    }

    /// Rows of the next page, or None once the last page was consumed.
    pub async fn next(&mut self) -> Result<Option<Vec<Row>>> {
        let mut rows = match std::mem::replace(&mut self.state, CursorState::Done) {
            CursorState::Initial(rows) => rows,
            CursorState::Advance(prev) => match prev.next_page().await {
                Ok(rows) => rows,
                Err(e) => {
                    // Leave the cursor where it was so the caller may retry
                    self.state = CursorState::Advance(prev);
                    return Err(e);
                }
            },
            CursorState::Done => return Ok(None),
        };

        let out = std::mem::take(&mut rows.page.rows);
        if !rows.is_last_page() {
            self.state = CursorState::Advance(rows);
        }
        Ok(Some(out))
    }
}

impl fmt::Debug for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageCursor")
            .field("has_next", &self.has_next())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_page_last_page() {
        let page = ResultPage::new(vec![Row::default()], None);
        assert!(page.is_last_page());
        assert_eq!(page.count(), 1);

        let page = ResultPage::new(vec![], Some(PagingState::from_bytes(vec![1u8])));
        assert!(!page.is_last_page());
    }

    #[test]
    fn test_paging_state_is_opaque_in_debug() {
        let state = PagingState::from_bytes(vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(format!("{:?}", state), "PagingState(4 bytes)");
        assert_eq!(state.to_hex(), "deadbeef");
        assert_eq!(state.as_bytes(), &[0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn test_empty_page() {
        let page = ResultPage::empty();
        assert!(page.is_last_page());
        assert!(page.rows().is_empty());
    }
}
