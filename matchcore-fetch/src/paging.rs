use crate::client::Fetcher;
use crate::error::PageStreamError;
use futures::{Stream, StreamExt, stream};
use log::debug;
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Shape of a single page of results from a paginated source endpoint. Most
/// tournament platforms return something isomorphic to this -- a page of
/// items plus an opaque cursor for the next page.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page: Option<String>,
}

/// Stream every item across every page of a paginated endpoint, eagerly
/// fetching the next page while the caller processes the current one.
/// Uses `stream::unfold` over an opaque next-page cursor, generalized to
/// an arbitrary URL and item type.
pub fn fetch_all_pages<T: DeserializeOwned + Send + 'static>(
    fetcher: Fetcher,
    url: String,
    base_query: Vec<(String, String)>,
) -> impl Stream<Item = Result<T, PageStreamError>> {
    fetch_pages(fetcher, url, base_query).flat_map(|page| match page {
        Ok(items) => {
            let results = items.into_iter().map(Ok);
            stream::iter(results).left_stream()
        }
        Err(err) => stream::once(async { Err(err) }).right_stream(),
    })
}

fn fetch_pages<T: DeserializeOwned + Send + 'static>(
    fetcher: Fetcher,
    url: String,
    base_query: Vec<(String, String)>,
) -> impl Stream<Item = Result<Vec<T>, PageStreamError>> {
    let first = tokio::spawn(fetch_one_page::<T>(
        fetcher.clone(),
        url.clone(),
        base_query.clone(),
        None,
    ));

    stream::unfold(Some(first), move |next| {
        let fetcher = fetcher.clone();
        let url = url.clone();
        let base_query = base_query.clone();
        async move {
            let handle = next?;

            let page = match handle.await {
                Ok(Ok(page)) => page,
                Ok(Err(err)) => return Some((Err(err.into()), None)),
                Err(join_err) => return Some((Err(PageStreamError::JoinFailure(join_err)), None)),
            };

            let items = page.items;
            if let Some(cursor) = page.next_page {
                let next = tokio::spawn(fetch_one_page::<T>(fetcher, url, base_query, Some(cursor)));
                debug!("yielding a page of {} item(s), more remain", items.len());
                Some((Ok(items), Some(next)))
            } else {
                debug!("yielding the last page of {} item(s)", items.len());
                Some((Ok(items), None))
            }
        }
    })
}

async fn fetch_one_page<T: DeserializeOwned>(
    fetcher: Fetcher,
    url: String,
    base_query: Vec<(String, String)>,
    cursor: Option<String>,
) -> Result<Page<T>, crate::error::FetchError> {
    let mut query: Vec<(&str, &str)> = base_query
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    if let Some(cursor) = cursor.as_deref() {
        query.push(("page", cursor));
    }
    fetcher.fetch_json(&url, &query).await
}
