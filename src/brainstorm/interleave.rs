//! Merging concurrently running streams into one

use std::future::Future;

use async_stream::stream;
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt};

/// Yield items from all `streams` in completion order, tagged with their key.
///
/// Each stream has exactly one outstanding `next()` at any time: when it
/// resolves, the stream is re-armed before the item is yielded, and it is
/// dropped from the set once exhausted. Order within one stream is preserved.
pub fn interleave<K, S>(streams: Vec<(K, S)>) -> impl Stream<Item = (K, S::Item)>
where
    K: Clone,
    S: Stream + Unpin,
{
    stream! {
        let mut pending: FuturesUnordered<_> = streams
            .into_iter()
            .map(|(key, stream)| next_of(key, stream))
            .collect();

        while let Some((key, item, rest)) = pending.next().await {
            if let Some(item) = item {
                pending.push(next_of(key.clone(), rest));
                yield (key, item);
            }
        }
    }
}

fn next_of<K, S>(key: K, stream: S) -> impl Future<Output = (K, Option<S::Item>, S)>
where
    S: Stream + Unpin,
{
    async move {
        let (item, rest) = stream.into_future().await;
        (key, item, rest)
    }
}
