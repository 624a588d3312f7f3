use std::{
  future::Future,
  pin::Pin,
  task::{Context, Poll},
};

use futures::{
  executor::LocalSpawner,
  future::{AbortHandle, Abortable},
  ready,
  task::LocalSpawnExt,
  Stream,
};
use pin_project_lite::pin_project;

use super::Observable;
use crate::{subscriber::Subscriber, subscription::Teardown};

/// Returns an `Observable` that emits all the items returned from the source
/// `Stream`, driven by the local executor behind `spawner`.
///
/// Every subscription polls its own clone of `stream`.
///
/// ```rust
/// use rxcore::prelude::*;
/// use futures::executor::LocalPool;
///
/// let stream = futures::stream::iter(1..4);
/// let mut pool = LocalPool::new();
/// observable::from_stream::<_, ()>(stream, pool.spawner()).subscribe(|x| println!("{x}"));
///
/// pool.run();
/// // prints:
/// // 1
/// // 2
/// // 3
/// ```
pub fn from_stream<S, E>(stream: S, spawner: LocalSpawner) -> Observable<S::Item, E>
where
  S: Stream + Clone + 'static,
  S::Item: 'static,
  E: 'static,
{
  Observable::create(move |subscriber: Subscriber<S::Item, E>| {
    let (abort, registration) = AbortHandle::new_pair();
    let forward = StreamForward { stream: stream.clone(), subscriber: subscriber.clone() };
    if let Err(err) = spawner.spawn_local(async move {
      let _ = Abortable::new(forward, registration).await;
    }) {
      tracing::warn!(%err, "failed to spawn stream forwarding task");
    }
    Teardown::from_fn(move || abort.abort())
  })
}

pin_project! {
  struct StreamForward<S, T, E> {
    #[pin]
    stream: S,
    subscriber: Subscriber<T, E>,
  }
}

impl<S, T, E> Future for StreamForward<S, T, E>
where
  S: Stream<Item = T>,
  T: 'static,
  E: 'static,
{
  type Output = ();

  fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
    loop {
      let this = self.as_mut().project();
      if this.subscriber.is_closed() {
        return Poll::Ready(());
      }
      match ready!(this.stream.poll_next(cx)) {
        Some(value) => this.subscriber.next(value),
        None => {
          this.subscriber.complete();
          return Poll::Ready(());
        }
      }
    }
  }
}
