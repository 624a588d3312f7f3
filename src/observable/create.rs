use super::Observable;
use crate::subscriber::Subscriber;

/// Creates a new observable from a producer function; see
/// [`Observable::create`].
///
/// ```
/// use rxcore::prelude::*;
///
/// observable::create(|subscriber: Subscriber<i32, ()>| {
///   subscriber.next(1);
///   subscriber.next(2);
///   subscriber.complete();
/// })
/// .subscribe(|v| println!("{v}"));
/// ```
pub fn create<T: 'static, E: 'static, R>(
  producer: impl Fn(Subscriber<T, E>) -> R + 'static,
) -> Observable<T, E>
where
  R: Into<crate::subscription::Teardown>,
{
  Observable::create(producer)
}

/// Creates an observable producing a single value.
///
/// Completes immediately after emitting the value given. Never emits an error.
///
/// ```
/// use rxcore::prelude::*;
///
/// observable::of::<_, ()>(123).subscribe(|v| println!("{v},"));
/// ```
pub fn of<T: Clone + 'static, E: 'static>(value: T) -> Observable<T, E> {
  Observable::create(move |subscriber: Subscriber<T, E>| {
    subscriber.next(value.clone());
    subscriber.complete();
  })
}

/// Creates an observable that produces values from an iterator.
///
/// Completes when all elements have been emitted. Never emits an error.
/// Emission stops early once the subscriber is closed.
///
/// ```
/// use rxcore::prelude::*;
///
/// observable::from_iter::<_, ()>(vec![0, 1, 2, 3]).subscribe(|v| println!("{v},"));
/// ```
pub fn from_iter<I, E>(iter: I) -> Observable<I::Item, E>
where
  I: IntoIterator + Clone + 'static,
  I::Item: 'static,
  E: 'static,
{
  Observable::create(move |subscriber: Subscriber<I::Item, E>| {
    for v in iter.clone() {
      if subscriber.is_closed() {
        return;
      }
      subscriber.next(v);
    }
    subscriber.complete();
  })
}

/// Creates an observable that emits no items, just terminates with an error.
pub fn throw_err<T: 'static, E: Clone + 'static>(err: E) -> Observable<T, E> {
  Observable::create(move |subscriber: Subscriber<T, E>| subscriber.error(err.clone()))
}

/// Creates an observable that produces no values and completes immediately.
pub fn empty<T: 'static, E: 'static>() -> Observable<T, E> {
  Observable::create(|subscriber: Subscriber<T, E>| subscriber.complete())
}

/// Creates an observable that never emits anything and never terminates.
pub fn never<T: 'static, E: 'static>() -> Observable<T, E> {
  Observable::create(|_: Subscriber<T, E>| {})
}

/// Creates an observable that will on subscription defer to another
/// observable that is supplied by a supplier-function which will be run once
/// at each subscription.
///
/// ```rust
/// # use rxcore::prelude::*;
///
/// observable::defer(|| {
///   println!("Hi!");
///   observable::of::<_, ()>("Hello!")
/// })
/// .subscribe(move |v| println!("{v}"));
/// // Prints: Hi!\nHello!\n
/// ```
pub fn defer<T: 'static, E: 'static>(
  supplier: impl Fn() -> Observable<T, E> + 'static,
) -> Observable<T, E> {
  Observable::create(move |subscriber: Subscriber<T, E>| supplier().subscribe_with(subscriber))
}
