use futures::future;
use futures::stream::{self, BoxStream, Stream, StreamExt};

enum Input<A, B, C> {
    A(A),
    B(B),
    C(C),
}

/// Latest value of each input, emitted on every input emission once all
/// three have produced a value.
///
/// The combined stream ends when all inputs have ended. Dropping it drops
/// every input subscription.
pub fn combine_latest<A, B, C>(
    a: impl Stream<Item = A> + Send + 'static,
    b: impl Stream<Item = B> + Send + 'static,
    c: impl Stream<Item = C> + Send + 'static,
) -> BoxStream<'static, (A, B, C)>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
    C: Clone + Send + 'static,
{
    let tagged: [BoxStream<'static, Input<A, B, C>>; 3] = [
        a.map(Input::A).boxed(),
        b.map(Input::B).boxed(),
        c.map(Input::C).boxed(),
    ];

    stream::select_all(tagged)
        .scan(
            (None::<A>, None::<B>, None::<C>),
            |latest, input| {
                match input {
                    Input::A(value) => latest.0 = Some(value),
                    Input::B(value) => latest.1 = Some(value),
                    Input::C(value) => latest.2 = Some(value),
                }
                let combined = match latest {
                    (Some(a), Some(b), Some(c)) => Some((a.clone(), b.clone(), c.clone())),
                    _ => None,
                };
                future::ready(Some(combined))
            },
        )
        .filter_map(future::ready)
        .boxed()
}
