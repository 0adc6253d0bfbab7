//! Async/await until a condition holds.
//!
//! A [`wait`] evaluates its predicate once right away and then, if needed, once
//! per interval on the [`Timer`] until the predicate's value is truthy or the
//! deadline passes. Evaluation is eager: the polling runs whether or not the
//! returned future is ever awaited, and dropping the future does not stop it.
//!
//! A predicate that panics takes the evaluation step down with it. Conditions
//! that can fail should return an `Option` or `Result`, which are falsy when
//! they hold nothing.
use crate::{
    config::PollOptions,
    error::{Error, Result},
    sync::{Settle, Settled, Shared},
    time::{Timer, TimerHandle},
    truthy::Truthy,
};

/// Whether the predicate of a [`wait`] receives an argument.
///
/// Polling only happens [`WithArgument`](PollArgument::WithArgument). With
/// [`NoArgument`](PollArgument::NoArgument) the predicate runs exactly once
/// and its value is returned as-is, truthy or not.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PollArgument<A> {
    #[default]
    NoArgument,
    WithArgument(A),
}

/// The future returned by [`wait`] and friends.
pub type Wait<R> = Settled<Result<R>>;

enum Condition<A, R> {
    /// Taken on its single evaluation.
    Once(Option<Box<dyn FnOnce() -> R>>),
    Poll {
        argument: A,
        predicate: Box<dyn FnMut(&A) -> R>,
    },
}

enum State<H> {
    Evaluating,
    Scheduled(H),
    Settled,
}

struct Poller<T: Timer, A, R> {
    timer: T,
    condition: Condition<A, R>,
    options: PollOptions,
    start: f64,
    attempts: u32,
    state: State<T::Handle>,
    settle: Settle<Result<R>>,
}

impl<T: Timer, A, R> Poller<T, A, R> {
    fn finish(&mut self, result: Result<R>) {
        match &result {
            Ok(_) => log::debug!("condition met after {} attempt(s)", self.attempts),
            Err(err) => log::debug!("{} after {} attempt(s)", err, self.attempts),
        }
        self.state = State::Settled;
        self.settle.settle(result);
    }
}

/// Wait until `predicate` returns a truthy value.
///
/// `predicate` receives `None` when `argument` is [`PollArgument::NoArgument`]
/// and `Some(&argument)` otherwise.
///
/// ```
/// use futures::FutureExt;
/// use poltergeist::{poll::{wait, PollArgument}, sim::SimTimer, PollOptions};
///
/// let timer = SimTimer::new();
/// let found = wait(
///     &timer,
///     |x: Option<&i32>| x.is_some_and(|x| *x > 3),
///     PollArgument::WithArgument(5),
///     PollOptions::new(1000, 100),
/// );
/// assert!(found.now_or_never().unwrap().unwrap());
/// ```
pub fn wait<T, A, R, F>(
    timer: &T,
    mut predicate: F,
    argument: PollArgument<A>,
    options: PollOptions,
) -> Wait<R>
where
    T: Timer,
    A: 'static,
    R: Truthy + 'static,
    F: FnMut(Option<&A>) -> R + 'static,
{
    let condition = match argument {
        PollArgument::NoArgument => Condition::Once(Some(Box::new(move || predicate(None)))),
        PollArgument::WithArgument(argument) => Condition::Poll {
            argument,
            predicate: Box::new(move |argument: &A| predicate(Some(argument))),
        },
    };
    start(timer, condition, options)
}

/// Poll `predicate(&argument)` until it is truthy or `options.timeout_ms` elapses.
pub fn wait_until<T, A, R, F>(timer: &T, argument: A, predicate: F, options: PollOptions) -> Wait<R>
where
    T: Timer,
    A: 'static,
    R: Truthy + 'static,
    F: FnMut(&A) -> R + 'static,
{
    start(
        timer,
        Condition::Poll {
            argument,
            predicate: Box::new(predicate),
        },
        options,
    )
}

/// Evaluate `predicate` once and resolve with whatever it returns.
pub fn wait_once<T, R, F>(timer: &T, predicate: F, options: PollOptions) -> Wait<R>
where
    T: Timer,
    R: Truthy + 'static,
    F: FnOnce() -> R + 'static,
{
    start::<T, (), R>(timer, Condition::Once(Some(Box::new(predicate))), options)
}

fn start<T, A, R>(timer: &T, condition: Condition<A, R>, options: PollOptions) -> Wait<R>
where
    T: Timer,
    A: 'static,
    R: Truthy + 'static,
{
    let (settle, settled) = Settle::pair();
    let poller = Shared::new(Poller {
        timer: timer.clone(),
        condition,
        options,
        start: timer.now(),
        attempts: 0,
        state: State::Evaluating,
        settle,
    });
    step(&poller);
    settled
}

fn step<T, A, R>(poller: &Shared<Poller<T, A, R>>)
where
    T: Timer,
    A: 'static,
    R: Truthy + 'static,
{
    let mut guard = poller.get_mut();
    let this = &mut *guard;
    if matches!(this.state, State::Settled) {
        return;
    }
    // Any scheduled handle has fired by now.
    this.state = State::Evaluating;
    this.attempts += 1;
    let elapsed = this.timer.now() - this.start;
    let timed_out = elapsed >= this.options.timeout_ms as f64;
    log::trace!("evaluation {} at {}ms", this.attempts, elapsed);

    let outcome = match &mut this.condition {
        Condition::Poll {
            argument,
            predicate,
        } => {
            let value = predicate(&*argument);
            if value.is_truthy() {
                Some(Ok(value))
            } else if timed_out {
                Some(Err(Error::Timeout {
                    elapsed,
                    attempts: this.attempts,
                }))
            } else {
                None
            }
        }
        Condition::Once(_) if timed_out => Some(Err(Error::Timeout {
            elapsed,
            attempts: this.attempts,
        })),
        Condition::Once(predicate) => predicate.take().map(|predicate| Ok(predicate())),
    };

    match outcome {
        Some(result) => this.finish(result),
        None => {
            let next = poller.clone();
            let handle = this
                .timer
                .after(this.options.poll_interval_ms(), move || step(&next));
            // At most one step is ever in flight.
            if let State::Scheduled(stale) =
                std::mem::replace(&mut this.state, State::Scheduled(handle))
            {
                stale.cancel();
            }
        }
    }
}

/// A [`Timer`] paired with default [`PollOptions`].
#[derive(Clone)]
pub struct ConditionPoller<T> {
    timer: T,
    options: PollOptions,
}

impl<T: Timer> ConditionPoller<T> {
    pub fn new(timer: T) -> Self {
        ConditionPoller {
            timer,
            options: PollOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PollOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &PollOptions {
        &self.options
    }

    pub fn wait<A, R, F>(&self, predicate: F, argument: PollArgument<A>) -> Wait<R>
    where
        A: 'static,
        R: Truthy + 'static,
        F: FnMut(Option<&A>) -> R + 'static,
    {
        wait(&self.timer, predicate, argument, self.options)
    }

    pub fn until<A, R, F>(&self, argument: A, predicate: F) -> Wait<R>
    where
        A: 'static,
        R: Truthy + 'static,
        F: FnMut(&A) -> R + 'static,
    {
        wait_until(&self.timer, argument, predicate, self.options)
    }

    pub fn once<R, F>(&self, predicate: F) -> Wait<R>
    where
        R: Truthy + 'static,
        F: FnOnce() -> R + 'static,
    {
        wait_once(&self.timer, predicate, self.options)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::SimTimer;
    use futures::FutureExt;

    fn counter() -> (Shared<u32>, impl Fn() -> u32) {
        let count = Shared::new(0);
        let read = {
            let count = count.clone();
            move || *count.get()
        };
        (count, read)
    }

    #[test]
    fn truthy_first_try_resolves_immediately() {
        let timer = SimTimer::new();
        let found = wait(
            &timer,
            |x: Option<&i32>| x.is_some_and(|x| *x > 3),
            PollArgument::WithArgument(5),
            PollOptions::new(1000, 100),
        );
        assert!(found.now_or_never().unwrap().unwrap());
        assert_eq!(timer.pending(), 0);
    }

    #[test]
    fn truthy_first_try_wins_even_with_zero_timeout() {
        let timer = SimTimer::new();
        let found = wait_until(&timer, 5, |x| *x * 2, PollOptions::new(0, 100));
        assert_eq!(found.now_or_never().unwrap().unwrap(), 10);
    }

    #[test]
    fn falsy_first_try_with_zero_timeout_fails_immediately() {
        let timer = SimTimer::new();
        let found = wait_until(&timer, 1, |x| *x > 3, PollOptions::new(0, 100));
        match found.now_or_never() {
            Some(Err(Error::Timeout { attempts, elapsed })) => {
                assert_eq!(attempts, 1);
                assert_eq!(elapsed, 0.0);
            }
            other => panic!("expected a timeout, got {:?}", other.map(|r| r.is_ok())),
        }
    }

    #[test]
    fn never_truthy_times_out_after_the_deadline() {
        let _ = env_logger::builder().is_test(true).try_init();
        let timer = SimTimer::new();
        let (count, attempts) = counter();
        let mut found = wait_until(
            &timer,
            1,
            move |x| {
                *count.get_mut() += 1;
                *x > 3
            },
            PollOptions::new(300, 100),
        );

        timer.advance(299);
        assert!((&mut found).now_or_never().is_none());
        assert_eq!(attempts(), 3);

        timer.advance(1);
        let err = found.now_or_never().unwrap().unwrap_err();
        assert_eq!(err.to_string(), "Timeout >>> Element not found");
        match err {
            Error::Timeout { elapsed, attempts } => {
                assert!(elapsed >= 300.0);
                assert_eq!(attempts, 4);
            }
            err => panic!("unexpected {}", err),
        }
        assert_eq!(attempts(), 4);
        assert_eq!(timer.pending(), 0);
    }

    #[test]
    fn attempts_track_timeout_over_interval() {
        let timer = SimTimer::new();
        let (count, attempts) = counter();
        let found = wait_until(
            &timer,
            (),
            move |_| {
                *count.get_mut() += 1;
                false
            },
            PollOptions::new(1000, 100),
        );
        timer.run_until_idle();
        assert!(matches!(
            found.now_or_never(),
            Some(Err(Error::Timeout { .. }))
        ));
        let expected = 1000 / 100;
        assert!(attempts().abs_diff(expected) <= 1, "{} attempts", attempts());
    }

    #[test]
    fn becomes_truthy_later() {
        let timer = SimTimer::new();
        let ready_at = 250.0;
        let clock = timer.clone();
        let found = wait(
            &timer,
            move |tag: Option<&&str>| {
                if clock.now() >= ready_at {
                    tag.map(|tag| tag.to_string())
                } else {
                    None
                }
            },
            PollArgument::WithArgument("#late"),
            PollOptions::default(),
        );
        timer.advance(499);
        assert!(!found.is_settled());
        timer.advance(1);
        assert_eq!(
            found.now_or_never().unwrap().unwrap(),
            Some("#late".to_string())
        );
    }

    #[test]
    fn no_argument_trusts_the_first_result() {
        let timer = SimTimer::new();
        let (count, attempts) = counter();
        let found = wait(
            &timer,
            move |_: Option<&()>| {
                *count.get_mut() += 1;
                false
            },
            PollArgument::NoArgument,
            PollOptions::default(),
        );
        assert!(!found.now_or_never().unwrap().unwrap());
        assert_eq!(attempts(), 1);
        assert_eq!(timer.pending(), 0);
    }

    #[test]
    fn no_argument_with_zero_timeout_times_out() {
        let timer = SimTimer::new();
        let found = wait_once(&timer, || true, PollOptions::new(0, 100));
        assert!(matches!(
            found.now_or_never(),
            Some(Err(Error::Timeout { attempts: 1, .. }))
        ));
    }

    #[test]
    fn concurrent_waits_do_not_interact() {
        let timer = SimTimer::new();
        let poller = ConditionPoller::new(timer.clone()).with_options(PollOptions::new(300, 100));
        let fast = poller.until(4, |x| *x > 3);
        let slow = poller.until(1, |x| *x > 3);
        assert!(fast.now_or_never().unwrap().unwrap());
        timer.advance(300);
        assert!(slow.now_or_never().unwrap().is_err());
    }

    #[test]
    fn dropping_the_future_does_not_cancel_polling() {
        let timer = SimTimer::new();
        let (count, attempts) = counter();
        let found = wait_until(
            &timer,
            (),
            move |_| {
                *count.get_mut() += 1;
                false
            },
            PollOptions::new(200, 100),
        );
        drop(found);
        timer.run_until_idle();
        assert_eq!(attempts(), 3);
    }

    #[test]
    fn works_when_awaited() {
        let timer = SimTimer::new();
        let poller = ConditionPoller::new(timer);
        let value = futures::executor::block_on(poller.once(|| 42u8)).unwrap();
        assert_eq!(value, 42);
    }
}
