#[cfg(test)]
mod tests {
    use super::super::{poll_until, Backoff, Poll};
    use crate::runner::{CommandOutput, CommandRunner, Invocation};
    use crate::{ConsoleError, Result};
    use std::cell::{Cell, RefCell};
    use std::time::Duration;

    /// Records pauses without sleeping.
    #[derive(Default)]
    struct Clock {
        pauses: RefCell<Vec<Duration>>,
        interrupted_after: Option<usize>,
    }

    impl CommandRunner for Clock {
        fn run(&self, _: &Invocation) -> Result<CommandOutput> {
            Ok(CommandOutput::success(""))
        }

        fn run_attached(&self, _: &Invocation) -> Result<CommandOutput> {
            Ok(CommandOutput::success(""))
        }

        fn pause(&self, duration: Duration) -> Result<()> {
            let mut pauses = self.pauses.borrow_mut();
            if self.interrupted_after == Some(pauses.len()) {
                return Err(ConsoleError::Cancelled);
            }
            pauses.push(duration);
            Ok(())
        }
    }

    #[test]
    fn test_backoff_doubles_up_to_cap() {
        let backoff = Backoff::default();

        assert_eq!(backoff.delay(0), Duration::from_secs(1));
        assert_eq!(backoff.delay(1), Duration::from_secs(2));
        assert_eq!(backoff.delay(3), Duration::from_secs(8));
        assert_eq!(backoff.delay(4), Duration::from_secs(10));
        assert_eq!(backoff.delay(40), Duration::from_secs(10));
    }

    #[test]
    fn test_ready_on_first_probe_never_pauses() {
        let clock = Clock::default();
        let value = poll_until(&clock, &Backoff::default(), Duration::from_secs(60), || {
            Ok(Poll::Ready(7))
        })
        .unwrap();

        assert_eq!(value, Some(7));
        assert!(clock.pauses.borrow().is_empty());
    }

    #[test]
    fn test_ready_after_pending_probes() {
        let clock = Clock::default();
        let probes = Cell::new(0);

        let value = poll_until(&clock, &Backoff::default(), Duration::from_secs(60), || {
            probes.set(probes.get() + 1);
            Ok(if probes.get() == 3 {
                Poll::Ready("Complete")
            } else {
                Poll::Pending
            })
        })
        .unwrap();

        assert_eq!(value, Some("Complete"));
        assert_eq!(
            *clock.pauses.borrow(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[test]
    fn test_deadline_bounds_total_pause() {
        let clock = Clock::default();

        let value: Option<()> =
            poll_until(&clock, &Backoff::default(), Duration::from_secs(120), || {
                Ok(Poll::Pending)
            })
            .unwrap();

        assert_eq!(value, None);
        let total: Duration = clock.pauses.borrow().iter().sum();
        assert_eq!(total, Duration::from_secs(120));
        assert!(clock
            .pauses
            .borrow()
            .iter()
            .all(|p| *p <= Duration::from_secs(10)));
    }

    #[test]
    fn test_probe_error_stops_polling() {
        let clock = Clock::default();

        let err = poll_until::<(), _>(&clock, &Backoff::default(), Duration::from_secs(60), || {
            Err(ConsoleError::NotFound("job/postgresql-restore-1".to_string()))
        })
        .unwrap_err();

        assert!(matches!(err, ConsoleError::NotFound(_)));
        assert!(clock.pauses.borrow().is_empty());
    }

    #[test]
    fn test_interrupt_during_pause() {
        let clock = Clock {
            interrupted_after: Some(1),
            ..Clock::default()
        };

        let err = poll_until::<(), _>(&clock, &Backoff::default(), Duration::from_secs(60), || {
            Ok(Poll::Pending)
        })
        .unwrap_err();

        assert!(matches!(err, ConsoleError::Cancelled));
        assert_eq!(clock.pauses.borrow().len(), 1);
    }
}
